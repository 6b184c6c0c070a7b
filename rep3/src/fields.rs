use ff::PrimeField;
use rand::RngCore;
use serde::{de::DeserializeOwned, Serialize};

/// Prime field usable as the working domain of sharing protocols.
pub trait MpcField: PrimeField + Serialize + DeserializeOwned {
    /// Draw a uniform element, optionally restricted to the `bits` low-order
    /// bits. Restricted widths above 64 bits are not supported.
    fn random_masked(rng: &mut impl RngCore, bits: Option<u32>) -> Self {
        match bits {
            None => Self::random(&mut *rng),
            Some(bits) => {
                assert!(bits <= 64, "Unsupported bit width {}", bits);
                let mask = if bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };
                Self::from(rng.next_u64() & mask)
            }
        }
    }
}

impl<T: PrimeField + Serialize + DeserializeOwned> MpcField for T {}

mod mersenne_61 {
    use ff::PrimeField;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Finite field mod 2^61-1.
    #[derive(PrimeField)]
    #[PrimeFieldModulus = "2305843009213693951"]
    #[PrimeFieldGenerator = "37"]
    #[PrimeFieldReprEndianness = "little"]
    pub struct Mersenne61([u64; 1]);

    impl Serialize for Mersenne61 {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            self.to_repr().0.serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for Mersenne61 {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let repr = Mersenne61Repr(Deserialize::deserialize(deserializer)?);
            Self::from_repr_vartime(repr)
                .ok_or_else(|| serde::de::Error::custom("Invalid field element"))
        }
    }
}

mod mersenne_127 {
    use ff::PrimeField;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Finite field mod 2^127-1.
    #[derive(PrimeField)]
    #[PrimeFieldModulus = "170141183460469231731687303715884105727"]
    #[PrimeFieldGenerator = "43"]
    #[PrimeFieldReprEndianness = "little"]
    pub struct Mersenne127([u64; 2]);

    impl Serialize for Mersenne127 {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            self.to_repr().0.serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for Mersenne127 {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let repr = Mersenne127Repr(Deserialize::deserialize(deserializer)?);
            Self::from_repr_vartime(repr)
                .ok_or_else(|| serde::de::Error::custom("Invalid field element"))
        }
    }
}

pub use mersenne_127::{Mersenne127, Mersenne127Repr};
pub use mersenne_61::{Mersenne61, Mersenne61Repr};

#[cfg(test)]
mod tests {
    use ff::PrimeField;
    use rand::{rngs::SmallRng, SeedableRng};

    use super::*;

    #[test]
    fn test_masked_draw_stays_within_width() {
        let mut rng = SmallRng::from_seed([7; 32]);
        for _ in 0..100 {
            let x = Mersenne61::random_masked(&mut rng, Some(16));
            let value = u64::from_le_bytes(x.to_repr().0);
            assert!(value < 1 << 16);
        }
    }

    #[test]
    fn test_masked_draw_wide_field() {
        let mut rng = SmallRng::from_seed([8; 32]);
        for _ in 0..100 {
            let x = Mersenne127::random_masked(&mut rng, Some(32));
            let value = u128::from_le_bytes(x.to_repr().0);
            assert!(value < 1 << 32);
        }
    }

    #[test]
    fn test_unrestricted_draw_varies() {
        let mut rng = SmallRng::from_seed([9; 32]);
        let x = Mersenne61::random_masked(&mut rng, None);
        let y = Mersenne61::random_masked(&mut rng, None);
        assert_ne!(x, y);
    }

    #[test]
    #[should_panic(expected = "Unsupported bit width")]
    fn test_oversized_width_panics() {
        let mut rng = SmallRng::from_seed([10; 32]);
        Mersenne61::random_masked(&mut rng, Some(65));
    }

    #[test]
    fn test_serde_round_trip() {
        let x = Mersenne61::from(123456789);
        let bytes = bincode::serialize(&x).unwrap();
        assert_eq!(bytes.len(), 8);
        let y: Mersenne61 = bincode::deserialize(&bytes).unwrap();
        assert_eq!(x, y);
    }
}
