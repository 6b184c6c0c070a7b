use std::ops::{Add, Mul, Neg, Sub};

use rand::RngCore;

use crate::{fields::MpcField, MpcShare};

use super::{prev_party, PARTIES};

/// Value share in the replicated three-party scheme.
///
/// Of the three additive sub-shares `x_0 + x_1 + x_2` of a secret, party `i`
/// holds the adjacent pair `(x_i, x_{i-1})`; any two parties together hold
/// all three sub-shares and can reconstruct.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ReplicatedShare<T> {
    pub(super) a: T,
    pub(super) b: T,
}

impl<T: MpcField> ReplicatedShare<T> {
    /// Assemble a share from its two locally held sub-shares.
    pub fn new(a: T, b: T) -> Self {
        ReplicatedShare { a, b }
    }

    /// Sub-share indexed by the local party ID.
    pub fn own_part(&self) -> T {
        self.a
    }

    /// Sub-share indexed by the previous party's ID.
    pub fn prev_part(&self) -> T {
        self.b
    }
}

impl<T: MpcField> MpcShare for ReplicatedShare<T> {
    type Field = T;

    fn zero() -> Self {
        ReplicatedShare {
            a: T::zero(),
            b: T::zero(),
        }
    }

    fn double(&self) -> Self {
        ReplicatedShare {
            a: self.a.double(),
            b: self.b.double(),
        }
    }
}

impl<T: MpcField> Add for ReplicatedShare<T> {
    type Output = ReplicatedShare<T>;
    fn add(self, rhs: Self) -> Self::Output {
        ReplicatedShare {
            a: self.a + rhs.a,
            b: self.b + rhs.b,
        }
    }
}

impl<T: MpcField> Sub for ReplicatedShare<T> {
    type Output = ReplicatedShare<T>;
    fn sub(self, rhs: Self) -> Self::Output {
        ReplicatedShare {
            a: self.a - rhs.a,
            b: self.b - rhs.b,
        }
    }
}

impl<T: MpcField> Neg for ReplicatedShare<T> {
    type Output = ReplicatedShare<T>;
    fn neg(self) -> Self::Output {
        ReplicatedShare {
            a: -self.a,
            b: -self.b,
        }
    }
}

impl<T: MpcField> Mul<T> for ReplicatedShare<T> {
    type Output = ReplicatedShare<T>;
    fn mul(self, rhs: T) -> Self::Output {
        ReplicatedShare {
            a: self.a * rhs,
            b: self.b * rhs,
        }
    }
}

/// Split `value` into the three parties' replicated shares.
pub fn share_element<T: MpcField>(value: T, rng: &mut impl RngCore) -> [ReplicatedShare<T>; 3] {
    let x0 = T::random(&mut *rng);
    let x1 = T::random(&mut *rng);
    let x2 = value - x0 - x1;
    [
        ReplicatedShare::new(x0, x2),
        ReplicatedShare::new(x1, x0),
        ReplicatedShare::new(x2, x1),
    ]
}

/// Reassemble a secret from all three parties' shares, checking the pairwise
/// overlap of the replicated structure.
pub fn combine<T: MpcField>(shares: [ReplicatedShare<T>; 3]) -> T {
    for party in 0..PARTIES {
        assert_eq!(
            shares[party].b,
            shares[prev_party(party)].a,
            "Inconsistent replicated sharing"
        );
    }
    shares[0].a + shares[1].a + shares[2].a
}

#[cfg(test)]
mod tests {
    use ff::Field;
    use rand::{rngs::SmallRng, SeedableRng};

    use crate::fields::Mersenne61;

    use super::*;

    type Fp = Mersenne61;

    #[test]
    fn test_share_combine_round_trip() {
        let mut rng = SmallRng::from_seed([3; 32]);
        for value in [0u64, 1, 42, 1 << 60] {
            let shares = share_element(Fp::from(value), &mut rng);
            assert_eq!(shares[1].prev_part(), shares[0].own_part());
            assert_eq!(combine(shares), Fp::from(value));
        }
    }

    #[test]
    fn test_share_ops_are_linear() {
        let mut rng = SmallRng::from_seed([4; 32]);
        let x = share_element(Fp::from(100), &mut rng);
        let y = share_element(Fp::from(58), &mut rng);
        let sum = [x[0] + y[0], x[1] + y[1], x[2] + y[2]];
        assert_eq!(combine(sum), Fp::from(158));
        let difference = [x[0] - y[0], x[1] - y[1], x[2] - y[2]];
        assert_eq!(combine(difference), Fp::from(42));
        let negated = [-x[0], -x[1], -x[2]];
        assert_eq!(combine(negated), -Fp::from(100));
        let scaled = [x[0] * Fp::from(3), x[1] * Fp::from(3), x[2] * Fp::from(3)];
        assert_eq!(combine(scaled), Fp::from(300));
        let doubled = [x[0].double(), x[1].double(), x[2].double()];
        assert_eq!(combine(doubled), Fp::from(200));
    }

    #[test]
    fn test_zero_share() {
        let zero = [
            ReplicatedShare::<Fp>::zero(),
            ReplicatedShare::zero(),
            ReplicatedShare::zero(),
        ];
        assert_eq!(combine(zero), Fp::zero());
    }

    #[test]
    #[should_panic(expected = "Inconsistent replicated sharing")]
    fn test_combine_rejects_mismatched_overlap() {
        let mut rng = SmallRng::from_seed([5; 32]);
        let mut shares = share_element(Fp::from(1), &mut rng);
        shares[1] = ReplicatedShare::new(shares[1].a, shares[1].b + Fp::one());
        combine(shares);
    }
}
