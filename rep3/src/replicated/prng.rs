use futures::{Sink, Stream};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    fields::MpcField,
    transport::{MultipartyTransport, TransportError},
};

use super::{next_party, prev_party, ReplicatedMessage, PARTIES};

/// Pair of pseudorandom streams correlated with the two ring-neighbors.
/// Both ends of a stream start from the same seed and advance in lockstep,
/// so neighbor pairs generate identical values with no communication.
pub struct CorrelatedPrng {
    next: StdRng,
    prev: StdRng,
}

impl CorrelatedPrng {
    /// Build the stream pair from explicit seeds.
    pub fn from_seeds(next: [u8; 32], prev: [u8; 32]) -> Self {
        CorrelatedPrng {
            next: StdRng::from_seed(next),
            prev: StdRng::from_seed(prev),
        }
    }

    /// Establish the neighbor streams over the network: generate a fresh
    /// seed no other party can predict, hand it to the next ring-neighbor
    /// and adopt the one received from the previous ring-neighbor.
    #[tracing::instrument(skip(transport))]
    pub async fn setup<T, E, C>(
        transport: &mut MultipartyTransport<ReplicatedMessage<T>, C>,
    ) -> Result<Self, TransportError>
    where
        C: Stream<Item = Result<ReplicatedMessage<T>, E>> + Sink<ReplicatedMessage<T>> + Unpin,
    {
        assert_eq!(
            transport.num_parties(),
            PARTIES,
            "Correlated streams require exactly {} parties",
            PARTIES
        );
        let me = transport.party_id();
        let own_seed: [u8; 32] = StdRng::from_entropy().gen();
        transport
            .send_to(next_party(me), ReplicatedMessage::Seed(own_seed))
            .await?;
        let received_seed = match transport.receive_from(prev_party(me)).await? {
            ReplicatedMessage::Seed(seed) => seed,
            _ => panic!("Unexpected message"),
        };
        tracing::debug!(party_id = me, "correlated streams established");
        Ok(Self::from_seeds(own_seed, received_seed))
    }

    /// Derive an independent child pair without advancing this base.
    /// Identical base states yield identical children, which keeps both ends
    /// of each stream aligned. A child must be owned by exactly one protocol
    /// instance for that instance's whole lifetime; deriving two children
    /// from one base state would replay the same streams.
    pub fn branch(&self) -> Self {
        let mut next = self.next.clone();
        let mut prev = self.prev.clone();
        CorrelatedPrng {
            next: StdRng::from_seed(next.gen()),
            prev: StdRng::from_seed(prev.gen()),
        }
    }

    /// Element from the stream shared with the next ring-neighbor.
    pub fn gen_next<T: MpcField>(&mut self, bits: Option<u32>) -> T {
        T::random_masked(&mut self.next, bits)
    }

    /// Element from the stream shared with the previous ring-neighbor.
    pub fn gen_prev<T: MpcField>(&mut self, bits: Option<u32>) -> T {
        T::random_masked(&mut self.prev, bits)
    }
}

#[cfg(test)]
mod tests {
    use crate::fields::Mersenne61;

    use super::*;

    fn draw_sequence(prng: &mut CorrelatedPrng, count: usize) -> Vec<Mersenne61> {
        (0..count).map(|_| prng.gen_next(None)).collect()
    }

    #[test]
    fn test_branching_is_deterministic() {
        let base = CorrelatedPrng::from_seeds([1; 32], [2; 32]);
        let mut first = base.branch();
        let mut second = base.branch();
        assert_eq!(draw_sequence(&mut first, 32), draw_sequence(&mut second, 32));
    }

    #[test]
    fn test_distinct_bases_are_independent() {
        let mut first = CorrelatedPrng::from_seeds([1; 32], [2; 32]).branch();
        let mut second = CorrelatedPrng::from_seeds([3; 32], [2; 32]).branch();
        let left = draw_sequence(&mut first, 32);
        let right = draw_sequence(&mut second, 32);
        assert!(left.iter().zip(&right).all(|(a, b)| a != b));
    }

    #[test]
    fn test_stream_ends_stay_aligned() {
        // The stream one party shares with its next neighbor is the same
        // stream that neighbor addresses as its previous one.
        let seed = [7; 32];
        let mut owner = CorrelatedPrng::from_seeds(seed, [0; 32]).branch();
        let mut neighbor = CorrelatedPrng::from_seeds([9; 32], seed).branch();
        for _ in 0..32 {
            let drawn: Mersenne61 = owner.gen_next(Some(24));
            let derived: Mersenne61 = neighbor.gen_prev(Some(24));
            assert_eq!(drawn, derived);
        }
    }
}
