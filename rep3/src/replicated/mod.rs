mod input;
mod prng;
mod share;

pub use input::ReplicatedInput;
pub use prng::CorrelatedPrng;
pub use share::{combine, share_element, ReplicatedShare};

use serde::{Deserialize, Serialize};

/// Number of parties in the replicated scheme.
pub const PARTIES: usize = 3;

/// Replicated protocol message.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ReplicatedMessage<T> {
    /// Stream seed handed to the next ring-neighbor during setup.
    Seed([u8; 32]),
    /// Corrective sub-shares of one input round, in `add_mine` order.
    Input(Vec<T>),
}

/// Ring successor of `party`.
pub fn next_party(party: usize) -> usize {
    (party + 1) % PARTIES
}

/// Ring predecessor of `party`.
pub fn prev_party(party: usize) -> usize {
    (party + PARTIES - 1) % PARTIES
}

#[cfg(test)]
mod tests {
    use crate::fields::Mersenne61;

    use super::*;

    #[test]
    fn test_ring_neighbors() {
        for party in 0..PARTIES {
            assert_eq!(prev_party(next_party(party)), party);
            assert_ne!(next_party(party), party);
            assert_ne!(prev_party(party), party);
        }
    }

    #[test]
    fn test_wire_format_one_element_per_value() {
        let corrective = Mersenne61::from(12345);
        let sizes: Vec<u64> = (1..4)
            .map(|n| {
                let msg = ReplicatedMessage::Input(vec![corrective; n]);
                bincode::serialized_size(&msg).unwrap()
            })
            .collect();
        // Fixed-width element encoding: enum tag, length prefix, 8 bytes per
        // corrective value, nothing else.
        assert_eq!(sizes[0], 4 + 8 + 8);
        assert_eq!(sizes[1] - sizes[0], 8);
        assert_eq!(sizes[2] - sizes[1], 8);
    }
}
