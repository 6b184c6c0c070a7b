use std::mem;

use async_trait::async_trait;
use futures::{Sink, Stream};

use crate::{
    fields::MpcField,
    input::{Fifo, InputProtocol, InputStats},
    transport::{MultipartyTransport, TransportError},
    MpcContext,
};

use super::{next_party, prev_party, CorrelatedPrng, ReplicatedMessage, ReplicatedShare, PARTIES};

/// Replicated three-party input protocol.
///
/// For a value `v` provided by party `p`, the additive sub-shares are laid
/// out on the ring as `x_p = r`, `x_{p+1} = 0`, `x_{p+2} = v - r`. The next
/// neighbor derives the mask `r` from the stream it shares with `p`, so only
/// the corrective sub-share `v - r` travels, to the previous neighbor. That
/// is one domain element on the wire per value instead of two.
pub struct ReplicatedInput<'a, T, C> {
    stats: Option<&'a InputStats>,
    transport: &'a mut MultipartyTransport<ReplicatedMessage<T>, C>,
    prngs: CorrelatedPrng,
    shares: Fifo<ReplicatedShare<T>>,
    outbound: Vec<Vec<T>>,
    inbound: Vec<Fifo<T>>,
    expect: Vec<bool>,
}

impl<'a, T: MpcField, C> ReplicatedInput<'a, T, C> {
    /// Standalone instance without an owning execution context.
    pub fn new(
        transport: &'a mut MultipartyTransport<ReplicatedMessage<T>, C>,
        base: &CorrelatedPrng,
    ) -> Self {
        Self::create(transport, base, None)
    }

    /// Instance reporting its counters to an owning execution context.
    pub fn with_stats(
        transport: &'a mut MultipartyTransport<ReplicatedMessage<T>, C>,
        base: &CorrelatedPrng,
        stats: &'a InputStats,
    ) -> Self {
        Self::create(transport, base, Some(stats))
    }

    fn create(
        transport: &'a mut MultipartyTransport<ReplicatedMessage<T>, C>,
        base: &CorrelatedPrng,
        stats: Option<&'a InputStats>,
    ) -> Self {
        assert_eq!(
            transport.num_parties(),
            PARTIES,
            "Replicated sharing requires exactly {} parties",
            PARTIES
        );
        let mut input = ReplicatedInput {
            stats,
            transport,
            prngs: base.branch(),
            shares: Fifo::new(),
            outbound: (0..PARTIES).map(|_| Vec::new()).collect(),
            inbound: (0..PARTIES).map(|_| Fifo::new()).collect(),
            expect: vec![false; PARTIES],
        };
        for party in 0..PARTIES {
            input.clear_party(party);
        }
        input
    }

    /// Drop buffered state held for `party`.
    fn clear_party(&mut self, party: usize) {
        if party == self.transport.party_id() {
            self.shares.clear();
        }
        self.outbound[party].clear();
        self.inbound[party].clear();
        self.expect[party] = false;
    }
}

impl<'a, T: MpcField, C> MpcContext for ReplicatedInput<'a, T, C> {
    type Field = T;
    type Share = ReplicatedShare<T>;

    fn num_parties(&self) -> usize {
        self.transport.num_parties()
    }

    fn party_id(&self) -> usize {
        self.transport.party_id()
    }
}

#[async_trait]
impl<'a, T, E, C> InputProtocol for ReplicatedInput<'a, T, C>
where
    T: MpcField,
    E: Send,
    C: Stream<Item = Result<ReplicatedMessage<T>, E>> + Sink<ReplicatedMessage<T>> + Unpin + Send,
{
    type Field = T;
    type Share = ReplicatedShare<T>;

    fn reset(&mut self, party: usize) {
        self.clear_party(party);
    }

    fn reset_all(&mut self) {
        for party in 0..self.num_parties() {
            self.clear_party(party);
        }
    }

    fn add_mine(&mut self, value: T, bits: Option<u32>) {
        let me = self.party_id();
        let mask: T = self.prngs.gen_next(bits);
        let corrective = value - mask;
        self.shares.push(ReplicatedShare::new(mask, corrective));
        self.outbound[prev_party(me)].push(corrective);
        if let Some(stats) = self.stats {
            stats.record_value();
        }
    }

    fn add_other(&mut self, party: usize, _bits: Option<u32>) {
        assert_ne!(party, self.party_id(), "add_other called with own party ID");
        self.expect[party] = true;
    }

    async fn send_mine(&mut self) -> Result<(), TransportError> {
        for party in 0..self.num_parties() {
            if self.outbound[party].is_empty() {
                continue;
            }
            let staged = mem::take(&mut self.outbound[party]);
            tracing::trace!(to = party, count = staged.len(), "sending corrective sub-shares");
            self.transport
                .send_to(party, ReplicatedMessage::Input(staged))
                .await?;
        }
        Ok(())
    }

    async fn exchange(&mut self) -> Result<(), TransportError> {
        self.send_mine().await?;
        let me = self.party_id();
        for party in 0..self.num_parties() {
            // Only the next ring-neighbor ever owes wire material; the
            // previous neighbor's contribution is derived locally.
            if !self.expect[party] || party != next_party(me) {
                continue;
            }
            match self.transport.receive_from(party).await? {
                ReplicatedMessage::Input(correctives) => {
                    tracing::trace!(from = party, count = correctives.len(), "received corrective sub-shares");
                    self.inbound[party].extend(correctives);
                }
                _ => panic!("Unexpected message"),
            }
        }
        if let Some(stats) = self.stats {
            stats.record_exchange();
        }
        Ok(())
    }

    fn finalize_mine(&mut self) -> ReplicatedShare<T> {
        self.shares.pop()
    }

    fn finalize_other(&mut self, party: usize, bits: Option<u32>) -> ReplicatedShare<T> {
        let me = self.party_id();
        if party == prev_party(me) {
            // The owner is our previous neighbor: its mask comes out of the
            // stream we share with it, nothing was transmitted.
            let mask: T = self.prngs.gen_prev(bits);
            ReplicatedShare::new(T::zero(), mask)
        } else if party == next_party(me) {
            let corrective = self.inbound[party].pop();
            ReplicatedShare::new(corrective, T::zero())
        } else {
            panic!("finalize_other called with own party ID");
        }
    }
}
