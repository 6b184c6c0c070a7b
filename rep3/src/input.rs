use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::{fields::MpcField, transport::TransportError, MpcShare};

/// Round lifecycle contract of input protocols that manufacture their own
/// correlated material instead of consuming preprocessed masks.
///
/// A round is driven as `reset → {add_mine | add_other}* → exchange →
/// {finalize_mine | finalize_other}*`. Collecting after `exchange` or
/// finalizing before it is an error in the driving code, not a runtime
/// condition this layer recovers from; violations panic where they are
/// detectable at all.
#[async_trait]
pub trait InputProtocol {
    /// Field type of the input values.
    type Field: MpcField;

    /// Share type produced by the protocol.
    type Share: MpcShare<Field = Self::Field>;

    /// Clear buffered state held for `party`. Must precede any other call
    /// for that party within a round.
    fn reset(&mut self, party: usize);

    /// Reset state for every party.
    fn reset_all(&mut self);

    /// Provide an own input value. `bits` restricts the random masks to that
    /// many low-order bits; `None` uses the full domain width.
    fn add_mine(&mut self, value: Self::Field, bits: Option<u32>);

    /// Register that `party` provides the next input value.
    fn add_other(&mut self, party: usize, bits: Option<u32>);

    /// Transmit material staged by `add_mine` calls so far. Separable from
    /// `exchange` so transmission can overlap unrelated work; within one
    /// round repeated calls transmit nothing further.
    async fn send_mine(&mut self) -> Result<(), TransportError>;

    /// The single synchronization point of a round: transmits staged
    /// material, then blocks until everything registered by `add_other` has
    /// arrived. Transport failures abort the round as a whole.
    async fn exchange(&mut self) -> Result<(), TransportError>;

    /// Next own share, in `add_mine` call order since the last reset.
    fn finalize_mine(&mut self) -> Self::Share;

    /// Reconstruct the next share contributed by `party`, in `add_other`
    /// call order for that party. `bits` must match the value the owner
    /// passed to `add_mine`.
    fn finalize_other(&mut self, party: usize, bits: Option<u32>) -> Self::Share;
}

/// Counters an input protocol reports to its owning execution context.
#[derive(Debug, Default)]
pub struct InputStats {
    values_input: AtomicUsize,
    exchanges: AtomicUsize,
}

impl InputStats {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total count of values provided through `add_mine`.
    pub fn values_input(&self) -> usize {
        self.values_input.load(Ordering::Relaxed)
    }

    /// Total number of exchange rounds performed.
    pub fn exchanges(&self) -> usize {
        self.exchanges.load(Ordering::Relaxed)
    }

    pub(crate) fn record_value(&self) {
        self.values_input.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_exchange(&self) {
        self.exchanges.fetch_add(1, Ordering::Relaxed);
    }
}

/// Append-only buffer read by a forward-only cursor.
/// Entries keep insertion order; reading past the last appended entry is a
/// contract violation.
pub struct Fifo<T> {
    items: Vec<T>,
    read: usize,
}

impl<T> Fifo<T> {
    /// Create empty buffer.
    pub fn new() -> Self {
        Fifo {
            items: Vec::new(),
            read: 0,
        }
    }

    /// Append one entry.
    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// Append a batch of entries.
    pub fn extend(&mut self, items: impl IntoIterator<Item = T>) {
        self.items.extend(items);
    }

    /// Read the next unread entry.
    pub fn pop(&mut self) -> T
    where
        T: Copy,
    {
        assert!(
            self.read < self.items.len(),
            "Buffer drained past the last entry"
        );
        let item = self.items[self.read];
        self.read += 1;
        item
    }

    /// Number of entries not read yet.
    pub fn remaining(&self) -> usize {
        self.items.len() - self.read
    }

    /// Drop all entries and rewind the cursor.
    pub fn clear(&mut self) {
        self.items.clear();
        self.read = 0;
    }
}

impl<T> Default for Fifo<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_keeps_insertion_order() {
        let mut buffer = Fifo::new();
        buffer.push(1);
        buffer.extend([2, 3]);
        assert_eq!(buffer.remaining(), 3);
        assert_eq!(buffer.pop(), 1);
        assert_eq!(buffer.pop(), 2);
        buffer.push(4);
        assert_eq!(buffer.pop(), 3);
        assert_eq!(buffer.pop(), 4);
        assert_eq!(buffer.remaining(), 0);
    }

    #[test]
    #[should_panic(expected = "drained past the last entry")]
    fn test_fifo_over_drain_panics() {
        let mut buffer = Fifo::new();
        buffer.push(1);
        buffer.pop();
        buffer.pop();
    }

    #[test]
    fn test_fifo_clear_rewinds_cursor() {
        let mut buffer = Fifo::new();
        buffer.extend([1, 2]);
        buffer.pop();
        buffer.clear();
        assert_eq!(buffer.remaining(), 0);
        buffer.push(5);
        assert_eq!(buffer.pop(), 5);
    }

    #[test]
    fn test_stats_counters() {
        let stats = InputStats::new();
        stats.record_value();
        stats.record_value();
        stats.record_exchange();
        assert_eq!(stats.values_input(), 2);
        assert_eq!(stats.exchanges(), 1);
    }
}
