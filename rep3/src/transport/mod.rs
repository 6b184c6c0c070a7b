mod config;
mod networking;

pub use config::{NetworkConfig, NetworkPartyConfig};
pub use networking::{connect_multiparty, NetChannel};

use std::fmt;

use futures::{
    stream::{SplitSink, SplitStream},
    Sink, SinkExt, Stream, StreamExt,
};
use serde::{de::DeserializeOwned, Serialize};
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream};
use tokio_serde::formats::Bincode;
use tokio_util::codec::LengthDelimitedCodec;

/// Error type for channels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportError {
    Send(usize),
    Recv(usize),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Send(id) => write!(f, "Error while sending message to {}", id),
            Self::Recv(id) => write!(f, "Error while receiving message from {}", id),
        }
    }
}

impl std::error::Error for TransportError {}

/// Wrapper for peer-to-peer connections in a multi-party protocol.
/// All exchanges are point-to-point; there is no broadcast primitive.
pub struct MultipartyTransport<T, Channel> {
    channels: Vec<Option<(SplitSink<Channel, T>, SplitStream<Channel>)>>,
    party_id: usize,
}

impl<T, Channel> MultipartyTransport<T, Channel>
where
    Channel: Stream + Sink<T>,
{
    /// Create wrapper for given list of connections. All channels but party_id should be present.
    pub fn new(channels: impl IntoIterator<Item = Option<Channel>>, party_id: usize) -> Self {
        // Streams are split into unidirectional halves so sends and receives
        // can be awaited independently without fighting the borrow checker.
        let channels: Vec<_> = channels.into_iter().map(|x| x.map(|x| x.split())).collect();
        for (j, channel) in channels.iter().enumerate() {
            if j != party_id && channel.is_none() {
                panic!("Channel missing for party {}", j);
            }
        }
        Self { channels, party_id }
    }
}

impl<T, Channel> MultipartyTransport<T, Channel> {
    /// Number of parties participating in multi-party protocol.
    pub fn num_parties(&self) -> usize {
        self.channels.len()
    }

    /// ID of current party.
    pub fn party_id(&self) -> usize {
        self.party_id
    }
}

impl<T, E, Channel> MultipartyTransport<T, Channel>
where
    Channel: Stream<Item = Result<T, E>> + Sink<T> + Unpin,
{
    /// Send message to party with given ID.
    pub async fn send_to(&mut self, other_id: usize, msg: T) -> Result<(), TransportError> {
        if other_id == self.party_id {
            panic!("Cannot send message on loopback");
        }
        tracing::trace!(from = self.party_id, to = other_id, "sending message");
        let (sink, _) = self.channels[other_id].as_mut().unwrap();
        sink.send(msg)
            .await
            .map_err(|_| TransportError::Send(other_id))
    }

    /// Receive message from party with given ID.
    pub async fn receive_from(&mut self, other_id: usize) -> Result<T, TransportError> {
        if other_id == self.party_id {
            panic!("Cannot receive message on loopback");
        }
        tracing::trace!(at = self.party_id, from = other_id, "awaiting message");
        let (_, stream) = self.channels[other_id].as_mut().unwrap();
        match stream.next().await {
            Some(Ok(msg)) => Ok(msg),
            _ => Err(TransportError::Recv(other_id)),
        }
    }
}

/// Length-framed Bincode-encoded messages channel.
pub type BincodeStreamSink<T, C> =
    tokio_serde::Framed<tokio_util::codec::Framed<C, LengthDelimitedCodec>, T, T, Bincode<T, T>>;

/// Length-framed Bincode-encoded tokio's Duplex stream.
pub type BincodeDuplex<T> = BincodeStreamSink<T, DuplexStream>;

/// Create length-framed Bincode-encoded message channel from AsyncRead/Write.
pub fn wrap_bincode<T, C>(channel: C) -> BincodeStreamSink<T, C>
where
    C: AsyncRead + AsyncWrite,
{
    let length_delimited = tokio_util::codec::Framed::new(channel, LengthDelimitedCodec::new());
    tokio_serde::Framed::new(length_delimited, Bincode::default())
}

/// Create bidirectional Bincode-encoded channel.
pub fn bincode_duplex<T>(max_buf_size: usize) -> (BincodeDuplex<T>, BincodeDuplex<T>) {
    let (a, b) = tokio::io::duplex(max_buf_size);
    (wrap_bincode(a), wrap_bincode(b))
}

/// Create in-process channels for testing multiparty protocols.
pub fn mock_multiparty_channels<T>(
    num_parties: usize,
    max_buf_size: usize,
) -> Vec<MultipartyTransport<T, BincodeDuplex<T>>>
where
    T: Serialize + DeserializeOwned + Unpin,
{
    let mut matrix: Vec<Vec<_>> = (0..num_parties)
        .map(|_| (0..num_parties).map(|_| None).collect())
        .collect();

    for i in 0..num_parties {
        for j in 0..i {
            let (a, b) = bincode_duplex::<T>(max_buf_size);
            matrix[i][j] = Some(a);
            matrix[j][i] = Some(b);
        }
    }

    matrix
        .into_iter()
        .enumerate()
        .map(|(id, row)| MultipartyTransport::new(row, id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_channels_point_to_point() {
        let mut transports = mock_multiparty_channels::<Vec<u64>>(3, 1 << 16);
        let mut third = transports.pop().unwrap();
        let mut second = transports.pop().unwrap();
        let mut first = transports.pop().unwrap();

        first.send_to(1, vec![1, 2, 3]).await.unwrap();
        second.send_to(2, vec![4]).await.unwrap();
        assert_eq!(second.receive_from(0).await.unwrap(), vec![1, 2, 3]);
        assert_eq!(third.receive_from(1).await.unwrap(), vec![4]);

        assert_eq!(first.num_parties(), 3);
        assert_eq!(third.party_id(), 2);
    }

    #[tokio::test]
    #[should_panic(expected = "loopback")]
    async fn test_loopback_send_panics() {
        let mut transports = mock_multiparty_channels::<Vec<u64>>(3, 1 << 16);
        let _ = transports[0].send_to(0, vec![]).await;
    }
}
