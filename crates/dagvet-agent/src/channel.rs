use tokio::sync::mpsc;

use crate::error::ChannelError;

/// Outbound half of the host connection.
///
/// The agent writes complete envelope buffers here; framing is already done.
pub trait HostChannel: Send + Sync {
    fn send_bytes(&self, bytes: Vec<u8>) -> Result<(), ChannelError>;
}

/// In-process channel backed by an unbounded tokio mpsc queue.
#[derive(Clone, Debug)]
pub struct MemoryChannel {
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl MemoryChannel {
    /// Create a channel and the receiver the host reads from.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl HostChannel for MemoryChannel {
    fn send_bytes(&self, bytes: Vec<u8>) -> Result<(), ChannelError> {
        self.tx.send(bytes).map_err(|_| ChannelError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_in_order() {
        let (channel, mut rx) = MemoryChannel::new();
        channel.send_bytes(vec![1]).unwrap();
        channel.send_bytes(vec![2]).unwrap();
        assert_eq!(rx.try_recv().unwrap(), vec![1]);
        assert_eq!(rx.try_recv().unwrap(), vec![2]);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_receiver_is_reported() {
        let (channel, rx) = MemoryChannel::new();
        drop(rx);
        assert_eq!(channel.send_bytes(vec![0]), Err(ChannelError::Closed));
    }
}
