//! Outbound transport for the client cache
//!
//! The cache never waits on the network: it hands events to a transport and
//! moves on. The socket task owning the actual connection drains a
//! [`ChannelTransport`] and writes each event as a text frame.

use tokio::sync::mpsc;

use crate::client::error::ClientError;
use crate::shared::event::ClientEvent;

/// Fire-and-forget emission of client events
pub trait ClientTransport: Send + Sync {
    fn emit(&self, event: ClientEvent) -> Result<(), ClientError>;
}

/// Transport backed by an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<ClientEvent>,
}

impl ChannelTransport {
    /// Create a transport and the receiver the socket writer drains
    pub fn pair() -> (Self, mpsc::UnboundedReceiver<ClientEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ClientTransport for ChannelTransport {
    fn emit(&self, event: ClientEvent) -> Result<(), ClientError> {
        let name = event.name();
        self.tx
            .send(event)
            .map_err(|_| ClientError::Transport(format!("connection closed while sending {name}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::event::JoinPayload;

    fn join() -> ClientEvent {
        ClientEvent::Join(JoinPayload {
            id: "u1".into(),
            name: "Ada".into(),
            role: None,
        })
    }

    #[tokio::test]
    async fn test_emit_reaches_receiver() {
        let (transport, mut rx) = ChannelTransport::pair();
        transport.emit(join()).unwrap();
        assert_eq!(rx.recv().await, Some(join()));
    }

    #[test]
    fn test_emit_after_close_fails() {
        let (transport, rx) = ChannelTransport::pair();
        drop(rx);
        assert!(matches!(transport.emit(join()), Err(ClientError::Transport(_))));
    }
}
