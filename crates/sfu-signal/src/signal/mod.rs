//! Signaling over one bidirectional gRPC stream.
//!
//! Inbound frames arrive through the [`SignalStream`] seam; everything
//! outbound goes through a [`ReplySink`], which serializes writes from
//! the read loop and the media-engine callbacks onto a single channel
//! feeding the response stream.

use async_trait::async_trait;
use signal_proto::rtc::{signal_reply, SignalReply, SignalRequest};
use tokio::sync::mpsc;
use tonic::Status;
use tracing::debug;

pub mod session;

pub use session::SignalingSession;

/// Cloneable writer for the outbound half of a signaling stream.
///
/// The read loop and the engine callbacks all hold clones; the channel
/// provides the write ordering, so no frame interleaves mid-message.
/// Sending after the receiver is gone is a no-op.
#[derive(Clone)]
pub struct ReplySink {
    tx: mpsc::UnboundedSender<Result<SignalReply, Status>>,
}

impl ReplySink {
    /// New sink plus the receiver that feeds the response stream.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Result<SignalReply, Status>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue one reply frame.
    pub fn send(&self, reply: SignalReply) {
        if self.tx.send(Ok(reply)).is_err() {
            debug!(target: "signal", "reply dropped, client stream closed");
        }
    }

    /// Queue a recoverable in-band error frame. The stream stays open.
    pub fn error(&self, message: impl Into<String>) {
        self.send(SignalReply {
            id: String::new(),
            payload: Some(signal_reply::Payload::Error(message.into())),
        });
    }

    /// Terminate the RPC with `status`. Frames queued afterwards never
    /// reach the client.
    pub fn fail(&self, status: Status) {
        let _ = self.tx.send(Err(status));
    }
}

/// Inbound half of a signaling stream.
///
/// `Ok(None)` is a clean end of stream. Implemented for
/// `tonic::Streaming`; unit tests drive sessions with scripted frames.
#[async_trait]
pub trait SignalStream: Send + 'static {
    async fn next_request(&mut self) -> Result<Option<SignalRequest>, Status>;
}

#[async_trait]
impl SignalStream for tonic::Streaming<SignalRequest> {
    async fn next_request(&mut self) -> Result<Option<SignalRequest>, Status> {
        self.message().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_error_frames_carry_no_correlation_id() {
        let (sink, mut rx) = ReplySink::channel();
        sink.error("join error: transport already exists");

        let reply = rx.recv().await.unwrap().unwrap();
        assert!(reply.id.is_empty());
        assert!(matches!(
            reply.payload,
            Some(signal_reply::Payload::Error(msg)) if msg.contains("transport already exists")
        ));
    }

    #[tokio::test]
    async fn test_fail_surfaces_the_status() {
        let (sink, mut rx) = ReplySink::channel();
        sink.fail(Status::internal("answer error"));

        let status = rx.recv().await.unwrap().unwrap_err();
        assert_eq!(status.code(), tonic::Code::Internal);
    }

    #[tokio::test]
    async fn test_send_after_receiver_dropped_is_a_no_op() {
        let (sink, rx) = ReplySink::channel();
        drop(rx);
        sink.send(SignalReply::default());
        sink.fail(Status::cancelled("gone"));
    }
}
