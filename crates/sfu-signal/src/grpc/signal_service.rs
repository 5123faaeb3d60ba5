//! The `rtc.RtcSignal` service: one signaling session per connection.

use crate::cluster::EventDispatch;
use crate::media::MediaEngine;
use crate::signal::{ReplySink, SignalingSession};
use signal_proto::rtc::rtc_signal_server::RtcSignal;
use signal_proto::rtc::{SignalReply, SignalRequest};
use std::sync::Arc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tonic::{Request, Response, Status, Streaming};
use tracing::debug;

/// Mountable signaling service. Each `Signal` call gets a fresh media
/// peer from the engine and a session task that lives as long as the
/// client's stream.
pub struct SignalingService<E> {
    node_id: String,
    engine: Arc<E>,
    events: Arc<dyn EventDispatch>,
}

impl<E> SignalingService<E> {
    pub fn new(node_id: impl Into<String>, engine: Arc<E>, events: Arc<dyn EventDispatch>) -> Self {
        Self {
            node_id: node_id.into(),
            engine,
            events,
        }
    }
}

#[tonic::async_trait]
impl<E: MediaEngine> RtcSignal for SignalingService<E> {
    type SignalStream = UnboundedReceiverStream<Result<SignalReply, Status>>;

    async fn signal(
        &self,
        request: Request<Streaming<SignalRequest>>,
    ) -> Result<Response<Self::SignalStream>, Status> {
        debug!(target: "signal", remote = ?request.remote_addr(), "signal stream opened");

        let inbound = request.into_inner();
        let (replies, rx) = ReplySink::channel();
        let session = SignalingSession::new(
            self.node_id.clone(),
            self.engine.new_peer(),
            Arc::clone(&self.events),
            replies,
        );
        tokio::spawn(session.run(inbound));

        Ok(Response::new(UnboundedReceiverStream::new(rx)))
    }
}
