//! Per-connection signaling session.

use crate::cluster::EventDispatch;
use crate::media::{
    sdp, IceCandidateInit, MediaPeer, NegotiationError, SdpType, SessionDescription,
};
use signal_proto::rtc::{
    cluster_event, signal_reply, signal_request, ClusterEvent, JoinRequest, SignalReply,
    SignalRequest, Stream, StreamEvent, StreamState, Trickle, TrickleTarget,
};
use std::sync::Arc;
use tonic::{Code, Status};
use tracing::{debug, error, info, warn};

use super::{ReplySink, SignalStream};

/// Drives one signaling connection from first frame to teardown.
///
/// A session starts unbound, binds its media peer on the first
/// successful `Join`, then relays negotiation rounds until the client
/// goes away or a fatal error ends the RPC. Negotiation failures the
/// client can act on come back as in-band `Error` frames; everything
/// else terminates the stream with a gRPC status.
pub struct SignalingSession<P> {
    node_id: String,
    peer: P,
    replies: ReplySink,
    events: Arc<dyn EventDispatch>,
    /// Streams announced by the last offer, reported as REMOVE on
    /// teardown.
    streams: Vec<Stream>,
}

impl<P: MediaPeer> SignalingSession<P> {
    pub fn new(
        node_id: impl Into<String>,
        peer: P,
        events: Arc<dyn EventDispatch>,
        replies: ReplySink,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            peer,
            replies,
            events,
            streams: Vec::new(),
        }
    }

    /// Consume inbound frames until the stream ends, then tear down.
    ///
    /// A clean end of stream and client cancellation close silently;
    /// other transport errors and fatal handler errors terminate the
    /// RPC with a status.
    pub async fn run<S: SignalStream>(mut self, mut stream: S) {
        loop {
            match stream.next_request().await {
                Ok(Some(request)) => {
                    if let Err(status) = self.handle(request).await {
                        self.replies.fail(status);
                        break;
                    }
                }
                Ok(None) => break,
                Err(status) => {
                    if status.code() != Code::Cancelled {
                        error!(target: "signal", code = ?status.code(), error = %status, "signal stream error");
                        self.replies.fail(status);
                    }
                    break;
                }
            }
        }
        self.shutdown().await;
    }

    async fn handle(&mut self, request: SignalRequest) -> Result<(), Status> {
        let SignalRequest { id, payload } = request;
        match payload {
            Some(signal_request::Payload::Join(join)) => self.handle_join(id, join).await,
            Some(signal_request::Payload::Description(description)) => {
                self.handle_description(id, &description).await
            }
            Some(signal_request::Payload::Trickle(trickle)) => self.handle_trickle(trickle).await,
            None => {
                self.replies.error("empty signal request");
                Ok(())
            }
        }
    }

    async fn handle_join(&mut self, id: String, join: JoinRequest) -> Result<(), Status> {
        info!(target: "signal", sid = %join.sid, uid = %join.uid, "join requested");

        let offer: SessionDescription = match serde_json::from_slice(&join.description) {
            Ok(offer) => offer,
            Err(e) => {
                self.replies.error(format!("join sdp unmarshal error: {e}"));
                return Ok(());
            }
        };

        // Callbacks go in before join so no early candidate or
        // renegotiation offer is lost.
        self.register_callbacks();

        match self.peer.join(&join.sid, &join.uid).await {
            Ok(()) => {}
            Err(e @ (NegotiationError::TransportExists | NegotiationError::OfferIgnored)) => {
                self.replies.error(format!("join error: {e}"));
                return Ok(());
            }
            Err(e) => return Err(Status::unknown(e.to_string())),
        }

        let answer = self
            .peer
            .answer(offer)
            .await
            .map_err(|e| Status::internal(format!("answer error: {e}")))?;
        let description = serde_json::to_vec(&answer)
            .map_err(|e| Status::internal(format!("sdp marshal error: {e}")))?;

        self.replies.send(SignalReply {
            id,
            payload: Some(signal_reply::Payload::Join(
                signal_proto::rtc::JoinReply { description },
            )),
        });
        Ok(())
    }

    async fn handle_description(&mut self, id: String, description: &[u8]) -> Result<(), Status> {
        let desc: SessionDescription = match serde_json::from_slice(description) {
            Ok(desc) => desc,
            Err(e) => {
                self.replies
                    .error(format!("negotiate sdp unmarshal error: {e}"));
                return Ok(());
            }
        };

        match desc.sdp_type {
            SdpType::Offer => self.handle_offer(id, desc).await,
            SdpType::Answer => self.handle_answer(desc).await,
            other => {
                debug!(target: "signal", sdp_type = %other, "ignoring description");
                Ok(())
            }
        }
    }

    async fn handle_offer(&mut self, id: String, offer: SessionDescription) -> Result<(), Status> {
        let offer_sdp = offer.sdp.clone();

        let answer = match self.peer.answer(offer).await {
            Ok(answer) => answer,
            Err(
                e @ (NegotiationError::NoTransportEstablished | NegotiationError::OfferIgnored),
            ) => {
                self.replies.error(format!("negotiate answer error: {e}"));
                return Ok(());
            }
            Err(e) => return Err(Status::unknown(format!("negotiate error: {e}"))),
        };

        let description = serde_json::to_vec(&answer)
            .map_err(|e| Status::internal(format!("sdp marshal error: {e}")))?;
        self.replies.send(SignalReply {
            id,
            payload: Some(signal_reply::Payload::Description(description)),
        });

        let new_streams = sdp::parse_streams(&offer_sdp);
        if !new_streams.is_empty() {
            self.publish_stream_event(StreamState::Add, new_streams.clone())
                .await;
            self.streams = new_streams;
        }
        Ok(())
    }

    async fn handle_answer(&mut self, answer: SessionDescription) -> Result<(), Status> {
        match self.peer.set_remote_description(answer).await {
            Ok(()) => Ok(()),
            Err(e @ NegotiationError::NoTransportEstablished) => {
                self.replies
                    .error(format!("set remote description error: {e}"));
                Ok(())
            }
            Err(e) => Err(Status::unknown(e.to_string())),
        }
    }

    async fn handle_trickle(&mut self, trickle: Trickle) -> Result<(), Status> {
        let candidate: IceCandidateInit = match serde_json::from_str(&trickle.init) {
            Ok(candidate) => candidate,
            Err(e) => {
                warn!(target: "signal", error = %e, "malformed ice candidate");
                self.replies
                    .error(format!("unmarshal ice candidate error: {e}"));
                return Ok(());
            }
        };
        let target = TrickleTarget::try_from(trickle.target).unwrap_or_default();

        match self.peer.trickle(target, candidate).await {
            Ok(()) => Ok(()),
            Err(e @ NegotiationError::NoTransportEstablished) => {
                warn!(target: "signal", error = %e, "trickle before transport established");
                self.replies.error(format!("trickle error: {e}"));
                Ok(())
            }
            Err(e) => Err(Status::unknown(format!("negotiate error: {e}"))),
        }
    }

    fn register_callbacks(&self) {
        let replies = self.replies.clone();
        self.peer.on_ice_candidate(Box::new(move |candidate, target| {
            match serde_json::to_string(&candidate) {
                Ok(init) => replies.send(SignalReply {
                    id: String::new(),
                    payload: Some(signal_reply::Payload::Trickle(Trickle {
                        target: target as i32,
                        init,
                    })),
                }),
                Err(e) => error!(target: "signal", error = %e, "ice candidate marshal error"),
            }
        }));

        let replies = self.replies.clone();
        self.peer.on_offer(Box::new(move |offer| {
            match serde_json::to_vec(&offer) {
                Ok(description) => replies.send(SignalReply {
                    id: String::new(),
                    payload: Some(signal_reply::Payload::Description(description)),
                }),
                Err(e) => replies.error(format!("offer sdp marshal error: {e}")),
            }
        }));

        let replies = self.replies.clone();
        self.peer
            .on_ice_connection_state_change(Box::new(move |state| {
                replies.send(SignalReply {
                    id: String::new(),
                    payload: Some(signal_reply::Payload::IceConnectionState(state.to_string())),
                });
            }));
    }

    async fn publish_stream_event(&self, state: StreamState, streams: Vec<Stream>) {
        let event = StreamEvent {
            state: state as i32,
            nid: self.node_id.clone(),
            sid: self.peer.session_id().unwrap_or_default(),
            uid: self.peer.id().unwrap_or_default(),
            streams,
        };
        self.events
            .publish(ClusterEvent {
                payload: Some(cluster_event::Payload::Stream(event)),
            })
            .await;
    }

    async fn shutdown(mut self) {
        self.peer.close().await;
        if self.peer.session_id().is_some() {
            let streams = std::mem::take(&mut self.streams);
            self.publish_stream_event(StreamState::Remove, streams).await;
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::media::{
        IceConnectionState, OnIceCandidate, OnIceConnectionStateChange, OnOffer,
    };
    use async_trait::async_trait;
    use signal_proto::rtc::{signal_request, JoinRequest};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::mpsc::UnboundedReceiver;

    const OFFER_SDP: &str = "v=0\r\nm=video 9 RTP 96\r\na=msid:stream-a track-v\r\n";

    #[derive(Default)]
    struct FakePeerState {
        sid: Option<String>,
        uid: Option<String>,
        on_ice_candidate: Option<OnIceCandidate>,
        on_offer: Option<OnOffer>,
        on_state_change: Option<OnIceConnectionStateChange>,
        candidates: Vec<(TrickleTarget, IceCandidateInit)>,
        remote_descriptions: Vec<SessionDescription>,
    }

    #[derive(Default)]
    struct FakePeer {
        state: Mutex<FakePeerState>,
        join_error: Option<NegotiationError>,
        close_calls: AtomicUsize,
    }

    impl FakePeer {
        fn joining_fails_with(error: NegotiationError) -> Self {
            Self {
                join_error: Some(error),
                ..Self::default()
            }
        }

        fn fire_ice_candidate(&self, candidate: IceCandidateInit) {
            let state = self.state.lock().unwrap();
            if let Some(cb) = state.on_ice_candidate.as_ref() {
                cb(candidate, TrickleTarget::Publisher);
            }
        }

        fn fire_offer(&self, offer: SessionDescription) {
            let state = self.state.lock().unwrap();
            if let Some(cb) = state.on_offer.as_ref() {
                cb(offer);
            }
        }

        fn fire_state_change(&self, ice: IceConnectionState) {
            let state = self.state.lock().unwrap();
            if let Some(cb) = state.on_state_change.as_ref() {
                cb(ice);
            }
        }
    }

    #[async_trait]
    impl MediaPeer for Arc<FakePeer> {
        fn on_ice_candidate(&self, f: OnIceCandidate) {
            self.state.lock().unwrap().on_ice_candidate = Some(f);
        }

        fn on_offer(&self, f: OnOffer) {
            self.state.lock().unwrap().on_offer = Some(f);
        }

        fn on_ice_connection_state_change(&self, f: OnIceConnectionStateChange) {
            self.state.lock().unwrap().on_state_change = Some(f);
        }

        fn id(&self) -> Option<String> {
            self.state.lock().unwrap().uid.clone()
        }

        fn session_id(&self) -> Option<String> {
            self.state.lock().unwrap().sid.clone()
        }

        async fn join(&self, sid: &str, uid: &str) -> Result<(), NegotiationError> {
            if let Some(e) = self.join_error.as_ref() {
                return Err(clone_error(e));
            }
            let mut state = self.state.lock().unwrap();
            state.sid = Some(sid.to_string());
            state.uid = Some(uid.to_string());
            Ok(())
        }

        async fn answer(
            &self,
            _offer: SessionDescription,
        ) -> Result<SessionDescription, NegotiationError> {
            if self.state.lock().unwrap().sid.is_none() {
                return Err(NegotiationError::NoTransportEstablished);
            }
            Ok(SessionDescription {
                sdp_type: SdpType::Answer,
                sdp: "v=0\r\n".to_string(),
            })
        }

        async fn set_remote_description(
            &self,
            desc: SessionDescription,
        ) -> Result<(), NegotiationError> {
            let mut state = self.state.lock().unwrap();
            if state.sid.is_none() {
                return Err(NegotiationError::NoTransportEstablished);
            }
            state.remote_descriptions.push(desc);
            Ok(())
        }

        async fn trickle(
            &self,
            target: TrickleTarget,
            candidate: IceCandidateInit,
        ) -> Result<(), NegotiationError> {
            let mut state = self.state.lock().unwrap();
            if state.sid.is_none() {
                return Err(NegotiationError::NoTransportEstablished);
            }
            state.candidates.push((target, candidate));
            Ok(())
        }

        async fn close(&self) {
            self.close_calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn clone_error(e: &NegotiationError) -> NegotiationError {
        match e {
            NegotiationError::TransportExists => NegotiationError::TransportExists,
            NegotiationError::OfferIgnored => NegotiationError::OfferIgnored,
            NegotiationError::NoTransportEstablished => NegotiationError::NoTransportEstablished,
            NegotiationError::Engine(msg) => NegotiationError::Engine(msg.clone()),
        }
    }

    struct ScriptedStream(VecDeque<Result<Option<SignalRequest>, Status>>);

    impl ScriptedStream {
        fn of(frames: Vec<SignalRequest>) -> Self {
            Self(frames.into_iter().map(|f| Ok(Some(f))).collect())
        }

        fn ending_with(mut self, error: Status) -> Self {
            self.0.push_back(Err(error));
            self
        }
    }

    #[async_trait]
    impl SignalStream for ScriptedStream {
        async fn next_request(&mut self) -> Result<Option<SignalRequest>, Status> {
            self.0.pop_front().unwrap_or(Ok(None))
        }
    }

    #[derive(Default)]
    struct RecordingDispatch {
        events: Mutex<Vec<ClusterEvent>>,
    }

    impl RecordingDispatch {
        fn stream_events(&self) -> Vec<StreamEvent> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter_map(|e| match &e.payload {
                    Some(cluster_event::Payload::Stream(s)) => Some(s.clone()),
                    _ => None,
                })
                .collect()
        }
    }

    #[async_trait]
    impl EventDispatch for RecordingDispatch {
        async fn publish(&self, event: ClusterEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn join_frame(id: &str, sid: &str, uid: &str) -> SignalRequest {
        SignalRequest {
            id: id.to_string(),
            payload: Some(signal_request::Payload::Join(JoinRequest {
                sid: sid.to_string(),
                uid: uid.to_string(),
                description: serde_json::to_vec(&SessionDescription {
                    sdp_type: SdpType::Offer,
                    sdp: "v=0\r\n".to_string(),
                })
                .unwrap(),
            })),
        }
    }

    fn offer_frame(id: &str, sdp: &str) -> SignalRequest {
        SignalRequest {
            id: id.to_string(),
            payload: Some(signal_request::Payload::Description(
                serde_json::to_vec(&SessionDescription {
                    sdp_type: SdpType::Offer,
                    sdp: sdp.to_string(),
                })
                .unwrap(),
            )),
        }
    }

    fn trickle_frame(candidate: &str) -> SignalRequest {
        SignalRequest {
            id: String::new(),
            payload: Some(signal_request::Payload::Trickle(Trickle {
                target: TrickleTarget::Publisher as i32,
                init: format!(r#"{{"candidate":"{candidate}"}}"#),
            })),
        }
    }

    struct Harness {
        peer: Arc<FakePeer>,
        dispatch: Arc<RecordingDispatch>,
        replies: UnboundedReceiver<Result<SignalReply, Status>>,
    }

    async fn run_session(peer: FakePeer, stream: ScriptedStream) -> Harness {
        let peer = Arc::new(peer);
        let dispatch = Arc::new(RecordingDispatch::default());
        let (sink, replies) = ReplySink::channel();
        let session = SignalingSession::new(
            "sfu-1",
            Arc::clone(&peer),
            Arc::clone(&dispatch) as Arc<dyn EventDispatch>,
            sink,
        );
        session.run(stream).await;
        Harness {
            peer,
            dispatch,
            replies,
        }
    }

    fn drain(rx: &mut UnboundedReceiver<Result<SignalReply, Status>>) -> Vec<Result<SignalReply, Status>> {
        let mut out = Vec::new();
        while let Ok(r) = rx.try_recv() {
            out.push(r);
        }
        out
    }

    #[tokio::test]
    async fn test_join_happy_path() {
        let mut h = run_session(
            FakePeer::default(),
            ScriptedStream::of(vec![join_frame("req-1", "room1", "alice")]),
        )
        .await;

        let replies = drain(&mut h.replies);
        let first = replies[0].as_ref().unwrap();
        assert_eq!(first.id, "req-1");
        let Some(signal_reply::Payload::Join(join)) = &first.payload else {
            panic!("expected a join reply");
        };
        let answer: SessionDescription = serde_json::from_slice(&join.description).unwrap();
        assert_eq!(answer.sdp_type, SdpType::Answer);

        // No Error frame anywhere in the exchange.
        assert!(replies.iter().all(|r| !matches!(
            r,
            Ok(SignalReply {
                payload: Some(signal_reply::Payload::Error(_)),
                ..
            })
        )));
        assert_eq!(h.peer.close_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_offer_round_publishes_stream_add() {
        let h = run_session(
            FakePeer::default(),
            ScriptedStream::of(vec![
                join_frame("req-1", "room1", "alice"),
                offer_frame("req-2", OFFER_SDP),
            ]),
        )
        .await;

        let events = h.dispatch.stream_events();
        assert_eq!(events.len(), 2);

        assert_eq!(events[0].state(), StreamState::Add);
        assert_eq!(events[0].nid, "sfu-1");
        assert_eq!(events[0].sid, "room1");
        assert_eq!(events[0].uid, "alice");
        assert_eq!(events[0].streams[0].id, "stream-a");

        // Teardown reports the same streams as removed.
        assert_eq!(events[1].state(), StreamState::Remove);
        assert_eq!(events[1].streams, events[0].streams);
    }

    #[tokio::test]
    async fn test_trickle_before_join_is_recoverable() {
        let mut h = run_session(
            FakePeer::default(),
            ScriptedStream::of(vec![
                trickle_frame("candidate:1"),
                join_frame("req-1", "room1", "alice"),
            ]),
        )
        .await;

        let replies = drain(&mut h.replies);
        assert!(matches!(
            replies[0].as_ref().unwrap().payload,
            Some(signal_reply::Payload::Error(ref msg)) if msg.contains("no transport established")
        ));
        // The stream stayed open: the join after the error succeeded.
        assert!(matches!(
            replies[1].as_ref().unwrap().payload,
            Some(signal_reply::Payload::Join(_))
        ));
    }

    #[tokio::test]
    async fn test_recoverable_join_error_keeps_stream_open() {
        let mut h = run_session(
            FakePeer::joining_fails_with(NegotiationError::TransportExists),
            ScriptedStream::of(vec![join_frame("req-1", "room1", "alice")]),
        )
        .await;

        let replies = drain(&mut h.replies);
        assert_eq!(replies.len(), 1);
        assert!(matches!(
            replies[0].as_ref().unwrap().payload,
            Some(signal_reply::Payload::Error(ref msg)) if msg.contains("transport already exists")
        ));
        // Never joined: no teardown event.
        assert!(h.dispatch.stream_events().is_empty());
    }

    #[tokio::test]
    async fn test_unclassified_join_error_is_fatal() {
        let mut h = run_session(
            FakePeer::joining_fails_with(NegotiationError::Engine("ice failure".to_string())),
            ScriptedStream::of(vec![join_frame("req-1", "room1", "alice")]),
        )
        .await;

        let replies = drain(&mut h.replies);
        assert_eq!(replies.len(), 1);
        let status = replies[0].as_ref().unwrap_err();
        assert_eq!(status.code(), Code::Unknown);
        assert!(status.message().contains("ice failure"));
    }

    #[tokio::test]
    async fn test_malformed_join_description_skips_join() {
        let frame = SignalRequest {
            id: "req-1".to_string(),
            payload: Some(signal_request::Payload::Join(JoinRequest {
                sid: "room1".to_string(),
                uid: "alice".to_string(),
                description: b"not json".to_vec(),
            })),
        };
        let mut h = run_session(FakePeer::default(), ScriptedStream::of(vec![frame])).await;

        let replies = drain(&mut h.replies);
        assert!(matches!(
            replies[0].as_ref().unwrap().payload,
            Some(signal_reply::Payload::Error(ref msg)) if msg.contains("unmarshal")
        ));
        assert!(h.peer.session_id().is_none());
    }

    #[tokio::test]
    async fn test_answer_description_reaches_the_peer() {
        let answer = SessionDescription {
            sdp_type: SdpType::Answer,
            sdp: "v=0\r\n".to_string(),
        };
        let frame = SignalRequest {
            id: String::new(),
            payload: Some(signal_request::Payload::Description(
                serde_json::to_vec(&answer).unwrap(),
            )),
        };
        let h = run_session(
            FakePeer::default(),
            ScriptedStream::of(vec![join_frame("req-1", "room1", "alice"), frame]),
        )
        .await;

        let state = h.peer.state.lock().unwrap();
        assert_eq!(state.remote_descriptions.len(), 1);
        assert_eq!(state.remote_descriptions[0], answer);
    }

    #[tokio::test]
    async fn test_empty_payload_gets_error_frame() {
        let frame = SignalRequest {
            id: "req-1".to_string(),
            payload: None,
        };
        let mut h = run_session(FakePeer::default(), ScriptedStream::of(vec![frame])).await;

        let replies = drain(&mut h.replies);
        assert!(matches!(
            replies[0].as_ref().unwrap().payload,
            Some(signal_reply::Payload::Error(ref msg)) if msg.contains("empty signal request")
        ));
    }

    #[tokio::test]
    async fn test_cancelled_stream_closes_silently() {
        let mut h = run_session(
            FakePeer::default(),
            ScriptedStream::of(vec![join_frame("req-1", "room1", "alice")])
                .ending_with(Status::cancelled("client went away")),
        )
        .await;

        let replies = drain(&mut h.replies);
        assert!(replies.iter().all(Result::is_ok));
        assert_eq!(h.peer.close_calls.load(Ordering::SeqCst), 1);

        // Joined without announcing streams: teardown still reports an
        // empty REMOVE so bookkeeping can release the peer.
        let events = h.dispatch.stream_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].state(), StreamState::Remove);
        assert!(events[0].streams.is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_fails_the_rpc() {
        let mut h = run_session(
            FakePeer::default(),
            ScriptedStream::of(vec![]).ending_with(Status::unavailable("connection reset")),
        )
        .await;

        let replies = drain(&mut h.replies);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].as_ref().unwrap_err().code(), Code::Unavailable);
    }

    #[tokio::test]
    async fn test_engine_callbacks_feed_the_reply_stream() {
        let peer = Arc::new(FakePeer::default());
        let dispatch = Arc::new(RecordingDispatch::default());
        let (sink, mut replies) = ReplySink::channel();
        let session = SignalingSession::new(
            "sfu-1",
            Arc::clone(&peer),
            Arc::clone(&dispatch) as Arc<dyn EventDispatch>,
            sink,
        );

        let handle = tokio::spawn(session.run(ScriptedStream::of(vec![join_frame(
            "req-1", "room1", "alice",
        )])));
        handle.await.unwrap();

        peer.fire_ice_candidate(IceCandidateInit {
            candidate: "candidate:1".to_string(),
            sdp_mid: Some("0".to_string()),
            sdp_mline_index: Some(0),
            username_fragment: None,
        });
        peer.fire_state_change(IceConnectionState::Connected);
        peer.fire_offer(SessionDescription {
            sdp_type: SdpType::Offer,
            sdp: "v=0\r\n".to_string(),
        });

        let frames = drain(&mut replies);
        assert!(frames.iter().any(|r| matches!(
            r.as_ref().unwrap().payload,
            Some(signal_reply::Payload::Trickle(ref t))
                if t.init.contains("candidate:1") && t.target == TrickleTarget::Publisher as i32
        )));
        assert!(frames.iter().any(|r| matches!(
            r.as_ref().unwrap().payload,
            Some(signal_reply::Payload::IceConnectionState(ref s)) if s == "connected"
        )));
        assert!(frames.iter().any(|r| matches!(
            r.as_ref().unwrap().payload,
            Some(signal_reply::Payload::Description(ref d))
                if serde_json::from_slice::<SessionDescription>(d)
                    .is_ok_and(|desc| desc.sdp_type == SdpType::Offer)
        )));
    }
}
