//! End-to-end signaling over a real in-process gRPC server.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

use async_trait::async_trait;
use sfu_signal::cluster::EventDispatch;
use sfu_signal::grpc::SignalingService;
use sfu_signal::media::{
    IceCandidateInit, MediaEngine, MediaPeer, NegotiationError, OnIceCandidate,
    OnIceConnectionStateChange, OnOffer, SdpType, SessionDescription,
};
use signal_proto::rtc::rtc_signal_client::RtcSignalClient;
use signal_proto::rtc::rtc_signal_server::RtcSignalServer;
use signal_proto::rtc::{
    cluster_event, signal_reply, signal_request, ClusterEvent, JoinRequest, SignalRequest,
    StreamEvent, StreamState, Trickle, TrickleTarget,
};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::wrappers::{TcpListenerStream, UnboundedReceiverStream};
use tonic::transport::Server;

const OFFER_SDP: &str = "v=0\r\nm=video 9 RTP 96\r\na=msid:cam-stream cam-track\r\n";

#[derive(Default)]
struct TestPeerState {
    sid: Option<String>,
    uid: Option<String>,
    candidates: Vec<IceCandidateInit>,
}

#[derive(Default)]
struct TestPeer {
    state: Mutex<TestPeerState>,
}

/// Local handle so the foreign `MediaPeer` trait can be implemented in
/// this test crate.
#[derive(Clone)]
struct PeerHandle(Arc<TestPeer>);

#[async_trait]
impl MediaPeer for PeerHandle {
    fn on_ice_candidate(&self, _f: OnIceCandidate) {}
    fn on_offer(&self, _f: OnOffer) {}
    fn on_ice_connection_state_change(&self, _f: OnIceConnectionStateChange) {}

    fn id(&self) -> Option<String> {
        self.0.state.lock().unwrap().uid.clone()
    }

    fn session_id(&self) -> Option<String> {
        self.0.state.lock().unwrap().sid.clone()
    }

    async fn join(&self, sid: &str, uid: &str) -> Result<(), NegotiationError> {
        let mut state = self.0.state.lock().unwrap();
        if state.sid.is_some() {
            return Err(NegotiationError::TransportExists);
        }
        state.sid = Some(sid.to_string());
        state.uid = Some(uid.to_string());
        Ok(())
    }

    async fn answer(
        &self,
        _offer: SessionDescription,
    ) -> Result<SessionDescription, NegotiationError> {
        if self.0.state.lock().unwrap().sid.is_none() {
            return Err(NegotiationError::NoTransportEstablished);
        }
        Ok(SessionDescription {
            sdp_type: SdpType::Answer,
            sdp: "v=0\r\n".to_string(),
        })
    }

    async fn set_remote_description(
        &self,
        _desc: SessionDescription,
    ) -> Result<(), NegotiationError> {
        Ok(())
    }

    async fn trickle(
        &self,
        _target: TrickleTarget,
        candidate: IceCandidateInit,
    ) -> Result<(), NegotiationError> {
        let mut state = self.0.state.lock().unwrap();
        if state.sid.is_none() {
            return Err(NegotiationError::NoTransportEstablished);
        }
        state.candidates.push(candidate);
        Ok(())
    }

    async fn close(&self) {}
}

#[derive(Default)]
struct TestEngine {
    peers: Mutex<Vec<Arc<TestPeer>>>,
}

impl MediaEngine for TestEngine {
    type Peer = PeerHandle;

    fn new_peer(&self) -> Self::Peer {
        let peer = Arc::new(TestPeer::default());
        self.peers.lock().unwrap().push(Arc::clone(&peer));
        PeerHandle(peer)
    }
}

/// Records published events and notifies the test on each one.
struct RecordingDispatch {
    events: Mutex<Vec<ClusterEvent>>,
    notify: mpsc::UnboundedSender<()>,
}

impl RecordingDispatch {
    fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<()>) {
        let (notify, rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                events: Mutex::new(Vec::new()),
                notify,
            }),
            rx,
        )
    }

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
        let _ = self.notify.send(());
    }
}

struct Harness {
    engine: Arc<TestEngine>,
    dispatch: Arc<RecordingDispatch>,
    events_rx: mpsc::UnboundedReceiver<()>,
    addr: SocketAddr,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn start_server() -> Harness {
    init_tracing();
    let engine = Arc::new(TestEngine::default());
    let (dispatch, events_rx) = RecordingDispatch::new();
    let service = SignalingService::new(
        "sfu-test",
        Arc::clone(&engine),
        Arc::clone(&dispatch) as Arc<dyn EventDispatch>,
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        Server::builder()
            .add_service(RtcSignalServer::new(service))
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
            .unwrap();
    });

    Harness {
        engine,
        dispatch,
        events_rx,
        addr,
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
                sdp: OFFER_SDP.to_string(),
            })
            .unwrap(),
        })),
    }
}

fn offer_frame(id: &str) -> SignalRequest {
    SignalRequest {
        id: id.to_string(),
        payload: Some(signal_request::Payload::Description(
            serde_json::to_vec(&SessionDescription {
                sdp_type: SdpType::Offer,
                sdp: OFFER_SDP.to_string(),
            })
            .unwrap(),
        )),
    }
}

async fn recv_reply(
    replies: &mut tonic::Streaming<signal_proto::rtc::SignalReply>,
) -> signal_proto::rtc::SignalReply {
    tokio::time::timeout(Duration::from_secs(5), replies.message())
        .await
        .expect("timed out waiting for reply")
        .unwrap()
        .expect("reply stream ended unexpectedly")
}

#[tokio::test]
async fn test_join_and_negotiate_over_grpc() {
    let mut harness = start_server().await;
    let mut client = RtcSignalClient::connect(format!("http://{}", harness.addr))
        .await
        .unwrap();

    let (tx, rx) = mpsc::unbounded_channel();
    let mut replies = client
        .signal(UnboundedReceiverStream::new(rx))
        .await
        .unwrap()
        .into_inner();

    // Join round.
    tx.send(join_frame("req-1", "room1", "alice")).unwrap();
    let reply = recv_reply(&mut replies).await;
    assert_eq!(reply.id, "req-1");
    let Some(signal_reply::Payload::Join(join)) = reply.payload else {
        panic!("expected a join reply");
    };
    let answer: SessionDescription = serde_json::from_slice(&join.description).unwrap();
    assert_eq!(answer.sdp_type, SdpType::Answer);

    // Renegotiation offer round.
    tx.send(offer_frame("req-2")).unwrap();
    let reply = recv_reply(&mut replies).await;
    assert_eq!(reply.id, "req-2");
    assert!(matches!(
        reply.payload,
        Some(signal_reply::Payload::Description(_))
    ));

    // The offer announced a stream: an ADD event reaches the dispatch.
    tokio::time::timeout(Duration::from_secs(5), harness.events_rx.recv())
        .await
        .expect("timed out waiting for stream event")
        .unwrap();
    let events = harness.dispatch.stream_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].state(), StreamState::Add);
    assert_eq!(events[0].nid, "sfu-test");
    assert_eq!(events[0].sid, "room1");
    assert_eq!(events[0].uid, "alice");
    assert_eq!(events[0].streams[0].id, "cam-stream");

    // Client hangs up: the session tears down and reports the removal.
    drop(tx);
    tokio::time::timeout(Duration::from_secs(5), harness.events_rx.recv())
        .await
        .expect("timed out waiting for teardown event")
        .unwrap();
    let events = harness.dispatch.stream_events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].state(), StreamState::Remove);
    assert_eq!(events[1].streams, events[0].streams);
}

#[tokio::test]
async fn test_trickle_before_join_keeps_stream_open() {
    let harness = start_server().await;
    let mut client = RtcSignalClient::connect(format!("http://{}", harness.addr))
        .await
        .unwrap();

    let (tx, rx) = mpsc::unbounded_channel();
    let mut replies = client
        .signal(UnboundedReceiverStream::new(rx))
        .await
        .unwrap()
        .into_inner();

    tx.send(SignalRequest {
        id: String::new(),
        payload: Some(signal_request::Payload::Trickle(Trickle {
            target: TrickleTarget::Publisher as i32,
            init: r#"{"candidate":"candidate:1"}"#.to_string(),
        })),
    })
    .unwrap();

    let reply = recv_reply(&mut replies).await;
    assert!(matches!(
        reply.payload,
        Some(signal_reply::Payload::Error(ref msg)) if msg.contains("no transport established")
    ));

    // Same stream still accepts a join afterwards.
    tx.send(join_frame("req-1", "room1", "bob")).unwrap();
    let reply = recv_reply(&mut replies).await;
    assert!(matches!(reply.payload, Some(signal_reply::Payload::Join(_))));

    // Candidates after the join reach the media peer.
    tx.send(SignalRequest {
        id: String::new(),
        payload: Some(signal_request::Payload::Trickle(Trickle {
            target: TrickleTarget::Subscriber as i32,
            init: r#"{"candidate":"candidate:2","sdpMid":"0"}"#.to_string(),
        })),
    })
    .unwrap();

    tx.send(offer_frame("req-2")).unwrap();
    recv_reply(&mut replies).await;

    let peers = harness.engine.peers.lock().unwrap();
    let state = peers[0].state.lock().unwrap();
    assert_eq!(state.candidates.len(), 1);
    assert_eq!(state.candidates[0].candidate, "candidate:2");
}

#[tokio::test]
async fn test_second_join_on_same_stream_is_rejected_in_band() {
    let harness = start_server().await;
    let mut client = RtcSignalClient::connect(format!("http://{}", harness.addr))
        .await
        .unwrap();

    let (tx, rx) = mpsc::unbounded_channel();
    let mut replies = client
        .signal(UnboundedReceiverStream::new(rx))
        .await
        .unwrap()
        .into_inner();

    tx.send(join_frame("req-1", "room1", "carol")).unwrap();
    recv_reply(&mut replies).await;

    tx.send(join_frame("req-2", "room1", "carol")).unwrap();
    let reply = recv_reply(&mut replies).await;
    assert!(matches!(
        reply.payload,
        Some(signal_reply::Payload::Error(ref msg)) if msg.contains("transport already exists")
    ));
}
