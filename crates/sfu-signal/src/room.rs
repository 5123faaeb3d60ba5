//! Per-session peer bookkeeping and event fan-out.
//!
//! A `Room` groups the signaling peers of one session and broadcasts
//! presence changes, stream availability and relayed application
//! messages among them. Delivery is best effort: a failing peer is
//! logged and skipped, the batch continues.

use bytes::Bytes;
use signal_proto::rtc::{PeerEvent, PeerInfo, PeerState, RelayMessage, StreamEvent, StreamState};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, Weak};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// The peer's outbound channel is gone; the peer is unreachable.
#[derive(Debug, Error)]
#[error("peer notification channel closed")]
pub struct PeerClosed;

/// Notifications a room delivers to one peer.
#[derive(Debug, Clone, PartialEq)]
pub enum PeerNotification {
    Peer(PeerEvent),
    Stream(StreamEvent),
    Message(RelayMessage),
}

/// Outbound delivery seam for one peer.
pub trait PeerSink: Send + Sync + 'static {
    fn send_peer_event(&self, event: PeerEvent) -> Result<(), PeerClosed>;
    fn send_stream_event(&self, event: StreamEvent) -> Result<(), PeerClosed>;
    fn send_message(&self, msg: RelayMessage) -> Result<(), PeerClosed>;
}

impl PeerSink for mpsc::UnboundedSender<PeerNotification> {
    fn send_peer_event(&self, event: PeerEvent) -> Result<(), PeerClosed> {
        self.send(PeerNotification::Peer(event)).map_err(|_| PeerClosed)
    }

    fn send_stream_event(&self, event: StreamEvent) -> Result<(), PeerClosed> {
        self.send(PeerNotification::Stream(event))
            .map_err(|_| PeerClosed)
    }

    fn send_message(&self, msg: RelayMessage) -> Result<(), PeerClosed> {
        self.send(PeerNotification::Message(msg))
            .map_err(|_| PeerClosed)
    }
}

/// One signaling participant within a room.
pub struct Peer {
    uid: String,
    info: Bytes,
    sink: Box<dyn PeerSink>,
    /// Latest stream announcement by this peer, replayed to newcomers.
    last_stream_event: Mutex<Option<StreamEvent>>,
    /// Non-owning back-reference, set when the peer is inserted. Used
    /// only for removal.
    room: RwLock<Weak<Room>>,
}

impl Peer {
    pub fn new(uid: impl Into<String>, info: Bytes, sink: Box<dyn PeerSink>) -> Arc<Self> {
        Arc::new(Self {
            uid: uid.into(),
            info,
            sink,
            last_stream_event: Mutex::new(None),
            room: RwLock::new(Weak::new()),
        })
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn info(&self) -> &Bytes {
        &self.info
    }

    /// Remove this peer from its room, if it still belongs to one.
    /// Returns the number of peers left behind.
    pub fn leave(&self) -> Option<usize> {
        let room = self.room.read().ok()?.upgrade()?;
        Some(room.del_peer(&self.uid))
    }

    fn last_stream_event(&self) -> Option<StreamEvent> {
        self.last_stream_event.lock().ok()?.clone()
    }

    fn set_last_stream_event(&self, event: Option<StreamEvent>) {
        if let Ok(mut last) = self.last_stream_event.lock() {
            *last = event;
        }
    }
}

/// All peers of one session.
pub struct Room {
    sid: String,
    node_id: String,
    peers: RwLock<HashMap<String, Arc<Peer>>>,
}

impl Room {
    pub fn new(sid: impl Into<String>, node_id: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            sid: sid.into(),
            node_id: node_id.into(),
            peers: RwLock::new(HashMap::new()),
        })
    }

    pub fn sid(&self) -> &str {
        &self.sid
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Add a peer and synchronize state both ways: existing peers learn
    /// about the newcomer, the newcomer learns about existing peers and
    /// their announced streams.
    ///
    /// The broadcast, the replay and the insert are three separate
    /// steps, so a concurrent join may be absent from the newcomer's
    /// replay even though the newcomer sees its JOIN broadcast.
    pub fn add_peer(self: &Arc<Self>, peer: Arc<Peer>) {
        let join = PeerEvent {
            state: PeerState::Join as i32,
            peer: Some(self.peer_info(&peer)),
        };
        self.send_peer_event(&join);

        for existing in self.peers() {
            let event = PeerEvent {
                state: PeerState::Join as i32,
                peer: Some(self.peer_info(&existing)),
            };
            if let Err(e) = peer.sink.send_peer_event(event) {
                warn!(target: "room", sid = %self.sid, uid = %peer.uid, error = %e, "peer state replay failed");
            }
            if let Some(streams) = existing.last_stream_event() {
                if let Err(e) = peer.sink.send_stream_event(streams) {
                    warn!(target: "room", sid = %self.sid, uid = %peer.uid, error = %e, "stream state replay failed");
                }
            }
        }

        if let Ok(mut room_ref) = peer.room.write() {
            *room_ref = Arc::downgrade(self);
        }
        if let Ok(mut peers) = self.peers.write() {
            peers.insert(peer.uid.clone(), peer);
        }
    }

    pub fn get_peer(&self, uid: &str) -> Option<Arc<Peer>> {
        self.peers.read().ok()?.get(uid).cloned()
    }

    /// Shared-lock snapshot of the current peers.
    pub fn peers(&self) -> Vec<Arc<Peer>> {
        match self.peers.read() {
            Ok(peers) => peers.values().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn count(&self) -> usize {
        self.peers.read().map(|p| p.len()).unwrap_or(0)
    }

    /// Remove a peer and broadcast its LEAVE to the remaining peers.
    /// Returns the peer count after removal.
    pub fn del_peer(&self, uid: &str) -> usize {
        let (removed, remaining) = match self.peers.write() {
            Ok(mut peers) => (peers.remove(uid), peers.len()),
            Err(_) => (None, 0),
        };

        if let Some(peer) = removed {
            let leave = PeerEvent {
                state: PeerState::Leave as i32,
                peer: Some(self.peer_info(&peer)),
            };
            self.send_peer_event(&leave);
        }
        remaining
    }

    /// Broadcast a presence change to every peer currently in the room.
    pub fn send_peer_event(&self, event: &PeerEvent) {
        for peer in self.peers() {
            if let Err(e) = peer.sink.send_peer_event(event.clone()) {
                warn!(target: "room", sid = %self.sid, uid = %peer.uid, error = %e, "peer event delivery failed");
            }
        }
    }

    /// Broadcast a stream availability change, remembering it as the
    /// announcing peer's latest state for newcomer replay (ADD stores
    /// the event, REMOVE clears it).
    pub fn send_stream_event(&self, event: &StreamEvent) {
        if let Some(subject) = self.get_peer(&event.uid) {
            match event.state() {
                StreamState::Add => subject.set_last_stream_event(Some(event.clone())),
                StreamState::Remove => subject.set_last_stream_event(None),
            }
        }

        for peer in self.peers() {
            if let Err(e) = peer.sink.send_stream_event(event.clone()) {
                warn!(target: "room", sid = %self.sid, uid = %peer.uid, error = %e, "stream event delivery failed");
            }
        }
    }

    /// Relay an application message. Delivered to the peer named by
    /// `to`, or to every peer when `to` is `"all"` or the session id.
    pub fn send_message(&self, msg: &RelayMessage) {
        debug!(target: "room", sid = %self.sid, from = %msg.from, to = %msg.to, "relaying message");
        for peer in self.peers() {
            if msg.to == peer.uid || msg.to == "all" || msg.to == self.sid {
                if let Err(e) = peer.sink.send_message(msg.clone()) {
                    warn!(target: "room", sid = %self.sid, uid = %peer.uid, error = %e, "message delivery failed");
                }
            }
        }
    }

    fn peer_info(&self, peer: &Peer) -> PeerInfo {
        PeerInfo {
            sid: self.sid.clone(),
            uid: peer.uid.clone(),
            info: peer.info.clone(),
        }
    }
}
