//! Seam between signaling and the media engine.
//!
//! The signaling layer never touches RTP or peer connections directly. It
//! drives a [`MediaPeer`] obtained from a [`MediaEngine`] and exchanges
//! JSON-encoded session descriptions and ICE candidates with it, in the
//! same envelope format browsers produce. Tests substitute fake engines;
//! production wires in a WebRTC implementation behind the same traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use signal_proto::rtc::TrickleTarget;
use std::fmt;
use thiserror::Error;

pub mod sdp;

/// JSON envelope for an SDP offer or answer.
///
/// Matches the browser `RTCSessionDescriptionInit` shape, so the payload
/// of a `Description` frame deserializes directly into this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    /// Description kind. Serialized under the `type` key.
    #[serde(rename = "type")]
    pub sdp_type: SdpType,
    /// Raw SDP body.
    pub sdp: String,
}

/// SDP description kinds, serialized lowercase like the browser API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Answer,
    Pranswer,
    Rollback,
}

impl fmt::Display for SdpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SdpType::Offer => "offer",
            SdpType::Answer => "answer",
            SdpType::Pranswer => "pranswer",
            SdpType::Rollback => "rollback",
        };
        f.write_str(name)
    }
}

/// JSON envelope for a trickled ICE candidate, browser
/// `RTCIceCandidateInit` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidateInit {
    pub candidate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(
        default,
        rename = "sdpMLineIndex",
        skip_serializing_if = "Option::is_none"
    )]
    pub sdp_mline_index: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_fragment: Option<String>,
}

/// ICE connection states, reported to clients as lowercase strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IceConnectionState {
    New,
    Checking,
    Connected,
    Completed,
    Disconnected,
    Failed,
    Closed,
}

impl fmt::Display for IceConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IceConnectionState::New => "new",
            IceConnectionState::Checking => "checking",
            IceConnectionState::Connected => "connected",
            IceConnectionState::Completed => "completed",
            IceConnectionState::Disconnected => "disconnected",
            IceConnectionState::Failed => "failed",
            IceConnectionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Negotiation failures reported by the media engine.
///
/// The first three variants are recoverable from the client's point of
/// view: the signaling stream stays open and the failure is reported as
/// an in-band `Error` frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NegotiationError {
    /// The peer already has an established transport; a second join on
    /// the same stream is rejected.
    #[error("transport already exists for this peer")]
    TransportExists,

    /// The offer arrived while the engine could not apply it and was
    /// discarded.
    #[error("offer ignored")]
    OfferIgnored,

    /// An offer or candidate arrived before any transport was
    /// established by a join.
    #[error("no transport established")]
    NoTransportEstablished,

    /// Any other engine failure, with an engine-provided description.
    #[error("{0}")]
    Engine(String),
}

/// Callback invoked when the engine gathers a local ICE candidate.
pub type OnIceCandidate = Box<dyn Fn(IceCandidateInit, TrickleTarget) + Send + Sync>;

/// Callback invoked when the engine needs to renegotiate and produces a
/// subscriber-side offer.
pub type OnOffer = Box<dyn Fn(SessionDescription) + Send + Sync>;

/// Callback invoked on ICE connection state transitions.
pub type OnIceConnectionStateChange = Box<dyn Fn(IceConnectionState) + Send + Sync>;

/// One media peer as seen by the signaling layer.
///
/// Callbacks must be registered before [`join`](MediaPeer::join) so no
/// early candidate or renegotiation offer is lost.
#[async_trait]
pub trait MediaPeer: Send + Sync + 'static {
    /// Register the local-candidate callback.
    fn on_ice_candidate(&self, f: OnIceCandidate);

    /// Register the renegotiation-offer callback.
    fn on_offer(&self, f: OnOffer);

    /// Register the ICE connection state callback.
    fn on_ice_connection_state_change(&self, f: OnIceConnectionStateChange);

    /// Participant id, once bound by [`join`](MediaPeer::join).
    fn id(&self) -> Option<String>;

    /// Session id, once bound by [`join`](MediaPeer::join).
    fn session_id(&self) -> Option<String>;

    /// Bind the peer to a session. Fails with
    /// [`NegotiationError::TransportExists`] on a second join.
    async fn join(&self, sid: &str, uid: &str) -> Result<(), NegotiationError>;

    /// Apply the client's offer and produce the local answer.
    async fn answer(&self, offer: SessionDescription)
        -> Result<SessionDescription, NegotiationError>;

    /// Apply the client's answer to a previously sent subscriber offer.
    async fn set_remote_description(
        &self,
        desc: SessionDescription,
    ) -> Result<(), NegotiationError>;

    /// Add a remote ICE candidate to the targeted transport.
    async fn trickle(
        &self,
        target: TrickleTarget,
        candidate: IceCandidateInit,
    ) -> Result<(), NegotiationError>;

    /// Tear down both transports. Idempotent.
    async fn close(&self);
}

/// Factory for media peers, one per signaling connection.
pub trait MediaEngine: Send + Sync + 'static {
    type Peer: MediaPeer;

    /// Create a fresh, unbound peer.
    fn new_peer(&self) -> Self::Peer;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_session_description_json_shape() {
        let desc = SessionDescription {
            sdp_type: SdpType::Offer,
            sdp: "v=0\r\n".to_string(),
        };

        let json = serde_json::to_string(&desc).unwrap();
        assert_eq!(json, r#"{"type":"offer","sdp":"v=0\r\n"}"#);

        let parsed: SessionDescription = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, desc);
    }

    #[test]
    fn test_candidate_json_uses_camel_case() {
        let init: IceCandidateInit = serde_json::from_str(
            r#"{"candidate":"candidate:1 1 udp 2122260223 10.0.0.1 54321 typ host","sdpMid":"0","sdpMLineIndex":0}"#,
        )
        .unwrap();

        assert_eq!(init.sdp_mid.as_deref(), Some("0"));
        assert_eq!(init.sdp_mline_index, Some(0));
        assert!(init.username_fragment.is_none());

        let json = serde_json::to_string(&init).unwrap();
        assert!(json.contains("sdpMid"));
        assert!(!json.contains("usernameFragment"));
    }

    #[test]
    fn test_ice_state_display_is_lowercase() {
        assert_eq!(IceConnectionState::Connected.to_string(), "connected");
        assert_eq!(IceConnectionState::Disconnected.to_string(), "disconnected");
    }
}
