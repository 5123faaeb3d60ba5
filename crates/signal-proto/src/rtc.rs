//! Messages and services for the `rtc` package.

/// Request to join a session on this node, carrying the client's SDP offer
/// as a JSON-encoded session description.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct JoinRequest {
    /// Session (room) identifier.
    #[prost(string, tag = "1")]
    pub sid: String,
    /// Participant identifier, unique within the session.
    #[prost(string, tag = "2")]
    pub uid: String,
    /// JSON-encoded session description (the offer).
    #[prost(bytes = "vec", tag = "3")]
    pub description: Vec<u8>,
}

/// Reply to a successful join, carrying the local SDP answer.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct JoinReply {
    /// JSON-encoded session description (the answer).
    #[prost(bytes = "vec", tag = "1")]
    pub description: Vec<u8>,
}

/// An incrementally exchanged ICE candidate.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Trickle {
    /// Which transport the candidate belongs to.
    #[prost(enumeration = "TrickleTarget", tag = "1")]
    pub target: i32,
    /// JSON-encoded ICE candidate-init structure.
    #[prost(string, tag = "2")]
    pub init: String,
}

/// Candidate destination: the publisher or subscriber peer connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum TrickleTarget {
    Publisher = 0,
    Subscriber = 1,
}

impl TrickleTarget {
    /// String form used in the proto definition.
    pub fn as_str_name(&self) -> &'static str {
        match self {
            Self::Publisher => "PUBLISHER",
            Self::Subscriber => "SUBSCRIBER",
        }
    }
}

/// One inbound signaling frame.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignalRequest {
    /// Client-chosen correlation id, echoed on direct replies.
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(oneof = "signal_request::Payload", tags = "2, 3, 4")]
    pub payload: Option<signal_request::Payload>,
}

/// Nested types for [`SignalRequest`].
pub mod signal_request {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Payload {
        /// Join a session.
        #[prost(message, tag = "2")]
        Join(super::JoinRequest),
        /// JSON-encoded session description (offer or answer).
        #[prost(bytes, tag = "3")]
        Description(Vec<u8>),
        /// ICE candidate.
        #[prost(message, tag = "4")]
        Trickle(super::Trickle),
    }
}

/// One outbound signaling frame.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignalReply {
    /// Correlation id of the request this reply answers, if any.
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(oneof = "signal_reply::Payload", tags = "2, 3, 4, 5, 6")]
    pub payload: Option<signal_reply::Payload>,
}

/// Nested types for [`SignalReply`].
pub mod signal_reply {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Payload {
        /// Answer to a join.
        #[prost(message, tag = "2")]
        Join(super::JoinReply),
        /// JSON-encoded session description (offer or answer).
        #[prost(bytes, tag = "3")]
        Description(Vec<u8>),
        /// ICE candidate.
        #[prost(message, tag = "4")]
        Trickle(super::Trickle),
        /// ICE connection state change, as a lowercase state name.
        #[prost(string, tag = "5")]
        IceConnectionState(String),
        /// Recoverable in-band error; the stream stays open.
        #[prost(string, tag = "6")]
        Error(String),
    }
}

/// One media track within a published stream.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Track {
    /// Track identifier.
    #[prost(string, tag = "1")]
    pub id: String,
    /// Media kind: "audio" or "video".
    #[prost(string, tag = "2")]
    pub kind: String,
    /// Human-readable label, if announced.
    #[prost(string, tag = "3")]
    pub label: String,
}

/// A published media stream and its tracks.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Stream {
    /// Stream (msid) identifier.
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(message, repeated, tag = "2")]
    pub tracks: Vec<Track>,
}

/// Identity of one signaling participant.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PeerInfo {
    /// Session the peer belongs to.
    #[prost(string, tag = "1")]
    pub sid: String,
    /// Participant identifier.
    #[prost(string, tag = "2")]
    pub uid: String,
    /// Opaque application-provided participant info.
    #[prost(bytes = "bytes", tag = "3")]
    pub info: ::bytes::Bytes,
}

/// Peer presence states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum PeerState {
    Join = 0,
    Leave = 1,
}

/// A peer presence change, broadcast to every peer sharing the session.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PeerEvent {
    #[prost(enumeration = "PeerState", tag = "1")]
    pub state: i32,
    #[prost(message, optional, tag = "2")]
    pub peer: Option<PeerInfo>,
}

/// Stream availability states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum StreamState {
    Add = 0,
    Remove = 1,
}

/// A media-stream availability change, broadcast within the session and
/// published to the cluster event sink.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StreamEvent {
    #[prost(enumeration = "StreamState", tag = "1")]
    pub state: i32,
    /// Node that serves the streams.
    #[prost(string, tag = "2")]
    pub nid: String,
    /// Session the streams belong to.
    #[prost(string, tag = "3")]
    pub sid: String,
    /// Publishing participant.
    #[prost(string, tag = "4")]
    pub uid: String,
    #[prost(message, repeated, tag = "5")]
    pub streams: Vec<Stream>,
}

/// Directed or broadcast application payload relayed between peers.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RelayMessage {
    /// Sender uid.
    #[prost(string, tag = "1")]
    pub from: String,
    /// Recipient uid, `"all"`, or the session id for a broadcast.
    #[prost(string, tag = "2")]
    pub to: String,
    /// Opaque application payload.
    #[prost(bytes = "bytes", tag = "3")]
    pub data: ::bytes::Bytes,
}

/// Envelope for lifecycle events posted to the cluster event sink.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ClusterEvent {
    #[prost(oneof = "cluster_event::Payload", tags = "1, 2, 3")]
    pub payload: Option<cluster_event::Payload>,
}

/// Nested types for [`ClusterEvent`].
pub mod cluster_event {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Payload {
        #[prost(message, tag = "1")]
        Peer(super::PeerEvent),
        #[prost(message, tag = "2")]
        Stream(super::StreamEvent),
        #[prost(message, tag = "3")]
        Message(super::RelayMessage),
    }
}

/// Reply to `EventSink.PostEvent`; carries no payload of consequence.
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct PostEventReply {}

/// Client for the `rtc.RtcSignal` service.
pub mod rtc_signal_client {
    use super::{SignalReply, SignalRequest};
    use tonic::codegen::*;
    use tonic::transport::{Channel, Endpoint};

    /// Opens bidirectional signaling streams against an `RtcSignal` server.
    #[derive(Debug, Clone)]
    pub struct RtcSignalClient {
        inner: tonic::client::Grpc<Channel>,
    }

    impl RtcSignalClient {
        /// Connect eagerly to `dst`.
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: TryInto<Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }

        /// Wrap an existing channel.
        pub fn new(channel: Channel) -> Self {
            Self {
                inner: tonic::client::Grpc::new(channel),
            }
        }

        /// Open the bidirectional signaling stream.
        pub async fn signal(
            &mut self,
            request: impl tonic::IntoStreamingRequest<Message = SignalRequest>,
        ) -> Result<tonic::Response<tonic::Streaming<SignalReply>>, tonic::Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| tonic::Status::unknown(format!("service was not ready: {e}")))?;
            let codec: tonic::codec::ProstCodec<SignalRequest, SignalReply> =
                tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/rtc.RtcSignal/Signal");
            self.inner
                .streaming(request.into_streaming_request(), path, codec)
                .await
        }
    }
}

/// Server plumbing for the `rtc.RtcSignal` service.
pub mod rtc_signal_server {
    use super::{SignalReply, SignalRequest};
    use tonic::codegen::*;

    /// Implemented by the signaling handler; called once per client
    /// connection with the inbound frame stream.
    #[async_trait]
    pub trait RtcSignal: Send + Sync + 'static {
        /// Outbound frame stream returned to the client.
        type SignalStream: tokio_stream::Stream<Item = Result<SignalReply, tonic::Status>>
            + Send
            + 'static;

        /// Handle one bidirectional signaling stream.
        async fn signal(
            &self,
            request: tonic::Request<tonic::Streaming<SignalRequest>>,
        ) -> Result<tonic::Response<Self::SignalStream>, tonic::Status>;
    }

    /// Mounts an [`RtcSignal`] implementation on a tonic server.
    #[derive(Debug)]
    pub struct RtcSignalServer<T> {
        inner: Arc<T>,
    }

    impl<T> RtcSignalServer<T> {
        pub fn new(inner: T) -> Self {
            Self {
                inner: Arc::new(inner),
            }
        }

        pub fn from_arc(inner: Arc<T>) -> Self {
            Self { inner }
        }
    }

    impl<T> Clone for RtcSignalServer<T> {
        fn clone(&self) -> Self {
            Self {
                inner: Arc::clone(&self.inner),
            }
        }
    }

    impl<T, B> Service<http::Request<B>> for RtcSignalServer<T>
    where
        T: RtcSignal,
        B: Body + Send + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = std::convert::Infallible;
        type Future = BoxFuture<Self::Response, Self::Error>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            match req.uri().path() {
                "/rtc.RtcSignal/Signal" => {
                    struct SignalSvc<T>(Arc<T>);
                    impl<T: RtcSignal> tonic::server::StreamingService<SignalRequest> for SignalSvc<T> {
                        type Response = SignalReply;
                        type ResponseStream = T::SignalStream;
                        type Future =
                            BoxFuture<tonic::Response<Self::ResponseStream>, tonic::Status>;

                        fn call(
                            &mut self,
                            request: tonic::Request<tonic::Streaming<SignalRequest>>,
                        ) -> Self::Future {
                            let inner = Arc::clone(&self.0);
                            Box::pin(async move { inner.signal(request).await })
                        }
                    }
                    let inner = Arc::clone(&self.inner);
                    Box::pin(async move {
                        let codec: tonic::codec::ProstCodec<SignalReply, SignalRequest> =
                            tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        Ok(grpc.streaming(SignalSvc(inner), req).await)
                    })
                }
                _ => Box::pin(async move {
                    let mut response = http::Response::new(empty_body());
                    let headers = response.headers_mut();
                    headers.insert(
                        tonic::Status::GRPC_STATUS,
                        (tonic::Code::Unimplemented as i32).into(),
                    );
                    headers.insert(
                        http::header::CONTENT_TYPE,
                        tonic::metadata::GRPC_CONTENT_TYPE,
                    );
                    Ok(response)
                }),
            }
        }
    }

    impl<T: RtcSignal> tonic::server::NamedService for RtcSignalServer<T> {
        const NAME: &'static str = "rtc.RtcSignal";
    }
}

/// Client for the `rtc.EventSink` service.
pub mod event_sink_client {
    use super::{ClusterEvent, PostEventReply};
    use tonic::codegen::*;
    use tonic::transport::{Channel, Endpoint};

    /// Posts lifecycle events to a cluster event sink node.
    #[derive(Debug, Clone)]
    pub struct EventSinkClient {
        inner: tonic::client::Grpc<Channel>,
    }

    impl EventSinkClient {
        /// Connect eagerly to `dst`.
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: TryInto<Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }

        /// Wrap an existing channel.
        pub fn new(channel: Channel) -> Self {
            Self {
                inner: tonic::client::Grpc::new(channel),
            }
        }

        /// Post one lifecycle event.
        pub async fn post_event(
            &mut self,
            request: impl tonic::IntoRequest<ClusterEvent>,
        ) -> Result<tonic::Response<PostEventReply>, tonic::Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| tonic::Status::unknown(format!("service was not ready: {e}")))?;
            let codec: tonic::codec::ProstCodec<ClusterEvent, PostEventReply> =
                tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/rtc.EventSink/PostEvent");
            self.inner
                .unary(request.into_request(), path, codec)
                .await
        }
    }
}

/// Server plumbing for the `rtc.EventSink` service.
pub mod event_sink_server {
    use super::{ClusterEvent, PostEventReply};
    use tonic::codegen::*;

    /// Implemented by the cluster bookkeeping node that consumes lifecycle
    /// events.
    #[async_trait]
    pub trait EventSink: Send + Sync + 'static {
        /// Accept one lifecycle event.
        async fn post_event(
            &self,
            request: tonic::Request<ClusterEvent>,
        ) -> Result<tonic::Response<PostEventReply>, tonic::Status>;
    }

    /// Mounts an [`EventSink`] implementation on a tonic server.
    #[derive(Debug)]
    pub struct EventSinkServer<T> {
        inner: Arc<T>,
    }

    impl<T> EventSinkServer<T> {
        pub fn new(inner: T) -> Self {
            Self {
                inner: Arc::new(inner),
            }
        }

        pub fn from_arc(inner: Arc<T>) -> Self {
            Self { inner }
        }
    }

    impl<T> Clone for EventSinkServer<T> {
        fn clone(&self) -> Self {
            Self {
                inner: Arc::clone(&self.inner),
            }
        }
    }

    impl<T, B> Service<http::Request<B>> for EventSinkServer<T>
    where
        T: EventSink,
        B: Body + Send + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = std::convert::Infallible;
        type Future = BoxFuture<Self::Response, Self::Error>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            match req.uri().path() {
                "/rtc.EventSink/PostEvent" => {
                    struct PostEventSvc<T>(Arc<T>);
                    impl<T: EventSink> tonic::server::UnaryService<ClusterEvent> for PostEventSvc<T> {
                        type Response = PostEventReply;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;

                        fn call(&mut self, request: tonic::Request<ClusterEvent>) -> Self::Future {
                            let inner = Arc::clone(&self.0);
                            Box::pin(async move { inner.post_event(request).await })
                        }
                    }
                    let inner = Arc::clone(&self.inner);
                    Box::pin(async move {
                        let codec: tonic::codec::ProstCodec<PostEventReply, ClusterEvent> =
                            tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        Ok(grpc.unary(PostEventSvc(inner), req).await)
                    })
                }
                _ => Box::pin(async move {
                    let mut response = http::Response::new(empty_body());
                    let headers = response.headers_mut();
                    headers.insert(
                        tonic::Status::GRPC_STATUS,
                        (tonic::Code::Unimplemented as i32).into(),
                    );
                    headers.insert(
                        http::header::CONTENT_TYPE,
                        tonic::metadata::GRPC_CONTENT_TYPE,
                    );
                    Ok(response)
                }),
            }
        }
    }

    impl<T: EventSink> tonic::server::NamedService for EventSinkServer<T> {
        const NAME: &'static str = "rtc.EventSink";
    }
}
