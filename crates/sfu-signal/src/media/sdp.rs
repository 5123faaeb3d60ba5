//! Minimal SDP inspection.
//!
//! Signaling only needs to know which media streams an offer announces,
//! so stream-availability events can fan out to the session and the
//! cluster event sink. This walks the `m=` sections and `msid`
//! attributes; it is deliberately lenient and skips lines it does not
//! understand.

use signal_proto::rtc::{Stream, Track};

/// Extract the announced media streams from a raw SDP body.
///
/// Tracks are grouped by msid stream identifier, in order of first
/// appearance. Both the media-level `a=msid:` form and the source-level
/// `a=ssrc:<id> msid:` form are recognized. Sections without an msid
/// (data channels, recvonly sections) contribute nothing.
pub fn parse_streams(sdp: &str) -> Vec<Stream> {
    let mut streams: Vec<Stream> = Vec::new();
    let mut kind = String::new();

    for line in sdp.lines().map(|l| l.trim_end_matches('\r')) {
        if let Some(media) = line.strip_prefix("m=") {
            kind = media
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string();
            continue;
        }

        let msid = if let Some(rest) = line.strip_prefix("a=msid:") {
            Some(rest)
        } else if let Some(rest) = line.strip_prefix("a=ssrc:") {
            // a=ssrc:<ssrc-id> msid:<stream-id> <track-id>
            rest.split_once("msid:").map(|(_, m)| m)
        } else {
            None
        };

        let Some(msid) = msid else { continue };
        if kind != "audio" && kind != "video" {
            continue;
        }

        let mut parts = msid.split_whitespace();
        let Some(stream_id) = parts.next() else {
            continue;
        };
        if stream_id == "-" {
            continue;
        }
        let track_id = parts.next().unwrap_or_default();

        let stream = match streams.iter_mut().find(|s| s.id == stream_id) {
            Some(stream) => stream,
            None => {
                streams.push(Stream {
                    id: stream_id.to_string(),
                    tracks: Vec::new(),
                });
                // Just pushed, so last_mut is always Some.
                match streams.last_mut() {
                    Some(stream) => stream,
                    None => continue,
                }
            }
        };

        if !track_id.is_empty() && !stream.tracks.iter().any(|t| t.id == track_id) {
            stream.tracks.push(Track {
                id: track_id.to_string(),
                kind: kind.clone(),
                label: String::new(),
            });
        }
    }

    streams
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const OFFER: &str = "v=0\r\n\
o=- 123 2 IN IP4 127.0.0.1\r\n\
s=-\r\n\
m=audio 9 UDP/TLS/RTP/SAVPF 111\r\n\
a=msid:stream-a track-audio\r\n\
m=video 9 UDP/TLS/RTP/SAVPF 96\r\n\
a=msid:stream-a track-video\r\n\
a=ssrc:1111 msid:stream-a track-video\r\n";

    #[test]
    fn test_groups_tracks_by_stream() {
        let streams = parse_streams(OFFER);

        assert_eq!(streams.len(), 1);
        let stream = &streams[0];
        assert_eq!(stream.id, "stream-a");
        assert_eq!(stream.tracks.len(), 2);
        assert_eq!(stream.tracks[0].kind, "audio");
        assert_eq!(stream.tracks[1].kind, "video");
    }

    #[test]
    fn test_ssrc_level_msid_does_not_duplicate_tracks() {
        let streams = parse_streams(OFFER);
        let ids: Vec<_> = streams[0].tracks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["track-audio", "track-video"]);
    }

    #[test]
    fn test_multiple_streams_keep_first_seen_order() {
        let sdp = "m=video 9 RTP 96\r\n\
a=msid:second t2\r\n\
m=audio 9 RTP 111\r\n\
a=msid:first t1\r\n";

        let streams = parse_streams(sdp);
        assert_eq!(streams.len(), 2);
        assert_eq!(streams[0].id, "second");
        assert_eq!(streams[1].id, "first");
    }

    #[test]
    fn test_recvonly_and_data_sections_are_ignored() {
        let sdp = "m=application 9 UDP/DTLS/SCTP webrtc-datachannel\r\n\
a=msid:ignored t0\r\n\
m=audio 9 RTP 111\r\n\
a=recvonly\r\n";

        assert!(parse_streams(sdp).is_empty());
    }

    #[test]
    fn test_dash_msid_is_ignored() {
        let sdp = "m=audio 9 RTP 111\r\na=msid:- track-1\r\n";
        assert!(parse_streams(sdp).is_empty());
    }
}
