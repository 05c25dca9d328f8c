//! Core types for the dispatch pipeline

use bytes::Bytes;
use serde::Serialize;

/// Kind of media carried by a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MediaKind {
    /// Video frames
    Video,
    /// Audio samples
    Audio,
    /// Subtitles, data, attachments and anything else
    Other,
}

impl MediaKind {
    /// Whether streams of this kind are routed to a decoder.
    pub fn is_decodable(&self) -> bool {
        matches!(self, MediaKind::Video | MediaKind::Audio)
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Video => write!(f, "Video"),
            MediaKind::Audio => write!(f, "Audio"),
            MediaKind::Other => write!(f, "Other"),
        }
    }
}

/// Rational scale converting integer timestamps to seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeBase {
    pub num: i32,
    pub den: i32,
}

impl TimeBase {
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }
}

impl std::fmt::Display for TimeBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Video frame prediction type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PictureKind {
    #[default]
    None,
    I,
    P,
    B,
    S,
    SI,
    SP,
    BI,
}

impl std::fmt::Display for PictureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PictureKind::None => "?",
            PictureKind::I => "I",
            PictureKind::P => "P",
            PictureKind::B => "B",
            PictureKind::S => "S",
            PictureKind::SI => "SI",
            PictureKind::SP => "SP",
            PictureKind::BI => "BI",
        };
        write!(f, "{}", s)
    }
}

/// Which streams a run reports on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamFilter {
    #[default]
    All,
    Only(usize),
}

impl StreamFilter {
    pub fn matches(&self, stream_index: usize) -> bool {
        match self {
            StreamFilter::All => true,
            StreamFilter::Only(index) => *index == stream_index,
        }
    }
}

impl std::fmt::Display for StreamFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamFilter::All => write!(f, "all streams"),
            StreamFilter::Only(index) => write!(f, "stream {}", index),
        }
    }
}

/// Stream metadata announced by the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    pub index: usize,
    pub kind: MediaKind,
    /// Codec identifier, `None` when the container names no known codec
    pub codec: Option<String>,
    pub time_base: TimeBase,
}

impl StreamInfo {
    pub fn codec_name(&self) -> &str {
        self.codec.as_deref().unwrap_or("unknown")
    }
}

/// One demultiplexed access unit.
///
/// Timestamps are in the stream time base; `None` means the container
/// did not provide one.
#[derive(Debug, Clone)]
pub struct EncodedUnit {
    pub stream_index: usize,
    pub pts: Option<i64>,
    pub dts: Option<i64>,
    pub duration: i64,
    pub is_key: bool,
    pub payload: Bytes,
}

impl EncodedUnit {
    pub fn new(stream_index: usize, pts: Option<i64>, dts: Option<i64>, duration: i64) -> Self {
        Self {
            stream_index,
            pts,
            dts,
            duration,
            is_key: false,
            payload: Bytes::new(),
        }
    }

    pub fn with_payload(mut self, payload: Bytes) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_key_flag(mut self, is_key: bool) -> Self {
        self.is_key = is_key;
        self
    }
}

/// Ordering metadata only video decoders produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoOrder {
    pub picture_kind: PictureKind,
    /// Position in bitstream order, when it could be matched
    pub coded_order: Option<u64>,
    /// Position in decoder output order
    pub display_order: u64,
}

/// One frame or sample block returned by a decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedUnit {
    pub pts: Option<i64>,
    /// DTS of the encoded unit whose submit produced this output
    pub decode_pts: Option<i64>,
    pub key_frame: bool,
    pub video: Option<VideoOrder>,
}

impl DecodedUnit {
    pub fn audio(pts: Option<i64>, decode_pts: Option<i64>) -> Self {
        Self {
            pts,
            decode_pts,
            key_frame: true,
            video: None,
        }
    }

    pub fn video(
        pts: Option<i64>,
        decode_pts: Option<i64>,
        key_frame: bool,
        order: VideoOrder,
    ) -> Self {
        Self {
            pts,
            decode_pts,
            key_frame,
            video: Some(order),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_filter() {
        assert!(StreamFilter::All.matches(0));
        assert!(StreamFilter::All.matches(17));
        assert!(StreamFilter::Only(1).matches(1));
        assert!(!StreamFilter::Only(1).matches(0));
    }

    #[test]
    fn test_time_base_display() {
        assert_eq!(TimeBase::new(1, 90_000).to_string(), "1/90000");
    }

    #[test]
    fn test_only_audio_and_video_are_decodable() {
        assert!(MediaKind::Video.is_decodable());
        assert!(MediaKind::Audio.is_decodable());
        assert!(!MediaKind::Other.is_decodable());
    }
}
