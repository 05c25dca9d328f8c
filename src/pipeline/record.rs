//! Diagnostic records emitted by the pipeline

use serde::Serialize;

use super::types::{MediaKind, PictureKind, TimeBase};

/// A raw timestamp and its delta against the stream's previous value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimingField {
    pub value: Option<i64>,
    pub delta: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VideoFields {
    pub key_frame: bool,
    pub picture_kind: PictureKind,
    pub coded_order: Option<u64>,
    pub display_order: u64,
}

/// Decoder side of a record, absent on pass-through records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DecodedFields {
    pub pts: TimingField,
    pub decode_pts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoFields>,
}

/// One timing record per decoded or passed-through unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticRecord {
    /// Position of this record among the stream's records
    pub sequence: u64,
    pub stream_index: usize,
    pub kind: MediaKind,
    /// Encoded unit PTS
    pub pts: TimingField,
    /// Encoded unit DTS
    pub dts: TimingField,
    pub duration: i64,
    /// Key flag set by the container on the encoded unit
    pub key: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoded: Option<DecodedFields>,
}

impl DiagnosticRecord {
    pub fn is_pass_through(&self) -> bool {
        self.decoded.is_none()
    }
}

/// Announcement made once per audio/video stream when it is opened
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamOpened {
    pub index: usize,
    pub kind: MediaKind,
    pub codec: String,
    pub stream_time_base: TimeBase,
    /// `None` when no decoder could be opened for the stream
    pub decoder_time_base: Option<TimeBase>,
}

struct Ts(Option<i64>);

impl std::fmt::Display for Ts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(ts) => write!(f, "{}", ts),
            None => write!(f, "NOPTS"),
        }
    }
}

impl std::fmt::Display for TimingField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.delta {
            Some(delta) => write!(f, "{} (diff {})", Ts(self.value), delta),
            None => write!(f, "{} (diff -)", Ts(self.value)),
        }
    }
}

impl std::fmt::Display for DiagnosticRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Stream {}: {}: ", self.stream_index, self.kind)?;

        let Some(decoded) = &self.decoded else {
            return write!(
                f,
                "pts {}, dts {}, duration {}, key {}",
                self.pts,
                self.dts,
                self.duration,
                u8::from(self.key)
            );
        };

        write!(
            f,
            "pkt pts {}, frame pts {}, pkt dts {}, pkt duration {}",
            self.pts, decoded.pts, self.dts, self.duration
        )?;
        if let Some(video) = &decoded.video {
            write!(
                f,
                ", key {}, pict {}, coded {}, display {}",
                u8::from(video.key_frame),
                video.picture_kind,
                video
                    .coded_order
                    .map_or_else(|| "-".to_string(), |n| n.to_string()),
                video.display_order
            )?;
        }
        Ok(())
    }
}

impl std::fmt::Display for StreamOpened {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Stream {}: {}: codec {}, timebase={}, codec timebase: ",
            self.index, self.kind, self.codec, self.stream_time_base
        )?;
        match self.decoder_time_base {
            Some(tb) => write!(f, "{}", tb),
            None => write!(f, "n/a"),
        }
    }
}
