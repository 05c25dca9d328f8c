//! Per-stream timestamp delta tracking
//!
//! Deltas are `current - previous` in processing order, with wrapping
//! signed arithmetic. Nothing is clamped or smoothed: zero, negative
//! and huge deltas are exactly what the tool is looking for.

use super::record::{DecodedFields, DiagnosticRecord, TimingField, VideoFields};
use super::types::{DecodedUnit, EncodedUnit, StreamInfo};

/// Last values observed on one stream. All start unknown, so the
/// first record of a stream carries no deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreviousTiming {
    pub encoded_pts: Option<i64>,
    pub encoded_dts: Option<i64>,
    pub decoded_pts: Option<i64>,
}

/// Delta between two optional timestamps, present only if both are known.
pub fn delta(current: Option<i64>, previous: Option<i64>) -> Option<i64> {
    match (current, previous) {
        (Some(current), Some(previous)) => Some(current.wrapping_sub(previous)),
        _ => None,
    }
}

fn field(current: Option<i64>, previous: Option<i64>) -> TimingField {
    TimingField {
        value: current,
        delta: delta(current, previous),
    }
}

#[derive(Debug, Default)]
pub struct TimingTracker {
    previous: PreviousTiming,
    sequence: u64,
}

impl TimingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous(&self) -> PreviousTiming {
        self.previous
    }

    /// Number of records produced so far on this stream.
    pub fn records(&self) -> u64 {
        self.sequence
    }

    /// Record for a unit that is not decoded (other kind or no decoder).
    pub fn pass_through(&mut self, stream: &StreamInfo, unit: &EncodedUnit) -> DiagnosticRecord {
        let record = DiagnosticRecord {
            sequence: self.sequence,
            stream_index: unit.stream_index,
            kind: stream.kind,
            pts: field(unit.pts, self.previous.encoded_pts),
            dts: field(unit.dts, self.previous.encoded_dts),
            duration: unit.duration,
            key: unit.is_key,
            decoded: None,
        };

        self.previous.encoded_pts = unit.pts;
        self.previous.encoded_dts = unit.dts;
        self.sequence += 1;
        record
    }

    /// Record for one decoded unit produced while decoding `unit`.
    pub fn decoded(
        &mut self,
        stream: &StreamInfo,
        unit: &EncodedUnit,
        decoded: &DecodedUnit,
    ) -> DiagnosticRecord {
        let video = decoded.video.map(|order| VideoFields {
            key_frame: decoded.key_frame,
            picture_kind: order.picture_kind,
            coded_order: order.coded_order,
            display_order: order.display_order,
        });

        let record = DiagnosticRecord {
            sequence: self.sequence,
            stream_index: unit.stream_index,
            kind: stream.kind,
            pts: field(unit.pts, self.previous.encoded_pts),
            dts: field(unit.dts, self.previous.encoded_dts),
            duration: unit.duration,
            key: unit.is_key,
            decoded: Some(DecodedFields {
                pts: field(decoded.pts, self.previous.decoded_pts),
                decode_pts: decoded.decode_pts,
                video,
            }),
        };

        self.previous.encoded_pts = unit.pts;
        self.previous.encoded_dts = unit.dts;
        self.previous.decoded_pts = decoded.pts;
        self.sequence += 1;
        record
    }
}
