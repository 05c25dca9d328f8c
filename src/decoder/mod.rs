//! Decoder adapter boundary
//!
//! A decode attempt is a two phase protocol: `submit` one encoded unit,
//! then `drain` until the decoder reports it needs more input or has
//! reached the end of its stream. A single submit may yield zero, one
//! or many decoded units.

#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;

use std::collections::VecDeque;

use crate::config::DecoderTuning;
use crate::error::Result;
use crate::pipeline::types::{DecodedUnit, EncodedUnit, StreamInfo, TimeBase};

/// Outcome of handing an encoded unit to a decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitResult {
    Accepted,
    /// The decoder wants to be drained before taking more input
    TemporarilyFull,
    Failed(String),
}

/// Outcome of one drain call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainResult {
    Unit(DecodedUnit),
    NeedsMoreInput,
    EndOfStream,
    Failed(String),
}

/// One open decoder instance, owned by exactly one stream.
pub trait DecoderAdapter {
    /// Time base the decoder reports its output in.
    fn time_base(&self) -> TimeBase;

    fn submit(&mut self, unit: &EncodedUnit) -> SubmitResult;

    fn drain(&mut self) -> DrainResult;

    /// Release decoder resources. Calling it twice is a no-op.
    fn close(&mut self) {}
}

/// Looks up and opens decoder implementations by codec.
pub trait DecoderFactory {
    /// Fails with `UnsupportedCodec` when nothing can decode the stream,
    /// or `DecoderOpen` when the implementation refused to open.
    fn open(
        &mut self,
        stream: &StreamInfo,
        tuning: &DecoderTuning,
    ) -> Result<Box<dyn DecoderAdapter>>;
}

const ORDER_HISTORY: usize = 64;

/// A unit that entered a video decoder and has not come out yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingPicture {
    pts: i64,
    dts: Option<i64>,
    coded_order: u64,
}

/// Where a decoded picture came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmittedPicture {
    pub coded_order: Option<u64>,
    pub display_order: u64,
    /// DTS of the encoded unit that produced the picture
    pub decode_pts: Option<i64>,
}

/// Coded and display order bookkeeping for a video decoder.
///
/// Decoders emit frames in display order, so the display index is the
/// output counter. The producing unit is recovered by matching the frame
/// PTS against the PTS of units in submission order; frame threading
/// and reordering both delay output, so the last submitted unit is not
/// necessarily the producer.
#[derive(Debug, Default)]
pub struct PictureOrder {
    pending: VecDeque<PendingPicture>,
    submitted: u64,
    emitted: u64,
}

impl PictureOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Note a unit entering the decoder.
    pub fn submitted(&mut self, pts: Option<i64>, dts: Option<i64>) {
        if let Some(pts) = pts {
            if self.pending.len() == ORDER_HISTORY {
                self.pending.pop_front();
            }
            self.pending.push_back(PendingPicture {
                pts,
                dts,
                coded_order: self.submitted,
            });
        }
        self.submitted += 1;
    }

    /// Note a frame leaving the decoder.
    pub fn emitted(&mut self, pts: Option<i64>) -> EmittedPicture {
        let producer = pts.and_then(|pts| {
            let pos = self.pending.iter().position(|p| p.pts == pts)?;
            self.pending.remove(pos)
        });
        let display_order = self.emitted;
        self.emitted += 1;

        EmittedPicture {
            coded_order: producer.map(|p| p.coded_order),
            display_order,
            decode_pts: producer.and_then(|p| p.dts),
        }
    }
}

/// Submitted DTS values of an audio decoder, in order.
///
/// Audio decoders do not reorder, so the n-th output belongs to the
/// n-th accepted unit.
#[derive(Debug, Default)]
pub struct DecodeOrder {
    pending: VecDeque<Option<i64>>,
}

impl DecodeOrder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submitted(&mut self, dts: Option<i64>) {
        if self.pending.len() == ORDER_HISTORY {
            self.pending.pop_front();
        }
        self.pending.push_back(dts);
    }

    /// DTS of the unit that produced the next output, if any is known.
    pub fn emitted(&mut self) -> Option<i64> {
        self.pending.pop_front().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coded(picture: EmittedPicture) -> (Option<u64>, u64) {
        (picture.coded_order, picture.display_order)
    }

    #[test]
    fn test_picture_order_with_b_frames() {
        // I0 P3 B1 B2 in bitstream order, displayed as I0 B1 B2 P3
        let mut order = PictureOrder::new();
        for (dts, pts) in [0, 3, 1, 2].into_iter().enumerate() {
            order.submitted(Some(pts), Some(dts as i64 - 1));
        }

        assert_eq!(coded(order.emitted(Some(0))), (Some(0), 0));
        assert_eq!(coded(order.emitted(Some(1))), (Some(2), 1));
        assert_eq!(coded(order.emitted(Some(2))), (Some(3), 2));
        assert_eq!(coded(order.emitted(Some(3))), (Some(1), 3));
    }

    #[test]
    fn test_decode_pts_comes_from_the_producing_unit() {
        // frame threading delays output: three units are in flight
        // before the first picture comes out
        let mut order = PictureOrder::new();
        order.submitted(Some(0), Some(-40));
        order.submitted(Some(120), Some(0));
        order.submitted(Some(40), Some(40));

        assert_eq!(order.emitted(Some(0)).decode_pts, Some(-40));
        assert_eq!(order.emitted(Some(40)).decode_pts, Some(40));
        assert_eq!(order.emitted(Some(120)).decode_pts, Some(0));
    }

    #[test]
    fn test_picture_order_unmatched_pts() {
        let mut order = PictureOrder::new();
        order.submitted(None, Some(0));
        order.submitted(Some(40), Some(40));

        let unknown = order.emitted(None);
        assert_eq!(coded(unknown), (None, 0));
        assert_eq!(unknown.decode_pts, None);
        assert_eq!(coded(order.emitted(Some(99))), (None, 1));
        assert_eq!(coded(order.emitted(Some(40))), (Some(1), 2));
    }

    #[test]
    fn test_picture_order_history_is_bounded() {
        let mut order = PictureOrder::new();
        for pts in 0..(ORDER_HISTORY as i64 + 10) {
            order.submitted(Some(pts), Some(pts));
        }
        assert_eq!(order.pending.len(), ORDER_HISTORY);
        // the oldest entries were dropped
        assert_eq!(order.emitted(Some(0)).coded_order, None);
        assert_eq!(order.emitted(Some(10)).coded_order, Some(10));
    }

    #[test]
    fn test_audio_decode_order_lags_with_the_decoder() {
        let mut order = DecodeOrder::new();
        order.submitted(Some(0));
        order.submitted(None);
        order.submitted(Some(2048));

        // outputs pair with units in submission order however late
        // they come out
        assert_eq!(order.emitted(), Some(0));
        assert_eq!(order.emitted(), None);
        assert_eq!(order.emitted(), Some(2048));
        assert_eq!(order.emitted(), None);
    }
}
