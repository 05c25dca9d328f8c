//! Stream registry
//!
//! Classifies every stream announced by the source and opens a decoder
//! for audio and video streams before the first unit is read.

use std::collections::BTreeMap;

use log::{info, warn};

use crate::config::DecoderTuning;
use crate::decoder::{DecoderAdapter, DecoderFactory};
use crate::error::{Error, Result};

use super::record::StreamOpened;
use super::sink::RecordSink;
use super::tracker::TimingTracker;
use super::types::StreamInfo;

/// Decoder attached to a stream
pub enum DecoderSlot {
    Open(Box<dyn DecoderAdapter>),
    /// Audio/video stream whose codec is unsupported or failed to open
    Unsupported,
    /// Stream kind that is never decoded
    NotApplicable,
    /// Decoder was released at the end of the run
    Closed,
}

impl DecoderSlot {
    pub fn is_open(&self) -> bool {
        matches!(self, DecoderSlot::Open(_))
    }
}

impl std::fmt::Debug for DecoderSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecoderSlot::Open(decoder) => write!(f, "Open(timebase={})", decoder.time_base()),
            DecoderSlot::Unsupported => write!(f, "Unsupported"),
            DecoderSlot::NotApplicable => write!(f, "NotApplicable"),
            DecoderSlot::Closed => write!(f, "Closed"),
        }
    }
}

/// Everything the pipeline keeps about one stream for the whole run
#[derive(Debug)]
pub struct StreamState {
    pub info: StreamInfo,
    pub decoder: DecoderSlot,
    pub timing: TimingTracker,
}

#[derive(Debug, Default)]
pub struct StreamRegistry {
    streams: BTreeMap<usize, StreamState>,
    tuning: DecoderTuning,
}

impl StreamRegistry {
    pub fn new(tuning: DecoderTuning) -> Self {
        Self {
            streams: BTreeMap::new(),
            tuning,
        }
    }

    /// Register every stream of the source.
    pub fn open_all(
        streams: &[StreamInfo],
        tuning: DecoderTuning,
        factory: &mut dyn DecoderFactory,
        sink: &mut dyn RecordSink,
    ) -> Self {
        let mut registry = Self::new(tuning);
        for info in streams {
            registry.open(info.clone(), factory, sink);
        }
        registry
    }

    /// Register one stream, opening a decoder when its kind is decodable.
    ///
    /// Decoder failures are not fatal: the stream is only pass-through
    /// logged for the rest of the run.
    pub fn open(
        &mut self,
        info: StreamInfo,
        factory: &mut dyn DecoderFactory,
        sink: &mut dyn RecordSink,
    ) -> &StreamState {
        let decoder = if info.kind.is_decodable() {
            let slot = match factory.open(&info, &self.tuning) {
                Ok(decoder) => DecoderSlot::Open(decoder),
                Err(e) => {
                    warn!("{}; units are logged without decoding", e);
                    DecoderSlot::Unsupported
                }
            };

            let decoder_time_base = match &slot {
                DecoderSlot::Open(decoder) => Some(decoder.time_base()),
                _ => None,
            };
            sink.stream_opened(&StreamOpened {
                index: info.index,
                kind: info.kind,
                codec: info.codec_name().to_string(),
                stream_time_base: info.time_base,
                decoder_time_base,
            });
            slot
        } else {
            info!("Stream {}: Unsupported stream: {}", info.index, info.kind);
            DecoderSlot::NotApplicable
        };

        let index = info.index;
        if self.streams.contains_key(&index) {
            warn!("Stream {}: announced twice, replacing previous state", index);
        }
        self.streams.insert(
            index,
            StreamState {
                info,
                decoder,
                timing: TimingTracker::new(),
            },
        );
        &self.streams[&index]
    }

    pub fn lookup(&mut self, stream_index: usize) -> Result<&mut StreamState> {
        self.streams
            .get_mut(&stream_index)
            .ok_or(Error::UnknownStream(stream_index))
    }

    pub fn get(&self, stream_index: usize) -> Option<&StreamState> {
        self.streams.get(&stream_index)
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Close every open decoder. Safe to call more than once.
    pub fn close_all(&mut self) {
        for state in self.streams.values_mut() {
            if !state.decoder.is_open() {
                continue;
            }
            if let DecoderSlot::Open(mut decoder) =
                std::mem::replace(&mut state.decoder, DecoderSlot::Closed)
            {
                decoder.close();
            }
        }
    }
}
