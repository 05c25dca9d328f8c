//! Scripted collaborators for pipeline tests

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use crate::config::DecoderTuning;
use crate::decoder::{DecoderAdapter, DecoderFactory, DrainResult, SubmitResult};
use crate::error::{Error, Result};
use crate::source::Source;

use super::record::{DiagnosticRecord, StreamOpened};
use super::sink::RecordSink;
use super::types::{
    DecodedUnit, EncodedUnit, MediaKind, PictureKind, StreamInfo, TimeBase, VideoOrder,
};

pub const TEST_TIME_BASE: TimeBase = TimeBase::new(1, 1000);

pub fn stream_info(index: usize, kind: MediaKind) -> StreamInfo {
    StreamInfo {
        index,
        kind,
        codec: Some("scripted".to_string()),
        time_base: TEST_TIME_BASE,
    }
}

pub fn unit(stream_index: usize, pts: i64, dts: i64) -> EncodedUnit {
    EncodedUnit::new(stream_index, Some(pts), Some(dts), 40)
}

pub fn decoded(pts: i64) -> DrainResult {
    DrainResult::Unit(DecodedUnit::audio(Some(pts), None))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open(usize),
    Submit(usize, Option<i64>),
    Drain(usize),
    Close(usize),
}

/// Decoder calls in the order they happened
#[derive(Debug, Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<Call>>>);

impl CallLog {
    fn push(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    pub fn opened(&self) -> Vec<usize> {
        self.filter(|call| match call {
            Call::Open(index) => Some(*index),
            _ => None,
        })
    }

    pub fn closed(&self) -> Vec<usize> {
        self.filter(|call| match call {
            Call::Close(index) => Some(*index),
            _ => None,
        })
    }

    /// Every call that touched the decoder of `stream_index`, opening excluded
    pub fn decoder_calls(&self, stream_index: usize) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| match call {
                Call::Submit(index, _) | Call::Drain(index) | Call::Close(index) => {
                    *index == stream_index
                }
                Call::Open(_) => false,
            })
            .collect()
    }

    fn filter<F: Fn(&Call) -> Option<usize>>(&self, f: F) -> Vec<usize> {
        self.0.borrow().iter().filter_map(f).collect()
    }
}

/// One submit outcome and the drain results it makes ready
pub type Step = (SubmitResult, Vec<DrainResult>);

/// Decoder replaying a script; without a script every accepted unit
/// yields exactly one decoded unit carrying the unit PTS.
pub struct ScriptedDecoder {
    stream: StreamInfo,
    log: CallLog,
    script: Option<VecDeque<Step>>,
    ready: VecDeque<DrainResult>,
    submitted: u64,
    closed: bool,
}

impl ScriptedDecoder {
    fn echo(&self, unit: &EncodedUnit) -> DecodedUnit {
        match self.stream.kind {
            MediaKind::Video => DecodedUnit::video(
                unit.pts,
                unit.dts,
                self.submitted == 0,
                VideoOrder {
                    picture_kind: if self.submitted == 0 {
                        PictureKind::I
                    } else {
                        PictureKind::P
                    },
                    coded_order: Some(self.submitted),
                    display_order: self.submitted,
                },
            ),
            _ => DecodedUnit::audio(unit.pts, unit.dts),
        }
    }
}

impl DecoderAdapter for ScriptedDecoder {
    fn time_base(&self) -> TimeBase {
        self.stream.time_base
    }

    fn submit(&mut self, unit: &EncodedUnit) -> SubmitResult {
        self.log.push(Call::Submit(self.stream.index, unit.pts));
        let result = match &mut self.script {
            Some(script) => {
                let (result, ready) = script
                    .pop_front()
                    .unwrap_or((SubmitResult::Accepted, Vec::new()));
                self.ready.extend(ready);
                result
            }
            None => {
                let frame = self.echo(unit);
                self.ready.push_back(DrainResult::Unit(frame));
                SubmitResult::Accepted
            }
        };
        self.submitted += 1;
        result
    }

    fn drain(&mut self) -> DrainResult {
        self.log.push(Call::Drain(self.stream.index));
        self.ready.pop_front().unwrap_or(DrainResult::NeedsMoreInput)
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.log.push(Call::Close(self.stream.index));
        }
    }
}

#[derive(Default)]
pub struct ScriptedFactory {
    log: CallLog,
    scripts: HashMap<usize, Vec<Step>>,
    unsupported: HashSet<usize>,
    fail_open: HashSet<usize>,
    last_tuning: Option<DecoderTuning>,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&mut self, stream_index: usize, steps: Vec<Step>) {
        self.scripts.insert(stream_index, steps);
    }

    pub fn unsupported(&mut self, stream_index: usize) {
        self.unsupported.insert(stream_index);
    }

    pub fn fail_open(&mut self, stream_index: usize) {
        self.fail_open.insert(stream_index);
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    pub fn last_tuning(&self) -> Option<DecoderTuning> {
        self.last_tuning
    }
}

impl DecoderFactory for ScriptedFactory {
    fn open(
        &mut self,
        stream: &StreamInfo,
        tuning: &DecoderTuning,
    ) -> Result<Box<dyn DecoderAdapter>> {
        self.log.push(Call::Open(stream.index));
        if self.unsupported.contains(&stream.index) {
            return Err(Error::UnsupportedCodec {
                index: stream.index,
                codec: stream.codec_name().to_string(),
            });
        }
        if self.fail_open.contains(&stream.index) {
            return Err(Error::DecoderOpen {
                index: stream.index,
                reason: "scripted failure".to_string(),
            });
        }
        self.last_tuning = Some(*tuning);

        Ok(Box::new(ScriptedDecoder {
            stream: stream.clone(),
            log: self.log.clone(),
            script: self.scripts.remove(&stream.index).map(VecDeque::from),
            ready: VecDeque::new(),
            submitted: 0,
            closed: false,
        }))
    }
}

/// Source replaying a fixed list of reads, then end of stream
pub struct ScriptedSource {
    streams: Vec<StreamInfo>,
    reads: VecDeque<Result<Option<EncodedUnit>>>,
}

impl ScriptedSource {
    pub fn new(streams: Vec<StreamInfo>) -> Self {
        Self {
            streams,
            reads: VecDeque::new(),
        }
    }

    pub fn with_units<I: IntoIterator<Item = EncodedUnit>>(mut self, units: I) -> Self {
        self.reads.extend(units.into_iter().map(|unit| Ok(Some(unit))));
        self
    }

    pub fn with_read_error(mut self, reason: &str) -> Self {
        self.reads.push_back(Err(Error::Read(reason.to_string())));
        self
    }
}

impl Source for ScriptedSource {
    fn streams(&self) -> &[StreamInfo] {
        &self.streams
    }

    fn read_next(&mut self) -> Result<Option<EncodedUnit>> {
        self.reads.pop_front().unwrap_or(Ok(None))
    }
}

#[derive(Debug, Default)]
pub struct CollectingSink {
    pub records: Vec<DiagnosticRecord>,
    pub opened: Vec<StreamOpened>,
}

impl CollectingSink {
    pub fn for_stream(&self, stream_index: usize) -> Vec<&DiagnosticRecord> {
        self.records
            .iter()
            .filter(|record| record.stream_index == stream_index)
            .collect()
    }
}

impl RecordSink for CollectingSink {
    fn emit(&mut self, record: &DiagnosticRecord) {
        self.records.push(record.clone());
    }

    fn stream_opened(&mut self, opened: &StreamOpened) {
        self.opened.push(opened.clone());
    }
}
