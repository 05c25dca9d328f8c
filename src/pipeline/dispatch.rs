//! Demux/decode dispatch loop
//!
//! Pulls encoded units from the source in order, routes each one to its
//! stream's decoder (or straight to the timing tracker for streams that
//! are not decoded) and drains every decoded unit the decoder has ready
//! before the next pull. Nothing is reordered or buffered here.

use std::time::Instant;

use log::{debug, error, info, warn};

use crate::config::DecoderTuning;
use crate::decoder::{DecoderAdapter, DecoderFactory, DrainResult, SubmitResult};
use crate::error::{Error, Result};
use crate::source::Source;
use crate::utils::sos::SignalOfStop;

use super::record::DiagnosticRecord;
use super::registry::{DecoderSlot, StreamRegistry};
use super::sink::RecordSink;
use super::state::LoopState;
use super::stats::RunStats;
use super::tracker::TimingTracker;
use super::types::{EncodedUnit, StreamFilter, StreamInfo};

pub struct Dispatcher<S: Source, K: RecordSink> {
    source: S,
    registry: StreamRegistry,
    sink: K,
    state: LoopState,
    stop: SignalOfStop,
    stats: RunStats,
}

impl<S: Source, K: RecordSink> Dispatcher<S, K> {
    /// Register the source's streams, opening their decoders.
    pub fn new(
        source: S,
        factory: &mut dyn DecoderFactory,
        tuning: DecoderTuning,
        mut sink: K,
    ) -> Self {
        let registry = StreamRegistry::open_all(source.streams(), tuning, factory, &mut sink);
        Self::with_registry(source, registry, sink)
    }

    pub fn with_registry(source: S, registry: StreamRegistry, sink: K) -> Self {
        Self {
            source,
            registry,
            sink,
            state: LoopState::Idle,
            stop: SignalOfStop::new(),
            stats: RunStats::new(),
        }
    }

    /// Use `stop` to end the run between two units.
    pub fn with_stop_signal(mut self, stop: SignalOfStop) -> Self {
        self.stop = stop;
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn into_sink(self) -> K {
        self.sink
    }

    /// Run the loop until end of stream, a read error or a stop request.
    ///
    /// Only a misuse of the loop itself is returned as an error; read
    /// errors end the run and are reported in the returned stats.
    pub fn run(&mut self, filter: StreamFilter) -> Result<RunStats> {
        self.transition(LoopState::Running {
            started_at: Instant::now(),
        })?;
        info!("Dump {}", filter);

        loop {
            if self.stop.cancelled() {
                info!("Stop requested, ending the run");
                self.stats.cancelled = true;
                break;
            }

            let unit = match self.source.read_next() {
                Ok(Some(unit)) => unit,
                Ok(None) => {
                    debug!("End of stream");
                    break;
                }
                Err(e) => {
                    error!("{}", e);
                    self.stats.read_error = Some(e.to_string());
                    break;
                }
            };
            self.stats.units_read += 1;

            if !filter.matches(unit.stream_index) {
                self.stats.units_filtered += 1;
                continue;
            }
            self.dispatch(&unit);
        }

        self.stats.elapsed = self.state.running_duration().unwrap_or_default();
        self.transition(LoopState::Stopping)?;
        self.registry.close_all();
        self.transition(LoopState::Stopped)?;

        Ok(self.stats.clone())
    }

    fn transition(&mut self, target: LoopState) -> Result<()> {
        if !self.state.can_transition_to(&target) {
            return Err(Error::InvalidState(format!(
                "dispatch loop cannot go from {} to {}",
                self.state, target
            )));
        }
        self.state = target;
        Ok(())
    }

    fn dispatch(&mut self, unit: &EncodedUnit) {
        let state = match self.registry.lookup(unit.stream_index) {
            Ok(state) => state,
            Err(e) => {
                warn!("{}, dropping unit", e);
                self.stats.units_unknown_stream += 1;
                return;
            }
        };

        match &mut state.decoder {
            DecoderSlot::Open(decoder) => decode_unit(
                decoder.as_mut(),
                &state.info,
                &mut state.timing,
                unit,
                &mut self.sink,
                &mut self.stats,
            ),
            _ => {
                let record = state.timing.pass_through(&state.info, unit);
                emit(&mut self.sink, &mut self.stats, &record);
            }
        }
    }
}

/// Submit one unit and drain everything the decoder has ready.
///
/// A failed submit is logged and the drain still happens, since units
/// buffered by earlier submits must not be lost. A failed drain ends
/// processing of this unit only.
fn decode_unit<K: RecordSink + ?Sized>(
    decoder: &mut dyn DecoderAdapter,
    info: &StreamInfo,
    timing: &mut TimingTracker,
    unit: &EncodedUnit,
    sink: &mut K,
    stats: &mut RunStats,
) {
    match decoder.submit(unit) {
        SubmitResult::Accepted => {}
        SubmitResult::TemporarilyFull => {
            warn!(
                "Stream {}: decoder is full, unit with pts {:?} was not accepted",
                info.index, unit.pts
            );
            stats.submit_failures += 1;
        }
        SubmitResult::Failed(reason) => {
            warn!(
                "Stream {}: Error while sending a packet to the decoder: {}",
                info.index, reason
            );
            stats.submit_failures += 1;
        }
    }

    loop {
        match decoder.drain() {
            DrainResult::Unit(decoded) => {
                let record = timing.decoded(info, unit, &decoded);
                emit(sink, stats, &record);
            }
            DrainResult::NeedsMoreInput | DrainResult::EndOfStream => break,
            DrainResult::Failed(reason) => {
                warn!(
                    "Stream {}: Error while receiving a frame from the decoder: {}",
                    info.index, reason
                );
                stats.drain_failures += 1;
                return;
            }
        }
    }
}

fn emit<K: RecordSink + ?Sized>(sink: &mut K, stats: &mut RunStats, record: &DiagnosticRecord) {
    sink.emit(record);
    stats.record_emitted(record);
}
