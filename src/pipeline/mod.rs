//! Demux/decode dispatch pipeline
//!
//! This module holds the only stateful part of the tool:
//! - Registry: one `StreamState` per stream index, with its decoder
//! - Dispatch: the single pull-driven loop feeding decoders
//! - Tracker: per-stream previous timestamps and deltas
//! - Sink: where the resulting records go
//!
//! # Architecture
//!
//! Control flow is one synchronous loop. Decoders are driven with a
//! submit/drain protocol and never call back into the loop. Deltas are
//! computed per stream index, in processing order.

pub mod dispatch;
pub mod record;
pub mod registry;
pub mod sink;
pub mod state;
pub mod stats;
pub mod tracker;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatch::Dispatcher;
pub use record::{DiagnosticRecord, StreamOpened};
pub use registry::{DecoderSlot, StreamRegistry, StreamState};
pub use sink::{LogSink, RecordSink};
pub use state::LoopState;
pub use stats::{RunStats, StreamStats};
pub use types::{DecodedUnit, EncodedUnit, MediaKind, PictureKind, StreamFilter, StreamInfo, TimeBase};
