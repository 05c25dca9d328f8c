//! Record sinks

use crate::config::OutputFormat;

use super::record::{DiagnosticRecord, StreamOpened};

pub const RECORD_TARGET: &str = "ptsdump::record";
pub const STREAM_TARGET: &str = "ptsdump::stream";

/// Destination of emitted records. Fire and forget, in emission order.
pub trait RecordSink {
    fn emit(&mut self, record: &DiagnosticRecord);

    /// Called once per audio/video stream when it is opened.
    fn stream_opened(&mut self, _opened: &StreamOpened) {}
}

/// Writes every record through the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink {
    format: OutputFormat,
}

impl LogSink {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    fn render<T: serde::Serialize + std::fmt::Display>(&self, value: &T) -> String {
        match self.format {
            OutputFormat::Text => value.to_string(),
            OutputFormat::Json => serde_json::to_string(value).unwrap_or_else(|e| {
                log::warn!("Unable to serialize record: {}", e);
                value.to_string()
            }),
        }
    }
}

impl RecordSink for LogSink {
    fn emit(&mut self, record: &DiagnosticRecord) {
        log::info!(target: RECORD_TARGET, "{}", self.render(record));
    }

    fn stream_opened(&mut self, opened: &StreamOpened) {
        log::info!(target: STREAM_TARGET, "{}", self.render(opened));
    }
}
