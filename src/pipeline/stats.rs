//! Run summary and per-stream anomaly counters
//!
//! Counters only observe emitted records; they never alter them.

use std::collections::BTreeMap;
use std::time::Duration;

use super::record::DiagnosticRecord;

/// Timing anomalies seen on one stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub records: u64,
    /// Presentation timestamp went backwards
    pub backward_pts: u64,
    /// Presentation timestamp did not advance
    pub repeated_pts: u64,
    /// Decode timestamp went backwards
    pub backward_dts: u64,
    /// Largest absolute presentation timestamp step
    pub max_pts_step: u64,
}

impl StreamStats {
    /// Update the counters from one emitted record.
    ///
    /// The decoded PTS is used when present, the encoded PTS otherwise.
    pub fn observe(&mut self, record: &DiagnosticRecord) {
        self.records += 1;

        let pts_delta = match &record.decoded {
            Some(decoded) => decoded.pts.delta,
            None => record.pts.delta,
        };
        if let Some(delta) = pts_delta {
            if delta < 0 {
                self.backward_pts += 1;
            } else if delta == 0 {
                self.repeated_pts += 1;
            }
            self.max_pts_step = self.max_pts_step.max(delta.unsigned_abs());
        }
        if record.dts.delta.is_some_and(|delta| delta < 0) {
            self.backward_dts += 1;
        }
    }
}

impl std::fmt::Display for StreamStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} records, {} backward pts, {} repeated pts, {} backward dts, max pts step {}",
            self.records, self.backward_pts, self.repeated_pts, self.backward_dts, self.max_pts_step
        )
    }
}

/// Counters for a whole dispatch run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub units_read: u64,
    /// Units discarded by the stream filter
    pub units_filtered: u64,
    /// Units whose stream index was never announced
    pub units_unknown_stream: u64,
    pub pass_through_records: u64,
    pub decoded_records: u64,
    pub submit_failures: u64,
    pub drain_failures: u64,
    /// Set when the pull loop ended on a read error instead of end of stream
    pub read_error: Option<String>,
    pub cancelled: bool,
    pub elapsed: Duration,
    pub streams: BTreeMap<usize, StreamStats>,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_emitted(&mut self, record: &DiagnosticRecord) {
        if record.is_pass_through() {
            self.pass_through_records += 1;
        } else {
            self.decoded_records += 1;
        }
        self.streams
            .entry(record.stream_index)
            .or_default()
            .observe(record);
    }

    pub fn total_records(&self) -> u64 {
        self.pass_through_records + self.decoded_records
    }

    /// Whether any unit level failure happened during the run
    pub fn had_failures(&self) -> bool {
        self.submit_failures > 0 || self.drain_failures > 0 || self.read_error.is_some()
    }
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Summary: {} units read ({} filtered, {} unknown stream), {} records ({} decoded, {} pass-through), \
             {} submit failures, {} drain failures in {:.3}s",
            self.units_read,
            self.units_filtered,
            self.units_unknown_stream,
            self.total_records(),
            self.decoded_records,
            self.pass_through_records,
            self.submit_failures,
            self.drain_failures,
            self.elapsed.as_secs_f64()
        )?;
        if self.cancelled {
            write!(f, ", cancelled")?;
        }
        if let Some(err) = &self.read_error {
            write!(f, ", stopped on read error: {}", err)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::record::{DecodedFields, TimingField};
    use crate::pipeline::types::MediaKind;

    fn record(stream_index: usize, pts_delta: Option<i64>, dts_delta: Option<i64>) -> DiagnosticRecord {
        DiagnosticRecord {
            sequence: 0,
            stream_index,
            kind: MediaKind::Other,
            pts: TimingField {
                value: Some(0),
                delta: pts_delta,
            },
            dts: TimingField {
                value: Some(0),
                delta: dts_delta,
            },
            duration: 0,
            key: false,
            decoded: None,
        }
    }

    #[test]
    fn test_stream_anomaly_counters() {
        let mut stats = StreamStats::default();
        stats.observe(&record(0, None, None));
        stats.observe(&record(0, Some(40), Some(40)));
        stats.observe(&record(0, Some(0), Some(40)));
        stats.observe(&record(0, Some(-120), Some(-5)));

        assert_eq!(stats.records, 4);
        assert_eq!(stats.backward_pts, 1);
        assert_eq!(stats.repeated_pts, 1);
        assert_eq!(stats.backward_dts, 1);
        assert_eq!(stats.max_pts_step, 120);
    }

    #[test]
    fn test_decoded_pts_preferred() {
        let mut stats = StreamStats::default();
        let mut decoded = record(0, Some(-80), Some(40));
        decoded.decoded = Some(DecodedFields {
            pts: TimingField {
                value: Some(40),
                delta: Some(40),
            },
            decode_pts: None,
            video: None,
        });
        stats.observe(&decoded);

        assert_eq!(stats.backward_pts, 0);
        assert_eq!(stats.max_pts_step, 40);
    }

    #[test]
    fn test_run_stats_split_by_stream() {
        let mut stats = RunStats::new();
        stats.record_emitted(&record(0, None, None));
        stats.record_emitted(&record(1, None, None));
        stats.record_emitted(&record(1, Some(-1), None));

        assert_eq!(stats.total_records(), 3);
        assert_eq!(stats.pass_through_records, 3);
        assert_eq!(stats.streams[&1].records, 2);
        assert_eq!(stats.streams[&1].backward_pts, 1);
        assert!(!stats.had_failures());

        stats.drain_failures += 1;
        assert!(stats.had_failures());
        assert!(stats.to_string().contains("1 drain failures"));
    }
}
