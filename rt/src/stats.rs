// rt/src/stats.rs
//! The statistics sink used by the binary: one `info` log line per run.

use log::info;
use rt_core::{RunRecord, StatsSink};

#[derive(Debug, Default, Clone, Copy)]
pub struct LogStatsSink;

impl StatsSink for LogStatsSink {
    fn record(&self, record: &RunRecord) {
        info!(
            "filter={} command={:?} exit={} tokens {} -> {} (saved {}, {:.1}%)",
            record.filter_name,
            record.command,
            record.exit_code,
            record.raw_tokens,
            record.filtered_tokens,
            record.saved_tokens(),
            record.savings_percent(),
        );
    }
}
