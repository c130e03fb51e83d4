//! Result records, one line per timed iteration.
use std::io::{self, Write};

use portal_base::{Pattern, RunConfig, TimingSample};

use crate::BenchOptions;

/// Fields shared by every record of a run.
#[derive(Clone, Debug)]
pub struct RecordFormat {
    platform: String,
    channel: String,
    pattern: Pattern,
    transfer_size: usize,
    worker_count: usize,
    /// Ticks per second
    frequency: u64,
}

impl RecordFormat {
    pub fn new(options: &BenchOptions, config: &RunConfig, frequency: u64) -> RecordFormat {
        RecordFormat {
            platform: options.platform_tag.clone(),
            channel: options.channel_tag.clone(),
            pattern: config.pattern(),
            transfer_size: config.transfer_size(),
            worker_count: config.worker_count(),
            frequency,
        }
    }

    /// `platform;channel;pattern;size;workers;kernel_s;network_s`
    pub fn line(&self, sample: TimingSample) -> String {
        format!(
            "{};{};{};{};{};{:.6};{:.6}",
            self.platform,
            self.channel,
            self.pattern,
            self.transfer_size,
            self.worker_count,
            self.seconds(sample.kernel_time),
            self.seconds(sample.network_time),
        )
    }

    pub fn write<W: Write>(&self, out: &mut W, sample: TimingSample) -> io::Result<()> {
        writeln!(out, "{}", self.line(sample))
    }

    fn seconds(&self, ticks: u64) -> f64 {
        ticks as f64 / self.frequency as f64
    }
}
