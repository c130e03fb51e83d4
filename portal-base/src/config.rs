//! Run parameters.
use std::fmt;
use std::ops::{Range, RangeInclusive};
use std::str::FromStr;

use crate::{Error, Rank, Result};

/// Maximum number of workers in a run.
pub const MAX_WORKERS: usize = 16;

/// Maximum number of bytes moved per worker and iteration.
pub const MAX_BUFFER: usize = 1024 * 1024;

/// Collective pattern under measurement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pattern {
    /// Many-to-one: every worker sends its slice to the coordinator
    Gather,
    /// One-to-many: the coordinator sends one slice to every worker
    Broadcast,
}

impl Pattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pattern::Gather => "gather",
            Pattern::Broadcast => "broadcast",
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Pattern> {
        match s {
            "gather" => Ok(Pattern::Gather),
            "broadcast" => Ok(Pattern::Broadcast),
            _ => Err(Error::UnknownPattern(s.to_string())),
        }
    }
}

/// Check an iteration count; shared with the worker side.
pub fn check_iterations(iterations: usize) -> Result<usize> {
    if iterations == 0 {
        return Err(Error::InvalidIterationCount(iterations));
    }
    Ok(iterations)
}

/// Check a per-worker transfer size; shared with the worker side.
pub fn check_transfer_size(transfer_size: usize) -> Result<usize> {
    if transfer_size == 0 || transfer_size > MAX_BUFFER || transfer_size % 2 != 0 {
        return Err(Error::InvalidTransferSize(transfer_size));
    }
    Ok(transfer_size)
}

/// Validated benchmark parameters, immutable for the whole run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunConfig {
    worker_count: usize,
    iterations: usize,
    transfer_size: usize,
    pattern: Pattern,
}

impl RunConfig {
    pub fn new(
        worker_count: usize,
        iterations: usize,
        transfer_size: usize,
        pattern: Pattern,
    ) -> Result<RunConfig> {
        if worker_count == 0 || worker_count > MAX_WORKERS {
            return Err(Error::InvalidWorkerCount(worker_count));
        }
        Ok(RunConfig {
            worker_count,
            iterations: check_iterations(iterations)?,
            transfer_size: check_transfer_size(transfer_size)?,
            pattern,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Number of timed iterations (warm-up and cool-down not included).
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn transfer_size(&self) -> usize {
        self.transfer_size
    }

    pub fn pattern(&self) -> Pattern {
        self.pattern
    }

    /// Ranks in the order the kernels serve them.
    pub fn ranks(&self) -> Range<Rank> {
        0..self.worker_count
    }

    /// Every loop pass, including the warm-up and cool-down passes.
    pub fn rounds(&self) -> RangeInclusive<usize> {
        0..=self.iterations + 1
    }

    /// Whether round `k` is excluded from the reported timings.
    pub fn is_warmup(&self, k: usize) -> bool {
        k == 0 || k == self.iterations + 1
    }

    /// Size of the coordinator buffer holding one slice per worker.
    pub fn buffer_size(&self) -> usize {
        self.worker_count * self.transfer_size
    }
}
