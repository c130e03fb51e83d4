//! Tick counter with measurement overhead correction.
use std::cell::Cell;
use std::time::Instant;

use log::debug;

/// Monotonic tick source.
pub trait Clock {
    /// Current counter value; never decreases.
    fn now(&self) -> u64;

    /// Nominal number of ticks per second.
    fn frequency(&self) -> u64;
}

/// Nanosecond counter backed by the OS monotonic clock.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> MonotonicClock {
        MonotonicClock {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> MonotonicClock {
        MonotonicClock::new()
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }

    fn frequency(&self) -> u64 {
        1_000_000_000
    }
}

/// Clock advancing by a fixed step on every read.
#[derive(Debug)]
pub struct StepClock {
    next: Cell<u64>,
    step: u64,
    frequency: u64,
}

impl StepClock {
    pub fn new(step: u64, frequency: u64) -> StepClock {
        StepClock {
            next: Cell::new(0),
            step,
            frequency,
        }
    }
}

impl Clock for StepClock {
    fn now(&self) -> u64 {
        let now = self.next.get();
        self.next.set(now + self.step);
        now
    }

    fn frequency(&self) -> u64 {
        self.frequency
    }
}

/// Timings of one kernel iteration, in ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimingSample {
    /// Iteration time not spent waiting on transfers
    pub kernel_time: u64,
    /// Time spent waiting on transfers
    pub network_time: u64,
}

pub struct Timer<C = MonotonicClock> {
    clock: C,
    /// Latency of two back-to-back counter reads
    overhead: u64,
}

impl Timer<MonotonicClock> {
    pub fn new() -> Timer<MonotonicClock> {
        Timer::with_clock(MonotonicClock::new())
    }
}

impl Default for Timer<MonotonicClock> {
    fn default() -> Timer<MonotonicClock> {
        Timer::new()
    }
}

impl<C: Clock> Timer<C> {
    /// Uncalibrated timer (zero overhead) reading from `clock`.
    pub fn with_clock(clock: C) -> Timer<C> {
        Timer { clock, overhead: 0 }
    }

    #[inline]
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Measure the cost of reading the counter. Must run before any timed
    /// loop.
    pub fn calibrate(&mut self) {
        let start = self.clock.now();
        let end = self.clock.now();
        self.overhead = end.saturating_sub(start);
        debug!("timer overhead: {} ticks", self.overhead);
    }

    pub fn overhead(&self) -> u64 {
        self.overhead
    }

    /// Corrected duration between `t1` and `t2`; never below the overhead.
    #[inline]
    pub fn elapsed(&self, t1: u64, t2: u64) -> u64 {
        self.floor(t2.saturating_sub(t1).saturating_sub(self.overhead))
    }

    /// Clamp a derived duration to the noise floor.
    #[inline]
    pub fn floor(&self, ticks: u64) -> u64 {
        ticks.max(self.overhead)
    }

    /// Build the sample of an iteration spanning `t_start..t_end` of which
    /// `network_time` was spent in transfers.
    pub fn sample(&self, t_start: u64, t_end: u64, network_time: u64) -> TimingSample {
        let total = self.elapsed(t_start, t_end);
        TimingSample {
            kernel_time: self.floor(total.saturating_sub(network_time)),
            network_time,
        }
    }

    /// Nominal ticks per second of the underlying clock.
    pub fn frequency(&self) -> u64 {
        self.clock.frequency()
    }
}
