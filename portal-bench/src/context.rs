//! Per-run state shared by the kernels.
use portal_base::{Clock, MonotonicClock, Rank, RunConfig, Timer};

/// Coordinator buffer, one `transfer_size` slice per rank.
pub struct SharedBuffer {
    data: Vec<u8>,
    slice_size: usize,
}

impl SharedBuffer {
    pub fn new(config: &RunConfig) -> SharedBuffer {
        SharedBuffer {
            data: vec![0; config.buffer_size()],
            slice_size: config.transfer_size(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn slice(&self, rank: Rank) -> &[u8] {
        let start = rank * self.slice_size;
        &self.data[start..start + self.slice_size]
    }

    pub fn slice_mut(&mut self, rank: Rank) -> &mut [u8] {
        let start = rank * self.slice_size;
        &mut self.data[start..start + self.slice_size]
    }
}

/// Everything a kernel owns for the duration of a run.
pub struct RunContext<C = MonotonicClock> {
    pub(crate) config: RunConfig,
    pub(crate) buffer: SharedBuffer,
    pub(crate) timer: Timer<C>,
}

impl RunContext<MonotonicClock> {
    pub fn new(config: RunConfig) -> RunContext<MonotonicClock> {
        RunContext::with_clock(config, MonotonicClock::new())
    }
}

impl<C: Clock> RunContext<C> {
    pub fn with_clock(config: RunConfig, clock: C) -> RunContext<C> {
        RunContext {
            config,
            buffer: SharedBuffer::new(&config),
            timer: Timer::with_clock(clock),
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn buffer(&self) -> &SharedBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut SharedBuffer {
        &mut self.buffer
    }

    pub fn timer(&self) -> &Timer<C> {
        &self.timer
    }

    /// Calibrate the timer; done once the channels are set up.
    pub fn calibrate(&mut self) {
        self.timer.calibrate();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use portal_base::Pattern;

    #[test]
    fn test_slices() {
        let config = RunConfig::new(3, 1, 4, Pattern::Gather).unwrap();
        let mut buffer = SharedBuffer::new(&config);
        assert_eq!(buffer.len(), 12);
        buffer.slice_mut(1).copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(buffer.slice(0), &[0; 4]);
        assert_eq!(buffer.slice(1), &[1, 2, 3, 4]);
        assert_eq!(buffer.slice(2), &[0; 4]);
    }
}
