//! Broadcast kernel: the coordinator sends one slice to every worker.
use log::{debug, trace};
use portal_base::{Clock, Error, RendezvousConsumer, Result, TimingSample, TransferWriter};

use crate::RunContext;

/// Run the broadcast benchmark, calling `emit` once per timed iteration.
///
/// Each round waits for a single aggregate readiness signal from the whole
/// fleet, then writes to the ranks one after the other. Only the writes
/// count as network time.
pub fn broadcast<C, W, S, F>(
    ctx: &mut RunContext<C>,
    portal: &mut W,
    sync: &mut S,
    mut emit: F,
) -> Result<()>
where
    C: Clock,
    W: TransferWriter,
    S: RendezvousConsumer,
    F: FnMut(TimingSample) -> Result<()>,
{
    let config = ctx.config;
    let size = config.transfer_size();
    debug!(
        "broadcast: {} workers, {} bytes, {} iterations",
        config.worker_count(),
        size,
        config.iterations()
    );

    for k in config.rounds() {
        let mut network_time = 0;
        let t3 = ctx.timer.now();

        // Wait for the workers
        let mask = sync.wait()?;
        trace!("broadcast: round {} released by {:?}", k, mask);

        for rank in config.ranks() {
            portal.set_rank(rank)?;
            let t1 = ctx.timer.now();
            let written = portal.write(ctx.buffer.slice(rank))?;
            let t2 = ctx.timer.now();
            if written != size {
                return Err(Error::ShortWrite {
                    rank,
                    expected: size,
                    written,
                });
            }
            network_time += ctx.timer.elapsed(t1, t2);
        }
        let t4 = ctx.timer.now();

        let sample = ctx.timer.sample(t3, t4, network_time);
        if config.is_warmup(k) {
            trace!("broadcast: discarding round {} {:?}", k, sample);
            continue;
        }
        emit(sample)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fake::{Event, FakeConsumer, FakeWriter, Log};
    use portal_base::{Pattern, RendezvousMask, RunConfig, StepClock};

    fn context(worker_count: usize, iterations: usize, size: usize) -> RunContext<StepClock> {
        let config = RunConfig::new(worker_count, iterations, size, Pattern::Broadcast).unwrap();
        let mut ctx = RunContext::with_clock(config, StepClock::new(10, 1000));
        ctx.calibrate();
        for rank in 0..worker_count {
            ctx.buffer_mut().slice_mut(rank).fill(rank as u8 + 1);
        }
        ctx
    }

    fn run(ctx: &mut RunContext<StepClock>, limit: usize) -> (Log, Result<Vec<TimingSample>>) {
        let log = Log::default();
        let mut writer = FakeWriter {
            log: log.clone(),
            target: None,
            limit,
        };
        let mut consumer = FakeConsumer { log: log.clone() };
        let mut samples = vec![];
        let result = broadcast(ctx, &mut writer, &mut consumer, |sample| {
            samples.push(sample);
            Ok(())
        });
        (log, result.map(|_| samples))
    }

    #[test]
    fn test_one_sample_per_iteration() {
        let mut ctx = context(4, 3, 16);
        let (_, samples) = run(&mut ctx, usize::MAX);
        assert_eq!(samples.unwrap().len(), 3);
    }

    /// One readiness wait per round, then one full-size write per rank in
    /// increasing rank order
    #[test]
    fn test_write_order() {
        let mut ctx = context(3, 2, 6);
        let (log, _) = run(&mut ctx, usize::MAX);
        let mut expected = vec![];
        for _ in 0..4 {
            expected.push(Event::Ready(RendezvousMask::FULL));
            for rank in 0..3 {
                expected.push(Event::Write(rank, vec![rank as u8 + 1; 6]));
            }
        }
        assert_eq!(*log.borrow(), expected);
    }

    #[test]
    fn test_timing() {
        let mut ctx = context(2, 3, 8);
        let (_, samples) = run(&mut ctx, usize::MAX);
        for sample in samples.unwrap() {
            assert_eq!(sample.network_time, 20);
            // Readiness wait is not network time
            assert_eq!(sample.kernel_time, 20);
        }
    }

    #[test]
    fn test_short_write() {
        let mut ctx = context(2, 1, 8);
        let (log, result) = run(&mut ctx, 4);
        assert!(matches!(
            result,
            Err(Error::ShortWrite {
                rank: 0,
                expected: 8,
                written: 4
            })
        ));
        assert_eq!(log.borrow().len(), 2);
    }
}
