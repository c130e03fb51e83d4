//! Gather kernel: every worker sends its slice to the coordinator.
use log::{debug, trace};
use portal_base::{
    Clock, Error, PendingRead, RendezvousMask, RendezvousProducer, Result, TimingSample,
    TransferReader,
};

use crate::RunContext;

/// Run the gather benchmark, calling `emit` once per timed iteration.
///
/// Ranks are served one after the other: the read into the rank's slice is
/// armed before the rank is woken up, then waited for. Only the waits count
/// as network time.
pub fn gather<C, R, P, F>(
    ctx: &mut RunContext<C>,
    portal: &mut R,
    sync: &mut P,
    mut emit: F,
) -> Result<()>
where
    C: Clock,
    R: TransferReader,
    P: RendezvousProducer,
    F: FnMut(TimingSample) -> Result<()>,
{
    let config = ctx.config;
    let size = config.transfer_size();
    debug!(
        "gather: {} workers, {} bytes, {} iterations",
        config.worker_count(),
        size,
        config.iterations()
    );

    for k in config.rounds() {
        let mut network_time = 0;
        let t3 = ctx.timer.now();
        for rank in config.ranks() {
            let pending = portal.read_nb(rank, ctx.buffer.slice_mut(rank))?;

            // Unblock the worker
            sync.set_rank(rank)?;
            sync.signal(RendezvousMask::rank(rank))?;

            let t1 = ctx.timer.now();
            let received = pending.wait()?;
            let t2 = ctx.timer.now();
            if received != size {
                return Err(Error::ShortRead {
                    rank,
                    expected: size,
                    received,
                });
            }
            network_time += ctx.timer.elapsed(t1, t2);
        }
        let t4 = ctx.timer.now();

        let sample = ctx.timer.sample(t3, t4, network_time);
        if config.is_warmup(k) {
            trace!("gather: discarding round {} {:?}", k, sample);
            continue;
        }
        emit(sample)?;
    }
    Ok(())
}
