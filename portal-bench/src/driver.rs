//! Benchmark driver: channel setup, worker fleet, kernel dispatch and
//! teardown.
use std::io::Write;

use log::info;
use portal_base::{Error, Pattern, RendezvousMask, Result, RunConfig, TimingSample};
use portal_exec::{LaunchSpec, WorkerPool};
use portal_tcp::Fabric;

use crate::{broadcast, gather, BenchOptions, RecordFormat, RunContext};

/// Run one benchmark and write its result records to `out`.
///
/// Any failure aborts the run; workers still running at that point are
/// killed.
pub fn run<W: Write>(config: RunConfig, options: &BenchOptions, out: &mut W) -> Result<()> {
    let fabric = Fabric::bind(options.address, config.worker_count())?;
    let spec = LaunchSpec::new(options.worker_binary()?)
        .arg("--address")
        .arg(fabric.local_addr()?.to_string());
    let mut pool = WorkerPool::spawn(&spec, &config)?;
    let conns = fabric.accept(|| pool.poll())?;

    let mut ctx = RunContext::new(config);
    let format = RecordFormat::new(options, &config, ctx.timer().frequency());
    let emit = |sample: TimingSample| format.write(&mut *out, sample).map_err(Error::Report);

    match config.pattern() {
        Pattern::Gather => {
            let mut portal = conns.portal_reader()?;
            let mut sync = conns.sync_producer()?;
            ctx.calibrate();
            gather(&mut ctx, &mut portal, &mut sync, emit)?;
        }
        Pattern::Broadcast => {
            let mut portal = conns.portal_writer()?;
            let mut sync = conns.sync_consumer(RendezvousMask::match_all(config.worker_count()))?;
            ctx.calibrate();
            broadcast(&mut ctx, &mut portal, &mut sync, emit)?;
        }
    }

    pool.join()?;
    conns.close()?;
    out.flush().map_err(Error::Report)?;
    info!("{} run complete", config.pattern());
    Ok(())
}
