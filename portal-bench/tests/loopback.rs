//! Kernels against worker threads over loopback TCP.
use std::net::SocketAddr;
use std::thread::{self, JoinHandle};

use portal_base::{Pattern, RendezvousMask, Result, RunConfig};
use portal_bench::{broadcast, gather, run_worker, RunContext, WorkerConfig};
use portal_tcp::{Connections, Fabric, WorkerLink};

fn start(config: RunConfig) -> (Connections, Vec<JoinHandle<Result<()>>>) {
    let fabric = Fabric::bind(SocketAddr::from(([127, 0, 0, 1], 0)), config.worker_count()).unwrap();
    let addr = fabric.local_addr().unwrap();
    let workers: Vec<_> = config
        .ranks()
        .map(|rank| {
            let worker = WorkerConfig::new(
                rank,
                config.iterations(),
                config.transfer_size(),
                config.pattern(),
            )
            .unwrap();
            thread::spawn(move || {
                let mut link = WorkerLink::connect(addr, rank)?;
                run_worker(&mut link, &worker)
            })
        })
        .collect();
    let conns = fabric.accept(|| Ok(())).unwrap();
    (conns, workers)
}

fn finish(conns: Connections, workers: Vec<JoinHandle<Result<()>>>) {
    for worker in workers {
        worker.join().unwrap().unwrap();
    }
    conns.close().unwrap();
}

#[test]
fn test_gather() {
    let config = RunConfig::new(4, 3, 256, Pattern::Gather).unwrap();
    let (conns, workers) = start(config);

    let mut ctx = RunContext::new(config);
    let mut portal = conns.portal_reader().unwrap();
    let mut sync = conns.sync_producer().unwrap();
    ctx.calibrate();
    let mut samples = vec![];
    gather(&mut ctx, &mut portal, &mut sync, |sample| {
        samples.push(sample);
        Ok(())
    })
    .unwrap();

    assert_eq!(samples.len(), 3);
    for sample in &samples {
        assert!(sample.network_time >= ctx.timer().overhead());
    }
    for rank in config.ranks() {
        assert!(ctx.buffer().slice(rank).iter().all(|&b| b == rank as u8));
    }
    finish(conns, workers);
}

#[test]
fn test_broadcast() {
    let config = RunConfig::new(3, 2, 64, Pattern::Broadcast).unwrap();
    let (conns, workers) = start(config);

    let mut ctx = RunContext::new(config);
    let mut portal = conns.portal_writer().unwrap();
    let mut sync = conns
        .sync_consumer(RendezvousMask::match_all(config.worker_count()))
        .unwrap();
    ctx.calibrate();
    let mut samples = vec![];
    broadcast(&mut ctx, &mut portal, &mut sync, |sample| {
        samples.push(sample);
        Ok(())
    })
    .unwrap();

    assert_eq!(samples.len(), 2);
    finish(conns, workers);
}
