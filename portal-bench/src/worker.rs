//! Worker side of the benchmark.
use log::{debug, trace};
use portal_base::{check_iterations, check_transfer_size, Error, Pattern, Rank, Result};
use portal_tcp::WorkerLink;

/// Per-worker run parameters, as handed over on the command line.
#[derive(Clone, Copy, Debug)]
pub struct WorkerConfig {
    pub rank: Rank,
    pub iterations: usize,
    pub transfer_size: usize,
    pub pattern: Pattern,
}

impl WorkerConfig {
    pub fn new(
        rank: Rank,
        iterations: usize,
        transfer_size: usize,
        pattern: Pattern,
    ) -> Result<WorkerConfig> {
        Ok(WorkerConfig {
            rank,
            iterations: check_iterations(iterations)?,
            transfer_size: check_transfer_size(transfer_size)?,
            pattern,
        })
    }

    /// Rounds including the two warm-up rounds.
    fn rounds(&self) -> usize {
        self.iterations + 2
    }
}

/// Mirror the coordinator kernel for one rank.
///
/// Gather: wait to be woken, then send the slice. Broadcast: report ready,
/// then receive the slice.
pub fn run_worker(link: &mut WorkerLink, config: &WorkerConfig) -> Result<()> {
    let rank = config.rank;
    let mut buf = vec![rank as u8; config.transfer_size];
    debug!(
        "rank {}: {} rounds of {} ({} bytes)",
        rank,
        config.rounds(),
        config.pattern,
        buf.len()
    );

    for k in 0..config.rounds() {
        match config.pattern {
            Pattern::Gather => {
                link.wait_signal()?;
                link.send(&buf)?;
            }
            Pattern::Broadcast => {
                link.notify_ready()?;
                let received = link.recv(&mut buf)?;
                if received != buf.len() {
                    return Err(Error::ShortRead {
                        rank,
                        expected: buf.len(),
                        received,
                    });
                }
            }
        }
        trace!("rank {}: round {} done", rank, k);
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use portal_base::{
        PendingRead, RendezvousConsumer, RendezvousMask, RendezvousProducer, TransferReader,
        TransferWriter,
    };
    use portal_tcp::Fabric;
    use std::net::SocketAddr;
    use std::thread;

    fn fabric(n: usize) -> (Fabric, SocketAddr) {
        let fabric = Fabric::bind(SocketAddr::from(([127, 0, 0, 1], 0)), n).unwrap();
        let addr = fabric.local_addr().unwrap();
        (fabric, addr)
    }

    #[test]
    fn test_config_checks() {
        assert!(WorkerConfig::new(0, 1, 8, Pattern::Gather).is_ok());
        assert!(matches!(
            WorkerConfig::new(0, 0, 8, Pattern::Gather),
            Err(Error::InvalidIterationCount(0))
        ));
        assert!(matches!(
            WorkerConfig::new(0, 1, 7, Pattern::Gather),
            Err(Error::InvalidTransferSize(7))
        ));
    }

    #[test]
    fn test_gather_rounds() {
        let (fabric, addr) = fabric(1);
        let worker = thread::spawn(move || {
            let config = WorkerConfig::new(0, 2, 4, Pattern::Gather).unwrap();
            let mut link = WorkerLink::connect(addr, 0).unwrap();
            run_worker(&mut link, &config)
        });
        let conns = fabric.accept(|| Ok(())).unwrap();
        let mut sync = conns.sync_producer().unwrap();
        let mut portal = conns.portal_reader().unwrap();
        sync.set_rank(0).unwrap();
        for _ in 0..4 {
            let mut buf = [0xff; 4];
            sync.signal(RendezvousMask::rank(0)).unwrap();
            let received = portal.read_nb(0, &mut buf).unwrap().wait().unwrap();
            assert_eq!(received, 4);
            assert_eq!(buf, [0; 4]);
        }
        worker.join().unwrap().unwrap();
    }

    /// The worker notices a coordinator that hangs up mid-broadcast
    #[test]
    fn test_broadcast_short_read() {
        let (fabric, addr) = fabric(1);
        let worker = thread::spawn(move || {
            let config = WorkerConfig::new(0, 1, 8, Pattern::Broadcast).unwrap();
            let mut link = WorkerLink::connect(addr, 0).unwrap();
            run_worker(&mut link, &config)
        });
        let conns = fabric.accept(|| Ok(())).unwrap();
        let mut sync = conns.sync_consumer(RendezvousMask::match_all(1)).unwrap();
        let mut portal = conns.portal_writer().unwrap();
        sync.wait().unwrap();
        portal.set_rank(0).unwrap();
        portal.write(&[1, 2, 3, 4]).unwrap();
        drop(portal);
        drop(sync);
        conns.close().unwrap();
        assert!(matches!(
            worker.join().unwrap(),
            Err(Error::ShortRead {
                rank: 0,
                expected: 8,
                received: 4
            })
        ));
    }
}
