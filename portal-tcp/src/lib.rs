//! TCP backend for the portal benchmark channels.
//!
//! Every worker opens two connections to the coordinator listener: a
//! rendezvous ("sync") connection carrying 8-byte masks and a transfer
//! ("portal") connection carrying the benchmark payload. Each connection
//! starts with a small handshake naming the rank and the channel it serves.
use std::io;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use log::{debug, info};
use portal_base::{Error, Rank, RendezvousMask, Result};

mod hello;
use hello::{recv_hello, ChannelKind};
mod portal;
pub use portal::{PendingRecv, PortalReader, PortalWriter};
mod sync;
pub use sync::{SyncConsumer, SyncProducer};
mod worker;
pub use worker::WorkerLink;

/// Delay between two accept attempts while workers are starting up.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(1);

/// Channel listener of the coordinator.
pub struct Fabric {
    listener: TcpListener,
    worker_count: usize,
}

impl Fabric {
    /// Open the listener the workers connect to.
    pub fn bind(addr: SocketAddr, worker_count: usize) -> Result<Fabric> {
        let listener = TcpListener::bind(addr).map_err(Error::Setup)?;
        info!(
            "listening on {} for {} workers",
            listener.local_addr().map_err(Error::Setup)?,
            worker_count
        );
        Ok(Fabric {
            listener,
            worker_count,
        })
    }

    /// Address to hand out to the workers.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(Error::Setup)
    }

    /// Accept the sync and portal connection of every worker.
    ///
    /// `poll` is called whenever no connection is pending; returning an
    /// error from it aborts the setup (e.g. because a worker died).
    pub fn accept<F>(&self, mut poll: F) -> Result<Connections>
    where
        F: FnMut() -> Result<()>,
    {
        let n = self.worker_count;
        let mut sync: Vec<Option<TcpStream>> = (0..n).map(|_| None).collect();
        let mut portal: Vec<Option<TcpStream>> = (0..n).map(|_| None).collect();
        let mut pending = 2 * n;

        self.listener.set_nonblocking(true).map_err(Error::Setup)?;
        while pending > 0 {
            let (mut stream, peer) = match self.listener.accept() {
                Ok(conn) => conn,
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    poll()?;
                    thread::sleep(ACCEPT_BACKOFF);
                    continue;
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(Error::Setup(err)),
            };
            stream.set_nonblocking(false).map_err(Error::Setup)?;
            stream.set_nodelay(true).map_err(Error::Setup)?;

            let hello = recv_hello(&mut stream)?;
            if hello.rank >= n {
                return Err(Error::Handshake(format!(
                    "{} announced rank {} in a fleet of {}",
                    peer, hello.rank, n
                )));
            }
            let slot = match hello.channel {
                ChannelKind::Sync => &mut sync[hello.rank],
                ChannelKind::Portal => &mut portal[hello.rank],
            };
            if slot.is_some() {
                return Err(Error::Handshake(format!(
                    "duplicate {:?} connection for rank {}",
                    hello.channel, hello.rank
                )));
            }
            debug!("{} connected as rank {} ({:?})", peer, hello.rank, hello.channel);
            *slot = Some(stream);
            pending -= 1;
        }
        self.listener.set_nonblocking(false).map_err(Error::Setup)?;
        info!("all {} workers connected", n);

        Ok(Connections {
            sync: sync.into_iter().flatten().collect(),
            portal: portal.into_iter().flatten().collect(),
        })
    }
}

/// Established connections, indexed by rank.
pub struct Connections {
    sync: Vec<TcpStream>,
    portal: Vec<TcpStream>,
}

impl Connections {
    pub fn worker_count(&self) -> usize {
        self.sync.len()
    }

    /// Rendezvous endpoint used to wake workers.
    pub fn sync_producer(&self) -> Result<SyncProducer> {
        Ok(SyncProducer::new(clone_all(&self.sync)?))
    }

    /// Rendezvous endpoint workers report to, satisfied once every bit
    /// outside `match_mask` has been reported.
    pub fn sync_consumer(&self, match_mask: RendezvousMask) -> Result<SyncConsumer> {
        Ok(SyncConsumer::new(clone_all(&self.sync)?, match_mask))
    }

    /// Transfer endpoint in read mode.
    pub fn portal_reader(&self) -> Result<PortalReader> {
        Ok(PortalReader::new(clone_all(&self.portal)?))
    }

    /// Transfer endpoint in write mode.
    pub fn portal_writer(&self) -> Result<PortalWriter> {
        Ok(PortalWriter::new(clone_all(&self.portal)?))
    }

    /// Shut every connection down.
    pub fn close(self) -> Result<()> {
        for stream in self.sync.iter().chain(self.portal.iter()) {
            match stream.shutdown(Shutdown::Both) {
                Ok(()) => (),
                // The worker may already be gone
                Err(err) if err.kind() == io::ErrorKind::NotConnected => (),
                Err(err) => return Err(Error::Setup(err)),
            }
        }
        debug!("connections closed");
        Ok(())
    }
}

fn clone_all(streams: &[TcpStream]) -> Result<Vec<TcpStream>> {
    streams
        .iter()
        .map(|stream| stream.try_clone().map_err(Error::Setup))
        .collect()
}

/// Rank of a connection in a fleet, checked against its size.
pub(crate) fn checked_rank(rank: Rank, count: usize) -> Result<Rank> {
    if rank < count {
        Ok(rank)
    } else {
        Err(Error::InvalidRank(rank))
    }
}
