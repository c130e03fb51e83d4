//! Worker side of the channels.
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};

use log::debug;
use portal_base::{Error, Rank, RendezvousMask, Result};

use crate::hello::{send_hello, ChannelKind, Hello};
use crate::portal::read_full;

/// Sync and portal connection of one worker.
pub struct WorkerLink {
    rank: Rank,
    sync: TcpStream,
    portal: TcpStream,
}

impl WorkerLink {
    /// Connect both channels to the coordinator at `addr`.
    pub fn connect(addr: SocketAddr, rank: Rank) -> Result<WorkerLink> {
        let sync = open(addr, rank, ChannelKind::Sync)?;
        let portal = open(addr, rank, ChannelKind::Portal)?;
        debug!("rank {} connected to {}", rank, addr);
        Ok(WorkerLink { rank, sync, portal })
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// Block until the coordinator wakes this rank.
    pub fn wait_signal(&mut self) -> Result<RendezvousMask> {
        let rank = self.rank;
        let mut raw = [0u8; RendezvousMask::WIRE_SIZE];
        self.sync
            .read_exact(&mut raw)
            .map_err(|source| Error::Rendezvous { rank, source })?;
        let mask = RendezvousMask::from_le_bytes(raw);
        if !mask.contains(rank) {
            return Err(Error::UnexpectedMask { rank, mask });
        }
        Ok(mask)
    }

    /// Report this rank as ready to the coordinator.
    pub fn notify_ready(&mut self) -> Result<()> {
        let rank = self.rank;
        self.sync
            .write_all(&RendezvousMask::rank(rank).to_le_bytes())
            .map_err(|source| Error::Rendezvous { rank, source })
    }

    /// Blocking send of `buf` to the coordinator.
    pub fn send(&mut self, buf: &[u8]) -> Result<usize> {
        let rank = self.rank;
        self.portal
            .write_all(buf)
            .map_err(|source| Error::Transfer { rank, source })?;
        Ok(buf.len())
    }

    /// Blocking receive; returns less than `buf.len()` if the coordinator
    /// went away.
    pub fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        let rank = self.rank;
        read_full(&mut self.portal, buf).map_err(|source| Error::Transfer { rank, source })
    }
}

fn open(addr: SocketAddr, rank: Rank, channel: ChannelKind) -> Result<TcpStream> {
    let mut stream = TcpStream::connect(addr).map_err(Error::Setup)?;
    stream.set_nodelay(true).map_err(Error::Setup)?;
    send_hello(&mut stream, &Hello { rank, channel })?;
    Ok(stream)
}
