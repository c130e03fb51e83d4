//! Rendezvous endpoints of the coordinator.
use std::io::{Read, Write};
use std::net::TcpStream;

use log::trace;
use portal_base::{
    Error, MatchState, Rank, RendezvousConsumer, RendezvousMask, RendezvousProducer, Result,
};

use crate::checked_rank;

/// Wakes workers by writing a mask to their sync connection.
pub struct SyncProducer {
    streams: Vec<TcpStream>,
    target: Option<Rank>,
}

impl SyncProducer {
    pub(crate) fn new(streams: Vec<TcpStream>) -> SyncProducer {
        SyncProducer {
            streams,
            target: None,
        }
    }
}

impl RendezvousProducer for SyncProducer {
    fn set_rank(&mut self, rank: Rank) -> Result<()> {
        self.target = Some(checked_rank(rank, self.streams.len())?);
        Ok(())
    }

    fn signal(&mut self, mask: RendezvousMask) -> Result<()> {
        let rank = self.target.ok_or(Error::NoTargetRank)?;
        trace!("signal {:?} to rank {}", mask, rank);
        self.streams[rank]
            .write_all(&mask.to_le_bytes())
            .map_err(|source| Error::Rendezvous { rank, source })
    }
}

/// Collects the readiness reports of the workers.
pub struct SyncConsumer {
    streams: Vec<TcpStream>,
    state: MatchState,
}

impl SyncConsumer {
    pub(crate) fn new(streams: Vec<TcpStream>, match_mask: RendezvousMask) -> SyncConsumer {
        SyncConsumer {
            streams,
            state: MatchState::new(match_mask),
        }
    }
}

impl RendezvousConsumer for SyncConsumer {
    fn wait(&mut self) -> Result<RendezvousMask> {
        while let Some(rank) = self.state.outstanding().first() {
            let rank = checked_rank(rank, self.streams.len())?;
            let mut raw = [0u8; RendezvousMask::WIRE_SIZE];
            self.streams[rank]
                .read_exact(&mut raw)
                .map_err(|source| Error::Rendezvous { rank, source })?;
            let mask = RendezvousMask::from_le_bytes(raw);
            if !mask.contains(rank) {
                return Err(Error::UnexpectedMask { rank, mask });
            }
            trace!("rank {} reported {:?}", rank, mask);
            self.state.report(mask);
        }
        Ok(self.state.take())
    }
}
