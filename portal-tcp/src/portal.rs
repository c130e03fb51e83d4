//! Transfer endpoints of the coordinator.
use std::io::{self, Read, Write};
use std::net::TcpStream;

use log::trace;
use portal_base::{
    Error, PendingRead, Rank, RequestStatus, Result, TransferReader, TransferWriter,
};

use crate::checked_rank;

/// Transfer channel in read mode, one connection per rank.
pub struct PortalReader {
    streams: Vec<TcpStream>,
}

impl PortalReader {
    pub(crate) fn new(streams: Vec<TcpStream>) -> PortalReader {
        PortalReader { streams }
    }
}

impl TransferReader for PortalReader {
    type Pending<'a> = PendingRecv<'a>;

    fn read_nb<'a>(&'a mut self, rank: Rank, buf: &'a mut [u8]) -> Result<PendingRecv<'a>> {
        let rank = checked_rank(rank, self.streams.len())?;
        trace!("armed read of {} bytes from rank {}", buf.len(), rank);
        Ok(PendingRecv {
            rank,
            stream: &mut self.streams[rank],
            buf,
            filled: 0,
            eof: false,
        })
    }
}

/// Outstanding receive into a caller-owned slice.
pub struct PendingRecv<'a> {
    rank: Rank,
    stream: &'a mut TcpStream,
    buf: &'a mut [u8],
    /// Bytes received so far
    filled: usize,
    /// Sender closed the connection
    eof: bool,
}

impl PendingRecv<'_> {
    fn is_done(&self) -> bool {
        self.eof || self.filled == self.buf.len()
    }

    /// Read until the slice is full, the sender is gone or the socket would
    /// block.
    fn fill(&mut self) -> io::Result<()> {
        while !self.is_done() {
            let filled = self.filled;
            match self.stream.read(&mut self.buf[filled..]) {
                Ok(0) => self.eof = true,
                Ok(n) => self.filled += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => (),
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}

impl PendingRead for PendingRecv<'_> {
    fn progress(&mut self) -> Result<RequestStatus> {
        if self.is_done() {
            return Ok(RequestStatus::Complete);
        }
        let rank = self.rank;
        self.stream
            .set_nonblocking(true)
            .map_err(|source| Error::Transfer { rank, source })?;
        let result = self.fill();
        self.stream
            .set_nonblocking(false)
            .map_err(|source| Error::Transfer { rank, source })?;
        match result {
            Ok(()) => Ok(RequestStatus::Complete),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(RequestStatus::InProgress),
            Err(source) => Err(Error::Transfer { rank, source }),
        }
    }

    fn wait(mut self) -> Result<usize> {
        let rank = self.rank;
        self.fill().map_err(|source| Error::Transfer { rank, source })?;
        trace!("received {} bytes from rank {}", self.filled, rank);
        Ok(self.filled)
    }
}

/// Transfer channel in write mode, one connection per rank.
pub struct PortalWriter {
    streams: Vec<TcpStream>,
    target: Option<Rank>,
}

impl PortalWriter {
    pub(crate) fn new(streams: Vec<TcpStream>) -> PortalWriter {
        PortalWriter {
            streams,
            target: None,
        }
    }
}

impl TransferWriter for PortalWriter {
    fn set_rank(&mut self, rank: Rank) -> Result<()> {
        self.target = Some(checked_rank(rank, self.streams.len())?);
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let rank = self.target.ok_or(Error::NoTargetRank)?;
        self.streams[rank]
            .write_all(buf)
            .map_err(|source| Error::Transfer { rank, source })?;
        Ok(buf.len())
    }
}

/// Blocking read until `buf` is full or the peer is gone; returns the
/// number of bytes received.
pub(crate) fn read_full<R: Read>(stream: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => (),
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}
