//! Rendezvous and transfer channel traits implemented by the backends.
use crate::{Rank, RendezvousMask, Result};

/// Status for an asynchronous transfer request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestStatus {
    /// Request still in progress
    InProgress,
    /// Request is now complete
    Complete,
}

/// Coordinator side of the rendezvous channel used to wake workers.
pub trait RendezvousProducer {
    /// Select the rank the next signal is delivered to.
    fn set_rank(&mut self, rank: Rank) -> Result<()>;

    /// Deliver `mask` to the selected rank.
    fn signal(&mut self, mask: RendezvousMask) -> Result<()>;

    /// Wake every rank in an aggregate mask, lowest rank first.
    fn signal_each(&mut self, mask: RendezvousMask) -> Result<()> {
        for rank in mask.ranks() {
            self.set_rank(rank)?;
            self.signal(mask)?;
        }
        Ok(())
    }
}

/// Coordinator side of the rendezvous channel on which workers report.
pub trait RendezvousConsumer {
    /// Block until the match condition is satisfied and return the final
    /// mask value.
    fn wait(&mut self) -> Result<RendezvousMask>;
}

/// Receive request armed by [`TransferReader::read_nb`].
pub trait PendingRead {
    /// Make progress without blocking.
    fn progress(&mut self) -> Result<RequestStatus>;

    /// Block until the request completes and return the number of bytes
    /// received. A count below the requested size means the sender went
    /// away early.
    fn wait(self) -> Result<usize>;
}

/// Transfer channel opened in read mode.
pub trait TransferReader {
    type Pending<'a>: PendingRead
    where
        Self: 'a;

    /// Arm a non-blocking read of `buf.len()` bytes from `rank`.
    fn read_nb<'a>(&'a mut self, rank: Rank, buf: &'a mut [u8]) -> Result<Self::Pending<'a>>;
}

/// Transfer channel opened in write mode.
pub trait TransferWriter {
    /// Select the destination of the following writes.
    fn set_rank(&mut self, rank: Rank) -> Result<()>;

    /// Blocking write to the selected rank; returns the number of bytes sent.
    fn write(&mut self, buf: &[u8]) -> Result<usize>;
}
