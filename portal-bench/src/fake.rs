//! Recording channel doubles for the kernel tests.
use std::cell::RefCell;
use std::rc::Rc;

use portal_base::{
    Error, PendingRead, Rank, RendezvousConsumer, RendezvousMask, RendezvousProducer,
    RequestStatus, Result, TransferReader, TransferWriter,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Event {
    Armed(Rank, usize),
    Signal(Rank, RendezvousMask),
    Received(Rank, usize),
    Ready(RendezvousMask),
    Write(Rank, Vec<u8>),
}

pub(crate) type Log = Rc<RefCell<Vec<Event>>>;

/// Reader whose workers answer with their rank byte; `short` ranks send
/// half a slice.
pub(crate) struct FakeReader {
    pub log: Log,
    pub short: Option<Rank>,
}

pub(crate) struct FakePending<'a> {
    log: Log,
    rank: Rank,
    buf: &'a mut [u8],
    received: usize,
}

impl TransferReader for FakeReader {
    type Pending<'a> = FakePending<'a>;

    fn read_nb<'a>(&'a mut self, rank: Rank, buf: &'a mut [u8]) -> Result<FakePending<'a>> {
        self.log.borrow_mut().push(Event::Armed(rank, buf.len()));
        let received = if self.short == Some(rank) {
            buf.len() / 2
        } else {
            buf.len()
        };
        Ok(FakePending {
            log: Rc::clone(&self.log),
            rank,
            buf,
            received,
        })
    }
}

impl PendingRead for FakePending<'_> {
    fn progress(&mut self) -> Result<RequestStatus> {
        Ok(RequestStatus::Complete)
    }

    fn wait(mut self) -> Result<usize> {
        for byte in &mut self.buf[..self.received] {
            *byte = self.rank as u8;
        }
        self.log
            .borrow_mut()
            .push(Event::Received(self.rank, self.received));
        Ok(self.received)
    }
}

pub(crate) struct FakeProducer {
    pub log: Log,
    pub target: Option<Rank>,
}

impl RendezvousProducer for FakeProducer {
    fn set_rank(&mut self, rank: Rank) -> Result<()> {
        self.target = Some(rank);
        Ok(())
    }

    fn signal(&mut self, mask: RendezvousMask) -> Result<()> {
        let rank = self.target.ok_or(Error::NoTargetRank)?;
        self.log.borrow_mut().push(Event::Signal(rank, mask));
        Ok(())
    }
}

/// Consumer whose workers are always ready.
pub(crate) struct FakeConsumer {
    pub log: Log,
}

impl RendezvousConsumer for FakeConsumer {
    fn wait(&mut self) -> Result<RendezvousMask> {
        self.log.borrow_mut().push(Event::Ready(RendezvousMask::FULL));
        Ok(RendezvousMask::FULL)
    }
}

/// Writer that accepts at most `limit` bytes per write.
pub(crate) struct FakeWriter {
    pub log: Log,
    pub target: Option<Rank>,
    pub limit: usize,
}

impl TransferWriter for FakeWriter {
    fn set_rank(&mut self, rank: Rank) -> Result<()> {
        self.target = Some(rank);
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let rank = self.target.ok_or(Error::NoTargetRank)?;
        let n = buf.len().min(self.limit);
        self.log.borrow_mut().push(Event::Write(rank, buf[..n].to_vec()));
        Ok(n)
    }
}
