//! Portal benchmark base data structures and traits.
use std::fmt;
use std::io;

mod config;
pub use config::{
    check_iterations, check_transfer_size, Pattern, RunConfig, MAX_BUFFER, MAX_WORKERS,
};
mod mask;
pub use mask::{MatchState, RendezvousMask};
mod channel;
pub use channel::{
    PendingRead, RendezvousConsumer, RendezvousProducer, RequestStatus, TransferReader,
    TransferWriter,
};
mod timer;
pub use timer::{Clock, MonotonicClock, StepClock, Timer, TimingSample};

/// Worker rank, in `0..worker_count`.
pub type Rank = usize;

#[derive(Debug)]
pub enum Error {
    /// Worker count outside of `1..=MAX_WORKERS`
    InvalidWorkerCount(usize),

    /// Iteration count must be positive
    InvalidIterationCount(usize),

    /// Transfer size must be positive, even and at most `MAX_BUFFER`
    InvalidTransferSize(usize),

    /// Unrecognized pattern name
    UnknownPattern(String),

    /// Rank outside of the worker fleet
    InvalidRank(Rank),

    /// Channel operation issued before a destination rank was selected
    NoTargetRank,

    /// Opening or configuring a channel failed
    Setup(io::Error),

    /// Connection handshake with a worker failed
    Handshake(String),

    /// Rendezvous read or write failed
    Rendezvous { rank: Rank, source: io::Error },

    /// Rendezvous value does not carry the bit of the rank it came from
    UnexpectedMask { rank: Rank, mask: RendezvousMask },

    /// Transfer read, write or wait failed
    Transfer { rank: Rank, source: io::Error },

    /// Fewer bytes received than requested (no partial receives allowed)
    ShortRead {
        rank: Rank,
        expected: usize,
        received: usize,
    },

    /// Fewer bytes sent than requested
    ShortWrite {
        rank: Rank,
        expected: usize,
        written: usize,
    },

    /// Launching a worker process failed
    Spawn { rank: Rank, source: io::Error },

    /// Waiting for a worker process failed
    Join { rank: Rank, source: io::Error },

    /// Worker process terminated abnormally or too early
    WorkerFailed { rank: Rank, status: String },

    /// Emitting a result record failed
    Report(io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidWorkerCount(count) => write!(
                f,
                "invalid worker count {} (expected 1..={})",
                count, MAX_WORKERS
            ),
            Error::InvalidIterationCount(count) => {
                write!(f, "invalid iteration count {} (expected > 0)", count)
            }
            Error::InvalidTransferSize(size) => write!(
                f,
                "invalid transfer size {} (expected an even value in 2..={})",
                size, MAX_BUFFER
            ),
            Error::UnknownPattern(name) => {
                write!(f, "unknown pattern {:?} (expected gather or broadcast)", name)
            }
            Error::InvalidRank(rank) => write!(f, "rank {} is not part of the fleet", rank),
            Error::NoTargetRank => write!(f, "no destination rank selected"),
            Error::Setup(err) => write!(f, "channel setup failed: {}", err),
            Error::Handshake(msg) => write!(f, "worker handshake failed: {}", msg),
            Error::Rendezvous { rank, source } => {
                write!(f, "rendezvous with rank {} failed: {}", rank, source)
            }
            Error::UnexpectedMask { rank, mask } => {
                write!(f, "rank {} sent rendezvous mask {:?}", rank, mask)
            }
            Error::Transfer { rank, source } => {
                write!(f, "transfer with rank {} failed: {}", rank, source)
            }
            Error::ShortRead {
                rank,
                expected,
                received,
            } => write!(
                f,
                "short read from rank {}: {} of {} bytes",
                rank, received, expected
            ),
            Error::ShortWrite {
                rank,
                expected,
                written,
            } => write!(
                f,
                "short write to rank {}: {} of {} bytes",
                rank, written, expected
            ),
            Error::Spawn { rank, source } => {
                write!(f, "failed to spawn worker {}: {}", rank, source)
            }
            Error::Join { rank, source } => {
                write!(f, "failed to wait for worker {}: {}", rank, source)
            }
            Error::WorkerFailed { rank, status } => {
                write!(f, "worker {} terminated abnormally ({})", rank, status)
            }
            Error::Report(err) => write!(f, "failed to emit result record: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Setup(err) | Error::Report(err) => Some(err),
            Error::Rendezvous { source, .. }
            | Error::Transfer { source, .. }
            | Error::Spawn { source, .. }
            | Error::Join { source, .. } => Some(source),
            _ => None,
        }
    }
}
