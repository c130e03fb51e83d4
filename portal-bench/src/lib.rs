//! Gather and broadcast latency benchmarks between a coordinator and a
//! fleet of worker processes.
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use portal_base::{Pattern, Rank};

mod context;
pub use context::{RunContext, SharedBuffer};
mod gather;
pub use gather::gather;
mod broadcast;
pub use broadcast::broadcast;
mod record;
pub use record::RecordFormat;
mod options;
pub use options::{BenchOptions, WORKER_BINARY};
mod driver;
pub use driver::run;
mod worker;
pub use worker::{run_worker, WorkerConfig};
#[cfg(test)]
mod fake;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Number of workers to spawn (1 to 16)
    pub workers: usize,
    /// Number of timed iterations
    pub iterations: usize,
    /// Bytes moved per worker and iteration (even, at most 1 MiB)
    pub transfer_size: usize,
    /// Collective pattern (gather or broadcast)
    pub pattern: Pattern,
    /// YAML file with run options
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Parser)]
#[command(author, version, about = "Worker side of the portal benchmark", long_about = None)]
pub struct WorkerArgs {
    /// Number of timed iterations
    pub iterations: usize,
    /// Bytes moved per iteration
    pub transfer_size: usize,
    /// Collective pattern (gather or broadcast)
    pub pattern: Pattern,
    /// Rank of this worker
    #[arg(long)]
    pub rank: Rank,
    /// Address of the coordinator
    #[arg(long)]
    pub address: SocketAddr,
}
