use anyhow::Context;
use clap::Parser;
use portal_bench::{run_worker, WorkerArgs, WorkerConfig};
use portal_tcp::WorkerLink;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = WorkerArgs::parse();

    let config = WorkerConfig::new(args.rank, args.iterations, args.transfer_size, args.pattern)?;
    let mut link = WorkerLink::connect(args.address, args.rank)
        .with_context(|| format!("rank {} failed to reach {}", args.rank, args.address))?;
    run_worker(&mut link, &config).with_context(|| format!("rank {} failed", args.rank))?;
    Ok(())
}
