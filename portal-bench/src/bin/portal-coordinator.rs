use std::io;

use anyhow::Context;
use clap::Parser;
use log::info;
use portal_base::RunConfig;
use portal_bench::{run, Args, BenchOptions};

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = RunConfig::new(args.workers, args.iterations, args.transfer_size, args.pattern)
        .context("invalid benchmark parameters")?;
    let options = match &args.config {
        Some(path) => BenchOptions::from_path(path)?,
        None => BenchOptions::default(),
    };
    info!("running {:?} with {:?}", config, options);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(config, &options, &mut out).context("benchmark failed")?;
    Ok(())
}
