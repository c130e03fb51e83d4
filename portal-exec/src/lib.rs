//! Worker process launcher.
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus};

use log::{error, info, warn};
use portal_base::{Error, Rank, Result, RunConfig};

/// Worker binary and the arguments placed before the run parameters.
#[derive(Clone, Debug)]
pub struct LaunchSpec {
    program: PathBuf,
    args: Vec<OsString>,
}

impl LaunchSpec {
    pub fn new<P: Into<PathBuf>>(program: P) -> LaunchSpec {
        LaunchSpec {
            program: program.into(),
            args: vec![],
        }
    }

    pub fn arg<S: Into<OsString>>(mut self, arg: S) -> LaunchSpec {
        self.args.push(arg.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// `<program> <args..> <iterations> <transfer_size> <pattern> --rank <rank>`
    fn command(&self, config: &RunConfig, rank: Rank) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(config.iterations().to_string())
            .arg(config.transfer_size().to_string())
            .arg(config.pattern().as_str())
            .arg("--rank")
            .arg(rank.to_string());
        cmd
    }
}

/// Running worker process.
pub struct WorkerHandle {
    rank: Rank,
    child: Child,
}

impl WorkerHandle {
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// OS process ID.
    pub fn id(&self) -> u32 {
        self.child.id()
    }
}

/// The worker fleet of one run. Workers that were not joined are killed
/// when the pool is dropped.
pub struct WorkerPool {
    handles: Vec<WorkerHandle>,
}

impl WorkerPool {
    /// Start one worker per rank. Nothing is left running on failure.
    pub fn spawn(spec: &LaunchSpec, config: &RunConfig) -> Result<WorkerPool> {
        let mut pool = WorkerPool {
            handles: Vec::with_capacity(config.worker_count()),
        };
        for rank in config.ranks() {
            info!("starting worker {}", rank);
            let child = spec
                .command(config, rank)
                .spawn()
                .map_err(|source| Error::Spawn { rank, source })?;
            pool.handles.push(WorkerHandle { rank, child });
        }
        Ok(pool)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn handles(&self) -> &[WorkerHandle] {
        &self.handles
    }

    /// Fail if any worker has already terminated, whatever its status.
    pub fn poll(&mut self) -> Result<()> {
        for handle in &mut self.handles {
            let rank = handle.rank;
            let status = handle
                .child
                .try_wait()
                .map_err(|source| Error::Join { rank, source })?;
            if let Some(status) = status {
                return Err(Error::WorkerFailed {
                    rank,
                    status: describe(status),
                });
            }
        }
        Ok(())
    }

    /// Wait for every worker and report the first abnormal termination.
    pub fn join(mut self) -> Result<()> {
        let mut failure = None;
        for mut handle in self.handles.drain(..) {
            let rank = handle.rank;
            let result = match handle.child.wait() {
                Ok(status) if status.success() => {
                    info!("worker {} completed", rank);
                    Ok(())
                }
                Ok(status) => {
                    error!("worker {} terminated with {}", rank, status);
                    Err(Error::WorkerFailed {
                        rank,
                        status: describe(status),
                    })
                }
                Err(source) => Err(Error::Join { rank, source }),
            };
            if let Err(err) = result {
                failure.get_or_insert(err);
            }
        }
        failure.map_or(Ok(()), Err)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        for handle in &mut self.handles {
            if let Ok(None) = handle.child.try_wait() {
                warn!("killing worker {}", handle.rank);
                let _ = handle.child.kill();
            }
            let _ = handle.child.wait();
        }
    }
}

fn describe(status: ExitStatus) -> String {
    if let Some(code) = status.code() {
        return format!("exit code {}", code);
    }
    #[cfg(unix)]
    {
        use nix::sys::signal::Signal;
        use std::os::unix::process::ExitStatusExt;

        if let Some(sig) = status.signal() {
            return match Signal::try_from(sig) {
                Ok(signal) => format!("killed by {}", signal.as_str()),
                Err(_) => format!("killed by signal {}", sig),
            };
        }
    }
    status.to_string()
}
