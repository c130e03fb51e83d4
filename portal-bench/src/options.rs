//! Run options loaded from an optional YAML file.
use std::fs::File;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use portal_base::{Error, Result};
use serde::Deserialize;

/// File name of the worker binary, looked up next to the coordinator.
pub const WORKER_BINARY: &str = "portal-worker";

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchOptions {
    /// First field of every result record
    pub platform_tag: String,
    /// Second field of every result record
    pub channel_tag: String,
    /// Address the coordinator listens on for worker connections
    pub address: SocketAddr,
    /// Worker executable; defaults to `portal-worker` in the directory of
    /// the running executable
    pub worker_binary: Option<PathBuf>,
}

impl Default for BenchOptions {
    fn default() -> BenchOptions {
        BenchOptions {
            platform_tag: std::env::consts::OS.to_string(),
            channel_tag: "portal".to_string(),
            address: SocketAddr::from(([127, 0, 0, 1], 0)),
            worker_binary: None,
        }
    }
}

impl BenchOptions {
    pub fn from_path(path: &Path) -> anyhow::Result<BenchOptions> {
        let file = File::open(path)
            .with_context(|| format!("failed to open options file {}", path.display()))?;
        serde_yaml::from_reader(file)
            .with_context(|| format!("failed to parse options file {}", path.display()))
    }

    /// Path of the executable to spawn for each worker.
    pub fn worker_binary(&self) -> Result<PathBuf> {
        match &self.worker_binary {
            Some(path) => Ok(path.clone()),
            None => {
                let exe = std::env::current_exe().map_err(Error::Setup)?;
                Ok(exe.with_file_name(WORKER_BINARY))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let options: BenchOptions = serde_yaml::from_str("{}").unwrap();
        assert_eq!(options.platform_tag, std::env::consts::OS);
        assert_eq!(options.channel_tag, "portal");
        assert_eq!(options.address, SocketAddr::from(([127, 0, 0, 1], 0)));
        let worker = options.worker_binary().unwrap();
        assert_eq!(worker.file_name().unwrap(), WORKER_BINARY);
    }

    #[test]
    fn test_parse() {
        let options: BenchOptions = serde_yaml::from_str(
            "platform_tag: nodeos\n\
             address: 0.0.0.0:7000\n\
             worker_binary: /opt/bench/portal-worker\n",
        )
        .unwrap();
        assert_eq!(options.platform_tag, "nodeos");
        assert_eq!(options.channel_tag, "portal");
        assert_eq!(options.address.port(), 7000);
        assert_eq!(
            options.worker_binary().unwrap(),
            PathBuf::from("/opt/bench/portal-worker")
        );
    }

    #[test]
    fn test_unknown_key() {
        assert!(serde_yaml::from_str::<BenchOptions>("iterations: 3\n").is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(BenchOptions::from_path(Path::new("/nonexistent/options.yaml")).is_err());
    }
}
