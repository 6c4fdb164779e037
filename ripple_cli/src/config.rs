//! Operational-parameter configuration (`spec.md` §6: `N`, `failureProb`,
//! `overloadProb`, `gossipInterval`), mergeable from an optional TOML file
//! with CLI flags taking precedence field-by-field, falling back to the
//! spec's defaults for anything neither supplies.

use ripple_replication::Config as EngineConfig;
use serde::Deserialize;
use snafu::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("failed to read config file {path:?}: {source}"))]
    Read { path: PathBuf, source: std::io::Error },

    #[snafu(display("failed to parse config file {path:?}: {source}"))]
    Parse { path: PathBuf, source: toml::de::Error },
}

#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub n: Option<usize>,
    pub failure_prob: Option<f64>,
    pub overload_prob: Option<f64>,
    pub gossip_interval_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).context(ReadSnafu { path: path.to_path_buf() })?;
        toml::from_str(&text).context(ParseSnafu { path: path.to_path_buf() })
    }
}

/// CLI-supplied overrides: `None` means "not given on the command line", as
/// opposed to the file or the built-in default.
#[derive(Debug, Default)]
pub struct Overrides {
    pub n: Option<usize>,
    pub failure_prob: Option<f64>,
    pub overload_prob: Option<f64>,
    pub gossip_interval_secs: Option<u64>,
}

pub fn resolve(file: Option<FileConfig>, overrides: Overrides) -> EngineConfig {
    let defaults = EngineConfig::default();
    let file = file.unwrap_or_default();
    EngineConfig {
        n: overrides.n.or(file.n).unwrap_or(defaults.n),
        failure_prob: overrides.failure_prob.or(file.failure_prob).unwrap_or(defaults.failure_prob),
        overload_prob: overrides.overload_prob.or(file.overload_prob).unwrap_or(defaults.overload_prob),
        gossip_interval: overrides
            .gossip_interval_secs
            .or(file.gossip_interval_secs)
            .map(Duration::from_secs)
            .unwrap_or(defaults.gossip_interval),
    }
}
