//! Producer configuration.
//!
//! Values come from three layers, highest first: command-line flags, an
//! optional TOML file (`--config`), and built-in defaults. The Docker
//! engine address additionally falls back to `DOCKER_HOST`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Args;
use serde::Deserialize;

use spate_api::DEFAULT_STATS_INTERVAL;
use spate_store::ProductionSettings;
use spate_store::producer::DEFAULT_PRODUCE_INTERVAL;
use spate_store::store::DEFAULT_INITIAL_STORE;
use spate_telemetry::docker::{DEFAULT_DOCKER_HOST, DEFAULT_REQUEST_TIMEOUT};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_SERVICE: &str = "consumer";

/// Flags of `producer serve`. Unset flags fall through to the file.
#[derive(Debug, Default, Args)]
pub struct ServeArgs {
    /// TOML configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Port to listen on [default: 5000].
    #[arg(long)]
    pub port: Option<u16>,

    /// Name of the watched worker service [default: consumer].
    #[arg(long)]
    pub service: Option<String>,

    /// Docker engine address (unix:///path or tcp://host:port).
    #[arg(long, env = "DOCKER_HOST")]
    pub docker_host: Option<String>,

    /// Units in the store at startup [default: 40].
    #[arg(long)]
    pub initial_store: Option<u64>,

    /// Fixed units added per production tick [default: 5].
    #[arg(long)]
    pub amount: Option<u32>,

    /// Upper bound of random units added per tick [default: 1].
    #[arg(long)]
    pub variation: Option<u32>,

    /// Production period, e.g. "1s" or "500ms" [default: 1s].
    #[arg(long)]
    pub produce_interval: Option<String>,

    /// Stats stream period [default: 2s].
    #[arg(long)]
    pub stats_interval: Option<String>,

    /// Give up a waiting consume request after this long [default: never].
    #[arg(long)]
    pub consume_timeout: Option<String>,

    /// Timeout of each Docker API request [default: 5s].
    #[arg(long)]
    pub request_timeout: Option<String>,

    /// Seed for reproducible production and consumption draws.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub log_json: bool,
}

/// Contents of the optional TOML file.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub port: Option<u16>,
    pub service: Option<String>,
    pub docker_host: Option<String>,
    pub initial_store: Option<u64>,
    pub amount: Option<u32>,
    pub variation: Option<u32>,
    pub produce_interval: Option<String>,
    pub stats_interval: Option<String>,
    pub consume_timeout: Option<String>,
    pub request_timeout: Option<String>,
    pub seed: Option<u64>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let config: FileConfig = toml::from_str(&content)
            .with_context(|| format!("parse config file {}", path.display()))?;
        Ok(config)
    }
}

/// Fully resolved settings the daemon runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub port: u16,
    pub service: String,
    pub docker_host: String,
    pub initial_store: u64,
    pub production: ProductionSettings,
    pub produce_interval: Duration,
    pub stats_interval: Duration,
    pub consume_timeout: Option<Duration>,
    pub request_timeout: Duration,
    pub seed: Option<u64>,
}

impl Settings {
    /// Read the file named by `--config` (if any) and merge it under the flags.
    pub fn load(args: &ServeArgs) -> anyhow::Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(args, file)
    }

    /// Merge flags over file values over defaults.
    pub fn resolve(args: &ServeArgs, file: FileConfig) -> anyhow::Result<Self> {
        let defaults = ProductionSettings::default();

        let service = args
            .service
            .clone()
            .or(file.service)
            .unwrap_or_else(|| DEFAULT_SERVICE.to_string());
        if service.trim().is_empty() {
            bail!("service name must not be empty");
        }

        let produce_interval = duration_setting(
            "produce_interval",
            args.produce_interval.as_deref().or(file.produce_interval.as_deref()),
        )?
        .unwrap_or(DEFAULT_PRODUCE_INTERVAL);
        let stats_interval = duration_setting(
            "stats_interval",
            args.stats_interval.as_deref().or(file.stats_interval.as_deref()),
        )?
        .unwrap_or(DEFAULT_STATS_INTERVAL);
        let consume_timeout = duration_setting(
            "consume_timeout",
            args.consume_timeout.as_deref().or(file.consume_timeout.as_deref()),
        )?;
        let request_timeout = duration_setting(
            "request_timeout",
            args.request_timeout.as_deref().or(file.request_timeout.as_deref()),
        )?
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        // Zero periods would spin the timer loops.
        for (name, value) in [
            ("produce_interval", produce_interval),
            ("stats_interval", stats_interval),
            ("request_timeout", request_timeout),
        ] {
            if value.is_zero() {
                bail!("{name} must be greater than zero");
            }
        }

        Ok(Self {
            port: args.port.or(file.port).unwrap_or(DEFAULT_PORT),
            service,
            docker_host: args
                .docker_host
                .clone()
                .or(file.docker_host)
                .unwrap_or_else(|| DEFAULT_DOCKER_HOST.to_string()),
            initial_store: args
                .initial_store
                .or(file.initial_store)
                .unwrap_or(DEFAULT_INITIAL_STORE),
            production: ProductionSettings {
                amount: args.amount.or(file.amount).unwrap_or(defaults.amount),
                variation: args.variation.or(file.variation).unwrap_or(defaults.variation),
            },
            produce_interval,
            stats_interval,
            consume_timeout,
            request_timeout,
            seed: args.seed.or(file.seed),
        })
    }
}

fn duration_setting(name: &str, raw: Option<&str>) -> anyhow::Result<Option<Duration>> {
    match raw {
        None => Ok(None),
        Some(s) => match parse_duration(s) {
            Some(d) => Ok(Some(d)),
            None => bail!("invalid duration for {name}: {s:?}"),
        },
    }
}

/// Parse a duration string like "5s", "500ms", "1m".
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
