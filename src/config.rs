//! Configuration types.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::Duration;

use crate::error::{self, ConfigError};
use crate::pulse::scoring::ScoringWeights;

/// Aggregation policy: what counts as done, how load is scored, and how the
/// filter defaults are seeded.
#[derive(Debug, Clone, PartialEq)]
pub struct PulseConfig {
    /// Statuses excluded from active counts, stored lowercase.
    pub terminal_statuses: BTreeSet<String>,
    /// Score weights.
    pub weights: ScoringWeights,
    /// Score gap between highest and lowest member above which a rebalance is
    /// recommended.
    pub imbalance_threshold: u32,
    /// A task is due soon when its due date is at most this far ahead.
    pub due_soon_window: Duration,
    /// A project is flagged due soon when its due date is at most this many
    /// days away.
    pub project_due_soon_days: i64,
    /// The only space enabled by default when spaces are discovered.
    pub primary_space: Option<String>,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            terminal_statuses: BTreeSet::from(["complete".to_string()]),
            weights: ScoringWeights::default(),
            imbalance_threshold: 40,
            due_soon_window: Duration::days(2),
            project_due_soon_days: 7,
            primary_space: None,
        }
    }
}

impl PulseConfig {
    /// Load overrides from `PULSE_*` variables through a key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let terminal_statuses = match lookup("PULSE_TERMINAL_STATUSES") {
            Some(raw) => {
                let statuses = split_list(&raw)
                    .map(|s| s.to_lowercase())
                    .collect::<BTreeSet<_>>();
                if statuses.is_empty() {
                    return Err(ConfigError::InvalidValue {
                        key: "PULSE_TERMINAL_STATUSES".into(),
                        message: "at least one terminal status is required".into(),
                    });
                }
                statuses
            }
            None => defaults.terminal_statuses,
        };

        let weights = ScoringWeights {
            active: parse_var(&lookup, "PULSE_WEIGHT_ACTIVE")?.unwrap_or(defaults.weights.active),
            urgent: parse_var(&lookup, "PULSE_WEIGHT_URGENT")?.unwrap_or(defaults.weights.urgent),
            overdue: parse_var(&lookup, "PULSE_WEIGHT_OVERDUE")?
                .unwrap_or(defaults.weights.overdue),
        };

        let imbalance_threshold = parse_var(&lookup, "PULSE_IMBALANCE_THRESHOLD")?
            .unwrap_or(defaults.imbalance_threshold);

        let primary_space = lookup("PULSE_PRIMARY_SPACE")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(Self {
            terminal_statuses,
            weights,
            imbalance_threshold,
            primary_space,
            ..defaults
        })
    }

    /// Whether a status label is terminal (case-insensitive).
    pub fn is_terminal(&self, status: &str) -> bool {
        self.terminal_statuses
            .contains(&status.trim().to_lowercase())
    }
}

/// Where the server loads its task feed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceConfig {
    File(PathBuf),
    Http(String),
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub source: SourceConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            source: SourceConfig::File(PathBuf::from("./data/sample_tasks.json")),
        }
    }
}

impl ServerConfig {
    /// `PULSE_SOURCE_URL` wins over `PULSE_FIXTURE_PATH`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let port = parse_var(&lookup, "PULSE_PORT")?.unwrap_or(defaults.port);

        let source = if let Some(url) = lookup("PULSE_SOURCE_URL").filter(|u| !u.trim().is_empty())
        {
            let url = url.trim().to_string();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidValue {
                    key: "PULSE_SOURCE_URL".into(),
                    message: format!("expected an http(s) URL, got '{url}'"),
                });
            }
            SourceConfig::Http(url)
        } else if let Some(path) = lookup("PULSE_FIXTURE_PATH").filter(|p| !p.trim().is_empty()) {
            SourceConfig::File(PathBuf::from(path.trim()))
        } else {
            defaults.source
        };

        Ok(Self { port, source })
    }
}

/// Load both server and aggregation settings from the environment.
pub fn load_from_env() -> error::Result<(ServerConfig, PulseConfig)> {
    load_from_lookup(|key| std::env::var(key).ok())
}

pub fn load_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> error::Result<(ServerConfig, PulseConfig)> {
    let server = ServerConfig::from_lookup(&lookup)?;
    let pulse = PulseConfig::from_lookup(&lookup)?;
    Ok((server, pulse))
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("'{raw}': {e}"),
            }),
    }
}
