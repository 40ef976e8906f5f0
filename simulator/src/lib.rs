use liftoff_execution::crash::{RoundConfig, SeedSource};
use liftoff_types::crash::{Token, TokenError, ValidationError, VolatilityLevel, DEFAULT_VOLATILITY};
use serde::{Deserialize, Serialize};
use std::{str::FromStr, time::Duration};
use thiserror::Error;
use tracing::Level;

pub mod reporter;
pub mod scheduler;


/// Configuration for a local [scheduler::Actor].
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    pub log_level: String,
    #[serde(default)]
    pub json_logs: bool,

    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    #[serde(default = "default_mailbox_size")]
    pub mailbox_size: usize,

    #[serde(default = "default_volatility")]
    pub volatility: f64,
    #[serde(default = "default_true")]
    pub regenerate_seed_on_start: bool,
    #[serde(default = "default_true")]
    pub wait_for_crash: bool,
    #[serde(default)]
    pub init_data: String,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
    #[error("{field} must be > 0 (got {value})")]
    InvalidNonZero { field: &'static str, value: u64 },
    #[error("volatility must be within [0, 1] (got {value})")]
    InvalidVolatility { value: f64 },
    #[error("invalid token: {0}")]
    InvalidToken(#[from] TokenError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub struct ValidatedConfig {
    pub log_level: Level,
    pub json_logs: bool,

    pub frame_interval: Duration,
    pub mailbox_size: usize,

    pub round: RoundConfig,
    pub source: SeedSource,
}

fn default_frame_interval_ms() -> u64 {
    16
}

fn default_mailbox_size() -> usize {
    64
}

fn default_volatility() -> f64 {
    DEFAULT_VOLATILITY
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            frame_interval_ms: default_frame_interval_ms(),
            mailbox_size: default_mailbox_size(),
            volatility: default_volatility(),
            regenerate_seed_on_start: true,
            wait_for_crash: true,
            init_data: String::new(),
            token: None,
        }
    }
}

impl Config {
    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        if self.frame_interval_ms == 0 {
            return Err(ConfigError::InvalidNonZero {
                field: "frame_interval_ms",
                value: self.frame_interval_ms,
            });
        }
        if self.mailbox_size == 0 {
            return Err(ConfigError::InvalidNonZero {
                field: "mailbox_size",
                value: self.mailbox_size as u64,
            });
        }
        if !(0.0..=1.0).contains(&self.volatility) {
            return Err(ConfigError::InvalidVolatility {
                value: self.volatility,
            });
        }

        let log_level =
            Level::from_str(&self.log_level).map_err(|_| ConfigError::InvalidLogLevel {
                value: self.log_level.clone(),
            })?;

        // A token pins seed and volatility for every round
        let source = match &self.token {
            Some(raw) => SeedSource::Token(Token::parse(raw)?),
            None => {
                VolatilityLevel::from_fraction(self.volatility)?;
                SeedSource::Local {
                    volatility: self.volatility,
                }
            }
        };

        Ok(ValidatedConfig {
            log_level,
            json_logs: self.json_logs,
            frame_interval: Duration::from_millis(self.frame_interval_ms),
            mailbox_size: self.mailbox_size,
            round: RoundConfig {
                regenerate_seed_on_start: self.regenerate_seed_on_start,
                wait_for_crash: self.wait_for_crash,
                init_data: self.init_data,
            },
            source,
        })
    }
}

impl ValidatedConfig {
    pub fn scheduler(&self) -> scheduler::Config {
        scheduler::Config {
            round: self.round.clone(),
            source: self.source.clone(),
            frame_interval: self.frame_interval,
            mailbox_size: self.mailbox_size,
        }
    }
}
