use boxoffice_shared::StrategyKind;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    #[serde(default)]
    pub reservation: ReservationConfig,
    #[serde(default)]
    pub reclaimer: ReclaimerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReservationConfig {
    #[serde(default = "default_hold_seconds")]
    pub hold_seconds: u64,
    #[serde(default)]
    pub default_strategy: StrategyKind,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            hold_seconds: default_hold_seconds(),
            default_strategy: StrategyKind::default(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReclaimerConfig {
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
}

impl Default for ReclaimerConfig {
    fn default() -> Self {
        Self { interval_seconds: default_interval_seconds() }
    }
}

fn default_max_connections() -> u32 { 5 }
fn default_hold_seconds() -> u64 { 60 }
fn default_retry_attempts() -> u32 { 3 }
fn default_retry_delay_ms() -> u64 { 100 }
fn default_interval_seconds() -> u64 { 60 }

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local, uncommitted overrides
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `BOXOFFICE__RESERVATION__HOLD_SECONDS=30`
            .add_source(config::Environment::with_prefix("BOXOFFICE").separator("__"))
            .build()?;

        Self::from_source(s)
    }

    fn from_source(source: config::Config) -> Result<Self, config::ConfigError> {
        let config: Config = source.try_deserialize()?;
        config.reservation.validate()?;
        Ok(config)
    }
}

impl ReservationConfig {
    /// Lease stores reject a zero TTL, so a hold must last at least a second
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.hold_seconds == 0 {
            return Err(config::ConfigError::Message(
                "reservation.hold_seconds must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
