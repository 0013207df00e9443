//! Configuration types

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{CoreError, CoreResult, Instrument};

const SYMBOL_PLACEHOLDER: &str = "{symbol}";

/// Upstream stream configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Endpoint template, `{symbol}` is replaced with the lower-case identifier
    pub url_template: String,
    pub connect_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub channel_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url_template: "wss://stream.binance.com:9443/ws/{symbol}@ticker".to_string(),
            connect_attempts: 5,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
            channel_capacity: 1024,
        }
    }
}

impl StreamConfig {
    pub fn endpoint_for(&self, instrument: Instrument) -> String {
        self.url_template.replace(SYMBOL_PLACEHOLDER, instrument.symbol())
    }

    /// Delay before connection attempt `attempt + 1`, doubling from the base
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32);
        let delay_ms = self
            .base_delay_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

/// Console output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub clear_screen: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { clear_screen: true }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub json: bool,
}

/// Complete board configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub stream: StreamConfig,
    pub render: RenderConfig,
    pub log: LogConfig,
    /// Terminate the process when any instrument cannot connect
    pub fail_fast: bool,
}

impl BoardConfig {
    /// Load from optional `tickerboard.toml`, then `TICKERBOARD__*` env vars
    pub fn load() -> CoreResult<Self> {
        let config: BoardConfig = Config::builder()
            .add_source(File::with_name("tickerboard").required(false))
            .add_source(
                Environment::with_prefix("TICKERBOARD")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CoreResult<()> {
        let stream = &self.stream;

        if !stream.url_template.contains(SYMBOL_PLACEHOLDER) {
            return Err(CoreError::InvalidConfig(format!(
                "stream.url_template must contain {}",
                SYMBOL_PLACEHOLDER
            )));
        }
        if stream.connect_attempts == 0 {
            return Err(CoreError::InvalidConfig(
                "stream.connect_attempts must be at least 1".to_string(),
            ));
        }
        if stream.channel_capacity == 0 {
            return Err(CoreError::InvalidConfig(
                "stream.channel_capacity must be greater than 0".to_string(),
            ));
        }
        if stream.base_delay_ms > stream.max_delay_ms {
            return Err(CoreError::InvalidConfig(format!(
                "stream.base_delay_ms ({}) exceeds stream.max_delay_ms ({})",
                stream.base_delay_ms, stream.max_delay_ms
            )));
        }

        Ok(())
    }
}
