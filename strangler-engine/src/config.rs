//! The closed configuration surface, loaded from a TOML file.
//!
//! Every recognized key is represented; `#[serde(deny_unknown_fields)]`
//! on every level rejects anything else at load, treating config as a
//! closed enumeration. The handful of fields the distilled schema doesn't
//! name but a runnable agent needs (`environment.state_file`,
//! `broker.base_url`) are documented in DESIGN.md as ambient-stack
//! supplements, not strategy features — they widen the schema, they don't
//! loosen it.

use std::path::PathBuf;

use rust_decimal::Decimal;
use serde::Deserialize;
use smol_str::SmolStr;
use strangler_risk::clamp_quantity;
use strangler_strategy::{EntryConfig, ExitConfig, StrategyConfig};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum Mode {
    Paper,
    Live,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct EnvironmentConfig {
    pub mode: Mode,
    /// Where the durable store's single JSON file lives. Not one of
    /// the named keys in enumeration, but every deployment needs a
    /// path — defaulted so existing configs need no change.
    #[serde(default = "EnvironmentConfig::default_state_file")]
    pub state_file: PathBuf,
}

impl EnvironmentConfig {
    fn default_state_file() -> PathBuf {
        PathBuf::from("strangler_state.json")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct BrokerConfig {
    pub api_key: String,
    pub account_id: String,
    #[serde(default)]
    pub use_otoco: bool,
    /// Sandbox vs. live REST root (the two environments are distinguished by
    /// their rate-limit tiers, not by URL alone).
    #[serde(default = "BrokerConfig::default_base_url")]
    pub base_url: String,
}

impl BrokerConfig {
    fn default_base_url() -> String {
        "https://sandbox.tradier.com".to_string()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct StrategyEntryConfig {
    #[serde(default = "EntryConfig::default_min_iv_percent")]
    pub min_iv_percent: i32,
    #[serde(default = "EntryConfig::default_target_dte")]
    pub target_dte: i64,
    pub dte_range: (i64, i64),
    /// Target delta as a percent integer ("delta (percent integer)"),
    /// e.g. `16` for a 0.16 target.
    #[serde(default = "StrategyEntryConfig::default_delta_percent")]
    pub delta: i32,
    #[serde(default = "EntryConfig::default_min_credit")]
    pub min_credit: Decimal,
    #[serde(default = "EntryConfig::default_min_volume")]
    pub min_volume: u64,
    #[serde(default = "EntryConfig::default_min_open_interest")]
    pub min_open_interest: u64,
}

impl StrategyEntryConfig {
    fn default_delta_percent() -> i32 {
        16
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct StrategyExitConfig {
    #[serde(default = "ExitConfig::default_profit_target")]
    pub profit_target: Decimal,
    #[serde(default = "ExitConfig::default_max_dte")]
    pub max_dte: i64,
    #[serde(default = "StrategyExitConfig::default_stop_loss_pct")]
    pub stop_loss_pct: Decimal,
}

impl StrategyExitConfig {
    fn default_stop_loss_pct() -> Decimal {
        ExitConfig::default_stop_loss_multiplier()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct StrategySurfaceConfig {
    pub symbol: SmolStr,
    pub allocation_pct: Decimal,
    #[serde(default = "EntryConfig::default_max_positions")]
    pub max_positions: usize,
    pub entry: StrategyEntryConfig,
    #[serde(default)]
    pub exit: StrategyExitConfig,
}

impl StrategySurfaceConfig {
    /// Maps the external TOML configuration surface onto
    /// [`strangler_strategy::StrategyConfig`]'s internal, symmetric-window
    /// representation: `dte_range = (lo, hi)` becomes a tolerance around
    /// `target_dte` wide enough to cover the configured range on its wider
    /// side (see DESIGN.md).
    pub fn to_strategy_config(&self) -> Result<StrategyConfig, ConfigError> {
        let (lo, hi) = self.entry.dte_range;
        if lo > hi {
            return Err(ConfigError::Validation(format!(
                "strategy.entry.dte_range lower bound {lo} exceeds upper bound {hi}"
            )));
        }
        let target = self.entry.target_dte;
        let tolerance = (target - lo).max(hi - target).max(0);

        Ok(StrategyConfig {
            entry: EntryConfig {
                max_positions: self.max_positions,
                min_iv_percent: self.entry.min_iv_percent,
                target_dte: target,
                dte_tolerance: tolerance,
                delta_target: Decimal::from(self.entry.delta) / Decimal::from(100),
                min_credit: self.entry.min_credit,
                min_volume: self.entry.min_volume,
                min_open_interest: self.entry.min_open_interest,
                allocation_cap: self.allocation_pct,
            },
            exit: ExitConfig {
                profit_target: self.exit.profit_target,
                max_dte: self.exit.max_dte,
                stop_loss_multiplier: self.exit.stop_loss_pct,
            },
        })
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct RiskConfig {
    pub max_daily_loss: Decimal,
    pub max_position_loss: Decimal,
    pub max_contracts: u32,
}

impl RiskConfig {
    pub fn clamp(&self, quantity: u32) -> u32 {
        clamp_quantity(quantity, self.max_contracts)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Seconds between scheduler ticks ("default 15 min, optionally
    /// 1 min").
    #[serde(default = "ScheduleConfig::default_market_check_interval")]
    pub market_check_interval: u64,
    pub market_open: String,
    pub market_close: String,
    pub trading_start: String,
    pub trading_end: String,
    #[serde(default)]
    pub after_hours_check: bool,
}

impl ScheduleConfig {
    fn default_market_check_interval() -> u64 {
        15 * 60
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct Config {
    pub environment: EnvironmentConfig,
    pub broker: BrokerConfig,
    pub strategy: StrategySurfaceConfig,
    pub risk: RiskConfig,
    pub schedule: ScheduleConfig,
}

impl Config {
    /// Loads and validates a config file, rejecting unknown keys at any
    /// level.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        config.strategy.to_strategy_config()?;
        Ok(config)
    }
}
