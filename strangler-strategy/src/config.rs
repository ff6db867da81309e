use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Tunable entry-signal thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct EntryConfig {
    #[serde(default = "EntryConfig::default_max_positions")]
    pub max_positions: usize,
    #[serde(default = "EntryConfig::default_min_iv_percent")]
    pub min_iv_percent: i32,
    #[serde(default = "EntryConfig::default_target_dte")]
    pub target_dte: i64,
    #[serde(default = "EntryConfig::default_dte_tolerance")]
    pub dte_tolerance: i64,
    #[serde(default = "EntryConfig::default_delta_target")]
    pub delta_target: Decimal,
    #[serde(default = "EntryConfig::default_min_credit")]
    pub min_credit: Decimal,
    #[serde(default = "EntryConfig::default_min_volume")]
    pub min_volume: u64,
    #[serde(default = "EntryConfig::default_min_open_interest")]
    pub min_open_interest: u64,
    #[serde(default = "EntryConfig::default_allocation_cap")]
    pub allocation_cap: Decimal,
}

impl EntryConfig {
    pub fn default_max_positions() -> usize {
        5
    }
    pub fn default_min_iv_percent() -> i32 {
        30
    }
    pub fn default_target_dte() -> i64 {
        45
    }
    fn default_dte_tolerance() -> i64 {
        5
    }
    fn default_delta_target() -> Decimal {
        dec!(0.16)
    }
    pub fn default_min_credit() -> Decimal {
        dec!(0.50)
    }
    pub fn default_min_volume() -> u64 {
        0
    }
    pub fn default_min_open_interest() -> u64 {
        0
    }
    fn default_allocation_cap() -> Decimal {
        dec!(0.10)
    }
}

impl Default for EntryConfig {
    fn default() -> Self {
        EntryConfig {
            max_positions: Self::default_max_positions(),
            min_iv_percent: Self::default_min_iv_percent(),
            target_dte: Self::default_target_dte(),
            dte_tolerance: Self::default_dte_tolerance(),
            delta_target: Self::default_delta_target(),
            min_credit: Self::default_min_credit(),
            min_volume: Self::default_min_volume(),
            min_open_interest: Self::default_min_open_interest(),
            allocation_cap: Self::default_allocation_cap(),
        }
    }
}

/// Tunable exit-signal thresholds. The emergency-exit multiplier
/// (`-2.0`) is not configurable and is not represented here.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct ExitConfig {
    #[serde(default = "ExitConfig::default_profit_target")]
    pub profit_target: Decimal,
    #[serde(default = "ExitConfig::default_max_dte")]
    pub max_dte: i64,
    #[serde(default = "ExitConfig::default_stop_loss_multiplier")]
    pub stop_loss_multiplier: Decimal,
}

impl ExitConfig {
    pub fn default_profit_target() -> Decimal {
        dec!(0.50)
    }
    pub fn default_max_dte() -> i64 {
        21
    }
    pub fn default_stop_loss_multiplier() -> Decimal {
        dec!(2.5)
    }
}

impl Default for ExitConfig {
    fn default() -> Self {
        ExitConfig {
            profit_target: Self::default_profit_target(),
            max_dte: Self::default_max_dte(),
            stop_loss_multiplier: Self::default_stop_loss_multiplier(),
        }
    }
}

/// The hardcoded emergency-exit multiplier: "regardless of
/// config". Kept as a named constant rather than folded into `ExitConfig` so
/// it cannot accidentally be made configurable by a future refactor.
pub const EMERGENCY_EXIT_MULTIPLIER: Decimal = dec!(2.0);

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct StrategyConfig {
    #[serde(default)]
    pub entry: EntryConfig,
    #[serde(default)]
    pub exit: ExitConfig,
}
