//! Reg-T margin math and allocation-cap enforcement.
//!
//! Pure `Decimal` arithmetic with no I/O, in the style of
//! `jackbot-risk::exposure`/`jackbot-risk::drawdown` (free functions and thin
//! trackers over a shared numeric type, no broker or store coupling).

pub mod allocation;
pub mod limits;
pub mod margin;

pub use allocation::{sum_allocated_capital, within_allocation_cap};
pub use limits::{clamp_quantity, exceeds_daily_loss_limit, exceeds_position_loss_limit};
pub use margin::{margin_ceiling, otm_distance_call, otm_distance_put, reg_t_margin};
