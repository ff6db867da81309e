use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::warn;

use strangler_broker::{BrokerGateway, OptionSide, OrderStatus};
use strangler_integration::CancellationToken;
use strangler_state::{Condition, PositionStateMachine};
use strangler_store::DurableStore;
use strangler_types::{ExitReason, Position, PositionStateName};

use crate::error::ReconcileError;
use crate::osi::osi_symbol;
use crate::report::ReconcileReport;

/// How long a position may remain `submitted` before the reconciler treats
/// the broker's silence as worth an explicit order-status lookup, matching
/// the order manager's own poll deadline default.
pub const ORDER_SUBMIT_TIMEOUT: Duration = Duration::from_secs(120);

/// Reconciler: bidirectional convergence between local active
/// positions and the broker's authoritative position list.
pub struct Reconciler<G> {
    gateway: Arc<G>,
}

impl<G> Reconciler<G>
where
    G: BrokerGateway,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    pub async fn reconcile(
        &self,
        store: &DurableStore,
        cancel: &CancellationToken,
    ) -> Result<ReconcileReport, ReconcileError> {
        let broker_positions = self.gateway.get_positions(cancel).await?;
        let locals = store.active_positions().await;

        let mut report = ReconcileReport::default();
        let mut matched_symbols: HashSet<String> = HashSet::new();

        for position in locals {
            let put_symbol = osi_symbol(&position.symbol, position.expiration, OptionSide::Put, position.put_strike);
            let call_symbol =
                osi_symbol(&position.symbol, position.expiration, OptionSide::Call, position.call_strike);

            let has_put = broker_positions
                .iter()
                .any(|b| b.symbol.as_str() == put_symbol && matches_quantity(b.quantity, position.quantity));
            let has_call = broker_positions
                .iter()
                .any(|b| b.symbol.as_str() == call_symbol && matches_quantity(b.quantity, position.quantity));

            if has_put && has_call {
                matched_symbols.insert(put_symbol);
                matched_symbols.insert(call_symbol);
                let refreshed = self.refresh_pnl(&position, cancel).await?;
                store.upsert_active(refreshed).await?;
                report.refreshed.push(position.id);
                continue;
            }

            self.resolve_missing(&position, store, cancel, &mut report).await?;
        }

        for broker_position in &broker_positions {
            if !matched_symbols.contains(broker_position.symbol.as_str()) {
                warn!(symbol = %broker_position.symbol, "unmanaged_position: no matching local record");
                report.unmanaged_broker_symbols.push(broker_position.symbol.to_string());
            }
        }

        Ok(report)
    }

    async fn refresh_pnl(&self, position: &Position, cancel: &CancellationToken) -> Result<Position, ReconcileError> {
        let chain = self
            .gateway
            .get_option_chain(&position.symbol, position.expiration, false, cancel)
            .await?;

        let mut refreshed = position.clone();
        let put = chain.iter().find(|q| q.side == OptionSide::Put && q.strike == position.put_strike);
        let call = chain.iter().find(|q| q.side == OptionSide::Call && q.strike == position.call_strike);
        if let (Some(put), Some(call)) = (put, call) {
            let cost_to_close = put.mid() + call.mid();
            refreshed.current_pnl =
                (refreshed.credit_received - cost_to_close) * Decimal::from(refreshed.quantity) * Decimal::from(100);
        }
        refreshed.dte = (position.expiration - Utc::now().date_naive()).num_days().max(0);
        Ok(refreshed)
    }

    /// Handles a position absent from the broker's list: order-confirmed
    /// exit, orphan recovery, phantom removal, or a genuine external close.
    async fn resolve_missing(
        &self,
        position: &Position,
        store: &DurableStore,
        cancel: &CancellationToken,
        report: &mut ReconcileReport,
    ) -> Result<(), ReconcileError> {
        if let Some(exit_order_id) = &position.exit_order_id {
            let status = self.gateway.get_order_status(exit_order_id, cancel).await?;
            if status.status == OrderStatus::Filled {
                let mut closed = position.clone();
                closed.current_pnl = close_pnl(&closed, status.avg_fill_price);
                closed.exit_date = Some(Utc::now());
                if closed.exit_reason.is_none() {
                    closed.exit_reason = Some(ExitReason::ExternalClose);
                }
                apply_condition(&mut closed, Condition::PositionClosed);
                report.exit_confirmed.push(position.id);
                store.close_position(closed).await?;
                return Ok(());
            }
        }

        if position.state == PositionStateName::Submitted {
            if !order_is_stale(position) {
                // Entry order hasn't had time to fill yet; the broker simply has
                // no matching position, not an external close. Leave it for the
                // next cycle.
                return Ok(());
            }

            if let Some(entry_order_id) = &position.entry_order_id {
                let status = self.gateway.get_order_status(entry_order_id, cancel).await?;
                match status.status {
                    OrderStatus::Filled => {
                        let mut recovered = position.clone();
                        recovered.credit_received =
                            status.avg_fill_price.unwrap_or(recovered.entry_limit_price);
                        apply_condition(&mut recovered, Condition::OrderFilled);
                        store.upsert_active(recovered).await?;
                        report.orphan_recovered.push(position.id);
                    }
                    OrderStatus::Rejected | OrderStatus::Canceled | OrderStatus::Expired => {
                        store.remove_active(position.id).await?;
                        report.phantom_removed.push(position.id);
                    }
                    _ => {}
                }
                return Ok(());
            }
        }

        let mut closed = position.clone();
        closed.exit_date = Some(Utc::now());
        closed.exit_reason = Some(ExitReason::ExternalClose);
        apply_condition(&mut closed, Condition::ForceClose);
        report.externally_closed.push(position.id);
        store.close_position(closed).await?;
        Ok(())
    }
}

fn matches_quantity(broker_quantity: i64, local_quantity: u32) -> bool {
    broker_quantity.unsigned_abs() as u32 == local_quantity
}

fn close_pnl(position: &Position, fill_price: Option<Decimal>) -> Decimal {
    let debit = fill_price.unwrap_or(Decimal::ZERO);
    (position.credit_received - debit) * Decimal::from(position.quantity) * Decimal::from(100)
}

fn order_is_stale(position: &Position) -> bool {
    let elapsed = Utc::now().signed_duration_since(position.entry_date);
    elapsed
        >= chrono::Duration::from_std(ORDER_SUBMIT_TIMEOUT).expect("constant duration fits chrono::Duration")
}

fn apply_condition(position: &mut Position, condition: Condition) {
    let mut machine =
        PositionStateMachine::from_persisted(position.state, position.strike_adjustment_count(), position.time_roll_count());
    if let Ok(next) = machine.transition(condition) {
        position.state = next;
    }
}
