use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use smol_str::SmolStr;
use tracing::warn;

use strangler_broker::{BrokerGateway, LegAction, MarketClock, OptionSide, OrderDuration, OrderLeg};
use strangler_integration::CancellationToken;
use strangler_order::{condition_for, OrderManager, PollConfig, PollOutcome};
use strangler_reconcile::Reconciler;
use strangler_risk::{clamp_quantity, exceeds_daily_loss_limit, exceeds_position_loss_limit};
use strangler_state::{Condition, PositionStateMachine};
use strangler_store::DurableStore;
use strangler_strategy::{
    evaluate, AccountSnapshot, EntrySignal, ExitSignal, ExpirationChain, MarketSnapshot, Signal, StrategyConfig,
};
use strangler_types::{ClientOrderId, ExitReason, OrderIntent, Position, PositionId, PositionStateName};

use crate::config::{RiskConfig, ScheduleConfig};
use crate::error::EngineError;
use crate::iv;
use crate::market::{is_market_open, is_within_trading_window, MarketClockView};

/// Outcome of one trading cycle, returned so the scheduler/CLI can log a
/// one-line summary ("daily summary on shutdown").
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub market_open: bool,
    pub reconciled: usize,
    pub exits_submitted: usize,
    pub entry_submitted: bool,
    pub skipped_entry_reason: Option<&'static str>,
}

/// Single trading cycle orchestrator: reconcile, then — only
/// while the market is open — record IV, evaluate exits and entries, and
/// act on whatever the strategy signals.
///
/// Grounded on `barter/src/engine/mod.rs`'s `Engine` for the "one owner
/// drives one serialized pass over shared state per tick" shape, generalized
/// from an event-driven loop to a fixed sequence of reconcile/evaluate/act
/// steps.
pub struct Cycle<G> {
    gateway: Arc<G>,
    store: DurableStore,
    reconciler: Reconciler<G>,
    order_manager: OrderManager<G>,
    symbol: SmolStr,
    strategy: StrategyConfig,
    risk: RiskConfig,
    schedule: ScheduleConfig,
    use_otoco: bool,
}

impl<G> Cycle<G>
where
    G: BrokerGateway,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        gateway: Arc<G>,
        store: DurableStore,
        symbol: SmolStr,
        strategy: StrategyConfig,
        risk: RiskConfig,
        schedule: ScheduleConfig,
        use_otoco: bool,
    ) -> Self {
        Self::with_poll_config(gateway, store, symbol, strategy, risk, schedule, use_otoco, PollConfig::default())
    }

    /// As [`Cycle::new`], with an explicit order-poll schedule — the
    /// 120s-default deadline makes a stock [`OrderManager`] impractical in
    /// tests, so test suites build a [`Cycle`] through here with a
    /// millisecond-scale [`PollConfig`] instead.
    #[allow(clippy::too_many_arguments)]
    pub fn with_poll_config(
        gateway: Arc<G>,
        store: DurableStore,
        symbol: SmolStr,
        strategy: StrategyConfig,
        risk: RiskConfig,
        schedule: ScheduleConfig,
        use_otoco: bool,
        poll: PollConfig,
    ) -> Self {
        Self {
            order_manager: OrderManager::with_poll_config(gateway.clone(), poll),
            reconciler: Reconciler::new(gateway.clone()),
            gateway,
            store,
            symbol,
            strategy,
            risk,
            schedule,
            use_otoco,
        }
    }

    pub async fn run(&self, cancel: &CancellationToken) -> Result<CycleReport, EngineError> {
        let mut report = CycleReport::default();

        // Reconcile and exits run regardless of market hours; only new
        // entries are gated ("market-clock closed suppresses new
        // entries but allows reconcile and exits").
        let reconcile_report = self.reconciler.reconcile(&self.store, cancel).await?;
        report.reconciled = reconcile_report.refreshed.len();

        let clock = self.fetch_market_clock(cancel).await;
        let market_open = clock
            .as_ref()
            .map(|c| MarketClockView::from(c.clone()).is_open(self.schedule.after_hours_check))
            .unwrap_or_else(|| is_market_open(Utc::now(), &self.schedule.market_open, &self.schedule.market_close));
        report.market_open = market_open;

        let market = self.build_market_snapshot(clock, market_open, cancel).await?;
        if let Some(iv_percent) = iv::iv_percent_from_chain(market.spot, &all_options(&market)) {
            iv::record_daily_iv(&self.store, self.symbol.as_str(), iv_percent).await?;
        }

        let positions = self.store.active_positions().await;
        let account = self.account_snapshot(cancel).await?;
        let mut signals = evaluate(&market, &account, &positions, &self.strategy);
        self.overlay_absolute_loss_floor(&positions, &mut signals);

        let can_enter = market_open
            && is_within_trading_window(Utc::now(), &self.schedule.trading_start, &self.schedule.trading_end);

        for signal in signals {
            match signal {
                Signal::Exit(exit) => {
                    if let Some(position) = positions.iter().find(|p| p.id == exit.position_id) {
                        self.act_on_exit(position, &exit, cancel).await?;
                        report.exits_submitted += 1;
                    }
                }
                Signal::Enter(entry) => {
                    if !can_enter {
                        report.skipped_entry_reason = Some("market closed or outside trading window");
                        continue;
                    }
                    match self.act_on_entry(&entry, cancel).await? {
                        Some(()) => report.entry_submitted = true,
                        None => report.skipped_entry_reason = Some("risk limit"),
                    }
                }
            }
        }

        Ok(report)
    }

    /// `risk.max_position_loss` is an absolute dollar floor enforced
    /// alongside (not instead of) the strategy's percentage-of-credit exit
    /// thresholds. The pure strategy crate only knows percentages,
    /// so the engine adds a synthetic emergency exit here for any active
    /// position the evaluator didn't already flag.
    fn overlay_absolute_loss_floor(&self, positions: &[Position], signals: &mut Vec<Signal>) {
        for position in positions.iter().filter(|p| !p.is_closed()) {
            let already_exiting = signals.iter().any(|s| matches!(s, Signal::Exit(e) if e.position_id == position.id));
            if already_exiting {
                continue;
            }
            if exceeds_position_loss_limit(position.current_pnl, self.risk.max_position_loss) {
                signals.insert(
                    0,
                    Signal::Exit(ExitSignal {
                        position_id: position.id,
                        reason: ExitReason::EmergencyExit,
                        max_debit: position.credit_received,
                    }),
                );
            }
        }
    }

    /// Best-effort broker clock fetch: `None` on any transport failure so
    /// the caller can fall back to local time.
    async fn fetch_market_clock(&self, cancel: &CancellationToken) -> Option<MarketClock> {
        match self.gateway.get_market_clock(cancel).await {
            Ok(clock) => Some(clock),
            Err(err) => {
                warn!(%err, "market clock unavailable, falling back to local time");
                None
            }
        }
    }

    async fn account_snapshot(&self, cancel: &CancellationToken) -> Result<AccountSnapshot, EngineError> {
        let account_balance = self.gateway.get_account_balance(cancel).await?;
        let option_buying_power = self.gateway.get_option_buying_power(cancel).await?;
        Ok(AccountSnapshot { account_balance, option_buying_power })
    }

    async fn build_market_snapshot(
        &self,
        clock: Option<MarketClock>,
        market_open: bool,
        cancel: &CancellationToken,
    ) -> Result<MarketSnapshot, EngineError> {
        let quote = self.gateway.get_quote(self.symbol.as_str(), cancel).await?;
        // When the broker's clock endpoint is down, synthesize one from the
        // local-time fallback already computed in `run` rather than retrying
        // the same failing call.
        let clock = clock.unwrap_or_else(|| MarketClock {
            state: if market_open { strangler_broker::MarketState::Open } else { strangler_broker::MarketState::Closed },
            next_change: Utc::now(),
        });
        let expiration_dates = self.gateway.get_expirations(self.symbol.as_str(), cancel).await?;

        let today = strangler_types::exchange_local_date(Utc::now());
        let mut expirations = Vec::with_capacity(expiration_dates.len());
        for expiration in expiration_dates {
            let options = self.gateway.get_option_chain(self.symbol.as_str(), expiration, true, cancel).await?;
            let dte = (expiration - today).num_days().max(0);
            expirations.push(ExpirationChain { expiration, dte, options });
        }

        let options: Vec<_> = expirations.iter().flat_map(|chain| chain.options.clone()).collect();
        let iv_percent = iv::iv_percent_from_chain(quote.last, &options).unwrap_or(0);

        Ok(MarketSnapshot {
            symbol: self.symbol.clone(),
            spot: quote.last,
            iv_percent,
            clock,
            expirations,
        })
    }

    async fn act_on_exit(
        &self,
        position: &Position,
        exit: &ExitSignal,
        cancel: &CancellationToken,
    ) -> Result<(), EngineError> {
        let legs = close_legs(position);
        let client_order_id = ClientOrderId::derive(position.id, OrderIntent::Close, position.expiration, position.entry_date);

        let handle = self
            .order_manager
            .close(&position.symbol, legs, position.quantity, exit.max_debit, client_order_id, cancel)
            .await?;

        let mut updated = position.clone();
        updated.exit_order_id = Some(handle.order_id.clone());
        updated.exit_reason = Some(exit.reason);
        self.store.upsert_active(updated.clone()).await?;

        let outcome = self.order_manager.poll(&handle.order_id, cancel).await?;
        self.apply_close_outcome(updated, outcome).await?;
        Ok(())
    }

    async fn apply_close_outcome(&self, mut position: Position, outcome: PollOutcome) -> Result<(), EngineError> {
        match condition_for(OrderIntent::Close, &outcome) {
            Some(Condition::PositionClosed) => {
                if let PollOutcome::Filled { fill_price, .. } = outcome {
                    position.current_pnl =
                        (position.credit_received - fill_price) * Decimal::from(position.quantity) * Decimal::from(100);
                }
                position.exit_date = Some(Utc::now());
                transition(&mut position, Condition::PositionClosed);
                self.store.close_position(position).await?;
            }
            Some(condition) => {
                transition(&mut position, condition);
                self.store.upsert_active(position).await?;
            }
            None => {
                // Unknown/timeout: left exactly as persisted above, with
                // `exit_order_id` set so the reconciler resolves it next
                // cycle without placing a duplicate close.
                warn!(position_id = %position.id, "close order outcome unresolved at deadline");
            }
        }
        Ok(())
    }

    async fn act_on_entry(&self, entry: &EntrySignal, cancel: &CancellationToken) -> Result<Option<()>, EngineError> {
        let today = strangler_types::exchange_local_date(Utc::now());
        let store = self.store.snapshot().await;
        if exceeds_daily_loss_limit(store.daily_pnl.get(today), self.risk.max_daily_loss) {
            warn!("daily loss limit reached, skipping new entry");
            return Ok(None);
        }

        let quantity = clamp_quantity(entry.quantity, self.risk.max_contracts);
        if quantity == 0 {
            return Ok(None);
        }

        let legs = open_legs(entry);
        let position_id = PositionId::random();
        let now = Utc::now();
        let client_order_id = ClientOrderId::derive(position_id, OrderIntent::Open, entry.expiration, now);

        let mut position = Position {
            id: position_id,
            symbol: entry.symbol.clone(),
            put_strike: entry.put_strike,
            call_strike: entry.call_strike,
            expiration: entry.expiration,
            quantity,
            credit_received: entry.credit,
            entry_limit_price: entry.credit,
            entry_date: now,
            exit_date: None,
            entry_iv: 0,
            entry_spot: Decimal::ZERO,
            current_pnl: Decimal::ZERO,
            dte: (entry.expiration - strangler_types::exchange_local_date(now)).num_days().max(0),
            entry_order_id: None,
            exit_order_id: None,
            exit_reason: None,
            adjustments: Vec::new(),
            state: PositionStateName::Idle,
        };

        // Optimistically raised before the broker call returns: records the
        // position in `submitted` so a crash between the call and the reply
        // still leaves a trail the reconciler can resolve.
        transition(&mut position, Condition::OrderPlaced);

        let otoco_target = self.use_otoco.then_some(self.strategy.exit.profit_target * entry.credit);
        let placed = self
            .gateway
            .place_multi_leg_order(
                entry.symbol.as_str(),
                legs,
                quantity,
                entry.credit,
                OrderDuration::Day,
                client_order_id,
                false,
                otoco_target,
                cancel,
            )
            .await;

        let handle = match placed {
            Ok(handle) => handle,
            Err(strangler_broker::BrokerError::InsufficientBuyingPower) => {
                // Treated as a non-event: nothing is persisted, the
                // position never existed.
                warn!(symbol = %entry.symbol, "entry skipped: insufficient buying power");
                return Ok(None);
            }
            Err(strangler_broker::BrokerError::Rejected(reason)) => {
                transition(&mut position, Condition::OrderRejected);
                self.store.upsert_active(position).await?;
                warn!(%reason, "entry order rejected by broker");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        position.entry_order_id = Some(handle.order_id.clone());
        self.store.upsert_active(position.clone()).await?;

        let outcome = self.order_manager.poll(&handle.order_id, cancel).await?;
        self.apply_open_outcome(position, outcome).await?;

        Ok(Some(()))
    }

    async fn apply_open_outcome(&self, mut position: Position, outcome: PollOutcome) -> Result<(), EngineError> {
        match condition_for(OrderIntent::Open, &outcome) {
            Some(condition @ Condition::OrderFilled) => {
                match outcome {
                    PollOutcome::Filled { fill_price, .. } | PollOutcome::PartiallyFilled { fill_price, .. } => {
                        position.credit_received = fill_price;
                    }
                    _ => unreachable!("condition_for only maps fill outcomes to OrderFilled"),
                }
                if let PollOutcome::PartiallyFilled { filled_qty, .. } = outcome {
                    position.quantity = filled_qty;
                    warn!(position_id = %position.id, filled_qty, "entry partially filled at poll deadline");
                }
                transition(&mut position, condition);
                self.store.upsert_active(position).await?;
            }
            Some(condition) => {
                transition(&mut position, condition);
                self.store.upsert_active(position).await?;
            }
            None => {
                warn!(position_id = %position.id, "entry order outcome unresolved at deadline, left submitted");
            }
        }
        Ok(())
    }
}

fn transition(position: &mut Position, condition: Condition) {
    let mut machine =
        PositionStateMachine::from_persisted(position.state, position.strike_adjustment_count(), position.time_roll_count());
    match machine.transition(condition) {
        Ok(next) => position.state = next,
        Err(err) => warn!(position_id = %position.id, %err, "state transition refused"),
    }
}

fn open_legs(entry: &EntrySignal) -> Vec<OrderLeg> {
    vec![
        OrderLeg {
            side: OptionSide::Put,
            strike: entry.put_strike,
            expiration: entry.expiration,
            action: LegAction::SellToOpen,
        },
        OrderLeg {
            side: OptionSide::Call,
            strike: entry.call_strike,
            expiration: entry.expiration,
            action: LegAction::SellToOpen,
        },
    ]
}

fn close_legs(position: &Position) -> Vec<OrderLeg> {
    vec![
        OrderLeg {
            side: OptionSide::Put,
            strike: position.put_strike,
            expiration: position.expiration,
            action: LegAction::BuyToClose,
        },
        OrderLeg {
            side: OptionSide::Call,
            strike: position.call_strike,
            expiration: position.expiration,
            action: LegAction::BuyToClose,
        },
    ]
}

fn all_options(market: &MarketSnapshot) -> Vec<strangler_broker::OptionQuote> {
    market.expirations.iter().flat_map(|chain| chain.options.clone()).collect()
}
