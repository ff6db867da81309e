use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use strangler_broker::{BrokerError, BrokerGateway, OrderDuration, OrderLeg, OrderHandle, OrderStatus};
use strangler_integration::{retry_with_backoff, CancellationToken, IntegrationError};
use strangler_types::ClientOrderId;
use tracing::warn;

use crate::outcome::PollOutcome;

const RETRY_ON_CLOSE_ATTEMPTS: u32 = 3;

/// Polling schedule: initial delay, steady-state interval, and
/// an overall deadline after which the outcome is reported `unknown`.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub initial_delay: Duration,
    pub interval: Duration,
    pub deadline: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            initial_delay: Duration::from_secs(2),
            interval: Duration::from_secs(5),
            deadline: Duration::from_secs(120),
        }
    }
}

/// The grace period allowed for an order to settle after a cancellation request.
const CANCEL_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// Order Lifecycle Manager: places and closes multi-leg orders,
/// polls them to a terminal status on a bounded schedule, and handles
/// cancellation with a grace period.
pub struct OrderManager<G> {
    gateway: Arc<G>,
    poll: PollConfig,
}

impl<G> OrderManager<G>
where
    G: BrokerGateway,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway, poll: PollConfig::default() }
    }

    pub fn with_poll_config(gateway: Arc<G>, poll: PollConfig) -> Self {
        Self { gateway, poll }
    }

    /// Places a new multi-leg entry order. The caller is responsible for
    /// recording the returned handle onto the position before taking any
    /// further action, so a crash before that write leaves a recoverable
    /// trail for the reconciler.
    #[allow(clippy::too_many_arguments)]
    pub async fn place(
        &self,
        symbol: &str,
        legs: Vec<OrderLeg>,
        quantity: u32,
        limit_price: rust_decimal::Decimal,
        duration: OrderDuration,
        client_order_id: ClientOrderId,
        cancel: &CancellationToken,
    ) -> Result<OrderHandle, BrokerError> {
        self.gateway
            .place_multi_leg_order(
                symbol,
                legs,
                quantity,
                limit_price,
                duration,
                client_order_id,
                false,
                None,
                cancel,
            )
            .await
    }

    /// Closes an existing position's legs. Wraps the broker call in its own
    /// transient-retry loop ("up to 3 attempts, same backoff
    /// scheme as the gateway"), reusing the same `client_order_id` across
    /// attempts so a submission timeout never duplicates the close.
    pub async fn close(
        &self,
        symbol: &str,
        legs: Vec<OrderLeg>,
        quantity: u32,
        max_debit: rust_decimal::Decimal,
        client_order_id: ClientOrderId,
        cancel: &CancellationToken,
    ) -> Result<OrderHandle, BrokerError> {
        retry_with_backoff(RETRY_ON_CLOSE_ATTEMPTS, BrokerError::is_retryable, || {
            self.gateway.close_multi_leg(
                symbol,
                legs.clone(),
                quantity,
                max_debit,
                client_order_id.clone(),
                cancel,
            )
        })
        .await
    }

    /// Polls `order_id` to a terminal status on the configured schedule. If
    /// the overall deadline elapses first, returns
    /// [`PollOutcome::PartiallyFilled`] when the broker had reported a
    /// nonzero fill at the last check, or [`PollOutcome::Unknown`] otherwise
    /// ("partially_filled at deadline -> treated as open with
    /// adjusted quantity").
    pub async fn poll(
        &self,
        order_id: &strangler_types::OrderId,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome, BrokerError> {
        self.poll_until(order_id, cancel, self.poll.deadline, self.poll.initial_delay).await
    }

    async fn poll_until(
        &self,
        order_id: &strangler_types::OrderId,
        cancel: &CancellationToken,
        deadline: Duration,
        initial_delay: Duration,
    ) -> Result<PollOutcome, BrokerError> {
        let deadline = tokio::time::Instant::now() + deadline;
        let mut last_partial: Option<(Decimal, u32)> = None;

        if sleep_until_or_deadline(initial_delay, deadline).await.is_err() {
            return Ok(Self::deadline_outcome(last_partial));
        }

        loop {
            let report = tokio::select! {
                _ = cancel.cancelled() => return Err(BrokerError::Transport(IntegrationError::Canceled)),
                result = tokio::time::timeout_at(deadline, self.gateway.get_order_status(order_id, cancel)) => {
                    match result {
                        Ok(report) => report?,
                        Err(_) => return Ok(Self::deadline_outcome(last_partial)),
                    }
                }
            };

            match report.status {
                OrderStatus::Filled => {
                    return Ok(PollOutcome::Filled {
                        fill_price: report.avg_fill_price.unwrap_or_default(),
                        filled_qty: report.filled_qty,
                    });
                }
                OrderStatus::Rejected => return Ok(PollOutcome::Rejected("order rejected by broker".into())),
                OrderStatus::Canceled => return Ok(PollOutcome::Canceled),
                OrderStatus::Expired => return Ok(PollOutcome::Expired),
                OrderStatus::PartiallyFilled => {
                    last_partial = Some((report.avg_fill_price.unwrap_or_default(), report.filled_qty));
                    if sleep_until_or_deadline(self.poll.interval, deadline).await.is_err() {
                        return Ok(Self::deadline_outcome(last_partial));
                    }
                }
                OrderStatus::Pending | OrderStatus::Open => {
                    if sleep_until_or_deadline(self.poll.interval, deadline).await.is_err() {
                        return Ok(Self::deadline_outcome(last_partial));
                    }
                }
            }
        }
    }

    fn deadline_outcome(last_partial: Option<(Decimal, u32)>) -> PollOutcome {
        match last_partial {
            Some((fill_price, filled_qty)) if filled_qty > 0 => PollOutcome::PartiallyFilled { fill_price, filled_qty },
            _ => PollOutcome::Unknown,
        }
    }

    /// Cancels `order_id` and waits up to a short grace period for a
    /// terminal status, per cancellation semantics.
    pub async fn cancel_with_grace(
        &self,
        order_id: &strangler_types::OrderId,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome, BrokerError> {
        self.gateway.cancel_order(order_id, cancel).await?;

        let outcome = self.poll_until(order_id, cancel, CANCEL_GRACE_PERIOD, Duration::ZERO).await?;
        if !outcome.is_terminal() {
            warn!(%order_id, "order did not reach a terminal status within the cancellation grace period");
        }
        Ok(outcome)
    }
}

/// Sleeps for `duration`, or stops early with `Err(())` if `deadline` is
/// reached first.
async fn sleep_until_or_deadline(duration: Duration, deadline: tokio::time::Instant) -> Result<(), ()> {
    tokio::time::timeout_at(deadline, tokio::time::sleep(duration)).await.map_err(|_| ())
}
