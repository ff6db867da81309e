mod logging;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{error, info, warn};
use url::Url;

use strangler_broker::{BrokerGateway, LegAction, OptionSide, OrderLeg, TradierGateway};
use strangler_engine::config::{Config, Mode};
use strangler_engine::{Cycle, EngineError, Scheduler};
use strangler_integration::{CancellationToken, CircuitBreaker, CircuitBreakerConfig, RateLimiter, RestClient};
use strangler_order::OrderManager;
use strangler_store::DurableStore;
use strangler_types::{ClientOrderId, OrderIntent};

/// Automated SPY short-strangle options agent: a `--config`
/// path drives a single binary that can run the scheduler loop, execute one
/// cycle, or liquidate every open position in an emergency.
#[derive(Parser)]
#[command(name = "strangler", about = "Automated SPY short-strangle options agent")]
struct Cli {
    #[arg(long, default_value = "strangler.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Runs the scheduler loop until a shutdown signal is received. Default
    /// when no subcommand is given.
    Run,
    /// Runs exactly one trading cycle and exits.
    Cycle,
    /// Closes every active position and exits. Destructive; requires
    /// `--yes-really`.
    LiquidateAll {
        #[arg(long)]
        yes_really: bool,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] strangler_engine::ConfigError),
    #[error(transparent)]
    Store(#[from] strangler_store::StoreError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("invalid broker base_url {0}: {1}")]
    InvalidBaseUrl(String, url::ParseError),
    #[error("refusing to liquidate without --yes-really")]
    LiquidationNotConfirmed,
}

fn main() -> ExitCode {
    logging::init_logging();
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(%err, "failed to start async runtime");
            return ExitCode::FAILURE;
        }
    };

    // Exit codes: 0 on success, nonzero on initialization failure
    // or unrecoverable error.
    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "fatal error");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = Config::load(&cli.config)?;
    let strategy = config.strategy.to_strategy_config()?;
    let gateway = Arc::new(build_gateway(&config)?);
    let store = DurableStore::load(config.environment.state_file.clone()).await?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let cycle = Arc::new(Cycle::new(
                gateway,
                store,
                config.strategy.symbol.clone(),
                strategy,
                config.risk,
                config.schedule.clone(),
                config.broker.use_otoco,
            ));
            let interval = Duration::from_secs(config.schedule.market_check_interval);
            let scheduler = Scheduler::new(cycle, interval);

            let cancel = CancellationToken::new();
            let shutdown = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("shutdown signal received");
                    shutdown.cancel();
                }
            });

            scheduler.run(&cancel).await?;
        }
        Command::Cycle => {
            let cycle = Cycle::new(
                gateway,
                store,
                config.strategy.symbol.clone(),
                strategy,
                config.risk,
                config.schedule.clone(),
                config.broker.use_otoco,
            );
            let cancel = CancellationToken::new();
            let report = cycle.run(&cancel).await?;
            info!(
                market_open = report.market_open,
                reconciled = report.reconciled,
                exits_submitted = report.exits_submitted,
                entry_submitted = report.entry_submitted,
                "single cycle complete"
            );
        }
        Command::LiquidateAll { yes_really } => {
            if !yes_really {
                return Err(CliError::LiquidationNotConfirmed);
            }
            liquidate_all(gateway, &store).await;
        }
    }

    Ok(())
}

fn build_gateway(config: &Config) -> Result<TradierGateway, CliError> {
    let base_url = Url::parse(&config.broker.base_url)
        .map_err(|err| CliError::InvalidBaseUrl(config.broker.base_url.clone(), err))?;
    let rate_limiter = match config.environment.mode {
        Mode::Paper => RateLimiter::sandbox(),
        Mode::Live => RateLimiter::live(),
    };
    let circuit_breaker = CircuitBreaker::new(CircuitBreakerConfig::default());
    let client = RestClient::new(base_url, config.broker.api_key.clone(), rate_limiter, circuit_breaker);
    Ok(TradierGateway::new(client, config.broker.account_id.clone()))
}

/// Closes every active position, best-effort: one position's broker error is
/// logged and does not stop the rest from being attempted.
///
/// The broker surface only exposes limit-priced multi-leg
/// orders, no true market-order type, so liquidation asks to close at up to
/// 10x the original credit received — generous enough to rest filled during
/// an emergency unwind without literally being unbounded.
async fn liquidate_all<G: BrokerGateway>(gateway: Arc<G>, store: &DurableStore) {
    let order_manager = OrderManager::new(gateway);
    let cancel = CancellationToken::new();

    for position in store.active_positions().await {
        if position.is_closed() {
            continue;
        }

        let legs = vec![
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
        ];
        let max_debit = (position.credit_received * Decimal::from(10)).max(Decimal::ONE);
        let client_order_id =
            ClientOrderId::derive(position.id, OrderIntent::Close, position.expiration, position.entry_date);

        match order_manager
            .close(&position.symbol, legs, position.quantity, max_debit, client_order_id, &cancel)
            .await
        {
            Ok(handle) => info!(position_id = %position.id, order_id = %handle.order_id, "liquidation order submitted"),
            Err(err) => warn!(position_id = %position.id, %err, "failed to submit liquidation order"),
        }
    }
}
