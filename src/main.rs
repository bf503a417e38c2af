use anyhow::{Context, Result};
use autotrader::api::{Credentials, PaperExchange, UpbitClient};
use autotrader::execution::{PositionArbiter, Trader};
use autotrader::persistence::CsvTradeRecorder;
use autotrader::settings::Settings;
use autotrader::ExchangeClient;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "autotrader", about = "Multi-strategy spot trading bot for Upbit")]
struct Cli {
    /// Settings file (defaults to ./autotrader.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the trading loop until interrupted
    Run {
        /// Simulate fills in memory instead of placing real orders
        #[arg(long)]
        paper: bool,

        /// Starting quote balance for paper trading
        #[arg(long, default_value = "1000000")]
        paper_balance: Decimal,
    },
    /// Fetch prices once and print every strategy's signals
    Signals,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    let _guard = setup_logging(&settings.log_dir)?;

    tracing::info!("🚀 Autotrader starting for {}", settings.ticker);

    let credentials = Credentials::from_env();
    if credentials.is_none() {
        tracing::warn!("UPBIT_ACCESS_KEY / UPBIT_SECRET_KEY not set, private endpoints will fail");
    }
    let client = UpbitClient::new(credentials).context("Failed to build Upbit client")?;

    match cli.command {
        Command::Run {
            paper: true,
            paper_balance,
        } => {
            tracing::info!(
                "📝 Paper trading with {} {}",
                paper_balance,
                settings.ticker.quote()
            );
            let exchange = PaperExchange::new(client, &settings.ticker, paper_balance);
            run_trader(exchange, &settings).await
        }
        Command::Run { paper: false, .. } => run_trader(client, &settings).await,
        Command::Signals => print_signals(&client, &settings).await,
    }
}

/// Console plus a non-blocking `trade.log` file in `log_dir`
fn setup_logging(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(log_dir, "trade.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("autotrader=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    Ok(guard)
}

async fn run_trader<E: ExchangeClient>(exchange: E, settings: &Settings) -> Result<()> {
    let recorder = CsvTradeRecorder::open(&settings.trade_log).with_context(|| {
        format!("Failed to open trade history {}", settings.trade_log.display())
    })?;

    let arbiter = PositionArbiter::new(settings.build_strategies());
    tracing::info!("\n📊 Configuration:");
    tracing::info!("  Ticker: {}", settings.ticker);
    tracing::info!(
        "  Candles: {} x {}m",
        settings.candle_count,
        settings.candle_interval_minutes
    );
    tracing::info!("  Poll interval: {}s", settings.poll_interval_secs);
    tracing::info!("  Trade history: {}", settings.trade_log.display());
    for strategy in arbiter.strategies() {
        tracing::info!("    - {}", strategy.name());
    }

    let feed = settings.market_data_feed();
    let mut trader = Trader::new(
        exchange,
        recorder,
        arbiter,
        settings.ticker.clone(),
        settings.trading_rules(),
    );

    tracing::info!("\nPress Ctrl+C to stop...\n");

    tokio::select! {
        _ = trader.run(&feed, settings.poll_interval()) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("\n⚠️  Received Ctrl+C, shutting down...");
        }
    }

    tracing::info!("👋 Autotrader stopped in state {:?}", trader.state());
    Ok(())
}

async fn print_signals(client: &UpbitClient, settings: &Settings) -> Result<()> {
    let prices = settings
        .market_data_feed()
        .fetch(client)
        .await
        .context("Failed to fetch prices")?;

    let last = prices.last().copied().unwrap_or_default();
    println!(
        "{} @ {} ({} closes, {}m candles)",
        settings.ticker,
        last,
        prices.len(),
        settings.candle_interval_minutes
    );

    for strategy in settings.build_strategies() {
        let ready = prices.len() >= strategy.min_samples();
        println!(
            "  {:<28} buy={:<5} sell={:<5}{}",
            strategy.name(),
            strategy.should_buy(&prices),
            strategy.should_sell(&prices),
            if ready { "" } else { "  (not enough data)" }
        );
    }

    Ok(())
}
