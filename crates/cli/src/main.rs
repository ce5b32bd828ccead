use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "smc-trade")]
#[command(about = "Market-structure trading engine and backtester", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a backtest over a historical candle CSV
    Backtest {
        /// Historical data CSV file (time,open,high,low,close,volume)
        #[arg(short, long)]
        data: String,
        /// Working timeframe to aggregate into (1m, 5m, 15m, 1h, 4h, 1d)
        #[arg(short, long, default_value = "15m")]
        interval: String,
        /// Print the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Replay a candle CSV through the live engine with paper fills
    Replay {
        /// Historical data CSV file (time,open,high,low,close,volume)
        #[arg(short, long)]
        data: String,
        /// Engine config TOML (merged with SMC_ env vars)
        #[arg(short, long, default_value = "config/Engine.toml")]
        config: String,
        /// Candles to preload before the first tick
        #[arg(long, default_value_t = 50)]
        warmup: usize,
    },
    /// Print the effective engine configuration
    PrintConfig {
        /// Engine config TOML (merged with SMC_ env vars)
        #[arg(short, long, default_value = "config/Engine.toml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Backtest {
            data,
            interval,
            json,
        } => commands::backtest::run(&data, &interval, json),
        Commands::Replay {
            data,
            config,
            warmup,
        } => commands::replay::run(&data, &config, warmup).await,
        Commands::PrintConfig { config } => commands::print_config(&config),
    }
}
