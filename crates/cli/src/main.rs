use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "stock-council")]
#[command(about = "Multi-agent stock analysis with a deterministic backtest harness", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the analyst council for one ticker and print its recommendation
    Analyze {
        /// Ticker symbol (e.g. "AAPL", "600519", "0700.HK")
        ticker: String,
        /// Analysis date in YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
    /// Replay the ledger's recommendations against historical prices
    Backtest {
        /// Ticker symbol
        ticker: String,
        /// First day of the period (YYYY-MM-DD)
        #[arg(long)]
        start: chrono::NaiveDate,
        /// Last day of the period (YYYY-MM-DD)
        #[arg(long)]
        end: chrono::NaiveDate,
        /// Starting capital, overriding the config
        #[arg(long)]
        capital: Option<rust_decimal::Decimal>,
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Analyze {
            ticker,
            date,
            config,
        } => commands::analyze::run(&ticker, date, &config)
            .await
            .map_err(|e| (commands::analyze::exit_code(&e), e)),
        Commands::Backtest {
            ticker,
            start,
            end,
            capital,
            config,
        } => commands::backtest::run(&ticker, start, end, capital, &config)
            .await
            .map_err(|e| (commands::backtest::exit_code(&e), e)),
    };

    if let Err((code, error)) = outcome {
        eprintln!("error: {error:#}");
        std::process::exit(code);
    }
}
