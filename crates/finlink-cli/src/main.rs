//! `finlink` — command-line entry point for the FinLink aggregation and
//! analytics engine. Exposes the query/federation pipeline and the
//! political-backtest and darkpool-anomaly workflows as flat subcommands.
//!
//! Usage:
//!   finlink quote AAPL
//!   finlink fundamentals "MSFT fundamentals" --coverage comprehensive
//!   finlink filings TSLA --form 10-K --limit 5
//!   finlink insider NVDA
//!   finlink news AAPL --limit 20
//!   finlink backtest --scenario scenario.json --reports-root reports --scope aapl-congress
//!   finlink darkpool --dataset darkpool.json --ticker AAPL --reports-root reports

mod commands;

use finlink_auth::{AuthStore, CredentialResolver};
use finlink_cache::QueryCache;
use finlink_providers::ProviderRegistry;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "finlink=info".into()),
        )
        .init();
}

fn usage() -> ! {
    eprintln!("Usage:");
    eprintln!("  finlink quote|fundamentals|filings|insider|news <query> [--ticker T] [--form F]");
    eprintln!("                                                  [--coverage default|comprehensive]");
    eprintln!("                                                  [--limit N] [--refresh] [--source ID]");
    eprintln!("  finlink backtest --scenario PATH --reports-root DIR --scope KEY");
    eprintln!("  finlink darkpool --dataset PATH --ticker SYMBOL --reports-root DIR [--scope KEY]");
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().cloned() else { usage() };
    let rest = &args[1..];

    match command.as_str() {
        "quote" | "fundamentals" | "filings" | "insider" | "news" => {
            let data_root = dirs::data_local_dir().unwrap_or_else(std::env::temp_dir).join("finlink");
            let resolver = CredentialResolver::new(AuthStore::new(&data_root));
            let registry = ProviderRegistry::from_credentials(&resolver);
            let cache = QueryCache::new();
            commands::envelope::run(&command, rest, &registry, &cache).await
        }
        "backtest" => commands::backtest::run(rest).await,
        "darkpool" => commands::darkpool::run(rest).await,
        "help" | "--help" | "-h" => usage(),
        other => {
            eprintln!("unknown command: {other}");
            usage()
        }
    }
}
