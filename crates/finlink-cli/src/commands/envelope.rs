//! `quote` / `fundamentals` / `filings` / `insider` / `news` subcommands:
//! parse CLI args into a `QueryInput`, run the full query→federation
//! pipeline, print the resulting envelope as pretty JSON.

use finlink_cache::QueryCache;
use finlink_core::CancelSignal;
use finlink_providers::ProviderRegistry;
use finlink_query::QueryInput;

fn flag_value(args: &[String], name: &str) -> Option<String> {
    args.iter().position(|a| a == name).and_then(|i| args.get(i + 1)).cloned()
}

fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|a| a == name)
}

fn build_input(command: &str, args: &[String]) -> QueryInput {
    let query = args
        .iter()
        .take_while(|a| !a.starts_with("--"))
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");

    QueryInput {
        query,
        intent: Some(command.to_string()),
        ticker: flag_value(args, "--ticker"),
        form: flag_value(args, "--form"),
        coverage: flag_value(args, "--coverage"),
        limit: flag_value(args, "--limit").and_then(|v| v.parse().ok()),
        refresh: has_flag(args, "--refresh"),
        source: flag_value(args, "--source"),
    }
}

pub async fn run(
    command: &str,
    args: &[String],
    registry: &ProviderRegistry,
    cache: &QueryCache,
) -> anyhow::Result<()> {
    let input = build_input(command, args);
    let query = finlink_query::parse(&input)?;

    let providers = registry.providers_for(query.intent);
    let cancel = CancelSignal::never();
    let result = finlink_federation::federate(&query, &providers, cache, &cancel).await;

    println!("{}", serde_json::to_string_pretty(&result)?);
    if !result.errors.is_empty() {
        tracing::warn!(errors = ?result.errors, "envelope returned with provider errors");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_input_splits_free_text_query_from_flags() {
        let args: Vec<String> = vec!["AAPL".into(), "--coverage".into(), "comprehensive".into(), "--limit".into(), "5".into()];
        let input = build_input("quote", &args);
        assert_eq!(input.query, "AAPL");
        assert_eq!(input.coverage.as_deref(), Some("comprehensive"));
        assert_eq!(input.limit, Some(5));
        assert!(!input.refresh);
    }

    #[test]
    fn refresh_flag_is_detected_anywhere_in_args() {
        let args: Vec<String> = vec!["MSFT".into(), "fundamentals".into(), "--refresh".into()];
        let input = build_input("fundamentals", &args);
        assert_eq!(input.query, "MSFT fundamentals");
        assert!(input.refresh);
    }
}
