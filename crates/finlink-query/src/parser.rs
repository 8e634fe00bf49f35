use finlink_core::{Coverage, InputError, NormalizedQuery};

use crate::intent::{infer_intent, parse_intent_override};
use crate::ticker::extract_ticker;

/// Default result count when the caller doesn't specify `limit`.
pub const DEFAULT_LIMIT: u32 = 10;

/// Raw, caller-supplied overrides alongside the free-text query.
#[derive(Debug, Clone, Default)]
pub struct QueryInput {
    pub query: String,
    pub intent: Option<String>,
    pub ticker: Option<String>,
    pub form: Option<String>,
    pub coverage: Option<String>,
    pub limit: Option<i64>,
    pub refresh: bool,
    pub source: Option<String>,
}

fn parse_coverage(raw: Option<&str>) -> Coverage {
    match raw.map(str::to_lowercase).as_deref() {
        Some("comprehensive") => Coverage::Comprehensive,
        _ => Coverage::Default,
    }
}

fn clamp_limit(raw: Option<i64>) -> u32 {
    let value = raw.unwrap_or(DEFAULT_LIMIT as i64);
    value.clamp(1, 50) as u32
}

/// Normalizes a free-text query plus overrides into a `NormalizedQuery`
/// ready for federation.
pub fn parse(input: &QueryInput) -> Result<NormalizedQuery, InputError> {
    if input.query.trim().is_empty() {
        return Err(InputError::EmptyQuery);
    }

    let ticker = extract_ticker(input.ticker.as_deref(), &input.query)
        .ok_or_else(|| InputError::MissingTicker(input.query.clone()))?;

    let intent = match input.intent.as_deref() {
        Some(raw) => parse_intent_override(raw)?,
        None => infer_intent(&input.query),
    };

    Ok(NormalizedQuery {
        intent,
        ticker,
        form: input.form.clone(),
        coverage: parse_coverage(input.coverage.as_deref()),
        limit: clamp_limit(input.limit),
        refresh: input.refresh,
        source_override: input.source.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use finlink_core::Intent;

    fn base(query: &str) -> QueryInput {
        QueryInput { query: query.to_string(), ..Default::default() }
    }

    #[test]
    fn empty_query_is_rejected() {
        assert!(matches!(parse(&base("   ")), Err(InputError::EmptyQuery)));
    }

    #[test]
    fn missing_ticker_is_rejected() {
        assert!(matches!(
            parse(&base("what's going on with the market")),
            Err(InputError::MissingTicker(_))
        ));
    }

    #[test]
    fn infers_quote_for_bare_ticker() {
        let parsed = parse(&base("AAPL")).unwrap();
        assert_eq!(parsed.intent, Intent::Quote);
        assert_eq!(parsed.ticker, "AAPL");
        assert_eq!(parsed.limit, DEFAULT_LIMIT);
        assert_eq!(parsed.coverage, Coverage::Default);
    }

    #[test]
    fn limit_clamps_to_range() {
        let mut input = base("TSLA insider ownership");
        input.limit = Some(500);
        assert_eq!(parse(&input).unwrap().limit, 50);

        input.limit = Some(0);
        assert_eq!(parse(&input).unwrap().limit, 1);

        input.limit = Some(-7);
        assert_eq!(parse(&input).unwrap().limit, 1);
    }

    #[test]
    fn unsupported_explicit_intent_is_rejected() {
        let mut input = base("AAPL");
        input.intent = Some("banana".to_string());
        assert!(matches!(parse(&input), Err(InputError::UnsupportedIntent(_))));
    }

    #[test]
    fn comprehensive_coverage_is_recognized() {
        let mut input = base("AAPL");
        input.coverage = Some("comprehensive".to_string());
        assert_eq!(parse(&input).unwrap().coverage, Coverage::Comprehensive);
    }

    #[test]
    fn ticker_override_takes_priority_over_inferred_token() {
        let mut input = base("what is MSFT doing");
        input.ticker = Some("$AAPL".to_string());
        assert_eq!(parse(&input).unwrap().ticker, "AAPL");
    }
}
