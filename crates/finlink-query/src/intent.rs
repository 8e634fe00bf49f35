use finlink_core::{Intent, InputError};

const FILINGS_KEYWORDS: &[&str] = &["10-k", "10-q", "8-k", "filing", "sec filing"];
const INSIDER_KEYWORDS: &[&str] = &["insider", "ownership", "officer", "beneficial", "inside"];
const FUNDAMENTALS_KEYWORDS: &[&str] =
    &["revenue", "earnings", "fundamentals", "metric", "financial"];
const NEWS_KEYWORDS: &[&str] = &["news", "headline", "press release", "announc"];

/// Infers an intent from keyword classes when none was explicitly requested.
/// Falls back to `Quote` when nothing matches.
pub fn infer_intent(query: &str) -> Intent {
    let lower = query.to_lowercase();

    if FILINGS_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return Intent::Filings;
    }
    if INSIDER_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return Intent::Insider;
    }
    if FUNDAMENTALS_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return Intent::Fundamentals;
    }
    if NEWS_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return Intent::News;
    }
    Intent::Quote
}

/// Parses an explicit `intent` override. Unlike keyword inference, an
/// explicit override that doesn't name one of the five intents is a hard
/// failure rather than a silent fallback to quote.
pub fn parse_intent_override(raw: &str) -> Result<Intent, InputError> {
    match raw.trim().to_lowercase().as_str() {
        "quote" => Ok(Intent::Quote),
        "fundamentals" => Ok(Intent::Fundamentals),
        "filings" => Ok(Intent::Filings),
        "insider" => Ok(Intent::Insider),
        "news" => Ok(Intent::News),
        other => Err(InputError::UnsupportedIntent(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filings_keywords_take_priority_over_fundamentals() {
        assert_eq!(infer_intent("show me the latest 10-K filing and revenue"), Intent::Filings);
    }

    #[test]
    fn insider_keywords_detected() {
        assert_eq!(infer_intent("any insider ownership changes lately"), Intent::Insider);
    }

    #[test]
    fn no_keywords_defaults_to_quote() {
        assert_eq!(infer_intent("AAPL"), Intent::Quote);
    }

    #[test]
    fn explicit_override_rejects_unknown_intent() {
        assert!(parse_intent_override("fancy-intent").is_err());
    }

    #[test]
    fn explicit_override_is_case_insensitive() {
        assert_eq!(parse_intent_override("FUNDAMENTALS").unwrap(), Intent::Fundamentals);
    }
}
