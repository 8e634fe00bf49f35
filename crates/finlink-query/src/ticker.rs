use once_cell::sync::Lazy;
use regex::Regex;

/// `[A-Z][A-Z0-9]{0,4}(\.[A-Z]{1,3})?`, e.g. `AAPL`, `BRK.B`, `T`.
static TICKER_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][A-Z0-9]{0,4}(\.[A-Z]{1,3})?$").unwrap());

const STOP_WORDS: &[&str] = &[
    "A", "I", "THE", "OF", "IN", "ON", "FOR", "IS", "AND", "OR", "TO", "VS", "US", "NEWS",
];

fn matches_shape(token: &str) -> bool {
    TICKER_SHAPE.is_match(token)
}

/// Extracts a ticker per the precedence in the query parser: an explicit
/// `$TICKER` override wins outright; otherwise a single-word query matching
/// the ticker shape is accepted as-is; otherwise the first non-stop-word
/// uppercase token matching the shape is used.
pub fn extract_ticker(explicit: Option<&str>, query: &str) -> Option<String> {
    if let Some(t) = explicit {
        let t = t.trim().trim_start_matches('$').to_uppercase();
        if !t.is_empty() {
            return Some(t);
        }
    }

    let trimmed = query.trim();
    let words: Vec<&str> = trimmed.split_whitespace().collect();

    if words.len() == 1 && matches_shape(words[0]) {
        return Some(words[0].to_string());
    }

    words
        .iter()
        .find(|w| !STOP_WORDS.contains(w) && matches_shape(w))
        .map(|w| w.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_ticker_override_wins() {
        let ticker = extract_ticker(Some("$aapl"), "tell me about msft news");
        assert_eq!(ticker.as_deref(), Some("AAPL"));
    }

    #[test]
    fn single_word_query_accepted_verbatim() {
        let ticker = extract_ticker(None, "BRK.B");
        assert_eq!(ticker.as_deref(), Some("BRK.B"));
    }

    #[test]
    fn finds_uppercase_token_among_stop_words() {
        let ticker = extract_ticker(None, "what is the news for NVDA today");
        assert_eq!(ticker.as_deref(), Some("NVDA"));
    }

    #[test]
    fn skips_stop_words_shaped_like_tickers() {
        let ticker = extract_ticker(None, "A IS the latest filing");
        assert_eq!(ticker, None);
    }

    #[test]
    fn no_ticker_found_returns_none() {
        assert_eq!(extract_ticker(None, "what's happening in the market today"), None);
    }
}
