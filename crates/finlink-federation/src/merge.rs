use std::collections::HashSet;

use finlink_core::{
    is_well_formed_string, FilingsData, FinanceData, FundamentalsData, InsiderData, MetricPeriod,
    NewsData, QuoteData,
};

/// "Well-formed" for numbers: finite.
fn num_well_formed(value: Option<f64>) -> bool {
    value.is_some_and(f64::is_finite)
}

fn prefer_num(acc: Option<f64>, next: Option<f64>) -> Option<f64> {
    if num_well_formed(acc) {
        acc
    } else {
        next
    }
}

fn prefer_str(acc: Option<String>, next: Option<String>) -> Option<String> {
    if is_well_formed_string(acc.as_deref()) {
        acc
    } else {
        next
    }
}

/// Accumulator-has-priority scalar merge for `quote`.
pub fn merge_quote(acc: &mut QuoteData, next: &QuoteData) {
    acc.price = prefer_num(acc.price, next.price);
    acc.previous_close = prefer_num(acc.previous_close, next.previous_close);
    acc.change = prefer_num(acc.change, next.change);
    acc.change_percent = prefer_num(acc.change_percent, next.change_percent);
    acc.market_cap = prefer_num(acc.market_cap, next.market_cap);
    acc.high_52w = prefer_num(acc.high_52w, next.high_52w);
    acc.low_52w = prefer_num(acc.low_52w, next.low_52w);
    acc.ytd_return_percent = prefer_num(acc.ytd_return_percent, next.ytd_return_percent);
    if !is_well_formed_string(Some(&acc.currency)) {
        acc.currency = next.currency.clone();
    }
}

/// Per-metric triples chosen atomically; scalar fields accumulator-priority;
/// `period` recoarsened across every contributing provider.
pub fn merge_fundamentals(acc: &mut FundamentalsData, next: &FundamentalsData) {
    let take_if_better = |acc_metric: &mut finlink_core::MetricValue, next_metric: &finlink_core::MetricValue| {
        if !acc_metric.is_well_formed() && next_metric.is_well_formed() {
            *acc_metric = *next_metric;
        }
    };

    take_if_better(&mut acc.metrics.revenue, &next.metrics.revenue);
    take_if_better(&mut acc.metrics.net_income, &next.metrics.net_income);
    take_if_better(&mut acc.metrics.gross_margin_pct, &next.metrics.gross_margin_pct);
    take_if_better(&mut acc.metrics.debt_to_equity, &next.metrics.debt_to_equity);
    take_if_better(&mut acc.metrics.roe_pct, &next.metrics.roe_pct);
    take_if_better(&mut acc.metrics.operating_margin_pct, &next.metrics.operating_margin_pct);
    take_if_better(&mut acc.metrics.free_cash_flow, &next.metrics.free_cash_flow);

    acc.market_cap = prefer_num(acc.market_cap, next.market_cap);
    acc.sector = prefer_str(acc.sector.clone(), next.sector.clone());
    acc.headquarters = prefer_str(acc.headquarters.clone(), next.headquarters.clone());
    acc.website = prefer_str(acc.website.clone(), next.website.clone());
    acc.icon_url = prefer_str(acc.icon_url.clone(), next.icon_url.clone());
    acc.fiscal_period_end = prefer_str(acc.fiscal_period_end.clone(), next.fiscal_period_end.clone());

    if !acc.analyst_ratings.has_any_finite() && next.analyst_ratings.has_any_finite() {
        acc.analyst_ratings = next.analyst_ratings.clone();
    }

    acc.period = MetricPeriod::coarsen(acc.period, next.period);
}

fn filing_key(f: &finlink_core::FilingEntry) -> (String, String, String, String) {
    (
        f.accession_number.clone().unwrap_or_default(),
        f.url.clone(),
        f.form.clone(),
        f.filing_date.clone(),
    )
}

/// Union, dedup, sort `filingDate` desc, truncate to `max(limit,1)`.
pub fn merge_filings(acc: &mut FilingsData, next: &FilingsData, limit: usize) {
    acc.filings.extend(next.filings.iter().cloned());

    let mut seen = HashSet::new();
    acc.filings.retain(|f| seen.insert(filing_key(f)));
    acc.filings.sort_by(|a, b| b.filing_date.cmp(&a.filing_date));
    acc.filings.truncate(limit.max(1));
}

fn insider_key(e: &finlink_core::InsiderEntry) -> (String, String, String, String, String, finlink_core::TransactionType) {
    (
        e.owner.clone(),
        e.date.clone(),
        e.shares.to_string(),
        e.shares_change.to_string(),
        e.security.clone(),
        e.transaction_type,
    )
}

/// Union, dedup, truncate to `max(limit,1)*5`; `ownershipChange` recomputed;
/// `summary` preserved from the first provider that supplied one.
pub fn merge_insider(acc: &mut InsiderData, next: &InsiderData, limit: usize) {
    acc.entries.extend(next.entries.iter().cloned());

    let mut seen = HashSet::new();
    acc.entries.retain(|e| seen.insert(insider_key(e)));
    acc.entries.truncate(limit.max(1) * 5);

    acc.ownership_change = acc.entries.iter().map(|e| e.shares_change).sum();

    if acc.summary.is_none() {
        acc.summary = next.summary.clone();
    }
}

fn news_key(n: &finlink_core::NewsItem) -> (String, String, String) {
    (n.url.clone(), n.title.clone(), n.published_at.to_rfc3339())
}

/// Union, dedup, sort `publishedAt` desc, truncate to `max(limit,1)`.
pub fn merge_news(acc: &mut NewsData, next: &NewsData, limit: usize) {
    acc.items.extend(next.items.iter().cloned());

    let mut seen = HashSet::new();
    acc.items.retain(|n| seen.insert(news_key(n)));
    acc.items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    acc.items.truncate(limit.max(1));
}

/// Dispatches to the per-intent merge function. Both `acc` and `next` must
/// carry the same intent variant (callers guarantee this: the federation
/// engine never mixes payload shapes for one query).
pub fn merge_finance_data(acc: &mut FinanceData, next: &FinanceData, limit: usize) {
    match (acc, next) {
        (FinanceData::Quote(a), FinanceData::Quote(b)) => merge_quote(a, b),
        (FinanceData::Fundamentals(a), FinanceData::Fundamentals(b)) => merge_fundamentals(a, b),
        (FinanceData::Filings(a), FinanceData::Filings(b)) => merge_filings(a, b, limit),
        (FinanceData::Insider(a), FinanceData::Insider(b)) => merge_insider(a, b, limit),
        (FinanceData::News(a), FinanceData::News(b)) => merge_news(a, b, limit),
        _ => unreachable!("merge called across mismatched intents"),
    }
}

/// The completeness oracle, dispatched over the payload variant.
pub fn is_complete(data: &FinanceData, limit: usize) -> bool {
    match data {
        FinanceData::Quote(q) => q.is_complete(),
        FinanceData::Fundamentals(f) => f.is_complete(),
        FinanceData::Filings(f) => f.is_complete(limit),
        FinanceData::Insider(i) => i.is_complete(),
        FinanceData::News(n) => n.is_complete(limit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finlink_core::{MetricDerivation, MetricValue};

    #[test]
    fn quote_merge_prefers_accumulator_when_well_formed() {
        let mut acc = QuoteData::empty("AAPL");
        acc.price = Some(100.0);
        let mut next = QuoteData::empty("AAPL");
        next.price = Some(200.0);
        next.market_cap = Some(3_000_000.0);

        merge_quote(&mut acc, &next);
        assert_eq!(acc.price, Some(100.0));
        assert_eq!(acc.market_cap, Some(3_000_000.0));
    }

    #[test]
    fn fundamentals_metric_triple_chosen_atomically() {
        let mut acc = FundamentalsData::empty("AAPL");
        let mut next = FundamentalsData::empty("AAPL");
        next.metrics.revenue = MetricValue { value: Some(100.0), period: MetricPeriod::Fy, derivation: MetricDerivation::Reported };

        merge_fundamentals(&mut acc, &next);
        assert_eq!(acc.metrics.revenue.value, Some(100.0));
        assert_eq!(acc.metrics.revenue.period, MetricPeriod::Fy);
    }

    #[test]
    fn fundamentals_rejects_placeholder_sector() {
        let mut acc = FundamentalsData::empty("AAPL");
        acc.sector = Some("unknown".to_string());
        let mut next = FundamentalsData::empty("AAPL");
        next.sector = Some("Technology".to_string());

        merge_fundamentals(&mut acc, &next);
        assert_eq!(acc.sector.as_deref(), Some("Technology"));
    }
}
