use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the five canonical query intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Quote,
    Fundamentals,
    Filings,
    Insider,
    News,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Quote => "quote",
            Intent::Fundamentals => "fundamentals",
            Intent::Filings => "filings",
            Intent::Insider => "insider",
            Intent::News => "news",
        }
    }

    /// TTL in seconds for this intent's cache entries.
    pub fn cache_ttl_secs(&self) -> i64 {
        match self {
            Intent::Quote => 300,
            Intent::Fundamentals => 3600,
            Intent::Filings => 43_200,
            Intent::Insider => 43_200,
            Intent::News => 600,
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coverage policy: first-success vs. union-merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coverage {
    #[default]
    Default,
    Comprehensive,
}

/// A single `{publisher, domain, url}` attribution entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attribution {
    pub publisher: String,
    pub domain: String,
    pub url: String,
}

/// Metric provenance: which fiscal period it was reported/derived for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricPeriod {
    #[serde(rename = "TTM")]
    Ttm,
    #[serde(rename = "FY")]
    Fy,
    #[serde(rename = "Q")]
    Q,
    Unknown,
}

impl MetricPeriod {
    /// Ordering used to recoarsen merged periods: TTM > FY > Q > Unknown.
    fn rank(&self) -> u8 {
        match self {
            MetricPeriod::Ttm => 3,
            MetricPeriod::Fy => 2,
            MetricPeriod::Q => 1,
            MetricPeriod::Unknown => 0,
        }
    }

    pub fn coarsen(a: MetricPeriod, b: MetricPeriod) -> MetricPeriod {
        if a.rank() >= b.rank() {
            a
        } else {
            b
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricDerivation {
    Reported,
    Derived,
}

/// A single fundamentals metric as a merge-friendly 3-tuple:
/// `{value, period, derivation}` chosen atomically, never field-by-field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MetricValue {
    pub value: Option<f64>,
    pub period: MetricPeriod,
    pub derivation: MetricDerivation,
}

impl MetricValue {
    pub fn absent() -> Self {
        Self {
            value: None,
            period: MetricPeriod::Unknown,
            derivation: MetricDerivation::Reported,
        }
    }

    pub fn is_well_formed(&self) -> bool {
        self.value.is_some_and(f64::is_finite)
    }
}

impl Default for MetricValue {
    fn default() -> Self {
        Self::absent()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FundamentalsMetrics {
    pub revenue: MetricValue,
    pub net_income: MetricValue,
    pub gross_margin_pct: MetricValue,
    pub debt_to_equity: MetricValue,
    pub roe_pct: MetricValue,
    pub operating_margin_pct: MetricValue,
    pub free_cash_flow: MetricValue,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalystRatings {
    pub strong_buy: Option<f64>,
    pub buy: Option<f64>,
    pub hold: Option<f64>,
    pub sell: Option<f64>,
    pub strong_sell: Option<f64>,
}

impl AnalystRatings {
    pub fn has_any_finite(&self) -> bool {
        [self.strong_buy, self.buy, self.hold, self.sell, self.strong_sell]
            .iter()
            .any(|v| v.is_some_and(|x| x.is_finite()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteData {
    pub symbol: String,
    pub price: Option<f64>,
    pub currency: String,
    pub previous_close: Option<f64>,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
    pub market_cap: Option<f64>,
    #[serde(rename = "52wHigh")]
    pub high_52w: Option<f64>,
    #[serde(rename = "52wLow")]
    pub low_52w: Option<f64>,
    pub ytd_return_percent: Option<f64>,
}

impl QuoteData {
    pub fn empty(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            price: None,
            currency: "USD".to_string(),
            previous_close: None,
            change: None,
            change_percent: None,
            market_cap: None,
            high_52w: None,
            low_52w: None,
            ytd_return_percent: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        [
            self.price,
            self.previous_close,
            self.change_percent,
            self.market_cap,
            self.high_52w,
            self.low_52w,
            self.ytd_return_percent,
        ]
        .iter()
        .all(|v| v.is_some_and(f64::is_finite))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundamentalsData {
    pub symbol: String,
    pub metrics: FundamentalsMetrics,
    pub fiscal_period_end: Option<String>,
    pub market_cap: Option<f64>,
    pub sector: Option<String>,
    pub headquarters: Option<String>,
    pub website: Option<String>,
    pub icon_url: Option<String>,
    pub analyst_ratings: AnalystRatings,
    pub period: MetricPeriod,
}

impl FundamentalsData {
    pub fn empty(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            metrics: FundamentalsMetrics::default(),
            fiscal_period_end: None,
            market_cap: None,
            sector: None,
            headquarters: None,
            website: None,
            icon_url: None,
            analyst_ratings: AnalystRatings::default(),
            period: MetricPeriod::Unknown,
        }
    }

    pub fn is_complete(&self) -> bool {
        let m = &self.metrics;
        m.revenue.is_well_formed()
            && m.net_income.is_well_formed()
            && m.gross_margin_pct.is_well_formed()
            && m.debt_to_equity.is_well_formed()
            && m.free_cash_flow.is_well_formed()
            && self.market_cap.is_some_and(f64::is_finite)
            && is_well_formed_string(self.sector.as_deref())
            && is_well_formed_string(self.headquarters.as_deref())
            && self.analyst_ratings.has_any_finite()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilingEntry {
    pub form: String,
    pub accession_number: Option<String>,
    pub filing_date: String,
    pub report_date: Option<String>,
    pub url: String,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilingsData {
    pub symbol: String,
    pub filings: Vec<FilingEntry>,
}

impl FilingsData {
    pub fn empty(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            filings: Vec::new(),
        }
    }

    pub fn is_complete(&self, limit: usize) -> bool {
        self.filings.len() >= limit.min(5)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Buy,
    Sell,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsiderEntry {
    pub owner: String,
    pub date: String,
    pub shares: f64,
    pub shares_change: f64,
    pub transaction_type: TransactionType,
    pub security: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsiderSummary {
    pub source: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsiderData {
    pub symbol: String,
    pub ownership_change: f64,
    pub entries: Vec<InsiderEntry>,
    pub summary: Option<InsiderSummary>,
}

impl InsiderData {
    pub fn empty(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            ownership_change: 0.0,
            entries: Vec::new(),
            summary: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.entries.is_empty() || self.summary.as_ref().is_some_and(|s| !s.text.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub url: String,
    pub summary: Option<String>,
    pub sentiment: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsData {
    pub symbol: String,
    pub items: Vec<NewsItem>,
}

impl NewsData {
    pub fn empty(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            items: Vec::new(),
        }
    }

    pub fn is_complete(&self, limit: usize) -> bool {
        self.items.len() >= limit.min(3)
    }
}

/// The `data` payload of a `FinanceResult`, one variant per intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "lowercase")]
pub enum FinanceData {
    Quote(QuoteData),
    Fundamentals(FundamentalsData),
    Filings(FilingsData),
    Insider(InsiderData),
    News(NewsData),
}

impl FinanceData {
    pub fn empty(intent: Intent, symbol: &str) -> Self {
        match intent {
            Intent::Quote => FinanceData::Quote(QuoteData::empty(symbol)),
            Intent::Fundamentals => FinanceData::Fundamentals(FundamentalsData::empty(symbol)),
            Intent::Filings => FinanceData::Filings(FilingsData::empty(symbol)),
            Intent::Insider => FinanceData::Insider(InsiderData::empty(symbol)),
            Intent::News => FinanceData::News(NewsData::empty(symbol)),
        }
    }

    pub fn intent(&self) -> Intent {
        match self {
            FinanceData::Quote(_) => Intent::Quote,
            FinanceData::Fundamentals(_) => Intent::Fundamentals,
            FinanceData::Filings(_) => Intent::Filings,
            FinanceData::Insider(_) => Intent::Insider,
            FinanceData::News(_) => Intent::News,
        }
    }
}

/// The top-level finance envelope returned to every caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinanceResult {
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub attribution: Vec<Attribution>,
    pub data: FinanceData,
    pub errors: Vec<String>,
}

impl FinanceResult {
    pub fn empty(intent: Intent, symbol: &str) -> Self {
        Self {
            source: "none".to_string(),
            timestamp: Utc::now(),
            attribution: Vec::new(),
            data: FinanceData::empty(intent, symbol),
            errors: vec!["No finance providers available".to_string()],
        }
    }

    pub fn dedupe_attribution(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.attribution.retain(|a| seen.insert(a.clone()));
    }
}

/// Well-formedness for strings: non-empty and not matching
/// `^(unknown|n/?a|-|none)$` case-insensitively.
pub fn is_well_formed_string(value: Option<&str>) -> bool {
    match value {
        None => false,
        Some(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return false;
            }
            let lowered = trimmed.to_lowercase();
            !matches!(lowered.as_str(), "unknown" | "n/a" | "na" | "-" | "none")
        }
    }
}

/// A normalized, fully-resolved query ready for federation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedQuery {
    pub intent: Intent,
    pub ticker: String,
    pub form: Option<String>,
    pub coverage: Coverage,
    pub limit: u32,
    pub refresh: bool,
    pub source_override: Option<String>,
}

impl NormalizedQuery {
    /// Cache key: `${TICKER}:${intent}:${coverage|default}:${source|auto}:${form|""}:${limit}`.
    pub fn cache_key(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}:{}",
            self.ticker,
            self.intent,
            match self.coverage {
                Coverage::Default => "default",
                Coverage::Comprehensive => "comprehensive",
            },
            self.source_override.as_deref().unwrap_or("auto"),
            self.form.as_deref().unwrap_or(""),
            self.limit
        )
    }
}
