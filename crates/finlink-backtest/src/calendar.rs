use chrono::NaiveDate;
use std::collections::BTreeSet;

use finlink_core::WorkflowError;

use crate::types::PriceBar;

/// Ordered set of dates observed across one or more loaded price series.
/// Calendar operations never invent a session that wasn't actually observed.
#[derive(Debug, Clone)]
pub struct TradingCalendar {
    sessions: BTreeSet<NaiveDate>,
}

impl TradingCalendar {
    pub fn from_bars<'a>(series: impl IntoIterator<Item = &'a [PriceBar]>) -> Self {
        let mut sessions = BTreeSet::new();
        for bars in series {
            sessions.extend(bars.iter().map(|bar| bar.date));
        }
        Self { sessions }
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Returns the smallest observed session ≥ `date`, and whether it had to
    /// be shifted forward. Fails when `date` is beyond the loaded window.
    pub fn align_to_next_session(&self, date: NaiveDate) -> Result<(NaiveDate, bool), WorkflowError> {
        if let Some(&exact) = self.sessions.get(&date) {
            return Ok((exact, false));
        }
        match self.sessions.range(date..).next() {
            Some(&aligned) => Ok((aligned, true)),
            None => Err(WorkflowError::new(
                "ANCHOR_OUT_OF_RANGE",
                format!("anchor date {date} is beyond the loaded trading calendar"),
            )),
        }
    }

    /// Returns the date `k` observed trading sessions after `date`, where
    /// `date` is itself assumed to be an observed session (the caller should
    /// align first). `k == 0` returns `date` unchanged.
    pub fn offset_sessions(&self, date: NaiveDate, k: u32) -> Option<NaiveDate> {
        if k == 0 {
            return self.sessions.contains(&date).then_some(date);
        }
        self.sessions.range(date..).nth(k as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars(dates: &[&str]) -> Vec<PriceBar> {
        dates
            .iter()
            .enumerate()
            .map(|(i, d)| PriceBar {
                date: NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap(),
                adjusted_close: 100.0 + i as f64,
            })
            .collect()
    }

    #[test]
    fn next_session_alignment_shifts_to_smallest_session_ge_anchor() {
        let series = bars(&["2025-01-03", "2025-01-06", "2025-01-07"]);
        let calendar = TradingCalendar::from_bars([series.as_slice()]);
        let anchor = NaiveDate::parse_from_str("2025-01-04", "%Y-%m-%d").unwrap();

        let (aligned, shifted) = calendar.align_to_next_session(anchor).unwrap();
        assert_eq!(aligned, NaiveDate::parse_from_str("2025-01-06", "%Y-%m-%d").unwrap());
        assert!(shifted);
    }

    #[test]
    fn exact_session_match_is_not_shifted() {
        let series = bars(&["2025-01-03", "2025-01-06"]);
        let calendar = TradingCalendar::from_bars([series.as_slice()]);
        let anchor = NaiveDate::parse_from_str("2025-01-06", "%Y-%m-%d").unwrap();

        let (aligned, shifted) = calendar.align_to_next_session(anchor).unwrap();
        assert_eq!(aligned, anchor);
        assert!(!shifted);
    }

    #[test]
    fn anchor_beyond_loaded_window_fails() {
        let series = bars(&["2025-01-03", "2025-01-06"]);
        let calendar = TradingCalendar::from_bars([series.as_slice()]);
        let anchor = NaiveDate::parse_from_str("2025-02-01", "%Y-%m-%d").unwrap();

        let err = calendar.align_to_next_session(anchor).unwrap_err();
        assert_eq!(err.code, "ANCHOR_OUT_OF_RANGE");
    }

    #[test]
    fn offset_sessions_walks_forward_by_observed_sessions() {
        let series = bars(&["2025-01-03", "2025-01-06", "2025-01-07", "2025-01-08"]);
        let calendar = TradingCalendar::from_bars([series.as_slice()]);
        let anchor = NaiveDate::parse_from_str("2025-01-06", "%Y-%m-%d").unwrap();

        assert_eq!(calendar.offset_sessions(anchor, 0), Some(anchor));
        assert_eq!(
            calendar.offset_sessions(anchor, 2),
            Some(NaiveDate::parse_from_str("2025-01-08", "%Y-%m-%d").unwrap())
        );
        assert_eq!(calendar.offset_sessions(anchor, 5), None);
    }
}
