use crate::types::{HistoricalRun, PersistenceTrend};

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Computes the persistence trend for one current-run identity against its
/// prior runs. `prior_runs` need not be
/// pre-sorted; this sorts by `run_id` ascending internally so the most
/// recent prior run is the one adjacent to the current run.
pub fn compute_persistence(identity: &str, prior_runs: &[HistoricalRun]) -> PersistenceTrend {
    let mut ordered: Vec<&HistoricalRun> = prior_runs.iter().collect();
    ordered.sort_by(|a, b| a.run_id.cmp(&b.run_id));

    let runs_seen_excluding_current = ordered.iter().filter(|r| r.identities.contains(identity)).count() as u32;

    let mut streak: u32 = 1; // current run always counts toward its own streak
    for run in ordered.iter().rev() {
        if run.identities.contains(identity) {
            streak += 1;
        } else {
            break;
        }
    }

    let total_runs_including_current = ordered.len() as u32 + 1;
    let runs_seen_including_current = runs_seen_excluding_current + 1;

    PersistenceTrend {
        consecutive_run_streak: streak,
        runs_seen_including_current,
        total_runs_including_current,
        persistence_ratio: round4(runs_seen_including_current as f64 / total_runs_including_current as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn run(run_id: &str, identities: &[&str]) -> HistoricalRun {
        HistoricalRun {
            run_id: run_id.to_string(),
            identities: identities.iter().map(|s| s.to_string()).collect::<HashSet<_>>(),
        }
    }

    #[test]
    fn unbroken_streak_counts_current_plus_trailing_prior_runs() {
        let priors = vec![run("2025-01-01", &["a"]), run("2025-01-02", &["a"]), run("2025-01-03", &["a"])];
        let trend = compute_persistence("a", &priors);
        assert_eq!(trend.consecutive_run_streak, 4);
        assert_eq!(trend.runs_seen_including_current, 4);
        assert_eq!(trend.total_runs_including_current, 4);
        assert_eq!(trend.persistence_ratio, 1.0);
    }

    #[test]
    fn streak_breaks_at_first_gap_working_backward() {
        let priors = vec![run("2025-01-01", &["a"]), run("2025-01-02", &[]), run("2025-01-03", &["a"])];
        let trend = compute_persistence("a", &priors);
        // current + 2025-01-03 is an unbroken suffix; 2025-01-02 breaks it.
        assert_eq!(trend.consecutive_run_streak, 2);
        // but it was still seen in 2 of the 3 prior runs, plus current.
        assert_eq!(trend.runs_seen_including_current, 3);
        assert_eq!(trend.persistence_ratio, 0.75);
    }

    #[test]
    fn never_seen_identity_has_streak_of_one_and_minimal_ratio() {
        let priors = vec![run("2025-01-01", &["b"]), run("2025-01-02", &["b"])];
        let trend = compute_persistence("a", &priors);
        assert_eq!(trend.consecutive_run_streak, 1);
        assert_eq!(trend.runs_seen_including_current, 1);
        assert_eq!(trend.total_runs_including_current, 3);
        assert_eq!(trend.persistence_ratio, 0.3333);
    }

    #[test]
    fn no_prior_runs_is_a_trivial_streak_of_one() {
        let trend = compute_persistence("a", &[]);
        assert_eq!(trend.consecutive_run_streak, 1);
        assert_eq!(trend.total_runs_including_current, 1);
        assert_eq!(trend.persistence_ratio, 1.0);
    }
}
