//! `darkpool` subcommand: runs the off-exchange anomaly detector over one or
//! more tickers' locally-supplied raw rows, classifies transitions against
//! the most recent prior run found under the reports root, and persists an
//! `EvidenceDocument` plus human-readable reports.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use finlink_artifacts::{darkpool_layout as layout, EvidenceDocument};
use finlink_collab::{AlwaysAllow, SystemClock};
use finlink_core::CancelSignal;
use finlink_darkpool::{classify_transitions, compute_baseline, parse_dataset, score, AnomalyRecord, SeverityThresholds};

#[derive(Debug, Deserialize)]
struct DarkpoolScenario {
    metric_label: String,
    #[serde(default)]
    lookback_days: Option<u32>,
    #[serde(default)]
    min_samples: Option<u32>,
    #[serde(default)]
    significance: Option<f64>,
    rows_by_ticker: BTreeMap<String, Vec<Value>>,
}

fn flag_value(args: &[String], name: &str) -> Option<String> {
    args.iter().position(|a| a == name).and_then(|i| args.get(i + 1)).cloned()
}

pub async fn run(args: &[String]) -> anyhow::Result<()> {
    let dataset_path = flag_value(args, "--dataset").ok_or_else(|| anyhow::anyhow!("--dataset PATH is required"))?;
    let reports_root = PathBuf::from(flag_value(args, "--reports-root").unwrap_or_else(|| "reports".to_string()));
    let scope = flag_value(args, "--scope");
    let tier = flag_value(args, "--tier").unwrap_or_else(|| "public".to_string());
    let run_date = match flag_value(args, "--run-date") {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")?,
        None => chrono::Utc::now().date_naive(),
    };

    let raw = std::fs::read_to_string(&dataset_path)?;
    let scenario: DarkpoolScenario = serde_json::from_str(&raw)?;

    let lookback_days = scenario.lookback_days.unwrap_or(14);
    let min_samples = scenario.min_samples.unwrap_or(5);
    let significance = scenario.significance.unwrap_or(2.5);
    let thresholds = SeverityThresholds::from_significance(significance)?;

    let tickers: Vec<String> = scenario.rows_by_ticker.keys().cloned().collect();
    let scope_key = scope.unwrap_or_else(|| tickers.join("-").to_lowercase());

    let mut anomalies: Vec<AnomalyRecord> = Vec::new();
    for (ticker, rows) in &scenario.rows_by_ticker {
        let dataset = parse_dataset(rows, &scenario.metric_label)?;
        let baseline = compute_baseline(&dataset.observations, lookback_days as usize, min_samples as usize)?;
        anomalies.push(score(ticker, &dataset.metric_key, &dataset.metric_label, &baseline, &thresholds));
    }

    let output_root = layout::run_output_root(&reports_root, &scope_key, run_date);
    let previous = discover_previous_evidence(&reports_root, &scope_key, &output_root)?;
    let previous_anomalies = previous.as_ref().map(|doc| doc.anomalies.clone()).unwrap_or_default();
    let transitions = classify_transitions(&anomalies, &previous_anomalies);

    let historical: Vec<String> = previous
        .as_ref()
        .map(|doc| doc.historical.iter().cloned().chain(std::iter::once(output_root.display().to_string())).collect())
        .unwrap_or_default();

    let evidence = EvidenceDocument {
        generated_at: chrono::Utc::now(),
        mode: "default".to_string(),
        tier,
        lookback_days,
        min_samples,
        threshold: significance,
        tickers: tickers.clone(),
        anomalies: anomalies.clone(),
        transitions: transitions.clone(),
        historical,
    };

    let mut files = BTreeMap::new();
    files.insert(
        layout::ASSUMPTIONS_JSON.to_string(),
        serde_json::to_string_pretty(&serde_json::json!({
            "tickers": tickers,
            "metric_label": scenario.metric_label,
            "lookback_days": lookback_days,
            "min_samples": min_samples,
            "significance": significance,
        }))?,
    );
    files.insert(layout::EVIDENCE_JSON.to_string(), serde_json::to_string_pretty(&evidence)?);
    files.insert(layout::EVIDENCE_MD.to_string(), render_evidence_md(&transitions));
    files.insert(layout::REPORT_MD.to_string(), render_report_md(&scope_key, run_date, &anomalies));
    files.insert(layout::DASHBOARD_MD.to_string(), render_dashboard_md(&transitions));

    finlink_artifacts::write_artifacts(&output_root, &files, &AlwaysAllow, &SystemClock, &CancelSignal::never()).await?;

    println!("wrote {} to {}", files.len(), output_root.display());
    println!("{}", serde_json::to_string_pretty(&evidence)?);
    Ok(())
}

/// Scans `reports_root/<scope>/<date>/darkpool-anomaly/evidence.json` for the
/// most recently generated run other than the one about to be written.
fn discover_previous_evidence(reports_root: &Path, scope: &str, exclude: &Path) -> anyhow::Result<Option<EvidenceDocument>> {
    let scope_root = reports_root.join(scope);
    if !scope_root.is_dir() {
        return Ok(None);
    }

    let mut best: Option<EvidenceDocument> = None;
    for entry in std::fs::read_dir(&scope_root)? {
        let entry = entry?;
        let dir = entry.path().join("darkpool-anomaly");
        if dir == *exclude || !dir.is_dir() {
            continue;
        }
        let evidence_path = dir.join(layout::EVIDENCE_JSON);
        if !evidence_path.is_file() {
            continue;
        }
        let raw = std::fs::read_to_string(&evidence_path)?;
        let doc: EvidenceDocument = serde_json::from_str(&raw)?;
        match &best {
            Some(current) if current.generated_at >= doc.generated_at => {}
            _ => best = Some(doc),
        }
    }
    Ok(best)
}

fn render_report_md(scope: &str, run_date: NaiveDate, anomalies: &[AnomalyRecord]) -> String {
    let mut out = format!("# Off-exchange anomaly scan: {scope}\n\nRun date: {run_date}\n\n");
    out.push_str("| ticker | metric | z | direction | severity | significant |\n");
    out.push_str("|---|---|---|---|---|---|\n");
    for anomaly in anomalies {
        out.push_str(&format!(
            "| {} | {} | {:.2} | {:?} | {:?} | {} |\n",
            anomaly.ticker, anomaly.metric_label, anomaly.z_score, anomaly.direction, anomaly.severity, anomaly.significant
        ));
    }
    out
}

fn render_dashboard_md(transitions: &[finlink_darkpool::TransitionRecord]) -> String {
    let new_count = transitions.iter().filter(|t| t.state == finlink_darkpool::TransitionState::New).count();
    let resolved_count = transitions.iter().filter(|t| t.state == finlink_darkpool::TransitionState::Resolved).count();
    format!("# Dashboard\n\n{new_count} new anomalies, {resolved_count} resolved since the prior run.\n")
}

fn render_evidence_md(transitions: &[finlink_darkpool::TransitionRecord]) -> String {
    let mut out = String::from("# Evidence\n\n");
    for transition in transitions {
        out.push_str(&format!("- {}: {:?}\n", transition.key, transition.state));
    }
    out
}
