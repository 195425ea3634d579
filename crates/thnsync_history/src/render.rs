//! Human-readable history output.

use std::fmt::Write;

use serde_json::Value;

use crate::model::HistoryReport;

/// Renders a report for interactive use. The JSON form is the stable one.
pub fn render_history_text(report: &HistoryReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "THN Sync History ({})", report.status);
    let _ = writeln!(out, "Scaffold: {}", report.scaffold_root);
    let _ = writeln!(out, "TXLOG:    {}", report.txlog_dir);
    let _ = writeln!(
        out,
        "Count:    {}{}",
        report.count,
        if report.truncated { " (truncated)" } else { "" }
    );
    out.push('\n');

    if report.history.is_empty() {
        let notes: Vec<&str> = report
            .notes
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .collect();
        if notes.is_empty() {
            out.push_str("- No history entries found.\n");
        }
        for note in notes {
            let _ = writeln!(out, "- {note}");
        }
        return out.trim_end().to_string();
    }

    for tx in &report.history {
        let _ = writeln!(out, "tx_id:     {}", tx.tx_id);
        for (label, value) in [
            ("op:       ", &tx.op),
            ("target:   ", &tx.target),
            ("started:  ", &tx.started_at),
            ("ended:    ", &tx.ended_at),
        ] {
            if !value.is_empty() {
                let _ = writeln!(out, "{label} {value}");
            }
        }
        let _ = writeln!(out, "outcome:   {}", tx.outcome.as_str());
        let _ = writeln!(out, "integrity: {}", tx.integrity.as_str());
        if !tx.reason.trim().is_empty() {
            let _ = writeln!(out, "reason:    {}", tx.reason.trim());
        }
        if !tx.summary.is_empty() {
            out.push_str("summary:\n");
            // serde_json::Map iterates in key order.
            for (key, value) in &tx.summary {
                let rendered = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                let _ = writeln!(out, "  - {key}: {rendered}");
            }
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}
