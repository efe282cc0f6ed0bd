use std::fmt::Write as _;
use std::time::Instant;
use tracing::info;

use crate::models::RawTable;

/// A simple wall-clock timer for logging elapsed time.
pub struct Timer {
    label: String,
    start: Instant,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        let label = label.into();
        info!("⏱  Starting: {}", label);
        Self {
            label,
            start: Instant::now(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        info!(
            "⏱  Finished: {} (took {:.2?})",
            self.label,
            self.start.elapsed()
        );
    }
}

/// Format a stat for display: at most three decimals, trailing zeros trimmed.
/// Missing values print as "—".
pub fn fmt_stat(value: Option<f64>) -> String {
    let Some(v) = value else {
        return "—".to_string();
    };
    let s = format!("{:.3}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

/// Render a table with left-aligned, space-padded columns.
pub fn render_table(table: &RawTable) -> String {
    let mut widths: Vec<usize> = table.headers.iter().map(|h| h.chars().count()).collect();
    for row in &table.rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let mut line = |cells: &[String]| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{:<w$}", c, w = w))
            .collect();
        let _ = writeln!(out, "{}", padded.join("  ").trim_end());
    };

    line(&table.headers);
    line(&widths.iter().map(|&w| "─".repeat(w)).collect::<Vec<_>>());
    for row in &table.rows {
        line(row);
    }
    out
}

/// Horizontal bar scaled against `max`, `width` cells at full length.
pub fn bar(value: Option<f64>, max: f64, width: usize) -> String {
    match value {
        Some(v) if max > 0.0 && v > 0.0 => {
            let len = ((v / max) * width as f64).round() as usize;
            "█".repeat(len.clamp(1, width))
        }
        _ => String::new(),
    }
}
