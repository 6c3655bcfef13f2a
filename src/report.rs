//! Output side of a batch: CSV export, terminal table, top-1 distribution.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::batch::BatchRow;

pub const DEFAULT_FILE_STEM: &str = "classified_websites";

const BAR_WIDTH: usize = 40;

/// One CSV line; field names are the column headers.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
struct CsvRecord {
    url: String,
    top_1_code: String,
    top_2_code: String,
    top_3_code: String,
}

impl From<&BatchRow> for CsvRecord {
    fn from(row: &BatchRow) -> Self {
        Self {
            url: row.url.clone(),
            top_1_code: row.result.top_1.clone(),
            top_2_code: row.result.top_2.clone(),
            top_3_code: row.result.top_3.clone(),
        }
    }
}

/// Header row plus one line per row, no index column.
pub fn to_csv(rows: &[BatchRow]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if rows.is_empty() {
        writer.write_record(["url", "top_1_code", "top_2_code", "top_3_code"])?;
    }
    for row in rows {
        writer.serialize(CsvRecord::from(row))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV: {}", e))?;
    String::from_utf8(bytes).context("CSV output was not UTF-8")
}

/// Export name: blank → default stem, `.csv` appended unless already there.
pub fn csv_file_name(name: &str) -> String {
    let name = name.trim();
    let name = if name.is_empty() { DEFAULT_FILE_STEM } else { name };
    if name.to_lowercase().ends_with(".csv") {
        name.to_string()
    } else {
        format!("{}.csv", name)
    }
}

/// Count of each non-empty `top_1` value, most frequent first (ties keep
/// first-seen order). `None` when no row has a `top_1` value.
pub fn top1_distribution(rows: &[BatchRow]) -> Option<Vec<(String, usize)>> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for row in rows {
        let code = row.result.top_1.as_str();
        if code.is_empty() {
            continue;
        }
        match counts.iter_mut().find(|(c, _)| c == code) {
            Some((_, n)) => *n += 1,
            None => counts.push((code.to_string(), 1)),
        }
    }
    if counts.is_empty() {
        return None;
    }
    // stable sort keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    Some(counts)
}

pub fn print_table(rows: &[BatchRow], limit: usize) {
    println!(
        "{:>3} | {:<40} | {:<24} | {:<24} | {:<24}",
        "#", "URL", "Top 1", "Top 2", "Top 3"
    );
    println!("{}", "-".repeat(128));

    for (i, row) in rows.iter().take(limit).enumerate() {
        let [t1, t2, t3] = row.result.slots();
        println!(
            "{:>3} | {:<40} | {:<24} | {:<24} | {:<24}",
            i + 1,
            truncate(&row.url, 40),
            truncate(t1, 24),
            truncate(t2, 24),
            truncate(t3, 24),
        );
    }
    if rows.len() > limit {
        println!("... {} more rows in the CSV", rows.len() - limit);
    }
}

pub fn print_distribution(distribution: &[(String, usize)]) {
    let total: usize = distribution.iter().map(|(_, n)| n).sum();
    let max = distribution.iter().map(|(_, n)| *n).max().unwrap_or(1);

    println!("--- Top-1 Code Distribution ---");
    for (code, n) in distribution {
        let share = *n as f64 * 100.0 / total as f64;
        let bar = "#".repeat((n * BAR_WIDTH).div_ceil(max));
        println!("{:<32} {:>5} {:>5.1}%  {}", truncate(code, 32), n, share, bar);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
