//! CSV export of the filtered player table and the team tables, and
//! reading an exported player file back.

use crate::error::Result;
use crate::models::{RawTable, Season, SeasonTable, TeamTable, PLAYER_STAT_COLUMNS};
use crate::scraper::cleaner::{clean_player_rows, player_rows_to_raw, team_rows_to_raw};
use chrono::NaiveDateTime;
use std::path::Path;
use tracing::{info, warn};

fn raw_to_csv(raw: &RawTable) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(&raw.headers)?;
    for row in &raw.rows {
        writer.write_record(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()).into())
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Serialize a season table as CSV bytes (header row, then one row per stint).
/// Missing stats are written as `NaN`.
pub fn to_csv(table: &SeasonTable) -> Result<Vec<u8>> {
    raw_to_csv(&player_rows_to_raw(table))
}

pub fn write_csv(table: &SeasonTable, path: &Path) -> Result<usize> {
    write_file(path, &to_csv(table)?)?;
    info!("Wrote {} rows to {}", table.rows.len(), path.display());
    Ok(table.rows.len())
}

pub fn write_team_csv(table: &TeamTable, path: &Path) -> Result<usize> {
    write_file(path, &raw_to_csv(&team_rows_to_raw(table))?)?;
    info!("Wrote {} {} rows to {}", table.rows.len(), table.kind.title(), path.display());
    Ok(table.rows.len())
}

/// Parse CSV produced by [`to_csv`] back into a season table, running it
/// through the same cleaning as a scraped page.
pub fn from_csv(bytes: &[u8], season: Season, fetched_at: NaiveDateTime) -> Result<SeasonTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let width = headers.len();

    let mut rows = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("CSV row {}: {}", i + 1, e);
                continue;
            }
        };
        let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
        cells.resize(width, String::new());
        rows.push(cells);
    }

    let (table, _) = clean_player_rows(
        &RawTable { headers, rows },
        PLAYER_STAT_COLUMNS,
        season,
        fetched_at,
    )?;
    Ok(table)
}

/// Load an exported player file. The file's modification time stands in
/// for the fetch time.
pub fn read_csv(path: &Path, season: Season) -> Result<SeasonTable> {
    let bytes = std::fs::read(path)?;
    let modified = std::fs::metadata(path)?.modified()?;
    let fetched_at = chrono::DateTime::<chrono::Utc>::from(modified).naive_utc();
    from_csv(&bytes, season, fetched_at)
}
