use crate::error::{ExplorerError, Result};
use crate::models::{
    PlayerLine, RawTable, Season, SeasonTable, StatColumn, StatLine, TeamLine, TeamTable,
    TeamTableKind, PLAYER_ID_COLUMNS,
};
use chrono::NaiveDateTime;
use tracing::{debug, warn};

/// Text written for a missing stat so that it survives a round trip.
pub const MISSING: &str = "NaN";

const LEAGUE_AVERAGE: &str = "League Average";

// ── Parsers ───────────────────────────────────────────────────────────────────

/// Coerce one numeric cell.
/// "" → 0.0 | "12.5" → 12.5 | ".456" → 0.456 | "NaN" / "DNP" → None
pub fn parse_stat(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return Some(0.0);
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn format_stat(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => MISSING.to_string(),
    }
}

/// Multi-team season totals: "TOT" on older pages, "2TM" / "3TM" on newer ones.
pub fn is_multi_team_total(team: &str) -> bool {
    let team = team.trim();
    if team == "TOT" {
        return true;
    }
    team.strip_suffix("TM")
        .map(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

pub fn is_league_average(team: &str) -> bool {
    team.contains(LEAGUE_AVERAGE)
}

/// The source repeats its header row every few data rows.
fn is_header_repeat(row: &[String], headers: &[String]) -> bool {
    let mut filled = row.iter().zip(headers).filter(|(cell, _)| !cell.is_empty()).peekable();
    filled.peek().is_some() && filled.all(|(cell, header)| cell == header)
}

// ── Shared cleaning ───────────────────────────────────────────────────────────

/// What the cleaner dropped or degraded while normalizing one table.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CleanReport {
    pub header_rows: usize,
    pub aggregate_rows: usize,
    pub blank_rows: usize,
    /// Cells that failed numeric coercion and are now missing.
    pub coercion_misses: usize,
}

/// Declared columns present in `raw`, in source order.
fn present_stat_columns(raw: &RawTable, declared: &[StatColumn]) -> Vec<(StatColumn, usize)> {
    let mut present: Vec<(StatColumn, usize)> = declared
        .iter()
        .filter_map(|&c| raw.column_index(c.header()).map(|i| (c, i)))
        .collect();
    present.sort_by_key(|&(_, i)| i);

    for c in declared {
        if !present.iter().any(|(p, _)| p == c) {
            warn!("Column {} not in source table, leaving it out", c);
        }
    }
    present
}

fn required_column(raw: &RawTable, names: &[&str]) -> Result<usize> {
    raw.column_index_any(names)
        .ok_or_else(|| ExplorerError::MissingColumn {
            column: names.join("/"),
        })
}

fn stat_line(row: &[String], columns: &[(StatColumn, usize)], report: &mut CleanReport) -> StatLine {
    let mut line = StatLine::new();
    for &(column, i) in columns {
        let raw = row.get(i).map(String::as_str).unwrap_or("");
        let value = parse_stat(raw);
        if value.is_none() {
            debug!("Cell {}={:?} is not numeric, keeping it as missing", column, raw);
        }
        line.set(column, value);
    }
    report.coercion_misses += line.missing_count();
    line
}

/// Body rows that are not header repeats.
fn data_rows<'a>(raw: &'a RawTable, report: &mut CleanReport) -> Vec<&'a Vec<String>> {
    let rows: Vec<&Vec<String>> = raw
        .rows
        .iter()
        .filter(|r| !is_header_repeat(r, &raw.headers))
        .collect();
    report.header_rows = raw.rows.len() - rows.len();
    rows
}

// ── Player table ──────────────────────────────────────────────────────────────

/// Normalize a raw per-game player table into a [`SeasonTable`].
///
/// Drops repeated header rows, the rank column, undeclared columns,
/// multi-team total rows and rows without a player or team. Declared stat
/// columns are coerced per cell; failures become missing values.
pub fn clean_player_rows(
    raw: &RawTable,
    declared: &[StatColumn],
    season: Season,
    fetched_at: NaiveDateTime,
) -> Result<(SeasonTable, CleanReport)> {
    let mut report = CleanReport::default();

    let player_idx = required_column(raw, &["Player"])?;
    let team_idx = required_column(raw, &["Tm", "Team"])?;
    let age_idx = raw.column_index("Age");
    let pos_idx = raw.column_index("Pos");
    let columns = present_stat_columns(raw, declared);

    let cell = |row: &Vec<String>, idx: Option<usize>| {
        idx.and_then(|i| row.get(i)).cloned().unwrap_or_default()
    };

    let mut rows = Vec::new();
    for row in data_rows(raw, &mut report) {
        let player = cell(row, Some(player_idx));
        let team = cell(row, Some(team_idx));

        if player.is_empty() || team.is_empty() {
            report.blank_rows += 1;
            continue;
        }
        if is_multi_team_total(&team) || is_league_average(&player) {
            report.aggregate_rows += 1;
            continue;
        }

        rows.push(PlayerLine {
            player,
            age: cell(row, age_idx),
            pos: cell(row, pos_idx),
            team,
            stats: stat_line(row, &columns, &mut report),
        });
    }

    debug!(
        "{}: {} player rows ({} header repeats, {} totals, {} blank, {} coercion misses)",
        season,
        rows.len(),
        report.header_rows,
        report.aggregate_rows,
        report.blank_rows,
        report.coercion_misses
    );

    let table = SeasonTable {
        season,
        fetched_at,
        columns: columns.into_iter().map(|(c, _)| c).collect(),
        rows,
    };
    Ok((table, report))
}

/// Text rendition of a season table in the source's column layout.
/// Feeding it back through [`clean_player_rows`] reproduces the table.
pub fn player_rows_to_raw(table: &SeasonTable) -> RawTable {
    let headers = PLAYER_ID_COLUMNS
        .iter()
        .map(|h| h.to_string())
        .chain(table.columns.iter().map(|c| c.header().to_string()))
        .collect();

    let rows = table
        .rows
        .iter()
        .map(|r| {
            [r.player.clone(), r.age.clone(), r.pos.clone(), r.team.clone()]
                .into_iter()
                .chain(table.columns.iter().map(|&c| format_stat(r.stats.get(c))))
                .collect()
        })
        .collect();

    RawTable { headers, rows }
}

// ── Team tables ───────────────────────────────────────────────────────────────

/// Normalize a raw team table, dropping the league-average row.
pub fn clean_team_rows(
    raw: &RawTable,
    declared: &[StatColumn],
    season: Season,
    kind: TeamTableKind,
    fetched_at: NaiveDateTime,
) -> Result<(TeamTable, CleanReport)> {
    let mut report = CleanReport::default();

    let team_idx = required_column(raw, &["Team", "Tm"])?;
    let columns = present_stat_columns(raw, declared);

    let mut rows = Vec::new();
    for row in data_rows(raw, &mut report) {
        let team = row.get(team_idx).cloned().unwrap_or_default();

        if team.is_empty() {
            report.blank_rows += 1;
            continue;
        }
        if is_league_average(&team) {
            report.aggregate_rows += 1;
            continue;
        }

        rows.push(TeamLine {
            team,
            stats: stat_line(row, &columns, &mut report),
        });
    }

    debug!(
        "{} {:?}: {} team rows ({} coercion misses)",
        season,
        kind,
        rows.len(),
        report.coercion_misses
    );

    let table = TeamTable {
        season,
        kind,
        fetched_at,
        columns: columns.into_iter().map(|(c, _)| c).collect(),
        rows,
    };
    Ok((table, report))
}

pub fn team_rows_to_raw(table: &TeamTable) -> RawTable {
    let headers = std::iter::once("Team".to_string())
        .chain(table.columns.iter().map(|c| c.header().to_string()))
        .collect();

    let rows = table
        .rows
        .iter()
        .map(|r| {
            std::iter::once(r.team.clone())
                .chain(table.columns.iter().map(|&c| format_stat(r.stats.get(c))))
                .collect()
        })
        .collect();

    RawTable { headers, rows }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PLAYER_STAT_COLUMNS, TEAM_STAT_COLUMNS};
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn raw(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    fn season() -> Season {
        Season::new(2023).unwrap()
    }

    fn player_page() -> RawTable {
        raw(
            &["Rk", "Player", "Age", "Pos", "Tm", "G", "FG%", "3P%", "PTS"],
            &[
                &["1", "Precious Achiuwa", "23", "C", "TOR", "55", ".485", ".269", "9.2"],
                &["2", "Patrick Beverley", "34", "PG", "TOT", "67", ".389", ".335", "6.2"],
                &["2", "Patrick Beverley", "34", "PG", "LAL", "45", ".399", ".335", "6.4"],
                &["2", "Patrick Beverley", "34", "PG", "CHI", "22", ".370", ".336", "5.7"],
                &["Rk", "Player", "Age", "Pos", "Tm", "G", "FG%", "3P%", "PTS"],
                &["3", "Steven Adams", "29", "C", "MEM", "42", ".597", "", "8.6"],
                &["4", "Chris Boucher", "30", "PF", "TOR", "76", ".493", "n/a", "9.4"],
                &["", "", "", "", "", "", "", "", ""],
            ],
        )
    }

    #[test]
    fn test_parse_stat() {
        assert_eq!(parse_stat(".485"), Some(0.485));
        assert_eq!(parse_stat(" 9.2 "), Some(9.2));
        assert_eq!(parse_stat(""), Some(0.0));
        assert_eq!(parse_stat("n/a"), None);
        assert_eq!(parse_stat("NaN"), None);
        assert_eq!(parse_stat("inf"), None);
    }

    #[test]
    fn test_multi_team_total() {
        assert!(is_multi_team_total("TOT"));
        assert!(is_multi_team_total("2TM"));
        assert!(is_multi_team_total("3TM"));
        assert!(!is_multi_team_total("TM"));
        assert!(!is_multi_team_total("TOR"));
    }

    #[test]
    fn test_clean_player_rows() {
        let (table, report) =
            clean_player_rows(&player_page(), PLAYER_STAT_COLUMNS, season(), now()).unwrap();

        let names: Vec<(&str, &str)> = table
            .rows
            .iter()
            .map(|r| (r.player.as_str(), r.team.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("Precious Achiuwa", "TOR"),
                ("Patrick Beverley", "LAL"),
                ("Patrick Beverley", "CHI"),
                ("Steven Adams", "MEM"),
                ("Chris Boucher", "TOR"),
            ]
        );

        assert_eq!(
            table.columns,
            vec![StatColumn::G, StatColumn::FgPct, StatColumn::ThreePPct, StatColumn::PTS]
        );
        assert_eq!(report.header_rows, 1);
        assert_eq!(report.aggregate_rows, 1);
        assert_eq!(report.blank_rows, 1);
        assert_eq!(report.coercion_misses, 1);

        // empty cell defaults to zero, garbage becomes missing
        assert_eq!(table.rows[3].stats.get(StatColumn::ThreePPct), Some(0.0));
        assert_eq!(table.rows[4].stats.get(StatColumn::ThreePPct), None);
        assert_eq!(table.rows[4].stats.get(StatColumn::PTS), Some(9.4));
        // identifiers stay text
        assert_eq!(table.rows[0].age, "23");
    }

    #[test]
    fn test_clean_player_rows_is_idempotent() {
        let (once, _) =
            clean_player_rows(&player_page(), PLAYER_STAT_COLUMNS, season(), now()).unwrap();
        let (twice, report) =
            clean_player_rows(&player_rows_to_raw(&once), PLAYER_STAT_COLUMNS, season(), now())
                .unwrap();
        assert_eq!(once, twice);
        assert_eq!(report.header_rows, 0);
        assert_eq!(report.aggregate_rows, 0);
    }

    #[test]
    fn test_newer_team_header_alias() {
        let page = raw(
            &["Rk", "Player", "Age", "Team", "Pos", "PTS", "Awards"],
            &[
                &["1", "Jalen Brunson", "27", "NYK", "PG", "28.7", "AS"],
                &["2", "Dennis Schröder", "30", "2TM", "PG", "13.1", ""],
            ],
        );
        let (table, _) = clean_player_rows(&page, PLAYER_STAT_COLUMNS, season(), now()).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].team, "NYK");
        assert_eq!(table.columns, vec![StatColumn::PTS]);
    }

    #[test]
    fn test_missing_player_column_is_parse_error() {
        let page = raw(&["Rk", "Name", "Tm"], &[&["1", "X", "AAA"]]);
        let err = clean_player_rows(&page, PLAYER_STAT_COLUMNS, season(), now()).unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_clean_team_rows_drops_league_average() {
        let page = raw(
            &["Rk", "Team", "G", "3P", "3P%"],
            &[
                &["1", "Golden State Warriors*", "82", "1363", ".385"],
                &["2", "Boston Celtics*", "82", "1315", ".377"],
                &["", "League Average", "82", "1017", ".361"],
            ],
        );
        let (table, report) =
            clean_team_rows(&page, TEAM_STAT_COLUMNS, season(), TeamTableKind::Totals, now())
                .unwrap();
        assert_eq!(table.rows.len(), 2);
        assert!(table.rows.iter().all(|r| !is_league_average(&r.team)));
        assert_eq!(report.aggregate_rows, 1);
        assert_eq!(table.rows[1].stats.get(StatColumn::ThreeP), Some(1315.0));

        let (again, _) = clean_team_rows(
            &team_rows_to_raw(&table),
            TEAM_STAT_COLUMNS,
            season(),
            TeamTableKind::Totals,
            now(),
        )
        .unwrap();
        assert_eq!(again, table);
    }
}
