use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ExplorerError;

// ── Season ────────────────────────────────────────────────────────────────────

pub const FIRST_SEASON: u16 = 1950;
pub const LAST_SEASON: u16 = 2023;

/// A season year in the supported range (1950–2023 inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Season(u16);

impl Season {
    pub fn new(year: u16) -> Result<Self, ExplorerError> {
        if (FIRST_SEASON..=LAST_SEASON).contains(&year) {
            Ok(Self(year))
        } else {
            Err(ExplorerError::InvalidSeason(year))
        }
    }

    pub fn latest() -> Self {
        Self(LAST_SEASON)
    }

    pub fn year(self) -> u16 {
        self.0
    }

    /// Every selectable season, newest first.
    pub fn all() -> impl Iterator<Item = Season> {
        (FIRST_SEASON..=LAST_SEASON).rev().map(Season)
    }
}

impl TryFrom<u16> for Season {
    type Error = ExplorerError;

    fn try_from(year: u16) -> Result<Self, Self::Error> {
        Season::new(year)
    }
}

impl From<Season> for u16 {
    fn from(season: Season) -> u16 {
        season.0
    }
}

impl FromStr for Season {
    type Err = ExplorerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let year: u16 = s
            .trim()
            .parse()
            .map_err(|_| ExplorerError::NotASeason(s.trim().to_string()))?;
        Season::new(year)
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Position ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Position {
    C,
    PF,
    SF,
    PG,
    SG,
}

impl Position {
    pub const ALL: [Position; 5] = [
        Position::C,
        Position::PF,
        Position::SF,
        Position::PG,
        Position::SG,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Position::C => "C",
            Position::PF => "PF",
            Position::SF => "SF",
            Position::PG => "PG",
            Position::SG => "SG",
        }
    }

    /// Split a raw position cell ("SG-PG", "C") into known positions.
    /// Legacy codes such as "G" or "F" have no counterpart and are skipped.
    pub fn parse_list(raw: &str) -> Vec<Position> {
        raw.split('-').filter_map(|p| p.parse().ok()).collect()
    }
}

impl FromStr for Position {
    type Err = ExplorerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "C" => Ok(Position::C),
            "PF" => Ok(Position::PF),
            "SF" => Ok(Position::SF),
            "PG" => Ok(Position::PG),
            "SG" => Ok(Position::SG),
            other => Err(ExplorerError::UnknownPosition(other.to_string())),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ── Stat columns ──────────────────────────────────────────────────────────────

/// Numeric statistic columns as they appear in basketball-reference headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StatColumn {
    G,
    GS,
    MP,
    FG,
    FGA,
    FgPct,
    ThreeP,
    ThreePA,
    ThreePPct,
    TwoP,
    TwoPA,
    TwoPPct,
    EfgPct,
    FT,
    FTA,
    FtPct,
    ORB,
    DRB,
    TRB,
    AST,
    STL,
    BLK,
    TOV,
    PF,
    PTS,
}

impl StatColumn {
    pub const ALL: [StatColumn; 25] = [
        StatColumn::G,
        StatColumn::GS,
        StatColumn::MP,
        StatColumn::FG,
        StatColumn::FGA,
        StatColumn::FgPct,
        StatColumn::ThreeP,
        StatColumn::ThreePA,
        StatColumn::ThreePPct,
        StatColumn::TwoP,
        StatColumn::TwoPA,
        StatColumn::TwoPPct,
        StatColumn::EfgPct,
        StatColumn::FT,
        StatColumn::FTA,
        StatColumn::FtPct,
        StatColumn::ORB,
        StatColumn::DRB,
        StatColumn::TRB,
        StatColumn::AST,
        StatColumn::STL,
        StatColumn::BLK,
        StatColumn::TOV,
        StatColumn::PF,
        StatColumn::PTS,
    ];

    /// Header text used by the source tables.
    pub fn header(self) -> &'static str {
        match self {
            StatColumn::G => "G",
            StatColumn::GS => "GS",
            StatColumn::MP => "MP",
            StatColumn::FG => "FG",
            StatColumn::FGA => "FGA",
            StatColumn::FgPct => "FG%",
            StatColumn::ThreeP => "3P",
            StatColumn::ThreePA => "3PA",
            StatColumn::ThreePPct => "3P%",
            StatColumn::TwoP => "2P",
            StatColumn::TwoPA => "2PA",
            StatColumn::TwoPPct => "2P%",
            StatColumn::EfgPct => "eFG%",
            StatColumn::FT => "FT",
            StatColumn::FTA => "FTA",
            StatColumn::FtPct => "FT%",
            StatColumn::ORB => "ORB",
            StatColumn::DRB => "DRB",
            StatColumn::TRB => "TRB",
            StatColumn::AST => "AST",
            StatColumn::STL => "STL",
            StatColumn::BLK => "BLK",
            StatColumn::TOV => "TOV",
            StatColumn::PF => "PF",
            StatColumn::PTS => "PTS",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            StatColumn::G => "Games",
            StatColumn::GS => "Games Started",
            StatColumn::MP => "Minutes Played",
            StatColumn::FG => "Field Goals",
            StatColumn::FGA => "Field Goal Attempts",
            StatColumn::FgPct => "Field Goal Percentage",
            StatColumn::ThreeP => "3-Point Field Goals",
            StatColumn::ThreePA => "3-Point Field Goal Attempts",
            StatColumn::ThreePPct => "3-Point Field Goal Percentage",
            StatColumn::TwoP => "2-Point Field Goals",
            StatColumn::TwoPA => "2-Point Field Goal Attempts",
            StatColumn::TwoPPct => "2-Point Field Goal Percentage",
            StatColumn::EfgPct => "Effective Field Goal Percentage",
            StatColumn::FT => "Free Throws",
            StatColumn::FTA => "Free Throw Attempts",
            StatColumn::FtPct => "Free Throw Percentage",
            StatColumn::ORB => "Offensive Rebounds",
            StatColumn::DRB => "Defensive Rebounds",
            StatColumn::TRB => "Total Rebounds",
            StatColumn::AST => "Assists",
            StatColumn::STL => "Steals",
            StatColumn::BLK => "Blocks",
            StatColumn::TOV => "Turnovers",
            StatColumn::PF => "Personal Fouls",
            StatColumn::PTS => "Points",
        }
    }

    pub fn from_header(header: &str) -> Option<StatColumn> {
        let header = header.trim();
        StatColumn::ALL.into_iter().find(|c| c.header() == header)
    }
}

/// Columns coerced to numbers in the per-game player table.
pub const PLAYER_STAT_COLUMNS: &[StatColumn] = &StatColumn::ALL;

/// Columns coerced to numbers in the team totals / per-game tables.
/// Team tables carry neither games started nor effective FG%.
pub const TEAM_STAT_COLUMNS: &[StatColumn] = &[
    StatColumn::G,
    StatColumn::MP,
    StatColumn::FG,
    StatColumn::FGA,
    StatColumn::FgPct,
    StatColumn::ThreeP,
    StatColumn::ThreePA,
    StatColumn::ThreePPct,
    StatColumn::TwoP,
    StatColumn::TwoPA,
    StatColumn::TwoPPct,
    StatColumn::FT,
    StatColumn::FTA,
    StatColumn::FtPct,
    StatColumn::ORB,
    StatColumn::DRB,
    StatColumn::TRB,
    StatColumn::AST,
    StatColumn::STL,
    StatColumn::BLK,
    StatColumn::TOV,
    StatColumn::PF,
    StatColumn::PTS,
];

impl FromStr for StatColumn {
    type Err = ExplorerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatColumn::from_header(s)
            .or_else(|| {
                // Accept case-insensitive spellings on the command line ("pts", "efg%")
                StatColumn::ALL
                    .into_iter()
                    .find(|c| c.header().eq_ignore_ascii_case(s.trim()))
            })
            .ok_or_else(|| ExplorerError::UnknownColumn(s.to_string()))
    }
}

impl TryFrom<String> for StatColumn {
    type Error = ExplorerError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<StatColumn> for String {
    fn from(c: StatColumn) -> String {
        c.header().to_string()
    }
}

impl fmt::Display for StatColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

// ── Stat line ─────────────────────────────────────────────────────────────────

/// Numeric cells of one row. `None` marks a cell that failed coercion,
/// kept distinct from a genuine zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatLine(BTreeMap<StatColumn, Option<f64>>);

impl StatLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: StatColumn, value: Option<f64>) {
        self.0.insert(column, value);
    }

    /// Value of `column`, or `None` when the cell is missing or the column absent.
    pub fn get(&self, column: StatColumn) -> Option<f64> {
        self.0.get(&column).copied().flatten()
    }

    pub fn missing_count(&self) -> usize {
        self.0.values().filter(|v| v.is_none()).count()
    }
}

// ── Rows ──────────────────────────────────────────────────────────────────────

/// One player-team stint in a season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerLine {
    pub player: String,
    pub age: String,
    pub pos: String,
    pub team: String,
    pub stats: StatLine,
}

impl PlayerLine {
    pub fn positions(&self) -> Vec<Position> {
        Position::parse_list(&self.pos)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamLine {
    pub team: String,
    pub stats: StatLine,
}

/// Identifier a row can be grouped or labelled by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupKey {
    Team,
    Player,
    Position,
}

impl FromStr for GroupKey {
    type Err = ExplorerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "team" | "tm" => Ok(GroupKey::Team),
            "player" => Ok(GroupKey::Player),
            "pos" | "position" => Ok(GroupKey::Position),
            other => Err(ExplorerError::UnknownColumn(other.to_string())),
        }
    }
}

/// A row with identifier fields and a stat line.
pub trait StatRecord {
    fn key(&self, key: GroupKey) -> Option<&str>;
    fn stats(&self) -> &StatLine;
}

impl StatRecord for PlayerLine {
    fn key(&self, key: GroupKey) -> Option<&str> {
        match key {
            GroupKey::Team => Some(&self.team),
            GroupKey::Player => Some(&self.player),
            GroupKey::Position => Some(&self.pos),
        }
    }

    fn stats(&self) -> &StatLine {
        &self.stats
    }
}

impl StatRecord for TeamLine {
    fn key(&self, key: GroupKey) -> Option<&str> {
        match key {
            GroupKey::Team => Some(&self.team),
            GroupKey::Player | GroupKey::Position => None,
        }
    }

    fn stats(&self) -> &StatLine {
        &self.stats
    }
}

// ── Tables ────────────────────────────────────────────────────────────────────

/// Per-player-per-team statistics for one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonTable {
    pub season: Season,
    pub fetched_at: NaiveDateTime,
    /// Stat columns present in the source, in source order.
    pub columns: Vec<StatColumn>,
    pub rows: Vec<PlayerLine>,
}

impl SeasonTable {
    /// Sorted unique team codes.
    pub fn team_codes(&self) -> Vec<String> {
        let mut teams: Vec<String> = self.rows.iter().map(|r| r.team.clone()).collect();
        teams.sort();
        teams.dedup();
        teams
    }

    /// Unique player names in table order.
    pub fn player_names(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.rows
            .iter()
            .filter(|r| seen.insert(r.player.as_str()))
            .map(|r| r.player.clone())
            .collect()
    }

    /// Same season and schema, different rows.
    pub fn with_rows(&self, rows: Vec<PlayerLine>) -> SeasonTable {
        SeasonTable {
            season: self.season,
            fetched_at: self.fetched_at,
            columns: self.columns.clone(),
            rows,
        }
    }

    /// (rows, columns), counting the four identifier columns.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows.len(), PLAYER_ID_COLUMNS.len() + self.columns.len())
    }
}

pub const PLAYER_ID_COLUMNS: [&str; 4] = ["Player", "Age", "Pos", "Tm"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamTableKind {
    Totals,
    PerGame,
}

impl TeamTableKind {
    pub fn title(self) -> &'static str {
        match self {
            TeamTableKind::Totals => "Total Team Stats",
            TeamTableKind::PerGame => "Per Game Team Stats",
        }
    }
}

impl FromStr for TeamTableKind {
    type Err = ExplorerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "totals" | "total" => Ok(TeamTableKind::Totals),
            "per-game" | "per_game" | "pergame" => Ok(TeamTableKind::PerGame),
            other => Err(ExplorerError::UnknownColumn(other.to_string())),
        }
    }
}

/// Per-team statistics for one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamTable {
    pub season: Season,
    pub kind: TeamTableKind,
    pub fetched_at: NaiveDateTime,
    pub columns: Vec<StatColumn>,
    pub rows: Vec<TeamLine>,
}

/// Both team tables of a season summary page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamTables {
    pub totals: TeamTable,
    pub per_game: TeamTable,
}

impl TeamTables {
    pub fn get(&self, kind: TeamTableKind) -> &TeamTable {
        match kind {
            TeamTableKind::Totals => &self.totals,
            TeamTableKind::PerGame => &self.per_game,
        }
    }
}

// ── Raw extraction ────────────────────────────────────────────────────────────

/// Where a table sits in a page: a DOM id or its position among all tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TableLocator {
    Id(String),
    Index(usize),
}

impl FromStr for TableLocator {
    type Err = ExplorerError;

    /// "#totals-team" or "totals-team" → Id, "0" → Index.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ExplorerError::InvalidLocator(s.to_string()));
        }
        if let Ok(i) = s.parse::<usize>() {
            return Ok(TableLocator::Index(i));
        }
        let id = s.trim_start_matches('#');
        if id.is_empty() || id.contains(char::is_whitespace) {
            return Err(ExplorerError::InvalidLocator(s.to_string()));
        }
        Ok(TableLocator::Id(id.to_string()))
    }
}

impl TryFrom<String> for TableLocator {
    type Error = ExplorerError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TableLocator> for String {
    fn from(l: TableLocator) -> String {
        match l {
            TableLocator::Id(id) => format!("#{}", id),
            TableLocator::Index(i) => i.to_string(),
        }
    }
}

impl fmt::Display for TableLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableLocator::Id(id) => write!(f, "#{}", id),
            TableLocator::Index(i) => write!(f, "table[{}]", i),
        }
    }
}

/// A table as text: ordered headers plus one cell per header in every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// First header among `names` present in the table.
    pub fn column_index_any(&self, names: &[&str]) -> Option<usize> {
        names.iter().find_map(|n| self.column_index(n))
    }
}
