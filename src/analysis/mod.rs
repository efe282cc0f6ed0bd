//! Filtering, ranking and reshaping of normalized tables.
//!
//! Every function here is pure: it reads a table and returns a new view.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use crate::models::{
    GroupKey, PlayerLine, Position, SeasonTable, StatColumn, StatRecord, TeamTable,
};

// ── Filter ────────────────────────────────────────────────────────────────────

/// Inclusion predicates. `None` leaves a category unfiltered; a present set
/// keeps rows matching any member. Categories combine with AND. Players are
/// kept in pick order, which the player comparison views follow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub teams: Option<BTreeSet<String>>,
    pub positions: Option<BTreeSet<Position>>,
    pub players: Option<Vec<String>>,
}

impl Selection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn teams<I, S>(mut self, teams: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.teams = Some(teams.into_iter().map(Into::into).collect());
        self
    }

    pub fn positions(mut self, positions: impl IntoIterator<Item = Position>) -> Self {
        self.positions = Some(positions.into_iter().collect());
        self
    }

    pub fn players<I, S>(mut self, players: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut picked: Vec<String> = Vec::new();
        for name in players.into_iter().map(Into::into) {
            if !picked.contains(&name) {
                picked.push(name);
            }
        }
        self.players = Some(picked);
        self
    }

    /// A position cell like "PF-C" matches when any of its parts is selected.
    pub fn matches(&self, row: &PlayerLine) -> bool {
        if let Some(teams) = &self.teams {
            if !teams.contains(&row.team) {
                return false;
            }
        }
        if let Some(positions) = &self.positions {
            if !row.positions().iter().any(|p| positions.contains(p)) {
                return false;
            }
        }
        if let Some(players) = &self.players {
            if !players.contains(&row.player) {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, table: &SeasonTable) -> SeasonTable {
        let rows = table
            .rows
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect();
        table.with_rows(rows)
    }
}

// ── Ranking ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum Direction {
    /// Highest values first (top-N)
    #[value(alias = "desc", alias = "top")]
    Descending,
    /// Lowest values first (bottom-N)
    #[value(alias = "asc", alias = "bottom")]
    Ascending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTotal {
    pub key: String,
    /// `None` when every cell in the group was missing.
    pub value: Option<f64>,
}

/// Sum `column` per group and keep the first `n` groups in `direction`.
///
/// Groups appear in order of first occurrence and the sort is stable, so
/// ties keep that order. Missing cells add nothing; an all-missing group
/// sorts after every valued group in either direction. Rows without the
/// key are skipped.
pub fn rank_groups<R: StatRecord>(
    rows: &[R],
    key: GroupKey,
    column: StatColumn,
    direction: Direction,
    n: usize,
) -> Vec<GroupTotal> {
    let mut groups: Vec<GroupTotal> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for row in rows {
        let Some(k) = row.key(key) else { continue };
        let i = *index.entry(k).or_insert_with(|| {
            groups.push(GroupTotal {
                key: k.to_string(),
                value: None,
            });
            groups.len() - 1
        });

        if let Some(v) = row.stats().get(column) {
            let total = groups[i].value.get_or_insert(0.0);
            *total += v;
        }
    }

    groups.sort_by(|a, b| compare_totals(a.value, b.value, direction));
    groups.truncate(n);
    groups
}

fn compare_totals(a: Option<f64>, b: Option<f64>, direction: Direction) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match direction {
            Direction::Descending => b.total_cmp(&a),
            Direction::Ascending => a.total_cmp(&b),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// ── Reshape ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongRow {
    pub entity: String,
    pub column: StatColumn,
    pub value: Option<f64>,
}

/// Pivot to long form: one row per (entity, column, value), all rows for
/// the first column before the next. No aggregation.
pub fn melt<R: StatRecord>(rows: &[R], key: GroupKey, columns: &[StatColumn]) -> Vec<LongRow> {
    columns
        .iter()
        .flat_map(move |&column| {
            rows.iter().filter_map(move |row| {
                row.key(key).map(|entity| LongRow {
                    entity: entity.to_string(),
                    column,
                    value: row.stats().get(column),
                })
            })
        })
        .collect()
}

// ── Views ─────────────────────────────────────────────────────────────────────

/// A labelled sequence of (category, value) points ready to plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub label: String,
    pub points: Vec<(String, Option<f64>)>,
}

impl Series {
    pub fn from_totals(label: impl Into<String>, totals: Vec<GroupTotal>) -> Self {
        Self {
            label: label.into(),
            points: totals.into_iter().map(|t| (t.key, t.value)).collect(),
        }
    }

    pub fn categories(&self) -> Vec<&str> {
        self.points.iter().map(|(c, _)| c.as_str()).collect()
    }
}

pub const OFFENCE_COLUMNS: [StatColumn; 5] = [
    StatColumn::ThreePPct,
    StatColumn::TwoPPct,
    StatColumn::FtPct,
    StatColumn::FgPct,
    StatColumn::EfgPct,
];

pub const DEFENCE_COLUMNS: [StatColumn; 5] = [
    StatColumn::ORB,
    StatColumn::DRB,
    StatColumn::STL,
    StatColumn::BLK,
    StatColumn::PF,
];

/// Chart display modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum ChartView {
    /// Teams by total points scored by their (filtered) players
    TeamPoints,
    /// Teams by 3-pointers made and by 3-point percentage
    TeamThreePointers,
    /// Shooting percentages of the selected players
    PlayerOffence,
    /// Rebounds, steals, blocks and fouls of the selected players
    PlayerDefence,
}

impl ChartView {
    pub fn title(self, season: impl std::fmt::Display) -> String {
        match self {
            ChartView::TeamPoints => format!("Top Teams by Total Points Scored in {}", season),
            ChartView::TeamThreePointers => format!("Top Teams by 3-Point Field Goals in {}", season),
            ChartView::PlayerOffence => "Player Offence Statistics Comparison".to_string(),
            ChartView::PlayerDefence => "Player Defence Statistics Comparison".to_string(),
        }
    }

    pub fn needs_team_table(self) -> bool {
        matches!(self, ChartView::TeamThreePointers)
    }

    /// Build the series for this view.
    ///
    /// `players` is the already filtered season table and `picks` the
    /// selected player names in pick order; `teams` is the team totals table
    /// and is only read by [`ChartView::TeamThreePointers`].
    pub fn series(
        self,
        players: &SeasonTable,
        picks: Option<&[String]>,
        teams: Option<&TeamTable>,
        top_n: usize,
    ) -> Vec<Series> {
        match self {
            ChartView::TeamPoints => vec![Series::from_totals(
                StatColumn::PTS.header(),
                rank_groups(
                    &players.rows,
                    GroupKey::Team,
                    StatColumn::PTS,
                    Direction::Descending,
                    top_n,
                ),
            )],
            ChartView::TeamThreePointers => {
                let Some(teams) = teams else { return Vec::new() };
                [StatColumn::ThreeP, StatColumn::ThreePPct]
                    .into_iter()
                    .map(|column| {
                        Series::from_totals(
                            column.header(),
                            rank_groups(&teams.rows, GroupKey::Team, column, Direction::Descending, top_n),
                        )
                    })
                    .collect()
            }
            ChartView::PlayerOffence => player_series(players, picks, &OFFENCE_COLUMNS),
            ChartView::PlayerDefence => player_series(players, picks, &DEFENCE_COLUMNS),
        }
    }
}

/// One series per column, one point per row of `players`, via [`melt`].
/// Points follow `picks`; rows of unpicked players keep table order after them.
fn player_series(players: &SeasonTable, picks: Option<&[String]>, columns: &[StatColumn]) -> Vec<Series> {
    let mut rows = players.rows.clone();
    if let Some(picks) = picks {
        rows.sort_by_key(|r| picks.iter().position(|p| *p == r.player).unwrap_or(picks.len()));
    }
    let long = melt(&rows, GroupKey::Player, columns);
    columns
        .iter()
        .map(|&column| Series {
            label: column.header().to_string(),
            points: long
                .iter()
                .filter(|r| r.column == column)
                .map(|r| (r.entity.clone(), r.value))
                .collect(),
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Season, StatLine, TeamLine, TeamTableKind};
    use chrono::NaiveDate;

    fn player(name: &str, pos: &str, team: &str, pts: Option<f64>) -> PlayerLine {
        let mut stats = StatLine::new();
        stats.set(StatColumn::PTS, pts);
        stats.set(StatColumn::ORB, Some(1.0));
        PlayerLine {
            player: name.into(),
            age: "25".into(),
            pos: pos.into(),
            team: team.into(),
            stats,
        }
    }

    fn team(name: &str, pts: Option<f64>) -> TeamLine {
        let mut stats = StatLine::new();
        stats.set(StatColumn::PTS, pts);
        TeamLine {
            team: name.into(),
            stats,
        }
    }

    fn table(rows: Vec<PlayerLine>) -> SeasonTable {
        SeasonTable {
            season: Season::new(2023).unwrap(),
            fetched_at: NaiveDate::from_ymd_opt(2023, 6, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            columns: vec![StatColumn::ORB, StatColumn::PTS],
            rows,
        }
    }

    fn sample() -> SeasonTable {
        table(vec![
            player("A One", "PG", "BOS", Some(20.0)),
            player("B Two", "SG-PG", "LAL", Some(15.0)),
            player("C Three", "C", "BOS", Some(10.0)),
            player("D Four", "PF-C", "GSW", Some(8.0)),
            player("E Five", "G", "LAL", Some(30.0)),
        ])
    }

    #[test]
    fn test_top_two_keeps_tie_order() {
        let rows = vec![team("AAA", Some(50.0)), team("BBB", Some(80.0)), team("CCC", Some(80.0))];
        let top = rank_groups(&rows, GroupKey::Team, StatColumn::PTS, Direction::Descending, 2);
        let keys: Vec<&str> = top.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["BBB", "CCC"]);
    }

    #[test]
    fn test_rank_groups_sums_per_team() {
        let t = sample();
        let top = rank_groups(&t.rows, GroupKey::Team, StatColumn::PTS, Direction::Descending, 10);
        assert_eq!(
            top,
            vec![
                GroupTotal { key: "LAL".into(), value: Some(45.0) },
                GroupTotal { key: "BOS".into(), value: Some(30.0) },
                GroupTotal { key: "GSW".into(), value: Some(8.0) },
            ]
        );

        let bottom = rank_groups(&t.rows, GroupKey::Team, StatColumn::PTS, Direction::Ascending, 1);
        assert_eq!(bottom[0].key, "GSW");
    }

    #[test]
    fn test_oversized_n_returns_every_group_sorted() {
        let t = sample();
        for direction in [Direction::Ascending, Direction::Descending] {
            let all = rank_groups(&t.rows, GroupKey::Player, StatColumn::PTS, direction, 100);
            assert_eq!(all.len(), 5);
            let values: Vec<f64> = all.iter().filter_map(|g| g.value).collect();
            let sorted = values.windows(2).all(|w| match direction {
                Direction::Ascending => w[0] <= w[1],
                Direction::Descending => w[0] >= w[1],
            });
            assert!(sorted, "{direction:?}: {values:?}");
        }
    }

    #[test]
    fn test_missing_groups_sort_last() {
        let rows = vec![team("AAA", None), team("BBB", Some(1.0)), team("CCC", Some(2.0))];
        for direction in [Direction::Ascending, Direction::Descending] {
            let ranked = rank_groups(&rows, GroupKey::Team, StatColumn::PTS, direction, 3);
            assert_eq!(ranked[2], GroupTotal { key: "AAA".into(), value: None });
        }

        // a missing cell inside an otherwise valued group adds nothing
        let rows = vec![team("AAA", Some(3.0)), team("AAA", None)];
        let ranked = rank_groups(&rows, GroupKey::Team, StatColumn::PTS, Direction::Descending, 1);
        assert_eq!(ranked[0].value, Some(3.0));
    }

    #[test]
    fn test_rank_groups_empty_input() {
        let rows: Vec<TeamLine> = Vec::new();
        assert!(rank_groups(&rows, GroupKey::Team, StatColumn::PTS, Direction::Descending, 10).is_empty());
    }

    #[test]
    fn test_selection_and_across_or_within() {
        let t = sample();
        let view = Selection::all()
            .teams(["BOS", "LAL"])
            .positions([Position::PG])
            .apply(&t);
        let names: Vec<&str> = view.rows.iter().map(|r| r.player.as_str()).collect();
        assert_eq!(names, vec!["A One", "B Two"]);

        for row in &view.rows {
            assert!(t.rows.contains(row));
        }
    }

    #[test]
    fn test_selection_combo_positions_and_players() {
        let t = sample();
        let view = Selection::all().positions([Position::C]).apply(&t);
        assert_eq!(view.rows.len(), 2);

        let view = Selection::all()
            .players(["D Four", "E Five"])
            .teams(["LAL"])
            .apply(&t);
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].player, "E Five");
    }

    #[test]
    fn test_selection_empty_result() {
        let t = sample();
        let view = Selection::all().teams(Vec::<String>::new()).apply(&t);
        assert!(view.rows.is_empty());
        assert_eq!(view.columns, t.columns);

        assert_eq!(Selection::all().apply(&t), t);
    }

    #[test]
    fn test_melt_is_column_major() {
        let t = table(vec![
            player("A One", "PG", "BOS", Some(20.0)),
            player("B Two", "SG", "LAL", None),
        ]);
        let long = melt(&t.rows, GroupKey::Player, &[StatColumn::PTS, StatColumn::ORB]);
        let triples: Vec<(&str, StatColumn, Option<f64>)> = long
            .iter()
            .map(|r| (r.entity.as_str(), r.column, r.value))
            .collect();
        assert_eq!(
            triples,
            vec![
                ("A One", StatColumn::PTS, Some(20.0)),
                ("B Two", StatColumn::PTS, None),
                ("A One", StatColumn::ORB, Some(1.0)),
                ("B Two", StatColumn::ORB, Some(1.0)),
            ]
        );
    }

    #[test]
    fn test_views() {
        let t = sample();
        let series = ChartView::TeamPoints.series(&t, None, None, 2);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].categories(), vec!["LAL", "BOS"]);

        let defence = ChartView::PlayerDefence.series(&t, None, None, 10);
        assert_eq!(defence.len(), DEFENCE_COLUMNS.len());
        assert_eq!(defence[0].label, "ORB");
        assert_eq!(defence[0].points.len(), 5);
        assert_eq!(defence[1].points[0], ("A One".to_string(), None));

        assert!(ChartView::TeamThreePointers.series(&t, None, None, 10).is_empty());

        let teams = TeamTable {
            season: t.season,
            kind: TeamTableKind::Totals,
            fetched_at: t.fetched_at,
            columns: vec![StatColumn::PTS],
            rows: vec![team("X", Some(1.0)), team("Y", Some(2.0))],
        };
        let three = ChartView::TeamThreePointers.series(&t, None, Some(&teams), 10);
        assert_eq!(three.len(), 2);
        assert_eq!(three[0].label, "3P");
    }

    #[test]
    fn test_player_views_follow_pick_order() {
        let selection = Selection::all().players(["E Five", "A One", "E Five", "C Three"]);
        assert_eq!(
            selection.players.as_deref(),
            Some(&["E Five".to_string(), "A One".to_string(), "C Three".to_string()][..])
        );

        let picked = selection.apply(&sample());
        let names: Vec<&str> = picked.rows.iter().map(|r| r.player.as_str()).collect();
        assert_eq!(names, vec!["A One", "C Three", "E Five"]);

        let defence = ChartView::PlayerDefence.series(&picked, selection.players.as_deref(), None, 10);
        assert_eq!(defence[0].categories(), vec!["E Five", "A One", "C Three"]);
    }
}
