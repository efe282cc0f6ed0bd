//! Interaction orchestrator: controls → cached fetch → filter → views.
//!
//! Each call to [`Explorer::render`] is one interaction cycle. It re-runs
//! every stage from the current controls; the only state carried between
//! cycles is the per-season result cache. A failed fetch or parse ends the
//! cycle with an error and leaves the cache as it was.

use crate::analysis::{ChartView, Selection, Series};
use crate::cache::ResultCache;
use crate::config::AppConfig;
use crate::error::Result;
use crate::models::{PlayerLine, Season, SeasonTable, TeamTableKind, TeamTables};
use crate::scraper::{player_slug, source_from_config, StatsScraper};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Everything the user can change between interactions.
#[derive(Debug, Clone, PartialEq)]
pub struct Controls {
    pub season: Season,
    pub selection: Selection,
    pub view: ChartView,
    pub team_table: TeamTableKind,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            season: Season::latest(),
            selection: Selection::all(),
            view: ChartView::TeamPoints,
            team_table: TeamTableKind::Totals,
        }
    }
}

/// Output of one interaction, ready for a presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub season: Season,
    /// Team codes offered for selection (all teams of the season).
    pub team_choices: Vec<String>,
    /// Player names offered for selection (players left after filtering
    /// by team and position).
    pub player_choices: Vec<String>,
    pub filtered: SeasonTable,
    pub title: String,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerProfile {
    pub name: String,
    pub rows: Vec<PlayerLine>,
    pub slug: Option<String>,
    pub profile_url: Option<String>,
    pub headshot_url: Option<String>,
}

pub struct Explorer {
    scraper: StatsScraper,
    base_url: String,
    top_n: usize,
    players: ResultCache<Season, SeasonTable>,
    teams: ResultCache<Season, TeamTables>,
}

impl Explorer {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let source = source_from_config(&config.scraper)?;
        Ok(Self::with_scraper(
            StatsScraper::new(source, config.tables.clone()),
            &config.scraper.base_url,
            config.explore.top_n,
        ))
    }

    pub fn with_scraper(scraper: StatsScraper, base_url: &str, top_n: usize) -> Self {
        Self {
            scraper,
            base_url: base_url.trim_end_matches('/').to_string(),
            top_n,
            players: ResultCache::new(),
            teams: ResultCache::new(),
        }
    }

    pub async fn season_table(&mut self, season: Season) -> Result<Arc<SeasonTable>> {
        let scraper = &self.scraper;
        self.players
            .get_or_try_load(season, || scraper.fetch_season_table(season))
            .await
    }

    pub async fn team_tables(&mut self, season: Season) -> Result<Arc<TeamTables>> {
        let scraper = &self.scraper;
        self.teams
            .get_or_try_load(season, || scraper.fetch_team_tables(season))
            .await
    }

    /// Run one interaction cycle for `controls`.
    pub async fn render(&mut self, controls: &Controls) -> Result<Dashboard> {
        let table = self.season_table(controls.season).await?;

        let team_choices = table.team_codes();
        let choosable = Selection {
            players: None,
            ..controls.selection.clone()
        }
        .apply(&table);
        let filtered = controls.selection.apply(&table);

        let teams = if controls.view.needs_team_table() {
            Some(self.team_tables(controls.season).await?)
        } else {
            None
        };

        let series = controls.view.series(
            &filtered,
            controls.selection.players.as_deref(),
            teams.as_deref().map(|t| &t.totals),
            self.top_n,
        );

        let (rows, cols) = filtered.dimensions();
        info!(
            "{} {:?}: {} rows × {} columns, {} series",
            controls.season,
            controls.view,
            rows,
            cols,
            series.len()
        );

        Ok(Dashboard {
            season: controls.season,
            team_choices,
            player_choices: choosable.player_names(),
            title: controls.view.title(controls.season),
            filtered,
            series,
        })
    }

    /// Rows of one player plus links to their site profile and headshot.
    pub async fn profile(&mut self, season: Season, name: &str) -> Result<PlayerProfile> {
        let table = self.season_table(season).await?;
        let rows: Vec<PlayerLine> = table
            .rows
            .iter()
            .filter(|r| r.player == name)
            .cloned()
            .collect();

        let slug = player_slug(name);
        let profile_url = slug.as_ref().and_then(|s| {
            s.chars()
                .next()
                .map(|initial| format!("{}/players/{}/{}.html", self.base_url, initial, s))
        });
        let headshot_url = slug
            .as_ref()
            .map(|s| format!("{}/req/202106291/images/headshots/{}.jpg", self.base_url, s));

        Ok(PlayerProfile {
            name: name.to_string(),
            rows,
            slug,
            profile_url,
            headshot_url,
        })
    }

    /// (cached seasons, hits, misses) across both caches.
    pub fn cache_stats(&self) -> (usize, u64, u64) {
        let (ph, pm) = self.players.stats();
        let (th, tm) = self.teams.stats();
        (self.players.len() + self.teams.len(), ph + th, pm + tm)
    }

    pub fn clear_cache(&mut self) {
        self.players.clear();
        self.teams.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TableConfig;
    use crate::models::{Position, StatColumn};
    use crate::scraper::tests::{fixture, FixturePages};

    fn explorer() -> (Explorer, Arc<FixturePages>) {
        let pages = fixture();
        let scraper = StatsScraper::new(Box::new(Arc::clone(&pages)), TableConfig::default());
        (
            Explorer::with_scraper(scraper, "https://www.basketball-reference.com/", 10),
            pages,
        )
    }

    fn season(year: u16) -> Season {
        Season::new(year).unwrap()
    }

    #[test]
    fn test_render_team_points() {
        let (mut explorer, _) = explorer();
        let dash = tokio_test::block_on(explorer.render(&Controls {
            season: season(2023),
            ..Controls::default()
        }))
        .unwrap();

        assert_eq!(dash.team_choices, vec!["BOS", "DEN", "GSW", "LAC", "LAL"]);
        assert_eq!(dash.filtered.rows.len(), 8);
        assert_eq!(dash.series.len(), 1);
        // BOS 30.1 + 26.6, LAL 28.9 + 15.9, GSW 29.4 + 8.5, DEN 24.5, LAC 15.8
        assert_eq!(dash.series[0].categories(), vec!["BOS", "LAL", "GSW", "DEN", "LAC"]);
    }

    #[test]
    fn test_each_season_fetched_once() {
        let (mut explorer, pages) = explorer();
        let mut controls = Controls {
            season: season(2023),
            ..Controls::default()
        };

        tokio_test::block_on(explorer.render(&controls)).unwrap();
        controls.selection = Selection::all().teams(["GSW"]);
        tokio_test::block_on(explorer.render(&controls)).unwrap();
        controls.view = ChartView::TeamThreePointers;
        tokio_test::block_on(explorer.render(&controls)).unwrap();
        tokio_test::block_on(explorer.render(&controls)).unwrap();

        // one player page, one summary page
        assert_eq!(pages.fetch_count(), 2);
        assert_eq!(explorer.cache_stats(), (2, 4, 2));

        explorer.clear_cache();
        tokio_test::block_on(explorer.render(&controls)).unwrap();
        assert_eq!(pages.fetch_count(), 4);
    }

    #[test]
    fn test_render_three_pointers() {
        let (mut explorer, _) = explorer();
        let dash = tokio_test::block_on(explorer.render(&Controls {
            season: season(2023),
            view: ChartView::TeamThreePointers,
            ..Controls::default()
        }))
        .unwrap();

        assert_eq!(dash.series.len(), 2);
        assert_eq!(
            dash.series[0].categories(),
            vec!["Golden State Warriors*", "Boston Celtics*", "Sacramento Kings*"]
        );
        assert_eq!(dash.series[1].label, StatColumn::ThreePPct.header());
    }

    #[test]
    fn test_player_comparison_and_choices() {
        let (mut explorer, _) = explorer();
        let controls = Controls {
            season: season(2023),
            selection: Selection::all()
                .teams(["GSW", "LAL"])
                .positions([Position::PG, Position::C])
                .players(["Draymond Green", "Stephen Curry"]),
            view: ChartView::PlayerOffence,
            ..Controls::default()
        };
        let dash = tokio_test::block_on(explorer.render(&controls)).unwrap();

        assert_eq!(
            dash.player_choices,
            vec!["Russell Westbrook", "Stephen Curry", "Draymond Green"]
        );
        assert_eq!(dash.filtered.rows.len(), 2);
        assert_eq!(dash.series.len(), 5);
        assert_eq!(dash.series[0].label, "3P%");
        assert_eq!(
            dash.series[0].points,
            vec![
                ("Draymond Green".to_string(), Some(0.305)),
                ("Stephen Curry".to_string(), Some(0.427)),
            ]
        );
    }

    #[test]
    fn test_failed_season_leaves_cache_intact() {
        let (mut explorer, _) = explorer();
        tokio_test::block_on(explorer.season_table(season(2023))).unwrap();

        let err = tokio_test::block_on(explorer.render(&Controls {
            season: season(2022),
            ..Controls::default()
        }))
        .unwrap_err();
        assert!(err.is_parse());
        assert_eq!(explorer.cache_stats().0, 1);

        let err = tokio_test::block_on(explorer.team_tables(season(2010))).unwrap_err();
        assert!(err.is_network());
    }

    #[test]
    fn test_profile() {
        let (mut explorer, _) = explorer();
        let profile =
            tokio_test::block_on(explorer.profile(season(2023), "Russell Westbrook")).unwrap();

        assert_eq!(profile.rows.len(), 2);
        assert_eq!(profile.slug.as_deref(), Some("westbru01"));
        assert_eq!(
            profile.profile_url.as_deref(),
            Some("https://www.basketball-reference.com/players/w/westbru01.html")
        );
        assert_eq!(
            profile.headshot_url.as_deref(),
            Some("https://www.basketball-reference.com/req/202106291/images/headshots/westbru01.jpg")
        );
    }
}
