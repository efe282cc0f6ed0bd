pub mod cleaner;
pub mod http_client;
pub mod parsers;

use crate::config::{ScraperConfig, TableConfig};
use crate::error::{ExplorerError, Result};
use crate::models::{
    Season, SeasonTable, TeamTableKind, TeamTables, PLAYER_STAT_COLUMNS, TEAM_STAT_COLUMNS,
};
use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use tracing::{debug, info};
use url::Url;

use self::cleaner::{clean_player_rows, clean_team_rows};
use self::http_client::HttpClient;
use self::parsers::extract_table;

// ── Pages ─────────────────────────────────────────────────────────────────────

/// The two season pages the explorer reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    /// Per-game stats, one row per player-team stint.
    PlayerPerGame,
    /// Season summary carrying the team totals and per-game tables.
    SeasonSummary,
}

impl Page {
    /// e.g. 2023 → NBA_2023_per_game.html / NBA_2023.html
    pub fn file_name(self, season: Season) -> String {
        match self {
            Page::PlayerPerGame => format!("NBA_{}_per_game.html", season),
            Page::SeasonSummary => format!("NBA_{}.html", season),
        }
    }
}

// ── Source trait ──────────────────────────────────────────────────────────────

/// Swappable page source.
#[async_trait]
pub trait SeasonSource: Send + Sync {
    async fn fetch_page(&self, page: Page, season: Season) -> Result<String>;
}

// ── basketball-reference.com ──────────────────────────────────────────────────

pub struct BasketballReference {
    client: HttpClient,
    base_url: Url,
}

impl BasketballReference {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let base_url = Url::parse(&format!("{}/", config.base_url.trim_end_matches('/')))?;
        Ok(Self {
            client: HttpClient::new(config)?,
            base_url,
        })
    }

    pub fn page_url(&self, page: Page, season: Season) -> Result<Url> {
        Ok(self
            .base_url
            .join(&format!("leagues/{}", page.file_name(season)))?)
    }
}

#[async_trait]
impl SeasonSource for BasketballReference {
    async fn fetch_page(&self, page: Page, season: Season) -> Result<String> {
        let url = self.page_url(page, season)?;
        info!("Fetching {:?} for {} ({})", page, season, url);
        self.client.get_text(url.as_str()).await
    }
}

// ── Saved pages ───────────────────────────────────────────────────────────────

/// Pages previously saved under their site file names.
pub struct LocalPages {
    dir: PathBuf,
}

impl LocalPages {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl SeasonSource for LocalPages {
    async fn fetch_page(&self, page: Page, season: Season) -> Result<String> {
        let path = self.dir.join(page.file_name(season));
        debug!("Reading {:?} for {} from {}", page, season, path.display());

        match tokio::fs::read_to_string(&path).await {
            Ok(html) => Ok(html),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ExplorerError::PageMissing { path })
            }
            Err(e) => Err(e.into()),
        }
    }
}

// ── Player ids ────────────────────────────────────────────────────────────────

const NAME_SUFFIXES: [&str; 5] = ["jr", "sr", "ii", "iii", "iv"];

/// Site player id: first five letters of the surname, first two of the
/// given name, then "01". "LeBron James" → "jamesle01".
/// Generational suffixes are skipped; single-word names have no id.
pub fn player_slug(name: &str) -> Option<String> {
    let words: Vec<String> = name
        .split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_ascii_alphabetic())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|w| !w.is_empty() && !NAME_SUFFIXES.contains(&w.as_str()))
        .collect();

    let (first, last) = match words.as_slice() {
        [first, .., last] => (first, last),
        _ => return None,
    };

    let surname: String = last.chars().take(5).collect();
    let given: String = first.chars().take(2).collect();
    Some(format!("{}{}01", surname, given))
}

/// Pick the source the configuration asks for.
pub fn source_from_config(config: &ScraperConfig) -> Result<Box<dyn SeasonSource>> {
    Ok(match &config.html_dir {
        Some(dir) => {
            info!("Reading saved pages from {}", dir.display());
            Box::new(LocalPages::new(dir.clone()))
        }
        None => Box::new(BasketballReference::new(config)?),
    })
}

// ── Scraper ───────────────────────────────────────────────────────────────────

/// Fetch → extract → clean for one season.
pub struct StatsScraper {
    source: Box<dyn SeasonSource>,
    tables: TableConfig,
}

impl StatsScraper {
    pub fn new(source: Box<dyn SeasonSource>, tables: TableConfig) -> Self {
        Self { source, tables }
    }

    pub async fn fetch_season_table(&self, season: Season) -> Result<SeasonTable> {
        let html = self.source.fetch_page(Page::PlayerPerGame, season).await?;
        let raw = extract_table(&html, &self.tables.player_table)?;

        let (table, report) =
            clean_player_rows(&raw, PLAYER_STAT_COLUMNS, season, Utc::now().naive_utc())?;

        info!(
            "{}: {} player rows, {} teams",
            season,
            table.rows.len(),
            table.team_codes().len()
        );
        if report.coercion_misses > 0 {
            info!("{}: {} cells kept as missing", season, report.coercion_misses);
        }
        Ok(table)
    }

    /// Both team tables come from the same page; neither is returned unless both parse.
    pub async fn fetch_team_tables(&self, season: Season) -> Result<TeamTables> {
        let html = self.source.fetch_page(Page::SeasonSummary, season).await?;
        let now = Utc::now().naive_utc();

        let totals_raw = extract_table(&html, &self.tables.team_totals_table)?;
        let per_game_raw = extract_table(&html, &self.tables.team_per_game_table)?;

        let (totals, _) =
            clean_team_rows(&totals_raw, TEAM_STAT_COLUMNS, season, TeamTableKind::Totals, now)?;
        let (per_game, _) = clean_team_rows(
            &per_game_raw,
            TEAM_STAT_COLUMNS,
            season,
            TeamTableKind::PerGame,
            now,
        )?;

        info!("{}: {} teams", season, totals.rows.len());
        Ok(TeamTables { totals, per_game })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
