use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

use crate::models::TableLocator;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub tables: TableConfig,
    #[serde(default)]
    pub explore: ExploreConfig,
}

/// Where and how pages are fetched
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Read saved pages from this directory instead of the network.
    #[serde(default)]
    pub html_dir: Option<PathBuf>,
}

/// Which table on each page holds the data
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TableConfig {
    #[serde(default = "default_player_table")]
    pub player_table: TableLocator,

    #[serde(default = "default_team_totals_table")]
    pub team_totals_table: TableLocator,

    #[serde(default = "default_team_per_game_table")]
    pub team_per_game_table: TableLocator,
}

/// Defaults for views and exports
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExploreConfig {
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    #[serde(default = "default_export_path")]
    pub export_path: PathBuf,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_base_url() -> String {
    "https://www.basketball-reference.com".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    "nba-stats-explorer/0.1 (season stats exploration)".to_string()
}
fn default_player_table() -> TableLocator {
    TableLocator::Index(0)
}
fn default_team_totals_table() -> TableLocator {
    TableLocator::Id("totals-team".to_string())
}
fn default_team_per_game_table() -> TableLocator {
    TableLocator::Id("per_game-team".to_string())
}
fn default_top_n() -> usize {
    10
}
fn default_export_path() -> PathBuf {
    PathBuf::from("playerstats.csv")
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            html_dir: None,
        }
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            player_table: default_player_table(),
            team_totals_table: default_team_totals_table(),
            team_per_game_table: default_team_per_game_table(),
        }
    }
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            export_path: default_export_path(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scraper: ScraperConfig::default(),
            tables: TableConfig::default(),
            explore: ExploreConfig::default(),
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("NBA").separator("__"))
            .build()?;

        let app_cfg = cfg.try_deserialize().unwrap_or_else(|e| {
            warn!("Ignoring malformed configuration ({}), using defaults", e);
            AppConfig::default()
        });
        Ok(app_cfg)
    }
}
