mod analysis;
mod cache;
mod config;
mod error;
mod export;
mod glossary;
mod models;
mod pipeline;
mod scraper;
mod shell;
mod utils;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::analysis::{rank_groups, ChartView, Direction, GroupTotal, Selection, Series};
use crate::config::AppConfig;
use crate::error::ExplorerError;
use crate::models::{
    GroupKey, Position, RawTable, Season, SeasonTable, StatColumn, TeamTable, TeamTableKind,
};
use crate::pipeline::{Controls, Dashboard, Explorer, PlayerProfile};
use crate::shell::ShellCommand;
use crate::utils::{bar, fmt_stat, render_table};

#[derive(Parser)]
#[command(
    name = "nba-explorer",
    about = "Explore NBA season stats scraped from basketball-reference.com",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Read saved pages (NBA_<year>.html, NBA_<year>_per_game.html) from this directory
    #[arg(long, global = true, env = "NBA_HTML_DIR")]
    html_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct FilterArgs {
    /// Season year (1950-2023)
    #[arg(short = 'y', long = "year", default_value_t = Season::latest())]
    season: Season,

    /// Team codes to keep, e.g. BOS,LAL (default: every team)
    #[arg(short = 't', long = "team", value_delimiter = ',')]
    teams: Vec<String>,

    /// Positions to keep: C, PF, SF, PG, SG (default: every position)
    #[arg(long = "pos", value_delimiter = ',')]
    positions: Vec<Position>,

    /// Player names to keep (repeatable)
    #[arg(short = 'p', long = "player")]
    players: Vec<String>,
}

impl FilterArgs {
    fn selection(&self) -> Selection {
        let mut selection = Selection::all();
        if !self.teams.is_empty() {
            selection = selection.teams(self.teams.iter().map(|t| t.to_uppercase()));
        }
        if !self.positions.is_empty() {
            selection = selection.positions(self.positions.iter().copied());
        }
        if !self.players.is_empty() {
            selection = selection.players(self.players.iter().cloned());
        }
        selection
    }

    fn controls(&self, view: ChartView) -> Controls {
        Controls {
            season: self.season,
            selection: self.selection(),
            view,
            ..Controls::default()
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RankSource {
    /// Filtered player table, grouped by --by
    Players,
    /// Team totals table
    Totals,
    /// Team per-game table
    PerGame,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GlossaryTopic {
    Columns,
    Seasons,
    Positions,
    Teams,
}

#[derive(Subcommand)]
enum Command {
    /// Show the team totals or per-game table of a season
    Teams {
        #[arg(short = 'y', long = "year", default_value_t = Season::latest())]
        season: Season,

        /// totals | per-game
        #[arg(long, default_value = "totals")]
        table: TeamTableKind,

        /// Also write the table as CSV
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show the player table after team / position / player filters
    Players {
        #[command(flatten)]
        filter: FilterArgs,

        /// Read a previously exported CSV instead of scraping
        #[arg(long)]
        from: Option<PathBuf>,
    },

    /// Top-N or bottom-N groups by the sum of one stat column
    Rank {
        #[command(flatten)]
        filter: FilterArgs,

        #[arg(long, value_enum, default_value_t = RankSource::Players)]
        source: RankSource,

        /// team | player | pos (player table only)
        #[arg(long, default_value = "team")]
        by: GroupKey,

        /// Stat column header, e.g. PTS, 3P, "3P%"
        #[arg(short, long, default_value = "PTS")]
        column: StatColumn,

        #[arg(short, long, value_enum, default_value_t = Direction::Descending)]
        direction: Direction,

        /// Number of groups (default from config)
        #[arg(short = 'n', long = "top")]
        top: Option<usize>,
    },

    /// Chart series for one display mode
    View {
        #[arg(value_enum)]
        view: ChartView,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Write the filtered player table as CSV
    Export {
        #[command(flatten)]
        filter: FilterArgs,

        /// Output file (default from config: playerstats.csv)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// One player's rows plus profile and headshot links
    Profile {
        #[arg(short = 'y', long = "year", default_value_t = Season::latest())]
        season: Season,

        player: String,
    },

    /// Explain columns, positions or team codes
    Glossary {
        #[arg(value_enum, default_value_t = GlossaryTopic::Columns)]
        topic: GlossaryTopic,
    },

    /// Interactive session; each control change re-renders from the cache
    Shell {
        #[arg(short = 'y', long = "year", default_value_t = Season::latest())]
        season: Season,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "nba_stats_explorer=info,warn",
        1 => "nba_stats_explorer=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::new(filter))
        .init();

    let mut config = AppConfig::load()?;
    if let Some(dir) = cli.html_dir {
        config.scraper.html_dir = Some(dir);
    }

    let mut explorer = Explorer::new(&config).context("Failed to set up page source")?;
    let json = cli.json;

    match cli.command {
        Command::Teams { season, table, out } => {
            let tables = explorer.team_tables(season).await?;
            let table = tables.get(table);
            if let Some(path) = out {
                export::write_team_csv(table, &path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }
            if json {
                print_json(table)?;
            } else {
                println!("{} — {}", table.kind.title(), season);
                print!("{}", render_table(&team_display(table)));
            }
        }

        Command::Players { filter, from } => {
            let table = match from {
                Some(path) => Arc::new(
                    export::read_csv(&path, filter.season)
                        .with_context(|| format!("Failed to read {}", path.display()))?,
                ),
                None => explorer.season_table(filter.season).await?,
            };
            let view = filter.selection().apply(&table);
            if json {
                print_json(&view)?;
            } else {
                let (rows, cols) = view.dimensions();
                println!("Data Dimension: {} rows and {} columns.", rows, cols);
                print!("{}", render_table(&season_display(&view)));
            }
        }

        Command::Rank {
            filter,
            source,
            by,
            column,
            direction,
            top,
        } => {
            let n = top.unwrap_or(config.explore.top_n);
            let totals = match source {
                RankSource::Players => {
                    let table = explorer.season_table(filter.season).await?;
                    let view = filter.selection().apply(&table);
                    rank_groups(&view.rows, by, column, direction, n)
                }
                RankSource::Totals | RankSource::PerGame => {
                    let kind = match source {
                        RankSource::PerGame => TeamTableKind::PerGame,
                        _ => TeamTableKind::Totals,
                    };
                    if by != GroupKey::Team {
                        warn!("Team tables can only be grouped by team");
                    }
                    let tables = explorer.team_tables(filter.season).await?;
                    rank_groups(&tables.get(kind).rows, GroupKey::Team, column, direction, n)
                }
            };
            if json {
                print_json(&totals)?;
            } else {
                print_totals(column, &totals);
            }
        }

        Command::View { view, filter } => {
            let dashboard = explorer.render(&filter.controls(view)).await?;
            if json {
                print_json(&dashboard)?;
            } else {
                print_dashboard(&dashboard);
            }
        }

        Command::Export { filter, out } => {
            let _t = utils::Timer::start("CSV export");
            let table = explorer.season_table(filter.season).await?;
            let view = filter.selection().apply(&table);
            let path = out.unwrap_or_else(|| config.explore.export_path.clone());
            let n = export::write_csv(&view, &path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Exported {} rows to {}", n, path.display());
        }

        Command::Profile { season, player } => {
            let profile = explorer.profile(season, &player).await?;
            if json {
                print_json(&profile)?;
            } else {
                print_profile(&profile, season);
            }
        }

        Command::Glossary { topic } => print_glossary(topic),

        Command::Shell { season } => run_shell(&mut explorer, &config, season, json).await?,
    }

    Ok(())
}

// ── Interactive session ───────────────────────────────────────────────────────

async fn run_shell(
    explorer: &mut Explorer,
    config: &AppConfig,
    season: Season,
    json: bool,
) -> Result<()> {
    let mut controls = Controls {
        season,
        ..Controls::default()
    };

    println!("{}", shell::HELP);
    show_dashboard(explorer, &controls, json).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{}> ", controls.season);
        std::io::stdout().flush().ok();

        let Some(line) = lines.next_line().await? else { break };
        if line.trim().is_empty() {
            continue;
        }

        let command = match ShellCommand::parse(&line) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };

        if command.apply(&mut controls) {
            show_dashboard(explorer, &controls, json).await;
            continue;
        }
        if command == ShellCommand::Quit {
            break;
        }

        // Errors end the interaction, never the session
        let outcome: Result<()> = async {
            match command {
                ShellCommand::Show => {
                    let table = explorer.season_table(controls.season).await?;
                    let view = controls.selection.apply(&table);
                    print!("{}", render_table(&season_display(&view)));
                }
                ShellCommand::ShowTeams => {
                    let tables = explorer.team_tables(controls.season).await?;
                    print!("{}", render_table(&team_display(tables.get(controls.team_table))));
                }
                ShellCommand::Export(path) => {
                    let table = explorer.season_table(controls.season).await?;
                    let view = controls.selection.apply(&table);
                    let path = path.unwrap_or_else(|| config.explore.export_path.clone());
                    let n = export::write_csv(&view, &path)?;
                    println!("wrote {} rows to {}", n, path.display());
                }
                ShellCommand::Profile(name) => {
                    let profile = explorer.profile(controls.season, &name).await?;
                    print_profile(&profile, controls.season);
                }
                ShellCommand::ClearCache => {
                    explorer.clear_cache();
                    println!("cache cleared");
                }
                ShellCommand::Help => println!("{}", shell::HELP),
                _ => {}
            }
            Ok(())
        }
        .await;

        if let Err(e) = outcome {
            report(&e);
        }
    }

    let (seasons, hits, misses) = explorer.cache_stats();
    info!("Session done: {} cached tables, {} hits, {} misses", seasons, hits, misses);
    Ok(())
}

/// Print an interaction error, naming the failed stage when it is known.
fn report(err: &anyhow::Error) {
    match err.downcast_ref::<ExplorerError>() {
        Some(e) if e.is_network() => eprintln!("fetch failed: {}", e),
        Some(e) if e.is_parse() => eprintln!("page layout not understood: {}", e),
        _ => eprintln!("error: {:#}", err),
    }
}

async fn show_dashboard(explorer: &mut Explorer, controls: &Controls, json: bool) {
    match explorer.render(controls).await {
        Ok(dashboard) if json => {
            if let Err(e) = print_json(&dashboard) {
                report(&e);
            }
        }
        Ok(dashboard) => print_dashboard(&dashboard),
        Err(e) => report(&anyhow::Error::from(e)),
    }
}

// ── Rendering ─────────────────────────────────────────────────────────────────

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn season_display(table: &SeasonTable) -> RawTable {
    let headers = models::PLAYER_ID_COLUMNS
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
                .chain(table.columns.iter().map(|&c| fmt_stat(r.stats.get(c))))
                .collect()
        })
        .collect();
    RawTable { headers, rows }
}

fn team_display(table: &TeamTable) -> RawTable {
    let headers = std::iter::once("Team".to_string())
        .chain(table.columns.iter().map(|c| c.header().to_string()))
        .collect();
    let rows = table
        .rows
        .iter()
        .map(|r| {
            std::iter::once(r.team.clone())
                .chain(table.columns.iter().map(|&c| fmt_stat(r.stats.get(c))))
                .collect()
        })
        .collect();
    RawTable { headers, rows }
}

fn print_series(series: &Series) {
    let max = series
        .points
        .iter()
        .filter_map(|(_, v)| *v)
        .fold(0.0_f64, f64::max);
    let width = series
        .categories()
        .iter()
        .map(|c| c.chars().count())
        .max()
        .unwrap_or(0);

    println!("  {}", series.label);
    for (category, value) in &series.points {
        println!(
            "    {:<width$}  {:>8}  {}",
            category,
            fmt_stat(*value),
            bar(*value, max, 40),
            width = width
        );
    }
}

fn print_dashboard(dashboard: &Dashboard) {
    let (rows, cols) = dashboard.filtered.dimensions();
    println!("─────────────────────────────────");
    println!("  {}", dashboard.title);
    println!("─────────────────────────────────");
    println!("  Teams    : {}", dashboard.team_choices.join(", "));
    println!("  Players  : {} available", dashboard.player_choices.len());
    println!("  Selected : {} rows × {} columns", rows, cols);
    if dashboard.series.iter().all(|s| s.points.is_empty()) {
        println!("  (nothing to chart for this selection)");
    }
    for series in &dashboard.series {
        print_series(series);
    }
}

fn print_totals(column: StatColumn, totals: &[GroupTotal]) {
    print_series(&Series::from_totals(format!("Σ {}", column), totals.to_vec()));
}

fn print_profile(profile: &PlayerProfile, season: Season) {
    println!("{} ({})", profile.name, season);
    if profile.rows.is_empty() {
        println!("  no rows for this player in {}", season);
    } else {
        let table = SeasonTable {
            season,
            fetched_at: chrono::Utc::now().naive_utc(),
            columns: StatColumn::ALL
                .into_iter()
                .filter(|&c| profile.rows.iter().any(|r| r.stats.get(c).is_some()))
                .collect(),
            rows: profile.rows.clone(),
        };
        print!("{}", render_table(&season_display(&table)));
    }
    if let Some(url) = &profile.profile_url {
        println!("  profile : {}", url);
    }
    if let Some(url) = &profile.headshot_url {
        println!("  photo   : {}", url);
    }
}

fn print_glossary(topic: GlossaryTopic) {
    match topic {
        GlossaryTopic::Columns => {
            for (header, description) in glossary::columns() {
                println!("  {:<6} {}", header, description);
            }
        }
        GlossaryTopic::Seasons => {
            let seasons: Vec<Season> = Season::all().collect();
            if let (Some(newest), Some(oldest)) = (seasons.first(), seasons.last()) {
                println!(
                    "  {} seasons, {} to {} (a season is named by the year it ends)",
                    seasons.len(),
                    oldest.year(),
                    newest.year()
                );
            }
        }
        GlossaryTopic::Positions => {
            for p in Position::ALL {
                println!("  {:<3} {}", p, glossary::position_description(p));
            }
        }
        GlossaryTopic::Teams => {
            for (code, name) in glossary::TEAM_CODES {
                println!("  {}  {}", code, name);
            }
            println!("  Relocated or renamed franchises keep the codes of their history.");
        }
    }
}
