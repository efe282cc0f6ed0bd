//! Line commands for the interactive session.
//!
//! Each input line becomes a [`ShellCommand`]. Control changes are applied
//! to [`Controls`] and trigger a fresh render; the rest are dispatched by
//! the caller.

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::analysis::ChartView;
use crate::models::{Position, Season, TeamTableKind};
use crate::pipeline::Controls;

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Season(Season),
    Teams(Option<BTreeSet<String>>),
    Positions(Option<BTreeSet<Position>>),
    Players(Option<Vec<String>>),
    View(ChartView),
    TeamTable(TeamTableKind),
    /// Print the filtered player table.
    Show,
    /// Print the chosen team table.
    ShowTeams,
    Export(Option<PathBuf>),
    Profile(String),
    ClearCache,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  year <1950-2023>            change season
  teams <CODE,...|all>        filter by team codes
  pos <C,PF,SF,PG,SG|all>     filter by positions
  players <Name, ...|all>     pick players to compare
  view <team-points|team-three-pointers|player-offence|player-defence>
  table <totals|per-game>     team table printed by `teamstats`
  show                        print the filtered player table
  teamstats                   print the team table
  export [path]               write the filtered table as CSV
  profile <Name>              rows and links for one player
  clear                       drop cached seasons
  help | quit";

/// `None` for "all"; otherwise the comma-separated items, trimmed.
fn list(arg: &str) -> Option<Vec<String>> {
    let arg = arg.trim();
    if arg.eq_ignore_ascii_case("all") || arg.is_empty() {
        return None;
    }
    Some(
        arg.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    )
}

impl ShellCommand {
    pub fn parse(line: &str) -> Result<ShellCommand, String> {
        let line = line.trim();
        let (word, arg) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let arg = arg.trim();

        match word.to_lowercase().as_str() {
            "year" | "season" => arg
                .parse::<Season>()
                .map(ShellCommand::Season)
                .map_err(|e| format!("{}", e)),
            "teams" => Ok(ShellCommand::Teams(
                list(arg).map(|v| v.into_iter().map(|t| t.to_uppercase()).collect()),
            )),
            "pos" | "positions" => match list(arg) {
                None => Ok(ShellCommand::Positions(None)),
                Some(codes) => codes
                    .iter()
                    .map(|c| c.parse::<Position>())
                    .collect::<Result<BTreeSet<_>, _>>()
                    .map(|p| ShellCommand::Positions(Some(p)))
                    .map_err(|e| e.to_string()),
            },
            "players" => Ok(ShellCommand::Players(list(arg))),
            "view" => <ChartView as clap::ValueEnum>::from_str(arg, true)
                .map(ShellCommand::View),
            "table" => arg
                .parse::<TeamTableKind>()
                .map(ShellCommand::TeamTable)
                .map_err(|e| e.to_string()),
            "show" => Ok(ShellCommand::Show),
            "teamstats" => Ok(ShellCommand::ShowTeams),
            "export" => Ok(ShellCommand::Export(
                (!arg.is_empty()).then(|| PathBuf::from(arg)),
            )),
            "profile" if !arg.is_empty() => Ok(ShellCommand::Profile(arg.to_string())),
            "clear" => Ok(ShellCommand::ClearCache),
            "help" | "?" => Ok(ShellCommand::Help),
            "quit" | "exit" | "q" => Ok(ShellCommand::Quit),
            _ => Err(format!("unrecognised command: {}", line)),
        }
    }

    /// Apply a control change. Returns false for commands that leave the
    /// controls untouched.
    pub fn apply(&self, controls: &mut Controls) -> bool {
        match self {
            ShellCommand::Season(s) => {
                controls.season = *s;
                // player names rarely carry across seasons
                controls.selection.players = None;
            }
            ShellCommand::Teams(t) => controls.selection.teams = t.clone(),
            ShellCommand::Positions(p) => controls.selection.positions = p.clone(),
            ShellCommand::Players(None) => controls.selection.players = None,
            ShellCommand::Players(Some(p)) => {
                controls.selection = controls.selection.clone().players(p.iter().cloned())
            }
            ShellCommand::View(v) => controls.view = *v,
            ShellCommand::TeamTable(k) => controls.team_table = *k,
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_controls() {
        assert_eq!(
            ShellCommand::parse("year 1996").unwrap(),
            ShellCommand::Season(Season::new(1996).unwrap())
        );
        assert!(ShellCommand::parse("year 2030").is_err());

        assert_eq!(
            ShellCommand::parse("teams bos, lal").unwrap(),
            ShellCommand::Teams(Some(["BOS".to_string(), "LAL".to_string()].into()))
        );
        assert_eq!(ShellCommand::parse("teams all").unwrap(), ShellCommand::Teams(None));

        assert_eq!(
            ShellCommand::parse("pos pg,C").unwrap(),
            ShellCommand::Positions(Some([Position::PG, Position::C].into()))
        );
        assert!(ShellCommand::parse("pos G").is_err());

        assert_eq!(
            ShellCommand::parse("players Stephen Curry, Draymond Green").unwrap(),
            ShellCommand::Players(Some(
                ["Stephen Curry".to_string(), "Draymond Green".to_string()].into()
            ))
        );
        assert_eq!(
            ShellCommand::parse("view player-defence").unwrap(),
            ShellCommand::View(ChartView::PlayerDefence)
        );
        assert_eq!(
            ShellCommand::parse("table per-game").unwrap(),
            ShellCommand::TeamTable(TeamTableKind::PerGame)
        );
    }

    #[test]
    fn test_parse_actions() {
        assert_eq!(ShellCommand::parse("export").unwrap(), ShellCommand::Export(None));
        assert_eq!(
            ShellCommand::parse("export out/gsw.csv").unwrap(),
            ShellCommand::Export(Some(PathBuf::from("out/gsw.csv")))
        );
        assert_eq!(
            ShellCommand::parse("profile LeBron James").unwrap(),
            ShellCommand::Profile("LeBron James".into())
        );
        assert!(ShellCommand::parse("profile").is_err());
        assert_eq!(ShellCommand::parse("  quit ").unwrap(), ShellCommand::Quit);
        assert!(ShellCommand::parse("dance").is_err());
    }

    #[test]
    fn test_apply() {
        let mut controls = Controls::default();
        controls.selection.players = Some(["LeBron James".to_string()].into());

        assert!(ShellCommand::Season(Season::new(2010).unwrap()).apply(&mut controls));
        assert_eq!(controls.season.year(), 2010);
        assert_eq!(controls.selection.players, None);

        assert!(ShellCommand::Positions(Some([Position::C].into())).apply(&mut controls));
        assert_eq!(controls.selection.positions, Some([Position::C].into()));

        assert!(ShellCommand::Players(Some(vec!["B".into(), "A".into(), "B".into()]))
            .apply(&mut controls));
        assert_eq!(controls.selection.players, Some(vec!["B".to_string(), "A".to_string()]));

        assert!(!ShellCommand::Show.apply(&mut controls));
    }
}
