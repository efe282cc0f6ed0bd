//! Reference text shown next to the tables.

use crate::models::{Position, StatColumn};

pub const ID_COLUMNS: [(&str, &str); 4] = [
    ("Player", "Player name"),
    ("Age", "Player's age on February 1 of the season"),
    ("Pos", "Position"),
    ("Tm", "Team"),
];

/// Current franchise codes. Relocated or renamed franchises keep the code
/// history of the season in question, so older seasons show other codes.
pub const TEAM_CODES: [(&str, &str); 30] = [
    ("ATL", "Atlanta Hawks"),
    ("BOS", "Boston Celtics"),
    ("BRK", "Brooklyn Nets"),
    ("CHO", "Charlotte Hornets"),
    ("CHI", "Chicago Bulls"),
    ("CLE", "Cleveland Cavaliers"),
    ("DAL", "Dallas Mavericks"),
    ("DEN", "Denver Nuggets"),
    ("DET", "Detroit Pistons"),
    ("GSW", "Golden State Warriors"),
    ("HOU", "Houston Rockets"),
    ("IND", "Indiana Pacers"),
    ("LAC", "LA Clippers"),
    ("LAL", "Los Angeles Lakers"),
    ("MEM", "Memphis Grizzlies"),
    ("MIA", "Miami Heat"),
    ("MIL", "Milwaukee Bucks"),
    ("MIN", "Minnesota Timberwolves"),
    ("NOP", "New Orleans Pelicans"),
    ("NYK", "New York Knicks"),
    ("OKC", "Oklahoma City Thunder"),
    ("ORL", "Orlando Magic"),
    ("PHI", "Philadelphia 76ers"),
    ("PHO", "Phoenix Suns"),
    ("POR", "Portland Trail Blazers"),
    ("SAC", "Sacramento Kings"),
    ("SAS", "San Antonio Spurs"),
    ("TOR", "Toronto Raptors"),
    ("UTA", "Utah Jazz"),
    ("WAS", "Washington Wizards"),
];

pub fn position_description(position: Position) -> &'static str {
    match position {
        Position::PG => {
            "Point Guard: runs the offense; ball handling, passing and court vision."
        }
        Position::SG => {
            "Shooting Guard: primary perimeter scorer from three and mid-range; perimeter defense."
        }
        Position::SF => {
            "Small Forward: versatile wing who scores, rebounds and defends."
        }
        Position::PF => {
            "Power Forward: physical post scorer, rebounder and interior defender."
        }
        Position::C => {
            "Center: plays near the basket; shot blocking, rebounding and scoring in the paint."
        }
    }
}

pub fn columns() -> Vec<(String, String)> {
    ID_COLUMNS
        .iter()
        .map(|(h, d)| (h.to_string(), d.to_string()))
        .chain(
            StatColumn::ALL
                .iter()
                .map(|c| (c.header().to_string(), c.description().to_string())),
        )
        .collect()
}
