//! Response models for the public Fantasy Premier League API.
//!
//! Only the fields this crate reads are modeled; everything else in the
//! upstream documents is ignored on deserialization.
//!
//! Notes
//! - Prices and team values are integer tenths of a currency unit.
//! - Several "decimal" fields (form, ICT metrics, ownership) arrive as strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =====================
// Scalar ID newtype wrappers
// =====================

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub i64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub i64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameweekId(pub i64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub i64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeagueId(pub i64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixtureId(pub i64);

// =====================
// bootstrap-static/
// =====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapStatic {
    #[serde(default)]
    pub teams: Vec<Team>,
    /// Players ("elements" upstream).
    #[serde(default)]
    pub elements: Vec<Player>,
    /// Gameweeks ("events" upstream).
    #[serde(default)]
    pub events: Vec<Gameweek>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub short_name: String,
    #[serde(default)]
    pub strength: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub first_name: String,
    pub second_name: String,
    pub web_name: String,
    /// Position code: 1=GK, 2=DEF, 3=MID, 4=FWD.
    pub element_type: i64,
    pub team: TeamId,
    /// Current price in tenths.
    pub now_cost: i64,
    pub total_points: i64,
    #[serde(default)]
    pub points_per_game: Option<String>,
    #[serde(default)]
    pub form: Option<String>,
    #[serde(default)]
    pub selected_by_percent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gameweek {
    pub id: GameweekId,
    pub name: String,
    pub deadline_time: DateTime<Utc>,
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub average_entry_score: Option<i64>,
    #[serde(default)]
    pub highest_score: Option<i64>,
}

// =====================
// element-summary/{id}/
// =====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementSummary {
    #[serde(default)]
    pub history: Vec<PlayerGameweekStat>,
}

/// One player's performance in one gameweek.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerGameweekStat {
    pub round: GameweekId,
    pub total_points: i64,
    pub minutes: i64,
    pub goals_scored: i64,
    pub assists: i64,
    pub clean_sheets: i64,
    pub goals_conceded: i64,
    pub own_goals: i64,
    pub penalties_saved: i64,
    pub penalties_missed: i64,
    pub yellow_cards: i64,
    pub red_cards: i64,
    pub saves: i64,
    pub bonus: i64,
    pub bps: i64,
    pub influence: String,
    pub creativity: String,
    pub threat: String,
    pub ict_index: String,
    /// Price in tenths at the time of the gameweek.
    pub value: i64,
    pub transfers_in: i64,
    pub transfers_out: i64,
    pub selected: i64,
}

// =====================
// leagues-classic/{id}/standings/
// =====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueStandingsPage {
    pub league: LeagueInfo,
    pub standings: Standings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueInfo {
    pub id: LeagueId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Standings {
    #[serde(default)]
    pub has_next: bool,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<StandingEntry>,
}

fn first_page() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingEntry {
    pub entry: EntryId,
    pub entry_name: String,
    pub player_name: String,
    pub rank: i64,
    #[serde(default)]
    pub total: i64,
}

/// All standing pages of a league folded into one result set.
#[derive(Debug, Clone)]
pub struct LeagueStandings {
    pub league: LeagueInfo,
    pub results: Vec<StandingEntry>,
}

// =====================
// entry/{id}/
// =====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    /// Team name.
    pub name: String,
    pub player_first_name: String,
    pub player_last_name: String,
    #[serde(default)]
    pub summary_overall_points: Option<i64>,
    #[serde(default)]
    pub summary_overall_rank: Option<i64>,
}

impl Entry {
    pub fn manager_name(&self) -> String {
        format!("{} {}", self.player_first_name, self.player_last_name)
    }
}

// =====================
// entry/{id}/history/
// =====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryHistory {
    /// Current-season gameweeks, ascending.
    #[serde(default)]
    pub current: Vec<EntryGameweek>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryGameweek {
    pub event: GameweekId,
    pub points: i64,
    pub total_points: i64,
    #[serde(default)]
    pub rank: Option<i64>,
    #[serde(default)]
    pub overall_rank: Option<i64>,
    /// Bank balance in tenths.
    pub bank: i64,
    /// Team value in tenths.
    pub value: i64,
    #[serde(default)]
    pub event_transfers: i64,
    #[serde(default)]
    pub event_transfers_cost: i64,
}

// =====================
// entry/{id}/event/{gw}/picks/
// =====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryPicks {
    #[serde(default)]
    pub active_chip: Option<String>,
    #[serde(default)]
    pub entry_history: PicksEntryHistory,
    /// Opaque picks payload; stored verbatim in the raw layer.
    #[serde(default)]
    pub picks: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PicksEntryHistory {
    #[serde(default)]
    pub points: Option<i64>,
    #[serde(default)]
    pub total_points: Option<i64>,
    #[serde(default)]
    pub rank: Option<i64>,
    #[serde(default)]
    pub event_transfers: Option<i64>,
    #[serde(default)]
    pub event_transfers_cost: Option<i64>,
    #[serde(default)]
    pub bank: Option<i64>,
    #[serde(default)]
    pub value: Option<i64>,
}

// =====================
// fixtures/
// =====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixture {
    pub id: FixtureId,
    #[serde(default)]
    pub event: Option<GameweekId>,
    #[serde(default)]
    pub kickoff_time: Option<DateTime<Utc>>,
    pub team_h: TeamId,
    pub team_a: TeamId,
    #[serde(default)]
    pub team_h_score: Option<i64>,
    #[serde(default)]
    pub team_a_score: Option<i64>,
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub team_h_difficulty: Option<i64>,
    #[serde(default)]
    pub team_a_difficulty: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bootstrap_fixture() {
        let json = std::fs::read_to_string("tests/data/bootstrap-static.json").expect("fixture present");
        let data: BootstrapStatic = serde_json::from_str(&json).expect("parse bootstrap");
        assert_eq!(data.teams.len(), 3);
        assert_eq!(data.elements.len(), 4);
        assert_eq!(data.events.len(), 3);
        assert_eq!(data.elements[0].form.as_deref(), Some("5.2"));
        assert!(data.events[1].is_current);
        assert_eq!(data.events[2].highest_score, None);
    }

    #[test]
    fn parses_entry_history_fixture() {
        let json = std::fs::read_to_string("tests/data/entry-history.json").expect("fixture present");
        let history: EntryHistory = serde_json::from_str(&json).expect("parse history");
        assert_eq!(history.current.len(), 3);
        assert_eq!(history.current[0].event, GameweekId(1));
        assert_eq!(history.current[2].value, 1012);
        assert_eq!(history.current[1].event_transfers_cost, 4);
    }

    #[test]
    fn standings_page_defaults() {
        let page: LeagueStandingsPage = serde_json::from_str(
            r#"{"league":{"id":314,"name":"Office"},"standings":{"results":[]}}"#,
        )
        .expect("parse page");
        assert!(!page.standings.has_next);
        assert_eq!(page.standings.page, 1);
    }

    #[test]
    fn picks_keep_opaque_payload() {
        let picks: EntryPicks = serde_json::from_str(
            r#"{"active_chip":"wildcard","entry_history":{"points":61,"value":1003},"picks":[{"element":7,"multiplier":2}]}"#,
        )
        .expect("parse picks");
        assert_eq!(picks.active_chip.as_deref(), Some("wildcard"));
        assert_eq!(picks.entry_history.points, Some(61));
        assert_eq!(picks.entry_history.rank, None);
        assert_eq!(picks.picks[0]["element"], 7);
    }
}
