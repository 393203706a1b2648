//! Flattening of upstream entities into keyed raw rows.
//!
//! Keys are derived from the entity family and its natural id(s) only, so a
//! rerun over the same upstream snapshot overwrites rows instead of adding
//! new ones. Column bags never carry an ingestion timestamp; the sink stamps
//! `updated_at` outside the record.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::fpl::{
    Entry, EntryId, EntryPicks, Fixture, Gameweek, GameweekId, LeagueInfo, LeagueId, Player, PlayerGameweekStat,
    PlayerId, Team, TeamId,
};
use crate::sink::RawRow;
use crate::utils::to_object;

pub mod tables {
    pub const BOOTSTRAP_STATIC: &str = "fpl_bootstrap_static";
    pub const PLAYER_GAMEWEEK: &str = "fpl_player_gameweek";
    pub const LEAGUES: &str = "fpl_leagues";
    pub const MANAGER_PICKS: &str = "fpl_manager_picks";
    pub const FIXTURES: &str = "fpl_fixtures";
}

fn row<T: Serialize>(key: String, columns: &T) -> Result<RawRow, serde_json::Error> {
    Ok(RawRow {
        key,
        columns: to_object(columns)?,
    })
}

#[derive(Serialize)]
struct TeamColumns<'a> {
    #[serde(rename = "_type")]
    kind: &'static str,
    id: TeamId,
    name: &'a str,
    short_name: &'a str,
    strength: Option<i64>,
}

pub fn team_row(team: &Team) -> Result<RawRow, serde_json::Error> {
    row(
        format!("team_{}", team.id.0),
        &TeamColumns {
            kind: "team",
            id: team.id,
            name: &team.name,
            short_name: &team.short_name,
            strength: team.strength,
        },
    )
}

#[derive(Serialize)]
struct PlayerColumns<'a> {
    #[serde(rename = "_type")]
    kind: &'static str,
    id: PlayerId,
    first_name: &'a str,
    second_name: &'a str,
    web_name: &'a str,
    element_type: i64,
    team: TeamId,
    now_cost: i64,
    total_points: i64,
    points_per_game: Option<&'a str>,
    form: Option<&'a str>,
    selected_by_percent: Option<&'a str>,
}

pub fn player_row(player: &Player) -> Result<RawRow, serde_json::Error> {
    row(
        format!("player_{}", player.id.0),
        &PlayerColumns {
            kind: "player",
            id: player.id,
            first_name: &player.first_name,
            second_name: &player.second_name,
            web_name: &player.web_name,
            element_type: player.element_type,
            team: player.team,
            now_cost: player.now_cost,
            total_points: player.total_points,
            points_per_game: player.points_per_game.as_deref(),
            form: player.form.as_deref(),
            selected_by_percent: player.selected_by_percent.as_deref(),
        },
    )
}

#[derive(Serialize)]
struct GameweekColumns<'a> {
    #[serde(rename = "_type")]
    kind: &'static str,
    id: GameweekId,
    name: &'a str,
    deadline_time: DateTime<Utc>,
    finished: bool,
    is_current: bool,
    average_entry_score: Option<i64>,
    highest_score: Option<i64>,
}

pub fn gameweek_row(gw: &Gameweek) -> Result<RawRow, serde_json::Error> {
    row(
        format!("gameweek_{}", gw.id.0),
        &GameweekColumns {
            kind: "event",
            id: gw.id,
            name: &gw.name,
            deadline_time: gw.deadline_time,
            finished: gw.finished,
            is_current: gw.is_current,
            average_entry_score: gw.average_entry_score,
            highest_score: gw.highest_score,
        },
    )
}

#[derive(Serialize)]
struct PlayerGameweekColumns<'a> {
    player_id: PlayerId,
    gameweek: GameweekId,
    #[serde(flatten)]
    stat: &'a PlayerGameweekStat,
}

pub fn player_gameweek_row(player_id: PlayerId, stat: &PlayerGameweekStat) -> Result<RawRow, serde_json::Error> {
    let mut row = row(
        format!("player_{}_gw_{}", player_id.0, stat.round.0),
        &PlayerGameweekColumns {
            player_id,
            gameweek: stat.round,
            stat,
        },
    )?;
    // `gameweek` already carries the round
    row.columns.remove("round");
    Ok(row)
}

#[derive(Serialize)]
struct LeagueColumns<'a> {
    league_id: LeagueId,
    name: &'a str,
    league_type: &'static str,
}

pub fn league_row(league: &LeagueInfo) -> Result<RawRow, serde_json::Error> {
    row(
        format!("league_{}", league.id.0),
        &LeagueColumns {
            league_id: league.id,
            name: &league.name,
            league_type: "classic",
        },
    )
}

#[derive(Serialize)]
struct ManagerColumns<'a> {
    entry_id: EntryId,
    manager_name: String,
    team_name: &'a str,
    league_id: LeagueId,
    overall_points: Option<i64>,
    overall_rank: Option<i64>,
}

pub fn manager_row(entry: &Entry, league_id: LeagueId) -> Result<RawRow, serde_json::Error> {
    row(
        format!("manager_{}", entry.id.0),
        &ManagerColumns {
            entry_id: entry.id,
            manager_name: entry.manager_name(),
            team_name: &entry.name,
            league_id,
            overall_points: entry.summary_overall_points,
            overall_rank: entry.summary_overall_rank,
        },
    )
}

#[derive(Serialize)]
struct ManagerGameweekColumns<'a> {
    entry_id: EntryId,
    gameweek: GameweekId,
    points: Option<i64>,
    total_points: Option<i64>,
    rank: Option<i64>,
    transfers: Option<i64>,
    transfer_cost: Option<i64>,
    bank: Option<i64>,
    team_value: Option<i64>,
    active_chip: Option<&'a str>,
    /// Opaque text; the raw layer never parses it.
    picks_json: String,
}

pub fn manager_gameweek_row(
    entry_id: EntryId,
    gameweek: GameweekId,
    picks: &EntryPicks,
) -> Result<RawRow, serde_json::Error> {
    let h = &picks.entry_history;
    row(
        format!("manager_{}_gw_{}", entry_id.0, gameweek.0),
        &ManagerGameweekColumns {
            entry_id,
            gameweek,
            points: h.points,
            total_points: h.total_points,
            rank: h.rank,
            transfers: h.event_transfers,
            transfer_cost: h.event_transfers_cost,
            bank: h.bank,
            team_value: h.value,
            active_chip: picks.active_chip.as_deref(),
            picks_json: serde_json::to_string(&picks.picks)?,
        },
    )
}

pub fn fixture_row(fixture: &Fixture) -> Result<RawRow, serde_json::Error> {
    row(format!("fixture_{}", fixture.id.0), fixture)
}
