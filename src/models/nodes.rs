//! Typed records for the modeled store.
//!
//! Each struct is one view (schema version "1"); its serialized form is the
//! node's property bag. Links to other nodes are `NodeRef`s, never string ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::models::fpl::{self, EntryId, GameweekId, LeagueId, PlayerId, StandingEntry, TeamId};
use crate::services::analytics::{GameweekPerformance, ManagerAnalytics};
use crate::sink::{Node, NodeApply, NodeRef, ViewId};
use crate::utils::{parse_decimal, position_label, round2, tenths_to_display, to_object};

pub const VIEW_VERSION: &str = "1";

pub mod views {
    pub const TEAM: &str = "Team";
    pub const PLAYER: &str = "Player";
    pub const GAMEWEEK: &str = "Gameweek";
    pub const LEAGUE: &str = "League";
    pub const MANAGER: &str = "Manager";
    pub const PERFORMANCE: &str = "ManagerGameweekPerformance";
    // Supplied by other producers; read-only here.
    pub const TRANSFER: &str = "Transfer";
    pub const TEAM_BETTING: &str = "ManagerTeamBetting";
}

pub fn team_external_id(id: TeamId) -> String {
    format!("team_{}", id.0)
}

pub fn player_external_id(id: PlayerId) -> String {
    format!("player_{}", id.0)
}

pub fn gameweek_external_id(id: GameweekId) -> String {
    format!("gameweek_{}", id.0)
}

pub fn league_external_id(id: LeagueId) -> String {
    format!("league_{}", id.0)
}

pub fn manager_external_id(id: EntryId) -> String {
    format!("manager_{}", id.0)
}

pub fn performance_external_id(entry: EntryId, gameweek: GameweekId) -> String {
    format!("perf_{}_gw_{}", entry.0, gameweek.0)
}

/// Gameweek number recovered from a link to a Gameweek node.
pub fn gameweek_from_ref(target: &NodeRef) -> Option<i64> {
    target.external_id.strip_prefix("gameweek_").and_then(|n| n.parse().ok())
}

pub trait ModeledRecord: Serialize + DeserializeOwned {
    const VIEW: &'static str;

    fn external_id(&self) -> String;

    fn relations(&self) -> Vec<(&'static str, &NodeRef)> {
        Vec::new()
    }

    fn view_id(space: &str) -> ViewId {
        ViewId::new(space, Self::VIEW, VIEW_VERSION)
    }

    fn to_node(&self, space: &str) -> Result<NodeApply, serde_json::Error> {
        Ok(NodeApply {
            space: space.to_string(),
            external_id: self.external_id(),
            view: Self::view_id(space),
            properties: to_object(self)?,
            relations: self
                .relations()
                .into_iter()
                .map(|(name, target)| (name.to_string(), target.clone()))
                .collect(),
        })
    }

    fn from_node(node: &Node) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::Value::Object(node.properties.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamNode {
    pub team_id: TeamId,
    pub name: String,
    pub short_name: String,
    pub strength: i64,
}

impl From<&fpl::Team> for TeamNode {
    fn from(team: &fpl::Team) -> Self {
        TeamNode {
            team_id: team.id,
            name: team.name.clone(),
            short_name: team.short_name.clone(),
            strength: team.strength.unwrap_or(0),
        }
    }
}

impl ModeledRecord for TeamNode {
    const VIEW: &'static str = views::TEAM;

    fn external_id(&self) -> String {
        team_external_id(self.team_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerNode {
    pub player_id: PlayerId,
    pub web_name: String,
    pub first_name: String,
    pub last_name: String,
    pub team: NodeRef,
    pub position: String,
    pub current_price: f64,
    pub total_points: i64,
    pub form: f64,
    pub selected_by_percent: f64,
    pub points_per_game: f64,
}

impl PlayerNode {
    pub fn from_player(space: &str, player: &fpl::Player) -> Self {
        PlayerNode {
            player_id: player.id,
            web_name: player.web_name.clone(),
            first_name: player.first_name.clone(),
            last_name: player.second_name.clone(),
            team: NodeRef::new(space, team_external_id(player.team)),
            position: position_label(player.element_type).to_string(),
            current_price: tenths_to_display(player.now_cost),
            total_points: player.total_points,
            form: parse_decimal(player.form.as_deref()),
            selected_by_percent: parse_decimal(player.selected_by_percent.as_deref()),
            points_per_game: parse_decimal(player.points_per_game.as_deref()),
        }
    }
}

impl ModeledRecord for PlayerNode {
    const VIEW: &'static str = views::PLAYER;

    fn external_id(&self) -> String {
        player_external_id(self.player_id)
    }

    fn relations(&self) -> Vec<(&'static str, &NodeRef)> {
        vec![("team", &self.team)]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameweekNode {
    pub gameweek_number: GameweekId,
    pub name: String,
    pub deadline: DateTime<Utc>,
    pub is_finished: bool,
    pub is_current: bool,
    pub average_score: i64,
    pub highest_score: i64,
}

impl From<&fpl::Gameweek> for GameweekNode {
    fn from(gw: &fpl::Gameweek) -> Self {
        GameweekNode {
            gameweek_number: gw.id,
            name: gw.name.clone(),
            deadline: gw.deadline_time,
            is_finished: gw.finished,
            is_current: gw.is_current,
            average_score: gw.average_entry_score.unwrap_or(0),
            highest_score: gw.highest_score.unwrap_or(0),
        }
    }
}

impl ModeledRecord for GameweekNode {
    const VIEW: &'static str = views::GAMEWEEK;

    fn external_id(&self) -> String {
        gameweek_external_id(self.gameweek_number)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueNode {
    pub league_id: LeagueId,
    pub name: String,
    pub league_type: String,
}

impl From<&fpl::LeagueInfo> for LeagueNode {
    fn from(league: &fpl::LeagueInfo) -> Self {
        LeagueNode {
            league_id: league.id,
            name: league.name.clone(),
            league_type: "classic".to_string(),
        }
    }
}

impl ModeledRecord for LeagueNode {
    const VIEW: &'static str = views::LEAGUE;

    fn external_id(&self) -> String {
        league_external_id(self.league_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerNode {
    pub entry_id: EntryId,
    pub manager_name: String,
    pub team_name: String,
    pub league: NodeRef,
    pub league_rank: i64,
    pub overall_points: i64,
    pub overall_rank: i64,
    pub team_value: f64,
    pub consistency_score: f64,
    pub average_points_per_week: f64,
    pub points_std_dev: f64,
    pub team_value_growth: f64,
    pub total_transfers: i64,
}

impl ManagerNode {
    pub fn new(space: &str, league: LeagueId, standing: &StandingEntry, analytics: &ManagerAnalytics) -> Self {
        ManagerNode {
            entry_id: standing.entry,
            manager_name: standing.player_name.clone(),
            team_name: standing.entry_name.clone(),
            league: NodeRef::new(space, league_external_id(league)),
            league_rank: standing.rank,
            overall_points: analytics.latest_total_points,
            overall_rank: analytics.latest_overall_rank.unwrap_or(0),
            team_value: round2(analytics.latest_team_value),
            consistency_score: round2(analytics.consistency_score),
            average_points_per_week: round2(analytics.average_points_per_week),
            points_std_dev: round2(analytics.points_std_dev),
            team_value_growth: round2(analytics.team_value_growth),
            total_transfers: analytics.total_transfers,
        }
    }
}

impl ModeledRecord for ManagerNode {
    const VIEW: &'static str = views::MANAGER;

    fn external_id(&self) -> String {
        manager_external_id(self.entry_id)
    }

    fn relations(&self) -> Vec<(&'static str, &NodeRef)> {
        vec![("league", &self.league)]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceNode {
    pub manager: NodeRef,
    pub gameweek: NodeRef,
    pub points: i64,
    pub total_points: i64,
    pub gameweek_rank: i64,
    pub overall_rank: i64,
    pub transfers: i64,
    pub transfer_cost: i64,
    pub team_value: f64,
    pub bank: f64,
}

impl PerformanceNode {
    pub fn from_performance(space: &str, perf: &GameweekPerformance) -> Self {
        PerformanceNode {
            manager: NodeRef::new(space, manager_external_id(perf.entry)),
            gameweek: NodeRef::new(space, gameweek_external_id(perf.gameweek)),
            points: perf.points,
            total_points: perf.total_points,
            gameweek_rank: perf.gameweek_rank.unwrap_or(0),
            overall_rank: perf.overall_rank.unwrap_or(0),
            transfers: perf.transfers,
            transfer_cost: perf.transfer_cost,
            team_value: perf.team_value,
            bank: perf.bank,
        }
    }

    /// Gameweek number recovered from the typed gameweek link.
    pub fn gameweek_number(&self) -> Option<i64> {
        gameweek_from_ref(&self.gameweek)
    }
}

impl ModeledRecord for PerformanceNode {
    const VIEW: &'static str = views::PERFORMANCE;

    fn external_id(&self) -> String {
        let entry = self
            .manager
            .external_id
            .strip_prefix("manager_")
            .unwrap_or(&self.manager.external_id);
        let gameweek = self
            .gameweek
            .external_id
            .strip_prefix("gameweek_")
            .unwrap_or(&self.gameweek.external_id);
        format!("perf_{}_gw_{}", entry, gameweek)
    }

    fn relations(&self) -> Vec<(&'static str, &NodeRef)> {
        vec![("manager", &self.manager), ("gameweek", &self.gameweek)]
    }
}

/// Transfer outcome written by an external producer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransferNode {
    pub manager: Option<NodeRef>,
    pub gameweek: Option<NodeRef>,
    pub player_in: Option<NodeRef>,
    pub player_out: Option<NodeRef>,
    pub transfer_cost: i64,
    pub player_in_price: f64,
    pub player_out_price: f64,
    #[serde(rename = "pointsGainedNext3GW")]
    pub points_gained_next_3gw: f64,
    pub was_successful: bool,
    pub net_benefit: f64,
}

impl ModeledRecord for TransferNode {
    const VIEW: &'static str = views::TRANSFER;

    fn external_id(&self) -> String {
        let part = |r: &Option<NodeRef>| r.as_ref().map(|r| r.external_id.clone()).unwrap_or_default();
        format!(
            "transfer_{}_{}_{}_{}",
            part(&self.manager),
            part(&self.gameweek),
            part(&self.player_out),
            part(&self.player_in)
        )
    }
}

/// Per-manager, per-club selection pattern written by an external producer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamBettingNode {
    pub manager: Option<NodeRef>,
    pub team: Option<NodeRef>,
    pub total_players_used: i64,
    pub total_points: i64,
    pub average_points_per_player: f64,
    pub success_rate: f64,
}

impl ModeledRecord for TeamBettingNode {
    const VIEW: &'static str = views::TEAM_BETTING;

    fn external_id(&self) -> String {
        let part = |r: &Option<NodeRef>| r.as_ref().map(|r| r.external_id.clone()).unwrap_or_default();
        format!("betting_{}_{}", part(&self.manager), part(&self.team))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::{bootstrap_fixture, standing};

    const SPACE: &str = "fantasy_football";

    #[test]
    fn player_node_links_team_and_converts_units() {
        let bootstrap = bootstrap_fixture();
        let salah = bootstrap.elements.iter().find(|p| p.id == PlayerId(328)).expect("salah");
        let node = PlayerNode::from_player(SPACE, salah).to_node(SPACE).expect("to node");

        assert_eq!(node.external_id, "player_328");
        assert_eq!(node.view, ViewId::new(SPACE, "Player", "1"));
        assert_eq!(node.properties["currentPrice"], 12.5);
        assert_eq!(node.properties["position"], "MID");
        assert_eq!(node.properties["form"], 9.1);
        assert_eq!(node.properties["team"]["externalId"], "team_12");
        assert_eq!(node.relations["team"], NodeRef::new(SPACE, "team_12"));
    }

    #[test]
    fn missing_form_defaults_to_zero() {
        let bootstrap = bootstrap_fixture();
        let keeper = bootstrap.elements.iter().find(|p| p.id == PlayerId(366)).expect("alisson");
        let node = PlayerNode::from_player(SPACE, keeper);
        assert_eq!(node.form, 0.0);
        assert_eq!(node.position, "GK");
    }

    #[test]
    fn performance_node_uses_typed_links() {
        let perf = GameweekPerformance {
            entry: EntryId(42),
            gameweek: GameweekId(3),
            points: 81,
            total_points: 199,
            gameweek_rank: Some(402_118),
            overall_rank: None,
            transfers: 1,
            transfer_cost: 0,
            team_value: 101.2,
            bank: 1.3,
        };
        let record = PerformanceNode::from_performance(SPACE, &perf);
        assert_eq!(record.external_id(), performance_external_id(EntryId(42), GameweekId(3)));
        assert_eq!(record.gameweek_number(), Some(3));

        let node = record.to_node(SPACE).expect("to node");
        assert_eq!(node.external_id, "perf_42_gw_3");
        assert_eq!(node.relations["manager"].external_id, "manager_42");
        assert_eq!(node.relations["gameweek"].external_id, "gameweek_3");
        assert_eq!(node.properties["overallRank"], 0);
    }

    #[test]
    fn manager_node_rounds_metrics() {
        let analytics = ManagerAnalytics {
            weeks_observed: 3,
            average_points_per_week: 67.666_666,
            points_std_dev: 11.843_2,
            consistency_score: 82.497_9,
            team_value_growth: 1.200_000_000_000_002_8,
            total_transfers: 3,
            latest_total_points: 199,
            latest_overall_rank: Some(880_211),
            latest_team_value: 101.2,
        };
        let node = ManagerNode::new(SPACE, LeagueId(314), &standing(42, "Ann Lee", 1), &analytics);
        assert_eq!(node.average_points_per_week, 67.67);
        assert_eq!(node.points_std_dev, 11.84);
        assert_eq!(node.consistency_score, 82.5);
        assert_eq!(node.team_value_growth, 1.2);
        assert_eq!(node.overall_points, 199);
        assert_eq!(node.league.external_id, "league_314");
        assert_eq!(node.external_id(), "manager_42");
    }

    #[test]
    fn external_nodes_tolerate_missing_fields() {
        let node = Node {
            space: SPACE.to_string(),
            external_id: "transfer_x".to_string(),
            view: TransferNode::view_id(SPACE),
            properties: serde_json::from_str(
                r#"{"manager":{"space":"fantasy_football","externalId":"manager_42"},"netBenefit":6.5,"wasSuccessful":true,"pointsGainedNext3GW":14}"#,
            )
            .expect("properties"),
            relations: Default::default(),
            updated_at: Utc::now(),
        };
        let transfer = TransferNode::from_node(&node).expect("decode transfer");
        assert!(transfer.was_successful);
        assert_eq!(transfer.net_benefit, 6.5);
        assert_eq!(transfer.points_gained_next_3gw, 14.0);
        assert_eq!(transfer.transfer_cost, 0);
        assert!(transfer.player_in.is_none());
    }
}
