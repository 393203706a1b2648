//! Plain-text league dashboard rendered from the modeled store.
//!
//! Every widget runs its own queries. A failing query or an undecodable node
//! replaces that widget's body with a warning; the other widgets still render.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::io;

use chrono::Utc;
use colored::Colorize;
use log::{info, warn};

use crate::models::nodes::{
    ManagerNode, ModeledRecord, PerformanceNode, PlayerNode, TeamBettingNode, TeamNode, TransferNode,
    gameweek_from_ref,
};
use crate::sink::{ModeledSink, Node, NodeRef, WriteError};

pub const MANAGER_LIMIT: usize = 100;
pub const PERFORMANCE_LIMIT: usize = 1000;
pub const TEAM_LIMIT: usize = 100;
pub const PLAYER_LIMIT: usize = 1000;
pub const TRANSFER_LIMIT: usize = 2000;
pub const BETTING_LIMIT: usize = 1000;

/// Managers shown when none are picked explicitly.
pub const DEFAULT_SELECTION: usize = 5;
pub const DEFAULT_LEADERS: usize = 5;
const RECENT_TRANSFERS: usize = 20;
const TOP_TEAMS: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("query failed: {0}")]
    Query(#[from] WriteError),
    #[error("cannot decode {view} node {external_id}: {source}")]
    Decode {
        view: &'static str,
        external_id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Unavailable(String),
    #[error("formatting failed")]
    Format(#[from] std::fmt::Error),
}

#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub space: String,
    /// Manager names to focus on; empty picks the top of the league.
    pub managers: Vec<String>,
    /// Entries per category leader list.
    pub leaders: usize,
}

fn load<T, S>(sink: &mut S, space: &str, limit: usize) -> Result<Vec<T>, DashboardError>
where
    T: ModeledRecord,
    S: ModeledSink + ?Sized,
{
    let nodes = sink.list_nodes(&T::view_id(space), limit)?;
    decode_all(&nodes)
}

fn decode_all<T: ModeledRecord>(nodes: &[Node]) -> Result<Vec<T>, DashboardError> {
    nodes
        .iter()
        .map(|n| {
            T::from_node(n).map_err(|source| DashboardError::Decode {
                view: T::VIEW,
                external_id: n.external_id.clone(),
                source,
            })
        })
        .collect()
}

/// Minimal left-aligned text table.
struct Table {
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl Table {
    fn new(headers: &[&'static str]) -> Self {
        Table {
            headers: headers.to_vec(),
            rows: Vec::new(),
        }
    }

    fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    fn render(&self, buf: &mut String) -> std::fmt::Result {
        let widths: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                self.rows
                    .iter()
                    .filter_map(|r| r.get(i))
                    .map(|c| c.chars().count())
                    .fold(h.chars().count(), usize::max)
            })
            .collect();

        write_cells(buf, &widths, self.headers.iter().copied())?;
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        writeln!(buf, "{}", rule.join("  "))?;
        for row in &self.rows {
            write_cells(buf, &widths, row.iter().map(String::as_str))?;
        }
        Ok(())
    }
}

fn write_cells<'a>(buf: &mut String, widths: &[usize], cells: impl Iterator<Item = &'a str>) -> std::fmt::Result {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(c, w)| format!("{:<width$}", c, width = *w))
        .collect();
    writeln!(buf, "{}", padded.join("  ").trim_end())
}

fn section<W: io::Write>(
    out: &mut W,
    title: &str,
    body: impl FnOnce(&mut String) -> Result<(), DashboardError>,
) -> io::Result<bool> {
    writeln!(out)?;
    writeln!(out, "{}", title.bold())?;
    writeln!(out, "{}", "=".repeat(title.chars().count()))?;
    let mut buf = String::new();
    match body(&mut buf) {
        Ok(()) => {
            out.write_all(buf.as_bytes())?;
            Ok(true)
        }
        Err(e) => {
            warn!("Dashboard: {} unavailable: {}", title, e);
            writeln!(out, "{}", format!("warning: {title} unavailable: {e}").yellow())?;
            Ok(false)
        }
    }
}

fn roster(managers: &Result<Vec<ManagerNode>, DashboardError>) -> Result<&[ManagerNode], DashboardError> {
    managers
        .as_deref()
        .map_err(|e| DashboardError::Unavailable(format!("manager data unavailable: {e}")))
}

fn select<'a>(managers: &'a [ManagerNode], names: &[String]) -> Vec<&'a ManagerNode> {
    if names.is_empty() {
        return managers.iter().take(DEFAULT_SELECTION).collect();
    }
    names
        .iter()
        .filter_map(|name| {
            let found = managers.iter().find(|m| &m.manager_name == name);
            if found.is_none() {
                warn!("Dashboard: no manager named {:?} in the league", name);
            }
            found
        })
        .collect()
}

/// First manager with the strictly highest `key`.
fn leader(managers: &[ManagerNode], key: impl Fn(&ManagerNode) -> f64) -> Option<&ManagerNode> {
    managers.iter().fold(None, |best: Option<&ManagerNode>, m| match best {
        Some(b) if key(b) >= key(m) => Some(b),
        _ => Some(m),
    })
}

fn top_by<'a>(managers: &'a [ManagerNode], n: usize, key: impl Fn(&ManagerNode) -> f64) -> Vec<&'a ManagerNode> {
    let mut sorted: Vec<&ManagerNode> = managers.iter().collect();
    sorted.sort_by(|a, b| key(b).total_cmp(&key(a)));
    sorted.truncate(n);
    sorted
}

fn leaderboard(buf: &mut String, managers: &[ManagerNode]) -> Result<(), DashboardError> {
    let highest = managers.iter().map(|m| m.overall_points).max().unwrap_or(0);
    writeln!(buf, "Total Managers:    {}", managers.len())?;
    writeln!(buf, "Highest Points:    {}", highest)?;
    if let Some(m) = leader(managers, |m| m.consistency_score) {
        writeln!(buf, "Most Consistent:   {} ({:.1} score)", m.manager_name, m.consistency_score)?;
    }
    if let Some(m) = leader(managers, |m| m.team_value_growth) {
        writeln!(buf, "Best Value Growth: {} (£{:.1}m)", m.manager_name, m.team_value_growth)?;
    }

    writeln!(buf)?;
    writeln!(buf, "Rankings")?;
    let mut ranked: Vec<&ManagerNode> = managers.iter().collect();
    ranked.sort_by(|a, b| b.overall_points.cmp(&a.overall_points));
    let mut table = Table::new(&[
        "Rank",
        "Manager",
        "Team",
        "Points",
        "Value (£m)",
        "Consistency",
        "Avg PPW",
        "Transfers",
    ]);
    for m in ranked {
        table.row(vec![
            m.league_rank.to_string(),
            m.manager_name.clone(),
            m.team_name.clone(),
            m.overall_points.to_string(),
            format!("£{:.1}m", m.team_value),
            format!("{:.1}", m.consistency_score),
            format!("{:.1}", m.average_points_per_week),
            m.total_transfers.to_string(),
        ]);
    }
    table.render(buf)?;
    Ok(())
}

fn performance_trends<S: ModeledSink + ?Sized>(
    buf: &mut String,
    sink: &mut S,
    space: &str,
    selected: &[&ManagerNode],
) -> Result<(), DashboardError> {
    if selected.is_empty() {
        writeln!(buf, "Select managers with --manager to view their performance")?;
        return Ok(());
    }

    let view = PerformanceNode::view_id(space);
    let mut table = Table::new(&["Manager", "GW", "Points", "Total", "Transfers"]);
    for manager in selected {
        let target = NodeRef::new(space, manager.external_id());
        let nodes = sink.list_linked(&view, "manager", &target, PERFORMANCE_LIMIT)?;
        let mut weeks: Vec<PerformanceNode> = decode_all(&nodes)?;
        weeks.sort_by_key(|w| w.gameweek_number());
        for w in weeks {
            table.row(vec![
                manager.manager_name.clone(),
                w.gameweek_number().map(|g| g.to_string()).unwrap_or_default(),
                w.points.to_string(),
                w.total_points.to_string(),
                w.transfers.to_string(),
            ]);
        }
    }

    if table.rows.is_empty() {
        writeln!(buf, "No performance data available for selected managers")?;
    } else {
        table.render(buf)?;
    }
    Ok(())
}

#[derive(Default)]
struct TransferTally {
    successful: usize,
    total: usize,
    benefit: f64,
    cost: i64,
}

impl TransferTally {
    fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.successful as f64 / self.total as f64 * 100.0
        }
    }
}

fn ref_id(target: &Option<NodeRef>) -> Option<&str> {
    target.as_ref().map(|r| r.external_id.as_str())
}

fn transfer_analysis<S: ModeledSink + ?Sized>(
    buf: &mut String,
    sink: &mut S,
    space: &str,
    selected: &[&ManagerNode],
) -> Result<(), DashboardError> {
    writeln!(buf, "Points from transferred-in players against transferred-out players")?;
    let transfers: Vec<TransferNode> = load(sink, space, TRANSFER_LIMIT)?;
    if transfers.is_empty() {
        writeln!(
            buf,
            "{}",
            "No transfer data found; it is written by a separate transfer analysis job.".yellow()
        )?;
        return Ok(());
    }
    let players: Vec<PlayerNode> = load(sink, space, PLAYER_LIMIT)?;
    let player_names: BTreeMap<String, String> = players
        .into_iter()
        .map(|p| (p.external_id(), p.web_name))
        .collect();
    let player_name = |r: &Option<NodeRef>| {
        ref_id(r)
            .and_then(|id| player_names.get(id))
            .cloned()
            .unwrap_or_else(|| "Unknown".to_string())
    };

    let names: BTreeMap<String, &str> = selected
        .iter()
        .map(|m| (m.external_id(), m.manager_name.as_str()))
        .collect();
    let mut rows: Vec<(&str, &TransferNode)> = transfers
        .iter()
        .filter_map(|t| ref_id(&t.manager).and_then(|id| names.get(id)).map(|name| (*name, t)))
        .collect();
    if rows.is_empty() {
        writeln!(buf, "No transfer data available for selected managers")?;
        return Ok(());
    }

    let mut overall = TransferTally::default();
    let mut by_manager: BTreeMap<&str, TransferTally> = BTreeMap::new();
    for (name, t) in &rows {
        for tally in [&mut overall, by_manager.entry(*name).or_default()] {
            tally.total += 1;
            tally.successful += usize::from(t.was_successful);
            tally.benefit += t.net_benefit;
            tally.cost += t.transfer_cost;
        }
    }

    writeln!(buf, "Total Transfers:      {}", overall.total)?;
    writeln!(
        buf,
        "Successful Transfers: {} ({:.1}% success rate)",
        overall.successful,
        overall.success_rate()
    )?;
    writeln!(buf, "Avg Net Benefit:      {:.1} pts", overall.benefit / overall.total as f64)?;
    writeln!(buf, "Total Cost:           {} pts", overall.cost)?;

    writeln!(buf)?;
    writeln!(buf, "Transfer Success by Manager")?;
    let mut managers: Vec<(&str, TransferTally)> = by_manager.into_iter().collect();
    managers.sort_by(|a, b| b.1.success_rate().total_cmp(&a.1.success_rate()));
    let mut table = Table::new(&["Manager", "Total", "Successful", "Success Rate %", "Net Gain"]);
    for (name, tally) in &managers {
        table.row(vec![
            name.to_string(),
            tally.total.to_string(),
            tally.successful.to_string(),
            format!("{:.1}%", tally.success_rate()),
            format!("{:.0}", tally.benefit - tally.cost as f64),
        ]);
    }
    table.render(buf)?;

    writeln!(buf)?;
    writeln!(buf, "Recent Transfers")?;
    rows.sort_by_key(|(_, t)| std::cmp::Reverse(t.gameweek.as_ref().and_then(gameweek_from_ref)));
    let mut table = Table::new(&["Manager", "GW", "Player Out", "Player In", "Net Benefit", "Success"]);
    for (name, t) in rows.iter().take(RECENT_TRANSFERS) {
        table.row(vec![
            name.to_string(),
            t.gameweek
                .as_ref()
                .and_then(gameweek_from_ref)
                .map(|g| g.to_string())
                .unwrap_or_default(),
            player_name(&t.player_out),
            player_name(&t.player_in),
            format!("{:.0}", t.net_benefit),
            if t.was_successful { "yes" } else { "no" }.to_string(),
        ]);
    }
    table.render(buf)?;
    Ok(())
}

#[derive(Default)]
struct TeamTally {
    success_rate_sum: f64,
    entries: usize,
    total_points: i64,
    players_used: i64,
}

impl TeamTally {
    fn mean_success_rate(&self) -> f64 {
        self.success_rate_sum / self.entries as f64
    }
}

fn team_patterns<S: ModeledSink + ?Sized>(
    buf: &mut String,
    sink: &mut S,
    space: &str,
    selected: &[&ManagerNode],
) -> Result<(), DashboardError> {
    writeln!(buf, "Which clubs managers pick their players from")?;
    let betting: Vec<TeamBettingNode> = load(sink, space, BETTING_LIMIT)?;
    if betting.is_empty() {
        writeln!(buf, "No team betting data available.")?;
        return Ok(());
    }
    let teams: Vec<TeamNode> = load(sink, space, TEAM_LIMIT)?;
    let team_names: BTreeMap<String, String> = teams.into_iter().map(|t| (t.external_id(), t.name)).collect();

    let wanted: BTreeSet<String> = selected.iter().map(|m| m.external_id()).collect();
    let mut by_team: BTreeMap<String, TeamTally> = BTreeMap::new();
    for b in betting
        .iter()
        .filter(|b| ref_id(&b.manager).is_some_and(|id| wanted.contains(id)))
    {
        let team = ref_id(&b.team)
            .and_then(|id| team_names.get(id))
            .cloned()
            .unwrap_or_else(|| "Unknown".to_string());
        let tally = by_team.entry(team).or_default();
        tally.success_rate_sum += b.success_rate;
        tally.entries += 1;
        tally.total_points += b.total_points;
        tally.players_used += b.total_players_used;
    }
    if by_team.is_empty() {
        writeln!(buf, "No team betting data available for selected managers")?;
        return Ok(());
    }

    let mut clubs: Vec<(&String, &TeamTally)> = by_team.iter().collect();

    writeln!(buf)?;
    writeln!(buf, "Top {} Teams by Success Rate", TOP_TEAMS)?;
    clubs.sort_by(|a, b| b.1.mean_success_rate().total_cmp(&a.1.mean_success_rate()));
    let mut table = Table::new(&["Team", "Success Rate %", "Points", "Players Used"]);
    for (team, tally) in clubs.iter().take(TOP_TEAMS) {
        table.row(vec![
            team.to_string(),
            format!("{:.1}", tally.mean_success_rate()),
            tally.total_points.to_string(),
            tally.players_used.to_string(),
        ]);
    }
    table.render(buf)?;

    writeln!(buf)?;
    writeln!(buf, "Top {} Teams by Total Points", TOP_TEAMS)?;
    clubs.sort_by(|a, b| b.1.total_points.cmp(&a.1.total_points));
    let mut table = Table::new(&["Team", "Points"]);
    for (team, tally) in clubs.iter().take(TOP_TEAMS) {
        table.row(vec![team.to_string(), tally.total_points.to_string()]);
    }
    table.render(buf)?;
    Ok(())
}

fn consistency(buf: &mut String, managers: &[ManagerNode], leaders: usize) -> Result<(), DashboardError> {
    writeln!(buf, "Who is the most reliable week-to-week performer?")?;
    let mut table = Table::new(&[
        "Manager",
        "Avg PPW",
        "Std Dev",
        "Consistency",
        "Transfers",
        "Value Growth (£m)",
    ]);
    for m in top_by(managers, managers.len(), |m| m.consistency_score) {
        table.row(vec![
            m.manager_name.clone(),
            format!("{:.1}", m.average_points_per_week),
            format!("{:.1}", m.points_std_dev),
            format!("{:.1}", m.consistency_score),
            m.total_transfers.to_string(),
            format!("{:.1}", m.team_value_growth),
        ]);
    }
    table.render(buf)?;

    writeln!(buf)?;
    writeln!(buf, "{}", "Category Leaders".bold())?;
    writeln!(buf, "Most Consistent")?;
    for m in top_by(managers, leaders, |m| m.consistency_score) {
        writeln!(buf, "  {}: {:.1}", m.manager_name, m.consistency_score)?;
    }
    writeln!(buf, "Best Value Growth")?;
    for m in top_by(managers, leaders, |m| m.team_value_growth) {
        writeln!(buf, "  {}: £{:.1}m", m.manager_name, m.team_value_growth)?;
    }
    writeln!(buf, "Highest Average PPW")?;
    for m in top_by(managers, leaders, |m| m.average_points_per_week) {
        writeln!(buf, "  {}: {:.1}", m.manager_name, m.average_points_per_week)?;
    }
    Ok(())
}

/// Render every widget to `out`; returns how many widgets failed.
pub fn render<S, W>(sink: &mut S, opts: &DashboardOptions, out: &mut W) -> io::Result<usize>
where
    S: ModeledSink + ?Sized,
    W: io::Write,
{
    let space = opts.space.as_str();
    let managers = load::<ManagerNode, _>(sink, space, MANAGER_LIMIT).map(|mut list| {
        list.sort_by_key(|m| (m.league_rank, m.entry_id.0));
        list
    });

    writeln!(out, "{}", "FPL League Dashboard".cyan().bold())?;
    if let Ok(list) = &managers
        && list.is_empty()
    {
        writeln!(out, "{}", "No manager data found. Run update-model to load data first.".yellow())?;
        return Ok(0);
    }

    let selected = managers
        .as_deref()
        .map(|list| select(list, &opts.managers))
        .unwrap_or_default();
    if let Ok(list) = &managers {
        info!("Dashboard: {} manager(s), {} selected", list.len(), selected.len());
    }

    let rendered = [
        section(out, "League Leaderboard", |buf| leaderboard(buf, roster(&managers)?))?,
        section(out, "Weekly Performance Trends", |buf| {
            roster(&managers)?;
            performance_trends(buf, sink, space, &selected)
        })?,
        section(out, "Transfer Success Analysis", |buf| {
            roster(&managers)?;
            transfer_analysis(buf, sink, space, &selected)
        })?,
        section(out, "Team Selection Patterns", |buf| {
            roster(&managers)?;
            team_patterns(buf, sink, space, &selected)
        })?,
        section(out, "Consistency Analysis", |buf| {
            consistency(buf, roster(&managers)?, opts.leaders)
        })?,
    ];

    writeln!(out)?;
    writeln!(out, "---")?;
    writeln!(
        out,
        "Space: {} | Last refreshed: {}",
        space,
        Utc::now().format("%Y-%m-%d %H:%M")
    )?;

    Ok(rendered.iter().filter(|ok| !**ok).count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::standing;
    use crate::models::fpl::{EntryId, GameweekId, LeagueId};
    use crate::models::nodes::views;
    use crate::services::analytics::{GameweekPerformance, ManagerAnalytics};
    use crate::sink::memory::MemoryStore;

    const SPACE: &str = "fantasy_football";

    fn manager(entry: i64, name: &str, rank: i64, points: i64, consistency: f64, growth: f64) -> ManagerNode {
        let analytics = ManagerAnalytics {
            weeks_observed: 3,
            average_points_per_week: points as f64 / 3.0,
            points_std_dev: 10.0,
            consistency_score: consistency,
            team_value_growth: growth,
            total_transfers: 2,
            latest_total_points: points,
            latest_overall_rank: Some(1000 * rank),
            latest_team_value: 101.0,
        };
        ManagerNode::new(SPACE, LeagueId(314), &standing(entry, name, rank), &analytics)
    }

    fn perf(entry: i64, gw: i64, points: i64) -> PerformanceNode {
        PerformanceNode::from_performance(
            SPACE,
            &GameweekPerformance {
                entry: EntryId(entry),
                gameweek: GameweekId(gw),
                points,
                total_points: points * gw,
                gameweek_rank: None,
                overall_rank: None,
                transfers: 1,
                transfer_cost: 0,
                team_value: 100.0,
                bank: 0.5,
            },
        )
    }

    fn add<T: ModeledRecord>(store: &mut MemoryStore, record: &T) {
        store.add_node(record.to_node(SPACE).expect("to node"));
    }

    fn seeded_store() -> MemoryStore {
        let mut store = MemoryStore::default();
        add(&mut store, &manager(10, "Ann", 1, 199, 82.3, 1.2));
        add(&mut store, &manager(20, "Bo", 2, 180, 64.0, 2.4));
        add(&mut store, &manager(30, "Cy", 3, 150, 90.1, -0.3));
        for gw in 1..=3 {
            add(&mut store, &perf(10, gw, 60 + gw));
            add(&mut store, &perf(20, gw, 50 + gw));
        }
        add(
            &mut store,
            &TeamNode {
                team_id: crate::models::fpl::TeamId(12),
                name: "Liverpool".to_string(),
                short_name: "LIV".to_string(),
                strength: 5,
            },
        );
        add(
            &mut store,
            &TeamBettingNode {
                manager: Some(NodeRef::new(SPACE, "manager_10")),
                team: Some(NodeRef::new(SPACE, "team_12")),
                total_players_used: 3,
                total_points: 142,
                average_points_per_player: 47.3,
                success_rate: 66.7,
            },
        );
        add(
            &mut store,
            &TransferNode {
                manager: Some(NodeRef::new(SPACE, "manager_20")),
                gameweek: Some(NodeRef::new(SPACE, "gameweek_3")),
                player_in: Some(NodeRef::new(SPACE, "player_328")),
                player_out: Some(NodeRef::new(SPACE, "player_17")),
                transfer_cost: 4,
                player_in_price: 12.5,
                player_out_price: 9.0,
                points_gained_next_3gw: 14.0,
                was_successful: true,
                net_benefit: 6.0,
            },
        );
        store
    }

    fn opts(managers: &[&str]) -> DashboardOptions {
        DashboardOptions {
            space: SPACE.to_string(),
            managers: managers.iter().map(|m| m.to_string()).collect(),
            leaders: DEFAULT_LEADERS,
        }
    }

    fn render_to_string(store: &mut MemoryStore, opts: &DashboardOptions) -> (String, usize) {
        let mut out = Vec::new();
        let failed = render(store, opts, &mut out).expect("render");
        (String::from_utf8(out).expect("utf8"), failed)
    }

    #[test]
    fn renders_every_widget() {
        let mut store = seeded_store();
        let (text, failed) = render_to_string(&mut store, &opts(&[]));

        assert_eq!(failed, 0, "{text}");
        for heading in [
            "League Leaderboard",
            "Weekly Performance Trends",
            "Transfer Success Analysis",
            "Team Selection Patterns",
            "Consistency Analysis",
            "Category Leaders",
        ] {
            assert!(text.contains(heading), "missing {heading}");
        }
        assert!(text.contains("Total Managers:    3"));
        assert!(text.contains("Most Consistent:   Cy (90.1 score)"));
        assert!(text.contains("Best Value Growth: Bo (£2.4m)"));
        assert!(text.contains("Liverpool"));
        assert!(text.contains("Successful Transfers: 1 (100.0% success rate)"));
        assert!(text.contains("Space: fantasy_football"));
    }

    #[test]
    fn trends_follow_the_manager_relation() {
        let mut store = seeded_store();
        let (text, _) = render_to_string(&mut store, &opts(&["Bo", "Nobody"]));

        let trends = text
            .split("Weekly Performance Trends")
            .nth(1)
            .and_then(|rest| rest.split("Transfer Success Analysis").next())
            .expect("trends section");
        assert_eq!(trends.lines().filter(|l| l.starts_with("Bo ")).count(), 3);
        assert!(!trends.contains("Ann"));
    }

    #[test]
    fn transfers_of_unselected_managers_are_hidden() {
        let mut store = seeded_store();
        let (text, failed) = render_to_string(&mut store, &opts(&["Ann"]));
        assert_eq!(failed, 0);
        assert!(text.contains("No transfer data available for selected managers"));
        assert!(!text.contains("No team betting data available for selected managers"));
    }

    #[test]
    fn failing_widget_does_not_stop_the_others() {
        let mut store = seeded_store();
        store.fail_views.insert(views::TRANSFER.to_string());
        let (text, failed) = render_to_string(&mut store, &opts(&[]));

        assert_eq!(failed, 1);
        assert!(text.contains("warning: Transfer Success Analysis unavailable"));
        assert!(text.contains("Liverpool"));
        assert!(text.contains("Category Leaders"));
    }

    #[test]
    fn undecodable_node_is_reported_inline() {
        let mut store = seeded_store();
        let mut broken = TeamNode {
            team_id: crate::models::fpl::TeamId(1),
            name: "Arsenal".to_string(),
            short_name: "ARS".to_string(),
            strength: 4,
        }
        .to_node(SPACE)
        .expect("to node");
        broken.properties.remove("name");
        store.add_node(broken);

        let (text, failed) = render_to_string(&mut store, &opts(&[]));
        assert_eq!(failed, 1);
        assert!(text.contains("warning: Team Selection Patterns unavailable: cannot decode Team node team_1"));
    }

    #[test]
    fn manager_query_failure_degrades_every_widget() {
        let mut store = seeded_store();
        store.fail_views.insert(views::MANAGER.to_string());
        let (text, failed) = render_to_string(&mut store, &opts(&[]));

        assert_eq!(failed, 5);
        assert!(text.contains("warning: League Leaderboard unavailable: manager data unavailable"));
        assert!(text.contains("Space: fantasy_football"));
    }

    #[test]
    fn empty_store_asks_for_a_model_update() {
        let mut store = MemoryStore::default();
        let (text, failed) = render_to_string(&mut store, &opts(&[]));
        assert_eq!(failed, 0);
        assert!(text.contains("No manager data found"));
        assert!(!text.contains("League Leaderboard"));
    }

    #[test]
    fn table_pads_columns_to_widest_cell() {
        let mut table = Table::new(&["Team", "Points"]);
        table.row(vec!["Liverpool".to_string(), "142".to_string()]);
        let mut buf = String::new();
        table.render(&mut buf).expect("render table");
        assert_eq!(buf, "Team       Points\n---------  ------\nLiverpool  142\n");
    }
}
