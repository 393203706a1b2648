use crate::client::{FplSource, fetch_all_standings};
use crate::models::fpl::LeagueId;
use crate::models::nodes::{GameweekNode, LeagueNode, ManagerNode, ModeledRecord, PerformanceNode, PlayerNode, TeamNode};
use crate::report::{IngestionError, IngestionStats, RunReport};
use crate::services::analytics::{WeeklySnapshot, derive_manager_analytics, performance_records};
use crate::services::batch::MAX_BATCH_SIZE;
use crate::sink::{ModeledSink, NodeApply, WriteError};
use log::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct ModelUpdateOptions {
    pub space: String,
    pub league_id: Option<LeagueId>,
}

/// Refresh the modeled store: reference nodes, then per-manager analytics and
/// per-gameweek performance for every manager in the league.
pub fn run<S, M>(source: &S, sink: &mut M, opts: &ModelUpdateOptions) -> RunReport
where
    S: FplSource + ?Sized,
    M: ModeledSink + ?Sized,
{
    let mut stats = IngestionStats::default();
    let outcome = update(source, sink, opts, &mut stats);
    if let Err(e) = &outcome {
        error!("Model update aborted: {}", e);
    }
    RunReport::from_outcome(outcome, stats, "FPL data updated successfully")
}

fn apply<M: ModeledSink + ?Sized>(sink: &mut M, nodes: &[NodeApply]) -> Result<usize, WriteError> {
    let mut written = 0;
    for chunk in nodes.chunks(MAX_BATCH_SIZE) {
        written += sink.apply_nodes(chunk)?;
    }
    Ok(written)
}

fn to_nodes<T: ModeledRecord>(
    space: &str,
    records: impl IntoIterator<Item = T>,
) -> Result<Vec<NodeApply>, serde_json::Error> {
    records.into_iter().map(|r| r.to_node(space)).collect()
}

fn update<S, M>(source: &S, sink: &mut M, opts: &ModelUpdateOptions, stats: &mut IngestionStats) -> Result<(), IngestionError>
where
    S: FplSource + ?Sized,
    M: ModeledSink + ?Sized,
{
    let league_id = opts.league_id.ok_or_else(|| {
        IngestionError::Config("no league configured: pass --league-id or set FPL_LEAGUE_ID".to_string())
    })?;
    let space = opts.space.as_str();

    // 1) Reference data
    info!("Model: fetching bootstrap-static data");
    let bootstrap = source.get_bootstrap_static()?;

    let nodes = to_nodes(space, bootstrap.teams.iter().map(TeamNode::from))?;
    stats.teams = apply(sink, &nodes)?;
    info!("Model: applied {} team node(s)", stats.teams);

    let nodes = to_nodes(space, bootstrap.events.iter().map(GameweekNode::from))?;
    stats.gameweeks = apply(sink, &nodes)?;
    info!("Model: applied {} gameweek node(s)", stats.gameweeks);

    let nodes = to_nodes(space, bootstrap.elements.iter().map(|p| PlayerNode::from_player(space, p)))?;
    stats.players = apply(sink, &nodes)?;
    info!("Model: applied {} player node(s)", stats.players);

    // 2) League
    info!("Model: fetching league {} standings", league_id.0);
    let standings = fetch_all_standings(source, league_id)?;
    stats.leagues = apply(sink, &[LeagueNode::from(&standings.league).to_node(space)?])?;

    // 3) Managers: full history or nothing
    let mut manager_nodes = Vec::with_capacity(standings.results.len());
    let mut performance_nodes = Vec::new();
    for standing in &standings.results {
        let history = match source.get_entry_history(standing.entry) {
            Ok(history) => history,
            Err(e) => {
                warn!(
                    "Model: omitting manager {} ({}) from this run: {}",
                    standing.entry.0, standing.player_name, e
                );
                stats.skipped_managers += 1;
                continue;
            }
        };

        let weeks: Vec<WeeklySnapshot> = history.current.iter().map(WeeklySnapshot::from).collect();
        let analytics = derive_manager_analytics(&weeks);
        debug!(
            "Model: manager {} weeks={} avg={:.2} std={:.2} consistency={:.2}",
            standing.entry.0,
            analytics.weeks_observed,
            analytics.average_points_per_week,
            analytics.points_std_dev,
            analytics.consistency_score
        );

        manager_nodes.push(ManagerNode::new(space, league_id, standing, &analytics).to_node(space)?);
        for perf in performance_records(standing.entry, &weeks) {
            performance_nodes.push(PerformanceNode::from_performance(space, &perf).to_node(space)?);
        }
    }

    stats.managers = apply(sink, &manager_nodes)?;
    info!("Model: applied {} manager node(s)", stats.managers);
    stats.performance = apply(sink, &performance_nodes)?;
    info!("Model: applied {} performance node(s)", stats.performance);

    Ok(())
}
