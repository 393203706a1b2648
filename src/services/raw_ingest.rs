use crate::client::{FplSource, fetch_all_standings};
use crate::models::fpl::{GameweekId, LeagueId};
use crate::models::raw::{self, tables};
use crate::report::{IngestionError, IngestionStats, RunReport};
use crate::services::batch::{BatchWriter, DEFAULT_BATCH_SIZE};
use crate::sink::{RawRow, RawSink};
use crate::utils::current_gameweek;
use log::{error, info, warn};

#[derive(Debug, Clone)]
pub struct RawIngestOptions {
    pub database: String,
    pub batch_size: usize,
    pub league_id: Option<LeagueId>,
    pub include_player_history: bool,
}

impl Default for RawIngestOptions {
    fn default() -> Self {
        RawIngestOptions {
            database: "fantasy_football".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            league_id: None,
            include_player_history: true,
        }
    }
}

/// Pull a full upstream snapshot into the raw store.
pub fn run<S, K>(source: &S, sink: &mut K, opts: &RawIngestOptions) -> RunReport
where
    S: FplSource + ?Sized,
    K: RawSink + ?Sized,
{
    let mut stats = IngestionStats::default();
    let outcome = ingest(source, sink, opts, &mut stats);
    if let Err(e) = &outcome {
        error!("Raw ingestion aborted: {}", e);
    }
    RunReport::from_outcome(outcome, stats, "FPL data ingestion completed")
}

fn store<K: RawSink + ?Sized>(
    writer: &mut BatchWriter<'_, K>,
    stats: &mut IngestionStats,
    table: &str,
    rows: &[RawRow],
) -> usize {
    let summary = writer.write(table, rows);
    stats.failed_batches += summary.failed_batches;
    summary.written
}

fn ingest<S, K>(source: &S, sink: &mut K, opts: &RawIngestOptions, stats: &mut IngestionStats) -> Result<(), IngestionError>
where
    S: FplSource + ?Sized,
    K: RawSink + ?Sized,
{
    info!("Raw: fetching bootstrap-static data");
    let bootstrap = source.get_bootstrap_static()?;
    let mut writer = BatchWriter::new(sink, &opts.database, opts.batch_size);

    // 1) Teams, players and gameweeks share the bootstrap table
    let rows = bootstrap.teams.iter().map(raw::team_row).collect::<Result<Vec<_>, _>>()?;
    stats.teams = store(&mut writer, stats, tables::BOOTSTRAP_STATIC, &rows);
    info!("Raw: loaded {} team(s)", stats.teams);

    let rows = bootstrap.elements.iter().map(raw::player_row).collect::<Result<Vec<_>, _>>()?;
    stats.players = store(&mut writer, stats, tables::BOOTSTRAP_STATIC, &rows);
    info!("Raw: loaded {} player(s)", stats.players);

    let rows = bootstrap.events.iter().map(raw::gameweek_row).collect::<Result<Vec<_>, _>>()?;
    stats.gameweeks = store(&mut writer, stats, tables::BOOTSTRAP_STATIC, &rows);
    info!("Raw: loaded {} gameweek(s)", stats.gameweeks);

    let current = current_gameweek(&bootstrap.events).map(|gw| gw.id);
    match current {
        Some(gw) => info!("Raw: current gameweek is {}", gw.0),
        None => info!("Raw: no current gameweek; season has not started"),
    }

    // 2) Per-player gameweek history, one call per player
    if let Some(current) = current
        && opts.include_player_history
    {
        info!(
            "Raw: fetching gameweek stats for {} player(s) up to gameweek {}",
            bootstrap.elements.len(),
            current.0
        );
        let mut rows = Vec::new();
        for player in &bootstrap.elements {
            match source.get_element_summary(player.id) {
                Ok(summary) => {
                    for stat in &summary.history {
                        rows.push(raw::player_gameweek_row(player.id, stat)?);
                    }
                }
                Err(e) => {
                    warn!("Raw: skipping stats for player {}: {}", player.id.0, e);
                    stats.skipped_items += 1;
                }
            }
        }
        stats.player_stats = store(&mut writer, stats, tables::PLAYER_GAMEWEEK, &rows);
        info!("Raw: loaded {} player gameweek stat(s)", stats.player_stats);
    }

    // 3) Fixtures
    match source.get_fixtures(None) {
        Ok(fixtures) => {
            let rows = fixtures.iter().map(raw::fixture_row).collect::<Result<Vec<_>, _>>()?;
            stats.fixtures = store(&mut writer, stats, tables::FIXTURES, &rows);
            info!("Raw: loaded {} fixture(s)", stats.fixtures);
        }
        Err(e) => {
            warn!("Raw: skipping fixtures: {}", e);
            stats.skipped_items += 1;
        }
    }

    // 4) League, managers and their per-gameweek picks
    let Some(league_id) = opts.league_id else {
        info!("Raw: no league configured; skipping league data");
        return Ok(());
    };
    info!("Raw: fetching league data for league {}", league_id.0);
    let standings = fetch_all_standings(source, league_id)?;
    stats.leagues = store(&mut writer, stats, tables::LEAGUES, &[raw::league_row(&standings.league)?]);

    for standing in &standings.results {
        let entry = match source.get_entry(standing.entry) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Raw: skipping manager {}: {}", standing.entry.0, e);
                stats.skipped_managers += 1;
                continue;
            }
        };
        let written = store(
            &mut writer,
            stats,
            tables::MANAGER_PICKS,
            &[raw::manager_row(&entry, league_id)?],
        );
        stats.managers += written;

        let Some(current) = current else { continue };
        let mut rows = Vec::new();
        for gw in (1..=current.0).map(GameweekId) {
            match source.get_entry_picks(entry.id, gw) {
                Ok(picks) => rows.push(raw::manager_gameweek_row(entry.id, gw, &picks)?),
                Err(e) => {
                    warn!("Raw: skipping picks for manager {} gameweek {}: {}", entry.id.0, gw.0, e);
                    stats.skipped_items += 1;
                }
            }
        }
        let written = store(&mut writer, stats, tables::MANAGER_PICKS, &rows);
        stats.picks += written;
    }
    info!(
        "Raw: loaded {} manager(s) and {} manager gameweek row(s)",
        stats.managers, stats.picks
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::*;
    use crate::models::fpl::*;
    use crate::report::RunStatus;
    use crate::sink::memory::MemoryStore;
    use serde_json::json;

    fn stat(round: i64, points: i64) -> PlayerGameweekStat {
        serde_json::from_value(json!({
            "round": round, "total_points": points, "minutes": 90, "goals_scored": 0, "assists": 0,
            "clean_sheets": 1, "goals_conceded": 0, "own_goals": 0, "penalties_saved": 0,
            "penalties_missed": 0, "yellow_cards": 0, "red_cards": 0, "saves": 3, "bonus": 0,
            "bps": 21, "influence": "18.4", "creativity": "0.0", "threat": "0.0", "ict_index": "1.8",
            "value": 55, "transfers_in": 1200, "transfers_out": 300, "selected": 150000
        }))
        .expect("stat")
    }

    fn entry(id: i64, first: &str) -> Entry {
        Entry {
            id: EntryId(id),
            name: format!("{first} XI"),
            player_first_name: first.to_string(),
            player_last_name: "Smith".to_string(),
            summary_overall_points: Some(118),
            summary_overall_rank: Some(2_010_993),
        }
    }

    fn picks(points: i64) -> EntryPicks {
        serde_json::from_value(json!({
            "active_chip": null,
            "entry_history": {"points": points, "total_points": points, "value": 1000, "bank": 0},
            "picks": [{"element": 328, "multiplier": 2}]
        }))
        .expect("picks")
    }

    fn scripted_source() -> FakeSource {
        let mut source = FakeSource {
            bootstrap: Some(bootstrap_fixture()),
            fixtures: Some(vec![]),
            ..Default::default()
        };
        for id in [3, 328, 366] {
            source.summaries.insert(
                PlayerId(id),
                ElementSummary {
                    history: vec![stat(1, 6), stat(2, 2)],
                },
            );
        }
        source
            .standings
            .insert(1, standings_page(1, false, vec![standing(10, "Ann", 1), standing(20, "Bo", 2)]));
        source.entries.insert(EntryId(10), entry(10, "Ann"));
        source.entries.insert(EntryId(20), entry(20, "Bo"));
        for (e, gw) in [(10, 1), (10, 2), (20, 1)] {
            source.picks.insert((EntryId(e), GameweekId(gw)), picks(50));
        }
        source
    }

    fn opts(league: Option<i64>) -> RawIngestOptions {
        RawIngestOptions {
            league_id: league.map(LeagueId),
            ..Default::default()
        }
    }

    #[test]
    fn ingests_full_snapshot_and_skips_failed_items() {
        // player 17 has no summary and manager 20 has no gameweek 2 picks
        let source = scripted_source();
        let mut store = MemoryStore::default();
        let report = run(&source, &mut store, &opts(Some(314)));

        assert_eq!(report.status, RunStatus::Success, "{}", report.message);
        let s = &report.stats;
        assert_eq!((s.teams, s.players, s.gameweeks), (3, 4, 3));
        assert_eq!(s.player_stats, 6);
        assert_eq!((s.leagues, s.managers, s.picks), (1, 2, 3));
        assert_eq!(s.skipped_items, 2);
        assert_eq!(s.failed_batches, 0);

        assert_eq!(store.raw_table(tables::BOOTSTRAP_STATIC).len(), 10);
        let keys: Vec<&str> = store.raw_table(tables::MANAGER_PICKS).iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            vec!["manager_10", "manager_10_gw_1", "manager_10_gw_2", "manager_20", "manager_20_gw_1"]
        );
        assert!(store.raw.keys().any(|(_, _, k)| k == "player_328_gw_2"));
        assert!(!store.raw.keys().any(|(_, _, k)| k.starts_with("player_17_gw")));
        // picks only up to the current gameweek (2)
        assert_eq!(source.call_count("entry/10/event/"), 2);
    }

    #[test]
    fn rerun_overwrites_with_identical_records() {
        let source = scripted_source();
        let mut store = MemoryStore::default();
        run(&source, &mut store, &opts(Some(314)));
        let first = store.raw.clone();

        let report = run(&source, &mut store, &opts(Some(314)));
        assert!(report.is_success());
        assert_eq!(store.raw, first);
    }

    #[test]
    fn bootstrap_failure_aborts_run() {
        let source = scripted_source().fail("bootstrap-static/");
        let mut store = MemoryStore::default();
        let report = run(&source, &mut store, &opts(Some(314)));

        assert_eq!(report.status, RunStatus::Error);
        assert!(report.message.contains("bootstrap-static/"));
        assert_eq!(report.stats, IngestionStats::default());
        assert!(store.raw_calls.is_empty());
    }

    #[test]
    fn standings_failure_reports_partial_stats() {
        let source = scripted_source().fail("leagues-classic/314/standings/?page_standings=1");
        let mut store = MemoryStore::default();
        let report = run(&source, &mut store, &opts(Some(314)));

        assert_eq!(report.status, RunStatus::Error);
        assert_eq!(report.stats.teams, 3);
        assert_eq!(report.stats.player_stats, 6);
        assert_eq!(report.stats.managers, 0);
    }

    #[test]
    fn failed_entry_skips_only_that_manager() {
        let source = scripted_source().fail("entry/20/");
        let mut store = MemoryStore::default();
        let report = run(&source, &mut store, &opts(Some(314)));

        assert!(report.is_success());
        assert_eq!(report.stats.managers, 1);
        assert_eq!(report.stats.skipped_managers, 1);
        assert_eq!(source.call_count("entry/20/event/"), 0);
    }

    #[test]
    fn no_current_gameweek_skips_history_and_picks() {
        let mut source = scripted_source();
        if let Some(b) = source.bootstrap.as_mut() {
            for e in &mut b.events {
                e.is_current = false;
            }
        }
        let mut store = MemoryStore::default();
        let report = run(&source, &mut store, &opts(Some(314)));

        assert!(report.is_success());
        assert_eq!(source.call_count("element-summary/"), 0);
        assert_eq!(source.call_count("entry/10/event/"), 0);
        assert_eq!(report.stats.managers, 2);
        assert_eq!(report.stats.picks, 0);
    }

    #[test]
    fn rejected_batch_does_not_fail_the_run() {
        let source = scripted_source();
        let mut store = MemoryStore::default();
        store.fail_raw_calls.insert(0);
        let report = run(&source, &mut store, &opts(None));

        assert!(report.is_success());
        assert_eq!(report.stats.teams, 0);
        assert_eq!(report.stats.players, 4);
        assert_eq!(report.stats.failed_batches, 1);
        assert_eq!(report.stats.leagues, 0);
    }
}
