//! Per-manager analytics derived from a full gameweek history.
//!
//! Inputs are weekly snapshots ordered by gameweek ascending. The caller must
//! pass a complete history; a manager whose history fetch failed is never
//! derived from partial data.

use crate::models::fpl::{EntryGameweek, EntryId, GameweekId};
use crate::utils::tenths_to_display;

/// One manager's state at the end of one gameweek. Money fields are tenths.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklySnapshot {
    pub gameweek: GameweekId,
    pub points: i64,
    pub total_points: i64,
    pub rank: Option<i64>,
    pub overall_rank: Option<i64>,
    pub value: i64,
    pub bank: i64,
    pub transfers: i64,
    pub transfer_cost: i64,
}

impl From<&EntryGameweek> for WeeklySnapshot {
    fn from(gw: &EntryGameweek) -> Self {
        WeeklySnapshot {
            gameweek: gw.event,
            points: gw.points,
            total_points: gw.total_points,
            rank: gw.rank,
            overall_rank: gw.overall_rank,
            value: gw.value,
            bank: gw.bank,
            transfers: gw.event_transfers,
            transfer_cost: gw.event_transfers_cost,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManagerAnalytics {
    pub weeks_observed: usize,
    pub average_points_per_week: f64,
    /// Population standard deviation of weekly points.
    pub points_std_dev: f64,
    /// Bounded volatility index in [0, 100]; 100 means perfectly steady.
    pub consistency_score: f64,
    /// Ending minus starting team value, display units.
    pub team_value_growth: f64,
    pub total_transfers: i64,
    pub latest_total_points: i64,
    pub latest_overall_rank: Option<i64>,
    /// Team value at the last observed gameweek, display units.
    pub latest_team_value: f64,
}

/// Per-gameweek record carried forward from a snapshot; money in display units.
#[derive(Debug, Clone, PartialEq)]
pub struct GameweekPerformance {
    pub entry: EntryId,
    pub gameweek: GameweekId,
    pub points: i64,
    pub total_points: i64,
    pub gameweek_rank: Option<i64>,
    pub overall_rank: Option<i64>,
    pub transfers: i64,
    pub transfer_cost: i64,
    pub team_value: f64,
    pub bank: f64,
}

pub fn derive_manager_analytics(weeks: &[WeeklySnapshot]) -> ManagerAnalytics {
    let (Some(first), Some(last)) = (weeks.first(), weeks.last()) else {
        return ManagerAnalytics::default();
    };

    let n = weeks.len() as f64;
    let mean = weeks.iter().map(|w| w.points as f64).sum::<f64>() / n;

    // Fewer than two weeks, or a non-positive mean, leaves volatility undefined.
    let (std_dev, consistency_score) = if weeks.len() > 1 && mean > 0.0 {
        let variance = weeks
            .iter()
            .map(|w| {
                let d = w.points as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        let std_dev = variance.sqrt();
        let coefficient_of_variation = std_dev / mean;
        let score = (100.0 * (1.0 - coefficient_of_variation.min(1.0))).clamp(0.0, 100.0);
        (std_dev, score)
    } else {
        (0.0, 0.0)
    };

    ManagerAnalytics {
        weeks_observed: weeks.len(),
        average_points_per_week: mean,
        points_std_dev: std_dev,
        consistency_score,
        team_value_growth: tenths_to_display(last.value) - tenths_to_display(first.value),
        total_transfers: weeks.iter().map(|w| w.transfers).sum(),
        latest_total_points: last.total_points,
        latest_overall_rank: last.overall_rank,
        latest_team_value: tenths_to_display(last.value),
    }
}

pub fn performance_records(entry: EntryId, weeks: &[WeeklySnapshot]) -> Vec<GameweekPerformance> {
    weeks
        .iter()
        .map(|w| GameweekPerformance {
            entry,
            gameweek: w.gameweek,
            points: w.points,
            total_points: w.total_points,
            gameweek_rank: w.rank,
            overall_rank: w.overall_rank,
            transfers: w.transfers,
            transfer_cost: w.transfer_cost,
            team_value: tenths_to_display(w.value),
            bank: tenths_to_display(w.bank),
        })
        .collect()
}
