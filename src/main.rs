pub mod models {
    pub mod fpl;
    pub mod nodes;
    pub mod raw;
}

pub mod client;
pub mod config;
pub mod db {
    pub mod models;
    pub mod store;
}
pub mod env_file;
pub mod report;
pub mod schema;
pub mod sink;
pub mod utils;
pub mod services {
    pub mod analytics;
    pub mod batch;
    pub mod dashboard;
    pub mod model_update;
    pub mod raw_ingest;
}

use crate::client::FplClient;
use crate::config::Config;
use crate::db::store::PgStore;
use crate::models::fpl::LeagueId;
use crate::report::RunReport;
use crate::services::dashboard::{self, DEFAULT_LEADERS, DashboardOptions};
use crate::services::model_update::{self, ModelUpdateOptions};
use crate::services::raw_ingest::{self, RawIngestOptions};
use clap::{Parser, Subcommand};
use diesel::PgConnection;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use log::{error, info, warn};
use std::path::PathBuf;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Fantasy Premier League ingestion and league analytics.
#[derive(Debug, Parser)]
#[command(name = "fpl-analytics", version)]
struct Cli {
    /// Load environment variables from this file instead of ./.env
    #[arg(long, global = true, value_name = "PATH")]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Copy a full upstream snapshot into the raw store
    IngestRaw {
        /// Classic league to ingest; falls back to FPL_LEAGUE_ID
        #[arg(long)]
        league_id: Option<i64>,
    },
    /// Refresh typed nodes and manager analytics in the modeled store
    UpdateModel {
        /// Classic league to model; falls back to FPL_LEAGUE_ID
        #[arg(long)]
        league_id: Option<i64>,
    },
    /// Print the league dashboard from the modeled store
    Dashboard {
        /// Manager to focus on (repeatable); defaults to the league top five
        #[arg(long = "manager", value_name = "NAME")]
        managers: Vec<String>,
        /// Entries per category leader list
        #[arg(long, default_value_t = DEFAULT_LEADERS)]
        limit: usize,
    },
}

fn apply_database_migrations(conn: &mut PgConnection) -> Result<(), String> {
    match conn.run_pending_migrations(MIGRATIONS) {
        Ok(applied) => {
            if applied.is_empty() {
                info!("Database schema is up to date; no migrations were applied");
            } else {
                let names = applied.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ");
                info!("Applied {} database migration(s): {}", applied.len(), names);
            }
            Ok(())
        }
        Err(e) => Err(format!("Applying database migrations failed: {}", e)),
    }
}

fn print_report(report: &RunReport) -> Result<(), String> {
    let json = serde_json::to_string_pretty(report).map_err(|e| format!("serializing run report failed: {}", e))?;
    println!("{}", json);
    Ok(())
}

/// Returns whether the command succeeded.
fn run(command: Command) -> Result<bool, String> {
    // 1) Load config
    let cfg = Config::from_env().map_err(|e| e.to_string())?;
    info!(
        "Config loaded (api={}, delay={}ms, timeout={}s, raw_database={}, batch_size={}, space={}, league={}, player_history={})",
        cfg.api_base_url,
        cfg.request_delay.as_millis(),
        cfg.http_timeout.as_secs(),
        cfg.raw_database,
        cfg.raw_batch_size,
        cfg.model_space,
        cfg.league_id
            .map(|l| l.0.to_string())
            .unwrap_or_else(|| "-".to_string()),
        cfg.ingest_player_history
    );

    // 2) Connect DB
    let mut conn = PgConnection::establish(&cfg.database_url).map_err(|e| format!("DB connection failed: {}", e))?;
    info!("Connected to database");

    // 3) Apply pending database migrations
    apply_database_migrations(&mut conn)?;
    let mut store = PgStore::new(conn);

    let client = FplClient::new(cfg.api_base_url.clone(), cfg.request_delay, cfg.http_timeout);
    let league = |cli: Option<i64>| cli.map(LeagueId).or(cfg.league_id);

    // 4) Dispatch
    match command {
        Command::IngestRaw { league_id } => {
            let opts = RawIngestOptions {
                database: cfg.raw_database.clone(),
                batch_size: cfg.raw_batch_size,
                league_id: league(league_id),
                include_player_history: cfg.ingest_player_history,
            };
            let report = raw_ingest::run(&client, &mut store, &opts);
            print_report(&report)?;
            Ok(report.is_success())
        }
        Command::UpdateModel { league_id } => {
            let opts = ModelUpdateOptions {
                space: cfg.model_space.clone(),
                league_id: league(league_id),
            };
            let report = model_update::run(&client, &mut store, &opts);
            print_report(&report)?;
            Ok(report.is_success())
        }
        Command::Dashboard { managers, limit } => {
            let opts = DashboardOptions {
                space: cfg.model_space.clone(),
                managers,
                leaders: limit,
            };
            let stdout = std::io::stdout();
            let failed = dashboard::render(&mut store, &opts, &mut stdout.lock())
                .map_err(|e| format!("writing dashboard failed: {}", e))?;
            if failed > 0 {
                warn!("Dashboard rendered with {} unavailable widget(s)", failed);
            }
            Ok(true)
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let loaded_env = match env_file::load_from(cli.env_file.as_deref()) {
        Ok(info) => info,
        Err(err) => {
            eprintln!("fatal: {}", err);
            std::process::exit(1);
        }
    };

    // Init logging after environment so RUST_LOG from .env is respected.
    let default_filter = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(default_filter)
        .format_timestamp_secs()
        .init();

    if let Some(info) = loaded_env.as_ref() {
        let origin = if info.explicit { "CLI-specified" } else { "default" };
        info!(
            "Environment loaded from {} .env file: {} ({} variable(s) applied)",
            origin,
            info.path.display(),
            info.applied
        );
    }

    info!(
        "fpl-analytics {} (git {}) starting",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME_GIT_HASH")
    );
    match run(cli.command) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("fatal: {}", e);
            std::process::exit(1);
        }
    }
}
