//! Standalone HTTP client for the public Fantasy Premier League API.
//!
//! - Blocking client using `ureq` (no async).
//! - One GET per logical call, decoded into `crate::models::fpl`.
//! - After every call the client sleeps a fixed delay, so N sequential calls
//!   cost at least N x delay of wall-clock time.
//! - No retries and no backoff: callers decide whether a failure skips an
//!   item or aborts the run.

use http::StatusCode;
use log::debug;
use serde::de::DeserializeOwned;
use std::thread;
use std::time::Duration;

use crate::models::fpl::*;

pub const DEFAULT_BASE_URL: &str = "https://fantasy.premierleague.com/api";
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)";
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("GET {endpoint}: http {status}: {body}")]
    Http { endpoint: String, status: u16, body: String },
    #[error("GET {endpoint}: transport error: {message}")]
    Transport { endpoint: String, message: String },
    #[error("GET {endpoint}: malformed json at `{path}`: {message}")]
    Decode { endpoint: String, path: String, message: String },
}

impl FetchError {
    pub fn endpoint(&self) -> &str {
        match self {
            FetchError::Http { endpoint, .. }
            | FetchError::Transport { endpoint, .. }
            | FetchError::Decode { endpoint, .. } => endpoint,
        }
    }

    /// HTTP status when the upstream answered with a non-success code.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Read-only access to the upstream resources, one resource per call.
pub trait FplSource {
    fn get_bootstrap_static(&self) -> Result<BootstrapStatic, FetchError>;
    fn get_element_summary(&self, player_id: PlayerId) -> Result<ElementSummary, FetchError>;
    fn get_league_standings(&self, league_id: LeagueId, page: u32) -> Result<LeagueStandingsPage, FetchError>;
    fn get_entry(&self, entry_id: EntryId) -> Result<Entry, FetchError>;
    fn get_entry_history(&self, entry_id: EntryId) -> Result<EntryHistory, FetchError>;
    fn get_entry_picks(&self, entry_id: EntryId, gameweek: GameweekId) -> Result<EntryPicks, FetchError>;
    fn get_fixtures(&self, gameweek: Option<GameweekId>) -> Result<Vec<Fixture>, FetchError>;
}

pub struct FplClient {
    agent: ureq::Agent,
    base_url: String,
    delay: Duration,
}

impl FplClient {
    pub fn new(base_url: impl Into<String>, delay: Duration, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        FplClient {
            agent,
            base_url: base_url.into(),
            delay,
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, FetchError> {
        let result = self.fetch(endpoint);
        // charged per call, failures included
        thread::sleep(self.delay);
        result
    }

    fn fetch<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, FetchError> {
        let url = self.url(endpoint);
        debug!("GET {}", url);
        let transport = |e: ureq::Error| FetchError::Transport {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        };

        let mut res = self
            .agent
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
            .call()
            .map_err(transport)?;
        let status: StatusCode = res.status();
        let body = res.body_mut().read_to_string().map_err(transport)?;

        if !status.is_success() {
            let mut body = body;
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(FetchError::Http {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        decode_json(endpoint, &body)
    }
}

impl FplSource for FplClient {
    fn get_bootstrap_static(&self) -> Result<BootstrapStatic, FetchError> {
        self.get_json("bootstrap-static/")
    }

    fn get_element_summary(&self, player_id: PlayerId) -> Result<ElementSummary, FetchError> {
        self.get_json(&format!("element-summary/{}/", player_id.0))
    }

    fn get_league_standings(&self, league_id: LeagueId, page: u32) -> Result<LeagueStandingsPage, FetchError> {
        let mut endpoint = format!("leagues-classic/{}/standings/", league_id.0);
        if page > 1 {
            endpoint.push_str(&format!("?page_standings={}", page));
        }
        self.get_json(&endpoint)
    }

    fn get_entry(&self, entry_id: EntryId) -> Result<Entry, FetchError> {
        self.get_json(&format!("entry/{}/", entry_id.0))
    }

    fn get_entry_history(&self, entry_id: EntryId) -> Result<EntryHistory, FetchError> {
        self.get_json(&format!("entry/{}/history/", entry_id.0))
    }

    fn get_entry_picks(&self, entry_id: EntryId, gameweek: GameweekId) -> Result<EntryPicks, FetchError> {
        self.get_json(&format!("entry/{}/event/{}/picks/", entry_id.0, gameweek.0))
    }

    fn get_fixtures(&self, gameweek: Option<GameweekId>) -> Result<Vec<Fixture>, FetchError> {
        match gameweek {
            Some(gw) => self.get_json(&format!("fixtures/?event={}", gw.0)),
            None => self.get_json("fixtures/"),
        }
    }
}

fn decode_json<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T, FetchError> {
    let de = &mut serde_json::Deserializer::from_str(body);
    serde_path_to_error::deserialize(de).map_err(|e| FetchError::Decode {
        endpoint: endpoint.to_string(),
        path: e.path().to_string(),
        message: e.inner().to_string(),
    })
}

/// Fetch every standings page of a classic league, following `has_next`.
pub fn fetch_all_standings<S: FplSource + ?Sized>(source: &S, league_id: LeagueId) -> Result<LeagueStandings, FetchError> {
    let first = source.get_league_standings(league_id, 1)?;
    let league = first.league;
    let mut results = first.standings.results;
    let mut has_next = first.standings.has_next;
    let mut page = first.standings.page.max(1);

    while has_next {
        page += 1;
        let next = source.get_league_standings(league_id, page)?;
        if next.standings.results.is_empty() {
            break;
        }
        has_next = next.standings.has_next;
        results.extend(next.standings.results);
    }
    debug!(
        "League {} standings: {} entr(ies) over {} page(s)",
        league_id.0,
        results.len(),
        page
    );

    Ok(LeagueStandings { league, results })
}
