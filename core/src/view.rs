//! View-model state machines behind the list and dashboard screens.
//!
//! # Design
//! Views follow the same host-does-IO split as the client: a view hands
//! the host a `LoadTicket`, the host runs the fetch, and the completion is
//! applied only if the ticket is still current. The generation counter
//! replaces an unstructured "is this effect still active" flag, so
//! out-of-order completions resolve correctly when a view's parameters
//! change quickly.
//!
//! Destructive flows are data, not dialogs: the host collects a
//! `Confirmation` however it likes, and `after_mutation` turns the call's
//! result into an explicit `MutationOutcome`.

use crate::error::ApiError;
use crate::types::{DashboardStats, HealthStatus, LeaderboardEntry};

/// The three mutually exclusive render states of a fetching view.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Loading,
    Failed(String),
    Ready(T),
}

impl<T> LoadState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LoadState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            LoadState::Ready(data) => Some(data),
            _ => None,
        }
    }
}

/// Monotonic request generation. Completions carrying a superseded ticket
/// are dropped.
#[derive(Debug, Default)]
pub struct LoadGuard {
    generation: u64,
}

/// Proof of which load a completion belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadGuard {
    pub fn begin(&mut self) -> LoadTicket {
        self.generation += 1;
        LoadTicket {
            generation: self.generation,
        }
    }

    pub fn accepts(&self, ticket: LoadTicket) -> bool {
        ticket.generation == self.generation
    }
}

/// A full-collection list view: fetch everything on mount, render one of
/// three states, re-fetch from scratch after every mutation.
#[derive(Debug)]
pub struct ListView<T> {
    state: LoadState<Vec<T>>,
    guard: LoadGuard,
}

impl<T> ListView<T> {
    pub fn new() -> Self {
        Self {
            state: LoadState::Loading,
            guard: LoadGuard::default(),
        }
    }

    /// Start (or restart) a full fetch. Prior rows are dropped in favor of
    /// the spinner, matching the screens this models.
    pub fn begin_reload(&mut self) -> LoadTicket {
        self.state = LoadState::Loading;
        self.guard.begin()
    }

    /// Apply a completed fetch. Completions from a superseded reload are
    /// discarded without touching the state.
    pub fn finish(&mut self, ticket: LoadTicket, result: Result<Vec<T>, ApiError>) {
        if !self.guard.accepts(ticket) {
            return;
        }
        self.state = match result {
            Ok(rows) => LoadState::Ready(rows),
            Err(err) => LoadState::Failed(err.to_string()),
        };
    }

    pub fn state(&self) -> &LoadState<Vec<T>> {
        &self.state
    }

    /// Loaded rows; empty unless `Ready`.
    pub fn rows(&self) -> &[T] {
        match &self.state {
            LoadState::Ready(rows) => rows,
            _ => &[],
        }
    }
}

impl<T> Default for ListView<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of the destructive-intent prompt, as data instead of a
/// blocking dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Cancelled,
}

impl Confirmation {
    /// Whether the host should issue the mutation at all.
    pub fn approved(self) -> bool {
        matches!(self, Confirmation::Confirmed)
    }
}

/// What the view does once a mutation call has returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Success: re-fetch the whole collection; no optimistic patching.
    Reload,
    /// Failure: surface the message, leave the loaded rows untouched.
    Alert(String),
}

pub fn after_mutation<T>(result: Result<T, ApiError>) -> MutationOutcome {
    match result {
        Ok(_) => MutationOutcome::Reload,
        Err(err) => MutationOutcome::Alert(err.to_string()),
    }
}

pub const MISSING_STAT: &str = "--";
pub const UNKNOWN_HEALTH: &str = "UNKNOWN";

/// One tile on the public dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCard {
    pub label: &'static str,
    pub value: String,
}

/// The public dashboard: platform stats, top scorers, service health.
/// Every section degrades independently to a placeholder — the dashboard
/// itself never fails.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    stats: Option<DashboardStats>,
    leaderboard: Vec<LeaderboardEntry>,
    health: String,
}

impl DashboardView {
    pub fn from_results(
        stats: Result<DashboardStats, ApiError>,
        leaderboard: Result<Vec<LeaderboardEntry>, ApiError>,
        health: Result<HealthStatus, ApiError>,
    ) -> Self {
        Self {
            stats: stats.ok(),
            leaderboard: leaderboard.unwrap_or_default(),
            health: health
                .map(|h| h.status)
                .unwrap_or_else(|_| UNKNOWN_HEALTH.to_string()),
        }
    }

    pub fn health_status(&self) -> &str {
        &self.health
    }

    pub fn top_players(&self, count: usize) -> &[LeaderboardEntry] {
        &self.leaderboard[..self.leaderboard.len().min(count)]
    }

    /// The four stat tiles, `--` wherever stats were unavailable.
    pub fn stat_cards(&self) -> [StatCard; 4] {
        let stats = self.stats.as_ref();
        let value = |value: Option<String>| value.unwrap_or_else(|| MISSING_STAT.to_string());
        [
            StatCard {
                label: "problems",
                value: value(stats.map(|s| s.total_problems.to_string())),
            },
            StatCard {
                label: "submissions",
                value: value(stats.map(|s| s.total_submissions.to_string())),
            },
            StatCard {
                label: "pass rate",
                value: value(stats.map(|s| format!("{:.0}%", s.success_rate * 100.0))),
            },
            StatCard {
                label: "active users",
                value: value(stats.map(|s| s.total_users.to_string())),
            },
        ]
    }
}
