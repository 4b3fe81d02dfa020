//! State of a single play-through.
//!
//! [`GameSession`] does no I/O and reads no clock; every mutating call is
//! handed the current time, which keeps it deterministic under test.

use crate::catalog::GameVariant;
use crate::variant::{ScoringRule, VariantKind};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Completed,
}

/// Live estimate shown while playing; the server's end-of-game figures win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub points: u64,
    pub calories: u64,
}

#[derive(Debug, Clone)]
pub struct GameSession {
    variant: GameVariant,
    started_at: DateTime<Utc>,
    score: u32,
    elapsed_seconds: u64,
    status: SessionStatus,
    server_session_id: Option<String>,
}

impl GameSession {
    pub fn new(variant: GameVariant, started_at: DateTime<Utc>) -> Self {
        Self {
            variant,
            started_at,
            score: 0,
            elapsed_seconds: 0,
            status: SessionStatus::Active,
            server_session_id: None,
        }
    }

    pub fn with_server_session_id(mut self, id: Option<String>) -> Self {
        self.server_session_id = id;
        self
    }

    pub fn variant(&self) -> &GameVariant {
        &self.variant
    }

    pub fn kind(&self) -> VariantKind {
        self.variant.kind
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Whole seconds since start as of the last `record_action` or `tick`.
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    pub fn server_session_id(&self) -> Option<&str> {
        self.server_session_id.as_deref()
    }

    /// Applies one player action. Returns `true` when this call completed
    /// the session; calls on a completed session are ignored.
    pub fn record_action(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_active() {
            return false;
        }
        self.elapsed_seconds = self.elapsed_at(now);
        self.score = match self.variant.kind.scoring_rule() {
            ScoringRule::Tap => self.score.saturating_add(1),
            ScoringRule::Hold => self.held_seconds(),
        };
        self.complete_if(self.score >= self.variant.target_score || self.time_is_up())
    }

    /// Re-evaluates elapsed time. Returns `true` when this call completed the
    /// session: the time limit ran out, or a plank was held to its target.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        self.elapsed_seconds = self.elapsed_at(now);
        if !self.is_active() {
            return false;
        }
        if self.variant.kind.scoring_rule() == ScoringRule::Hold {
            self.score = self.held_seconds();
        }
        self.complete_if(self.score >= self.variant.target_score || self.time_is_up())
    }

    pub fn estimate_metrics(&self) -> Metrics {
        let coefficients = self.variant.kind.coefficients();
        let score = f64::from(self.score);
        Metrics {
            points: (score * coefficients.points).floor() as u64,
            calories: (score * coefficients.calories).floor() as u64,
        }
    }

    /// Fraction of the goal reached, in `[0, 1]`.
    pub fn progress_fraction(&self) -> f64 {
        let target = self.variant.target_score;
        if target == 0 {
            return 1.0;
        }
        let done = match self.variant.kind.scoring_rule() {
            ScoringRule::Tap => f64::from(self.score),
            ScoringRule::Hold => self.elapsed_seconds as f64,
        };
        (done / f64::from(target)).clamp(0.0, 1.0)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            kind: self.variant.kind,
            name: self.variant.name.clone(),
            score: self.score,
            target_score: self.variant.target_score,
            time_limit: self.variant.time_limit,
            elapsed_seconds: self.elapsed_seconds,
            status: self.status,
            metrics: self.estimate_metrics(),
            progress: self.progress_fraction(),
        }
    }

    fn elapsed_at(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from((now - self.started_at).num_seconds()).unwrap_or(0)
    }

    fn held_seconds(&self) -> u32 {
        u32::try_from(self.elapsed_seconds).unwrap_or(u32::MAX)
    }

    fn time_is_up(&self) -> bool {
        self.elapsed_seconds >= u64::from(self.variant.time_limit)
    }

    fn complete_if(&mut self, done: bool) -> bool {
        if done && self.is_active() {
            self.status = SessionStatus::Completed;
            return true;
        }
        false
    }
}

/// Read-only view handed to whatever renders the game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub kind: VariantKind,
    pub name: String,
    pub score: u32,
    pub target_score: u32,
    pub time_limit: u32,
    pub elapsed_seconds: u64,
    pub status: SessionStatus,
    pub metrics: Metrics,
    pub progress: f64,
}
