//! Migration state machine
//!
//! A migration run progresses through:
//! IDLE → FETCHING → ADAPTING → MAPPING → SCORING → IMAGE_PIPELINE → DONE
//!
//! FAILED is absorbing and reachable only from FETCHING (source unreachable
//! or blocked) or on an internal error. A deadline expiry still ends in DONE.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

/// Migration pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MigrationState {
    Idle,
    /// Scraping service call
    Fetching,
    /// Source adapter extraction
    Adapting,
    /// Field mapping and normalization
    Mapping,
    /// Completeness scoring and fallback resolution
    Scoring,
    /// Image download and re-hosting
    ImagePipeline,
    Done,
    Failed,
}

impl MigrationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationState::Idle => "IDLE",
            MigrationState::Fetching => "FETCHING",
            MigrationState::Adapting => "ADAPTING",
            MigrationState::Mapping => "MAPPING",
            MigrationState::Scoring => "SCORING",
            MigrationState::ImagePipeline => "IMAGE_PIPELINE",
            MigrationState::Done => "DONE",
            MigrationState::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MigrationState::Done | MigrationState::Failed)
    }

    /// Whether `next` may follow this state
    ///
    /// Forward moves may skip stages (a deadline can jump to DONE);
    /// FAILED is reachable from any non-terminal state.
    pub fn can_transition_to(&self, next: MigrationState) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == MigrationState::Failed || next.rank() > self.rank()
    }

    fn rank(&self) -> u8 {
        match self {
            MigrationState::Idle => 0,
            MigrationState::Fetching => 1,
            MigrationState::Adapting => 2,
            MigrationState::Mapping => 3,
            MigrationState::Scoring => 4,
            MigrationState::ImagePipeline => 5,
            MigrationState::Done | MigrationState::Failed => 6,
        }
    }
}

impl std::fmt::Display for MigrationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State transition event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub migration_id: Uuid,
    pub old_state: MigrationState,
    pub new_state: MigrationState,
    pub transitioned_at: DateTime<Utc>,
}

/// One migration run (in-memory only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationRun {
    pub migration_id: Uuid,
    pub source_url: String,
    pub state: MigrationState,
    /// States visited, in order, starting with IDLE
    pub history: Vec<MigrationState>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl MigrationRun {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            migration_id: Uuid::new_v4(),
            source_url: source_url.into(),
            state: MigrationState::Idle,
            history: vec![MigrationState::Idle],
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Transition to a new state
    ///
    /// Illegal transitions are ignored and logged; the run keeps its state.
    pub fn transition_to(&mut self, new_state: MigrationState) -> Option<StateTransition> {
        if !self.state.can_transition_to(new_state) {
            warn!(
                migration_id = %self.migration_id,
                from = %self.state,
                to = %new_state,
                "Ignoring illegal migration state transition"
            );
            return None;
        }

        let transition = StateTransition {
            migration_id: self.migration_id,
            old_state: self.state,
            new_state,
            transitioned_at: Utc::now(),
        };
        debug!(
            migration_id = %self.migration_id,
            state = %new_state,
            "Migration state changed"
        );

        self.state = new_state;
        self.history.push(new_state);
        if new_state.is_terminal() {
            self.ended_at = Some(transition.transitioned_at);
        }

        Some(transition)
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Visited states as strings, for metadata
    pub fn history_names(&self) -> Vec<String> {
        self.history.iter().map(|s| s.as_str().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut run = MigrationRun::new("https://www.devalk.nl/x");
        for state in [
            MigrationState::Fetching,
            MigrationState::Adapting,
            MigrationState::Mapping,
            MigrationState::Scoring,
            MigrationState::ImagePipeline,
            MigrationState::Done,
        ] {
            assert!(run.transition_to(state).is_some());
        }
        assert!(run.is_terminal());
        assert!(run.ended_at.is_some());
        assert_eq!(run.history.len(), 7);
        assert_eq!(run.history_names().last().map(String::as_str), Some("DONE"));
    }

    #[test]
    fn test_failed_is_absorbing() {
        let mut run = MigrationRun::new("https://www.devalk.nl/x");
        run.transition_to(MigrationState::Fetching);
        run.transition_to(MigrationState::Failed);
        assert!(run.transition_to(MigrationState::Done).is_none());
        assert_eq!(run.state, MigrationState::Failed);
    }

    #[test]
    fn test_no_backward_moves() {
        let mut run = MigrationRun::new("https://www.devalk.nl/x");
        run.transition_to(MigrationState::Fetching);
        run.transition_to(MigrationState::Mapping);
        assert!(run.transition_to(MigrationState::Adapting).is_none());
        assert_eq!(run.state, MigrationState::Mapping);
    }

    #[test]
    fn test_serialized_names() {
        let json = serde_json::to_string(&MigrationState::ImagePipeline).unwrap();
        assert_eq!(json, "\"IMAGE_PIPELINE\"");
    }
}
