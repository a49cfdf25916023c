use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::{AssessmentInput, AssessmentRecord, Catalog, FamilyCode, ScoreEngine, ScoringError};

pub const SESSION_VERSION: u32 = 1;

/// Persisted form of a session: the raw inputs in the order they were added.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub version: u32,
    #[serde(default)]
    pub entries: Vec<SessionEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEntry {
    pub recorded_at: DateTime<Utc>,
    #[serde(flatten)]
    pub input: AssessmentInput,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            version: SESSION_VERSION,
            entries: Vec::new(),
        }
    }
}

/// A scoring engine paired with the state it was replayed from.
///
/// Entries and engine records stay index-aligned: an entry is only stored
/// after the engine accepted it.
#[derive(Debug, Clone)]
pub struct Session {
    state: SessionState,
    engine: ScoreEngine,
}

impl Session {
    /// Rebuild the engine by replaying every stored entry.
    ///
    /// # Errors
    ///
    /// Fails on the first entry the catalog no longer accepts, e.g. a family
    /// that was removed from the config.
    pub fn replay(catalog: Catalog, state: SessionState) -> Result<Self, (usize, ScoringError)> {
        let mut engine = ScoreEngine::new(catalog);
        for (i, entry) in state.entries.iter().enumerate() {
            engine.add_assessment(entry.input.clone()).map_err(|e| (i, e))?;
        }
        Ok(Self { state, engine })
    }

    pub fn record(&mut self, input: AssessmentInput) -> Result<AssessmentRecord, ScoringError> {
        let record = self.engine.add_assessment(input.clone())?;
        self.state.entries.push(SessionEntry {
            recorded_at: Utc::now(),
            input,
        });
        Ok(record)
    }

    pub fn engine(&self) -> &ScoreEngine {
        &self.engine
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Records with the time they were added, optionally for one family.
    pub fn timeline(&self, family: Option<&FamilyCode>) -> Vec<(DateTime<Utc>, &AssessmentRecord)> {
        self.state
            .entries
            .iter()
            .zip(self.engine.list_assessments(None))
            .filter(|(_, record)| family.map_or(true, |f| &record.input.family == f))
            .map(|(entry, record)| (entry.recorded_at, record))
            .collect()
    }
}
