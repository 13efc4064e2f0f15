use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub type PhaseId = i32;
pub type ProjectId = i64;

/// A unit of project work with a duration and precedence constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub id: PhaseId,
    /// Project-unique display label; also the ordering key for output.
    pub number: String,
    pub title: String,
    /// Effort in hours. Must be positive at the data-entry boundary.
    pub duration: i64,
    #[serde(default)]
    pub predecessors: Vec<PhaseId>,
}

impl Phase {
    pub fn new(
        id: PhaseId,
        number: impl Into<String>,
        title: impl Into<String>,
        duration: i64,
    ) -> Self {
        Self {
            id,
            number: number.into(),
            title: title.into(),
            duration,
            predecessors: Vec::new(),
        }
    }

    pub fn with_predecessors(mut self, predecessors: impl IntoIterator<Item = PhaseId>) -> Self {
        self.predecessors = predecessors.into_iter().collect();
        self
    }

    /// Display ordering: `number` first, `id` only to break ties on malformed data.
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        self.number
            .cmp(&other.number)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Field values for creating or updating a stored phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDraft {
    pub number: String,
    pub title: String,
    pub duration: i64,
    #[serde(default)]
    pub predecessors: Vec<PhaseId>,
}

impl PhaseDraft {
    pub fn new(number: impl Into<String>, title: impl Into<String>, duration: i64) -> Self {
        Self {
            number: number.into(),
            title: title.into(),
            duration,
            predecessors: Vec::new(),
        }
    }

    pub fn with_predecessors(mut self, predecessors: impl IntoIterator<Item = PhaseId>) -> Self {
        self.predecessors = predecessors.into_iter().collect();
        self
    }

    pub fn into_phase(self, id: PhaseId) -> Phase {
        Phase {
            id,
            number: self.number,
            title: self.title,
            duration: self.duration,
            predecessors: self.predecessors,
        }
    }
}
