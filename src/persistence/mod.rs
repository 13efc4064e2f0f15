//! Boundary to the storage that supplies phase sets.
//!
//! The scheduler only reads phases; stores enforce the data-entry rules
//! (positive durations, project-unique numbers, no self references).

use crate::phase::{Phase, PhaseDraft, PhaseId, ProjectId};
use crate::phase_validation;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("phase number '{number}' already exists in project {project_id}")]
    DuplicateNumber { project_id: ProjectId, number: String },

    #[error("phase {0} not found")]
    NotFound(PhaseId),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

pub trait PhaseStore {
    /// All phases of a project, ordered by number.
    fn load_phases(&self, project_id: ProjectId) -> PersistenceResult<Vec<Phase>>;

    /// Insert a phase when `phase_id` is `None`, update it otherwise.
    fn save_phase(
        &self,
        project_id: ProjectId,
        phase_id: Option<PhaseId>,
        draft: &PhaseDraft,
    ) -> PersistenceResult<Phase>;

    /// Insert a whole phase set into a project, all or nothing. Ids in
    /// `phases` are remapped to stored ids; predecessors outside the set are
    /// dropped. Returns the stored phases in input order.
    fn import_phases(
        &self,
        project_id: ProjectId,
        phases: &[Phase],
    ) -> PersistenceResult<Vec<Phase>>;

    /// Remove a phase and every dependency that points at it.
    fn delete_phase(&self, phase_id: PhaseId) -> PersistenceResult<()>;
}

pub fn validate_phases(phases: &[Phase]) -> PersistenceResult<()> {
    phase_validation::validate_phase_collection(phases)
        .map_err(|err| PersistenceError::InvalidData(err.to_string()))
}

/// Predecessor ids as they should be stored: no duplicates, no self reference,
/// first occurrence order preserved.
pub(crate) fn normalized_predecessors(
    phase_id: Option<PhaseId>,
    predecessors: &[PhaseId],
) -> Vec<PhaseId> {
    let mut out: Vec<PhaseId> = Vec::with_capacity(predecessors.len());
    for &pred in predecessors {
        if Some(pred) != phase_id && !out.contains(&pred) {
            out.push(pred);
        }
    }
    out
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    load_phases_from_csv, load_phases_from_json, save_phases_to_csv, save_phases_to_json,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_predecessors_drop_self_and_duplicates() {
        assert_eq!(normalized_predecessors(Some(2), &[3, 2, 1, 3]), vec![3, 1]);
        assert_eq!(normalized_predecessors(None, &[5, 5]), vec![5]);
    }
}
