use crate::phase::PhaseId;
use serde::Serialize;
use std::fmt;

/// Non-fatal problem found in the input of a scheduling run.
///
/// Diagnostics never abort a run; they describe what the scheduler repaired
/// or ignored so callers can surface it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    SelfReference { phase: PhaseId },
    DanglingPredecessor { phase: PhaseId, predecessor: PhaseId },
    DuplicatePredecessor { phase: PhaseId, predecessor: PhaseId },
    DuplicatePhaseId { phase: PhaseId },
    ClampedDuration { phase: PhaseId, duration: i64 },
    Cycle { phases: Vec<PhaseId> },
    RelaxationCapReached { iterations: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::SelfReference { phase } => {
                write!(f, "phase {phase} lists itself as predecessor; edge ignored")
            }
            Diagnostic::DanglingPredecessor { phase, predecessor } => write!(
                f,
                "phase {phase} references unknown predecessor {predecessor}; treated as satisfied"
            ),
            Diagnostic::DuplicatePredecessor { phase, predecessor } => write!(
                f,
                "phase {phase} lists predecessor {predecessor} more than once"
            ),
            Diagnostic::DuplicatePhaseId { phase } => {
                write!(f, "phase id {phase} appears more than once; only the first copy can be a predecessor")
            }
            Diagnostic::ClampedDuration { phase, duration } => write!(
                f,
                "phase {phase} has non-positive duration {duration}; clamped to 1"
            ),
            Diagnostic::Cycle { phases } => {
                let ids = phases
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(" -> ");
                write!(f, "dependency cycle between phases {ids}")
            }
            Diagnostic::RelaxationCapReached { iterations } => write!(
                f,
                "relaxation stopped after {iterations} iterations without settling"
            ),
        }
    }
}
