use crate::phase::Phase;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PhaseValidationError {
    message: String,
}

impl PhaseValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub fn validate_phase(phase: &Phase) -> Result<(), PhaseValidationError> {
    if phase.duration <= 0 {
        return Err(PhaseValidationError::new(format!(
            "phase {} has non-positive duration {}",
            phase.id, phase.duration
        )));
    }

    if phase.number.trim().is_empty() {
        return Err(PhaseValidationError::new(format!(
            "phase {} requires a non-empty number",
            phase.id
        )));
    }

    Ok(())
}

/// Checks a phase set as it arrives from storage or a file.
///
/// Self references and predecessor ids outside the set are accepted here;
/// the scheduler strips or ignores them.
pub fn validate_phase_collection(phases: &[Phase]) -> Result<(), PhaseValidationError> {
    let mut seen_ids = HashSet::with_capacity(phases.len());
    let mut seen_numbers = HashSet::with_capacity(phases.len());
    for phase in phases {
        if !seen_ids.insert(phase.id) {
            return Err(PhaseValidationError::new(format!(
                "duplicate phase id {}",
                phase.id
            )));
        }
        if !seen_numbers.insert(phase.number.as_str()) {
            return Err(PhaseValidationError::new(format!(
                "duplicate phase number '{}'",
                phase.number
            )));
        }
        validate_phase(phase)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_and_negative_durations() {
        assert!(validate_phase(&Phase::new(1, "A", "Zero", 0)).is_err());
        assert!(validate_phase(&Phase::new(1, "A", "Negative", -3)).is_err());
        assert!(validate_phase(&Phase::new(1, "A", "Ok", 1)).is_ok());
    }

    #[test]
    fn rejects_blank_number() {
        let err = validate_phase(&Phase::new(4, "  ", "Blank", 2)).unwrap_err();
        assert_eq!(err.to_string(), "phase 4 requires a non-empty number");
    }

    #[test]
    fn collection_rejects_duplicate_ids_and_numbers() {
        let dup_id = vec![Phase::new(1, "A", "x", 1), Phase::new(1, "B", "y", 1)];
        assert_eq!(
            validate_phase_collection(&dup_id).unwrap_err().to_string(),
            "duplicate phase id 1"
        );

        let dup_number = vec![Phase::new(1, "A", "x", 1), Phase::new(2, "A", "y", 1)];
        assert_eq!(
            validate_phase_collection(&dup_number).unwrap_err().to_string(),
            "duplicate phase number 'A'"
        );
    }

    #[test]
    fn collection_tolerates_self_and_dangling_references() {
        let phases = vec![
            Phase::new(1, "A", "Self", 2).with_predecessors([1]),
            Phase::new(2, "B", "Dangling", 2).with_predecessors([99]),
        ];
        assert!(validate_phase_collection(&phases).is_ok());
    }
}
