pub mod calculations;
pub mod config;
pub mod diagnostic;
pub mod graph;
#[cfg(feature = "cli")]
pub mod logging;
pub mod persistence;
pub mod phase;
pub mod phase_validation;
pub mod schedule;

pub use calculations::forward_pass::PassStrategy;
pub use calculations::resolver::{CycleReport, Resolution, resolve, resolve_phases};
pub use config::{ConfigError, CycleFallback, DurationUnit, SchedulerConfig};
pub use diagnostic::Diagnostic;
pub use graph::PhaseDag;
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqlitePhaseStore;
pub use persistence::{
    PersistenceError, PhaseStore, load_phases_from_csv, load_phases_from_json,
    save_phases_to_csv, save_phases_to_json, validate_phases,
};
pub use phase::{Phase, PhaseDraft, PhaseId, ProjectId};
pub use phase_validation::PhaseValidationError;
pub use schedule::{Schedule, ScheduleRun, ScheduledItem, schedule_phases};
