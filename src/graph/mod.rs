//! Precedence graph built from a phase set.

pub mod phase_dag;

pub use phase_dag::PhaseDag;
