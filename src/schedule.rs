use crate::calculations::forward_pass::{ForwardPass, PassStrategy};
use crate::calculations::resolver::{Resolution, kahn_order};
use crate::calculations::slack::SlackPass;
use crate::config::{CycleFallback, DurationUnit, SchedulerConfig};
use crate::diagnostic::Diagnostic;
use crate::graph::PhaseDag;
use crate::phase::{Phase, PhaseId};
use serde::Serialize;
use tracing::{debug, warn};

/// One laid-out phase, ready for a renderer. Offsets saturate at `i64::MAX`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledItem {
    pub phase_id: PhaseId,
    pub number: String,
    pub title: String,
    pub start_offset: i64,
    pub duration: i64,
    pub end_offset: i64,
    pub slack: i64,
}

/// Result of one scheduling run. Items are sorted by `number`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleRun {
    pub items: Vec<ScheduledItem>,
    pub resolution: Resolution,
    pub strategy: PassStrategy,
    pub unit: DurationUnit,
    pub diagnostics: Vec<Diagnostic>,
}

impl ScheduleRun {
    /// Largest end offset, i.e. the length of the timeline axis.
    pub fn horizon(&self) -> i64 {
        self.items
            .iter()
            .map(|item| item.end_offset)
            .max()
            .unwrap_or(0)
    }

    /// `true` when a cycle forced a fallback layout.
    pub fn is_degraded(&self) -> bool {
        !self.resolution.is_resolved()
    }

    pub fn item(&self, phase_id: PhaseId) -> Option<&ScheduledItem> {
        self.items.iter().find(|item| item.phase_id == phase_id)
    }
}

/// Scheduler entry point. Holds configuration only; every call to
/// [`Schedule::compute`] derives everything from the phases it is given.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    config: SchedulerConfig,
}

impl Schedule {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn compute(&self, phases: &[Phase]) -> ScheduleRun {
        let dag = PhaseDag::build(phases, self.config.duration_unit);
        let mut diagnostics = dag.diagnostics().to_vec();

        let order = kahn_order(&dag);
        let resolution = Resolution::from_kahn(&dag, &order);
        let engine = ForwardPass::new(&dag);

        let pass = match &resolution {
            Resolution::Resolved { .. } => engine.topological(&order),
            Resolution::Cyclic(report) => {
                warn!(
                    blocked = report.blocked.len(),
                    fallback = ?self.config.cycle_fallback,
                    "dependency cycle detected; using fallback layout"
                );
                diagnostics.extend(report.cycles.iter().map(|cycle| Diagnostic::Cycle {
                    phases: cycle.clone(),
                }));
                match self.config.cycle_fallback {
                    CycleFallback::DisplayOrder => engine.display_order(),
                    CycleFallback::Relaxation => engine.relaxation(self.config.relaxation_cap),
                }
            }
        };

        if pass.cap_reached {
            warn!(
                iterations = pass.iterations,
                "relaxation cap reached; keeping best layout so far"
            );
            diagnostics.push(Diagnostic::RelaxationCapReached {
                iterations: pass.iterations,
            });
        }

        let slack = SlackPass::new(&dag, &pass).execute();

        let items: Vec<ScheduledItem> = dag
            .display_order()
            .map(|ix| {
                let phase = dag.phase(ix);
                let start_offset = pass.start(ix);
                let duration = dag.duration(ix);
                ScheduledItem {
                    phase_id: phase.id,
                    number: phase.number.clone(),
                    title: phase.title.clone(),
                    start_offset,
                    duration,
                    end_offset: start_offset.saturating_add(duration),
                    slack: slack[ix.index()],
                }
            })
            .collect();

        let run = ScheduleRun {
            items,
            resolution,
            strategy: pass.strategy,
            unit: self.config.duration_unit,
            diagnostics,
        };
        debug!(
            phases = run.items.len(),
            strategy = ?run.strategy,
            horizon = run.horizon(),
            "schedule computed"
        );
        run
    }
}

/// Schedule a phase set with the given configuration.
pub fn schedule_phases(phases: &[Phase], config: &SchedulerConfig) -> ScheduleRun {
    Schedule::new(config.clone()).compute(phases)
}
