use crate::config::DurationUnit;
use crate::graph::PhaseDag;
use crate::phase::{Phase, PhaseId};
use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::fmt;

/// Outcome of ordering a phase set topologically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    Resolved { order: Vec<PhaseId> },
    Cyclic(CycleReport),
}

/// Why resolution failed, plus the display order callers fall back to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Phases ordered before the resolver stalled.
    pub partial_order: Vec<PhaseId>,
    /// Phases that never became ready, in display order.
    pub blocked: Vec<PhaseId>,
    /// Strongly connected groups of phases that form the cycles.
    pub cycles: Vec<Vec<PhaseId>>,
    /// Every phase ordered by `number` alone.
    pub fallback_order: Vec<PhaseId>,
}

impl Resolution {
    pub(crate) fn from_kahn(dag: &PhaseDag<'_>, nodes: &[NodeIndex]) -> Self {
        if nodes.len() == dag.len() {
            return Resolution::Resolved {
                order: ids_of(dag, nodes.iter().copied()),
            };
        }

        let resolved: HashSet<NodeIndex> = nodes.iter().copied().collect();
        let blocked = ids_of(dag, dag.display_order().filter(|ix| !resolved.contains(ix)));

        let mut components: Vec<Vec<NodeIndex>> = tarjan_scc(&dag.graph)
            .into_iter()
            .filter(|component| component.len() > 1)
            .map(|mut component| {
                component.sort_unstable();
                component
            })
            .collect();
        components.sort();
        let cycles = components
            .into_iter()
            .map(|component| ids_of(dag, component))
            .collect();

        Resolution::Cyclic(CycleReport {
            partial_order: ids_of(dag, nodes.iter().copied()),
            blocked,
            cycles,
            fallback_order: ids_of(dag, dag.display_order()),
        })
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved { .. })
    }

    /// The topological order, or the display-order fallback after a cycle.
    pub fn order(&self) -> &[PhaseId] {
        match self {
            Resolution::Resolved { order } => order,
            Resolution::Cyclic(report) => &report.fallback_order,
        }
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} phases blocked by dependency cycles",
            self.blocked.len(),
            self.fallback_order.len()
        )?;
        for cycle in &self.cycles {
            let members = cycle
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, "; [{members}]")?;
        }
        Ok(())
    }
}

fn ids_of(dag: &PhaseDag<'_>, nodes: impl IntoIterator<Item = NodeIndex>) -> Vec<PhaseId> {
    nodes.into_iter().map(|ix| dag.phase(ix).id).collect()
}

/// Kahn's algorithm over the phase graph.
///
/// The ready queue is seeded with every phase without in-set predecessors in
/// display order. Phases that become ready later are appended at the back and
/// are not re-sorted. The returned order is shorter than the graph when a
/// cycle stalls the queue.
pub(crate) fn kahn_order(dag: &PhaseDag<'_>) -> Vec<NodeIndex> {
    let mut in_degree: Vec<usize> = dag.display_order().map(|ix| dag.in_degree(ix)).collect();
    let mut ready: VecDeque<NodeIndex> = dag
        .display_order()
        .filter(|ix| in_degree[ix.index()] == 0)
        .collect();

    let mut order = Vec::with_capacity(dag.len());
    while let Some(ix) = ready.pop_front() {
        order.push(ix);
        for succ in dag.successors(ix) {
            let degree = &mut in_degree[succ.index()];
            *degree -= 1;
            if *degree == 0 {
                ready.push_back(succ);
            }
        }
    }
    order
}

pub fn resolve(dag: &PhaseDag<'_>) -> Resolution {
    Resolution::from_kahn(dag, &kahn_order(dag))
}

/// Resolve a raw phase set. Durations play no part in ordering.
pub fn resolve_phases(phases: &[Phase]) -> Resolution {
    let dag = PhaseDag::build(phases, DurationUnit::Hours);
    resolve(&dag)
}
