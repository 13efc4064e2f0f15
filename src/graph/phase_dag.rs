use crate::config::DurationUnit;
use crate::diagnostic::Diagnostic;
use crate::phase::{Phase, PhaseId};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Precedence graph of one phase set, edges pointing predecessor -> successor.
///
/// Nodes are inserted in display order (`number`, then `id`), so ordering
/// node indices is the same as ordering phases for display. Input defects are
/// repaired while building and reported through [`PhaseDag::diagnostics`].
pub struct PhaseDag<'a> {
    pub graph: DiGraph<PhaseId, ()>,
    phases: Vec<&'a Phase>,
    id_to_index: HashMap<PhaseId, NodeIndex>,
    durations: Vec<i64>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> PhaseDag<'a> {
    pub fn build(phases: &'a [Phase], unit: DurationUnit) -> Self {
        let mut sorted: Vec<&'a Phase> = phases.iter().collect();
        sorted.sort_by(|a, b| a.display_cmp(b));

        let mut graph: DiGraph<PhaseId, ()> = DiGraph::with_capacity(sorted.len(), sorted.len());
        let mut id_to_index: HashMap<PhaseId, NodeIndex> = HashMap::with_capacity(sorted.len());
        let mut durations = Vec::with_capacity(sorted.len());
        let mut diagnostics = Vec::new();

        // Add nodes first
        for phase in &sorted {
            let node_ix = graph.add_node(phase.id);
            if id_to_index.contains_key(&phase.id) {
                warn!(phase = phase.id, "duplicate phase id in phase set");
                diagnostics.push(Diagnostic::DuplicatePhaseId { phase: phase.id });
            } else {
                id_to_index.insert(phase.id, node_ix);
            }

            if phase.duration <= 0 {
                warn!(
                    phase = phase.id,
                    duration = phase.duration,
                    "non-positive duration clamped to one unit"
                );
                diagnostics.push(Diagnostic::ClampedDuration {
                    phase: phase.id,
                    duration: phase.duration,
                });
            }
            durations.push(unit.convert(phase.duration));
        }

        // Add edges: pred -> phase
        for (position, phase) in sorted.iter().enumerate() {
            let node_ix = NodeIndex::new(position);
            let mut seen = HashSet::with_capacity(phase.predecessors.len());
            for &pred_id in &phase.predecessors {
                if !seen.insert(pred_id) {
                    diagnostics.push(Diagnostic::DuplicatePredecessor {
                        phase: phase.id,
                        predecessor: pred_id,
                    });
                    continue;
                }
                if pred_id == phase.id {
                    warn!(phase = phase.id, "self-referencing predecessor stripped");
                    diagnostics.push(Diagnostic::SelfReference { phase: phase.id });
                    continue;
                }
                match id_to_index.get(&pred_id) {
                    Some(&pred_ix) => {
                        graph.add_edge(pred_ix, node_ix, ());
                    }
                    None => {
                        warn!(
                            phase = phase.id,
                            predecessor = pred_id,
                            "predecessor outside phase set ignored"
                        );
                        diagnostics.push(Diagnostic::DanglingPredecessor {
                            phase: phase.id,
                            predecessor: pred_id,
                        });
                    }
                }
            }
        }

        Self {
            graph,
            phases: sorted,
            id_to_index,
            durations,
            diagnostics,
        }
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn phase(&self, ix: NodeIndex) -> &'a Phase {
        self.phases[ix.index()]
    }

    pub fn index_of(&self, id: PhaseId) -> Option<NodeIndex> {
        self.id_to_index.get(&id).copied()
    }

    /// Duration of a node in the run's time units, always at least 1.
    pub fn duration(&self, ix: NodeIndex) -> i64 {
        self.durations[ix.index()]
    }

    /// All nodes in display order.
    pub fn display_order(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    /// In-set predecessors of a node, in display order.
    pub fn predecessors(&self, ix: NodeIndex) -> Vec<NodeIndex> {
        self.neighbors_sorted(ix, Direction::Incoming)
    }

    /// Phases that list this node as a predecessor, in display order.
    pub fn successors(&self, ix: NodeIndex) -> Vec<NodeIndex> {
        self.neighbors_sorted(ix, Direction::Outgoing)
    }

    pub fn in_degree(&self, ix: NodeIndex) -> usize {
        self.graph.neighbors_directed(ix, Direction::Incoming).count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    fn neighbors_sorted(&self, ix: NodeIndex, dir: Direction) -> Vec<NodeIndex> {
        let mut nodes: Vec<NodeIndex> = self.graph.neighbors_directed(ix, dir).collect();
        nodes.sort_unstable();
        nodes
    }
}
