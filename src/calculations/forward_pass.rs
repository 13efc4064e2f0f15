use crate::graph::PhaseDag;
use crate::phase::PhaseId;
use petgraph::graph::NodeIndex;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// How the earliest starts of a run were derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassStrategy {
    /// Resolved topological order; every precedence edge is honoured.
    Topological,
    /// Single pass in `number` order after a cycle; best effort.
    DisplayOrder,
    /// Repeated relaxation after a cycle, bounded by a safety cap.
    Relaxation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassResult {
    starts: Vec<i64>,
    pub strategy: PassStrategy,
    /// Number of sweeps performed by the relaxation strategy, 1 otherwise.
    pub iterations: usize,
    pub cap_reached: bool,
}

impl PassResult {
    pub fn start(&self, ix: NodeIndex) -> i64 {
        self.starts[ix.index()]
    }

    pub fn starts_by_id(&self, dag: &PhaseDag<'_>) -> HashMap<PhaseId, i64> {
        dag.display_order()
            .map(|ix| (dag.phase(ix).id, self.start(ix)))
            .collect()
    }
}

pub struct ForwardPass<'d, 'a> {
    dag: &'d PhaseDag<'a>,
}

impl<'d, 'a> ForwardPass<'d, 'a> {
    pub fn new(dag: &'d PhaseDag<'a>) -> Self {
        Self { dag }
    }

    /// Earliest starts over a complete topological order.
    pub fn topological(&self, order: &[NodeIndex]) -> PassResult {
        self.sequential(order.iter().copied(), PassStrategy::Topological)
    }

    /// Single pass in display order. A predecessor only counts if it was laid
    /// out earlier in the pass, so the result is bounded even on cyclic input.
    pub fn display_order(&self) -> PassResult {
        self.sequential(self.dag.display_order(), PassStrategy::DisplayOrder)
    }

    /// Relax earliest starts until no sweep changes anything or `cap` sweeps
    /// have run. Hitting the cap is not an error; the last starts are kept.
    pub fn relaxation(&self, cap: usize) -> PassResult {
        let mut starts = vec![0_i64; self.dag.len()];
        let mut iterations = 0;
        let mut settled = false;

        while iterations < cap {
            iterations += 1;
            if !self.relax_once(&mut starts) {
                settled = true;
                break;
            }
        }

        debug!(iterations, settled, "relaxation pass finished");
        PassResult {
            starts,
            strategy: PassStrategy::Relaxation,
            iterations,
            cap_reached: !settled,
        }
    }

    fn sequential(
        &self,
        order: impl Iterator<Item = NodeIndex>,
        strategy: PassStrategy,
    ) -> PassResult {
        let mut starts = vec![0_i64; self.dag.len()];
        let mut end_by_node: HashMap<NodeIndex, i64> = HashMap::with_capacity(self.dag.len());

        for ix in order {
            let start = self
                .dag
                .predecessors(ix)
                .iter()
                .filter_map(|pred| end_by_node.get(pred))
                .max()
                .copied()
                .unwrap_or(0);
            starts[ix.index()] = start;
            end_by_node.insert(ix, start.saturating_add(self.dag.duration(ix)));
        }

        PassResult {
            starts,
            strategy,
            iterations: 1,
            cap_reached: false,
        }
    }

    fn relax_once(&self, starts: &mut [i64]) -> bool {
        let mut changed = false;
        for ix in self.dag.display_order() {
            let candidate = self
                .dag
                .predecessors(ix)
                .iter()
                .map(|&pred| starts[pred.index()].saturating_add(self.dag.duration(pred)))
                .max();
            if let Some(candidate) = candidate {
                if candidate > starts[ix.index()] {
                    starts[ix.index()] = candidate;
                    changed = true;
                }
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::resolver::kahn_order;
    use crate::config::DurationUnit;
    use crate::phase::Phase;

    fn chain() -> Vec<Phase> {
        vec![
            Phase::new(1, "A", "Design", 2),
            Phase::new(2, "B", "Build", 3).with_predecessors([1]),
            Phase::new(3, "C", "Ship", 1).with_predecessors([2]),
        ]
    }

    #[test]
    fn topological_pass_follows_longest_predecessor() {
        let phases = chain();
        let dag = PhaseDag::build(&phases, DurationUnit::Hours);
        let order = kahn_order(&dag);
        let result = ForwardPass::new(&dag).topological(&order);

        let starts = result.starts_by_id(&dag);
        assert_eq!(starts[&1], 0);
        assert_eq!(starts[&2], 2);
        assert_eq!(starts[&3], 5);
        assert_eq!(result.strategy, PassStrategy::Topological);
    }

    #[test]
    fn relaxation_matches_topological_on_acyclic_input() {
        // Numbers are reversed against the dependency direction so the
        // relaxation needs several sweeps.
        let phases = vec![
            Phase::new(1, "Z", "First", 4),
            Phase::new(2, "Y", "Second", 2).with_predecessors([1]),
            Phase::new(3, "X", "Third", 3).with_predecessors([2]),
        ];
        let dag = PhaseDag::build(&phases, DurationUnit::Hours);
        let engine = ForwardPass::new(&dag);
        let relaxed = engine.relaxation(1000);
        let topo = engine.topological(&kahn_order(&dag));

        assert_eq!(relaxed.starts_by_id(&dag), topo.starts_by_id(&dag));
        assert!(!relaxed.cap_reached);
        assert_eq!(relaxed.iterations, 3);
    }

    #[test]
    fn relaxation_stops_at_cap_on_cycle() {
        let phases = vec![
            Phase::new(1, "A", "Ping", 1).with_predecessors([2]),
            Phase::new(2, "B", "Pong", 1).with_predecessors([1]),
        ];
        let dag = PhaseDag::build(&phases, DurationUnit::Hours);
        let result = ForwardPass::new(&dag).relaxation(10);

        assert!(result.cap_reached);
        assert_eq!(result.iterations, 10);
        let starts = result.starts_by_id(&dag);
        assert!(starts[&1] > 0 && starts[&2] > 0);
    }

    #[test]
    fn display_order_pass_only_uses_earlier_phases() {
        let phases = vec![
            Phase::new(1, "A", "Needs B", 2).with_predecessors([2]),
            Phase::new(2, "B", "Needs A", 3).with_predecessors([1]),
        ];
        let dag = PhaseDag::build(&phases, DurationUnit::Hours);
        let starts = ForwardPass::new(&dag).display_order().starts_by_id(&dag);

        assert_eq!(starts[&1], 0);
        assert_eq!(starts[&2], 2);
    }
}
