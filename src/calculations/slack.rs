use crate::calculations::forward_pass::PassResult;
use crate::graph::PhaseDag;
use crate::phase::PhaseId;
use petgraph::graph::NodeIndex;

/// Downstream-facing float of each phase.
///
/// A phase has slack when it feeds a merge point (a successor with two or
/// more in-set predecessors) and finishes before the latest-finishing
/// predecessor of that merge point. The slack is the largest such gap over
/// all immediate merge-point successors; successors further downstream are
/// not considered. This is not the classical backward-pass total float.
pub struct SlackPass<'d, 'a> {
    dag: &'d PhaseDag<'a>,
    ends: Vec<i64>,
}

impl<'d, 'a> SlackPass<'d, 'a> {
    pub fn new(dag: &'d PhaseDag<'a>, pass: &PassResult) -> Self {
        let ends = dag
            .display_order()
            .map(|ix| pass.start(ix).saturating_add(dag.duration(ix)))
            .collect();
        Self { dag, ends }
    }

    pub fn slack_for(&self, ix: NodeIndex) -> i64 {
        let own_end = self.ends[ix.index()];
        self.dag
            .successors(ix)
            .into_iter()
            .filter(|&succ| self.dag.in_degree(succ) >= 2)
            .filter_map(|succ| {
                self.dag
                    .predecessors(succ)
                    .iter()
                    .map(|pred| self.ends[pred.index()])
                    .max()
            })
            .filter(|&latest_end| own_end < latest_end)
            .map(|latest_end| latest_end - own_end)
            .max()
            .unwrap_or(0)
    }

    /// Slack of the phase with the given id; 0 for ids outside the set.
    pub fn slack_for_phase(&self, id: PhaseId) -> i64 {
        self.dag
            .index_of(id)
            .map(|ix| self.slack_for(ix))
            .unwrap_or(0)
    }

    /// Slack of every node, indexed like the graph.
    pub fn execute(&self) -> Vec<i64> {
        self.dag
            .display_order()
            .map(|ix| self.slack_for(ix))
            .collect()
    }
}
