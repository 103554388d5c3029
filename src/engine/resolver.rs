//! Exit and entry chain computation.
//!
//! Everything here is pure: given the graph, the active configuration and a
//! transition, it computes which states to exit and enter and in what order.
//! Running the behavior attached to those states is the dispatcher's job.

use crate::core::State;
use crate::graph::StateGraph;

/// The set of currently active states.
///
/// A state is active when it has been entered and not yet exited. Leaves are
/// active states without an active child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Configuration {
    active: Vec<bool>,
}

impl Configuration {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            active: vec![false; len],
        }
    }

    /// Rebuild a configuration from its leaves.
    ///
    /// Accepts every configuration the worker can leave behind, including
    /// the partial ones a failed entry or exit step produces: the leaves and
    /// their ancestors become active, and a composite may have an empty
    /// region. Fails with the offending state index when a region ends up
    /// with two active children or a listed state is an ancestor of another
    /// listed state.
    pub(crate) fn from_leaves<S: State>(
        graph: &StateGraph<S>,
        leaves: &[usize],
    ) -> Result<Self, usize> {
        let mut config = Self::new(graph.len());
        for &leaf in leaves {
            for state in graph.ancestor_indices(leaf) {
                config.active[state] = true;
            }
        }
        for (state, node) in graph.nodes.iter().enumerate() {
            if !config.active[state] {
                continue;
            }
            for region in &node.regions {
                let active = region.children.iter().filter(|&&c| config.active[c]).count();
                if active > 1 {
                    return Err(state);
                }
            }
        }
        let restored = config.leaves(graph);
        if let Some(&state) = leaves.iter().find(|&&state| !restored.contains(&state)) {
            return Err(state);
        }
        Ok(config)
    }

    pub(crate) fn is_active(&self, state: usize) -> bool {
        self.active.get(state).copied().unwrap_or(false)
    }

    pub(crate) fn activate(&mut self, state: usize) {
        self.active[state] = true;
    }

    pub(crate) fn deactivate(&mut self, state: usize) {
        self.active[state] = false;
    }

    /// Active child of `state` within one of its regions.
    pub(crate) fn active_child<S: State>(
        &self,
        graph: &StateGraph<S>,
        state: usize,
        region: usize,
    ) -> Option<usize> {
        graph.node(state).regions[region]
            .children
            .iter()
            .copied()
            .find(|&c| self.active[c])
    }

    /// Active leaves in depth-first registration order.
    pub(crate) fn leaves<S: State>(&self, graph: &StateGraph<S>) -> Vec<usize> {
        let mut leaves: Vec<usize> = (0..self.active.len())
            .filter(|&state| {
                self.active[state]
                    && !graph.node(state)
                        .regions
                        .iter()
                        .flat_map(|r| r.children.iter())
                        .any(|&c| self.active[c])
            })
            .collect();
        leaves.sort_by_key(|&state| graph.node(state).order);
        leaves
    }
}

/// Ordered exit and entry chains for one external transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TransitionPlan {
    /// States to exit, deepest first.
    pub(crate) exit: Vec<usize>,
    /// States to enter, outermost first.
    pub(crate) entry: Vec<usize>,
}

/// The state whose subtree an external transition from `source` to `target`
/// leaves and re-enters; `None` means the whole tree.
///
/// This is the deepest common ancestor of both ends, except that a target
/// equal to or above the source is itself exited and re-entered.
pub(crate) fn domain<S: State>(graph: &StateGraph<S>, source: usize, target: usize) -> Option<usize> {
    if graph.is_within(source, target) {
        graph.node(target).parent
    } else {
        graph.lca_index(source, target)
    }
}

/// Plan an external transition from `source` to `target`.
pub(crate) fn plan_external<S: State>(
    graph: &StateGraph<S>,
    config: &Configuration,
    source: usize,
    target: usize,
) -> TransitionPlan {
    let mut plan = TransitionPlan::default();
    let Some(lca) = domain(graph, source, target) else {
        let root = graph.root_of(target);
        if config.is_active(root) {
            collect_exit(graph, config, root, &mut plan.exit);
        }
        let path = path_below(graph, None, target);
        enter_along(graph, path[0], &path[1..], &mut plan.entry);
        return plan;
    };

    let mut regions: Vec<usize> = [source, target]
        .into_iter()
        .filter_map(|end| graph.child_toward(lca, end))
        .map(|child| graph.node(child).region)
        .collect();
    regions.sort_unstable();
    regions.dedup();

    for &region in &regions {
        if let Some(active) = config.active_child(graph, lca, region) {
            collect_exit(graph, config, active, &mut plan.exit);
        }
    }

    let path = path_below(graph, Some(lca), target);
    for &region in &regions {
        match path.first() {
            Some(&next) if graph.node(next).region == region => {
                enter_along(graph, next, &path[1..], &mut plan.entry);
            }
            _ => {
                let initial = graph.node(lca).regions[region].initial;
                enter_along(graph, initial, &[], &mut plan.entry);
            }
        }
    }
    plan
}

/// Entry chain for the initial configuration: every root in order.
pub(crate) fn plan_initial<S: State>(graph: &StateGraph<S>) -> Vec<usize> {
    let mut entry = Vec::new();
    for &root in &graph.roots {
        enter_along(graph, root, &[], &mut entry);
    }
    entry
}

/// Exit chain that leaves every active state.
pub(crate) fn plan_shutdown<S: State>(graph: &StateGraph<S>, config: &Configuration) -> Vec<usize> {
    let mut exit = Vec::new();
    for &root in &graph.roots {
        if config.is_active(root) {
            collect_exit(graph, config, root, &mut exit);
        }
    }
    exit
}

/// Active subtree of `state` in post-order, regions in registration order.
fn collect_exit<S: State>(
    graph: &StateGraph<S>,
    config: &Configuration,
    state: usize,
    out: &mut Vec<usize>,
) {
    for region in 0..graph.node(state).regions.len() {
        if let Some(child) = config.active_child(graph, state, region) {
            collect_exit(graph, config, child, out);
        }
    }
    out.push(state);
}

/// Enter `state`, follow `rest` downwards in the region that holds it, and
/// resolve initial children everywhere else.
fn enter_along<S: State>(graph: &StateGraph<S>, state: usize, rest: &[usize], out: &mut Vec<usize>) {
    out.push(state);
    for (index, region) in graph.node(state).regions.iter().enumerate() {
        match rest.first() {
            Some(&next) if graph.node(next).region == index => {
                enter_along(graph, next, &rest[1..], out);
            }
            _ => enter_along(graph, region.initial, &[], out),
        }
    }
}

/// States strictly below `ancestor` down to `target`, outermost first.
fn path_below<S: State>(graph: &StateGraph<S>, ancestor: Option<usize>, target: usize) -> Vec<usize> {
    let mut path: Vec<usize> = graph
        .ancestor_indices(target)
        .into_iter()
        .take_while(|&state| Some(state) != ancestor)
        .collect();
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    fn s(name: &str) -> String {
        name.to_string()
    }

    /// Root
    /// ├── Idle
    /// └── Active
    ///     ├── [playback] Running, Paused
    ///     └── [volume]   Quiet, Loud
    fn graph() -> StateGraph<String> {
        GraphBuilder::new()
            .state(s("Root"))
            .substate(s("Idle"), s("Root"))
            .substate(s("Active"), s("Root"))
            .substate_in(s("Running"), s("Active"), "playback")
            .substate_in(s("Paused"), s("Active"), "playback")
            .substate_in(s("Quiet"), s("Active"), "volume")
            .substate_in(s("Loud"), s("Active"), "volume")
            .initial(s("Root"), s("Idle"))
            .initial(s("Active"), s("Running"))
            .initial(s("Active"), s("Quiet"))
            .validate()
            .unwrap()
    }

    fn idx(graph: &StateGraph<String>, name: &str) -> usize {
        graph.index_of(&s(name)).unwrap()
    }

    fn names(graph: &StateGraph<String>, states: &[usize]) -> Vec<String> {
        states.iter().map(|&i| graph.id(i).clone()).collect()
    }

    fn configuration(graph: &StateGraph<String>, leaves: &[&str]) -> Configuration {
        let leaves: Vec<usize> = leaves.iter().map(|l| idx(graph, l)).collect();
        Configuration::from_leaves(graph, &leaves).unwrap()
    }

    fn apply(config: &mut Configuration, plan: &TransitionPlan) {
        for &state in &plan.exit {
            config.deactivate(state);
        }
        for &state in &plan.entry {
            config.activate(state);
        }
    }

    #[test]
    fn initial_plan_enters_every_region() {
        let graph = graph();

        let entry = plan_initial(&graph);

        assert_eq!(names(&graph, &entry), vec![s("Root"), s("Idle")]);
    }

    #[test]
    fn entering_a_composite_resolves_all_regions() {
        let graph = graph();
        let config = configuration(&graph, &["Idle"]);

        let plan = plan_external(&graph, &config, idx(&graph, "Idle"), idx(&graph, "Active"));

        assert_eq!(names(&graph, &plan.exit), vec![s("Idle")]);
        assert_eq!(
            names(&graph, &plan.entry),
            vec![s("Active"), s("Running"), s("Quiet")]
        );
    }

    #[test]
    fn leaving_a_composite_exits_regions_deepest_first() {
        let graph = graph();
        let config = configuration(&graph, &["Paused", "Loud"]);

        let plan = plan_external(&graph, &config, idx(&graph, "Active"), idx(&graph, "Idle"));

        assert_eq!(
            names(&graph, &plan.exit),
            vec![s("Paused"), s("Loud"), s("Active")]
        );
        assert_eq!(names(&graph, &plan.entry), vec![s("Idle")]);
    }

    #[test]
    fn transition_to_a_child_keeps_the_parent() {
        let graph = graph();
        let config = configuration(&graph, &["Running", "Loud"]);

        let plan = plan_external(&graph, &config, idx(&graph, "Active"), idx(&graph, "Paused"));

        assert_eq!(names(&graph, &plan.exit), vec![s("Running")]);
        assert_eq!(names(&graph, &plan.entry), vec![s("Paused")]);
    }

    #[test]
    fn self_transition_reenters_the_source() {
        let graph = graph();
        let config = configuration(&graph, &["Running", "Quiet"]);

        let plan = plan_external(&graph, &config, idx(&graph, "Active"), idx(&graph, "Active"));

        assert_eq!(
            names(&graph, &plan.exit),
            vec![s("Running"), s("Quiet"), s("Active")]
        );
        assert_eq!(
            names(&graph, &plan.entry),
            vec![s("Active"), s("Running"), s("Quiet")]
        );
    }

    #[test]
    fn transition_to_an_ancestor_reenters_it() {
        let graph = graph();
        let config = configuration(&graph, &["Paused", "Loud"]);

        let plan = plan_external(&graph, &config, idx(&graph, "Paused"), idx(&graph, "Active"));

        assert_eq!(
            names(&graph, &plan.exit),
            vec![s("Paused"), s("Loud"), s("Active")]
        );
        assert_eq!(
            names(&graph, &plan.entry),
            vec![s("Active"), s("Running"), s("Quiet")]
        );
    }

    #[test]
    fn sibling_region_is_untouched() {
        let graph = graph();
        let mut config = configuration(&graph, &["Running", "Loud"]);

        let plan = plan_external(&graph, &config, idx(&graph, "Running"), idx(&graph, "Paused"));
        apply(&mut config, &plan);

        assert_eq!(names(&graph, &plan.exit), vec![s("Running")]);
        assert_eq!(
            names(&graph, &config.leaves(&graph)),
            vec![s("Paused"), s("Loud")]
        );
    }

    #[test]
    fn root_self_transition_restarts_the_tree() {
        let graph = graph();
        let config = configuration(&graph, &["Idle"]);

        let plan = plan_external(&graph, &config, idx(&graph, "Root"), idx(&graph, "Root"));

        assert_eq!(names(&graph, &plan.exit), vec![s("Idle"), s("Root")]);
        assert_eq!(names(&graph, &plan.entry), vec![s("Root"), s("Idle")]);
    }

    #[test]
    fn shutdown_exits_everything_leaf_first() {
        let graph = graph();
        let config = configuration(&graph, &["Paused", "Quiet"]);

        let exit = plan_shutdown(&graph, &config);

        assert_eq!(
            names(&graph, &exit),
            vec![s("Paused"), s("Quiet"), s("Active"), s("Root")]
        );
    }

    #[test]
    fn partial_leaf_sets_are_restored() {
        let graph = graph();

        let config = configuration(&graph, &["Active"]);
        assert!(config.is_active(idx(&graph, "Root")));
        assert_eq!(names(&graph, &config.leaves(&graph)), vec![s("Active")]);

        let config = configuration(&graph, &["Paused"]);
        assert_eq!(config.active_child(&graph, idx(&graph, "Active"), 1), None);
        assert_eq!(names(&graph, &config.leaves(&graph)), vec![s("Paused")]);

        let config = configuration(&graph, &[]);
        assert!(config.leaves(&graph).is_empty());
    }

    #[test]
    fn conflicting_leaf_sets_are_rejected() {
        let graph = graph();

        assert_eq!(
            Configuration::from_leaves(
                &graph,
                &[idx(&graph, "Idle"), idx(&graph, "Paused"), idx(&graph, "Quiet")]
            ),
            Err(idx(&graph, "Root"))
        );
        assert_eq!(
            Configuration::from_leaves(&graph, &[idx(&graph, "Running"), idx(&graph, "Paused")]),
            Err(idx(&graph, "Active"))
        );
        assert_eq!(
            Configuration::from_leaves(&graph, &[idx(&graph, "Active"), idx(&graph, "Quiet")]),
            Err(idx(&graph, "Active"))
        );
    }
}
