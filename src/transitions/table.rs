//! Per-state transition lookup with bubbling.

use super::transition::{Transition, TransitionKind};
use crate::builder::ConfigurationError;
use crate::core::{Event, GuardFault, State, Trigger, TransitionError};
use crate::graph::validation::{check, finish};
use crate::graph::StateGraph;
use tracing::trace;

/// A transition bound to arena indices of a particular graph.
#[derive(Debug, Clone)]
pub(crate) struct TableEntry<S: State, E: Trigger> {
    pub(crate) transition: Transition<S, E>,
    pub(crate) source: usize,
    pub(crate) target: Option<usize>,
    pub(crate) kind: TransitionKind,
}

/// Transitions grouped by source state, in registration order.
#[derive(Debug, Clone)]
pub struct TransitionTable<S: State, E: Trigger> {
    by_state: Vec<Vec<TableEntry<S, E>>>,
}

impl<S: State, E: Trigger> TransitionTable<S, E> {
    /// Create an empty table for `graph`.
    pub fn new(graph: &StateGraph<S>) -> Self {
        Self {
            by_state: vec![Vec::new(); graph.len()],
        }
    }

    /// Build a table from transitions, reporting every invalid one.
    pub fn build(
        graph: &StateGraph<S>,
        transitions: Vec<Transition<S, E>>,
    ) -> Result<Self, ConfigurationError> {
        let mut table = Self::new(graph);
        let checks = transitions
            .into_iter()
            .map(|transition| check(table.add(graph, transition)))
            .collect();
        finish(checks)?;
        Ok(table)
    }

    /// Register a transition after checking it against the graph.
    pub fn add(
        &mut self,
        graph: &StateGraph<S>,
        transition: Transition<S, E>,
    ) -> Result<(), ConfigurationError> {
        let trigger = format!("{:?}", transition.trigger);
        let unknown = |state: &S| ConfigurationError::UnknownTransitionState {
            state: state.name().to_string(),
            trigger: trigger.clone(),
        };

        let source = graph
            .index_of(&transition.source)
            .ok_or_else(|| unknown(&transition.source))?;
        let target = match &transition.target {
            Some(target) => Some(graph.index_of(target).ok_or_else(|| unknown(target))?),
            None => None,
        };

        let kind = transition.effective_kind();
        if let (TransitionKind::Internal, Some(target)) = (kind, target) {
            if target != source {
                return Err(ConfigurationError::InternalTargetMismatch {
                    source_state: transition.source.name().to_string(),
                    target: graph.id(target).name().to_string(),
                    trigger,
                });
            }
        }
        if let Some(target) = target {
            if graph.root_of(source) != graph.root_of(target) {
                return Err(ConfigurationError::CrossTreeTransition {
                    source_state: transition.source.name().to_string(),
                    target: graph.id(target).name().to_string(),
                });
            }
        }

        self.by_state[source].push(TableEntry {
            transition,
            source,
            target,
            kind,
        });
        Ok(())
    }

    /// Total number of registered transitions.
    pub fn len(&self) -> usize {
        self.by_state.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Transitions registered directly on `state` for `trigger`.
    pub fn candidates<'a>(
        &'a self,
        graph: &StateGraph<S>,
        state: &S,
        trigger: &'a E,
    ) -> impl Iterator<Item = &'a Transition<S, E>> + 'a {
        let entries: &'a [TableEntry<S, E>] = graph
            .index_of(state)
            .map(|i| self.by_state[i].as_slice())
            .unwrap_or(&[]);
        entries
            .iter()
            .filter(move |e| e.transition.trigger == *trigger)
            .map(|e| &e.transition)
    }

    /// Find the transition that handles `event`.
    ///
    /// Each active leaf is searched from the leaf up through its ancestors;
    /// states already searched for an earlier leaf are skipped. Candidates at
    /// one state are tried in registration order and the first accepting one
    /// wins. Guard faults are pushed to `faults` and count as a denial.
    pub(crate) fn select(
        &self,
        graph: &StateGraph<S>,
        leaves: &[usize],
        event: &Event<E>,
        faults: &mut Vec<TransitionError>,
    ) -> Option<&TableEntry<S, E>> {
        let mut searched = vec![false; self.by_state.len()];
        for &leaf in leaves {
            for state in graph.ancestor_indices(leaf) {
                if searched[state] {
                    break;
                }
                searched[state] = true;
                for entry in &self.by_state[state] {
                    if entry.transition.trigger != *event.trigger() {
                        continue;
                    }
                    if self.accepts(graph, entry, event, faults) {
                        trace!(
                            transition = %entry.transition.describe(),
                            "transition selected"
                        );
                        return Some(entry);
                    }
                }
            }
        }
        None
    }

    fn accepts(
        &self,
        graph: &StateGraph<S>,
        entry: &TableEntry<S, E>,
        event: &Event<E>,
        faults: &mut Vec<TransitionError>,
    ) -> bool {
        let Some(guard) = &entry.transition.guard else {
            return true;
        };
        let state = graph.id(entry.source).name().to_string();
        let trigger = format!("{:?}", event.trigger());
        match guard.evaluate(event.payload()) {
            Ok(allowed) => allowed,
            Err(GuardFault::TypeMismatch(mismatch)) => {
                faults.push(TransitionError::GuardTypeMismatch {
                    state,
                    trigger,
                    mismatch,
                });
                false
            }
            Err(GuardFault::Panicked(message)) => {
                faults.push(TransitionError::GuardPanicked {
                    state,
                    trigger,
                    message,
                });
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Guard;
    use crate::graph::GraphBuilder;

    fn s(name: &str) -> String {
        name.to_string()
    }

    fn graph() -> StateGraph<String> {
        GraphBuilder::new()
            .state(s("Root"))
            .substate(s("Idle"), s("Root"))
            .substate(s("Active"), s("Root"))
            .substate(s("Running"), s("Active"))
            .substate(s("Paused"), s("Active"))
            .initial(s("Root"), s("Idle"))
            .initial(s("Active"), s("Running"))
            .state(s("Other"))
            .validate()
            .unwrap()
    }

    fn leaf(graph: &StateGraph<String>, name: &str) -> Vec<usize> {
        vec![graph.index_of(&s(name)).unwrap()]
    }

    #[test]
    fn unknown_states_are_rejected() {
        let graph = graph();
        let result = TransitionTable::build(
            &graph,
            vec![Transition::external(s("Idle"), "go", s("Nowhere"))],
        );

        assert!(matches!(
            result,
            Err(ConfigurationError::UnknownTransitionState { .. })
        ));
    }

    #[test]
    fn internal_transitions_must_stay_put() {
        let graph = graph();
        let mut transition = Transition::external(s("Idle"), "tick", s("Active"));
        transition.kind = TransitionKind::Internal;

        let result = TransitionTable::build(&graph, vec![transition]);

        assert!(matches!(
            result,
            Err(ConfigurationError::InternalTargetMismatch { .. })
        ));
    }

    #[test]
    fn cross_tree_transitions_are_rejected() {
        let graph = graph();
        let result = TransitionTable::build(
            &graph,
            vec![Transition::external(s("Idle"), "jump", s("Other"))],
        );

        assert!(matches!(
            result,
            Err(ConfigurationError::CrossTreeTransition { .. })
        ));
    }

    #[test]
    fn all_invalid_transitions_are_reported() {
        let graph = graph();
        let result = TransitionTable::build(
            &graph,
            vec![
                Transition::external(s("Idle"), "a", s("Ghost")),
                Transition::external(s("Idle"), "b", s("Active")),
                Transition::external(s("Idle"), "c", s("Other")),
            ],
        );

        assert_eq!(result.unwrap_err().problems().len(), 2);
    }

    #[test]
    fn lookup_bubbles_to_ancestors() {
        let graph = graph();
        let table = TransitionTable::build(
            &graph,
            vec![Transition::external(s("Active"), "stop", s("Idle"))],
        )
        .unwrap();
        let mut faults = Vec::new();

        let found = table.select(&graph, &leaf(&graph, "Running"), &Event::new("stop"), &mut faults);

        assert_eq!(found.map(|e| e.transition.source.clone()), Some(s("Active")));
        assert!(faults.is_empty());
    }

    #[test]
    fn first_accepting_candidate_wins() {
        let graph = graph();
        let mut denied = Transition::external(s("Running"), "next", s("Idle"));
        denied.guard = Some(Guard::from_fn(|| false));
        let accepted = Transition::external(s("Running"), "next", s("Paused"));
        let shadowed = Transition::external(s("Running"), "next", s("Running"));
        let table = TransitionTable::build(&graph, vec![denied, accepted, shadowed]).unwrap();
        let mut faults = Vec::new();

        let found = table
            .select(&graph, &leaf(&graph, "Running"), &Event::new("next"), &mut faults)
            .unwrap();

        assert_eq!(found.transition.target, Some(s("Paused")));
        assert_eq!(table.candidates(&graph, &s("Running"), &"next").count(), 3);
    }

    #[test]
    fn guard_type_mismatch_counts_as_denial() {
        let graph = graph();
        let mut typed = Transition::external(s("Running"), "set", s("Paused"));
        typed.guard = Some(Guard::new(|n: &i32| *n > 0));
        let fallback = Transition::external(s("Active"), "set", s("Idle"));
        let table = TransitionTable::build(&graph, vec![typed, fallback]).unwrap();
        let mut faults = Vec::new();
        let event = Event::new("set").with_payload(String::from("five"));

        let found = table.select(&graph, &leaf(&graph, "Running"), &event, &mut faults);

        assert_eq!(found.map(|e| e.transition.source.clone()), Some(s("Active")));
        assert_eq!(faults.len(), 1);
        assert!(matches!(
            faults[0],
            TransitionError::GuardTypeMismatch { .. }
        ));
    }

    #[test]
    fn unmatched_trigger_finds_nothing() {
        let graph = graph();
        let table = TransitionTable::build(
            &graph,
            vec![Transition::external(s("Idle"), "start", s("Active"))],
        )
        .unwrap();
        let mut faults = Vec::new();

        let found = table.select(&graph, &leaf(&graph, "Idle"), &Event::new("bogus"), &mut faults);

        assert!(found.is_none());
        assert_eq!(table.len(), 1);
    }
}
