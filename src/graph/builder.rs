//! Declarative construction of state graphs.

use super::validation::{ensure, finish, Check};
use super::{Region, StateGraph, StateNode, DEFAULT_REGION};
use crate::builder::ConfigurationError;
use crate::core::{State, StateAction};
use std::collections::{HashMap, HashSet};

struct StateDecl<S> {
    id: S,
    parent: Option<S>,
    region: String,
}

/// Collects state declarations and validates them into a [`StateGraph`].
///
/// Declarations may appear in any order; parents are resolved during
/// [`validate`](GraphBuilder::validate).
///
/// # Example
///
/// ```rust
/// use statetree::graph::GraphBuilder;
///
/// let graph = GraphBuilder::new()
///     .state("Root".to_string())
///     .substate("Idle".to_string(), "Root".to_string())
///     .substate("Busy".to_string(), "Root".to_string())
///     .initial("Root".to_string(), "Idle".to_string())
///     .validate()
///     .unwrap();
///
/// assert_eq!(graph.len(), 3);
/// ```
pub struct GraphBuilder<S: State> {
    states: Vec<StateDecl<S>>,
    initials: Vec<(S, S)>,
    entries: Vec<(S, StateAction)>,
    exits: Vec<(S, StateAction)>,
}

impl<S: State> GraphBuilder<S> {
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            initials: Vec::new(),
            entries: Vec::new(),
            exits: Vec::new(),
        }
    }

    /// Register a state, optionally under `parent` in the named region.
    pub fn add_state(mut self, id: S, parent: Option<S>, region: Option<&str>) -> Self {
        self.states.push(StateDecl {
            id,
            parent,
            region: region.unwrap_or(DEFAULT_REGION).to_string(),
        });
        self
    }

    /// Register a root state.
    pub fn state(self, id: S) -> Self {
        self.add_state(id, None, None)
    }

    /// Register a child in the parent's default region.
    pub fn substate(self, id: S, parent: S) -> Self {
        self.add_state(id, Some(parent), None)
    }

    /// Register a child in a named orthogonal region of the parent.
    pub fn substate_in(self, id: S, parent: S, region: &str) -> Self {
        self.add_state(id, Some(parent), Some(region))
    }

    /// Designate the initial child of the region `child` belongs to.
    pub fn set_initial(mut self, parent: S, child: S) -> Self {
        self.initials.push((parent, child));
        self
    }

    /// Alias of [`set_initial`](GraphBuilder::set_initial).
    pub fn initial(self, parent: S, child: S) -> Self {
        self.set_initial(parent, child)
    }

    pub fn on_entry(mut self, state: S, action: StateAction) -> Self {
        self.entries.push((state, action));
        self
    }

    pub fn on_exit(mut self, state: S, action: StateAction) -> Self {
        self.exits.push((state, action));
        self
    }

    /// Validate the declarations and build the graph.
    ///
    /// Structural problems (duplicates, unknown or cyclic parents) are
    /// reported first; region problems are only checked once the tree shape
    /// is sound.
    pub fn validate(self) -> Result<StateGraph<S>, ConfigurationError> {
        if self.states.is_empty() {
            return Err(ConfigurationError::EmptyGraph);
        }

        let mut index: HashMap<S, usize> = HashMap::new();
        let mut checks: Vec<Check> = Vec::new();
        for decl in &self.states {
            let fresh = !index.contains_key(&decl.id);
            checks.push(ensure(fresh, || ConfigurationError::DuplicateState {
                state: decl.id.name().to_string(),
            }));
            if fresh {
                index.insert(decl.id.clone(), index.len());
            }
        }

        // Only the first declaration of a duplicated id takes part in the tree.
        let decls: Vec<&StateDecl<S>> = {
            let mut seen = HashSet::new();
            self.states
                .iter()
                .filter(|d| seen.insert(d.id.clone()))
                .collect()
        };

        for decl in &decls {
            if let Some(parent) = &decl.parent {
                if *parent == decl.id {
                    checks.push(Self::fail(ConfigurationError::SelfParent {
                        state: decl.id.name().to_string(),
                    }));
                } else {
                    checks.push(ensure(index.contains_key(parent), || {
                        ConfigurationError::UnknownParent {
                            state: decl.id.name().to_string(),
                            parent: parent.name().to_string(),
                        }
                    }));
                }
            }
        }
        for (state, _) in self.entries.iter().chain(self.exits.iter()) {
            checks.push(ensure(index.contains_key(state), || {
                ConfigurationError::UnknownState {
                    state: state.name().to_string(),
                }
            }));
        }
        finish(checks)?;

        let parents: Vec<Option<usize>> = decls
            .iter()
            .map(|d| d.parent.as_ref().and_then(|p| index.get(p).copied()))
            .collect();
        let cycles: Vec<Check> = (0..decls.len())
            .map(|i| {
                ensure(!Self::on_cycle(i, &parents), || ConfigurationError::ParentCycle {
                    state: decls[i].id.name().to_string(),
                })
            })
            .collect();
        finish(cycles)?;

        self.assemble(&decls, &index, &parents)
    }

    fn fail(error: ConfigurationError) -> Check {
        ensure(false, || error)
    }

    /// True when following parents from `start` leads back to `start`.
    fn on_cycle(start: usize, parents: &[Option<usize>]) -> bool {
        let mut current = parents[start];
        for _ in 0..parents.len() {
            match current {
                Some(p) if p == start => return true,
                Some(p) => current = parents[p],
                None => return false,
            }
        }
        false
    }

    fn assemble(
        &self,
        decls: &[&StateDecl<S>],
        index: &HashMap<S, usize>,
        parents: &[Option<usize>],
    ) -> Result<StateGraph<S>, ConfigurationError> {
        // Regions in order of first appearance, with their children.
        let mut drafts: Vec<Vec<(String, Vec<usize>, Option<usize>)>> =
            vec![Vec::new(); decls.len()];
        let mut region_of = vec![0usize; decls.len()];
        for (child, parent) in parents.iter().enumerate() {
            let Some(parent) = *parent else { continue };
            let regions = &mut drafts[parent];
            let position = match regions.iter().position(|r| r.0 == decls[child].region) {
                Some(position) => position,
                None => {
                    regions.push((decls[child].region.clone(), Vec::new(), None));
                    regions.len() - 1
                }
            };
            regions[position].1.push(child);
            region_of[child] = position;
        }

        let mut checks = Vec::new();
        for (parent, child) in &self.initials {
            let (Some(&p), Some(&c)) = (index.get(parent), index.get(child)) else {
                checks.push(Self::fail(ConfigurationError::UnknownInitial {
                    parent: parent.name().to_string(),
                    child: child.name().to_string(),
                }));
                continue;
            };
            if parents[c] != Some(p) {
                checks.push(Self::fail(ConfigurationError::InitialNotChild {
                    parent: parent.name().to_string(),
                    child: child.name().to_string(),
                }));
                continue;
            }
            let region = &mut drafts[p][region_of[c]];
            match region.2 {
                Some(existing) if existing != c => {
                    checks.push(Self::fail(ConfigurationError::DuplicateInitial {
                        parent: parent.name().to_string(),
                        region: region.0.clone(),
                    }));
                }
                _ => region.2 = Some(c),
            }
        }
        for (parent, regions) in drafts.iter().enumerate() {
            for (name, _, initial) in regions {
                checks.push(ensure(initial.is_some(), || ConfigurationError::MissingInitial {
                    parent: decls[parent].id.name().to_string(),
                    region: name.clone(),
                }));
            }
        }
        finish(checks)?;

        let mut entries: HashMap<usize, StateAction> = HashMap::new();
        for (state, action) in &self.entries {
            if let Some(&i) = index.get(state) {
                entries.insert(i, action.clone());
            }
        }
        let mut exits: HashMap<usize, StateAction> = HashMap::new();
        for (state, action) in &self.exits {
            if let Some(&i) = index.get(state) {
                exits.insert(i, action.clone());
            }
        }

        let mut nodes: Vec<StateNode<S>> = decls
            .iter()
            .enumerate()
            .map(|(i, decl)| StateNode {
                id: decl.id.clone(),
                parent: parents[i],
                region: region_of[i],
                regions: drafts[i]
                    .iter()
                    .filter_map(|(name, children, initial)| {
                        initial.map(|initial| Region {
                            name: name.clone(),
                            children: children.clone(),
                            initial,
                        })
                    })
                    .collect(),
                entry: entries.remove(&i),
                exit: exits.remove(&i),
                order: 0,
            })
            .collect();

        let roots: Vec<usize> = (0..nodes.len()).filter(|&i| parents[i].is_none()).collect();
        let mut order = 0;
        for &root in &roots {
            Self::number(&mut nodes, root, &mut order);
        }

        Ok(StateGraph {
            nodes,
            index: index.clone(),
            roots,
        })
    }

    fn number(nodes: &mut [StateNode<S>], idx: usize, order: &mut usize) {
        nodes[idx].order = *order;
        *order += 1;
        let children: Vec<usize> = nodes[idx]
            .regions
            .iter()
            .flat_map(|r| r.children.iter().copied())
            .collect();
        for child in children {
            Self::number(nodes, child, order);
        }
    }
}

impl<S: State> Default for GraphBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(name: &str) -> String {
        name.to_string()
    }

    #[test]
    fn empty_graph_is_rejected() {
        let result = GraphBuilder::<String>::new().validate();
        assert!(matches!(result, Err(ConfigurationError::EmptyGraph)));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let result = GraphBuilder::new().state(s("A")).state(s("A")).validate();

        assert_eq!(
            result.unwrap_err(),
            ConfigurationError::DuplicateState { state: s("A") }
        );
    }

    #[test]
    fn self_parent_is_rejected() {
        let result = GraphBuilder::new().substate(s("A"), s("A")).validate();

        assert_eq!(
            result.unwrap_err(),
            ConfigurationError::SelfParent { state: s("A") }
        );
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let result = GraphBuilder::new().substate(s("A"), s("Ghost")).validate();

        assert!(matches!(
            result,
            Err(ConfigurationError::UnknownParent { .. })
        ));
    }

    #[test]
    fn parent_cycles_are_rejected() {
        let result = GraphBuilder::new()
            .substate(s("A"), s("B"))
            .substate(s("B"), s("A"))
            .validate();

        let error = result.unwrap_err();
        assert_eq!(error.problems().len(), 2);
        assert!(error
            .problems()
            .iter()
            .all(|p| matches!(p, ConfigurationError::ParentCycle { .. })));
    }

    #[test]
    fn missing_initial_is_reported_per_region() {
        let result = GraphBuilder::new()
            .state(s("Car"))
            .substate_in(s("Off"), s("Car"), "engine")
            .substate_in(s("Silent"), s("Car"), "radio")
            .initial(s("Car"), s("Off"))
            .validate();

        assert_eq!(
            result.unwrap_err(),
            ConfigurationError::MissingInitial {
                parent: s("Car"),
                region: s("radio"),
            }
        );
    }

    #[test]
    fn initial_must_be_a_child() {
        let result = GraphBuilder::new()
            .state(s("Root"))
            .substate(s("A"), s("Root"))
            .state(s("Other"))
            .initial(s("Root"), s("Other"))
            .validate();

        let error = result.unwrap_err();
        assert!(error
            .problems()
            .iter()
            .any(|p| matches!(p, ConfigurationError::InitialNotChild { .. })));
        assert!(error
            .problems()
            .iter()
            .any(|p| matches!(p, ConfigurationError::MissingInitial { .. })));
    }

    #[test]
    fn conflicting_initials_are_rejected() {
        let result = GraphBuilder::new()
            .state(s("Root"))
            .substate(s("A"), s("Root"))
            .substate(s("B"), s("Root"))
            .initial(s("Root"), s("A"))
            .initial(s("Root"), s("B"))
            .validate();

        assert!(matches!(
            result,
            Err(ConfigurationError::DuplicateInitial { .. })
        ));
    }

    #[test]
    fn behavior_for_unknown_state_is_rejected() {
        let result = GraphBuilder::new()
            .state(s("A"))
            .on_entry(s("B"), StateAction::new(|| Ok(())))
            .validate();

        assert_eq!(
            result.unwrap_err(),
            ConfigurationError::UnknownState { state: s("B") }
        );
    }

    #[test]
    fn parents_may_be_declared_after_children() {
        let graph = GraphBuilder::new()
            .substate(s("Leaf"), s("Root"))
            .state(s("Root"))
            .initial(s("Root"), s("Leaf"))
            .validate()
            .unwrap();

        assert_eq!(graph.ancestors(&s("Leaf")), vec![&s("Leaf"), &s("Root")]);
        assert_eq!(graph.roots(), vec![&s("Root")]);
    }

    #[test]
    fn depth_first_order_follows_regions() {
        let graph = GraphBuilder::new()
            .state(s("Root"))
            .substate_in(s("B1"), s("Root"), "b")
            .substate_in(s("A1"), s("Root"), "a")
            .substate_in(s("B2"), s("Root"), "b")
            .initial(s("Root"), s("B1"))
            .initial(s("Root"), s("A1"))
            .validate()
            .unwrap();

        let order = |name: &str| graph.node(graph.index_of(&s(name)).unwrap()).order;
        assert!(order("Root") < order("B1"));
        assert!(order("B1") < order("B2"));
        assert!(order("B2") < order("A1"));
    }
}
