//! The immutable state hierarchy.
//!
//! A [`StateGraph`] is a forest: each root starts an independent tree, and
//! every composite state groups its children into one or more orthogonal
//! regions. Graphs are produced by [`GraphBuilder::validate`] and never change
//! afterwards, so the dispatcher can share them freely.
//!
//! States are stored in an arena in registration order. Indices into that
//! arena are used internally; the public API speaks in state keys.

mod builder;
pub(crate) mod validation;

pub use builder::GraphBuilder;

use crate::core::{State, StateAction};
use std::collections::HashMap;

/// Region name used when a child is registered without one.
pub const DEFAULT_REGION: &str = "main";

/// An orthogonal group of children inside a composite state.
#[derive(Debug, Clone)]
pub struct Region {
    pub(crate) name: String,
    pub(crate) children: Vec<usize>,
    pub(crate) initial: usize,
}

impl Region {
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone)]
pub(crate) struct StateNode<S: State> {
    pub(crate) id: S,
    pub(crate) parent: Option<usize>,
    /// Index of the parent's region holding this state.
    pub(crate) region: usize,
    pub(crate) regions: Vec<Region>,
    pub(crate) entry: Option<StateAction>,
    pub(crate) exit: Option<StateAction>,
    /// Position in a depth-first walk of the forest.
    pub(crate) order: usize,
}

/// Validated state hierarchy.
#[derive(Debug, Clone)]
pub struct StateGraph<S: State> {
    pub(crate) nodes: Vec<StateNode<S>>,
    pub(crate) index: HashMap<S, usize>,
    pub(crate) roots: Vec<usize>,
}

impl<S: State> StateGraph<S> {
    /// Number of states in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, state: &S) -> bool {
        self.index.contains_key(state)
    }

    /// Root states in registration order.
    pub fn roots(&self) -> Vec<&S> {
        self.roots.iter().map(|&i| &self.nodes[i].id).collect()
    }

    pub fn parent(&self, state: &S) -> Option<&S> {
        let idx = self.index_of(state)?;
        self.nodes[idx].parent.map(|p| &self.nodes[p].id)
    }

    /// Children of `state`, grouped by region in registration order.
    pub fn regions(&self, state: &S) -> Vec<(&str, Vec<&S>)> {
        self.index_of(state)
            .map(|idx| {
                self.nodes[idx]
                    .regions
                    .iter()
                    .map(|r| {
                        let children = r.children.iter().map(|&c| &self.nodes[c].id).collect();
                        (r.name(), children)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Ordered sequence from `state` up to its root, both included.
    ///
    /// Empty when the state is unknown.
    pub fn ancestors(&self, state: &S) -> Vec<&S> {
        self.index_of(state)
            .map(|idx| {
                self.ancestor_indices(idx)
                    .into_iter()
                    .map(|i| &self.nodes[i].id)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// True when `a` lies strictly below `b` in the hierarchy.
    pub fn is_descendant(&self, a: &S, b: &S) -> bool {
        match (self.index_of(a), self.index_of(b)) {
            (Some(a), Some(b)) => a != b && self.is_within(a, b),
            _ => false,
        }
    }

    /// Deepest state that is an ancestor of (or equal to) both `a` and `b`.
    pub fn lca(&self, a: &S, b: &S) -> Option<&S> {
        let a = self.index_of(a)?;
        let b = self.index_of(b)?;
        self.lca_index(a, b).map(|i| &self.nodes[i].id)
    }

    /// Leaves reached by entering `state` and following initial children in
    /// every region.
    pub fn default_leaves(&self, state: &S) -> Vec<&S> {
        let mut leaves = Vec::new();
        if let Some(idx) = self.index_of(state) {
            self.collect_default_leaves(idx, &mut leaves);
        }
        leaves.into_iter().map(|i| &self.nodes[i].id).collect()
    }

    pub(crate) fn index_of(&self, state: &S) -> Option<usize> {
        self.index.get(state).copied()
    }

    pub(crate) fn id(&self, idx: usize) -> &S {
        &self.nodes[idx].id
    }

    pub(crate) fn node(&self, idx: usize) -> &StateNode<S> {
        &self.nodes[idx]
    }

    pub(crate) fn ancestor_indices(&self, idx: usize) -> Vec<usize> {
        let mut chain = vec![idx];
        let mut current = self.nodes[idx].parent;
        while let Some(p) = current {
            chain.push(p);
            current = self.nodes[p].parent;
        }
        chain
    }

    /// True when `a` equals `b` or lies below it.
    pub(crate) fn is_within(&self, a: usize, b: usize) -> bool {
        let mut current = Some(a);
        while let Some(c) = current {
            if c == b {
                return true;
            }
            current = self.nodes[c].parent;
        }
        false
    }

    pub(crate) fn lca_index(&self, a: usize, b: usize) -> Option<usize> {
        let above_b = self.ancestor_indices(b);
        self.ancestor_indices(a)
            .into_iter()
            .find(|candidate| above_b.contains(candidate))
    }

    pub(crate) fn root_of(&self, idx: usize) -> usize {
        let mut current = idx;
        while let Some(p) = self.nodes[current].parent {
            current = p;
        }
        current
    }

    /// Child of `ancestor` on the path down to `descendant`.
    pub(crate) fn child_toward(&self, ancestor: usize, descendant: usize) -> Option<usize> {
        let mut current = descendant;
        while let Some(p) = self.nodes[current].parent {
            if p == ancestor {
                return Some(current);
            }
            current = p;
        }
        None
    }

    fn collect_default_leaves(&self, idx: usize, leaves: &mut Vec<usize>) {
        let node = &self.nodes[idx];
        if node.regions.is_empty() {
            leaves.push(idx);
            return;
        }
        for region in &node.regions {
            self.collect_default_leaves(region.initial, leaves);
        }
    }
}
