//! Arena of states with hierarchical name resolution.
//!
//! The nested [`State`] definitions are flattened into a vector of nodes.
//! Each node knows its parent and children by [`StateId`], so paths are plain
//! index sequences and parent/child checks are index lookups.

use super::state::State;
use crate::error::MachineError;
use std::fmt;

/// Stable index of a state inside a [`StateTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(usize);

impl StateId {
    /// Position in the arena.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A state plus its position in the tree. `state.children()` is empty here;
/// use [`StateNode::children`].
#[derive(Debug)]
pub struct StateNode {
    state: State,
    parent: Option<StateId>,
    children: Vec<StateId>,
}

impl StateNode {
    /// The state definition, without its children.
    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn name(&self) -> &str {
        self.state.name()
    }

    /// Parent state, `None` for roots.
    pub fn parent(&self) -> Option<StateId> {
        self.parent
    }

    /// Child states in declaration order.
    pub fn children(&self) -> &[StateId] {
        &self.children
    }
}

/// Immutable state tree owned by a machine.
#[derive(Debug, Default)]
pub struct StateTree {
    nodes: Vec<StateNode>,
    roots: Vec<StateId>,
}

impl StateTree {
    /// Flatten root state definitions into an arena, depth-first. Sibling
    /// order is kept.
    pub fn new(roots: Vec<State>) -> Self {
        let mut tree = StateTree::default();
        let mut pending: Vec<(State, Option<StateId>)> = roots.into_iter().rev().map(|s| (s, None)).collect();

        while let Some((mut state, parent)) = pending.pop() {
            let id = StateId(tree.nodes.len());
            let children = std::mem::take(&mut state.children);
            tree.nodes.push(StateNode {
                state,
                parent,
                children: Vec::with_capacity(children.len()),
            });
            match parent {
                Some(parent) => tree.nodes[parent.0].children.push(id),
                None => tree.roots.push(id),
            }
            pending.extend(children.into_iter().rev().map(|child| (child, Some(id))));
        }
        tree
    }

    /// Root states in declaration order.
    pub fn roots(&self) -> &[StateId] {
        &self.roots
    }

    /// Number of states at every level.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by id.
    pub fn node(&self, id: StateId) -> Option<&StateNode> {
        self.nodes.get(id.0)
    }

    /// All nodes, parents before their children.
    pub fn iter(&self) -> impl Iterator<Item = (StateId, &StateNode)> {
        self.nodes.iter().enumerate().map(|(i, node)| (StateId(i), node))
    }

    // Ids only come from this tree, so indexing is in bounds.
    pub(crate) fn state(&self, id: StateId) -> &State {
        &self.nodes[id.0].state
    }

    /// Resolve a dot-joined full name to the chain of states from a root down
    /// to the named state.
    ///
    /// Returns an empty vector if any segment does not match. The first
    /// sibling with a matching name is taken.
    pub fn resolve(&self, full_name: &str) -> Vec<StateId> {
        let mut path = Vec::new();
        if full_name.is_empty() {
            return path;
        }
        let mut level: &[StateId] = &self.roots;
        for segment in full_name.split('.') {
            let Some(&id) = level.iter().find(|&&id| self.state(id).name() == segment) else {
                return Vec::new();
            };
            path.push(id);
            level = &self.nodes[id.0].children;
        }
        path
    }

    /// Join the names of a chain of states with dots.
    ///
    /// Fails if an element is not a child of the element before it.
    pub fn collapse(&self, path: &[StateId]) -> Result<String, MachineError> {
        let mut names = Vec::with_capacity(path.len());
        let mut prev: Option<StateId> = None;
        for &id in path {
            let node = self.node(id).ok_or_else(|| MachineError::StateNotFound(id.to_string()))?;
            if let Some(parent) = prev {
                if node.parent != Some(parent) {
                    return Err(MachineError::BrokenPath {
                        child: node.name().to_string(),
                        parent: self.state(parent).name().to_string(),
                    });
                }
            }
            names.push(node.name());
            prev = Some(id);
        }
        Ok(names.join("."))
    }

    /// Full dot-joined name of a state, following parent links.
    pub fn full_name(&self, id: StateId) -> String {
        let mut names = Vec::new();
        let mut cursor = self.node(id);
        while let Some(node) = cursor {
            names.push(node.name());
            cursor = node.parent.and_then(|parent| self.node(parent));
        }
        names.reverse();
        names.join(".")
    }

    /// Validate a chain and pair it with its full name.
    pub fn active_path(&self, ids: Vec<StateId>) -> Result<ActivePath, MachineError> {
        let name = self.collapse(&ids)?;
        Ok(ActivePath { ids, name })
    }
}

/// Validated root-to-leaf chain of states together with its full name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivePath {
    ids: Vec<StateId>,
    name: String,
}

impl ActivePath {
    /// Ids from the root down to the leaf.
    pub fn ids(&self) -> &[StateId] {
        &self.ids
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Innermost state of the path.
    pub fn leaf(&self) -> Option<StateId> {
        self.ids.last().copied()
    }
}
