//! Sidebar tree kept in step with the store.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use rattle_domain::{NodeKind, TreeNode, build_tree, flatten};
use tracing::trace;

use crate::store::{StoreObserver, StoreSnapshot};

/// One visible row of the sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    /// Nesting depth, `0` for roots
    pub depth: usize,
    /// Node id
    pub id: String,
    /// Display name
    pub name: String,
    /// Node kind
    pub kind: NodeKind,
    /// Whether the group is expanded
    pub expanded: bool,
    /// Whether the node has children
    pub has_children: bool,
}

#[derive(Default)]
struct ViewState {
    revision: u64,
    roots: Vec<TreeNode>,
    collapsed: HashSet<String>,
}

/// Store observer that rebuilds the tree from every snapshot.
///
/// Collapsed groups are remembered by id, so they stay collapsed across
/// rebuilds.
#[derive(Default)]
pub struct TreeView {
    state: RwLock<ViewState>,
}

impl TreeView {
    /// Creates an empty view. Subscribe it to a store to fill it.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Collapses or expands a group. Returns the new expanded state, or
    /// `None` if no group with this id is shown.
    pub fn toggle(&self, id: &str) -> Option<bool> {
        let mut state = self.state.write();
        let shown = state
            .roots
            .iter()
            .filter_map(|root| root.find(id))
            .any(TreeNode::is_group);
        if !shown {
            return None;
        }

        let was_collapsed = state.collapsed.remove(id);
        if !was_collapsed {
            state.collapsed.insert(id.to_string());
        }
        let ViewState {
            roots, collapsed, ..
        } = &mut *state;
        apply_collapsed(roots, collapsed);
        Some(was_collapsed)
    }

    /// Copy of the current root nodes.
    #[must_use]
    pub fn roots(&self) -> Vec<TreeNode> {
        self.state.read().roots.clone()
    }

    /// Revision of the snapshot the tree was built from.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.state.read().revision
    }

    /// Rows in display order, skipping the contents of collapsed groups.
    #[must_use]
    pub fn visible(&self) -> Vec<TreeRow> {
        let state = self.state.read();
        flatten(&state.roots)
            .into_iter()
            .map(|flat| TreeRow {
                depth: flat.depth,
                id: flat.node.id.clone(),
                name: flat.node.name.clone(),
                kind: flat.node.kind,
                expanded: flat.node.expanded,
                has_children: !flat.node.children.is_empty(),
            })
            .collect()
    }
}

fn apply_collapsed(nodes: &mut [TreeNode], collapsed: &HashSet<String>) {
    for node in nodes {
        if node.is_group() {
            node.expanded = !collapsed.contains(&node.id);
        }
        apply_collapsed(&mut node.children, collapsed);
    }
}

impl StoreObserver for TreeView {
    fn name(&self) -> &str {
        "tree-view"
    }

    fn on_snapshot(&self, snapshot: &Arc<StoreSnapshot>) {
        let mut roots = build_tree(&snapshot.groups, &snapshot.requests);
        let mut state = self.state.write();
        // Forget groups that no longer exist.
        state
            .collapsed
            .retain(|id| snapshot.groups.iter().any(|g| g.id == *id));
        apply_collapsed(&mut roots, &state.collapsed);
        state.roots = roots;
        state.revision = snapshot.revision;
        trace!(revision = snapshot.revision, "tree rebuilt");
    }
}
