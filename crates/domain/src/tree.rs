//! Sidebar tree derived from the flat request and group collections.
//!
//! The tree is never stored. It is rebuilt from scratch whenever the
//! collections change, so a node's `source` is a copy of the entity as it
//! was at build time.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::group::Group;
use crate::request::Request;

/// What a tree node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    /// A group, possibly with children.
    Group,
    /// A plain request.
    Request,
    /// A request flagged as an auth configuration.
    AuthConfig,
}

impl NodeKind {
    /// Returns the kind name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Request => "request",
            Self::AuthConfig => "auth-config",
        }
    }
}

/// The entity a node was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSource {
    /// Built from a group
    Group(Group),
    /// Built from a request
    Request(Request),
}

/// One node of the sidebar tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    /// Id of the source entity
    pub id: String,
    /// Display name
    pub name: String,
    /// Node kind
    pub kind: NodeKind,
    /// Source entity
    pub source: NodeSource,
    /// Child groups first, then requests. Always empty for leaves.
    pub children: Vec<TreeNode>,
    /// Whether the children are shown
    pub expanded: bool,
}

impl TreeNode {
    fn group(group: &Group) -> Self {
        Self {
            id: group.id.clone(),
            name: group.name.clone(),
            kind: NodeKind::Group,
            source: NodeSource::Group(group.clone()),
            children: Vec::new(),
            expanded: true,
        }
    }

    fn leaf(request: &Request) -> Self {
        Self {
            id: request.id.clone(),
            name: request.name.clone(),
            kind: if request.is_auth_config {
                NodeKind::AuthConfig
            } else {
                NodeKind::Request
            },
            source: NodeSource::Request(request.clone()),
            children: Vec::new(),
            expanded: false,
        }
    }

    /// Returns true for group nodes.
    #[must_use]
    pub fn is_group(&self) -> bool {
        self.kind == NodeKind::Group
    }

    /// Finds a node by id in this subtree.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Self> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Number of nodes in this subtree, including itself.
    #[must_use]
    pub fn subtree_size(&self) -> usize {
        1 + self.children.iter().map(Self::subtree_size).sum::<usize>()
    }
}

/// Builds the root nodes.
///
/// Groups whose `parent_id` names a known group are nested under it, all
/// others are roots. Requests are attached as leaves of their group; a
/// request whose group is unknown is left out. Groups caught in a parent
/// cycle never reach a root and are left out as well.
#[must_use]
pub fn build_tree(groups: &[Group], requests: &[Request]) -> Vec<TreeNode> {
    let index: HashMap<&str, usize> = groups
        .iter()
        .enumerate()
        .map(|(i, group)| (group.id.as_str(), i))
        .collect();

    let mut child_groups: Vec<Vec<usize>> = vec![Vec::new(); groups.len()];
    let mut roots = Vec::new();
    for (i, group) in groups.iter().enumerate() {
        match group.parent_id.as_deref().and_then(|id| index.get(id)) {
            Some(&parent) => child_groups[parent].push(i),
            None => roots.push(i),
        }
    }

    let mut leaves: Vec<Vec<&Request>> = vec![Vec::new(); groups.len()];
    for request in requests {
        if let Some(&group) = request.group_id.as_deref().and_then(|id| index.get(id)) {
            leaves[group].push(request);
        }
    }

    let assembly = Assembly {
        groups,
        child_groups: &child_groups,
        leaves: &leaves,
    };
    roots.into_iter().map(|i| assembly.node(i)).collect()
}

struct Assembly<'a> {
    groups: &'a [Group],
    child_groups: &'a [Vec<usize>],
    leaves: &'a [Vec<&'a Request>],
}

impl Assembly<'_> {
    // Each group has at most one parent, so walking down from the roots
    // visits every reachable group once.
    fn node(&self, i: usize) -> TreeNode {
        let mut node = TreeNode::group(&self.groups[i]);
        node.children = self.child_groups[i]
            .iter()
            .map(|&child| self.node(child))
            .chain(self.leaves[i].iter().map(|request| TreeNode::leaf(request)))
            .collect();
        node
    }
}

/// A node in display order with its nesting depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatNode<'a> {
    /// Nesting depth, `0` for roots
    pub depth: usize,
    /// The node
    pub node: &'a TreeNode,
}

/// Lists the visible nodes depth-first. Children of collapsed groups are
/// skipped.
#[must_use]
pub fn flatten(roots: &[TreeNode]) -> Vec<FlatNode<'_>> {
    fn walk<'a>(nodes: &'a [TreeNode], depth: usize, out: &mut Vec<FlatNode<'a>>) {
        for node in nodes {
            out.push(FlatNode { depth, node });
            if node.expanded {
                walk(&node.children, depth + 1, out);
            }
        }
    }

    let mut out = Vec::new();
    walk(roots, 0, &mut out);
    out
}
