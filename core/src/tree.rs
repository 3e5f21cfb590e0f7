//! Rooted phylogenetic trees.
//!
//! A [`Tree`] is stored as an arena of nodes addressed by [`NodeId`]. Each node knows its parent,
//! its children, the length of the branch to its parent, and optionally a name. The root is the
//! only node without a parent, and its branch length, if any, is never used.
//!
//! Trees are typically built once by some external loader, and then only read. Before computing
//! phylogenetic diversity, a tree is validated and its tips indexed by name in a [`TipIndex`].

use std::{fmt, ops::Index};

mod index;
pub use index::{DuplicateNodeError, MissingNodeError, TipIndex};

/// Identifier of a node in a [`Tree`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the position of the node in the tree arena.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node {}", self.0)
    }
}

/// A node in a [`Tree`].
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    length: Option<f64>,
    name: Option<String>,
}

impl Node {
    fn new(parent: Option<NodeId>, name: Option<&str>, length: Option<f64>) -> Self {
        Self {
            parent,
            children: Vec::new(),
            length,
            name: name.map(String::from),
        }
    }

    /// Returns the parent, or `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns the children in insertion order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Returns the length of the branch to the parent, if any.
    pub fn length(&self) -> Option<f64> {
        self.length
    }

    /// Returns the name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns `true` if the node has no children.
    pub fn is_tip(&self) -> bool {
        self.children.is_empty()
    }
}

/// A rooted tree with optional branch lengths and node names.
#[derive(Clone, Debug, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Tree {
    /// Creates a new tree consisting of an unnamed root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(None, None, None)],
            root: NodeId(0),
        }
    }

    /// Creates a new tree consisting of a named root.
    pub fn with_root_name(name: &str) -> Self {
        Self {
            nodes: vec![Node::new(None, Some(name), None)],
            root: NodeId(0),
        }
    }

    /// Adds a child to an existing node and returns its id.
    ///
    /// # Panics
    ///
    /// Panics if `parent` does not belong to this tree.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: Option<&str>,
        length: Option<f64>,
    ) -> NodeId {
        assert!(parent.0 < self.nodes.len(), "{parent} not in tree");

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(Some(parent), name, length));
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Creates a tree from parallel arrays of parents, branch lengths, and names.
    ///
    /// Node `i` has parent `parents[i]`, and exactly one node must be without a parent; this is
    /// the root. Node ids of the returned tree correspond to positions in the input, and children
    /// are ordered by position.
    pub fn from_parents(
        parents: &[Option<usize>],
        lengths: &[Option<f64>],
        names: &[Option<&str>],
    ) -> Result<Self, TreeError> {
        if lengths.len() != parents.len() || names.len() != parents.len() {
            return Err(TreeError::LengthMismatch {
                parents: parents.len(),
                lengths: lengths.len(),
                names: names.len(),
            });
        }

        let mut roots = parents
            .iter()
            .enumerate()
            .filter_map(|(i, parent)| parent.is_none().then_some(NodeId(i)));
        let root = roots.next().ok_or(TreeError::NoRoot)?;
        if let Some(other) = roots.next() {
            return Err(TreeError::MultipleRoots { first: root, other });
        }

        if let Some((node, parent)) = parents
            .iter()
            .enumerate()
            .find_map(|(i, parent)| parent.filter(|&p| p >= parents.len()).map(|p| (i, p)))
        {
            return Err(TreeError::InvalidParent {
                node: NodeId(node),
                parent,
            });
        }

        let mut nodes = parents
            .iter()
            .zip(lengths.iter())
            .zip(names.iter())
            .map(|((&parent, &length), &name)| Node::new(parent.map(NodeId), name, length))
            .collect::<Vec<_>>();
        for (i, parent) in parents.iter().enumerate() {
            if let Some(parent) = parent {
                nodes[*parent].children.push(NodeId(i));
            }
        }

        let tree = Self { nodes, root };

        // Nodes on or below a cycle are exactly those a walk down from the root never visits
        let mut visited = vec![false; tree.nodes.len()];
        for id in tree.preorder() {
            visited[id.0] = true;
        }
        if let Some(node) = visited.iter().position(|&visited| !visited) {
            return Err(TreeError::Cycle { node: NodeId(node) });
        }

        Ok(tree)
    }

    /// Returns the root.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the number of nodes, including the root.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the node with the provided id, if it belongs to this tree.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Returns an iterator over all node ids in arena order.
    pub fn iter_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Returns an iterator over the tips, i.e. nodes without children, in arena order.
    pub fn tips(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter_ids().filter(|&id| self[id].is_tip())
    }

    /// Returns an iterator from a node to the root, starting with the node itself.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: Some(id),
        }
    }

    /// Returns node ids in pre-order, i.e. each node before its children.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];

        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self[id].children.iter().rev());
        }

        order
    }

    /// Returns node ids in post-order, i.e. each node after its children.
    pub fn postorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(self.root, false)];

        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
            } else {
                stack.push((id, true));
                stack.extend(self[id].children.iter().rev().map(|&child| (child, false)));
            }
        }

        order
    }

    /// Returns the sum of all branch lengths, excluding the root.
    ///
    /// Missing lengths count as zero.
    pub fn total_length(&self) -> f64 {
        self.iter_ids()
            .filter(|&id| id != self.root)
            .filter_map(|id| self[id].length)
            .sum()
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<NodeId> for Tree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Self::Output {
        &self.nodes[id.0]
    }
}

/// Iterator over a node and its ancestors, created by [`Tree::ancestors`].
#[derive(Clone, Debug)]
pub struct Ancestors<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.get(current).and_then(Node::parent);
        Some(current)
    }
}

/// An error constructing or validating a tree.
#[derive(Clone, Debug, PartialEq)]
pub enum TreeError {
    /// Input arrays to [`Tree::from_parents`] differ in length.
    LengthMismatch {
        /// Number of parents.
        parents: usize,
        /// Number of branch lengths.
        lengths: usize,
        /// Number of names.
        names: usize,
    },
    /// No node is without a parent.
    NoRoot,
    /// More than one node is without a parent.
    MultipleRoots {
        /// First node without a parent.
        first: NodeId,
        /// Another node without a parent.
        other: NodeId,
    },
    /// A parent index does not refer to a node.
    InvalidParent {
        /// Node with invalid parent.
        node: NodeId,
        /// Invalid parent index.
        parent: usize,
    },
    /// A node does not reach the root.
    Cycle {
        /// A node on or below the cycle.
        node: NodeId,
    },
    /// Two tips share a name.
    DuplicateNode(DuplicateNodeError),
    /// A non-root node has no branch length.
    MissingBranchLength {
        /// Node without branch length.
        node: NodeId,
    },
    /// A non-root node has a negative or NaN branch length.
    InvalidBranchLength {
        /// Node with invalid branch length.
        node: NodeId,
        /// The invalid length.
        length: f64,
    },
    /// The root has more than two children, as in trees serialized without a root.
    Unrooted {
        /// Number of children of the root.
        children: usize,
    },
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::LengthMismatch {
                parents,
                lengths,
                names,
            } => write!(
                f,
                "tree arrays must have equal length, found {parents} parents, \
                {lengths} branch lengths and {names} names"
            ),
            TreeError::NoRoot => f.write_str("tree has no root"),
            TreeError::MultipleRoots { first, other } => {
                write!(f, "tree has multiple roots ({first} and {other})")
            }
            TreeError::InvalidParent { node, parent } => {
                write!(f, "{node} has parent {parent}, which is not in tree")
            }
            TreeError::Cycle { node } => write!(f, "{node} does not reach the root"),
            TreeError::DuplicateNode(e) => write!(f, "{e}"),
            TreeError::MissingBranchLength { node } => write!(
                f,
                "all non-root nodes in tree must have a branch length, found none for {node}"
            ),
            TreeError::InvalidBranchLength { node, length } => write!(
                f,
                "branch lengths must be non-negative, found {length} for {node}"
            ),
            TreeError::Unrooted { children } => write!(
                f,
                "tree must be rooted, found root with {children} children \
                (expected at most 2)"
            ),
        }
    }
}

impl std::error::Error for TreeError {}

impl From<DuplicateNodeError> for TreeError {
    fn from(e: DuplicateNodeError) -> Self {
        Self::DuplicateNode(e)
    }
}
