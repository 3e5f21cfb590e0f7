use std::{collections::HashMap, fmt};

use super::{NodeId, Tree, TreeError};

/// A validated tree with tips indexed by name.
///
/// Building the index checks that the tree is usable for phylogenetic diversity: tip names are
/// unique, every non-root node has a non-negative branch length, and the tree is rooted. The
/// index borrows the tree immutably, and may be shared between threads.
#[derive(Clone, Debug)]
pub struct TipIndex<'a> {
    tree: &'a Tree,
    tips: HashMap<&'a str, NodeId>,
}

impl<'a> TipIndex<'a> {
    /// Validates a tree and indexes its named tips.
    ///
    /// Unnamed tips are allowed, but cannot be looked up.
    pub fn build(tree: &'a Tree) -> Result<Self, TreeError> {
        let mut tips = HashMap::new();
        for id in tree.tips() {
            if let Some(name) = tree[id].name() {
                if tips.insert(name, id).is_some() {
                    return Err(DuplicateNodeError {
                        name: name.to_string(),
                    }
                    .into());
                }
            }
        }

        for id in tree.iter_ids().filter(|&id| id != tree.root()) {
            match tree[id].length() {
                None => return Err(TreeError::MissingBranchLength { node: id }),
                Some(length) if !(length >= 0.0) => {
                    return Err(TreeError::InvalidBranchLength { node: id, length })
                }
                Some(_) => (),
            }
        }

        let children = tree[tree.root()].children().len();
        if children > 2 {
            return Err(TreeError::Unrooted { children });
        }

        log::trace!(
            "Indexed {} named tips in tree with {} nodes",
            tips.len(),
            tree.node_count()
        );

        Ok(Self { tree, tips })
    }

    /// Returns the indexed tree.
    pub fn tree(&self) -> &'a Tree {
        self.tree
    }

    /// Returns the tip with the provided name, if any.
    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.tips.get(name).copied()
    }

    /// Returns the tip with the provided name, or an error if no such tip exists.
    pub fn lookup(&self, name: &str) -> Result<NodeId, MissingNodeError> {
        self.get(name).ok_or_else(|| MissingNodeError {
            name: name.to_string(),
        })
    }

    /// Returns the number of named tips.
    pub fn len(&self) -> usize {
        self.tips.len()
    }

    /// Returns `true` if there are no named tips.
    pub fn is_empty(&self) -> bool {
        self.tips.is_empty()
    }
}

/// An error due to a tip name occurring more than once in a tree.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DuplicateNodeError {
    name: String,
}

impl DuplicateNodeError {
    /// Returns the duplicated name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for DuplicateNodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "all tip names must be unique, found '{}' twice", self.name)
    }
}

impl std::error::Error for DuplicateNodeError {}

/// An error due to a name not matching any tip in a tree.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MissingNodeError {
    name: String,
}

impl MissingNodeError {
    /// Returns the name that was not found.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for MissingNodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no tip named '{}' in tree", self.name)
    }
}

impl std::error::Error for MissingNodeError {}
