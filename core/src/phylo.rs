//! Faith's phylogenetic diversity.

use std::fmt;

use crate::{
    counts::{validate_ids, CountsError},
    tree::{MissingNodeError, TipIndex, TreeError},
    Counts, Tree,
};

/// Faith's phylogenetic diversity of a sample.
///
/// This is the total branch length of the smallest subtree connecting the root to every tip
/// observed in the sample. Each count is paired with the tip named by the id at the same
/// position. All ids must name tips of the tree, whether observed or not.
///
/// The tree is validated as a whole before anything is computed: see [`TipIndex::build`]. When
/// computing diversity for many samples over the same tree, build the index once and use
/// [`faith_pd_indexed`].
///
/// # Examples
///
/// ```
/// use adiv_core::{faith_pd, Counts, Tree};
///
/// let mut tree = Tree::new();
/// tree.add_child(tree.root(), Some("OTU1"), Some(0.25));
/// tree.add_child(tree.root(), Some("OTU2"), Some(0.25));
///
/// let pd = faith_pd(&Counts::from([1, 0]), &["OTU1", "OTU2"], &tree)?;
/// assert_eq!(pd, 0.25);
/// # Ok::<(), adiv_core::phylo::FaithPdError>(())
/// ```
pub fn faith_pd<S>(counts: &Counts, ids: &[S], tree: &Tree) -> Result<f64, FaithPdError>
where
    S: AsRef<str>,
{
    validate_ids(counts, ids)?;
    let index = TipIndex::build(tree)?;

    observed_branch_length(counts, ids, &index)
}

/// Faith's phylogenetic diversity of a sample, using a pre-built tip index.
///
/// See [`faith_pd`].
pub fn faith_pd_indexed<S>(counts: &Counts, ids: &[S], index: &TipIndex) -> Result<f64, FaithPdError>
where
    S: AsRef<str>,
{
    validate_ids(counts, ids)?;

    observed_branch_length(counts, ids, index)
}

/// Total length of the branches above observed tips, for ids already paired with counts.
fn observed_branch_length<S>(
    counts: &Counts,
    ids: &[S],
    index: &TipIndex,
) -> Result<f64, FaithPdError>
where
    S: AsRef<str>,
{
    let tips = ids
        .iter()
        .map(|id| index.lookup(id.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    let tree = index.tree();
    let mut marked = vec![false; tree.node_count()];
    let mut marked_count = 0;

    let observed = counts
        .as_slice()
        .iter()
        .zip(tips)
        .filter_map(|(&count, tip)| (count > 0).then_some(tip));

    for tip in observed {
        for node in tree.ancestors(tip) {
            let seen = &mut marked[node.index()];
            if *seen {
                break;
            }
            *seen = true;
            marked_count += 1;
        }
    }

    log::trace!(
        "Marked {marked_count} of {} nodes for Faith's PD",
        tree.node_count()
    );

    let root = tree.root();
    let pd = tree
        .iter_ids()
        .filter(|&id| id != root && marked[id.index()])
        .filter_map(|id| tree[id].length())
        .sum();

    Ok(pd)
}

/// An error computing [`faith_pd`].
#[derive(Clone, Debug, PartialEq)]
pub enum FaithPdError {
    /// Counts could not be paired with ids.
    Counts(CountsError),
    /// The tree is invalid.
    Tree(TreeError),
    /// An id does not name a tip in the tree.
    MissingNode(MissingNodeError),
}

impl fmt::Display for FaithPdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaithPdError::Counts(e) => write!(f, "{e}"),
            FaithPdError::Tree(e) => write!(f, "{e}"),
            FaithPdError::MissingNode(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for FaithPdError {}

impl From<CountsError> for FaithPdError {
    fn from(e: CountsError) -> Self {
        Self::Counts(e)
    }
}

impl From<TreeError> for FaithPdError {
    fn from(e: TreeError) -> Self {
        Self::Tree(e)
    }
}

impl From<MissingNodeError> for FaithPdError {
    fn from(e: MissingNodeError) -> Self {
        Self::MissingNode(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use crate::tree::tests::{tree_five_tips, tree_four_tips, tree_seven_tips};

    const IDS: [&str; 5] = ["OTU1", "OTU2", "OTU3", "OTU4", "OTU5"];

    fn rows() -> [(Counts, f64); 5] {
        [
            (Counts::from([1, 3, 0, 1, 0]), 4.5),
            (Counts::from([0, 2, 0, 4, 4]), 4.75),
            (Counts::from([0, 0, 6, 2, 1]), 4.75),
            (Counts::from([0, 0, 1, 1, 1]), 4.75),
            (Counts::from([0, 0, 0, 0, 0]), 0.0),
        ]
    }

    #[test]
    fn test_faith_pd() {
        let tree = tree_five_tips();

        for (counts, expected) in rows() {
            assert_approx_eq!(faith_pd(&counts, &IDS, &tree).unwrap(), expected);
        }
    }

    #[test]
    fn test_faith_pd_extra_tips() {
        let tree = tree_seven_tips();

        for (counts, expected) in rows() {
            assert_approx_eq!(faith_pd(&counts, &IDS, &tree).unwrap(), expected);
        }
    }

    #[test]
    fn test_faith_pd_four_tips() {
        let tree = tree_four_tips();
        let ids = ["OTU1", "OTU2", "OTU3", "OTU4"];

        let pd = faith_pd(&Counts::from([1, 1, 0, 0]), &ids, &tree).unwrap();
        assert_approx_eq!(pd, 0.6);

        let pd = faith_pd(&Counts::from([0, 0, 1, 1]), &ids, &tree).unwrap();
        assert_approx_eq!(pd, 2.3);

        let pd = faith_pd(&Counts::from([0, 3, 0, 0]), &ids, &tree).unwrap();
        assert_approx_eq!(pd, 0.5);
    }

    #[test]
    fn test_faith_pd_all_observed_is_total_length() {
        let tree = tree_five_tips();
        let pd = faith_pd(&Counts::from([1, 1, 1, 1, 1]), &IDS, &tree).unwrap();
        assert_approx_eq!(pd, tree.total_length());
        assert_approx_eq!(pd, 6.25);
    }

    #[test]
    fn test_faith_pd_two_tips() {
        let mut tree = Tree::with_root_name("root");
        tree.add_child(tree.root(), Some("OTU1"), Some(0.25));
        tree.add_child(tree.root(), Some("OTU2"), Some(0.25));

        let pd = faith_pd(&Counts::from([1, 0]), &["OTU1", "OTU2"], &tree).unwrap();
        assert_eq!(pd, 0.25);
    }

    #[test]
    fn test_faith_pd_empty() {
        let tree = tree_five_tips();
        let pd = faith_pd::<&str>(&Counts::default(), &[], &tree).unwrap();
        assert_eq!(pd, 0.0);
    }

    #[test]
    fn test_faith_pd_ignores_root_length() {
        let tree = Tree::from_parents(
            &[None, Some(0), Some(0)],
            &[Some(10.0), Some(1.0), Some(2.0)],
            &[None, Some("OTU1"), Some("OTU2")],
        )
        .unwrap();

        let pd = faith_pd(&Counts::from([1, 1]), &["OTU1", "OTU2"], &tree).unwrap();
        assert_eq!(pd, 3.0);
    }

    #[test]
    fn test_faith_pd_root_only_tree() {
        let tree = Tree::with_root_name("OTU1");
        let pd = faith_pd(&Counts::from([5]), &["OTU1"], &tree).unwrap();
        assert_eq!(pd, 0.0);
    }

    #[test]
    fn test_faith_pd_id_errors() {
        let tree = tree_five_tips();

        assert_eq!(
            faith_pd(&Counts::from([1, 2, 3]), &IDS, &tree),
            Err(FaithPdError::Counts(CountsError::LengthMismatch {
                counts: 3,
                ids: 5
            }))
        );
        assert_eq!(
            faith_pd(&Counts::from([1, 2, 3]), &["OTU1", "OTU2", "OTU1"], &tree),
            Err(FaithPdError::Counts(CountsError::DuplicateId {
                id: String::from("OTU1")
            }))
        );
    }

    #[test]
    fn test_faith_pd_id_errors_before_tree_errors() {
        // Root with three children, and ids of the wrong length
        let mut tree = Tree::new();
        for name in ["OTU1", "OTU2", "OTU3"] {
            tree.add_child(tree.root(), Some(name), Some(1.0));
        }

        assert_eq!(
            faith_pd(&Counts::from([1, 2]), &["OTU1", "OTU2", "OTU3"], &tree),
            Err(FaithPdError::Counts(CountsError::LengthMismatch {
                counts: 2,
                ids: 3
            }))
        );
        assert_eq!(
            faith_pd(&Counts::from([1, 2, 3]), &["OTU1", "OTU2", "OTU3"], &tree),
            Err(FaithPdError::Tree(TreeError::Unrooted { children: 3 }))
        );
    }

    #[test]
    fn test_faith_pd_indexed_id_errors() {
        let tree = tree_five_tips();
        let index = TipIndex::build(&tree).unwrap();

        assert_eq!(
            faith_pd_indexed(&Counts::from([1, 2, 3]), &IDS, &index),
            Err(FaithPdError::Counts(CountsError::LengthMismatch {
                counts: 3,
                ids: 5
            }))
        );
        assert_eq!(
            faith_pd_indexed(&Counts::from([1, 2]), &["OTU1", "OTU1"], &index),
            Err(FaithPdError::Counts(CountsError::DuplicateId {
                id: String::from("OTU1")
            }))
        );
    }

    #[test]
    fn test_faith_pd_missing_node() {
        let tree = tree_five_tips();
        let ids = ["OTU1", "OTU2", "OTU3", "OTU4", "OTU42"];

        // Unobserved ids must also be present
        let result = faith_pd(&Counts::from([1, 1, 1, 1, 0]), &ids, &tree);
        assert!(matches!(
            result,
            Err(FaithPdError::MissingNode(e)) if e.name() == "OTU42"
        ));
    }

    #[test]
    fn test_faith_pd_duplicate_node() {
        let mut tree = Tree::new();
        let pair = tree.add_child(tree.root(), None, Some(0.5));
        tree.add_child(pair, Some("OTU1"), Some(0.5));
        tree.add_child(pair, Some("OTU2"), Some(0.5));
        tree.add_child(tree.root(), Some("OTU2"), Some(1.0));

        let ids = ["OTU1", "OTU2", "OTU3"];
        for counts in [Counts::from([1, 0, 0]), Counts::from([0, 0, 0])] {
            let result = faith_pd(&counts, &ids, &tree);
            assert!(matches!(
                result,
                Err(FaithPdError::Tree(TreeError::DuplicateNode(e))) if e.name() == "OTU2"
            ));
        }
    }

    #[test]
    fn test_faith_pd_unrooted() {
        // ((OTU1:0.1,OTU2:0.2):0.3,OTU3:0.5,OTU4:0.7);
        let mut tree = Tree::new();
        let pair = tree.add_child(tree.root(), None, Some(0.3));
        tree.add_child(pair, Some("OTU1"), Some(0.1));
        tree.add_child(pair, Some("OTU2"), Some(0.2));
        tree.add_child(tree.root(), Some("OTU3"), Some(0.5));
        tree.add_child(tree.root(), Some("OTU4"), Some(0.7));

        let result = faith_pd(
            &Counts::from([1, 2, 3, 4]),
            &["OTU1", "OTU2", "OTU3", "OTU4"],
            &tree,
        );
        assert_eq!(
            result,
            Err(FaithPdError::Tree(TreeError::Unrooted { children: 3 }))
        );
    }

    #[test]
    fn test_faith_pd_missing_branch_length_elsewhere() {
        // ((OTU1:0.1,OTU2:0.2):0.3,(OTU3:0.5,OTU4))root;
        let mut tree = Tree::with_root_name("root");
        let left = tree.add_child(tree.root(), None, Some(0.3));
        tree.add_child(left, Some("OTU1"), Some(0.1));
        tree.add_child(left, Some("OTU2"), Some(0.2));
        let right = tree.add_child(tree.root(), None, Some(1.1));
        tree.add_child(right, Some("OTU3"), Some(0.5));
        let otu4 = tree.add_child(right, Some("OTU4"), None);

        let result = faith_pd(
            &Counts::from([1, 1, 0, 0]),
            &["OTU1", "OTU2", "OTU3", "OTU4"],
            &tree,
        );
        assert_eq!(
            result,
            Err(FaithPdError::Tree(TreeError::MissingBranchLength {
                node: otu4
            }))
        );
    }

    #[test]
    fn test_faith_pd_indexed_reuses_index() {
        let tree = tree_five_tips();
        let index = TipIndex::build(&tree).unwrap();

        for (counts, expected) in rows() {
            assert_approx_eq!(faith_pd_indexed(&counts, &IDS, &index).unwrap(), expected);
        }
    }

    proptest! {
        #[test]
        fn test_faith_pd_invariant_to_unobserved_tips(
            counts in proptest::collection::vec(0u64..10, 5),
        ) {
            let five = tree_five_tips();
            let seven = tree_seven_tips();

            let expected = faith_pd(&Counts::try_from(counts.clone()).unwrap(), &IDS, &five).unwrap();

            let mut extended = counts;
            extended.extend([0, 0]);
            let ids = ["OTU1", "OTU2", "OTU3", "OTU4", "OTU5", "OTU6", "OTU7"];
            let pd = faith_pd(&Counts::try_from(extended).unwrap(), &ids, &seven).unwrap();

            prop_assert!((pd - expected).abs() < 1e-12);
        }

        #[test]
        fn test_faith_pd_invariant_to_permutation(
            pairs in proptest::collection::vec(0u64..10, 5)
                .prop_map(|counts| counts.into_iter().zip(IDS).collect::<Vec<_>>())
                .prop_shuffle(),
        ) {
            let tree = tree_five_tips();

            let ordered = IDS
                .iter()
                .map(|id| pairs.iter().find(|(_, x)| x == id).map(|(c, _)| *c).unwrap_or(0))
                .collect::<Vec<_>>();
            let expected = faith_pd(&Counts::try_from(ordered).unwrap(), &IDS, &tree).unwrap();

            let (counts, ids): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
            let pd = faith_pd(&Counts::try_from(counts).unwrap(), &ids, &tree).unwrap();

            prop_assert!((pd - expected).abs() < 1e-12);
        }
    }
}
