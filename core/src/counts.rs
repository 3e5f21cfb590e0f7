//! Validated per-taxon abundance counts.

use std::{collections::HashSet, fmt, ops::Index};

/// A validated vector of non-negative per-taxon counts.
///
/// Index `i` holds the abundance of the `i`th taxon. Taxa with a count of zero are allowed and
/// are part of the vector, but they are not observed: see [`Counts::observed`].
///
/// The total over all taxa always fits in a `u64`, so sums of any subset of counts cannot
/// overflow.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Counts {
    counts: Vec<u64>,
    total: u64,
}

impl Counts {
    /// Creates new counts from signed values, checking that all are non-negative and that their
    /// total fits in a `u64`.
    ///
    /// The empty vector is valid.
    pub fn new<I>(values: I) -> Result<Self, CountsError>
    where
        I: IntoIterator<Item = i64>,
    {
        let counts = values
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                u64::try_from(value).map_err(|_| CountsError::NegativeCount { index, value })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::try_from(counts)
    }

    /// Returns the counts as a slice.
    pub fn as_slice(&self) -> &[u64] {
        &self.counts
    }

    /// Returns the number of taxa, including unobserved taxa.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns `true` if there are no taxa.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Returns the total count over all taxa.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Returns the number of taxa with a non-zero count.
    pub fn observed(&self) -> usize {
        self.iter_observed().count()
    }

    /// Returns an iterator over the non-zero counts.
    pub fn iter_observed(&self) -> impl Iterator<Item = u64> + '_ {
        self.counts.iter().copied().filter(|&count| count > 0)
    }

    /// Returns the number of taxa with exactly `count` observations.
    pub fn frequency(&self, count: u64) -> usize {
        self.counts.iter().filter(|&&x| x == count).count()
    }

    /// Returns the number of singletons, i.e. taxa observed exactly once.
    pub fn singles(&self) -> usize {
        self.frequency(1)
    }

    /// Returns the number of doubletons, i.e. taxa observed exactly twice.
    pub fn doubles(&self) -> usize {
        self.frequency(2)
    }

    /// Returns the largest count, or `None` if there are no taxa.
    pub fn max(&self) -> Option<u64> {
        self.counts.iter().copied().max()
    }

    /// Returns a copy of the counts sorted in ascending order.
    pub fn sorted(&self) -> Vec<u64> {
        let mut sorted = self.counts.clone();
        sorted.sort_unstable();
        sorted
    }

    /// Returns the total count as a float.
    pub(crate) fn n(&self) -> f64 {
        self.total() as f64
    }

    /// Returns the number of observed taxa as a float.
    pub(crate) fn s(&self) -> f64 {
        self.observed() as f64
    }
}

impl TryFrom<Vec<u64>> for Counts {
    type Error = CountsError;

    fn try_from(counts: Vec<u64>) -> Result<Self, Self::Error> {
        let total = counts
            .iter()
            .try_fold(0u64, |total, &count| total.checked_add(count))
            .ok_or(CountsError::TotalOverflow)?;

        Ok(Self { counts, total })
    }
}

impl<const N: usize> From<[u32; N]> for Counts {
    fn from(counts: [u32; N]) -> Self {
        let counts: Vec<u64> = counts.into_iter().map(u64::from).collect();
        let total = counts.iter().fold(0u64, |total, &count| total.saturating_add(count));

        Self { counts, total }
    }
}

impl From<Counts> for Vec<u64> {
    fn from(counts: Counts) -> Self {
        counts.counts
    }
}

impl Index<usize> for Counts {
    type Output = u64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.counts[index]
    }
}

/// Checks that taxon ids can be paired with counts.
///
/// The ids must be exactly as many as the counts, and must not contain duplicates.
pub fn validate_ids<S>(counts: &Counts, ids: &[S]) -> Result<(), CountsError>
where
    S: AsRef<str>,
{
    if counts.len() != ids.len() {
        return Err(CountsError::LengthMismatch {
            counts: counts.len(),
            ids: ids.len(),
        });
    }

    let mut seen: HashSet<&str> = HashSet::with_capacity(ids.len());
    if let Some(duplicate) = ids.iter().map(|id| id.as_ref()).find(|id| !seen.insert(*id)) {
        return Err(CountsError::DuplicateId {
            id: duplicate.to_string(),
        });
    }

    Ok(())
}

/// An error validating counts, or counts paired with taxon ids.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CountsError {
    /// A count was negative.
    NegativeCount {
        /// Position of the offending count.
        index: usize,
        /// The offending count.
        value: i64,
    },
    /// Counts and ids differ in length.
    LengthMismatch {
        /// Number of counts.
        counts: usize,
        /// Number of ids.
        ids: usize,
    },
    /// A taxon id occurs more than once.
    DuplicateId {
        /// The repeated id.
        id: String,
    },
    /// The total count does not fit in a `u64`.
    TotalOverflow,
}

impl fmt::Display for CountsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountsError::NegativeCount { index, value } => {
                write!(f, "counts must be non-negative, found {value} at index {index}")
            }
            CountsError::LengthMismatch { counts, ids } => write!(
                f,
                "counts and ids must have equal length, found {counts} counts and {ids} ids"
            ),
            CountsError::DuplicateId { id } => write!(f, "ids must be unique, found '{id}' twice"),
            CountsError::TotalOverflow => {
                write!(f, "total count must be at most {}", u64::MAX)
            }
        }
    }
}

impl std::error::Error for CountsError {}
