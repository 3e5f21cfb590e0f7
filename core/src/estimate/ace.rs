use std::fmt;

use crate::Counts;

/// Default upper bound on the count of a rare taxon in [`ace`].
pub const DEFAULT_RARE_THRESHOLD: u64 = 10;

/// Abundance-based coverage estimator (ACE) of total richness.
///
/// Taxa with a count of at most `rare_threshold` are rare, the rest are abundant. Abundant taxa
/// are counted as they are, while the number of rare taxa is corrected by the estimated sample
/// coverage of rare taxa and their coefficient of variation.
///
/// If there are no rare taxa, this is simply the number of abundant taxa. If all rare taxa are
/// singletons, the coverage estimate is zero and an error is returned.
pub fn ace(counts: &Counts, rare_threshold: u64) -> Result<f64, AceError> {
    let mut s_rare = 0usize;
    let mut s_abundant = 0usize;
    let mut n_rare = 0u64;
    let mut pairs = 0.0;

    for count in counts.iter_observed() {
        if count <= rare_threshold {
            s_rare += 1;
            n_rare += count;
            // A single product c(c - 1) overflows u64 for c above 2^32
            let count = count as f64;
            pairs += count * (count - 1.0);
        } else {
            s_abundant += 1;
        }
    }

    if s_rare == 0 {
        return Ok(s_abundant as f64);
    }

    let singles = counts.singles();
    if singles == s_rare {
        return Err(AceError::OnlySingletons { singles });
    }

    let (s_rare, n_rare, f1) = (s_rare as f64, n_rare as f64, singles as f64);
    let coverage = 1.0 - f1 / n_rare;
    let gamma_sq = (s_rare * pairs / (coverage * n_rare * (n_rare - 1.0)) - 1.0).max(0.0);

    Ok(s_abundant as f64 + s_rare / coverage + f1 / coverage * gamma_sq)
}

/// An error computing [`ace`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AceError {
    /// All rare taxa are singletons.
    OnlySingletons {
        /// Number of singletons.
        singles: usize,
    },
}

impl fmt::Display for AceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AceError::OnlySingletons { singles } => write!(
                f,
                "ACE is undefined when all rare taxa are singletons (found {singles} singletons)"
            ),
        }
    }
}

impl std::error::Error for AceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ace() {
        let counts = Counts::from([0, 1, 1, 4, 2, 5, 2, 4, 1, 2]);
        assert_approx_eq!(
            ace(&counts, DEFAULT_RARE_THRESHOLD).unwrap(),
            10.865057380292837,
            epsilon = 1e-9
        );

        assert_approx_eq!(ace(&Counts::from([12, 0, 1, 2, 3]), 10).unwrap(), 4.6);
    }

    #[test]
    fn test_ace_only_abundant() {
        assert_eq!(ace(&Counts::from([15, 16, 11]), 10), Ok(3.0));
        assert_eq!(ace(&Counts::from([3, 4, 1]), 0), Ok(3.0));
    }

    #[test]
    fn test_ace_only_singletons() {
        assert_eq!(
            ace(&Counts::from([1, 1, 15]), 10),
            Err(AceError::OnlySingletons { singles: 2 })
        );
    }

    #[test]
    fn test_ace_large_counts() {
        let big = u64::MAX / 4;
        let counts = Counts::try_from(vec![big, big, 1, 2]).unwrap();

        let estimate = ace(&counts, u64::MAX).unwrap();
        assert!(estimate.is_finite());
        assert!(estimate >= 4.0);

        assert_eq!(ace(&counts, 2).unwrap(), ace(&Counts::from([9, 9, 1, 2]), 2).unwrap());
    }

    #[test]
    fn test_ace_unobserved() {
        assert_eq!(ace(&Counts::from([0, 0]), 10), Ok(0.0));
    }
}
