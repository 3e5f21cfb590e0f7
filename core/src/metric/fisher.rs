use std::fmt;

use crate::Counts;

const MAX_EXPANSIONS: usize = 1024;
const MAX_BISECTIONS: usize = 256;

/// Fisher's alpha, the `α` solving `S = α ln(1 + n/α)`.
///
/// The left-hand side is strictly increasing in `α` and tends to `n`, so a solution exists
/// exactly when `0 < S < n`. The root is bracketed by doubling an upper bound and then found by
/// bisection.
///
/// NaN if there are no observations. When every individual belongs to a distinct taxon there is
/// no finite solution, and an error is returned.
pub fn fisher_alpha(counts: &Counts) -> Result<f64, FisherAlphaError> {
    let total = counts.total();
    let observed = counts.observed();

    if total == 0 {
        return Ok(f64::NAN);
    }
    if observed as u64 == total {
        return Err(FisherAlphaError::Undefined { observed, total });
    }

    let n = total as f64;
    let s = observed as f64;
    let f = |alpha: f64| alpha * (n / alpha).ln_1p() - s;

    // f tends to -S as alpha tends to zero, so zero is a valid lower bracket
    let mut lower = 0.0;
    let mut upper = 1.0;
    let mut expansions = 0;
    while f(upper) <= 0.0 {
        lower = upper;
        upper *= 2.0;
        expansions += 1;

        if expansions > MAX_EXPANSIONS || !upper.is_finite() {
            return Err(FisherAlphaError::Convergence { lower, upper });
        }
    }
    log::debug!("Bracketed Fisher's alpha in [{lower}, {upper}] after {expansions} expansions");

    for _ in 0..MAX_BISECTIONS {
        let mid = lower + (upper - lower) / 2.0;
        if mid <= lower || mid >= upper {
            break;
        }

        if f(mid) < 0.0 {
            lower = mid;
        } else {
            upper = mid;
        }
    }

    Ok(lower + (upper - lower) / 2.0)
}

/// An error computing [`fisher_alpha`].
#[derive(Clone, Debug, PartialEq)]
pub enum FisherAlphaError {
    /// All observed individuals are singletons, so no finite solution exists.
    Undefined {
        /// Number of observed taxa.
        observed: usize,
        /// Total count.
        total: u64,
    },
    /// The root could not be bracketed.
    Convergence {
        /// Last lower bound.
        lower: f64,
        /// Last upper bound.
        upper: f64,
    },
}

impl fmt::Display for FisherAlphaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FisherAlphaError::Undefined { observed, total } => write!(
                f,
                "Fisher's alpha is undefined when all individuals are distinct taxa \
                (found {observed} taxa among {total} individuals)"
            ),
            FisherAlphaError::Convergence { lower, upper } => write!(
                f,
                "failed to bracket Fisher's alpha (last bracket [{lower}, {upper}])"
            ),
        }
    }
}

impl std::error::Error for FisherAlphaError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fisher_alpha() {
        let expected = 2.7823795367398798;

        let alpha = fisher_alpha(&Counts::from([4, 3, 4, 0, 1, 0, 2])).unwrap();
        assert_approx_eq!(alpha, expected, epsilon = 1e-7);

        // Depends only on the number of taxa and individuals
        let alpha = fisher_alpha(&Counts::from([1, 6, 1, 0, 1, 0, 5])).unwrap();
        assert_approx_eq!(alpha, expected, epsilon = 1e-7);
    }

    #[test]
    fn test_fisher_alpha_by_hand() {
        let alpha = fisher_alpha(&Counts::from([61, 0, 0, 1])).unwrap();
        assert_approx_eq!(alpha, 0.39509, epsilon = 1e-4);
    }

    #[test]
    fn test_fisher_alpha_many_individuals() {
        let alpha = fisher_alpha(&Counts::from([999, 0, 10])).unwrap();
        assert_approx_eq!(alpha, 0.2396492, epsilon = 1e-7);
    }

    #[test]
    fn test_fisher_alpha_solves_equation() {
        let counts = Counts::from([3, 1, 1, 1, 1, 1, 1, 1, 1, 2]);
        let alpha = fisher_alpha(&counts).unwrap();
        let (n, s) = (13.0, 10.0);
        assert_approx_eq!(alpha * (1.0f64 + n / alpha).ln(), s, epsilon = 1e-9);
    }

    #[test]
    fn test_fisher_alpha_all_singletons() {
        assert_eq!(
            fisher_alpha(&Counts::from([1, 1, 0, 1])),
            Err(FisherAlphaError::Undefined {
                observed: 3,
                total: 3
            })
        );
    }

    #[test]
    fn test_fisher_alpha_unobserved() {
        assert!(fisher_alpha(&Counts::from([0, 0])).unwrap().is_nan());
        assert!(fisher_alpha(&Counts::default()).unwrap().is_nan());
    }
}
