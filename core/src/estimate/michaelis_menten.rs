//! Richness extrapolation by fitting a Michaelis-Menten curve to the rarefaction curve.
//!
//! The expected number of observed taxa when sub-sampling `k` individuals without replacement is
//! computed in closed form for every depth `k` from one to the total count. The saturating model
//! `S(k) = ak / (b + k)` is then fitted to this curve by non-linear least squares, and the
//! asymptote `a` estimates the number of taxa that would be observed given unlimited sampling.
//!
//! Samples of more than [`MAX_CURVE_POINTS`] individuals are fitted on that many evenly spaced
//! depths instead of every depth.

use std::{collections::BTreeMap, fmt};

use rand::Rng;
use statrs::function::gamma::ln_gamma;

use crate::Counts;

/// Largest number of rarefaction depths a fit is evaluated on.
pub const MAX_CURVE_POINTS: u64 = 10_000;

const DEFAULT_NUM_REPEATS: usize = 1;
const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Fits with a half-saturation depth beyond this multiple of the sample size have no usable
/// asymptote.
const MAX_SATURATION_RATIO: f64 = 1e3;

const STEP_TOLERANCE: f64 = 1e-10;
const DECREASE_TOLERANCE: f64 = 1e-15;
const GRADIENT_TOLERANCE: f64 = 1e-8;
const EXACT_FIT_TOLERANCE: f64 = 1e-20;
const INITIAL_DAMPING: f64 = 1e-3;
const MIN_DAMPING: f64 = 1e-15;
const MAX_DAMPING: f64 = 1e16;
const MIN_SCALE: f64 = 1e-12;

/// Expected number of observed taxa when sub-sampling without replacement.
///
/// Element `k - 1` of the returned vector corresponds to a depth of `k` individuals, so the
/// curve has one element per individual. For each taxon with count `c` out of `n`, the
/// probability of not observing it at depth `k` is `C(n - c, k) / C(n, k)`.
///
/// Taxa sharing a count share this probability, which is stepped from one depth to the next as
/// `C(n - c, k + 1) / C(n, k + 1) = C(n - c, k) / C(n, k) * (n - c - k) / (n - k)`. The cost is
/// proportional to the total count times the number of distinct counts.
pub fn rarefaction_curve(counts: &Counts) -> Vec<f64> {
    let n = counts.total();
    let classes = abundance_classes(counts);
    let mut missed = vec![1.0; classes.len()];

    (0..n)
        .map(|k| {
            let remaining = n - k;

            classes
                .iter()
                .zip(missed.iter_mut())
                .map(|(&(count, taxa), missed)| {
                    *missed = if count < remaining {
                        *missed * (remaining - count) as f64 / remaining as f64
                    } else {
                        0.0
                    };

                    taxa * (1.0 - *missed)
                })
                .sum::<f64>()
        })
        .collect()
}

/// Observed taxa grouped by count, as pairs of count and number of taxa with that count.
fn abundance_classes(counts: &Counts) -> Vec<(u64, f64)> {
    let mut classes = BTreeMap::new();
    for count in counts.iter_observed() {
        *classes.entry(count).or_insert(0usize) += 1;
    }

    classes
        .into_iter()
        .map(|(count, taxa)| (count, taxa as f64))
        .collect()
}

/// Expected number of observed taxa at a single depth `k` out of `n` individuals.
fn expected_observed(classes: &[(u64, f64)], n: u64, k: u64) -> f64 {
    let ln_ratio = ln_gamma((n - k) as f64 + 1.0) - ln_gamma(n as f64 + 1.0);

    classes
        .iter()
        .map(|&(count, taxa)| {
            let missed = if count > n - k {
                0.0
            } else {
                let rest = n - count;
                (ln_ratio + ln_gamma(rest as f64 + 1.0) - ln_gamma((rest - k) as f64 + 1.0)).exp()
            };

            taxa * (1.0 - missed)
        })
        .sum()
}

/// Rarefaction curve as pairs of depth and expected number of observed taxa.
///
/// Every depth is included for samples of at most [`MAX_CURVE_POINTS`] individuals. Larger
/// samples are evaluated at that many evenly spaced depths ending at the total count.
fn rarefaction_points(counts: &Counts) -> Vec<(f64, f64)> {
    let n = counts.total();

    if n <= MAX_CURVE_POINTS {
        return (1u64..)
            .zip(rarefaction_curve(counts))
            .map(|(k, expected)| (k as f64, expected))
            .collect();
    }

    let classes = abundance_classes(counts);
    let (total, points) = (u128::from(n), u128::from(MAX_CURVE_POINTS));

    (1..=points)
        .map(|j| {
            // Rounded up, so the last depth is exactly n
            let k = ((j * total + points - 1) / points) as u64;
            (k as f64, expected_observed(&classes, n, k))
        })
        .collect()
}

/// Estimate the asymptotic number of taxa by a Michaelis-Menten fit.
///
/// This is a convenience wrapper around [`MichaelisMenten`], see there for details.
pub fn michaelis_menten_fit<R>(
    counts: &Counts,
    num_repeats: usize,
    params_guess: Option<(f64, f64)>,
    rng: &mut R,
) -> Result<f64, FitError>
where
    R: Rng + ?Sized,
{
    let mut fitter = MichaelisMenten::default().set_num_repeats(num_repeats);
    if let Some((a, b)) = params_guess {
        fitter = fitter.set_params_guess(a, b)?;
    }

    fitter.fit(counts, rng)
}

/// A Michaelis-Menten richness estimator.
///
/// The fit is repeated a configurable number of times. The first repeat starts from the initial
/// parameter guess, which defaults to `(n/2, n/2)` for total count `n`. Each further repeat
/// starts from the initial guess with each parameter independently scaled by a random factor
/// in `[0.5, 1.5)`. Among the repeats that converge, the fit with the smallest residual sum of
/// squares wins.
///
/// # Examples
///
/// ```
/// use adiv_core::{estimate::MichaelisMenten, Counts};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut rng = StdRng::seed_from_u64(0);
/// let estimate = MichaelisMenten::default()
///     .set_num_repeats(3)
///     .fit(&Counts::from([22]), &mut rng)?;
///
/// assert!((estimate - 1.0).abs() < 1e-7);
/// # Ok::<(), adiv_core::estimate::FitError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct MichaelisMenten {
    num_repeats: usize,
    params_guess: Option<(f64, f64)>,
    max_iterations: usize,
}

impl MichaelisMenten {
    /// Fit the model to the rarefaction curve of the counts and return the estimated asymptote.
    ///
    /// A sample without observations gives zero, and a sample of a single individual gives one,
    /// without fitting. If no repeat converges within the iteration budget, an error is returned.
    ///
    /// A repeat only counts as converged if it reaches a stationary point of the residual sum of
    /// squares at which the curve actually saturates. When the rarefaction curve keeps rising, as
    /// it does when every taxon is a singleton, the asymptote grows without bound and the fit
    /// fails to converge.
    pub fn fit<R>(&self, counts: &Counts, rng: &mut R) -> Result<f64, FitError>
    where
        R: Rng + ?Sized,
    {
        if self.num_repeats == 0 {
            return Err(FitError::NoRepeats);
        }

        let n = counts.total();
        if n < 2 {
            return Ok(n as f64);
        }
        let points = rarefaction_points(counts);
        let max_saturation = MAX_SATURATION_RATIO * counts.n();

        let (a, b) = self.params_guess.unwrap_or_else(|| {
            let half = counts.n() / 2.0;
            (half, half)
        });

        let mut best: Option<Fit> = None;
        for repeat in 0..self.num_repeats {
            let guess = if repeat == 0 {
                [a, b]
            } else {
                [a * rng.gen_range(0.5..1.5), b * rng.gen_range(0.5..1.5)]
            };

            match levenberg_marquardt(&points, guess, self.max_iterations) {
                Some(fit) if fit.params[0].is_finite() && fit.params[1] <= max_saturation => {
                    log::debug!(
                        "Michaelis-Menten repeat {repeat} from guess {guess:?} converged to \
                        {:?} with SSE {:.6e} after {} iterations",
                        fit.params,
                        fit.sse,
                        fit.iterations,
                    );

                    if best.as_ref().map_or(true, |best| fit.sse < best.sse) {
                        best = Some(fit);
                    }
                }
                Some(fit) => log::debug!(
                    "Michaelis-Menten repeat {repeat} from guess {guess:?} ran off to {:?} \
                    without saturating",
                    fit.params,
                ),
                None => log::debug!(
                    "Michaelis-Menten repeat {repeat} from guess {guess:?} did not converge"
                ),
            }
        }

        best.map(|fit| fit.params[0])
            .ok_or(FitError::Convergence {
                repeats: self.num_repeats,
                max_iterations: self.max_iterations,
            })
    }

    /// Sets the maximum number of solver iterations per repeat.
    pub fn set_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the number of repeated fits.
    ///
    /// Setting zero repeats is allowed, but fitting will fail.
    pub fn set_num_repeats(mut self, num_repeats: usize) -> Self {
        self.num_repeats = num_repeats;
        self
    }

    /// Sets the initial guess of the asymptote `a` and the half-saturation depth `b`.
    ///
    /// Both must be finite, and `b` must be greater than -1 so that the model has no pole at
    /// any depth.
    pub fn set_params_guess(mut self, a: f64, b: f64) -> Result<Self, FitError> {
        if !(a.is_finite() && b.is_finite() && b > -1.0) {
            return Err(FitError::InvalidGuess { a, b });
        }

        self.params_guess = Some((a, b));
        Ok(self)
    }
}

impl Default for MichaelisMenten {
    fn default() -> Self {
        Self {
            num_repeats: DEFAULT_NUM_REPEATS,
            params_guess: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

#[derive(Clone, Debug)]
struct Fit {
    params: [f64; 2],
    sse: f64,
    iterations: usize,
}

fn sum_of_squares(points: &[(f64, f64)], [a, b]: [f64; 2]) -> f64 {
    points
        .iter()
        .map(|&(k, y)| (y - a * k / (b + k)).powi(2))
        .sum()
}

/// Normal equations `JᵀJ δ = Jᵀr` of the Gauss-Newton step at some parameters.
struct NormalEquations {
    jtj: [[f64; 2]; 2],
    jtr: [f64; 2],
}

impl NormalEquations {
    fn at(points: &[(f64, f64)], [a, b]: [f64; 2]) -> Self {
        let mut jtj = [[0.0; 2]; 2];
        let mut jtr = [0.0; 2];

        for &(k, y) in points {
            let denom = b + k;
            let da = k / denom;
            let db = -a * k / denom.powi(2);
            let residual = y - a * da;

            jtj[0][0] += da * da;
            jtj[0][1] += da * db;
            jtj[1][1] += db * db;
            jtr[0] += da * residual;
            jtr[1] += db * residual;
        }
        jtj[1][0] = jtj[0][1];

        Self { jtj, jtr }
    }

    /// Largest cosine of the angle between the residual vector and a column of the Jacobian.
    ///
    /// Zero at a stationary point, whatever the size of the residual.
    fn gradient_cosine(&self, sse: f64) -> f64 {
        let [[j00, _], [_, j11]] = self.jtj;
        let [g0, g1] = self.jtr;
        let cosine = |g: f64, jj: f64| g.abs() / (jj * sse).max(f64::MIN_POSITIVE).sqrt();

        cosine(g0, j00).max(cosine(g1, j11))
    }

    /// Solves the damped system, with damping scaled by the diagonal of `JᵀJ`.
    fn solve(&self, damping: f64) -> Option<[f64; 2]> {
        let [[j00, j01], [_, j11]] = self.jtj;
        let a00 = j00 + damping * j00.max(MIN_SCALE);
        let a11 = j11 + damping * j11.max(MIN_SCALE);

        let det = a00 * a11 - j01 * j01;
        if !(det > 0.0 && det.is_finite()) {
            return None;
        }

        let [g0, g1] = self.jtr;
        Some([(a11 * g0 - j01 * g1) / det, (a00 * g1 - j01 * g0) / det])
    }
}

/// Minimises the residual sum of squares from the guess.
///
/// Returns `None` if the iteration budget runs out, or if no descent direction is left at a point
/// that is not stationary.
fn levenberg_marquardt(
    points: &[(f64, f64)],
    guess: [f64; 2],
    max_iterations: usize,
) -> Option<Fit> {
    let mut params = guess;
    let mut sse = sum_of_squares(points, params);
    if !sse.is_finite() {
        return None;
    }

    let exact_fit = EXACT_FIT_TOLERANCE * points.iter().map(|&(_, y)| y * y).sum::<f64>();
    let mut damping = INITIAL_DAMPING;
    let mut normal = NormalEquations::at(points, params);

    for iteration in 0..max_iterations {
        if sse <= exact_fit || normal.gradient_cosine(sse) <= GRADIENT_TOLERANCE {
            return Some(Fit {
                params,
                sse,
                iterations: iteration,
            });
        }

        if damping > MAX_DAMPING {
            log::trace!("No descent direction left at {params:?} with SSE {sse:.6e}");
            return None;
        }

        let candidate = normal
            .solve(damping)
            .map(|[da, db]| [params[0] + da, params[1] + db])
            .filter(|&[a, b]| a.is_finite() && b.is_finite() && b > -1.0)
            .map(|candidate| (candidate, sum_of_squares(points, candidate)));

        match candidate {
            Some((candidate, candidate_sse)) if candidate_sse < sse => {
                let small_step = candidate.iter().zip(params).all(|(&new, old)| {
                    (new - old).abs() <= STEP_TOLERANCE * (old.abs() + STEP_TOLERANCE)
                });
                let small_decrease = sse - candidate_sse <= DECREASE_TOLERANCE * sse;

                params = candidate;
                sse = candidate_sse;
                damping = (damping / 10.0).max(MIN_DAMPING);

                log::trace!("Accepted step to {params:?} with SSE {sse:.6e}");

                if small_step || small_decrease {
                    return Some(Fit {
                        params,
                        sse,
                        iterations: iteration + 1,
                    });
                }

                normal = NormalEquations::at(points, params);
            }
            _ => damping *= 10.0,
        }
    }

    None
}

/// An error fitting a [`MichaelisMenten`] model.
#[derive(Clone, Debug, PartialEq)]
pub enum FitError {
    /// Fitting was requested with zero repeats.
    NoRepeats,
    /// The initial parameter guess is not usable.
    InvalidGuess {
        /// Guessed asymptote.
        a: f64,
        /// Guessed half-saturation depth.
        b: f64,
    },
    /// No repeat converged within the iteration budget.
    Convergence {
        /// Number of repeats attempted.
        repeats: usize,
        /// Iteration budget of each repeat.
        max_iterations: usize,
    },
}

impl fmt::Display for FitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitError::NoRepeats => f.write_str("number of repeats must be at least one"),
            FitError::InvalidGuess { a, b } => write!(
                f,
                "invalid initial parameter guess ({a}, {b}), \
                parameters must be finite with second parameter greater than -1"
            ),
            FitError::Convergence {
                repeats,
                max_iterations,
            } => write!(
                f,
                "Michaelis-Menten fit did not converge in any of {repeats} repeats \
                of at most {max_iterations} iterations"
            ),
        }
    }
}

impl std::error::Error for FitError {}
