use crate::Counts;

// Two-sided 95% standard normal quantile
const Z: f64 = 1.959963984540054;

/// Esty's confidence interval for the proportion of individuals that are singletons.
///
/// With `W = (F₁(n - F₁) + 2nF₂) / n³`, the interval is `F₁/n ± z√W` where `z` is the 97.5%
/// quantile of the standard normal distribution. The returned pair is `(lower, upper)`.
///
/// A sample of a single individual gives the degenerate interval `(1, 1)`, and a sample without
/// observations gives `(NaN, NaN)`.
pub fn esty_ci(counts: &Counts) -> (f64, f64) {
    let n = counts.n();
    let f1 = counts.singles() as f64;
    let f2 = counts.doubles() as f64;

    let w = (f1 * (n - f1) + 2.0 * n * f2) / n.powi(3);
    let centre = f1 / n;
    let margin = Z * w.sqrt();

    (centre - margin, centre + margin)
}
