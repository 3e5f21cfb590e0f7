use statrs::function::factorial::ln_factorial;

use crate::Counts;

/// Default logarithm base of [`shannon`].
pub const DEFAULT_BASE: f64 = 2.0;

/// Shannon entropy in bits.
///
/// See [`shannon_with_base`].
pub fn shannon(counts: &Counts) -> f64 {
    shannon_with_base(counts, DEFAULT_BASE)
}

/// Shannon entropy, `-Σpᵢ logᵦ(pᵢ)`, using the provided logarithm base.
///
/// Unobserved taxa do not contribute to the sum. NaN if there are no observations.
pub fn shannon_with_base(counts: &Counts, base: f64) -> f64 {
    if counts.total() == 0 {
        return f64::NAN;
    }

    let n = counts.n();
    let h = counts
        .iter_observed()
        .map(|count| {
            let p = count as f64 / n;
            p * p.ln()
        })
        .sum::<f64>();

    -h / base.ln()
}

/// Brillouin's index, `(ln(n!) - Σln(cᵢ!)) / n`.
///
/// NaN if there are no observations.
pub fn brillouin_d(counts: &Counts) -> f64 {
    let n = counts.total();
    let ln_factorials = counts.iter_observed().map(ln_factorial).sum::<f64>();

    (ln_factorial(n) - ln_factorials) / n as f64
}

/// Heip's evenness, `(eᴴ - 1) / (S - 1)` with `H` the Shannon entropy in nats.
///
/// The logarithm base cancels out, so none is taken. NaN with fewer than two observed taxa.
pub fn heip_e(counts: &Counts) -> f64 {
    let h = shannon_with_base(counts, std::f64::consts::E);

    (h.exp() - 1.0) / (counts.s() - 1.0)
}

/// Pielou's evenness, `H / ln(S)` with `H` the Shannon entropy in nats.
///
/// The logarithm base cancels out, so none is taken. NaN with fewer than two observed taxa.
pub fn pielou_e(counts: &Counts) -> f64 {
    let h = shannon_with_base(counts, std::f64::consts::E);

    h / counts.s().ln()
}
