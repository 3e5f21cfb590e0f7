use crate::Counts;

/// Chao1 estimate of total richness.
///
/// With `F₁` singletons and `F₂` doubletons among `S` observed taxa, the classic estimate is
/// `S + F₁²/(2F₂)`. It is undefined without doubletons, so unless both `F₁` and `F₂` are
/// positive, or if `bias_corrected` is set, the bias-corrected form `S + F₁(F₁ - 1)/(2(F₂ + 1))`
/// is used instead.
pub fn chao1(counts: &Counts, bias_corrected: bool) -> f64 {
    let s = counts.s();
    let f1 = counts.singles() as f64;
    let f2 = counts.doubles() as f64;

    if !bias_corrected && f1 > 0.0 && f2 > 0.0 {
        s + f1.powi(2) / (2.0 * f2)
    } else {
        s + f1 * (f1 - 1.0) / (2.0 * (f2 + 1.0))
    }
}
