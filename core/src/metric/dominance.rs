use crate::Counts;

/// Berger-Parker dominance, the relative abundance of the most abundant taxon.
///
/// NaN if there are no observations.
pub fn berger_parker_d(counts: &Counts) -> f64 {
    match counts.max() {
        Some(max) => max as f64 / counts.n(),
        None => f64::NAN,
    }
}

/// Simpson's dominance, `Σpᵢ²`.
///
/// This is the probability that two individuals drawn with replacement belong to the same taxon.
/// NaN if there are no observations.
pub fn dominance(counts: &Counts) -> f64 {
    if counts.total() == 0 {
        return f64::NAN;
    }

    let n = counts.n();
    counts
        .iter_observed()
        .map(|count| (count as f64 / n).powi(2))
        .sum()
}

/// Effective number of species (ENS_pie), the inverse of [`dominance`].
///
/// A perfectly even community has ENS_pie equal to the number of observed taxa.
pub fn enspie(counts: &Counts) -> f64 {
    1.0 / dominance(counts)
}

/// Simpson's index, `1 - dominance`.
pub fn simpson(counts: &Counts) -> f64 {
    1.0 - dominance(counts)
}

/// Simpson's evenness, [`enspie`] divided by the number of observed taxa.
pub fn simpson_e(counts: &Counts) -> f64 {
    enspie(counts) / counts.s()
}

/// McIntosh's dominance, `(n - U) / (n - √n)` with `U = √Σcᵢ²`.
pub fn mcintosh_d(counts: &Counts) -> f64 {
    let n = counts.n();
    let u = sum_of_squares(counts).sqrt();

    (n - u) / (n - n.sqrt())
}

/// McIntosh's evenness, `U / √((n - S + 1)² + S - 1)` with `U = √Σcᵢ²`.
pub fn mcintosh_e(counts: &Counts) -> f64 {
    let n = counts.n();
    let s = counts.s();
    let u = sum_of_squares(counts).sqrt();

    u / ((n - s + 1.0).powi(2) + s - 1.0).sqrt()
}

fn sum_of_squares(counts: &Counts) -> f64 {
    counts.iter_observed().map(|count| (count as f64).powi(2)).sum()
}

/// Strong's dominance.
///
/// With counts sorted in descending order, this is the largest difference between the
/// cumulative relative abundance of the `i` most abundant taxa and `i / S`. NaN if there are no
/// observations.
pub fn strong(counts: &Counts) -> f64 {
    if counts.total() == 0 {
        return f64::NAN;
    }

    let n = counts.n();
    let s = counts.s();

    let mut sorted = counts.sorted();
    sorted.reverse();

    sorted
        .iter()
        .enumerate()
        .scan(0, |cumulative, (i, &count)| {
            *cumulative += count;
            Some(*cumulative as f64 / n - (i + 1) as f64 / s)
        })
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Method for integrating the Lorenz curve in [`gini_index`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum GiniMethod {
    /// Sum of rectangles with height equal to the curve at the right edge of each interval.
    #[default]
    Rectangles,
    /// Trapezoidal rule, anchoring the curve at the origin.
    Trapezoids,
}

/// Gini index of inequality, `1 - 2B` where `B` is the area under the Lorenz curve.
///
/// The Lorenz curve is built from counts sorted in ascending order, including unobserved taxa.
/// NaN if there are no observations.
pub fn gini_index(counts: &Counts, method: GiniMethod) -> f64 {
    if counts.total() == 0 {
        return f64::NAN;
    }

    let n = counts.n();
    let lorenz = counts
        .sorted()
        .into_iter()
        .scan(0, |cumulative, count| {
            *cumulative += count;
            Some(*cumulative as f64 / n)
        })
        .collect::<Vec<_>>();

    let dx = 1.0 / lorenz.len() as f64;
    let area = match method {
        GiniMethod::Rectangles => dx * lorenz.iter().sum::<f64>(),
        GiniMethod::Trapezoids => {
            // Curve starts at zero and ends at one, so only the final point is halved
            let last = lorenz.last().copied().unwrap_or(0.0);
            dx * (lorenz.iter().sum::<f64>() - last / 2.0)
        }
    };

    1.0 - 2.0 * area
}
