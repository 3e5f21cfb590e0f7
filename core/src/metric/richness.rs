use crate::Counts;

/// Number of observed taxa, `S`.
pub fn observed_otus(counts: &Counts) -> usize {
    counts.observed()
}

/// Number of taxa observed exactly once.
pub fn singles(counts: &Counts) -> usize {
    counts.singles()
}

/// Number of taxa observed exactly twice.
pub fn doubles(counts: &Counts) -> usize {
    counts.doubles()
}

/// Observed taxa, singles, and doubles, in that order.
pub fn osd(counts: &Counts) -> (usize, usize, usize) {
    (counts.observed(), counts.singles(), counts.doubles())
}

/// Margalef's richness, `(S - 1) / ln(n)`.
///
/// This is NaN when `n = 1`, and zero when there are no observations.
pub fn margalef(counts: &Counts) -> f64 {
    (counts.s() - 1.0) / counts.n().ln()
}

/// Menhinick's richness, `S / √n`.
pub fn menhinick(counts: &Counts) -> f64 {
    counts.s() / counts.n().sqrt()
}

/// Robbins' estimator of the probability of unobserved outcomes, `F₁ / n`.
pub fn robbins(counts: &Counts) -> f64 {
    counts.singles() as f64 / counts.n()
}

/// Good's coverage, `1 - F₁ / n`.
pub fn goods_coverage(counts: &Counts) -> f64 {
    1.0 - robbins(counts)
}

/// Kempton-Taylor Q index using the inter-quartile range.
///
/// See [`kempton_taylor_q_with`].
pub fn kempton_taylor_q(counts: &Counts) -> f64 {
    kempton_taylor_q_with(counts, 0.25, 0.75)
}

/// Kempton-Taylor Q index of alpha diversity between two quantiles.
///
/// This is the slope of the cumulative abundance curve between the lower and upper quantiles of
/// the sorted counts, including unobserved taxa. Since counts are sorted first, the result does
/// not depend on the order of taxa. NaN if the quantiles do not index into the counts.
pub fn kempton_taylor_q_with(counts: &Counts, lower_quantile: f64, upper_quantile: f64) -> f64 {
    let n = counts.len() as f64;
    let lower = (n * lower_quantile).ceil();
    let upper = (n * upper_quantile).floor();

    if !(0.0..n).contains(&lower) || !(0.0..n).contains(&upper) {
        return f64::NAN;
    }

    let (lower, upper) = (lower as usize, upper as usize);
    let sorted = counts.sorted();

    (upper as f64 - lower as f64) / (sorted[upper] as f64 / sorted[lower] as f64).ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example() -> Counts {
        Counts::from([0, 1, 1, 4, 2, 5, 2, 4, 1, 2])
    }

    #[test]
    fn test_observed_otus() {
        assert_eq!(observed_otus(&Counts::from([4, 3, 4, 0, 1, 0, 2])), 5);
        assert_eq!(observed_otus(&Counts::from([0, 0, 0])), 0);
        assert_eq!(observed_otus(&example()), 9);
    }

    #[test]
    fn test_singles() {
        assert_eq!(singles(&example()), 3);
        assert_eq!(singles(&Counts::from([0, 3, 4])), 0);
        assert_eq!(singles(&Counts::from([1])), 1);
        assert_eq!(singles(&Counts::from([0, 0])), 0);
    }

    #[test]
    fn test_doubles() {
        assert_eq!(doubles(&example()), 3);
        assert_eq!(doubles(&Counts::from([0, 3, 4])), 0);
        assert_eq!(doubles(&Counts::from([2])), 1);
        assert_eq!(doubles(&Counts::from([0, 0])), 0);
    }

    #[test]
    fn test_osd() {
        assert_eq!(osd(&example()), (9, 3, 3));
        assert_eq!(osd(&Counts::default()), (0, 0, 0));
    }

    #[test]
    fn test_margalef() {
        assert_approx_eq!(margalef(&example()), 8.0 / 22f64.ln());
    }

    #[test]
    fn test_margalef_degenerate() {
        assert!(margalef(&Counts::from([1])).is_nan());
        assert_eq!(margalef(&Counts::from([0, 0])), 0.0);
    }

    #[test]
    fn test_menhinick() {
        assert_approx_eq!(menhinick(&example()), 9.0 / 22f64.sqrt());
    }

    #[test]
    fn test_robbins() {
        assert_approx_eq!(robbins(&Counts::from([1, 2, 3, 0, 1])), 2.0 / 7.0);
    }

    #[test]
    fn test_goods_coverage() {
        let mut values = vec![1; 75];
        values.extend([2, 2, 2, 2, 2, 2, 3, 4, 4]);
        assert_approx_eq!(
            goods_coverage(&Counts::try_from(values).unwrap()),
            0.23469387755,
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_coverage_unobserved() {
        assert!(robbins(&Counts::from([0, 0])).is_nan());
        assert!(goods_coverage(&Counts::default()).is_nan());
    }

    #[test]
    fn test_kempton_taylor_q() {
        let values = [
            2, 3, 3, 3, 3, 3, 4, 4, 4, 6, 6, 7, 7, 9, 9, 11, 14, 15, 15, 20, 29, 33, 34, 36, 37,
            53, 57, 138, 146, 170,
        ];
        let expected = 14.0 / (34.0f64 / 4.0).ln();
        assert_approx_eq!(kempton_taylor_q(&Counts::from(values)), expected);

        let mut shuffled = values;
        shuffled.reverse();
        shuffled.swap(3, 17);
        shuffled.swap(0, 29);
        assert_approx_eq!(kempton_taylor_q(&Counts::from(shuffled)), expected);
    }

    #[test]
    fn test_kempton_taylor_q_with_zeros() {
        assert_approx_eq!(kempton_taylor_q(&example()), 4.0 / 4f64.ln());
    }

    #[test]
    fn test_kempton_taylor_q_out_of_range() {
        assert!(kempton_taylor_q(&Counts::default()).is_nan());
        assert!(kempton_taylor_q(&Counts::from([3])).is_nan());
        assert!(kempton_taylor_q_with(&example(), 0.25, 1.0).is_nan());
    }
}
