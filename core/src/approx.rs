macro_rules! assert_approx_eq {
    ($lhs:expr, $rhs:expr) => {
        assert_approx_eq!($lhs, $rhs, epsilon = 1e-12)
    };
    ($lhs:expr, $rhs:expr, epsilon = $epsilon:expr) => {
        match (&($lhs), &($rhs)) {
            (lhs, rhs) => assert!(
                $crate::approx::ApproxEq::approx_eq(lhs, rhs, $epsilon),
                r#"assertion failed: `({} ≈ {})`
  left: `{:?}`,
 right: `{:?}`,
   eps: `{:?}`"#,
                stringify!($lhs),
                stringify!($rhs),
                lhs,
                rhs,
                $epsilon,
            ),
        }
    };
}

/// Approximate equality of floating point values.
///
/// Two NaN values compare equal, since NaN is a meaningful, defined result for several indices
/// of degenerate samples. Infinities compare equal when they have the same sign.
pub trait ApproxEq {
    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool;
}

impl ApproxEq for f64 {
    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        if self.is_nan() || other.is_nan() {
            self.is_nan() && other.is_nan()
        } else if self.is_infinite() || other.is_infinite() {
            self == other
        } else {
            (self - other).abs() < epsilon
        }
    }
}

impl<A, B> ApproxEq for (A, B)
where
    A: ApproxEq,
    B: ApproxEq,
{
    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.0.approx_eq(&other.0, epsilon) && self.1.approx_eq(&other.1, epsilon)
    }
}

impl<T> ApproxEq for [T]
where
    T: ApproxEq,
{
    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|(x, y)| x.approx_eq(y, epsilon))
    }
}

impl<T> ApproxEq for Vec<T>
where
    T: ApproxEq,
{
    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        <[T]>::approx_eq(self, other, epsilon)
    }
}

impl<T, const N: usize> ApproxEq for [T; N]
where
    T: ApproxEq,
{
    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        <[T]>::approx_eq(self, other, epsilon)
    }
}

impl<'a, T> ApproxEq for &'a T
where
    T: ApproxEq + ?Sized,
{
    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        T::approx_eq(*self, *other, epsilon)
    }
}
