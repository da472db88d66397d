use num_traits::{Float, FromPrimitive};
use std::cmp::Ordering;

pub fn mean<T>(values: &[T]) -> T
where
    T: Float + FromPrimitive,
{
    if values.is_empty() {
        return T::nan();
    }
    let sum = values.iter().fold(T::zero(), |acc, &v| acc + v);
    sum / T::from_usize(values.len()).unwrap_or_else(T::nan)
}

/// Sample variance (n - 1 denominator).
pub fn variance<T>(values: &[T]) -> T
where
    T: Float + FromPrimitive,
{
    let n = values.len();
    if n < 2 {
        return T::nan();
    }
    let m = mean(values);
    let ss = values.iter().fold(T::zero(), |acc, &v| acc + (v - m) * (v - m));
    ss / T::from_usize(n - 1).unwrap_or_else(T::nan)
}

pub fn std_dev<T>(values: &[T]) -> T
where
    T: Float + FromPrimitive,
{
    variance(values).sqrt()
}

/// Sum of squared deviations from the mean.
pub fn sum_of_squares<T>(values: &[T]) -> T
where
    T: Float + FromPrimitive,
{
    let m = mean(values);
    values.iter().fold(T::zero(), |acc, &v| acc + (v - m) * (v - m))
}

pub fn sorted<T: Float>(values: &[T]) -> Vec<T> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    out
}

pub fn median<T>(values: &[T]) -> T
where
    T: Float + FromPrimitive,
{
    if values.is_empty() {
        return T::nan();
    }
    let s = sorted(values);
    let n = s.len();
    if n % 2 == 1 {
        s[n / 2]
    } else {
        (s[n / 2 - 1] + s[n / 2]) / T::from_f64(2.0).unwrap_or_else(T::nan)
    }
}
