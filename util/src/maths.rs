//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Clamp a value into the range `[min, max]`.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Clamp a value into the symmetric band `[-bound, bound]`.
///
/// If `bound` is not positive the value is returned unchanged, so that
/// non-positive limits can be used to mean "unbounded".
pub fn clamp_abs<T>(value: T, bound: T) -> T
where
    T: Float
{
    if bound <= T::from(0).unwrap() {
        return value;
    }

    clamp(&value, &(-bound), &bound)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(&0.5f64, &0f64, &1f64), 0.5f64);
        assert_eq!(clamp(&1.5f64, &0f64, &1f64), 1f64);
        assert_eq!(clamp(&-0.5f64, &0f64, &1f64), 0f64);
    }

    #[test]
    fn test_clamp_abs() {
        assert_eq!(clamp_abs(5f64, 2f64), 2f64);
        assert_eq!(clamp_abs(-5f64, 2f64), -2f64);
        assert_eq!(clamp_abs(1f64, 2f64), 1f64);

        // Non-positive bound means unbounded
        assert_eq!(clamp_abs(100f64, 0f64), 100f64);
        assert_eq!(clamp_abs(100f64, -1f64), 100f64);
    }
}
