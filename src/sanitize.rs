//! Replace values that JSON cannot represent

/// `value` if finite, otherwise 0.0
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Drop non-finite optional values
pub fn finite_or_none(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Sanitize a sequence in place
pub fn sanitize_slice(values: &mut [f64]) {
    for v in values.iter_mut() {
        *v = finite_or_zero(*v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_finite_values_become_zero() {
        let mut values = [1.5, f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -2.0];
        sanitize_slice(&mut values);
        assert_eq!(values, [1.5, 0.0, 0.0, 0.0, -2.0]);

        assert_eq!(finite_or_none(Some(f64::NAN)), None);
        assert_eq!(finite_or_none(Some(0.12)), Some(0.12));
    }
}
