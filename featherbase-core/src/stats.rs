// src/stats.rs
// Numeric statistics consumed by the grouping finalizers.

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median of the values, sorting the slice in place.
///
/// Odd counts return the middle element; even counts the mean of the two
/// middle elements. `None` for an empty slice.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

/// Population standard deviation (divisor N); `None` for an empty slice.
pub fn std_dev_population(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let variance =
        values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Sample standard deviation (divisor N-1); `None` for fewer than 2 values.
pub fn std_dev_sample(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance =
        values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[4.0]), Some(4.0));
        assert_eq!(mean(&[30.0, 25.0, 35.0, 40.0]), Some(32.5));
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&mut []), None);
        assert_eq!(median(&mut [7.0]), Some(7.0));
        assert_eq!(median(&mut [35.0, 25.0, 30.0]), Some(30.0));
        assert_eq!(median(&mut [30.0, 25.0, 35.0, 40.0]), Some(32.5));
    }

    #[test]
    fn test_std_dev_population() {
        assert_eq!(std_dev_population(&[]), None);
        assert_eq!(std_dev_population(&[5.0]), Some(0.0));

        let sd = std_dev_population(&[30.0, 25.0, 35.0, 40.0]).unwrap();
        assert!((sd - 5.5901699437494745).abs() < EPSILON);
    }

    #[test]
    fn test_std_dev_sample() {
        assert_eq!(std_dev_sample(&[]), None);
        assert_eq!(std_dev_sample(&[5.0]), None);

        let sd = std_dev_sample(&[30.0, 25.0, 35.0, 40.0]).unwrap();
        assert!((sd - 6.454972243679028).abs() < EPSILON);
    }
}
