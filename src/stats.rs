//! Column statistics helpers used by the cleaning pipeline.

use std::collections::BTreeMap;

use statrs::statistics::{Data, OrderStatistics};

/// Median of a slice; `None` when the slice is empty.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut data = Data::new(values.to_vec());
    Some(data.median())
}

/// Lower and upper quartiles (Q1, Q3) of a slice; `None` when empty.
pub fn quartiles(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let mut data = Data::new(values.to_vec());
    let q1 = data.lower_quartile();
    let q3 = data.upper_quartile();
    Some((q1, q3))
}

/// Most frequent value; ties break toward the lexicographically smallest so
/// the result is deterministic. `None` when the slice is empty.
pub fn mode(values: &[String]) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(v.as_str()).or_insert(0) += 1;
    }
    let mut best: Option<(&str, usize)> = None;
    for (value, count) in counts {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((value, count)),
        }
    }
    best.map(|(value, _)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_empty_is_none() {
        assert!(median(&[]).is_none());
    }

    #[test]
    fn median_odd_count() {
        let m = median(&[3.0, 1.0, 2.0]).unwrap();
        assert!((m - 2.0).abs() < 1e-12);
    }

    #[test]
    fn quartiles_ordered() {
        let (q1, q3) = quartiles(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]).unwrap();
        assert!(q1 < q3);
    }

    #[test]
    fn mode_breaks_ties_deterministically() {
        let values = vec!["b".to_string(), "a".to_string()];
        assert_eq!(mode(&values).unwrap(), "a");
        assert!(mode(&[]).is_none());
    }
}
