//! Piecewise-linear resampling of one curve onto another abscissa.

use crate::error::{Error, Result};

/// Linearly interpolate `source_y(source_x)` at every `target_x`.
///
/// `source_x` must be strictly ascending; callers holding descending data
/// reverse both columns first. Targets below `source_x[0]` take
/// `below_fill` and targets above the last source abscissa take
/// `above_fill`, so a curve can be zero-padded outside its support instead of
/// extrapolated.
pub fn resample(
    source_x: &[f64],
    source_y: &[f64],
    target_x: &[f64],
    below_fill: f64,
    above_fill: f64,
) -> Result<Vec<f64>> {
    if source_x.len() != source_y.len() {
        return Err(Error::LengthMismatch {
            x: source_x.len(),
            y: source_y.len(),
        });
    }
    if source_x.len() < 2 {
        return Err(Error::TooShort {
            len: source_x.len(),
            min: 2,
        });
    }
    if source_x.windows(2).any(|w| !(w[1] > w[0])) {
        return Err(Error::NotAscending);
    }

    let first = source_x[0];
    let last = source_x[source_x.len() - 1];

    let out = target_x
        .iter()
        .map(|&x| {
            if x < first {
                return below_fill;
            }
            if x > last {
                return above_fill;
            }
            // First index with source_x[i] > x, clamped so (i-1, i) is a segment.
            let hi = source_x.partition_point(|&s| s <= x).clamp(1, source_x.len() - 1);
            let lo = hi - 1;
            if x == source_x[lo] {
                return source_y[lo];
            }
            if x == source_x[hi] {
                return source_y[hi];
            }
            let t = (x - source_x[lo]) / (source_x[hi] - source_x[lo]);
            source_y[lo] + t * (source_y[hi] - source_y[lo])
        })
        .collect();

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resample_onto_own_grid_is_identity() {
        let x = vec![400.0, 410.5, 433.0, 500.0, 612.25];
        let y = vec![0.1, 3.0, -2.0, 7.5, 0.0];
        let out = resample(&x, &y, &x, 0.0, 0.0).unwrap();
        for (a, b) in out.iter().zip(&y) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn interpolates_between_points() {
        let out = resample(&[0.0, 10.0], &[0.0, 100.0], &[2.5, 5.0], 0.0, 0.0).unwrap();
        assert!((out[0] - 25.0).abs() < 1e-12);
        assert!((out[1] - 50.0).abs() < 1e-12);
    }

    #[test]
    fn fills_outside_support() {
        let out = resample(&[1.0, 2.0, 3.0], &[5.0, 6.0, 7.0], &[0.0, 1.0, 3.0, 4.0], -1.0, 9.0)
            .unwrap();
        assert_eq!(out, vec![-1.0, 5.0, 7.0, 9.0]);
    }

    #[test]
    fn rejects_descending_source() {
        let err = resample(&[3.0, 2.0, 1.0], &[1.0, 2.0, 3.0], &[2.0], 0.0, 0.0).unwrap_err();
        assert_eq!(err, Error::NotAscending);
    }

    #[test]
    fn rejects_mismatched_lengths() {
        let err = resample(&[1.0, 2.0], &[1.0], &[1.5], 0.0, 0.0).unwrap_err();
        assert_eq!(err, Error::LengthMismatch { x: 2, y: 1 });
    }

    #[test]
    fn empty_target_gives_empty_output() {
        let out = resample(&[1.0, 2.0], &[1.0, 2.0], &[], 0.0, 0.0).unwrap();
        assert!(out.is_empty());
    }
}
