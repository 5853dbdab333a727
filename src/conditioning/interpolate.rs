/// Marker returned when a series has no known value to interpolate from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllMissing;

/// Fills gaps in `values` by linear interpolation along their given order.
///
/// Interior gaps are filled on the straight line between the nearest known
/// neighbours: a gap of `k` cells between `a` (at `i`) and `b` (at `i + k + 1`)
/// gets `a + j * (b - a) / (k + 1)` at `i + j`. Leading and trailing runs copy
/// the nearest known value.
///
/// An empty series is returned as-is. A non-empty series with no known value
/// yields [`AllMissing`].
pub fn interpolate_linear(values: &[Option<f64>]) -> Result<Vec<f64>, AllMissing> {
    let mut out = vec![0.0; values.len()];
    let mut prev: Option<(usize, f64)> = None;

    for (i, value) in values.iter().enumerate() {
        let Some(b) = *value else {
            continue;
        };

        match prev {
            None => out[..i].fill(b),
            Some((p, a)) => {
                let span = (i - p) as f64;
                for j in 1..(i - p) {
                    out[p + j] = a + j as f64 * (b - a) / span;
                }
            }
        }

        out[i] = b;
        prev = Some((i, b));
    }

    match prev {
        Some((p, a)) => {
            out[p + 1..].fill(a);
            Ok(out)
        }
        None if values.is_empty() => Ok(out),
        None => Err(AllMissing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interior_gap_is_evenly_spaced() {
        let filled = interpolate_linear(&[Some(2.0), None, None, Some(8.0)]).unwrap();
        assert_eq!(filled, vec![2.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn test_leading_gap_extends_flat() {
        let filled = interpolate_linear(&[None, None, Some(5.0), Some(9.0)]).unwrap();
        assert_eq!(filled, vec![5.0, 5.0, 5.0, 9.0]);
    }

    #[test]
    fn test_trailing_gap_extends_flat() {
        let filled = interpolate_linear(&[Some(1.0), Some(3.0), None, None]).unwrap();
        assert_eq!(filled, vec![1.0, 3.0, 3.0, 3.0]);
    }

    #[test]
    fn test_single_known_value_fills_everything() {
        let filled = interpolate_linear(&[None, Some(7.5), None]).unwrap();
        assert_eq!(filled, vec![7.5, 7.5, 7.5]);
    }

    #[test]
    fn test_descending_gap() {
        let filled = interpolate_linear(&[Some(10.0), None, Some(0.0)]).unwrap();
        assert_eq!(filled, vec![10.0, 5.0, 0.0]);
    }

    #[test]
    fn test_all_missing_is_reported() {
        assert_eq!(interpolate_linear(&[None, None, None]), Err(AllMissing));
    }

    #[test]
    fn test_empty_series() {
        assert_eq!(interpolate_linear(&[]), Ok(vec![]));
    }

    #[test]
    fn test_interpolation_is_idempotent() {
        let input = [None, Some(1.0), None, None, Some(4.5), None, Some(-2.0), None];
        let once = interpolate_linear(&input).unwrap();
        let again: Vec<Option<f64>> = once.iter().copied().map(Some).collect();
        assert_eq!(interpolate_linear(&again).unwrap(), once);
    }
}
