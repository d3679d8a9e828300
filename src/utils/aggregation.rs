/// Signed relative change from `prev` to `current`.
///
/// Equal values give 0. A change away from zero gives `+inf` or `-inf`
/// instead of a division error, so callers can tell runaway growth apart from
/// ordinary percentages.
pub fn safe_rate_of_change(prev: f64, current: f64) -> f64 {
    if prev == current {
        0.0
    } else if prev != 0.0 {
        let delta = current / prev;
        if delta < 1.0 {
            -(1.0 - delta)
        } else {
            delta - 1.0
        }
    } else if current > 0.0 {
        f64::INFINITY
    } else {
        f64::NEG_INFINITY
    }
}

/// Zero-based quarter of a 1-based month: Jan..Mar is quarter 0.
pub fn month_to_quarter(month: u32) -> u32 {
    month.saturating_sub(1) / 3
}

/// Median of `values` that skips the leading run of zeroes.
///
/// The values are sorted ascending and the element at
/// `last_zero + (n - last_zero) / 2` is returned, where `last_zero` is the
/// index of the last zero (or -1 when there is none). Returns `None` for an
/// empty slice.
pub fn median_excluding_zeroes(values: &[u64]) -> Option<u64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    let n = sorted.len() as isize;
    let last_zero = sorted
        .iter()
        .rposition(|&value| value == 0)
        .map(|idx| idx as isize)
        .unwrap_or(-1);
    let idx = last_zero + (n - last_zero) / 2;

    sorted.get(idx as usize).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rate_of_change_examples() {
        assert_eq!(safe_rate_of_change(10.0, 20.0), 1.0);
        assert_eq!(safe_rate_of_change(20.0, 10.0), -0.5);
        assert_eq!(safe_rate_of_change(0.0, 5.0), f64::INFINITY);
        assert_eq!(safe_rate_of_change(0.0, 0.0), 0.0);
        assert_eq!(safe_rate_of_change(7.0, 7.0), 0.0);
    }

    #[test]
    fn test_rate_of_change_from_zero_to_negative() {
        assert_eq!(safe_rate_of_change(0.0, -3.0), f64::NEG_INFINITY);
    }

    #[test]
    fn test_rate_of_change_zero_only_when_equal() {
        for prev in 0..6 {
            for current in 0..6 {
                let rate = safe_rate_of_change(prev as f64, current as f64);
                assert_eq!(rate == 0.0, prev == current, "rate({prev}, {current}) = {rate}");
            }
        }
    }

    #[test]
    fn test_month_to_quarter() {
        assert_eq!(month_to_quarter(1), 0);
        assert_eq!(month_to_quarter(3), 0);
        assert_eq!(month_to_quarter(4), 1);
        assert_eq!(month_to_quarter(9), 2);
        assert_eq!(month_to_quarter(12), 3);
    }

    #[test]
    fn test_median_skips_zero_run() {
        assert_eq!(median_excluding_zeroes(&[0, 0, 0, 2, 4, 6]), Some(4));
        assert_eq!(median_excluding_zeroes(&[6, 0, 4, 0, 2, 0]), Some(4));
    }

    #[test]
    fn test_median_without_zeroes() {
        assert_eq!(median_excluding_zeroes(&[1, 2, 3]), Some(2));
        assert_eq!(median_excluding_zeroes(&[1, 2, 3, 4]), Some(2));
        assert_eq!(median_excluding_zeroes(&[9]), Some(9));
    }

    #[test]
    fn test_median_all_zeroes_and_empty() {
        assert_eq!(median_excluding_zeroes(&[0, 0, 0]), Some(0));
        assert_eq!(median_excluding_zeroes(&[]), None);
    }
}
