//! Simple daily returns.

/// `p[t] / p[t-1] - 1`, aligned with the input.
///
/// Index 0 is always `None`. A return is defined only when both the current
/// and previous observation are present and the previous price is non-zero.
pub fn simple_returns(prices: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = vec![None; prices.len()];
    for i in 1..prices.len() {
        if let (Some(prev), Some(cur)) = (prices[i - 1], prices[i]) {
            if prev != 0.0 {
                out[i] = Some(cur / prev - 1.0);
            }
        }
    }
    out
}

/// Compounded growth of a return sequence: running `∏(1 + r) - 1`.
pub fn cumulative_returns(returns: &[f64]) -> Vec<f64> {
    let mut growth = 1.0;
    returns
        .iter()
        .map(|r| {
            growth *= 1.0 + r;
            growth - 1.0
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-12, "{a} != {b}");
    }

    #[test]
    fn three_prices_two_returns() {
        let r = simple_returns(&[Some(100.0), Some(110.0), Some(121.0)]);
        assert_eq!(r[0], None);
        approx(r[1].unwrap(), 0.10);
        approx(r[2].unwrap(), 0.10);
    }

    #[test]
    fn gap_breaks_both_adjacent_returns() {
        let r = simple_returns(&[Some(100.0), None, Some(121.0), Some(133.1)]);
        assert_eq!(r[1], None);
        assert_eq!(r[2], None);
        approx(r[3].unwrap(), 0.10);
    }

    #[test]
    fn zero_previous_price_is_undefined() {
        let r = simple_returns(&[Some(0.0), Some(5.0)]);
        assert_eq!(r[1], None);
    }

    #[test]
    fn empty_and_single() {
        assert!(simple_returns(&[]).is_empty());
        assert_eq!(simple_returns(&[Some(1.0)]), vec![None]);
    }

    #[test]
    fn cumulative_compounds() {
        let c = cumulative_returns(&[0.10, 0.10]);
        approx(c[0], 0.10);
        approx(c[1], 0.21);
    }

    #[test]
    fn cumulative_of_loss_then_gain() {
        let c = cumulative_returns(&[-0.5, 1.0]);
        approx(c[1], 0.0);
    }
}
