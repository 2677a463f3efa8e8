//! Simple moving average over a trailing window.
//!
//! First defined value at index `window - 1`. A window containing a missing
//! observation is undefined.

/// Rolling mean aligned with the input.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];

    if window == 0 || n < window {
        return result;
    }

    let mut sum = 0.0;
    let mut gaps = 0usize;
    for v in &values[..window] {
        match v {
            Some(x) => sum += x,
            None => gaps += 1,
        }
    }
    if gaps == 0 {
        result[window - 1] = Some(sum / window as f64);
    }

    for i in window..n {
        match values[i - window] {
            Some(x) => sum -= x,
            None => gaps -= 1,
        }
        match values[i] {
            Some(x) => sum += x,
            None => gaps += 1,
        }

        if gaps == 0 {
            // Recompute after leaving a gap so cancellation error from the
            // running sum does not carry across it.
            if values[i - window].is_none() {
                sum = values[(i + 1 - window)..=i].iter().flatten().sum();
            }
            result[i] = Some(sum / window as f64);
        }
    }

    result
}
