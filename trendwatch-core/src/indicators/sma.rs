//! Rolling arithmetic mean.

/// Rolling mean over `period` values; `NaN` until the window is full.
///
/// Uses a running sum, so the output for bar t only reads `values[t+1-period..=t]`.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    let mut sum: f64 = values[..period].iter().sum();
    result[period - 1] = sum / period as f64;
    for i in period..n {
        sum += values[i] - values[i - period];
        result[i] = sum / period as f64;
    }
    result
}
