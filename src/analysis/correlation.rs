//! Correlation Engine - Pearson correlation of daily simple returns
//!
//! Degenerate inputs never panic:
//! - fewer than two prices, or vectors of different length: `0.0`
//! - zero variance in either return series: `NaN`
//! - a zero prior price divides through IEEE rules, so the resulting
//!   infinity or NaN carries into the coefficient as `NaN`

/// Returned when there are not enough aligned points to compute returns
pub const INSUFFICIENT_DATA: f64 = 0.0;

/// Day-over-day simple returns `(p[i] - p[i-1]) / p[i-1]`
pub fn simple_returns(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect()
}

/// Population Pearson correlation of two equal-length vectors.
///
/// Returns `NaN` when the vectors are empty or differ in length, when
/// either has zero variance, or when either contains non-finite values.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.is_empty() || x.len() != y.len() {
        return f64::NAN;
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;

    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    // Separate roots keep the product in range for extreme returns
    let denominator = var_x.sqrt() * var_y.sqrt();
    if !denominator.is_finite() || denominator == 0.0 {
        return f64::NAN;
    }

    (cov / denominator).clamp(-1.0, 1.0)
}

/// Correlation of daily returns between two aligned price vectors
pub fn correlate(prices_a: &[f64], prices_b: &[f64]) -> f64 {
    if prices_a.len() != prices_b.len() || prices_a.len() < 2 {
        return INSUFFICIENT_DATA;
    }

    pearson(&simple_returns(prices_a), &simple_returns(prices_b))
}
