//! One-pole exponential smoothing
//!
//! `s_i = alpha * x_i + (1 - alpha) * s_{i-1}`
//!
//! The coefficient is chosen so that the most recent `n` inputs carry a
//! fixed fraction of the filter's steady-state response, which makes the
//! response time independent of block size.

use crate::constants::RESPONSE_ENERGY_FRACTION;

/// Smoothing coefficient for a window of `n` inputs
///
/// Returns `alpha` such that the last `n` inputs represent
/// [`RESPONSE_ENERGY_FRACTION`] of the output.
pub fn smoothing_coefficient(n: f64) -> f64 {
    1.0 - (1.0 - RESPONSE_ENERGY_FRACTION).powf(1.0 / (n + 1.0))
}

/// Decay weights `(1 - alpha)^(len - 1 - k)` for `k` in `0..len`
///
/// The last weight is 1 and applies to the newest sample.
pub fn decay_kernel(alpha: f64, len: usize) -> Vec<f64> {
    let decay = 1.0 - alpha;
    let mut kernel = vec![0.0; len];
    let mut weight = 1.0;
    for k in (0..len).rev() {
        kernel[k] = weight;
        weight *= decay;
    }
    kernel
}

/// Run the recursion across `data`, seeded with `previous`
///
/// An empty block returns `previous` unchanged. Non-finite inputs are
/// propagated, not filtered.
pub fn smooth_block<I>(alpha: f64, previous: f64, data: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let decay = 1.0 - alpha;
    data.into_iter()
        .fold(previous, |state, x| alpha * x + decay * state)
}

/// Kernel-weighted form of [`smooth_block`]
///
/// `alpha * sum(kernel[i] * data[i]) + (1 - alpha)^len(data) * previous`,
/// aligning the newest sample with the last kernel weight. Blocks longer
/// than the kernel only contribute their newest `kernel.len()` samples.
pub fn kernel_smoothed_value(kernel: &[f64], alpha: f64, data: &[f64], previous: f64) -> f64 {
    if kernel.is_empty() {
        return previous;
    }

    let used = data.len().min(kernel.len());
    let conv: f64 = kernel[kernel.len() - used..]
        .iter()
        .zip(&data[data.len() - used..])
        .map(|(k, x)| k * x)
        .sum();

    alpha * conv + previous * (1.0 - alpha).powi(data.len() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_coefficient_window_fraction() {
        // After n+1 steps of a unit step input, output reaches w
        let n = 99.0;
        let alpha = smoothing_coefficient(n);
        let out = smooth_block(alpha, 0.0, std::iter::repeat_n(1.0, 100));
        assert_relative_eq!(out, RESPONSE_ENERGY_FRACTION, epsilon = 1e-12);
    }

    #[test]
    fn test_coefficient_zero_window_is_passthrough() {
        // n = 0 means only the newest input counts for w of the response
        let alpha = smoothing_coefficient(0.0);
        assert_relative_eq!(alpha, RESPONSE_ENERGY_FRACTION, epsilon = 1e-15);
    }

    #[test]
    fn test_decay_kernel_shape() {
        let kernel = decay_kernel(0.5, 4);
        assert_eq!(kernel, vec![0.125, 0.25, 0.5, 1.0]);
        assert!(decay_kernel(0.5, 0).is_empty());
    }

    #[test]
    fn test_empty_block_keeps_previous() {
        assert_eq!(smooth_block(0.1, 0.42, std::iter::empty()), 0.42);
        let kernel = decay_kernel(0.1, 8);
        assert_eq!(kernel_smoothed_value(&kernel, 0.1, &[], 0.42), 0.42);
    }

    #[test]
    fn test_kernel_form_matches_recursion() {
        let alpha = smoothing_coefficient(30.0);
        let kernel = decay_kernel(alpha, 256);
        let data: Vec<f64> = (0..200).map(|i| ((i as f64) * 0.37).sin().powi(2)).collect();

        let incremental = smooth_block(alpha, 0.25, data.iter().copied());
        let batch = kernel_smoothed_value(&kernel, alpha, &data, 0.25);
        assert_relative_eq!(incremental, batch, max_relative = 1e-12);
    }

    #[test]
    fn test_kernel_form_truncates_long_blocks() {
        let alpha = smoothing_coefficient(10.0);
        let kernel = decay_kernel(alpha, 64);
        let data = vec![1.0; 1000];

        let batch = kernel_smoothed_value(&kernel, alpha, &data, 0.0);
        let expected = 1.0 - (1.0 - alpha).powi(64);
        assert_relative_eq!(batch, expected, max_relative = 1e-12);
    }

    #[test]
    fn test_nan_propagates() {
        let out = smooth_block(0.5, 1.0, [f64::NAN, 0.0]);
        assert!(out.is_nan());
    }
}
