//! Trailing (causal) simple moving average.
//!
//! For output index `i`:
//! - `i < k - 1`: the raw value (not enough history yet)
//! - otherwise: the mean of raw values `[i - k + 1, i]`
//!
//! The window never looks ahead. Output length always equals input length.

use std::num::NonZeroUsize;

use crate::message::Message;

/// Sort `messages` by sequence number, then smooth their values.
///
/// Out-of-order arrival is corrected here rather than at receive time.
pub fn moving_average(messages: &mut [Message], window: NonZeroUsize) -> Vec<f32> {
    messages.sort_by_key(|m| m.sequence_number);
    let values: Vec<f32> = messages.iter().map(|m| m.value).collect();
    smooth_values(&values, window)
}

pub fn smooth_values(values: &[f32], window: NonZeroUsize) -> Vec<f32> {
    let k = window.get();
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0f64;

    for (i, &v) in values.iter().enumerate() {
        sum += f64::from(v);
        if i >= k {
            sum -= f64::from(values[i - k]);
        }

        if i + 1 < k {
            out.push(v);
        } else {
            out.push((sum / k as f64) as f32);
        }
    }
    out
}
