// src/services/mod.rs
//
// Core lesson logic. Every operation takes the pool and the authenticated
// `Requester` explicitly; handlers only translate HTTP in and out.

pub mod analytics;
pub mod attendance;
pub mod groups;
pub mod lessons;
pub mod submissions;
pub mod task_store;

/// `round(numerator / denominator)` with halves rounded up, on integers.
/// Both arguments must be non-negative and `denominator` non-zero.
pub(crate) fn round_half_up(numerator: i64, denominator: i64) -> i64 {
    (2 * numerator + denominator) / (2 * denominator)
}
