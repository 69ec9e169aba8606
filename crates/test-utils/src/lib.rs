//! Shared test utilities for the climate overlay workspace.
//!
//! - Sample readings, coordinates and registry YAML
//! - PNG decoding for structural tile assertions
//! - Temporary config files
//!
//! ```ignore
//! use test_utils::{decode_png, fixtures};
//! ```

pub mod fixtures;
pub mod images;

pub use fixtures::*;
pub use images::*;

/// Macro for approximate floating-point equality assertions.
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}
