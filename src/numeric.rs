//! Basic numerical concepts used throughout the crate

#![allow(missing_docs)]

// Floating-point precision is configured here
#[cfg(feature = "f32")]
pub type Float = f32;
#[cfg(feature = "f32")]
pub use std::f32 as reals;
#[cfg(not(feature = "f32"))]
pub type Float = f64;
#[cfg(not(feature = "f32"))]
pub use std::f64 as reals;

/// Reserved sentinel marking an absent or padded slot
///
/// Any attribute of a ranked slot beyond an event's actual number of objects
/// carries this value, as do derived attributes which cannot be computed
/// because an input object is missing.
///
pub const DUMMY_VALUE: Float = -999.;

/// Truth that a value is the padding sentinel
pub fn is_dummy(x: Float) -> bool {
    x == DUMMY_VALUE
}
