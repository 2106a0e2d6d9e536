//! Indicator implementations
//!
//! Price providers, reference moving averages, the ZigZag state and the
//! swing-point indicators.

pub mod constant;
pub mod ema;
pub mod fractal_swing;
pub mod price;
pub mod sma;
pub mod swing_marker;
pub mod zigzag;
