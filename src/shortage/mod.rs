//! Shortage detection and severity classification
//!
//! Derives per-camp shortage views from inventory snapshots and classifies
//! their urgency. Pure read-side logic; the allocation engine and the
//! statistics aggregator both build on the views produced here.

pub mod calculator;
pub mod severity;

pub use calculator::{ShortageCalculator, ShortageView};
pub use severity::{
    classify_severity, shortage_ratio, Severity, ShortageRatio, CRITICAL_NEED_MULTIPLIER,
    HIGH_NEED_MULTIPLIER,
};
