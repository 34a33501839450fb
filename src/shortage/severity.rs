//! Shortage severity policy
//!
//! Thresholds live here as named constants because the statistics
//! aggregator and the allocation priority both depend on them staying
//! identical to the classifier's.

use serde::{Deserialize, Serialize};

// =============================================================================
// Policy Constants
// =============================================================================

/// A shortage is Critical when `needed > CRITICAL_NEED_MULTIPLIER * available`.
/// Exactly double is not Critical.
pub const CRITICAL_NEED_MULTIPLIER: u64 = 2;

/// A shortage is High when `needed > HIGH_NEED_MULTIPLIER * available`.
/// Exactly 1.5x is Normal.
pub const HIGH_NEED_MULTIPLIER: f64 = 1.5;

// =============================================================================
// Severity
// =============================================================================

/// Urgency classification of a shortage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Excluded from critical-shortage views
    Normal,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Normal => write!(f, "Normal"),
            Severity::High => write!(f, "High"),
            Severity::Critical => write!(f, "Critical"),
        }
    }
}

// =============================================================================
// Shortage Ratio
// =============================================================================

/// Needed-to-available ratio of a shortage.
///
/// The zero-available case is an explicit `Unbounded` variant, never a
/// floating-point infinity; ordering and arithmetic in the engine use the
/// shortage amount, so the sentinel stays a display concern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum ShortageRatio {
    Finite(f64),
    Unbounded,
}

impl std::fmt::Display for ShortageRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShortageRatio::Finite(ratio) => write!(f, "{:.2}", ratio),
            ShortageRatio::Unbounded => write!(f, "unbounded"),
        }
    }
}

// =============================================================================
// Classification
// =============================================================================

/// Classify a shortage's urgency from its raw quantities.
///
/// Deterministic and pure. The Critical comparison stays in integer
/// arithmetic so the boundary is exact for any u64 quantities.
pub fn classify_severity(available: u64, needed: u64) -> Severity {
    if available == 0 {
        return if needed > 0 {
            Severity::Critical
        } else {
            Severity::Normal
        };
    }

    if needed > CRITICAL_NEED_MULTIPLIER * available {
        Severity::Critical
    } else if needed as f64 > HIGH_NEED_MULTIPLIER * available as f64 {
        Severity::High
    } else {
        Severity::Normal
    }
}

/// Needed-to-available ratio for display and reporting
pub fn shortage_ratio(available: u64, needed: u64) -> ShortageRatio {
    if available == 0 {
        ShortageRatio::Unbounded
    } else {
        ShortageRatio::Finite(needed as f64 / available as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_available_is_critical() {
        assert_eq!(classify_severity(0, 1), Severity::Critical);
        assert_eq!(classify_severity(0, 500), Severity::Critical);
    }

    #[test]
    fn test_zero_needed_is_normal() {
        assert_eq!(classify_severity(0, 0), Severity::Normal);
        assert_eq!(classify_severity(10, 0), Severity::Normal);
    }

    #[test]
    fn test_high_boundary_is_exclusive() {
        // Exactly 1.5x stays Normal; one unit past it is High.
        assert_eq!(classify_severity(100, 150), Severity::Normal);
        assert_eq!(classify_severity(100, 151), Severity::High);
    }

    #[test]
    fn test_critical_boundary_is_exclusive() {
        // Exactly 2x stays High; one unit past it is Critical.
        assert_eq!(classify_severity(100, 200), Severity::High);
        assert_eq!(classify_severity(100, 201), Severity::Critical);
    }

    #[test]
    fn test_odd_quantities() {
        assert_eq!(classify_severity(3, 4), Severity::Normal);
        assert_eq!(classify_severity(3, 5), Severity::High);
        assert_eq!(classify_severity(3, 7), Severity::Critical);
    }

    #[test]
    fn test_ratio_sentinel() {
        assert_eq!(shortage_ratio(0, 40), ShortageRatio::Unbounded);
        assert_eq!(shortage_ratio(20, 100), ShortageRatio::Finite(5.0));
    }

    #[test]
    fn test_ratio_display_rounds_to_two_decimals() {
        assert_eq!(format!("{}", shortage_ratio(3, 10)), "3.33");
        assert_eq!(format!("{}", shortage_ratio(0, 10)), "unbounded");
    }
}
