//! Visibility signal translation
//!
//! The visibility-detection primitive is external: the host attaches its own
//! observer using the thresholds published here and feeds every threshold
//! crossing back in as an [`IntersectionChange`]. Reporting granularity is
//! 10%, so a page that is barely visible still starts loading while the
//! consumer of the upward signal can apply its own, higher threshold.

/// Number of evenly spaced reporting buckets
pub const REPORT_BUCKETS: usize = 10;

/// Ratio reported upward for a page that is not visible at all
pub const HIDDEN_RATIO: f32 = -1.0;

/// Intersection thresholds to configure the host observer with:
/// `[0.0, 0.1, .., 0.9]`
#[must_use]
pub fn intersection_thresholds() -> [f32; REPORT_BUCKETS] {
    let mut thresholds = [0.0; REPORT_BUCKETS];
    for (i, threshold) in thresholds.iter_mut().enumerate() {
        *threshold = i as f32 / REPORT_BUCKETS as f32;
    }
    thresholds
}

/// Quantize a raw intersection ratio to the reporting granularity.
///
/// Out-of-range input is clamped to `[0, 1]` first.
#[must_use]
pub fn quantize_ratio(ratio: f32) -> f32 {
    let clamped = ratio.clamp(0.0, 1.0);
    (clamped * REPORT_BUCKETS as f32).floor() / REPORT_BUCKETS as f32
}

/// One raw event from the visibility primitive
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntersectionChange {
    /// Whether any part of the page box intersects the viewport
    pub is_visible: bool,
    /// Fractional overlap in `[0, 1]`
    pub ratio: f32,
}

impl IntersectionChange {
    /// Ratio forwarded upward: the fraction when visible, `-1` otherwise
    #[must_use]
    pub fn report_ratio(self) -> f32 {
        if self.is_visible {
            self.ratio
        } else {
            HIDDEN_RATIO
        }
    }
}
