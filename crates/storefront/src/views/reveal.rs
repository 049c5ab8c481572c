//! Scroll-triggered reveal animation.
//!
//! Elements marked `.reveal` become `active` once at least
//! [`RevealConfig::threshold`] of their height is inside the viewport,
//! where the viewport's bottom edge is pulled up by
//! [`RevealConfig::bottom_margin_px`]. Activation is permanent; only the
//! section router clears it when a section is hidden.
//!
//! The browser applies the rule with an `IntersectionObserver` configured
//! from the `data-reveal-*` attributes rendered on `<body>`.

/// Observer configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealConfig {
    /// Fraction of the element that must be visible.
    pub threshold: f64,
    /// Pixels removed from the bottom of the viewport.
    pub bottom_margin_px: u32,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            threshold: 0.15,
            bottom_margin_px: 50,
        }
    }
}

impl RevealConfig {
    /// `rootMargin` string for `IntersectionObserver`.
    #[must_use]
    pub fn root_margin(&self) -> String {
        format!("0px 0px -{}px 0px", self.bottom_margin_px)
    }

    /// Fraction of an element (`top`, `height`, in viewport coordinates)
    /// inside a viewport of `viewport_height` after the bottom margin.
    #[must_use]
    pub fn visible_ratio(&self, top: f64, height: f64, viewport_height: f64) -> f64 {
        if height <= 0.0 {
            return 0.0;
        }
        let bottom_edge = viewport_height - f64::from(self.bottom_margin_px);
        let visible = (top + height).min(bottom_edge) - top.max(0.0);
        (visible / height).clamp(0.0, 1.0)
    }

    /// Whether an element at this position should be activated.
    #[must_use]
    pub fn should_activate(&self, top: f64, height: f64, viewport_height: f64) -> bool {
        let ratio = self.visible_ratio(top, height, viewport_height);
        ratio > 0.0 && ratio >= self.threshold
    }
}

/// Whether a reveal element is active after an observation, given whether
/// it was active before. Once active, it stays active.
#[must_use]
pub const fn next_active(was_active: bool, intersecting: bool) -> bool {
    was_active || intersecting
}
