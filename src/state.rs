//! Page lifecycle state machine
//!
//! Three independent signals can race for one page: document metadata
//! becoming available, visibility events from the host observer, and the
//! caller moving the current page. The state machine collapses them into
//! deterministic effects; the `fetch_requested` guard flips in the same
//! `apply` call that emits [`Effect::RequestGeometry`], so at most one
//! backend fetch is ever issued per container, no matter how the signals
//! interleave.

use crate::geometry::{self, PageGeometry, RenderBox};
use crate::visibility::IntersectionChange;

/// Where a page is in its lifecycle.
///
/// There is no backward transition: once resolved, a page's geometry is
/// immutable, and a failed fetch parks the page in `Resolving` with its
/// placeholder showing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// Nothing requested yet; fallback geometry in use
    Placeholder,
    /// Fetch in flight (or failed); fallback geometry in use
    Resolving,
    /// Geometry known; terminal
    Resolved,
}

/// Lifecycle state owned by one page container
#[derive(Clone, Debug)]
pub struct PageState {
    /// This page's zero-based index
    pub index: usize,
    /// Total pages in the document
    pub page_count: usize,
    /// The caller-controlled current page
    pub current_page: usize,
    /// Viewer zoom scale
    pub scale: f32,
    /// Viewer-applied document rotation, degrees
    pub rotation: i32,
    /// Pages beyond the current page that resolve proactively
    pub overscan: usize,
    /// Size assumed until resolution completes
    pub fallback: PageGeometry,
    /// Resolved geometry; never changes once set
    pub geometry: Option<PageGeometry>,
    /// Flips true together with the fetch request it guards
    pub fetch_requested: bool,
}

/// Inputs to the state machine
#[derive(Clone, Debug)]
pub enum Command {
    /// The caller moved the current page
    SetCurrentPage(usize),
    /// The viewer zoom changed
    SetScale(f32),
    /// The viewer rotation changed
    SetRotation(i32),
    /// The host observer reported a threshold crossing
    Intersection(IntersectionChange),
    /// The backend fetch completed
    GeometryResolved(PageGeometry),
    /// The backend fetch failed
    GeometryFailed,
}

/// Outputs of the state machine, executed by the container
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Forward the visibility ratio upward (`-1.0` when hidden)
    ReportVisibility(f32),
    /// Dispatch the backend geometry fetch
    RequestGeometry,
    /// The composed output is stale
    Recompose,
}

impl PageState {
    #[must_use]
    pub fn new(
        index: usize,
        page_count: usize,
        current_page: usize,
        scale: f32,
        rotation: i32,
        fallback: PageGeometry,
        overscan: usize,
    ) -> Self {
        Self {
            index,
            page_count,
            current_page: current_page.min(page_count.saturating_sub(1)),
            scale,
            rotation,
            overscan,
            fallback,
            geometry: None,
            fetch_requested: false,
        }
    }

    /// Current lifecycle phase, derived from the resolution fields
    #[must_use]
    pub fn phase(&self) -> LifecyclePhase {
        if self.geometry.is_some() {
            LifecyclePhase::Resolved
        } else if self.fetch_requested {
            LifecyclePhase::Resolving
        } else {
            LifecyclePhase::Placeholder
        }
    }

    /// Whether this page sits inside the prefetch window around the current
    /// page
    #[must_use]
    pub fn within_overscan(&self) -> bool {
        self.index.abs_diff(self.current_page) <= self.overscan
    }

    /// Effects to run when the container mounts: pages already near the
    /// current page start resolving before they ever become visible.
    #[must_use]
    pub fn mount(&mut self) -> Vec<Effect> {
        self.request_if_near_current()
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::SetCurrentPage(page) => {
                let clamped = page.min(self.page_count.saturating_sub(1));
                if self.current_page == clamped {
                    return vec![];
                }
                self.current_page = clamped;
                self.request_if_near_current()
            }

            Command::SetScale(scale) => {
                if (self.scale - scale).abs() <= f32::EPSILON {
                    return vec![];
                }
                self.scale = scale;
                vec![Effect::Recompose]
            }

            Command::SetRotation(rotation) => {
                if self.rotation == rotation {
                    return vec![];
                }
                self.rotation = rotation;
                vec![Effect::Recompose]
            }

            Command::Intersection(change) => {
                let mut effects = vec![Effect::ReportVisibility(change.report_ratio())];
                if change.is_visible {
                    effects.extend(self.request_if_unresolved());
                }
                effects
            }

            Command::GeometryResolved(geometry) => {
                if self.geometry.is_some() {
                    // First resolution wins; metadata is immutable.
                    return vec![];
                }
                self.geometry = Some(geometry);
                vec![Effect::Recompose]
            }

            Command::GeometryFailed => {
                // Absorbed: the page stays in Resolving and keeps showing
                // its placeholder. Retries, if any, are the backend's call.
                vec![]
            }
        }
    }

    /// Final render box: resolved geometry when available, the fallback
    /// otherwise, both under the same transform so the layout box does not
    /// jump shape on resolution (aspect ratio aside).
    #[must_use]
    pub fn render_box(&self) -> RenderBox {
        self.geometry
            .unwrap_or(self.fallback)
            .render_box(self.scale, self.rotation)
    }

    /// Effective rotation for the built-in layers
    #[must_use]
    pub fn effective_rotation(&self) -> i32 {
        let intrinsic = self.geometry.map_or(0, |g| g.intrinsic_rotation);
        geometry::effective_rotation(self.rotation, intrinsic)
    }

    fn request_if_unresolved(&mut self) -> Vec<Effect> {
        if self.fetch_requested || self.geometry.is_some() {
            return vec![];
        }
        self.fetch_requested = true;
        vec![Effect::RequestGeometry]
    }

    fn request_if_near_current(&mut self) -> Vec<Effect> {
        if self.within_overscan() {
            self.request_if_unresolved()
        } else {
            vec![]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state(index: usize) -> PageState {
        PageState::new(
            index,
            100,
            10,
            1.0,
            0,
            PageGeometry {
                width: 200.0,
                height: 100.0,
                intrinsic_rotation: 0,
            },
            2,
        )
    }

    fn visible(ratio: f32) -> Command {
        Command::Intersection(IntersectionChange {
            is_visible: true,
            ratio,
        })
    }

    #[test]
    fn repeated_visibility_requests_geometry_once() {
        let mut state = test_state(50);

        let effects = state.apply(visible(0.1));
        assert_eq!(
            effects,
            vec![Effect::ReportVisibility(0.1), Effect::RequestGeometry]
        );

        for _ in 0..5 {
            let effects = state.apply(visible(0.2));
            assert_eq!(effects, vec![Effect::ReportVisibility(0.2)]);
        }
    }

    #[test]
    fn hidden_pages_report_negative_one_and_do_not_request() {
        let mut state = test_state(50);

        let effects = state.apply(Command::Intersection(IntersectionChange {
            is_visible: false,
            ratio: 0.8,
        }));
        assert_eq!(effects, vec![Effect::ReportVisibility(-1.0)]);
        assert_eq!(state.phase(), LifecyclePhase::Placeholder);
    }

    #[test]
    fn mount_prefetches_pages_inside_the_overscan_window() {
        for index in [8, 9, 10, 11, 12] {
            let mut state = test_state(index);
            assert_eq!(
                state.mount(),
                vec![Effect::RequestGeometry],
                "page {index} should prefetch"
            );
        }

        let mut state = test_state(13);
        assert!(state.mount().is_empty());
        assert_eq!(state.phase(), LifecyclePhase::Placeholder);
    }

    #[test]
    fn current_page_change_pulls_pages_into_the_window() {
        let mut state = test_state(13);
        assert!(state.mount().is_empty());

        let effects = state.apply(Command::SetCurrentPage(11));
        assert_eq!(effects, vec![Effect::RequestGeometry]);
        assert_eq!(state.phase(), LifecyclePhase::Resolving);
    }

    #[test]
    fn current_page_clamps_to_document_length() {
        let mut state = test_state(50);
        let _ = state.apply(Command::SetCurrentPage(999));
        assert_eq!(state.current_page, 99);
    }

    #[test]
    fn geometry_is_immutable_after_first_resolution() {
        let mut state = test_state(10);
        let _ = state.mount();

        let first = PageGeometry {
            width: 300.0,
            height: 150.0,
            intrinsic_rotation: 90,
        };
        let effects = state.apply(Command::GeometryResolved(first));
        assert_eq!(effects, vec![Effect::Recompose]);
        assert_eq!(state.phase(), LifecyclePhase::Resolved);

        let second = PageGeometry {
            width: 999.0,
            height: 999.0,
            intrinsic_rotation: 0,
        };
        let effects = state.apply(Command::GeometryResolved(second));
        assert!(effects.is_empty());
        assert_eq!(state.geometry, Some(first));
    }

    #[test]
    fn failed_fetch_parks_the_page_in_resolving() {
        let mut state = test_state(10);
        let _ = state.mount();
        assert_eq!(state.phase(), LifecyclePhase::Resolving);

        let effects = state.apply(Command::GeometryFailed);
        assert!(effects.is_empty());
        assert_eq!(state.phase(), LifecyclePhase::Resolving);

        // Later visibility must not re-request: the guard already flipped.
        let effects = state.apply(visible(0.5));
        assert_eq!(effects, vec![Effect::ReportVisibility(0.5)]);
    }

    #[test]
    fn unchanged_scale_and_rotation_are_no_ops() {
        let mut state = test_state(10);

        assert!(state.apply(Command::SetScale(1.0)).is_empty());
        assert_eq!(
            state.apply(Command::SetScale(2.0)),
            vec![Effect::Recompose]
        );

        assert!(state.apply(Command::SetRotation(0)).is_empty());
        assert_eq!(
            state.apply(Command::SetRotation(90)),
            vec![Effect::Recompose]
        );
    }

    #[test]
    fn placeholder_box_scales_like_resolved_geometry() {
        let mut state = test_state(10);
        let _ = state.apply(Command::SetScale(2.0));
        let _ = state.apply(Command::SetRotation(90));

        // Fallback 200x100 under scale 2, rotation 90: swapped and scaled.
        let before = state.render_box();
        assert_eq!(before.width, 200.0);
        assert_eq!(before.height, 400.0);

        let _ = state.apply(Command::GeometryResolved(PageGeometry {
            width: 200.0,
            height: 100.0,
            intrinsic_rotation: 0,
        }));
        assert_eq!(state.render_box(), before);
    }

    #[test]
    fn effective_rotation_folds_intrinsic_rotation_in() {
        let mut state = test_state(10);
        let _ = state.apply(Command::SetRotation(270));
        assert_eq!(state.effective_rotation(), 270);

        let _ = state.apply(Command::GeometryResolved(PageGeometry {
            width: 100.0,
            height: 200.0,
            intrinsic_rotation: 180,
        }));
        assert_eq!(state.effective_rotation(), 90);
    }
}
