//! Page container
//!
//! One `PageContainer` owns the full lifecycle of one page: it feeds host
//! signals through the state machine, executes the resulting effects,
//! pumps the geometry fetch, and composes the layer tree. All mutation
//! happens on the host thread inside `apply`/`pump`/`render`; the backend
//! only ever touches the reply channel.

use std::sync::Arc;

use flume::Sender;
use log::{trace, warn};
use serde::{Deserialize, Serialize};

use crate::backend::{DocumentBackend, PageHandle};
use crate::compose::{ComposedPage, DefaultComposer, LayerComposer, RenderContext, compose_page};
use crate::events::ViewerEvent;
use crate::geometry::{PageGeometry, RenderBox};
use crate::plugin::Plugin;
use crate::resolve::{GeometryResolver, SharedGeometryMemo};
use crate::state::{Command, Effect, LifecyclePhase, PageState};
use crate::visibility::IntersectionChange;

/// Pages beyond the current page that resolve proactively
pub const DEFAULT_OVERSCAN: usize = 2;

/// US Letter portrait at 72 dpi, a serviceable guess until resolution
pub const DEFAULT_FALLBACK_WIDTH: f32 = 612.0;
pub const DEFAULT_FALLBACK_HEIGHT: f32 = 792.0;

/// Caller-facing configuration for one page container
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PageContainerOptions {
    /// The current page at mount time (zero-based)
    pub current_page: usize,
    /// Viewer-applied rotation, degrees, multiple of 90
    pub rotation: i32,
    /// Zoom scale, > 0
    pub scale: f32,
    /// Placeholder width until resolution
    pub fallback_width: f32,
    /// Placeholder height until resolution
    pub fallback_height: f32,
    /// Prefetch window radius around the current page
    pub overscan: usize,
}

impl Default for PageContainerOptions {
    fn default() -> Self {
        Self {
            current_page: 0,
            rotation: 0,
            scale: 1.0,
            fallback_width: DEFAULT_FALLBACK_WIDTH,
            fallback_height: DEFAULT_FALLBACK_HEIGHT,
            overscan: DEFAULT_OVERSCAN,
        }
    }
}

/// Owns the lifecycle and composition of one page
pub struct PageContainer {
    backend: Arc<dyn DocumentBackend>,
    state: PageState,
    resolver: GeometryResolver,
    /// Exclusively owned; never shared with sibling containers
    resolved: Option<Arc<dyn PageHandle>>,
    composer: Box<dyn LayerComposer>,
    plugins: Vec<Arc<dyn Plugin>>,
    events: Sender<ViewerEvent>,
    needs_compose: bool,
}

impl PageContainer {
    /// Mount a container with the default composer and no plugins
    #[must_use]
    pub fn new(
        backend: Arc<dyn DocumentBackend>,
        index: usize,
        options: &PageContainerOptions,
        events: Sender<ViewerEvent>,
    ) -> Self {
        Self::with_config(
            backend,
            index,
            options,
            Box::new(DefaultComposer),
            Vec::new(),
            None,
            events,
        )
    }

    /// Mount a container with a custom composer, plugins, and an optional
    /// shared geometry memo
    #[must_use]
    pub fn with_config(
        backend: Arc<dyn DocumentBackend>,
        index: usize,
        options: &PageContainerOptions,
        composer: Box<dyn LayerComposer>,
        plugins: Vec<Arc<dyn Plugin>>,
        memo: Option<SharedGeometryMemo>,
        events: Sender<ViewerEvent>,
    ) -> Self {
        let resolver = GeometryResolver::new(backend.clone(), index, memo);

        // A remount can size its placeholder with remembered geometry
        // instead of the caller fallback.
        let fallback = resolver.warm_geometry().unwrap_or(PageGeometry {
            width: options.fallback_width,
            height: options.fallback_height,
            intrinsic_rotation: 0,
        });

        let mut state = PageState::new(
            index,
            backend.page_count(),
            options.current_page,
            options.scale,
            options.rotation,
            fallback,
            options.overscan,
        );

        let effects = state.mount();
        let mut container = Self {
            backend,
            state,
            resolver,
            resolved: None,
            composer,
            plugins,
            events,
            needs_compose: true,
        };
        container.run_effects(effects);
        container
    }

    /// This container's page index
    #[must_use]
    pub fn index(&self) -> usize {
        self.state.index
    }

    /// Lifecycle state, for inspection
    #[must_use]
    pub fn state(&self) -> &PageState {
        &self.state
    }

    /// Current lifecycle phase
    #[must_use]
    pub fn phase(&self) -> LifecyclePhase {
        self.state.phase()
    }

    /// Final on-screen box under the current transform
    #[must_use]
    pub fn render_box(&self) -> RenderBox {
        self.state.render_box()
    }

    /// Whether the composed output is stale
    #[must_use]
    pub fn needs_compose(&self) -> bool {
        self.needs_compose
    }

    /// Feed one raw event from the host's visibility observer.
    ///
    /// The ratio is forwarded upward on every change, resolved or not; a
    /// visible page additionally starts resolving.
    pub fn handle_intersection(&mut self, change: IntersectionChange) {
        let effects = self.state.apply(Command::Intersection(change));
        self.run_effects(effects);
    }

    /// React to the caller-controlled current page moving
    pub fn set_current_page(&mut self, page: usize) {
        let effects = self.state.apply(Command::SetCurrentPage(page));
        self.run_effects(effects);
    }

    pub fn set_scale(&mut self, scale: f32) {
        let effects = self.state.apply(Command::SetScale(scale));
        self.run_effects(effects);
    }

    pub fn set_rotation(&mut self, rotation: i32) {
        let effects = self.state.apply(Command::SetRotation(rotation));
        self.run_effects(effects);
    }

    /// Drain fetch completions. Returns true if the page resolved on this
    /// pump.
    pub fn pump(&mut self) -> bool {
        let mut resolved_now = false;

        while let Some(outcome) = self.resolver.poll() {
            match outcome {
                Ok(resolution) => {
                    if self.resolved.is_none() {
                        self.resolved = Some(resolution.handle);
                        resolved_now = true;
                    }
                    let effects = self.state.apply(Command::GeometryResolved(resolution.geometry));
                    self.run_effects(effects);
                }
                Err(fault) => {
                    warn!("page {} geometry fetch failed: {fault}", self.state.index);
                    let effects = self.state.apply(Command::GeometryFailed);
                    self.run_effects(effects);
                }
            }
        }

        resolved_now
    }

    /// Compose the current render output and mark it fresh.
    ///
    /// Before resolution this is a placeholder tree sized by the fallback
    /// geometry; plugins only run against resolved pages.
    pub fn render(&mut self) -> ComposedPage {
        self.needs_compose = false;
        let bounds = self.state.render_box();

        let Some(page) = &self.resolved else {
            return ComposedPage::placeholder(self.state.index, bounds);
        };

        let ctx = RenderContext {
            page,
            page_index: self.state.index,
            width: bounds.width,
            height: bounds.height,
            rotation: self.state.effective_rotation(),
            scale: self.state.scale,
        };

        compose_page(
            self.composer.as_ref(),
            &ctx,
            &self.backend,
            self.state.rotation,
            &self.plugins,
        )
    }

    /// Forward a named action from the annotation layer
    pub fn execute_named_action(&self, action: impl Into<String>) {
        let _ = self.events.send(ViewerEvent::ExecuteNamedAction {
            action: action.into(),
        });
    }

    /// Forward a destination jump from the annotation layer
    pub fn jump_to_dest(
        &self,
        page: usize,
        bottom_offset: f32,
        left_offset: f32,
        scale_target: Option<f32>,
    ) {
        let _ = self.events.send(ViewerEvent::JumpToDest {
            page,
            bottom_offset,
            left_offset,
            scale_target,
        });
    }

    fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            trace!("page {}: {effect:?}", self.state.index);
            match effect {
                Effect::ReportVisibility(ratio) => {
                    let _ = self.events.send(ViewerEvent::PageVisibilityChanged {
                        page: self.state.index,
                        ratio,
                    });
                }
                Effect::RequestGeometry => self.resolver.dispatch(),
                Effect::Recompose => self.needs_compose = true,
            }
        }
    }
}
