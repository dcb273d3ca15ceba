//! Page lifecycle and layer composition for multi-page document viewers
//!
//! One [`PageContainer`] per page: it decides when the page is worth
//! resolving (visible, or near the current page), fetches intrinsic geometry
//! from the backend exactly once, normalizes rotation and zoom, and merges
//! built-in plus plugin layers into one typed render tree.

mod backend;
mod compose;
mod events;
mod geometry;
mod layer;
mod page;
mod plugin;
mod resolve;
mod state;
mod visibility;

pub use backend::{
    BackendFault, DocumentBackend, PageFetch, PageFetchResult, PageHandle, Viewport,
};
pub use compose::{
    ComposedPage, DefaultComposer, LayerComposer, LayerSet, PluginLayerFault, RenderContext,
    compose_page,
};
pub use events::ViewerEvent;
pub use geometry::{PageGeometry, RenderBox, effective_rotation, is_axis_aligned, render_box};
pub use layer::{LayerAttributes, LayerBundle, LayerKind, RenderNode};
pub use page::{
    DEFAULT_FALLBACK_HEIGHT, DEFAULT_FALLBACK_WIDTH, DEFAULT_OVERSCAN, PageContainer,
    PageContainerOptions,
};
pub use plugin::{PageLayerFactory, Plugin, PluginFault, PluginLayerContext};
pub use resolve::{GeometryMemo, GeometryResolver, Resolution, SharedGeometryMemo};
pub use state::{Command, Effect, LifecyclePhase, PageState};
pub use visibility::{
    HIDDEN_RATIO, IntersectionChange, REPORT_BUCKETS, intersection_thresholds, quantize_ratio,
};
