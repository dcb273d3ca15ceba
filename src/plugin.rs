//! Plugin capability surface
//!
//! A document view can host any number of plugins. The only capability this
//! crate knows about is contributing a page-level layer; it is modeled as an
//! explicit `Option` so there is no runtime feature probing. Plugins are
//! invoked independently in registration order and a plugin that declines
//! the capability still occupies its slot in the composed output.

use std::sync::Arc;

use crate::backend::DocumentBackend;
use crate::layer::RenderNode;

/// Context handed to plugin page-layer factories.
///
/// `rotation` is the viewer-applied document rotation. Page-intrinsic
/// rotation is folded into the built-in layers only, so plugins see
/// document-space coordinates.
pub struct PluginLayerContext<'a> {
    pub document: &'a Arc<dyn DocumentBackend>,
    pub page: usize,
    pub width: f32,
    pub height: f32,
    pub rotation: i32,
    pub scale: f32,
}

/// Errors raised by plugin layer factories
#[derive(Debug, thiserror::Error)]
pub enum PluginFault {
    #[error("{detail}")]
    Generic { detail: String },
}

impl PluginFault {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic { detail: msg.into() }
    }
}

/// The page-layer capability
pub trait PageLayerFactory {
    fn render(&self, ctx: &PluginLayerContext<'_>) -> Result<RenderNode, PluginFault>;
}

/// A registered plugin
pub trait Plugin {
    /// Stable name, used in logs and fault reports
    fn name(&self) -> &str;

    /// The page-layer capability, if this plugin provides one
    fn page_layer(&self) -> Option<&dyn PageLayerFactory> {
        None
    }
}
