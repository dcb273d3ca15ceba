//! Layer compositor
//!
//! Builds the four built-in layer bundles for a resolved page, merges them
//! through the active [`LayerComposer`], then appends one node per
//! registered plugin. The default merge stacks raster beneath text beneath
//! annotation; the vector layer is built and handed to custom composers but
//! stays out of the default merge.

use std::sync::Arc;

use log::error;

use crate::backend::{DocumentBackend, PageHandle};
use crate::geometry::RenderBox;
use crate::layer::{LayerAttributes, LayerBundle, LayerKind, RenderNode};
use crate::plugin::{Plugin, PluginFault, PluginLayerContext};

/// Everything a layer factory needs for one render pass
pub struct RenderContext<'a> {
    /// The resolved page
    pub page: &'a Arc<dyn PageHandle>,
    pub page_index: usize,
    /// Final render width, transform applied
    pub width: f32,
    /// Final render height, transform applied
    pub height: f32,
    /// Effective rotation (viewer + intrinsic)
    pub rotation: i32,
    pub scale: f32,
}

impl RenderContext<'_> {
    fn layer_attributes(&self, kind: LayerKind) -> LayerAttributes {
        LayerAttributes {
            kind,
            page: self.page_index,
            width: self.width,
            height: self.height,
            rotation: self.rotation,
            scale: self.scale,
        }
    }
}

/// The four built-in bundles, assembled fresh per render pass
pub struct LayerSet {
    pub raster: LayerBundle,
    pub text: LayerBundle,
    pub annotation: LayerBundle,
    pub vector: LayerBundle,
}

impl LayerSet {
    #[must_use]
    pub fn build(ctx: &RenderContext<'_>) -> Self {
        let bundle = |kind: LayerKind, content: fn(LayerAttributes) -> RenderNode| {
            let attributes = ctx.layer_attributes(kind);
            LayerBundle::new(attributes.clone(), content(attributes))
        };

        Self {
            raster: bundle(LayerKind::Raster, RenderNode::Raster),
            text: bundle(LayerKind::Text, RenderNode::Text),
            annotation: bundle(LayerKind::Annotation, RenderNode::Annotation),
            vector: bundle(LayerKind::Vector, RenderNode::Vector),
        }
    }
}

/// Strategy for arranging the built-in layers.
///
/// The default stacks raster, text, annotation. A caller-supplied composer
/// receives all four bundles and may reorder, hide, or wrap them freely.
pub trait LayerComposer {
    fn compose(&self, layers: &LayerSet, ctx: &RenderContext<'_>) -> RenderNode;
}

/// Raster beneath text beneath annotation; vector left out
pub struct DefaultComposer;

impl LayerComposer for DefaultComposer {
    fn compose(&self, layers: &LayerSet, _ctx: &RenderContext<'_>) -> RenderNode {
        RenderNode::Group(vec![
            layers.raster.content.clone(),
            layers.text.content.clone(),
            layers.annotation.content.clone(),
        ])
    }
}

/// A plugin layer that failed during composition
#[derive(Debug)]
pub struct PluginLayerFault {
    /// Plugin name as reported by [`Plugin::name`]
    pub plugin: String,
    /// Position in the registration order
    pub slot: usize,
    pub fault: PluginFault,
}

/// Output of one render pass
pub struct ComposedPage {
    pub page: usize,
    pub bounds: RenderBox,
    pub root: RenderNode,
    /// Plugins whose layer factory failed; their slots hold placeholders
    pub plugin_faults: Vec<PluginLayerFault>,
}

impl ComposedPage {
    /// Pre-resolution output: an empty tree sized by the fallback geometry
    #[must_use]
    pub fn placeholder(page: usize, bounds: RenderBox) -> Self {
        Self {
            page,
            bounds,
            root: RenderNode::Placeholder,
            plugin_faults: Vec::new(),
        }
    }
}

/// Run one full composition pass for a resolved page.
///
/// `document_rotation` is the viewer rotation before intrinsic
/// normalization; it is what plugins receive, while built-in layers get the
/// effective rotation carried by `ctx`.
///
/// Each plugin invocation is wrapped individually: a failing factory leaves
/// a placeholder in its slot and is reported in `plugin_faults`, so one bad
/// plugin neither kills the render pass nor shifts its siblings.
#[must_use]
pub fn compose_page(
    composer: &dyn LayerComposer,
    ctx: &RenderContext<'_>,
    document: &Arc<dyn DocumentBackend>,
    document_rotation: i32,
    plugins: &[Arc<dyn Plugin>],
) -> ComposedPage {
    let layers = LayerSet::build(ctx);
    let composed = composer.compose(&layers, ctx);

    let mut children = Vec::with_capacity(plugins.len() + 1);
    children.push(composed);

    let plugin_ctx = PluginLayerContext {
        document,
        page: ctx.page_index,
        width: ctx.width,
        height: ctx.height,
        rotation: document_rotation,
        scale: ctx.scale,
    };

    let mut plugin_faults = Vec::new();
    for (slot, plugin) in plugins.iter().enumerate() {
        let Some(factory) = plugin.page_layer() else {
            children.push(RenderNode::Placeholder);
            continue;
        };

        match factory.render(&plugin_ctx) {
            Ok(node) => children.push(node),
            Err(fault) => {
                error!(
                    "plugin '{}' page layer failed on page {}: {fault}",
                    plugin.name(),
                    ctx.page_index
                );
                plugin_faults.push(PluginLayerFault {
                    plugin: plugin.name().to_string(),
                    slot,
                    fault,
                });
                children.push(RenderNode::Placeholder);
            }
        }
    }

    ComposedPage {
        page: ctx.page_index,
        bounds: RenderBox {
            width: ctx.width,
            height: ctx.height,
            rotation: ctx.rotation,
        },
        root: RenderNode::Group(children),
        plugin_faults,
    }
}
