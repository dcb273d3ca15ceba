//! Typed render-node tree
//!
//! Composition output is an explicit tree of typed nodes rather than opaque
//! markup, so the result of a render pass can be inspected and asserted on
//! without a UI runtime. Leaves describe which rendering subsystem to invoke
//! and with what parameters; actual rasterization, text shaping, and
//! annotation hit-testing happen outside this crate.

use serde::{Deserialize, Serialize};

/// The four built-in layers, bottom to top in the default merge
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerKind {
    /// Rasterized page pixels
    Raster,
    /// Selectable text runs
    Text,
    /// Interactive annotations (links, form fields)
    Annotation,
    /// Vector overlay, not part of the default merge
    Vector,
}

/// Attribute bag attached to every built-in layer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerAttributes {
    pub kind: LayerKind,
    pub page: usize,
    /// Final render width, transform applied
    pub width: f32,
    /// Final render height, transform applied
    pub height: f32,
    /// Effective rotation in degrees
    pub rotation: i32,
    pub scale: f32,
}

/// One node of the composed render tree
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RenderNode {
    Raster(LayerAttributes),
    Text(LayerAttributes),
    Annotation(LayerAttributes),
    Vector(LayerAttributes),
    /// Ordered children, bottom to top
    Group(Vec<RenderNode>),
    /// Plugin-defined content with a free-form attribute bag
    Custom {
        label: String,
        props: serde_json::Value,
    },
    /// Empty slot that keeps sibling positions stable
    Placeholder,
}

impl RenderNode {
    /// Child nodes of a group, or an empty slice for leaves
    #[must_use]
    pub fn children(&self) -> &[RenderNode] {
        match self {
            Self::Group(children) => children,
            _ => &[],
        }
    }
}

/// One renderable layer: its attribute bag plus rendered content.
///
/// Bundles are assembled fresh on every render pass and handed to the
/// composer; nothing here outlives the pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerBundle {
    pub attributes: LayerAttributes,
    pub content: RenderNode,
}

impl LayerBundle {
    #[must_use]
    pub fn new(attributes: LayerAttributes, content: RenderNode) -> Self {
        Self {
            attributes,
            content,
        }
    }
}
