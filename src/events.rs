//! Events reported upward to the document-level container

/// Messages a page container sends to whoever owns the whole document view
#[derive(Clone, Debug, PartialEq)]
pub enum ViewerEvent {
    /// Visibility ratio changed for a page.
    ///
    /// Emitted on every intersection change, before geometry has resolved if
    /// need be. `ratio` is the fractional overlap, or `-1.0` when the page is
    /// not visible.
    PageVisibilityChanged { page: usize, ratio: f32 },

    /// A named document action was triggered from the annotation layer
    ExecuteNamedAction { action: String },

    /// A destination jump was triggered from the annotation layer
    JumpToDest {
        page: usize,
        bottom_offset: f32,
        left_offset: f32,
        scale_target: Option<f32>,
    },
}
