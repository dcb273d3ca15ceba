//! Document backend contract
//!
//! The backend that parses documents and rasterizes content lives outside
//! this crate. Page fetches are asynchronous: the backend replies on the
//! channel it is handed, from whatever thread it likes, and the container
//! observes the completion the next time the host pumps it.

use std::sync::Arc;

use flume::Sender;

/// Page dimensions and document-declared rotation at a given scale
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    /// Rotation baked into the page, in degrees
    pub rotation: i32,
}

/// A resolved page. Exclusively owned by the container that fetched it.
pub trait PageHandle: Send + Sync {
    /// Query page dimensions under the given scale
    fn viewport(&self, scale: f32) -> Viewport;
}

/// Errors from the document backend
#[derive(Debug, thiserror::Error)]
pub enum BackendFault {
    #[error("page {page} out of bounds")]
    PageOutOfBounds { page: usize },

    #[error("{detail}")]
    Generic { detail: String },
}

impl BackendFault {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic { detail: msg.into() }
    }
}

pub type PageFetchResult = Result<Arc<dyn PageHandle>, BackendFault>;

/// Completion message for a page fetch
pub struct PageFetch {
    pub page: usize,
    pub result: PageFetchResult,
}

/// The document being viewed. Shared read-only across all page containers.
pub trait DocumentBackend: Send + Sync {
    /// Total number of pages
    fn page_count(&self) -> usize;

    /// Start fetching a page, replying on `reply` when done.
    ///
    /// The receiving container may be gone by the time the fetch completes;
    /// the backend must tolerate a closed channel (`send` failing) and drop
    /// the result on the floor.
    fn request_page(&self, page: usize, reply: Sender<PageFetch>);
}
