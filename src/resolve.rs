//! Geometry resolution
//!
//! Fetching a page's intrinsic geometry is the one asynchronous step in the
//! page lifecycle. The resolver dispatches the backend fetch with a reply
//! channel and the container polls for the completion; dropping the
//! container drops the receiver, so a late completion lands nowhere and
//! mutates nothing.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use flume::{Receiver, Sender};
use log::debug;
use lru::LruCache;

use crate::backend::{BackendFault, DocumentBackend, PageFetch, PageHandle};
use crate::geometry::PageGeometry;

/// Document-level memo of resolved geometry, keyed by page index.
///
/// Containers are destroyed and recreated as the host virtualizes its scroll
/// window; the memo lets a remounted container size its placeholder with the
/// real page dimensions instead of the caller fallback. It never replaces
/// the fetch itself.
pub struct GeometryMemo {
    entries: LruCache<usize, PageGeometry>,
}

/// Memo shared across all containers of one document
pub type SharedGeometryMemo = Arc<Mutex<GeometryMemo>>;

impl GeometryMemo {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).expect("1 is non-zero")),
            ),
        }
    }

    /// Wrap a new memo for sharing across containers
    #[must_use]
    pub fn shared(capacity: usize) -> SharedGeometryMemo {
        Arc::new(Mutex::new(Self::new(capacity)))
    }

    /// Remembered geometry for a page, promoting it in the LRU order
    #[must_use]
    pub fn get(&mut self, page: usize) -> Option<PageGeometry> {
        self.entries.get(&page).copied()
    }

    pub fn record(&mut self, page: usize, geometry: PageGeometry) {
        self.entries.put(page, geometry);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }
}

/// A completed page fetch
pub struct Resolution {
    pub handle: Arc<dyn PageHandle>,
    pub geometry: PageGeometry,
}

/// Issues the backend fetch for one container and receives its completion
pub struct GeometryResolver {
    backend: Arc<dyn DocumentBackend>,
    page: usize,
    reply_tx: Sender<PageFetch>,
    reply_rx: Receiver<PageFetch>,
    memo: Option<SharedGeometryMemo>,
}

impl GeometryResolver {
    #[must_use]
    pub fn new(
        backend: Arc<dyn DocumentBackend>,
        page: usize,
        memo: Option<SharedGeometryMemo>,
    ) -> Self {
        let (reply_tx, reply_rx) = flume::unbounded();
        Self {
            backend,
            page,
            reply_tx,
            reply_rx,
            memo,
        }
    }

    /// Send the fetch to the backend.
    ///
    /// The caller guards against duplicates; dispatching here is
    /// unconditional.
    pub fn dispatch(&self) {
        debug!("requesting geometry for page {}", self.page);
        self.backend.request_page(self.page, self.reply_tx.clone());
    }

    /// Drain one completed fetch, if any. Never blocks.
    pub fn poll(&self) -> Option<Result<Resolution, BackendFault>> {
        let fetch = self.reply_rx.try_recv().ok()?;

        match fetch.result {
            Ok(handle) => {
                let viewport = handle.viewport(1.0);
                let geometry = PageGeometry {
                    width: viewport.width,
                    height: viewport.height,
                    intrinsic_rotation: viewport.rotation,
                };

                if let Some(memo) = &self.memo {
                    memo.lock()
                        .unwrap_or_else(std::sync::PoisonError::into_inner)
                        .record(fetch.page, geometry);
                }

                Some(Ok(Resolution { handle, geometry }))
            }
            Err(fault) => Some(Err(fault)),
        }
    }

    /// Remembered geometry for this page from a previous mount, if the memo
    /// still holds it
    #[must_use]
    pub fn warm_geometry(&self) -> Option<PageGeometry> {
        let memo = self.memo.as_ref()?;
        memo.lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(self.page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Viewport;

    struct StubPage {
        viewport: Viewport,
    }

    impl PageHandle for StubPage {
        fn viewport(&self, scale: f32) -> Viewport {
            Viewport {
                width: self.viewport.width * scale,
                height: self.viewport.height * scale,
                rotation: self.viewport.rotation,
            }
        }
    }

    /// Backend that fulfills every fetch immediately
    struct InstantBackend {
        viewport: Viewport,
        fail: bool,
    }

    impl DocumentBackend for InstantBackend {
        fn page_count(&self) -> usize {
            10
        }

        fn request_page(&self, page: usize, reply: flume::Sender<PageFetch>) {
            let result = if self.fail {
                Err(BackendFault::generic("broken document"))
            } else {
                Ok(Arc::new(StubPage {
                    viewport: self.viewport,
                }) as Arc<dyn PageHandle>)
            };
            let _ = reply.send(PageFetch { page, result });
        }
    }

    fn test_geometry(page: usize) -> PageGeometry {
        PageGeometry {
            width: 100.0 + page as f32,
            height: 200.0,
            intrinsic_rotation: 0,
        }
    }

    #[test]
    fn memo_records_and_recalls() {
        let mut memo = GeometryMemo::new(4);
        memo.record(2, test_geometry(2));

        assert_eq!(memo.get(2), Some(test_geometry(2)));
        assert_eq!(memo.get(3), None);
        assert_eq!(memo.len(), 1);
    }

    #[test]
    fn memo_evicts_least_recently_used() {
        let mut memo = GeometryMemo::new(2);
        for page in 0..3 {
            memo.record(page, test_geometry(page));
        }

        assert_eq!(memo.get(0), None);
        assert!(memo.get(1).is_some());
        assert!(memo.get(2).is_some());
    }

    #[test]
    fn poll_derives_geometry_from_scale_one_viewport() {
        let backend: Arc<dyn DocumentBackend> = Arc::new(InstantBackend {
            viewport: Viewport {
                width: 200.0,
                height: 100.0,
                rotation: 90,
            },
            fail: false,
        });

        let resolver = GeometryResolver::new(backend, 4, None);
        assert!(resolver.poll().is_none());

        resolver.dispatch();
        let resolution = resolver
            .poll()
            .expect("completion pending")
            .expect("fetch succeeded");
        assert_eq!(resolution.geometry.width, 200.0);
        assert_eq!(resolution.geometry.height, 100.0);
        assert_eq!(resolution.geometry.intrinsic_rotation, 90);
        assert!(resolver.poll().is_none());
    }

    #[test]
    fn successful_poll_feeds_the_memo() {
        let backend: Arc<dyn DocumentBackend> = Arc::new(InstantBackend {
            viewport: Viewport {
                width: 300.0,
                height: 150.0,
                rotation: 0,
            },
            fail: false,
        });

        let memo = GeometryMemo::shared(8);
        let resolver = GeometryResolver::new(backend, 7, Some(memo.clone()));
        assert!(resolver.warm_geometry().is_none());

        resolver.dispatch();
        resolver.poll().expect("completion").expect("success");

        let warm = resolver.warm_geometry().expect("memo populated");
        assert_eq!(warm.width, 300.0);
    }

    #[test]
    fn failed_fetch_surfaces_the_fault() {
        let backend: Arc<dyn DocumentBackend> = Arc::new(InstantBackend {
            viewport: Viewport {
                width: 0.0,
                height: 0.0,
                rotation: 0,
            },
            fail: true,
        });

        let resolver = GeometryResolver::new(backend, 0, None);
        resolver.dispatch();

        let outcome = resolver.poll().expect("completion pending");
        assert!(outcome.is_err());
    }
}
