use super::SongCatalog;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

/// Process-wide catalog slot for the outermost service boundary.
///
/// Readers take a cloned `Arc` and keep using it for the whole request;
/// a refresh swaps in a new instance without touching the old one.
#[derive(Debug)]
pub struct CatalogHolder {
    current: RwLock<Arc<SongCatalog>>,
}

impl CatalogHolder {
    pub fn new(catalog: SongCatalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    /// Snapshot of the catalog in effect right now
    pub fn current(&self) -> Arc<SongCatalog> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Replace the catalog, returning the previous instance
    pub fn replace(&self, catalog: SongCatalog) -> Arc<SongCatalog> {
        let next = Arc::new(catalog);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        info!(
            "Swapping song catalog: {} -> {} songs",
            guard.len(),
            next.len()
        );
        std::mem::replace(&mut *guard, next)
    }
}
