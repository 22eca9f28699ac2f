//! Karaoke song and singer recommendation for a group.
//!
//! The catalog is loaded once and shared read-only; each request resolves
//! target attributes from the group, walks a filter fallback chain to pick a
//! song, and assigns singers. All randomness comes from an RNG the caller
//! controls, so results are reproducible under a fixed seed.

pub mod catalog;
pub mod error;
pub mod models;
pub mod recommend;


pub use catalog::{CatalogHolder, SongCatalog};
pub use error::{ErrorResponse, KaraokeError, Result};
pub use recommend::{EngineConfig, RecommendationEngine};
