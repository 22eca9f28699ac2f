pub mod config;
pub mod engine;
pub mod metadata;
pub mod resolver;
pub mod scoring;
pub mod selector;
pub mod singers;

#[cfg(test)]
mod engine_tests;

pub use config::*;
pub use engine::*;
pub use metadata::*;
