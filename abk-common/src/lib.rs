//! # Audiobook Player Common Library
//!
//! Shared code for the audiobook player crates:
//! - Track catalog and manifest loading
//! - Bootstrap configuration loading and resolution
//! - Clock-time formatting for display
//! - Common error type

pub mod catalog;
pub mod config;
pub mod error;
pub mod human_time;

pub use catalog::{CatalogManifest, MediaHint, Track, TrackCatalog};
pub use error::{Error, Result};
