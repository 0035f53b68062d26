//! Synchronization pipeline services

pub mod catalog;
pub mod merger;
pub mod normalizer;
pub mod orchestrator;
pub mod spotify;

pub use catalog::{CatalogClient, CatalogError};
pub use orchestrator::{FeatureSync, SyncError, SyncOrchestrator};
pub use spotify::{SpotifyClient, SpotifyCredentials};
