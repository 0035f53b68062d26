//! Data models for tracktempo

pub mod track;

pub use track::{TrackRecord, FEATURE_COMPLETE_MARKER};
