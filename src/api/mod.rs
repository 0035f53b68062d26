//! HTTP API handlers for tracktempo

pub mod artists;
pub mod health;

pub use artists::artist_routes;
pub use health::health_routes;
