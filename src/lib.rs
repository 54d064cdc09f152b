pub mod auth;
pub mod config;
pub mod error;
pub mod feedback;
pub mod listings;
pub mod map;
pub mod telemetry;
pub mod wizard;
