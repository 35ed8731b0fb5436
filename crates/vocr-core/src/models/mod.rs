//! Data models shared by the pipeline and its callers.

pub mod config;
pub mod record;

pub use config::VocrConfig;
pub use record::{BatchStats, ImageOrigin, Record, ResultSet, ERROR_MARKER, NOT_FOUND};
