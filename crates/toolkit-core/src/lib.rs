//! Toolkit Core Library
//!
//! This crate provides the domain models, conversion limits, error types, and
//! configuration shared by the processing pipeline and the HTTP server.

pub mod config;
pub mod error;
pub mod models;
pub mod policy;

// Re-export commonly used types
pub use config::{Config, LogFormat};
pub use error::{ErrorMetadata, LogLevel, StickerError, GENERIC_FAILURE_MESSAGE};
pub use models::{MediaKind, StickerArtifact};
pub use policy::{PolicyLimits, VideoOverflow};
