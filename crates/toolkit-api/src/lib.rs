//! Toolkit API Library
//!
//! This crate provides the HTTP handlers, middleware, and application setup for the
//! sticker conversion service.

// Module declarations
mod api_doc;
mod handlers;
mod middleware;
mod telemetry;

// Public modules
pub mod error;
pub mod setup;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpStickerError};
pub use state::AppState;
