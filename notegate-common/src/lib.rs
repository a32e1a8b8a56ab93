//! # Notegate Common Library
//!
//! Shared code for the notegate services including:
//! - Category vocabulary and typed record fields
//! - Capture event types (CaptureEvent enum) and the broadcast bus
//! - Database initialization and row models
//! - Configuration file and data directory resolution
//! - Common error types

pub mod categories;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod records;

pub use categories::{Category, CategoryKind};
pub use error::{Error, Result};
