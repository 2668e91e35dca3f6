//! # Enrich Common Library
//!
//! Shared code for the enrichment service binaries including:
//! - Error type and result alias
//! - Configuration loading (TOML bootstrap + defaults)
//! - Database initialization and schema
//! - Clock abstraction and identifier helpers

pub mod config;
pub mod db;
pub mod error;
pub mod time;
pub mod uuid_utils;

pub use error::{Error, Result};
pub use time::{Clock, SystemClock};
