//! # Setman Common Library
//!
//! Shared code for the setman catalog crates including:
//! - The closed error taxonomy (`Code`, `Severity`, `Error`)
//! - Settings file loading and root folder resolution
//! - SQLite schema creation and row models
//! - UUID and timestamp helpers

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod time;
pub mod uuid_utils;

pub use error::{Code, Error, Result, Severity};
