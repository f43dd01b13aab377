//! # trekdb common library
//!
//! Shared code for the trekdb harvester and API:
//! - Record models (characters, series, episodes, page envelopes)
//! - Query filters used by the list endpoints
//! - Bootstrap configuration loading and root folder resolution
//! - Atomic file writes used by every on-disk cache

pub mod atomic;
pub mod config;
pub mod error;
pub mod models;
pub mod text;

pub use error::{Error, Result};
