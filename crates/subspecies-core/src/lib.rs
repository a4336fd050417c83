//! Core types and utilities for subspecies dataset preparation.
//!
//! This crate provides the error type, the domain types shared by every
//! preprocessing stage, the pipeline configuration and a couple of CLI helpers.

pub mod cli;
pub mod config;
pub mod error;
pub mod types;

pub use cli::*;
pub use config::*;
pub use error::{Error, Result};
pub use types::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::cli::*;
    pub use crate::config::*;
    pub use crate::error::{Error, Result};
    pub use crate::types::*;
}
