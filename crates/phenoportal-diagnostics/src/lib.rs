//! Phenoportal diagnostics and error handling
//!
//! This crate provides the error taxonomy shared by the filter query engine
//! and its store abstractions, including structured error codes and
//! diagnostic rendering.

mod error;
mod error_code;

pub use error::*;
pub use error_code::*;

/// Result type for phenoportal operations
pub type Result<T> = std::result::Result<T, PortalError>;
