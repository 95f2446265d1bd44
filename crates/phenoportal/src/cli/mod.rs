//! CLI functionality for the portal tool
//!
//! This module contains all CLI-related functionality including:
//! - Dataset loading and write-back
//! - Option files and flag overrides
//! - Filter, comparison and toggle commands
//! - Output formatting

#[cfg(feature = "cli")]
pub mod compare;
#[cfg(feature = "cli")]
pub mod comparison_filter;
#[cfg(feature = "cli")]
pub mod config;
#[cfg(feature = "cli")]
pub mod dataset;
#[cfg(feature = "cli")]
pub mod filter;
#[cfg(feature = "cli")]
pub mod output;
