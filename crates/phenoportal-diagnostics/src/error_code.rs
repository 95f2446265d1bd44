//! Phenoportal error codes following a structured numbering system
//!
//! Error code ranges:
//! - PP0001-PP0099: Argument errors (malformed input, rejected before any query)
//! - PP0100-PP0199: Resource errors (identifiers that do not resolve)
//! - PP0200-PP0299: Upstream errors (store and aggregation failures)
//! - PP0300-PP0399: Configuration errors

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric code
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    /// Check if this is an argument error (0001-0099)
    pub const fn is_argument_error(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    /// Check if this is a resource error (0100-0199)
    pub const fn is_resource_error(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    /// Check if this is an upstream error (0200-0299)
    pub const fn is_upstream_error(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Check if this is a configuration error (0300-0399)
    pub const fn is_config_error(&self) -> bool {
        self.0 >= 300 && self.0 < 400
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PP{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Argument errors (0001-0099)
    map.insert(1, ErrorInfo::new("Missing required identifier"));
    map.insert(2, ErrorInfo::new("Invalid pagination")
        .with_help("Page size must be at least 1; page numbers start at 1"));
    map.insert(3, ErrorInfo::new("Invalid bucket boundaries")
        .with_help("Boundaries must be strictly ascending"));

    // Resource errors (0100-0199)
    map.insert(100, ErrorInfo::new("Field not found"));
    map.insert(101, ErrorInfo::new("Workgroup patient not found"));

    // Upstream errors (0200-0299)
    map.insert(200, ErrorInfo::new("Store operation failed"));

    // Configuration errors (0300-0399)
    map.insert(300, ErrorInfo::new("Invalid configuration"));

    map
});

// Argument errors
pub const PP0001: ErrorCode = ErrorCode::new(1);
pub const PP0002: ErrorCode = ErrorCode::new(2);
pub const PP0003: ErrorCode = ErrorCode::new(3);

// Resource errors
pub const PP0100: ErrorCode = ErrorCode::new(100);
pub const PP0101: ErrorCode = ErrorCode::new(101);

// Upstream errors
pub const PP0200: ErrorCode = ErrorCode::new(200);

// Configuration errors
pub const PP0300: ErrorCode = ErrorCode::new(300);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(PP0001.to_string(), "PP0001");
        assert_eq!(PP0100.to_string(), "PP0100");
    }

    #[test]
    fn test_error_categories() {
        assert!(PP0001.is_argument_error());
        assert!(!PP0001.is_resource_error());

        assert!(PP0101.is_resource_error());
        assert!(PP0200.is_upstream_error());
        assert!(PP0300.is_config_error());
    }

    #[test]
    fn test_error_info() {
        assert_eq!(PP0100.info().description, "Field not found");
        assert!(PP0002.info().help.is_some());
        assert_eq!(ErrorCode::new(999).info().description, "Unknown error");
    }
}
