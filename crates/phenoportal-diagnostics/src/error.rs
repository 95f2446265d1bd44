//! Phenoportal error types

use crate::{ErrorCode, PP0001, PP0100, PP0101, PP0200, PP0300};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Error - the operation failed
    Error,
    /// Warning - the operation completed with a degraded result
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message suitable for reporting to an operator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level
    pub severity: Severity,
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional context or help
    pub help: Option<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            help: None,
        }
    }

    /// Create a new warning diagnostic
    pub fn warning(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            help: None,
        }
    }

    /// Set help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Render the diagnostic with terminal colors
    #[cfg(feature = "colored")]
    pub fn render_colored(&self) -> String {
        use colored::Colorize;

        let head = match self.severity {
            Severity::Error => format!("{}[{}]", self.severity, self.code).red().bold(),
            Severity::Warning => format!("{}[{}]", self.severity, self.code).yellow().bold(),
        };
        let mut out = format!("{}: {}", head, self.message);
        if let Some(help) = &self.help {
            out.push_str(&format!("\n  {} {}", "help:".cyan(), help));
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {}", self.severity, self.code, self.message)?;
        if let Some(help) = &self.help {
            write!(f, " ({})", help)?;
        }
        Ok(())
    }
}

/// Main phenoportal error type
#[derive(Debug, Clone, Error)]
pub enum PortalError {
    /// An identifier did not resolve to a stored record
    #[error("{code}: {resource} not found: {id}")]
    ResourceNotFound {
        code: ErrorCode,
        resource: String,
        id: String,
    },

    /// Malformed input rejected before any query runs
    #[error("{code}: {message}")]
    IllegalArgument { code: ErrorCode, message: String },

    /// A store or aggregation call failed
    #[error("{code}: {message}")]
    Upstream { code: ErrorCode, message: String },

    /// Invalid engine configuration
    #[error("{code}: {message}")]
    Config { code: ErrorCode, message: String },
}

impl PortalError {
    /// Create a resource-not-found error
    pub fn not_found(code: ErrorCode, resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            code,
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Field id that does not resolve
    pub fn field_not_found(id: impl Into<String>) -> Self {
        Self::not_found(PP0100, "field", id)
    }

    /// Workgroup-patient id that does not resolve
    pub fn workgroup_patient_not_found(id: impl Into<String>) -> Self {
        Self::not_found(PP0101, "workgroup patient", id)
    }

    /// Create an illegal-argument error
    pub fn illegal_argument(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::IllegalArgument {
            code,
            message: message.into(),
        }
    }

    /// A required identifier was empty
    pub fn missing_identifier(name: &str) -> Self {
        Self::illegal_argument(PP0001, format!("missing required identifier: {}", name))
    }

    /// Create an upstream error
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            code: PP0200,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            code: PP0300,
            message: message.into(),
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ResourceNotFound { code, .. } => *code,
            Self::IllegalArgument { code, .. } => *code,
            Self::Upstream { code, .. } => *code,
            Self::Config { code, .. } => *code,
        }
    }

    /// Whether this error means an identifier did not resolve
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ResourceNotFound { .. })
    }

    /// Convert to a diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = match self {
            Self::ResourceNotFound { code, resource, id } => {
                Diagnostic::error(*code, format!("{} not found: {}", resource, id))
            }
            Self::IllegalArgument { code, message }
            | Self::Upstream { code, message }
            | Self::Config { code, message } => Diagnostic::error(*code, message.clone()),
        };
        match self.code().info().help {
            Some(help) => diag.with_help(help),
            None => diag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PP0002;

    #[test]
    fn test_not_found_display() {
        let err = PortalError::field_not_found("31");
        assert_eq!(err.to_string(), "PP0100: field not found: 31");
        assert!(err.is_not_found());
        assert_eq!(err.code(), PP0100);
    }

    #[test]
    fn test_diagnostic_carries_help() {
        let diag = PortalError::illegal_argument(PP0002, "page size must be positive").to_diagnostic();

        assert_eq!(diag.severity, Severity::Error);
        assert!(diag.to_string().contains("PP0002"));
        assert!(diag.help.is_some());
    }

    #[test]
    fn test_upstream_code() {
        let err = PortalError::upstream("connection reset");
        assert!(err.code().is_upstream_error());
        assert!(!err.is_not_found());
    }
}
