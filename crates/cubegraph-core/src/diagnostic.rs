//! Diagnostic codes and error reporting
//!
//! IMPORTANT: Diagnostic codes are versioned and stable.
//! NEVER rename or remove codes - they are part of the public API.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};

/// Diagnostic code registry (v1)
///
/// These codes are STABLE and VERSIONED.
/// Do NOT rename or remove codes - only add new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    // SQL lineage extraction (1xxx)
    /// A cube's SQL could not be parsed; its lineage was skipped
    SqlParseError,

    /// A cube's SQL parsed, but is not a single query statement
    SqlUnsupportedStatement,

    /// Lineage extraction stopped at the configured depth limit
    SqlDepthExceeded,

    // Graph construction (2xxx)
    /// Two components resolved to the same custom id; the later one was dropped
    GraphDuplicateComponent,

    // Metadata model (3xxx)
    /// A cube definition is missing required content
    ModelInvalidCube,

    /// A join edge names a cube that is not in the model
    ModelDanglingJoin,

    // General warnings (9xxx)
    /// General informational message
    Info,

    /// General warning message
    Warning,
}

impl DiagnosticCode {
    /// Get the diagnostic code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SqlParseError => "SQL_PARSE_ERROR",
            Self::SqlUnsupportedStatement => "SQL_UNSUPPORTED_STATEMENT",
            Self::SqlDepthExceeded => "SQL_DEPTH_EXCEEDED",
            Self::GraphDuplicateComponent => "GRAPH_DUPLICATE_COMPONENT",
            Self::ModelInvalidCube => "MODEL_INVALID_CUBE",
            Self::ModelDanglingJoin => "MODEL_DANGLING_JOIN",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,

    /// Warning - the graph was built, but part of it is missing
    Warn,

    /// Error - the input is not usable as-is
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A diagnostic message with structured metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable diagnostic code
    pub code: DiagnosticCode,

    /// Severity level
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// What the diagnostic is about (cube key, join edge key or component id)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// Offending input text, e.g. the SQL that failed to parse
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with minimal fields
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            subject: None,
            source_text: None,
        }
    }

    /// Set the subject
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Attach the offending input text
    pub fn with_source_text(mut self, text: impl Into<String>) -> Self {
        self.source_text = Some(text.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_code_stability() {
        assert_eq!(DiagnosticCode::SqlParseError.as_str(), "SQL_PARSE_ERROR");
        assert_eq!(DiagnosticCode::GraphDuplicateComponent.as_str(), "GRAPH_DUPLICATE_COMPONENT");
        assert_eq!(DiagnosticCode::ModelDanglingJoin.to_string(), "MODEL_DANGLING_JOIN");
    }

    #[test]
    fn diagnostic_serialization() {
        let diag = Diagnostic::new(
            DiagnosticCode::SqlParseError,
            Severity::Warn,
            "Failed to parse SQL for cube 'orders'",
        )
        .with_subject("orders")
        .with_source_text("SELECT FROM WHERE");

        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("SQL_PARSE_ERROR"));
        assert!(json.contains("\"warn\""));
        assert!(json.contains("\"subject\":\"orders\""));
    }

    #[test]
    fn optional_fields_are_omitted() {
        let diag = Diagnostic::new(DiagnosticCode::Info, Severity::Info, "ok");
        let json = serde_json::to_string(&diag).unwrap();
        assert!(!json.contains("subject"));
        assert!(!json.contains("source_text"));
    }
}
