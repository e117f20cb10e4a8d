//! Error types for interchange operations.

use thiserror::Error;

/// Errors that can occur while reading or writing interchange documents.
#[derive(Debug, Error)]
pub enum InterchangeError {
    /// XML serialization error.
    #[error("XML error: {0}")]
    Xml(String),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// IO error during read/write.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing required element or attribute.
    #[error("Missing required {kind}: {name}")]
    Missing { kind: &'static str, name: String },

    /// Element written before identities were assigned, or a dangling reference.
    #[error("Unresolved reference: {0}")]
    UnresolvedReference(String),

    /// Unsupported operation for a format.
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl InterchangeError {
    /// Create an XML error.
    pub fn xml(message: impl Into<String>) -> Self {
        Self::Xml(message.into())
    }

    /// Create a JSON error.
    pub fn json(message: impl Into<String>) -> Self {
        Self::Json(message.into())
    }

    /// Create a missing identity error.
    pub fn missing_id(name: impl Into<String>) -> Self {
        Self::Missing {
            kind: "identity",
            name: name.into(),
        }
    }

    /// Create an unresolved reference error.
    pub fn unresolved(key: impl Into<String>) -> Self {
        Self::UnresolvedReference(key.into())
    }

    /// Create an unsupported operation error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }
}

impl From<serde_json::Error> for InterchangeError {
    fn from(e: serde_json::Error) -> Self {
        Self::json(e.to_string())
    }
}

impl From<quick_xml::Error> for InterchangeError {
    fn from(e: quick_xml::Error) -> Self {
        Self::xml(e.to_string())
    }
}
