//! Common trait for model interchange formats.

use super::InterchangeError;
use super::ir::{self, IrModel};
use super::model::Model;

/// Capabilities supported by a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatCapability {
    /// Can read/import models.
    pub read: bool,
    /// Can write/export models.
    pub write: bool,
    /// Preserves all model information.
    pub lossless: bool,
}

impl FormatCapability {
    /// Read and write.
    pub const FULL: Self = Self {
        read: true,
        write: true,
        lossless: false,
    };

    /// Write-only capability.
    pub const WRITE_ONLY: Self = Self {
        read: false,
        write: true,
        lossless: true,
    };
}

/// Trait for model interchange formats.
///
/// Formats operate on the identity-assigned, canonically ordered [`Model`];
/// writers must not reorder or re-hash.
pub trait ModelFormat: Send + Sync {
    /// Human-readable name of the format.
    fn name(&self) -> &'static str;

    /// File extension(s) for this format.
    fn extensions(&self) -> &'static [&'static str];

    /// MIME type for this format.
    fn mime_type(&self) -> &'static str;

    /// Capabilities of this format implementation.
    fn capabilities(&self) -> FormatCapability;

    /// Read a model from bytes.
    fn read(&self, input: &[u8]) -> Result<Model, InterchangeError>;

    /// Write a model to bytes.
    fn write(&self, model: &Model) -> Result<Vec<u8>, InterchangeError>;

    /// Quick well-formedness check that doesn't fully parse the content.
    fn validate(&self, input: &[u8]) -> Result<(), InterchangeError> {
        let _ = input;
        Ok(())
    }
}

/// IR JSON documents.
///
/// Writing exports the model's packages, classifiers and relations. Reading
/// returns a model that holds the IR classifiers only as unresolved source;
/// use [`crate::project::Pipeline::run_ir`] to build a full model from IR.
#[derive(Debug, Clone, Copy, Default)]
pub struct IrJson;

impl ModelFormat for IrJson {
    fn name(&self) -> &'static str {
        "IR-JSON"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn mime_type(&self) -> &'static str {
        "application/json"
    }

    fn capabilities(&self) -> FormatCapability {
        FormatCapability::WRITE_ONLY
    }

    fn read(&self, _input: &[u8]) -> Result<Model, InterchangeError> {
        Err(InterchangeError::unsupported(
            "IR documents are built into models by the pipeline",
        ))
    }

    fn write(&self, model: &Model) -> Result<Vec<u8>, InterchangeError> {
        Ok(ir::from_model(model).to_json()?.into_bytes())
    }

    fn validate(&self, input: &[u8]) -> Result<(), InterchangeError> {
        IrModel::from_json(input).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ir_json_metadata() {
        assert_eq!(IrJson.name(), "IR-JSON");
        assert!(IrJson.capabilities().write);
        assert!(IrJson.read(b"{}").is_err());
    }

    #[test]
    fn test_ir_json_validate() {
        assert!(IrJson.validate(br#"{"classifiers": [], "relations": []}"#).is_ok());
        assert!(IrJson.validate(b"not json").is_err());
    }
}
