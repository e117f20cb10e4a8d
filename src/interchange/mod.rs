//! Design-model interchange.
//!
//! The built object graph ([`Model`]), its stable identities and final
//! ordering, and the formats it is written in:
//!
//! - **XMI** - UML2-style XML Model Interchange
//! - **IR-JSON** - the cross-language intermediate representation
//!
//! ```text
//! ModelBuilder ──► Model ──► IdentityAssigner ──► canonicalize ──► ModelFormat
//!                                                                  ├─ Xmi
//!                                                                  └─ IrJson
//! ```
//!
//! Writers receive a finished model: every element carries its id and every
//! collection is already in final order.

pub mod canonical;
mod error;
mod format;
pub mod identity;
pub mod ir;
pub mod model;
mod xmi;

pub use canonical::canonicalize;
pub use error::InterchangeError;
pub use format::{FormatCapability, IrJson, ModelFormat};
pub use identity::{IdentityAssigner, IdentityConfig, PathStep, digest_hex, sanitize_id};
pub use ir::{IrBridge, IrModel};
pub use model::{
    AnnotationApplication, Bounds, Element, ElementId, ElementKind, ElementRef, Model,
    PropertyValue, Visibility, props,
};
pub use xmi::{Xmi, XmiWriter};

/// Supported file extensions for interchange formats.
pub fn supported_extensions() -> &'static [&'static str] {
    &["xmi", "uml", "json"]
}

/// Detect format from file extension.
pub fn detect_format(path: &std::path::Path) -> Option<Box<dyn ModelFormat>> {
    let ext = path.extension()?.to_str()?;
    match ext.to_lowercase().as_str() {
        "xmi" | "uml" => Some(Box::new(Xmi)),
        "json" => Some(Box::new(IrJson)),
        _ => None,
    }
}
