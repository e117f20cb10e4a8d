//! # j2x-base
//!
//! Turns the front-end model of a Java project (packages, types, members,
//! annotations) into a UML design model and writes it as XMI.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! project     → PipelineConfig, ModelBuilder, Pipeline
//!   ↓
//! interchange → Model, identities, canonical order, XMI and IR-JSON
//!   ↓
//! semantic    → multiplicity, relationship inference, association merge
//!   ↓
//! hir         → ProjectIndex, ScopeContext, Resolver, diagnostics
//!   ↓
//! syntax      → SourceUnit, TypeReference, AnnotationEvidence, lexer
//!   ↓
//! base        → Location, qualified-name helpers
//! ```

// ============================================================================
// MODULES (dependency order: base → syntax → hir → semantic → interchange → project)
// ============================================================================

/// Foundation types: Location, qualified-name helpers
pub mod base;

/// Front-end input model and type-text parsing
pub mod syntax;

/// Scopes, name resolution, diagnostics
pub mod hir;

/// Multiplicity, relationship inference, association merging
pub mod semantic;

/// Design model, identities, XMI and IR-JSON
pub mod interchange;

/// Configuration and the end-to-end pipeline
pub mod project;

// Re-export the common entry points
pub use hir::{Diagnostic, Severity};
pub use interchange::{IrModel, Model};
pub use project::{ConfigError, Pipeline, PipelineConfig, PipelineOutput};
pub use semantic::RelationshipPolicy;
pub use syntax::SourceUnit;
