//! High-level IR (HIR) — scopes, name resolution and diagnostics.
//!
//! ## Key Types
//!
//! - [`ProjectIndex`] — global registry of every declared type
//! - [`ScopeContext`] — what one source unit can see
//! - [`Resolver`] — ordered rule chain producing a [`ResolvedName`]
//! - [`DiagnosticLog`] — append-only list of non-fatal problems
//!
//! ## Flow
//!
//! ```text
//! units                      ← INPUT: front-end source units
//!     │
//!     ▼
//! ProjectIndex::build        ← registry + nested-type map
//!     │
//!     ▼
//! ScopeContext::for_unit     ← imports, wildcards, package
//!     │
//!     ▼
//! Resolver::resolve_reference ← ResolvedName + diagnostics
//! ```

mod diagnostics;
mod resolve;
mod scope;

pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticLog, Severity, codes};
pub use resolve::{ReferenceResolution, ReferenceSite, ResolveRule, ResolvedName, Resolver};
pub use scope::{ProjectIndex, ScopeContext};
