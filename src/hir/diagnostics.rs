//! Diagnostics — non-fatal problems found while resolving a model.
//!
//! Nothing in resolution, inference or merging aborts a run. Problems become
//! [`Diagnostic`] values appended to a [`DiagnosticLog`]; a caller decides after
//! the fact whether any of them should fail the build.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::base::Location;

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Hint => "hint",
        }
    }
}

/// What went wrong.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagnosticKind {
    /// A referenced type could not be qualified at all.
    UnresolvedReference,
    /// A referenced type was guessed to live outside the input set.
    ExternalStub,
    /// More than one member claims to be the inverse of the same field.
    AmbiguousInverse,
    /// An annotation literal could not be read; the value was ignored.
    MalformedAnnotation,
}

impl DiagnosticKind {
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticKind::UnresolvedReference => codes::UNRESOLVED_REFERENCE,
            DiagnosticKind::ExternalStub => codes::EXTERNAL_STUB,
            DiagnosticKind::AmbiguousInverse => codes::AMBIGUOUS_INVERSE,
            DiagnosticKind::MalformedAnnotation => codes::MALFORMED_ANNOTATION,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::UnresolvedReference => Severity::Error,
            DiagnosticKind::ExternalStub => Severity::Info,
            DiagnosticKind::AmbiguousInverse => Severity::Warning,
            DiagnosticKind::MalformedAnnotation => Severity::Warning,
        }
    }
}

/// A diagnostic keyed by (referenced name, referencing owner, context).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub code: &'static str,
    /// The name that was referenced (or the annotation / field involved).
    pub referenced_name: Arc<str>,
    /// Qualified name of the type holding the reference.
    pub owner: Arc<str>,
    pub message: Arc<str>,
    /// Human-readable place, e.g. `field orders` or `extends`.
    pub context: Arc<str>,
    pub location: Option<Location>,
}

impl Diagnostic {
    fn new(
        kind: DiagnosticKind,
        referenced_name: impl Into<Arc<str>>,
        owner: impl Into<Arc<str>>,
        message: impl Into<Arc<str>>,
        context: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            code: kind.code(),
            referenced_name: referenced_name.into(),
            owner: owner.into(),
            message: message.into(),
            context: context.into(),
            location: None,
        }
    }

    /// A reference that could not be qualified.
    pub fn unresolved(name: &str, owner: &str, context: &str) -> Self {
        Self::new(
            DiagnosticKind::UnresolvedReference,
            name,
            owner,
            format!("cannot resolve type '{name}'"),
            context,
        )
    }

    /// A reference guessed to be external, with its best-guess qualified form.
    pub fn external_stub(name: &str, guess: &str, owner: &str, context: &str) -> Self {
        Self::new(
            DiagnosticKind::ExternalStub,
            name,
            owner,
            format!("'{name}' treated as external type '{guess}'"),
            context,
        )
    }

    /// Several members claim to be the inverse of `field`.
    pub fn ambiguous_inverse(field: &str, owner: &str, claimants: &[String]) -> Self {
        Self::new(
            DiagnosticKind::AmbiguousInverse,
            field,
            owner,
            format!(
                "field '{field}' is claimed as inverse by {}; left unmerged",
                claimants.join(", ")
            ),
            format!("field {field}"),
        )
    }

    /// An annotation literal that could not be read.
    pub fn malformed_annotation(
        annotation: &str,
        member: &str,
        raw: &str,
        owner: &str,
        context: &str,
    ) -> Self {
        Self::new(
            DiagnosticKind::MalformedAnnotation,
            annotation,
            owner,
            format!("ignoring malformed value '{raw}' for @{annotation}.{member}"),
            context,
        )
    }

    /// Attach a source location.
    pub fn with_location(mut self, location: Option<Location>) -> Self {
        self.location = location;
        self
    }

    /// Canonical ordering key: code, referenced name, message, owner, context.
    pub fn sort_key(&self) -> (&str, &str, &str, &str, &str) {
        (
            self.code,
            &self.referenced_name,
            &self.message,
            &self.owner,
            &self.context,
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {} ({} in {})",
            self.severity.as_str(),
            self.code,
            self.message,
            self.context,
            self.owner
        )?;
        if let Some(location) = &self.location {
            write!(f, " at {location}")?;
        }
        Ok(())
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Standard diagnostic codes.
///
/// - **E0001-E0099**: reference problems
/// - **W0001-W0099**: inference warnings
/// - **I0001-I0099**: informational
pub mod codes {
    /// Type reference could not be qualified.
    pub const UNRESOLVED_REFERENCE: &str = "E0001";
    /// Type reference guessed to be external.
    pub const EXTERNAL_STUB: &str = "I0001";
    /// Multiple inverse claims on one field.
    pub const AMBIGUOUS_INVERSE: &str = "W0001";
    /// Unreadable annotation literal.
    pub const MALFORMED_ANNOTATION: &str = "W0002";
}

// ============================================================================
// DIAGNOSTIC LOG
// ============================================================================

/// Append-only diagnostic list with a single writer per stage.
///
/// Identical entries (same kind, name, owner and context) are recorded once.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticLog {
    entries: Vec<Diagnostic>,
    seen: HashSet<(DiagnosticKind, Arc<str>, Arc<str>, Arc<str>)>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a diagnostic. Returns false if an identical entry already exists.
    pub fn push(&mut self, diagnostic: Diagnostic) -> bool {
        let key = (
            diagnostic.kind,
            diagnostic.referenced_name.clone(),
            diagnostic.owner.clone(),
            diagnostic.context.clone(),
        );
        if !self.seen.insert(key) {
            return false;
        }
        self.entries.push(diagnostic);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    /// Entries sorted by (code, referenced name, message, owner, context).
    pub fn sorted(&self) -> Vec<Diagnostic> {
        let mut out = self.entries.clone();
        out.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        out
    }

    pub fn into_sorted(self) -> Vec<Diagnostic> {
        let mut out = self.entries;
        out.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        out
    }
}
