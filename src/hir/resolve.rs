//! Name resolution — qualifying type references without a compiler front end.
//!
//! Resolution is an ordered rule chain; the first rule that matches wins:
//!
//! 1. dotted names: resolve the head as a simple name (rules 2–6), then walk the
//!    nested-type map, accepting a composed path found verbatim in the registry
//! 2. exact match in the global registry
//! 3. lexical chain, innermost enclosing type first
//! 4. explicit import
//! 5. wildcard imports, in declaration order
//! 6. same package
//! 7. primitives and built-in value types
//! 8. external guess (explicit import, non-project wildcard, `java.lang`)
//! 9. unknown
//!
//! Every rule is a separate function so it can be tested on its own. Resolution
//! never fails; stub and unknown outcomes are appended to a [`DiagnosticLog`] by
//! [`Resolver::resolve_reference`].

use std::fmt;
use std::sync::Arc;

use super::diagnostics::{Diagnostic, DiagnosticLog};
use super::scope::ScopeContext;
use crate::base::{Location, join_qualified};
use crate::syntax::{TypeReference, is_primitive};

/// Value types every Java unit can name without an import.
const BUILT_IN_VALUE_TYPES: &[&str] = &[
    "String",
    "Object",
    "Boolean",
    "Byte",
    "Short",
    "Integer",
    "Long",
    "Float",
    "Double",
    "Character",
    "Void",
];

/// Remaining implicitly imported `java.lang` types, guessed as external.
const JAVA_LANG_IMPLICIT: &[&str] = &[
    "Class",
    "Throwable",
    "Exception",
    "RuntimeException",
    "Error",
    "Number",
    "Enum",
    "Record",
    "Iterable",
    "Comparable",
    "CharSequence",
    "Runnable",
    "Thread",
    "StringBuilder",
    "Math",
    "Cloneable",
    "AutoCloseable",
];

// ============================================================================
// RESULTS
// ============================================================================

/// Outcome of resolving one name. Exactly one variant holds per attempt.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResolvedName {
    /// A project type or a built-in with a canonical form.
    Qualified(Arc<str>),
    /// Guessed to belong to a dependency outside the input set.
    ExternalStub(Arc<str>),
    /// Could not be qualified; carries the original text.
    Unknown(Arc<str>),
}

impl ResolvedName {
    /// The qualified or guessed name, or the original text for `Unknown`.
    pub fn name(&self) -> &str {
        match self {
            ResolvedName::Qualified(n) | ResolvedName::ExternalStub(n) | ResolvedName::Unknown(n) => n,
        }
    }

    /// The qualified name for `Qualified` results only.
    pub fn qualified(&self) -> Option<&Arc<str>> {
        match self {
            ResolvedName::Qualified(n) => Some(n),
            _ => None,
        }
    }

    pub fn is_qualified(&self) -> bool {
        matches!(self, ResolvedName::Qualified(_))
    }

    pub fn is_external(&self) -> bool {
        matches!(self, ResolvedName::ExternalStub(_))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ResolvedName::Unknown(_))
    }
}

impl fmt::Display for ResolvedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedName::Qualified(n) => write!(f, "{n}"),
            ResolvedName::ExternalStub(n) => write!(f, "external {n}"),
            ResolvedName::Unknown(n) => write!(f, "unknown {n}"),
        }
    }
}

/// The rule that produced a resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResolveRule {
    DottedWalk,
    Registry,
    LexicalChain,
    ExplicitImport,
    Wildcard,
    SamePackage,
    BuiltIn,
    ExternalGuess,
    Unknown,
}

impl ResolveRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolveRule::DottedWalk => "dotted",
            ResolveRule::Registry => "registry",
            ResolveRule::LexicalChain => "lexical",
            ResolveRule::ExplicitImport => "import",
            ResolveRule::Wildcard => "wildcard",
            ResolveRule::SamePackage => "package",
            ResolveRule::BuiltIn => "builtin",
            ResolveRule::ExternalGuess => "external",
            ResolveRule::Unknown => "unknown",
        }
    }
}

/// Resolution of a whole type reference: the primary name plus every other
/// base name embedded in generic arguments, array elements or bounds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceResolution {
    pub reference: TypeReference,
    /// `None` when the reference has no nameable type (type variable, `?`).
    pub primary: Option<ResolvedName>,
    /// Base name as written → resolution, in first-seen order.
    pub embedded: Vec<(Arc<str>, ResolvedName)>,
}

impl ReferenceResolution {
    /// Resolution of a base name as written, primary included.
    pub fn lookup(&self, written: &str) -> Option<&ResolvedName> {
        if self.reference.primary_name() == Some(written) {
            return self.primary.as_ref();
        }
        self.embedded
            .iter()
            .find(|(name, _)| &**name == written)
            .map(|(_, r)| r)
    }
}

/// Where a reference occurs, for diagnostics.
#[derive(Clone, Copy, Debug)]
pub struct ReferenceSite<'s> {
    /// Qualified name of the referencing type.
    pub owner: &'s str,
    /// Human-readable place, e.g. `field orders`.
    pub context: &'s str,
    pub location: Option<&'s Location>,
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Resolves names against one unit's scope and an enclosing-type chain.
pub struct Resolver<'a> {
    scope: &'a ScopeContext<'a>,
    /// Enclosing types, outermost first; the innermost is the current type.
    chain: &'a [Arc<str>],
}

impl<'a> Resolver<'a> {
    pub fn new(scope: &'a ScopeContext<'a>) -> Self {
        Self { scope, chain: &[] }
    }

    /// Set the lexical chain (outermost first).
    pub fn with_chain(mut self, chain: &'a [Arc<str>]) -> Self {
        self.chain = chain;
        self
    }

    /// Resolve a single simple or dotted name.
    pub fn resolve(&self, name: &str) -> ResolvedName {
        self.resolve_with_rule(name).0
    }

    /// Resolve a name and report which rule matched.
    pub fn resolve_with_rule(&self, name: &str) -> (ResolvedName, ResolveRule) {
        let name = name.trim();
        let (resolved, rule) = self.run_chain(name);
        tracing::trace!("[RESOLVE] name={} rule={} -> {}", name, rule.as_str(), resolved);
        (resolved, rule)
    }

    fn run_chain(&self, name: &str) -> (ResolvedName, ResolveRule) {
        if name.is_empty() {
            return (ResolvedName::Unknown(Arc::from(name)), ResolveRule::Unknown);
        }
        if name.contains('.') {
            if let Some(q) = self.by_dotted_walk(name) {
                return (ResolvedName::Qualified(q), ResolveRule::DottedWalk);
            }
        }
        if let Some((q, rule)) = self.resolve_in_scope(name) {
            return (ResolvedName::Qualified(q), rule);
        }
        if let Some(canonical) = Self::by_built_in(name) {
            return (ResolvedName::Qualified(canonical), ResolveRule::BuiltIn);
        }
        if let Some(guess) = self.guess_external(name) {
            return (ResolvedName::ExternalStub(guess), ResolveRule::ExternalGuess);
        }
        (ResolvedName::Unknown(Arc::from(name)), ResolveRule::Unknown)
    }

    /// Rules 2–6, in order.
    fn resolve_in_scope(&self, name: &str) -> Option<(Arc<str>, ResolveRule)> {
        if let Some(q) = self.by_registry(name) {
            return Some((q, ResolveRule::Registry));
        }
        if name.contains('.') {
            return None;
        }
        if let Some(q) = self.by_lexical_chain(name) {
            return Some((q, ResolveRule::LexicalChain));
        }
        if let Some(q) = self.by_explicit_import(name) {
            return Some((q, ResolveRule::ExplicitImport));
        }
        if let Some(q) = self.by_wildcard(name) {
            return Some((q, ResolveRule::Wildcard));
        }
        if let Some(q) = self.by_same_package(name) {
            return Some((q, ResolveRule::SamePackage));
        }
        None
    }

    /// Rule 1: `Outer.Inner` style names.
    pub fn by_dotted_walk(&self, name: &str) -> Option<Arc<str>> {
        let mut segments = name.split('.');
        let head = segments.next()?;
        let (mut owner, _) = self.resolve_in_scope(head)?;
        let rest: Vec<&str> = segments.collect();
        for (i, segment) in rest.iter().enumerate() {
            match self.scope.index().nested_of(&owner, segment) {
                Some(nested) => owner = nested.clone(),
                None => {
                    let composed = format!("{owner}.{}", rest[i..].join("."));
                    return self.scope.index().get(&composed).cloned();
                }
            }
        }
        Some(owner)
    }

    /// Rule 2: the name as written is a known qualified name.
    pub fn by_registry(&self, name: &str) -> Option<Arc<str>> {
        self.scope.index().get(name).cloned()
    }

    /// Rule 3: nested types of enclosing types, innermost first.
    pub fn by_lexical_chain(&self, name: &str) -> Option<Arc<str>> {
        self.chain
            .iter()
            .rev()
            .find_map(|outer| self.scope.index().nested_of(outer, name).cloned())
    }

    /// Rule 4: single-type import of a project type.
    pub fn by_explicit_import(&self, name: &str) -> Option<Arc<str>> {
        self.scope
            .explicit_import(name)
            .and_then(|q| self.scope.index().get(q).cloned())
    }

    /// Rule 5: first wildcard prefix (declaration order) exposing the name.
    pub fn by_wildcard(&self, name: &str) -> Option<Arc<str>> {
        self.scope.wildcards().iter().find_map(|prefix| {
            let candidate = join_qualified(prefix, name);
            self.scope.index().get(&candidate).cloned()
        })
    }

    /// Rule 6: a sibling in the current package.
    pub fn by_same_package(&self, name: &str) -> Option<Arc<str>> {
        let candidate = join_qualified(self.scope.package(), name);
        self.scope.index().get(&candidate).cloned()
    }

    /// Rule 7: primitives keep their keyword; built-in value types live in `java.lang`.
    pub fn by_built_in(name: &str) -> Option<Arc<str>> {
        if is_primitive(name) {
            return Some(Arc::from(name));
        }
        let simple = name.strip_prefix("java.lang.").unwrap_or(name);
        BUILT_IN_VALUE_TYPES
            .contains(&simple)
            .then(|| Arc::from(format!("java.lang.{simple}")))
    }

    /// Rule 8: guess a qualification outside the input set.
    pub fn guess_external(&self, name: &str) -> Option<Arc<str>> {
        if let Some((head, tail)) = name.split_once('.') {
            // Fully qualified: package segments start lowercase by convention.
            if head.chars().next().is_some_and(|c| c.is_lowercase()) {
                return Some(Arc::from(name));
            }
            return self
                .guess_external(head)
                .map(|q| Arc::from(format!("{q}.{tail}")));
        }
        if let Some(q) = self.scope.explicit_import(name) {
            return Some(q.clone());
        }
        let index = self.scope.index();
        if let Some(prefix) = self
            .scope
            .wildcards()
            .iter()
            .find(|p| !index.is_project_package(p))
        {
            return Some(Arc::from(join_qualified(prefix, name)));
        }
        if JAVA_LANG_IMPLICIT.contains(&name) && !index.claims_simple_name(name) {
            return Some(Arc::from(format!("java.lang.{name}")));
        }
        None
    }

    /// Resolve a parsed reference: the primary name plus every embedded base
    /// name. Stub and unknown outcomes are appended to `log`.
    pub fn resolve_reference(
        &self,
        reference: &TypeReference,
        site: ReferenceSite<'_>,
        log: &mut DiagnosticLog,
    ) -> ReferenceResolution {
        let primary_name = reference.primary_name();
        let primary = primary_name.map(|name| {
            let resolved = self.resolve(name);
            record(&resolved, name, site, log);
            resolved
        });

        let embedded = reference
            .base_names()
            .into_iter()
            .filter(|name| Some(*name) != primary_name)
            .map(|name| {
                let resolved = self.resolve(name);
                record(&resolved, name, site, log);
                (Arc::from(name), resolved)
            })
            .collect();

        ReferenceResolution {
            reference: reference.clone(),
            primary,
            embedded,
        }
    }
}

fn record(resolved: &ResolvedName, written: &str, site: ReferenceSite<'_>, log: &mut DiagnosticLog) {
    let diagnostic = match resolved {
        ResolvedName::Qualified(_) => return,
        ResolvedName::ExternalStub(guess) => {
            Diagnostic::external_stub(written, guess, site.owner, site.context)
        }
        ResolvedName::Unknown(_) => Diagnostic::unresolved(written, site.owner, site.context),
    };
    log.push(diagnostic.with_location(site.location.cloned()));
}
