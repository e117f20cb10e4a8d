//! Scope index — what names exist and what each unit can see.
//!
//! [`ProjectIndex`] is built once per invocation from every input unit: the
//! global registry of qualified type names, the nested-type map, and the set of
//! project packages. [`ScopeContext`] is the per-unit view on top of it (package,
//! explicit imports, wildcard prefixes in declaration order). Both are immutable
//! once built.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use crate::base::simple_name;
use crate::syntax::{SourceUnit, TypeKind};

// ============================================================================
// PROJECT INDEX
// ============================================================================

/// Global registry of every type declared across the input set.
#[derive(Clone, Debug, Default)]
pub struct ProjectIndex {
    /// All known qualified names.
    registry: BTreeSet<Arc<str>>,
    /// Outer qualified name → (nested simple name → nested qualified name).
    nested: HashMap<Arc<str>, BTreeMap<Arc<str>, Arc<str>>>,
    /// Packages that contain at least one project type.
    packages: BTreeSet<Arc<str>>,
    /// Simple name → qualified names declaring it.
    by_simple: HashMap<Arc<str>, Vec<Arc<str>>>,
    kinds: HashMap<Arc<str>, TypeKind>,
}

impl ProjectIndex {
    /// Index every type (nested types included) of every unit.
    ///
    /// The result does not depend on the order of `units`. Units are visited
    /// by path; a top-level type declared twice keeps the unit with the
    /// smallest path, nested types included.
    pub fn build(units: &[SourceUnit]) -> Self {
        let mut index = Self::default();
        let mut ordered: Vec<&SourceUnit> = units.iter().collect();
        ordered.sort_by(|a, b| a.path.cmp(&b.path));
        for unit in ordered {
            index.packages.insert(unit.package.clone());
            let mut losing: BTreeSet<Arc<str>> = BTreeSet::new();
            unit.walk_types(|decl, qualified, chain| {
                let qualified: Arc<str> = Arc::from(qualified);
                match chain.first() {
                    None if index.registry.contains(&qualified) => {
                        losing.insert(qualified);
                        return;
                    }
                    Some(top) if losing.contains(top) => return,
                    _ => {}
                }
                index.registry.insert(qualified.clone());
                index.kinds.entry(qualified.clone()).or_insert(decl.kind);
                index
                    .by_simple
                    .entry(decl.name.clone())
                    .or_default()
                    .push(qualified.clone());
                if let Some(outer) = chain.last() {
                    index
                        .nested
                        .entry(outer.clone())
                        .or_default()
                        .insert(decl.name.clone(), qualified);
                }
            });
        }
        for names in index.by_simple.values_mut() {
            names.sort();
            names.dedup();
        }
        tracing::debug!(
            "[SCOPE] indexed {} types in {} packages",
            index.registry.len(),
            index.packages.len()
        );
        index
    }

    /// Is `qualified` a known project type?
    pub fn contains(&self, qualified: &str) -> bool {
        self.registry.contains(qualified)
    }

    /// Get the registered `Arc` for a qualified name.
    pub fn get(&self, qualified: &str) -> Option<&Arc<str>> {
        self.registry.get(qualified)
    }

    /// Look up a nested type by simple name inside `outer`.
    pub fn nested_of(&self, outer: &str, simple: &str) -> Option<&Arc<str>> {
        self.nested.get(outer).and_then(|m| m.get(simple))
    }

    pub fn is_project_package(&self, package: &str) -> bool {
        self.packages.contains(package)
    }

    /// Does any project type use this simple name?
    pub fn claims_simple_name(&self, simple: &str) -> bool {
        self.by_simple.contains_key(simple_name(simple))
    }

    pub fn kind_of(&self, qualified: &str) -> Option<TypeKind> {
        self.kinds.get(qualified).copied()
    }

    /// All qualified names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<str>> {
        self.registry.iter()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

// ============================================================================
// SCOPE CONTEXT
// ============================================================================

/// The names visible from one source unit.
#[derive(Clone, Debug)]
pub struct ScopeContext<'a> {
    index: &'a ProjectIndex,
    package: Arc<str>,
    /// Simple name → qualified name for single-type imports.
    explicit: HashMap<Arc<str>, Arc<str>>,
    /// Wildcard prefixes in source declaration order.
    wildcards: Vec<Arc<str>>,
}

impl<'a> ScopeContext<'a> {
    /// An empty scope for `package` (no imports).
    pub fn new(index: &'a ProjectIndex, package: &str) -> Self {
        Self {
            index,
            package: Arc::from(package),
            explicit: HashMap::new(),
            wildcards: Vec::new(),
        }
    }

    /// Build the scope of a unit. Static imports are ignored for type resolution;
    /// when the same simple name is imported twice the first import wins.
    pub fn for_unit(index: &'a ProjectIndex, unit: &SourceUnit) -> Self {
        let mut scope = Self::new(index, &unit.package);
        for import in unit.imports.iter().filter(|i| !i.is_static) {
            if import.wildcard {
                scope = scope.with_wildcard(&import.path);
            } else {
                scope = scope.with_import(&import.path);
            }
        }
        scope
    }

    pub fn with_import(mut self, qualified: &str) -> Self {
        self.explicit
            .entry(Arc::from(simple_name(qualified)))
            .or_insert_with(|| Arc::from(qualified));
        self
    }

    pub fn with_wildcard(mut self, prefix: &str) -> Self {
        if !self.wildcards.iter().any(|w| &**w == prefix) {
            self.wildcards.push(Arc::from(prefix));
        }
        self
    }

    pub fn index(&self) -> &'a ProjectIndex {
        self.index
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn explicit_import(&self, simple: &str) -> Option<&Arc<str>> {
        self.explicit.get(simple)
    }

    pub fn wildcards(&self) -> &[Arc<str>] {
        &self.wildcards
    }
}
