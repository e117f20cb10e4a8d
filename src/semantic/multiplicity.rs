//! Multiplicity and aggregation
//!
//! The rule tiers used by inference, as pure functions over a member's type
//! shape and annotations:
//!
//! 1. [`annotation_baseline`] from a relationship annotation
//! 2. [`structural_baseline`] from the type shape, when no relationship
//!    annotation fired
//! 3. [`tighten`] from validation annotations, which only ever raises `lower`
//!
//! Every result carries a provenance tag map naming the rules that fired.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::evidence::{AnnotationRole, find_role};
use crate::base::simple_name;
use crate::syntax::{AnnotationEvidence, MalformedLiteral, TypeReference, TypeShape, VALUE_MEMBER};

// ============================================================================
// TYPES
// ============================================================================

/// Upper bound of a multiplicity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Upper {
    Bounded(u32),
    Unbounded,
}

impl Upper {
    pub fn is_unbounded(&self) -> bool {
        matches!(self, Upper::Unbounded)
    }

    /// The UML literal value: `-1` for unbounded.
    pub fn as_i64(&self) -> i64 {
        match self {
            Upper::Bounded(n) => i64::from(*n),
            Upper::Unbounded => -1,
        }
    }
}

impl fmt::Display for Upper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Upper::Bounded(n) => write!(f, "{n}"),
            Upper::Unbounded => f.write_str("*"),
        }
    }
}

/// Lower/upper bounds plus the rules that produced them.
///
/// `lower <= upper` holds whenever `upper` is bounded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultiplicityResult {
    pub lower: u32,
    pub upper: Upper,
    pub provenance: IndexMap<Arc<str>, Arc<str>>,
}

impl MultiplicityResult {
    pub fn new(lower: u32, upper: Upper) -> Self {
        let upper = match upper {
            Upper::Bounded(u) if u < lower => Upper::Bounded(lower),
            other => other,
        };
        Self {
            lower,
            upper,
            provenance: IndexMap::new(),
        }
    }

    /// `0..1`
    pub fn optional() -> Self {
        Self::new(0, Upper::Bounded(1))
    }

    /// `1..1`
    pub fn exactly_one() -> Self {
        Self::new(1, Upper::Bounded(1))
    }

    /// `0..*`
    pub fn many() -> Self {
        Self::new(0, Upper::Unbounded)
    }

    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tag(key, value);
        self
    }

    pub fn tag(&mut self, key: &str, value: &str) {
        self.provenance.insert(Arc::from(key), Arc::from(value));
    }

    pub fn tag_value(&self, key: &str) -> Option<&str> {
        self.provenance.get(key).map(|v| v.as_ref())
    }

    /// Raise the lower bound to `at_least`, capped at a bounded upper.
    /// Never lowers anything.
    pub fn raise_lower(&mut self, at_least: u32) {
        let capped = match self.upper {
            Upper::Bounded(u) => at_least.min(u),
            Upper::Unbounded => at_least,
        };
        self.lower = self.lower.max(capped);
    }

    /// `[l..u]`, used in logical keys.
    pub fn key(&self) -> String {
        format!("[{}..{}]", self.lower, self.upper)
    }
}

impl fmt::Display for MultiplicityResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.lower, self.upper)
    }
}

/// Aggregation kind of an association end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum AggregationKind {
    #[default]
    None,
    Shared,
    Composite,
}

impl AggregationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationKind::None => "none",
            AggregationKind::Shared => "shared",
            AggregationKind::Composite => "composite",
        }
    }
}

/// An annotation literal that was ignored, with the annotation it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MalformedEvidence {
    pub annotation: Arc<str>,
    pub literal: MalformedLiteral,
}

// ============================================================================
// STRUCTURE
// ============================================================================

const COLLECTION_NAMES: &[&str] = &[
    "Collection",
    "List",
    "Set",
    "Iterable",
    "ArrayList",
    "LinkedList",
    "HashSet",
    "LinkedHashSet",
    "TreeSet",
    "SortedSet",
    "NavigableSet",
    "Queue",
    "Deque",
    "ArrayDeque",
];

const MAP_NAMES: &[&str] = &[
    "Map",
    "HashMap",
    "LinkedHashMap",
    "TreeMap",
    "SortedMap",
    "NavigableMap",
    "ConcurrentMap",
    "ConcurrentHashMap",
];

/// How a member's type holds its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StructuralShape<'r> {
    Primitive,
    Array {
        element: &'r TypeReference,
    },
    Collection {
        kind: &'r str,
        element: Option<&'r TypeReference>,
    },
    Map {
        key: Option<&'r TypeReference>,
        value: Option<&'r TypeReference>,
    },
    Optional {
        element: Option<&'r TypeReference>,
    },
    Reference,
}

impl<'r> StructuralShape<'r> {
    /// Classify a reference by its outer shape.
    pub fn of(reference: &'r TypeReference) -> Self {
        match &reference.shape {
            TypeShape::Primitive(_) => StructuralShape::Primitive,
            TypeShape::Array { element, .. } => StructuralShape::Array {
                element: element.as_ref(),
            },
            TypeShape::Generic { base, args } => {
                let simple = simple_name(base);
                let arg = |i: usize| args.get(i).and_then(|a| a.unwrap_wildcard());
                if simple == "Optional" {
                    StructuralShape::Optional { element: arg(0) }
                } else if COLLECTION_NAMES.contains(&simple) {
                    StructuralShape::Collection {
                        kind: simple,
                        element: arg(0),
                    }
                } else if MAP_NAMES.contains(&simple) {
                    StructuralShape::Map {
                        key: arg(0),
                        value: arg(1),
                    }
                } else {
                    StructuralShape::Reference
                }
            }
            TypeShape::Named(name) => {
                let simple = simple_name(name);
                if simple == "Optional" {
                    StructuralShape::Optional { element: None }
                } else if COLLECTION_NAMES.contains(&simple) {
                    StructuralShape::Collection {
                        kind: simple,
                        element: None,
                    }
                } else if MAP_NAMES.contains(&simple) {
                    StructuralShape::Map {
                        key: None,
                        value: None,
                    }
                } else {
                    StructuralShape::Reference
                }
            }
            _ => StructuralShape::Reference,
        }
    }

    /// The type a relationship would point at: array element, collection or
    /// optional element, map value, or the reference itself.
    pub fn target(&self, reference: &'r TypeReference) -> Option<&'r TypeReference> {
        match *self {
            StructuralShape::Primitive => None,
            StructuralShape::Array { element } => Some(element),
            StructuralShape::Collection { element, .. } => element,
            StructuralShape::Optional { element } => element,
            StructuralShape::Map { value, .. } => value,
            StructuralShape::Reference => Some(reference),
        }
    }

    pub fn is_multi_valued(&self) -> bool {
        matches!(
            self,
            StructuralShape::Array { .. }
                | StructuralShape::Collection { .. }
                | StructuralShape::Map { .. }
        )
    }
}

// ============================================================================
// RULE TIERS
// ============================================================================

/// Tier 1: baseline from the first relationship annotation, if any.
///
/// To-one starts at `0..1`; `optional=false` on the relation, `nullable=false`
/// on `Column`/`JoinColumn`, or `Basic(optional=false)` raises `lower` to 1.
/// To-many is `0..*` and ignores those flags.
pub fn annotation_baseline(
    annotations: &[AnnotationEvidence],
    issues: &mut Vec<MalformedEvidence>,
) -> Option<MultiplicityResult> {
    let (role, relation) = find_role(annotations, |r| r.is_relation())?;
    if role.is_to_many() {
        return Some(MultiplicityResult::many().with_tag("relation", role.name()));
    }

    let mut result = MultiplicityResult::optional().with_tag("relation", role.name());
    if read_bool(relation, "optional", issues) == Some(false) {
        result.lower = 1;
        result.tag("lowerSource", &format!("{}.optional=false", role.name()));
    }
    for annotation in annotations {
        let source = match AnnotationRole::of(annotation) {
            Some(r @ (AnnotationRole::Column | AnnotationRole::JoinColumn)) => {
                (read_bool(annotation, "nullable", issues) == Some(false))
                    .then(|| format!("{}.nullable=false", r.name()))
            }
            Some(AnnotationRole::Basic) => (read_bool(annotation, "optional", issues)
                == Some(false))
            .then(|| "Basic.optional=false".to_string()),
            _ => None,
        };
        if let Some(source) = source {
            result.lower = 1;
            result.tag("lowerSource", &source);
        }
    }
    Some(result)
}

/// Tier 2: baseline from the type shape.
///
/// Arrays, collections and maps are `0..*`, `Optional` is `0..1`, primitives
/// are `1..1`, anything else `0..1`.
pub fn structural_baseline(reference: &TypeReference) -> MultiplicityResult {
    let label = |r: Option<&TypeReference>| r.map(|r| r.raw.to_string());
    match StructuralShape::of(reference) {
        StructuralShape::Primitive => MultiplicityResult::exactly_one(),
        StructuralShape::Array { element } => MultiplicityResult::many()
            .with_tag("isArray", "true")
            .with_tag("elementType", &element.raw),
        StructuralShape::Optional { element } => {
            let mut result = MultiplicityResult::optional().with_tag("containerKind", "Optional");
            if let Some(e) = label(element) {
                result.tag("elementType", &e);
            }
            result
        }
        StructuralShape::Collection { kind, element } => {
            let mut result = MultiplicityResult::many().with_tag("collectionKind", kind);
            if let Some(e) = label(element) {
                result.tag("elementType", &e);
            }
            result
        }
        StructuralShape::Map { key, value } => {
            let mut result = MultiplicityResult::many().with_tag("collectionKind", "Map");
            if let (Some(k), Some(v)) = (label(key), label(value)) {
                result.tag("mapKeyType", &k);
                result.tag("mapValueType", &v);
            }
            result
        }
        StructuralShape::Reference => MultiplicityResult::optional(),
    }
}

/// Tier 3: validation tightening.
///
/// `NotNull`/`Nonnull`/`NotEmpty`/`NotBlank` and `Size(min >= 1)` raise `lower`;
/// nothing here touches `upper`. `Size(max)` is recorded as a tag only.
pub fn tighten(
    mut result: MultiplicityResult,
    annotations: &[AnnotationEvidence],
    issues: &mut Vec<MalformedEvidence>,
) -> MultiplicityResult {
    for annotation in annotations {
        match AnnotationRole::of(annotation) {
            Some(role) if role.is_required() => {
                result.raise_lower(1);
                result.tag("validation", role.name());
            }
            Some(AnnotationRole::Size) => {
                let min_member = if annotation.value("min").is_some() {
                    "min"
                } else {
                    VALUE_MEMBER
                };
                if let Some(min) = read_int(annotation, min_member, issues) {
                    if min >= 1 {
                        result.raise_lower(u32::try_from(min).unwrap_or(u32::MAX));
                    }
                    result.tag("validationSizeMin", &min.to_string());
                }
                if let Some(max) = read_int(annotation, "max", issues) {
                    result.tag("validationSizeMax", &max.to_string());
                }
            }
            _ => {}
        }
    }
    result
}

fn read_bool(
    annotation: &AnnotationEvidence,
    member: &str,
    issues: &mut Vec<MalformedEvidence>,
) -> Option<bool> {
    match annotation.bool_value(member) {
        Ok(v) => v,
        Err(literal) => {
            push_issue(annotation, literal, issues);
            None
        }
    }
}

fn read_int(
    annotation: &AnnotationEvidence,
    member: &str,
    issues: &mut Vec<MalformedEvidence>,
) -> Option<i64> {
    match annotation.int_value(member) {
        Ok(v) => v,
        Err(literal) => {
            push_issue(annotation, literal, issues);
            None
        }
    }
}

fn push_issue(
    annotation: &AnnotationEvidence,
    literal: MalformedLiteral,
    issues: &mut Vec<MalformedEvidence>,
) {
    let issue = MalformedEvidence {
        annotation: annotation.simple_name.clone(),
        literal,
    };
    if !issues.contains(&issue) {
        issues.push(issue);
    }
}
