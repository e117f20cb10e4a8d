//! Relationship inference
//!
//! Decides, per member, whether it becomes a semantic relationship under the
//! active [`RelationshipPolicy`], and computes the multiplicity and aggregation
//! of both ends. Members that stay attributes still get a multiplicity.
//!
//! Precedence:
//!
//! - a transient member never becomes a relationship (checked first)
//! - multiplicity: annotation baseline, else structural baseline, then
//!   validation tightening
//! - containment (`Embedded`, `EmbeddedId`, `ElementCollection` of a composite
//!   target) is composite and fixes the opposite end to `1..1`
//! - `orphanRemoval=true` on a relationship annotation is composite
//! - value types are never promoted

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::evidence::{AnnotationRole, find_role, has_role};
use super::multiplicity::{
    AggregationKind, MalformedEvidence, MultiplicityResult, annotation_baseline,
    structural_baseline, tighten,
};
use crate::base::{Location, simple_name};
use crate::hir::{Diagnostic, DiagnosticLog};
use crate::syntax::{AnnotationEvidence, TypeReference};

/// Simple names of types that are always values, never relationship targets.
pub const VALUE_TYPES: &[&str] = &[
    "String",
    "Boolean",
    "Byte",
    "Short",
    "Integer",
    "Long",
    "Float",
    "Double",
    "Character",
    "Number",
    "UUID",
    "BigDecimal",
    "BigInteger",
    "LocalDate",
    "LocalDateTime",
    "LocalTime",
    "OffsetDateTime",
    "ZonedDateTime",
    "Instant",
    "Duration",
    "Date",
    "URI",
    "URL",
];

/// Is the written or qualified name a value type?
pub fn is_value_type(name: &str) -> bool {
    crate::syntax::is_primitive(name) || VALUE_TYPES.contains(&simple_name(name))
}

// ============================================================================
// POLICY
// ============================================================================

/// Which members may become relationships.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationshipPolicy {
    /// Never emit relationships from fields.
    None,
    /// Only members carrying a relationship annotation.
    AnnotatedOnly,
    /// Any member whose target resolves to a model type.
    Resolved,
    /// Relationship annotation, or resolved and not value-like (enums count as values).
    #[default]
    Smart,
}

impl RelationshipPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipPolicy::None => "none",
            RelationshipPolicy::AnnotatedOnly => "annotatedOnly",
            RelationshipPolicy::Resolved => "resolved",
            RelationshipPolicy::Smart => "smart",
        }
    }
}

// ============================================================================
// CANDIDATES
// ============================================================================

/// Classification of a candidate before the policy is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CandidateKind {
    None,
    PlainAssociation,
    Containment,
}

/// The model type a member points at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateTarget {
    pub identity: Arc<str>,
    /// Structured (class, interface, record) rather than an enum.
    pub composite: bool,
}

/// A member evaluated for promotion to a relationship. Built once, read once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelationshipCandidate {
    pub owner: Arc<str>,
    pub member: Arc<str>,
    pub reference: TypeReference,
    /// Element type name as written (after unwrapping arrays and containers).
    pub target_written: Option<Arc<str>>,
    /// Resolved model target; `None` when the target is not a model type.
    pub target: Option<CandidateTarget>,
    pub annotations: Vec<AnnotationEvidence>,
    pub is_transient: bool,
    pub kind: CandidateKind,
    pub location: Option<Location>,
}

impl RelationshipCandidate {
    pub fn new(owner: &str, member: &str, reference: TypeReference) -> Self {
        Self {
            owner: Arc::from(owner),
            member: Arc::from(member),
            reference,
            target_written: None,
            target: None,
            annotations: Vec::new(),
            is_transient: false,
            kind: CandidateKind::None,
            location: None,
        }
    }

    pub fn with_target(mut self, written: &str, target: Option<CandidateTarget>) -> Self {
        self.target_written = Some(Arc::from(written));
        self.target = target;
        self
    }

    pub fn with_annotations(mut self, annotations: Vec<AnnotationEvidence>) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn with_transient(mut self, is_transient: bool) -> Self {
        self.is_transient = is_transient;
        self
    }

    pub fn with_location(mut self, location: Option<Location>) -> Self {
        self.location = location;
        self
    }

    /// Compute [`CandidateKind`] from the evidence gathered so far.
    pub fn classified(mut self) -> Self {
        self.kind = self.classify();
        self
    }

    fn classify(&self) -> CandidateKind {
        if self.is_transient_member() {
            return CandidateKind::None;
        }
        let Some(target) = &self.target else {
            return CandidateKind::None;
        };
        if self.is_value_like_target() {
            return CandidateKind::None;
        }
        if has_role(&self.annotations, |r| r.is_embedding()) {
            return CandidateKind::Containment;
        }
        if target.composite && has_role(&self.annotations, |r| r == AnnotationRole::ElementCollection)
        {
            return CandidateKind::Containment;
        }
        CandidateKind::PlainAssociation
    }

    pub fn is_transient_member(&self) -> bool {
        self.is_transient || has_role(&self.annotations, |r| r == AnnotationRole::Transient)
    }

    fn is_value_like_target(&self) -> bool {
        self.reference.is_primitive()
            || self.target_written.as_deref().is_some_and(is_value_type)
    }

    fn context(&self) -> String {
        format!("field {}", self.member)
    }
}

// ============================================================================
// RESULTS
// ============================================================================

/// A member promoted to a one-directional relationship.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InferredRelationship {
    pub owner: Arc<str>,
    pub member: Arc<str>,
    pub target: Arc<str>,
    /// End typed by the target, owned by the member's type.
    pub multiplicity: MultiplicityResult,
    pub aggregation: AggregationKind,
    /// End typed by the owner, used when the edge stays unmerged.
    pub opposite: MultiplicityResult,
    /// `mappedBy`: the field on the target naming this relationship's inverse.
    pub inverse_of: Option<Arc<str>>,
    pub relation: Option<AnnotationRole>,
    pub containment: bool,
    pub tags: IndexMap<Arc<str>, Arc<str>>,
    pub location: Option<Location>,
}

/// Inference result for one member.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inference {
    /// Multiplicity of the member as an attribute or owned end.
    pub multiplicity: MultiplicityResult,
    pub aggregation: AggregationKind,
    /// Why the member was or was not promoted (`relationSource` tag).
    pub relation_source: &'static str,
    pub relationship: Option<InferredRelationship>,
}

// ============================================================================
// ENGINE
// ============================================================================

/// Applies the rule tiers under a policy.
#[derive(Clone, Copy, Debug, Default)]
pub struct InferenceEngine {
    policy: RelationshipPolicy,
}

impl InferenceEngine {
    pub fn new(policy: RelationshipPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> RelationshipPolicy {
        self.policy
    }

    /// Multiplicity tiers 1–3 for a member.
    pub fn multiplicity(
        &self,
        candidate: &RelationshipCandidate,
        issues: &mut Vec<MalformedEvidence>,
    ) -> MultiplicityResult {
        let baseline = annotation_baseline(&candidate.annotations, issues)
            .unwrap_or_else(|| structural_baseline(&candidate.reference));
        tighten(baseline, &candidate.annotations, issues)
    }

    /// Infer one member. Malformed annotation literals are logged and ignored.
    pub fn infer(&self, candidate: &RelationshipCandidate, log: &mut DiagnosticLog) -> Inference {
        let mut issues = Vec::new();
        let mut multiplicity = self.multiplicity(candidate, &mut issues);
        let relation = find_role(&candidate.annotations, |r| r.is_relation());
        let aggregation = self.aggregation(candidate, relation, &mut issues);
        let relation_source = self.relation_source(candidate, relation.is_some());

        for issue in issues {
            tracing::warn!(
                "[INFER] {}.{}: ignoring malformed @{}.{} = {}",
                candidate.owner,
                candidate.member,
                issue.annotation,
                issue.literal.member,
                issue.literal.raw
            );
            log.push(
                Diagnostic::malformed_annotation(
                    &issue.annotation,
                    &issue.literal.member,
                    &issue.literal.raw,
                    &candidate.owner,
                    &candidate.context(),
                )
                .with_location(candidate.location.clone()),
            );
        }

        multiplicity.tag("relationSource", relation_source);
        let relationship = self
            .promotes(candidate, relation.is_some())
            .then(|| self.relationship(candidate, relation, &multiplicity, aggregation))
            .flatten();

        tracing::trace!(
            "[INFER] {}.{} {} source={} promoted={}",
            candidate.owner,
            candidate.member,
            multiplicity,
            relation_source,
            relationship.is_some()
        );

        Inference {
            multiplicity,
            aggregation,
            relation_source,
            relationship,
        }
    }

    /// Does the active policy promote this candidate?
    pub fn promotes(&self, candidate: &RelationshipCandidate, has_relation: bool) -> bool {
        if candidate.is_transient_member() {
            return false;
        }
        match (self.policy, candidate.kind) {
            (RelationshipPolicy::None, _) | (_, CandidateKind::None) => false,
            (_, CandidateKind::Containment) => true,
            (RelationshipPolicy::AnnotatedOnly, _) => has_relation,
            (RelationshipPolicy::Resolved, _) => true,
            (RelationshipPolicy::Smart, _) => {
                has_relation || candidate.target.as_ref().is_some_and(|t| t.composite)
            }
        }
    }

    fn aggregation(
        &self,
        candidate: &RelationshipCandidate,
        relation: Option<(AnnotationRole, &AnnotationEvidence)>,
        issues: &mut Vec<MalformedEvidence>,
    ) -> AggregationKind {
        if candidate.kind == CandidateKind::Containment {
            return AggregationKind::Composite;
        }
        let orphan_removal = relation.and_then(|(_, evidence)| {
            match evidence.bool_value("orphanRemoval") {
                Ok(v) => v,
                Err(literal) => {
                    issues.push(MalformedEvidence {
                        annotation: evidence.simple_name.clone(),
                        literal,
                    });
                    None
                }
            }
        });
        if orphan_removal == Some(true) {
            AggregationKind::Composite
        } else {
            AggregationKind::None
        }
    }

    fn relation_source(&self, candidate: &RelationshipCandidate, has_relation: bool) -> &'static str {
        if candidate.is_transient_member() {
            return "transient";
        }
        if let Some((role, _)) = find_role(&candidate.annotations, |r| {
            r.is_embedding() || r == AnnotationRole::ElementCollection
        }) {
            return match role {
                AnnotationRole::Embedded => "embedded",
                AnnotationRole::EmbeddedId => "embeddedId",
                _ => "elementCollection",
            };
        }
        if has_relation {
            return "jpa";
        }
        match self.policy {
            RelationshipPolicy::None => "none",
            RelationshipPolicy::AnnotatedOnly => "annotatedOnly",
            RelationshipPolicy::Smart if candidate.is_value_like_target() => "valueType",
            _ if candidate.target.is_some() => "resolved",
            _ => "unresolved",
        }
    }

    fn relationship(
        &self,
        candidate: &RelationshipCandidate,
        relation: Option<(AnnotationRole, &AnnotationEvidence)>,
        multiplicity: &MultiplicityResult,
        aggregation: AggregationKind,
    ) -> Option<InferredRelationship> {
        let target = candidate.target.as_ref()?;
        let containment = candidate.kind == CandidateKind::Containment;
        let opposite = if containment {
            MultiplicityResult::exactly_one().with_tag("oppositeSource", "containment")
        } else {
            opposite_multiplicity(relation.map(|(role, _)| role))
        };
        let inverse_of = relation
            .and_then(|(_, evidence)| evidence.string_value("mappedBy"))
            .filter(|m| !m.is_empty())
            .map(Arc::from);

        let mut tags = IndexMap::new();
        tags.insert(
            Arc::from("relationSource"),
            Arc::from(self.relation_source(candidate, relation.is_some())),
        );
        tags.insert(Arc::from("aggregation"), Arc::from(aggregation.as_str()));
        if let Some((_, evidence)) = relation {
            if let Some(raw) = evidence.value("orphanRemoval") {
                tags.insert(Arc::from("orphanRemoval"), Arc::from(raw));
            }
        }

        Some(InferredRelationship {
            owner: candidate.owner.clone(),
            member: candidate.member.clone(),
            target: target.identity.clone(),
            multiplicity: multiplicity.clone(),
            aggregation,
            opposite,
            inverse_of,
            relation: relation.map(|(role, _)| role),
            containment,
            tags,
            location: candidate.location.clone(),
        })
    }
}

/// Multiplicity of the opposite end of an unmerged relationship.
pub fn opposite_multiplicity(relation: Option<AnnotationRole>) -> MultiplicityResult {
    let result = match relation {
        Some(AnnotationRole::ManyToOne) | Some(AnnotationRole::ManyToMany) => {
            MultiplicityResult::many()
        }
        _ => MultiplicityResult::optional(),
    };
    match relation {
        Some(role) => result.with_tag("oppositeSource", role.name()),
        None => result,
    }
}
