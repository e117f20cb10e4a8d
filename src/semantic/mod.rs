//! # Semantic inference
//!
//! Turns resolved members into attributes or relationships and consolidates
//! inverse pairs.
//!
//! ```text
//! RelationshipCandidate      ← built once per member from resolved references
//!     │
//!     ▼
//! InferenceEngine::infer     ← policy + multiplicity tiers + aggregation
//!     │
//!     ▼
//! merge_associations         ← mappedBy pairs → two-ended edges
//! ```

pub mod evidence;
pub mod infer;
pub mod merge;
pub mod multiplicity;

pub use evidence::{AnnotationRole, find_role, has_role};
pub use infer::{
    CandidateKind, CandidateTarget, Inference, InferenceEngine, InferredRelationship,
    RelationshipCandidate, RelationshipPolicy, VALUE_TYPES, is_value_type, opposite_multiplicity,
};
pub use merge::{AssociationEdge, AssociationEnd, merge_associations};
pub use multiplicity::{
    AggregationKind, MalformedEvidence, MultiplicityResult, StructuralShape, Upper,
    annotation_baseline, structural_baseline, tighten,
};
