//! Association merging
//!
//! Pairs `A.x → B` with `B.y → A` when exactly one side names the other as its
//! inverse (`mappedBy`) and replaces them with one two-ended edge. Everything
//! else stays a one-directional edge. End multiplicities are taken from each
//! side's own inference; merging never makes them agree.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use indexmap::IndexMap;

use super::infer::InferredRelationship;
use super::multiplicity::{AggregationKind, MultiplicityResult};
use crate::hir::{Diagnostic, DiagnosticLog};

/// One end of an association.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssociationEnd {
    /// The type this end points at.
    pub type_identity: Arc<str>,
    pub role_name: Option<Arc<str>>,
    pub multiplicity: MultiplicityResult,
    pub aggregation: AggregationKind,
    /// Type owning this end as a member; `None` when owned by the association.
    pub owner: Option<Arc<str>>,
}

/// A merged (two member ends) or one-directional association.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssociationEdge {
    pub end1: AssociationEnd,
    pub end2: AssociationEnd,
    pub merged: bool,
    pub tags: IndexMap<Arc<str>, Arc<str>>,
}

impl AssociationEdge {
    fn one_directional(rel: InferredRelationship) -> Self {
        let member_end = AssociationEnd {
            type_identity: rel.target.clone(),
            role_name: Some(rel.member.clone()),
            multiplicity: rel.multiplicity,
            aggregation: rel.aggregation,
            owner: Some(rel.owner.clone()),
        };
        let opposite_end = AssociationEnd {
            type_identity: rel.owner,
            role_name: rel.inverse_of,
            multiplicity: rel.opposite,
            aggregation: AggregationKind::None,
            owner: None,
        };
        Self {
            end1: member_end,
            end2: opposite_end,
            merged: false,
            tags: rel.tags,
        }
    }

    fn merged(a: InferredRelationship, b: InferredRelationship) -> Self {
        let (first, second) = if (&a.owner, &a.member) <= (&b.owner, &b.member) {
            (a, b)
        } else {
            (b, a)
        };
        let end = |rel: &InferredRelationship| AssociationEnd {
            type_identity: rel.target.clone(),
            role_name: Some(rel.member.clone()),
            multiplicity: rel.multiplicity.clone(),
            aggregation: rel.aggregation,
            owner: Some(rel.owner.clone()),
        };

        let mut tags = IndexMap::new();
        for (key, value) in first.tags.iter().chain(second.tags.iter()) {
            tags.entry(key.clone()).or_insert_with(|| value.clone());
        }
        tags.insert(Arc::from("bidirectional"), Arc::from("true"));

        Self {
            end1: end(&first),
            end2: end(&second),
            merged: true,
            tags,
        }
    }

    /// Owning type and member of the end that drives the key: end 1's owner,
    /// or, for one-directional edges, the member side.
    fn source(&self) -> (&str, &str) {
        let owner = self.end1.owner.as_deref().unwrap_or(&self.end2.type_identity);
        (owner, self.end1.role_name.as_deref().unwrap_or(""))
    }

    /// Deterministic logical key for identity assignment.
    pub fn logical_key(&self) -> String {
        let (owner, member) = self.source();
        if self.merged {
            format!(
                "Association:{owner}#{member}<->{}#{}",
                self.end2.owner.as_deref().unwrap_or(""),
                self.end2.role_name.as_deref().unwrap_or("")
            )
        } else {
            format!(
                "Association:{owner}#{member}->{}:{}",
                self.end1.type_identity,
                self.end1.multiplicity.key()
            )
        }
    }

    /// Is either end composite?
    pub fn is_composite(&self) -> bool {
        self.end1.aggregation == AggregationKind::Composite
            || self.end2.aggregation == AggregationKind::Composite
    }
}

/// Merge inverse pairs. Output order depends only on the relationships'
/// owners and member names, never on input order.
pub fn merge_associations(
    relationships: Vec<InferredRelationship>,
    log: &mut DiagnosticLog,
) -> Vec<AssociationEdge> {
    let mut by_member: BTreeMap<(Arc<str>, Arc<str>), InferredRelationship> = BTreeMap::new();
    for rel in relationships {
        by_member
            .entry((rel.owner.clone(), rel.member.clone()))
            .or_insert(rel);
    }

    // (target, mappedBy) → claimants, each a (owner, member) key.
    let mut claims: BTreeMap<(Arc<str>, Arc<str>), Vec<(Arc<str>, Arc<str>)>> = BTreeMap::new();
    for (key, rel) in &by_member {
        if let Some(inverse) = &rel.inverse_of {
            claims
                .entry((rel.target.clone(), inverse.clone()))
                .or_default()
                .push(key.clone());
        }
    }

    let mut pairs: HashMap<(Arc<str>, Arc<str>), (Arc<str>, Arc<str>)> = HashMap::new();
    for (field, claimants) in &claims {
        let Some(claimed) = by_member.get(field) else {
            continue;
        };
        let pointing_back: Vec<&(Arc<str>, Arc<str>)> = claimants
            .iter()
            .filter(|(owner, _)| *owner == claimed.target)
            .collect();
        if pointing_back.is_empty() {
            continue;
        }

        // Only a claimed field naming its own claimant back competes with it.
        let mutual = pointing_back.iter().any(|(owner, member)| {
            claimed.inverse_of.as_ref() == Some(member) && claimed.target == *owner
        });
        if pointing_back.len() > 1 || mutual {
            let mut names: Vec<String> = pointing_back
                .iter()
                .map(|(owner, member)| format!("{owner}.{member}"))
                .collect();
            if mutual {
                names.push(format!("{}.{}", field.0, field.1));
            }
            tracing::warn!(
                "[MERGE] ambiguous inverse for {}.{}: {}",
                field.0,
                field.1,
                names.join(", ")
            );
            log.push(
                Diagnostic::ambiguous_inverse(&field.1, &field.0, &names)
                    .with_location(claimed.location.clone()),
            );
            continue;
        }

        let claimant = pointing_back[0].clone();
        if pairs.contains_key(&claimant) || pairs.contains_key(field) {
            continue;
        }
        pairs.insert(claimant.clone(), field.clone());
        pairs.insert(field.clone(), claimant);
    }

    let mut edges = Vec::with_capacity(by_member.len());
    let mut taken: HashMap<(Arc<str>, Arc<str>), InferredRelationship> = HashMap::new();
    for (key, rel) in by_member {
        match pairs.get(&key) {
            None => edges.push(AssociationEdge::one_directional(rel)),
            Some(partner) => match taken.remove(partner) {
                Some(other) => edges.push(AssociationEdge::merged(other, rel)),
                None => {
                    taken.insert(key, rel);
                }
            },
        }
    }

    edges.sort_by(|a, b| {
        let (ao, am) = a.source();
        let (bo, bm) = b.source();
        (ao, am).cmp(&(bo, bm))
    });

    tracing::debug!(
        "[MERGE] {} edges, {} merged",
        edges.len(),
        edges.iter().filter(|e| e.merged).count()
    );
    edges
}
