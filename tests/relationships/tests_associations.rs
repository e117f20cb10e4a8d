//! Association edges in the built model.

use j2x::interchange::{ElementKind, PropertyValue, props};
use j2x::project::ModelBuilder;
use j2x::syntax::{FieldDecl, SourceUnit, TypeDecl};
use j2x::{PipelineConfig, RelationshipPolicy};

use crate::helpers::fixtures::{ann, shop_units};
use crate::helpers::model_assertions::{bounds, element, reference};

const MERGED: &str = "Association:shop.model.Customer#orders<->shop.model.Order#customer";

fn build(policy: RelationshipPolicy) -> j2x::Model {
    ModelBuilder::new(&PipelineConfig::default().with_policy(policy)).build(&shop_units())
}

#[test]
fn test_mapped_by_pair_is_one_bidirectional_edge() {
    let model = build(RelationshipPolicy::Smart);
    let association = element(&model, MERGED);
    assert_eq!(association.tag("bidirectional"), Some("true"));
    match association.property(props::MEMBER_END) {
        Some(PropertyValue::References(ends)) => {
            let keys: Vec<&str> = ends.iter().map(|r| &*r.key).collect();
            assert_eq!(
                keys,
                ["Field:shop.model.Customer#orders", "Field:shop.model.Order#customer"]
            );
        }
        other => panic!("unexpected memberEnd {other:?}"),
    }
    assert_eq!(
        reference(element(&model, "Field:shop.model.Order#customer"), props::ASSOCIATION),
        Some(MERGED)
    );
}

#[test]
fn test_merge_is_independent_of_unit_order() {
    let mut reversed = shop_units();
    reversed.reverse();
    let model = ModelBuilder::new(&PipelineConfig::default()).build(&reversed);
    assert!(model.find_by_key(MERGED).is_some());
}

#[test]
fn test_embedded_member_end_is_composite() {
    let model = build(RelationshipPolicy::Smart);
    let address = element(&model, "Field:shop.model.Customer#address");
    assert_eq!(
        address.property(props::AGGREGATION),
        Some(&PropertyValue::from("composite"))
    );
    let key = reference(address, props::ASSOCIATION).expect("address is a member end");
    let association = element(&model, key);
    assert_eq!(association.tag("aggregation"), Some("composite"));
    // The owner side of a containment is exactly one.
    assert_eq!(bounds(&model, &format!("{key}/ownedEnd")), (1, 1));
}

#[test]
fn test_value_types_and_transients_stay_attributes() {
    let model = build(RelationshipPolicy::Smart);
    let associated: Vec<&str> = model
        .elements_of_kind(ElementKind::Property)
        .into_iter()
        .filter(|p| p.property(props::ASSOCIATION).is_some())
        .filter_map(|p| p.logical_key.as_deref())
        .collect();
    for key in [
        "Field:shop.model.Customer#name",
        "Field:shop.model.Customer#status",
        "Field:shop.model.Order#tags",
        "Field:shop.model.Order#cache",
    ] {
        assert!(!associated.contains(&key), "{key} must not be an association end");
    }
}

#[test]
fn test_resolved_policy_promotes_enum_reference() {
    let model = build(RelationshipPolicy::Resolved);
    let status = element(&model, "Field:shop.model.Customer#status");
    assert!(status.property(props::ASSOCIATION).is_some());
}

#[test]
fn test_annotated_only_ignores_plain_references() {
    let units = vec![
        SourceUnit::new("p/A.java", "p").with_type(
            TypeDecl::class("A")
                .with_field(FieldDecl::new("b", "B"))
                .with_field(FieldDecl::new("c", "B").with_annotation(ann("OneToOne"))),
        ),
        SourceUnit::new("p/B.java", "p").with_type(TypeDecl::class("B")),
    ];
    let config = PipelineConfig::default().with_policy(RelationshipPolicy::AnnotatedOnly);
    let model = ModelBuilder::new(&config).build(&units);
    let associations = model.elements_of_kind(ElementKind::Association);
    assert_eq!(associations.len(), 1);
    assert!(element(&model, "Field:p.A#b").property(props::ASSOCIATION).is_none());
}

#[test]
fn test_competing_inverse_claims_are_reported() {
    let units = vec![
        SourceUnit::new("p/Team.java", "p").with_type(
            TypeDecl::class("Team")
                .with_field(
                    FieldDecl::new("members", "List<Player>")
                        .with_annotation(ann("OneToMany").with_value("mappedBy", "\"team\"")),
                )
                .with_field(
                    FieldDecl::new("alumni", "List<Player>")
                        .with_annotation(ann("OneToMany").with_value("mappedBy", "\"team\"")),
                ),
        ),
        SourceUnit::new("p/Player.java", "p").with_type(
            TypeDecl::class("Player")
                .with_field(FieldDecl::new("team", "Team").with_annotation(ann("ManyToOne"))),
        ),
    ];
    let model = ModelBuilder::new(&PipelineConfig::default()).build(&units);
    assert!(model.diagnostics.iter().any(|d| d.code == "W0001"));
    assert!(
        model
            .elements_of_kind(ElementKind::Association)
            .iter()
            .all(|a| a.tag("bidirectional").is_none())
    );
}
