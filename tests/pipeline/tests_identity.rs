//! Ids depend on logical keys, not on what else is in the project.

use std::collections::HashMap;

use j2x::Pipeline;
use j2x::syntax::{FieldDecl, SourceUnit, TypeDecl};

use crate::helpers::fixtures::shop_units;

fn ids_by_key(model: &j2x::Model) -> HashMap<String, String> {
    model
        .elements()
        .into_iter()
        .filter_map(|e| Some((e.logical_key.as_deref()?.to_string(), e.id.as_ref()?.to_string())))
        .collect()
}

#[test]
fn test_unrelated_type_keeps_existing_ids() {
    let pipeline = Pipeline::default();
    let before = pipeline.build_model(&shop_units());

    let mut units = shop_units();
    units.push(
        SourceUnit::new("src/audit/Entry.java", "audit").with_type(
            TypeDecl::class("Entry").with_field(FieldDecl::new("message", "String")),
        ),
    );
    let after = pipeline.build_model(&units);

    let after_ids = ids_by_key(&after);
    for (key, id) in ids_by_key(&before) {
        assert_eq!(after_ids.get(&key), Some(&id), "id of {key} changed");
    }
    assert!(after.find_by_key("Classifier:audit.Entry").is_some());
}

#[test]
fn test_references_point_at_assigned_ids() {
    let model = Pipeline::default().build_model(&shop_units());
    let ids = ids_by_key(&model);
    for element in model.elements() {
        for value in element.properties.values() {
            if let j2x::interchange::PropertyValue::Reference(r) = value {
                assert_eq!(
                    r.id.as_ref().map(|id| id.to_string()).as_ref(),
                    ids.get(&*r.key),
                    "reference to {} carries the wrong id",
                    r.key
                );
            }
        }
    }
}
