//! Same input, same bytes.

use j2x::Pipeline;
use j2x::interchange::ElementKind;
use j2x::syntax::{FieldDecl, SourceUnit, TypeDecl, TypeKind};
use rstest::rstest;

use crate::helpers::fixtures::shop_units;
use crate::helpers::model_assertions::assert_ids_well_formed;

#[rstest]
#[case(1)]
#[case(2)]
#[case(4)]
fn test_unit_order_never_changes_xmi(#[case] rotation: usize) {
    let pipeline = Pipeline::default();
    let baseline = pipeline.run(&shop_units()).unwrap();

    let mut rotated = shop_units();
    rotated.rotate_left(rotation);
    let output = pipeline.run(&rotated).unwrap();
    assert_eq!(baseline.xmi_text(), output.xmi_text());
    assert_eq!(baseline.diagnostics, output.diagnostics);
}

#[test]
fn test_repeated_runs_are_identical() {
    let pipeline = Pipeline::default();
    let first = pipeline.run(&shop_units()).unwrap();
    let second = pipeline.run(&shop_units()).unwrap();
    assert_eq!(first.xmi, second.xmi);
    assert_ids_well_formed(&first.model);
}

#[test]
fn test_parallel_batch_matches_sequential_runs() {
    let pipeline = Pipeline::default();
    let mut reversed = shop_units();
    reversed.reverse();
    let batch = pipeline.run_batch(&[shop_units(), reversed]);
    let sequential = pipeline.run(&shop_units()).unwrap();
    for result in batch {
        assert_eq!(result.unwrap().xmi, sequential.xmi);
    }
}

#[test]
fn test_diagnostics_are_sorted() {
    let output = Pipeline::default().run(&shop_units()).unwrap();
    let keys: Vec<_> = output.diagnostics.iter().map(|d| d.sort_key()).collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

#[test]
fn test_duplicate_declarations_resolve_by_path_not_input_order() {
    let units = vec![
        SourceUnit::new("a/Status.java", "p").with_type(TypeDecl::new("Status", TypeKind::Enum)),
        SourceUnit::new("b/Status.java", "p").with_type(TypeDecl::class("Status")),
        SourceUnit::new("c/Order.java", "p")
            .with_type(TypeDecl::class("Order").with_field(FieldDecl::new("status", "Status"))),
    ];
    let mut reversed = units.clone();
    reversed.reverse();

    let pipeline = Pipeline::default();
    let forward = pipeline.run(&units).unwrap();
    let backward = pipeline.run(&reversed).unwrap();
    assert_eq!(forward.xmi_text(), backward.xmi_text());
    // The enum from a/ wins, so the field stays an attribute.
    assert!(forward.model.elements_of_kind(ElementKind::Association).is_empty());
    assert!(forward.model.elements_of_kind(ElementKind::Enumeration).len() == 1);
}
