//! Bounds on built properties.

use j2x::PipelineConfig;
use j2x::project::ModelBuilder;
use j2x::syntax::{FieldDecl, SourceUnit, TypeDecl};
use rstest::rstest;

use crate::helpers::fixtures::{ann, shop_units};
use crate::helpers::model_assertions::{bounds, element};

#[rstest]
#[case("Field:shop.model.Customer#id", (0, 1))]
#[case("Field:shop.model.Customer#name", (1, 1))]
#[case("Field:shop.model.Customer#orders", (0, -1))]
#[case("Field:shop.model.Order#customer", (1, 1))]
#[case("Field:shop.model.Order#tags", (0, -1))]
#[case("Field:shop.model.Customer#status", (0, 1))]
fn test_shop_bounds(#[case] key: &str, #[case] expected: (u32, i64)) {
    let model = ModelBuilder::new(&PipelineConfig::default()).build(&shop_units());
    assert_eq!(bounds(&model, key), expected);
}

#[test]
fn test_size_tightens_collection_without_lowering_upper() {
    let units = vec![
        SourceUnit::new("p/Box.java", "p").with_type(
            TypeDecl::class("Box")
                .with_field(
                    FieldDecl::new("items", "List<String>")
                        .with_annotation(ann("NotEmpty"))
                        .with_annotation(ann("Size").with_value("max", "5")),
                )
                .with_field(FieldDecl::new("slots", "int[]"))
                .with_field(FieldDecl::new("count", "int")),
        ),
    ];
    let model = ModelBuilder::new(&PipelineConfig::default()).build(&units);
    assert_eq!(bounds(&model, "Field:p.Box#items"), (1, -1));
    let items = element(&model, "Field:p.Box#items");
    assert_eq!(items.tag("collectionKind"), Some("List"));
    assert_eq!(items.tag("validationSizeMax"), Some("5"));
    assert_eq!(bounds(&model, "Field:p.Box#slots"), (0, -1));
    assert_eq!(bounds(&model, "Field:p.Box#count"), (1, 1));
}

#[test]
fn test_provenance_tags_on_property() {
    let model = ModelBuilder::new(&PipelineConfig::default()).build(&shop_units());
    let customer = element(&model, "Field:shop.model.Order#customer");
    assert_eq!(customer.tag("relation"), Some("ManyToOne"));
    assert_eq!(customer.tag("relationSource"), Some("jpa"));
    let orders = element(&model, "Field:shop.model.Customer#orders");
    assert_eq!(orders.tag("relation"), Some("OneToMany"));
}
