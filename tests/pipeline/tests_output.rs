//! Writing pipeline output to disk.

use j2x::Pipeline;
use j2x::interchange::{IrJson, ModelFormat, Xmi, detect_format};
use j2x::syntax::{FieldDecl, SourceUnit, TypeDecl};

use crate::helpers::fixtures::shop_units;

#[test]
fn test_write_xmi_and_ir_files() {
    let dir = tempfile::tempdir().unwrap();
    let output = Pipeline::default().run(&shop_units()).unwrap();

    let xmi_path = dir.path().join("shop.xmi");
    output.write_to(&xmi_path).unwrap();
    let written = std::fs::read(&xmi_path).unwrap();
    assert_eq!(written, output.xmi);
    assert!(Xmi.validate(&written).is_ok());

    let json_path = dir.path().join("shop.json");
    output.write_to(&json_path).unwrap();
    let json = std::fs::read(&json_path).unwrap();
    assert!(IrJson.validate(&json).is_ok());
}

#[test]
fn test_xmi_document_shape() {
    let output = Pipeline::default().run(&shop_units()).unwrap();
    let text = output.xmi_text();
    assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(text.contains("xmi:type=\"uml:Class\""));
    assert!(text.contains("name=\"Customer\""));
    assert!(text.contains("uml:LiteralUnlimitedNatural"));
    assert!(text.contains("j2x:AnnotationApplication"));
    assert!(text.ends_with('\n'));
}

#[test]
fn test_detect_format_by_extension() {
    assert_eq!(
        detect_format(std::path::Path::new("a.uml")).map(|f| f.name()),
        Some("XMI")
    );
    assert!(detect_format(std::path::Path::new("a.txt")).is_none());
}

#[test]
fn test_unknown_type_text_reaches_xmi() {
    let units = vec![
        SourceUnit::new("p/Gadget.java", "p")
            .with_type(TypeDecl::class("Gadget").with_field(FieldDecl::new("thing", "Frobnicator"))),
    ];
    let output = Pipeline::default().run(&units).unwrap();
    let text = output.xmi_text();
    assert!(text.contains(r#"key="typeName" value="Frobnicator""#));
    assert_eq!(output.diagnostics.len(), 1);
}
