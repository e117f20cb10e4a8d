//! Configuration files and the switches they control.

use std::io::Write;

use j2x::interchange::ElementKind;
use j2x::project::EXTERNAL_PACKAGE;
use j2x::{ConfigError, Pipeline, PipelineConfig, RelationshipPolicy};

use crate::helpers::fixtures::shop_units;

#[test]
fn test_load_yaml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("j2x.yaml");
    std::fs::write(
        &path,
        "relationshipPolicy: none\nmodelName: Shop\nincludeOperations: false\n",
    )
    .unwrap();

    let config = PipelineConfig::load(&path).unwrap();
    assert_eq!(config.relationship_policy, RelationshipPolicy::None);
    assert_eq!(config.model_name, "Shop");
    assert!(!config.include_operations);
}

#[test]
fn test_load_json_file() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, r#"{{"includeAnnotations": false, "identity": {{"maxLength": 64}}}}"#).unwrap();

    let config = PipelineConfig::load(file.path()).unwrap();
    assert!(!config.include_annotations);
    assert_eq!(config.identity.max_length, 64);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        PipelineConfig::load(&dir.path().join("absent.yaml")),
        Err(ConfigError::Io { .. })
    ));
}

#[test]
fn test_switches_drop_optional_content() {
    let config = PipelineConfig {
        include_operations: false,
        include_external_stubs: false,
        include_annotations: false,
        ..PipelineConfig::default()
    };
    let model = Pipeline::new(config).build_model(&shop_units());
    assert!(model.elements_of_kind(ElementKind::Operation).is_empty());
    assert!(model.annotations.is_empty());
    assert!(
        model
            .elements_of_kind(ElementKind::Package)
            .iter()
            .all(|p| p.name.as_deref() != Some(EXTERNAL_PACKAGE))
    );
}

#[test]
fn test_model_name_from_config() {
    let config = PipelineConfig::default().with_model_name("Shop");
    let output = Pipeline::new(config).run(&shop_units()).unwrap();
    assert_eq!(&*output.model.name, "Shop");
    assert!(output.xmi_text().contains(r#"name="Shop""#));
}
