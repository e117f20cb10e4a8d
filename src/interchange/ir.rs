//! Cross-language intermediate representation (IR).
//!
//! A language-agnostic JSON document of packages, classifiers and relations.
//! Reading and writing both normalize every list to a fixed order so output
//! is byte-stable. The IR can be fed through the same resolution pipeline
//! ([`to_source_units`]) and a built model can be exported back
//! ([`from_model`]).

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::InterchangeError;
use super::model::{Element, ElementKind, Model, PropertyValue, Visibility, props};
use crate::base::{Location, package_of, simple_name};
use crate::syntax::{
    AnnotationEvidence, FieldDecl, OperationDecl, SourceUnit, TypeDecl, TypeKind, is_primitive,
};

pub const SCHEMA_VERSION: &str = "1.0";

/// Tag key that always sorts first.
pub const TAG_FRAMEWORK: &str = "framework";
/// Prefix of runtime tags, sorted right after `framework`.
pub const RUNTIME_PREFIX: &str = "runtime.";
/// Tag naming the IR kind of a relation carried as a dependency.
pub const RELATION_KIND_TAG: &str = "relationKind";

fn default_schema() -> String {
    SCHEMA_VERSION.to_string()
}

// ============================================================================
// DOCUMENT
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrModel {
    #[serde(default = "default_schema")]
    pub schema_version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<IrPackage>,
    #[serde(default)]
    pub classifiers: Vec<IrClassifier>,
    #[serde(default)]
    pub relations: Vec<IrRelation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tagged_values: Vec<IrTaggedValue>,
}

impl Default for IrModel {
    fn default() -> Self {
        Self {
            schema_version: default_schema(),
            packages: Vec::new(),
            classifiers: Vec::new(),
            relations: Vec::new(),
            tagged_values: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrPackage {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub qualified_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tagged_values: Vec<IrTaggedValue>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IrClassifierKind {
    #[default]
    Class,
    Interface,
    Enum,
    Record,
    TypeAlias,
    Function,
    Component,
    Service,
    Module,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IrVisibility {
    Public,
    Protected,
    #[default]
    Package,
    Private,
}

impl From<IrVisibility> for crate::syntax::Visibility {
    fn from(v: IrVisibility) -> Self {
        match v {
            IrVisibility::Public => Self::Public,
            IrVisibility::Protected => Self::Protected,
            IrVisibility::Package => Self::Package,
            IrVisibility::Private => Self::Private,
        }
    }
}

impl From<Visibility> for IrVisibility {
    fn from(v: Visibility) -> Self {
        match v {
            Visibility::Public => Self::Public,
            Visibility::Protected => Self::Protected,
            Visibility::Package => Self::Package,
            Visibility::Private => Self::Private,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrClassifier {
    pub id: String,
    pub name: String,
    pub qualified_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_id: Option<String>,
    #[serde(default)]
    pub kind: IrClassifierKind,
    #[serde(default)]
    pub visibility: IrVisibility,
    #[serde(default)]
    pub attributes: Vec<IrAttribute>,
    #[serde(default)]
    pub operations: Vec<IrOperation>,
    #[serde(default)]
    pub stereotypes: Vec<IrStereotype>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stereotype_refs: Vec<IrStereotypeRef>,
    #[serde(default)]
    pub tagged_values: Vec<IrTaggedValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<IrSourceRef>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrAttribute {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub visibility: IrVisibility,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_final: bool,
    #[serde(rename = "type", default)]
    pub type_ref: IrTypeRef,
    #[serde(default)]
    pub stereotypes: Vec<IrStereotype>,
    #[serde(default)]
    pub tagged_values: Vec<IrTaggedValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<IrSourceRef>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrOperation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub visibility: IrVisibility,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_constructor: bool,
    #[serde(default = "IrTypeRef::void")]
    pub return_type: IrTypeRef,
    #[serde(default)]
    pub parameters: Vec<IrParameter>,
    #[serde(default)]
    pub stereotypes: Vec<IrStereotype>,
    #[serde(default)]
    pub tagged_values: Vec<IrTaggedValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<IrSourceRef>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrParameter {
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_ref: IrTypeRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tagged_values: Vec<IrTaggedValue>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IrRelationKind {
    Generalization,
    Realization,
    Association,
    Dependency,
    Composition,
    Aggregation,
    Render,
    Di,
    TemplateUses,
    RouteTo,
}

impl IrRelationKind {
    /// Wire name, used for ordering and as the `relationKind` tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generalization => "GENERALIZATION",
            Self::Realization => "REALIZATION",
            Self::Association => "ASSOCIATION",
            Self::Dependency => "DEPENDENCY",
            Self::Composition => "COMPOSITION",
            Self::Aggregation => "AGGREGATION",
            Self::Render => "RENDER",
            Self::Di => "DI",
            Self::TemplateUses => "TEMPLATE_USES",
            Self::RouteTo => "ROUTE_TO",
        }
    }

    /// Inverse of [`IrRelationKind::tag_value`].
    pub fn from_tag(tag: &str) -> Option<Self> {
        [
            Self::Generalization,
            Self::Realization,
            Self::Association,
            Self::Dependency,
            Self::Composition,
            Self::Aggregation,
            Self::Render,
            Self::Di,
            Self::TemplateUses,
            Self::RouteTo,
        ]
        .into_iter()
        .find(|k| k.tag_value() == tag)
    }

    /// Tag value for a relation carried as a dependency.
    pub fn tag_value(&self) -> &'static str {
        match self {
            Self::Generalization => "generalization",
            Self::Realization => "realization",
            Self::Association => "association",
            Self::Dependency => "dependency",
            Self::Composition => "composition",
            Self::Aggregation => "aggregation",
            Self::Render => "render",
            Self::Di => "di",
            Self::TemplateUses => "templateUses",
            Self::RouteTo => "routeTo",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrRelation {
    pub id: String,
    pub kind: IrRelationKind,
    pub source_id: String,
    pub target_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub stereotypes: Vec<IrStereotype>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stereotype_refs: Vec<IrStereotypeRef>,
    #[serde(default)]
    pub tagged_values: Vec<IrTaggedValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<IrSourceRef>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IrTypeRefKind {
    Named,
    Primitive,
    Generic,
    Array,
    Union,
    Intersection,
    #[default]
    Unknown,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrTypeRef {
    #[serde(default)]
    pub kind: IrTypeRefKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_args: Vec<IrTypeRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_type: Option<Box<IrTypeRef>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tagged_values: Vec<IrTaggedValue>,
}

impl IrTypeRef {
    pub fn named(name: &str) -> Self {
        Self {
            kind: IrTypeRefKind::Named,
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn primitive(name: &str) -> Self {
        Self {
            kind: IrTypeRefKind::Primitive,
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn void() -> Self {
        Self::primitive("void")
    }

    /// Named or primitive depending on the name.
    pub fn of_name(name: &str) -> Self {
        if is_primitive(name) {
            Self::primitive(name)
        } else {
            Self::named(name)
        }
    }

    /// Java-style type text, parseable by [`crate::syntax::TypeReference`].
    pub fn to_type_text(&self) -> String {
        let join = |sep: &str| {
            self.type_args
                .iter()
                .map(IrTypeRef::to_type_text)
                .collect::<Vec<_>>()
                .join(sep)
        };
        match self.kind {
            IrTypeRefKind::Named | IrTypeRefKind::Primitive => {
                self.name.clone().unwrap_or_else(|| "Object".to_string())
            }
            IrTypeRefKind::Generic => format!(
                "{}<{}>",
                self.name.as_deref().unwrap_or("Object"),
                join(", ")
            ),
            IrTypeRefKind::Array => match &self.element_type {
                Some(e) => format!("{}[]", e.to_type_text()),
                None => "Object[]".to_string(),
            },
            IrTypeRefKind::Union => join(" | "),
            IrTypeRefKind::Intersection => join(" & "),
            IrTypeRefKind::Unknown => self.name.clone().unwrap_or_else(|| "Object".to_string()),
        }
    }

    fn sort_key(&self) -> String {
        let base = format!("{:?}:{}", self.kind, self.name.as_deref().unwrap_or(""));
        if self.type_args.is_empty() {
            return base;
        }
        let args: Vec<String> = self.type_args.iter().map(IrTypeRef::sort_key).collect();
        format!("{base}<{},>", args.join(","))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrStereotype {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualified_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrStereotypeRef {
    pub stereotype_id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, serde_json::Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IrTaggedValue {
    pub key: String,
    pub value: String,
}

impl IrTaggedValue {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrSourceRef {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col: Option<u32>,
}

impl IrSourceRef {
    fn location(&self) -> Location {
        match self.line {
            Some(line) => Location::new(self.file.as_str(), line, self.col.unwrap_or(1)),
            None => Location::file_only(self.file.as_str()),
        }
    }
}

// ============================================================================
// READ / WRITE
// ============================================================================

impl IrModel {
    /// Parse and normalize an IR document.
    pub fn from_json(input: &[u8]) -> Result<Self, InterchangeError> {
        let model: IrModel = serde_json::from_slice(input)?;
        Ok(normalize(model))
    }

    /// Normalized, pretty-printed JSON with a trailing newline.
    pub fn to_json(&self) -> Result<String, InterchangeError> {
        let mut out = serde_json::to_string_pretty(&normalize(self.clone()))?;
        out.push('\n');
        Ok(out)
    }
}

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Sort every list of the document into its canonical order. Parameter
/// order is preserved.
pub fn normalize(mut model: IrModel) -> IrModel {
    model.tagged_values = normalize_tagged_values(model.tagged_values);

    for p in &mut model.packages {
        p.tagged_values = normalize_tagged_values(std::mem::take(&mut p.tagged_values));
    }
    model.packages.sort_by(|a, b| {
        (&a.qualified_name, &a.id, &a.name).cmp(&(&b.qualified_name, &b.id, &b.name))
    });

    for c in &mut model.classifiers {
        normalize_classifier(c);
    }
    model.classifiers.sort_by(|a, b| {
        (&a.qualified_name, &a.id, &a.name).cmp(&(&b.qualified_name, &b.id, &b.name))
    });

    for r in &mut model.relations {
        normalize_stereotypes(&mut r.stereotypes);
        r.tagged_values = normalize_tagged_values(std::mem::take(&mut r.tagged_values));
    }
    model.relations.sort_by(|a, b| {
        (a.kind.as_str(), &a.source_id, &a.target_id, &a.name, &a.id).cmp(&(
            b.kind.as_str(),
            &b.source_id,
            &b.target_id,
            &b.name,
            &b.id,
        ))
    });
    model
}

fn normalize_classifier(c: &mut IrClassifier) {
    normalize_stereotypes(&mut c.stereotypes);
    c.tagged_values = normalize_tagged_values(std::mem::take(&mut c.tagged_values));

    for a in &mut c.attributes {
        normalize_stereotypes(&mut a.stereotypes);
        a.tagged_values = normalize_tagged_values(std::mem::take(&mut a.tagged_values));
    }
    c.attributes
        .sort_by(|a, b| (&a.name, &a.id).cmp(&(&b.name, &b.id)));

    for o in &mut c.operations {
        normalize_stereotypes(&mut o.stereotypes);
        o.tagged_values = normalize_tagged_values(std::mem::take(&mut o.tagged_values));
        for p in &mut o.parameters {
            p.tagged_values = normalize_tagged_values(std::mem::take(&mut p.tagged_values));
        }
    }
    c.operations.sort_by(|a, b| {
        (&a.name, signature_key(a), &a.id).cmp(&(&b.name, signature_key(b), &b.id))
    });
}

fn signature_key(op: &IrOperation) -> String {
    op.parameters
        .iter()
        .map(|p| format!("{}:{};", p.name, p.type_ref.sort_key()))
        .collect()
}

fn normalize_stereotypes(stereotypes: &mut [IrStereotype]) {
    stereotypes.sort_by(|a, b| {
        (a.qualified_name.as_deref().unwrap_or(""), &a.name)
            .cmp(&(b.qualified_name.as_deref().unwrap_or(""), &b.name))
    });
}

fn tag_rank(key: &str) -> u8 {
    if key == TAG_FRAMEWORK {
        0
    } else if key.starts_with(RUNTIME_PREFIX) {
        1
    } else {
        2
    }
}

/// `framework` first, then `runtime.*` by key and value, then the rest by
/// key and value.
pub fn normalize_tagged_values(mut tags: Vec<IrTaggedValue>) -> Vec<IrTaggedValue> {
    tags.sort_by(|a, b| {
        (tag_rank(&a.key), &a.key, &a.value).cmp(&(tag_rank(&b.key), &b.key, &b.value))
    });
    tags
}

// ============================================================================
// IR → SOURCE UNITS
// ============================================================================

/// A relation the front-end model has no slot for; carried into the design
/// model as a tagged dependency.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CarriedRelation {
    pub kind: IrRelationKind,
    pub source: Arc<str>,
    pub target: Arc<str>,
    pub name: Option<Arc<str>>,
    pub tags: Vec<IrTaggedValue>,
}

/// Source units plus the relations carried alongside them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IrBridge {
    pub units: Vec<SourceUnit>,
    pub relations: Vec<CarriedRelation>,
}

/// Convert an IR document into front-end units. Generalizations and
/// realizations become `extends`/`implements`; every other relation kind is
/// carried as a [`CarriedRelation`]. Relations naming unknown ids are dropped.
pub fn to_source_units(model: &IrModel) -> IrBridge {
    let package_names: HashMap<&str, &str> = model
        .packages
        .iter()
        .map(|p| (p.id.as_str(), p.qualified_name.as_str()))
        .collect();
    let qualified_by_id: HashMap<&str, &str> = model
        .classifiers
        .iter()
        .map(|c| (c.id.as_str(), c.qualified_name.as_str()))
        .collect();

    // qualified name -> (package, file, decl)
    let mut decls: BTreeMap<&str, (String, String, TypeDecl)> = BTreeMap::new();
    for c in &model.classifiers {
        let package = c
            .package_id
            .as_deref()
            .and_then(|id| package_names.get(id).copied())
            .map(str::to_string)
            .unwrap_or_else(|| package_of(&c.qualified_name).unwrap_or("").to_string());
        let file = c
            .source
            .as_ref()
            .map(|s| s.file.clone())
            .unwrap_or_else(|| format!("ir:{package}"));
        decls.insert(c.qualified_name.as_str(), (package, file, classifier_decl(c)));
    }

    let mut carried = Vec::new();
    for r in &model.relations {
        let (Some(source), Some(target)) = (
            qualified_by_id.get(r.source_id.as_str()).copied(),
            qualified_by_id.get(r.target_id.as_str()).copied(),
        ) else {
            tracing::debug!("[IR] dropping relation {} with unknown endpoint", r.id);
            continue;
        };
        match (r.kind, decls.get_mut(source)) {
            (IrRelationKind::Generalization, Some((_, _, decl))) => {
                decl.extends.push(Arc::from(target));
            }
            (IrRelationKind::Realization, Some((_, _, decl))) => {
                decl.implements.push(Arc::from(target));
            }
            _ => carried.push(CarriedRelation {
                kind: r.kind,
                source: Arc::from(source),
                target: Arc::from(target),
                name: r.name.as_deref().map(Arc::from),
                tags: r.tagged_values.clone(),
            }),
        }
    }

    let units = decls
        .into_values()
        .map(|(package, file, decl)| SourceUnit::new(&file, &package).with_type(decl))
        .collect();
    IrBridge {
        units,
        relations: carried,
    }
}

fn classifier_decl(c: &IrClassifier) -> TypeDecl {
    let kind = match c.kind {
        IrClassifierKind::Interface => TypeKind::Interface,
        IrClassifierKind::Enum => TypeKind::Enum,
        IrClassifierKind::Record => TypeKind::Record,
        _ => TypeKind::Class,
    };
    let name = if c.name.is_empty() {
        simple_name(&c.qualified_name)
    } else {
        c.name.as_str()
    };
    let mut decl = TypeDecl::new(name, kind)
        .with_visibility(c.visibility.into());
    if let Some(source) = &c.source {
        decl = decl.with_location(source.location());
    }
    for s in &c.stereotypes {
        decl = decl.with_annotation(stereotype_evidence(s));
    }
    for a in &c.attributes {
        let mut field = FieldDecl::new(&a.name, &a.type_ref.to_type_text())
            .with_visibility(a.visibility.into())
            .with_static(a.is_static)
            .with_final(a.is_final);
        for s in &a.stereotypes {
            field = field.with_annotation(stereotype_evidence(s));
        }
        if let Some(source) = &a.source {
            field = field.with_location(source.location());
        }
        decl = decl.with_field(field);
    }
    for o in &c.operations {
        let mut op = if o.is_constructor {
            OperationDecl::constructor(&o.name)
        } else {
            OperationDecl::method(&o.name, &o.return_type.to_type_text())
        }
        .with_visibility(o.visibility.into())
        .with_static(o.is_static)
        .with_abstract(o.is_abstract);
        for p in &o.parameters {
            op = op.with_param(&p.name, &p.type_ref.to_type_text());
        }
        for s in &o.stereotypes {
            op = op.with_annotation(stereotype_evidence(s));
        }
        decl = decl.with_operation(op);
    }
    decl
}

fn stereotype_evidence(s: &IrStereotype) -> AnnotationEvidence {
    match &s.qualified_name {
        Some(q) => AnnotationEvidence::new(&s.name).with_qualified_name(q.as_str()),
        None => AnnotationEvidence::new(&s.name),
    }
}

// ============================================================================
// MODEL → IR
// ============================================================================

/// Export a built, identity-assigned model as a normalized IR document.
pub fn from_model(model: &Model) -> IrModel {
    let mut out = IrModel::default();
    collect(&model.root, None, None, &mut out);
    normalize(out)
}

fn id_of(element: &Element) -> String {
    element
        .id
        .as_ref()
        .map(|id| id.to_string())
        .unwrap_or_default()
}

fn ref_id(element: &Element, key: &str) -> Option<String> {
    match element.property(key) {
        Some(PropertyValue::Reference(r)) => r.id.as_ref().map(|id| id.to_string()),
        _ => None,
    }
}

fn string_prop<'e>(element: &'e Element, key: &str) -> Option<&'e str> {
    match element.property(key) {
        Some(PropertyValue::String(s)) => Some(s),
        _ => None,
    }
}

fn tags_of(element: &Element) -> Vec<IrTaggedValue> {
    element
        .tags
        .iter()
        .map(|(k, v)| IrTaggedValue::new(k, v))
        .collect()
}

fn visibility_of(element: &Element) -> IrVisibility {
    element.visibility.unwrap_or_default().into()
}

fn type_of(element: &Element) -> IrTypeRef {
    string_prop(element, props::TYPE_NAME)
        .map(IrTypeRef::of_name)
        .unwrap_or_default()
}

fn collect(
    element: &Element,
    package: Option<(&str, String)>,
    classifier: Option<&Element>,
    out: &mut IrModel,
) {
    match element.kind {
        ElementKind::Package => {
            let name = element.name.as_deref().unwrap_or("");
            let qualified = match &package {
                Some((parent, _)) if !parent.is_empty() => format!("{parent}.{name}"),
                _ => name.to_string(),
            };
            out.packages.push(IrPackage {
                id: id_of(element),
                name: name.to_string(),
                qualified_name: qualified.clone(),
                parent_id: package.as_ref().map(|(_, id)| id.clone()),
                tagged_values: tags_of(element),
            });
            let here = (qualified.as_str(), id_of(element));
            for child in &element.children {
                collect(child, Some((here.0, here.1.clone())), None, out);
            }
            return;
        }
        k if k.is_classifier() => {
            out.classifiers.push(classifier_of(element, package.as_ref()));
            for child in &element.children {
                collect(child, package.clone(), Some(element), out);
            }
            return;
        }
        ElementKind::Association => {
            if let (Some(source_id), Some(target_id)) = (
                ref_id(element, props::SOURCE),
                ref_id(element, props::TARGET),
            ) {
                let kind = if element.tag("aggregation") == Some("composite") {
                    IrRelationKind::Composition
                } else {
                    IrRelationKind::Association
                };
                out.relations.push(relation(element, kind, source_id, target_id));
            }
        }
        ElementKind::Generalization | ElementKind::InterfaceRealization => {
            let (kind, key) = if element.kind == ElementKind::Generalization {
                (IrRelationKind::Generalization, props::GENERAL)
            } else {
                (IrRelationKind::Realization, props::CONTRACT)
            };
            if let (Some(source), Some(target_id)) = (classifier, ref_id(element, key)) {
                out.relations
                    .push(relation(element, kind, id_of(source), target_id));
            }
        }
        ElementKind::Dependency => {
            if let (Some(source_id), Some(target_id)) = (
                ref_id(element, props::CLIENT),
                ref_id(element, props::SUPPLIER),
            ) {
                let kind = element
                    .tag(RELATION_KIND_TAG)
                    .and_then(IrRelationKind::from_tag)
                    .unwrap_or(IrRelationKind::Dependency);
                out.relations.push(relation(element, kind, source_id, target_id));
            }
        }
        _ => {}
    }
    for child in &element.children {
        collect(child, package.clone(), classifier, out);
    }
}

fn relation(element: &Element, kind: IrRelationKind, source_id: String, target_id: String) -> IrRelation {
    IrRelation {
        id: id_of(element),
        kind,
        source_id,
        target_id,
        name: element.name.as_deref().map(str::to_string),
        stereotypes: Vec::new(),
        stereotype_refs: Vec::new(),
        tagged_values: tags_of(element),
        source: None,
    }
}

fn classifier_of(element: &Element, package: Option<&(&str, String)>) -> IrClassifier {
    let kind = match element.kind {
        ElementKind::Interface => IrClassifierKind::Interface,
        ElementKind::Enumeration => IrClassifierKind::Enum,
        _ if string_prop(element, props::CLASSIFIER_KIND) == Some("record") => {
            IrClassifierKind::Record
        }
        _ => IrClassifierKind::Class,
    };
    let name = element.name.as_deref().unwrap_or("").to_string();
    let qualified = string_prop(element, props::QUALIFIED_NAME)
        .map(str::to_string)
        .unwrap_or_else(|| name.clone());

    let attributes = element
        .children
        .iter()
        .filter(|c| c.kind == ElementKind::Property)
        .map(|p| IrAttribute {
            id: Some(id_of(p)),
            name: p.name.as_deref().unwrap_or("").to_string(),
            visibility: visibility_of(p),
            is_static: p.is_static,
            is_final: p.property(props::IS_FINAL) == Some(&PropertyValue::Boolean(true)),
            type_ref: type_of(p),
            stereotypes: Vec::new(),
            tagged_values: tags_of(p),
            source: None,
        })
        .collect();

    let operations = element
        .children
        .iter()
        .filter(|c| c.kind == ElementKind::Operation)
        .map(|o| {
            let is_return =
                |p: &&Element| string_prop(p, props::DIRECTION) == Some("return");
            let params = o.children.iter().filter(|p| p.kind == ElementKind::Parameter);
            IrOperation {
                id: Some(id_of(o)),
                name: o.name.as_deref().unwrap_or("").to_string(),
                visibility: visibility_of(o),
                is_static: o.is_static,
                is_abstract: o.is_abstract,
                is_constructor: o.property(props::IS_CONSTRUCTOR)
                    == Some(&PropertyValue::Boolean(true)),
                return_type: params
                    .clone()
                    .find(is_return)
                    .map(type_of)
                    .unwrap_or_else(IrTypeRef::void),
                parameters: params
                    .filter(|p| !is_return(p))
                    .map(|p| IrParameter {
                        name: p.name.as_deref().unwrap_or("").to_string(),
                        type_ref: type_of(p),
                        tagged_values: Vec::new(),
                    })
                    .collect(),
                stereotypes: Vec::new(),
                tagged_values: tags_of(o),
                source: None,
            }
        })
        .collect();

    IrClassifier {
        id: id_of(element),
        name,
        qualified_name: qualified,
        package_id: package.map(|(_, id)| id.clone()),
        kind,
        visibility: visibility_of(element),
        attributes,
        operations,
        stereotypes: Vec::new(),
        stereotype_refs: Vec::new(),
        tagged_values: tags_of(element),
        source: None,
    }
}
