//! Design-model object graph.
//!
//! The builder produces this tree; the identity assigner fills in `id`s, the
//! canonical pass fixes every order, and serializers write it as-is.
//!
//! ```text
//! Model
//! ├── root: Element (Model)
//! │   └── Package → Class/Interface/Enumeration → Property/Operation/...
//! ├── annotations: Vec<AnnotationApplication>   (injected, cross-cutting)
//! └── diagnostics: Vec<Diagnostic>              (not serialized to XMI)
//! ```
//!
//! Cross references are [`ElementRef`]s naming the target's logical key; the
//! identity assigner resolves them to ids.

use indexmap::IndexMap;
use std::sync::Arc;

use crate::hir::Diagnostic;

// ============================================================================
// IDs
// ============================================================================

/// Stable identifier of a model element (`xmi:id`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub Arc<str>);

impl ElementId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ElementId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Reference to another element by logical key, resolved to an id later.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ElementRef {
    pub key: Arc<str>,
    pub id: Option<ElementId>,
}

impl ElementRef {
    pub fn to(key: impl Into<Arc<str>>) -> Self {
        Self {
            key: key.into(),
            id: None,
        }
    }
}

// ============================================================================
// ELEMENT KINDS
// ============================================================================

/// The UML metaclass of an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    Model,
    Package,
    Class,
    Interface,
    Enumeration,
    PrimitiveType,
    EnumerationLiteral,
    Property,
    Operation,
    Parameter,
    Generalization,
    InterfaceRealization,
    Association,
    Dependency,
}

impl ElementKind {
    /// `xmi:type` value.
    pub fn xmi_type(&self) -> &'static str {
        match self {
            Self::Model => "uml:Model",
            Self::Package => "uml:Package",
            Self::Class => "uml:Class",
            Self::Interface => "uml:Interface",
            Self::Enumeration => "uml:Enumeration",
            Self::PrimitiveType => "uml:PrimitiveType",
            Self::EnumerationLiteral => "uml:EnumerationLiteral",
            Self::Property => "uml:Property",
            Self::Operation => "uml:Operation",
            Self::Parameter => "uml:Parameter",
            Self::Generalization => "uml:Generalization",
            Self::InterfaceRealization => "uml:InterfaceRealization",
            Self::Association => "uml:Association",
            Self::Dependency => "uml:Dependency",
        }
    }

    /// Short tag used in containment paths.
    pub fn path_tag(&self) -> &'static str {
        self.xmi_type().trim_start_matches("uml:")
    }

    /// Containment feature name the element is written under.
    pub fn containment_feature(&self) -> &'static str {
        match self {
            Self::Model | Self::Package => "packagedElement",
            Self::Class | Self::Interface | Self::Enumeration | Self::PrimitiveType => {
                "packagedElement"
            }
            Self::Association | Self::Dependency => "packagedElement",
            Self::EnumerationLiteral => "ownedLiteral",
            Self::Property => "ownedAttribute",
            Self::Operation => "ownedOperation",
            Self::Parameter => "ownedParameter",
            Self::Generalization => "generalization",
            Self::InterfaceRealization => "interfaceRealization",
        }
    }

    pub fn is_classifier(&self) -> bool {
        matches!(
            self,
            Self::Class | Self::Interface | Self::Enumeration | Self::PrimitiveType
        )
    }

    pub fn is_relationship(&self) -> bool {
        matches!(
            self,
            Self::Generalization
                | Self::InterfaceRealization
                | Self::Association
                | Self::Dependency
        )
    }

    /// Position of this kind among a package's children: packages, then
    /// classifiers, then relationships.
    pub fn package_rank(&self) -> u8 {
        match self {
            Self::Model | Self::Package => 0,
            k if k.is_classifier() => 1,
            Self::Association => 2,
            Self::Dependency => 3,
            _ => 4,
        }
    }
}

/// Visibility of an element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Package,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Package => "package",
            Visibility::Private => "private",
        }
    }
}

impl From<crate::syntax::Visibility> for Visibility {
    fn from(v: crate::syntax::Visibility) -> Self {
        match v {
            crate::syntax::Visibility::Public => Visibility::Public,
            crate::syntax::Visibility::Protected => Visibility::Protected,
            crate::syntax::Visibility::Package => Visibility::Package,
            crate::syntax::Visibility::Private => Visibility::Private,
        }
    }
}

/// A property value stored on an element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertyValue {
    String(Arc<str>),
    Integer(i64),
    Boolean(bool),
    Reference(ElementRef),
    References(Vec<ElementRef>),
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::String(s.into())
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<ElementRef> for PropertyValue {
    fn from(r: ElementRef) -> Self {
        Self::Reference(r)
    }
}

/// Property keys shared by the builder and the writers. Keys starting with
/// `_` are internal and never written to XMI.
pub mod props {
    pub const TYPE: &str = "type";
    pub const GENERAL: &str = "general";
    pub const CONTRACT: &str = "contract";
    pub const CLIENT: &str = "client";
    pub const SUPPLIER: &str = "supplier";
    pub const MEMBER_END: &str = "memberEnd";
    pub const ASSOCIATION: &str = "association";
    pub const AGGREGATION: &str = "aggregation";
    pub const DIRECTION: &str = "direction";
    /// Type as written or qualified, kept even when `type` resolves.
    pub const TYPE_NAME: &str = "_typeName";
    pub const QUALIFIED_NAME: &str = "_qualifiedName";
    pub const CLASSIFIER_KIND: &str = "_classifierKind";
    /// Association source classifier (end 1 owner) and target.
    pub const SOURCE: &str = "_source";
    pub const TARGET: &str = "_target";
    pub const IS_FINAL: &str = "_isFinal";
    pub const IS_CONSTRUCTOR: &str = "_isConstructor";
}

/// Multiplicity bounds as written: `upper = -1` is unbounded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Bounds {
    pub lower: u32,
    pub upper: i64,
}

impl From<&crate::semantic::MultiplicityResult> for Bounds {
    fn from(m: &crate::semantic::MultiplicityResult) -> Self {
        Self {
            lower: m.lower,
            upper: m.upper.as_i64(),
        }
    }
}

// ============================================================================
// ELEMENT
// ============================================================================

/// A model element and its owned children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    /// Assigned by the identity assigner.
    pub id: Option<ElementId>,
    pub kind: ElementKind,
    pub name: Option<Arc<str>>,
    /// Explicit identity key; wins over the containment path.
    pub logical_key: Option<Arc<str>>,
    pub visibility: Option<Visibility>,
    pub is_abstract: bool,
    pub is_static: bool,
    pub bounds: Option<Bounds>,
    /// Metaclass attributes and references (IndexMap keeps insertion order).
    pub properties: IndexMap<Arc<str>, PropertyValue>,
    /// Provenance and inference tags.
    pub tags: IndexMap<Arc<str>, Arc<str>>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            id: None,
            kind,
            name: None,
            logical_key: None,
            visibility: None,
            is_abstract: false,
            is_static: false,
            bounds: None,
            properties: IndexMap::new(),
            tags: IndexMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<Arc<str>>) -> Self {
        self.logical_key = Some(key.into());
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn with_abstract(mut self, is_abstract: bool) -> Self {
        self.is_abstract = is_abstract;
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_property(mut self, key: &str, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(Arc::from(key), value.into());
        self
    }

    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(Arc::from(key), Arc::from(value));
        self
    }

    pub fn with_tags<'t>(
        mut self,
        tags: impl IntoIterator<Item = (&'t Arc<str>, &'t Arc<str>)>,
    ) -> Self {
        for (k, v) in tags {
            self.tags.insert(k.clone(), v.clone());
        }
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(|v| v.as_ref())
    }

    /// Visit this element and all descendants depth-first, parents first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Element)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// First descendant (or self) with the given logical key.
    pub fn find_by_key(&self, key: &str) -> Option<&Element> {
        if self.logical_key.as_deref() == Some(key) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_by_key(key))
    }
}

// ============================================================================
// ANNOTATIONS AND MODEL
// ============================================================================

/// One source annotation usage applied to a model element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnotationApplication {
    pub id: Option<ElementId>,
    pub owner: ElementRef,
    /// Qualified name when known, otherwise the simple name.
    pub annotation: Arc<str>,
    /// Member values as written.
    pub tags: IndexMap<Arc<str>, Arc<str>>,
}

impl AnnotationApplication {
    pub fn new(owner: ElementRef, annotation: impl Into<Arc<str>>) -> Self {
        Self {
            id: None,
            owner,
            annotation: annotation.into(),
            tags: IndexMap::new(),
        }
    }

    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(Arc::from(key), Arc::from(value));
        self
    }

    /// Logical key; `occurrence` separates repeated annotations on one owner.
    pub fn logical_key(&self, occurrence: usize) -> String {
        format!("Annotation:{}@{}#{occurrence}", self.owner.key, self.annotation)
    }
}

/// A complete design model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Model {
    pub name: Arc<str>,
    pub root: Element,
    pub annotations: Vec<AnnotationApplication>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Model {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            root: Element::new(ElementKind::Model)
                .with_name(name)
                .with_key(format!("Model:{name}")),
            annotations: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// All elements, depth-first.
    pub fn elements(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        self.root.walk(&mut |e| out.push(e));
        out
    }

    pub fn element_count(&self) -> usize {
        self.elements().len()
    }

    pub fn find_by_key(&self, key: &str) -> Option<&Element> {
        self.root.find_by_key(key)
    }

    /// Elements of one kind, depth-first.
    pub fn elements_of_kind(&self, kind: ElementKind) -> Vec<&Element> {
        self.elements()
            .into_iter()
            .filter(|e| e.kind == kind)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_builder() {
        let class = Element::new(ElementKind::Class)
            .with_name("Order")
            .with_key("Class:p.Order")
            .with_visibility(Visibility::Public)
            .with_tag("stereotype", "Entity");

        assert_eq!(class.name.as_deref(), Some("Order"));
        assert_eq!(class.logical_key.as_deref(), Some("Class:p.Order"));
        assert_eq!(class.tag("stereotype"), Some("Entity"));
        assert!(class.id.is_none());
    }

    #[test]
    fn test_model_walk_and_lookup() {
        let mut model = Model::new("Shop");
        model.root.children.push(
            Element::new(ElementKind::Package)
                .with_name("p")
                .with_key("Package:p")
                .with_child(
                    Element::new(ElementKind::Class)
                        .with_name("Order")
                        .with_key("Class:p.Order"),
                ),
        );

        assert_eq!(model.element_count(), 3);
        assert!(model.find_by_key("Class:p.Order").is_some());
        assert_eq!(model.elements_of_kind(ElementKind::Package).len(), 1);
    }

    #[test]
    fn test_kind_metadata() {
        assert_eq!(ElementKind::Class.xmi_type(), "uml:Class");
        assert_eq!(ElementKind::Property.path_tag(), "Property");
        assert_eq!(ElementKind::Property.containment_feature(), "ownedAttribute");
        assert!(ElementKind::Enumeration.is_classifier());
        assert!(ElementKind::Dependency.is_relationship());
        assert!(ElementKind::Package.package_rank() < ElementKind::Class.package_rank());
    }

    #[test]
    fn test_annotation_key_includes_occurrence() {
        let app = AnnotationApplication::new(ElementRef::to("Class:p.Order"), "jakarta.persistence.Entity");
        assert_eq!(
            app.logical_key(0),
            "Annotation:Class:p.Order@jakarta.persistence.Entity#0"
        );
    }
}
