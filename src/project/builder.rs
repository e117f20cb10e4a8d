//! Design-model builder
//!
//! ```text
//! units ─► ProjectIndex ─► analyze (resolve, candidates, infer) ─► merge ─► emit ─► Model
//! ```
//!
//! Analysis runs per type in qualified-name order; emission happens after the
//! merge so every field already knows whether it is an association end. The
//! resulting model has logical keys but no ids yet: identities and the final
//! order are applied by the pipeline.
//!
//! Logical keys:
//!
//! | element                | key                                   |
//! |------------------------|---------------------------------------|
//! | package                | `Package:{qname}`                     |
//! | classifier             | `Classifier:{qname}`                  |
//! | field                  | `Field:{owner}#{name}`                |
//! | operation              | `Operation:{owner}#{signature}`       |
//! | enum literal           | `EnumLiteral:{owner}#{literal}`       |
//! | generalization         | `Generalization:{owner}->{general}`   |
//! | realization            | `Realization:{owner}->{contract}`     |
//! | dependency             | `Dependency:{client}->{supplier}`     |
//! | external stub          | `ExternalStub:{qname}`                |
//! | primitive type         | `Primitive:{name}`                    |

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use super::config::PipelineConfig;
use crate::base::{join_qualified, package_of, simple_name};
use crate::hir::{DiagnosticLog, ProjectIndex, ReferenceSite, ResolvedName, Resolver, ScopeContext};
use crate::interchange::ir::{CarriedRelation, RELATION_KIND_TAG};
use crate::interchange::model::{
    AnnotationApplication, Bounds, Element, ElementKind, ElementRef, Model, PropertyValue, props,
};
use crate::semantic::{
    AggregationKind, AssociationEdge, AssociationEnd, CandidateTarget, Inference, InferenceEngine,
    InferredRelationship, RelationshipCandidate, StructuralShape, merge_associations,
};
use crate::syntax::{
    AnnotationEvidence, FieldDecl, OperationDecl, SourceUnit, TypeDecl, TypeKind, TypeReference,
    is_primitive,
};

/// Root package of external stub classifiers.
pub const EXTERNAL_PACKAGE: &str = "_external";
/// Package holding primitive and built-in value types.
pub const PRIMITIVES_PACKAGE: &str = "_primitives";
/// Tag carrying the written type text when no element is referenced.
pub const TYPE_NAME_TAG: &str = "typeName";

/// Annotations in `java.lang`, visible without an import.
const JAVA_LANG_ANNOTATIONS: &[&str] = &[
    "Deprecated",
    "Override",
    "SuppressWarnings",
    "SafeVarargs",
    "FunctionalInterface",
];

pub fn classifier_key(qualified: &str) -> String {
    format!("Classifier:{qualified}")
}

pub fn field_key(owner: &str, field: &str) -> String {
    format!("Field:{owner}#{field}")
}

pub fn operation_key(owner: &str, signature: &str) -> String {
    format!("Operation:{owner}#{signature}")
}

pub fn package_key(qualified: &str) -> String {
    format!("Package:{qualified}")
}

pub fn stub_key(qualified: &str) -> String {
    format!("ExternalStub:{qualified}")
}

pub fn primitive_key(name: &str) -> String {
    format!("Primitive:{name}")
}

/// Best-effort qualified name of an annotation usage: as written if dotted,
/// then explicit import, `java.lang`, first wildcard import, same package.
pub fn qualify_annotation(scope: &ScopeContext<'_>, evidence: &AnnotationEvidence) -> Arc<str> {
    if let Some(q) = &evidence.qualified_name {
        return q.clone();
    }
    let simple: &str = &evidence.simple_name;
    if let Some(q) = scope.explicit_import(simple) {
        return q.clone();
    }
    if JAVA_LANG_ANNOTATIONS.contains(&simple) {
        return Arc::from(format!("java.lang.{simple}"));
    }
    if let Some(prefix) = scope.wildcards().first() {
        return Arc::from(join_qualified(prefix, simple));
    }
    Arc::from(join_qualified(scope.package(), simple))
}

// ============================================================================
// ANALYSIS
// ============================================================================

struct FieldAnalysis<'u> {
    decl: &'u FieldDecl,
    element_type: Option<ResolvedName>,
    inference: Inference,
}

struct OperationAnalysis<'u> {
    decl: &'u OperationDecl,
    params: Vec<Option<ResolvedName>>,
    return_type: Option<ResolvedName>,
}

struct Supertype {
    general: ResolvedName,
    realization: bool,
}

struct TypeAnalysis<'u> {
    qualified: Arc<str>,
    package: Arc<str>,
    decl: &'u TypeDecl,
    supertypes: Vec<Supertype>,
    fields: Vec<FieldAnalysis<'u>>,
    operations: Vec<OperationAnalysis<'u>>,
    /// Project types named in operation signatures.
    signature_types: BTreeSet<Arc<str>>,
    nested: Vec<TypeAnalysis<'u>>,
}

/// Per-invocation state shared by both passes.
struct BuildContext<'a> {
    config: &'a PipelineConfig,
    index: &'a ProjectIndex,
    engine: InferenceEngine,
    log: DiagnosticLog,
    relationships: Vec<InferredRelationship>,
    annotations: Vec<AnnotationApplication>,
    /// Member end → (association key, aggregation).
    ends: HashMap<(Arc<str>, Arc<str>), (String, AggregationKind)>,
    stubs: BTreeSet<Arc<str>>,
    primitives: BTreeSet<Arc<str>>,
}

impl<'a> BuildContext<'a> {
    fn analyze<'u>(
        &mut self,
        scope: &ScopeContext<'_>,
        decl: &'u TypeDecl,
        qualified: Arc<str>,
        enclosing: &[Arc<str>],
    ) -> TypeAnalysis<'u> {
        let mut chain = enclosing.to_vec();
        chain.push(qualified.clone());
        let resolver = Resolver::new(scope).with_chain(&chain);

        self.apply_annotations(scope, &classifier_key(&qualified), &decl.annotations);

        let mut supertypes = Vec::new();
        let realizes = decl.kind != TypeKind::Interface;
        let supers = decl
            .extends
            .iter()
            .map(|raw| (raw, "extends", false))
            .chain(decl.implements.iter().map(|raw| (raw, "implements", realizes)));
        for (raw, context, realization) in supers {
            let reference = TypeReference::parse_with_type_params(raw, &decl.type_params);
            let site = ReferenceSite {
                owner: &qualified,
                context,
                location: decl.location.as_ref(),
            };
            let resolution = resolver.resolve_reference(&reference, site, &mut self.log);
            if let Some(general) = resolution.primary {
                supertypes.push(Supertype {
                    general,
                    realization,
                });
            }
        }

        let mut fields = Vec::with_capacity(decl.fields.len());
        for field in &decl.fields {
            fields.push(self.analyze_field(&resolver, decl, &qualified, field));
            self.apply_annotations(
                scope,
                &field_key(&qualified, &field.name),
                &field.annotations,
            );
        }

        let mut operations = Vec::with_capacity(decl.operations.len());
        let mut signature_types = BTreeSet::new();
        for op in &decl.operations {
            let analysis = self.analyze_operation(&resolver, decl, &qualified, op);
            for resolved in analysis.params.iter().chain(std::iter::once(&analysis.return_type)) {
                if let Some(q) = resolved.as_ref().and_then(|r| r.qualified()) {
                    if self.index.contains(q) && *q != qualified {
                        signature_types.insert(q.clone());
                    }
                }
            }
            self.apply_annotations(
                scope,
                &operation_key(&qualified, &op.signature()),
                &op.annotations,
            );
            operations.push(analysis);
        }

        let nested = decl
            .nested
            .iter()
            .map(|inner| {
                let inner_q: Arc<str> = Arc::from(format!("{qualified}.{}", inner.name));
                self.analyze(scope, inner, inner_q, &chain)
            })
            .collect();

        TypeAnalysis {
            qualified,
            package: Arc::from(scope.package()),
            decl,
            supertypes,
            fields,
            operations,
            signature_types,
            nested,
        }
    }

    fn analyze_field<'u>(
        &mut self,
        resolver: &Resolver<'_>,
        owner: &TypeDecl,
        qualified: &Arc<str>,
        field: &'u FieldDecl,
    ) -> FieldAnalysis<'u> {
        let reference = TypeReference::parse_with_type_params(&field.type_text, &owner.type_params);
        let context = format!("field {}", field.name);
        let site = ReferenceSite {
            owner: qualified,
            context: &context,
            location: field.location.as_ref(),
        };
        let (written, element_type) = self.element_type(resolver, &reference, site);

        let target = element_type
            .as_ref()
            .and_then(|r| r.qualified())
            .filter(|q| self.index.contains(q))
            .map(|q| CandidateTarget {
                identity: q.clone(),
                composite: !matches!(
                    self.index.kind_of(q),
                    Some(TypeKind::Enum | TypeKind::Annotation)
                ),
            });

        let mut candidate = RelationshipCandidate::new(qualified, &field.name, reference)
            .with_annotations(field.annotations.clone())
            .with_transient(field.is_transient)
            .with_location(field.location.clone());
        if let Some(written) = written {
            candidate = candidate.with_target(&written, target);
        }
        let candidate = candidate.classified();

        let inference = self.engine.infer(&candidate, &mut self.log);
        if let Some(rel) = &inference.relationship {
            self.relationships.push(rel.clone());
        }
        FieldAnalysis {
            decl: field,
            element_type,
            inference,
        }
    }

    fn analyze_operation<'u>(
        &mut self,
        resolver: &Resolver<'_>,
        owner: &TypeDecl,
        qualified: &Arc<str>,
        op: &'u OperationDecl,
    ) -> OperationAnalysis<'u> {
        let type_params: Vec<Arc<str>> = owner
            .type_params
            .iter()
            .chain(op.type_params.iter())
            .cloned()
            .collect();
        let mut resolve = |text: &str, context: String| {
            let reference = TypeReference::parse_with_type_params(text, &type_params);
            let site = ReferenceSite {
                owner: qualified,
                context: &context,
                location: op.location.as_ref(),
            };
            self.element_type(resolver, &reference, site).1
        };

        let params = op
            .params
            .iter()
            .map(|p| resolve(&p.type_text, format!("parameter {} of {}", p.name, op.name)))
            .collect();
        let return_type = match &op.return_type {
            Some(text) if &**text != "void" => {
                resolve(text, format!("return of {}", op.name))
            }
            _ => None,
        };
        OperationAnalysis {
            decl: op,
            params,
            return_type,
        }
    }

    /// Resolve a reference and pick the type a member holds: the element of
    /// arrays, collections and optionals, a map's value, else the type itself.
    fn element_type(
        &mut self,
        resolver: &Resolver<'_>,
        reference: &TypeReference,
        site: ReferenceSite<'_>,
    ) -> (Option<Arc<str>>, Option<ResolvedName>) {
        let resolution = resolver.resolve_reference(reference, site, &mut self.log);
        let shape = StructuralShape::of(reference);
        let held = match shape {
            StructuralShape::Primitive => Some(reference),
            _ => shape.target(reference),
        };
        let Some(written) = held.and_then(|t| t.primary_name()) else {
            return (None, None);
        };
        let resolved = resolution.lookup(written).cloned().or_else(|| {
            is_primitive(written).then(|| ResolvedName::Qualified(Arc::from(written)))
        });
        (Some(Arc::from(written)), resolved)
    }

    fn apply_annotations(
        &mut self,
        scope: &ScopeContext<'_>,
        owner_key: &str,
        annotations: &[AnnotationEvidence],
    ) {
        if !self.config.include_annotations {
            return;
        }
        for evidence in annotations {
            let mut app =
                AnnotationApplication::new(ElementRef::to(owner_key), qualify_annotation(scope, evidence));
            for member in evidence.values.keys() {
                if let Some(value) = evidence.string_value(member) {
                    app = app.with_tag(member, value);
                }
            }
            self.annotations.push(app);
        }
    }

    // ------------------------------------------------------------------------
    // EMISSION
    // ------------------------------------------------------------------------

    /// Model element a resolved type points at, registering stubs and
    /// primitives on the way. `None` for unknown types.
    fn type_key(&mut self, resolved: &ResolvedName) -> Option<String> {
        match resolved {
            ResolvedName::Qualified(q) if self.index.contains(q) => Some(classifier_key(q)),
            ResolvedName::Qualified(q) => {
                let simple: Arc<str> = Arc::from(simple_name(q));
                let key = primitive_key(&simple);
                self.primitives.insert(simple);
                Some(key)
            }
            ResolvedName::ExternalStub(q) if self.config.include_external_stubs => {
                self.stubs.insert(q.clone());
                Some(stub_key(q))
            }
            _ => None,
        }
    }

    fn typed(&mut self, element: Element, text: &str, resolved: Option<&ResolvedName>) -> Element {
        let element = element.with_property(props::TYPE_NAME, text);
        match resolved.and_then(|r| self.type_key(r)) {
            Some(key) => element.with_property(props::TYPE, ElementRef::to(key)),
            // No element to point at; keep the written text visible in the output.
            None => element.with_tag(TYPE_NAME_TAG, text),
        }
    }

    fn emit_classifier(&mut self, t: &TypeAnalysis<'_>) -> Element {
        let decl = t.decl;
        let q = &t.qualified;
        let (kind, kind_name) = match decl.kind {
            TypeKind::Interface => (ElementKind::Interface, "interface"),
            TypeKind::Enum => (ElementKind::Enumeration, "enum"),
            TypeKind::Record => (ElementKind::Class, "record"),
            TypeKind::Annotation => (ElementKind::Class, "annotation"),
            TypeKind::Class => (ElementKind::Class, "class"),
        };
        let mut element = Element::new(kind)
            .with_name(decl.name.clone())
            .with_key(classifier_key(q))
            .with_visibility(decl.visibility.into())
            .with_abstract(decl.is_abstract)
            .with_property(props::QUALIFIED_NAME, &**q)
            .with_property(props::CLASSIFIER_KIND, kind_name);

        for sup in &t.supertypes {
            let Some(target) = self.type_key(&sup.general) else {
                continue;
            };
            if target == classifier_key(q) {
                continue;
            }
            let general = sup.general.name();
            element = element.with_child(if sup.realization {
                Element::new(ElementKind::InterfaceRealization)
                    .with_key(format!("Realization:{q}->{general}"))
                    .with_property(props::CONTRACT, ElementRef::to(target))
            } else {
                Element::new(ElementKind::Generalization)
                    .with_key(format!("Generalization:{q}->{general}"))
                    .with_property(props::GENERAL, ElementRef::to(target))
            });
        }

        for literal in &decl.enum_literals {
            element = element.with_child(
                Element::new(ElementKind::EnumerationLiteral)
                    .with_name(literal.clone())
                    .with_key(format!("EnumLiteral:{q}#{literal}")),
            );
        }

        for field in &t.fields {
            let property = self.emit_field(q, field);
            element = element.with_child(property);
        }

        if self.config.include_operations {
            for op in &t.operations {
                let operation = self.emit_operation(q, op);
                element = element.with_child(operation);
            }
        }

        for nested in &t.nested {
            let inner = self.emit_classifier(nested);
            element = element.with_child(inner);
        }
        element
    }

    fn emit_field(&mut self, owner: &Arc<str>, field: &FieldAnalysis<'_>) -> Element {
        let decl = field.decl;
        let multiplicity = &field.inference.multiplicity;
        let mut property = Element::new(ElementKind::Property)
            .with_name(decl.name.clone())
            .with_key(field_key(owner, &decl.name))
            .with_visibility(decl.visibility.into())
            .with_static(decl.is_static)
            .with_bounds(Bounds::from(multiplicity));
        property = self.typed(property, &decl.type_text, field.element_type.as_ref());
        if decl.is_final {
            property = property.with_property(props::IS_FINAL, true);
        }
        if let Some((association, aggregation)) =
            self.ends.get(&(owner.clone(), decl.name.clone())).cloned()
        {
            property = property.with_property(props::ASSOCIATION, ElementRef::to(association));
            if aggregation == AggregationKind::Composite {
                property = property.with_property(props::AGGREGATION, aggregation.as_str());
            }
        }
        property.with_tags(multiplicity.provenance.iter())
    }

    fn emit_operation(&mut self, owner: &Arc<str>, op: &OperationAnalysis<'_>) -> Element {
        let decl = op.decl;
        let mut element = Element::new(ElementKind::Operation)
            .with_name(decl.name.clone())
            .with_key(operation_key(owner, &decl.signature()))
            .with_visibility(decl.visibility.into())
            .with_static(decl.is_static)
            .with_abstract(decl.is_abstract);
        if decl.is_constructor {
            element = element.with_property(props::IS_CONSTRUCTOR, true);
        }
        for (param, resolved) in decl.params.iter().zip(&op.params) {
            let parameter = Element::new(ElementKind::Parameter).with_name(param.name.clone());
            let parameter = self.typed(parameter, &param.type_text, resolved.as_ref());
            element = element.with_child(parameter);
        }
        if let Some(text) = decl.return_type.as_deref().filter(|t| *t != "void") {
            let parameter = Element::new(ElementKind::Parameter)
                .with_name("return")
                .with_property(props::DIRECTION, "return");
            let parameter = self.typed(parameter, text, op.return_type.as_ref());
            element = element.with_child(parameter);
        }
        element
    }

    fn emit_association(&self, edge: &AssociationEdge) -> Element {
        let key = edge.logical_key();
        let end_ref = |end: &AssociationEnd| -> Option<ElementRef> {
            let owner = end.owner.as_deref()?;
            Some(ElementRef::to(field_key(owner, end.role_name.as_deref().unwrap_or(""))))
        };

        let mut association = Element::new(ElementKind::Association)
            .with_key(key.clone())
            .with_tags(edge.tags.iter())
            .with_tag(
                "aggregation",
                if edge.is_composite() { "composite" } else { "none" },
            );

        let mut member_ends = Vec::with_capacity(2);
        member_ends.extend(end_ref(&edge.end1));
        match end_ref(&edge.end2) {
            Some(r) => member_ends.push(r),
            None => {
                let owned_key = format!("{key}/ownedEnd");
                let mut owned = Element::new(ElementKind::Property)
                    .with_key(owned_key.clone())
                    .with_bounds(Bounds::from(&edge.end2.multiplicity))
                    .with_property(props::TYPE_NAME, &*edge.end2.type_identity)
                    .with_property(
                        props::TYPE,
                        ElementRef::to(classifier_key(&edge.end2.type_identity)),
                    )
                    .with_property(props::ASSOCIATION, ElementRef::to(key.clone()))
                    .with_tags(edge.end2.multiplicity.provenance.iter());
                if let Some(role) = &edge.end2.role_name {
                    owned = owned.with_name(role.clone());
                }
                association = association.with_child(owned);
                member_ends.push(ElementRef::to(owned_key));
            }
        }

        let source = edge
            .end1
            .owner
            .as_deref()
            .unwrap_or(&edge.end2.type_identity);
        association
            .with_property(props::MEMBER_END, PropertyValue::References(member_ends))
            .with_property(props::SOURCE, ElementRef::to(classifier_key(source)))
            .with_property(
                props::TARGET,
                ElementRef::to(classifier_key(&edge.end1.type_identity)),
            )
    }
}

fn dependency(client: &str, supplier: &str, key: String) -> Element {
    Element::new(ElementKind::Dependency)
        .with_key(key)
        .with_property(props::CLIENT, ElementRef::to(classifier_key(client)))
        .with_property(props::SUPPLIER, ElementRef::to(classifier_key(supplier)))
}

/// Build the nested package tree for `name` and everything below it.
fn package_element(
    name: &str,
    all: &BTreeSet<String>,
    contents: &mut BTreeMap<String, Vec<Element>>,
) -> Element {
    let mut package = Element::new(ElementKind::Package)
        .with_name(simple_name(name))
        .with_key(package_key(name));
    package.children.extend(contents.remove(name).unwrap_or_default());
    for child in all.iter().filter(|p| package_of(p) == Some(name)) {
        package.children.push(package_element(child, all, contents));
    }
    package
}

// ============================================================================
// BUILDER
// ============================================================================

/// Builds an unassigned design model from front-end units.
pub struct ModelBuilder<'c> {
    config: &'c PipelineConfig,
    carried: Vec<CarriedRelation>,
}

impl<'c> ModelBuilder<'c> {
    pub fn new(config: &'c PipelineConfig) -> Self {
        Self {
            config,
            carried: Vec::new(),
        }
    }

    /// Extra relations to emit as tagged dependencies (from IR input).
    pub fn with_carried_relations(mut self, relations: Vec<CarriedRelation>) -> Self {
        self.carried = relations;
        self
    }

    /// Build the model. Never fails; problems end up in `Model::diagnostics`.
    pub fn build(&self, units: &[SourceUnit]) -> Model {
        let index = ProjectIndex::build(units);
        let mut ctx = BuildContext {
            config: self.config,
            index: &index,
            engine: InferenceEngine::new(self.config.relationship_policy),
            log: DiagnosticLog::new(),
            relationships: Vec::new(),
            annotations: Vec::new(),
            ends: HashMap::new(),
            stubs: BTreeSet::new(),
            primitives: BTreeSet::new(),
        };

        // Pass 1. A type declared twice keeps the unit with the smallest path.
        let mut ordered: Vec<&SourceUnit> = units.iter().collect();
        ordered.sort_by(|a, b| a.path.cmp(&b.path));
        let mut types: BTreeMap<Arc<str>, TypeAnalysis<'_>> = BTreeMap::new();
        for unit in ordered {
            let scope = ScopeContext::for_unit(&index, unit);
            for decl in &unit.types {
                let qualified: Arc<str> = Arc::from(join_qualified(&unit.package, &decl.name));
                if types.contains_key(&qualified) {
                    tracing::debug!("[BUILD] duplicate type {qualified} in {}", unit.path);
                    continue;
                }
                let analysis = ctx.analyze(&scope, decl, qualified.clone(), &[]);
                types.insert(qualified, analysis);
            }
        }

        let relationships = std::mem::take(&mut ctx.relationships);
        let promoted = relationships.len();
        let edges = merge_associations(relationships, &mut ctx.log);
        for edge in &edges {
            for end in [&edge.end1, &edge.end2] {
                if let (Some(owner), Some(role)) = (&end.owner, &end.role_name) {
                    ctx.ends.insert(
                        (owner.clone(), role.clone()),
                        (edge.logical_key(), end.aggregation),
                    );
                }
            }
        }
        tracing::debug!(
            "[BUILD] {} types, {} relationships, {} associations ({} merged)",
            types.len(),
            promoted,
            edges.len(),
            edges.iter().filter(|e| e.merged).count()
        );

        // Pass 2.
        let mut contents: BTreeMap<String, Vec<Element>> = BTreeMap::new();
        let mut type_packages: HashMap<Arc<str>, Arc<str>> = HashMap::new();
        let mut associated: BTreeSet<(Arc<str>, Arc<str>)> = BTreeSet::new();
        for edge in &edges {
            if let Some(owner) = &edge.end1.owner {
                associated.insert((owner.clone(), edge.end1.type_identity.clone()));
            }
            if let Some(owner) = &edge.end2.owner {
                associated.insert((owner.clone(), edge.end2.type_identity.clone()));
            }
        }

        for t in types.values() {
            let classifier = ctx.emit_classifier(t);
            register_packages(t, &mut type_packages);
            let package = contents.entry(t.package.to_string()).or_default();
            package.push(classifier);
            for (client, supplier) in signature_dependencies(t, &associated) {
                package.push(dependency(
                    &client,
                    &supplier,
                    format!("Dependency:{client}->{supplier}"),
                ));
            }
        }

        for edge in &edges {
            let source = edge
                .end1
                .owner
                .as_deref()
                .unwrap_or(&edge.end2.type_identity);
            let package = package_for(source, &type_packages);
            let association = ctx.emit_association(edge);
            contents.entry(package).or_default().push(association);
        }

        for rel in &self.carried {
            let mut key = format!(
                "Dependency:{}->{}#{}",
                rel.source,
                rel.target,
                rel.kind.tag_value()
            );
            if let Some(name) = &rel.name {
                key.push(':');
                key.push_str(name);
            }
            let mut element = dependency(&rel.source, &rel.target, key)
                .with_tag(RELATION_KIND_TAG, rel.kind.tag_value());
            if let Some(name) = &rel.name {
                element = element.with_name(name.clone());
            }
            for tag in &rel.tags {
                element = element.with_tag(&tag.key, &tag.value);
            }
            contents
                .entry(package_for(&rel.source, &type_packages))
                .or_default()
                .push(element);
        }

        for stub in &ctx.stubs {
            let package = join_qualified(EXTERNAL_PACKAGE, package_of(stub).unwrap_or(""));
            contents.entry(package).or_default().push(
                Element::new(ElementKind::Class)
                    .with_name(simple_name(stub))
                    .with_key(stub_key(stub))
                    .with_property(props::QUALIFIED_NAME, &**stub)
                    .with_tag("external", "true"),
            );
        }
        for primitive in &ctx.primitives {
            contents
                .entry(PRIMITIVES_PACKAGE.to_string())
                .or_default()
                .push(
                    Element::new(ElementKind::PrimitiveType)
                        .with_name(primitive.clone())
                        .with_key(primitive_key(primitive)),
                );
        }
        tracing::debug!(
            "[BUILD] {} external stubs, {} primitive types",
            ctx.stubs.len(),
            ctx.primitives.len()
        );

        let mut model = Model::new(&self.config.model_name);
        model
            .root
            .children
            .extend(contents.remove("").unwrap_or_default());
        let mut all = BTreeSet::new();
        for name in contents.keys() {
            let mut current = Some(name.as_str());
            while let Some(p) = current {
                all.insert(p.to_string());
                current = package_of(p);
            }
        }
        for top in all.iter().filter(|p| package_of(p).is_none()) {
            let package = package_element(top, &all, &mut contents);
            model.root.children.push(package);
        }

        model.annotations = ctx.annotations;
        model.diagnostics = ctx.log.into_sorted();
        model
    }
}

fn register_packages(t: &TypeAnalysis<'_>, out: &mut HashMap<Arc<str>, Arc<str>>) {
    out.insert(t.qualified.clone(), t.package.clone());
    for nested in &t.nested {
        register_packages(nested, out);
    }
}

fn package_for(qualified: &str, type_packages: &HashMap<Arc<str>, Arc<str>>) -> String {
    type_packages
        .get(qualified)
        .map(|p| p.to_string())
        .unwrap_or_else(|| package_of(qualified).unwrap_or("").to_string())
}

/// Dependencies from a type (and its nested types) to project types in its
/// operation signatures that it is not already associated with.
fn signature_dependencies(
    t: &TypeAnalysis<'_>,
    associated: &BTreeSet<(Arc<str>, Arc<str>)>,
) -> Vec<(Arc<str>, Arc<str>)> {
    let mut out: Vec<(Arc<str>, Arc<str>)> = t
        .signature_types
        .iter()
        .filter(|target| !associated.contains(&(t.qualified.clone(), (*target).clone())))
        .map(|target| (t.qualified.clone(), target.clone()))
        .collect();
    for nested in &t.nested {
        out.extend(signature_dependencies(nested, associated));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::RelationshipPolicy;
    use crate::syntax::ImportDecl;

    fn shop() -> Vec<SourceUnit> {
        vec![
            SourceUnit::new("shop/Customer.java", "shop").with_type(
                TypeDecl::class("Customer")
                    .with_annotation(AnnotationEvidence::new("Entity"))
                    .with_field(FieldDecl::new("name", "String"))
                    .with_field(
                        FieldDecl::new("orders", "List<Order>").with_annotation(
                            AnnotationEvidence::new("OneToMany")
                                .with_value("mappedBy", "\"customer\""),
                        ),
                    ),
            ),
            SourceUnit::new("shop/Order.java", "shop")
                .with_import(ImportDecl::single("java.util.List"))
                .with_import(ImportDecl::single("javax.persistence.ManyToOne"))
                .with_type(
                    TypeDecl::class("Order")
                        .with_field(
                            FieldDecl::new("customer", "Customer")
                                .with_annotation(AnnotationEvidence::new("ManyToOne")),
                        )
                        .with_field(
                            FieldDecl::new("address", "Address")
                                .with_annotation(AnnotationEvidence::new("Embedded")),
                        )
                        .with_operation(
                            OperationDecl::method("ship", "void").with_param("to", "Warehouse"),
                        ),
                ),
            SourceUnit::new("shop/Address.java", "shop").with_type(TypeDecl::class("Address")),
            SourceUnit::new("shop/Warehouse.java", "shop")
                .with_type(TypeDecl::class("Warehouse")),
        ]
    }

    fn build(units: &[SourceUnit]) -> Model {
        ModelBuilder::new(&PipelineConfig::default()).build(units)
    }

    #[test]
    fn test_package_tree_and_classifiers() {
        let model = build(&shop());
        let shop = model.find_by_key("Package:shop").unwrap();
        assert_eq!(shop.name.as_deref(), Some("shop"));
        assert!(model.find_by_key("Classifier:shop.Order").is_some());
        assert!(model.find_by_key("Field:shop.Order#customer").is_some());
        assert!(model.find_by_key("Primitive:String").is_some());
    }

    #[test]
    fn test_mapped_by_pair_merges() {
        let model = build(&shop());
        let merged = model
            .find_by_key("Association:shop.Customer#orders<->shop.Order#customer")
            .unwrap();
        assert_eq!(merged.tag("bidirectional"), Some("true"));
        let orders = model.find_by_key("Field:shop.Customer#orders").unwrap();
        let bounds = orders.bounds.unwrap();
        assert_eq!((bounds.lower, bounds.upper), (0, -1));
        assert!(matches!(
            orders.property(props::ASSOCIATION),
            Some(PropertyValue::Reference(r)) if r.key.starts_with("Association:")
        ));
    }

    #[test]
    fn test_embedded_is_composite() {
        let model = build(&shop());
        let address = model.find_by_key("Field:shop.Order#address").unwrap();
        assert_eq!(
            address.property(props::AGGREGATION),
            Some(&PropertyValue::from("composite"))
        );
        let association = model
            .elements_of_kind(ElementKind::Association)
            .into_iter()
            .find(|a| a.tag("aggregation") == Some("composite"))
            .unwrap();
        let owned = &association.children[0];
        let bounds = owned.bounds.unwrap();
        assert_eq!((bounds.lower, bounds.upper), (1, 1));
    }

    #[test]
    fn test_signature_dependency() {
        let model = build(&shop());
        assert!(model.find_by_key("Dependency:shop.Order->shop.Warehouse").is_some());
        // Customer is associated, so no dependency even if it were in a signature.
        assert!(model.find_by_key("Dependency:shop.Order->shop.Customer").is_none());
    }

    #[test]
    fn test_external_stub_and_annotation_qualification() {
        let model = build(&shop());
        assert!(model.find_by_key("ExternalStub:java.util.List").is_none());
        let names: Vec<&str> = model.annotations.iter().map(|a| &*a.annotation).collect();
        assert!(names.contains(&"shop.Entity"));
        assert!(names.contains(&"javax.persistence.ManyToOne"));
    }

    #[test]
    fn test_policy_none_keeps_attributes() {
        let config = PipelineConfig::default().with_policy(RelationshipPolicy::None);
        let model = ModelBuilder::new(&config).build(&shop());
        assert!(model.elements_of_kind(ElementKind::Association).is_empty());
        let customer = model.find_by_key("Field:shop.Order#customer").unwrap();
        assert_eq!(customer.tag("relationSource"), Some("jpa"));
    }

    #[test]
    fn test_unreferenced_type_text_kept_as_tag() {
        let units = vec![
            SourceUnit::new("p/Repo.java", "p")
                .with_import(ImportDecl::single("org.lib.Clock"))
                .with_type(
                    TypeDecl::class("Repo")
                        .with_field(FieldDecl::new("thing", "Frobnicator"))
                        .with_field(FieldDecl::new("clock", "Clock"))
                        .with_field(FieldDecl::new("name", "String")),
                ),
        ];
        let model = build(&units);
        let thing = model.find_by_key("Field:p.Repo#thing").unwrap();
        assert!(thing.property(props::TYPE).is_none());
        assert_eq!(thing.tag(TYPE_NAME_TAG), Some("Frobnicator"));
        let name = model.find_by_key("Field:p.Repo#name").unwrap();
        assert_eq!(name.tag(TYPE_NAME_TAG), None);

        let config = PipelineConfig {
            include_external_stubs: false,
            ..PipelineConfig::default()
        };
        let model = ModelBuilder::new(&config).build(&units);
        let clock = model.find_by_key("Field:p.Repo#clock").unwrap();
        assert!(clock.property(props::TYPE).is_none());
        assert_eq!(clock.tag(TYPE_NAME_TAG), Some("Clock"));
    }

    #[test]
    fn test_generalization_and_stub() {
        let units = vec![
            SourceUnit::new("p/Repo.java", "p")
                .with_import(ImportDecl::single("org.lib.Base"))
                .with_type(TypeDecl::class("Repo").with_extends("Base")),
        ];
        let model = build(&units);
        let generalization = model.find_by_key("Generalization:p.Repo->org.lib.Base").unwrap();
        assert!(matches!(
            generalization.property(props::GENERAL),
            Some(PropertyValue::Reference(r)) if &*r.key == "ExternalStub:org.lib.Base"
        ));
        assert!(model.find_by_key("Package:_external.org.lib").is_some());
        assert_eq!(model.diagnostics.len(), 1);
    }
}
