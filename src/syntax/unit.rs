//! Front-end input model
//!
//! What an external parser hands over per source file: the package, ordered
//! imports, and declared types with their members. Type references are kept as
//! raw text; annotations are already split into [`AnnotationEvidence`].

use std::sync::Arc;

use crate::base::{Location, join_qualified};

use super::annotation::AnnotationEvidence;

/// Declared visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Visibility {
    Public,
    Protected,
    #[default]
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

/// Kind of a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TypeKind {
    #[default]
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

/// An import declaration, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    /// For wildcards, the prefix without the trailing `.*`.
    pub path: Arc<str>,
    pub wildcard: bool,
    pub is_static: bool,
}

impl ImportDecl {
    pub fn single(path: &str) -> Self {
        Self {
            path: Arc::from(path),
            wildcard: false,
            is_static: false,
        }
    }

    pub fn wildcard(prefix: &str) -> Self {
        Self {
            path: Arc::from(prefix),
            wildcard: true,
            is_static: false,
        }
    }

    /// Parse `import [static] a.b.C;` or `a.b.*`. The `import` keyword and
    /// semicolon are optional.
    pub fn parse(text: &str) -> Option<Self> {
        let mut rest = text.trim().trim_end_matches(';').trim();
        rest = rest.strip_prefix("import ").map(str::trim).unwrap_or(rest);
        let is_static = match rest.strip_prefix("static ") {
            Some(r) => {
                rest = r.trim();
                true
            }
            None => false,
        };
        let (path, wildcard) = match rest.strip_suffix(".*") {
            Some(prefix) => (prefix, true),
            None => (rest, false),
        };
        if path.is_empty() || !path.split('.').all(crate::base::is_identifier) {
            return None;
        }
        Some(Self {
            path: Arc::from(path),
            wildcard,
            is_static,
        })
    }
}

/// A field (or record component / enum-typed member).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: Arc<str>,
    pub type_text: Arc<str>,
    pub annotations: Vec<AnnotationEvidence>,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_final: bool,
    /// The `transient` modifier.
    pub is_transient: bool,
    pub location: Option<Location>,
}

impl FieldDecl {
    pub fn new(name: &str, type_text: &str) -> Self {
        Self {
            name: Arc::from(name),
            type_text: Arc::from(type_text),
            annotations: Vec::new(),
            visibility: Visibility::Private,
            is_static: false,
            is_final: false,
            is_transient: false,
            location: None,
        }
    }

    pub fn with_annotation(mut self, annotation: AnnotationEvidence) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_transient(mut self, is_transient: bool) -> Self {
        self.is_transient = is_transient;
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn with_final(mut self, is_final: bool) -> Self {
        self.is_final = is_final;
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

/// An operation parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDecl {
    pub name: Arc<str>,
    pub type_text: Arc<str>,
}

impl ParamDecl {
    pub fn new(name: &str, type_text: &str) -> Self {
        Self {
            name: Arc::from(name),
            type_text: Arc::from(type_text),
        }
    }
}

/// A method or constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDecl {
    pub name: Arc<str>,
    /// `None` for constructors.
    pub return_type: Option<Arc<str>>,
    pub params: Vec<ParamDecl>,
    pub annotations: Vec<AnnotationEvidence>,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_constructor: bool,
    pub type_params: Vec<Arc<str>>,
    pub location: Option<Location>,
}

impl OperationDecl {
    pub fn method(name: &str, return_type: &str) -> Self {
        Self {
            name: Arc::from(name),
            return_type: Some(Arc::from(return_type)),
            params: Vec::new(),
            annotations: Vec::new(),
            visibility: Visibility::Public,
            is_static: false,
            is_abstract: false,
            is_constructor: false,
            type_params: Vec::new(),
            location: None,
        }
    }

    pub fn constructor(name: &str) -> Self {
        Self {
            return_type: None,
            is_constructor: true,
            ..Self::method(name, "void")
        }
    }

    pub fn with_param(mut self, name: &str, type_text: &str) -> Self {
        self.params.push(ParamDecl::new(name, type_text));
        self
    }

    pub fn with_annotation(mut self, annotation: AnnotationEvidence) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn with_abstract(mut self, is_abstract: bool) -> Self {
        self.is_abstract = is_abstract;
        self
    }

    pub fn with_type_param(mut self, name: &str) -> Self {
        self.type_params.push(Arc::from(name));
        self
    }

    /// `name(T1,T2)` using raw parameter text; used for ordering and keys.
    pub fn signature(&self) -> String {
        let params: Vec<&str> = self.params.iter().map(|p| p.type_text.as_ref()).collect();
        format!("{}({})", self.name, params.join(","))
    }
}

/// A declared type, possibly with nested types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub name: Arc<str>,
    pub kind: TypeKind,
    pub visibility: Visibility,
    pub is_abstract: bool,
    pub type_params: Vec<Arc<str>>,
    pub extends: Vec<Arc<str>>,
    pub implements: Vec<Arc<str>>,
    pub fields: Vec<FieldDecl>,
    pub operations: Vec<OperationDecl>,
    pub annotations: Vec<AnnotationEvidence>,
    pub enum_literals: Vec<Arc<str>>,
    pub nested: Vec<TypeDecl>,
    pub location: Option<Location>,
}

impl TypeDecl {
    pub fn new(name: &str, kind: TypeKind) -> Self {
        Self {
            name: Arc::from(name),
            kind,
            visibility: Visibility::Public,
            is_abstract: false,
            type_params: Vec::new(),
            extends: Vec::new(),
            implements: Vec::new(),
            fields: Vec::new(),
            operations: Vec::new(),
            annotations: Vec::new(),
            enum_literals: Vec::new(),
            nested: Vec::new(),
            location: None,
        }
    }

    pub fn class(name: &str) -> Self {
        Self::new(name, TypeKind::Class)
    }

    pub fn interface(name: &str) -> Self {
        Self::new(name, TypeKind::Interface)
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_abstract(mut self, is_abstract: bool) -> Self {
        self.is_abstract = is_abstract;
        self
    }

    pub fn with_type_param(mut self, name: &str) -> Self {
        self.type_params.push(Arc::from(name));
        self
    }

    pub fn with_extends(mut self, raw: &str) -> Self {
        self.extends.push(Arc::from(raw));
        self
    }

    pub fn with_implements(mut self, raw: &str) -> Self {
        self.implements.push(Arc::from(raw));
        self
    }

    pub fn with_field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_operation(mut self, operation: OperationDecl) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn with_annotation(mut self, annotation: AnnotationEvidence) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn with_enum_literal(mut self, literal: &str) -> Self {
        self.enum_literals.push(Arc::from(literal));
        self
    }

    pub fn with_nested(mut self, nested: TypeDecl) -> Self {
        self.nested.push(nested);
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

/// One parsed source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub path: Arc<str>,
    /// Empty for the default package.
    pub package: Arc<str>,
    pub imports: Vec<ImportDecl>,
    pub types: Vec<TypeDecl>,
}

impl SourceUnit {
    pub fn new(path: &str, package: &str) -> Self {
        Self {
            path: Arc::from(path),
            package: Arc::from(package),
            imports: Vec::new(),
            types: Vec::new(),
        }
    }

    pub fn with_import(mut self, import: ImportDecl) -> Self {
        self.imports.push(import);
        self
    }

    pub fn with_type(mut self, decl: TypeDecl) -> Self {
        self.types.push(decl);
        self
    }

    /// Walk every declared type depth-first with its qualified name and the
    /// qualified names of its enclosing types (outermost first).
    pub fn walk_types<'a>(&'a self, mut visit: impl FnMut(&'a TypeDecl, &str, &[Arc<str>])) {
        fn go<'a>(
            decl: &'a TypeDecl,
            qualified: String,
            chain: &mut Vec<Arc<str>>,
            visit: &mut impl FnMut(&'a TypeDecl, &str, &[Arc<str>]),
        ) {
            visit(decl, &qualified, chain);
            chain.push(Arc::from(qualified.as_str()));
            for nested in &decl.nested {
                go(nested, format!("{qualified}.{}", nested.name), chain, visit);
            }
            chain.pop();
        }

        let mut chain = Vec::new();
        for decl in &self.types {
            go(
                decl,
                join_qualified(&self.package, &decl.name),
                &mut chain,
                &mut visit,
            );
        }
    }
}
