//! Syntax: the front-end input model
//!
//! Source text is parsed elsewhere; this module holds what the front end hands
//! over (units, types, members, imports), the [`TypeReference`] shape parsed from
//! raw type text, and [`AnnotationEvidence`] for each annotation usage.

mod annotation;
mod lexer;
mod type_ref;
mod unit;

pub use annotation::{AnnotationEvidence, MalformedLiteral, VALUE_MEMBER};
pub use lexer::{Lexer, Token, TokenKind, tokenize};
pub use type_ref::{PRIMITIVES, TypeReference, TypeShape, WildcardBound, is_primitive};
pub use unit::{
    FieldDecl, ImportDecl, OperationDecl, ParamDecl, SourceUnit, TypeDecl, TypeKind, Visibility,
};
