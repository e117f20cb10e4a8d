//! Type references
//!
//! A [`TypeReference`] is the parsed shape of a raw Java type text as handed over
//! by the front end. The raw text is always kept next to the shape so diagnostics
//! and the design model can show exactly what the source said.

use std::fmt;
use std::sync::Arc;

use crate::base::normalize_binary_name;

use super::lexer::{Token, TokenKind, tokenize};

/// Java primitive type keywords (plus `void` and the local `var`).
pub const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void", "var",
];

/// Is `name` a primitive keyword?
pub fn is_primitive(name: &str) -> bool {
    PRIMITIVES.contains(&name)
}

/// Wildcard bound direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WildcardBound {
    None,
    Extends,
    Super,
}

/// Tagged shape of a type reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    Primitive(Arc<str>),
    /// Simple or dotted name, `$` already normalized to `.`.
    Named(Arc<str>),
    Generic {
        base: Arc<str>,
        args: Vec<TypeReference>,
    },
    Array {
        element: Box<TypeReference>,
        dims: u32,
    },
    Wildcard {
        bound: WildcardBound,
        bound_type: Option<Box<TypeReference>>,
    },
    TypeVariable(Arc<str>),
    Union(Vec<TypeReference>),
    Intersection(Vec<TypeReference>),
}

/// A parsed type reference with its verbatim source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeReference {
    pub raw: Arc<str>,
    pub shape: TypeShape,
}

impl TypeReference {
    /// Parse raw type text with no type parameters in scope.
    pub fn parse(raw: &str) -> Self {
        Self::parse_with_type_params::<&str>(raw, &[])
    }

    /// Parse raw type text; single-segment names listed in `type_params` become
    /// [`TypeShape::TypeVariable`].
    ///
    /// Parsing never fails. Text the parser cannot make sense of is kept as a
    /// `Named` reference carrying the trimmed raw text, which the resolver will
    /// classify as unknown.
    pub fn parse_with_type_params<S: AsRef<str>>(raw: &str, type_params: &[S]) -> Self {
        let text = raw.trim();
        let tokens = tokenize(text);
        let params: Vec<&str> = type_params.iter().map(|p| p.as_ref()).collect();
        let mut parser = RefParser {
            text,
            tokens: &tokens,
            pos: 0,
            type_params: &params,
        };
        match parser.parse_type() {
            Some(mut parsed) if parser.at_end() => {
                parsed.raw = Arc::from(text);
                parsed
            }
            _ => Self {
                raw: Arc::from(text),
                shape: TypeShape::Named(Arc::from(text)),
            },
        }
    }

    pub fn named(name: &str) -> Self {
        Self {
            raw: Arc::from(name),
            shape: TypeShape::Named(Arc::from(normalize_binary_name(name).as_ref())),
        }
    }

    /// The outermost nameable type, if any.
    ///
    /// Arrays report their element, wildcards their bound, unions and
    /// intersections their first variant. Type variables and unbounded
    /// wildcards have none.
    pub fn primary_name(&self) -> Option<&str> {
        match &self.shape {
            TypeShape::Primitive(name) | TypeShape::Named(name) => Some(name),
            TypeShape::Generic { base, .. } => Some(base),
            TypeShape::Array { element, .. } => element.primary_name(),
            TypeShape::Wildcard { bound_type, .. } => {
                bound_type.as_ref().and_then(|b| b.primary_name())
            }
            TypeShape::TypeVariable(_) => None,
            TypeShape::Union(variants) | TypeShape::Intersection(variants) => {
                variants.first().and_then(|v| v.primary_name())
            }
        }
    }

    /// Every nameable base name in the reference, in first-seen order, without
    /// duplicates. Primitives and type variables are skipped.
    pub fn base_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_base_names(&mut out);
        out
    }

    fn collect_base_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        fn push<'a>(name: &'a str, out: &mut Vec<&'a str>) {
            if !out.contains(&name) {
                out.push(name);
            }
        }
        match &self.shape {
            TypeShape::Primitive(_) | TypeShape::TypeVariable(_) => {}
            TypeShape::Named(name) => push(name, out),
            TypeShape::Generic { base, args } => {
                push(base, out);
                for arg in args {
                    arg.collect_base_names(out);
                }
            }
            TypeShape::Array { element, .. } => element.collect_base_names(out),
            TypeShape::Wildcard { bound_type, .. } => {
                if let Some(b) = bound_type {
                    b.collect_base_names(out);
                }
            }
            TypeShape::Union(variants) | TypeShape::Intersection(variants) => {
                for v in variants {
                    v.collect_base_names(out);
                }
            }
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self.shape, TypeShape::Primitive(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.shape, TypeShape::Array { .. })
    }

    /// Generic arguments, empty for non-generic shapes.
    pub fn type_args(&self) -> &[TypeReference] {
        match &self.shape {
            TypeShape::Generic { args, .. } => args,
            _ => &[],
        }
    }

    /// For wildcards, the bound type; otherwise `self`.
    pub fn unwrap_wildcard(&self) -> Option<&TypeReference> {
        match &self.shape {
            TypeShape::Wildcard { bound_type, .. } => bound_type.as_deref(),
            _ => Some(self),
        }
    }
}

impl fmt::Display for TypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// ============================================================================
// PARSER
// ============================================================================

struct RefParser<'t, 's> {
    text: &'s str,
    tokens: &'t [Token<'s>],
    pos: usize,
    type_params: &'t [&'t str],
}

impl<'s> RefParser<'_, 's> {
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    fn bump(&mut self) -> Option<Token<'s>> {
        let token = self.tokens.get(self.pos).copied();
        self.pos += 1;
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn start_offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|t| t.offset)
            .unwrap_or(self.text.len())
    }

    fn end_offset(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.end())
            .unwrap_or(0)
    }

    fn finish(&self, start: usize, shape: TypeShape) -> TypeReference {
        let end = self.end_offset().max(start);
        TypeReference {
            raw: Arc::from(self.text[start..end].trim()),
            shape,
        }
    }

    /// type := intersection ('|' intersection)*
    fn parse_type(&mut self) -> Option<TypeReference> {
        let start = self.start_offset();
        let first = self.parse_intersection()?;
        if self.peek() != Some(TokenKind::Pipe) {
            return Some(first);
        }
        let mut variants = vec![first];
        while self.eat(TokenKind::Pipe) {
            variants.push(self.parse_intersection()?);
        }
        Some(self.finish(start, TypeShape::Union(variants)))
    }

    /// intersection := postfix ('&' postfix)*
    fn parse_intersection(&mut self) -> Option<TypeReference> {
        let start = self.start_offset();
        let first = self.parse_postfix()?;
        if self.peek() != Some(TokenKind::Amp) {
            return Some(first);
        }
        let mut variants = vec![first];
        while self.eat(TokenKind::Amp) {
            variants.push(self.parse_postfix()?);
        }
        Some(self.finish(start, TypeShape::Intersection(variants)))
    }

    /// postfix := primary ('[' ']')* '...'?
    fn parse_postfix(&mut self) -> Option<TypeReference> {
        self.skip_type_annotations();
        let start = self.start_offset();
        let element = self.parse_primary()?;
        let mut dims = 0u32;
        loop {
            self.skip_type_annotations();
            if self.peek() == Some(TokenKind::LBracket) {
                self.bump();
                if !self.eat(TokenKind::RBracket) {
                    return None;
                }
                dims += 1;
            } else if self.eat(TokenKind::Ellipsis) {
                dims += 1;
            } else {
                break;
            }
        }
        if dims == 0 {
            return Some(element);
        }
        Some(self.finish(
            start,
            TypeShape::Array {
                element: Box::new(element),
                dims,
            },
        ))
    }

    fn parse_primary(&mut self) -> Option<TypeReference> {
        let start = self.start_offset();
        if self.eat(TokenKind::Question) {
            let bound = match self.peek() {
                Some(TokenKind::Extends) => WildcardBound::Extends,
                Some(TokenKind::Super) => WildcardBound::Super,
                _ => WildcardBound::None,
            };
            let bound_type = if bound == WildcardBound::None {
                None
            } else {
                self.bump();
                Some(Box::new(self.parse_type()?))
            };
            return Some(self.finish(start, TypeShape::Wildcard { bound, bound_type }));
        }

        let name = self.parse_qualified_name()?;
        if self.peek() == Some(TokenKind::Lt) {
            self.bump();
            let mut args = Vec::new();
            if !self.eat(TokenKind::Gt) {
                loop {
                    args.push(self.parse_type()?);
                    if self.eat(TokenKind::Comma) {
                        continue;
                    }
                    if self.eat(TokenKind::Gt) {
                        break;
                    }
                    return None;
                }
            }
            // Outer<A>.Inner: keep the qualified inner name, drop outer arguments.
            let base = if self.peek() == Some(TokenKind::Dot) {
                self.bump();
                let rest = self.parse_qualified_name()?;
                Arc::from(format!("{name}.{rest}"))
            } else {
                Arc::from(name)
            };
            return Some(self.finish(start, TypeShape::Generic { base, args }));
        }

        let shape = if is_primitive(&name) {
            TypeShape::Primitive(Arc::from(name))
        } else if !name.contains('.') && self.type_params.contains(&name.as_str()) {
            TypeShape::TypeVariable(Arc::from(name))
        } else {
            TypeShape::Named(Arc::from(name))
        };
        Some(self.finish(start, shape))
    }

    fn parse_qualified_name(&mut self) -> Option<String> {
        let first = self.bump().filter(|t| t.kind == TokenKind::Ident)?;
        let mut name = normalize_binary_name(first.text).into_owned();
        while self.peek() == Some(TokenKind::Dot)
            && self.tokens.get(self.pos + 1).map(|t| t.kind) == Some(TokenKind::Ident)
        {
            self.bump();
            if let Some(seg) = self.bump() {
                name.push('.');
                name.push_str(&normalize_binary_name(seg.text));
            }
        }
        Some(name)
    }

    /// Skip `@Anno` and `@Anno(...)` type-use annotations.
    fn skip_type_annotations(&mut self) {
        while self.peek() == Some(TokenKind::At) {
            self.bump();
            if self.parse_qualified_name().is_none() {
                return;
            }
            if self.eat(TokenKind::LParen) {
                let mut depth = 1usize;
                while depth > 0 {
                    match self.bump().map(|t| t.kind) {
                        Some(TokenKind::LParen) => depth += 1,
                        Some(TokenKind::RParen) => depth -= 1,
                        Some(_) => {}
                        None => return,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("int", "int")]
    #[case("boolean", "boolean")]
    #[case("void", "void")]
    fn test_primitive(#[case] raw: &str, #[case] name: &str) {
        let r = TypeReference::parse(raw);
        assert_eq!(r.shape, TypeShape::Primitive(Arc::from(name)));
        assert!(r.base_names().is_empty());
    }

    #[test]
    fn test_generic_keeps_raw_and_args() {
        let r = TypeReference::parse("  Map<String, List<Order>> ");
        assert_eq!(&*r.raw, "Map<String, List<Order>>");
        match &r.shape {
            TypeShape::Generic { base, args } => {
                assert_eq!(&**base, "Map");
                assert_eq!(args.len(), 2);
                assert_eq!(&*args[1].raw, "List<Order>");
            }
            other => panic!("expected generic, got {other:?}"),
        }
        assert_eq!(r.base_names(), vec!["Map", "String", "List", "Order"]);
        assert_eq!(r.primary_name(), Some("Map"));
    }

    #[test]
    fn test_array_dims_and_varargs() {
        let r = TypeReference::parse("Order[][]");
        assert!(matches!(r.shape, TypeShape::Array { dims: 2, .. }));
        assert_eq!(r.primary_name(), Some("Order"));

        let v = TypeReference::parse("String...");
        assert!(matches!(v.shape, TypeShape::Array { dims: 1, .. }));
    }

    #[test]
    fn test_wildcards() {
        let r = TypeReference::parse("List<? extends Shape>");
        let arg = &r.type_args()[0];
        match &arg.shape {
            TypeShape::Wildcard { bound, bound_type } => {
                assert_eq!(*bound, WildcardBound::Extends);
                assert_eq!(bound_type.as_ref().and_then(|b| b.primary_name()), Some("Shape"));
            }
            other => panic!("expected wildcard, got {other:?}"),
        }

        let unbounded = TypeReference::parse("Class<?>");
        assert_eq!(unbounded.type_args()[0].primary_name(), None);
    }

    #[test]
    fn test_type_variables() {
        let r = TypeReference::parse_with_type_params("List<T>", &["T"]);
        assert_eq!(r.type_args()[0].shape, TypeShape::TypeVariable(Arc::from("T")));
        assert_eq!(r.base_names(), vec!["List"]);
    }

    #[test]
    fn test_binary_nested_names_are_normalized() {
        let r = TypeReference::parse("com.acme.Outer$Inner");
        assert_eq!(r.primary_name(), Some("com.acme.Outer.Inner"));
        assert_eq!(&*r.raw, "com.acme.Outer$Inner");
    }

    #[test]
    fn test_union_and_intersection() {
        let u = TypeReference::parse("IOException | SQLException");
        assert!(matches!(u.shape, TypeShape::Union(ref v) if v.len() == 2));
        let i = TypeReference::parse("Comparable<T> & Serializable");
        assert!(matches!(i.shape, TypeShape::Intersection(ref v) if v.len() == 2));
    }

    #[test]
    fn test_type_use_annotations_are_skipped() {
        let r = TypeReference::parse("@NonNull String");
        assert_eq!(r.shape, TypeShape::Named(Arc::from("String")));
    }

    #[test]
    fn test_malformed_text_falls_back_to_named() {
        let r = TypeReference::parse("Map<String");
        assert_eq!(r.shape, TypeShape::Named(Arc::from("Map<String")));
        assert_eq!(&*r.raw, "Map<String");
    }

    #[test]
    fn test_duplicate_base_names_reported_once() {
        let r = TypeReference::parse("Map<Order, Order>");
        assert_eq!(r.base_names(), vec!["Map", "Order"]);
    }
}
