//! Annotation evidence
//!
//! One [`AnnotationEvidence`] per annotation usage: the simple name as written, a
//! best-effort qualified name, and the literal member values as source text.
//! Values stay untyped here; inference reads them through the typed accessors,
//! which report unparseable literals instead of guessing.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::base::{package_of, simple_name};

/// Member name used for a single unnamed annotation argument.
pub const VALUE_MEMBER: &str = "value";

/// A literal member value that could not be read as the requested type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLiteral {
    pub member: Arc<str>,
    pub raw: Arc<str>,
    pub expected: &'static str,
}

/// A single annotation usage on a type or member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationEvidence {
    pub simple_name: Arc<str>,
    pub qualified_name: Option<Arc<str>>,
    pub values: IndexMap<Arc<str>, Arc<str>>,
}

impl AnnotationEvidence {
    /// Create evidence from a name as written; dotted names count as qualified.
    pub fn new(name: &str) -> Self {
        let name = name.trim().trim_start_matches('@');
        let qualified_name = package_of(name).map(|_| Arc::from(name));
        Self {
            simple_name: Arc::from(simple_name(name)),
            qualified_name,
            values: IndexMap::new(),
        }
    }

    pub fn with_qualified_name(mut self, qualified: impl Into<Arc<str>>) -> Self {
        self.qualified_name = Some(qualified.into());
        self
    }

    pub fn with_value(mut self, member: &str, raw: &str) -> Self {
        self.values.insert(Arc::from(member), Arc::from(raw.trim()));
        self
    }

    /// Parse annotation source text: `@Name`, `@Name(literal)` or
    /// `@Name(a = 1, b = "x")`. Returns `None` when no name can be read.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim().strip_prefix('@')?.trim();
        let (name, args) = match text.find('(') {
            Some(open) => {
                let close = text.rfind(')')?;
                if close < open {
                    return None;
                }
                (text[..open].trim(), Some(&text[open + 1..close]))
            }
            None => (text, None),
        };
        if name.is_empty() || !name.split('.').all(crate::base::is_identifier) {
            return None;
        }

        let mut evidence = Self::new(name);
        if let Some(args) = args {
            for part in split_top_level(args) {
                let part = part.trim();
                if part.is_empty() {
                    continue;
                }
                match split_member(part) {
                    Some((member, value)) => {
                        evidence = evidence.with_value(member, value);
                    }
                    None => evidence = evidence.with_value(VALUE_MEMBER, part),
                }
            }
        }
        Some(evidence)
    }

    /// Raw literal text of a member.
    pub fn value(&self, member: &str) -> Option<&str> {
        self.values.get(member).map(|v| v.as_ref())
    }

    /// A string member with surrounding quotes removed.
    pub fn string_value(&self, member: &str) -> Option<&str> {
        self.value(member).map(|v| {
            v.strip_prefix('"')
                .and_then(|s| s.strip_suffix('"'))
                .unwrap_or(v)
        })
    }

    /// A boolean member. `Ok(None)` when absent.
    pub fn bool_value(&self, member: &str) -> Result<Option<bool>, MalformedLiteral> {
        let Some(raw) = self.value(member) else {
            return Ok(None);
        };
        match raw {
            "true" | "Boolean.TRUE" => Ok(Some(true)),
            "false" | "Boolean.FALSE" => Ok(Some(false)),
            _ => Err(self.malformed(member, raw, "boolean")),
        }
    }

    /// An integer member. Accepts `L` suffixes and `_` separators. `Ok(None)` when absent.
    pub fn int_value(&self, member: &str) -> Result<Option<i64>, MalformedLiteral> {
        let Some(raw) = self.value(member) else {
            return Ok(None);
        };
        let cleaned: String = raw
            .trim_end_matches(['L', 'l'])
            .chars()
            .filter(|c| *c != '_')
            .collect();
        cleaned
            .parse::<i64>()
            .map(Some)
            .map_err(|_| self.malformed(member, raw, "integer"))
    }

    fn malformed(&self, member: &str, raw: &str, expected: &'static str) -> MalformedLiteral {
        MalformedLiteral {
            member: Arc::from(member),
            raw: Arc::from(raw),
            expected,
        }
    }
}

/// Split on commas not nested inside quotes, braces or parentheses.
fn split_top_level(args: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    let mut start = 0;
    for (i, c) in args.char_indices() {
        if in_string {
            match c {
                '\\' if !escaped => escaped = true,
                '"' if !escaped => in_string = false,
                _ => escaped = false,
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '(' => depth += 1,
            '}' | ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&args[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&args[start..]);
    parts
}

/// `member = value` where `member` is an identifier; `None` for a bare literal.
fn split_member(part: &str) -> Option<(&str, &str)> {
    let eq = part.find('=')?;
    let member = part[..eq].trim();
    if crate::base::is_identifier(member) {
        Some((member, part[eq + 1..].trim()))
    } else {
        None
    }
}
