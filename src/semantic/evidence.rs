//! Recognized annotations
//!
//! Inference never inspects annotation names directly; it asks this table what
//! role an annotation plays. Simple names match regardless of package, and the
//! `javax`/`jakarta` persistence and validation packages are accepted when a
//! qualified name is known.

use crate::syntax::AnnotationEvidence;

/// The part an annotation plays in relationship inference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnnotationRole {
    OneToOne,
    ManyToOne,
    OneToMany,
    ManyToMany,
    Embedded,
    EmbeddedId,
    ElementCollection,
    Transient,
    Column,
    JoinColumn,
    Basic,
    NotNull,
    NotEmpty,
    NotBlank,
    Size,
}

const ROLE_TABLE: &[(&str, AnnotationRole)] = &[
    ("OneToOne", AnnotationRole::OneToOne),
    ("ManyToOne", AnnotationRole::ManyToOne),
    ("OneToMany", AnnotationRole::OneToMany),
    ("ManyToMany", AnnotationRole::ManyToMany),
    ("Embedded", AnnotationRole::Embedded),
    ("EmbeddedId", AnnotationRole::EmbeddedId),
    ("ElementCollection", AnnotationRole::ElementCollection),
    ("Transient", AnnotationRole::Transient),
    ("Column", AnnotationRole::Column),
    ("JoinColumn", AnnotationRole::JoinColumn),
    ("Basic", AnnotationRole::Basic),
    ("NotNull", AnnotationRole::NotNull),
    ("Nonnull", AnnotationRole::NotNull),
    ("NotEmpty", AnnotationRole::NotEmpty),
    ("NotBlank", AnnotationRole::NotBlank),
    ("Size", AnnotationRole::Size),
];

const RECOGNIZED_PACKAGES: &[&str] = &[
    "javax.persistence",
    "jakarta.persistence",
    "javax.validation.constraints",
    "jakarta.validation.constraints",
    "javax.annotation",
    "jakarta.annotation",
    "org.springframework.data.annotation",
];

impl AnnotationRole {
    /// Role of an annotation usage, if recognized.
    pub fn of(annotation: &AnnotationEvidence) -> Option<Self> {
        if let Some(role) = Self::lookup(&annotation.simple_name) {
            return Some(role);
        }
        let qualified = annotation.qualified_name.as_deref()?;
        let (package, simple) = qualified.rsplit_once('.')?;
        RECOGNIZED_PACKAGES
            .contains(&package)
            .then(|| Self::lookup(simple))
            .flatten()
    }

    fn lookup(simple: &str) -> Option<Self> {
        ROLE_TABLE
            .iter()
            .find(|(name, _)| *name == simple)
            .map(|(_, role)| *role)
    }

    /// Canonical simple name, used in provenance tags.
    pub fn name(&self) -> &'static str {
        match self {
            AnnotationRole::OneToOne => "OneToOne",
            AnnotationRole::ManyToOne => "ManyToOne",
            AnnotationRole::OneToMany => "OneToMany",
            AnnotationRole::ManyToMany => "ManyToMany",
            AnnotationRole::Embedded => "Embedded",
            AnnotationRole::EmbeddedId => "EmbeddedId",
            AnnotationRole::ElementCollection => "ElementCollection",
            AnnotationRole::Transient => "Transient",
            AnnotationRole::Column => "Column",
            AnnotationRole::JoinColumn => "JoinColumn",
            AnnotationRole::Basic => "Basic",
            AnnotationRole::NotNull => "NotNull",
            AnnotationRole::NotEmpty => "NotEmpty",
            AnnotationRole::NotBlank => "NotBlank",
            AnnotationRole::Size => "Size",
        }
    }

    pub fn is_relation(&self) -> bool {
        self.is_to_one() || self.is_to_many()
    }

    pub fn is_to_one(&self) -> bool {
        matches!(self, AnnotationRole::OneToOne | AnnotationRole::ManyToOne)
    }

    pub fn is_to_many(&self) -> bool {
        matches!(self, AnnotationRole::OneToMany | AnnotationRole::ManyToMany)
    }

    /// Embedding-style annotations.
    pub fn is_embedding(&self) -> bool {
        matches!(self, AnnotationRole::Embedded | AnnotationRole::EmbeddedId)
    }

    /// Required/not-null style validation.
    pub fn is_required(&self) -> bool {
        matches!(
            self,
            AnnotationRole::NotNull | AnnotationRole::NotEmpty | AnnotationRole::NotBlank
        )
    }
}

/// First annotation in `annotations` with the given role.
pub fn find_role(
    annotations: &[AnnotationEvidence],
    predicate: impl Fn(AnnotationRole) -> bool,
) -> Option<(AnnotationRole, &AnnotationEvidence)> {
    annotations
        .iter()
        .find_map(|a| AnnotationRole::of(a).filter(|r| predicate(*r)).map(|r| (r, a)))
}

/// Does any annotation have a role matching `predicate`?
pub fn has_role(annotations: &[AnnotationEvidence], predicate: impl Fn(AnnotationRole) -> bool) -> bool {
    find_role(annotations, predicate).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("@OneToMany", Some(AnnotationRole::OneToMany))]
    #[case("@jakarta.persistence.ManyToOne", Some(AnnotationRole::ManyToOne))]
    #[case("@javax.annotation.Nonnull", Some(AnnotationRole::NotNull))]
    #[case("@Embedded", Some(AnnotationRole::Embedded))]
    #[case("@Override", None)]
    #[case("@com.acme.Audit", None)]
    fn test_role_lookup(#[case] text: &str, #[case] expected: Option<AnnotationRole>) {
        let evidence = AnnotationEvidence::parse(text).unwrap();
        assert_eq!(AnnotationRole::of(&evidence), expected);
    }

    #[test]
    fn test_role_classes() {
        assert!(AnnotationRole::ManyToOne.is_to_one());
        assert!(AnnotationRole::ManyToMany.is_to_many());
        assert!(!AnnotationRole::Embedded.is_relation());
        assert!(AnnotationRole::EmbeddedId.is_embedding());
        assert!(AnnotationRole::NotBlank.is_required());
        assert!(!AnnotationRole::Size.is_required());
    }

    #[test]
    fn test_find_role_returns_first_match() {
        let annotations = vec![
            AnnotationEvidence::new("Column").with_value("nullable", "false"),
            AnnotationEvidence::new("OneToOne"),
        ];
        let (role, evidence) = find_role(&annotations, |r| r.is_relation()).unwrap();
        assert_eq!(role, AnnotationRole::OneToOne);
        assert_eq!(&*evidence.simple_name, "OneToOne");
        assert!(!has_role(&annotations, |r| r == AnnotationRole::Transient));
    }
}
