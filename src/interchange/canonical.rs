//! Canonical ordering pass.
//!
//! Pure sorting, run after identities are assigned:
//!
//! - package contents: sub-packages, classifiers, associations, dependencies,
//!   each group by logical key (qualified name)
//! - classifier members keep declaration order
//! - element tags by key
//! - annotation applications by (owner id, annotation id), their tags by key
//! - diagnostics by (code, referenced name, message, owner, context)

use std::cmp::Ordering;

use super::model::{AnnotationApplication, Element, ElementKind, Model};

/// Impose the final order on every serialized collection.
pub fn canonicalize(mut model: Model) -> Model {
    order_element(&mut model.root);

    for app in &mut model.annotations {
        app.tags.sort_keys();
    }
    model.annotations.sort_by(compare_annotations);
    model
        .diagnostics
        .sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    model
}

fn order_element(element: &mut Element) {
    element.tags.sort_keys();
    if matches!(element.kind, ElementKind::Model | ElementKind::Package) {
        element.children.sort_by(compare_packaged);
    }
    for child in &mut element.children {
        order_element(child);
    }
}

fn sort_name(element: &Element) -> &str {
    element
        .logical_key
        .as_deref()
        .or(element.name.as_deref())
        .unwrap_or("")
}

fn compare_packaged(a: &Element, b: &Element) -> Ordering {
    a.kind
        .package_rank()
        .cmp(&b.kind.package_rank())
        .then_with(|| sort_name(a).cmp(sort_name(b)))
        .then_with(|| a.id.cmp(&b.id))
}

fn compare_annotations(a: &AnnotationApplication, b: &AnnotationApplication) -> Ordering {
    a.owner
        .id
        .cmp(&b.owner.id)
        .then_with(|| a.id.cmp(&b.id))
        .then_with(|| a.annotation.cmp(&b.annotation))
}
