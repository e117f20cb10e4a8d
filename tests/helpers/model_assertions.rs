//! Model lookup helpers that fail with a readable message.

use j2x::interchange::{Element, Model, PropertyValue};

/// Element by logical key, panicking with the known keys on a miss.
pub fn element<'m>(model: &'m Model, key: &str) -> &'m Element {
    model.find_by_key(key).unwrap_or_else(|| {
        let keys: Vec<&str> = model
            .elements()
            .iter()
            .filter_map(|e| e.logical_key.as_deref())
            .collect();
        panic!("no element {key}; known keys:\n  {}", keys.join("\n  "))
    })
}

/// `(lower, upper)` of an element, upper `-1` for `*`.
pub fn bounds(model: &Model, key: &str) -> (u32, i64) {
    let b = element(model, key)
        .bounds
        .unwrap_or_else(|| panic!("{key} has no bounds"));
    (b.lower, b.upper)
}

/// Logical key of a single-reference property.
pub fn reference<'e>(element: &'e Element, property: &str) -> Option<&'e str> {
    match element.property(property) {
        Some(PropertyValue::Reference(r)) => Some(&r.key),
        _ => None,
    }
}

/// Every id is present, unique and well-formed.
pub fn assert_ids_well_formed(model: &Model) {
    let mut seen = std::collections::HashSet::new();
    for e in model.elements() {
        let id = e.id.as_ref().expect("element without id");
        let text = id.as_str();
        assert!(text.starts_with('_'), "id {text} must start with '_'");
        assert!(
            text[1..]
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')),
            "id {text} has characters outside the id alphabet"
        );
        assert!(seen.insert(text.to_string()), "duplicate id {text}");
    }
}
