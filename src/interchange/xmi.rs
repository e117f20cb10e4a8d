//! XMI (XML Model Interchange) serializer.
//!
//! Writes an identity-assigned, canonically ordered [`Model`] as a UML2-style
//! document. The writer never reorders or re-hashes anything; it fails with
//! [`InterchangeError`] if an element or reference has no assigned id.
//!
//! ## XMI Structure
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <xmi:XMI xmi:version="2.1" xmlns:xmi="..." xmlns:uml="..." xmlns:j2x="...">
//!   <uml:Model xmi:id="_Model_JavaModel_..." name="JavaModel">
//!     <packagedElement xmi:type="uml:Package" xmi:id="..." name="shop">
//!       <packagedElement xmi:type="uml:Class" xmi:id="..." name="Order">
//!         <ownedAttribute xmi:type="uml:Property" xmi:id="..." name="lines" type="...">
//!           <lowerValue xmi:type="uml:LiteralInteger" xmi:id="...-lower" value="0"/>
//!           <upperValue xmi:type="uml:LiteralUnlimitedNatural" xmi:id="...-upper" value="*"/>
//!         </ownedAttribute>
//!       </packagedElement>
//!     </packagedElement>
//!   </uml:Model>
//!   <j2x:AnnotationApplication xmi:id="..." base_Element="..." annotation="Entity"/>
//! </xmi:XMI>
//! ```

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use std::io::Cursor;

use super::model::{AnnotationApplication, Element, ElementRef, Model, PropertyValue};
use super::{FormatCapability, InterchangeError, ModelFormat};

/// XMI namespace URIs.
pub mod namespace {
    /// XMI 2.1 namespace.
    pub const XMI: &str = "http://schema.omg.org/spec/XMI/2.1";
    /// Eclipse UML2 namespace.
    pub const UML: &str = "http://www.eclipse.org/uml2/5.0.0/UML";
    /// Namespace for annotation applications and tag annotations.
    pub const J2X: &str = "urn:j2x:annotations";
}

/// `source` of the tag annotation written under each tagged element.
pub const TAG_SOURCE: &str = "j2x";

/// XMI format handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct Xmi;

impl ModelFormat for Xmi {
    fn name(&self) -> &'static str {
        "XMI"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["xmi", "uml"]
    }

    fn mime_type(&self) -> &'static str {
        "application/xmi+xml"
    }

    fn capabilities(&self) -> FormatCapability {
        FormatCapability::WRITE_ONLY
    }

    fn read(&self, _input: &[u8]) -> Result<Model, InterchangeError> {
        Err(InterchangeError::unsupported("XMI reading"))
    }

    fn write(&self, model: &Model) -> Result<Vec<u8>, InterchangeError> {
        XmiWriter::new().write(model)
    }

    fn validate(&self, input: &[u8]) -> Result<(), InterchangeError> {
        let content = std::str::from_utf8(input)
            .map_err(|e| InterchangeError::xml(format!("Invalid UTF-8: {e}")))?;
        if !content.contains("xmi:XMI") {
            return Err(InterchangeError::xml("Missing xmi:XMI root element"));
        }
        Ok(())
    }
}

fn write_error(e: impl std::fmt::Display) -> InterchangeError {
    InterchangeError::xml(format!("Write error: {e}"))
}

/// XMI document writer.
#[derive(Debug, Default)]
pub struct XmiWriter;

impl XmiWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write(&self, model: &Model) -> Result<Vec<u8>, InterchangeError> {
        let mut buffer = Cursor::new(Vec::new());
        let mut writer = Writer::new_with_indent(&mut buffer, b' ', 2);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(write_error)?;

        let mut xmi_start = BytesStart::new("xmi:XMI");
        xmi_start.push_attribute(("xmi:version", "2.1"));
        xmi_start.push_attribute(("xmlns:xmi", namespace::XMI));
        xmi_start.push_attribute(("xmlns:uml", namespace::UML));
        xmi_start.push_attribute(("xmlns:j2x", namespace::J2X));
        writer
            .write_event(Event::Start(xmi_start))
            .map_err(write_error)?;

        self.write_element(&mut writer, &model.root, None)?;
        for app in &model.annotations {
            self.write_application(&mut writer, app)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("xmi:XMI")))
            .map_err(write_error)?;

        let mut output = buffer.into_inner();
        output.push(b'\n');
        Ok(output)
    }

    /// Write `element` under `feature`, or as `uml:Model` when it is the root.
    fn write_element<W: std::io::Write>(
        &self,
        writer: &mut Writer<W>,
        element: &Element,
        feature: Option<&str>,
    ) -> Result<(), InterchangeError> {
        let id = element
            .id
            .as_ref()
            .ok_or_else(|| InterchangeError::missing_id(describe(element)))?;

        let tag = feature.unwrap_or(element.kind.xmi_type());
        let mut start = BytesStart::new(tag);
        if feature.is_some() {
            start.push_attribute(("xmi:type", element.kind.xmi_type()));
        }
        start.push_attribute(("xmi:id", id.as_str()));
        if let Some(name) = &element.name {
            start.push_attribute(("name", &**name));
        }
        if let Some(visibility) = element.visibility {
            start.push_attribute(("visibility", visibility.as_str()));
        }
        if element.is_abstract {
            start.push_attribute(("isAbstract", "true"));
        }
        if element.is_static {
            start.push_attribute(("isStatic", "true"));
        }
        for (key, value) in &element.properties {
            if key.starts_with('_') {
                continue;
            }
            let text = property_text(value)?;
            start.push_attribute((&**key, text.as_str()));
        }

        let has_body =
            element.bounds.is_some() || !element.tags.is_empty() || !element.children.is_empty();
        if !has_body {
            writer.write_event(Event::Empty(start)).map_err(write_error)?;
            return Ok(());
        }
        writer.write_event(Event::Start(start)).map_err(write_error)?;

        if !element.tags.is_empty() {
            write_tags(
                writer,
                &format!("{id}-tags"),
                element.tags.iter().map(|(k, v)| (&**k, &**v)),
            )?;
        }
        if let Some(bounds) = element.bounds {
            let lower = bounds.lower.to_string();
            let upper = if bounds.upper < 0 {
                "*".to_string()
            } else {
                bounds.upper.to_string()
            };
            write_literal(writer, "lowerValue", "uml:LiteralInteger", &format!("{id}-lower"), &lower)?;
            write_literal(
                writer,
                "upperValue",
                "uml:LiteralUnlimitedNatural",
                &format!("{id}-upper"),
                &upper,
            )?;
        }
        for child in &element.children {
            let feature = if element.kind.is_classifier() && child.kind.is_classifier() {
                "nestedClassifier"
            } else {
                child.kind.containment_feature()
            };
            self.write_element(writer, child, Some(feature))?;
        }

        writer
            .write_event(Event::End(BytesEnd::new(tag)))
            .map_err(write_error)?;
        Ok(())
    }

    fn write_application<W: std::io::Write>(
        &self,
        writer: &mut Writer<W>,
        app: &AnnotationApplication,
    ) -> Result<(), InterchangeError> {
        let id = app
            .id
            .as_ref()
            .ok_or_else(|| InterchangeError::missing_id(format!("@{}", app.annotation)))?;
        let owner = reference_id(&app.owner)?;

        let mut start = BytesStart::new("j2x:AnnotationApplication");
        start.push_attribute(("xmi:id", id.as_str()));
        start.push_attribute(("base_Element", owner));
        start.push_attribute(("annotation", &*app.annotation));

        if app.tags.is_empty() {
            writer.write_event(Event::Empty(start)).map_err(write_error)?;
            return Ok(());
        }
        writer.write_event(Event::Start(start)).map_err(write_error)?;
        for (key, value) in &app.tags {
            let mut detail = BytesStart::new("details");
            detail.push_attribute(("key", &**key));
            detail.push_attribute(("value", &**value));
            writer.write_event(Event::Empty(detail)).map_err(write_error)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("j2x:AnnotationApplication")))
            .map_err(write_error)?;
        Ok(())
    }
}

fn describe(element: &Element) -> String {
    element
        .logical_key
        .as_deref()
        .or(element.name.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| element.kind.path_tag().to_string())
}

fn reference_id(r: &ElementRef) -> Result<&str, InterchangeError> {
    r.id
        .as_ref()
        .map(|id| id.as_str())
        .ok_or_else(|| InterchangeError::unresolved(r.key.as_ref()))
}

fn property_text(value: &PropertyValue) -> Result<String, InterchangeError> {
    Ok(match value {
        PropertyValue::String(s) => s.to_string(),
        PropertyValue::Integer(n) => n.to_string(),
        PropertyValue::Boolean(b) => b.to_string(),
        PropertyValue::Reference(r) => reference_id(r)?.to_string(),
        PropertyValue::References(refs) => refs
            .iter()
            .map(reference_id)
            .collect::<Result<Vec<_>, _>>()?
            .join(" "),
    })
}

fn write_literal<W: std::io::Write>(
    writer: &mut Writer<W>,
    feature: &str,
    xmi_type: &str,
    id: &str,
    value: &str,
) -> Result<(), InterchangeError> {
    let mut start = BytesStart::new(feature);
    start.push_attribute(("xmi:type", xmi_type));
    start.push_attribute(("xmi:id", id));
    start.push_attribute(("value", value));
    writer.write_event(Event::Empty(start)).map_err(write_error)?;
    Ok(())
}

fn write_tags<'t, W: std::io::Write>(
    writer: &mut Writer<W>,
    id: &str,
    tags: impl Iterator<Item = (&'t str, &'t str)>,
) -> Result<(), InterchangeError> {
    let mut start = BytesStart::new("eAnnotations");
    start.push_attribute(("xmi:id", id));
    start.push_attribute(("source", TAG_SOURCE));
    writer.write_event(Event::Start(start)).map_err(write_error)?;
    for (key, value) in tags {
        let mut detail = BytesStart::new("details");
        detail.push_attribute(("key", key));
        detail.push_attribute(("value", value));
        writer.write_event(Event::Empty(detail)).map_err(write_error)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("eAnnotations")))
        .map_err(write_error)?;
    Ok(())
}
