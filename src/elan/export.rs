/*!
 * Writing an `ElanDocument` back to EAF XML.
 *
 * Output always uses milliseconds. Only valid time slots are written, so
 * slots that no resolvable alignable annotation uses are pruned.
 */

use log::{debug, warn};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::{Deserialize, Serialize};

use super::import::LAST_USED_ANNOTATION_ID_PROPERTY;
use super::model::{AnnotationKind, ElanDocument, Tier};
use crate::errors::ElanError;

/// Fixed URN written into every exported header
pub const EAF_URN: &str = "urn:nl-mpi-tools-elan-eaf:dd04600d-3cc3-41a3-a102-548c7b8c0e45";

const EAF_FORMAT: &str = "3.0";
const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
const EAF_SCHEMA_LOCATION: &str = "http://www.mpi.nl/tools/elan/EAFv3.0.xsd";

/// Options that control EAF output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Write referential annotations as REF_ANNOTATION elements
    #[serde(default)]
    pub include_reference_annotations: bool,

    /// Write one LINGUISTIC_TYPE element per distinct tier type
    #[serde(default = "default_true")]
    pub emit_linguistic_types: bool,

    /// Value of the AUTHOR attribute
    #[serde(default)]
    pub author: String,

    /// Fixed DATE attribute; the current local time when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Spaces per nesting level, 0 for compact output
    #[serde(default = "default_indent")]
    pub indent: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_reference_annotations: false,
            emit_linguistic_types: true,
            author: String::new(),
            date: None,
            indent: default_indent(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_indent() -> usize {
    4
}

type XmlResult = Result<(), quick_xml::Error>;

impl ElanDocument {
    /// Serialize to EAF using default options
    pub fn export_xml(&self) -> Result<String, ElanError> {
        self.export_xml_with(&ExportOptions::default())
    }

    /// Serialize to EAF
    pub fn export_xml_with(&self, options: &ExportOptions) -> Result<String, ElanError> {
        let mut writer = if options.indent > 0 {
            Writer::new_with_indent(Vec::new(), b' ', options.indent)
        } else {
            Writer::new(Vec::new())
        };

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let date = options
            .date
            .clone()
            .unwrap_or_else(|| chrono::Local::now().to_rfc3339());

        let mut root = BytesStart::new("ANNOTATION_DOCUMENT");
        root.push_attribute(("AUTHOR", options.author.as_str()));
        root.push_attribute(("DATE", date.as_str()));
        root.push_attribute(("FORMAT", EAF_FORMAT));
        root.push_attribute(("VERSION", EAF_FORMAT));
        root.push_attribute(("xmlns:xsi", XSI_NAMESPACE));
        root.push_attribute(("xsi:noNamespaceSchemaLocation", EAF_SCHEMA_LOCATION));
        writer.write_event(Event::Start(root))?;

        let dangling = self.unwritten_time_slot_refs();
        if !dangling.is_empty() {
            warn!(
                "Export writes {} time slot reference(s) missing from TIME_ORDER",
                dangling.len()
            );
        }

        self.write_header(&mut writer)?;
        self.write_time_order(&mut writer)?;

        let mut dropped = 0;
        for tier in &self.tiers {
            dropped += write_tier(&mut writer, tier, options)?;
        }
        if dropped > 0 {
            debug!("Export left out {} referential annotations", dropped);
        }

        if options.emit_linguistic_types {
            self.write_linguistic_types(&mut writer, options)?;
        }

        writer.write_event(Event::End(BytesEnd::new("ANNOTATION_DOCUMENT")))?;

        Ok(String::from_utf8(writer.into_inner())?)
    }

    fn write_header(&self, writer: &mut Writer<Vec<u8>>) -> XmlResult {
        let mut header = BytesStart::new("HEADER");
        header.push_attribute(("MEDIA_FILE", self.media_file.as_deref().unwrap_or_default()));
        header.push_attribute(("TIME_UNITS", "milliseconds"));
        writer.write_event(Event::Start(header))?;

        let mut media = BytesStart::new("MEDIA_DESCRIPTOR");
        media.push_attribute(("MEDIA_URL", self.media_url.as_deref().unwrap_or_default()));
        if let Some(mime_type) = &self.media_type {
            media.push_attribute(("MIME_TYPE", mime_type.as_str()));
        }
        writer.write_event(Event::Empty(media))?;

        let last_used = self.counters.last_used_annotation_id.to_string();
        write_property(writer, "URN", EAF_URN)?;
        write_property(writer, LAST_USED_ANNOTATION_ID_PROPERTY, &last_used)?;

        writer.write_event(Event::End(BytesEnd::new("HEADER")))
    }

    fn write_time_order(&self, writer: &mut Writer<Vec<u8>>) -> XmlResult {
        writer.write_event(Event::Start(BytesStart::new("TIME_ORDER")))?;
        for slot in self.valid_time_slots() {
            let value = slot.value.to_string();
            let mut element = BytesStart::new("TIME_SLOT");
            element.push_attribute(("TIME_SLOT_ID", slot.id.as_str()));
            element.push_attribute(("TIME_VALUE", value.as_str()));
            writer.write_event(Event::Empty(element))?;
        }
        writer.write_event(Event::End(BytesEnd::new("TIME_ORDER")))
    }

    fn write_linguistic_types(&self, writer: &mut Writer<Vec<u8>>, options: &ExportOptions) -> XmlResult {
        let mut written: Vec<&str> = Vec::new();
        for tier in &self.tiers {
            let type_ref = tier.linguistic_type_ref.as_str();
            if written.contains(&type_ref) {
                continue;
            }
            written.push(type_ref);

            // A type is symbolic only when every annotation written for it is referential
            let mut annotations = self
                .tiers
                .iter()
                .filter(|t| t.linguistic_type_ref == type_ref)
                .flat_map(|t| t.annotations.iter())
                .filter(|a| a.is_alignable() || options.include_reference_annotations)
                .peekable();
            let symbolic = annotations.peek().is_some() && annotations.all(|a| !a.is_alignable());

            let mut element = BytesStart::new("LINGUISTIC_TYPE");
            element.push_attribute(("LINGUISTIC_TYPE_ID", type_ref));
            element.push_attribute(("TIME_ALIGNABLE", if symbolic { "false" } else { "true" }));
            element.push_attribute(("GRAPHIC_REFERENCES", "false"));
            writer.write_event(Event::Empty(element))?;
        }
        Ok(())
    }
}

fn write_property(writer: &mut Writer<Vec<u8>>, name: &str, value: &str) -> XmlResult {
    let mut property = BytesStart::new("PROPERTY");
    property.push_attribute(("NAME", name));
    writer.write_event(Event::Start(property))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new("PROPERTY")))
}

/// Write one tier and return how many referential annotations were left out
fn write_tier(writer: &mut Writer<Vec<u8>>, tier: &Tier, options: &ExportOptions) -> Result<usize, quick_xml::Error> {
    let mut element = BytesStart::new("TIER");
    element.push_attribute(("TIER_ID", tier.id.as_str()));
    element.push_attribute(("LINGUISTIC_TYPE_REF", tier.linguistic_type_ref.as_str()));
    if let Some(locale) = &tier.default_locale {
        element.push_attribute(("DEFAULT_LOCALE", locale.as_str()));
    }
    if let Some(parent_ref) = &tier.parent_ref {
        element.push_attribute(("PARENT_REF", parent_ref.as_str()));
    }
    writer.write_event(Event::Start(element))?;

    let mut dropped = 0;
    for annotation in &tier.annotations {
        let (name, inner) = match &annotation.kind {
            AnnotationKind::Alignable {
                time_slot_ref1,
                time_slot_ref2,
            } => {
                let mut inner = BytesStart::new("ALIGNABLE_ANNOTATION");
                inner.push_attribute(("ANNOTATION_ID", annotation.id.as_str()));
                inner.push_attribute(("TIME_SLOT_REF1", time_slot_ref1.as_str()));
                inner.push_attribute(("TIME_SLOT_REF2", time_slot_ref2.as_str()));
                ("ALIGNABLE_ANNOTATION", inner)
            }
            AnnotationKind::Reference { annotation_ref } => {
                if !options.include_reference_annotations {
                    dropped += 1;
                    continue;
                }
                let mut inner = BytesStart::new("REF_ANNOTATION");
                inner.push_attribute(("ANNOTATION_ID", annotation.id.as_str()));
                inner.push_attribute(("ANNOTATION_REF", annotation_ref.as_str()));
                ("REF_ANNOTATION", inner)
            }
        };

        writer.write_event(Event::Start(BytesStart::new("ANNOTATION")))?;
        writer.write_event(Event::Start(inner))?;
        writer.write_event(Event::Start(BytesStart::new("ANNOTATION_VALUE")))?;
        writer.write_event(Event::Text(BytesText::new(&annotation.value)))?;
        writer.write_event(Event::End(BytesEnd::new("ANNOTATION_VALUE")))?;
        writer.write_event(Event::End(BytesEnd::new(name)))?;
        writer.write_event(Event::End(BytesEnd::new("ANNOTATION")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("TIER")))?;
    Ok(dropped)
}
