/*!
 * Reading EAF XML into an `ElanDocument`.
 *
 * Import works on an already-parsed XML tree (`roxmltree::Document`). The
 * whole input is read and checked before the document is touched, so a
 * failed import leaves the target unchanged.
 */

use log::{debug, warn};
use roxmltree::Node;
use serde::{Deserialize, Serialize};

use super::ids::IdKind;
use super::model::{Annotation, ElanDocument, TimeSlot, Tier};
use super::validation::{validate_references, ReferenceIssue};
use crate::errors::ElanError;

/// Header property that carries the annotation id counter
pub const LAST_USED_ANNOTATION_ID_PROPERTY: &str = "lastUsedAnnotationId";

const SOFT_HYPHEN: char = '\u{AD}';

/// Options that control how an EAF document is imported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Bump id counters past every imported `tier<n>`/`an<n>`/`ts<n>` id
    #[serde(default = "default_true")]
    pub resync_counters: bool,

    /// Run reference validation after import and report issues as warnings
    #[serde(default)]
    pub strict: bool,

    /// Replace U+00AD soft hyphens in annotation values by plain spaces
    #[serde(default = "default_true")]
    pub replace_soft_hyphens: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            resync_counters: true,
            strict: false,
            replace_soft_hyphens: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// What an import added to the document
#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    pub time_slots_added: usize,
    /// TIME_SLOT elements skipped because their id was already known
    pub duplicate_time_slots: usize,
    /// TIME_SLOT elements without a TIME_VALUE
    pub unaligned_time_slots: usize,
    pub tiers_added: usize,
    /// TIER elements skipped because their id was already known
    pub duplicate_tiers: usize,
    pub annotations_added: usize,
    /// Reference problems, filled only in strict mode
    pub issues: Vec<ReferenceIssue>,
}

/// Everything read from the XML, ready to be committed
struct ParsedDocument {
    media_url: Option<String>,
    media_type: Option<String>,
    media_file: Option<String>,
    last_used_annotation_id: Option<u64>,
    time_slots: Vec<TimeSlot>,
    unaligned_time_slots: usize,
    tiers: Vec<Tier>,
}

impl ElanDocument {
    /// Parse EAF text into a fresh document using default options
    pub fn from_xml_str(xml: &str) -> Result<Self, ElanError> {
        let mut doc = Self::new();
        doc.import_str(xml, &ImportOptions::default())?;
        Ok(doc)
    }

    /// Parse EAF text and import it into this document
    pub fn import_str(&mut self, xml: &str, options: &ImportOptions) -> Result<ImportSummary, ElanError> {
        let parsed = roxmltree::Document::parse(xml)?;
        self.import_xml_with(&parsed, options)
    }

    /// Import a parsed EAF tree using default options
    pub fn import_xml(&mut self, xml: &roxmltree::Document<'_>) -> Result<ImportSummary, ElanError> {
        self.import_xml_with(xml, &ImportOptions::default())
    }

    /// Import a parsed EAF tree.
    ///
    /// Time slots and tiers whose id is already present are skipped; the
    /// first occurrence wins. Fails with `MalformedDocument` when the root,
    /// `HEADER` or `MEDIA_DESCRIPTOR` is missing.
    pub fn import_xml_with(
        &mut self,
        xml: &roxmltree::Document<'_>,
        options: &ImportOptions,
    ) -> Result<ImportSummary, ElanError> {
        let parsed = parse_document(xml, options)?;

        let mut summary = ImportSummary {
            unaligned_time_slots: parsed.unaligned_time_slots,
            ..Default::default()
        };

        self.media_url = parsed.media_url;
        self.media_type = parsed.media_type;
        self.media_file = parsed.media_file;

        if let Some(last_used) = parsed.last_used_annotation_id {
            self.counters.raise(IdKind::Annotation, last_used);
        }

        for slot in parsed.time_slots {
            let id = slot.id.clone();
            if self.insert_time_slot(slot) {
                summary.time_slots_added += 1;
                if options.resync_counters {
                    self.counters.observe(&id);
                }
            } else {
                summary.duplicate_time_slots += 1;
            }
        }

        for tier in parsed.tiers {
            let tier_id = tier.id.clone();
            let annotation_ids: Vec<String> = tier.annotations.iter().map(|a| a.id.clone()).collect();
            if !self.insert_tier(tier) {
                warn!("Skipping duplicate tier id: {}", tier_id);
                summary.duplicate_tiers += 1;
                continue;
            }

            summary.tiers_added += 1;
            summary.annotations_added += annotation_ids.len();
            if options.resync_counters {
                self.counters.observe(&tier_id);
                for id in &annotation_ids {
                    self.counters.observe(id);
                }
            }
        }

        debug!(
            "Imported {} time slots ({} duplicate, {} unaligned), {} tiers ({} duplicate), {} annotations",
            summary.time_slots_added,
            summary.duplicate_time_slots,
            summary.unaligned_time_slots,
            summary.tiers_added,
            summary.duplicate_tiers,
            summary.annotations_added
        );

        if options.strict {
            let report = validate_references(self);
            for issue in &report.issues {
                warn!("{}", issue);
            }
            summary.issues = report.issues;
        }

        Ok(summary)
    }
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(name))
}

fn non_empty_attribute(node: Node<'_, '_>, name: &str) -> Option<String> {
    node.attribute(name)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_document(xml: &roxmltree::Document<'_>, options: &ImportOptions) -> Result<ParsedDocument, ElanError> {
    let root = xml.root_element();
    if !root.has_tag_name("ANNOTATION_DOCUMENT") {
        return Err(ElanError::MalformedDocument(format!(
            "expected root element ANNOTATION_DOCUMENT, found {}",
            root.tag_name().name()
        )));
    }

    let header = child(root, "HEADER")
        .ok_or_else(|| ElanError::MalformedDocument("missing HEADER".to_string()))?;
    let media = child(header, "MEDIA_DESCRIPTOR")
        .ok_or_else(|| ElanError::MalformedDocument("missing MEDIA_DESCRIPTOR".to_string()))?;

    // Anything other than milliseconds is read as seconds
    let in_milliseconds = header.attribute("TIME_UNITS") == Some("milliseconds");

    let last_used_annotation_id = header
        .children()
        .filter(|n| n.has_tag_name("PROPERTY"))
        .find(|n| n.attribute("NAME") == Some(LAST_USED_ANNOTATION_ID_PROPERTY))
        .and_then(|n| n.text())
        .and_then(|text| text.trim().parse::<u64>().ok());

    let mut time_slots = Vec::new();
    let mut unaligned_time_slots = 0;
    for time_order in root.children().filter(|n| n.has_tag_name("TIME_ORDER")) {
        for element in time_order.descendants().filter(|n| n.has_tag_name("TIME_SLOT")) {
            let Some(id) = element.attribute("TIME_SLOT_ID") else {
                debug!("Skipping TIME_SLOT without TIME_SLOT_ID");
                continue;
            };
            let Some(raw) = element.attribute("TIME_VALUE") else {
                unaligned_time_slots += 1;
                continue;
            };
            let value = parse_time_value(id, raw, in_milliseconds)?;
            time_slots.push(TimeSlot::new(id, value));
        }
    }

    let mut tiers = Vec::new();
    for element in root.descendants().filter(|n| n.has_tag_name("TIER")) {
        tiers.push(parse_tier(element, options)?);
    }

    Ok(ParsedDocument {
        media_url: non_empty_attribute(media, "MEDIA_URL"),
        media_type: non_empty_attribute(media, "MIME_TYPE"),
        media_file: non_empty_attribute(header, "MEDIA_FILE"),
        last_used_annotation_id,
        time_slots,
        unaligned_time_slots,
        tiers,
    })
}

/// Convert a TIME_VALUE to integer milliseconds, flooring any fraction
fn parse_time_value(slot_id: &str, raw: &str, in_milliseconds: bool) -> Result<i64, ElanError> {
    let invalid = || ElanError::InvalidTimeValue {
        slot_id: slot_id.to_string(),
        value: raw.to_string(),
    };

    let value: f64 = raw.trim().parse().map_err(|_| invalid())?;
    if !value.is_finite() {
        return Err(invalid());
    }

    let millis = if in_milliseconds { value } else { value * 1000.0 };
    Ok(millis.floor() as i64)
}

fn parse_tier(element: Node<'_, '_>, options: &ImportOptions) -> Result<Tier, ElanError> {
    let id = element
        .attribute("TIER_ID")
        .ok_or_else(|| ElanError::MalformedDocument("TIER without TIER_ID".to_string()))?;

    let mut tier = Tier::new(id, element.attribute("LINGUISTIC_TYPE_REF").unwrap_or_default());
    tier.default_locale = element.attribute("DEFAULT_LOCALE").map(str::to_string);
    tier.parent_ref = non_empty_attribute(element, "PARENT_REF");

    for node in element.descendants() {
        let annotation = if node.has_tag_name("ALIGNABLE_ANNOTATION") {
            Annotation::alignable(
                annotation_id(node)?,
                annotation_value(node, options),
                node.attribute("TIME_SLOT_REF1").unwrap_or_default(),
                node.attribute("TIME_SLOT_REF2").unwrap_or_default(),
            )
        } else if node.has_tag_name("REF_ANNOTATION") {
            Annotation::reference(
                annotation_id(node)?,
                annotation_value(node, options),
                node.attribute("ANNOTATION_REF").unwrap_or_default(),
            )
        } else {
            continue;
        };
        tier.annotations.push(annotation);
    }

    Ok(tier)
}

fn annotation_id<'a>(node: Node<'a, '_>) -> Result<&'a str, ElanError> {
    node.attribute("ANNOTATION_ID").ok_or_else(|| {
        ElanError::MalformedDocument(format!("{} without ANNOTATION_ID", node.tag_name().name()))
    })
}

fn annotation_value(node: Node<'_, '_>, options: &ImportOptions) -> String {
    let text: String = child(node, "ANNOTATION_VALUE")
        .map(|value| {
            value
                .descendants()
                .filter(|n| n.is_text())
                .filter_map(|n| n.text())
                .collect()
        })
        .unwrap_or_default();

    let trimmed = text.trim();
    if options.replace_soft_hyphens {
        trimmed.replace(SOFT_HYPHEN, " ")
    } else {
        trimmed.to_string()
    }
}
