/*!
 * Core document model for ELAN annotation documents.
 *
 * An `ElanDocument` owns its time slots and tiers; tiers own their annotations.
 * Cross references (annotation to time slot, annotation to annotation, tier to
 * parent tier) are plain ids resolved by lookup, never ownership.
 */

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::ids::{IdCounters, IdKind};
use crate::errors::{ElanError, ReferenceKind};

/// Locale stored by `create_tier` regardless of the caller's argument
pub const PLACEHOLDER_LOCALE: &str = "default-locale";

/// A named point in media time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    /// Unique id within the document
    pub id: String,

    /// Offset from media start in milliseconds
    pub value: i64,
}

impl TimeSlot {
    pub fn new(id: impl Into<String>, value: i64) -> Self {
        Self {
            id: id.into(),
            value,
        }
    }

    /// Offset in seconds
    pub fn seconds(&self) -> f64 {
        self.value as f64 / 1000.0
    }
}

/// How an annotation is anchored in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnnotationKind {
    /// Directly aligned to two time slots
    Alignable {
        time_slot_ref1: String,
        time_slot_ref2: String,
    },
    /// Inherits its extent from another annotation
    Reference { annotation_ref: String },
}

/// A single labelled annotation on a tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub id: String,
    pub value: String,
    #[serde(flatten)]
    pub kind: AnnotationKind,
}

impl Annotation {
    /// Create an annotation spanning two time slots
    pub fn alignable(
        id: impl Into<String>,
        value: impl Into<String>,
        time_slot_ref1: impl Into<String>,
        time_slot_ref2: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
            kind: AnnotationKind::Alignable {
                time_slot_ref1: time_slot_ref1.into(),
                time_slot_ref2: time_slot_ref2.into(),
            },
        }
    }

    /// Create an annotation pointing at another annotation
    pub fn reference(
        id: impl Into<String>,
        value: impl Into<String>,
        annotation_ref: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
            kind: AnnotationKind::Reference {
                annotation_ref: annotation_ref.into(),
            },
        }
    }

    pub fn is_alignable(&self) -> bool {
        matches!(self.kind, AnnotationKind::Alignable { .. })
    }

    /// Both time slot ids of an alignable annotation
    pub fn time_slot_refs(&self) -> Option<(&str, &str)> {
        match &self.kind {
            AnnotationKind::Alignable {
                time_slot_ref1,
                time_slot_ref2,
            } => Some((time_slot_ref1.as_str(), time_slot_ref2.as_str())),
            AnnotationKind::Reference { .. } => None,
        }
    }

    /// Target id of a referential annotation
    pub fn annotation_ref(&self) -> Option<&str> {
        match &self.kind {
            AnnotationKind::Reference { annotation_ref } => Some(annotation_ref.as_str()),
            AnnotationKind::Alignable { .. } => None,
        }
    }
}

/// A named track of annotations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tier {
    pub id: String,

    /// Free-form classification tag, carried through unchanged
    pub linguistic_type_ref: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_locale: Option<String>,

    /// Parent tier id; `None` marks a root tier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_ref: Option<String>,

    /// Annotations in document order
    pub annotations: Vec<Annotation>,
}

impl Tier {
    pub fn new(id: impl Into<String>, linguistic_type_ref: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            linguistic_type_ref: linguistic_type_ref.into(),
            default_locale: None,
            parent_ref: None,
            annotations: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_ref.is_none()
    }

    pub fn annotation(&self, id: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }
}

/// An alignable annotation together with its resolved interval
#[derive(Debug, Clone, Copy)]
pub struct AlignedAnnotation<'a> {
    pub tier: &'a Tier,
    pub annotation: &'a Annotation,
    pub start: i64,
    pub end: i64,
}

/// Per-tier line of a document summary
#[derive(Debug, Clone, Serialize)]
pub struct TierSummary {
    pub id: String,
    pub linguistic_type_ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_ref: Option<String>,
    pub alignable_annotations: usize,
    pub reference_annotations: usize,
}

/// Overview of a document, as printed by `elandoc inspect`
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub media_url: Option<String>,
    pub media_type: Option<String>,
    pub media_file: Option<String>,
    pub time_slots: usize,
    pub valid_time_slots: usize,
    pub counters: IdCounters,
    pub tiers: Vec<TierSummary>,
}

/// In-memory ELAN annotation document
#[derive(Debug, Clone, Default)]
pub struct ElanDocument {
    pub media_url: Option<String>,
    pub media_type: Option<String>,
    pub media_file: Option<String>,

    pub(crate) time_slots: Vec<TimeSlot>,
    pub(crate) time_slot_index: HashMap<String, usize>,
    pub(crate) tiers: Vec<Tier>,
    pub(crate) counters: IdCounters,
}

impl ElanDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// All time slots in insertion order
    pub fn time_slots(&self) -> &[TimeSlot] {
        &self.time_slots
    }

    /// All tiers in document order
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn counters(&self) -> &IdCounters {
        &self.counters
    }

    pub fn time_slot(&self, id: &str) -> Option<&TimeSlot> {
        self.time_slot_index.get(id).map(|&i| &self.time_slots[i])
    }

    /// First time slot, in insertion order, whose value is exactly `value`
    pub fn time_slot_by_value(&self, value: i64) -> Option<&TimeSlot> {
        self.time_slots.iter().find(|ts| ts.value == value)
    }

    /// Like `time_slot`, but a miss is an `UnresolvedReference` error
    pub fn resolve_time_slot(&self, id: &str) -> Result<&TimeSlot, ElanError> {
        self.time_slot(id).ok_or_else(|| ElanError::UnresolvedReference {
            kind: ReferenceKind::TimeSlot,
            id: id.to_string(),
        })
    }

    pub fn tier(&self, id: &str) -> Option<&Tier> {
        self.tiers.iter().find(|t| t.id == id)
    }

    /// Like `tier`, but a miss is a `TierNotFound` error
    pub fn resolve_tier(&self, id: &str) -> Result<&Tier, ElanError> {
        self.tier(id)
            .ok_or_else(|| ElanError::TierNotFound(id.to_string()))
    }

    pub fn tier_mut(&mut self, id: &str) -> Option<&mut Tier> {
        self.tiers.iter_mut().find(|t| t.id == id)
    }

    /// Find an annotation on any tier, along with the tier holding it
    pub fn annotation(&self, id: &str) -> Option<(&Tier, &Annotation)> {
        self.tiers
            .iter()
            .find_map(|tier| tier.annotation(id).map(|a| (tier, a)))
    }

    /// Like `annotation`, but a miss is an `UnresolvedReference` error
    pub fn resolve_annotation(&self, id: &str) -> Result<&Annotation, ElanError> {
        self.annotation(id)
            .map(|(_, a)| a)
            .ok_or_else(|| ElanError::UnresolvedReference {
                kind: ReferenceKind::Annotation,
                id: id.to_string(),
            })
    }

    /// Interval of an alignable annotation when both of its slots resolve
    fn aligned_interval(&self, annotation: &Annotation) -> Option<(i64, i64)> {
        let (ref1, ref2) = annotation.time_slot_refs()?;
        Some((self.time_slot(ref1)?.value, self.time_slot(ref2)?.value))
    }

    /// Time slots referenced by fully resolvable alignable annotations.
    ///
    /// Deduplicated by id and sorted ascending by value; slots with equal
    /// values keep the order in which they were first discovered.
    pub fn valid_time_slots(&self) -> Vec<&TimeSlot> {
        let mut seen = HashSet::new();
        let mut slots = Vec::new();

        for annotation in self.tiers.iter().flat_map(|t| t.annotations.iter()) {
            let Some((ref1, ref2)) = annotation.time_slot_refs() else {
                continue;
            };
            let (Some(start), Some(end)) = (self.time_slot(ref1), self.time_slot(ref2)) else {
                continue;
            };
            for slot in [start, end] {
                if seen.insert(slot.id.as_str()) {
                    slots.push(slot);
                }
            }
        }

        slots.sort_by_key(|ts| ts.value);
        slots
    }

    /// Alignable time slot references that `valid_time_slots` does not cover.
    ///
    /// Returns `(annotation_id, time_slot_ref)` pairs. These point at slots
    /// that are missing or unaligned, or at slots pruned because the other
    /// end of the annotation does not resolve. An export writes them as
    /// dangling references.
    pub fn unwritten_time_slot_refs(&self) -> Vec<(&str, &str)> {
        let written: HashSet<&str> = self.valid_time_slots().iter().map(|ts| ts.id.as_str()).collect();

        self.tiers
            .iter()
            .flat_map(|t| t.annotations.iter())
            .filter_map(|a| a.time_slot_refs().map(|refs| (a.id.as_str(), refs)))
            .flat_map(|(id, (ref1, ref2))| [(id, ref1), (id, ref2)])
            .filter(|(_, slot_ref)| !written.contains(slot_ref))
            .collect()
    }

    pub fn time_slot_ref_to_seconds(&self, id: &str) -> Option<f64> {
        self.time_slot(id).map(TimeSlot::seconds)
    }

    /// Effective `(start, end)` in milliseconds of any annotation.
    ///
    /// Referential annotations follow their `ref` chain until an alignable
    /// annotation is reached. Unresolved links and cycles yield `None`.
    pub fn annotation_interval(&self, id: &str) -> Option<(i64, i64)> {
        let mut visited = HashSet::new();
        let mut current = id;
        loop {
            if !visited.insert(current) {
                return None;
            }
            let (_, annotation) = self.annotation(current)?;
            match &annotation.kind {
                AnnotationKind::Alignable { .. } => return self.aligned_interval(annotation),
                AnnotationKind::Reference { annotation_ref } => current = annotation_ref.as_str(),
            }
        }
    }

    /// Resolvable alignable annotations across all tiers, for display.
    ///
    /// Sorted by start ascending, then end descending so an enclosing
    /// interval comes before the shorter ones it shares a start with.
    /// Storage order inside tiers is left untouched.
    pub fn display_order(&self) -> Vec<AlignedAnnotation<'_>> {
        let mut aligned: Vec<AlignedAnnotation<'_>> = self
            .tiers
            .iter()
            .flat_map(|tier| tier.annotations.iter().map(move |a| (tier, a)))
            .filter_map(|(tier, annotation)| {
                let (start, end) = self.aligned_interval(annotation)?;
                Some(AlignedAnnotation {
                    tier,
                    annotation,
                    start,
                    end,
                })
            })
            .collect();

        aligned.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
        aligned
    }

    /// Append a new empty tier and return its id.
    ///
    /// The locale argument is not stored; the tier always carries
    /// `PLACEHOLDER_LOCALE`. Use `create_tier_with_locale` to keep it.
    pub fn create_tier(&mut self, linguistic_type_ref: &str, _default_locale: &str) -> String {
        self.push_new_tier(linguistic_type_ref, PLACEHOLDER_LOCALE)
    }

    /// Append a new empty tier that keeps the given locale
    pub fn create_tier_with_locale(&mut self, linguistic_type_ref: &str, default_locale: &str) -> String {
        self.push_new_tier(linguistic_type_ref, default_locale)
    }

    fn push_new_tier(&mut self, linguistic_type_ref: &str, locale: &str) -> String {
        let tiers = &self.tiers;
        let id = self
            .counters
            .mint(IdKind::Tier, |id| tiers.iter().any(|t| t.id == id));

        let mut tier = Tier::new(id.clone(), linguistic_type_ref);
        tier.default_locale = Some(locale.to_string());
        self.tiers.push(tier);
        id
    }

    /// Append an alignable annotation spanning `from..to` milliseconds.
    ///
    /// Existing time slots with exactly matching values are reused. Returns
    /// `None`, without touching the document, when the tier does not exist.
    pub fn create_annotation(&mut self, tier_id: &str, value: &str, from: i64, to: i64) -> Option<String> {
        let tier_index = self.tiers.iter().position(|t| t.id == tier_id)?;

        let start_id = self.find_or_create_time_slot(from);
        let end_id = self.find_or_create_time_slot(to);

        let tiers = &self.tiers;
        let annotation_id = self.counters.mint(IdKind::Annotation, |id| {
            tiers.iter().any(|t| t.annotation(id).is_some())
        });

        self.tiers[tier_index]
            .annotations
            .push(Annotation::alignable(annotation_id.clone(), value, start_id, end_id));
        Some(annotation_id)
    }

    fn find_or_create_time_slot(&mut self, value: i64) -> String {
        if let Some(slot) = self.time_slot_by_value(value) {
            return slot.id.clone();
        }

        let index = &self.time_slot_index;
        let id = self
            .counters
            .mint(IdKind::TimeSlot, |id| index.contains_key(id));
        self.insert_time_slot(TimeSlot::new(id.clone(), value));
        id
    }

    /// Add a time slot unless one with the same id exists. Returns whether it was added.
    pub(crate) fn insert_time_slot(&mut self, slot: TimeSlot) -> bool {
        if self.time_slot_index.contains_key(&slot.id) {
            return false;
        }
        self.time_slot_index
            .insert(slot.id.clone(), self.time_slots.len());
        self.time_slots.push(slot);
        true
    }

    /// Add a tier unless one with the same id exists. Returns whether it was added.
    pub(crate) fn insert_tier(&mut self, tier: Tier) -> bool {
        if self.tier(&tier.id).is_some() {
            return false;
        }
        self.tiers.push(tier);
        true
    }

    /// Build an overview of the document
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            media_url: self.media_url.clone(),
            media_type: self.media_type.clone(),
            media_file: self.media_file.clone(),
            time_slots: self.time_slots.len(),
            valid_time_slots: self.valid_time_slots().len(),
            counters: self.counters.clone(),
            tiers: self
                .tiers
                .iter()
                .map(|tier| {
                    let alignable = tier.annotations.iter().filter(|a| a.is_alignable()).count();
                    TierSummary {
                        id: tier.id.clone(),
                        linguistic_type_ref: tier.linguistic_type_ref.clone(),
                        parent_ref: tier.parent_ref.clone(),
                        alignable_annotations: alignable,
                        reference_annotations: tier.annotations.len() - alignable,
                    }
                })
                .collect(),
        }
    }
}
