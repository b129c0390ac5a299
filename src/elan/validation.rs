/*!
 * Reference validation for ELAN documents.
 *
 * Lookups in the document model are lenient: a dangling id simply resolves to
 * nothing. This pass walks the whole graph on demand and reports:
 * - Alignable annotations pointing at missing time slots
 * - Referential annotations pointing at missing annotations, or looping
 * - Tiers whose parent does not exist
 * - Alignable annotations whose end lies before their start
 * - Annotation ids used more than once
 */

use log::debug;
use std::collections::HashSet;

use super::model::{AnnotationKind, ElanDocument};
use crate::errors::{ElanError, ReferenceKind};

/// A single problem found in the reference graph
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceIssue {
    /// Alignable annotation refers to a time slot that does not exist
    MissingTimeSlot {
        annotation_id: String,
        time_slot_ref: String,
    },
    /// Referential annotation refers to an annotation that does not exist
    MissingAnnotation {
        annotation_id: String,
        annotation_ref: String,
    },
    /// Tier names a parent tier that does not exist
    MissingParentTier { tier_id: String, parent_ref: String },
    /// Start slot value is greater than end slot value
    InvertedInterval {
        annotation_id: String,
        start_ms: i64,
        end_ms: i64,
    },
    /// Same annotation id appears more than once
    DuplicateAnnotationId { annotation_id: String },
    /// Following `ref` links from this annotation leads back to it
    ReferenceCycle { annotation_id: String },
}

impl std::fmt::Display for ReferenceIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferenceIssue::MissingTimeSlot {
                annotation_id,
                time_slot_ref,
            } => write!(
                f,
                "Annotation {} refers to missing time slot {}",
                annotation_id, time_slot_ref
            ),
            ReferenceIssue::MissingAnnotation {
                annotation_id,
                annotation_ref,
            } => write!(
                f,
                "Annotation {} refers to missing annotation {}",
                annotation_id, annotation_ref
            ),
            ReferenceIssue::MissingParentTier { tier_id, parent_ref } => {
                write!(f, "Tier {} refers to missing parent tier {}", tier_id, parent_ref)
            }
            ReferenceIssue::InvertedInterval {
                annotation_id,
                start_ms,
                end_ms,
            } => write!(
                f,
                "Annotation {} ends before it starts: {}ms > {}ms",
                annotation_id, start_ms, end_ms
            ),
            ReferenceIssue::DuplicateAnnotationId { annotation_id } => {
                write!(f, "Annotation id {} is used more than once", annotation_id)
            }
            ReferenceIssue::ReferenceCycle { annotation_id } => {
                write!(f, "Annotation {} is part of a reference cycle", annotation_id)
            }
        }
    }
}

/// Outcome of validating a whole document
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Problems in discovery order
    pub issues: Vec<ReferenceIssue>,
    /// Number of annotations inspected
    pub annotations_checked: usize,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }

    /// Fail with the first dangling reference, if any.
    ///
    /// Inverted intervals and duplicate ids are not reference failures and
    /// do not make this return an error.
    pub fn ensure_resolved(&self) -> Result<(), ElanError> {
        let unresolved = self.issues.iter().find_map(|issue| match issue {
            ReferenceIssue::MissingTimeSlot { time_slot_ref, .. } => {
                Some((ReferenceKind::TimeSlot, time_slot_ref))
            }
            ReferenceIssue::MissingAnnotation { annotation_ref, .. } => {
                Some((ReferenceKind::Annotation, annotation_ref))
            }
            ReferenceIssue::MissingParentTier { parent_ref, .. } => {
                Some((ReferenceKind::Tier, parent_ref))
            }
            ReferenceIssue::ReferenceCycle { annotation_id } => {
                Some((ReferenceKind::Annotation, annotation_id))
            }
            _ => None,
        });

        match unresolved {
            Some((kind, id)) => Err(ElanError::UnresolvedReference {
                kind,
                id: id.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Validate every cross reference in the document
pub fn validate_references(doc: &ElanDocument) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut seen_ids = HashSet::new();

    for tier in doc.tiers() {
        if let Some(parent_ref) = &tier.parent_ref {
            if doc.tier(parent_ref).is_none() {
                report.issues.push(ReferenceIssue::MissingParentTier {
                    tier_id: tier.id.clone(),
                    parent_ref: parent_ref.clone(),
                });
            }
        }

        for annotation in &tier.annotations {
            report.annotations_checked += 1;

            if !seen_ids.insert(annotation.id.as_str()) {
                report.issues.push(ReferenceIssue::DuplicateAnnotationId {
                    annotation_id: annotation.id.clone(),
                });
            }

            match &annotation.kind {
                AnnotationKind::Alignable {
                    time_slot_ref1,
                    time_slot_ref2,
                } => {
                    let start = doc.time_slot(time_slot_ref1);
                    let end = doc.time_slot(time_slot_ref2);
                    for (slot, slot_ref) in [(start, time_slot_ref1), (end, time_slot_ref2)] {
                        if slot.is_none() {
                            report.issues.push(ReferenceIssue::MissingTimeSlot {
                                annotation_id: annotation.id.clone(),
                                time_slot_ref: slot_ref.clone(),
                            });
                        }
                    }
                    if let (Some(start), Some(end)) = (start, end) {
                        if start.value > end.value {
                            report.issues.push(ReferenceIssue::InvertedInterval {
                                annotation_id: annotation.id.clone(),
                                start_ms: start.value,
                                end_ms: end.value,
                            });
                        }
                    }
                }
                AnnotationKind::Reference { annotation_ref } => {
                    if doc.annotation(annotation_ref).is_none() {
                        report.issues.push(ReferenceIssue::MissingAnnotation {
                            annotation_id: annotation.id.clone(),
                            annotation_ref: annotation_ref.clone(),
                        });
                    } else if in_reference_cycle(doc, &annotation.id) {
                        report.issues.push(ReferenceIssue::ReferenceCycle {
                            annotation_id: annotation.id.clone(),
                        });
                    }
                }
            }
        }
    }

    debug!(
        "Reference validation: {} annotations, {} issues",
        report.annotations_checked,
        report.issues.len()
    );

    report
}

/// True when following `ref` links from `start` leads back to `start`.
/// A chain that only runs into a loop further along is not part of it.
fn in_reference_cycle(doc: &ElanDocument, start: &str) -> bool {
    let mut visited = HashSet::new();
    let mut current = start;
    while let Some((_, annotation)) = doc.annotation(current) {
        if !visited.insert(current) {
            return false;
        }
        match annotation.annotation_ref() {
            Some(next) if next == start => return true,
            Some(next) => current = next,
            None => return false,
        }
    }
    false
}
