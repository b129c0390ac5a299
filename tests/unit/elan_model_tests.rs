/*!
 * Tests for document model queries and mutation
 */

use elandoc::elan::{AnnotationKind, ElanDocument};
use crate::common;

#[test]
fn test_createTier_onEmptyDocument_shouldMintSequentialIds() {
    let mut doc = ElanDocument::new();

    assert_eq!(doc.create_tier("text", "en"), "tier0");
    assert_eq!(doc.create_tier("text", "en"), "tier1");
    assert_eq!(doc.tiers().len(), 2);
    assert_eq!(doc.counters().last_used_tier_id, 2);
}

#[test]
fn test_createTier_withLocale_shouldStorePlaceholderLocale() {
    let mut doc = ElanDocument::new();

    let id = doc.create_tier("text", "en");
    let tier = doc.tier(&id).unwrap();

    assert_eq!(tier.linguistic_type_ref, "text");
    assert_eq!(tier.default_locale.as_deref(), Some("default-locale"));
    assert!(tier.annotations.is_empty());
    assert!(tier.is_root());
}

#[test]
fn test_createTierWithLocale_shouldKeepGivenLocale() {
    let mut doc = ElanDocument::new();

    let id = doc.create_tier_with_locale("text", "fr");

    assert_eq!(doc.tier(&id).unwrap().default_locale.as_deref(), Some("fr"));
}

#[test]
fn test_createAnnotation_onFreshDocument_shouldMintAnnotationAndSlots() {
    let mut doc = ElanDocument::new();
    let tier = doc.create_tier("text", "en");

    let id = doc.create_annotation(&tier, "hello", 0, 1000);

    assert_eq!(id.as_deref(), Some("an0"));
    assert_eq!(doc.time_slot("ts0").map(|ts| ts.value), Some(0));
    assert_eq!(doc.time_slot("ts1").map(|ts| ts.value), Some(1000));

    let annotation = &doc.tier(&tier).unwrap().annotations[0];
    assert_eq!(annotation.value, "hello");
    assert_eq!(
        annotation.kind,
        AnnotationKind::Alignable {
            time_slot_ref1: "ts0".to_string(),
            time_slot_ref2: "ts1".to_string(),
        }
    );
}

#[test]
fn test_createAnnotation_withSameInterval_shouldReuseTimeSlots() {
    let mut doc = ElanDocument::new();
    let tier = doc.create_tier("text", "en");

    let first = doc.create_annotation(&tier, "a", 100, 200).unwrap();
    let second = doc.create_annotation(&tier, "b", 100, 200).unwrap();

    assert_ne!(first, second);
    assert_eq!(doc.time_slots().len(), 2);
    let refs: Vec<_> = doc
        .tier(&tier)
        .unwrap()
        .annotations
        .iter()
        .map(|a| a.time_slot_refs().map(|(s, e)| (s.to_string(), e.to_string())))
        .collect();
    assert_eq!(refs[0], refs[1]);
}

#[test]
fn test_createAnnotation_withSharedBoundary_shouldReuseOneSlot() {
    let mut doc = ElanDocument::new();
    let tier = doc.create_tier("text", "en");

    doc.create_annotation(&tier, "a", 0, 500).unwrap();
    doc.create_annotation(&tier, "b", 500, 900).unwrap();

    assert_eq!(doc.time_slots().len(), 3);
}

#[test]
fn test_createAnnotation_withMissingTier_shouldReturnNoneWithoutSideEffects() {
    let mut doc = ElanDocument::new();

    let result = doc.create_annotation("missing", "x", 0, 10);

    assert!(result.is_none());
    assert!(doc.time_slots().is_empty());
    assert_eq!(doc.counters().last_used_annotation_id, 0);
}

#[test]
fn test_getTier_withUnknownId_shouldReturnNone() {
    let doc = common::build_sample_document();

    assert!(doc.tier("missing").is_none());
}

#[test]
fn test_timeSlotByValue_withEqualValues_shouldReturnFirstInserted() {
    let xml = common::eaf(
        "milliseconds",
        r#"<TIME_SLOT TIME_SLOT_ID="x" TIME_VALUE="40"/><TIME_SLOT TIME_SLOT_ID="y" TIME_VALUE="40"/>"#,
        "",
    );
    let doc = ElanDocument::from_xml_str(&xml).unwrap();

    assert_eq!(doc.time_slot_by_value(40).map(|ts| ts.id.as_str()), Some("x"));
    assert!(doc.time_slot_by_value(41).is_none());
}

#[test]
fn test_validTimeSlots_withSingleAnnotation_shouldReturnBothSlotsSorted() {
    let xml = common::eaf(
        "milliseconds",
        r#"<TIME_SLOT TIME_SLOT_ID="late" TIME_VALUE="800"/><TIME_SLOT TIME_SLOT_ID="early" TIME_VALUE="300"/>"#,
        r#"<TIER TIER_ID="t" LINGUISTIC_TYPE_REF="lt">
            <ANNOTATION><ALIGNABLE_ANNOTATION ANNOTATION_ID="a1" TIME_SLOT_REF1="early" TIME_SLOT_REF2="late">
                <ANNOTATION_VALUE>x</ANNOTATION_VALUE>
            </ALIGNABLE_ANNOTATION></ANNOTATION>
        </TIER>"#,
    );
    let doc = ElanDocument::from_xml_str(&xml).unwrap();

    let ids: Vec<&str> = doc.valid_time_slots().iter().map(|ts| ts.id.as_str()).collect();

    assert_eq!(ids, vec!["early", "late"]);
}

#[test]
fn test_validTimeSlots_withOrphanAndHalfResolvedSlots_shouldPruneThem() {
    let doc = ElanDocument::from_xml_str(&common::fixture("hierarchical.eaf")).unwrap();

    let ids: Vec<&str> = doc.valid_time_slots().iter().map(|ts| ts.id.as_str()).collect();

    // ts5 is referenced by nothing; a6 only resolves one end
    assert_eq!(ids, vec!["ts1", "ts2", "ts3", "ts4"]);
}

#[test]
fn test_validTimeSlots_withEqualValues_shouldKeepDiscoveryOrder() {
    let xml = common::eaf(
        "milliseconds",
        r#"<TIME_SLOT TIME_SLOT_ID="b" TIME_VALUE="100"/>
           <TIME_SLOT TIME_SLOT_ID="a" TIME_VALUE="100"/>
           <TIME_SLOT TIME_SLOT_ID="z" TIME_VALUE="0"/>"#,
        r#"<TIER TIER_ID="t" LINGUISTIC_TYPE_REF="lt">
            <ANNOTATION><ALIGNABLE_ANNOTATION ANNOTATION_ID="x1" TIME_SLOT_REF1="z" TIME_SLOT_REF2="a">
                <ANNOTATION_VALUE>1</ANNOTATION_VALUE></ALIGNABLE_ANNOTATION></ANNOTATION>
            <ANNOTATION><ALIGNABLE_ANNOTATION ANNOTATION_ID="x2" TIME_SLOT_REF1="z" TIME_SLOT_REF2="b">
                <ANNOTATION_VALUE>2</ANNOTATION_VALUE></ALIGNABLE_ANNOTATION></ANNOTATION>
        </TIER>"#,
    );
    let doc = ElanDocument::from_xml_str(&xml).unwrap();

    let ids: Vec<&str> = doc.valid_time_slots().iter().map(|ts| ts.id.as_str()).collect();

    assert_eq!(ids, vec!["z", "a", "b"]);
}

#[test]
fn test_timeSlotRefToSeconds_shouldDivideByThousand() {
    let doc = common::build_sample_document();

    assert_eq!(doc.time_slot_ref_to_seconds("ts2"), Some(2.35));
    assert_eq!(doc.time_slot_ref_to_seconds("nope"), None);
}

#[test]
fn test_resolveTimeSlot_withMissingId_shouldReturnError() {
    let doc = common::build_sample_document();

    assert!(doc.resolve_time_slot("ts0").is_ok());
    let err = doc.resolve_time_slot("ts99").unwrap_err();
    assert!(err.to_string().contains("ts99"));
}

#[test]
fn test_annotationInterval_withReferenceChain_shouldInheritFromAlignable() {
    let doc = ElanDocument::from_xml_str(&common::fixture("hierarchical.eaf")).unwrap();

    assert_eq!(doc.annotation_interval("a1"), Some((0, 2500)));
    assert_eq!(doc.annotation_interval("a4"), Some((0, 1200)));
    assert_eq!(doc.annotation_interval("a5"), Some((0, 1200)));
    assert_eq!(doc.annotation_interval("a6"), None);
    assert_eq!(doc.annotation_interval("missing"), None);
}

#[test]
fn test_annotation_withIdOnChildTier_shouldReturnOwningTier() {
    let doc = ElanDocument::from_xml_str(&common::fixture("hierarchical.eaf")).unwrap();

    let (tier, annotation) = doc.annotation("a4").unwrap();

    assert_eq!(tier.id, "gloss@A");
    assert_eq!(annotation.annotation_ref(), Some("a2"));
    assert!(doc.resolve_annotation("a404").is_err());
}

#[test]
fn test_displayOrder_withNestedIntervals_shouldPutOuterFirst() {
    let doc = ElanDocument::from_xml_str(&common::fixture("hierarchical.eaf")).unwrap();

    let order: Vec<(&str, i64, i64)> = doc
        .display_order()
        .iter()
        .map(|a| (a.annotation.id.as_str(), a.start, a.end))
        .collect();

    assert_eq!(order, vec![("a1", 0, 2500), ("a2", 0, 1200), ("a3", 1200, 2500)]);
    // storage order is untouched
    assert_eq!(doc.tiers()[1].annotations[0].id, "a2");
}

#[test]
fn test_summary_shouldCountAnnotationsPerKind() {
    let doc = ElanDocument::from_xml_str(&common::fixture("hierarchical.eaf")).unwrap();

    let summary = doc.summary();

    assert_eq!(summary.time_slots, 5);
    assert_eq!(summary.valid_time_slots, 4);
    assert_eq!(summary.tiers.len(), 4);
    assert_eq!(summary.tiers[2].reference_annotations, 2);
    assert_eq!(summary.tiers[2].alignable_annotations, 0);
    assert_eq!(summary.media_type.as_deref(), Some("audio/x-wav"));
}

#[test]
fn test_resolveTier_withMissingId_shouldReturnTierNotFound() {
    let doc = common::build_sample_document();

    assert_eq!(doc.resolve_tier("tier1").unwrap().linguistic_type_ref, "gloss");
    assert!(matches!(
        doc.resolve_tier("tier7"),
        Err(elandoc::errors::ElanError::TierNotFound(id)) if id == "tier7"
    ));
}

#[test]
fn test_tierMut_shouldAllowEditingAnnotationValues() {
    let mut doc = common::build_sample_document();

    doc.tier_mut("tier0").unwrap().annotations[0].value = "hi".to_string();

    assert_eq!(doc.annotation("an0").unwrap().1.value, "hi");
}
