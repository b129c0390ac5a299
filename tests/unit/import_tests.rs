/*!
 * Tests for EAF import
 */

use elandoc::elan::{ElanDocument, ImportOptions, ReferenceIssue};
use elandoc::errors::ElanError;
use crate::common;

fn single_slot(time_units: &str, value: &str) -> String {
    common::eaf(
        time_units,
        &format!(r#"<TIME_SLOT TIME_SLOT_ID="ts1" TIME_VALUE="{}"/>"#, value),
        "",
    )
}

#[test]
fn test_importXml_withSecondsUnits_shouldConvertToMilliseconds() {
    let doc = ElanDocument::from_xml_str(&single_slot("seconds", "1.5")).unwrap();

    assert_eq!(doc.time_slot("ts1").unwrap().value, 1500);
}

#[test]
fn test_importXml_withMillisecondUnits_shouldKeepValues() {
    let doc = ElanDocument::from_xml_str(&single_slot("milliseconds", "1500")).unwrap();

    assert_eq!(doc.time_slot("ts1").unwrap().value, 1500);
}

#[test]
fn test_importXml_withFractionalSeconds_shouldFloor() {
    let doc = ElanDocument::from_xml_str(&single_slot("seconds", "2.0007")).unwrap();

    assert_eq!(doc.time_slot("ts1").unwrap().value, 2000);
}

#[test]
fn test_importXml_withParsedHandle_shouldImport() {
    let xml = common::fixture("hierarchical.eaf");
    let parsed = roxmltree::Document::parse(&xml).unwrap();
    let mut doc = ElanDocument::new();

    let summary = doc.import_xml(&parsed).unwrap();

    assert_eq!(summary.time_slots_added, 5);
    assert_eq!(summary.unaligned_time_slots, 1);
    assert_eq!(summary.tiers_added, 4);
    assert_eq!(summary.annotations_added, 6);
    assert!(summary.issues.is_empty());
}

#[test]
fn test_importXml_withHeader_shouldReadMediaAndProperties() {
    let doc = ElanDocument::from_xml_str(&common::fixture("hierarchical.eaf")).unwrap();

    assert_eq!(doc.media_url.as_deref(), Some("file:///recordings/story.wav"));
    assert_eq!(doc.media_type.as_deref(), Some("audio/x-wav"));
    assert_eq!(doc.media_file, None);
    assert_eq!(doc.counters().last_used_annotation_id, 12);
}

#[test]
fn test_importXml_withTierAttributes_shouldReadThem() {
    let doc = ElanDocument::from_xml_str(&common::fixture("hierarchical.eaf")).unwrap();

    let speaker = doc.tier("Speaker A").unwrap();
    assert_eq!(speaker.linguistic_type_ref, "utterance");
    assert_eq!(speaker.default_locale.as_deref(), Some("en"));
    assert!(speaker.parent_ref.is_none());

    let words = doc.tier("words@A").unwrap();
    assert_eq!(words.parent_ref.as_deref(), Some("Speaker A"));
    assert!(words.default_locale.is_none());
}

#[test]
fn test_importXml_withPaddedValue_shouldTrim() {
    let doc = ElanDocument::from_xml_str(&common::fixture("hierarchical.eaf")).unwrap();

    assert_eq!(doc.annotation("a1").unwrap().1.value, "once upon a time");
}

#[test]
fn test_importXml_withSoftHyphen_shouldReplaceBySpace() {
    let doc = ElanDocument::from_xml_str(&common::fixture("hierarchical.eaf")).unwrap();

    assert_eq!(doc.annotation("a2").unwrap().1.value, "once upon");
}

#[test]
fn test_importXml_withSoftHyphenReplacementDisabled_shouldKeepIt() {
    let options = ImportOptions {
        replace_soft_hyphens: false,
        ..Default::default()
    };
    let mut doc = ElanDocument::new();
    doc.import_str(&common::fixture("hierarchical.eaf"), &options).unwrap();

    assert_eq!(doc.annotation("a2").unwrap().1.value, "once\u{AD}upon");
}

#[test]
fn test_importXml_withDuplicateSlotId_shouldKeepFirstOccurrence() {
    let xml = common::eaf(
        "milliseconds",
        r#"<TIME_SLOT TIME_SLOT_ID="ts1" TIME_VALUE="10"/><TIME_SLOT TIME_SLOT_ID="ts1" TIME_VALUE="20"/>"#,
        "",
    );
    let mut doc = ElanDocument::new();

    let summary = doc.import_str(&xml, &ImportOptions::default()).unwrap();

    assert_eq!(doc.time_slots().len(), 1);
    assert_eq!(doc.time_slot("ts1").unwrap().value, 10);
    assert_eq!(summary.duplicate_time_slots, 1);
}

#[test]
fn test_importXml_twiceIntoSameDocument_shouldNotDuplicate() {
    let xml = common::fixture("hierarchical.eaf");
    let mut doc = ElanDocument::new();
    doc.import_str(&xml, &ImportOptions::default()).unwrap();

    let summary = doc.import_str(&xml, &ImportOptions::default()).unwrap();

    assert_eq!(summary.time_slots_added, 0);
    assert_eq!(summary.duplicate_time_slots, 5);
    assert_eq!(summary.duplicate_tiers, 4);
    assert_eq!(doc.time_slots().len(), 5);
    assert_eq!(doc.tiers().len(), 4);
}

#[test]
fn test_importXml_withMintedIds_shouldResyncCounters() {
    let xml = common::eaf(
        "milliseconds",
        r#"<TIME_SLOT TIME_SLOT_ID="ts0" TIME_VALUE="0"/><TIME_SLOT TIME_SLOT_ID="ts7" TIME_VALUE="70"/>"#,
        r#"<TIER TIER_ID="tier3" LINGUISTIC_TYPE_REF="lt">
            <ANNOTATION><ALIGNABLE_ANNOTATION ANNOTATION_ID="an4" TIME_SLOT_REF1="ts0" TIME_SLOT_REF2="ts7">
                <ANNOTATION_VALUE>x</ANNOTATION_VALUE></ALIGNABLE_ANNOTATION></ANNOTATION>
        </TIER>"#,
    );
    let mut doc = ElanDocument::from_xml_str(&xml).unwrap();

    assert_eq!(doc.create_tier("lt", "en"), "tier4");
    assert_eq!(doc.create_annotation("tier3", "y", 5, 70).as_deref(), Some("an5"));
    assert!(doc.time_slot("ts8").is_some());
    assert_eq!(doc.time_slot("ts8").unwrap().value, 5);
}

#[test]
fn test_importXml_withoutResync_shouldStillAvoidCollisions() {
    let xml = common::eaf(
        "milliseconds",
        r#"<TIME_SLOT TIME_SLOT_ID="ts0" TIME_VALUE="0"/><TIME_SLOT TIME_SLOT_ID="ts1" TIME_VALUE="10"/>"#,
        r#"<TIER TIER_ID="tier0" LINGUISTIC_TYPE_REF="lt">
            <ANNOTATION><ALIGNABLE_ANNOTATION ANNOTATION_ID="an0" TIME_SLOT_REF1="ts0" TIME_SLOT_REF2="ts1">
                <ANNOTATION_VALUE>x</ANNOTATION_VALUE></ALIGNABLE_ANNOTATION></ANNOTATION>
        </TIER>"#,
    );
    let options = ImportOptions {
        resync_counters: false,
        ..Default::default()
    };
    let mut doc = ElanDocument::new();
    doc.import_str(&xml, &options).unwrap();
    assert_eq!(doc.counters().last_used_time_slot_id, 0);

    assert_eq!(doc.create_tier("lt", "en"), "tier1");
    assert_eq!(doc.create_annotation("tier0", "y", 20, 30).as_deref(), Some("an1"));
    assert!(doc.time_slot("ts2").is_some());
    assert!(doc.time_slot("ts3").is_some());
}

#[test]
fn test_importXml_withStrictMode_shouldReportUnresolvedReferences() {
    let options = ImportOptions {
        strict: true,
        ..Default::default()
    };
    let mut doc = ElanDocument::new();

    let summary = doc.import_str(&common::fixture("hierarchical.eaf"), &options).unwrap();

    assert_eq!(
        summary.issues,
        vec![ReferenceIssue::MissingTimeSlot {
            annotation_id: "a6".to_string(),
            time_slot_ref: "ts6".to_string(),
        }]
    );
}

#[test]
fn test_importXml_withoutHeader_shouldFailWithMalformedDocument() {
    let xml = r#"<ANNOTATION_DOCUMENT><TIME_ORDER/></ANNOTATION_DOCUMENT>"#;
    let mut doc = ElanDocument::new();

    let result = doc.import_str(xml, &ImportOptions::default());

    assert!(matches!(result, Err(ElanError::MalformedDocument(_))));
    assert!(doc.time_slots().is_empty());
}

#[test]
fn test_importXml_withoutMediaDescriptor_shouldFailAndLeaveDocumentUntouched() {
    let xml = r#"<ANNOTATION_DOCUMENT>
        <HEADER TIME_UNITS="milliseconds"/>
        <TIME_ORDER><TIME_SLOT TIME_SLOT_ID="ts1" TIME_VALUE="5"/></TIME_ORDER>
    </ANNOTATION_DOCUMENT>"#;
    let mut doc = ElanDocument::new();

    let result = doc.import_str(xml, &ImportOptions::default());

    assert!(matches!(result, Err(ElanError::MalformedDocument(msg)) if msg.contains("MEDIA_DESCRIPTOR")));
    assert!(doc.time_slots().is_empty());
}

#[test]
fn test_importXml_withWrongRoot_shouldFail() {
    let result = ElanDocument::from_xml_str("<SUBTITLES/>");

    assert!(matches!(result, Err(ElanError::MalformedDocument(_))));
}

#[test]
fn test_importXml_withBrokenXml_shouldFailWithParseError() {
    let result = ElanDocument::from_xml_str("<ANNOTATION_DOCUMENT><HEADER>");

    assert!(matches!(result, Err(ElanError::Parse(_))));
}

#[test]
fn test_importXml_withNonNumericTimeValue_shouldFail() {
    let result = ElanDocument::from_xml_str(&single_slot("milliseconds", "soon"));

    assert!(matches!(
        result,
        Err(ElanError::InvalidTimeValue { slot_id, value }) if slot_id == "ts1" && value == "soon"
    ));
}

#[test]
fn test_importXml_withMaximalLastUsedAnnotationId_shouldStillCreateAnnotations() {
    let xml = common::eaf("milliseconds", "", r#"<TIER TIER_ID="t" LINGUISTIC_TYPE_REF="lt"/>"#).replace(
        "</HEADER>",
        r#"<PROPERTY NAME="lastUsedAnnotationId">18446744073709551615</PROPERTY></HEADER>"#,
    );
    let mut doc = ElanDocument::from_xml_str(&xml).unwrap();
    assert_eq!(doc.counters().last_used_annotation_id, u64::MAX);

    let first = doc.create_annotation("t", "x", 0, 10).unwrap();
    let second = doc.create_annotation("t", "y", 10, 20).unwrap();

    assert_eq!(first, "an18446744073709551615");
    assert_eq!(second, "an0");
}

#[test]
fn test_importXml_withMaximalMintedTierId_shouldStillCreateTiers() {
    let xml = common::eaf(
        "milliseconds",
        "",
        r#"<TIER TIER_ID="tier18446744073709551615" LINGUISTIC_TYPE_REF="lt"/>"#,
    );
    let mut doc = ElanDocument::from_xml_str(&xml).unwrap();

    let id = doc.create_tier("lt", "en");

    assert_eq!(id, "tier0");
    assert_eq!(doc.tiers().len(), 2);
}
