use chrono::Utc;

use super::common::bare_property;
use crate::listings::completeness::{evaluate, ChecklistItem, CHECKLIST};
use crate::listings::domain::{Document, DocumentId, DocumentType, FileMetadata, VerificationStatus};

fn any_document(property_id: &crate::listings::domain::PropertyId) -> Document {
    Document {
        id: DocumentId("doc-x".to_string()),
        property_id: property_id.clone(),
        doc_type: DocumentType::Other,
        verification: VerificationStatus::Pending,
        object_key: Some("docs/x.pdf".to_string()),
        url: None,
        metadata: FileMetadata::default(),
        created_at: Utc::now(),
    }
}

#[test]
fn bare_draft_scores_only_the_intrinsic_items() {
    let property = bare_property("prop-a", "Cozy house");
    let report = evaluate(&property, &[], 0);

    // Title, property type, and positive price.
    assert_eq!(report.satisfied.len(), 3);
    assert_eq!(report.score, 33);
    assert!(report.missing.contains(&ChecklistItem::City));
    assert!(report.missing.contains(&ChecklistItem::Media));
}

#[test]
fn fully_prepared_listing_scores_one_hundred() {
    let mut property = bare_property("prop-a", "Cozy house");
    property.description = Some("Bright and quiet.".to_string());
    property.address.city = Some("Guadalajara".to_string());
    property.address.state = Some("Jalisco".to_string());
    property.amenities.insert("garden".to_string());

    let documents = vec![any_document(&property.id)];
    let report = evaluate(&property, &documents, 2);

    assert_eq!(report.score, 100);
    assert!(report.missing.is_empty());
    assert_eq!(report.satisfied.len(), CHECKLIST.len());
}

#[test]
fn score_is_monotonic_as_items_are_added() {
    let mut property = bare_property("prop-a", "Cozy house");
    let mut last = evaluate(&property, &[], 0).score;

    property.address.city = Some("Guadalajara".to_string());
    let with_city = evaluate(&property, &[], 0).score;
    assert!(with_city >= last);
    last = with_city;

    property.address.state = Some("Jalisco".to_string());
    let with_state = evaluate(&property, &[], 0).score;
    assert!(with_state >= last);
    last = with_state;

    let with_media = evaluate(&property, &[], 1).score;
    assert!(with_media >= last);
}

#[test]
fn score_stays_within_bounds() {
    let mut property = bare_property("prop-a", "");
    property.price.amount = 0;
    let empty = evaluate(&property, &[], 0);
    assert!(empty.score <= 100);

    let full = bare_property("prop-b", "Another");
    let report = evaluate(&full, &[any_document(&full.id)], 1);
    assert!(report.score <= 100);
}

#[test]
fn free_text_amenities_satisfy_the_amenities_item() {
    let mut property = bare_property("prop-a", "Cozy house");
    assert!(evaluate(&property, &[], 0)
        .missing
        .contains(&ChecklistItem::Amenities));

    property.amenities_extra = Some("rooftop".to_string());
    assert!(evaluate(&property, &[], 0)
        .satisfied
        .contains(&ChecklistItem::Amenities));
}

#[test]
fn any_document_type_counts_for_completeness() {
    // The publish guard wants a verified trust document; the checklist
    // deliberately only asks for any attached document.
    let property = bare_property("prop-a", "Cozy house");
    let report = evaluate(&property, &[any_document(&property.id)], 0);
    assert!(report.satisfied.contains(&ChecklistItem::Document));
}

#[test]
fn blank_strings_do_not_count() {
    let mut property = bare_property("prop-a", "Cozy house");
    property.description = Some("   ".to_string());
    property.address.city = Some("".to_string());

    let report = evaluate(&property, &[], 0);
    assert!(report.missing.contains(&ChecklistItem::Description));
    assert!(report.missing.contains(&ChecklistItem::City));
}
