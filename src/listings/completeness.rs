//! Readiness scoring for draft listings.
//!
//! The checklist is deliberately the single source of truth for both the
//! persisted score (recomputed on every update) and any transient progress
//! indicator computed before saving; sharing one evaluation path keeps the
//! two from drifting apart.

use serde::Serialize;

use super::domain::{Document, Property};

/// Items a listing must satisfy to count as complete. Each item carries
/// equal weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistItem {
    Title,
    PropertyType,
    PositivePrice,
    City,
    State,
    Description,
    Amenities,
    Media,
    Document,
}

pub const CHECKLIST: [ChecklistItem; 9] = [
    ChecklistItem::Title,
    ChecklistItem::PropertyType,
    ChecklistItem::PositivePrice,
    ChecklistItem::City,
    ChecklistItem::State,
    ChecklistItem::Description,
    ChecklistItem::Amenities,
    ChecklistItem::Media,
    ChecklistItem::Document,
];

impl ChecklistItem {
    pub const fn label(self) -> &'static str {
        match self {
            ChecklistItem::Title => "title",
            ChecklistItem::PropertyType => "property_type",
            ChecklistItem::PositivePrice => "price",
            ChecklistItem::City => "city",
            ChecklistItem::State => "state",
            ChecklistItem::Description => "description",
            ChecklistItem::Amenities => "amenities",
            ChecklistItem::Media => "media",
            ChecklistItem::Document => "document",
        }
    }

    fn satisfied(self, property: &Property, documents: &[Document], media_count: usize) -> bool {
        match self {
            ChecklistItem::Title => !property.title.trim().is_empty(),
            // A draft cannot exist without a type, so the item always
            // passes; it stays on the checklist to keep the published
            // weighting intact.
            ChecklistItem::PropertyType => true,
            ChecklistItem::PositivePrice => property.price.is_positive(),
            ChecklistItem::City => has_text(property.address.city.as_deref()),
            ChecklistItem::State => has_text(property.address.state.as_deref()),
            ChecklistItem::Description => has_text(property.description.as_deref()),
            ChecklistItem::Amenities => {
                !property.amenities.is_empty()
                    || has_text(property.amenities_extra.as_deref())
            }
            ChecklistItem::Media => media_count >= 1,
            // Any attached document counts here; the publish guard applies
            // the stricter trust-document rule separately.
            ChecklistItem::Document => !documents.is_empty(),
        }
    }
}

fn has_text(value: Option<&str>) -> bool {
    value.map(|text| !text.trim().is_empty()).unwrap_or(false)
}

/// Outcome of a checklist evaluation, with the item breakdown so callers
/// can render remediation hints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletenessReport {
    pub score: u8,
    pub satisfied: Vec<ChecklistItem>,
    pub missing: Vec<ChecklistItem>,
}

/// Evaluate the checklist against the listing and its attachments.
pub fn evaluate(
    property: &Property,
    documents: &[Document],
    media_count: usize,
) -> CompletenessReport {
    let mut satisfied = Vec::new();
    let mut missing = Vec::new();

    for item in CHECKLIST {
        if item.satisfied(property, documents, media_count) {
            satisfied.push(item);
        } else {
            missing.push(item);
        }
    }

    let score = ((satisfied.len() * 100) as f64 / CHECKLIST.len() as f64).round() as u8;

    CompletenessReport {
        score,
        satisfied,
        missing,
    }
}
