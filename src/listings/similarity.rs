//! Similarity ranking with progressive threshold fallback.
//!
//! Real inventories are sparse: strict filtering alone frequently yields an
//! empty panel for a new listing type. The ranking therefore tries a ladder
//! of minimum-score cutoffs in descending strictness and stops at the first
//! one that produces enough candidates, degrading gracefully instead of
//! returning nothing.

use std::sync::Arc;

use serde::Serialize;

use crate::config::ListingConfig;

use super::domain::{ListingFilters, PropertyId, PropertyStatus, PropertySummary, SortKey};
use super::error::ListingError;
use super::ports::{IdentityProvider, PropertyRepository};

/// Descending cutoffs tried before degrading to "whatever exists".
pub const FALLBACK_THRESHOLDS: [u8; 6] = [70, 50, 30, 20, 10, 0];

/// How many candidates the recommender pulls from the repository per run.
const CANDIDATE_POOL_SIZE: u32 = 200;

/// A candidate with its computed similarity score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredListing {
    pub summary: PropertySummary,
    pub score: u8,
}

/// Additive similarity score out of 100 between a reference listing and a
/// candidate.
pub fn score_pair(reference: &PropertySummary, candidate: &PropertySummary) -> u8 {
    let mut score = 0u8;

    if same_text(reference.state.as_deref(), candidate.state.as_deref()) {
        score += 20;
    }
    if same_text(reference.city.as_deref(), candidate.city.as_deref()) {
        score += 20;
    }
    if reference.property_type == candidate.property_type {
        score += 30;
    }
    score += price_proximity_points(reference, candidate);
    if let (Some(a), Some(b)) = (reference.bedrooms, candidate.bedrooms) {
        if a.abs_diff(b) <= 1 {
            score += 5;
        }
    }
    if area_within_30_percent(reference, candidate) {
        score += 5;
    }

    score
}

fn same_text(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
        _ => false,
    }
}

fn price_proximity_points(reference: &PropertySummary, candidate: &PropertySummary) -> u8 {
    // Mismatched currencies are incomparable and earn nothing.
    if reference.price.currency != candidate.price.currency || reference.price.amount == 0 {
        return 0;
    }

    let reference_amount = reference.price.amount as f64;
    let deviation =
        (candidate.price.amount as f64 - reference_amount).abs() / reference_amount;

    if deviation <= 0.30 {
        20
    } else if deviation <= 0.50 {
        10
    } else {
        0
    }
}

fn area_within_30_percent(reference: &PropertySummary, candidate: &PropertySummary) -> bool {
    match (
        reference.construction_area_m2,
        candidate.construction_area_m2,
    ) {
        (Some(a), Some(b)) if a > 0 => {
            let deviation = (b as f64 - a as f64).abs() / a as f64;
            deviation <= 0.30
        }
        _ => false,
    }
}

/// Rank candidates against the reference, walking the threshold ladder.
///
/// At the first cutoff where enough candidates qualify, the top `limit`
/// are returned sorted by score descending, ties kept in candidate order.
/// When no cutoff yields enough, every available candidate is returned.
pub fn rank(
    reference: &PropertySummary,
    candidates: &[PropertySummary],
    thresholds: &[u8],
    limit: usize,
) -> Vec<ScoredListing> {
    if limit == 0 {
        return Vec::new();
    }

    let scored: Vec<ScoredListing> = candidates
        .iter()
        .filter(|candidate| {
            candidate.id != reference.id && candidate.status == PropertyStatus::Published
        })
        .map(|candidate| ScoredListing {
            summary: candidate.clone(),
            score: score_pair(reference, candidate),
        })
        .collect();

    for cutoff in thresholds {
        let mut qualified: Vec<ScoredListing> = scored
            .iter()
            .filter(|entry| entry.score >= *cutoff)
            .cloned()
            .collect();
        if qualified.len() >= limit {
            qualified.sort_by(|a, b| b.score.cmp(&a.score));
            qualified.truncate(limit);
            return qualified;
        }
    }

    let mut all = scored;
    all.sort_by(|a, b| b.score.cmp(&a.score));
    all.truncate(limit);
    all
}

/// Repository-backed recommender resolving the reference listing and its
/// candidate pool inside the caller's organization.
pub struct SimilarityRecommender {
    repository: Arc<dyn PropertyRepository>,
    identity: Arc<dyn IdentityProvider>,
    config: ListingConfig,
}

impl SimilarityRecommender {
    pub fn new(
        repository: Arc<dyn PropertyRepository>,
        identity: Arc<dyn IdentityProvider>,
        config: ListingConfig,
    ) -> Self {
        Self {
            repository,
            identity,
            config,
        }
    }

    pub async fn recommend(
        &self,
        property_id: &PropertyId,
        limit: usize,
    ) -> Result<Vec<ScoredListing>, ListingError> {
        let profile = self.identity.current().await?;
        let org = profile.org_id.ok_or_else(ListingError::missing_org)?;

        let reference = self
            .repository
            .fetch(&org, property_id)
            .await?
            .filter(|property| !property.is_deleted())
            .ok_or(ListingError::NotFound("property"))?
            .summary();

        let filters = ListingFilters {
            status: Some(PropertyStatus::Published),
            sort: SortKey::Recent,
            page_size: CANDIDATE_POOL_SIZE,
            ..ListingFilters::default()
        };
        let pool = self.repository.list(&org, &filters).await?;

        Ok(rank(
            &reference,
            &pool.items,
            &self.config.similarity_fallback,
            limit,
        ))
    }
}
