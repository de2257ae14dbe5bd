use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::domain::{ListingFilters, Page, PropertySummary};
use super::error::ListingError;
use super::ports::{IdentityProvider, PropertyRepository};

/// Outcome of a list query under the last-request-wins discipline.
#[derive(Debug, Clone, PartialEq)]
pub enum BrowseOutcome {
    /// This response belongs to the newest request issued for its query
    /// key and may be rendered.
    Fresh(Page<PropertySummary>),
    /// A newer request for the same key was issued while this one was in
    /// flight; the result must be discarded.
    Stale,
}

/// Read-only listing queries guarded by a monotonically increasing
/// sequence number per query key, so an older response can never overwrite
/// a fresher one.
pub struct ListingBrowser {
    repository: Arc<dyn PropertyRepository>,
    identity: Arc<dyn IdentityProvider>,
    sequences: Mutex<HashMap<String, u64>>,
}

impl ListingBrowser {
    pub fn new(
        repository: Arc<dyn PropertyRepository>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            repository,
            identity,
            sequences: Mutex::new(HashMap::new()),
        }
    }

    /// The key identifies the rendered panel: every filter except the page
    /// cursor, so a newer page request supersedes an older one for the
    /// same view.
    fn query_key(filters: &ListingFilters) -> String {
        format!(
            "q={:?}|status={:?}|type={:?}|city={:?}|state={:?}|price={:?}..{:?}|sort={:?}|size={}",
            filters.query,
            filters.status,
            filters.property_type,
            filters.city,
            filters.state,
            filters.min_price,
            filters.max_price,
            filters.sort,
            filters.page_size,
        )
    }

    fn issue(&self, key: &str) -> u64 {
        let mut sequences = self.sequences.lock().expect("sequence mutex poisoned");
        let next = sequences.get(key).copied().unwrap_or(0) + 1;
        sequences.insert(key.to_string(), next);
        next
    }

    fn latest(&self, key: &str) -> u64 {
        let sequences = self.sequences.lock().expect("sequence mutex poisoned");
        sequences.get(key).copied().unwrap_or(0)
    }

    pub async fn list(&self, filters: &ListingFilters) -> Result<BrowseOutcome, ListingError> {
        let profile = self.identity.current().await?;
        let org = profile.org_id.ok_or_else(ListingError::missing_org)?;

        let key = Self::query_key(filters);
        let ticket = self.issue(&key);

        let page = self.repository.list(&org, filters).await?;

        if self.latest(&key) != ticket {
            return Ok(BrowseOutcome::Stale);
        }
        Ok(BrowseOutcome::Fresh(page))
    }
}
