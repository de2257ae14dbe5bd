use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for property aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyId(pub String);

/// Identifier wrapper for media assets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaId(pub String);

/// Identifier wrapper for supporting documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub String);

/// Identifier wrapper for the owning organization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrgId(pub String);

/// Identifier wrapper for the listing owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Lifecycle states a property moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    Draft,
    Published,
    Sold,
    Archived,
}

impl PropertyStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PropertyStatus::Draft => "draft",
            PropertyStatus::Published => "published",
            PropertyStatus::Sold => "sold",
            PropertyStatus::Archived => "archived",
        }
    }
}

/// KYC state resolved by the identity provider for the current caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    Verified,
    Pending,
    Rejected,
}

/// Read-only profile returned by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthProfile {
    pub org_id: Option<OrgId>,
    pub kyc_status: KycStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    House,
    Apartment,
    Condo,
    Land,
    Commercial,
}

impl PropertyType {
    pub const fn label(self) -> &'static str {
        match self {
            PropertyType::House => "house",
            PropertyType::Apartment => "apartment",
            PropertyType::Condo => "condo",
            PropertyType::Land => "land",
            PropertyType::Commercial => "commercial",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Sale,
    Rent,
}

/// Asking price in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub amount: u64,
    pub currency: String,
}

impl Price {
    pub fn is_positive(&self) -> bool {
        self.amount > 0
    }
}

/// Postal address; city and state are what the publish checklist cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Physical attributes of the unit; all optional while drafting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicalAttributes {
    pub bedrooms: Option<u8>,
    pub bathrooms: Option<f32>,
    pub parking_spaces: Option<u8>,
    pub construction_area_m2: Option<u32>,
    pub land_area_m2: Option<u32>,
    pub levels: Option<u8>,
    pub year_built: Option<u16>,
    pub floor: Option<i16>,
    pub hoa_fee: Option<u64>,
    pub condition: Option<String>,
    pub orientation: Option<String>,
    pub furnished: Option<bool>,
    pub pet_friendly: Option<bool>,
}

/// The aggregate root for a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub org_id: OrgId,
    pub owner_id: UserId,
    pub status: PropertyStatus,
    pub title: String,
    pub description: Option<String>,
    pub price: Price,
    pub property_type: PropertyType,
    pub operation_type: OperationType,
    pub physical: PhysicalAttributes,
    pub address: Address,
    pub location: Option<GeoPoint>,
    pub amenities: BTreeSet<String>,
    pub amenities_extra: Option<String>,
    pub tags: Vec<String>,
    pub completeness_score: u8,
    /// Mirrors the trust document's verification state for quick reads.
    pub rpp_verification: Option<VerificationStatus>,
    pub sale_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub publish_scheduled_at: Option<DateTime<Utc>>,
    pub sold_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Property {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Merge a patch into the aggregate. Callers enforce which fields may
    /// change in which status; this merge is unconditional.
    pub fn apply_patch(&mut self, patch: PropertyPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(property_type) = patch.property_type {
            self.property_type = property_type;
        }
        if let Some(operation_type) = patch.operation_type {
            self.operation_type = operation_type;
        }
        if let Some(physical) = patch.physical {
            self.physical = physical;
        }
        if let Some(address) = patch.address {
            self.address = address;
        }
        if let Some(location) = patch.location {
            self.location = Some(location);
        }
        if let Some(amenities) = patch.amenities {
            self.amenities = amenities;
        }
        if let Some(amenities_extra) = patch.amenities_extra {
            self.amenities_extra = Some(amenities_extra);
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
    }

    pub fn summary(&self) -> PropertySummary {
        PropertySummary {
            id: self.id.clone(),
            org_id: self.org_id.clone(),
            title: self.title.clone(),
            status: self.status,
            property_type: self.property_type,
            operation_type: self.operation_type,
            price: self.price.clone(),
            city: self.address.city.clone(),
            state: self.address.state.clone(),
            bedrooms: self.physical.bedrooms,
            construction_area_m2: self.physical.construction_area_m2,
            completeness_score: self.completeness_score,
            published_at: self.published_at,
        }
    }
}

/// Partial update applied through the lifecycle manager.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub property_type: Option<PropertyType>,
    pub operation_type: Option<OperationType>,
    pub physical: Option<PhysicalAttributes>,
    pub address: Option<Address>,
    pub location: Option<GeoPoint>,
    pub amenities: Option<BTreeSet<String>>,
    pub amenities_extra: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl PropertyPatch {
    /// Structural fields may not change once a listing is published.
    pub fn touches_structural_fields(&self) -> bool {
        self.price.is_some()
            || self.property_type.is_some()
            || self.operation_type.is_some()
            || self.address.is_some()
    }
}

/// Fields required to open a new draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDraft {
    pub title: String,
    pub price: Price,
    pub property_type: PropertyType,
    pub operation_type: OperationType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Floorplan,
}

/// Known file facts plus a typed open extension map; never untyped JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

/// A durable media record attached to exactly one property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub id: MediaId,
    pub property_id: PropertyId,
    pub kind: MediaKind,
    /// Contiguous 0-based slot within the property's gallery.
    pub position: u32,
    pub is_cover: bool,
    pub object_key: String,
    pub url: String,
    pub metadata: FileMetadata,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    RppCertificate,
    Deed,
    IdDocument,
    Plan,
    Other,
}

impl DocumentType {
    pub const fn label(self) -> &'static str {
        match self {
            DocumentType::RppCertificate => "rpp_certificate",
            DocumentType::Deed => "deed",
            DocumentType::IdDocument => "id_doc",
            DocumentType::Plan => "plan",
            DocumentType::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Rejected => "rejected",
        }
    }
}

/// A supporting document attached to exactly one property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub property_id: PropertyId,
    pub doc_type: DocumentType,
    pub verification: VerificationStatus,
    pub object_key: Option<String>,
    pub url: Option<String>,
    pub metadata: FileMetadata,
    pub created_at: DateTime<Utc>,
}

/// Compact projection served by list queries and the recommender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySummary {
    pub id: PropertyId,
    pub org_id: OrgId,
    pub title: String,
    pub status: PropertyStatus,
    pub property_type: PropertyType,
    pub operation_type: OperationType,
    pub price: Price,
    pub city: Option<String>,
    pub state: Option<String>,
    pub bedrooms: Option<u8>,
    pub construction_area_m2: Option<u32>,
    pub completeness_score: u8,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Recent,
    PriceAsc,
    PriceDesc,
    CompletenessDesc,
}

/// Filters accepted by the repository's list surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingFilters {
    pub query: Option<String>,
    pub status: Option<PropertyStatus>,
    pub property_type: Option<PropertyType>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub sort: SortKey,
    pub page: u32,
    pub page_size: u32,
}

impl Default for ListingFilters {
    fn default() -> Self {
        Self {
            query: None,
            status: None,
            property_type: None,
            city: None,
            state: None,
            min_price: None,
            max_price: None,
            sort: SortKey::Recent,
            page: 1,
            page_size: 20,
        }
    }
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}
