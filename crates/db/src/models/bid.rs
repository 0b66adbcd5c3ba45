use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// A supplier's bid, embedded in the owning tender's `bids` array.
/// Bids are append-only; retraction is not modeled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bid {
    pub id: ObjectId,
    pub tender_id: ObjectId,
    pub bidder_id: ObjectId,
    pub company_id: Option<ObjectId>,
    pub submitted_at: DateTime,
    pub price: PriceTerms,
    #[serde(default)]
    pub documents: Vec<BidDocument>,
    #[serde(default)]
    pub status: BidStatus,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BidStatus {
    #[default]
    Submitted,
    Awarded,
    Rejected,
}

/// All amounts are in øre to keep arithmetic exact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTerms {
    pub total_ore: i64,
    pub structure: PriceStructure,
    #[serde(default)]
    pub hourly_rates: Vec<HourlyRate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceStructure {
    FixedPrice,
    UnitPrice,
    CostPlus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyRate {
    pub role: String,
    pub rate_ore: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidDocument {
    pub file_name: String,
    pub storage_key: String,
    pub url: String,
    pub content_type: String,
    pub size: u64,
    pub uploaded_at: DateTime,
}
