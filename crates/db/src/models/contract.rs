use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use super::bid::PriceTerms;
use super::tender::ContractStandard;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub tender_id: ObjectId,
    pub bid_id: ObjectId,
    pub project_id: ObjectId,
    #[serde(default)]
    pub status: ContractStatus,
    pub customer: PartySnapshot,
    pub supplier: PartySnapshot,
    pub standard: ContractStandard,
    pub price: PriceTerms,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub changes: Vec<ContractChange>,
    pub signed_at: Option<DateTime>,
    pub signed_by: Option<ObjectId>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
    pub deleted_at: Option<DateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    #[default]
    Draft,
    PendingSignature,
    Signed,
    Amended,
}

/// Contracting-party details frozen at generation time, so later edits
/// to the company or user documents do not rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartySnapshot {
    pub company_id: Option<ObjectId>,
    pub name: String,
    pub org_number: Option<String>,
    pub contact_email: Option<String>,
}

/// Append-only amendment record. Never edited or removed once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractChange {
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: String,
    pub reason: String,
    pub changed_by: ObjectId,
    pub changed_at: DateTime,
    pub version: u32,
}

fn default_version() -> u32 {
    1
}

impl Contract {
    pub const COLLECTION: &'static str = "contracts";
}
