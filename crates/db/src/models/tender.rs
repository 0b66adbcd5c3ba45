use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use super::bid::{Bid, PriceTerms};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tender {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub description: String,
    pub terms: StandardTerms,
    pub creator_id: ObjectId,
    pub deadline: DateTime,
    pub publish_date: Option<DateTime>,
    pub question_deadline: Option<DateTime>,
    pub budget_ore: Option<i64>,
    #[serde(default)]
    pub evaluation: EvaluationModel,
    #[serde(default)]
    pub status: TenderStatus,
    #[serde(default)]
    pub invitations: Vec<Invitation>,
    #[serde(default)]
    pub bids: Vec<Bid>,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub documents: Vec<TenderDocument>,
    pub awarded_bid_id: Option<ObjectId>,
    pub awarded_at: Option<DateTime>,
    pub standstill_start_date: Option<DateTime>,
    pub standstill_end_date: Option<DateTime>,
    pub award_letter: Option<AwardLetter>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
    pub deleted_at: Option<DateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TenderStatus {
    #[default]
    Draft,
    Open,
    Closed,
    Awarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationModel {
    #[default]
    LowestPrice,
    BestValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStandard {
    Ns8405,
    Ns8406,
    Ns8407,
}

/// Standard-specific commercial terms. Tagged by contract standard so a
/// tender only ever carries the sub-object that applies to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "standard", rename_all = "snake_case")]
pub enum StandardTerms {
    Ns8405(Ns8405Terms),
    Ns8406(Ns8406Terms),
    Ns8407(Ns8407Terms),
}

impl StandardTerms {
    pub fn standard(&self) -> ContractStandard {
        match self {
            StandardTerms::Ns8405(_) => ContractStandard::Ns8405,
            StandardTerms::Ns8406(_) => ContractStandard::Ns8406,
            StandardTerms::Ns8407(_) => ContractStandard::Ns8407,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ns8405Terms {
    pub security_percent: u8,
    pub defect_liability_years: u8,
    pub daily_penalty_permille: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ns8406Terms {
    pub security_percent: u8,
    pub defect_liability_years: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ns8407Terms {
    pub security_percent: u8,
    pub defect_liability_years: u8,
    pub design_handover_weeks: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    pub user_id: Option<ObjectId>,
    pub company_id: Option<ObjectId>,
    pub email: Option<String>,
    pub invited_at: DateTime,
    #[serde(default)]
    pub status: InvitationStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    #[default]
    Invited,
    Viewed,
    Submitted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: ObjectId,
    pub asker_id: ObjectId,
    pub text: String,
    pub asked_at: DateTime,
    pub answer: Option<String>,
    pub answered_by: Option<ObjectId>,
    pub answered_at: Option<DateTime>,
}

/// One version record of a tender attachment. Overwriting a logical
/// document appends a new record with a bumped version rather than
/// mutating the previous one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenderDocument {
    pub doc_id: ObjectId,
    pub file_name: String,
    pub storage_key: String,
    pub url: String,
    pub content_type: String,
    pub size: u64,
    pub version: u32,
    pub reason: DocumentChangeReason,
    pub uploaded_by: ObjectId,
    pub uploaded_at: DateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentChangeReason {
    Created,
    Updated,
}

/// Immutable record of the award decision, stored as a snapshot on the
/// tender at the moment of award.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardLetter {
    pub tender_id: ObjectId,
    pub bid_id: ObjectId,
    pub project_id: ObjectId,
    pub awardee_user_id: ObjectId,
    pub awardee_company_id: Option<ObjectId>,
    pub awardee_email: Option<String>,
    pub awarded_at: DateTime,
    pub standstill_start: DateTime,
    pub standstill_end: DateTime,
    pub price: PriceTerms,
    #[serde(default)]
    pub status: AwardLetterStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AwardLetterStatus {
    #[default]
    Standstill,
    ReadyForSigning,
    Signed,
}

impl Tender {
    pub const COLLECTION: &'static str = "tenders";

    pub fn standard(&self) -> ContractStandard {
        self.terms.standard()
    }
}
