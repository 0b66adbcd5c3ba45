use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use anbud_db::models::{Contract, ContractChange, ContractStatus, PartySnapshot};
use anbud_services::contract::NewContractChange;

use crate::{error::ApiError, extractors::identity::Identity, state::AppState};

use super::{parse_oid, rfc3339};

#[derive(Debug, Serialize)]
pub struct ContractResponse {
    pub id: String,
    pub tender_id: String,
    pub bid_id: String,
    pub project_id: String,
    pub status: ContractStatus,
    pub customer: PartyResponse,
    pub supplier: PartyResponse,
    pub standard: String,
    pub total_ore: i64,
    pub version: u32,
    pub changes: Vec<ChangeResponse>,
    pub signed_at: Option<String>,
    pub signed_by: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PartyResponse {
    pub company_id: Option<String>,
    pub name: String,
    pub org_number: Option<String>,
    pub contact_email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChangeResponse {
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: String,
    pub reason: String,
    pub changed_by: String,
    pub changed_at: String,
    pub version: u32,
}

fn party_response(party: &PartySnapshot) -> PartyResponse {
    PartyResponse {
        company_id: party.company_id.map(|id| id.to_hex()),
        name: party.name.clone(),
        org_number: party.org_number.clone(),
        contact_email: party.contact_email.clone(),
    }
}

fn change_response(change: &ContractChange) -> ChangeResponse {
    ChangeResponse {
        field: change.field.clone(),
        old_value: change.old_value.clone(),
        new_value: change.new_value.clone(),
        reason: change.reason.clone(),
        changed_by: change.changed_by.to_hex(),
        changed_at: rfc3339(change.changed_at),
        version: change.version,
    }
}

fn to_response(c: &Contract) -> ContractResponse {
    ContractResponse {
        id: c.id.map(|id| id.to_hex()).unwrap_or_default(),
        tender_id: c.tender_id.to_hex(),
        bid_id: c.bid_id.to_hex(),
        project_id: c.project_id.to_hex(),
        status: c.status,
        customer: party_response(&c.customer),
        supplier: party_response(&c.supplier),
        standard: format!("{:?}", c.standard).to_uppercase(),
        total_ore: c.price.total_ore,
        version: c.version,
        changes: c.changes.iter().map(change_response).collect(),
        signed_at: c.signed_at.map(rfc3339),
        signed_by: c.signed_by.map(|id| id.to_hex()),
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateContractRequest {
    pub tender_id: String,
    pub bid_id: String,
    pub project_id: String,
}

pub async fn generate(
    State(state): State<AppState>,
    Json(body): Json<GenerateContractRequest>,
) -> Result<Json<ContractResponse>, ApiError> {
    let tender_id = parse_oid(&body.tender_id, "tender_id")?;
    let bid_id = parse_oid(&body.bid_id, "bid_id")?;
    let project_id = parse_oid(&body.project_id, "project_id")?;

    let contract = state
        .contracts
        .generate_contract(tender_id, bid_id, project_id)
        .await?;
    Ok(Json(to_response(&contract)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(contract_id): Path<String>,
) -> Result<Json<ContractResponse>, ApiError> {
    let id = parse_oid(&contract_id, "contract_id")?;
    let contract = state.contracts.get(id).await?;
    Ok(Json(to_response(&contract)))
}

pub async fn sign(
    State(state): State<AppState>,
    identity: Identity,
    Path(contract_id): Path<String>,
) -> Result<Json<ContractResponse>, ApiError> {
    let id = parse_oid(&contract_id, "contract_id")?;
    let contract = state.contracts.sign_contract(id, identity.user_id).await?;
    Ok(Json(to_response(&contract)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddChangeRequest {
    #[validate(length(min = 1, max = 100))]
    pub field: String,
    pub old_value: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub new_value: String,
    #[validate(length(min = 1, max = 2000))]
    pub reason: String,
}

pub async fn add_change(
    State(state): State<AppState>,
    identity: Identity,
    Path(contract_id): Path<String>,
    Json(body): Json<AddChangeRequest>,
) -> Result<Json<ContractResponse>, ApiError> {
    body.validate()?;
    let id = parse_oid(&contract_id, "contract_id")?;

    let contract = state
        .contracts
        .add_change(
            id,
            NewContractChange {
                field: body.field,
                old_value: body.old_value,
                new_value: body.new_value,
                reason: body.reason,
            },
            identity.user_id,
        )
        .await?;
    Ok(Json(to_response(&contract)))
}
