use axum::{
    Json,
    extract::{Multipart, Path, State},
};
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use anbud_db::models::{
    Bid, BidStatus, EvaluationModel, Invitation, InvitationStatus, Question, StandardTerms,
    Tender, TenderDocument, TenderStatus,
};
use anbud_services::tender::{DocumentUpload, NewInvitation, NewTender};

use crate::{error::ApiError, extractors::identity::Identity, state::AppState};

use super::{parse_oid, rfc3339};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTenderRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    pub terms: StandardTerms,
    pub deadline: chrono::DateTime<chrono::Utc>,
    pub question_deadline: Option<chrono::DateTime<chrono::Utc>>,
    pub budget_ore: Option<i64>,
    #[serde(default)]
    pub evaluation: EvaluationModel,
}

#[derive(Debug, Serialize)]
pub struct TenderResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub standard: String,
    pub status: TenderStatus,
    pub creator_id: String,
    pub deadline: String,
    pub publish_date: Option<String>,
    pub question_deadline: Option<String>,
    pub budget_ore: Option<i64>,
    pub evaluation: EvaluationModel,
    pub invitations: Vec<InvitationResponse>,
    pub bids: Vec<BidResponse>,
    pub questions: Vec<QuestionResponse>,
    pub documents: Vec<DocumentResponse>,
    pub awarded_bid_id: Option<String>,
    pub awarded_at: Option<String>,
    pub standstill_end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InvitationResponse {
    pub user_id: Option<String>,
    pub company_id: Option<String>,
    pub email: Option<String>,
    pub invited_at: String,
    pub status: InvitationStatus,
}

#[derive(Debug, Serialize)]
pub struct BidResponse {
    pub id: String,
    pub bidder_id: String,
    pub company_id: Option<String>,
    pub submitted_at: String,
    pub total_ore: i64,
    pub status: BidStatus,
    pub score: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct QuestionResponse {
    pub id: String,
    pub asker_id: String,
    pub text: String,
    pub asked_at: String,
    pub answer: Option<String>,
    pub answered_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub doc_id: String,
    pub file_name: String,
    pub url: String,
    pub content_type: String,
    pub size: u64,
    pub version: u32,
    pub reason: String,
    pub uploaded_at: String,
}

fn invitation_response(inv: &Invitation) -> InvitationResponse {
    InvitationResponse {
        user_id: inv.user_id.map(|id| id.to_hex()),
        company_id: inv.company_id.map(|id| id.to_hex()),
        email: inv.email.clone(),
        invited_at: rfc3339(inv.invited_at),
        status: inv.status,
    }
}

fn bid_response(bid: &Bid) -> BidResponse {
    BidResponse {
        id: bid.id.to_hex(),
        bidder_id: bid.bidder_id.to_hex(),
        company_id: bid.company_id.map(|id| id.to_hex()),
        submitted_at: rfc3339(bid.submitted_at),
        total_ore: bid.price.total_ore,
        status: bid.status,
        score: bid.score,
    }
}

fn question_response(q: &Question) -> QuestionResponse {
    QuestionResponse {
        id: q.id.to_hex(),
        asker_id: q.asker_id.to_hex(),
        text: q.text.clone(),
        asked_at: rfc3339(q.asked_at),
        answer: q.answer.clone(),
        answered_at: q.answered_at.map(rfc3339),
    }
}

fn document_response(d: &TenderDocument) -> DocumentResponse {
    DocumentResponse {
        doc_id: d.doc_id.to_hex(),
        file_name: d.file_name.clone(),
        url: d.url.clone(),
        content_type: d.content_type.clone(),
        size: d.size,
        version: d.version,
        reason: format!("{:?}", d.reason).to_lowercase(),
        uploaded_at: rfc3339(d.uploaded_at),
    }
}

pub(crate) fn to_response(t: &Tender) -> TenderResponse {
    TenderResponse {
        id: t.id.map(|id| id.to_hex()).unwrap_or_default(),
        title: t.title.clone(),
        description: t.description.clone(),
        standard: format!("{:?}", t.standard()).to_uppercase(),
        status: t.status,
        creator_id: t.creator_id.to_hex(),
        deadline: rfc3339(t.deadline),
        publish_date: t.publish_date.map(rfc3339),
        question_deadline: t.question_deadline.map(rfc3339),
        budget_ore: t.budget_ore,
        evaluation: t.evaluation,
        invitations: t.invitations.iter().map(invitation_response).collect(),
        bids: t.bids.iter().map(bid_response).collect(),
        questions: t.questions.iter().map(question_response).collect(),
        documents: t.documents.iter().map(document_response).collect(),
        awarded_bid_id: t.awarded_bid_id.map(|id| id.to_hex()),
        awarded_at: t.awarded_at.map(rfc3339),
        standstill_end_date: t.standstill_end_date.map(rfc3339),
    }
}

pub async fn create(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<CreateTenderRequest>,
) -> Result<Json<TenderResponse>, ApiError> {
    body.validate()?;

    let tender = state
        .tenders
        .create(NewTender {
            title: body.title,
            description: body.description,
            terms: body.terms,
            creator_id: identity.user_id,
            deadline: bson::DateTime::from_chrono(body.deadline),
            question_deadline: body.question_deadline.map(bson::DateTime::from_chrono),
            budget_ore: body.budget_ore,
            evaluation: body.evaluation,
        })
        .await?;

    Ok(Json(to_response(&tender)))
}

pub async fn list(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<TenderResponse>>, ApiError> {
    let tenders = state.tenders.list_by_creator(identity.user_id).await?;
    Ok(Json(tenders.iter().map(to_response).collect()))
}

pub async fn get(
    State(state): State<AppState>,
    Path(tender_id): Path<String>,
) -> Result<Json<TenderResponse>, ApiError> {
    let id = parse_oid(&tender_id, "tender_id")?;
    let tender = state.tenders.get(id).await?;
    Ok(Json(to_response(&tender)))
}

pub async fn publish(
    State(state): State<AppState>,
    Path(tender_id): Path<String>,
) -> Result<Json<TenderResponse>, ApiError> {
    let id = parse_oid(&tender_id, "tender_id")?;
    let tender = state.tenders.publish(id).await?;
    Ok(Json(to_response(&tender)))
}

pub async fn close(
    State(state): State<AppState>,
    Path(tender_id): Path<String>,
) -> Result<Json<TenderResponse>, ApiError> {
    let id = parse_oid(&tender_id, "tender_id")?;
    let tender = state.tenders.close(id).await?;
    Ok(Json(to_response(&tender)))
}

pub async fn reopen(
    State(state): State<AppState>,
    Path(tender_id): Path<String>,
) -> Result<Json<TenderResponse>, ApiError> {
    let id = parse_oid(&tender_id, "tender_id")?;
    let tender = state.tenders.reopen(id).await?;
    Ok(Json(to_response(&tender)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct InviteRequest {
    pub user_id: Option<String>,
    pub company_id: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
}

pub async fn invite(
    State(state): State<AppState>,
    Path(tender_id): Path<String>,
    Json(body): Json<InviteRequest>,
) -> Result<Json<TenderResponse>, ApiError> {
    body.validate()?;
    let id = parse_oid(&tender_id, "tender_id")?;

    let user_id = body
        .user_id
        .as_deref()
        .map(|v| parse_oid(v, "user_id"))
        .transpose()?;
    let company_id = body
        .company_id
        .as_deref()
        .map(|v| parse_oid(v, "company_id"))
        .transpose()?;

    let tender = state
        .tenders
        .invite_supplier(
            id,
            NewInvitation {
                user_id,
                company_id,
                email: body.email,
            },
        )
        .await?;
    Ok(Json(to_response(&tender)))
}

pub async fn mark_invitation_viewed(
    State(state): State<AppState>,
    identity: Identity,
    Path(tender_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_oid(&tender_id, "tender_id")?;
    state
        .tenders
        .mark_invitation_viewed(id, identity.user_id)
        .await?;
    Ok(Json(serde_json::json!({ "viewed": true })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AskQuestionRequest {
    #[validate(length(min = 1, max = 4000))]
    pub text: String,
}

pub async fn ask_question(
    State(state): State<AppState>,
    identity: Identity,
    Path(tender_id): Path<String>,
    Json(body): Json<AskQuestionRequest>,
) -> Result<Json<QuestionResponse>, ApiError> {
    body.validate()?;
    let id = parse_oid(&tender_id, "tender_id")?;
    let question = state
        .tenders
        .ask_question(id, identity.user_id, body.text)
        .await?;
    Ok(Json(question_response(&question)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AnswerQuestionRequest {
    #[validate(length(min = 1, max = 8000))]
    pub answer: String,
}

pub async fn answer_question(
    State(state): State<AppState>,
    identity: Identity,
    Path((tender_id, question_id)): Path<(String, String)>,
    Json(body): Json<AnswerQuestionRequest>,
) -> Result<Json<QuestionResponse>, ApiError> {
    body.validate()?;
    let tid = parse_oid(&tender_id, "tender_id")?;
    let qid = parse_oid(&question_id, "question_id")?;
    let question = state
        .tenders
        .answer_question(tid, qid, identity.user_id, body.answer)
        .await?;
    Ok(Json(question_response(&question)))
}

/// Upload a tender document via multipart form data.
/// Fields: `file` (binary), optional `doc_id` (text) to overwrite an
/// existing logical document.
pub async fn upload_document(
    State(state): State<AppState>,
    identity: Identity,
    Path(tender_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<DocumentResponse>, ApiError> {
    let tid = parse_oid(&tender_id, "tender_id")?;

    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut doc_id: Option<ObjectId> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload.bin").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Multipart error: {e}")))?;
                file = Some((file_name, content_type, bytes.to_vec()));
            }
            "doc_id" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Multipart error: {e}")))?;
                doc_id = Some(parse_oid(&value, "doc_id")?);
            }
            _ => {}
        }
    }

    let (file_name, content_type, bytes) =
        file.ok_or_else(|| ApiError::BadRequest("Missing file field".to_string()))?;

    let record = state
        .tenders
        .add_document(
            tid,
            identity.user_id,
            DocumentUpload {
                doc_id,
                file_name,
                content_type,
                bytes,
            },
        )
        .await?;
    Ok(Json(document_response(&record)))
}

pub async fn delete_document(
    State(state): State<AppState>,
    Path((tender_id, doc_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let tid = parse_oid(&tender_id, "tender_id")?;
    let did = parse_oid(&doc_id, "doc_id")?;
    let removed = state.tenders.remove_document(tid, did).await?;
    Ok(Json(serde_json::json!({ "removed_versions": removed })))
}

#[derive(Debug, Deserialize)]
pub struct AwardRequest {
    pub bid_id: String,
    pub project_id: String,
}

pub async fn award(
    State(state): State<AppState>,
    Path(tender_id): Path<String>,
    Json(body): Json<AwardRequest>,
) -> Result<Json<TenderResponse>, ApiError> {
    let tid = parse_oid(&tender_id, "tender_id")?;
    let bid_id = parse_oid(&body.bid_id, "bid_id")?;
    let project_id = parse_oid(&body.project_id, "project_id")?;

    let tender = state.awards.award(tid, bid_id, project_id).await?;
    Ok(Json(to_response(&tender)))
}
