use axum::{
    Json,
    extract::{Multipart, Path, State},
};
use serde::Deserialize;
use validator::Validate;

use anbud_db::models::{HourlyRate, PriceStructure, PriceTerms};
use anbud_services::bid::{BidAttachment, NewBid};

use crate::{error::ApiError, extractors::identity::Identity, state::AppState};

use super::{parse_oid, rfc3339};

#[derive(Debug, Deserialize, Validate)]
pub struct BidPayload {
    pub company_id: Option<String>,
    #[validate(range(min = 1))]
    pub total_ore: i64,
    pub structure: PriceStructure,
    #[serde(default)]
    pub hourly_rates: Vec<HourlyRatePayload>,
}

#[derive(Debug, Deserialize)]
pub struct HourlyRatePayload {
    pub role: String,
    pub rate_ore: i64,
}

/// Submit a bid via multipart form data.
/// Fields: `payload` (JSON, see [`BidPayload`]), zero or more `file`
/// fields with attachments.
pub async fn submit(
    State(state): State<AppState>,
    identity: Identity,
    Path(tender_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    let tid = parse_oid(&tender_id, "tender_id")?;

    let mut payload: Option<BidPayload> = None;
    let mut attachments = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "payload" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Multipart error: {e}")))?;
                payload = Some(
                    serde_json::from_str(&text)
                        .map_err(|e| ApiError::BadRequest(format!("Invalid payload: {e}")))?,
                );
            }
            "file" => {
                let file_name = field.file_name().unwrap_or("attachment.bin").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Multipart error: {e}")))?;
                attachments.push(BidAttachment {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    let payload =
        payload.ok_or_else(|| ApiError::BadRequest("Missing payload field".to_string()))?;
    payload.validate()?;

    let company_id = payload
        .company_id
        .as_deref()
        .map(|v| parse_oid(v, "company_id"))
        .transpose()?;

    let bid = state
        .bids
        .submit_bid(
            tid,
            NewBid {
                bidder_id: identity.user_id,
                company_id,
                price: PriceTerms {
                    total_ore: payload.total_ore,
                    structure: payload.structure,
                    hourly_rates: payload
                        .hourly_rates
                        .into_iter()
                        .map(|r| HourlyRate {
                            role: r.role,
                            rate_ore: r.rate_ore,
                        })
                        .collect(),
                },
                attachments,
            },
        )
        .await?;

    Ok(Json(serde_json::json!({
        "id": bid.id.to_hex(),
        "tender_id": bid.tender_id.to_hex(),
        "submitted_at": rfc3339(bid.submitted_at),
        "total_ore": bid.price.total_ore,
        "status": bid.status,
        "documents": bid.documents.len(),
    })))
}
