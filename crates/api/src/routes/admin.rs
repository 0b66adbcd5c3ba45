use axum::{Json, extract::State};

use crate::{error::ApiError, state::AppState};

/// Manual trigger for the auto-close sweep, alongside the scheduled run.
pub async fn sweep_expired(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let closed = state.tenders.sweep_expired().await?;
    Ok(Json(serde_json::json!({ "closed": closed })))
}

pub async fn sweep_reminders(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let sweep = state.reminders.check_deadline_reminders().await?;
    Ok(Json(serde_json::json!({
        "tenders_matched": sweep.tenders_matched,
        "delivered": sweep.delivered,
        "skipped": sweep.skipped,
        "suppressed": sweep.suppressed,
        "failed": sweep.failed,
    })))
}
