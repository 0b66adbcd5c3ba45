use axum::{
    Json,
    extract::{Path, Query, State},
};

use anbud_services::dao::base::PaginationParams;

use crate::{error::ApiError, extractors::identity::Identity, state::AppState};

use super::{parse_oid, rfc3339};

pub async fn list(
    State(state): State<AppState>,
    identity: Identity,
    Query(params): Query<PaginationParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result = state
        .notifications
        .list_for_user(identity.user_id, &params)
        .await?;

    let items: Vec<serde_json::Value> = result
        .items
        .iter()
        .map(|n| {
            serde_json::json!({
                "id": n.id.map(|id| id.to_hex()),
                "kind": n.kind,
                "title": n.title,
                "body": n.body,
                "link": n.link,
                "is_read": n.is_read,
                "created_at": rfc3339(n.created_at),
            })
        })
        .collect();

    Ok(Json(serde_json::json!({
        "items": items,
        "total": result.total,
        "page": result.page,
        "per_page": result.per_page,
        "total_pages": result.total_pages,
    })))
}

pub async fn unread_count(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<serde_json::Value>, ApiError> {
    let count = state.notifications.unread_count(identity.user_id).await?;
    Ok(Json(serde_json::json!({ "unread": count })))
}

pub async fn mark_read(
    State(state): State<AppState>,
    identity: Identity,
    Path(notification_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_oid(&notification_id, "notification_id")?;
    let updated = state.notifications.mark_read(id, identity.user_id).await?;
    Ok(Json(serde_json::json!({ "read": updated })))
}
