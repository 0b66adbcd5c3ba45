use axum::{Json, extract::State};

use anbud_db::models::NotificationPrefs;

use crate::{error::ApiError, extractors::identity::Identity, state::AppState};

pub async fn get_preferences(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<NotificationPrefs>, ApiError> {
    let user = state.users.find_by_id(identity.user_id).await?;
    Ok(Json(user.notification_preferences))
}

pub async fn update_preferences(
    State(state): State<AppState>,
    identity: Identity,
    Json(prefs): Json<NotificationPrefs>,
) -> Result<Json<NotificationPrefs>, ApiError> {
    state
        .users
        .update_preferences(identity.user_id, &prefs)
        .await?;
    Ok(Json(prefs))
}
