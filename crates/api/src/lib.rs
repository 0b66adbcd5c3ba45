pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Tender lifecycle
    let tender_routes = Router::new()
        .route("/", get(routes::tender::list))
        .route("/", post(routes::tender::create))
        .route("/{tender_id}", get(routes::tender::get))
        .route("/{tender_id}/publish", post(routes::tender::publish))
        .route("/{tender_id}/close", post(routes::tender::close))
        .route("/{tender_id}/reopen", post(routes::tender::reopen))
        .route("/{tender_id}/invitation", post(routes::tender::invite))
        .route(
            "/{tender_id}/invitation/viewed",
            post(routes::tender::mark_invitation_viewed),
        )
        .route("/{tender_id}/question", post(routes::tender::ask_question))
        .route(
            "/{tender_id}/question/{question_id}/answer",
            post(routes::tender::answer_question),
        )
        .route(
            "/{tender_id}/document",
            post(routes::tender::upload_document),
        )
        .route(
            "/{tender_id}/document/{doc_id}",
            delete(routes::tender::delete_document),
        )
        .route("/{tender_id}/bid", post(routes::bid::submit))
        .route("/{tender_id}/award", post(routes::tender::award));

    // Contract workflow
    let contract_routes = Router::new()
        .route("/", post(routes::contract::generate))
        .route("/{contract_id}", get(routes::contract::get))
        .route("/{contract_id}/sign", post(routes::contract::sign))
        .route("/{contract_id}/change", post(routes::contract::add_change));

    // In-app notifications
    let notification_routes = Router::new()
        .route("/", get(routes::notification::list))
        .route("/unread", get(routes::notification::unread_count))
        .route(
            "/{notification_id}/read",
            put(routes::notification::mark_read),
        );

    // Per-user notification preferences
    let me_routes = Router::new()
        .route("/preferences", get(routes::user::get_preferences))
        .route("/preferences", put(routes::user::update_preferences));

    // Manual sweep triggers (also run on the scheduler)
    let admin_routes = Router::new()
        .route("/sweep/expired", post(routes::admin::sweep_expired))
        .route("/sweep/reminders", post(routes::admin::sweep_reminders));

    Router::new()
        .nest("/api/tender", tender_routes)
        .nest("/api/contract", contract_routes)
        .nest("/api/notification", notification_routes)
        .nest("/api/me", me_routes)
        .nest("/api/admin", admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
