use anbud_api::{build_router, state::AppState};
use anbud_config::Settings;
use anbud_db::{connect, indexes::ensure_indexes};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (silently ignore if missing)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "anbud_api=debug,anbud_services=debug,anbud_db=debug,tower_http=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load config
    let settings = Settings::load()?;
    info!(
        "Starting Anbud API on {}:{}",
        settings.app.host, settings.app.port
    );

    // Connect to MongoDB
    let db = connect(&settings).await?;

    // Ensure indexes
    ensure_indexes(&db).await?;

    // Build app state
    let app_state = AppState::new(db, settings.clone())?;

    // Background sweeps: auto-close expired tenders, deadline reminders.
    // Both are idempotent pull-based sweeps, also triggerable via the
    // admin routes.
    let scheduler = JobScheduler::new().await?;

    let sweep_state = app_state.clone();
    scheduler
        .add(Job::new_async("0 */10 * * * *", move |_id, _sched| {
            let state = sweep_state.clone();
            Box::pin(async move {
                if let Err(err) = state.tenders.sweep_expired().await {
                    error!(%err, "Auto-close sweep failed");
                }
            })
        })?)
        .await?;

    let reminder_state = app_state.clone();
    scheduler
        .add(Job::new_async("0 23 6 * * *", move |_id, _sched| {
            let state = reminder_state.clone();
            Box::pin(async move {
                if let Err(err) = state.reminders.check_deadline_reminders().await {
                    error!(%err, "Deadline reminder sweep failed");
                }
            })
        })?)
        .await?;

    scheduler.start().await?;

    // Build router
    let app = build_router(app_state);

    // Start server
    let addr = format!("{}:{}", settings.app.host, settings.app.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
