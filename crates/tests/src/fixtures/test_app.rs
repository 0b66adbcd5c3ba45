use bson::oid::ObjectId;
use mongodb::{Client, Database, options::ClientOptions};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use anbud_api::{build_router, state::AppState};
use anbud_config::Settings;
use anbud_db::indexes::ensure_indexes;

/// A running test application with its own MongoDB database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub base_url: String,
    pub db: Database,
    pub settings: Settings,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Spawn a new test server connected to the test MongoDB.
    ///
    /// Requires a running MongoDB at localhost:27017.
    /// Set ANBUD__DATABASE__URL env var to override the connection
    /// string. Each test gets a unique database name for isolation;
    /// email stays on the disabled transport.
    pub async fn spawn() -> Self {
        let db_name = format!("anbud_test_{}", uuid::Uuid::new_v4().simple());

        let mut settings = Settings::load().expect("Failed to load settings");
        if let Ok(url) = std::env::var("ANBUD__DATABASE__URL") {
            settings.database.url = url;
        }
        settings.database.name = db_name.clone();
        settings.smtp.enabled = false;
        settings.storage.upload_dir = std::env::temp_dir()
            .join(format!("anbud_test_uploads_{}", uuid::Uuid::new_v4().simple()))
            .to_string_lossy()
            .into_owned();

        let client_options = ClientOptions::parse(&settings.database.url)
            .await
            .expect("Failed to parse MongoDB URL");
        let mongo_client =
            Client::with_options(client_options).expect("Failed to create MongoDB client");
        let db = mongo_client.database(&db_name);

        ensure_indexes(&db).await.expect("Failed to create indexes");

        let app_state =
            AppState::new(db.clone(), settings.clone()).expect("Failed to create AppState");
        let app = build_router(app_state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let base_url = format!("http://{}", addr);
        let client = reqwest::Client::new();

        Self {
            addr,
            base_url,
            db,
            settings,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get_as(&self, path: &str, user_id: ObjectId) -> reqwest::RequestBuilder {
        self.client
            .get(self.url(path))
            .header("X-User-Id", user_id.to_hex())
    }

    pub fn post_as(&self, path: &str, user_id: ObjectId) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .header("X-User-Id", user_id.to_hex())
    }

    pub fn put_as(&self, path: &str, user_id: ObjectId) -> reqwest::RequestBuilder {
        self.client
            .put(self.url(path))
            .header("X-User-Id", user_id.to_hex())
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let db = self.db.clone();
        // Best effort cleanup: drop the test database
        tokio::spawn(async move {
            let _ = db.drop().await;
        });
    }
}
