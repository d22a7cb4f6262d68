use std::sync::Once;

use api::routes::routes;
use axum::Router;
use util::{config::AppConfig, state::AppState};

static INIT: Once = Once::new();

fn init_test_config() {
    INIT.call_once(|| {
        unsafe {
            std::env::set_var("DATABASE_PATH", "sqlite::memory:");
            std::env::set_var("JWT_SECRET", "integration-test-secret");
        }
        AppConfig::set_jwt_secret("integration-test-secret");
        AppConfig::set_qr_token_validity_seconds(60u64);
    });
}

/// Builds the full router over a fresh in-memory database.
///
/// Each call gets its own database, so tests stay independent even when run
/// in parallel.
pub async fn make_test_app() -> (Router, AppState) {
    init_test_config();

    let db = db::test_utils::setup_test_db().await;
    let state = AppState::new(db);
    let app = Router::new().nest("/api", routes(state.clone()));

    (app, state)
}
