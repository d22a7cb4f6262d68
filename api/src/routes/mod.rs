//! HTTP route entry point for `/api/...`.
//!
//! Route groups:
//! - `/health` → liveness probe (public)
//! - `/classes` → class creation, listings, quick-join, QR issuance
//! - `/attendance` → scan marking, history, leave, live status
//!
//! Authentication is enforced per group via `allow_authenticated`; the
//! teacher/student role guards sit on individual routes.

use axum::{Router, middleware::from_fn};
use util::state::AppState;

use crate::auth::guards::allow_authenticated;
use crate::routes::{
    attendance::attendance_routes, classes::class_routes, health::health_routes,
};

pub mod attendance;
pub mod classes;
pub mod health;

/// Builds the complete application router for all HTTP endpoints.
///
/// The returned router has `AppState` baked in and mounts all core API
/// routes under their respective base paths.
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health_routes())
        .nest(
            "/classes",
            class_routes().route_layer(from_fn(allow_authenticated)),
        )
        .nest(
            "/attendance",
            attendance_routes().route_layer(from_fn(allow_authenticated)),
        )
        .with_state(app_state)
}
