use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};
use util::state::AppState;

mod common;
mod get;
mod post;

pub use get::{available_classes, generate_qr, get_class, list_classes};
pub use post::{create_class, enroll_by_code};

use crate::auth::guards::{require_student, require_teacher};

pub fn class_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_classes))
        .route(
            "/",
            post(create_class).route_layer(from_fn(require_teacher)),
        )
        .route(
            "/available",
            get(available_classes).route_layer(from_fn(require_student)),
        )
        .route(
            "/enroll",
            post(enroll_by_code).route_layer(from_fn(require_student)),
        )
        .route("/{class_id}", get(get_class))
        .route(
            "/{class_id}/qr",
            get(generate_qr).route_layer(from_fn(require_teacher)),
        )
}
