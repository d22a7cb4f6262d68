use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};
use util::state::AppState;

mod common;
mod get;
mod post;

pub use get::{get_class_attendance, get_history, get_live_status};
pub use post::{end_class, mark_attendance};

use crate::auth::guards::{require_student, require_teacher};

pub fn attendance_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/mark",
            post(mark_attendance).route_layer(from_fn(require_student)),
        )
        .route(
            "/history",
            get(get_history).route_layer(from_fn(require_student)),
        )
        .route(
            "/end",
            post(end_class).route_layer(from_fn(require_student)),
        )
        .route(
            "/class/{class_id}",
            get(get_class_attendance).route_layer(from_fn(require_teacher)),
        )
        .route(
            "/live/{class_id}",
            get(get_live_status).route_layer(from_fn(require_teacher)),
        )
}
