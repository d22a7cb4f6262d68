use axum::{Extension, Json, extract::State, http::StatusCode};
use chrono::Local;
use validator::Validate;

use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::services::attendance::{self, EnrollError};

use super::common::{ClassResponse, CreateClassReq, EnrollByCodeReq};
use db::models::class_session::Model as ClassModel;

/// POST `/api/classes`
///
/// Teacher creates a class with a weekly schedule; the join code is
/// generated server-side. The schedule is immutable afterwards.
pub async fn create_class(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(body): Json<CreateClassReq>,
) -> (StatusCode, Json<ApiResponse<Option<ClassResponse>>>) {
    if let Err(e) = body.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format!(
                "Please provide all fields: Class Name, Days, Start Time, and End Time. ({e})"
            ))),
        );
    }

    match ClassModel::create(
        state.db(),
        claims.sub,
        &body.class_name,
        &body.days,
        &body.start_time,
        &body.end_time,
    )
    .await
    {
        Ok(class) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                Some(ClassResponse::from(class)),
                "Class created",
            )),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to create class");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Failed to create class")),
            )
        }
    }
}

/// POST `/api/classes/enroll`
///
/// Student joins a class by code. Inside the active window this both
/// enrolls and marks presence, atomically.
pub async fn enroll_by_code(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(body): Json<EnrollByCodeReq>,
) -> (StatusCode, Json<ApiResponse<Option<ClassResponse>>>) {
    if body.code.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Class code is required")),
        );
    }

    match attendance::enroll_by_code(state.db(), &body.code, claims.sub, Local::now()).await {
        Ok((class, _record)) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                Some(ClassResponse::from(class)),
                "Enrolled successfully and attendance marked!",
            )),
        ),
        Err(e) => {
            let status = match &e {
                EnrollError::InvalidCode => StatusCode::NOT_FOUND,
                EnrollError::AlreadyEnrolled => StatusCode::CONFLICT,
                EnrollError::NotScheduledToday { .. } | EnrollError::OutsideWindow { .. } => {
                    StatusCode::BAD_REQUEST
                }
                EnrollError::Db(err) => {
                    tracing::error!(error = %err, "Enroll by code failed");
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(ApiResponse::error("Server error")),
                    );
                }
            };
            (status, Json(ApiResponse::error(e.to_string())))
        }
    }
}
