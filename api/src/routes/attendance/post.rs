use axum::{Extension, Json, extract::State, http::StatusCode};
use chrono::Local;

use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::services::attendance::{self, LeaveError, MarkError};

use super::common::{AttendanceRecordResponse, EndClassReq, LeaveResponse, MarkAttendanceReq};

/// POST `/api/attendance/mark`
///
/// Student submits the text decoded from a scanned QR code. The service
/// checks token freshness, enrollment and the once-per-day rule; a second
/// scan on the same day is rejected, not merged.
pub async fn mark_attendance(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(body): Json<MarkAttendanceReq>,
) -> (StatusCode, Json<ApiResponse<Option<AttendanceRecordResponse>>>) {
    let Some(token) = body.token.as_deref().filter(|t| !t.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("No token provided")),
        );
    };

    match attendance::mark_by_scan(state.db(), token, claims.sub, Local::now()).await {
        Ok(record) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                Some(AttendanceRecordResponse::from(record)),
                "Attendance marked successfully",
            )),
        ),
        Err(e) => {
            let status = match &e {
                MarkError::TokenExpired | MarkError::TokenMalformed => StatusCode::BAD_REQUEST,
                MarkError::ClassNotFound => StatusCode::NOT_FOUND,
                MarkError::NotEnrolled => StatusCode::FORBIDDEN,
                MarkError::AlreadyMarked => StatusCode::CONFLICT,
                MarkError::Db(err) => {
                    tracing::error!(error = %err, "Failed to mark attendance");
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

/// POST `/api/attendance/end`
///
/// Student leaves class: stamps the leave time on today's record.
/// Safe to call repeatedly; the latest time wins.
pub async fn end_class(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(body): Json<EndClassReq>,
) -> (StatusCode, Json<ApiResponse<LeaveResponse>>) {
    match attendance::record_leave(state.db(), body.class_id, claims.sub, Local::now()).await {
        Ok(record) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                LeaveResponse {
                    leave_time: record
                        .leave_time
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_default(),
                },
                "Class ended successfully",
            )),
        ),
        Err(e @ LeaveError::NoRecordToday) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(e.to_string())),
        ),
        Err(LeaveError::Db(err)) => {
            tracing::error!(error = %err, "Failed to record leave time");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Server error")),
            )
        }
    }
}
