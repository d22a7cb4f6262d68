use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{Duration, Local, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use std::collections::HashMap;

use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::services::attendance::{self, LiveStatusEntry, LiveStatusError};

use super::common::{AttendanceRecordResponse, ClassAttendanceEntry, HistoryEntry};
use db::models::{
    attendance_record::Model as RecordModel,
    class_session::{Column as ClassCol, Entity as ClassEntity, Model as ClassModel},
    user::{Column as UserCol, Entity as UserEntity},
};

/// GET `/api/attendance/history`
///
/// The student's own records across all classes, newest first, with class
/// names joined in.
pub async fn get_history(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<Vec<HistoryEntry>>>) {
    let db = state.db();

    let result = async {
        let records = RecordModel::find_for_student(db, claims.sub).await?;
        let class_ids: Vec<i64> = records.iter().map(|r| r.class_id).collect();
        let classes: HashMap<i64, String> = ClassEntity::find()
            .filter(ClassCol::Id.is_in(class_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c.class_name))
            .collect();

        Ok::<_, sea_orm::DbErr>(
            records
                .into_iter()
                .map(|r| {
                    let class_name = classes.get(&r.class_id).cloned().unwrap_or_default();
                    HistoryEntry {
                        record: AttendanceRecordResponse::from(r),
                        class_name,
                    }
                })
                .collect::<Vec<_>>(),
        )
    }
    .await;

    match result {
        Ok(history) => (
            StatusCode::OK,
            Json(ApiResponse::success(history, "History retrieved")),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load history");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Server error")),
            )
        }
    }
}

/// GET `/api/attendance/class/{class_id}`
///
/// Owning teacher's view of the last seven days of records for a class,
/// newest first, with student display fields joined in.
pub async fn get_class_attendance(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<Vec<ClassAttendanceEntry>>>) {
    let db = state.db();

    let Ok(found) = ClassModel::find_by_id(db, class_id).await else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error("Server error")),
        );
    };
    let Some(class) = found else {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Class not found")),
        );
    };
    if !class.is_owned_by(claims.sub) {
        return (
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error("Not authorized")),
        );
    }

    let since = Utc::now() - Duration::days(7);
    let result = async {
        let records = RecordModel::find_for_class_since(db, class_id, since).await?;
        let student_ids: Vec<i64> = records.iter().map(|r| r.student_id).collect();
        let students: HashMap<i64, (String, String)> = UserEntity::find()
            .filter(UserCol::Id.is_in(student_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id, (u.username, u.email)))
            .collect();

        Ok::<_, sea_orm::DbErr>(
            records
                .into_iter()
                .map(|r| {
                    let (student_name, student_email) = students
                        .get(&r.student_id)
                        .cloned()
                        .unwrap_or_default();
                    ClassAttendanceEntry {
                        record: AttendanceRecordResponse::from(r),
                        student_name,
                        student_email,
                    }
                })
                .collect::<Vec<_>>(),
        )
    }
    .await;

    match result {
        Ok(entries) => (
            StatusCode::OK,
            Json(ApiResponse::success(entries, "Class attendance retrieved")),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load class attendance");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Server error")),
            )
        }
    }
}

/// GET `/api/attendance/live/{class_id}`
///
/// Owning teacher's live view: one status per student, reconciled from
/// enrollment, today's records and the schedule. Recomputed on every poll.
pub async fn get_live_status(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<Vec<LiveStatusEntry>>>) {
    match attendance::live_status(state.db(), class_id, claims.sub, Local::now()).await {
        Ok(entries) => (
            StatusCode::OK,
            Json(ApiResponse::success(entries, "Live status retrieved")),
        ),
        Err(e @ LiveStatusError::ClassNotFound) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(e.to_string())),
        ),
        Err(e @ LiveStatusError::NotOwner) => (
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error(e.to_string())),
        ),
        Err(LiveStatusError::Db(err)) => {
            tracing::error!(error = %err, "Failed to compute live status");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Server error")),
            )
        }
    }
}
