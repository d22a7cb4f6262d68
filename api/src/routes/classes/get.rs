use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Local;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::services::qr_token;

use super::common::{ClassDetailResponse, ClassResponse, QrTokenResponse, RosterEntry};
use db::models::{
    class_session::{Column as ClassCol, Entity as ClassEntity, Model as ClassModel},
    class_student::Model as EnrollmentModel,
    user::{Column as UserCol, Entity as UserEntity, Model as UserModel, Role},
};

/// Keeps only classes whose schedule makes them visible right now: a
/// scheduled day with the window not yet closed. No-schedule classes are
/// always hidden.
fn filter_active(classes: Vec<ClassModel>) -> Vec<ClassModel> {
    let now = Local::now().naive_local();
    classes
        .into_iter()
        .filter(|c| c.schedule().is_some_and(|s| s.is_active_at(now)))
        .collect()
}

/// GET `/api/classes`
///
/// The caller's classes, active-today only. Teachers see classes they own;
/// students see classes they are enrolled in.
pub async fn list_classes(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<Vec<ClassResponse>>>) {
    let db = state.db();

    let classes = match claims.role {
        Role::Teacher => ClassModel::find_by_teacher(db, claims.sub).await,
        Role::Student => async {
            let ids = EnrollmentModel::class_ids_for_student(db, claims.sub).await?;
            ClassEntity::find()
                .filter(ClassCol::Id.is_in(ids))
                .order_by_asc(ClassCol::Id)
                .all(db)
                .await
        }
        .await,
    };

    match classes {
        Ok(classes) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                filter_active(classes)
                    .into_iter()
                    .map(ClassResponse::from)
                    .collect(),
                "Classes retrieved",
            )),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list classes");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Server error")),
            )
        }
    }
}

/// GET `/api/classes/available`
///
/// Active classes the student has not joined yet.
pub async fn available_classes(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<Vec<ClassResponse>>>) {
    let db = state.db();

    let result = async {
        let enrolled = EnrollmentModel::class_ids_for_student(db, claims.sub).await?;
        let mut query = ClassEntity::find();
        if !enrolled.is_empty() {
            query = query.filter(ClassCol::Id.is_not_in(enrolled));
        }
        query.order_by_asc(ClassCol::Id).all(db).await
    }
    .await;

    match result {
        Ok(classes) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                filter_active(classes)
                    .into_iter()
                    .map(ClassResponse::from)
                    .collect(),
                "Available classes retrieved",
            )),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list available classes");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Server error")),
            )
        }
    }
}

/// GET `/api/classes/{class_id}`
///
/// Class detail with the enrolled roster in enrollment order.
pub async fn get_class(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<Option<ClassDetailResponse>>>) {
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

    let roster = async {
        let ids = class.enrolled_student_ids(db).await?;
        let users: Vec<UserModel> = UserEntity::find()
            .filter(UserCol::Id.is_in(ids.clone()))
            .all(db)
            .await?;
        // Preserve enrollment order.
        let mut entries = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(u) = users.iter().find(|u| u.id == id) {
                entries.push(RosterEntry {
                    id: u.id,
                    name: u.username.clone(),
                    email: u.email.clone(),
                });
            }
        }
        Ok::<_, sea_orm::DbErr>(entries)
    }
    .await;

    match roster {
        Ok(students) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                Some(ClassDetailResponse {
                    class: ClassResponse::from(class),
                    students,
                }),
                "Class retrieved",
            )),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load class roster");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Server error")),
            )
        }
    }
}

/// GET `/api/classes/{class_id}/qr`
///
/// Owning teacher requests a fresh, short-lived QR token for the class.
/// Stateless: nothing is stored, and the token self-describes its expiry.
pub async fn generate_qr(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<QrTokenResponse>>) {
    let Ok(found) = ClassModel::find_by_id(state.db(), class_id).await else {
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

    (
        StatusCode::OK,
        Json(ApiResponse::success(
            QrTokenResponse {
                qr_token: qr_token::issue(class.id),
            },
            "QR token generated",
        )),
    )
}
