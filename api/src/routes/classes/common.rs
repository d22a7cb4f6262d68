use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use db::models::class_session::Model as ClassModel;

#[derive(Debug, Serialize)]
pub struct ClassResponse {
    pub id: i64,
    pub teacher_id: i64,
    pub class_name: String,
    pub code: String,
    pub days: Vec<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub created_at: String,
}

impl From<ClassModel> for ClassResponse {
    fn from(m: ClassModel) -> Self {
        let days = m
            .days
            .as_deref()
            .and_then(|d| serde_json::from_str(d).ok())
            .unwrap_or_default();
        Self {
            id: m.id,
            teacher_id: m.teacher_id,
            class_name: m.class_name,
            code: m.code,
            days,
            start_time: m.start_time,
            end_time: m.end_time,
            created_at: m.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RosterEntry {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ClassDetailResponse {
    #[serde(flatten)]
    pub class: ClassResponse,
    pub students: Vec<RosterEntry>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateClassReq {
    #[validate(length(min = 1, max = 100, message = "Class name must be 1-100 characters"))]
    pub class_name: String,
    #[validate(length(min = 1, message = "At least one scheduled day is required"))]
    pub days: Vec<String>,
    #[validate(custom(function = "validate_hhmm"))]
    pub start_time: String,
    #[validate(custom(function = "validate_hhmm"))]
    pub end_time: String,
}

#[derive(Debug, Deserialize)]
pub struct EnrollByCodeReq {
    pub code: String,
}

#[derive(Debug, Serialize, Default)]
pub struct QrTokenResponse {
    pub qr_token: String,
}

fn validate_hhmm(value: &str) -> Result<(), ValidationError> {
    let valid = value
        .split_once(':')
        .and_then(|(h, m)| Some((h.parse::<u32>().ok()?, m.parse::<u32>().ok()?)))
        .is_some_and(|(h, m)| h < 24 && m < 60 && value.len() == 5);
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("time_format")
            .with_message("Times must be in HH:MM format".into()))
    }
}
