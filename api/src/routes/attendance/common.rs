use serde::{Deserialize, Serialize};

use db::models::attendance_record::{AttendanceStatus, Model as RecordModel};

#[derive(Debug, Serialize)]
pub struct AttendanceRecordResponse {
    pub id: i64,
    pub class_id: i64,
    pub student_id: i64,
    pub attendance_day: String,
    pub marked_at: String,
    pub status: AttendanceStatus,
    pub leave_time: Option<String>,
}

impl From<RecordModel> for AttendanceRecordResponse {
    fn from(m: RecordModel) -> Self {
        Self {
            id: m.id,
            class_id: m.class_id,
            student_id: m.student_id,
            attendance_day: m.attendance_day.to_string(),
            marked_at: m.marked_at.to_rfc3339(),
            status: m.status,
            leave_time: m.leave_time.map(|t| t.to_rfc3339()),
        }
    }
}

/// A student's own record with the class name joined in.
#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub record: AttendanceRecordResponse,
    pub class_name: String,
}

/// A class record with the student's display fields joined in.
#[derive(Debug, Serialize)]
pub struct ClassAttendanceEntry {
    #[serde(flatten)]
    pub record: AttendanceRecordResponse,
    pub student_name: String,
    pub student_email: String,
}

#[derive(Debug, Deserialize)]
pub struct MarkAttendanceReq {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EndClassReq {
    pub class_id: i64,
}

#[derive(Debug, Serialize, Default)]
pub struct LeaveResponse {
    pub leave_time: String,
}
