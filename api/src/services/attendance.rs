//! Attendance marking and live status reconciliation.
//!
//! Handlers stay thin; the rules live here. Every operation takes `now` as a
//! `DateTime<Local>` argument so the window and calendar-day math is
//! deterministic under test. The calendar day is bounded by local midnight,
//! matching the schedule evaluator's use of server-local time.

use chrono::{DateTime, Datelike, Local, Utc};
use sea_orm::{DatabaseConnection, DbErr, SqlErr};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

use db::models::{
    attendance_record::Model as RecordModel,
    class_session::Model as ClassModel,
    user::Model as UserModel,
};
use db::schedule::{ScheduleStatus, weekday_name};

use crate::services::qr_token::{self, QrTokenError};

// ---------------------------------------------------------------------------
// mark_by_scan
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum MarkError {
    #[error("QR Code expired")]
    TokenExpired,
    #[error("Invalid or missing token")]
    TokenMalformed,
    #[error("Class not found")]
    ClassNotFound,
    #[error("You are not enrolled in this class")]
    NotEnrolled,
    #[error("Attendance already marked for today")]
    AlreadyMarked,
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Accepts or rejects a scanned QR token for `student_id`.
///
/// Order of checks: token freshness, class existence, enrollment, then the
/// one-record-per-day rule. A second scan on the same day is an error, not a
/// no-op; the unique index backs the pre-check up so a concurrent double scan
/// still yields exactly one record.
pub async fn mark_by_scan(
    db: &DatabaseConnection,
    token_text: &str,
    student_id: i64,
    now: DateTime<Local>,
) -> Result<RecordModel, MarkError> {
    let claims = qr_token::verify(token_text).map_err(|e| match e {
        QrTokenError::Expired => MarkError::TokenExpired,
        QrTokenError::Malformed => MarkError::TokenMalformed,
    })?;

    let class = ClassModel::find_by_id(db, claims.class_id)
        .await?
        .ok_or(MarkError::ClassNotFound)?;

    if !class.is_student_enrolled(db, student_id).await? {
        return Err(MarkError::NotEnrolled);
    }

    let day = now.date_naive();
    if RecordModel::find_for_day(db, class.id, student_id, day)
        .await?
        .is_some()
    {
        return Err(MarkError::AlreadyMarked);
    }

    RecordModel::create_present(db, class.id, student_id, day, now.with_timezone(&Utc))
        .await
        .map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                MarkError::AlreadyMarked
            } else {
                MarkError::Db(e)
            }
        })
}

// ---------------------------------------------------------------------------
// enroll_by_code
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum EnrollError {
    #[error("Invalid class code")]
    InvalidCode,
    #[error("Already enrolled")]
    AlreadyEnrolled,
    #[error("Class is not scheduled for today ({today})")]
    NotScheduledToday { today: &'static str },
    #[error("Class has ended or not started yet. (Time: {window})")]
    OutsideWindow { window: String },
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Quick-join: enrolls the student by join code and marks them present in
/// the same transaction.
///
/// When the class carries a schedule it must currently be in-window. A class
/// with no usable schedule is deliberately *not* rejected here, even though
/// it never shows up in active listings; codes are shared out-of-band.
pub async fn enroll_by_code(
    db: &DatabaseConnection,
    code: &str,
    student_id: i64,
    now: DateTime<Local>,
) -> Result<(ClassModel, RecordModel), EnrollError> {
    let class = ClassModel::find_by_code(db, code)
        .await?
        .ok_or(EnrollError::InvalidCode)?;

    if class.is_student_enrolled(db, student_id).await? {
        return Err(EnrollError::AlreadyEnrolled);
    }

    if let Some(schedule) = class.schedule() {
        match schedule.status_at(now.naive_local()) {
            ScheduleStatus::WrongDay => {
                return Err(EnrollError::NotScheduledToday {
                    today: weekday_name(now.weekday()),
                });
            }
            ScheduleStatus::BeforeStart | ScheduleStatus::AfterEnd => {
                return Err(EnrollError::OutsideWindow {
                    window: schedule.window_label(),
                });
            }
            ScheduleStatus::InWindow | ScheduleStatus::NoSchedule => {}
        }
    }

    let record = class
        .enroll_and_mark_present(db, student_id, now.date_naive(), now.with_timezone(&Utc))
        .await
        .map_err(|e| {
            // Lost a race against an identical quick-join.
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                EnrollError::AlreadyEnrolled
            } else {
                EnrollError::Db(e)
            }
        })?;

    Ok((class, record))
}

// ---------------------------------------------------------------------------
// record_leave
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LeaveError {
    #[error("Attendance record not found for today. Did you join?")]
    NoRecordToday,
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Stamps the student's leave time on today's record. Idempotent in the
/// last-write-wins sense: repeat calls succeed and the latest time sticks.
pub async fn record_leave(
    db: &DatabaseConnection,
    class_id: i64,
    student_id: i64,
    now: DateTime<Local>,
) -> Result<RecordModel, LeaveError> {
    let record = RecordModel::find_for_day(db, class_id, student_id, now.date_naive())
        .await?
        .ok_or(LeaveError::NoRecordToday)?;

    Ok(record.set_leave_time(db, now.with_timezone(&Utc)).await?)
}

// ---------------------------------------------------------------------------
// live_status
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LiveStatusError {
    #[error("Class not found")]
    ClassNotFound,
    #[error("Not authorized")]
    NotOwner,
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Per-student reconciliation result for the live class view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LiveStatus {
    #[serde(rename = "Waiting to join")]
    WaitingToJoin,
    Present,
    Absent,
    #[serde(rename = "Not Enrolled")]
    NotEnrolled,
}

#[derive(Debug, Serialize)]
pub struct LiveStatusEntry {
    pub student_id: i64,
    pub name: String,
    pub email: String,
    pub status: LiveStatus,
    pub join_time: Option<DateTime<Utc>>,
    pub leave_time: Option<DateTime<Utc>>,
}

/// Reconciles the full student roster against enrollment, today's records,
/// and the schedule. Pure projection; recomputed on every poll.
///
/// Status priority per student: not enrolled → `Not Enrolled`; has a record
/// today → `Present`; window already closed → `Absent`; otherwise
/// `Waiting to join`. Enrolled students come first, in enrollment order.
pub async fn live_status(
    db: &DatabaseConnection,
    class_id: i64,
    requester_id: i64,
    now: DateTime<Local>,
) -> Result<Vec<LiveStatusEntry>, LiveStatusError> {
    let class = ClassModel::find_by_id(db, class_id)
        .await?
        .ok_or(LiveStatusError::ClassNotFound)?;

    if !class.is_owned_by(requester_id) {
        return Err(LiveStatusError::NotOwner);
    }

    let enrolled_ids = class.enrolled_student_ids(db).await?;
    let students = UserModel::find_all_students(db).await?;
    let records = RecordModel::find_for_class_on_day(db, class_id, now.date_naive()).await?;

    let records_by_student: HashMap<i64, &RecordModel> =
        records.iter().map(|r| (r.student_id, r)).collect();
    let students_by_id: HashMap<i64, &UserModel> =
        students.iter().map(|s| (s.id, s)).collect();

    let window_closed = class
        .schedule()
        .map(|s| s.status_at(now.naive_local()) == ScheduleStatus::AfterEnd)
        .unwrap_or(false);

    let entry = |student: &UserModel, enrolled: bool| {
        let record = records_by_student.get(&student.id);
        let status = if !enrolled {
            LiveStatus::NotEnrolled
        } else if record.is_some() {
            LiveStatus::Present
        } else if window_closed {
            LiveStatus::Absent
        } else {
            LiveStatus::WaitingToJoin
        };
        LiveStatusEntry {
            student_id: student.id,
            name: student.username.clone(),
            email: student.email.clone(),
            status,
            join_time: record.map(|r| r.marked_at),
            leave_time: record.and_then(|r| r.leave_time),
        }
    };

    let mut out = Vec::with_capacity(students.len());
    for id in &enrolled_ids {
        if let Some(student) = students_by_id.get(id) {
            out.push(entry(student, true));
        }
    }
    for student in &students {
        if !enrolled_ids.contains(&student.id) {
            out.push(entry(student, false));
        }
    }

    Ok(out)
}
