//! Deterministic window behavior, exercised at the service layer where the
//! clock is an argument.

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use api::services::attendance::{
        self, EnrollError, LiveStatus,
    };
    use chrono::{DateTime, Local, TimeZone, Utc};
    use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection};

    use db::models::{
        attendance_record::Model as RecordModel,
        class_session::Model as ClassModel,
        class_student,
        user::{Model as UserModel, Role},
    };
    use db::test_utils::setup_test_db;

    // 2026-08-24 is a Monday.
    fn monday_at(hour: u32, minute: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2026, 8, 24, hour, minute, 0)
            .single()
            .unwrap()
    }

    fn tuesday_at(hour: u32, minute: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2026, 8, 25, hour, minute, 0)
            .single()
            .unwrap()
    }

    struct TestCtx {
        teacher: UserModel,
        student: UserModel,
        class: ClassModel,
    }

    /// A Monday 09:00-10:00 class with one enrolled, unmarked student.
    async fn setup(db: &DatabaseConnection, enroll: bool) -> TestCtx {
        let teacher = UserModel::create(db, "win_teacher", "win_t@test.com", Role::Teacher)
            .await
            .unwrap();
        let student = UserModel::create(db, "win_student", "win_s@test.com", Role::Student)
            .await
            .unwrap();
        let class = ClassModel::create(
            db,
            teacher.id,
            "Monday Lab",
            &["Monday".to_string()],
            "09:00",
            "10:00",
        )
        .await
        .unwrap();

        if enroll {
            class_student::ActiveModel {
                class_id: Set(class.id),
                student_id: Set(student.id),
                enrolled_at: Set(Utc::now()),
            }
            .insert(db)
            .await
            .unwrap();
        }

        TestCtx {
            teacher,
            student,
            class,
        }
    }

    async fn status_of(
        db: &DatabaseConnection,
        ctx: &TestCtx,
        now: DateTime<Local>,
    ) -> LiveStatus {
        let entries = attendance::live_status(db, ctx.class.id, ctx.teacher.id, now)
            .await
            .unwrap();
        entries
            .iter()
            .find(|e| e.student_id == ctx.student.id)
            .unwrap()
            .status
    }

    // ---------------------------
    // live status across the window
    // ---------------------------

    #[tokio::test]
    async fn unmarked_student_waits_in_window_and_is_absent_after() {
        let db = setup_test_db().await;
        let ctx = setup(&db, true).await;

        assert_eq!(status_of(&db, &ctx, monday_at(9, 30)).await, LiveStatus::WaitingToJoin);
        assert_eq!(status_of(&db, &ctx, monday_at(11, 0)).await, LiveStatus::Absent);
        // Before the window opens there is still time to show up.
        assert_eq!(status_of(&db, &ctx, monday_at(8, 0)).await, LiveStatus::WaitingToJoin);
    }

    #[tokio::test]
    async fn marked_student_is_present_even_after_the_window() {
        let db = setup_test_db().await;
        let ctx = setup(&db, true).await;

        let scan = monday_at(9, 15);
        RecordModel::create_present(
            &db,
            ctx.class.id,
            ctx.student.id,
            scan.date_naive(),
            scan.with_timezone(&Utc),
        )
        .await
        .unwrap();

        assert_eq!(status_of(&db, &ctx, monday_at(9, 30)).await, LiveStatus::Present);
        assert_eq!(status_of(&db, &ctx, monday_at(11, 0)).await, LiveStatus::Present);
    }

    #[tokio::test]
    async fn non_enrolled_student_is_flagged_regardless_of_window() {
        let db = setup_test_db().await;
        let ctx = setup(&db, false).await;

        assert_eq!(status_of(&db, &ctx, monday_at(9, 30)).await, LiveStatus::NotEnrolled);
        assert_eq!(status_of(&db, &ctx, monday_at(11, 0)).await, LiveStatus::NotEnrolled);
    }

    // ---------------------------
    // enroll window rules
    // ---------------------------

    #[tokio::test]
    async fn enroll_succeeds_only_inside_the_window() {
        let db = setup_test_db().await;
        let ctx = setup(&db, false).await;

        let err = attendance::enroll_by_code(&db, &ctx.class.code, ctx.student.id, monday_at(8, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, EnrollError::OutsideWindow { .. }));

        let err =
            attendance::enroll_by_code(&db, &ctx.class.code, ctx.student.id, monday_at(10, 30))
                .await
                .unwrap_err();
        assert!(matches!(err, EnrollError::OutsideWindow { .. }));

        let err =
            attendance::enroll_by_code(&db, &ctx.class.code, ctx.student.id, tuesday_at(9, 30))
                .await
                .unwrap_err();
        assert!(matches!(err, EnrollError::NotScheduledToday { .. }));
        assert_eq!(err.to_string(), "Class is not scheduled for today (Tuesday)");

        let now = monday_at(9, 30);
        let (_, record) =
            attendance::enroll_by_code(&db, &ctx.class.code, ctx.student.id, now)
                .await
                .unwrap();
        assert_eq!(record.attendance_day, now.date_naive());
        assert!(ctx
            .class
            .is_student_enrolled(&db, ctx.student.id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn schedule_less_class_is_never_window_rejected() {
        let db = setup_test_db().await;
        let ctx = setup(&db, false).await;
        let open = ClassModel::create(&db, ctx.teacher.id, "Legacy", &[], "09:00", "10:00")
            .await
            .unwrap();

        // Empty days means no schedule: joining works at any hour, even
        // though the class never shows up in active listings.
        let (_, record) =
            attendance::enroll_by_code(&db, &open.code, ctx.student.id, tuesday_at(3, 0))
                .await
                .unwrap();
        assert_eq!(record.attendance_day, tuesday_at(3, 0).date_naive());
    }

    #[tokio::test]
    async fn window_bounds_are_inclusive() {
        let db = setup_test_db().await;
        let ctx = setup(&db, false).await;

        let (_, record) =
            attendance::enroll_by_code(&db, &ctx.class.code, ctx.student.id, monday_at(9, 0))
                .await
                .unwrap();
        assert_eq!(record.attendance_day, monday_at(9, 0).date_naive());

        // A second student exactly at the closing minute.
        let late = UserModel::create(&db, "win_late", "win_l@test.com", Role::Student)
            .await
            .unwrap();
        attendance::enroll_by_code(&db, &ctx.class.code, late.id, monday_at(10, 0))
            .await
            .unwrap();
    }

    // ---------------------------
    // leave time
    // ---------------------------

    #[tokio::test]
    async fn record_leave_targets_the_given_day() {
        let db = setup_test_db().await;
        let ctx = setup(&db, true).await;

        let scan = monday_at(9, 15);
        RecordModel::create_present(
            &db,
            ctx.class.id,
            ctx.student.id,
            scan.date_naive(),
            scan.with_timezone(&Utc),
        )
        .await
        .unwrap();

        let leave = monday_at(9, 50);
        let record = attendance::record_leave(&db, ctx.class.id, ctx.student.id, leave)
            .await
            .unwrap();
        assert_eq!(record.leave_time, Some(leave.with_timezone(&Utc)));

        // The next day there is no record to close out.
        let err = attendance::record_leave(&db, ctx.class.id, ctx.student.id, tuesday_at(9, 50))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            attendance::LeaveError::NoRecordToday
        ));
    }
}
