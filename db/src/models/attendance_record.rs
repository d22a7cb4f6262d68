use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One attendance record per student per class per calendar day.
///
/// The `(class_id, student_id, attendance_day)` unique index in the schema is
/// what actually holds that invariant under concurrent scans; callers
/// pre-check only to produce a friendly conflict message. `leave_time` is the
/// one mutable field and is last-write-wins.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub class_id: i64,
    pub student_id: i64,
    pub attendance_day: NaiveDate,
    pub marked_at: DateTime<Utc>,
    pub status: AttendanceStatus,
    pub leave_time: Option<DateTime<Utc>>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Deserialize,
    Serialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AttendanceStatus {
    #[sea_orm(string_value = "present")]
    Present,
    #[sea_orm(string_value = "absent")]
    Absent,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::class_session::Entity",
        from = "Column::ClassId",
        to = "super::class_session::Column::Id"
    )]
    Class,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id"
    )]
    Student,
}

impl Related<super::class_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Inserts a `present` record for the given day.
    ///
    /// A duplicate day trips the unique index and surfaces as a `DbErr` with
    /// `SqlErr::UniqueConstraintViolation`; the marking service maps that to
    /// its conflict error.
    pub async fn create_present(
        db: &DatabaseConnection,
        class_id: i64,
        student_id: i64,
        day: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Model, DbErr> {
        let record = ActiveModel {
            class_id: Set(class_id),
            student_id: Set(student_id),
            attendance_day: Set(day),
            marked_at: Set(now),
            status: Set(AttendanceStatus::Present),
            leave_time: Set(None),
            ..Default::default()
        };
        record.insert(db).await
    }

    pub async fn find_for_day(
        db: &DatabaseConnection,
        class_id: i64,
        student_id: i64,
        day: NaiveDate,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::AttendanceDay.eq(day))
            .one(db)
            .await
    }

    /// All of a class's records for one day, for the live status view.
    pub async fn find_for_class_on_day(
        db: &DatabaseConnection,
        class_id: i64,
        day: NaiveDate,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::AttendanceDay.eq(day))
            .all(db)
            .await
    }

    /// A student's full history, newest first.
    pub async fn find_for_student(
        db: &DatabaseConnection,
        student_id: i64,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::StudentId.eq(student_id))
            .order_by_desc(Column::MarkedAt)
            .all(db)
            .await
    }

    /// A class's records marked at or after `since`, newest first.
    pub async fn find_for_class_since(
        db: &DatabaseConnection,
        class_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::MarkedAt.gte(since))
            .order_by_desc(Column::MarkedAt)
            .all(db)
            .await
    }

    /// Overwrites the leave time. Repeat calls win over earlier ones.
    pub async fn set_leave_time(
        self,
        db: &DatabaseConnection,
        leave_time: DateTime<Utc>,
    ) -> Result<Model, DbErr> {
        let mut record: ActiveModel = self.into();
        record.leave_time = Set(Some(leave_time));
        record.update(db).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::class_session::Model as ClassModel;
    use crate::models::user::{Model as UserModel, Role};
    use crate::test_utils::setup_test_db;
    use sea_orm::SqlErr;

    async fn seed(db: &DatabaseConnection) -> (ClassModel, UserModel) {
        let teacher = UserModel::create(db, "rec_teacher", "rec_t@test.com", Role::Teacher)
            .await
            .unwrap();
        let student = UserModel::create(db, "rec_student", "rec_s@test.com", Role::Student)
            .await
            .unwrap();
        let class = ClassModel::create(
            db,
            teacher.id,
            "Bio",
            &["Monday".to_string()],
            "09:00",
            "10:00",
        )
        .await
        .unwrap();
        (class, student)
    }

    #[tokio::test]
    async fn second_record_same_day_hits_unique_index() {
        let db = setup_test_db().await;
        let (class, student) = seed(&db).await;
        let day = NaiveDate::from_ymd_opt(2026, 8, 24).unwrap();
        let now = Utc::now();

        Model::create_present(&db, class.id, student.id, day, now)
            .await
            .unwrap();
        let err = Model::create_present(&db, class.id, student.id, day, now)
            .await
            .unwrap_err();
        assert!(matches!(
            err.sql_err(),
            Some(SqlErr::UniqueConstraintViolation(_))
        ));

        // A different day is fine.
        let next_day = day.succ_opt().unwrap();
        Model::create_present(&db, class.id, student.id, next_day, now)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn leave_time_is_last_write_wins() {
        let db = setup_test_db().await;
        let (class, student) = seed(&db).await;
        let day = NaiveDate::from_ymd_opt(2026, 8, 24).unwrap();

        let record = Model::create_present(&db, class.id, student.id, day, Utc::now())
            .await
            .unwrap();

        let first = Utc::now();
        let record = record.set_leave_time(&db, first).await.unwrap();
        assert_eq!(record.leave_time, Some(first));

        let second = first + chrono::Duration::minutes(5);
        let record = record.set_leave_time(&db, second).await.unwrap();
        assert_eq!(record.leave_time, Some(second));
    }
}
