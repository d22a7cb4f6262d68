use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, SqlErr,
    TransactionTrait,
};
use serde::Serialize;

use crate::schedule::Schedule;

/// A recurring, teacher-owned class with a weekly schedule and a join code.
///
/// The schedule is fixed at creation; there is no edit path. `days` holds a
/// JSON array of weekday names and is `None`/empty for legacy rows, which
/// makes the class permanently inactive.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "class_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub teacher_id: i64,
    pub class_name: String,
    pub code: String,
    pub days: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::TeacherId",
        to = "super::user::Column::Id"
    )]
    Teacher,
    #[sea_orm(has_many = "super::class_student::Entity")]
    Enrollments,
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    Records,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
}

impl Related<super::class_student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollments.def()
    }
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_LENGTH: usize = 6;
const CODE_RETRIES: usize = 5;

fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

impl Model {
    /// Creates a class with a freshly generated join code.
    ///
    /// Codes are short, so collisions are unlikely but possible; the insert
    /// is retried with a new code when the unique constraint trips.
    pub async fn create(
        db: &DatabaseConnection,
        teacher_id: i64,
        class_name: &str,
        days: &[String],
        start_time: &str,
        end_time: &str,
    ) -> Result<Model, DbErr> {
        let days_json =
            serde_json::to_string(days).map_err(|e| DbErr::Custom(e.to_string()))?;

        let mut last_err = DbErr::Custom("join code generation failed".into());
        for _ in 0..CODE_RETRIES {
            let now = Utc::now();
            let session = ActiveModel {
                teacher_id: Set(teacher_id),
                class_name: Set(class_name.to_owned()),
                code: Set(generate_code()),
                days: Set(Some(days_json.clone())),
                start_time: Set(Some(start_time.to_owned())),
                end_time: Set(Some(end_time.to_owned())),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };
            match session.insert(db).await {
                Ok(model) => return Ok(model),
                Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                    last_err = e;
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err)
    }

    pub async fn find_by_id(db: &DatabaseConnection, id: i64) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id(id).one(db).await
    }

    /// Join-code lookup. Codes are stored uppercased, so matching the
    /// uppercased input makes this case-insensitive.
    pub async fn find_by_code(
        db: &DatabaseConnection,
        code: &str,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::Code.eq(code.trim().to_uppercase()))
            .one(db)
            .await
    }

    pub async fn find_by_teacher(
        db: &DatabaseConnection,
        teacher_id: i64,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::TeacherId.eq(teacher_id))
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.teacher_id == user_id
    }

    /// The parsed weekly schedule, or `None` when days or either bound is
    /// missing. A schedule-less class never counts as active.
    pub fn schedule(&self) -> Option<Schedule> {
        let days: Vec<String> = serde_json::from_str(self.days.as_deref()?).ok()?;
        if days.is_empty() {
            return None;
        }
        Some(Schedule {
            days,
            start_time: self.start_time.clone()?,
            end_time: self.end_time.clone()?,
        })
    }

    /// Enrolled student ids in enrollment order, for roster display.
    pub async fn enrolled_student_ids(
        &self,
        db: &DatabaseConnection,
    ) -> Result<Vec<i64>, DbErr> {
        let rows = super::class_student::Entity::find()
            .filter(super::class_student::Column::ClassId.eq(self.id))
            .order_by_asc(super::class_student::Column::EnrolledAt)
            .order_by_asc(super::class_student::Column::StudentId)
            .all(db)
            .await?;
        Ok(rows.into_iter().map(|r| r.student_id).collect())
    }

    pub async fn is_student_enrolled(
        &self,
        db: &DatabaseConnection,
        student_id: i64,
    ) -> Result<bool, DbErr> {
        let found = super::class_student::Entity::find()
            .filter(super::class_student::Column::ClassId.eq(self.id))
            .filter(super::class_student::Column::StudentId.eq(student_id))
            .one(db)
            .await?;
        Ok(found.is_some())
    }

    /// Enrolls a student and marks them present for `day` in one transaction.
    ///
    /// Quick-join is a single user action with two writes; neither may land
    /// without the other.
    pub async fn enroll_and_mark_present(
        &self,
        db: &DatabaseConnection,
        student_id: i64,
        day: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<super::attendance_record::Model, DbErr> {
        let class_id = self.id;
        db.transaction::<_, super::attendance_record::Model, DbErr>(move |txn| {
            Box::pin(async move {
                let enrollment = super::class_student::ActiveModel {
                    class_id: Set(class_id),
                    student_id: Set(student_id),
                    enrolled_at: Set(now),
                };
                enrollment.insert(txn).await?;

                let record = super::attendance_record::ActiveModel {
                    class_id: Set(class_id),
                    student_id: Set(student_id),
                    attendance_day: Set(day),
                    marked_at: Set(now),
                    status: Set(super::attendance_record::AttendanceStatus::Present),
                    leave_time: Set(None),
                    ..Default::default()
                };
                record.insert(txn).await
            })
        })
        .await
        .map_err(|e| match e {
            sea_orm::TransactionError::Connection(e) => e,
            sea_orm::TransactionError::Transaction(e) => e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::{Model as UserModel, Role};
    use crate::test_utils::setup_test_db;

    #[tokio::test]
    async fn create_generates_uppercase_code_and_roundtrips_schedule() {
        let db = setup_test_db().await;
        let teacher = UserModel::create(&db, "t1", "t1@test.com", Role::Teacher)
            .await
            .unwrap();

        let class = Model::create(
            &db,
            teacher.id,
            "Physics 101",
            &["Monday".to_string(), "Wednesday".to_string()],
            "09:00",
            "10:00",
        )
        .await
        .unwrap();

        assert_eq!(class.code.len(), 6);
        assert_eq!(class.code, class.code.to_uppercase());

        let schedule = class.schedule().expect("schedule present");
        assert_eq!(schedule.days, vec!["Monday", "Wednesday"]);
        assert_eq!(schedule.window_label(), "09:00 - 10:00");
    }

    #[tokio::test]
    async fn find_by_code_is_case_insensitive() {
        let db = setup_test_db().await;
        let teacher = UserModel::create(&db, "t2", "t2@test.com", Role::Teacher)
            .await
            .unwrap();
        let class = Model::create(&db, teacher.id, "Chem", &["Friday".to_string()], "08:00", "09:00")
            .await
            .unwrap();

        let found = Model::find_by_code(&db, &class.code.to_lowercase())
            .await
            .unwrap();
        assert_eq!(found.map(|c| c.id), Some(class.id));
    }

    #[tokio::test]
    async fn schedule_is_none_for_missing_parts() {
        let db = setup_test_db().await;
        let teacher = UserModel::create(&db, "t3", "t3@test.com", Role::Teacher)
            .await
            .unwrap();
        let class = Model::create(&db, teacher.id, "Old", &["Monday".to_string()], "09:00", "10:00")
            .await
            .unwrap();

        let mut stripped: ActiveModel = class.into();
        stripped.start_time = Set(None);
        let stripped = stripped.update(&db).await.unwrap();

        assert!(stripped.schedule().is_none());
    }
}
