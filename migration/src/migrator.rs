use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202608250001_create_users::Migration),
            Box::new(migrations::m202608250002_create_class_sessions::Migration),
            Box::new(migrations::m202608250003_create_class_students::Migration),
            Box::new(migrations::m202608250004_create_attendance_records::Migration),
        ]
    }
}
