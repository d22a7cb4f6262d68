pub mod m202608250001_create_users;
pub mod m202608250002_create_class_sessions;
pub mod m202608250003_create_class_students;
pub mod m202608250004_create_attendance_records;
