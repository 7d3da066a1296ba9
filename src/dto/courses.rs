use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Course row as listed in the catalog, decorated with the caller's
/// enrollment state. Anonymous callers see `isEnrolled: false, progress: 0`.
#[derive(Debug, Serialize, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CourseView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub instructor: String,
    pub price: i64,
    pub image: Option<String>,
    pub duration: String,
    pub level: String,
    pub category: String,
    pub rating: f64,
    pub students_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub lesson_count: i64,
    pub is_enrolled: bool,
    pub progress: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseList {
    pub courses: Vec<CourseView>,
}

#[derive(Debug, Serialize, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LessonView {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub duration: String,
    pub video_url: Option<String>,
    pub order_index: i32,
    pub is_completed: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: CourseView,
    pub lessons: Vec<LessonView>,
}
