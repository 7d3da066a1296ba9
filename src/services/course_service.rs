use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::courses::{CourseDetail, CourseList, CourseView, LessonView},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::CourseQuery,
};

/// Catalog listing, decorated with the viewer's enrollment state when a
/// verified identity is present.
pub async fn list_courses(
    pool: &DbPool,
    viewer: Option<&AuthUser>,
    query: CourseQuery,
) -> AppResult<ApiResponse<CourseList>> {
    let viewer_id = viewer.map(|user| user.user_id);

    let courses = sqlx::query_as::<_, CourseView>(
        r#"
        SELECT c.id, c.title, c.description, c.instructor, c.price, c.image,
               c.duration, c.level, c.category, c.rating, c.students_count,
               c.created_at, c.updated_at,
               COUNT(l.id) AS lesson_count,
               (e.user_id IS NOT NULL) AS is_enrolled,
               COALESCE(e.progress, 0) AS progress
        FROM courses c
        LEFT JOIN lessons l ON l.course_id = c.id
        LEFT JOIN enrollments e ON e.course_id = c.id AND e.user_id = $1
        WHERE ($2::text IS NULL OR c.category = $2)
          AND ($3::text IS NULL OR c.level = $3)
          AND ($4::text IS NULL
               OR c.title ILIKE '%' || $4 || '%'
               OR c.description ILIKE '%' || $4 || '%')
        GROUP BY c.id, e.user_id, e.progress
        ORDER BY c.created_at DESC
        "#,
    )
    .bind(viewer_id)
    .bind(query.category.as_deref())
    .bind(query.level.as_deref())
    .bind(query.search.as_deref())
    .fetch_all(pool)
    .await?;

    Ok(ApiResponse::success("OK", CourseList { courses }, None))
}

pub async fn get_course(
    pool: &DbPool,
    viewer: Option<&AuthUser>,
    course_id: Uuid,
) -> AppResult<ApiResponse<CourseDetail>> {
    let viewer_id = viewer.map(|user| user.user_id);

    let course: Option<CourseView> = sqlx::query_as(
        r#"
        SELECT c.id, c.title, c.description, c.instructor, c.price, c.image,
               c.duration, c.level, c.category, c.rating, c.students_count,
               c.created_at, c.updated_at,
               (SELECT COUNT(*) FROM lessons l WHERE l.course_id = c.id) AS lesson_count,
               (e.user_id IS NOT NULL) AS is_enrolled,
               COALESCE(e.progress, 0) AS progress
        FROM courses c
        LEFT JOIN enrollments e ON e.course_id = c.id AND e.user_id = $1
        WHERE c.id = $2
        "#,
    )
    .bind(viewer_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await?;

    let course = match course {
        Some(course) => course,
        None => return Err(AppError::NotFound("Course")),
    };

    let lessons = sqlx::query_as::<_, LessonView>(
        r#"
        SELECT l.id, l.course_id, l.title, l.duration, l.video_url, l.order_index,
               (lc.user_id IS NOT NULL) AS is_completed
        FROM lessons l
        LEFT JOIN lesson_completions lc ON lc.lesson_id = l.id AND lc.user_id = $1
        WHERE l.course_id = $2
        ORDER BY l.order_index
        "#,
    )
    .bind(viewer_id)
    .bind(course_id)
    .fetch_all(pool)
    .await?;

    Ok(ApiResponse::success(
        "OK",
        CourseDetail { course, lessons },
        None,
    ))
}
