use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::courses::{CourseDetail, CourseList},
    error::AppResult,
    middleware::auth::{AuthUser, OptionalAuthUser},
    response::ApiResponse,
    routes::params::CourseQuery,
    services::{course_service, enrollment_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses))
        .route("/{id}", get(get_course))
        .route("/{id}/enroll", post(enroll))
        .route(
            "/{course_id}/lessons/{lesson_id}/complete",
            post(complete_lesson),
        )
}

#[utoipa::path(
    get,
    path = "/api/courses",
    responses(
        (status = 200, description = "Course catalog", body = ApiResponse<CourseList>)
    ),
    tag = "Courses"
)]
pub async fn list_courses(
    State(state): State<AppState>,
    OptionalAuthUser(viewer): OptionalAuthUser,
    Query(query): Query<CourseQuery>,
) -> AppResult<Json<ApiResponse<CourseList>>> {
    let resp = course_service::list_courses(&state.pool, viewer.as_ref(), query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    responses(
        (status = 200, description = "Course with its lessons", body = ApiResponse<CourseDetail>),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses"
)]
pub async fn get_course(
    State(state): State<AppState>,
    OptionalAuthUser(viewer): OptionalAuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CourseDetail>>> {
    let resp = course_service::get_course(&state.pool, viewer.as_ref(), id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/enroll",
    responses(
        (status = 200, description = "Enrolled"),
        (status = 404, description = "Course not found"),
        (status = 409, description = "Already enrolled")
    ),
    tag = "Courses"
)]
pub async fn enroll(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = enrollment_service::enroll(&state.pool, &state.orm, user.user_id, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/courses/{course_id}/lessons/{lesson_id}/complete",
    responses(
        (status = 200, description = "Completion recorded (idempotent)"),
        (status = 403, description = "Not enrolled in this course"),
        (status = 404, description = "Lesson not found")
    ),
    tag = "Courses"
)]
pub async fn complete_lesson(
    State(state): State<AppState>,
    user: AuthUser,
    Path((course_id, lesson_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = enrollment_service::complete_lesson(
        &state.pool,
        &state.orm,
        user.user_id,
        course_id,
        lesson_id,
    )
    .await?;
    Ok(Json(resp))
}
