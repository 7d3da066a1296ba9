use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ColumnTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    audit, catalog,
    db::{DbPool, OrmConn},
    entity::{
        enrollments::{
            ActiveModel as EnrollmentActive, Column as EnrollmentCol, Entity as Enrollments,
        },
        lesson_completions::{
            ActiveModel as CompletionActive, Column as CompletionCol, Entity as LessonCompletions,
        },
        lessons::{Column as LessonCol, Entity as Lessons},
    },
    error::{AppError, AppResult},
    models::ItemKind,
    response::ApiResponse,
};

/// Derived completion percentage, rounded to the nearest integer.
/// A course with no lessons reports 0 rather than dividing by zero.
pub fn progress_percent(completed: u64, total: u64) -> i32 {
    if total == 0 {
        return 0;
    }
    (100.0 * completed as f64 / total as f64).round() as i32
}

/// Creates the enrollment row if absent. Returns whether a new row was
/// created; the caller decides whether "already enrolled" is an error.
///
/// `students_count` is bumped only for a newly created enrollment, so an
/// order containing a course the user already holds cannot inflate it.
pub async fn ensure_enrolled(
    pool: &DbPool,
    orm: &OrmConn,
    user_id: Uuid,
    course_id: Uuid,
) -> AppResult<bool> {
    let insert = Enrollments::insert(EnrollmentActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        course_id: Set(course_id),
        progress: NotSet,
        enrolled_at: NotSet,
    })
    .on_conflict(
        OnConflict::columns([EnrollmentCol::UserId, EnrollmentCol::CourseId])
            .do_nothing()
            .to_owned(),
    )
    .exec(orm)
    .await;

    let created = match insert {
        Ok(_) => true,
        Err(DbErr::RecordNotInserted) => false,
        Err(err) => return Err(err.into()),
    };

    if created && catalog::increment_students_count(pool, course_id).await?.is_none() {
        tracing::warn!(course_id = %course_id, "students_count bump hit a missing course");
    }

    Ok(created)
}

/// Explicit enrollment endpoint path. Unlike the order-commit path, an
/// existing enrollment is a conflict here, not a silent success.
pub async fn enroll(
    pool: &DbPool,
    orm: &OrmConn,
    user_id: Uuid,
    course_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    if catalog::resolve(pool, ItemKind::Course, course_id).await?.is_none() {
        return Err(AppError::NotFound("Course"));
    }

    if !ensure_enrolled(pool, orm, user_id, course_id).await? {
        return Err(AppError::AlreadyEnrolled);
    }

    audit::record(
        pool,
        Some(user_id),
        "course_enroll",
        Some("enrollments"),
        Some(serde_json::json!({ "course_id": course_id })),
    )
    .await;

    Ok(ApiResponse::message_only("Enrolled successfully"))
}

/// Records a lesson completion and recomputes the stored progress.
///
/// Re-marking an already-completed lesson is a no-op that still reports
/// success, and leaves progress unchanged.
pub async fn complete_lesson(
    pool: &DbPool,
    orm: &OrmConn,
    user_id: Uuid,
    course_id: Uuid,
    lesson_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let enrolled = Enrollments::find()
        .filter(EnrollmentCol::UserId.eq(user_id))
        .filter(EnrollmentCol::CourseId.eq(course_id))
        .count(orm)
        .await?
        > 0;
    if !enrolled {
        return Err(AppError::NotEnrolled);
    }

    let lesson = Lessons::find_by_id(lesson_id).one(orm).await?;
    match lesson {
        Some(lesson) if lesson.course_id == course_id => {}
        _ => return Err(AppError::NotFound("Lesson")),
    }

    let insert = LessonCompletions::insert(CompletionActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        lesson_id: Set(lesson_id),
        completed_at: NotSet,
    })
    .on_conflict(
        OnConflict::columns([CompletionCol::UserId, CompletionCol::LessonId])
            .do_nothing()
            .to_owned(),
    )
    .exec(orm)
    .await;

    match insert {
        Ok(_) | Err(DbErr::RecordNotInserted) => {}
        Err(err) => return Err(err.into()),
    }

    let progress = recompute_progress(orm, user_id, course_id).await?;

    audit::record(
        pool,
        Some(user_id),
        "lesson_complete",
        Some("lesson_completions"),
        Some(serde_json::json!({
            "course_id": course_id,
            "lesson_id": lesson_id,
            "progress": progress,
        })),
    )
    .await;

    Ok(ApiResponse::message_only("Lesson marked as completed"))
}

/// Rebuilds the materialized progress value from completion state and
/// stores it on the enrollment. Runs only on the write path; reads return
/// the stored value as-is.
pub async fn recompute_progress(
    orm: &OrmConn,
    user_id: Uuid,
    course_id: Uuid,
) -> AppResult<i32> {
    let total = Lessons::find()
        .filter(LessonCol::CourseId.eq(course_id))
        .count(orm)
        .await?;

    let completed = LessonCompletions::find()
        .filter(CompletionCol::UserId.eq(user_id))
        .inner_join(Lessons)
        .filter(LessonCol::CourseId.eq(course_id))
        .count(orm)
        .await?;

    let progress = progress_percent(completed, total);

    Enrollments::update_many()
        .col_expr(EnrollmentCol::Progress, Expr::value(progress))
        .filter(EnrollmentCol::UserId.eq(user_id))
        .filter(EnrollmentCol::CourseId.eq(course_id))
        .exec(orm)
        .await?;

    Ok(progress)
}

/// Stored progress for a user and course, if enrolled.
pub async fn progress_for(
    orm: &OrmConn,
    user_id: Uuid,
    course_id: Uuid,
) -> AppResult<Option<i32>> {
    let enrollment = Enrollments::find()
        .filter(EnrollmentCol::UserId.eq(user_id))
        .filter(EnrollmentCol::CourseId.eq(course_id))
        .one(orm)
        .await?;
    Ok(enrollment.map(|e| e.progress))
}
