use axum_training_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    entity::{
        courses::ActiveModel as CourseActive,
        lesson_completions::{Column as CompletionCol, Entity as LessonCompletions},
        lessons::ActiveModel as LessonActive,
        users::ActiveModel as UserActive,
    },
    error::AppError,
    services::enrollment_service::{self, progress_percent},
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set, Statement};
use uuid::Uuid;

#[test]
fn progress_rounds_to_nearest_percent() {
    assert_eq!(progress_percent(0, 4), 0);
    assert_eq!(progress_percent(1, 4), 25);
    assert_eq!(progress_percent(1, 3), 33);
    assert_eq!(progress_percent(2, 3), 67);
    assert_eq!(progress_percent(3, 3), 100);
}

#[test]
fn progress_of_empty_course_is_zero() {
    assert_eq!(progress_percent(0, 0), 0);
}

// Integration flow: explicit enrollment, idempotent lesson completion and
// the derived progress value.
#[tokio::test]
async fn enroll_and_complete_lessons_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    let user_id = create_user(&state, "user@example.com").await?;
    let course_id = create_course(&state, "Industrial Automation").await?;
    let other_course_id = create_course(&state, "Computer Networks").await?;

    let mut lesson_ids = Vec::new();
    for index in 1..=4 {
        lesson_ids.push(create_lesson(&state, course_id, index).await?);
    }
    let foreign_lesson_id = create_lesson(&state, other_course_id, 1).await?;

    // Completion before enrollment is refused.
    let err = enrollment_service::complete_lesson(
        &state.pool,
        &state.orm,
        user_id,
        course_id,
        lesson_ids[0],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotEnrolled));

    // Enrolling in a missing course is a 404.
    let err = enrollment_service::enroll(&state.pool, &state.orm, user_id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    enrollment_service::enroll(&state.pool, &state.orm, user_id, course_id).await?;
    assert_eq!(
        enrollment_service::progress_for(&state.orm, user_id, course_id).await?,
        Some(0)
    );

    // A second explicit enrollment is a conflict.
    let err = enrollment_service::enroll(&state.pool, &state.orm, user_id, course_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AlreadyEnrolled));

    // One of four lessons done: 25%.
    enrollment_service::complete_lesson(
        &state.pool,
        &state.orm,
        user_id,
        course_id,
        lesson_ids[0],
    )
    .await?;
    assert_eq!(
        enrollment_service::progress_for(&state.orm, user_id, course_id).await?,
        Some(25)
    );

    // Re-completing the same lesson succeeds and changes nothing.
    enrollment_service::complete_lesson(
        &state.pool,
        &state.orm,
        user_id,
        course_id,
        lesson_ids[0],
    )
    .await?;
    let completions = LessonCompletions::find()
        .filter(CompletionCol::UserId.eq(user_id))
        .count(&state.orm)
        .await?;
    assert_eq!(completions, 1);
    assert_eq!(
        enrollment_service::progress_for(&state.orm, user_id, course_id).await?,
        Some(25)
    );

    // A lesson from another course does not belong to this enrollment.
    let err = enrollment_service::complete_lesson(
        &state.pool,
        &state.orm,
        user_id,
        course_id,
        foreign_lesson_id,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // Finishing the rest lands on 100%.
    for lesson_id in &lesson_ids[1..] {
        enrollment_service::complete_lesson(&state.pool, &state.orm, user_id, course_id, *lesson_id)
            .await?;
    }
    assert_eq!(
        enrollment_service::progress_for(&state.orm, user_id, course_id).await?,
        Some(100)
    );

    // The untouched course still reports no enrollment.
    assert_eq!(
        enrollment_service::progress_for(&state.orm, user_id, other_course_id).await?,
        None
    );

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_lines, orders, cart_lines, lesson_completions, enrollments, lessons, courses, products, audit_logs, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(AppState::new(pool, orm))
}

async fn create_user(state: &AppState, email: &str) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set("Test".into()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        role: Set("user".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}

async fn create_course(state: &AppState, title: &str) -> anyhow::Result<Uuid> {
    let course = CourseActive {
        id: Set(Uuid::new_v4()),
        title: Set(title.to_string()),
        description: Set("A course for testing".into()),
        instructor: Set("Training Team".into()),
        price: Set(150_000),
        image: Set(None),
        duration: Set("2 months".into()),
        level: Set("Beginner".into()),
        category: Set("Automation".into()),
        rating: NotSet,
        students_count: NotSet,
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(course.id)
}

async fn create_lesson(state: &AppState, course_id: Uuid, order_index: i32) -> anyhow::Result<Uuid> {
    let lesson = LessonActive {
        id: Set(Uuid::new_v4()),
        course_id: Set(course_id),
        title: Set(format!("Lesson {order_index}")),
        duration: Set("1h".into()),
        video_url: Set(None),
        order_index: Set(order_index),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(lesson.id)
}
