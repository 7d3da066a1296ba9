use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum_training_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user_with_role(&pool, "Admin", "admin@example.com", "admin123", "admin").await?;
    let user_id = ensure_user_with_role(&pool, "Test User", "user@example.com", "user123", "user").await?;
    seed_courses(&pool).await?;
    seed_products(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user_with_role(
    pool: &sqlx::PgPool,
    name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    // If user already exists, fetch id
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_courses(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    // Courses have no natural unique key, so seed only into an empty table.
    let existing: (i64,) = sqlx::query_as("SELECT count(*) FROM courses")
        .fetch_one(pool)
        .await?;
    if existing.0 > 0 {
        println!("Courses already present, skipping");
        return Ok(());
    }

    let courses = vec![
        (
            "Solar Photovoltaics",
            "Hands-on installation and maintenance of photovoltaic systems",
            150_000_i64,
            "1-6 months",
            "Beginner",
            "Renewable Energy",
            vec![
                ("Photovoltaic principles", "3h", 1),
                ("System sizing", "3h", 2),
                ("Practical installation", "6h", 3),
                ("Maintenance and troubleshooting", "3h", 4),
            ],
        ),
        (
            "Industrial Automation",
            "PLC programming and industrial control systems",
            175_000,
            "2-4 months",
            "Intermediate",
            "Automation",
            vec![
                ("Introduction to PLCs", "3h", 1),
                ("Ladder programming", "5h", 2),
                ("Supervision and HMI", "4h", 3),
            ],
        ),
        (
            "Computer Networks",
            "Configuration and administration of enterprise networks",
            160_000,
            "2-3 months",
            "Intermediate",
            "IT",
            vec![
                ("Network fundamentals", "4h", 1),
                ("Equipment configuration", "6h", 2),
                ("Network security", "5h", 3),
            ],
        ),
    ];

    for (title, description, price, duration, level, category, lessons) in courses {
        let course_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO courses (id, title, description, instructor, price, duration, level, category)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(course_id)
        .bind(title)
        .bind(description)
        .bind("Training Team")
        .bind(price)
        .bind(duration)
        .bind(level)
        .bind(category)
        .execute(pool)
        .await?;

        for (lesson_title, lesson_duration, order_index) in lessons {
            sqlx::query(
                r#"
                INSERT INTO lessons (id, course_id, title, duration, order_index)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(course_id)
            .bind(lesson_title)
            .bind(lesson_duration)
            .bind(order_index)
            .execute(pool)
            .await?;
        }
    }

    println!("Seeded courses");
    Ok(())
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let products = vec![
        (
            "100W Solar Kit",
            "Complete kit for a domestic solar installation",
            85_000_i64,
            "Solar Energy",
            15,
            "100W monocrystalline panel,MPPT 20A controller,100Ah battery",
        ),
        (
            "Digital Multimeter",
            "High precision multimeter for electrical measurements",
            25_000,
            "Measurement Instruments",
            25,
            "AC/DC measurement,Continuity test,Backlit LCD",
        ),
        (
            "Arduino Mega Starter Kit",
            "Complete kit for electronics projects and prototyping",
            35_000,
            "Electronics",
            30,
            "Arduino Mega 2560,Breadboard,Assorted sensors",
        ),
        (
            "NEMA 23 Stepper Motor",
            "Precision motor for CNC and robotics applications",
            28_000,
            "Robotics",
            22,
            "1.9Nm torque,200 steps per revolution,Driver included",
        ),
    ];

    for (name, description, price, category, stock, features) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, category, stock, features)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(category)
        .bind(stock)
        .bind(features)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
