use serde_json::Value;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult};

async fn insert_log(
    pool: &DbPool,
    user_id: Option<Uuid>,
    action: &str,
    resource: Option<&str>,
    details: Option<Value>,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs (id, user_id, action, resource, details)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(action)
    .bind(resource)
    .bind(details)
    .execute(pool)
    .await?;

    Ok(())
}

/// Best-effort audit write. A failed insert is logged and swallowed so
/// bookkeeping never turns a successful operation into an error.
pub async fn record(
    pool: &DbPool,
    user_id: Option<Uuid>,
    action: &str,
    resource: Option<&str>,
    details: Option<Value>,
) {
    if let Err(err) = insert_log(pool, user_id, action, resource, details).await {
        tracing::warn!(error = %err, action, "audit log failed");
    }
}
