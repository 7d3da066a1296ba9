//! Cart persistence behind a single repository seam.
//!
//! Authenticated users get a database-backed cart; anonymous visitors get an
//! in-process cart keyed by an opaque session token. Business logic works
//! against [`CartRepository`] and never branches on which one it holds.

use std::{collections::HashMap, future::Future, sync::Arc};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::{AppError, AppResult},
    models::ItemKind,
};

/// Whose cart a request is operating on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CartOwner {
    User(Uuid),
    Guest(String),
}

/// A catalog reference as stored on a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemRef {
    pub kind: ItemKind,
    pub id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub item: ItemRef,
    pub quantity: i32,
}

/// Uniform cart contract for both storage backends.
///
/// Semantics shared by all implementations:
/// - `add` increments an existing line's quantity instead of overwriting it.
/// - `set_quantity` with a non-positive quantity removes the line and always
///   succeeds; with a positive quantity it overwrites and reports
///   [`AppError::NotFound`] when the line is absent.
/// - `remove` reports [`AppError::NotFound`] for an absent line.
/// - `lines` returns lines oldest first.
///
/// Methods are declared as `Send` futures; implementations write `async fn`.
pub trait CartRepository {
    fn add(&self, item: ItemRef, quantity: i32) -> impl Future<Output = AppResult<()>> + Send;
    fn set_quantity(
        &self,
        item: ItemRef,
        quantity: i32,
    ) -> impl Future<Output = AppResult<()>> + Send;
    fn remove(&self, item: ItemRef) -> impl Future<Output = AppResult<()>> + Send;
    fn clear(&self) -> impl Future<Output = AppResult<()>> + Send;
    fn lines(&self) -> impl Future<Output = AppResult<Vec<CartLine>>> + Send;
}

/// Database-backed cart for an authenticated user.
#[derive(Clone)]
pub struct ServerCart {
    pool: DbPool,
    user_id: Uuid,
}

impl ServerCart {
    pub fn new(pool: DbPool, user_id: Uuid) -> Self {
        Self { pool, user_id }
    }
}

impl CartRepository for ServerCart {
    async fn add(&self, item: ItemRef, quantity: i32) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO cart_lines (user_id, item_type, item_id, quantity)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, item_type, item_id)
            DO UPDATE SET quantity = cart_lines.quantity + EXCLUDED.quantity
            "#,
        )
        .bind(self.user_id)
        .bind(item.kind.as_str())
        .bind(item.id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_quantity(&self, item: ItemRef, quantity: i32) -> AppResult<()> {
        if quantity <= 0 {
            sqlx::query(
                "DELETE FROM cart_lines WHERE user_id = $1 AND item_type = $2 AND item_id = $3",
            )
            .bind(self.user_id)
            .bind(item.kind.as_str())
            .bind(item.id)
            .execute(&self.pool)
            .await?;
            return Ok(());
        }

        let result = sqlx::query(
            r#"
            UPDATE cart_lines SET quantity = $4
            WHERE user_id = $1 AND item_type = $2 AND item_id = $3
            "#,
        )
        .bind(self.user_id)
        .bind(item.kind.as_str())
        .bind(item.id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Cart item"));
        }
        Ok(())
    }

    async fn remove(&self, item: ItemRef) -> AppResult<()> {
        let result = sqlx::query(
            "DELETE FROM cart_lines WHERE user_id = $1 AND item_type = $2 AND item_id = $3",
        )
        .bind(self.user_id)
        .bind(item.kind.as_str())
        .bind(item.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Cart item"));
        }
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        sqlx::query("DELETE FROM cart_lines WHERE user_id = $1")
            .bind(self.user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn lines(&self) -> AppResult<Vec<CartLine>> {
        let rows: Vec<(String, Uuid, i32)> = sqlx::query_as(
            r#"
            SELECT item_type, item_id, quantity
            FROM cart_lines
            WHERE user_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(self.user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(item_type, item_id, quantity)| {
                Ok(CartLine {
                    item: ItemRef {
                        kind: ItemKind::parse(&item_type)?,
                        id: item_id,
                    },
                    quantity,
                })
            })
            .collect()
    }
}

/// Shared in-process storage for guest carts, keyed by session token.
///
/// Lines are kept as a Vec to preserve insertion order for display and for
/// deterministic replay when a guest cart is merged at login. A token's
/// bucket exists only while it holds lines: lookups with unknown tokens
/// never allocate, and a mutation that empties a bucket drops it.
#[derive(Clone, Default)]
pub struct GuestCartStore {
    inner: Arc<RwLock<HashMap<String, Vec<CartLine>>>>,
}

impl GuestCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of guest carts currently resident.
    pub async fn cart_count(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Removes and returns all lines for a token, in insertion order.
    pub async fn take(&self, token: &str) -> Vec<CartLine> {
        self.inner.write().await.remove(token).unwrap_or_default()
    }
}

/// Token-scoped view over a [`GuestCartStore`].
#[derive(Clone)]
pub struct GuestCart {
    store: GuestCartStore,
    token: String,
}

impl GuestCart {
    pub fn new(store: GuestCartStore, token: String) -> Self {
        Self { store, token }
    }
}

impl CartRepository for GuestCart {
    async fn add(&self, item: ItemRef, quantity: i32) -> AppResult<()> {
        let mut carts = self.store.inner.write().await;
        let lines = carts.entry(self.token.clone()).or_default();
        match lines.iter_mut().find(|line| line.item == item) {
            Some(line) => line.quantity += quantity,
            None => lines.push(CartLine { item, quantity }),
        }
        Ok(())
    }

    async fn set_quantity(&self, item: ItemRef, quantity: i32) -> AppResult<()> {
        let mut carts = self.store.inner.write().await;
        if quantity <= 0 {
            if let Some(lines) = carts.get_mut(&self.token) {
                lines.retain(|line| line.item != item);
                if lines.is_empty() {
                    carts.remove(&self.token);
                }
            }
            return Ok(());
        }
        match carts
            .get_mut(&self.token)
            .and_then(|lines| lines.iter_mut().find(|line| line.item == item))
        {
            Some(line) => {
                line.quantity = quantity;
                Ok(())
            }
            None => Err(AppError::NotFound("Cart item")),
        }
    }

    async fn remove(&self, item: ItemRef) -> AppResult<()> {
        let mut carts = self.store.inner.write().await;
        let Some(lines) = carts.get_mut(&self.token) else {
            return Err(AppError::NotFound("Cart item"));
        };
        let before = lines.len();
        lines.retain(|line| line.item != item);
        if lines.len() == before {
            return Err(AppError::NotFound("Cart item"));
        }
        if lines.is_empty() {
            carts.remove(&self.token);
        }
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        self.store.inner.write().await.remove(&self.token);
        Ok(())
    }

    async fn lines(&self) -> AppResult<Vec<CartLine>> {
        let carts = self.store.inner.read().await;
        Ok(carts.get(&self.token).cloned().unwrap_or_default())
    }
}

/// Runtime dispatch between the two backends.
pub enum AnyCart {
    Server(ServerCart),
    Guest(GuestCart),
}

impl AnyCart {
    pub fn for_owner(pool: &DbPool, guest_carts: &GuestCartStore, owner: CartOwner) -> Self {
        match owner {
            CartOwner::User(user_id) => Self::Server(ServerCart::new(pool.clone(), user_id)),
            CartOwner::Guest(token) => Self::Guest(GuestCart::new(guest_carts.clone(), token)),
        }
    }
}

impl CartRepository for AnyCart {
    async fn add(&self, item: ItemRef, quantity: i32) -> AppResult<()> {
        match self {
            Self::Server(cart) => cart.add(item, quantity).await,
            Self::Guest(cart) => cart.add(item, quantity).await,
        }
    }

    async fn set_quantity(&self, item: ItemRef, quantity: i32) -> AppResult<()> {
        match self {
            Self::Server(cart) => cart.set_quantity(item, quantity).await,
            Self::Guest(cart) => cart.set_quantity(item, quantity).await,
        }
    }

    async fn remove(&self, item: ItemRef) -> AppResult<()> {
        match self {
            Self::Server(cart) => cart.remove(item).await,
            Self::Guest(cart) => cart.remove(item).await,
        }
    }

    async fn clear(&self) -> AppResult<()> {
        match self {
            Self::Server(cart) => cart.clear().await,
            Self::Guest(cart) => cart.clear().await,
        }
    }

    async fn lines(&self) -> AppResult<Vec<CartLine>> {
        match self {
            Self::Server(cart) => cart.lines().await,
            Self::Guest(cart) => cart.lines().await,
        }
    }
}
