use crate::{
    audit,
    cart_store::{AnyCart, CartLine, CartOwner, CartRepository, GuestCartStore, ItemRef},
    catalog,
    db::DbPool,
    dto::cart::{
        AddToCartRequest, CartItemView, CartView, RemoveFromCartRequest, UpdateCartRequest,
    },
    error::{AppError, AppResult},
    models::ItemKind,
    response::{ApiResponse, Meta},
};

/// A cart line joined with its current catalog snapshot.
#[derive(Debug, Clone)]
pub struct PricedLine {
    pub item: ItemRef,
    pub name: String,
    pub price: i64,
    pub image: Option<String>,
    pub quantity: i32,
}

/// Prices every line of a cart against the catalog as of now.
///
/// Lines whose catalog row has disappeared are skipped with a warning
/// instead of poisoning the whole cart.
pub async fn priced_lines(pool: &DbPool, cart: &impl CartRepository) -> AppResult<Vec<PricedLine>> {
    let lines = cart.lines().await?;
    let mut priced = Vec::with_capacity(lines.len());
    for CartLine { item, quantity } in lines {
        match catalog::resolve(pool, item.kind, item.id).await? {
            Some(snapshot) => priced.push(PricedLine {
                item,
                name: snapshot.name,
                price: snapshot.price,
                image: snapshot.image,
                quantity,
            }),
            None => {
                tracing::warn!(
                    item_type = %item.kind,
                    item_id = %item.id,
                    "cart line references a missing catalog item, skipping"
                );
            }
        }
    }
    Ok(priced)
}

pub fn build_cart_view(lines: Vec<PricedLine>) -> CartView {
    let total = lines
        .iter()
        .map(|line| line.price * i64::from(line.quantity))
        .sum();
    let item_count = lines.iter().map(|line| line.quantity).sum();
    let items = lines
        .into_iter()
        .map(|line| CartItemView {
            id: format!("{}_{}", line.item.kind, line.item.id),
            name: line.name,
            price: line.price,
            image: line.image,
            quantity: line.quantity,
            item_type: line.item.kind,
            item_id: line.item.id,
        })
        .collect();
    CartView {
        items,
        total,
        item_count,
    }
}

pub async fn view_cart(
    pool: &DbPool,
    cart: &impl CartRepository,
) -> AppResult<ApiResponse<CartView>> {
    let lines = priced_lines(pool, cart).await?;
    Ok(ApiResponse::success("OK", build_cart_view(lines), None))
}

pub async fn add_to_cart(
    pool: &DbPool,
    cart: &impl CartRepository,
    owner: &CartOwner,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let kind = ItemKind::parse(&payload.item_type)?;
    let quantity = payload.quantity.unwrap_or(1);
    if quantity <= 0 {
        return Err(AppError::Validation(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let exists = catalog::resolve(pool, kind, payload.item_id).await?.is_some();
    if !exists {
        return Err(match kind {
            ItemKind::Course => AppError::NotFound("Course"),
            ItemKind::Product => AppError::NotFound("Product"),
        });
    }

    let item = ItemRef {
        kind,
        id: payload.item_id,
    };
    cart.add(item, quantity).await?;

    if let CartOwner::User(user_id) = owner {
        audit::record(
            pool,
            Some(*user_id),
            "cart_add",
            Some("cart_lines"),
            Some(serde_json::json!({
                "item_type": kind.as_str(),
                "item_id": payload.item_id,
                "quantity": quantity,
            })),
        )
        .await;
    }

    Ok(ApiResponse::message_only("Item added to cart"))
}

pub async fn update_cart_item(
    pool: &DbPool,
    cart: &impl CartRepository,
    owner: &CartOwner,
    payload: UpdateCartRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let kind = ItemKind::parse(&payload.item_type)?;
    let item = ItemRef {
        kind,
        id: payload.item_id,
    };

    let removed = payload.quantity <= 0;
    cart.set_quantity(item, payload.quantity).await?;

    if let CartOwner::User(user_id) = owner {
        audit::record(
            pool,
            Some(*user_id),
            "cart_update",
            Some("cart_lines"),
            Some(serde_json::json!({
                "item_type": kind.as_str(),
                "item_id": payload.item_id,
                "quantity": payload.quantity,
            })),
        )
        .await;
    }

    let message = if removed {
        "Item removed from cart"
    } else {
        "Quantity updated"
    };
    Ok(ApiResponse::message_only(message))
}

pub async fn remove_from_cart(
    pool: &DbPool,
    cart: &impl CartRepository,
    owner: &CartOwner,
    payload: RemoveFromCartRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let kind = ItemKind::parse(&payload.item_type)?;
    cart.remove(ItemRef {
        kind,
        id: payload.item_id,
    })
    .await?;

    if let CartOwner::User(user_id) = owner {
        audit::record(
            pool,
            Some(*user_id),
            "cart_remove",
            Some("cart_lines"),
            Some(serde_json::json!({
                "item_type": kind.as_str(),
                "item_id": payload.item_id,
            })),
        )
        .await;
    }

    Ok(ApiResponse::message_only("Item removed from cart"))
}

pub async fn clear_cart(
    cart: &impl CartRepository,
) -> AppResult<ApiResponse<serde_json::Value>> {
    cart.clear().await?;
    Ok(ApiResponse::success(
        "Cart cleared",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Replays a guest cart's lines into a user's server cart after login.
///
/// Best-effort by contract: a line that no longer resolves or fails to
/// insert is logged and dropped, and never blocks the login itself.
pub async fn merge_guest_into(
    pool: &DbPool,
    guest_carts: &GuestCartStore,
    token: &str,
    user_id: uuid::Uuid,
) {
    let lines = guest_carts.take(token).await;
    if lines.is_empty() {
        return;
    }

    let server = AnyCart::for_owner(pool, guest_carts, CartOwner::User(user_id));
    for line in lines {
        if let Err(err) = server.add(line.item, line.quantity).await {
            tracing::warn!(
                error = %err,
                item_type = %line.item.kind,
                item_id = %line.item.id,
                "failed to merge guest cart line"
            );
        }
    }
}
