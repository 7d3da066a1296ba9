use chrono::Utc;
use futures::future::join_all;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    cart_store::{CartRepository, ServerCart},
    catalog,
    dto::orders::{
        AdminOrderList, AdminOrderSummary, CheckoutRequest, OrderList, OrderReceipt, OrderSummary,
        OrderWithLines, UpdateOrderStatusRequest,
    },
    entity::{
        order_lines::{
            ActiveModel as OrderLineActive, Column as OrderLineCol, Entity as OrderLines,
            Model as OrderLineModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{ItemKind, Order, OrderLine},
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::{
        cart_service::{self, PricedLine},
        enrollment_service,
    },
    state::AppState,
};

const VALID_STATUSES: [&str; 5] = ["pending", "processing", "shipped", "delivered", "cancelled"];

/// Converts the caller's cart into a persisted order.
///
/// The order row and its lines are written in one transaction and committed
/// before anything else happens: they are the customer's receipt. Enrollment
/// and stock bookkeeping then run as independent best-effort steps, and the
/// cart is cleared last. A failed side effect is logged, never propagated;
/// reconciliation of such gaps is an operator concern.
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderReceipt>> {
    let cart = ServerCart::new(state.pool.clone(), user.user_id);

    // Prices are re-read here, not reused from an earlier cart render.
    let lines = cart_service::priced_lines(&state.pool, &cart).await?;
    if lines.is_empty() {
        return Err(AppError::EmptyCart);
    }

    let total_amount: i64 = lines
        .iter()
        .map(|line| line.price * i64::from(line.quantity))
        .sum();
    let order_id = Uuid::new_v4();

    let txn = state.orm.begin().await?;

    OrderActive {
        id: Set(order_id),
        user_id: Set(user.user_id),
        total_amount: Set(total_amount),
        status: Set("pending".into()),
        payment_method: Set(payload.payment_method.clone()),
        shipping_address: Set(payload.shipping_address.clone()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    for line in &lines {
        OrderLineActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            item_id: Set(line.item.id),
            item_type: Set(line.item.kind.as_str().to_string()),
            item_name: Set(line.name.clone()),
            price: Set(line.price),
            quantity: Set(line.quantity),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    apply_side_effects(state, user.user_id, order_id, &lines).await;

    // Clearing the cart is part of the same best-effort tail: the order
    // stands even if this fails.
    if let Err(err) = cart.clear().await {
        tracing::error!(error = %err, order_id = %order_id, "failed to clear cart after order");
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_place",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order_id, "total_amount": total_amount })),
    )
    .await;

    Ok(ApiResponse::success(
        "Order placed successfully",
        OrderReceipt {
            order_id,
            total_amount,
        },
        Some(Meta::empty()),
    ))
}

/// Post-commit bookkeeping for an order's lines.
///
/// Course lines create enrollments (idempotently) and product lines
/// decrement stock. Steps of a kind run concurrently and are joined; no
/// step's failure aborts the others or the order itself. Stock is
/// decremented without a floor check, so a concurrent sale can drive it
/// negative; that outcome is logged rather than prevented.
async fn apply_side_effects(
    state: &AppState,
    user_id: Uuid,
    order_id: Uuid,
    lines: &[PricedLine],
) {
    let enrollments = lines
        .iter()
        .filter(|line| line.item.kind == ItemKind::Course)
        .map(|line| async move {
            match enrollment_service::ensure_enrolled(&state.pool, &state.orm, user_id, line.item.id)
                .await
            {
                Ok(true) => {
                    tracing::debug!(order_id = %order_id, course_id = %line.item.id, "enrollment created from order");
                }
                Ok(false) => {
                    tracing::debug!(order_id = %order_id, course_id = %line.item.id, "already enrolled, left unchanged");
                }
                Err(err) => {
                    tracing::error!(error = %err, order_id = %order_id, course_id = %line.item.id, "enrollment side effect failed");
                }
            }
        });
    join_all(enrollments).await;

    let stock_updates = lines
        .iter()
        .filter(|line| line.item.kind == ItemKind::Product)
        .map(|line| async move {
            match catalog::decrement_stock(&state.pool, line.item.id, line.quantity).await {
                Ok(Some(level)) if level.oversold() => {
                    tracing::warn!(
                        order_id = %order_id,
                        product_id = %line.item.id,
                        remaining = level.remaining,
                        "stock went negative"
                    );
                }
                Ok(Some(_)) => {}
                Ok(None) => {
                    tracing::warn!(order_id = %order_id, product_id = %line.item.id, "stock decrement hit a missing product");
                }
                Err(err) => {
                    tracing::error!(error = %err, order_id = %order_id, product_id = %line.item.id, "stock side effect failed");
                }
            }
        });
    join_all(stock_updates).await;
}

pub async fn my_orders(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderList>> {
    let orders = sqlx::query_as::<_, OrderSummary>(
        r#"
        SELECT o.id, o.user_id, o.total_amount, o.status, o.payment_method,
               o.shipping_address, o.created_at, o.updated_at,
               STRING_AGG(ol.item_name, ', ') AS items_summary
        FROM orders o
        LEFT JOIN order_lines ol ON ol.order_id = o.id
        WHERE o.user_id = $1
        GROUP BY o.id
        ORDER BY o.created_at DESC
        "#,
    )
    .bind(user.user_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success("OK", OrderList { orders }, None))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithLines>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(order) => order,
        None => return Err(AppError::NotFound("Order")),
    };

    let items = OrderLines::find()
        .filter(OrderLineCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_line_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "OK",
        OrderWithLines {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<AdminOrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.normalize();
    let status = query.status.as_deref().filter(|s| !s.is_empty());

    let orders = sqlx::query_as::<_, AdminOrderSummary>(
        r#"
        SELECT o.id, o.user_id, u.name AS user_name, u.email AS user_email,
               o.total_amount, o.status, o.payment_method, o.shipping_address,
               o.created_at, o.updated_at,
               STRING_AGG(ol.item_name, ', ') AS items_summary
        FROM orders o
        JOIN users u ON u.id = o.user_id
        LEFT JOIN order_lines ol ON ol.order_id = o.id
        WHERE $1::text IS NULL OR o.status = $1
        GROUP BY o.id, u.name, u.email
        ORDER BY o.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(status)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM orders WHERE $1::text IS NULL OR status = $1")
            .bind(status)
            .fetch_one(&state.pool)
            .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "OK",
        AdminOrderList { orders },
        Some(meta),
    ))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    if !VALID_STATUSES.contains(&payload.status.as_str()) {
        return Err(AppError::Validation("Invalid status".to_string()));
    }

    let existing = Orders::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(order) => order,
        None => return Err(AppError::NotFound("Order")),
    };

    let mut active: OrderActive = existing.into();
    active.status = Set(payload.status);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "status": order.status })),
    )
    .await;

    Ok(ApiResponse::success(
        "Status updated",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        total_amount: model.total_amount,
        status: model.status,
        payment_method: model.payment_method,
        shipping_address: model.shipping_address,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn order_line_from_entity(model: OrderLineModel) -> AppResult<OrderLine> {
    Ok(OrderLine {
        id: model.id,
        order_id: model.order_id,
        item_id: model.item_id,
        item_kind: ItemKind::parse(&model.item_type)?,
        item_name: model.item_name,
        price: model.price,
        quantity: model.quantity,
        created_at: model.created_at.with_timezone(&Utc),
    })
}
