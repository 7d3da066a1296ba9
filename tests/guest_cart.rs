use axum_training_api::{
    cart_store::{CartRepository, GuestCart, GuestCartStore, ItemRef},
    error::AppError,
    models::ItemKind,
};
use uuid::Uuid;

fn item(kind: ItemKind) -> ItemRef {
    ItemRef {
        kind,
        id: Uuid::new_v4(),
    }
}

#[tokio::test]
async fn add_increments_existing_line() {
    let store = GuestCartStore::new();
    let cart = GuestCart::new(store, "tok".to_string());
    let course = item(ItemKind::Course);

    cart.add(course, 1).await.unwrap();
    cart.add(course, 2).await.unwrap();

    let lines = cart.lines().await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 3);
}

#[tokio::test]
async fn set_quantity_zero_removes_line() {
    let store = GuestCartStore::new();
    let cart = GuestCart::new(store, "tok".to_string());
    let product = item(ItemKind::Product);

    cart.add(product, 2).await.unwrap();
    cart.set_quantity(product, 0).await.unwrap();

    assert!(cart.lines().await.unwrap().is_empty());
}

#[tokio::test]
async fn set_quantity_on_missing_line_is_not_found() {
    let store = GuestCartStore::new();
    let cart = GuestCart::new(store, "tok".to_string());

    let err = cart
        .set_quantity(item(ItemKind::Product), 3)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn remove_missing_line_is_not_found() {
    let store = GuestCartStore::new();
    let cart = GuestCart::new(store, "tok".to_string());

    let err = cart.remove(item(ItemKind::Course)).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn carts_are_isolated_by_token() {
    let store = GuestCartStore::new();
    let a = GuestCart::new(store.clone(), "a".to_string());
    let b = GuestCart::new(store, "b".to_string());
    let product = item(ItemKind::Product);

    a.add(product, 1).await.unwrap();

    assert_eq!(a.lines().await.unwrap().len(), 1);
    assert!(b.lines().await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_lookups_do_not_allocate_buckets() {
    let store = GuestCartStore::new();
    for n in 0..32 {
        let cart = GuestCart::new(store.clone(), format!("unknown-{n}"));
        assert!(cart.remove(item(ItemKind::Product)).await.is_err());
        assert!(cart.set_quantity(item(ItemKind::Course), 2).await.is_err());
        cart.set_quantity(item(ItemKind::Course), 0).await.unwrap();
    }
    assert_eq!(store.cart_count().await, 0);
}

#[tokio::test]
async fn emptied_carts_release_their_buckets() {
    let store = GuestCartStore::new();
    let product = item(ItemKind::Product);

    let by_remove = GuestCart::new(store.clone(), "a".to_string());
    by_remove.add(product, 2).await.unwrap();
    let by_zero = GuestCart::new(store.clone(), "b".to_string());
    by_zero.add(product, 1).await.unwrap();
    assert_eq!(store.cart_count().await, 2);

    by_remove.remove(product).await.unwrap();
    by_zero.set_quantity(product, 0).await.unwrap();
    assert_eq!(store.cart_count().await, 0);
}

#[tokio::test]
async fn take_drains_the_cart_in_insertion_order() {
    let store = GuestCartStore::new();
    let cart = GuestCart::new(store.clone(), "tok".to_string());
    let first = item(ItemKind::Course);
    let second = item(ItemKind::Product);
    cart.add(first, 1).await.unwrap();
    cart.add(second, 4).await.unwrap();

    let taken = store.take("tok").await;
    assert_eq!(taken.len(), 2);
    assert_eq!(taken[0].item, first);
    assert_eq!(taken[1].item, second);
    assert!(cart.lines().await.unwrap().is_empty());
}
