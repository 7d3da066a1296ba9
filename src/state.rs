use crate::cart_store::GuestCartStore;
use crate::db::{DbPool, OrmConn};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub guest_carts: GuestCartStore,
}

impl AppState {
    pub fn new(pool: DbPool, orm: OrmConn) -> Self {
        Self {
            pool,
            orm,
            guest_carts: GuestCartStore::default(),
        }
    }
}
