//! Order persistence — backend-agnostic store for confirmed orders.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;

use super::model::Order;

/// Keyed store of confirmed orders. Storage technology is a backend detail;
/// the engine only depends on this contract.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert(&self, order: &Order) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Order>, StoreError>;

    /// Most recent orders first, up to `limit`.
    async fn recent(&self, limit: usize) -> Result<Vec<Order>, StoreError>;
}

/// In-memory order store.
#[derive(Default)]
pub struct MemoryOrderStore {
    orders: RwLock<Vec<Order>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        self.orders.write().await.push(order.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self
            .orders
            .read()
            .await
            .iter()
            .find(|o| o.id == id)
            .cloned())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Order>, StoreError> {
        let orders = self.orders.read().await;
        Ok(orders.iter().rev().take(limit).cloned().collect())
    }
}
