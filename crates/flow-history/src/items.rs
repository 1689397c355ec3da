// Archivo: items.rs
// Propósito: almacén de `HistoryItem`, un registro por slot de pila bajo la
// clave `<pila>-<flowId>-<puntero>`.
use crate::domain::{HistoryItem, StackKind};
use crate::errors::Result;
use crate::repository::{get_typed, set_typed, KeyValueStore};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct HistoryItemStore {
    store: Arc<dyn KeyValueStore>,
}

impl HistoryItemStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, stack: StackKind, flow_id: &Uuid, pointer: u64) -> Result<Option<HistoryItem>> {
        get_typed(self.store.as_ref(), &stack.key(flow_id, pointer)).await
    }

    pub async fn put(&self, stack: StackKind, pointer: u64, item: &HistoryItem) -> Result<()> {
        set_typed(self.store.as_ref(), &stack.key(&item.flow_id, pointer), item).await
    }

    pub async fn remove(&self, stack: StackKind, flow_id: &Uuid, pointer: u64) -> Result<()> {
        self.store.remove(&stack.key(flow_id, pointer)).await
    }
}
