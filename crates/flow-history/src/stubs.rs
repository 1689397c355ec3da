// Archivo: stubs.rs
// Propósito: implementaciones en memoria para pruebas y wiring rápido.
//
// `InMemoryKeyValueStore` no es durable; `FlakyKeyValueStore` envuelve
// otro almacén y permite simular fallos y contar escrituras por clave.
use crate::errors::{HistoryError, Result};
use crate::repository::KeyValueStore;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Almacén clave-valor en memoria.
///
/// Usa un `BTreeMap` para que `keys()` devuelva un orden estable en las
/// pruebas.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    entries: Mutex<BTreeMap<String, JsonValue>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claves presentes, ordenadas.
    pub fn keys(&self) -> Vec<String> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).keys().cloned().collect()
    }

    /// Claves que empiezan por `prefix` (p.ej. `redo-<flowId>-`).
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.keys().into_iter().filter(|k| k.starts_with(prefix)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<JsonValue>> {
        Ok(self.entries.lock().unwrap_or_else(|e| e.into_inner()).get(key).cloned())
    }

    async fn set(&self, key: &str, value: JsonValue) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clear();
        Ok(())
    }
}

/// Envoltorio para pruebas: cuenta las escrituras por clave y, con
/// `fail_writes(true)`, rechaza `set`/`remove`/`clear` con
/// `HistoryError::Storage`.
pub struct FlakyKeyValueStore {
    inner: Arc<dyn KeyValueStore>,
    failing: AtomicBool,
    writes: Mutex<HashMap<String, usize>>,
}

impl FlakyKeyValueStore {
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        Self { inner,
               failing: AtomicBool::new(false),
               writes: Mutex::new(HashMap::new()) }
    }

    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Número de `set` exitosos sobre `key`.
    pub fn writes_to(&self, key: &str) -> usize {
        *self.writes.lock().unwrap_or_else(|e| e.into_inner()).get(key).unwrap_or(&0)
    }

    /// Número total de mutaciones exitosas (`set` + `remove` + `clear`).
    pub fn total_writes(&self) -> usize {
        self.writes.lock().unwrap_or_else(|e| e.into_inner()).values().sum()
    }

    fn check(&self, op: &str, key: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(HistoryError::Storage(format!("{} rechazado para {}", op, key)));
        }
        Ok(())
    }

    fn record(&self, key: &str) {
        *self.writes
             .lock()
             .unwrap_or_else(|e| e.into_inner())
             .entry(key.to_string())
             .or_insert(0) += 1;
    }
}

#[async_trait]
impl KeyValueStore for FlakyKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<JsonValue>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: JsonValue) -> Result<()> {
        self.check("set", key)?;
        self.inner.set(key, value).await?;
        self.record(key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.check("remove", key)?;
        self.inner.remove(key).await?;
        self.record(&format!("remove:{}", key));
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.check("clear", "*")?;
        self.inner.clear().await?;
        self.record("clear");
        Ok(())
    }
}
