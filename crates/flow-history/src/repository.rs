// Archivo: repository.rs
// Propósito: definir el contrato `KeyValueStore` que debe implementar el
// almacén persistente (SQLite, memoria, etc.) y los helpers tipados que el
// motor usa encima de él.
use crate::errors::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Almacén clave-valor asíncrono compartido por todos los flows.
///
/// No se asumen garantías de orden ni transacciones entre claves distintas.
/// Los valores viajan como JSON para que el trait sea usable como objeto
/// (`Arc<dyn KeyValueStore>`).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Lee el valor de `key`, `None` si no existe.
    async fn get(&self, key: &str) -> Result<Option<JsonValue>>;

    /// Escribe (o reemplaza) el valor de `key`.
    async fn set(&self, key: &str, value: JsonValue) -> Result<()>;

    /// Borra `key`. Borrar una clave inexistente no es un error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Vacía el almacén completo (todos los flows).
    async fn clear(&self) -> Result<()>;
}

/// Lee `key` y lo deserializa en `T`.
pub async fn get_typed<T>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>>
    where T: DeserializeOwned
{
    match store.get(key).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Serializa `value` y lo guarda en `key`.
pub async fn set_typed<T>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()>
    where T: Serialize + Sync
{
    let json = serde_json::to_value(value)?;
    store.set(key, json).await
}
