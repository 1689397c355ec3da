//! Almacén clave-valor durable para el historial undo/redo.
//! Este crate expone el módulo `schema` y reexporta `SqliteKeyValueStore`,
//! que implementa `flow_history::KeyValueStore` sobre SQLite. La
//! implementación detallada está en `kv_persistence.rs`.

mod kv_persistence;
pub mod schema;

pub use kv_persistence::{new_from_env, SqliteKeyValueStore, DEFAULT_DATABASE_URL, DEFAULT_STORE_NAME};
