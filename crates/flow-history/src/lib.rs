//! Crate `flow-history`: motor de historial undo/redo para flujos
//!
//! Este crate define los tipos del historial (`HistoryItem`, `Metadata`,
//! `MoveAction`), el contrato del almacén `KeyValueStore`, una
//! implementación en memoria útil para pruebas (`InMemoryKeyValueStore`) y
//! el motor `HistoryEngine`.
//!
//! Diseño resumido:
//! - Dos pilas lógicas (UNDO, REDO) sobre un único espacio de claves. Cada
//!   pila es un rango `(bottom, top]` de punteros guardado en un único
//!   registro de metadatos.
//! - Cada slot guarda un snapshot completo bajo `<pila>-<flowId>-<puntero>`.
//! - UNDO tiene capacidad fija (`MAX_SIZE`); al superarla se desaloja el
//!   slot más antiguo. Un push nuevo vacía REDO.
//! - Los lotes de movimientos se aplican en orden con una única escritura
//!   final de metadatos.
//!
//! Ejemplo rápido:
//! ```rust
//! use flow_history::{HistoryEngine, HistoryEngineConfig, InMemoryKeyValueStore};
//! use std::sync::Arc;
//! let store = Arc::new(InMemoryKeyValueStore::new());
//! let engine = HistoryEngine::new(store, HistoryEngineConfig::default());
//! assert!(!engine.status().can_undo);
//! ```
pub mod domain;
pub mod engine;
pub mod errors;
pub mod items;
pub mod metadata;
pub mod repository;
pub mod stubs;

pub use domain::*;
pub use engine::*;
pub use errors::*;
pub use items::*;
pub use metadata::*;
pub use repository::*;
pub use stubs::*;
