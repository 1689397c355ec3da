use flow_history::{HistoryEngine, HistoryEngineConfig, HistoryItem, KeyValueStore, MoveAction};
use flow_persistence::SqliteKeyValueStore;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// Fichero temporal único; se borra (con sus ficheros WAL) al soltarlo.
struct TempDb(PathBuf);

impl TempDb {
  fn new() -> Self {
    TempDb(std::env::temp_dir().join(format!("flow-history-{}.db", Uuid::new_v4())))
  }

  fn url(&self) -> String {
    self.0.to_string_lossy().to_string()
  }
}

impl Drop for TempDb {
  fn drop(&mut self) {
    for suffix in ["", "-wal", "-shm"] {
      let _ = std::fs::remove_file(format!("{}{}", self.url(), suffix));
    }
  }
}

#[tokio::test]
async fn set_get_remove_and_missing_keys() {
  let db = TempDb::new();
  let store = SqliteKeyValueStore::new(&db.url(), "undo-redo").expect("open");

  assert!(store.get("nada").await.unwrap().is_none());
  store.set("metadata", json!({"undo_top": 1})).await.unwrap();
  assert_eq!(store.get("metadata").await.unwrap(), Some(json!({"undo_top": 1})));

  // set sobre una clave existente la reemplaza
  store.set("metadata", json!({"undo_top": 2})).await.unwrap();
  assert_eq!(store.get("metadata").await.unwrap(), Some(json!({"undo_top": 2})));

  store.remove("metadata").await.unwrap();
  assert!(store.get("metadata").await.unwrap().is_none());
  // borrar una clave inexistente no falla
  store.remove("metadata").await.unwrap();
}

#[tokio::test]
async fn data_survives_reopening_the_file() {
  let db = TempDb::new();
  {
    let store = SqliteKeyValueStore::new(&db.url(), "undo-redo").unwrap();
    store.set("undo-x-1", json!({"snapshot": [1, 2, 3]})).await.unwrap();
  }
  let reopened = SqliteKeyValueStore::new(&db.url(), "undo-redo").unwrap();
  assert_eq!(reopened.get("undo-x-1").await.unwrap(), Some(json!({"snapshot": [1, 2, 3]})));
}

#[tokio::test]
async fn clear_only_touches_its_namespace() {
  let db = TempDb::new();
  let a = SqliteKeyValueStore::new(&db.url(), "editor-a").unwrap();
  let b = SqliteKeyValueStore::new(&db.url(), "editor-b").unwrap();
  assert_eq!(a.namespace(), "editor-a");

  a.set("metadata", json!(1)).await.unwrap();
  b.set("metadata", json!(2)).await.unwrap();
  a.clear().await.unwrap();

  assert!(a.get("metadata").await.unwrap().is_none());
  assert_eq!(b.get("metadata").await.unwrap(), Some(json!(2)));
}

#[tokio::test]
async fn history_survives_a_reload() {
  let db = TempDb::new();
  let flow_id = Uuid::new_v4();
  {
    let store = Arc::new(SqliteKeyValueStore::new(&db.url(), "undo-redo").unwrap());
    let engine = HistoryEngine::new(store, HistoryEngineConfig::default());
    engine.initialize().await.unwrap();
    for n in 1..=3 {
      engine.add_to_undo(HistoryItem::new(flow_id, json!({"v": n}), format!("step_{}", n))).await.unwrap();
    }
    let live = HistoryItem::new(flow_id, json!({"v": 3}), "");
    engine.bulk_move_action(&[MoveAction::UNDO], live).await.unwrap();
  }

  let store = Arc::new(SqliteKeyValueStore::new(&db.url(), "undo-redo").unwrap());
  let engine = HistoryEngine::new(store, HistoryEngineConfig::default());
  engine.initialize().await.unwrap();
  assert!(engine.status().can_undo);
  assert!(engine.status().can_redo);

  let live = HistoryItem::new(flow_id, json!({"v": 2}), "");
  let redone = engine.bulk_move_action(&[MoveAction::REDO], live).await.unwrap().expect("redo");
  assert_eq!(redone.snapshot, json!({"v": 3}));
  assert_eq!(redone.spotlight_step_name, "step_3");
}
