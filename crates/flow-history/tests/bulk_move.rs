use flow_history::{FlakyKeyValueStore, HistoryEngine, HistoryEngineConfig, HistoryError, HistoryItem,
                   InMemoryKeyValueStore, KeyValueStore, Metadata, MoveAction, StackKind, METADATA_KEY};
use serde_json::json;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

fn item(flow_id: Uuid, name: &str) -> HistoryItem {
  HistoryItem::new(flow_id, json!({"name": name}), format!("step_{}", name))
}

struct Fixture {
  mem: Arc<InMemoryKeyValueStore>,
  flaky: Arc<FlakyKeyValueStore>,
  engine: HistoryEngine,
  flow_id: Uuid,
}

async fn fixture_with(pushes: &[&str]) -> Fixture {
  let mem = Arc::new(InMemoryKeyValueStore::new());
  let flaky = Arc::new(FlakyKeyValueStore::new(mem.clone()));
  let engine = HistoryEngine::new(flaky.clone(), HistoryEngineConfig::default());
  engine.initialize().await.expect("init");
  let flow_id = Uuid::new_v4();
  for name in pushes {
    engine.add_to_undo(item(flow_id, name)).await.expect("push");
  }
  Fixture { mem, flaky, engine, flow_id }
}

#[tokio::test]
async fn pristine_metadata_short_circuits() {
  let fx = fixture_with(&[]).await;
  let before = fx.flaky.total_writes();
  let res = fx.engine.bulk_move_action(&[MoveAction::UNDO, MoveAction::REDO], item(fx.flow_id, "live")).await;
  assert_eq!(assert_ok!(res), None);
  assert_eq!(fx.flaky.total_writes(), before);
}

#[tokio::test]
async fn redo_on_empty_redo_stack_changes_nothing() {
  let fx = fixture_with(&["x", "y"]).await;
  let before = fx.flaky.total_writes();
  let keys_before = fx.mem.keys();

  let res = fx.engine
              .bulk_move_action(&[MoveAction::REDO, MoveAction::REDO, MoveAction::REDO], item(fx.flow_id, "y"))
              .await
              .unwrap();

  assert!(res.is_none());
  assert_eq!(fx.flaky.total_writes(), before);
  assert_eq!(fx.mem.keys(), keys_before);
  assert_eq!(fx.engine.metadata().await.unwrap().undo_top, 2);
}

#[tokio::test]
async fn batch_of_two_undos_writes_metadata_once() {
  let fx = fixture_with(&["a", "b", "c"]).await;
  assert_eq!(fx.engine.metadata().await.unwrap(),
             Metadata { undo_top: 3, undo_bottom: 0, redo_top: 0, redo_bottom: 0 });
  let writes_before = fx.flaky.writes_to(METADATA_KEY);

  let res = fx.engine.bulk_move_action(&[MoveAction::UNDO, MoveAction::UNDO], item(fx.flow_id, "c")).await.unwrap();

  assert_eq!(fx.flaky.writes_to(METADATA_KEY), writes_before + 1);
  let meta = fx.engine.metadata().await.unwrap();
  assert_eq!(meta.undo_top, 1);
  assert_eq!(meta.redo_top, 2);
  assert_eq!(res.expect("changed").snapshot, json!({"name": "a"}));
}

#[tokio::test]
async fn batch_equals_sequential_single_moves() {
  let batched = fixture_with(&["a", "b", "c", "d"]).await;
  let sequential = fixture_with(&["a", "b", "c", "d"]).await;
  let actions = [MoveAction::UNDO, MoveAction::UNDO, MoveAction::REDO, MoveAction::UNDO, MoveAction::UNDO];

  let batch_res = batched.engine.bulk_move_action(&actions, item(batched.flow_id, "d")).await.unwrap();

  let mut live = item(sequential.flow_id, "d");
  for action in actions {
    if let Some(next) = sequential.engine.bulk_move_action(&[action], live.clone()).await.unwrap() {
      live = next;
    }
  }

  assert_eq!(batch_res.expect("changed").snapshot, live.snapshot);
  let a = batched.engine.metadata().await.unwrap();
  let b = sequential.engine.metadata().await.unwrap();
  assert_eq!(a.size(StackKind::Undo), b.size(StackKind::Undo));
  assert_eq!(a.size(StackKind::Redo), b.size(StackKind::Redo));
  assert_eq!(live.snapshot, json!({"name": "a"}));
}

#[tokio::test]
async fn undo_presents_previous_state_and_redo_restores() {
  let fx = fixture_with(&["x", "y", "z"]).await;

  let undone = fx.engine.bulk_move_action(&[MoveAction::UNDO], item(fx.flow_id, "z")).await.unwrap().unwrap();
  assert_eq!(undone.snapshot, json!({"name": "y"}));
  assert_eq!(undone.spotlight_step_name, "step_y");
  assert!(fx.engine.status().can_redo);

  let redone = fx.engine.bulk_move_action(&[MoveAction::REDO], undone).await.unwrap().unwrap();
  assert_eq!(redone.snapshot, json!({"name": "z"}));
  assert!(fx.engine.status().can_undo);
  assert!(!fx.engine.status().can_redo);
}

#[tokio::test]
async fn round_trip_restores_last_pushed_snapshot() {
  let names = ["n1", "n2", "n3", "n4", "n5"];
  let fx = fixture_with(&names).await;
  let mut live = item(fx.flow_id, "n5");

  for _ in 0..names.len() {
    if let Some(next) = fx.engine.bulk_move_action(&[MoveAction::UNDO], live.clone()).await.unwrap() {
      live = next;
    }
  }
  assert_eq!(live.snapshot, json!({"name": "n1"}));
  for _ in 0..names.len() {
    if let Some(next) = fx.engine.bulk_move_action(&[MoveAction::REDO], live.clone()).await.unwrap() {
      live = next;
    }
  }
  assert_eq!(live.snapshot, json!({"name": "n5"}));
}

#[tokio::test]
async fn drained_stacks_are_normalized_to_zero() {
  let fx = fixture_with(&["a", "b"]).await;

  fx.engine.bulk_move_action(&[MoveAction::UNDO, MoveAction::UNDO], item(fx.flow_id, "b")).await.unwrap();
  assert_eq!(fx.engine.metadata().await.unwrap(),
             Metadata { undo_top: 0, undo_bottom: 0, redo_top: 2, redo_bottom: 0 });
  assert!(!fx.engine.status().can_undo);

  let res = fx.engine.bulk_move_action(&[MoveAction::REDO, MoveAction::REDO], item(fx.flow_id, "a")).await.unwrap();
  assert_eq!(res.unwrap().snapshot, json!({"name": "b"}));
  assert_eq!(fx.engine.metadata().await.unwrap(),
             Metadata { undo_top: 2, undo_bottom: 0, redo_top: 0, redo_bottom: 0 });
  assert!(fx.mem.get(&StackKind::Undo.key(&fx.flow_id, 2)).await.unwrap().is_some());
}

#[tokio::test]
async fn evicted_base_keeps_pointers_moving_forward() {
  let mem = Arc::new(InMemoryKeyValueStore::new());
  let engine = HistoryEngine::new(mem.clone(), HistoryEngineConfig { max_size: 3 });
  engine.initialize().await.unwrap();
  let flow_id = Uuid::new_v4();
  for name in ["a", "b", "c", "d", "e"] {
    engine.add_to_undo(item(flow_id, name)).await.unwrap();
  }
  // undo = (2, 5] con c, d, e
  let res = engine.bulk_move_action(&[MoveAction::UNDO], item(flow_id, "e")).await.unwrap().unwrap();
  assert_eq!(res.snapshot, json!({"name": "d"}));
  let meta = engine.metadata().await.unwrap();
  assert_eq!((meta.undo_bottom, meta.undo_top), (2, 4));
  assert!(mem.get(&StackKind::Redo.key(&flow_id, 1)).await.unwrap().is_some());

  // vaciar UNDO con bottom > 0 colapsa sus punteros a cero
  let res = engine.bulk_move_action(&[MoveAction::UNDO, MoveAction::UNDO], res).await.unwrap().unwrap();
  assert_eq!(res.snapshot, json!({"name": "c"}));
  assert_eq!(engine.metadata().await.unwrap(),
             Metadata { undo_top: 0, undo_bottom: 0, redo_top: 3, redo_bottom: 0 });
}

#[tokio::test]
async fn missing_record_is_a_benign_no_op() {
  let fx = fixture_with(&["a", "b"]).await;
  fx.mem.remove(&StackKind::Undo.key(&fx.flow_id, 2)).await.unwrap();
  let before = fx.flaky.total_writes();

  let res = fx.engine.bulk_move_action(&[MoveAction::UNDO], item(fx.flow_id, "b")).await.unwrap();

  assert!(res.is_none());
  assert_eq!(fx.flaky.total_writes(), before);
  assert_eq!(fx.engine.metadata().await.unwrap().undo_top, 2);
}

#[tokio::test]
async fn last_undo_moves_slot_without_changing_live_state() {
  let fx = fixture_with(&["only"]).await;

  let res = fx.engine.bulk_move_action(&[MoveAction::UNDO], item(fx.flow_id, "only")).await.unwrap();

  assert!(res.is_none());
  assert!(!fx.engine.status().can_undo);
  assert!(fx.engine.status().can_redo);
}

#[tokio::test]
async fn storage_failure_propagates() {
  let fx = fixture_with(&["a", "b"]).await;
  fx.flaky.fail_writes(true);

  let res = fx.engine.bulk_move_action(&[MoveAction::UNDO], item(fx.flow_id, "b")).await;

  match assert_err!(res) {
    HistoryError::Storage(_) => {}
    other => panic!("error inesperado: {}", other),
  }
}
