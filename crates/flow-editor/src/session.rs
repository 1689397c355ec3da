// Archivo: session.rs
// Propósito: `EditorSession`, la fachada que usa el editor de flows para
// registrar puntos de historial y pedir deshacer/rehacer.
use crate::bridge::ApplicationBridge;
use crate::collaborators::EditorCollaborators;
use crate::config::EditorConfig;
use crate::errors::Result;
use crate::queue::{ActionQueue, BatchHandler};
use crate::state::{FlowState, FlowVersion};
use async_trait::async_trait;
use flow_history::{HistoryEngine, HistoryItem, HistoryStatus, KeyValueStore, Metadata, MoveAction};
use log::{debug, info};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tokio::sync::watch;

/// Consumidor de la cola: mueve slots en el motor y aplica el resultado.
struct HistoryProcessor {
    engine: Arc<HistoryEngine>,
    state: Arc<FlowState>,
    bridge: ApplicationBridge,
}

#[async_trait]
impl BatchHandler for HistoryProcessor {
    async fn handle(&self, batch: Vec<MoveAction>) -> Result<()> {
        let fallback = self.state.get().fallback_item();
        match self.engine.bulk_move_action(&batch, fallback).await? {
            Some(item) => self.bridge.apply(item).await,
            None => {
                debug!("lote sin cambios en el estado vivo");
                Ok(())
            }
        }
    }
}

/// Sesión de edición de un flow con historial undo/redo.
///
/// `undo` y `redo` sólo encolan: el efecto llega de forma asíncrona al
/// estado vivo, al guardado remoto y al viewport. `settled` permite esperar
/// a que la cola quede vacía.
pub struct EditorSession {
    engine: Arc<HistoryEngine>,
    state: Arc<FlowState>,
    queue: ActionQueue,
}

impl EditorSession {
    pub fn new(config: EditorConfig,
               store: Arc<dyn KeyValueStore>,
               initial: FlowVersion,
               collaborators: EditorCollaborators)
               -> Self {
        let engine = Arc::new(HistoryEngine::new(store, config.history));
        let state = Arc::new(FlowState::new(initial));
        let processor = HistoryProcessor { engine: engine.clone(),
                                           state: state.clone(),
                                           bridge: ApplicationBridge::new(state.clone(), &collaborators) };
        let queue = ActionQueue::new(Arc::new(processor), collaborators.notifier.clone(), config.debounce);
        Self { engine, state, queue }
    }

    /// Prepara los metadatos del historial. Debe llamarse antes del primer
    /// uso; repetirlo es inocuo.
    pub async fn initialize(&self) -> Result<()> {
        self.engine.initialize().await?;
        Ok(())
    }

    /// Registra un punto de deshacer ya construido.
    pub async fn add_to_undo_history(&self, item: HistoryItem) -> Result<()> {
        self.engine.add_to_undo(item).await?;
        Ok(())
    }

    /// Reemplaza el nodo raíz del estado vivo y lo registra como punto de
    /// deshacer enfocando `spotlight_step_name`.
    pub async fn record_edit(&self, trigger: JsonValue, spotlight_step_name: &str) -> Result<()> {
        let version = self.state.update(|v| v.trigger = trigger);
        self.add_to_undo_history(version.history_item(spotlight_step_name)).await
    }

    pub fn undo(&self) {
        self.queue.enqueue(MoveAction::UNDO);
    }

    pub fn redo(&self) {
        self.queue.enqueue(MoveAction::REDO);
    }

    /// Descarta las acciones pendientes y borra todo el historial.
    ///
    /// Un lote ya en vuelo termina antes del borrado para que no vuelva a
    /// escribir sus punteros sobre el almacén vacío.
    pub async fn clear_undo_redo_history(&self) -> Result<()> {
        self.queue.clear();
        self.queue.settled().await;
        self.engine.clear().await?;
        info!("historial del flow {} borrado", self.state.get().flow_id);
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.engine.status().can_undo
    }

    pub fn can_redo(&self) -> bool {
        self.engine.status().can_redo
    }

    pub fn subscribe_status(&self) -> watch::Receiver<HistoryStatus> {
        self.engine.subscribe()
    }

    pub fn current_state(&self) -> FlowVersion {
        self.state.get()
    }

    pub async fn metadata(&self) -> Result<Metadata> {
        Ok(self.engine.metadata().await?)
    }

    /// Espera a que no quede ningún lote en vuelo ni acciones pendientes.
    pub async fn settled(&self) {
        self.queue.settled().await;
    }

    /// Cierra la sesión: cancela el debounce y descarta acciones futuras.
    pub fn close(&self) {
        self.queue.close();
    }
}
