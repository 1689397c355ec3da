// Archivo: bridge.rs
// Propósito: aplicar el resultado de un lote de deshacer/rehacer al editor:
// estado vivo, guardado remoto y centrado del viewport.
use crate::collaborators::{EditorCollaborators, FlowCommitter, Notifier, Viewport};
use crate::errors::Result;
use crate::state::FlowState;
use flow_history::HistoryItem;
use log::{debug, warn};
use std::sync::Arc;

/// Aviso cuando el servidor no guarda el estado restaurado.
pub const UNSAVED_CHANGES_MESSAGE: &str = "Cambios sin guardar: no se pudo guardar el flow";

pub struct ApplicationBridge {
    state: Arc<FlowState>,
    committer: Arc<dyn FlowCommitter>,
    viewport: Arc<dyn Viewport>,
    notifier: Arc<dyn Notifier>,
}

impl ApplicationBridge {
    pub fn new(state: Arc<FlowState>, collaborators: &EditorCollaborators) -> Self {
        Self { state,
               committer: collaborators.committer.clone(),
               viewport: collaborators.viewport.clone(),
               notifier: collaborators.notifier.clone() }
    }

    /// Reemplaza el nodo raíz del estado vivo por `item.snapshot`, lo guarda
    /// en remoto y centra el viewport en `item.spotlight_step_name`.
    ///
    /// El estado local se aplica antes de guardar y no se revierte si el
    /// servidor no guarda: sólo se avisa al usuario. Un `Err` del
    /// colaborador se propaga sin centrar el viewport.
    pub async fn apply(&self, item: HistoryItem) -> Result<()> {
        let previous_updated = self.state.get().updated;
        let next = self.state.update(|version| version.trigger = item.snapshot.clone());

        let outcome = self.committer
                          .commit(next.flow_id, next.trigger.clone(), next.valid, previous_updated)
                          .await?;
        if outcome.success {
            if let Some(updated) = outcome.updated {
                self.state.update(|version| version.updated = updated);
            }
            debug!("flow {} guardado tras mover historial", next.flow_id);
        } else {
            warn!("guardado rechazado para flow {}: {}", next.flow_id, outcome.message);
            self.notifier.notify(UNSAVED_CHANGES_MESSAGE);
        }

        self.viewport.center_on(&item.spotlight_step_name);
        Ok(())
    }
}
