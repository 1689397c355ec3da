use chrono::{DateTime, Utc};
use flow_history::HistoryItem;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Mutex;
use uuid::Uuid;

/// Versión editable de un flow tal como la mantiene el editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowVersion {
    pub id: Uuid,
    pub flow_id: Uuid,
    pub display_name: String,
    /// Nodo raíz editable; es lo único que reemplaza el historial.
    pub trigger: JsonValue,
    pub valid: bool,
    /// Marca de la última actualización confirmada por el servidor. Se
    /// envía en cada guardado para detectar conflictos.
    pub updated: DateTime<Utc>,
}

impl FlowVersion {
    pub fn new(flow_id: Uuid, display_name: impl Into<String>, trigger: JsonValue) -> Self {
        FlowVersion { id: Uuid::new_v4(),
                      flow_id,
                      display_name: display_name.into(),
                      trigger,
                      valid: true,
                      updated: Utc::now() }
    }

    /// Punto de historial con el nodo raíz actual.
    pub fn history_item(&self, spotlight_step_name: impl Into<String>) -> HistoryItem {
        HistoryItem::new(self.flow_id, self.trigger.clone(), spotlight_step_name)
    }

    /// Resultado de partida de un lote de movimientos: el estado vivo sin
    /// paso a enfocar.
    pub fn fallback_item(&self) -> HistoryItem {
        self.history_item("")
    }
}

/// Contenedor en memoria del estado vivo del flow.
#[derive(Debug)]
pub struct FlowState {
    current: Mutex<FlowVersion>,
}

impl FlowState {
    pub fn new(initial: FlowVersion) -> Self {
        Self { current: Mutex::new(initial) }
    }

    pub fn get(&self) -> FlowVersion {
        self.current.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn set(&self, next: FlowVersion) {
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = next;
    }

    /// Modifica el estado en sitio y devuelve la versión resultante.
    pub fn update<F>(&self, f: F) -> FlowVersion
        where F: FnOnce(&mut FlowVersion)
    {
        let mut guard = self.current.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut *guard);
        guard.clone()
    }
}
