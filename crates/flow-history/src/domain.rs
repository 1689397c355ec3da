// Archivo: domain.rs
// Propósito: tipos del historial undo/redo. `HistoryItem` es el registro
// guardado por slot, `Metadata` la tabla de cuatro punteros que describe
// las dos pilas y `MoveAction` la primitiva de movimiento entre pilas.
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use uuid::Uuid;

/// Clave única del registro de metadatos (compartido por todos los flows).
pub const METADATA_KEY: &str = "metadata";

/// Punto de historial: snapshot completo del nodo raíz del flow.
///
/// El `snapshot` es opaco para el motor: lo produce y lo consume el editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    /// Flow dueño del registro; forma parte de la clave de almacenamiento.
    pub flow_id: Uuid,
    pub snapshot: JsonValue,
    /// Paso que la UI debe enfocar al aplicar este registro. Puede ser vacío.
    #[serde(default)]
    pub spotlight_step_name: String,
}

impl HistoryItem {
    pub fn new(flow_id: Uuid, snapshot: JsonValue, spotlight_step_name: impl Into<String>) -> Self {
        Self { flow_id,
               snapshot,
               spotlight_step_name: spotlight_step_name.into() }
    }
}

/// Una de las dos pilas lógicas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackKind {
    Undo,
    Redo,
}

impl StackKind {
    /// Clave de almacenamiento del slot `pointer` de esta pila para `flow_id`,
    /// p.ej. `undo-<flowId>-3`.
    pub fn key(self, flow_id: &Uuid, pointer: u64) -> String {
        format!("{}-{}-{}", self, flow_id, pointer)
    }
}

impl fmt::Display for StackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StackKind::Undo => "undo",
            StackKind::Redo => "redo",
        };
        write!(f, "{}", s)
    }
}

/// Movimiento de un slot entre pilas. No tiene dirección propia: "deshacer"
/// es UNDO→REDO y "rehacer" es REDO→UNDO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveAction {
    pub from: StackKind,
    pub to: StackKind,
}

impl MoveAction {
    /// Paso de deshacer.
    pub const UNDO: MoveAction = MoveAction { from: StackKind::Undo,
                                              to: StackKind::Redo };
    /// Paso de rehacer.
    pub const REDO: MoveAction = MoveAction { from: StackKind::Redo,
                                              to: StackKind::Undo };
}

/// Tabla de punteros de las dos pilas.
///
/// Cada pila es el rango abierto-cerrado `(bottom, top]`; está vacía cuando
/// `top == bottom` y su tamaño lógico es `top - bottom`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub undo_top: u64,
    pub undo_bottom: u64,
    pub redo_top: u64,
    pub redo_bottom: u64,
}

impl Metadata {
    pub fn top(&self, stack: StackKind) -> u64 {
        match stack {
            StackKind::Undo => self.undo_top,
            StackKind::Redo => self.redo_top,
        }
    }

    pub fn bottom(&self, stack: StackKind) -> u64 {
        match stack {
            StackKind::Undo => self.undo_bottom,
            StackKind::Redo => self.redo_bottom,
        }
    }

    pub fn set_top(&mut self, stack: StackKind, value: u64) {
        match stack {
            StackKind::Undo => self.undo_top = value,
            StackKind::Redo => self.redo_top = value,
        }
    }

    /// Colapsa ambos punteros de la pila a cero.
    pub fn reset(&mut self, stack: StackKind) {
        match stack {
            StackKind::Undo => {
                self.undo_top = 0;
                self.undo_bottom = 0;
            }
            StackKind::Redo => {
                self.redo_top = 0;
                self.redo_bottom = 0;
            }
        }
    }

    pub fn size(&self, stack: StackKind) -> u64 {
        self.top(stack).saturating_sub(self.bottom(stack))
    }

    pub fn is_empty(&self, stack: StackKind) -> bool {
        self.top(stack) == self.bottom(stack)
    }

    /// Ambas pilas sin usar: los cuatro punteros en cero.
    pub fn is_pristine(&self) -> bool {
        *self == Metadata::default()
    }

    /// Flags de UI derivados del vacío de cada pila.
    pub fn status(&self) -> HistoryStatus {
        HistoryStatus { can_undo: !self.is_empty(StackKind::Undo),
                        can_redo: !self.is_empty(StackKind::Redo) }
    }
}

/// Booleanos reactivos `canUndo` / `canRedo` publicados al editor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStatus {
    pub can_undo: bool,
    pub can_redo: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_keys_are_qualified_by_stack_and_flow() {
        let flow_id = Uuid::nil();
        assert_eq!(StackKind::Undo.key(&flow_id, 3),
                   "undo-00000000-0000-0000-0000-000000000000-3");
        assert_eq!(StackKind::Redo.key(&flow_id, 1),
                   "redo-00000000-0000-0000-0000-000000000000-1");
    }

    #[test]
    fn metadata_ranges_are_open_closed() {
        let meta = Metadata { undo_top: 5,
                              undo_bottom: 2,
                              redo_top: 4,
                              redo_bottom: 4 };
        assert_eq!(meta.size(StackKind::Undo), 3);
        assert!(meta.is_empty(StackKind::Redo));
        assert!(!meta.is_pristine());
        assert_eq!(meta.status(), HistoryStatus { can_undo: true, can_redo: false });
    }

    #[test]
    fn reset_collapses_only_the_given_stack() {
        let mut meta = Metadata { undo_top: 5,
                                  undo_bottom: 2,
                                  redo_top: 4,
                                  redo_bottom: 1 };
        meta.reset(StackKind::Redo);
        assert_eq!(meta.redo_top, 0);
        assert_eq!(meta.redo_bottom, 0);
        assert_eq!(meta.undo_top, 5);
    }

    #[test]
    fn metadata_deserializes_from_stored_json() {
        let meta: Metadata =
            serde_json::from_value(serde_json::json!({"undo_top": 2, "undo_bottom": 0, "redo_top": 1, "redo_bottom": 0}))
                .unwrap();
        assert_eq!(meta.undo_top, 2);
        assert_eq!(meta.redo_top, 1);
    }
}
