// Archivo: stubs.rs
// Propósito: colaboradores en memoria para pruebas y demos. Registran las
// llamadas recibidas para poder inspeccionarlas después.
use crate::collaborators::{CommitOutcome, FlowCommitter, Notifier, Viewport};
use crate::errors::{EditorError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value as JsonValue;
use std::sync::Mutex;
use uuid::Uuid;

/// Llamada registrada por `InMemoryFlowCommitter`.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitCall {
    pub flow_id: Uuid,
    pub root: JsonValue,
    pub valid: bool,
    pub previous_updated: DateTime<Utc>,
}

/// Comportamiento configurable del guardado en memoria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitMode {
    /// Guarda y devuelve `previous_updated + 1s` como nueva marca.
    Accept,
    /// Responde `success == false` con el mensaje dado.
    Refuse(String),
    /// Devuelve `EditorError::Commit`.
    Fail(String),
}

#[derive(Debug)]
pub struct InMemoryFlowCommitter {
    mode: Mutex<CommitMode>,
    calls: Mutex<Vec<CommitCall>>,
}

impl InMemoryFlowCommitter {
    pub fn new() -> Self {
        Self { mode: Mutex::new(CommitMode::Accept),
               calls: Mutex::new(Vec::new()) }
    }

    pub fn set_mode(&self, mode: CommitMode) {
        *self.mode.lock().unwrap_or_else(|e| e.into_inner()) = mode;
    }

    pub fn calls(&self) -> Vec<CommitCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Última raíz guardada con éxito o no.
    pub fn last_root(&self) -> Option<JsonValue> {
        self.calls().last().map(|c| c.root.clone())
    }
}

impl Default for InMemoryFlowCommitter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FlowCommitter for InMemoryFlowCommitter {
    async fn commit(&self,
                    flow_id: Uuid,
                    root: JsonValue,
                    valid: bool,
                    previous_updated: DateTime<Utc>)
                    -> Result<CommitOutcome> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(CommitCall { flow_id,
                               root,
                               valid,
                               previous_updated });
        let mode = self.mode.lock().unwrap_or_else(|e| e.into_inner()).clone();
        match mode {
            CommitMode::Accept => Ok(CommitOutcome { success: true,
                                                     message: "guardado".into(),
                                                     updated: Some(previous_updated + Duration::seconds(1)) }),
            CommitMode::Refuse(message) => Ok(CommitOutcome { success: false,
                                                              message,
                                                              updated: None }),
            CommitMode::Fail(message) => Err(EditorError::Commit(message)),
        }
    }
}

/// Viewport que sólo registra los pasos en los que se centró.
#[derive(Debug, Default)]
pub struct RecordingViewport {
    centered: Mutex<Vec<String>>,
}

impl RecordingViewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn centered(&self) -> Vec<String> {
        self.centered.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Viewport for RecordingViewport {
    fn center_on(&self, step_name: &str) {
        self.centered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(step_name.to_string());
    }
}

/// Notificador que acumula los mensajes.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.to_string());
    }
}
