// Contratos de los colaboradores externos del historial: guardado remoto,
// viewport del lienzo y avisos al usuario.
use crate::errors::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use uuid::Uuid;

/// Respuesta del guardado remoto.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitOutcome {
    pub success: bool,
    pub message: String,
    /// Nueva marca de actualización cuando `success` es true.
    pub updated: Option<DateTime<Utc>>,
}

/// Persistencia remota del flow.
///
/// Un `Err` significa que la llamada falló (red, servidor); un
/// `CommitOutcome` con `success == false` significa que el servidor
/// respondió pero no guardó.
#[async_trait]
pub trait FlowCommitter: Send + Sync {
    async fn commit(&self,
                    flow_id: Uuid,
                    root: JsonValue,
                    valid: bool,
                    previous_updated: DateTime<Utc>)
                    -> Result<CommitOutcome>;
}

/// Viewport del lienzo. Centrar en un paso que no está dibujado no hace nada.
pub trait Viewport: Send + Sync {
    fn center_on(&self, step_name: &str);
}

/// Sumidero de avisos no fatales para el usuario.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Colaboradores que necesita una `EditorSession`.
#[derive(Clone)]
pub struct EditorCollaborators {
    pub committer: Arc<dyn FlowCommitter>,
    pub viewport: Arc<dyn Viewport>,
    pub notifier: Arc<dyn Notifier>,
}
