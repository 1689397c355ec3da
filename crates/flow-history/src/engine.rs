// Archivo: engine.rs
// Propósito: implementar el `HistoryEngine`, el motor de pilas undo/redo.
//
// Dos pilas lógicas (UNDO y REDO) comparten el espacio de claves del
// `KeyValueStore`. El motor empuja puntos de historial con desalojo por
// capacidad, invalida REDO en cada push nuevo y aplica lotes de movimientos
// con una sola escritura final de metadatos.
use crate::domain::{HistoryItem, HistoryStatus, Metadata, MoveAction, StackKind};
use crate::errors::Result;
use crate::items::HistoryItemStore;
use crate::metadata::MetadataTable;
use crate::repository::KeyValueStore;
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

/// Capacidad por defecto de la pila UNDO.
pub const MAX_SIZE: u64 = 10;

/// Configuración del motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryEngineConfig {
    /// Tamaño lógico máximo de UNDO. Al superarlo se desaloja el slot más
    /// antiguo.
    pub max_size: u64,
}

impl Default for HistoryEngineConfig {
    fn default() -> Self {
        HistoryEngineConfig { max_size: MAX_SIZE }
    }
}

/// Motor de historial undo/redo sobre un `KeyValueStore`.
///
/// Responsabilidades principales:
/// - Mantener la tabla de punteros (`MetadataTable`)
/// - Guardar, reubicar y borrar `HistoryItem` (`HistoryItemStore`)
/// - Publicar `HistoryStatus` (canUndo/canRedo) por un canal `watch`
///
/// Nota sobre concurrencia: `bulk_move_action` no se serializa aquí; quien
/// lo invoca (la cola de acciones del editor) garantiza un único lote en
/// vuelo. Las lecturas y escrituras de metadatos son read-modify-write sin
/// transacción.
pub struct HistoryEngine {
    config: HistoryEngineConfig,
    store: Arc<dyn KeyValueStore>,
    metadata: MetadataTable,
    items: HistoryItemStore,
    status: watch::Sender<HistoryStatus>,
}

impl HistoryEngine {
    /// Crea el motor sobre `store`. Una capacidad de 0 se eleva a 1.
    pub fn new(store: Arc<dyn KeyValueStore>, config: HistoryEngineConfig) -> Self {
        let config = if config.max_size == 0 {
            warn!("max_size 0 no es válido, se usa 1");
            HistoryEngineConfig { max_size: 1 }
        } else {
            config
        };
        let (status, _) = watch::channel(HistoryStatus::default());
        Self { config,
               metadata: MetadataTable::new(store.clone()),
               items: HistoryItemStore::new(store.clone()),
               store,
               status }
    }

    pub fn config(&self) -> HistoryEngineConfig {
        self.config
    }

    /// Último estado publicado de canUndo/canRedo.
    pub fn status(&self) -> HistoryStatus {
        *self.status.borrow()
    }

    /// Suscripción a los cambios de canUndo/canRedo.
    pub fn subscribe(&self) -> watch::Receiver<HistoryStatus> {
        self.status.subscribe()
    }

    /// Registro de punteros actual (o el valor por defecto).
    pub async fn metadata(&self) -> Result<Metadata> {
        self.metadata.load().await
    }

    /// Crea el registro de metadatos si no existe y publica los flags que
    /// corresponden a lo que ya hay guardado (p.ej. tras una recarga).
    pub async fn initialize(&self) -> Result<()> {
        self.metadata.initialize().await?;
        let meta = self.metadata.load().await?;
        self.status.send_replace(meta.status());
        info!("historial inicializado: {:?}", meta);
        Ok(())
    }

    /// Registra un nuevo punto de deshacer e invalida todo REDO.
    ///
    /// Cualquier fallo de almacenamiento se propaga sin rollback parcial;
    /// reintentar el push es inocuo.
    pub async fn add_to_undo(&self, item: HistoryItem) -> Result<()> {
        // canRedo se apaga antes de tocar el almacén para que la UI no
        // muestre el botón de rehacer durante la escritura.
        self.status.send_modify(|s| s.can_redo = false);

        let flow_id = item.flow_id;
        let mut meta = self.metadata.load().await?;

        while meta.size(StackKind::Undo) >= self.config.max_size {
            meta.undo_bottom += 1;
            debug!("desalojando undo {} del flow {}", meta.undo_bottom, flow_id);
            self.items.remove(StackKind::Undo, &flow_id, meta.undo_bottom).await?;
        }

        meta.undo_top += 1;
        self.items.put(StackKind::Undo, meta.undo_top, &item).await?;
        self.metadata.save(&meta).await?;
        self.status.send_modify(|s| s.can_undo = true);

        self.clear_redo(&flow_id, &mut meta).await?;
        self.metadata.save(&meta).await?;
        debug!("push undo {} del flow {}", meta.undo_top, flow_id);
        Ok(())
    }

    /// Aplica en orden una secuencia de movimientos de un slot y devuelve el
    /// `HistoryItem` que pasa a representar el estado vivo, o `None` si el
    /// lote no cambia lo que el editor muestra.
    ///
    /// La cima de UNDO es siempre el estado vivo: tras deshacer se muestra la
    /// nueva cima de UNDO y tras rehacer el registro que vuelve a ella. Si
    /// UNDO queda vacía el estado mostrado no cambia.
    ///
    /// `fallback` es el estado vivo del editor: aporta el `flow_id` de las
    /// claves y es el resultado de partida del lote. Los metadatos se
    /// escriben una sola vez al final del lote (más una normalización si
    /// alguna pila quedó vacía).
    pub async fn bulk_move_action(&self, actions: &[MoveAction], fallback: HistoryItem) -> Result<Option<HistoryItem>> {
        let mut meta = self.metadata.load().await?;
        if meta.is_pristine() {
            debug!("historial sin usar, lote de {} acciones ignorado", actions.len());
            self.status.send_replace(meta.status());
            return Ok(None);
        }

        let flow_id = fallback.flow_id;
        let mut last = fallback;
        let mut changed = false;
        let mut moved = 0usize;
        for action in actions {
            let Some(item) = self.move_one(*action, &mut meta, &flow_id).await? else {
                continue;
            };
            moved += 1;
            if let Some(current) = self.live_item(*action, item, &meta, &flow_id).await? {
                last = current;
                changed = true;
            }
        }

        if moved == 0 {
            debug!("ningún movimiento aplicado en lote de {}", actions.len());
            self.status.send_replace(meta.status());
            return Ok(None);
        }

        self.metadata.save(&meta).await?;

        let status = meta.status();
        let mut normalized = false;
        for stack in [StackKind::Undo, StackKind::Redo] {
            if meta.is_empty(stack) && meta.top(stack) != 0 {
                meta.reset(stack);
                normalized = true;
            }
        }
        if normalized {
            self.metadata.save(&meta).await?;
        }
        self.status.send_replace(status);

        info!("lote aplicado: {} de {} movimientos, {:?}", moved, actions.len(), meta);
        Ok(changed.then_some(last))
    }

    /// Borra todo el almacén y vuelve a crear los metadatos por defecto.
    pub async fn clear(&self) -> Result<()> {
        self.store.clear().await?;
        self.metadata.initialize().await?;
        self.status.send_replace(HistoryStatus::default());
        info!("historial borrado");
        Ok(())
    }

    /// Movimiento de un slot sobre los metadatos en memoria (sin persistirlos).
    /// Devuelve el registro reubicado, o `None` si la pila origen está vacía
    /// o el registro esperado no existe.
    async fn move_one(&self, action: MoveAction, meta: &mut Metadata, flow_id: &Uuid) -> Result<Option<HistoryItem>> {
        let from_top = meta.top(action.from);
        if from_top == meta.bottom(action.from) {
            debug!("pila {} vacía, movimiento ignorado", action.from);
            return Ok(None);
        }

        let item = match self.items.get(action.from, flow_id, from_top).await? {
            Some(item) => item,
            None => {
                warn!("registro {} ausente, movimiento ignorado", action.from.key(flow_id, from_top));
                return Ok(None);
            }
        };

        self.items.remove(action.from, flow_id, from_top).await?;
        meta.set_top(action.from, from_top - 1);
        let to_top = meta.top(action.to) + 1;
        meta.set_top(action.to, to_top);
        self.items.put(action.to, to_top, &item).await?;
        debug!("movido {}:{} -> {}:{}", action.from, from_top, action.to, to_top);
        Ok(Some(item))
    }

    /// Registro en la cima de UNDO tras `action`, es decir, el nuevo estado
    /// vivo. `None` si UNDO quedó vacía o el registro no existe.
    async fn live_item(&self,
                       action: MoveAction,
                       moved: HistoryItem,
                       meta: &Metadata,
                       flow_id: &Uuid)
                       -> Result<Option<HistoryItem>> {
        if action.to == StackKind::Undo {
            return Ok(Some(moved));
        }
        if meta.is_empty(StackKind::Undo) {
            debug!("undo vacía, el estado vivo no cambia");
            return Ok(None);
        }
        let current = self.items.get(StackKind::Undo, flow_id, meta.undo_top).await?;
        if current.is_none() {
            warn!("registro {} ausente", StackKind::Undo.key(flow_id, meta.undo_top));
        }
        Ok(current)
    }

    /// Borra los registros REDO en `(redo_bottom, redo_top]` y colapsa sus
    /// punteros a cero.
    async fn clear_redo(&self, flow_id: &Uuid, meta: &mut Metadata) -> Result<()> {
        for pointer in (meta.redo_bottom + 1)..=meta.redo_top {
            self.items.remove(StackKind::Redo, flow_id, pointer).await?;
        }
        meta.reset(StackKind::Redo);
        Ok(())
    }
}
