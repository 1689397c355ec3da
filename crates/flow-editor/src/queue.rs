// Archivo: queue.rs
// Propósito: cola que agrupa ráfagas de deshacer/rehacer en lotes y
// garantiza un único lote en vuelo por sesión.
//
// Máquina de estados:
//   Idle --enqueue--> Processing (drenado inmediato)
//   Processing --enqueue--> ProcessingWithPending
//   Processing --fin de lote--> Idle
//   ProcessingWithPending --fin de lote--> Idle + temporizador de debounce
//   temporizador --dispara--> drenado
use crate::collaborators::Notifier;
use crate::errors::Result;
use async_trait::async_trait;
use flow_history::MoveAction;
use log::{debug, error, warn};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Aviso al usuario cuando un lote no se pudo aplicar.
pub const BATCH_FAILED_MESSAGE: &str = "No se pudo deshacer/rehacer el cambio";

/// Consumidor de los lotes drenados.
#[async_trait]
pub trait BatchHandler: Send + Sync {
    async fn handle(&self, batch: Vec<MoveAction>) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuePhase {
    Idle,
    Processing,
    ProcessingWithPending,
}

struct QueueState {
    phase: QueuePhase,
    pending: Vec<MoveAction>,
    timer: Option<JoinHandle<()>>,
    closed: bool,
}

struct QueueInner {
    state: Mutex<QueueState>,
    handler: Arc<dyn BatchHandler>,
    notifier: Arc<dyn Notifier>,
    debounce: Duration,
    // true cuando no hay lote en vuelo ni acciones pendientes.
    settled: watch::Sender<bool>,
}

/// Cola de acciones con coalescencia y debounce.
///
/// Las acciones se aplican en orden FIFO dentro de un lote y los lotes
/// nunca se solapan. Los errores del consumidor se convierten en un aviso
/// al usuario; nunca se propagan a quien encola.
pub struct ActionQueue {
    inner: Arc<QueueInner>,
}

impl ActionQueue {
    pub fn new(handler: Arc<dyn BatchHandler>, notifier: Arc<dyn Notifier>, debounce: Duration) -> Self {
        let (settled, _) = watch::channel(true);
        let inner = QueueInner { state: Mutex::new(QueueState { phase: QueuePhase::Idle,
                                                                pending: Vec::new(),
                                                                timer: None,
                                                                closed: false }),
                                 handler,
                                 notifier,
                                 debounce,
                                 settled };
        Self { inner: Arc::new(inner) }
    }

    /// Añade una acción. Si no hay lote en vuelo el drenado arranca sin
    /// esperar; si lo hay, la acción espera al siguiente lote.
    pub fn enqueue(&self, action: MoveAction) {
        let start = {
            let mut state = self.inner.lock();
            if state.closed {
                warn!("cola cerrada, acción {:?} descartada", action);
                return;
            }
            state.pending.push(action);
            self.inner.settled.send_replace(false);
            match state.phase {
                QueuePhase::Idle => true,
                QueuePhase::Processing => {
                    state.phase = QueuePhase::ProcessingWithPending;
                    false
                }
                QueuePhase::ProcessingWithPending => false,
            }
        };
        if start {
            spawn_drain(self.inner.clone(), None);
        }
    }

    pub fn phase(&self) -> QueuePhase {
        self.inner.lock().phase
    }

    pub fn pending_len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Espera a que no quede lote en vuelo ni acciones pendientes.
    pub async fn settled(&self) {
        let mut rx = self.inner.settled.subscribe();
        let _ = rx.wait_for(|done| *done).await;
    }

    /// Cancela el temporizador y vacía el buffer. Un lote ya en vuelo
    /// termina normalmente.
    pub fn clear(&self) {
        self.inner.reset(false);
    }

    /// Como `clear`, y además descarta cualquier acción futura.
    pub fn close(&self) {
        self.inner.reset(true);
    }
}

impl Drop for ActionQueue {
    fn drop(&mut self) {
        self.close();
    }
}

impl QueueInner {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn reset(&self, close: bool) {
        let idle = {
            let mut state = self.lock();
            if let Some(timer) = state.timer.take() {
                timer.abort();
            }
            state.pending.clear();
            state.closed |= close;
            if state.phase == QueuePhase::ProcessingWithPending {
                state.phase = QueuePhase::Processing;
            }
            state.phase == QueuePhase::Idle
        };
        if idle {
            self.settled.send_replace(true);
        }
    }

    async fn drain(self: Arc<Self>) {
        let batch = {
            let mut state = self.lock();
            if state.phase != QueuePhase::Idle || state.pending.is_empty() {
                return;
            }
            state.phase = QueuePhase::Processing;
            // Un temporizador que aún no disparó queda sin efecto: al
            // disparar encontrará el buffer vacío o un lote en vuelo.
            state.timer = None;
            std::mem::take(&mut state.pending)
        };

        debug!("procesando lote de {} acciones", batch.len());
        if let Err(e) = self.handler.handle(batch).await {
            error!("fallo al aplicar lote de historial: {}", e);
            self.notifier.notify(BATCH_FAILED_MESSAGE);
        }

        let mut state = self.lock();
        state.phase = QueuePhase::Idle;
        if state.pending.is_empty() || state.closed {
            state.pending.clear();
            drop(state);
            self.settled.send_replace(true);
            return;
        }
        debug!("{} acciones acumuladas, nuevo drenado en {:?}", state.pending.len(), self.debounce);
        state.timer = spawn_drain(self.clone(), Some(self.debounce));
    }
}

/// Lanza un drenado, opcionalmente tras `delay`. Sin runtime de tokio no
/// hay drenado posible y las acciones quedan en el buffer.
fn spawn_drain(inner: Arc<QueueInner>, delay: Option<Duration>) -> Option<JoinHandle<()>> {
    let handle = match Handle::try_current() {
        Ok(handle) => handle,
        Err(_) => {
            warn!("sin runtime de tokio, la cola no se drena");
            return None;
        }
    };
    let task: Pin<Box<dyn Future<Output = ()> + Send>> = Box::pin(async move {
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        inner.drain().await;
    });
    Some(handle.spawn(task))
}
