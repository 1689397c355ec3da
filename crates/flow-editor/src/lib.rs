//! Crate `flow-editor`: historial undo/redo conectado al editor de flows
//!
//! Une el motor de `flow-history` con el estado vivo del editor:
//! - `ActionQueue` agrupa ráfagas de deshacer/rehacer en lotes y nunca
//!   ejecuta dos lotes a la vez; entre lotes aplica un debounce.
//! - `ApplicationBridge` aplica el resultado de cada lote al estado vivo,
//!   lo guarda en remoto (`FlowCommitter`) y centra el viewport.
//! - `EditorSession` es la fachada pública (`undo`, `redo`,
//!   `add_to_undo_history`, `clear_undo_redo_history`, `can_undo`,
//!   `can_redo`).
//!
//! Los colaboradores externos son traits; `stubs` trae versiones en
//! memoria para pruebas y demos.
pub mod bridge;
pub mod collaborators;
pub mod config;
pub mod errors;
pub mod queue;
pub mod session;
pub mod state;
pub mod stubs;

pub use bridge::*;
pub use collaborators::*;
pub use config::*;
pub use errors::*;
pub use queue::*;
pub use session::*;
pub use state::*;
pub use stubs::*;
