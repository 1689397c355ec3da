use thiserror::Error;

// Errores comunes de la sesión del editor.
//
// Este enum centraliza los errores que pueden ocurrir al operar el
// historial desde el editor: errores del motor de historial
// (`HistoryError`), del guardado remoto y de configuración.
#[derive(Error, Debug)]
pub enum EditorError {
  /// Errores originados por el motor de historial o su almacén.
  #[error("Error de historial: {0}")]
  History(#[from] flow_history::HistoryError),

  /// El colaborador de persistencia remota rechazó la llamada.
  #[error("Error al guardar el flow: {0}")]
  Commit(String),

  /// Variables de entorno o valores de configuración inválidos.
  #[error("Error de configuración: {0}")]
  Config(String),
}

pub type Result<T> = std::result::Result<T, EditorError>;
