// Archivo: errors.rs
// Propósito: definir los errores del historial undo/redo y el alias Result<T>
// usado por las APIs del crate.
use thiserror::Error;

/// Errores del motor de historial.
///
/// - `Storage`: el almacén clave-valor rechazó una operación.
/// - `Serialization`: un registro guardado no se pudo (de)serializar.
///
/// Un registro ausente en un puntero esperado (lectura obsoleta) no es un
/// error: el motor lo trata como no-op.
#[derive(Error, Debug)]
pub enum HistoryError {
  /// Error del almacén clave-valor (SQLite, memoria, etc.).
  #[error("Error de almacenamiento: {0}")]
  Storage(String),
  /// Registro con formato inválido.
  #[error("Error de serialización: {0}")]
  Serialization(#[from] serde_json::Error),
}

/// Alias de resultado usado por las APIs del crate.
pub type Result<T> = std::result::Result<T, HistoryError>;
