use crate::errors::{EditorError, Result};
use flow_history::HistoryEngineConfig;
use std::time::Duration;

/// Ventana de debounce por defecto entre lotes de deshacer/rehacer.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Configuración de una sesión del editor. Se crea una vez por sesión y se
/// pasa al constructor de `EditorSession`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditorConfig {
    pub history: HistoryEngineConfig,
    /// Espera antes de procesar acciones acumuladas durante un lote.
    pub debounce: Duration,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig { history: HistoryEngineConfig::default(),
                       debounce: DEFAULT_DEBOUNCE }
    }
}

impl EditorConfig {
    /// Lee `HISTORY_MAX_SIZE` y `HISTORY_DEBOUNCE_MS` del entorno (y de
    /// `.env` si existe). Las variables ausentes toman el valor por defecto.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Igual que `from_env` pero con una fuente de variables inyectada.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
        where F: Fn(&str) -> Option<String>
    {
        let mut config = EditorConfig::default();
        if let Some(raw) = lookup("HISTORY_MAX_SIZE") {
            let max_size: u64 = raw.trim()
                                   .parse()
                                   .map_err(|_| EditorError::Config(format!("HISTORY_MAX_SIZE inválido: {}", raw)))?;
            if max_size == 0 {
                return Err(EditorError::Config("HISTORY_MAX_SIZE debe ser mayor que 0".into()));
            }
            config.history.max_size = max_size;
        }
        if let Some(raw) = lookup("HISTORY_DEBOUNCE_MS") {
            let millis: u64 = raw.trim()
                                 .parse()
                                 .map_err(|_| EditorError::Config(format!("HISTORY_DEBOUNCE_MS inválido: {}", raw)))?;
            config.debounce = Duration::from_millis(millis);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn missing_vars_use_defaults() {
        let config = EditorConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.history.max_size, 10);
        assert_eq!(config.debounce, Duration::from_millis(300));
    }

    #[test]
    fn vars_override_defaults() {
        let config = EditorConfig::from_vars(vars(&[("HISTORY_MAX_SIZE", "25"), ("HISTORY_DEBOUNCE_MS", " 50 ")])).unwrap();
        assert_eq!(config.history.max_size, 25);
        assert_eq!(config.debounce, Duration::from_millis(50));
    }

    #[test]
    fn malformed_or_zero_capacity_is_rejected() {
        assert!(matches!(EditorConfig::from_vars(vars(&[("HISTORY_MAX_SIZE", "diez")])),
                         Err(EditorError::Config(_))));
        assert!(matches!(EditorConfig::from_vars(vars(&[("HISTORY_MAX_SIZE", "0")])),
                         Err(EditorError::Config(_))));
        assert!(matches!(EditorConfig::from_vars(vars(&[("HISTORY_DEBOUNCE_MS", "-1")])),
                         Err(EditorError::Config(_))));
    }
}
