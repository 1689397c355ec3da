use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::info;
use flow_editor::{CommitOutcome, EditorCollaborators, EditorConfig, EditorSession, FlowCommitter, FlowVersion,
                  Notifier, Viewport};
use serde_json::{json, Value as JsonValue};
use std::error::Error;
use std::io::{self, Write};
use std::sync::Arc;
use thiserror::Error as ThisError;
use uuid::Uuid;

/// Errores de arranque del CLI.
#[derive(ThisError, Debug)]
enum CliError {
    #[error("{0}")]
    Editor(#[from] flow_editor::EditorError),
    #[error("{0}")]
    History(#[from] flow_history::HistoryError),
    #[error("FLOW_ID inválido: {0}")]
    FlowId(String),
}

/// Guardado local: el CLI no tiene servidor, sólo imprime lo que guardaría.
struct ConsoleCommitter;

#[async_trait]
impl FlowCommitter for ConsoleCommitter {
    async fn commit(&self,
                    flow_id: Uuid,
                    root: JsonValue,
                    valid: bool,
                    _previous_updated: DateTime<Utc>)
                    -> flow_editor::Result<CommitOutcome> {
        println!("[guardado] flow {} (válido: {}): {}", flow_id, valid, root);
        Ok(CommitOutcome { success: true,
                           message: "guardado local".into(),
                           updated: Some(Utc::now()) })
    }
}

struct ConsoleViewport;

impl Viewport for ConsoleViewport {
    fn center_on(&self, step_name: &str) {
        if !step_name.is_empty() {
            println!("[viewport] centrado en '{}'", step_name);
        }
    }
}

struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str) {
        eprintln!("[aviso] {}", message);
    }
}

/// Flow sobre el que opera la sesión: `FLOW_ID` si está definido, si no
/// uno nuevo.
fn flow_id_from_env() -> Result<Uuid, CliError> {
    match std::env::var("FLOW_ID") {
        Ok(raw) => Uuid::parse_str(raw.trim()).map_err(|_| CliError::FlowId(raw)),
        Err(_) => Ok(Uuid::new_v4()),
    }
}

/// Pequeño menú interactivo para probar el historial undo/redo sobre el
/// almacén SQLite configurado en el entorno.
///
/// Opciones soportadas:
/// 1) Añadir punto de deshacer (snapshot JSON + paso a enfocar)
/// 2) Deshacer
/// 3) Rehacer
/// 4) Ver estado (punteros, flags y snapshot vivo)
/// 5) Borrar historial
/// 6) Salir
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = EditorConfig::from_env().map_err(CliError::from)?;
    let store = flow_persistence::new_from_env().map_err(CliError::from)?;
    let flow_id = flow_id_from_env()?;
    println!("Historial en namespace '{}' para flow {}", store.namespace(), flow_id);

    let collaborators = EditorCollaborators { committer: Arc::new(ConsoleCommitter),
                                              viewport: Arc::new(ConsoleViewport),
                                              notifier: Arc::new(ConsoleNotifier) };
    let session = EditorSession::new(config,
                                     Arc::new(store),
                                     FlowVersion::new(flow_id, "cli", json!({})),
                                     collaborators);
    session.initialize().await.map_err(CliError::from)?;
    info!("sesión iniciada para flow {}", flow_id);

    loop {
        println!("\n== Historial undo/redo ==");
        println!("1) Añadir punto de deshacer");
        println!("2) Deshacer");
        println!("3) Rehacer");
        println!("4) Ver estado");
        println!("5) Borrar historial");
        println!("6) Salir");
        let choice = prompt("Elige una opción: ")?;
        match choice.trim() {
            "1" => {
                let raw = prompt("Snapshot (JSON o texto simple): ")?;
                let snapshot = serde_json::from_str(&raw).unwrap_or_else(|_| json!(raw.trim()));
                let spotlight = prompt("Paso a enfocar (enter para ninguno): ")?;
                match session.record_edit(snapshot, spotlight.trim()).await {
                    Ok(()) => println!("Punto de deshacer añadido"),
                    Err(e) => eprintln!("Error añadiendo punto: {}", e),
                }
            }
            "2" => {
                if !session.can_undo() {
                    println!("Nada que deshacer");
                    continue;
                }
                session.undo();
                session.settled().await;
            }
            "3" => {
                if !session.can_redo() {
                    println!("Nada que rehacer");
                    continue;
                }
                session.redo();
                session.settled().await;
            }
            "4" => match session.metadata().await {
                Ok(meta) => {
                    println!("undo: ({}, {}]  redo: ({}, {}]",
                             meta.undo_bottom, meta.undo_top, meta.redo_bottom, meta.redo_top);
                    println!("puede deshacer: {}  puede rehacer: {}", session.can_undo(), session.can_redo());
                    println!("snapshot vivo: {}", session.current_state().trigger);
                }
                Err(e) => eprintln!("Error leyendo metadatos: {}", e),
            },
            "5" => {
                let confirm = prompt("Confirma borrado del historial? escribir 'yes' para confirmar: ")?;
                if confirm.trim().to_lowercase() == "yes" {
                    match session.clear_undo_redo_history().await {
                        Ok(()) => println!("Historial borrado"),
                        Err(e) => eprintln!("Error borrando historial: {}", e),
                    }
                } else {
                    println!("Borrado cancelado");
                }
            }
            "6" => {
                println!("Saliendo...");
                break;
            }
            other => {
                println!("Opción inválida: {}", other);
            }
        }
    }

    session.close();
    info!("sesión cerrada");
    Ok(())
}

fn prompt(msg: &str) -> io::Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s)
}
