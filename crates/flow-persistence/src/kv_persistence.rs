use crate::schema::kv_entries;
use async_trait::async_trait;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use flow_history::{HistoryError, KeyValueStore, Result};
use log::{debug, info};
use serde_json::Value as JsonValue;
use std::sync::Arc;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

/// Base de datos usada por `new_from_env` si `HISTORY_DATABASE_URL` no está
/// definida.
pub const DEFAULT_DATABASE_URL: &str = "flow-history.db";
/// Namespace usado por `new_from_env` si `HISTORY_STORE_NAME` no está
/// definida.
pub const DEFAULT_STORE_NAME: &str = "undo-redo";

type DbPool = Pool<ConnectionManager<SqliteConnection>>;

#[derive(Debug, Insertable)]
#[diesel(table_name = kv_entries)]
struct KvRow {
  namespace: String,
  key: String,
  value: String,
}

/// Ajustes aplicados a cada conexión que entrega el pool.
#[derive(Debug)]
struct ConnectionOptions;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
  fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), diesel::r2d2::Error> {
    conn.batch_execute("PRAGMA busy_timeout = 5000;").map_err(diesel::r2d2::Error::QueryError)
  }
}

/// Almacén clave-valor sobre SQLite que implementa `KeyValueStore`.
///
/// Todas las claves viven bajo `namespace` (el nombre del store), de modo que
/// varios stores pueden compartir el mismo fichero. Los valores se guardan
/// como JSON en texto. Las llamadas Diesel son bloqueantes y se ejecutan en
/// `spawn_blocking`.
#[derive(Clone)]
pub struct SqliteKeyValueStore {
  pool: Arc<DbPool>,
  namespace: String,
}

impl SqliteKeyValueStore {
  /// Abre (o crea) la base `database_url` y aplica las migraciones embebidas.
  pub fn new(database_url: &str, namespace: &str) -> Result<Self> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = Pool::builder().max_size(4)
                              .connection_customizer(Box::new(ConnectionOptions))
                              .build(manager)
                              .map_err(pool_err)?;
    let mut conn = pool.get().map_err(pool_err)?;
    conn.batch_execute("PRAGMA journal_mode = WAL;").map_err(db_err)?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| HistoryError::Storage(format!("migraciones: {}", e)))?;
    info!("almacén sqlite abierto: {} (namespace {})", database_url, namespace);
    Ok(Self { pool: Arc::new(pool),
              namespace: namespace.to_string() })
  }

  pub fn namespace(&self) -> &str {
    &self.namespace
  }

  /// Ejecuta `op` con una conexión del pool fuera del runtime async.
  async fn run<T, F>(&self, op: F) -> Result<T>
    where T: Send + 'static,
          F: FnOnce(&mut SqliteConnection, &str) -> QueryResult<T> + Send + 'static
  {
    let pool = self.pool.clone();
    let namespace = self.namespace.clone();
    tokio::task::spawn_blocking(move || {
      let mut conn: PooledConnection<ConnectionManager<SqliteConnection>> = pool.get().map_err(pool_err)?;
      op(&mut *conn, &namespace).map_err(db_err)
    }).await
      .map_err(|e| HistoryError::Storage(format!("tarea bloqueante: {}", e)))?
  }
}

fn pool_err(e: r2d2::Error) -> HistoryError {
  HistoryError::Storage(format!("pool: {}", e))
}

fn db_err(e: diesel::result::Error) -> HistoryError {
  HistoryError::Storage(format!("db: {}", e))
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
  async fn get(&self, key: &str) -> Result<Option<JsonValue>> {
    let key = key.to_string();
    let raw = self.run(move |conn, ns| {
                    kv_entries::table.filter(kv_entries::namespace.eq(ns))
                                     .filter(kv_entries::key.eq(&key))
                                     .select(kv_entries::value)
                                     .first::<String>(conn)
                                     .optional()
                  })
                  .await?;
    match raw {
      Some(text) => Ok(Some(serde_json::from_str(&text)?)),
      None => Ok(None),
    }
  }

  async fn set(&self, key: &str, value: JsonValue) -> Result<()> {
    let key = key.to_string();
    let value = serde_json::to_string(&value)?;
    debug!("sqlite set {}", key);
    self.run(move |conn, ns| {
          let row = KvRow { namespace: ns.to_string(),
                            key,
                            value };
          diesel::replace_into(kv_entries::table).values(&row).execute(conn).map(|_| ())
        })
        .await
  }

  async fn remove(&self, key: &str) -> Result<()> {
    let key = key.to_string();
    debug!("sqlite remove {}", key);
    self.run(move |conn, ns| {
          diesel::delete(kv_entries::table.filter(kv_entries::namespace.eq(ns))
                                          .filter(kv_entries::key.eq(&key))).execute(conn)
                                                                            .map(|_| ())
        })
        .await
  }

  async fn clear(&self) -> Result<()> {
    info!("vaciando namespace {}", self.namespace);
    self.run(|conn, ns| {
          diesel::delete(kv_entries::table.filter(kv_entries::namespace.eq(ns))).execute(conn)
                                                                                .map(|_| ())
        })
        .await
  }
}

/// Crea el almacén leyendo `HISTORY_DATABASE_URL` y `HISTORY_STORE_NAME`
/// (también desde `.env`).
pub fn new_from_env() -> Result<SqliteKeyValueStore> {
  dotenvy::dotenv().ok();
  let database_url = std::env::var("HISTORY_DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
  let namespace = std::env::var("HISTORY_STORE_NAME").unwrap_or_else(|_| DEFAULT_STORE_NAME.to_string());
  SqliteKeyValueStore::new(&database_url, &namespace)
}
