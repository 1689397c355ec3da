// Archivo: metadata.rs
// Propósito: tabla de metadatos. Un único registro (`METADATA_KEY`) con los
// cuatro punteros de las pilas UNDO y REDO, creado de forma perezosa.
use crate::domain::{Metadata, METADATA_KEY};
use crate::errors::Result;
use crate::repository::{get_typed, set_typed, KeyValueStore};
use log::debug;
use std::sync::Arc;

/// Acceso tipado al registro de punteros.
///
/// Las lecturas nunca fallan por ausencia: si el registro no existe se
/// devuelve `Metadata::default()` (los cuatro punteros en cero).
#[derive(Clone)]
pub struct MetadataTable {
    store: Arc<dyn KeyValueStore>,
}

impl MetadataTable {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Escribe el registro por defecto si no existe. Idempotente.
    pub async fn initialize(&self) -> Result<()> {
        if self.store.get(METADATA_KEY).await?.is_none() {
            debug!("metadata ausente, escribiendo valores por defecto");
            self.save(&Metadata::default()).await?;
        }
        Ok(())
    }

    pub async fn load(&self) -> Result<Metadata> {
        let meta = get_typed::<Metadata>(self.store.as_ref(), METADATA_KEY).await?;
        Ok(meta.unwrap_or_default())
    }

    pub async fn save(&self, meta: &Metadata) -> Result<()> {
        debug!("guardando metadata {:?}", meta);
        set_typed(self.store.as_ref(), METADATA_KEY, meta).await
    }
}
