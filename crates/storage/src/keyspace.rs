use std::sync::Arc;

use tracing::warn;

use emberkv_common::StorageError;

use crate::Db;
use crate::snapshot::Snapshot;

/// Padrão do KEYS aceito: apenas "tudo".
pub const MATCH_ALL: &str = "*";

/// Coordena leituras entre o store in-memory e o snapshot em disco.
///
/// O store sempre tem prioridade; o snapshot só é consultado em miss e nunca
/// popula o store.
#[derive(Clone)]
pub struct Keyspace {
    db: Db,
    snapshot: Arc<Snapshot>,
}

impl Keyspace {
    pub fn new(db: Db, snapshot: Snapshot) -> Self {
        Self {
            db,
            snapshot: Arc::new(snapshot),
        }
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub async fn resolve_get(&self, key: &str) -> Option<String> {
        if let Some(value) = self.db.get(key) {
            return Some(value);
        }
        if self.snapshot.path().is_none() {
            return None;
        }

        let snapshot = self.snapshot.clone();
        let key = key.to_string();
        // Leitura de arquivo síncrona: fora das threads do runtime
        match tokio::task::spawn_blocking(move || snapshot.get(&key)).await {
            Ok(value) => value,
            Err(e) => {
                warn!("leitura do snapshot abortada: {e}");
                None
            }
        }
    }

    /// Lista as chaves do snapshot. Chaves do store in-memory não entram.
    pub async fn resolve_keys(&self, pattern: &str) -> Result<Vec<String>, StorageError> {
        if pattern != MATCH_ALL {
            return Err(StorageError::UnsupportedPattern(pattern.to_string()));
        }
        if self.snapshot.path().is_none() {
            return Ok(Vec::new());
        }

        let snapshot = self.snapshot.clone();
        match tokio::task::spawn_blocking(move || snapshot.keys()).await {
            Ok(keys) => Ok(keys),
            Err(e) => {
                warn!("leitura do snapshot abortada: {e}");
                Ok(Vec::new())
            }
        }
    }
}
