//! Leitura somente-leitura do snapshot binário em disco.
//!
//! O snapshot é consultivo: arquivo ausente, corrompido ou em formato não
//! suportado equivale a um snapshot vazio. Nenhum erro daqui chega ao cliente.

mod codec;
mod cursor;
mod reader;

#[cfg(test)]
pub(crate) mod fixture;

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};

use emberkv_common::SnapshotError;

pub use codec::{Length, read_length, read_string, skip_string};
pub use cursor::SnapshotCursor;
pub use reader::{Expiry, SnapshotEntry, find_value, read_keys, scan};

/// Localização do snapshot (`dir` + `dbfilename`), fixa durante o processo.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    dir: Option<String>,
    dbfilename: Option<String>,
}

impl Snapshot {
    pub fn new(dir: Option<String>, dbfilename: Option<String>) -> Self {
        Self { dir, dbfilename }
    }

    pub fn dir(&self) -> Option<&str> {
        self.dir.as_deref()
    }

    pub fn dbfilename(&self) -> Option<&str> {
        self.dbfilename.as_deref()
    }

    /// Caminho completo, se os dois componentes estiverem configurados.
    pub fn path(&self) -> Option<PathBuf> {
        Some(Path::new(self.dir.as_deref()?).join(self.dbfilename.as_deref()?))
    }

    /// Chaves do snapshot. Vazio se não configurado, ausente ou ilegível.
    pub fn keys(&self) -> Vec<String> {
        let result = self.load().and_then(|data| match data {
            Some(data) => read_keys(&data),
            None => Ok(Vec::new()),
        });
        result.unwrap_or_else(|e| {
            warn!("snapshot {:?} ilegível, ignorando: {e}", self.path());
            Vec::new()
        })
    }

    /// Valor não expirado de `key` no snapshot.
    pub fn get(&self, key: &str) -> Option<String> {
        let result = self.load().and_then(|data| match data {
            Some(data) => find_value(&data, key, SystemTime::now()),
            None => Ok(None),
        });
        result.unwrap_or_else(|e| {
            warn!("snapshot {:?} ilegível, ignorando: {e}", self.path());
            None
        })
    }

    /// Cada chamada lê o arquivo de novo; não há handle compartilhado.
    fn load(&self) -> Result<Option<Vec<u8>>, SnapshotError> {
        let Some(path) = self.path() else {
            return Ok(None);
        };
        match std::fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("snapshot {path:?} não existe");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}
