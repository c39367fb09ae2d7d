use std::sync::{Arc, Weak};

use dashmap::DashMap;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval};
use tracing::debug;

use emberkv_common::SWEEP_INTERVAL_MS;

use crate::entry::Entry;

type Store = DashMap<String, Entry>;

/// Handle para o store in-memory com TTL.
///
/// Cada operação (`set`, `get` com expiração preguiçosa, `sweep`) é atômica por
/// chave: o DashMap trava o shard inteiro durante a operação.
#[derive(Clone)]
pub struct Db {
    data: Arc<Store>,
}

impl Db {
    /// Cria o store e agenda o sweep ativo a cada 100 ms.
    /// Precisa ser chamado dentro de um runtime tokio.
    pub fn new() -> Self {
        let db = Db {
            data: Arc::new(DashMap::new()),
        };

        let data = Arc::downgrade(&db.data);
        tokio::spawn(async move {
            sweep_expired_keys(data).await;
        });

        db
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let entry = self.data.get(key)?;
        if !entry.is_expired() {
            return Some(entry.value.clone());
        }
        drop(entry);

        // Só remove se ainda estiver expirada (pode ter sido re-setada)
        if self.data.remove_if(key, |_, e| e.is_expired()).is_some() {
            debug!("key expirada removida no acesso: {key}");
        }
        None
    }

    /// Insere ou sobrescreve. `ttl_ms` conta a partir de agora.
    pub fn set(&self, key: String, value: String, ttl_ms: Option<u64>) {
        let expires_at = ttl_ms.map(|ms| Instant::now() + Duration::from_millis(ms));
        self.data.insert(key, Entry::new(value, expires_at));
    }

    /// Remove todas as entradas expiradas. Retorna quantas foram removidas.
    pub fn sweep(&self) -> usize {
        remove_expired(&self.data)
    }

    /// Número de entradas físicas, incluindo expiradas ainda não removidas.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for Db {
    fn default() -> Self {
        Self::new()
    }
}

fn remove_expired(data: &Store) -> usize {
    let now = Instant::now();
    let mut removed = 0;
    data.retain(|_, entry| {
        let expired = entry.is_expired_at(now);
        if expired {
            removed += 1;
        }
        !expired
    });
    removed
}

/// Background task que purga chaves expiradas.
/// Termina quando o último handle do store é descartado.
async fn sweep_expired_keys(data: Weak<Store>) {
    let mut tick = interval(Duration::from_millis(SWEEP_INTERVAL_MS));
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tick.tick().await;

        let Some(data) = data.upgrade() else {
            debug!("store descartado, sweep encerrado");
            return;
        };

        let removed = remove_expired(&data);
        if removed > 0 {
            debug!("sweep removeu {removed} keys expiradas");
        }
    }
}
