use std::ops::ControlFlow;
use std::time::{SystemTime, UNIX_EPOCH};

use emberkv_common::{SNAPSHOT_SIGNATURE, SnapshotError};

use super::codec::{read_length, read_string, skip_string};
use super::cursor::SnapshotCursor;

pub(crate) const OP_METADATA: u8 = 0xFA;
pub(crate) const OP_RESIZE_DB: u8 = 0xFB;
pub(crate) const OP_EXPIRE_MS: u8 = 0xFC;
pub(crate) const OP_EXPIRE_SECS: u8 = 0xFD;
pub(crate) const OP_SELECT_DB: u8 = 0xFE;

/// Expiração gravada no snapshot, na unidade em que foi gravada.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Epoch em milissegundos (tag 0xFC).
    Millis(u64),
    /// Epoch em segundos (tag 0xFD).
    Seconds(u32),
}

impl Expiry {
    /// Estritamente antes de `now`, comparado na mesma unidade.
    pub fn is_past(self, now: SystemTime) -> bool {
        let since_epoch = now.duration_since(UNIX_EPOCH).unwrap_or_default();
        match self {
            Expiry::Millis(ms) => (ms as u128) < since_epoch.as_millis(),
            Expiry::Seconds(secs) => (secs as u64) < since_epoch.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotEntry {
    pub key: String,
    pub value: String,
    pub expiry: Option<Expiry>,
}

/// Percorre as entradas da seção de database, chamando `visit` para cada uma.
///
/// `visit` devolve `Break` para encerrar a varredura sem ler o resto do arquivo.
/// Um arquivo que termina antes do número declarado de chaves não é erro.
pub fn scan<F>(data: &[u8], mut visit: F) -> Result<(), SnapshotError>
where
    F: FnMut(SnapshotEntry) -> ControlFlow<()>,
{
    let mut cur = SnapshotCursor::new(data);

    if cur.take(SNAPSHOT_SIGNATURE.len())? != &SNAPSHOT_SIGNATURE[..] {
        return Err(SnapshotError::InvalidSignature);
    }

    while cur.eat(OP_METADATA) {
        skip_string(&mut cur)?; // nome
        skip_string(&mut cur)?; // valor
    }

    if cur.eat(OP_SELECT_DB) {
        read_length(&mut cur)?; // só o database 0 existe
    }

    if cur.get_u8().ok() != Some(OP_RESIZE_DB) {
        return Err(SnapshotError::MissingHashTable);
    }
    let total_keys = read_length(&mut cur)?.plain()?;
    read_length(&mut cur)?; // quantidade de chaves com expiração

    for _ in 0..total_keys {
        if !cur.has_remaining() {
            break;
        }

        let expiry = match cur.get_u8()? {
            OP_EXPIRE_MS => Some(Expiry::Millis(cur.get_u64_le()?)),
            OP_EXPIRE_SECS => Some(Expiry::Seconds(cur.get_u32_le()?)),
            _ => None, // o próprio byte é o tipo do valor
        };
        if expiry.is_some() {
            cur.get_u8()?; // tipo do valor, tratado sempre como string
        }

        let key = read_string(&mut cur)?;
        let value = read_string(&mut cur)?;

        if visit(SnapshotEntry { key, value, expiry }).is_break() {
            break;
        }
    }

    Ok(())
}

/// Todas as chaves do snapshot, inclusive as já expiradas.
pub fn read_keys(data: &[u8]) -> Result<Vec<String>, SnapshotError> {
    let mut keys = Vec::new();
    scan(data, |entry| {
        keys.push(entry.key);
        ControlFlow::Continue(())
    })?;
    Ok(keys)
}

/// Valor de `key`, ou `None` se ausente ou expirada em relação a `now`.
/// Para na primeira ocorrência da chave.
pub fn find_value(
    data: &[u8],
    key: &str,
    now: SystemTime,
) -> Result<Option<String>, SnapshotError> {
    let mut found = None;
    scan(data, |entry| {
        if entry.key != key {
            return ControlFlow::Continue(());
        }
        if !entry.expiry.is_some_and(|e| e.is_past(now)) {
            found = Some(entry.value);
        }
        ControlFlow::Break(())
    })?;
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::fixture::SnapshotBuilder;
    use std::time::Duration;

    const FAR_PAST_MS: u64 = 1_000_000_000_000; // 2001
    const FAR_FUTURE_MS: u64 = 4_000_000_000_000; // 2096

    fn now() -> SystemTime {
        SystemTime::now()
    }

    #[test]
    fn finds_single_plain_entry() {
        let data = SnapshotBuilder::new().table(1, 0).entry("foo", "bar").build();
        assert_eq!(find_value(&data, "foo", now()).unwrap(), Some("bar".into()));
        assert_eq!(find_value(&data, "missing", now()).unwrap(), None);
    }

    #[test]
    fn skips_metadata_and_database_selector() {
        let data = SnapshotBuilder::new()
            .metadata("redis-ver", "7.2.0")
            .raw(&[OP_METADATA, 0x0A])
            .raw(b"redis-bits")
            .raw(&[0xC0, 0x40])
            .select_db(0)
            .table(2, 0)
            .entry("a", "1")
            .entry("b", "2")
            .build();
        assert_eq!(read_keys(&data).unwrap(), vec!["a", "b"]);
        assert_eq!(find_value(&data, "b", now()).unwrap(), Some("2".into()));
    }

    #[test]
    fn millisecond_expiry_filters_lookup_only() {
        let data = SnapshotBuilder::new()
            .table(2, 2)
            .entry_expiring_ms("k", "v", FAR_PAST_MS)
            .entry_expiring_ms("live", "yes", FAR_FUTURE_MS)
            .build();
        assert_eq!(find_value(&data, "k", now()).unwrap(), None);
        assert_eq!(find_value(&data, "live", now()).unwrap(), Some("yes".into()));
        assert_eq!(read_keys(&data).unwrap(), vec!["k", "live"]);
    }

    #[test]
    fn second_expiry_compares_in_seconds() {
        let at = UNIX_EPOCH + Duration::from_millis(1_700_000_000_500);
        let data = SnapshotBuilder::new()
            .table(2, 2)
            .entry_expiring_secs("same-second", "v", 1_700_000_000)
            .entry_expiring_secs("older", "v", 1_699_999_999)
            .build();
        // 1_700_000_000 s não é estritamente anterior a 1_700_000_000 s
        assert_eq!(find_value(&data, "same-second", at).unwrap(), Some("v".into()));
        assert_eq!(find_value(&data, "older", at).unwrap(), None);
    }

    #[test]
    fn expiry_units_are_not_mixed() {
        let at = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        assert!(!Expiry::Seconds(1_700_000_000).is_past(at));
        assert!(Expiry::Millis(1_700_000_000).is_past(at));
        assert!(!Expiry::Millis(1_700_000_000_000).is_past(at));
    }

    #[test]
    fn lookup_stops_at_first_match() {
        let data = SnapshotBuilder::new()
            .table(2, 0)
            .entry("a", "1")
            .raw(&[0x00, 0xC3]) // chave com encoding especial desconhecido
            .build();
        assert_eq!(find_value(&data, "a", now()).unwrap(), Some("1".into()));
        assert!(matches!(
            read_keys(&data),
            Err(SnapshotError::UnsupportedEncoding(0xC3))
        ));
    }

    #[test]
    fn partial_file_returns_gathered_keys() {
        let data = SnapshotBuilder::new().table(3, 0).entry("only", "one").build();
        assert_eq!(read_keys(&data).unwrap(), vec!["only"]);
        assert_eq!(find_value(&data, "other", now()).unwrap(), None);
    }

    #[test]
    fn trailing_sections_are_not_read() {
        let data = SnapshotBuilder::new()
            .table(1, 0)
            .entry("foo", "bar")
            .raw(&[0xFF, 0xDE, 0xAD])
            .build();
        assert_eq!(read_keys(&data).unwrap(), vec!["foo"]);
    }

    #[test]
    fn truncated_entry_is_eof() {
        let data = SnapshotBuilder::new()
            .table(1, 0)
            .raw(&[0x00, 0x05, b'f', b'o'])
            .build();
        assert!(matches!(read_keys(&data), Err(SnapshotError::UnexpectedEof)));
    }

    #[test]
    fn truncated_expiry_is_eof() {
        let data = SnapshotBuilder::new()
            .table(1, 1)
            .raw(&[OP_EXPIRE_MS, 0x01, 0x02])
            .build();
        assert!(matches!(read_keys(&data), Err(SnapshotError::UnexpectedEof)));
    }

    #[test]
    fn wrong_signature_is_rejected() {
        let mut data = SnapshotBuilder::new().table(1, 0).entry("foo", "bar").build();
        data[8] = b'9';
        assert!(matches!(read_keys(&data), Err(SnapshotError::InvalidSignature)));
        assert!(matches!(
            read_keys(b"REDIS"),
            Err(SnapshotError::UnexpectedEof)
        ));
    }

    #[test]
    fn missing_hash_table_section() {
        let data = SnapshotBuilder::new().select_db(0).entry("foo", "bar").build();
        assert!(matches!(read_keys(&data), Err(SnapshotError::MissingHashTable)));

        let data = SnapshotBuilder::new().build();
        assert!(matches!(
            find_value(&data, "foo", now()),
            Err(SnapshotError::MissingHashTable)
        ));
    }
}
