//! Construtor de snapshots sintéticos para testes.

use emberkv_common::SNAPSHOT_SIGNATURE;

use super::reader::{OP_EXPIRE_MS, OP_EXPIRE_SECS, OP_METADATA, OP_RESIZE_DB, OP_SELECT_DB};

pub(crate) fn encode_length(n: u32) -> Vec<u8> {
    match n {
        0..=63 => vec![n as u8],
        64..=16383 => vec![0x40 | (n >> 8) as u8, n as u8],
        _ => {
            let mut out = vec![0x80];
            out.extend_from_slice(&n.to_be_bytes());
            out
        }
    }
}

pub(crate) struct SnapshotBuilder {
    buf: Vec<u8>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self {
            buf: SNAPSHOT_SIGNATURE.to_vec(),
        }
    }

    pub fn metadata(mut self, key: &str, value: &str) -> Self {
        self.buf.push(OP_METADATA);
        self.string(key);
        self.string(value);
        self
    }

    pub fn select_db(mut self, index: u32) -> Self {
        self.buf.push(OP_SELECT_DB);
        self.buf.extend(encode_length(index));
        self
    }

    pub fn table(mut self, keys: u32, expires: u32) -> Self {
        self.buf.push(OP_RESIZE_DB);
        self.buf.extend(encode_length(keys));
        self.buf.extend(encode_length(expires));
        self
    }

    pub fn entry(mut self, key: &str, value: &str) -> Self {
        self.buf.push(0x00);
        self.string(key);
        self.string(value);
        self
    }

    pub fn entry_expiring_ms(mut self, key: &str, value: &str, at_ms: u64) -> Self {
        self.buf.push(OP_EXPIRE_MS);
        self.buf.extend_from_slice(&at_ms.to_le_bytes());
        self.entry(key, value)
    }

    pub fn entry_expiring_secs(mut self, key: &str, value: &str, at_secs: u32) -> Self {
        self.buf.push(OP_EXPIRE_SECS);
        self.buf.extend_from_slice(&at_secs.to_le_bytes());
        self.entry(key, value)
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }

    fn string(&mut self, s: &str) {
        self.buf.extend(encode_length(s.len() as u32));
        self.buf.extend_from_slice(s.as_bytes());
    }
}
