use bytes::Buf;
use std::io::Cursor;

use emberkv_common::SnapshotError;

/// Cursor de bytes sobre o conteúdo do snapshot.
///
/// Toda leitura é checada contra o tamanho restante: faltar byte é
/// `UnexpectedEof`, nunca um valor default.
#[derive(Debug)]
pub struct SnapshotCursor<'a> {
    inner: Cursor<&'a [u8]>,
}

impl<'a> SnapshotCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            inner: Cursor::new(data),
        }
    }

    pub fn position(&self) -> usize {
        self.inner.position() as usize
    }

    pub fn has_remaining(&self) -> bool {
        self.inner.has_remaining()
    }

    /// Próximo byte sem consumir. `None` no fim do buffer.
    pub fn peek(&self) -> Option<u8> {
        self.inner.chunk().first().copied()
    }

    pub fn advance(&mut self, n: usize) -> Result<(), SnapshotError> {
        self.ensure(n)?;
        self.inner.advance(n);
        Ok(())
    }

    /// Volta `n` bytes (satura no início do buffer).
    pub fn rewind(&mut self, n: usize) {
        let pos = self.position().saturating_sub(n);
        self.inner.set_position(pos as u64);
    }

    /// Consome o próximo byte se for igual a `marker`.
    /// Caso contrário (ou no fim do buffer) a posição não muda.
    pub fn eat(&mut self, marker: u8) -> bool {
        match self.get_u8() {
            Ok(byte) if byte == marker => true,
            Ok(_) => {
                self.rewind(1);
                false
            }
            Err(_) => false,
        }
    }

    pub fn get_u8(&mut self) -> Result<u8, SnapshotError> {
        self.ensure(1)?;
        Ok(self.inner.get_u8())
    }

    /// u32 big-endian (comprimentos de 32 bits).
    pub fn get_u32(&mut self) -> Result<u32, SnapshotError> {
        self.ensure(4)?;
        Ok(self.inner.get_u32())
    }

    pub fn get_u32_le(&mut self) -> Result<u32, SnapshotError> {
        self.ensure(4)?;
        Ok(self.inner.get_u32_le())
    }

    pub fn get_u64_le(&mut self) -> Result<u64, SnapshotError> {
        self.ensure(8)?;
        Ok(self.inner.get_u64_le())
    }

    /// Consome exatamente `n` bytes e devolve a fatia sem copiar.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], SnapshotError> {
        self.ensure(n)?;
        let data: &'a [u8] = *self.inner.get_ref();
        let start = self.position();
        self.inner.advance(n);
        Ok(&data[start..start + n])
    }

    fn ensure(&self, n: usize) -> Result<(), SnapshotError> {
        if self.inner.remaining() < n {
            return Err(SnapshotError::UnexpectedEof);
        }
        Ok(())
    }
}
