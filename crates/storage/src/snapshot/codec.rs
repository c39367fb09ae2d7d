//! Codificação de comprimento e de strings do formato de snapshot.
//!
//! Os dois bits altos do primeiro byte escolhem o modo:
//!
//! | bits | largura  | valor                                  |
//! |------|----------|----------------------------------------|
//! | `00` | 1 byte   | 6 bits baixos                          |
//! | `01` | 2 bytes  | 6 bits baixos << 8 \| próximo byte     |
//! | `10` | 5 bytes  | próximos 4 bytes, u32 big-endian       |
//! | `11` | variável | encoding especial (subtipo nos 6 bits) |

use emberkv_common::SnapshotError;

use super::cursor::SnapshotCursor;

/// Comprimento decodificado, com a largura de onde veio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Length {
    Bits6(u32),
    Bits14(u32),
    Bits32(u32),
    /// Encoding especial: não é um comprimento. Carrega o subtipo.
    Special(u8),
}

impl Length {
    pub fn value(self) -> Option<u32> {
        match self {
            Length::Bits6(n) | Length::Bits14(n) | Length::Bits32(n) => Some(n),
            Length::Special(_) => None,
        }
    }

    /// Comprimento simples ou `UnsupportedEncoding` com o byte de tag original.
    pub fn plain(self) -> Result<usize, SnapshotError> {
        match self {
            Length::Special(sub) => Err(SnapshotError::UnsupportedEncoding(0xC0 | sub)),
            other => Ok(other.value().unwrap_or_default() as usize),
        }
    }
}

pub fn read_length(cur: &mut SnapshotCursor<'_>) -> Result<Length, SnapshotError> {
    let b = cur.get_u8()?;
    let low = b & 0x3F;
    let len = match b >> 6 {
        0b00 => Length::Bits6(low as u32),
        0b01 => Length::Bits14(((low as u32) << 8) | cur.get_u8()? as u32),
        0b10 => Length::Bits32(cur.get_u32()?),
        _ => Length::Special(low),
    };
    Ok(len)
}

/// Lê uma string prefixada por comprimento. Bytes fora de UTF-8 viram U+FFFD.
pub fn read_string(cur: &mut SnapshotCursor<'_>) -> Result<String, SnapshotError> {
    let len = read_length(cur)?.plain()?;
    let data = cur.take(len)?;
    Ok(String::from_utf8_lossy(data).into_owned())
}

/// Pula uma string sem materializar. Aceita os inteiros especiais de 8, 16 e 32 bits.
pub fn skip_string(cur: &mut SnapshotCursor<'_>) -> Result<(), SnapshotError> {
    let n = match read_length(cur)? {
        Length::Special(0) => 1,
        Length::Special(1) => 2,
        Length::Special(2) => 4,
        other => other.plain()?,
    };
    cur.advance(n)
}
