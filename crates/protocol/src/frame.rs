use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;
use emberkv_common::{MAX_FRAME_SIZE, ProtocolError};

/// Representação de um frame RESP2.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    Null,
    Array(Vec<Frame>),
}

impl Frame {
    /// Verifica se um frame completo está disponível no buffer sem alocar.
    /// Retorna Ok(()) se completo, Err(Incomplete) se precisa mais dados.
    pub fn check(src: &mut Cursor<&[u8]>) -> Result<(), ProtocolError> {
        match get_u8(src)? {
            b'+' | b'-' | b':' => {
                get_line(src)?;
                Ok(())
            }
            b'$' => match get_length(src)? {
                None => Ok(()),
                Some(len) => skip(src, len + 2), // data + \r\n
            },
            b'*' => {
                if let Some(count) = get_length(src)? {
                    for _ in 0..count {
                        Frame::check(src)?;
                    }
                }
                Ok(())
            }
            byte => Err(ProtocolError::InvalidFrameType(byte)),
        }
    }

    /// Faz o parse de um frame completo a partir do cursor.
    /// Deve ser chamado apenas após `check()` retornar Ok.
    pub fn parse(src: &mut Cursor<&[u8]>) -> Result<Frame, ProtocolError> {
        match get_u8(src)? {
            b'+' => Ok(Frame::Simple(get_text(src)?)),
            b'-' => Ok(Frame::Error(get_text(src)?)),
            b':' => Ok(Frame::Integer(get_decimal(src)?)),
            b'$' => {
                let Some(len) = get_length(src)? else {
                    return Ok(Frame::Null);
                };
                if src.remaining() < len + 2 {
                    return Err(ProtocolError::Incomplete);
                }
                let data = Bytes::copy_from_slice(&src.chunk()[..len]);
                src.advance(len + 2);
                Ok(Frame::Bulk(data))
            }
            b'*' => {
                let Some(count) = get_length(src)? else {
                    return Ok(Frame::Null);
                };
                let mut frames = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    frames.push(Frame::parse(src)?);
                }
                Ok(Frame::Array(frames))
            }
            byte => Err(ProtocolError::InvalidFrameType(byte)),
        }
    }

    /// Encoda o frame no buffer de saída em formato RESP2.
    pub fn encode(&self, dst: &mut BytesMut) {
        match self {
            Frame::Simple(s) => put_line(dst, b'+', s.as_bytes()),
            Frame::Error(s) => put_line(dst, b'-', s.as_bytes()),
            Frame::Integer(n) => put_line(dst, b':', n.to_string().as_bytes()),
            Frame::Bulk(data) => {
                put_line(dst, b'$', data.len().to_string().as_bytes());
                dst.put(data.as_ref());
                dst.put(&b"\r\n"[..]);
            }
            Frame::Null => dst.put(&b"$-1\r\n"[..]),
            Frame::Array(frames) => {
                put_line(dst, b'*', frames.len().to_string().as_bytes());
                for frame in frames {
                    frame.encode(dst);
                }
            }
        }
    }

    /// Indica se `byte` abre um frame RESP2.
    pub fn is_type_byte(byte: u8) -> bool {
        matches!(byte, b'+' | b'-' | b':' | b'$' | b'*')
    }

    /// Comando inline (sem framing RESP): argumentos separados por espaço.
    /// Linha vazia retorna `None`.
    pub fn parse_inline(line: &[u8]) -> Option<Frame> {
        let parts: Vec<Frame> = line
            .split(u8::is_ascii_whitespace)
            .filter(|part| !part.is_empty())
            .map(|part| Frame::Bulk(Bytes::copy_from_slice(part)))
            .collect();
        (!parts.is_empty()).then_some(Frame::Array(parts))
    }

    /// Helper: cria um Frame::Bulk a partir de &str.
    pub fn bulk(s: &str) -> Frame {
        Frame::Bulk(Bytes::from(s.to_string()))
    }

    /// Helper: cria um Array de Bulk strings a partir de &[&str].
    pub fn array_from_strs(strs: &[&str]) -> Frame {
        Frame::Array(strs.iter().map(|s| Frame::bulk(s)).collect())
    }

    /// Helper: Array de Bulk strings a partir de strings owned (ex.: resposta do KEYS).
    pub fn array_from_strings(strs: Vec<String>) -> Frame {
        Frame::Array(
            strs.into_iter()
                .map(|s| Frame::Bulk(Bytes::from(s)))
                .collect(),
        )
    }
}

fn put_line(dst: &mut BytesMut, prefix: u8, body: &[u8]) {
    dst.put_u8(prefix);
    dst.put(body);
    dst.put(&b"\r\n"[..]);
}

fn get_u8(src: &mut Cursor<&[u8]>) -> Result<u8, ProtocolError> {
    if !src.has_remaining() {
        return Err(ProtocolError::Incomplete);
    }
    Ok(src.get_u8())
}

fn get_line<'a>(src: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], ProtocolError> {
    let start = src.position() as usize;
    let buf: &'a [u8] = *src.get_ref();

    match buf[start..].windows(2).position(|w| w == b"\r\n") {
        Some(offset) => {
            src.set_position((start + offset + 2) as u64);
            Ok(&buf[start..start + offset])
        }
        None => Err(ProtocolError::Incomplete),
    }
}

fn get_text(src: &mut Cursor<&[u8]>) -> Result<String, ProtocolError> {
    let line = get_line(src)?;
    String::from_utf8(line.to_vec()).map_err(|e| ProtocolError::InvalidEncoding(e.to_string()))
}

fn get_decimal(src: &mut Cursor<&[u8]>) -> Result<i64, ProtocolError> {
    let line = get_line(src)?;
    let s = std::str::from_utf8(line).map_err(|e| ProtocolError::InvalidInteger(e.to_string()))?;
    s.parse::<i64>()
        .map_err(|e| ProtocolError::InvalidInteger(e.to_string()))
}

/// Lê o comprimento de um bulk/array. `None` representa o nulo (-1).
fn get_length(src: &mut Cursor<&[u8]>) -> Result<Option<usize>, ProtocolError> {
    match get_decimal(src)? {
        -1 => Ok(None),
        len if len < 0 => Err(ProtocolError::InvalidBulkLength(len)),
        len if len as usize > MAX_FRAME_SIZE => Err(ProtocolError::FrameTooLarge(len as usize)),
        len => Ok(Some(len as usize)),
    }
}

fn skip(src: &mut Cursor<&[u8]>, n: usize) -> Result<(), ProtocolError> {
    if src.remaining() < n {
        return Err(ProtocolError::Incomplete);
    }
    src.advance(n);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(frame: &Frame) -> BytesMut {
        let mut buf = BytesMut::new();
        frame.encode(&mut buf);
        buf
    }

    fn decode(data: &[u8]) -> Frame {
        let mut cursor = Cursor::new(data);
        Frame::check(&mut cursor).unwrap();
        assert_eq!(cursor.position() as usize, data.len());
        cursor.set_position(0);
        Frame::parse(&mut cursor).unwrap()
    }

    #[test]
    fn decode_client_command() {
        let frame = decode(b"*2\r\n$3\r\nGET\r\n$3\r\nfoo\r\n");
        assert_eq!(frame, Frame::array_from_strs(&["GET", "foo"]));
    }

    #[test]
    fn encode_replies_in_wire_format() {
        assert_eq!(&encode(&Frame::Simple("PONG".into()))[..], b"+PONG\r\n");
        assert_eq!(&encode(&Frame::Null)[..], b"$-1\r\n");
        assert_eq!(&encode(&Frame::bulk("bar"))[..], b"$3\r\nbar\r\n");
        assert_eq!(
            &encode(&Frame::Error("ERR unknown command 'FOO'".into()))[..],
            b"-ERR unknown command 'FOO'\r\n"
        );
    }

    #[test]
    fn encode_config_pair_and_empty_list() {
        let pair = Frame::array_from_strs(&["dir", "/tmp/ember"]);
        assert_eq!(
            &encode(&pair)[..],
            b"*2\r\n$3\r\ndir\r\n$10\r\n/tmp/ember\r\n"
        );
        assert_eq!(&encode(&Frame::Array(vec![]))[..], b"*0\r\n");
    }

    #[test]
    fn empty_bulk_is_not_null() {
        let frame = decode(b"$0\r\n\r\n");
        assert_eq!(frame, Frame::Bulk(Bytes::new()));
    }

    #[test]
    fn nested_array_survives_encode_decode() {
        let frame = Frame::Array(vec![
            Frame::array_from_strings(vec!["a".into(), "b".into()]),
            Frame::Integer(-7),
            Frame::Null,
        ]);
        assert_eq!(decode(&encode(&frame)), frame);
    }

    #[test]
    fn incomplete_frame() {
        let data = b"+OK\r"; // falta \n
        let mut cursor = Cursor::new(&data[..]);
        assert!(matches!(
            Frame::check(&mut cursor),
            Err(ProtocolError::Incomplete)
        ));
    }

    #[test]
    fn incomplete_bulk() {
        let data = b"$5\r\nhel";
        let mut cursor = Cursor::new(&data[..]);
        assert!(matches!(
            Frame::check(&mut cursor),
            Err(ProtocolError::Incomplete)
        ));
    }

    #[test]
    fn incomplete_array_element() {
        let data = b"*2\r\n$3\r\nGET\r\n";
        let mut cursor = Cursor::new(&data[..]);
        assert!(matches!(
            Frame::check(&mut cursor),
            Err(ProtocolError::Incomplete)
        ));
    }

    #[test]
    fn negative_bulk_length_rejected() {
        let data = b"$-5\r\n";
        let mut cursor = Cursor::new(&data[..]);
        assert!(matches!(
            Frame::check(&mut cursor),
            Err(ProtocolError::InvalidBulkLength(-5))
        ));
    }

    #[test]
    fn inline_command_splits_on_whitespace() {
        assert_eq!(
            Frame::parse_inline(b"SET  foo\tbar\r\n"),
            Some(Frame::array_from_strs(&["SET", "foo", "bar"]))
        );
        assert_eq!(
            Frame::parse_inline(b"PING"),
            Some(Frame::array_from_strs(&["PING"]))
        );
        assert_eq!(Frame::parse_inline(b"  \r\n"), None);
    }

    #[test]
    fn type_bytes() {
        for byte in *b"+-:$*" {
            assert!(Frame::is_type_byte(byte));
        }
        assert!(!Frame::is_type_byte(b'P'));
        assert!(!Frame::is_type_byte(b'?'));
    }

    #[test]
    fn invalid_frame_type() {
        let data = b"?invalid\r\n";
        let mut cursor = Cursor::new(&data[..]);
        assert!(matches!(
            Frame::check(&mut cursor),
            Err(ProtocolError::InvalidFrameType(b'?'))
        ));
    }
}
