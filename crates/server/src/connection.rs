use bytes::{Buf, BytesMut};
use std::io::Cursor;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;

use emberkv_common::{
    ConnectionError, INITIAL_BUFFER_CAPACITY, MAX_FRAME_SIZE, ProtocolError,
};
use emberkv_protocol::Frame;

/// Wrapper sobre TcpStream com buffer para leitura/escrita de frames RESP.
pub struct Connection {
    stream: BufWriter<TcpStream>,
    buffer: BytesMut,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream: BufWriter::new(stream),
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Lê um frame completo do stream. Retorna None no EOF.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, ConnectionError> {
        loop {
            if let Some(frame) = self.parse_frame()? {
                return Ok(Some(frame));
            }

            if self.stream.read_buf(&mut self.buffer).await? == 0 {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Err(ConnectionError::ConnectionReset);
            }
        }
    }

    /// Escreve um frame no stream.
    pub async fn write_frame(&mut self, frame: &Frame) -> Result<(), ConnectionError> {
        let mut buf = BytesMut::new();
        frame.encode(&mut buf);
        self.stream.write_all(&buf).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Extrai o próximo frame do buffer.
    ///
    /// Em erro de protocolo os bytes inválidos já foram descartados; o
    /// chamador pode responder e continuar lendo.
    fn parse_frame(&mut self) -> Result<Option<Frame>, ConnectionError> {
        while let Some(&first) = self.buffer.first() {
            if Frame::is_type_byte(first) {
                return self.parse_resp();
            }

            let Some(end) = self.buffer.iter().position(|&b| b == b'\n') else {
                if self.buffer.len() > MAX_FRAME_SIZE {
                    let len = self.buffer.len();
                    self.buffer.clear();
                    return Err(ProtocolError::FrameTooLarge(len).into());
                }
                return Ok(None);
            };
            let line = self.buffer.split_to(end + 1);
            if let Some(frame) = Frame::parse_inline(&line) {
                return Ok(Some(frame));
            }
            // linha vazia: ignora
        }
        Ok(None)
    }

    fn parse_resp(&mut self) -> Result<Option<Frame>, ConnectionError> {
        let mut cursor = Cursor::new(&self.buffer[..]);

        match Frame::check(&mut cursor) {
            Ok(()) => {
                let len = cursor.position() as usize;
                cursor.set_position(0);
                let parsed = Frame::parse(&mut cursor);
                // o frame inteiro sai do buffer, válido ou não
                self.buffer.advance(len);
                Ok(Some(parsed?))
            }
            Err(ProtocolError::Incomplete) => Ok(None),
            Err(e) => {
                self.discard_line();
                Err(e.into())
            }
        }
    }

    /// Descarta até o próximo `\r\n` (inclusive), ou o buffer todo.
    fn discard_line(&mut self) {
        match self.buffer.windows(2).position(|w| w == b"\r\n") {
            Some(pos) => self.buffer.advance(pos + 2),
            None => self.buffer.clear(),
        }
    }
}
