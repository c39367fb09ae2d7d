use emberkv_common::CommandError;

use crate::Frame;

/// Cursor sobre um Frame::Array para extrair argumentos sequencialmente.
///
/// Representa o comando já decodificado: elemento 0 é o nome, o resto são
/// argumentos posicionais.
#[derive(Debug)]
pub struct Parse {
    parts: std::vec::IntoIter<Frame>,
}

impl Parse {
    /// Cria um Parse a partir de um Frame. O frame deve ser um Array não vazio.
    pub fn new(frame: Frame) -> Result<Parse, CommandError> {
        match frame {
            Frame::Array(parts) if !parts.is_empty() => Ok(Parse {
                parts: parts.into_iter(),
            }),
            Frame::Array(_) => Err(CommandError::InvalidArgument("comando vazio".into())),
            _ => Err(CommandError::InvalidArgument("esperado array".into())),
        }
    }

    /// Retorna o próximo elemento como String (de Bulk ou Simple).
    ///
    /// Bytes fora de UTF-8 são substituídos por U+FFFD.
    pub fn next_string(&mut self) -> Result<String, CommandError> {
        match self.next()? {
            Frame::Simple(s) => Ok(s),
            Frame::Bulk(data) => Ok(String::from_utf8_lossy(&data).into_owned()),
            Frame::Integer(n) => Ok(n.to_string()),
            _ => Err(CommandError::InvalidArgument(
                "esperado string ou bulk".into(),
            )),
        }
    }

    /// Retorna o próximo elemento como inteiro não negativo.
    pub fn next_u64(&mut self) -> Result<u64, CommandError> {
        let s = self.next_string()?;
        s.parse::<u64>()
            .map_err(|_| CommandError::InvalidArgument(format!("'{s}' não é um inteiro não negativo")))
    }

    /// Verifica se todos os argumentos foram consumidos.
    pub fn finish(&self) -> Result<(), CommandError> {
        if self.has_remaining() {
            Err(CommandError::InvalidArgument(
                "argumentos extras não esperados".into(),
            ))
        } else {
            Ok(())
        }
    }

    /// Verifica se ainda há argumentos restantes.
    pub fn has_remaining(&self) -> bool {
        self.remaining() > 0
    }

    /// Retorna o número de argumentos restantes.
    pub fn remaining(&self) -> usize {
        self.parts.len()
    }

    fn next(&mut self) -> Result<Frame, CommandError> {
        self.parts.next().ok_or_else(|| {
            CommandError::InvalidArgument("argumentos insuficientes".into())
        })
    }
}
