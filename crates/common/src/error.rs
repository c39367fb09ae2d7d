/// Erros de parsing do protocolo RESP.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("frame incompleto")]
    Incomplete,
    #[error("byte de tipo inválido: {0:#x}")]
    InvalidFrameType(u8),
    #[error("inteiro inválido: {0}")]
    InvalidInteger(String),
    #[error("comprimento de bulk inválido: {0}")]
    InvalidBulkLength(i64),
    #[error("frame excede tamanho máximo ({0} bytes)")]
    FrameTooLarge(usize),
    #[error("encoding inválido: {0}")]
    InvalidEncoding(String),
}

/// Erros de leitura do snapshot em disco.
/// Nunca passam da fronteira do leitor: viram resultado vazio.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("fim inesperado do snapshot")]
    UnexpectedEof,
    #[error("encoding especial não suportado: {0:#04x}")]
    UnsupportedEncoding(u8),
    #[error("assinatura de snapshot inválida")]
    InvalidSignature,
    #[error("seção de hash table ausente")]
    MissingHashTable,
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Erros de armazenamento/engine de dados.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("padrão não suportado: '{0}' (apenas '*')")]
    UnsupportedPattern(String),
}

/// Erros de conexão TCP.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("conexão resetada pelo peer")]
    ConnectionReset,
    /// Frame malformado: a conexão responde com erro e segue.
    #[error("protocolo: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Erros de parsing/validação de comandos.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("número errado de argumentos para '{0}'")]
    WrongArity(String),
    #[error("opção inválida para SET: {0}")]
    InvalidSetOption(String),
    #[error("argumento inválido: {0}")]
    InvalidArgument(String),
    #[error("subcomando não suportado para '{0}': {1}")]
    UnsupportedSubcommand(String, String),
}

/// Erro top-level do EmberKV.
#[derive(Debug, thiserror::Error)]
pub enum EmberError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Result type alias.
pub type EmberResult<T> = Result<T, EmberError>;

// Conversão implícita de io::Error → EmberError (via ConnectionError)
impl From<std::io::Error> for EmberError {
    fn from(e: std::io::Error) -> Self {
        EmberError::Connection(ConnectionError::Io(e))
    }
}
