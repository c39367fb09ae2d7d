use tokio::sync::broadcast;
use tracing::debug;

use emberkv_common::{ConnectionError, EmberResult};
use emberkv_protocol::{Command, ConfigParam, Frame};
use emberkv_storage::Keyspace;

use crate::Connection;

/// Loop principal de tratamento de uma conexão.
pub async fn handle_connection(
    mut conn: Connection,
    keyspace: Keyspace,
    shutdown: &mut broadcast::Receiver<()>,
) -> Result<(), ConnectionError> {
    loop {
        let result = tokio::select! {
            result = conn.read_frame() => result,
            _ = shutdown.recv() => {
                return Ok(());
            }
        };

        let frame = match result {
            Ok(Some(f)) => f,
            Ok(None) => return Ok(()), // EOF
            Err(e @ ConnectionError::Protocol(_)) => {
                debug!("frame inválido descartado: {e}");
                conn.write_frame(&Frame::Error(format!("ERR {e}"))).await?;
                continue;
            }
            Err(e) => return Err(e),
        };

        let response = match Command::from_frame(frame) {
            Ok(cmd) => {
                debug!("comando recebido: {cmd:?}");
                execute_command(&cmd, &keyspace).await
            }
            Err(e) => Err(e.into()),
        };

        // Erro de comando nunca derruba a conexão
        let response = response.unwrap_or_else(|e| Frame::Error(format!("ERR {e}")));
        conn.write_frame(&response).await?;
    }
}

/// Executa um comando e retorna o Frame de resposta.
pub async fn execute_command(cmd: &Command, keyspace: &Keyspace) -> EmberResult<Frame> {
    let frame = match cmd {
        Command::Ping(None) => Frame::Simple("PONG".into()),
        Command::Ping(Some(msg)) => Frame::bulk(msg),
        Command::Echo(msg) => Frame::bulk(msg),
        Command::Get(key) => match keyspace.resolve_get(key).await {
            Some(value) => Frame::bulk(&value),
            None => Frame::Null,
        },
        Command::Set {
            key,
            value,
            expire_ms,
        } => {
            keyspace.db().set(key.clone(), value.clone(), *expire_ms);
            Frame::Simple("OK".into())
        }
        Command::ConfigGet(param) => {
            let snapshot = keyspace.snapshot();
            let value = match param {
                ConfigParam::Dir => snapshot.dir(),
                ConfigParam::DbFilename => snapshot.dbfilename(),
                ConfigParam::Other(_) => return Ok(Frame::Array(vec![])),
            };
            Frame::array_from_strs(&[param.name(), value.unwrap_or("")])
        }
        Command::Keys(pattern) => {
            let keys = keyspace.resolve_keys(pattern).await?;
            Frame::array_from_strings(keys)
        }
        Command::Unknown(name) => Frame::Error(format!("ERR unknown command '{name}'")),
    };
    Ok(frame)
}
