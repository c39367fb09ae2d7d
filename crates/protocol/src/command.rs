use emberkv_common::CommandError;

use crate::{Frame, Parse};

/// Parâmetro consultado via `CONFIG GET`.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigParam {
    Dir,
    DbFilename,
    /// Qualquer outro nome: responde lista vazia, não é erro.
    Other(String),
}

impl ConfigParam {
    fn from_name(name: String) -> Self {
        match name.to_lowercase().as_str() {
            "dir" => ConfigParam::Dir,
            "dbfilename" => ConfigParam::DbFilename,
            _ => ConfigParam::Other(name),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ConfigParam::Dir => "dir",
            ConfigParam::DbFilename => "dbfilename",
            ConfigParam::Other(name) => name,
        }
    }
}

/// Enum com todos os comandos suportados.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Ping(Option<String>),
    Echo(String),
    Get(String),
    Set {
        key: String,
        value: String,
        expire_ms: Option<u64>,
    },
    ConfigGet(ConfigParam),
    Keys(String),
    Unknown(String),
}

impl Command {
    /// Faz o parse de um Frame em um Command.
    ///
    /// A aridade é validada aqui, antes de qualquer efeito colateral.
    pub fn from_frame(frame: Frame) -> Result<Command, CommandError> {
        let mut parse = Parse::new(frame)?;
        let cmd_name = parse.next_string()?.to_uppercase();

        let cmd = match cmd_name.as_str() {
            "PING" => {
                let msg = match parse.remaining() {
                    0 => None,
                    1 => Some(parse.next_string()?),
                    _ => return Err(CommandError::WrongArity(cmd_name)),
                };
                Command::Ping(msg)
            }
            "ECHO" => {
                expect_args(&parse, &cmd_name, 1)?;
                Command::Echo(parse.next_string()?)
            }
            "GET" => {
                expect_args(&parse, &cmd_name, 1)?;
                Command::Get(parse.next_string()?)
            }
            "SET" => parse_set(&mut parse)?,
            "CONFIG" => {
                expect_args(&parse, &cmd_name, 2)?;
                let sub = parse.next_string()?;
                if !sub.eq_ignore_ascii_case("GET") {
                    return Err(CommandError::UnsupportedSubcommand(cmd_name, sub));
                }
                Command::ConfigGet(ConfigParam::from_name(parse.next_string()?))
            }
            "KEYS" => {
                expect_args(&parse, &cmd_name, 1)?;
                Command::Keys(parse.next_string()?)
            }
            _ => return Ok(Command::Unknown(cmd_name)),
        };

        parse.finish()?;
        Ok(cmd)
    }

    /// Encoda o comando como Frame para envio via RESP.
    pub fn to_frame(&self) -> Frame {
        match self {
            Command::Ping(None) => Frame::array_from_strs(&["PING"]),
            Command::Ping(Some(msg)) => Frame::array_from_strs(&["PING", msg.as_str()]),
            Command::Echo(msg) => Frame::array_from_strs(&["ECHO", msg.as_str()]),
            Command::Get(key) => Frame::array_from_strs(&["GET", key.as_str()]),
            Command::Set {
                key,
                value,
                expire_ms,
            } => match expire_ms {
                Some(ms) => Frame::array_from_strs(&[
                    "SET",
                    key.as_str(),
                    value.as_str(),
                    "PX",
                    &ms.to_string(),
                ]),
                None => Frame::array_from_strs(&["SET", key.as_str(), value.as_str()]),
            },
            Command::ConfigGet(param) => {
                Frame::array_from_strs(&["CONFIG", "GET", param.name()])
            }
            Command::Keys(pattern) => Frame::array_from_strs(&["KEYS", pattern.as_str()]),
            Command::Unknown(name) => Frame::array_from_strs(&[name.as_str()]),
        }
    }
}

fn expect_args(parse: &Parse, name: &str, n: usize) -> Result<(), CommandError> {
    if parse.remaining() != n {
        return Err(CommandError::WrongArity(name.to_string()));
    }
    Ok(())
}

/// SET key value [PX millis]
fn parse_set(parse: &mut Parse) -> Result<Command, CommandError> {
    if !matches!(parse.remaining(), 2 | 4) {
        return Err(CommandError::WrongArity("SET".into()));
    }

    let key = parse.next_string()?;
    let value = parse.next_string()?;

    let expire_ms = if parse.has_remaining() {
        let opt = parse.next_string()?.to_uppercase();
        if opt != "PX" {
            return Err(CommandError::InvalidSetOption(opt));
        }
        Some(parse.next_u64()?)
    } else {
        None
    };

    Ok(Command::Set {
        key,
        value,
        expire_ms,
    })
}
