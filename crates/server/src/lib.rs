#![forbid(unsafe_code)]

mod connection;
pub mod handler;

pub use connection::Connection;
pub use handler::{execute_command, handle_connection};
