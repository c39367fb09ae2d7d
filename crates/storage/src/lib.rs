#![forbid(unsafe_code)]

mod db;
mod entry;
mod keyspace;
pub mod snapshot;

pub use db::Db;
pub use entry::Entry;
pub use keyspace::{Keyspace, MATCH_ALL};
pub use snapshot::Snapshot;
