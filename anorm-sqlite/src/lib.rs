mod connection;
mod extract;
mod sql_writer;
mod transaction;

pub use connection::*;
pub use sql_writer::*;
pub use transaction::*;
