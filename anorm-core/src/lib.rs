mod as_value;
mod config;
mod datasource;
mod driver;
mod entity;
mod error;
mod example;
mod naming;
mod nullable;
mod ops;
mod orm;
mod pagination;
mod predicate;
mod query;
mod registry;
mod tag;
mod tx;
mod util;
mod value;
mod writer;

pub use ::anyhow::Context;
pub use as_value::*;
pub use config::*;
pub use datasource::*;
pub use driver::*;
pub use entity::*;
pub use error::*;
pub use example::*;
pub use naming::*;
pub use nullable::*;
pub use ops::*;
pub use orm::*;
pub use pagination::*;
pub use predicate::*;
pub use query::*;
pub use registry::*;
pub use tag::*;
pub use tx::*;
pub use util::*;
pub use value::*;
pub use writer::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
