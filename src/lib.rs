pub mod fleet;
pub mod network;
pub mod shared;
pub mod spatial;
pub mod store;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("store error: {0}")]
    Store(#[from] store::Error),
}
