//! Daemon/CLI error type. Library-shaped (`thiserror`) since both binaries
//! in this crate propagate it with `?` through async call chains; `anyhow`
//! is reserved for the CLI entry points themselves.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobmgrdError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed payload: {0}")]
    Decode(#[from] Box<bincode::ErrorKind>),

    #[error(transparent)]
    Core(#[from] alloc_core::AllocCoreError),
}
