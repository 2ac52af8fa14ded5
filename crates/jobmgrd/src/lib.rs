//! Daemon and CLI wiring around `alloc-core`: real collaborators (an
//! in-memory active-jobs index, a JSON-lines event log, a length-delimited
//! bincode transport over Unix sockets) and the tokio reactor loop that
//! drives `AllocCore::prep`/`AllocCore::check`.
//!
//! Split into a library so both binaries (`jobmgrd`, `jobmgr-admin`) share
//! the wire message shapes and the codec without duplicating them.

pub mod error;
pub mod server;
pub mod transfer;
