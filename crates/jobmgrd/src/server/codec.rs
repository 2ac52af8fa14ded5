//! Length-delimited + bincode framing shared by both sockets this daemon
//! listens on. Grounded directly on `make_protocol_builder` in
//! `tako::internal::worker::localcomm`.

use serde::{de::DeserializeOwned, Serialize};
use tokio_util::codec::length_delimited::Builder;
use tokio_util::codec::LengthDelimitedCodec;

use crate::error::JobmgrdError;

pub fn make_protocol_builder() -> Builder {
    *LengthDelimitedCodec::builder().little_endian()
}

pub fn encode<T: Serialize>(message: &T) -> Result<bytes::Bytes, JobmgrdError> {
    Ok(bincode::serialize(message)?.into())
}

pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T, JobmgrdError> {
    Ok(bincode::deserialize(data)?)
}
