//! Serialization and deserialization workloads
//!
//! A single-entry mapping whose value grows with `size` is encoded (or
//! decoded) in JSON, bincode and MessagePack.

use crate::error::Result;
use crate::harness::{fallible_operation, Params, Suite};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub const SERIALIZATION_GROUP: &str = "serialization";
pub const DESERIALIZATION_GROUP: &str = "deserialization";

/// Payload sizes registered for both groups
pub const SIZES: [usize; 3] = [1_000, 1_000_000, 10_000_000];

/// Mapping measured by the codec workloads
pub type Payload = BTreeMap<String, String>;

/// Codec failures
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bincode codec error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("MessagePack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    #[error("MessagePack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),
}

/// Wire format under test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Bincode,
    MsgPack,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Json, Format::Bincode, Format::MsgPack];

    /// Variant name used in scenario identities
    pub fn name(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Bincode => "bincode",
            Format::MsgPack => "msgpack",
        }
    }

    pub fn encode(self, payload: &Payload) -> std::result::Result<Vec<u8>, CodecError> {
        Ok(match self {
            Format::Json => serde_json::to_vec(payload)?,
            Format::Bincode => bincode::serialize(payload)?,
            Format::MsgPack => rmp_serde::to_vec(payload)?,
        })
    }

    pub fn decode(self, bytes: &[u8]) -> std::result::Result<Payload, CodecError> {
        Ok(match self {
            Format::Json => serde_json::from_slice(bytes)?,
            Format::Bincode => bincode::deserialize(bytes)?,
            Format::MsgPack => rmp_serde::from_slice(bytes)?,
        })
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `{"key": "value" repeated size / 10 times}`
pub fn payload(size: usize) -> Payload {
    let mut payload = Payload::new();
    payload.insert("key".to_owned(), "value".repeat(size / 10));
    payload
}

fn size_of(params: &Params) -> anyhow::Result<usize> {
    params
        .size("size")
        .ok_or_else(|| anyhow::anyhow!("missing integer parameter 'size'"))
}

/// Register both codec groups for every format and every size up to `max_size`
pub fn register(suite: &mut Suite, max_size: Option<usize>) -> Result<()> {
    let sizes = SIZES
        .into_iter()
        .filter(|size| max_size.is_none_or(|max| *size <= max));

    for size in sizes {
        for format in Format::ALL {
            let params = Params::new().with("size", size);

            suite.register(SERIALIZATION_GROUP, format.name(), params.clone(), move |params| {
                let payload = payload(size_of(params)?);
                Ok(fallible_operation(move || Ok(format.encode(&payload)?)))
            })?;

            suite.register(DESERIALIZATION_GROUP, format.name(), params, move |params| {
                let encoded = format.encode(&payload(size_of(params)?))?;
                Ok(fallible_operation(move || Ok(format.decode(&encoded)?)))
            })?;
        }
    }
    Ok(())
}
