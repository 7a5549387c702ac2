//! JSON codec for [`Envelope`].
//!
//! Decoding distinguishes three outcomes: a known envelope, a well-formed frame whose
//! `type` this build does not know ([`DecodeError::UnknownKind`], which receivers
//! should log and skip), and a malformed frame.

use crate::model::{Envelope, EventKind};
use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed envelope: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("envelope has no string `type` field")]
    MissingType,

    #[error("unknown envelope type `{0}`")]
    UnknownKind(String),

    #[error("invalid `{kind}` payload: {source}")]
    InvalidPayload {
        kind: EventKind,
        #[source]
        source: serde_json::Error,
    },
}

impl DecodeError {
    /// True when the frame was well formed but carried a kind this build does not know.
    pub fn is_forward_compatible(&self) -> bool {
        matches!(self, DecodeError::UnknownKind(_))
    }
}

pub fn encode(envelope: &Envelope) -> Bytes {
    // Every field is a string, an integer or a sequence of those.
    let json = serde_json::to_vec(envelope).expect("envelope serialization is infallible");
    Bytes::from(json)
}

pub fn encode_text(envelope: &Envelope) -> String {
    serde_json::to_string(envelope).expect("envelope serialization is infallible")
}

pub fn decode(bytes: &[u8]) -> Result<Envelope, DecodeError> {
    let value: Value = serde_json::from_slice(bytes).map_err(DecodeError::Malformed)?;

    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingType)?;
    let kind: EventKind = kind.parse().map_err(DecodeError::UnknownKind)?;

    serde_json::from_value(value).map_err(|source| DecodeError::InvalidPayload { kind, source })
}
