//! # Payload codec contract.
//!
//! A queue stores opaque byte strings; the [`Payload`] trait is the seam where
//! a payload type supplies its own `serialize`/`deserialize` pair. Both sides
//! must be total over correctly-paired producer/consumer type versions; a
//! mismatch surfaces as [`QueueError::Serialization`](crate::QueueError).
//!
//! Blanket impls cover `Vec<u8>` and `String`. Anything else brings its own
//! codec — a serde-based one takes a few lines:
//!
//! ```rust
//! use persistq::{CodecError, Payload};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Job {
//!     id: u64,
//!     body: String,
//! }
//!
//! impl Payload for Job {
//!     fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
//!         serde_json::to_vec(self).map_err(CodecError::new)
//!     }
//!
//!     fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
//!         serde_json::from_slice(bytes).map_err(CodecError::new)
//!     }
//! }
//! ```

use thiserror::Error;

/// Failure of a payload codec, carrying the codec's own message.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct CodecError(String);

impl CodecError {
    /// Wraps any displayable codec failure.
    pub fn new(reason: impl ToString) -> Self {
        Self(reason.to_string())
    }
}

/// A unit of work that can round-trip through bytes.
///
/// Implementors own both directions of the codec; the queue never interprets
/// the bytes it stores.
pub trait Payload: Send + Sync + Sized + 'static {
    /// Encodes the payload into its stored byte representation.
    fn to_bytes(&self) -> Result<Vec<u8>, CodecError>;

    /// Decodes a payload from its stored byte representation.
    fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError>;
}

impl Payload for Vec<u8> {
    fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        Ok(self.clone())
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(bytes.to_vec())
    }
}

impl Payload for String {
    fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        Ok(self.as_bytes().to_vec())
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        String::from_utf8(bytes.to_vec()).map_err(CodecError::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_round_trip() {
        let s = "payload-7".to_string();
        let bytes = s.to_bytes().unwrap();
        assert_eq!(String::from_bytes(&bytes).unwrap(), s);
    }

    #[test]
    fn string_rejects_invalid_utf8() {
        assert!(String::from_bytes(&[0xff, 0xfe]).is_err());
    }
}
