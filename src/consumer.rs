//! # Consumer contract.
//!
//! [`Consumer`] is the one-method capability the unloading engine drains a
//! queue into. The engine does not know *why* a consumption failed — every
//! error results in a requeue plus backoff, never in engine termination.
//!
//! The payload is passed by reference so that the engine keeps ownership for
//! the requeue path.
//!
//! # Example
//! ```
//! use async_trait::async_trait;
//! use persistq::{ConsumeError, Consumer};
//!
//! struct Printer;
//!
//! #[async_trait]
//! impl Consumer<String> for Printer {
//!     async fn consume(&self, payload: &String) -> Result<(), ConsumeError> {
//!         println!("{payload}");
//!         Ok(())
//!     }
//! }
//! ```

use async_trait::async_trait;
use thiserror::Error;

use crate::codec::Payload;

/// Failure of a single consumption attempt.
///
/// Opaque to the engine; the message is carried into logs and events.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct ConsumeError(String);

impl ConsumeError {
    /// Wraps any displayable consumption failure.
    pub fn new(reason: impl ToString) -> Self {
        Self(reason.to_string())
    }
}

impl From<&str> for ConsumeError {
    fn from(reason: &str) -> Self {
        Self(reason.to_string())
    }
}

impl From<String> for ConsumeError {
    fn from(reason: String) -> Self {
        Self(reason)
    }
}

/// Sink for unloaded payloads.
///
/// Implementations may be slow (network calls, disk writes); the engine
/// bounds how many consumptions are in flight via its worker pool.
#[async_trait]
pub trait Consumer<P: Payload>: Send + Sync + 'static {
    /// Processes one payload. An `Err` causes the payload to be re-pushed
    /// onto the tail of the queue under a fresh key.
    async fn consume(&self, payload: &P) -> Result<(), ConsumeError>;
}
