//! # Engine: the unloading machinery.
//!
//! ```text
//! UnloaderConfig ──build()──► QueueUnloader ──start()──► dispatch loop
//!                                  │                         │
//!                                  │                    consume tasks
//!                                  └──stop()──► drain / cancel / close
//! ```
//!
//! - [`config`] holds [`UnloaderConfig`] and its builder.
//! - [`unloader`] owns lifecycle, shutdown, and event wiring.
//! - [`dispatch`] is the loop that moves payloads from queue to consumer.

pub mod config;
pub(crate) mod dispatch;
pub mod unloader;

pub use config::{UnloaderConfig, UnloaderConfigBuilder};
pub use unloader::{QueueUnloader, UnloaderState};
