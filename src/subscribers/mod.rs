//! Event subscribers for the unloading engine.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`]
//! fan-out, and the built-in [`LogWriter`] for handling events broadcast
//! through the [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   dispatch loop ── publish(Event) ──► Bus ──► unloader listener
//!                                                │
//!                                        SubscriberSet::emit(&Event)
//!                                          ┌────────┼────────┐
//!                                          ▼        ▼        ▼
//!                                      LogWriter  Metrics  Custom ...
//! ```
//!
//! Subscribers observe; they never influence dispatching. A slow or
//! panicking subscriber costs that subscriber events, nothing else.

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
