//! Retry wait policies.
//!
//! This module holds the knobs that control **how long** the dispatch loop
//! sleeps between consecutive failed consumptions.
//!
//! ## Contents
//! - [`WaitStrategy`] fixed / incrementing / exponential delay growth
//!
//! ## Quick wiring
//! ```text
//! UnloaderConfig { wait: WaitStrategy, ... }
//!      └─► engine::dispatch loop uses:
//!           - wait.delay_for(consecutive_failures) before re-dispatching
//! ```
//!
//! ## Defaults
//! - `WaitStrategy::default()` → incrementing: first 5ms, +100ms per failure,
//!   capped at 5s.

mod wait;

pub use wait::WaitStrategy;
