//! # Unloader configuration.
//!
//! Provides [`UnloaderConfig`] and its builder, the only way to construct a
//! [`QueueUnloader`](crate::QueueUnloader).
//!
//! A consumer is mandatory; everything else has a default:
//! - `workers = 1` (single in-flight consumption, strict FIFO completion)
//! - `wait = WaitStrategy::default()` (incrementing 5ms + 100ms, capped 5s)
//! - `grace = 10s` (shutdown wait for the loop and for in-flight work)
//! - `bus_capacity = 1024`
//! - `subscribers = []`

use std::sync::Arc;
use std::time::Duration;

use crate::codec::Payload;
use crate::consumer::Consumer;
use crate::error::ConfigError;
use crate::policies::WaitStrategy;
use crate::subscribers::Subscribe;

/// Validated configuration for a [`QueueUnloader`](crate::QueueUnloader).
///
/// Built via [`UnloaderConfig::builder`]; construction fails when no
/// consumer is set or when `workers` is zero.
pub struct UnloaderConfig<P: Payload> {
    /// Handler invoked for each dequeued payload.
    pub consumer: Arc<dyn Consumer<P>>,

    /// Maximum number of payloads consumed concurrently.
    ///
    /// With `1` the queue drains strictly one payload at a time; higher
    /// values trade FIFO completion order for throughput (dispatch order
    /// stays FIFO).
    pub workers: usize,

    /// Delay schedule applied after consecutive consumption failures.
    pub wait: WaitStrategy,

    /// Maximum wait for the dispatch loop and in-flight consumptions to
    /// finish during [`stop`](crate::QueueUnloader::stop).
    pub grace: Duration,

    /// Capacity of the event bus broadcast ring buffer (min 1, clamped by
    /// the bus).
    pub bus_capacity: usize,

    /// Subscribers receiving lifecycle events.
    pub subscribers: Vec<Arc<dyn Subscribe>>,
}

impl<P: Payload> UnloaderConfig<P> {
    /// Starts building a configuration.
    pub fn builder() -> UnloaderConfigBuilder<P> {
        UnloaderConfigBuilder::new()
    }
}

/// Builder for [`UnloaderConfig`].
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// use persistq::{Consumer, ConsumeError, UnloaderConfig, WaitStrategy};
///
/// struct Printer;
///
/// #[async_trait::async_trait]
/// impl Consumer<String> for Printer {
///     async fn consume(&self, payload: &String) -> Result<(), ConsumeError> {
///         println!("{payload}");
///         Ok(())
///     }
/// }
///
/// # fn main() -> Result<(), persistq::ConfigError> {
/// let cfg = UnloaderConfig::builder()
///     .consumer(Printer)
///     .workers(4)
///     .wait(WaitStrategy::fixed(Duration::from_millis(50)))
///     .grace(Duration::from_secs(5))
///     .build()?;
/// # let _ = cfg;
/// # Ok(())
/// # }
/// ```
pub struct UnloaderConfigBuilder<P: Payload> {
    consumer: Option<Arc<dyn Consumer<P>>>,
    workers: usize,
    wait: WaitStrategy,
    grace: Duration,
    bus_capacity: usize,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl<P: Payload> UnloaderConfigBuilder<P> {
    fn new() -> Self {
        Self {
            consumer: None,
            workers: 1,
            wait: WaitStrategy::default(),
            grace: Duration::from_secs(10),
            bus_capacity: 1024,
            subscribers: Vec::new(),
        }
    }

    /// Sets the consumer. Required.
    pub fn consumer<C: Consumer<P>>(mut self, consumer: C) -> Self {
        self.consumer = Some(Arc::new(consumer));
        self
    }

    /// Sets an already-shared consumer. Required (this or [`consumer`](Self::consumer)).
    pub fn consumer_arc(mut self, consumer: Arc<dyn Consumer<P>>) -> Self {
        self.consumer = Some(consumer);
        self
    }

    /// Sets the concurrent-consumption cap. Must be at least 1.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the failure backoff schedule.
    pub fn wait(mut self, wait: WaitStrategy) -> Self {
        self.wait = wait;
        self
    }

    /// Sets the shutdown grace window.
    pub fn grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Sets the event bus capacity.
    pub fn bus_capacity(mut self, capacity: usize) -> Self {
        self.bus_capacity = capacity;
        self
    }

    /// Adds a lifecycle event subscriber.
    pub fn subscriber(mut self, sub: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(sub);
        self
    }

    /// Validates and produces the configuration.
    pub fn build(self) -> Result<UnloaderConfig<P>, ConfigError> {
        let consumer = self.consumer.ok_or(ConfigError::MissingConsumer)?;
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(UnloaderConfig {
            consumer,
            workers: self.workers,
            wait: self.wait,
            grace: self.grace,
            bus_capacity: self.bus_capacity,
            subscribers: self.subscribers,
        })
    }
}
