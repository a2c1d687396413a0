//! Topic configuration and partitioners.
//!
//! A [`TopicConfig`] is snapshotted into the topic at creation and never
//! mutated afterwards. Timeouts are stored here but consumed by the broker
//! subsystem; the routing core only validates them.
//!
//! Partitioners choose a partition index for a message. The routing layer,
//! not the partitioner, decides availability: a choice outside
//! `[0, partition_cnt)` parks the message on the unassigned slot.

use std::fmt;
use std::sync::Arc;

use murmur2::{murmur2, KAFKA_SEED};
use rand::Rng;

use crate::error::{Error, Result};

/// Default message timeout: how long a message may wait for delivery.
pub const MESSAGE_TIMEOUT_MS_DEFAULT: i32 = 300_000;

/// Default request timeout for broker requests.
pub const REQUEST_TIMEOUT_MS_DEFAULT: i32 = 30_000;

/// Partition selection strategy.
///
/// Implementations are called with `partition_cnt > 0` and should return
/// an index in `[0, partition_cnt)`. Any value outside that range tells
/// the routing layer the requested placement is currently unavailable.
pub trait Partitioner: Send + Sync {
    /// Chooses a partition for a message with the given key.
    fn partition(&self, key: Option<&[u8]>, partition_cnt: i32) -> i32;
}

/// Uniform random partitioner; the default when none is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPartitioner;

impl Partitioner for RandomPartitioner {
    fn partition(&self, _key: Option<&[u8]>, partition_cnt: i32) -> i32 {
        rand::thread_rng().gen_range(0..partition_cnt)
    }
}

/// Kafka-compatible key-hash partitioner.
///
/// Keyed messages hash with murmur2 and the Kafka seed, matching
/// `Utils.toPositive(Utils.murmur2(key)) % numPartitions`; keyless
/// messages fall back to a uniform random choice.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyHashPartitioner;

impl Partitioner for KeyHashPartitioner {
    fn partition(&self, key: Option<&[u8]>, partition_cnt: i32) -> i32 {
        match key {
            #[allow(clippy::cast_possible_wrap)] // Sign bit masked off.
            Some(key) => (murmur2(key, KAFKA_SEED) & 0x7fff_ffff) as i32 % partition_cnt,
            None => rand::thread_rng().gen_range(0..partition_cnt),
        }
    }
}

/// Per-topic configuration snapshot.
#[derive(Clone)]
pub struct TopicConfig {
    /// How long a message may wait for delivery, in milliseconds.
    /// Consumed by the broker subsystem. Must be positive.
    pub message_timeout_ms: i32,
    /// Broker request timeout in milliseconds. Consumed by the broker
    /// subsystem. Must be positive.
    pub request_timeout_ms: i32,
    /// Partition selection strategy; `None` selects the uniform random
    /// partitioner.
    pub partitioner: Option<Arc<dyn Partitioner>>,
}

impl TopicConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if either timeout is not
    /// positive.
    pub fn validate(&self) -> Result<()> {
        if self.message_timeout_ms <= 0 {
            return Err(Error::InvalidConfig {
                reason: "message_timeout_ms must be > 0",
            });
        }
        if self.request_timeout_ms <= 0 {
            return Err(Error::InvalidConfig {
                reason: "request_timeout_ms must be > 0",
            });
        }
        Ok(())
    }

    /// Returns the configured partitioner, or the default random one.
    #[must_use]
    pub fn partitioner(&self) -> Arc<dyn Partitioner> {
        self.partitioner
            .clone()
            .unwrap_or_else(|| Arc::new(RandomPartitioner))
    }
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            message_timeout_ms: MESSAGE_TIMEOUT_MS_DEFAULT,
            request_timeout_ms: REQUEST_TIMEOUT_MS_DEFAULT,
            partitioner: None,
        }
    }
}

impl fmt::Debug for TopicConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopicConfig")
            .field("message_timeout_ms", &self.message_timeout_ms)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field(
                "partitioner",
                &if self.partitioner.is_some() {
                    "custom"
                } else {
                    "default"
                },
            )
            .finish()
    }
}
