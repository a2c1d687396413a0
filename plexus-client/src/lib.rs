//! Plexus Client - topic/partition metadata and routing core.
//!
//! This crate owns the in-memory model that maps a logical topic onto a
//! set of partitions, each with a leader broker assignment, a pending
//! message queue, and a desired/known lifecycle state. It sits between
//! three worlds: the application (topic handles, produce, consume), the
//! metadata subsystem (partition counts and leader reports), and the
//! broker subsystem (per-broker I/O threads draining partition queues).
//!
//! # Design
//!
//! - **Scoped shared ownership**: topics and partitions are `Arc`s; every
//!   lookup hands the caller its own reference
//! - **One lock order**: client registry, then topic, then partition,
//!   then broker partition list; write-lock contracts are encoded by
//!   passing the guard's target as a parameter
//! - **Paired delegation references**: a partition and its leader broker
//!   reference each other, installed and removed together, so either both
//!   sides see the pairing or neither does
//! - **Messages are conserved**: every structural migration preserves the
//!   message multiset except an explicit purge at teardown

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod broker;
mod client;
mod config;
mod error;
mod metadata;
mod partition;
mod topic;

pub use broker::Broker;
pub use client::Client;
pub use config::{
    KeyHashPartitioner, Partitioner, RandomPartitioner, TopicConfig, MESSAGE_TIMEOUT_MS_DEFAULT,
    REQUEST_TIMEOUT_MS_DEFAULT,
};
pub use error::{Error, Result};
pub use partition::{FetchState, Partition};
pub use topic::{Topic, Topology};
