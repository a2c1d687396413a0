//! Plexus Core - shared types for the Plexus Kafka client.
//!
//! This crate provides the types shared between the client's routing core
//! and its collaborators: strongly-typed identifiers, the Kafka-protocol
//! topic name string, and the message type with its FIFO queue primitive.
//!
//! # Design Principles
//!
//! - **Strongly-typed identifiers**: a broker id cannot be confused with a
//!   partition index, and the unassigned-partition sentinel is a tagged
//!   value rather than a magic number
//! - **Wire sentinels stay at the wire**: `-1` appears only in the
//!   conversion functions
//! - **Conserved accounting**: every queue operation preserves message and
//!   byte counts except an explicit purge
//! - **No unsafe code**

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod message;
mod name;
mod types;

pub use message::{Message, MessageQueue};
pub use name::{TopicName, TOPIC_NAME_LEN_MAX};
pub use types::{BrokerId, PartitionSel, PARTITION_UA};
