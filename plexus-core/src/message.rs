//! Messages and the message FIFO queue.
//!
//! A [`Message`] is the unit the application hands to the producer: a
//! payload, an optional key, and the partition the application asked for
//! (or unassigned, letting the partitioner choose). A [`MessageQueue`] is
//! a FIFO with message and byte accounting; every structural operation
//! conserves both counts except an explicit [`MessageQueue::purge`].

use std::collections::VecDeque;

use bytes::Bytes;

use crate::PartitionSel;

/// A message awaiting transmission or delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    payload: Bytes,
    key: Option<Bytes>,
    partition: PartitionSel,
}

impl Message {
    /// Creates a message with no key and no requested partition.
    #[must_use]
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            key: None,
            partition: PartitionSel::Unassigned,
        }
    }

    /// Sets the message key, used by key-hashing partitioners.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<Bytes>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Requests a specific target partition.
    #[must_use]
    pub const fn with_partition(mut self, partition: PartitionSel) -> Self {
        self.partition = partition;
        self
    }

    /// Returns the payload bytes.
    #[must_use]
    pub const fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Returns the key bytes, if any.
    #[must_use]
    pub fn key(&self) -> Option<&[u8]> {
        self.key.as_deref()
    }

    /// Returns the requested partition.
    #[must_use]
    pub const fn partition(&self) -> PartitionSel {
        self.partition
    }

    /// Returns the accounted size: payload plus key bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.payload.len() + self.key.as_ref().map_or(0, Bytes::len)
    }
}

/// FIFO queue of messages with message and byte accounting.
#[derive(Debug, Default)]
pub struct MessageQueue {
    msgs: VecDeque<Message>,
    bytes: u64,
}

impl MessageQueue {
    /// Creates an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            msgs: VecDeque::new(),
            bytes: 0,
        }
    }

    /// Returns the number of queued messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.msgs.len()
    }

    /// Returns the accounted byte total of queued messages.
    #[must_use]
    pub const fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Returns true if the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.msgs.is_empty()
    }

    /// Appends a message at the tail.
    pub fn push_back(&mut self, msg: Message) {
        self.bytes += msg.size() as u64;
        self.msgs.push_back(msg);
    }

    /// Inserts a message at the head.
    pub fn push_front(&mut self, msg: Message) {
        self.bytes += msg.size() as u64;
        self.msgs.push_front(msg);
    }

    /// Removes and returns the head message.
    pub fn pop_front(&mut self) -> Option<Message> {
        let msg = self.msgs.pop_front()?;
        self.bytes -= msg.size() as u64;
        Some(msg)
    }

    /// Appends all of `other`'s messages at the tail, draining `other`.
    pub fn concat(&mut self, other: &mut Self) {
        self.bytes += other.bytes;
        self.msgs.append(&mut other.msgs);
        other.bytes = 0;
    }

    /// Splices all of `other`'s messages in front of this queue's,
    /// draining `other`. Relative order within each queue is preserved.
    pub fn prepend(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
        self.concat(other);
    }

    /// Replaces this queue's contents with `other`'s, draining `other`.
    ///
    /// # Panics
    ///
    /// Panics if this queue is not empty; a move must not discard
    /// messages.
    pub fn move_from(&mut self, other: &mut Self) {
        assert!(self.is_empty(), "move destination queue must be empty");
        std::mem::swap(self, other);
    }

    /// Drops every queued message, returning how many were discarded.
    pub fn purge(&mut self) -> usize {
        let count = self.msgs.len();
        self.msgs.clear();
        self.bytes = 0;
        count
    }

    /// Iterates the queued messages from head to tail.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.msgs.iter()
    }

    /// Removes and returns every queued message, head first.
    pub fn drain(&mut self) -> impl Iterator<Item = Message> {
        self.bytes = 0;
        std::mem::take(&mut self.msgs).into_iter()
    }
}
