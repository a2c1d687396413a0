//! Partition objects.
//!
//! A [`Partition`] is one shard of a topic: a pending message queue, a
//! transmit queue the broker I/O thread drains into, a fetch queue toward
//! the application, desired/unknown lifecycle flags, and an optional link
//! to the leader broker.
//!
//! # Locking
//!
//! Queue and flag state sits behind the partition mutex; the fetch queue
//! has its own lock so delivery never contends with produce. The leader
//! cell is written only while the owning topic's write lock is held
//! (delegation and teardown paths); broker threads read it briefly and
//! must re-read between operations.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use plexus_core::{Message, MessageQueue, PartitionSel};

use crate::broker::Broker;
use crate::topic::{Topic, Topology};

/// Fetch progress state for the consumer side of a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchState {
    /// Not fetching.
    #[default]
    None,
    /// Querying the starting offset.
    OffsetQuery,
    /// Waiting for the offset reply.
    OffsetWait,
    /// Actively fetching records.
    Active,
}

/// Mutable partition state guarded by the partition mutex.
pub(crate) struct PartitionState {
    /// The application has asked for this partition.
    pub(crate) desired: bool,
    /// This partition sits on the topic's desired list, not in the
    /// partition array. `unknown` implies `desired`.
    pub(crate) unknown: bool,
    /// Messages awaiting transmit.
    pub(crate) msgq: MessageQueue,
    /// Messages handed to the broker for transmit.
    pub(crate) xmit_msgq: MessageQueue,
    /// Consumer fetch progress.
    pub(crate) fetch_state: FetchState,
}

/// One (topic, partition) shard.
///
/// Shared ownership: the topic holds one reference per slot the partition
/// occupies (array, desired list, or the unassigned slot), the leader
/// broker holds one while delegated, and every lookup hands the caller a
/// clone. A partition keeps its parent topic alive.
pub struct Partition {
    topic: Arc<Topic>,
    id: PartitionSel,
    state: Mutex<PartitionState>,
    fetchq: Mutex<MessageQueue>,
    leader: Mutex<Option<Arc<Broker>>>,
}

impl Partition {
    pub(crate) fn new(topic: Arc<Topic>, id: PartitionSel) -> Arc<Self> {
        Arc::new(Self {
            topic,
            id,
            state: Mutex::new(PartitionState {
                desired: false,
                unknown: false,
                msgq: MessageQueue::new(),
                xmit_msgq: MessageQueue::new(),
                fetch_state: FetchState::None,
            }),
            fetchq: Mutex::new(MessageQueue::new()),
            leader: Mutex::new(None),
        })
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, PartitionState> {
        self.state.lock()
    }

    /// Returns this partition's selector.
    #[must_use]
    pub fn id(&self) -> PartitionSel {
        self.id
    }

    /// Returns the owning topic.
    #[must_use]
    pub fn topic(&self) -> &Arc<Topic> {
        &self.topic
    }

    /// Appends a message at the tail of the pending queue.
    pub fn enqueue(&self, msg: Message) {
        self.state.lock().msgq.push_back(msg);
    }

    /// Inserts a message at the head of the pending queue.
    pub fn enqueue_head(&self, msg: Message) {
        self.state.lock().msgq.push_front(msg);
    }

    /// Removes and returns the head of the pending queue.
    pub fn dequeue(&self) -> Option<Message> {
        self.state.lock().msgq.pop_front()
    }

    /// Splices an external queue in front of the pending queue, draining
    /// it. Used to return messages to the unassigned slot so they are
    /// retried first.
    pub fn splice_head(&self, queue: &mut MessageQueue) {
        self.state.lock().msgq.prepend(queue);
    }

    /// Appends all of `src`'s pending messages onto this queue's tail,
    /// draining `src`. The two partition locks are taken in sequence, not
    /// nested; shrink runs under the topic write lock so the pair cannot
    /// race.
    pub fn move_msgs_from(&self, src: &Self) {
        let mut moved = MessageQueue::new();
        {
            let mut state = src.state.lock();
            moved.move_from(&mut state.msgq);
        }
        self.state.lock().msgq.concat(&mut moved);
    }

    /// Moves every pending message onto the transmit queue tail. Broker
    /// I/O thread helper; returns how many messages were staged.
    pub fn stage_transmit(&self) -> usize {
        let mut state = self.state.lock();
        let staged = state.msgq.len();
        let mut pending = MessageQueue::new();
        pending.move_from(&mut state.msgq);
        state.xmit_msgq.concat(&mut pending);
        staged
    }

    /// Discards every pending message, returning how many were dropped.
    pub fn purge(&self) -> usize {
        self.state.lock().msgq.purge()
    }

    /// Delivers a fetched message toward the application.
    pub fn fetch_enqueue(&self, msg: Message) {
        self.fetchq.lock().push_back(msg);
    }

    /// Takes everything currently on the fetch queue.
    #[must_use]
    pub fn fetch_drain(&self) -> MessageQueue {
        let mut drained = MessageQueue::new();
        drained.move_from(&mut self.fetchq.lock());
        drained
    }

    /// Returns the number of messages waiting on the fetch queue.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetchq.lock().len()
    }

    /// Returns the number of pending messages.
    #[must_use]
    pub fn msg_count(&self) -> usize {
        self.state.lock().msgq.len()
    }

    /// Returns the pending queue's accounted byte total.
    #[must_use]
    pub fn msg_bytes(&self) -> u64 {
        self.state.lock().msgq.bytes()
    }

    /// Returns the number of messages staged for transmit.
    #[must_use]
    pub fn xmit_count(&self) -> usize {
        self.state.lock().xmit_msgq.len()
    }

    /// Returns true if the application has asked for this partition.
    #[must_use]
    pub fn is_desired(&self) -> bool {
        self.state.lock().desired
    }

    /// Returns true if this partition sits on the topic's desired list
    /// rather than in the partition array.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.state.lock().unknown
    }

    /// Returns the consumer fetch state.
    #[must_use]
    pub fn fetch_state(&self) -> FetchState {
        self.state.lock().fetch_state
    }

    /// Sets the consumer fetch state.
    pub fn set_fetch_state(&self, fetch_state: FetchState) {
        self.state.lock().fetch_state = fetch_state;
    }

    /// Returns the current leader broker, if delegated.
    #[must_use]
    pub fn leader(&self) -> Option<Arc<Broker>> {
        self.leader.lock().clone()
    }

    /// Delegates `new_leader` as leader for this partition, or undelegates
    /// with `None`.
    ///
    /// The partition is unlinked from the old leader's partition list and
    /// linked into the new one's; each side's reference is installed and
    /// removed together with the leader cell, so either both sides see the
    /// pairing or neither does. `_topology` witnesses that the caller
    /// holds the owning topic's write lock, which serializes all leader
    /// changes.
    pub fn delegate(self: &Arc<Self>, _topology: &mut Topology, new_leader: Option<&Arc<Broker>>) {
        let current = self.leader.lock().clone();
        let unchanged = match (&current, new_leader) {
            (Some(old), Some(new)) => Arc::ptr_eq(old, new),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return;
        }

        if let Some(old) = current {
            tracing::debug!(
                target: "BRKDELGT",
                "broker {} no longer leader for topic {} [{}]",
                old.name(),
                self.topic.name(),
                self.id
            );
            let mut leader = self.leader.lock();
            old.unlink(self);
            *leader = None;
        }

        if let Some(broker) = new_leader {
            tracing::debug!(
                target: "BRKDELGT",
                "broker {} is now leader for topic {} [{}] with {} messages ({} bytes) queued",
                broker.name(),
                self.topic.name(),
                self.id,
                self.msg_count(),
                self.msg_bytes()
            );
            let mut leader = self.leader.lock();
            broker.link(Arc::clone(self));
            *leader = Some(Arc::clone(broker));
        } else {
            tracing::debug!(
                target: "BRKDELGT",
                "no broker is leader for topic {} [{}]",
                self.topic.name(),
                self.id
            );
        }
    }
}
