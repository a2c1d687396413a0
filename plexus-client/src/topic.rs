//! Topic objects.
//!
//! A [`Topic`] owns the partition topology: the dense partition array, the
//! desired list (partitions the application wants but metadata has not
//! confirmed), and the distinguished unassigned slot that parks messages
//! whose target partition is not yet resolvable.
//!
//! # Locking
//!
//! The whole topology sits behind one reader/writer lock. Operations that
//! require the topic lock take the guard's target ([`Topology`]) as a
//! parameter, so call sites cannot invent their own lock order. Lock order
//! across the system is client registry, then topic, then partition, then
//! broker partition list.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use plexus_core::{Message, MessageQueue, PartitionSel, TopicName};

use crate::client::Client;
use crate::config::{Partitioner, TopicConfig};
use crate::error::{Error, Result};
use crate::partition::Partition;

/// The partition topology of a topic, guarded by the topic lock.
pub struct Topology {
    pub(crate) partitions: Vec<Arc<Partition>>,
    pub(crate) desired: Vec<Arc<Partition>>,
    pub(crate) ua: Option<Arc<Partition>>,
}

impl Topology {
    /// Returns the number of known partitions.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // Counts come from the i32 wire field.
    #[allow(clippy::cast_possible_wrap)]
    pub fn partition_count(&self) -> i32 {
        self.partitions.len() as i32
    }

    /// Looks up a partition.
    ///
    /// A concrete selector in range returns the array entry; anything
    /// else returns the unassigned slot when `ua_on_miss` is set, or
    /// nothing.
    #[must_use]
    #[allow(clippy::cast_sign_loss)] // Index checked non-negative first.
    pub fn partition(&self, sel: PartitionSel, ua_on_miss: bool) -> Option<Arc<Partition>> {
        if let Some(idx) = sel.index() {
            if idx >= 0 && idx < self.partition_count() {
                return self.partitions.get(idx as usize).cloned();
            }
        }
        if ua_on_miss {
            self.ua.clone()
        } else {
            None
        }
    }

    /// Looks up a partition on the desired list.
    #[must_use]
    pub fn desired_get(&self, partition: i32) -> Option<Arc<Partition>> {
        self.desired
            .iter()
            .find(|p| p.id() == PartitionSel::Real(partition))
            .cloned()
    }

    /// Returns the number of partitions on the desired list.
    #[must_use]
    pub fn desired_count(&self) -> usize {
        self.desired.len()
    }

    /// Returns the unassigned slot, present until the topic is torn down.
    #[must_use]
    pub fn unassigned(&self) -> Option<Arc<Partition>> {
        self.ua.clone()
    }

    /// Asserts the structural invariants: the partition array is dense
    /// with matching ids and known entries, every desired-list entry
    /// carries both the desired and unknown flags, and the unassigned
    /// slot is unassigned.
    ///
    /// # Panics
    ///
    /// Panics on any violation.
    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::cast_possible_wrap)]
    pub fn check_invariants(&self) {
        for (idx, partition) in self.partitions.iter().enumerate() {
            assert_eq!(
                partition.id(),
                PartitionSel::Real(idx as i32),
                "partition array must be dense"
            );
            assert!(
                !partition.is_unknown(),
                "array partitions must not be marked unknown"
            );
        }
        for partition in &self.desired {
            assert!(
                partition.is_desired() && partition.is_unknown(),
                "desired-list partitions must be desired and unknown"
            );
        }
        if let Some(ua) = &self.ua {
            assert!(ua.id().is_unassigned(), "unassigned slot must be unassigned");
        }
    }
}

/// A named logical stream: a set of partitions sharing configuration.
///
/// Created through [`Client::topic_create`]; creating the same name twice
/// returns the same handle. A topic keeps its client alive; its partitions
/// keep the topic alive until [`Topic::remove_all_partitions`].
pub struct Topic {
    client: Arc<Client>,
    name: TopicName,
    config: TopicConfig,
    partitioner: Arc<dyn Partitioner>,
    topology: RwLock<Topology>,
}

impl Topic {
    pub(crate) fn new(client: Arc<Client>, name: TopicName, config: TopicConfig) -> Arc<Self> {
        let partitioner = config.partitioner();
        let topic = Arc::new(Self {
            client,
            name,
            config,
            partitioner,
            topology: RwLock::new(Topology {
                partitions: Vec::new(),
                desired: Vec::new(),
                ua: None,
            }),
        });
        let ua = Partition::new(Arc::clone(&topic), PartitionSel::Unassigned);
        topic.topology.write().ua = Some(ua);
        topic
    }

    /// Returns the topic name.
    #[must_use]
    pub fn name(&self) -> &TopicName {
        &self.name
    }

    /// Returns the configuration snapshot taken at creation.
    #[must_use]
    pub fn config(&self) -> &TopicConfig {
        &self.config
    }

    /// Returns the owning client.
    #[must_use]
    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    /// Acquires the topology for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, Topology> {
        self.topology.read()
    }

    /// Acquires the topology for writing.
    pub fn write(&self) -> RwLockWriteGuard<'_, Topology> {
        self.topology.write()
    }

    /// Marks `partition` as desired, creating it on the desired list if
    /// metadata has not reported it yet. Idempotent.
    pub fn desired_add(
        self: &Arc<Self>,
        topology: &mut Topology,
        partition: i32,
    ) -> Arc<Partition> {
        if let Some(existing) = topology.partition(PartitionSel::Real(partition), false) {
            existing.state().desired = true;
            tracing::debug!(
                target: "DESP",
                "setting topic {} [{partition}] partition as desired",
                self.name
            );
            return existing;
        }

        if let Some(existing) = topology.desired_get(partition) {
            return existing;
        }

        let created = Partition::new(Arc::clone(self), PartitionSel::Real(partition));
        {
            let mut state = created.state();
            state.desired = true;
            state.unknown = true;
        }
        tracing::debug!(target: "DESP", "adding desired topic {} [{partition}]", self.name);
        topology.desired.push(Arc::clone(&created));
        created
    }

    /// Clears `partition`'s desired mark; if metadata never reported it,
    /// it is unlinked from the desired list and the topology's reference
    /// dropped. Idempotent on partitions not marked desired.
    pub fn desired_remove(&self, topology: &mut Topology, partition: &Arc<Partition>) {
        {
            let mut state = partition.state();
            if !state.desired {
                return;
            }
            state.desired = false;
            if state.unknown {
                state.unknown = false;
                drop(state);
                topology.desired.retain(|p| !Arc::ptr_eq(p, partition));
            }
        }
        tracing::debug!(
            target: "DESP",
            "removing (un)desired topic {} [{}]",
            self.name,
            partition.id()
        );
    }

    /// Drains an external message queue onto the tail of the unassigned
    /// slot's pending queue.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoUnassignedPartition`] after teardown.
    pub fn ua_move_msgs(&self, queue: &mut MessageQueue) -> Result<()> {
        let ua = self.read().unassigned().ok_or_else(|| {
            Error::NoUnassignedPartition {
                name: self.name.as_str().to_owned(),
            }
        })?;
        ua.state().msgq.concat(queue);
        Ok(())
    }

    /// Routes a message through the partitioner and enqueues it. Messages
    /// whose target is not currently resolvable are parked on the
    /// unassigned slot and re-routed when metadata arrives.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoUnassignedPartition`] after teardown.
    pub fn enqueue(&self, msg: Message) -> Result<()> {
        let topology = self.read();
        match self.route(&topology, &msg) {
            Some(partition) => {
                partition.enqueue(msg);
                Ok(())
            }
            None => match topology.unassigned() {
                Some(ua) => {
                    ua.enqueue(msg);
                    Ok(())
                }
                None => Err(Error::NoUnassignedPartition {
                    name: self.name.as_str().to_owned(),
                }),
            },
        }
    }

    /// Re-runs the partitioner over every message parked on the
    /// unassigned slot. Messages whose target is still unavailable return
    /// to the head of the unassigned queue in their original relative
    /// order, so they are retried first next time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoUnassignedPartition`] after teardown.
    pub fn assign_unassigned(&self) -> Result<()> {
        let topology = self.read();
        let Some(ua) = topology.unassigned() else {
            tracing::debug!(
                target: "ASSIGNUA",
                "no unassigned partition available for {}",
                self.name
            );
            return Err(Error::NoUnassignedPartition {
                name: self.name.as_str().to_owned(),
            });
        };

        tracing::debug!(
            target: "PARTCNT",
            "partitioning {} unassigned messages in topic {} to {} partitions",
            ua.msg_count(),
            self.name,
            topology.partition_count()
        );

        let mut parked = MessageQueue::new();
        parked.move_from(&mut ua.state().msgq);
        let total = parked.len();

        let mut failed = MessageQueue::new();
        for msg in parked.drain() {
            match self.route(&topology, &msg) {
                Some(partition) => partition.enqueue(msg),
                None => failed.push_back(msg),
            }
        }

        tracing::debug!(
            target: "UAS",
            "{}/{total} messages were partitioned",
            total - failed.len()
        );

        if !failed.is_empty() {
            tracing::debug!(
                target: "UAS",
                "{}/{total} messages failed partitioning",
                failed.len()
            );
            ua.splice_head(&mut failed);
        }
        Ok(())
    }

    /// Purges every partition's pending queue, including the unassigned
    /// slot, and drops the topology's references to all of them. Part of
    /// client teardown; the topic keeps no partitions afterwards.
    pub fn remove_all_partitions(&self) {
        let mut topology = self.write();
        for partition in topology.partitions.drain(..) {
            partition.purge();
        }
        for partition in topology.desired.drain(..) {
            let mut state = partition.state();
            state.desired = false;
            state.unknown = false;
            state.msgq.purge();
        }
        if let Some(ua) = topology.ua.take() {
            ua.purge();
        }
    }

    /// Picks the target partition for a message, or nothing when the
    /// target is not currently resolvable: no metadata yet, a requested
    /// partition outside the known range, or a partitioner choice outside
    /// the known range.
    pub(crate) fn route(&self, topology: &Topology, msg: &Message) -> Option<Arc<Partition>> {
        let count = topology.partition_count();
        let target = match msg.partition() {
            PartitionSel::Real(partition) => partition,
            PartitionSel::Unassigned => {
                if count == 0 {
                    return None;
                }
                self.partitioner.partition(msg.key(), count)
            }
        };
        if target >= 0 && target < count {
            topology.partition(PartitionSel::Real(target), false)
        } else {
            None
        }
    }
}

impl Drop for Topic {
    fn drop(&mut self) {
        self.client.unregister_topic(self as *const Self);
    }
}
