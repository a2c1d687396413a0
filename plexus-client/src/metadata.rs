//! Metadata application.
//!
//! The metadata subsystem reports two kinds of facts: the leader broker
//! for an individual partition, and a topic's total partition count. This
//! module turns those facts into structural changes of the topic: leader
//! delegation, partition array grow/shrink, adoption of desired
//! partitions, and re-partitioning of parked unassigned messages.
//!
//! Facts about topics we do not hold locally are logged and ignored; a
//! leader that cannot be resolved locally undelegates the partition and
//! fires one asynchronous leader re-query.

use std::sync::Arc;

use plexus_core::{BrokerId, PartitionSel};

use crate::client::Client;
use crate::error::{Error, Result};
use crate::partition::Partition;

impl Client {
    /// Applies a per-partition leader report.
    ///
    /// An unresolvable leader (the wire sentinel, or a node id with no
    /// locally known broker) undelegates the partition and requests a
    /// metadata re-query. An unchanged leader is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTopic`] when the topic is not held locally.
    ///
    /// # Panics
    ///
    /// Panics if the reported partition is outside the known partition
    /// count; the metadata subsystem applies the count before the
    /// per-partition leaders.
    pub fn topic_update(&self, name: &str, partition: i32, leader: BrokerId) -> Result<()> {
        let Some(topic) = self.topic_find(name) else {
            tracing::debug!(target: "METADATA", "ignoring topic {name}: not found locally");
            return Err(Error::UnknownTopic {
                name: name.to_owned(),
            });
        };

        let broker = self.broker_find(leader);

        let mut topology = topic.write();
        let toppar = topology
            .partition(PartitionSel::Real(partition), false)
            .expect("metadata reported a partition outside the known partition count");

        if leader.is_none() {
            // Partition lost its leader.
            toppar.delegate(&mut topology, None);
            drop(topology);
            self.leader_query(topic.name());
            return Ok(());
        }

        let Some(broker) = broker else {
            tracing::info!(
                target: "TOPICBRK",
                "topic {name} [{partition}] migrated to unknown broker {leader}: \
                 requesting metadata update"
            );
            toppar.delegate(&mut topology, None);
            drop(topology);
            self.leader_query(topic.name());
            return Ok(());
        };

        if let Some(current) = toppar.leader() {
            if Arc::ptr_eq(&current, &broker) {
                tracing::debug!(
                    target: "TOPICUPD",
                    "no leader change for topic {name} [{partition}] with leader {leader}"
                );
                return Ok(());
            }
            tracing::debug!(
                target: "TOPICUPD",
                "topic {name} [{partition}] migrated from broker {} to {}",
                current.nodeid(),
                broker.nodeid()
            );
        }

        toppar.delegate(&mut topology, Some(&broker));
        Ok(())
    }

    /// Applies a topic partition-count report, growing or shrinking the
    /// partition array.
    ///
    /// Growth adopts matching desired-list partitions (clearing their
    /// unknown mark) and creates the rest. Shrink drains each obsolete
    /// partition's pending queue into the unassigned slot (or purges it
    /// when the slot is gone), re-links desired partitions onto the
    /// desired list, and drops the topology's references.
    ///
    /// Returns whether the count changed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTopic`] when the topic is not held locally.
    ///
    /// # Panics
    ///
    /// Panics on a negative partition count.
    #[allow(clippy::cast_sign_loss)] // Count asserted non-negative.
    pub fn partition_count_update(&self, name: &str, partition_cnt: i32) -> Result<bool> {
        assert!(partition_cnt >= 0, "partition count cannot be negative");

        let Some(topic) = self.topic_find(name) else {
            tracing::debug!(target: "METADATA", "ignore unknown topic {name}");
            return Err(Error::UnknownTopic {
                name: name.to_owned(),
            });
        };

        let mut topology = topic.write();
        let old_cnt = topology.partition_count();
        if old_cnt == partition_cnt {
            tracing::debug!(target: "PARTCNT", "no change in partition count for topic {name}");
            return Ok(false);
        }

        if old_cnt == 0 {
            tracing::debug!(
                target: "PARTCNT",
                "topic {name} partition count changed from {old_cnt} to {partition_cnt}"
            );
        } else {
            tracing::info!(
                target: "PARTCNT",
                "topic {name} partition count changed from {old_cnt} to {partition_cnt}"
            );
        }

        let old: Vec<Arc<Partition>> = std::mem::take(&mut topology.partitions);
        let mut partitions = Vec::with_capacity(partition_cnt as usize);

        for idx in 0..partition_cnt {
            if let Some(existing) = old.get(idx as usize) {
                partitions.push(Arc::clone(existing));
            } else if let Some(desired) = topology.desired_get(idx) {
                // The desired partition is now known; move it off the
                // desired list and into the array.
                desired.state().unknown = false;
                topology.desired.retain(|p| !Arc::ptr_eq(p, &desired));
                partitions.push(desired);
            } else {
                partitions.push(Partition::new(Arc::clone(&topic), PartitionSel::Real(idx)));
            }
        }

        let ua = topology.unassigned();
        for removed in old.iter().skip(partition_cnt as usize) {
            // The partition has gone away; keep its messages if we can.
            match &ua {
                Some(ua) => ua.move_msgs_from(removed),
                None => {
                    removed.purge();
                }
            }

            let mut state = removed.state();
            if state.desired {
                assert!(!state.unknown, "array partitions cannot be unknown");
                state.unknown = true;
                drop(state);
                topology.desired.push(Arc::clone(removed));
            }
        }

        // Dropping `old` here releases the topology's references to the
        // removed partitions.
        topology.partitions = partitions;
        topology.check_invariants();
        Ok(true)
    }

    /// Re-runs the partitioner over a topic's parked unassigned messages.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTopic`] when the topic is not held locally,
    /// or [`Error::NoUnassignedPartition`] after teardown.
    pub fn assign_unassigned(&self, name: &str) -> Result<()> {
        let Some(topic) = self.topic_find(name) else {
            tracing::debug!(target: "METADATA", "ignore unknown topic {name}");
            return Err(Error::UnknownTopic {
                name: name.to_owned(),
            });
        };
        topic.assign_unassigned()
    }
}
