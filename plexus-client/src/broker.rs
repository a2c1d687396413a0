//! Broker objects and the partition membership list.
//!
//! The routing core does not own broker connections; it owns the
//! delegation link. Each partition is delegated to at most one broker, and
//! a broker's partition list mirrors exactly the partitions whose leader
//! cell points back at it. Both sides of the pairing change together under
//! this list's write lock (see [`crate::Partition::delegate`]).

use std::sync::Arc;

use parking_lot::RwLock;
use plexus_core::BrokerId;

use crate::partition::Partition;

/// A broker known from cluster metadata.
pub struct Broker {
    nodeid: BrokerId,
    name: String,
    toppars: RwLock<Vec<Arc<Partition>>>,
}

impl Broker {
    pub(crate) fn new(nodeid: BrokerId, name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            nodeid,
            name: name.into(),
            toppars: RwLock::new(Vec::new()),
        })
    }

    /// Returns the broker node id.
    #[must_use]
    pub fn nodeid(&self) -> BrokerId {
        self.nodeid
    }

    /// Returns the broker's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of partitions delegated to this broker.
    #[must_use]
    pub fn toppar_count(&self) -> usize {
        self.toppars.read().len()
    }

    /// Returns a snapshot of the partitions delegated to this broker.
    #[must_use]
    pub fn toppars(&self) -> Vec<Arc<Partition>> {
        self.toppars.read().clone()
    }

    /// Returns true if `partition` is currently delegated to this broker.
    #[must_use]
    pub fn contains(&self, partition: &Arc<Partition>) -> bool {
        self.toppars
            .read()
            .iter()
            .any(|p| Arc::ptr_eq(p, partition))
    }

    /// Links a partition into this broker's list, taking a reference on
    /// its behalf. Called by delegation with the partition's topic write
    /// lock held.
    pub(crate) fn link(&self, partition: Arc<Partition>) {
        let mut toppars = self.toppars.write();
        debug_assert!(
            !toppars.iter().any(|p| Arc::ptr_eq(p, &partition)),
            "partition already delegated to this broker"
        );
        toppars.push(partition);
    }

    /// Unlinks a partition from this broker's list, dropping the
    /// reference held on its behalf. Called by delegation with the
    /// partition's topic write lock held.
    pub(crate) fn unlink(&self, partition: &Arc<Partition>) {
        self.toppars.write().retain(|p| !Arc::ptr_eq(p, partition));
    }
}
