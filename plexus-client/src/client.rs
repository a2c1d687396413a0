//! The client registry.
//!
//! A [`Client`] is the process-local table of live topics and known
//! brokers. The topic table holds weak references: a topic unlinks itself
//! when its last strong reference drops, so the registry never keeps a
//! topic alive on its own (handles and partition slots do).

use std::sync::{Arc, Weak};

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use plexus_core::{BrokerId, TopicName, TOPIC_NAME_LEN_MAX};

use crate::broker::Broker;
use crate::config::TopicConfig;
use crate::error::{Error, Result};
use crate::topic::Topic;

/// Process-local client handle: topic registry, broker registry, and the
/// channel used to request asynchronous leader re-queries.
pub struct Client {
    topics: Mutex<Vec<(TopicName, Weak<Topic>)>>,
    brokers: Mutex<Vec<Arc<Broker>>>,
    leader_queries: Sender<TopicName>,
}

impl Client {
    /// Creates a client.
    ///
    /// The returned receiver is handed to the metadata subsystem; every
    /// message on it asks for a leader re-query of the named topic.
    #[must_use]
    pub fn new() -> (Arc<Self>, Receiver<TopicName>) {
        let (leader_queries, receiver) = unbounded();
        let client = Arc::new(Self {
            topics: Mutex::new(Vec::new()),
            brokers: Mutex::new(Vec::new()),
            leader_queries,
        });
        (client, receiver)
    }

    /// Creates a topic handle, or returns the existing one when the name
    /// is already registered. A new topic starts with no partitions, an
    /// unassigned slot, and one pending leader query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for an empty or over-long name or
    /// non-positive timeouts.
    pub fn topic_create(self: &Arc<Self>, name: &str, config: TopicConfig) -> Result<Arc<Topic>> {
        if name.is_empty() {
            return Err(Error::InvalidConfig {
                reason: "topic name is empty",
            });
        }
        if name.len() > TOPIC_NAME_LEN_MAX {
            return Err(Error::InvalidConfig {
                reason: "topic name exceeds wire length limit",
            });
        }
        config.validate()?;

        let name = TopicName::new(name);
        let topic = {
            let mut topics = self.topics.lock();
            topics.retain(|(_, weak)| weak.strong_count() > 0);
            if let Some(existing) = topics
                .iter()
                .filter(|(registered, _)| *registered == name)
                .find_map(|(_, weak)| weak.upgrade())
            {
                return Ok(existing);
            }

            let topic = Topic::new(Arc::clone(self), name.clone(), config);
            tracing::debug!(target: "TOPIC", "new local topic: {name}");
            topics.push((name.clone(), Arc::downgrade(&topic)));
            topic
        };

        self.leader_query(&name);
        Ok(topic)
    }

    /// Finds a live topic by name.
    #[must_use]
    pub fn topic_find(&self, name: &str) -> Option<Arc<Topic>> {
        self.topics
            .lock()
            .iter()
            .filter(|(registered, _)| registered.as_str() == name)
            .find_map(|(_, weak)| weak.upgrade())
    }

    /// Finds a live topic by Kafka-protocol wire bytes (the payload after
    /// the length field). Comparison is length plus content; wire strings
    /// carry no terminator.
    #[must_use]
    pub fn topic_find_wire(&self, payload: &[u8]) -> Option<Arc<Topic>> {
        self.topics
            .lock()
            .iter()
            .filter(|(registered, _)| registered.eq_wire(payload))
            .find_map(|(_, weak)| weak.upgrade())
    }

    /// Returns a snapshot of the live topics.
    #[must_use]
    pub fn topics(&self) -> Vec<Arc<Topic>> {
        self.topics
            .lock()
            .iter()
            .filter_map(|(_, weak)| weak.upgrade())
            .collect()
    }

    /// Registers a broker reported by metadata, or returns the existing
    /// handle for its node id.
    pub fn broker_add(&self, nodeid: BrokerId, name: impl Into<String>) -> Arc<Broker> {
        let mut brokers = self.brokers.lock();
        if let Some(existing) = brokers.iter().find(|b| b.nodeid() == nodeid) {
            return Arc::clone(existing);
        }
        let broker = Broker::new(nodeid, name);
        brokers.push(Arc::clone(&broker));
        broker
    }

    /// Finds a broker by node id. The "no broker" sentinel finds nothing.
    #[must_use]
    pub fn broker_find(&self, nodeid: BrokerId) -> Option<Arc<Broker>> {
        if nodeid.is_none() {
            return None;
        }
        self.brokers
            .lock()
            .iter()
            .find(|b| b.nodeid() == nodeid)
            .cloned()
    }

    /// Tears the client down: undelegates every broker's partitions,
    /// removes every topic's partitions, and clears the broker registry.
    ///
    /// The caller stops the metadata and broker I/O threads first. After
    /// this returns, dropping the remaining topic handles frees them.
    pub fn terminate(&self) {
        let brokers: Vec<Arc<Broker>> = self.brokers.lock().clone();
        for broker in &brokers {
            for partition in broker.toppars() {
                let topic = Arc::clone(partition.topic());
                let mut topology = topic.write();
                partition.delegate(&mut topology, None);
            }
        }

        for topic in self.topics() {
            topic.remove_all_partitions();
        }

        self.brokers.lock().clear();
    }

    /// Requests an asynchronous leader query for `name`. Fire and forget;
    /// a missing metadata subsystem is not an error.
    pub(crate) fn leader_query(&self, name: &TopicName) {
        let _ = self.leader_queries.send(name.clone());
    }

    pub(crate) fn unregister_topic(&self, topic: *const Topic) {
        self.topics
            .lock()
            .retain(|(_, weak)| !std::ptr::eq(weak.as_ptr(), topic));
    }
}
