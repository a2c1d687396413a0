//! Cross-module scenarios: topic lifecycle, metadata-driven resizes,
//! leader migration, unassigned re-partitioning, and teardown.

use std::sync::Arc;

use plexus_client::{Client, Partitioner, TopicConfig};
use plexus_core::{BrokerId, Message, PartitionSel};

fn msg(payload: &str) -> Message {
    Message::new(payload.as_bytes().to_vec())
}

fn partition(client: &Arc<Client>, name: &str, idx: i32) -> Arc<plexus_client::Partition> {
    client
        .topic_find(name)
        .unwrap()
        .read()
        .partition(PartitionSel::Real(idx), false)
        .unwrap()
}

fn drain_payloads(partition: &plexus_client::Partition) -> Vec<String> {
    let mut payloads = Vec::new();
    while let Some(msg) = partition.dequeue() {
        payloads.push(String::from_utf8(msg.payload().to_vec()).unwrap());
    }
    payloads
}

fn total_pending(client: &Arc<Client>, name: &str) -> usize {
    let topic = client.topic_find(name).unwrap();
    let topology = topic.read();
    let mut total = topology.unassigned().map_or(0, |ua| ua.msg_count());
    for idx in 0..topology.partition_count() {
        total += topology
            .partition(PartitionSel::Real(idx), false)
            .unwrap()
            .msg_count();
    }
    total
}

/// A partitioner that refuses messages with a designated key and sends
/// everything else to partition 0.
struct RefusingPartitioner;

impl Partitioner for RefusingPartitioner {
    fn partition(&self, key: Option<&[u8]>, _partition_cnt: i32) -> i32 {
        if key == Some(b"fail") {
            -1
        } else {
            0
        }
    }
}

#[test]
fn grow_adopts_desired_partition() {
    let (client, _queries) = Client::new();
    let topic = client.topic_create("t", TopicConfig::default()).unwrap();

    let p3 = {
        let mut topology = topic.write();
        topic.desired_add(&mut topology, 3)
    };
    assert!(p3.is_desired() && p3.is_unknown());

    assert!(client.partition_count_update("t", 4).unwrap());

    let topology = topic.read();
    let adopted = topology.partition(PartitionSel::Real(3), false).unwrap();
    assert!(Arc::ptr_eq(&adopted, &p3));
    assert!(p3.is_desired());
    assert!(!p3.is_unknown());
    assert_eq!(topology.desired_count(), 0);
    topology.check_invariants();
}

#[test]
fn shrink_preserves_messages_in_source_order() {
    let (client, _queries) = Client::new();
    client.topic_create("t", TopicConfig::default()).unwrap();
    client.partition_count_update("t", 4).unwrap();

    let spread = [
        (0, vec!["m0", "m1", "m2"]),
        (1, vec!["m3", "m4", "m5"]),
        (2, vec!["m6"]),
        (3, vec!["m7", "m8", "m9"]),
    ];
    for (idx, payloads) in &spread {
        let p = partition(&client, "t", *idx);
        for payload in payloads {
            p.enqueue(msg(payload));
        }
    }

    let p2 = partition(&client, "t", 2);
    let p3 = partition(&client, "t", 3);
    let watch_p2 = Arc::downgrade(&p2);
    let watch_p3 = Arc::downgrade(&p3);
    drop(p2);
    drop(p3);

    assert!(client.partition_count_update("t", 2).unwrap());

    let topic = client.topic_find("t").unwrap();
    let topology = topic.read();
    assert_eq!(topology.partition_count(), 2);

    // Dropped partitions concatenate onto the unassigned tail in index
    // order, each in FIFO order.
    let ua = topology.unassigned().unwrap();
    assert_eq!(drain_payloads(&ua), vec!["m6", "m7", "m8", "m9"]);

    // Survivors are untouched.
    let p0 = topology.partition(PartitionSel::Real(0), false).unwrap();
    assert_eq!(drain_payloads(&p0), vec!["m0", "m1", "m2"]);

    // The topology's references to the dropped partitions are gone.
    drop(topology);
    assert_eq!(watch_p2.strong_count(), 0);
    assert_eq!(watch_p3.strong_count(), 0);
}

#[test]
fn messages_survive_resize_cycles() {
    let (client, _queries) = Client::new();
    let config = TopicConfig {
        partitioner: Some(Arc::new(plexus_client::KeyHashPartitioner)),
        ..TopicConfig::default()
    };
    let topic = client.topic_create("t", config).unwrap();
    client.partition_count_update("t", 4).unwrap();

    for i in 0..20 {
        let payload = format!("m{i}");
        let key = format!("k{i}");
        topic.enqueue(msg(&payload).with_key(key.into_bytes())).unwrap();
    }
    assert_eq!(total_pending(&client, "t"), 20);

    for count in [2, 4, 1, 3] {
        client.partition_count_update("t", count).unwrap();
        assert_eq!(total_pending(&client, "t"), 20);
        client.topic_find("t").unwrap().read().check_invariants();
    }
}

#[test]
fn leader_migration_moves_partition_between_brokers() {
    let (client, _queries) = Client::new();
    client.topic_create("t", TopicConfig::default()).unwrap();
    client.partition_count_update("t", 1).unwrap();
    let b7 = client.broker_add(BrokerId::new(7), "kafka-7");
    let b9 = client.broker_add(BrokerId::new(9), "kafka-9");

    client.topic_update("t", 0, BrokerId::new(7)).unwrap();
    client.topic_update("t", 0, BrokerId::new(9)).unwrap();

    let p0 = partition(&client, "t", 0);
    assert!(!b7.contains(&p0));
    assert_eq!(b7.toppar_count(), 0);
    assert!(b9.contains(&p0));
    assert_eq!(b9.toppar_count(), 1);
    assert_eq!(
        b9.toppars()
            .iter()
            .filter(|p| Arc::ptr_eq(p, &p0))
            .count(),
        1
    );
    assert_eq!(p0.leader().unwrap().nodeid(), BrokerId::new(9));
}

#[test]
fn leader_lost_undelegates_and_requeries_once() {
    let (client, queries) = Client::new();
    client.topic_create("t", TopicConfig::default()).unwrap();
    client.partition_count_update("t", 1).unwrap();
    let b7 = client.broker_add(BrokerId::new(7), "kafka-7");
    client.topic_update("t", 0, BrokerId::new(7)).unwrap();
    let _ = queries.try_iter().count();

    client.topic_update("t", 0, BrokerId::NONE).unwrap();

    let p0 = partition(&client, "t", 0);
    assert!(p0.leader().is_none());
    assert_eq!(b7.toppar_count(), 0);
    assert_eq!(queries.try_iter().count(), 1);
}

#[test]
fn undelegate_then_delegate_equals_direct_delegate() {
    let (client, _queries) = Client::new();
    let topic = client.topic_create("t", TopicConfig::default()).unwrap();
    client.partition_count_update("t", 1).unwrap();
    let b7 = client.broker_add(BrokerId::new(7), "kafka-7");
    let p0 = partition(&client, "t", 0);

    {
        let mut topology = topic.write();
        p0.delegate(&mut topology, None);
        p0.delegate(&mut topology, Some(&b7));
    }

    assert!(b7.contains(&p0));
    assert_eq!(b7.toppar_count(), 1);
    let leader = p0.leader().unwrap();
    assert!(Arc::ptr_eq(&leader, &b7));
}

#[test]
fn failed_repartitioning_returns_to_ua_head() {
    let (client, _queries) = Client::new();
    let config = TopicConfig {
        partitioner: Some(Arc::new(RefusingPartitioner)),
        ..TopicConfig::default()
    };
    let topic = client.topic_create("t", config).unwrap();

    // No metadata yet: everything parks on the unassigned slot.
    topic.enqueue(msg("m1").with_key("ok")).unwrap();
    topic.enqueue(msg("m2").with_key("fail")).unwrap();
    topic.enqueue(msg("m3").with_key("ok")).unwrap();
    topic.enqueue(msg("m4").with_key("fail")).unwrap();
    topic.enqueue(msg("m5").with_key("ok")).unwrap();
    assert_eq!(topic.read().unassigned().unwrap().msg_count(), 5);

    client.partition_count_update("t", 2).unwrap();
    client.assign_unassigned("t").unwrap();

    // The refused messages sit at the head of the unassigned queue in
    // their original relative order; the rest reached partition 0.
    let topology = topic.read();
    let ua = topology.unassigned().unwrap();
    assert_eq!(ua.msg_count(), 2);
    let p0 = topology.partition(PartitionSel::Real(0), false).unwrap();
    assert_eq!(p0.msg_count(), 3);
    drop(topology);

    // Re-running with unchanged availability is idempotent.
    client.assign_unassigned("t").unwrap();
    let topology = topic.read();
    let ua = topology.unassigned().unwrap();
    assert_eq!(drain_payloads(&ua), vec!["m2", "m4"]);
    let p0 = topology.partition(PartitionSel::Real(0), false).unwrap();
    assert_eq!(drain_payloads(&p0), vec!["m1", "m3", "m5"]);
}

#[test]
fn terminate_releases_every_reference() {
    let (client, _queries) = Client::new();
    let topic = client.topic_create("t", TopicConfig::default()).unwrap();
    client.partition_count_update("t", 2).unwrap();
    let b7 = client.broker_add(BrokerId::new(7), "kafka-7");
    client.topic_update("t", 0, BrokerId::new(7)).unwrap();
    client.topic_update("t", 1, BrokerId::new(7)).unwrap();
    topic.enqueue(msg("pending")).unwrap();

    let watch_topic = Arc::downgrade(&topic);
    let watch_p0 = Arc::downgrade(&partition(&client, "t", 0));

    client.terminate();
    assert_eq!(b7.toppar_count(), 0);

    drop(topic);
    assert_eq!(watch_p0.strong_count(), 0);
    assert_eq!(watch_topic.strong_count(), 0);
    assert!(client.topic_find("t").is_none());
}

#[test]
fn concurrent_producers_and_resizes_conserve_messages() {
    let (client, _queries) = Client::new();
    let config = TopicConfig {
        partitioner: Some(Arc::new(plexus_client::KeyHashPartitioner)),
        ..TopicConfig::default()
    };
    let topic = client.topic_create("t", config).unwrap();
    client.partition_count_update("t", 4).unwrap();

    const PRODUCERS: usize = 4;
    const PER_PRODUCER: usize = 250;

    std::thread::scope(|scope| {
        for producer in 0..PRODUCERS {
            let topic = Arc::clone(&topic);
            scope.spawn(move || {
                for i in 0..PER_PRODUCER {
                    let payload = format!("p{producer}-{i}");
                    let key = format!("k{producer}-{i}");
                    topic
                        .enqueue(Message::new(payload.into_bytes()).with_key(key.into_bytes()))
                        .unwrap();
                }
            });
        }

        let client = Arc::clone(&client);
        scope.spawn(move || {
            for count in [2, 5, 1, 3, 4, 2, 6, 4] {
                client.partition_count_update("t", count).unwrap();
            }
        });
    });

    assert_eq!(total_pending(&client, "t"), PRODUCERS * PER_PRODUCER);
    client.topic_find("t").unwrap().read().check_invariants();
}
