// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Executor behaviour across threads: timers, delivery and shutdown.

use boat_sim_core::msg::{Gps, HelperSpeed};
use boat_sim_core::{Context, Node, NodeCallbacks, ParameterStore, ParameterType, Sample, SubscriptionId, TimerId};
use crossbeam::channel::{self, Sender};
use std::thread;
use std::time::{Duration, Instant};

enum Seen {
    Tick(TimerId),
    Speed(f32),
    Shutdown,
}

struct Forwarder {
    tx: Sender<Seen>,
}

impl NodeCallbacks for Forwarder {
    fn on_timer(&mut self, _node: &Node, timer: TimerId) {
        let _ = self.tx.send(Seen::Tick(timer));
    }

    fn on_message(&mut self, _node: &Node, _subscription: SubscriptionId, sample: Sample) {
        let gps: Gps = sample.decode().expect("decode");
        let _ = self.tx.send(Seen::Speed(gps.speed.speed));
    }

    fn on_shutdown(&mut self, _node: &Node) {
        let _ = self.tx.send(Seen::Shutdown);
    }
}

#[test]
fn test_spin_on_thread_until_shutdown() {
    let context = Context::new();
    let mut node = Node::new(&context, "worker").expect("node");
    node.create_subscription::<Gps>("gps", 10).expect("sub");
    let timer = node.create_timer(Duration::from_millis(20)).expect("timer");
    let shutdown = node.shutdown_handle();

    let (tx, rx) = channel::unbounded();
    let worker = thread::spawn(move || {
        let mut callbacks = Forwarder { tx };
        node.spin(&mut callbacks);
    });

    let publisher = {
        let node = Node::new(&context, "talker").expect("node");
        node.create_publisher::<Gps>("gps").expect("pub")
    };
    let mut gps = Gps::default();
    gps.speed = HelperSpeed { speed: 4.5 };
    assert_eq!(publisher.publish(&gps).expect("publish"), 1);

    thread::sleep(Duration::from_millis(110));
    shutdown.request();
    worker.join().expect("join");

    let seen: Vec<Seen> = rx.try_iter().collect();
    let ticks = seen
        .iter()
        .filter(|s| matches!(s, Seen::Tick(id) if *id == timer))
        .count();
    assert!(ticks >= 2, "expected periodic ticks, got {}", ticks);
    assert!(seen.iter().any(|s| matches!(s, Seen::Speed(v) if *v == 4.5)));
    assert!(matches!(seen.last(), Some(Seen::Shutdown)));
    assert_eq!(seen.iter().filter(|s| matches!(s, Seen::Shutdown)).count(), 1);
}

#[test]
fn test_timer_fires_after_period() {
    let context = Context::new();
    let mut node = Node::new(&context, "timed").expect("node");
    let timer = node.create_timer(Duration::from_millis(30)).expect("timer");

    let (tx, rx) = channel::unbounded();
    let mut callbacks = Forwarder { tx };

    let start = Instant::now();
    assert!(node.spin_once(&mut callbacks, Duration::from_millis(200)));
    assert!(start.elapsed() >= Duration::from_millis(25));
    assert!(matches!(rx.try_recv(), Ok(Seen::Tick(id)) if id == timer));
}

#[test]
fn test_declared_parameters_from_store() {
    let store = ParameterStore::from_yaml_str(
        r#"
/**:
  ros__parameters:
    pub_period_sec: 0.5
worker:
  ros__parameters:
    topics: ["gps", "GPS"]
    bag: false
"#,
    )
    .expect("parse");
    let context = Context::with_parameters(store);
    let mut node = Node::new(&context, "worker").expect("node");

    node.declare_parameters(&[
        ("pub_period_sec", ParameterType::Double),
        ("topics", ParameterType::StringArray),
        ("bag", ParameterType::Bool),
    ])
    .expect("declare");

    assert_eq!(node.get_f64("pub_period_sec").expect("f64"), 0.5);
    assert_eq!(node.get_string_array("topics").expect("array"), vec!["gps", "GPS"]);
    assert!(!node.get_bool("bag").expect("bool"));
    assert!(node.get_i64("bag").is_err());
    assert!(node.get_string("missing").is_err());
}
