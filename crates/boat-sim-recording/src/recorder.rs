// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Data collection node.
//!
//! Subscribes to the configured topics, keeps the latest sample of each for
//! the JSON snapshots and appends every sample to the bag.

use crate::config::DataCollectionConfig;
use crate::format::{BagMetadata, BagWriter, FormatError, BAG_EXTENSION};
use crate::json::{JsonLogWriter, JSON_EXTENSION};
use boat_sim_core::node::period_from_secs;
use boat_sim_core::{msg, Context, Node, NodeCallbacks, NodeError, Sample, SubscriptionId, TimerId};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Recorder errors.
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    #[error("Node error: {0}")]
    Node(#[from] NodeError),
}

/// Recording statistics.
#[derive(Debug, Clone, Default)]
pub struct RecordingStats {
    /// Samples received on recorded topics.
    pub messages_received: u64,

    /// Samples appended to the bag.
    pub bag_messages: u64,

    /// Snapshots appended to the JSON file.
    pub json_entries: u64,

    /// Samples whose payload could not be decoded for the snapshots.
    pub decode_errors: u64,

    pub duration_secs: f64,
}

/// Node recording topics to JSON snapshots and a bag.
pub struct DataCollectionNode {
    config: DataCollectionConfig,
    topics: HashMap<SubscriptionId, String>,
    json: Option<JsonLogWriter>,
    bag: Option<BagWriter>,
    write_timer: Option<TimerId>,
    started: Instant,
    stats: RecordingStats,
}

impl DataCollectionNode {
    /// Subscribe to the configured topics and open the output files.
    ///
    /// If an output cannot be opened, the outputs opened before it are
    /// closed so that no file is left unterminated.
    pub fn new(node: &mut Node, config: DataCollectionConfig) -> Result<Self, RecorderError> {
        let write_period = if config.json {
            Some(period_from_secs(config.write_period_sec)?)
        } else {
            None
        };

        log::debug!("Initializing subscriptions...");
        let mut topics = HashMap::new();
        for spec in &config.topics {
            let id = node.create_raw_subscription(&spec.name, &spec.type_name, config.qos_depth)?;
            topics.insert(id, spec.name.clone());
        }

        let mut recorder = Self {
            config,
            topics,
            json: None,
            bag: None,
            write_timer: None,
            started: Instant::now(),
            stats: RecordingStats::default(),
        };

        if let Err(e) = recorder.open_outputs(node, write_period) {
            if let Err(close_err) = recorder.close() {
                log::warn!("Failed to close partially opened outputs: {}", close_err);
            }
            return Err(e);
        }

        log::info!(
            "Recording {} topic(s) (json: {}, bag: {})",
            recorder.topics.len(),
            recorder.config.json,
            recorder.config.bag
        );
        Ok(recorder)
    }

    fn open_outputs(&mut self, node: &mut Node, write_period: Option<Duration>) -> Result<(), RecorderError> {
        if self.config.bag {
            log::debug!("Initializing bag...");
            let writer = self.bag.insert(BagWriter::create(
                self.config.output_path(BAG_EXTENSION),
                BagMetadata::new(node.name()),
            )?);
            for spec in &self.config.topics {
                writer.register_topic(&spec.name, &spec.type_name, msg::SERIALIZATION_FORMAT)?;
            }
        }

        if let Some(period) = write_period {
            log::debug!("Initializing json file...");
            let names: Vec<String> = self.config.topics.iter().map(|t| t.name.clone()).collect();
            self.json = Some(JsonLogWriter::create(
                self.config.output_path(JSON_EXTENSION),
                &names,
                self.config.write_period_sec,
            )?);
            self.write_timer = Some(node.create_timer(period)?);
        }
        Ok(())
    }

    pub fn config(&self) -> &DataCollectionConfig {
        &self.config
    }

    pub fn stats(&self) -> &RecordingStats {
        &self.stats
    }

    pub fn is_recording(&self) -> bool {
        self.json.is_some() || self.bag.is_some()
    }

    /// Record one received sample.
    pub fn record(&mut self, sample: &Sample) {
        self.stats.messages_received += 1;

        if let Some(json) = self.json.as_mut() {
            match msg::decode_value(&sample.payload) {
                Ok(value) => json.update(&sample.topic, value),
                Err(e) => {
                    self.stats.decode_errors += 1;
                    log::warn!("Could not decode sample on '{}': {}", sample.topic, e);
                }
            }
        }

        if let Some(bag) = self.bag.as_mut() {
            match bag.write(
                &sample.topic,
                sample.sequence_number,
                Context::now_nanos(),
                &sample.payload,
            ) {
                Ok(()) => self.stats.bag_messages += 1,
                Err(e) => log::error!("Failed to write sample on '{}' to bag: {}", sample.topic, e),
            }
        }
    }

    /// Append a JSON snapshot if every topic has data.
    pub fn write_snapshot(&mut self) {
        let Some(json) = self.json.as_mut() else {
            return;
        };
        match json.write_entry() {
            Ok(true) => self.stats.json_entries += 1,
            Ok(false) => {}
            Err(e) => log::error!("Failed to write to {}: {}", json.path().display(), e),
        }
    }

    /// Close the JSON array and finalize the bag. Further calls do nothing.
    pub fn close(&mut self) -> Result<RecordingStats, RecorderError> {
        if let Some(json) = self.json.take() {
            let path = json.finish()?;
            log::debug!("Closed {}", path.display());
        }
        if let Some(bag) = self.bag.take() {
            let metadata = bag.finalize()?;
            log::debug!(
                "Finalized bag with {} topic(s)",
                metadata.topics.len()
            );
        }
        self.stats.duration_secs = self.started.elapsed().as_secs_f64();
        Ok(self.stats.clone())
    }
}

impl NodeCallbacks for DataCollectionNode {
    fn on_timer(&mut self, _node: &Node, timer: TimerId) {
        if Some(timer) == self.write_timer {
            self.write_snapshot();
        }
    }

    fn on_message(&mut self, _node: &Node, subscription: SubscriptionId, sample: Sample) {
        if self.topics.contains_key(&subscription) {
            self.record(&sample);
        }
    }

    fn on_shutdown(&mut self, node: &Node) {
        log::debug!("[{}] Closing the storage files...", node.name());
        match self.close() {
            Ok(stats) => log::info!(
                "[{}] Recorded {} samples ({} snapshots) in {:.1}s",
                node.name(),
                stats.messages_received,
                stats.json_entries,
                stats.duration_secs
            ),
            Err(e) => log::error!("[{}] Failed to close storage files: {}", node.name(), e),
        }
    }
}
