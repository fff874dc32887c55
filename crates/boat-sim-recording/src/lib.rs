// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Boat simulator data collection
//!
//! Records bus topics to periodic JSON snapshots and to a binary bag file.
//!
//! # Recording
//!
//! ```rust,no_run
//! use boat_sim_core::{Context, Node, ParameterStore};
//! use boat_sim_recording::{DataCollectionConfig, DataCollectionNode};
//!
//! let context = Context::with_parameters(ParameterStore::from_file("config/globals.yaml")?);
//! let mut node = Node::new(&context, "data_collection_node")?;
//! let config = DataCollectionConfig::from_node(&mut node)?;
//! let mut recorder = DataCollectionNode::new(&mut node, config)?;
//! node.spin(&mut recorder);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Reading a bag
//!
//! ```rust,no_run
//! use boat_sim_recording::BagReader;
//!
//! let reader = BagReader::open("sim_data.bag")?;
//! for msg in reader.messages() {
//!     let msg = msg?;
//!     println!("{} {} {}", msg.timestamp_nanos, msg.topic, msg.payload.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod format;
pub mod json;
pub mod recorder;

pub use config::{parse_topics, DataCollectionConfig, TopicSpec};
pub use format::{BagMessage, BagMetadata, BagReader, BagWriter, FormatError, TopicInfo};
pub use json::JsonLogWriter;
pub use recorder::{DataCollectionNode, RecorderError, RecordingStats};
