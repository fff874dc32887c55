// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! boat-sim-bag - Inspect a recorded bag.
//!
//! Usage:
//!   boat-sim-bag --input sim_data.bag
//!   boat-sim-bag --input sim_data.bag --dump --topic gps

use boat_sim_core::msg;
use boat_sim_recording::BagReader;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "boat-sim-bag")]
#[command(about = "Inspect a recorded boat simulator bag")]
#[command(version)]
struct Args {
    /// Input bag file (.bag)
    #[arg(short, long)]
    input: PathBuf,

    /// Print every message as JSON
    #[arg(long)]
    dump: bool,

    /// Only dump messages of this topic
    #[arg(short, long)]
    topic: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup logging
    let filter = args.log_level.parse().unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(false)
        .init();

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let reader = BagReader::open(&args.input)?;
    let meta = reader.metadata();

    info!("Input: {}", args.input.display());
    info!("  Start time: {}", meta.start_time);
    if let Some(ref end) = meta.end_time {
        info!("  End time: {}", end);
    }
    info!("  Recorder: {} (v{})", meta.recorder, meta.version);
    if let Some(ref desc) = meta.description {
        info!("  Description: {}", desc);
    }
    info!("  Topics: {}", meta.topics.len());
    for topic in &meta.topics {
        info!(
            "    - {} ({}, {}) - {} messages",
            topic.name, topic.type_name, topic.serialization_format, topic.message_count
        );
    }
    info!("Total messages: {}", reader.message_count());
    info!(
        "Recording duration: {:.1}s",
        reader.duration_nanos() as f64 / 1e9
    );

    if !args.dump {
        return Ok(());
    }

    for message in reader.messages() {
        let message = message?;
        if args.topic.as_deref().is_some_and(|t| t != message.topic) {
            continue;
        }
        let value = msg::decode_value(&message.payload)?;
        println!(
            "{} [{}] #{} {}",
            message.timestamp_nanos,
            message.topic,
            message.sequence_number,
            serde_json::to_string(&value)?
        );
    }

    Ok(())
}
