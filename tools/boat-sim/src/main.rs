// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! boat-sim - Run the boat simulator nodes.
//!
//! Usage:
//!   boat-sim --config config/globals.yaml
//!   boat-sim --config config/globals.yaml --enable-data-collection true
//!   boat-sim --config config/globals.yaml --no-actuator --log-level debug

use anyhow::Context as _;
use boat_sim_core::constants::{nodes, DATA_COLLECTION_CLI_ARG_NAME};
use boat_sim_core::{Context, Node, NodeCallbacks, ParameterStore, ShutdownHandle};
use boat_sim_physics::{ActuatorConfig, PhysicsEngineNode, RudderActuatorNode};
use boat_sim_recording::{DataCollectionConfig, DataCollectionNode};
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "boat-sim")]
#[command(about = "Run the boat simulator nodes")]
#[command(version)]
struct Args {
    /// Globals parameter file (ROS-style YAML)
    #[arg(short, long, default_value = "config/globals.yaml")]
    config: PathBuf,

    /// Start the data collection node
    #[arg(long, action = ArgAction::Set, default_value_t = false, value_name = "BOOL")]
    enable_data_collection: bool,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Do not start the simulated rudder actuator
    #[arg(long)]
    no_actuator: bool,
}

/// A node spinning on its own thread.
struct RunningNode {
    name: String,
    shutdown: ShutdownHandle,
    thread: JoinHandle<()>,
}

fn spawn_node<C>(mut node: Node, mut callbacks: C) -> anyhow::Result<RunningNode>
where
    C: NodeCallbacks + Send + 'static,
{
    let name = node.name().to_string();
    let shutdown = node.shutdown_handle();
    let thread = thread::Builder::new()
        .name(name.clone())
        .spawn(move || node.spin(&mut callbacks))
        .with_context(|| format!("Failed to spawn thread for {}", name))?;

    info!("Started {}", name);
    Ok(RunningNode {
        name,
        shutdown,
        thread,
    })
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Boat Simulator v{}", env!("CARGO_PKG_VERSION"));
    info!("Config: {}", args.config.display());

    let params = ParameterStore::from_file(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    let context = Context::with_parameters(params);

    let mut running_nodes = Vec::new();

    if args.no_actuator {
        info!("Rudder actuator disabled");
    } else {
        let mut node = Node::new(&context, nodes::RUDDER_ACTUATOR)?;
        let actuator = RudderActuatorNode::new(&mut node, ActuatorConfig::default())
            .context("Failed to initialize rudder actuator")?;
        running_nodes.push(spawn_node(node, actuator)?);
    }

    if args.enable_data_collection {
        let mut node = Node::new(&context, nodes::DATA_COLLECTION)?;
        let config = DataCollectionConfig::from_node(&mut node)
            .context("Failed to read data collection parameters")?;
        let recorder =
            DataCollectionNode::new(&mut node, config).context("Failed to initialize data collection")?;
        running_nodes.push(spawn_node(node, recorder)?);
    } else {
        info!(
            "Data collection disabled (pass {} true to enable)",
            DATA_COLLECTION_CLI_ARG_NAME
        );
    }

    let mut node = Node::new(&context, nodes::PHYSICS_ENGINE)?;
    let engine = PhysicsEngineNode::new(&mut node).context("Failed to initialize physics engine")?;
    running_nodes.push(spawn_node(node, engine)?);

    info!("Simulation running. Press Ctrl+C to stop.");

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    while running.load(Ordering::SeqCst) {
        if running_nodes.iter().any(|n| n.thread.is_finished()) {
            error!("A node stopped unexpectedly, shutting down");
            break;
        }
        thread::sleep(Duration::from_millis(100));
    }

    info!("Shutting down...");
    for node in &running_nodes {
        node.shutdown.request();
    }
    for node in running_nodes {
        if node.thread.join().is_err() {
            error!("{} panicked", node.name);
        }
    }

    info!("Done");
    Ok(())
}
