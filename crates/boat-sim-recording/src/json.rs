// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Periodic JSON snapshots.
//!
//! The file is a single JSON array. Each element maps the snapshot index to
//! the latest sample of every topic plus the elapsed time:
//!
//! ```text
//! [
//! {
//!     "0": {
//!         "gps": { ... },
//!         "wind_sensors": { ... },
//!         "time": 0.0
//!     }
//! },
//! {
//!     "1": { ... }
//! }
//! ]
//! ```

use serde::Serialize;
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// File extension of snapshot files.
pub const JSON_EXTENSION: &str = "json";

/// Key of the elapsed time in every snapshot; not usable as a topic name.
pub const TIME_KEY: &str = "time";

/// Writer for the JSON snapshot array.
pub struct JsonLogWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    period_sec: f64,
    latest: Map<String, Value>,
    index: u64,
}

impl JsonLogWriter {
    /// Create the file and open the array. An existing file is replaced.
    ///
    /// A topic named [`TIME_KEY`] is ignored.
    pub fn create<P: AsRef<Path>>(path: P, topics: &[String], period_sec: f64) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if path.exists() {
            log::warn!(
                "JSON file {} already exists. Overriding old file...",
                path.display()
            );
            fs::remove_file(&path)?;
        }

        let mut writer = BufWriter::new(File::create(&path)?);
        writer.write_all(b"[\n")?;

        let latest = topics
            .iter()
            .filter(|topic| topic.as_str() != TIME_KEY)
            .map(|topic| (topic.clone(), Value::Null))
            .collect();

        Ok(Self {
            path,
            writer,
            period_sec,
            latest,
            index: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of snapshots written.
    pub fn entries_written(&self) -> u64 {
        self.index
    }

    /// Store the latest sample of `topic`. Unknown topics are ignored.
    pub fn update(&mut self, topic: &str, value: Value) {
        if let Some(slot) = self.latest.get_mut(topic) {
            *slot = value;
        }
    }

    /// Whether every topic has received a sample.
    pub fn is_ready(&self) -> bool {
        self.latest.values().all(|value| !value.is_null())
    }

    /// Append a snapshot if every topic has data. Returns whether one was written.
    pub fn write_entry(&mut self) -> io::Result<bool> {
        if !self.is_ready() {
            return Ok(false);
        }

        let mut snapshot = self.latest.clone();
        snapshot.insert(
            TIME_KEY.to_string(),
            Value::from(self.index as f64 * self.period_sec),
        );
        let mut entry = Map::new();
        entry.insert(self.index.to_string(), Value::Object(snapshot));

        if self.index > 0 {
            self.writer.write_all(b",\n")?;
        }
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut self.writer, formatter);
        Value::Object(entry)
            .serialize(&mut ser)
            .map_err(io::Error::from)?;
        self.writer.flush()?;

        self.index += 1;
        Ok(true)
    }

    /// Close the array and flush.
    pub fn finish(mut self) -> io::Result<PathBuf> {
        self.writer.write_all(b"\n]")?;
        self.writer.flush()?;
        Ok(self.path)
    }
}
