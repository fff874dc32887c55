// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bag file layout (.bag)
//!
//! ```text
//! +---------------------------------------------------------+
//! |                    File Header (64 bytes)                |
//! |  Magic (8) | Version (4) | Flags (4) | MetaOffset (8)   |
//! |  MetaSize (4) | IndexOffset (8) | IndexCount (4)        |
//! |  MessageCount (8) | Duration (8) | ChunkCount (4) | (4) |
//! +---------------------------------------------------------+
//! |                    Chunk 0                               |
//! |  ChunkHeader (32) | Record[] | CRC32 (4)                |
//! +---------------------------------------------------------+
//! |                    ...                                   |
//! +---------------------------------------------------------+
//! |                    Index                                 |
//! |  IndexEntry[] (topic_id, chunk_id, chunk_offset, count) |
//! +---------------------------------------------------------+
//! |                    Metadata (JSON)                       |
//! +---------------------------------------------------------+
//! ```
//!
//! # Record
//!
//! ```text
//! | timestamp (8) | topic_id (2) | seq (8) | payload_len (4) | payload (var) |
//! ```
//!
//! `topic_id` is the position of the topic in the metadata topic list. All
//! integers are little endian. The header is written as a placeholder on
//! create and rewritten by [`BagWriter::finalize`].

use super::{BagMessage, BagMetadata, TopicInfo};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use thiserror::Error;

/// Magic bytes: "BOATBAG\0"
pub const MAGIC: [u8; 8] = *b"BOATBAG\0";

pub const FORMAT_VERSION: u32 = 1;

/// Records per chunk before the chunk is flushed.
pub const DEFAULT_CHUNK_CAPACITY: usize = 1000;

const RECORD_HEADER_SIZE: usize = 22;

/// File header (64 bytes, fixed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub magic: [u8; 8],
    pub version: u32,
    /// Reserved
    pub flags: u32,
    pub metadata_offset: u64,
    pub metadata_size: u32,
    pub index_offset: u64,
    pub index_count: u32,
    pub message_count: u64,
    pub duration_nanos: u64,
    pub chunk_count: u32,
    pub reserved: u32,
}

impl FileHeader {
    pub const SIZE: usize = 64;

    pub fn new() -> Self {
        Self {
            magic: MAGIC,
            version: FORMAT_VERSION,
            flags: 0,
            metadata_offset: 0,
            metadata_size: 0,
            index_offset: 0,
            index_count: 0,
            message_count: 0,
            duration_nanos: 0,
            chunk_count: 0,
            reserved: 0,
        }
    }

    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.magic)?;
        w.write_u32::<LittleEndian>(self.version)?;
        w.write_u32::<LittleEndian>(self.flags)?;
        w.write_u64::<LittleEndian>(self.metadata_offset)?;
        w.write_u32::<LittleEndian>(self.metadata_size)?;
        w.write_u64::<LittleEndian>(self.index_offset)?;
        w.write_u32::<LittleEndian>(self.index_count)?;
        w.write_u64::<LittleEndian>(self.message_count)?;
        w.write_u64::<LittleEndian>(self.duration_nanos)?;
        w.write_u32::<LittleEndian>(self.chunk_count)?;
        w.write_u32::<LittleEndian>(self.reserved)?;
        Ok(())
    }

    pub fn read<R: Read>(r: &mut R) -> Result<Self, FormatError> {
        let mut magic = [0u8; 8];
        r.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(FormatError::InvalidFormat("bad magic".to_string()));
        }

        Ok(Self {
            magic,
            version: r.read_u32::<LittleEndian>()?,
            flags: r.read_u32::<LittleEndian>()?,
            metadata_offset: r.read_u64::<LittleEndian>()?,
            metadata_size: r.read_u32::<LittleEndian>()?,
            index_offset: r.read_u64::<LittleEndian>()?,
            index_count: r.read_u32::<LittleEndian>()?,
            message_count: r.read_u64::<LittleEndian>()?,
            duration_nanos: r.read_u64::<LittleEndian>()?,
            chunk_count: r.read_u32::<LittleEndian>()?,
            reserved: r.read_u32::<LittleEndian>()?,
        })
    }
}

impl Default for FileHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Chunk header (32 bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkHeader {
    pub chunk_id: u32,
    pub record_count: u32,
    /// Size of the record data following the header
    pub data_size: u32,
    pub first_timestamp: u64,
    pub last_timestamp: u64,
    pub reserved: u32,
}

impl ChunkHeader {
    pub const SIZE: usize = 32;

    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u32::<LittleEndian>(self.chunk_id)?;
        w.write_u32::<LittleEndian>(self.record_count)?;
        w.write_u32::<LittleEndian>(self.data_size)?;
        w.write_u64::<LittleEndian>(self.first_timestamp)?;
        w.write_u64::<LittleEndian>(self.last_timestamp)?;
        w.write_u32::<LittleEndian>(self.reserved)?;
        Ok(())
    }

    pub fn read<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Self {
            chunk_id: r.read_u32::<LittleEndian>()?,
            record_count: r.read_u32::<LittleEndian>()?,
            data_size: r.read_u32::<LittleEndian>()?,
            first_timestamp: r.read_u64::<LittleEndian>()?,
            last_timestamp: r.read_u64::<LittleEndian>()?,
            reserved: r.read_u32::<LittleEndian>()?,
        })
    }
}

/// Number of records of one topic in one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub topic_id: u16,
    pub chunk_id: u32,
    /// File offset of the chunk header
    pub chunk_offset: u64,
    pub count: u32,
}

impl IndexEntry {
    pub const SIZE: usize = 20;

    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u16::<LittleEndian>(self.topic_id)?;
        w.write_u16::<LittleEndian>(0)?;
        w.write_u32::<LittleEndian>(self.chunk_id)?;
        w.write_u64::<LittleEndian>(self.chunk_offset)?;
        w.write_u32::<LittleEndian>(self.count)?;
        Ok(())
    }

    pub fn read<R: Read>(r: &mut R) -> io::Result<Self> {
        let topic_id = r.read_u16::<LittleEndian>()?;
        let _reserved = r.read_u16::<LittleEndian>()?;
        Ok(Self {
            topic_id,
            chunk_id: r.read_u32::<LittleEndian>()?,
            chunk_offset: r.read_u64::<LittleEndian>()?,
            count: r.read_u32::<LittleEndian>()?,
        })
    }
}

/// Bag format errors.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid bag file: {0}")]
    InvalidFormat(String),

    #[error("Version mismatch: expected {expected}, got {got}")]
    VersionMismatch { expected: u32, got: u32 },

    #[error("CRC mismatch in chunk {chunk_id}")]
    CrcMismatch { chunk_id: u32 },

    #[error("Bag was not finalized")]
    NotFinalized,

    #[error("Topic '{0}' is not registered")]
    UnknownTopic(String),

    #[error("Topic '{topic}' already registered with type {registered}")]
    TopicConflict { topic: String, registered: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Bag file writer.
pub struct BagWriter {
    writer: BufWriter<File>,
    header: FileHeader,
    metadata: BagMetadata,
    topic_ids: HashMap<String, u16>,
    chunk_capacity: usize,

    // Current chunk
    chunk_data: Vec<u8>,
    chunk_records: u32,
    chunk_first_timestamp: u64,
    chunk_last_timestamp: u64,
    chunk_topic_counts: BTreeMap<u16, u32>,
    chunk_id: u32,

    index: Vec<IndexEntry>,
    first_timestamp: Option<u64>,
    last_timestamp: u64,
    message_count: u64,
}

impl BagWriter {
    /// Create a bag, truncating any existing file.
    pub fn create<P: AsRef<Path>>(path: P, metadata: BagMetadata) -> Result<Self, FormatError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        // Placeholder, rewritten on finalize
        let header = FileHeader::new();
        header.write(&mut writer)?;

        let topic_ids = metadata
            .topics
            .iter()
            .enumerate()
            .map(|(id, t)| (t.name.clone(), id as u16))
            .collect();

        Ok(Self {
            writer,
            header,
            metadata,
            topic_ids,
            chunk_capacity: DEFAULT_CHUNK_CAPACITY,
            chunk_data: Vec::new(),
            chunk_records: 0,
            chunk_first_timestamp: 0,
            chunk_last_timestamp: 0,
            chunk_topic_counts: BTreeMap::new(),
            chunk_id: 0,
            index: Vec::new(),
            first_timestamp: None,
            last_timestamp: 0,
            message_count: 0,
        })
    }

    /// Set the number of records per chunk.
    pub fn with_chunk_capacity(mut self, capacity: usize) -> Self {
        self.chunk_capacity = capacity.max(1);
        self
    }

    /// Register a topic. Registering the same topic and type again is a no-op.
    pub fn register_topic(
        &mut self,
        name: &str,
        type_name: &str,
        serialization_format: &str,
    ) -> Result<u16, FormatError> {
        if let Some(&id) = self.topic_ids.get(name) {
            let registered = &self.metadata.topics[usize::from(id)].type_name;
            if registered != type_name {
                return Err(FormatError::TopicConflict {
                    topic: name.to_string(),
                    registered: registered.clone(),
                });
            }
            return Ok(id);
        }

        let id = u16::try_from(self.metadata.topics.len())
            .map_err(|_| FormatError::InvalidFormat("too many topics".to_string()))?;
        self.metadata.topics.push(TopicInfo {
            name: name.to_string(),
            type_name: type_name.to_string(),
            serialization_format: serialization_format.to_string(),
            message_count: 0,
        });
        self.topic_ids.insert(name.to_string(), id);
        Ok(id)
    }

    /// Append a sample of a registered topic.
    pub fn write(
        &mut self,
        topic: &str,
        sequence_number: u64,
        timestamp_nanos: u64,
        payload: &[u8],
    ) -> Result<(), FormatError> {
        let topic_id = *self
            .topic_ids
            .get(topic)
            .ok_or_else(|| FormatError::UnknownTopic(topic.to_string()))?;

        if self.chunk_records == 0 {
            self.chunk_first_timestamp = timestamp_nanos;
        }
        self.chunk_last_timestamp = timestamp_nanos;

        self.chunk_data.reserve(RECORD_HEADER_SIZE + payload.len());
        self.chunk_data.write_u64::<LittleEndian>(timestamp_nanos)?;
        self.chunk_data.write_u16::<LittleEndian>(topic_id)?;
        self.chunk_data.write_u64::<LittleEndian>(sequence_number)?;
        self.chunk_data.write_u32::<LittleEndian>(payload.len() as u32)?;
        self.chunk_data.extend_from_slice(payload);

        self.chunk_records += 1;
        *self.chunk_topic_counts.entry(topic_id).or_default() += 1;
        self.metadata.topics[usize::from(topic_id)].message_count += 1;

        self.first_timestamp.get_or_insert(timestamp_nanos);
        self.last_timestamp = timestamp_nanos;
        self.message_count += 1;

        if self.chunk_records as usize >= self.chunk_capacity {
            self.flush_chunk()?;
        }
        Ok(())
    }

    pub fn message_count(&self) -> u64 {
        self.message_count
    }

    pub fn metadata(&self) -> &BagMetadata {
        &self.metadata
    }

    fn flush_chunk(&mut self) -> Result<(), FormatError> {
        if self.chunk_records == 0 {
            return Ok(());
        }

        let chunk_offset = self.writer.stream_position()?;
        let chunk_header = ChunkHeader {
            chunk_id: self.chunk_id,
            record_count: self.chunk_records,
            data_size: self.chunk_data.len() as u32,
            first_timestamp: self.chunk_first_timestamp,
            last_timestamp: self.chunk_last_timestamp,
            reserved: 0,
        };
        chunk_header.write(&mut self.writer)?;
        self.writer.write_all(&self.chunk_data)?;
        self.writer
            .write_u32::<LittleEndian>(crc32fast::hash(&self.chunk_data))?;

        for (&topic_id, &count) in &self.chunk_topic_counts {
            self.index.push(IndexEntry {
                topic_id,
                chunk_id: self.chunk_id,
                chunk_offset,
                count,
            });
        }

        self.chunk_data.clear();
        self.chunk_records = 0;
        self.chunk_topic_counts.clear();
        self.chunk_id += 1;
        Ok(())
    }

    /// Flush the last chunk, write index and metadata, rewrite the header.
    pub fn finalize(mut self) -> Result<BagMetadata, FormatError> {
        self.flush_chunk()?;

        let index_offset = self.writer.stream_position()?;
        for entry in &self.index {
            entry.write(&mut self.writer)?;
        }

        self.metadata.end_time = Some(chrono::Utc::now().to_rfc3339());
        let metadata_offset = self.writer.stream_position()?;
        let metadata_json = serde_json::to_vec(&self.metadata)?;
        self.writer.write_all(&metadata_json)?;

        self.header.metadata_offset = metadata_offset;
        self.header.metadata_size = metadata_json.len() as u32;
        self.header.index_offset = index_offset;
        self.header.index_count = self.index.len() as u32;
        self.header.message_count = self.message_count;
        self.header.duration_nanos = self
            .last_timestamp
            .saturating_sub(self.first_timestamp.unwrap_or(self.last_timestamp));
        self.header.chunk_count = self.chunk_id;

        self.writer.seek(SeekFrom::Start(0))?;
        self.header.write(&mut self.writer)?;
        self.writer.flush()?;

        Ok(self.metadata)
    }
}

/// Bag file reader.
pub struct BagReader {
    reader: BufReader<File>,
    header: FileHeader,
    metadata: BagMetadata,
    index: Vec<IndexEntry>,
    pending: VecDeque<BagMessage>,
    chunks_read: u32,
}

impl BagReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FormatError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let header = FileHeader::read(&mut reader)?;
        if header.version != FORMAT_VERSION {
            return Err(FormatError::VersionMismatch {
                expected: FORMAT_VERSION,
                got: header.version,
            });
        }
        if header.metadata_size == 0 {
            return Err(FormatError::NotFinalized);
        }

        reader.seek(SeekFrom::Start(header.metadata_offset))?;
        let mut meta_buf = vec![0u8; header.metadata_size as usize];
        reader.read_exact(&mut meta_buf)?;
        let metadata: BagMetadata = serde_json::from_slice(&meta_buf)?;

        reader.seek(SeekFrom::Start(header.index_offset))?;
        let index = (0..header.index_count)
            .map(|_| IndexEntry::read(&mut reader))
            .collect::<io::Result<Vec<_>>>()?;

        reader.seek(SeekFrom::Start(FileHeader::SIZE as u64))?;

        Ok(Self {
            reader,
            header,
            metadata,
            index,
            pending: VecDeque::new(),
            chunks_read: 0,
        })
    }

    pub fn metadata(&self) -> &BagMetadata {
        &self.metadata
    }

    pub fn index(&self) -> &[IndexEntry] {
        &self.index
    }

    pub fn message_count(&self) -> u64 {
        self.header.message_count
    }

    pub fn duration_nanos(&self) -> u64 {
        self.header.duration_nanos
    }

    /// Messages recorded on `topic`, from the index.
    pub fn topic_message_count(&self, topic: &str) -> u64 {
        let Some(id) = self.metadata.topics.iter().position(|t| t.name == topic) else {
            return 0;
        };
        self.index
            .iter()
            .filter(|e| usize::from(e.topic_id) == id)
            .map(|e| u64::from(e.count))
            .sum()
    }

    /// Read the next message in recording order.
    pub fn read_message(&mut self) -> Result<Option<BagMessage>, FormatError> {
        if self.pending.is_empty() {
            if self.chunks_read >= self.header.chunk_count {
                return Ok(None);
            }
            self.read_chunk()?;
        }
        Ok(self.pending.pop_front())
    }

    fn read_chunk(&mut self) -> Result<(), FormatError> {
        let chunk = ChunkHeader::read(&mut self.reader)?;
        let mut data = vec![0u8; chunk.data_size as usize];
        self.reader.read_exact(&mut data)?;
        let crc = self.reader.read_u32::<LittleEndian>()?;
        if crc != crc32fast::hash(&data) {
            return Err(FormatError::CrcMismatch {
                chunk_id: chunk.chunk_id,
            });
        }

        let mut cursor = io::Cursor::new(data.as_slice());
        for _ in 0..chunk.record_count {
            let message = self.read_record(&mut cursor)?;
            self.pending.push_back(message);
        }
        self.chunks_read += 1;
        Ok(())
    }

    fn read_record<R: Read>(&self, r: &mut R) -> Result<BagMessage, FormatError> {
        let timestamp_nanos = r.read_u64::<LittleEndian>()?;
        let topic_id = r.read_u16::<LittleEndian>()?;
        let sequence_number = r.read_u64::<LittleEndian>()?;
        let payload_len = r.read_u32::<LittleEndian>()? as usize;

        let mut payload = vec![0u8; payload_len];
        r.read_exact(&mut payload)?;

        let topic = self
            .metadata
            .topics
            .get(usize::from(topic_id))
            .ok_or_else(|| FormatError::InvalidFormat(format!("unknown topic id {}", topic_id)))?;

        Ok(BagMessage {
            timestamp_nanos,
            topic: topic.name.clone(),
            type_name: topic.type_name.clone(),
            sequence_number,
            payload,
        })
    }

    /// Iterate over all messages.
    pub fn messages(self) -> MessageIterator {
        MessageIterator { reader: self }
    }
}

/// Iterator over the messages of a bag.
pub struct MessageIterator {
    reader: BagReader,
}

impl Iterator for MessageIterator {
    type Item = Result<BagMessage, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_message().transpose()
    }
}
