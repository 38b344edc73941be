//! RocksDB-backed durable room store.
//!
//! One record per room id in the `rooms` column family:
//! bincode-encoded `{ rev, updated_at, state }` with the JSON state held
//! LZ4-compressed. Durability is keyed by room id alone; no auth scoping.
//!
//! The revision bump is a read-modify-write, serialized by a write lock so
//! concurrent saves still increment by exactly 1 each.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;

use async_trait::async_trait;
use rocksdb::{
    BlockBasedOptions, Cache, ColumnFamilyDescriptor, DBCompressionType, DBWithThreadMode,
    Options, SingleThreaded, WriteOptions,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::protocol::{RoomResponse, ServiceError};
use crate::service::RoomService;

const CF_ROOMS: &str = "rooms";

const COLUMN_FAMILIES: &[&str] = &[CF_ROOMS];

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Database directory path
    pub path: PathBuf,
    /// Block cache size in bytes (default: 64MB)
    pub block_cache_size: usize,
    /// Bloom filter bits per key (default: 10)
    pub bloom_filter_bits: i32,
    /// Enable fsync on every write (default: false)
    pub sync_writes: bool,
    /// Max open files for RocksDB (default: 256)
    pub max_open_files: i32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("mindflow_data"),
            block_cache_size: 64 * 1024 * 1024, // 64MB
            bloom_filter_bits: 10,
            sync_writes: false,
            max_open_files: 256,
        }
    }
}

impl StoreConfig {
    /// Create config for testing (small caches, temp directory).
    pub fn for_testing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 4 * 1024 * 1024, // 4MB
            bloom_filter_bits: 10,
            sync_writes: false,
            max_open_files: 64,
        }
    }
}

/// One stored room: revision plus compressed state.
#[derive(Debug, Serialize, Deserialize)]
struct RoomRecord {
    rev: u64,
    /// Last modified timestamp (seconds since epoch)
    updated_at: u64,
    /// LZ4-compressed JSON state
    state: Vec<u8>,
}

/// Storage errors.
#[derive(Debug, Clone)]
pub enum StoreError {
    /// RocksDB internal error
    DatabaseError(String),
    /// Serialization failed
    SerializationError(String),
    /// Deserialization failed
    DeserializationError(String),
    /// Compression error
    CompressionError(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::DatabaseError(e) => write!(f, "Database error: {e}"),
            StoreError::SerializationError(e) => write!(f, "Serialization error: {e}"),
            StoreError::DeserializationError(e) => write!(f, "Deserialization error: {e}"),
            StoreError::CompressionError(e) => write!(f, "Compression error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rocksdb::Error> for StoreError {
    fn from(e: rocksdb::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::SerializationError(msg) | StoreError::DeserializationError(msg) => {
                ServiceError::Serialization(msg)
            }
            other => ServiceError::Storage(other.to_string()),
        }
    }
}

/// Durable [`RoomService`] over RocksDB.
pub struct RocksRoomStore {
    db: DBWithThreadMode<SingleThreaded>,
    config: StoreConfig,
    /// Serializes the read-modify-write revision bump.
    write_lock: Mutex<()>,
}

impl RocksRoomStore {
    /// Open the room store at the configured path.
    ///
    /// Creates the database and column families if they don't exist.
    pub fn open(config: StoreConfig) -> Result<Self, StoreError> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_open_files(config.max_open_files);
        db_opts.set_keep_log_file_num(5);
        db_opts.increase_parallelism(num_cpus());

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Self::cf_options(&config)))
            .collect();

        let db = DBWithThreadMode::<SingleThreaded>::open_cf_descriptors(
            &db_opts,
            &config.path,
            cf_descriptors,
        )?;

        Ok(Self {
            db,
            config,
            write_lock: Mutex::new(()),
        })
    }

    fn cf_options(config: &StoreConfig) -> Options {
        let mut opts = Options::default();

        // Block-based table with bloom filter and cache; room reads are
        // point lookups on the hot polling path.
        let mut block_opts = BlockBasedOptions::default();
        let cache = Cache::new_lru_cache(config.block_cache_size);
        block_opts.set_block_cache(&cache);
        block_opts.set_bloom_filter(config.bloom_filter_bits as f64, false);
        opts.set_block_based_table_factory(&block_opts);
        opts.optimize_for_point_lookup(config.block_cache_size as u64);

        // Records are already LZ4-compressed; skip double compression.
        opts.set_compression_type(DBCompressionType::None);
        opts
    }

    fn cf(&self) -> Result<&rocksdb::ColumnFamily, StoreError> {
        self.db
            .cf_handle(CF_ROOMS)
            .ok_or_else(|| StoreError::DatabaseError(format!("missing column family {CF_ROOMS}")))
    }

    fn read_record(&self, room_id: &str) -> Result<Option<RoomRecord>, StoreError> {
        let cf = self.cf()?;
        match self.db.get_cf(cf, room_id.as_bytes())? {
            Some(bytes) => {
                let (record, _) =
                    bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
                        .map_err(|e| StoreError::DeserializationError(e.to_string()))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn write_record(&self, room_id: &str, record: &RoomRecord) -> Result<(), StoreError> {
        let cf = self.cf()?;
        let bytes = bincode::serde::encode_to_vec(record, bincode::config::standard())
            .map_err(|e| StoreError::SerializationError(e.to_string()))?;
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);
        self.db
            .put_cf_opt(cf, room_id.as_bytes(), bytes, &write_opts)?;
        Ok(())
    }
}

#[async_trait]
impl RoomService for RocksRoomStore {
    async fn load(&self, room_id: &str) -> Result<RoomResponse, ServiceError> {
        match self.read_record(room_id)? {
            Some(record) => {
                let raw = lz4_flex::decompress_size_prepended(&record.state)
                    .map_err(|e| StoreError::CompressionError(e.to_string()))?;
                let state: Value = serde_json::from_slice(&raw)
                    .map_err(|e| ServiceError::Serialization(e.to_string()))?;
                Ok(RoomResponse {
                    id: room_id.to_string(),
                    state: Some(state),
                    rev: record.rev,
                })
            }
            None => Ok(RoomResponse {
                id: room_id.to_string(),
                state: None,
                rev: 0,
            }),
        }
    }

    async fn save(
        &self,
        room_id: &str,
        state: Value,
        _known_rev: Option<u64>,
    ) -> Result<u64, ServiceError> {
        let raw =
            serde_json::to_vec(&state).map_err(|e| ServiceError::Serialization(e.to_string()))?;
        let compressed = lz4_flex::compress_prepend_size(&raw);

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let rev = self.read_record(room_id)?.map_or(0, |r| r.rev) + 1;
        self.write_record(
            room_id,
            &RoomRecord {
                rev,
                updated_at: unix_secs(),
                state: compressed,
            },
        )?;
        Ok(rev)
    }
}

fn unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn num_cpus() -> i32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as i32)
        .unwrap_or(4)
}
