use ahash::{AHashMap, RandomState};
use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::sink::{PutAck, SinkError, StreamSink};

// Fixed seeds keep shard assignment stable across runs.
const SHARD_HASH_SEEDS: (u64, u64, u64, u64) = (0x5eed, 0xa11ce, 0xb0b, 0xcafe);

/// Default upper bound on records held per stream.
pub const DEFAULT_CAPACITY: usize = 100_000;

/// A record accepted by the in-memory sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkRecord {
    pub partition_key: String,
    pub shard_id: String,
    pub sequence_number: u64,
    pub data: Vec<u8>,
}

/// Records of every stream, in arrival order.
struct IndexedRecords {
    records_by_stream: AHashMap<String, Vec<SinkRecord>>,

    /// Record count per stream and shard.
    counts_by_stream_by_shard: AHashMap<String, AHashMap<String, usize>>,
}

/// A stream sink that keeps everything in memory. Streams are created on first write.
pub struct InMemorySink {
    records: RwLock<IndexedRecords>,
    next_sequence_number: AtomicU64,
    shard_count: u32,
    latency: Duration,
    capacity: usize,
    hasher: RandomState,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(IndexedRecords {
                records_by_stream: AHashMap::new(),
                counts_by_stream_by_shard: AHashMap::new(),
            }),
            next_sequence_number: AtomicU64::new(1),
            shard_count: 1,
            latency: Duration::ZERO,
            capacity: DEFAULT_CAPACITY,
            hasher: RandomState::with_seeds(
                SHARD_HASH_SEEDS.0,
                SHARD_HASH_SEEDS.1,
                SHARD_HASH_SEEDS.2,
                SHARD_HASH_SEEDS.3,
            ),
        }
    }

    pub fn with_shards(mut self, shard_count: u32) -> Self {
        self.shard_count = shard_count.max(1);
        self
    }

    /// Delays every write, standing in for a network round trip.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    fn shard_id(&self, partition_key: &str) -> String {
        let shard = self.hasher.hash_one(partition_key) % u64::from(self.shard_count);
        format!("shardId-{shard:012}")
    }

    /// Returns the most recent `limit` records of a stream, oldest first,
    /// or `None` if nothing was ever written to it.
    pub async fn records(&self, stream_name: &str, limit: usize) -> Option<Vec<SinkRecord>> {
        let records_guard = self.records.read().await;
        let records = records_guard.records_by_stream.get(stream_name)?;
        let skip = records.len().saturating_sub(limit);
        Some(records[skip..].to_vec())
    }

    /// Returns the number of records per shard of a stream.
    pub async fn shard_counts(&self, stream_name: &str) -> AHashMap<String, usize> {
        let records_guard = self.records.read().await;
        records_guard
            .counts_by_stream_by_shard
            .get(stream_name)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn len(&self, stream_name: &str) -> usize {
        let records_guard = self.records.read().await;
        records_guard
            .records_by_stream
            .get(stream_name)
            .map_or(0, Vec::len)
    }
}

impl Default for InMemorySink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl StreamSink for InMemorySink {
    #[instrument(skip(self, payload), fields(bytes = payload.len()))]
    async fn put_record(
        &self,
        stream_name: &str,
        partition_key: &str,
        payload: &[u8],
    ) -> Result<PutAck, SinkError> {
        if partition_key.is_empty() {
            return Err(SinkError::Rejected("partition key is empty".to_string()));
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let shard_id = self.shard_id(partition_key);
        let mut records_guard = self.records.write().await;
        let records = records_guard
            .records_by_stream
            .entry(stream_name.to_string())
            .or_default();
        if records.len() >= self.capacity {
            return Err(SinkError::CapacityExceeded(
                stream_name.to_string(),
                self.capacity,
            ));
        }

        let sequence_number = self.next_sequence_number.fetch_add(1, Ordering::Relaxed);
        records.push(SinkRecord {
            partition_key: partition_key.to_string(),
            shard_id: shard_id.clone(),
            sequence_number,
            data: payload.to_vec(),
        });
        *records_guard
            .counts_by_stream_by_shard
            .entry(stream_name.to_string())
            .or_default()
            .entry(shard_id.clone())
            .or_default() += 1;

        debug!("Stored record {sequence_number} on {shard_id}");
        Ok(PutAck {
            shard_id,
            sequence_number: sequence_number.to_string(),
        })
    }
}
