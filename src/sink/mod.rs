mod in_memory_sink;
mod kinesis_sink;

pub use in_memory_sink::{InMemorySink, SinkRecord};
pub use kinesis_sink::KinesisSink;

/// Where an accepted record landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutAck {
    pub shard_id: String,
    pub sequence_number: String,
}

/// Error type for stream writes.
#[derive(Debug, thiserror::Error, strum::AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SinkError {
    #[error("Write throughput exceeded: {0}")]
    Throttled(String),

    #[error("Stream service unavailable: {0}")]
    Unavailable(String),

    #[error("Record rejected: {0}")]
    Rejected(String),

    #[error("Stream '{0}' is full, limit is {1} records")]
    CapacityExceeded(String, usize),
}

impl SinkError {
    /// Whether retrying the same write may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, SinkError::Throttled(_) | SinkError::Unavailable(_))
    }
}

/// An append-only ingestion endpoint accepting keyed records.
#[async_trait::async_trait]
pub trait StreamSink {
    async fn put_record(
        &self,
        stream_name: &str,
        partition_key: &str,
        payload: &[u8],
    ) -> Result<PutAck, SinkError>;
}
