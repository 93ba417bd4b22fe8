use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use tracing::instrument;

use crate::{
    clock::Deadline,
    producer::{EventGenerator, InvocationResponse},
    server::{AppState, app_error::AppError},
    sink::SinkRecord,
    transformer::{FirehoseTransformationEvent, FirehoseTransformationResponse, transform_batch},
};

const DEFAULT_BUDGET_MS: u64 = 1_000;
const MAX_BUDGET_MS: u64 = 30_000;
const DEFAULT_RECORD_LIMIT: usize = 100;
const MAX_RECORD_LIMIT: usize = 1_000;

#[derive(Deserialize, Debug)]
pub struct ProduceParams {
    budget_ms: Option<u64>,
}

#[derive(Deserialize, Debug)]
pub struct RecordParams {
    stream_name: Option<String>,
    limit: Option<usize>,
}

/// A stored record, with its payload shown as JSON when it is JSON.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RecordView {
    pub partition_key: String,
    pub shard_id: String,
    pub sequence_number: u64,
    pub data: serde_json::Value,
}

impl From<SinkRecord> for RecordView {
    fn from(record: SinkRecord) -> Self {
        let data = serde_json::from_slice(&record.data).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(&record.data).into_owned())
        });
        Self {
            partition_key: record.partition_key,
            shard_id: record.shard_id,
            sequence_number: record.sequence_number,
            data,
        }
    }
}

/// Runs the transformer on a Firehose batch.
#[axum::debug_handler]
#[instrument(skip_all)]
pub async fn post_transform(
    Json(event): Json<FirehoseTransformationEvent>,
) -> Json<FirehoseTransformationResponse> {
    let (response, _) = transform_batch(&event);
    Json(response)
}

/// Runs the producer against the in-memory sink for the given time budget.
#[axum::debug_handler]
#[instrument(skip(state))]
pub async fn post_produce(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProduceParams>,
) -> Result<Json<InvocationResponse>, AppError> {
    let budget_ms = params.budget_ms.unwrap_or(DEFAULT_BUDGET_MS);
    if budget_ms > MAX_BUDGET_MS {
        return Err(AppError::BudgetTooLarge(MAX_BUDGET_MS));
    }

    let clock = Deadline::after(Duration::from_millis(budget_ms));
    let mut generator = EventGenerator::from_entropy();
    let summary = state.producer.run(&mut generator, &clock).await;
    Ok(Json(summary.into_response()))
}

/// Returns the most recent records of a stream held by the in-memory sink.
#[axum::debug_handler]
#[instrument(skip(state))]
pub async fn get_records(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecordParams>,
) -> Result<Json<Vec<RecordView>>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_RECORD_LIMIT);
    if limit > MAX_RECORD_LIMIT {
        return Err(AppError::LimitTooLarge(MAX_RECORD_LIMIT));
    }

    let stream_name = params
        .stream_name
        .unwrap_or_else(|| state.producer.stream_name().to_string());
    let records = state
        .sink
        .records(&stream_name, limit)
        .await
        .ok_or_else(|| AppError::UnknownStream(stream_name.clone()))?;
    Ok(Json(records.into_iter().map(RecordView::from).collect()))
}
