mod generator;

use backoff::{ExponentialBackoff, backoff::Backoff};
use chrono::{Local, SubsecRound};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::{
    clock::RemainingTime,
    config::ProducerSettings,
    event::round_to_cents,
    sink::{PutAck, SinkError, StreamSink},
    transformer::spaced_json,
};

pub use generator::{EventGenerator, MAX_SALES};

const RETRY_INITIAL_INTERVAL: Duration = Duration::from_millis(50);
const RETRY_MAX_INTERVAL: Duration = Duration::from_millis(800);

/// Error type for a single produce step. Either one ends the run.
#[derive(Debug, thiserror::Error, strum::AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ProducerError {
    #[error("Failed to serialize event: {0}")]
    Generation(#[source] serde_json::Error),

    #[error("Failed to submit event: {0}")]
    Submission(#[from] SinkError),
}

/// Outcome of one producer invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProducerSummary {
    pub status: bool,
    pub record_count: u64,
    pub tot_sales: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ProducerSummary {
    fn record(&mut self, sales: f64) {
        self.record_count += 1;
        self.tot_sales = round_to_cents(self.tot_sales + sales);
    }

    /// Wraps the summary the way a synchronous invocation response is shaped.
    pub fn into_response(self) -> InvocationResponse {
        let message = serde_json::json!({ "message": self });
        let body = spaced_json::to_string(&message).unwrap_or_else(|_| message.to_string());
        InvocationResponse {
            status_code: 200,
            body,
        }
    }
}

/// Status code and JSON body returned to whoever invoked the producer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub status_code: u16,
    pub body: String,
}

/// Writes synthetic sales events to a stream until the time budget runs out.
pub struct Producer {
    sink: Arc<dyn StreamSink + Send + Sync + 'static>,
    stream_name: String,
    safety_margin_ms: u64,
    max_retry_elapsed: Duration,
}

impl Producer {
    pub fn new(
        sink: Arc<dyn StreamSink + Send + Sync + 'static>,
        settings: &ProducerSettings,
    ) -> Self {
        Self {
            sink,
            stream_name: settings.stream_name.clone(),
            safety_margin_ms: settings.safety_margin.as_millis() as u64,
            max_retry_elapsed: settings.max_retry_elapsed,
        }
    }

    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    /// Produces one event per iteration while more than the safety margin is left.
    ///
    /// Errors end the loop and are reported in the summary; events already
    /// written stay written.
    #[instrument(skip_all, fields(stream_name = %self.stream_name))]
    pub async fn run<R: Rng + Send>(
        &self,
        generator: &mut EventGenerator<R>,
        clock: &dyn RemainingTime,
    ) -> ProducerSummary {
        let mut summary = ProducerSummary::default();
        info!("Producing events");

        loop {
            let remaining = clock.remaining_millis();
            if remaining <= self.safety_margin_ms {
                break;
            }
            trace!(remaining_time = remaining);

            match self.produce_one(generator, remaining).await {
                Ok(sales) => summary.record(sales),
                Err(err) => {
                    let code: &str = err.as_ref();
                    error!(code, "Stopping after {} records: {err}", summary.record_count);
                    summary.error_message = Some(err.to_string());
                    return summary;
                }
            }
        }

        summary.status = true;
        info!(
            record_count = summary.record_count,
            tot_sales = summary.tot_sales,
            "Time budget spent"
        );
        summary
    }

    /// Generates and submits a single event, returning its sales amount.
    async fn produce_one<R: Rng + Send>(
        &self,
        generator: &mut EventGenerator<R>,
        remaining_ms: u64,
    ) -> Result<f64, ProducerError> {
        // Microseconds, the precision the analytics TIMESTAMP column parses.
        let event = generator.next_event(Local::now().naive_local().trunc_subsecs(6));
        let payload = serde_json::to_vec(&event).map_err(ProducerError::Generation)?;
        let partition_key = generator.partition_key();

        let retry_budget = self
            .max_retry_elapsed
            .min(Duration::from_millis(remaining_ms - self.safety_margin_ms));
        let ack = self.submit(&partition_key, &payload, retry_budget).await?;
        debug!(
            store_id = %event.store_id,
            category = %event.category,
            sales = event.sales,
            "Event {} landed on {}",
            ack.sequence_number,
            ack.shard_id
        );
        Ok(event.sales)
    }

    /// Writes a record, retrying transient failures until `retry_budget` is used up.
    async fn submit(
        &self,
        partition_key: &str,
        payload: &[u8],
        retry_budget: Duration,
    ) -> Result<PutAck, SinkError> {
        let mut backoff = ExponentialBackoff {
            initial_interval: RETRY_INITIAL_INTERVAL,
            current_interval: RETRY_INITIAL_INTERVAL,
            max_interval: RETRY_MAX_INTERVAL,
            max_elapsed_time: Some(retry_budget),
            ..Default::default()
        };
        backoff.reset();

        loop {
            match self
                .sink
                .put_record(&self.stream_name, partition_key, payload)
                .await
            {
                Ok(ack) => return Ok(ack),
                Err(err) if err.is_transient() => match backoff.next_backoff() {
                    Some(delay) => {
                        warn!("Write failed, retrying in {delay:?}: {err}");
                        tokio::time::sleep(delay.min(retry_budget)).await;
                    }
                    None => return Err(err),
                },
                Err(err) => return Err(err),
            }
        }
    }
}
