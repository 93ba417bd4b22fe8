use aws_sdk_kinesis::error::{DisplayErrorContext, SdkError};
use aws_sdk_kinesis::operation::put_record::PutRecordError;
use aws_sdk_kinesis::primitives::Blob;
use tracing::{debug, instrument};

use crate::sink::{PutAck, SinkError, StreamSink};

/// Writes records to a Kinesis data stream, one `PutRecord` call each.
pub struct KinesisSink {
    client: aws_sdk_kinesis::Client,
}

impl KinesisSink {
    pub fn new(client: aws_sdk_kinesis::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl StreamSink for KinesisSink {
    #[instrument(skip(self, payload), fields(bytes = payload.len()))]
    async fn put_record(
        &self,
        stream_name: &str,
        partition_key: &str,
        payload: &[u8],
    ) -> Result<PutAck, SinkError> {
        let output = self
            .client
            .put_record()
            .stream_name(stream_name)
            .partition_key(partition_key)
            .data(Blob::new(payload))
            .send()
            .await
            .map_err(classify)?;

        debug!(
            "Put record on {} at {}",
            output.shard_id(),
            output.sequence_number()
        );
        Ok(PutAck {
            shard_id: output.shard_id().to_string(),
            sequence_number: output.sequence_number().to_string(),
        })
    }
}

/// Sorts SDK failures into retryable and permanent ones.
fn classify(error: SdkError<PutRecordError>) -> SinkError {
    let message = DisplayErrorContext(&error).to_string();
    match &error {
        SdkError::ServiceError(service_error) => {
            let err = service_error.err();
            if err.is_provisioned_throughput_exceeded_exception() || err.is_kms_throttling_exception()
            {
                SinkError::Throttled(message)
            } else if err.is_resource_not_found_exception()
                || err.is_invalid_argument_exception()
                || err.is_kms_access_denied_exception()
                || err.is_kms_disabled_exception()
                || err.is_kms_invalid_state_exception()
                || err.is_kms_not_found_exception()
                || err.is_kms_opt_in_required()
            {
                SinkError::Rejected(message)
            } else {
                SinkError::Unavailable(message)
            }
        }
        SdkError::ConstructionFailure(_) => SinkError::Rejected(message),
        // Timeouts, dispatch and response failures are worth another try.
        _ => SinkError::Unavailable(message),
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_kinesis::types::error::{
        ProvisionedThroughputExceededException, ResourceNotFoundException,
    };
    use aws_smithy_runtime_api::client::orchestrator::HttpResponse;
    use aws_smithy_runtime_api::client::result::ConnectorError;
    use aws_smithy_runtime_api::http::StatusCode;
    use aws_smithy_types::body::SdkBody;

    use super::*;

    fn service_error(err: PutRecordError) -> SdkError<PutRecordError> {
        let raw = HttpResponse::new(StatusCode::try_from(400u16).unwrap(), SdkBody::empty());
        SdkError::service_error(err, raw)
    }

    #[test]
    fn test_throttling_is_transient() {
        let error = classify(service_error(
            PutRecordError::ProvisionedThroughputExceededException(
                ProvisionedThroughputExceededException::builder()
                    .message("slow down")
                    .build(),
            ),
        ));
        assert!(matches!(error, SinkError::Throttled(_)));
        assert!(error.is_transient());
    }

    #[test]
    fn test_missing_stream_is_rejected() {
        let error = classify(service_error(PutRecordError::ResourceNotFoundException(
            ResourceNotFoundException::builder()
                .message("no such stream")
                .build(),
        )));
        assert!(matches!(error, SinkError::Rejected(_)));
        assert!(!error.is_transient());
    }

    #[test]
    fn test_transport_failures_are_transient() {
        let error = classify(SdkError::timeout_error("timed out"));
        assert!(matches!(error, SinkError::Unavailable(_)));
        assert!(error.is_transient());

        let error = classify(SdkError::dispatch_failure(ConnectorError::io(
            "connection reset".into(),
        )));
        assert!(matches!(error, SinkError::Unavailable(_)));
        assert!(error.is_transient());
    }

    #[test]
    fn test_construction_failure_is_rejected() {
        let error = classify(SdkError::construction_failure("missing stream name"));
        assert!(matches!(error, SinkError::Rejected(_)));
        assert!(!error.is_transient());
    }
}
