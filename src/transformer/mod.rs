mod firehose;
pub mod spaced_json;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_json::Value;
use tracing::{info, instrument, warn};

pub use firehose::{
    FirehoseInputRecord, FirehoseOutputRecord, FirehoseTransformationEvent,
    FirehoseTransformationResponse, TransformationResult,
};

/// Why a single record could not be transformed.
#[derive(Debug, thiserror::Error, strum::AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TransformError {
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Payload is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Payload is not JSON: {0}")]
    Json(#[source] serde_json::Error),

    #[error("Payload is a JSON {0}, expected an object")]
    NotAnObject(&'static str),

    #[error("Failed to encode event: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Counts of one batch, logged once it is done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub total_records: usize,
    pub processed_records: usize,
    pub failed_records: usize,
}

/// Decodes one base64 JSON event and re-encodes it newline-terminated.
pub fn transform_data(data: &str) -> Result<String, TransformError> {
    let payload = String::from_utf8(STANDARD.decode(data)?)?;
    let event = match serde_json::from_str(&payload).map_err(TransformError::Json)? {
        Value::Object(event) => event,
        other => return Err(TransformError::NotAnObject(json_kind(&other))),
    };

    let mut encoded = spaced_json::to_vec(&event).map_err(TransformError::Encode)?;
    encoded.push(b'\n');
    Ok(STANDARD.encode(encoded))
}

/// Transforms a single record. Failures keep the original data and are
/// marked `ProcessingFailed`.
pub fn transform_record(record: &FirehoseInputRecord) -> FirehoseOutputRecord {
    match transform_data(&record.data) {
        Ok(data) => FirehoseOutputRecord {
            record_id: record.record_id.clone(),
            result: TransformationResult::Ok,
            data,
        },
        Err(err) => {
            let reason: &str = err.as_ref();
            warn!(record_id = %record.record_id, reason, "{err}");
            FirehoseOutputRecord {
                record_id: record.record_id.clone(),
                result: TransformationResult::ProcessingFailed,
                data: record.data.clone(),
            }
        }
    }
}

/// Transforms every record of a batch, in order, one output per input.
#[instrument(skip_all, fields(invocation_id = event.invocation_id.as_deref().unwrap_or("-")))]
pub fn transform_batch(
    event: &FirehoseTransformationEvent,
) -> (FirehoseTransformationResponse, BatchReport) {
    info!("Transforming {} records", event.records.len());

    let records: Vec<_> = event.records.iter().map(transform_record).collect();
    let failed_records = records
        .iter()
        .filter(|record| record.result == TransformationResult::ProcessingFailed)
        .count();
    let report = BatchReport {
        total_records: event.records.len(),
        processed_records: records.len() - failed_records,
        failed_records,
    };

    info!(
        total_records = report.total_records,
        processed_records = report.processed_records,
        failed_records = report.failed_records,
        "Batch transformed"
    );
    (FirehoseTransformationResponse { records }, report)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(record_id: &str, payload: &str) -> FirehoseInputRecord {
        FirehoseInputRecord {
            record_id: record_id.to_string(),
            data: STANDARD.encode(payload),
            approximate_arrival_timestamp: None,
        }
    }

    fn decode(data: &str) -> String {
        String::from_utf8(STANDARD.decode(data).unwrap()).unwrap()
    }

    fn batch(records: Vec<FirehoseInputRecord>) -> FirehoseTransformationEvent {
        FirehoseTransformationEvent {
            records,
            ..Default::default()
        }
    }

    #[test]
    fn test_example_record() {
        let input = record("r1", r#"{"store_id":"store_1","sales":42.5}"#);
        let output = transform_record(&input);
        assert_eq!(output.record_id, "r1");
        assert_eq!(output.result, TransformationResult::Ok);
        assert_eq!(decode(&output.data), "{\"store_id\": \"store_1\", \"sales\": 42.5}\n");
    }

    #[test]
    fn test_round_trip_preserves_event() {
        let original = serde_json::json!({
            "category": "Electronics",
            "store_id": "store_4",
            "evnt_time": "2021-04-01T10:20:30.123456",
            "sales": 73.05,
            "tags": ["a", {"nested": true}],
        });
        let input = record("r1", &serde_json::to_string(&original).unwrap());

        let text = decode(&transform_record(&input).data);
        let body = text.strip_suffix('\n').unwrap();
        assert!(!body.contains('\n'));
        let round_tripped: Value = serde_json::from_str(body).unwrap();
        assert_eq!(round_tripped, original);
    }

    #[test]
    fn test_numbers_pass_through_as_written() {
        let output = transform_record(&record(
            "r1",
            r#"{"order_id":123456789012345678901234567890,"ratio":0.1000000000000000055511151231257827,"sales":1.5}"#,
        ));
        assert_eq!(output.result, TransformationResult::Ok);
        assert_eq!(
            decode(&output.data),
            "{\"order_id\": 123456789012345678901234567890, \"ratio\": 0.1000000000000000055511151231257827, \"sales\": 1.5}\n"
        );
    }

    #[test]
    fn test_key_order_is_kept() {
        let output = transform_record(&record("r1", r#"{"z":1,"a":2,"m":3}"#));
        assert_eq!(decode(&output.data), "{\"z\": 1, \"a\": 2, \"m\": 3}\n");
    }

    #[test]
    fn test_batch_keeps_size_and_order() {
        let input = batch(
            (0..25)
                .map(|i| record(&format!("rec-{i}"), &format!(r#"{{"sales":{i}}}"#)))
                .collect(),
        );
        let (response, report) = transform_batch(&input);

        assert_eq!(response.records.len(), input.records.len());
        for (input, output) in input.records.iter().zip(&response.records) {
            assert_eq!(input.record_id, output.record_id);
            assert_eq!(output.result, TransformationResult::Ok);
        }
        assert_eq!(
            report,
            BatchReport {
                total_records: 25,
                processed_records: 25,
                failed_records: 0
            }
        );
    }

    #[test]
    fn test_bad_records_fail_alone() {
        let not_base64 = FirehoseInputRecord {
            record_id: "b64".to_string(),
            data: "%%% not base64 %%%".to_string(),
            approximate_arrival_timestamp: None,
        };
        let not_utf8 = FirehoseInputRecord {
            record_id: "utf8".to_string(),
            data: STANDARD.encode([0xffu8, 0xfe, 0xfd]),
            approximate_arrival_timestamp: None,
        };
        let input = batch(vec![
            record("good-1", r#"{"sales":1}"#),
            not_base64.clone(),
            not_utf8,
            record("json", "{not json"),
            record("array", "[1, 2]"),
            record("good-2", r#"{"sales":2}"#),
        ]);

        let (response, report) = transform_batch(&input);
        let results: Vec<_> = response.records.iter().map(|r| r.result).collect();
        assert_eq!(
            results,
            vec![
                TransformationResult::Ok,
                TransformationResult::ProcessingFailed,
                TransformationResult::ProcessingFailed,
                TransformationResult::ProcessingFailed,
                TransformationResult::ProcessingFailed,
                TransformationResult::Ok,
            ]
        );
        assert_eq!(response.records[1].data, not_base64.data);
        assert_eq!(decode(&response.records[5].data), "{\"sales\": 2}\n");
        assert_eq!(report.failed_records, 4);
        assert_eq!(report.processed_records, 2);
    }

    #[test]
    fn test_transform_errors() {
        assert!(matches!(transform_data("@@@"), Err(TransformError::Base64(_))));
        assert!(matches!(
            transform_data(&STANDARD.encode("\"text\"")),
            Err(TransformError::NotAnObject("string"))
        ));
        assert!(matches!(
            transform_data(&STANDARD.encode("")),
            Err(TransformError::Json(_))
        ));
        assert!(matches!(
            transform_data(&STANDARD.encode(r#"{"sales":NaN}"#)),
            Err(TransformError::Json(_))
        ));
    }

    #[test]
    fn test_transform_is_deterministic() {
        let input = record("r1", r#"{"category":"Books","store_id":"store_2","sales":0.1}"#);
        let first = transform_record(&input);
        let second = transform_record(&input);
        assert_eq!(first, second);

        let empty = batch(vec![]);
        assert!(transform_batch(&empty).0.records.is_empty());
    }
}
