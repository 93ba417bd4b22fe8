use serde::{Deserialize, Serialize};

/// A batch Firehose hands to its transformation function.
///
/// `data` is kept as the raw base64 text so a bad record can fail on its own
/// instead of failing deserialization of the whole batch.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FirehoseTransformationEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_stream_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub records: Vec<FirehoseInputRecord>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FirehoseInputRecord {
    pub record_id: String,
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approximate_arrival_timestamp: Option<i64>,
}

/// What the transformation function returns to Firehose.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct FirehoseTransformationResponse {
    pub records: Vec<FirehoseOutputRecord>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FirehoseOutputRecord {
    pub record_id: String,
    pub result: TransformationResult,
    pub data: String,
}

/// Per-record status understood by Firehose.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, strum::Display)]
pub enum TransformationResult {
    Ok,
    Dropped,
    ProcessingFailed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        let event: FirehoseTransformationEvent = serde_json::from_str(
            r#"{
                "invocationId": "inv-1",
                "deliveryStreamArn": "arn:aws:firehose:us-east-1:123456789012:deliverystream/sales",
                "region": "us-east-1",
                "records": [
                    {"recordId": "r1", "approximateArrivalTimestamp": 1617272400000, "data": "e30="}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(event.invocation_id.as_deref(), Some("inv-1"));
        assert_eq!(event.records[0].record_id, "r1");
        assert_eq!(event.records[0].approximate_arrival_timestamp, Some(1617272400000));

        let bare: FirehoseTransformationEvent =
            serde_json::from_str(r#"{"records": [{"recordId": "r1", "data": ""}]}"#).unwrap();
        assert!(bare.region.is_none());

        let response = FirehoseTransformationResponse {
            records: vec![FirehoseOutputRecord {
                record_id: "r1".to_string(),
                result: TransformationResult::ProcessingFailed,
                data: "e30=".to_string(),
            }],
        };
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"records":[{"recordId":"r1","result":"ProcessingFailed","data":"e30="}]}"#
        );
    }
}
