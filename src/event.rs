use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Product category of a sale.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Category {
    Books,
    Electronics,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Books, Category::Electronics];
}

/// Number of stores events are spread over, `store_1` to `store_5`.
pub const STORE_COUNT: u32 = 5;

/// A single synthetic sale, as written to the ingest stream.
///
/// The timestamp is serialized as `evnt_time`, which is the column the
/// downstream analytics input schema maps.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SalesEvent {
    pub category: Category,
    pub store_id: String,
    #[serde(rename = "evnt_time", alias = "event_time")]
    pub event_time: NaiveDateTime,
    pub sales: f64,
}

impl SalesEvent {
    pub fn store_id(n: u32) -> String {
        format!("store_{n}")
    }
}

/// Rounds an amount to cents.
pub fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let event = SalesEvent {
            category: Category::Electronics,
            store_id: SalesEvent::store_id(3),
            event_time: NaiveDateTime::parse_from_str("2021-04-01 10:20:30", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
            sales: 12.34,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"category":"Electronics","store_id":"store_3","evnt_time":"2021-04-01T10:20:30","sales":12.34}"#
        );

        let parsed: SalesEvent = serde_json::from_str(
            r#"{"category":"Books","store_id":"store_1","event_time":"2021-04-01T10:20:30.5","sales":1.0}"#,
        )
        .unwrap();
        assert_eq!(parsed.category, Category::Books);
        assert_eq!(parsed.sales, 1.0);
    }

    #[test]
    fn test_round_to_cents() {
        assert_eq!(round_to_cents(42.499), 42.5);
        assert_eq!(round_to_cents(0.004), 0.0);
        assert_eq!(round_to_cents(99.999), 100.0);
    }
}
