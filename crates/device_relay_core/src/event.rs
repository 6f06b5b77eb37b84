//! Inbound event decoding shared by both relay functions.
//!
//! A Lambda invocation reaches us in one of three shapes: a flat direct
//! payload (IoT rule or manual invoke), an API-gateway envelope carrying the
//! payload in `body`, or a `Records` batch from a stream or queue. Batches
//! are decoded lazily so callers process records strictly in order and stop
//! at the first failure without touching later records.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::RelayError;

/// One sensor/actuator state report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateUpdateEvent {
    pub device: String,
    pub attribute: String,
    pub value: String,
}

impl StateUpdateEvent {
    pub fn from_record(record: &Value) -> Result<Self, RelayError> {
        let fields = record_object(record)?;
        Ok(Self {
            device: required_field(fields, "device")?,
            attribute: required_field(fields, "attribute")?,
            value: required_field(fields, "value")?,
        })
    }
}

/// One voice call request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallEvent {
    pub phone: String,
    pub message: String,
}

impl CallEvent {
    pub fn from_record(record: &Value) -> Result<Self, RelayError> {
        let fields = record_object(record)?;
        Ok(Self {
            phone: required_field(fields, "phone")?,
            message: required_field(fields, "message")?,
        })
    }
}

/// Ordered, lazily decoded records of one invocation.
#[derive(Debug)]
pub struct EventRecords<'a> {
    inner: RecordsInner<'a>,
}

#[derive(Debug)]
enum RecordsInner<'a> {
    Single(Option<Result<Value, RelayError>>),
    Batch(std::slice::Iter<'a, Value>),
}

impl Iterator for EventRecords<'_> {
    type Item = Result<Value, RelayError>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            RecordsInner::Single(record) => record.take(),
            RecordsInner::Batch(records) => records.next().map(decode_record),
        }
    }
}

/// Split an invocation payload into its records.
///
/// Fails up front only when the event itself has an unusable shape; errors
/// inside individual batch records surface when that record is pulled.
pub fn event_records(event: &Value) -> Result<EventRecords<'_>, RelayError> {
    let Some(object) = event.as_object() else {
        return Err(RelayError::MalformedEvent(
            "event payload must be a JSON object".to_string(),
        ));
    };

    if let Some(records) = object.get("Records") {
        let records = records.as_array().ok_or_else(|| {
            RelayError::MalformedEvent("Records must be a JSON array".to_string())
        })?;
        if records.is_empty() {
            return Err(RelayError::MalformedEvent(
                "event contains no records".to_string(),
            ));
        }
        return Ok(EventRecords {
            inner: RecordsInner::Batch(records.iter()),
        });
    }

    Ok(EventRecords {
        inner: RecordsInner::Single(Some(unwrap_rest_body(event))),
    })
}

/// Decode a single batch record into its flat payload.
pub fn decode_record(record: &Value) -> Result<Value, RelayError> {
    if let Some(kinesis) = record.get("kinesis") {
        let data = kinesis.get("data").and_then(Value::as_str).ok_or_else(|| {
            RelayError::MalformedEvent("kinesis record data must be a string".to_string())
        })?;
        let bytes = BASE64.decode(data.trim()).map_err(|error| {
            RelayError::MalformedEvent(format!("kinesis record data is not base64: {error}"))
        })?;
        return serde_json::from_slice(&bytes).map_err(|error| {
            RelayError::MalformedEvent(format!("kinesis record data is not JSON: {error}"))
        });
    }

    if is_sqs_record(record) {
        let body = record.get("body").and_then(Value::as_str).ok_or_else(|| {
            RelayError::MalformedEvent("SQS record body must be a string".to_string())
        })?;
        return serde_json::from_str(body).map_err(|error| {
            RelayError::MalformedEvent(format!("SQS record body is not JSON: {error}"))
        });
    }

    Ok(record.clone())
}

fn is_sqs_record(record: &Value) -> bool {
    record
        .get("eventSource")
        .and_then(Value::as_str)
        .map(|source| source == "aws:sqs")
        .unwrap_or(false)
}

fn unwrap_rest_body(event: &Value) -> Result<Value, RelayError> {
    let Some(body) = event.get("body") else {
        return Ok(event.clone());
    };

    match body {
        Value::Null => Ok(json!({})),
        Value::Object(_) => Ok(body.clone()),
        Value::String(text) => serde_json::from_str(text)
            .map_err(|error| RelayError::MalformedEvent(format!("Malformed JSON body: {error}"))),
        _ => Err(RelayError::MalformedEvent(
            "Request body must be a JSON object".to_string(),
        )),
    }
}

fn record_object(record: &Value) -> Result<&Map<String, Value>, RelayError> {
    record
        .as_object()
        .ok_or_else(|| RelayError::MalformedEvent("record must be a JSON object".to_string()))
}

fn required_field(fields: &Map<String, Value>, name: &str) -> Result<String, RelayError> {
    match fields.get(name) {
        None | Some(Value::Null) => Err(RelayError::missing(name)),
        Some(Value::String(text)) => Ok(text.clone()),
        Some(scalar @ (Value::Number(_) | Value::Bool(_))) => Ok(scalar.to_string()),
        Some(_) => Err(RelayError::MalformedEvent(format!(
            "field {name} must be a string"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinesis_record(payload: Value) -> Value {
        json!({
            "eventSource": "aws:kinesis",
            "kinesis": { "data": BASE64.encode(payload.to_string()) }
        })
    }

    #[test]
    fn direct_payload_is_a_single_record() {
        let event = json!({"device": "g88_pi", "attribute": "led", "value": "on"});
        let records: Vec<_> = event_records(&event)
            .expect("event should split")
            .collect::<Result<_, _>>()
            .expect("record should decode");

        assert_eq!(records, vec![event]);
    }

    #[test]
    fn rest_body_string_is_unwrapped() {
        let event = json!({"body": "{\"phone\":\"12345678\",\"message\":\"hi\"}"});
        let record = event_records(&event)
            .expect("event should split")
            .next()
            .expect("one record")
            .expect("body should decode");

        let call = CallEvent::from_record(&record).expect("call event");
        assert_eq!(call.phone, "12345678");
        assert_eq!(call.message, "hi");
    }

    #[test]
    fn kinesis_records_are_base64_decoded_in_order() {
        let event = json!({
            "Records": [
                kinesis_record(json!({"device": "a_1", "attribute": "led", "value": "on"})),
                kinesis_record(json!({"device": "b_2", "attribute": "led", "value": "off"})),
            ]
        });

        let devices: Vec<String> = event_records(&event)
            .expect("event should split")
            .map(|record| {
                StateUpdateEvent::from_record(&record.expect("decode")).expect("fields")
            })
            .map(|update| update.device)
            .collect();

        assert_eq!(devices, vec!["a_1", "b_2"]);
    }

    #[test]
    fn plain_and_sqs_records_are_accepted_in_batches() {
        let event = json!({
            "Records": [
                {"device": "hall_light", "attribute": "power", "value": "on"},
                {"eventSource": "aws:sqs", "body": "{\"device\":\"g29_sensor\",\"attribute\":\"temp\",\"value\":\"28\"}"}
            ]
        });

        let updates: Vec<StateUpdateEvent> = event_records(&event)
            .expect("event should split")
            .map(|record| StateUpdateEvent::from_record(&record.expect("decode")).expect("fields"))
            .collect();

        assert_eq!(updates[0].device, "hall_light");
        assert_eq!(updates[1].attribute, "temp");
    }

    #[test]
    fn invalid_base64_fails_only_when_pulled() {
        let event = json!({
            "Records": [
                {"device": "hall_light", "attribute": "power", "value": "on"},
                {"kinesis": {"data": "not base64!"}}
            ]
        });

        let mut records = event_records(&event).expect("event should split");
        assert!(records.next().expect("first").is_ok());
        let error = records.next().expect("second").expect_err("bad base64");
        assert!(matches!(error, RelayError::MalformedEvent(_)));
    }

    #[test]
    fn empty_batch_is_rejected() {
        let error = event_records(&json!({"Records": []})).expect_err("empty batch");
        assert_eq!(
            error,
            RelayError::MalformedEvent("event contains no records".to_string())
        );
    }

    #[test]
    fn non_object_event_is_rejected() {
        assert!(event_records(&json!("g88_pi")).is_err());
    }

    #[test]
    fn missing_device_is_reported_first() {
        let error = StateUpdateEvent::from_record(&json!({"attribute": "led", "value": "on"}))
            .expect_err("device is required");
        assert_eq!(error, RelayError::missing("device"));
    }

    #[test]
    fn null_field_counts_as_missing() {
        let error = CallEvent::from_record(&json!({"phone": "12345678", "message": null}))
            .expect_err("message is required");
        assert_eq!(error, RelayError::missing("message"));
    }

    #[test]
    fn missing_message_is_reported() {
        let error =
            CallEvent::from_record(&json!({"phone": "12345678"})).expect_err("message is required");
        assert_eq!(error, RelayError::missing("message"));
    }

    #[test]
    fn numeric_values_are_rendered_as_text() {
        let update = StateUpdateEvent::from_record(
            &json!({"device": "g88_pi", "attribute": "temperature", "value": 28.5}),
        )
        .expect("numeric value accepted");
        assert_eq!(update.value, "28.5");
    }

    #[test]
    fn nested_values_are_rejected() {
        let error = StateUpdateEvent::from_record(
            &json!({"device": "g88_pi", "attribute": "led", "value": {"on": true}}),
        )
        .expect_err("object value rejected");
        assert!(matches!(error, RelayError::MalformedEvent(_)));
    }
}
