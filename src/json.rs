// Recursively rewrites a JSON document: detects time-series arrays, replaces
// them with self-describing frames, and inverts the rewrite on decode.
//
// State machine: every node in the tree hits one of two absorbing
// terminals — recognized (rewrite) or not recognized (recurse-or-pass).

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::alphabet::Base;
use crate::series::{EncodeOptions, Observation, Series, TimeSeriesCodec};
use crate::{Error, Result};

const ISO8601_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Recursive JSON <-> frame rewriter, keyed by the two field names that
/// identify a time-series record: `ts_key` (the timestamp field) and
/// `ts_value` (the numeric field).
pub struct JsonTransformer {
    ts_key: String,
    ts_value: String,
    base: Base,
    opts: EncodeOptions,
}

impl JsonTransformer {
    pub fn new(ts_key: impl Into<String>, ts_value: impl Into<String>, base: Base) -> Self {
        Self {
            ts_key: ts_key.into(),
            ts_value: ts_value.into(),
            base,
            opts: EncodeOptions::default(),
        }
    }

    pub fn with_options(mut self, opts: EncodeOptions) -> Self {
        self.opts = opts;
        self
    }

    /// Walks `doc`, replacing every recognized time-series array in place.
    pub fn encode(&self, doc: &Value) -> Result<Value> {
        match doc {
            Value::Array(items) => {
                if let Some(series) = self.try_parse_series(items)? {
                    let frame =
                        TimeSeriesCodec::encode(&series, self.base, &self.ts_key, &self.ts_value, self.opts)?;
                    Ok(frame.to_json())
                } else {
                    let encoded: Result<Vec<Value>> =
                        items.iter().map(|item| self.encode(item)).collect();
                    Ok(Value::Array(encoded?))
                }
            }
            Value::Object(obj) => {
                let mut out = Map::with_capacity(obj.len());
                for (k, v) in obj {
                    out.insert(k.clone(), self.encode(v)?);
                }
                Ok(Value::Object(out))
            }
            scalar => Ok(scalar.clone()),
        }
    }

    /// Walks `doc`, replacing every recognized frame object with the list of
    /// records it encodes.
    pub fn decode(&self, doc: &Value) -> Result<Value> {
        match doc {
            Value::Object(obj) => {
                if matches!(obj.get("encoder").and_then(Value::as_str), Some("TimeSeriesEncoder")) {
                    let frame = crate::series::Frame::from_json(doc)?;
                    let series = TimeSeriesCodec::decode(&frame)?;
                    self.series_to_array(&series, &frame.ts_key, &frame.ts_value)
                } else {
                    let mut out = Map::with_capacity(obj.len());
                    for (k, v) in obj {
                        out.insert(k.clone(), self.decode(v)?);
                    }
                    Ok(Value::Object(out))
                }
            }
            Value::Array(items) => {
                let decoded: Result<Vec<Value>> = items.iter().map(|item| self.decode(item)).collect();
                Ok(Value::Array(decoded?))
            }
            scalar => Ok(scalar.clone()),
        }
    }

    /// An array is a time series iff every element is an object containing
    /// both `ts_key` (a string timestamp) and `ts_value` (a number).
    fn try_parse_series(&self, items: &[Value]) -> Result<Option<Series>> {
        if items.is_empty() {
            return Ok(None);
        }
        let mut observations = Vec::with_capacity(items.len());
        for item in items {
            let Some(obj) = item.as_object() else {
                return Ok(None);
            };
            let Some(ts) = obj.get(&self.ts_key).and_then(Value::as_str) else {
                return Ok(None);
            };
            let Some(v) = obj.get(&self.ts_value).and_then(Value::as_f64) else {
                return Ok(None);
            };
            let t = parse_iso8601(ts)?;
            observations.push(Observation { t, v });
        }
        Ok(Some(Series { observations }))
    }

    fn series_to_array(&self, series: &Series, ts_key: &str, ts_value: &str) -> Result<Value> {
        let items = series
            .observations
            .iter()
            .map(|o| {
                let mut obj = Map::with_capacity(2);
                obj.insert(ts_key.to_string(), Value::from(render_iso8601(o.t)));
                obj.insert(ts_value.to_string(), Value::from(o.v));
                Value::Object(obj)
            })
            .collect();
        Ok(Value::Array(items))
    }
}

pub(crate) fn render_iso8601(t: i64) -> String {
    let dt = DateTime::<Utc>::from_timestamp(t, 0)
        .unwrap_or_else(|| DateTime::<Utc>::from_timestamp(0, 0).expect("epoch is representable"));
    dt.format(ISO8601_FORMAT).to_string()
}

pub(crate) fn parse_iso8601(s: &str) -> Result<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc).timestamp());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, ISO8601_FORMAT) {
        return Ok(naive.and_utc().timestamp());
    }
    Err(Error::TimestampParse {
        value: s.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn sample_doc() -> Value {
        json!({
            "station": "A1",
            "relative_humidity_100m": (0..24).map(|h| json!({
                "UTC": format!("2024-01-01T{:02}:00:00Z", h),
                "value": 40.0 + (h % 5) as f64 / 10.0,
            })).collect::<Vec<_>>(),
            "metadata": { "unit": "%" },
        })
    }

    #[test]
    fn detects_and_rewrites_time_series_arrays() {
        let xf = JsonTransformer::new("UTC", "value", Base::B64);
        let doc = sample_doc();
        let encoded = xf.encode(&doc).unwrap();
        let series_field = &encoded["relative_humidity_100m"];
        assert_eq!(series_field["encoder"], "TimeSeriesEncoder");
        assert_eq!(encoded["station"], "A1");
        assert_eq!(encoded["metadata"]["unit"], "%");
    }

    #[test]
    fn idempotent_on_already_sorted_documents() {
        let xf = JsonTransformer::new("UTC", "value", Base::B64);
        let doc = sample_doc();
        let encoded = xf.encode(&doc).unwrap();
        let decoded = xf.decode(&encoded).unwrap();
        assert_eq!(doc, decoded);
    }

    #[test]
    fn non_time_series_arrays_are_recursed_not_rewritten() {
        let xf = JsonTransformer::new("UTC", "value", Base::B64);
        let doc = json!({ "tags": ["a", "b", "c"] });
        let encoded = xf.encode(&doc).unwrap();
        assert_eq!(encoded, doc);
    }

    #[test]
    fn unsorted_input_round_trips_only_with_sort_disabled() {
        let mut doc = sample_doc();
        // shuffle the series out of order
        let mut items = doc["relative_humidity_100m"].as_array().unwrap().clone();
        items.swap(0, 23);
        doc["relative_humidity_100m"] = Value::Array(items);

        let preserve_order = JsonTransformer::new("UTC", "value", Base::B64)
            .with_options(EncodeOptions { sort_values: false, precision: None });
        let encoded = preserve_order.encode(&doc).unwrap();
        let decoded = preserve_order.decode(&encoded).unwrap();
        assert_eq!(doc, decoded);
    }

    proptest! {
        #[test]
        fn sorted_series_documents_are_idempotent_under_encode_then_decode(
            hour_offsets in proptest::collection::btree_set(0u32..2000, 1..40),
            values in proptest::collection::vec(-500i64..500, 40),
        ) {
            let offsets: Vec<u32> = hour_offsets.into_iter().collect();
            let items: Vec<Value> = offsets
                .iter()
                .zip(values.iter())
                .map(|(h, v)| {
                    json!({
                        "UTC": render_iso8601(*h as i64 * 3600),
                        "value": *v as f64,
                    })
                })
                .collect();
            let doc = json!({ "series": items });

            let xf = JsonTransformer::new("UTC", "value", Base::B91);
            let encoded = xf.encode(&doc).unwrap();
            let decoded = xf.decode(&encoded).unwrap();
            prop_assert_eq!(decoded, doc);
        }
    }
}
