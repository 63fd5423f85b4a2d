// Integration tests exercising the public API end to end: a JSON document
// with an embedded time series, and a CSV table with two key columns.

use serde_json::json;
use tscodec::{Base, CsvTransformer, EncodeOptions, JsonTransformer};

#[test]
fn json_document_round_trips_through_encode_and_decode() {
    let doc = json!({
        "station": "KSFO",
        "temperature_2m": (0..48).map(|h| json!({
            "time": format!("2024-03-01T{:02}:00:00Z", h % 24),
            "value": 12.0 + (h % 6) as f64 * 0.5,
        })).collect::<Vec<_>>(),
        "units": "celsius",
    });

    let xf = JsonTransformer::new("time", "value", Base::B91);
    let encoded = xf.encode(&doc).unwrap();
    assert_eq!(encoded["temperature_2m"]["encoder"], "TimeSeriesEncoder");

    let decoded = xf.decode(&encoded).unwrap();
    assert_eq!(decoded, doc);
}

#[test]
fn json_document_with_sorted_series_round_trips_with_sort_enabled() {
    let mut doc = json!({
        "readings": (0..10).map(|h| json!({
            "time": format!("2024-06-01T{:02}:00:00Z", h),
            "value": h as f64,
        })).collect::<Vec<_>>(),
    });
    let mut items = doc["readings"].as_array().unwrap().clone();
    items.reverse();
    doc["readings"] = serde_json::Value::Array(items);

    let xf = JsonTransformer::new("time", "value", Base::B64).with_options(EncodeOptions {
        sort_values: true,
        precision: None,
    });
    let encoded = xf.encode(&doc).unwrap();
    let decoded = xf.decode(&encoded).unwrap();

    let mut expected = doc["readings"].as_array().unwrap().clone();
    expected.sort_by_key(|v| v["time"].as_str().unwrap().to_string());
    assert_eq!(decoded["readings"], serde_json::Value::Array(expected));
}

#[test]
fn csv_table_round_trips_through_encode_and_decode() {
    let mut csv_text = String::from("timestamp,sensor,reading,flag\n");
    for day in 1..=5 {
        for sensor in ["north", "south"] {
            csv_text.push_str(&format!(
                "2024-02-{day:02}T00:00:00Z,{sensor},{:.2},0\n",
                10.0 + day as f64 * 0.25
            ));
        }
    }

    let xf = CsvTransformer::new("timestamp", vec!["sensor".to_string()], Base::B64);
    let frame = xf.encode(&csv_text).unwrap();
    assert_eq!(frame["encoder"], "CSVEncoder");
    assert_eq!(frame["dictionary"].as_array().unwrap().len(), 2);

    let decoded = CsvTransformer::decode(&frame).unwrap();
    let mut original_lines: Vec<&str> = csv_text.lines().collect();
    let mut decoded_lines: Vec<&str> = decoded.lines().collect();
    original_lines.sort();
    decoded_lines.sort();
    assert_eq!(original_lines, decoded_lines);
}
