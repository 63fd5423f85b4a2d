// Tabular encode/decode: factors CSV rows into a time-offset stream, a
// dictionary-coded key-tuple stream, and independently-solved per-column
// value streams, fused into one frame.

use std::collections::HashMap;

use serde_json::{json, Map, Value};

use crate::alphabet::Base;
use crate::json::{parse_iso8601, render_iso8601};
use crate::numeric::{NumericCodec, NumericKind, NumericParams};
use crate::params::{FrameParamSolver, ValueSolution};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy)]
pub struct CsvOptions {
    pub sort_values: bool,
    /// Serialize an explicit decimal precision for every varying value
    /// column instead of relying on the [`crate::precision_probe`]
    /// heuristic. Recommended for interop (spec.md §9).
    pub precision: Option<u32>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            sort_values: false,
            precision: None,
        }
    }
}

enum ColumnMeta {
    Varying { params: NumericParams },
    Static { value: f64, precision: u32 },
}

pub struct CsvTransformer {
    time_column: String,
    key_columns: Vec<String>,
    base: Base,
    opts: CsvOptions,
}

impl CsvTransformer {
    pub fn new(time_column: impl Into<String>, key_columns: Vec<String>, base: Base) -> Self {
        Self {
            time_column: time_column.into(),
            key_columns,
            base,
            opts: CsvOptions::default(),
        }
    }

    pub fn with_options(mut self, opts: CsvOptions) -> Self {
        self.opts = opts;
        self
    }

    /// Parses `csv_text` and produces the fused CSV frame described by
    /// spec.md §6.2.
    pub fn encode(&self, csv_text: &str) -> Result<Value> {
        let mut reader = csv::ReaderBuilder::new().from_reader(csv_text.as_bytes());
        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(|s| s.to_string())
            .collect();

        let time_idx = column_index(&columns, &self.time_column, "time_column")?;
        let key_indices: Vec<usize> = self
            .key_columns
            .iter()
            .map(|k| column_index(&columns, k, "key_columns"))
            .collect::<Result<_>>()?;
        let value_indices: Vec<usize> = (0..columns.len())
            .filter(|i| *i != time_idx && !key_indices.contains(i))
            .collect();

        let mut times: Vec<i64> = Vec::new();
        let mut keys: Vec<Vec<String>> = Vec::new();
        let mut value_columns: Vec<Vec<f64>> = vec![Vec::new(); value_indices.len()];

        for record in reader.records() {
            let record = record?;
            let t = parse_iso8601(record.get(time_idx).unwrap_or(""))?;
            times.push(t);
            keys.push(
                key_indices
                    .iter()
                    .map(|i| record.get(*i).unwrap_or("").to_string())
                    .collect(),
            );
            for (col, idx) in value_indices.iter().enumerate() {
                let raw = record.get(*idx).unwrap_or("0");
                let v: f64 = raw.parse().map_err(|_| Error::InconsistentHeader {
                    field: "value",
                    reason: format!("column {} value {:?} is not numeric", columns[*idx], raw),
                })?;
                value_columns[col].push(v);
            }
        }

        let row_count = times.len();
        if row_count == 0 {
            return Err(Error::InconsistentHeader {
                field: "data",
                reason: "CSV must contain at least one row".into(),
            });
        }

        // stable-sort all parallel streams together by timestamp if requested
        let mut order: Vec<usize> = (0..row_count).collect();
        if self.opts.sort_values {
            order.sort_by_key(|&i| times[i]);
        }
        let times: Vec<i64> = order.iter().map(|&i| times[i]).collect();
        let keys: Vec<Vec<String>> = order.iter().map(|&i| keys[i].clone()).collect();
        let value_columns: Vec<Vec<f64>> = value_columns
            .into_iter()
            .map(|col| order.iter().map(|&i| col[i]).collect())
            .collect();

        let start = *times.iter().min().unwrap();
        let max_offset = times.iter().map(|t| t - start).max().unwrap_or(0);
        let time_width = NumericParams::min_width(self.base, max_offset as f64);
        let time_params = NumericParams {
            kind: NumericKind::Int,
            precision: 0,
            signed: false,
            width: time_width,
            base: self.base,
        };
        let time_codec = NumericCodec::new(time_params);

        // dictionary of distinct key-tuples in first-seen order
        let mut dictionary: Vec<Vec<String>> = Vec::new();
        let mut dict_index: HashMap<Vec<String>, usize> = HashMap::new();
        let key_indices_per_row: Vec<usize> = keys
            .iter()
            .map(|tuple| {
                *dict_index.entry(tuple.clone()).or_insert_with(|| {
                    dictionary.push(tuple.clone());
                    dictionary.len() - 1
                })
            })
            .collect();
        let key_width = NumericParams::min_width(self.base, (dictionary.len().max(1) - 1) as f64);
        let key_params = NumericParams {
            kind: NumericKind::Int,
            precision: 0,
            signed: false,
            width: key_width,
            base: self.base,
        };
        let key_codec = NumericCodec::new(key_params);

        // solve each value column independently
        let mut metas = Vec::with_capacity(value_indices.len());
        let mut codecs: Vec<Option<NumericCodec>> = Vec::with_capacity(value_indices.len());
        for col in &value_columns {
            match FrameParamSolver::solve_value_list(col, self.base, self.opts.precision) {
                ValueSolution::Static { value, .. } => {
                    let precision = crate::precision_probe(value).1;
                    metas.push(ColumnMeta::Static { value, precision });
                    codecs.push(None);
                }
                ValueSolution::Varying { params } => {
                    metas.push(ColumnMeta::Varying { params });
                    codecs.push(Some(NumericCodec::new(params)));
                }
            }
        }

        let time_offsets: Vec<f64> = times.iter().map(|t| (t - start) as f64).collect();
        let time_tokens = time_codec.encode(&time_offsets)?;
        let key_tokens = key_codec.encode(&key_indices_per_row.iter().map(|i| *i as f64).collect::<Vec<_>>())?;
        let mut value_tokens_per_col: Vec<Option<String>> = Vec::with_capacity(codecs.len());
        for (col, codec) in value_columns.iter().zip(codecs.iter()) {
            value_tokens_per_col.push(match codec {
                Some(c) => Some(c.encode(col)?),
                None => None,
            });
        }

        let mut data = String::new();
        for row in 0..row_count {
            data.push_str(&time_tokens[row * time_width as usize..(row + 1) * time_width as usize]);
            data.push_str(&key_tokens[row * key_width as usize..(row + 1) * key_width as usize]);
            for (meta, tokens) in metas.iter().zip(value_tokens_per_col.iter()) {
                if let (ColumnMeta::Varying { params }, Some(tokens)) = (meta, tokens) {
                    let w = params.width as usize;
                    data.push_str(&tokens[row * w..(row + 1) * w]);
                }
            }
        }

        let columns_meta: Vec<Value> = value_indices
            .iter()
            .zip(metas.iter())
            .map(|(idx, meta)| match meta {
                ColumnMeta::Varying { params } => json!({
                    "name": columns[*idx],
                    "kind": if params.kind == NumericKind::Int { "int" } else { "float" },
                    "precision": params.precision,
                    "signed": params.signed,
                    "width": params.width,
                }),
                ColumnMeta::Static { value, precision } => json!({
                    "name": columns[*idx],
                    "static_value": value,
                    "precision": precision,
                }),
            })
            .collect();

        let dictionary_json: Vec<Value> = dictionary
            .iter()
            .map(|tuple| Value::Array(tuple.iter().map(|s| Value::from(s.clone())).collect()))
            .collect();

        Ok(json!({
            "encoder": "CSVEncoder",
            "columns": columns,
            "time_column": self.time_column,
            "key_columns": self.key_columns,
            "encoding_size": self.base.as_u32(),
            "start": start,
            "time_width": time_width,
            "key_width": key_width,
            "dictionary": dictionary_json,
            "columns_meta": columns_meta,
            "row_count": row_count,
            "data": data,
        }))
    }

    /// Rebuilds the original CSV text (canonical formatting, original column
    /// order) from a frame produced by [`Self::encode`].
    pub fn decode(frame: &Value) -> Result<String> {
        let obj = frame.as_object().ok_or_else(|| Error::InconsistentHeader {
            field: "<root>",
            reason: "CSV frame must be a JSON object".into(),
        })?;
        match obj.get("encoder").and_then(Value::as_str) {
            Some("CSVEncoder") => {}
            _ => {
                return Err(Error::InconsistentHeader {
                    field: "encoder",
                    reason: "missing or unexpected discriminator".into(),
                })
            }
        }

        let columns = str_array(obj, "columns")?;
        let time_column = required_str(obj, "time_column")?.to_string();
        let key_columns = str_array(obj, "key_columns")?;
        let base = Base::from_size(required_u64(obj, "encoding_size")? as u32)?;
        let start = required_i64(obj, "start")?;
        let time_width = required_u64(obj, "time_width")? as u32;
        let key_width = required_u64(obj, "key_width")? as u32;
        let row_count = required_u64(obj, "row_count")? as usize;
        let data = required_str(obj, "data")?.to_string();

        let dictionary: Vec<Vec<String>> = obj
            .get("dictionary")
            .and_then(Value::as_array)
            .ok_or(Error::InconsistentHeader {
                field: "dictionary",
                reason: "missing dictionary".into(),
            })?
            .iter()
            .map(|entry| {
                entry
                    .as_array()
                    .map(|arr| arr.iter().filter_map(Value::as_str).map(String::from).collect())
                    .unwrap_or_default()
            })
            .collect();

        let columns_meta = obj
            .get("columns_meta")
            .and_then(Value::as_array)
            .ok_or(Error::InconsistentHeader {
                field: "columns_meta",
                reason: "missing columns_meta".into(),
            })?;

        let time_codec = NumericCodec::new(NumericParams {
            kind: NumericKind::Int,
            precision: 0,
            signed: false,
            width: time_width,
            base,
        });
        let key_codec = NumericCodec::new(NumericParams {
            kind: NumericKind::Int,
            precision: 0,
            signed: false,
            width: key_width,
            base,
        });

        enum Col {
            Varying { name: String, codec: NumericCodec, width: usize },
            Static { name: String, value: f64, precision: u32 },
        }
        let mut cols = Vec::with_capacity(columns_meta.len());
        for meta in columns_meta {
            let meta = meta.as_object().ok_or(Error::InconsistentHeader {
                field: "columns_meta",
                reason: "entry must be an object".into(),
            })?;
            let name = required_str(meta, "name")?.to_string();
            if let Some(value) = meta.get("static_value").and_then(Value::as_f64) {
                let precision = meta.get("precision").and_then(Value::as_u64).unwrap_or(0) as u32;
                cols.push(Col::Static { name, value, precision });
            } else {
                let kind = if meta.get("kind").and_then(Value::as_str) == Some("int") {
                    NumericKind::Int
                } else {
                    NumericKind::Float
                };
                let precision = required_u64(meta, "precision")? as u32;
                let signed = meta.get("signed").and_then(Value::as_bool).unwrap_or(false);
                let width = required_u64(meta, "width")? as u32;
                let codec = NumericCodec::new(NumericParams {
                    kind,
                    precision,
                    signed,
                    width,
                    base,
                });
                cols.push(Col::Varying {
                    name,
                    codec,
                    width: width as usize,
                });
            }
        }

        let row_width = time_width as usize
            + key_width as usize
            + cols
                .iter()
                .map(|c| match c {
                    Col::Varying { width, .. } => *width,
                    Col::Static { .. } => 0,
                })
                .sum::<usize>();
        if row_width == 0 || data.len() != row_count * row_width {
            return Err(Error::MalformedInput {
                field: "data",
                len: data.len(),
                width: row_width,
            });
        }

        let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
        writer.write_record(&columns)?;

        for row in 0..row_count {
            let row_str = &data[row * row_width..(row + 1) * row_width];
            let mut cursor = 0usize;
            let t_off = time_codec.decode(&row_str[cursor..cursor + time_width as usize])?[0];
            cursor += time_width as usize;
            let key_idx = key_codec.decode(&row_str[cursor..cursor + key_width as usize])?[0] as usize;
            cursor += key_width as usize;

            let key_tuple = dictionary.get(key_idx).ok_or(Error::InconsistentHeader {
                field: "dictionary",
                reason: format!("row references unknown key index {key_idx}"),
            })?;

            let mut rendered: HashMap<&str, String> = HashMap::new();
            rendered.insert(time_column.as_str(), render_iso8601(start + t_off as i64));
            for (name, value) in key_columns.iter().zip(key_tuple.iter()) {
                rendered.insert(name.as_str(), value.clone());
            }
            for col in &cols {
                match col {
                    Col::Varying { name, codec, width } => {
                        let v = codec.decode(&row_str[cursor..cursor + width])?[0];
                        cursor += width;
                        rendered.insert(name.as_str(), format_value(v, codec.params()));
                    }
                    Col::Static { name, value, precision } => {
                        rendered.insert(name.as_str(), format_static(*value, *precision));
                    }
                }
            }

            let record: Vec<String> = columns
                .iter()
                .map(|c| rendered.get(c.as_str()).cloned().unwrap_or_default())
                .collect();
            writer.write_record(&record)?;
        }

        let bytes = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn format_value(v: f64, params: &NumericParams) -> String {
    match params.kind {
        NumericKind::Int => format!("{}", v.round() as i64),
        NumericKind::Float => format!("{:.*}", params.precision as usize, v),
    }
}

fn format_static(v: f64, precision: u32) -> String {
    if precision == 0 {
        format!("{}", v.round() as i64)
    } else {
        format!("{:.*}", precision as usize, v)
    }
}

fn column_index(columns: &[String], name: &str, field: &'static str) -> Result<usize> {
    columns
        .iter()
        .position(|c| c == name)
        .ok_or(Error::InconsistentHeader {
            field,
            reason: format!("column {name:?} not found in header"),
        })
}

fn required_str<'a>(obj: &'a Map<String, Value>, field: &'static str) -> Result<&'a str> {
    obj.get(field)
        .and_then(Value::as_str)
        .ok_or(Error::InconsistentHeader {
            field,
            reason: "missing required string field".into(),
        })
}

fn required_i64(obj: &Map<String, Value>, field: &'static str) -> Result<i64> {
    obj.get(field)
        .and_then(Value::as_i64)
        .ok_or(Error::InconsistentHeader {
            field,
            reason: "missing required integer field".into(),
        })
}

fn required_u64(obj: &Map<String, Value>, field: &'static str) -> Result<u64> {
    obj.get(field)
        .and_then(Value::as_u64)
        .ok_or(Error::InconsistentHeader {
            field,
            reason: "missing required unsigned integer field".into(),
        })
}

fn str_array(obj: &Map<String, Value>, field: &'static str) -> Result<Vec<String>> {
    obj.get(field)
        .and_then(Value::as_array)
        .ok_or(Error::InconsistentHeader {
            field,
            reason: "missing required array field".into(),
        })?
        .iter()
        .map(|v| {
            v.as_str()
                .map(String::from)
                .ok_or(Error::InconsistentHeader {
                    field,
                    reason: "array entry is not a string".into(),
                })
        })
        .collect()
}
