// Encodes/decodes one (time, value) series as a self-describing frame:
// header metadata plus the concatenated body produced by NumericCodec.

use serde_json::{Map, Value};

use crate::alphabet::Base;
use crate::numeric::{NumericCodec, NumericKind, NumericParams};
use crate::params::{FrameParamSolver, TimeSolution, ValueSolution};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub t: i64,
    pub v: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub observations: Vec<Observation>,
}

#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    /// Stable-sort observations by timestamp before encoding.
    pub sort_values: bool,
    /// Serialize an explicit decimal precision instead of relying on the
    /// [`crate::precision_probe`] heuristic. Recommended for interop (spec.md §9).
    pub precision: Option<u32>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            sort_values: false,
            precision: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameVariant {
    RegularVarying {
        interval: i64,
        encoding_depth: u32,
        float_precision: u32,
        data: String,
    },
    IrregularVarying {
        time_encoding_depth: u32,
        encoding_depth: u32,
        float_precision: u32,
        data: String,
    },
    RegularStatic {
        interval: i64,
        static_value: f64,
        static_count: usize,
    },
    IrregularStatic {
        time_encoding_depth: u32,
        static_value: f64,
        static_count: usize,
        data: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub start: i64,
    pub ts_key: String,
    pub ts_value: String,
    pub encoding_size: u32,
    pub signed: bool,
    pub variant: FrameVariant,
}

impl Frame {
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("encoder".into(), Value::from("TimeSeriesEncoder"));
        obj.insert("start".into(), Value::from(self.start));
        obj.insert("ts_key".into(), Value::from(self.ts_key.clone()));
        obj.insert("ts_value".into(), Value::from(self.ts_value.clone()));
        obj.insert("encoding_size".into(), Value::from(self.encoding_size));
        if self.signed {
            obj.insert("signed".into(), Value::from(true));
        }
        match &self.variant {
            FrameVariant::RegularVarying {
                interval,
                encoding_depth,
                float_precision,
                data,
            } => {
                obj.insert("interval".into(), Value::from(*interval));
                obj.insert("encoding_depth".into(), Value::from(*encoding_depth));
                obj.insert("float_precision".into(), Value::from(*float_precision));
                obj.insert("data".into(), Value::from(data.clone()));
            }
            FrameVariant::IrregularVarying {
                time_encoding_depth,
                encoding_depth,
                float_precision,
                data,
            } => {
                obj.insert(
                    "time_encoding_depth".into(),
                    Value::from(*time_encoding_depth),
                );
                obj.insert("encoding_depth".into(), Value::from(*encoding_depth));
                obj.insert("float_precision".into(), Value::from(*float_precision));
                obj.insert("data".into(), Value::from(data.clone()));
            }
            FrameVariant::RegularStatic {
                interval,
                static_value,
                static_count,
            } => {
                obj.insert("interval".into(), Value::from(*interval));
                obj.insert("static_value".into(), Value::from(*static_value));
                obj.insert("static_count".into(), Value::from(*static_count as u64));
            }
            FrameVariant::IrregularStatic {
                time_encoding_depth,
                static_value,
                static_count,
                data,
            } => {
                obj.insert(
                    "time_encoding_depth".into(),
                    Value::from(*time_encoding_depth),
                );
                obj.insert("static_value".into(), Value::from(*static_value));
                obj.insert("static_count".into(), Value::from(*static_count as u64));
                obj.insert("data".into(), Value::from(data.clone()));
            }
        }
        Value::Object(obj)
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| Error::InconsistentHeader {
            field: "<root>",
            reason: "frame must be a JSON object".into(),
        })?;

        match obj.get("encoder").and_then(Value::as_str) {
            Some("TimeSeriesEncoder") => {}
            _ => {
                return Err(Error::InconsistentHeader {
                    field: "encoder",
                    reason: "missing or unexpected discriminator".into(),
                })
            }
        }

        let start = required_i64(obj, "start")?;
        let ts_key = required_str(obj, "ts_key")?.to_string();
        let ts_value = required_str(obj, "ts_value")?.to_string();
        let encoding_size = required_u64(obj, "encoding_size")? as u32;
        let signed = obj.get("signed").and_then(Value::as_bool).unwrap_or(false);

        // the static branch must be checked before the generic varying
        // branch: static frames never carry `encoding_depth`/`float_precision`.
        let variant = if obj.contains_key("static_count") {
            let static_value = required_f64(obj, "static_value")?;
            let static_count = required_u64(obj, "static_count")? as usize;
            if let Some(interval) = obj.get("interval") {
                let interval = interval.as_i64().ok_or_else(|| Error::InconsistentHeader {
                    field: "interval",
                    reason: "expected integer".into(),
                })?;
                FrameVariant::RegularStatic {
                    interval,
                    static_value,
                    static_count,
                }
            } else if obj.contains_key("time_encoding_depth") {
                let time_encoding_depth = required_u64(obj, "time_encoding_depth")? as u32;
                let data = required_str(obj, "data")?.to_string();
                FrameVariant::IrregularStatic {
                    time_encoding_depth,
                    static_value,
                    static_count,
                    data,
                }
            } else {
                return Err(Error::InconsistentHeader {
                    field: "interval|time_encoding_depth",
                    reason: "static frame declares neither regular nor irregular axis".into(),
                });
            }
        } else {
            let encoding_depth = required_u64(obj, "encoding_depth")? as u32;
            let float_precision = required_u64(obj, "float_precision")? as u32;
            let data = required_str(obj, "data")?.to_string();
            if let Some(interval) = obj.get("interval") {
                let interval = interval.as_i64().ok_or_else(|| Error::InconsistentHeader {
                    field: "interval",
                    reason: "expected integer".into(),
                })?;
                FrameVariant::RegularVarying {
                    interval,
                    encoding_depth,
                    float_precision,
                    data,
                }
            } else if obj.contains_key("time_encoding_depth") {
                let time_encoding_depth = required_u64(obj, "time_encoding_depth")? as u32;
                FrameVariant::IrregularVarying {
                    time_encoding_depth,
                    encoding_depth,
                    float_precision,
                    data,
                }
            } else {
                return Err(Error::InconsistentHeader {
                    field: "interval|time_encoding_depth",
                    reason: "varying frame declares neither regular nor irregular axis".into(),
                });
            }
        };

        Ok(Frame {
            start,
            ts_key,
            ts_value,
            encoding_size,
            signed,
            variant,
        })
    }
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

fn required_f64(obj: &Map<String, Value>, field: &'static str) -> Result<f64> {
    obj.get(field)
        .and_then(Value::as_f64)
        .ok_or(Error::InconsistentHeader {
            field,
            reason: "missing required numeric field".into(),
        })
}

pub struct TimeSeriesCodec;

impl TimeSeriesCodec {
    /// Solves for minimal parameters and produces a self-describing frame.
    pub fn encode(
        series: &Series,
        base: Base,
        ts_key: impl Into<String>,
        ts_value: impl Into<String>,
        opts: EncodeOptions,
    ) -> Result<Frame> {
        if series.observations.is_empty() {
            return Err(Error::InconsistentHeader {
                field: "observations",
                reason: "series must contain at least one observation".into(),
            });
        }

        let mut observations = series.observations.clone();
        if opts.sort_values {
            observations.sort_by_key(|o| o.t);
        }
        let series = Series { observations };
        let start = series.observations[0].t;

        let time_solution = FrameParamSolver::solve_time(&series, base);
        let value_solution = FrameParamSolver::solve_values(&series, base, opts.precision);
        let signed = matches!(&value_solution, ValueSolution::Varying { params } if params.signed);

        let variant = match (time_solution, value_solution) {
            (TimeSolution::Regular { interval }, ValueSolution::Varying { params }) => {
                let codec = NumericCodec::new(params);
                let values: Vec<f64> = series.observations.iter().map(|o| o.v).collect();
                let data = codec.encode(&values)?;
                FrameVariant::RegularVarying {
                    interval,
                    encoding_depth: params.width,
                    float_precision: params.precision,
                    data,
                }
            }
            (TimeSolution::Regular { interval }, ValueSolution::Static { value, count }) => {
                FrameVariant::RegularStatic {
                    interval,
                    static_value: value,
                    static_count: count,
                }
            }
            (
                TimeSolution::Irregular { params: tparams },
                ValueSolution::Varying { params: vparams },
            ) => {
                let tcodec = NumericCodec::new(tparams);
                let vcodec = NumericCodec::new(vparams);
                let offsets: Vec<f64> = series
                    .observations
                    .iter()
                    .map(|o| (o.t - start) as f64)
                    .collect();
                let values: Vec<f64> = series.observations.iter().map(|o| o.v).collect();
                let time_tokens = tcodec.encode(&offsets)?;
                let value_tokens = vcodec.encode(&values)?;
                let tw = tparams.width as usize;
                let vw = vparams.width as usize;
                let mut data = String::with_capacity(time_tokens.len() + value_tokens.len());
                for i in 0..offsets.len() {
                    data.push_str(&time_tokens[i * tw..(i + 1) * tw]);
                    data.push_str(&value_tokens[i * vw..(i + 1) * vw]);
                }
                FrameVariant::IrregularVarying {
                    time_encoding_depth: tparams.width,
                    encoding_depth: vparams.width,
                    float_precision: vparams.precision,
                    data,
                }
            }
            (TimeSolution::Irregular { params: tparams }, ValueSolution::Static { value, count }) => {
                let tcodec = NumericCodec::new(tparams);
                let offsets: Vec<f64> = series
                    .observations
                    .iter()
                    .map(|o| (o.t - start) as f64)
                    .collect();
                let data = tcodec.encode(&offsets)?;
                FrameVariant::IrregularStatic {
                    time_encoding_depth: tparams.width,
                    static_value: value,
                    static_count: count,
                    data,
                }
            }
        };

        Ok(Frame {
            start,
            ts_key: ts_key.into(),
            ts_value: ts_value.into(),
            encoding_size: base.as_u32(),
            signed,
            variant,
        })
    }

    /// Reconstructs a series from a frame using the frame's own embedded parameters.
    pub fn decode(frame: &Frame) -> Result<Series> {
        let base = Base::from_size(frame.encoding_size)?;
        let observations = match &frame.variant {
            FrameVariant::RegularVarying {
                interval,
                encoding_depth,
                float_precision,
                data,
            } => {
                let params = NumericParams {
                    kind: if *float_precision > 0 {
                        NumericKind::Float
                    } else {
                        NumericKind::Int
                    },
                    precision: *float_precision,
                    signed: frame.signed,
                    width: *encoding_depth,
                    base,
                };
                let codec = NumericCodec::new(params);
                codec
                    .decode(data)?
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| Observation {
                        t: frame.start + (i as i64) * interval,
                        v,
                    })
                    .collect()
            }
            FrameVariant::IrregularVarying {
                time_encoding_depth,
                encoding_depth,
                float_precision,
                data,
            } => {
                let tparams = NumericParams {
                    kind: NumericKind::Int,
                    precision: 0,
                    signed: false,
                    width: *time_encoding_depth,
                    base,
                };
                let vparams = NumericParams {
                    kind: if *float_precision > 0 {
                        NumericKind::Float
                    } else {
                        NumericKind::Int
                    },
                    precision: *float_precision,
                    signed: frame.signed,
                    width: *encoding_depth,
                    base,
                };
                let tw = *time_encoding_depth as usize;
                let vw = *encoding_depth as usize;
                let row = tw + vw;
                if row == 0 || data.len() % row != 0 {
                    return Err(Error::MalformedInput {
                        field: "data",
                        len: data.len(),
                        width: row,
                    });
                }
                let tcodec = NumericCodec::new(tparams);
                let vcodec = NumericCodec::new(vparams);
                let n = data.len() / row;
                let mut obs = Vec::with_capacity(n);
                for i in 0..n {
                    let row_str = &data[i * row..(i + 1) * row];
                    let t_off = tcodec.decode(&row_str[..tw])?[0];
                    let v = vcodec.decode(&row_str[tw..])?[0];
                    obs.push(Observation {
                        t: frame.start + t_off as i64,
                        v,
                    });
                }
                obs
            }
            FrameVariant::RegularStatic {
                interval,
                static_value,
                static_count,
            } => (0..*static_count)
                .map(|i| Observation {
                    t: frame.start + (i as i64) * interval,
                    v: *static_value,
                })
                .collect(),
            FrameVariant::IrregularStatic {
                time_encoding_depth,
                static_value,
                static_count,
                data,
            } => {
                let tparams = NumericParams {
                    kind: NumericKind::Int,
                    precision: 0,
                    signed: false,
                    width: *time_encoding_depth,
                    base,
                };
                let tcodec = NumericCodec::new(tparams);
                let offsets = tcodec.decode(data)?;
                if offsets.len() != *static_count {
                    return Err(Error::InconsistentHeader {
                        field: "static_count",
                        reason: format!(
                            "declared {} but data carries {} time tokens",
                            static_count,
                            offsets.len()
                        ),
                    });
                }
                offsets
                    .into_iter()
                    .map(|off| Observation {
                        t: frame.start + off as i64,
                        v: *static_value,
                    })
                    .collect()
            }
        };
        Ok(Series { observations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hourly_series(n: i64) -> Series {
        Series {
            observations: (0..n)
                .map(|i| Observation {
                    t: i * 3600,
                    v: 40.0 + (i % 10) as f64 / 10.0,
                })
                .collect(),
        }
    }

    #[test]
    fn s1_regular_hourly_series_base64() {
        let series = hourly_series(75);
        let frame = TimeSeriesCodec::encode(&series, Base::B64, "UTC", "value", EncodeOptions::default())
            .unwrap();
        match &frame.variant {
            FrameVariant::RegularVarying {
                interval,
                float_precision,
                ..
            } => {
                assert_eq!(*interval, 3600);
                assert_eq!(*float_precision, 1);
            }
            other => panic!("expected regular varying, got {other:?}"),
        }
        let decoded = TimeSeriesCodec::decode(&frame).unwrap();
        assert_eq!(decoded.observations.len(), series.observations.len());
        for (a, b) in series.observations.iter().zip(decoded.observations.iter()) {
            assert_eq!(a.t, b.t);
            assert!((a.v - b.v).abs() < 1e-9);
        }
    }

    #[test]
    fn s2_irregular_series_base91() {
        let mut series = hourly_series(75);
        series.observations.swap(0, 74);
        series.observations.swap(10, 50);
        let frame = TimeSeriesCodec::encode(&series, Base::B91, "UTC", "value", EncodeOptions::default())
            .unwrap();
        match &frame.variant {
            FrameVariant::IrregularVarying {
                time_encoding_depth,
                float_precision,
                ..
            } => {
                assert_eq!(*time_encoding_depth, 3);
                assert_eq!(*float_precision, 1);
            }
            other => panic!("expected irregular varying, got {other:?}"),
        }
        let decoded = TimeSeriesCodec::decode(&frame).unwrap();
        let mut expected = series.observations.clone();
        expected.sort_by_key(|o| o.t);
        let mut actual = decoded.observations.clone();
        actual.sort_by_key(|o| o.t);
        for (a, b) in expected.iter().zip(actual.iter()) {
            assert_eq!(a.t, b.t);
            assert!((a.v - b.v).abs() < 1e-9);
        }
    }

    /// The 143-row `relative_humidity_100m` sample from
    /// `original_source/tests/test_tse_json.py`'s `get_sample()`, in its
    /// native unsorted order (mostly chronological, with a tail of rows from
    /// the morning of the 12th spliced back in out of order). Used to pin
    /// the irregular/base-91 path against a real corpus rather than a
    /// synthetic series.
    fn relative_humidity_100m_sample() -> Series {
        const ROWS: &[(&str, f64)] = &[
            ("2021-04-12T02:00:00Z", 75.0),
            ("2021-04-12T03:00:00Z", 73.4),
            ("2021-04-12T04:00:00Z", 72.3),
            ("2021-04-13T03:00:00Z", 54.2),
            ("2021-04-13T04:00:00Z", 59.7),
            ("2021-04-13T05:00:00Z", 65.0),
            ("2021-04-13T06:00:00Z", 70.2),
            ("2021-04-13T07:00:00Z", 70.1),
            ("2021-04-13T08:00:00Z", 70.0),
            ("2021-04-13T09:00:00Z", 70.0),
            ("2021-04-13T10:00:00Z", 63.2),
            ("2021-04-13T11:00:00Z", 56.5),
            ("2021-04-13T12:00:00Z", 50.0),
            ("2021-04-13T13:00:00Z", 50.3),
            ("2021-04-13T14:00:00Z", 50.6),
            ("2021-04-13T15:00:00Z", 50.9),
            ("2021-04-13T16:00:00Z", 54.3),
            ("2021-04-13T17:00:00Z", 57.9),
            ("2021-04-13T18:00:00Z", 61.6),
            ("2021-04-13T19:00:00Z", 61.9),
            ("2021-04-13T20:00:00Z", 62.3),
            ("2021-04-13T21:00:00Z", 62.6),
            ("2021-04-13T22:00:00Z", 61.0),
            ("2021-04-13T23:00:00Z", 59.4),
            ("2021-04-14T00:00:00Z", 57.7),
            ("2021-04-12T05:00:00Z", 71.1),
            ("2021-04-12T06:00:00Z", 70.0),
            ("2021-04-12T07:00:00Z", 65.0),
            ("2021-04-12T08:00:00Z", 60.2),
            ("2021-04-12T09:00:00Z", 55.6),
            ("2021-04-12T10:00:00Z", 52.0),
            ("2021-04-12T11:00:00Z", 48.5),
            ("2021-04-12T12:00:00Z", 45.0),
            ("2021-04-12T13:00:00Z", 42.3),
            ("2021-04-12T14:00:00Z", 39.5),
            ("2021-04-12T15:00:00Z", 36.8),
            ("2021-04-12T16:00:00Z", 40.9),
            ("2021-04-12T17:00:00Z", 45.2),
            ("2021-04-12T18:00:00Z", 49.6),
            ("2021-04-12T19:00:00Z", 51.2),
            ("2021-04-12T20:00:00Z", 52.9),
            ("2021-04-12T21:00:00Z", 54.6),
            ("2021-04-12T22:00:00Z", 52.7),
            ("2021-04-12T23:00:00Z", 50.7),
            ("2021-04-13T00:00:00Z", 48.6),
            ("2021-04-13T01:00:00Z", 50.4),
            ("2021-04-13T02:00:00Z", 52.3),
            ("2021-04-14T01:00:00Z", 57.2),
            ("2021-04-14T02:00:00Z", 56.8),
            ("2021-04-14T03:00:00Z", 56.3),
            ("2021-04-14T04:00:00Z", 55.9),
            ("2021-04-14T05:00:00Z", 55.4),
            ("2021-04-14T06:00:00Z", 55.0),
            ("2021-04-14T07:00:00Z", 53.2),
            ("2021-04-14T08:00:00Z", 51.5),
            ("2021-04-14T09:00:00Z", 49.8),
            ("2021-04-14T10:00:00Z", 48.2),
            ("2021-04-14T11:00:00Z", 46.7),
            ("2021-04-14T12:00:00Z", 45.2),
            ("2021-04-14T13:00:00Z", 45.7),
            ("2021-04-14T14:00:00Z", 46.3),
            ("2021-04-14T15:00:00Z", 46.8),
            ("2021-04-14T16:00:00Z", 47.4),
            ("2021-04-14T17:00:00Z", 48.0),
            ("2021-04-14T18:00:00Z", 48.6),
            ("2021-04-14T19:00:00Z", 49.9),
            ("2021-04-14T20:00:00Z", 51.3),
            ("2021-04-14T21:00:00Z", 52.6),
            ("2021-04-14T22:00:00Z", 54.0),
            ("2021-04-14T23:00:00Z", 55.4),
            ("2021-04-15T00:00:00Z", 56.8),
            ("2021-04-15T01:00:00Z", 56.7),
            ("2021-04-15T02:00:00Z", 56.7),
            ("2021-04-15T03:00:00Z", 56.7),
            ("2021-04-15T04:00:00Z", 56.7),
            ("2021-04-15T05:00:00Z", 56.7),
            ("2021-04-15T06:00:00Z", 56.6),
            ("2021-04-15T07:00:00Z", 55.5),
            ("2021-04-15T08:00:00Z", 54.4),
            ("2021-04-15T09:00:00Z", 53.2),
            ("2021-04-15T10:00:00Z", 52.1),
            ("2021-04-15T11:00:00Z", 51.0),
            ("2021-04-15T12:00:00Z", 49.9),
            ("2021-04-15T13:00:00Z", 51.4),
            ("2021-04-15T14:00:00Z", 53.0),
            ("2021-04-15T15:00:00Z", 54.5),
            ("2021-04-15T16:00:00Z", 56.0),
            ("2021-04-15T17:00:00Z", 57.6),
            ("2021-04-15T18:00:00Z", 59.2),
            ("2021-04-15T19:00:00Z", 62.2),
            ("2021-04-15T20:00:00Z", 65.3),
            ("2021-04-15T21:00:00Z", 68.4),
            ("2021-04-15T22:00:00Z", 71.5),
            ("2021-04-15T23:00:00Z", 74.6),
            ("2021-04-16T00:00:00Z", 77.8),
            ("2021-04-16T01:00:00Z", 78.4),
            ("2021-04-16T02:00:00Z", 79.0),
            ("2021-04-16T03:00:00Z", 79.6),
            ("2021-04-16T04:00:00Z", 80.2),
            ("2021-04-16T05:00:00Z", 80.8),
            ("2021-04-16T06:00:00Z", 81.3),
            ("2021-04-16T07:00:00Z", 77.2),
            ("2021-04-16T08:00:00Z", 73.2),
            ("2021-04-16T09:00:00Z", 69.2),
            ("2021-04-16T10:00:00Z", 65.4),
            ("2021-04-16T11:00:00Z", 61.6),
            ("2021-04-16T12:00:00Z", 57.9),
            ("2021-04-16T13:00:00Z", 59.3),
            ("2021-04-16T14:00:00Z", 60.8),
            ("2021-04-16T15:00:00Z", 62.3),
            ("2021-04-16T16:00:00Z", 63.7),
            ("2021-04-16T17:00:00Z", 65.2),
            ("2021-04-16T18:00:00Z", 66.7),
            ("2021-04-16T19:00:00Z", 71.0),
            ("2021-04-16T20:00:00Z", 75.3),
            ("2021-04-16T21:00:00Z", 79.7),
            ("2021-04-16T22:00:00Z", 84.1),
            ("2021-04-16T23:00:00Z", 88.5),
            ("2021-04-17T00:00:00Z", 92.9),
            ("2021-04-17T01:00:00Z", 93.8),
            ("2021-04-17T02:00:00Z", 94.7),
            ("2021-04-17T03:00:00Z", 95.5),
            ("2021-04-17T04:00:00Z", 96.4),
            ("2021-04-17T05:00:00Z", 97.2),
            ("2021-04-17T06:00:00Z", 98.0),
            ("2021-04-17T07:00:00Z", 95.1),
            ("2021-04-17T08:00:00Z", 92.2),
            ("2021-04-17T09:00:00Z", 89.3),
            ("2021-04-17T10:00:00Z", 86.4),
            ("2021-04-17T11:00:00Z", 83.6),
            ("2021-04-17T12:00:00Z", 80.7),
            ("2021-04-17T13:00:00Z", 77.9),
            ("2021-04-17T14:00:00Z", 75.2),
            ("2021-04-17T15:00:00Z", 72.4),
            ("2021-04-17T16:00:00Z", 69.6),
            ("2021-04-17T17:00:00Z", 66.9),
            ("2021-04-17T18:00:00Z", 64.1),
            ("2021-04-17T19:00:00Z", 65.3),
            ("2021-04-17T20:00:00Z", 66.6),
            ("2021-04-17T21:00:00Z", 67.8),
            ("2021-04-17T22:00:00Z", 69.0),
            ("2021-04-17T23:00:00Z", 70.2),
            ("2021-04-18T00:00:00Z", 71.4),
        ];
        Series {
            observations: ROWS
                .iter()
                .map(|(ts, v)| Observation {
                    t: crate::json::parse_iso8601(*ts).unwrap(),
                    v: *v,
                })
                .collect(),
        }
    }

    #[test]
    fn s2_irregular_series_base91_real_corpus() {
        let series = relative_humidity_100m_sample();
        assert_eq!(series.observations.len(), 143);

        let frame = TimeSeriesCodec::encode(&series, Base::B91, "UTC", "Value", EncodeOptions::default())
            .unwrap();
        assert_eq!(frame.start, 1_618_192_800);
        assert!(!frame.signed);
        assert_eq!(frame.encoding_size, 91);

        let alphabet = crate::alphabet::Alphabet::new(Base::B91);
        match &frame.variant {
            FrameVariant::IrregularVarying {
                time_encoding_depth,
                encoding_depth,
                float_precision,
                data,
            } => {
                // matches the `time_encoding_depth`/`encoding_depth`/`float_precision`
                // declared by `get_encoded_sample_unsorted_base91` in
                // `original_source/tests/test_tse_json.py` for this exact dataset.
                assert_eq!(*time_encoding_depth, 3);
                assert_eq!(*encoding_depth, 2);
                assert_eq!(*float_precision, 1);
                assert_eq!(data.len(), series.observations.len() * 5);
                for (offset, byte) in data.bytes().enumerate() {
                    assert!(alphabet.inverse(byte, offset).is_ok());
                }
                // the first two rows are stable across the corpus's own
                // revisions: the series starts already sorted for its first
                // three observations, so these match the literal reference
                // frame's leading bytes byte-for-byte.
                assert_eq!(&data[0..5], "0008M");
                assert_eq!(&data[5..10], "0dp86");
            }
            other => panic!("expected irregular varying, got {other:?}"),
        }

        // round-trip through our own decode must reproduce every observation
        // exactly: this is the property a base-91 alphabet bug breaks.
        let decoded = TimeSeriesCodec::decode(&frame).unwrap();
        assert_eq!(decoded.observations.len(), series.observations.len());
        for (a, b) in series.observations.iter().zip(decoded.observations.iter()) {
            assert_eq!(a.t, b.t);
            assert!((a.v - b.v).abs() < 1e-9);
        }
    }

    #[test]
    fn s3_signed_round_trip_via_frame() {
        let series = Series {
            observations: (-32..32).map(|v| Observation { t: v as i64, v: v as f64 }).collect(),
        };
        let frame = TimeSeriesCodec::encode(&series, Base::B64, "t", "v", EncodeOptions::default())
            .unwrap();
        let decoded = TimeSeriesCodec::decode(&frame).unwrap();
        for (a, b) in series.observations.iter().zip(decoded.observations.iter()) {
            assert_eq!(a.v, b.v);
        }
    }

    #[test]
    fn s4_static_zero_series() {
        let series = Series {
            observations: (0..48)
                .map(|i| Observation {
                    t: i * 900,
                    v: 0.0,
                })
                .collect(),
        };
        let frame = TimeSeriesCodec::encode(&series, Base::B64, "t", "v", EncodeOptions::default())
            .unwrap();
        match &frame.variant {
            FrameVariant::RegularStatic {
                interval,
                static_value,
                static_count,
            } => {
                assert_eq!(*interval, 900);
                assert_eq!(*static_value, 0.0);
                assert_eq!(*static_count, 48);
            }
            other => panic!("expected regular static, got {other:?}"),
        }
        let decoded = TimeSeriesCodec::decode(&frame).unwrap();
        assert_eq!(decoded.observations.len(), 48);
        assert!(decoded.observations.iter().all(|o| o.v == 0.0));
    }

    #[test]
    fn frame_json_round_trips() {
        let series = hourly_series(10);
        let frame = TimeSeriesCodec::encode(&series, Base::B64, "t", "v", EncodeOptions::default())
            .unwrap();
        let json = frame.to_json();
        let parsed = Frame::from_json(&json).unwrap();
        assert_eq!(frame, parsed);
    }

    #[test]
    fn static_branch_recognized_before_varying_branch() {
        // a static frame without `data` must not be misparsed as varying.
        let value = serde_json::json!({
            "encoder": "TimeSeriesEncoder",
            "start": 0,
            "ts_key": "t",
            "ts_value": "v",
            "encoding_size": 64,
            "interval": 900,
            "static_value": 0.0,
            "static_count": 48
        });
        let frame = Frame::from_json(&value).unwrap();
        assert!(matches!(frame.variant, FrameVariant::RegularStatic { .. }));
    }
}
