//! A compact, textual codec for numeric time series and tabular data.
//!
//! Built over a configurable positional alphabet (base 16, 64 or 91), the
//! crate is organized bottom-up:
//!
//! - [`alphabet`] — the fixed digit tables and their inverse.
//! - [`numeric`] — fixed-width positional encoding of a batch of numbers.
//! - [`precision`] — detects the minimal decimal scale needed to represent a value exactly.
//! - [`params`] — derives codec parameters from a batch of observations.
//! - [`series`] — the self-describing time-series frame.
//! - [`json`] — recursive JSON document rewriting.
//! - [`csv_transform`] — tabular CSV encode/decode.

mod alphabet;
mod csv_transform;
mod json;
mod numeric;
mod params;
mod precision;
mod series;

pub use alphabet::{Alphabet, Base};
pub use csv_transform::CsvTransformer;
pub use json::JsonTransformer;
pub use numeric::{NumericCodec, NumericKind, NumericParams};
pub use params::{FrameParamSolver, TimeSolution, ValueSolution};
pub use precision::probe as precision_probe;
pub use series::{EncodeOptions, Frame, FrameVariant, Observation, Series, TimeSeriesCodec};

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("value {value} out of range [{min}, {max}) for field {field}")]
    OutOfRange {
        field: &'static str,
        value: String,
        min: String,
        max: String,
    },
    #[error("malformed input in field {field}: length {len} is not a multiple of width {width}")]
    MalformedInput {
        field: &'static str,
        len: usize,
        width: usize,
    },
    #[error("byte {byte:#04x} at offset {offset} is not part of the declared alphabet")]
    UnknownSymbol { byte: u8, offset: usize },
    #[error("inconsistent frame header: {reason} (field: {field})")]
    InconsistentHeader { field: &'static str, reason: String },
    #[error("unsupported alphabet size: {size}, only 16, 64 and 91 are supported")]
    UnsupportedAlphabet { size: u32 },
    #[error("could not parse timestamp: {value}")]
    TimestampParse { value: String },
    #[error("JSON error")]
    Json(#[from] serde_json::Error),
    #[error("CSV error")]
    Csv(#[from] csv::Error),
    #[error("I/O operation failed")]
    Io(#[from] std::io::Error),
}
