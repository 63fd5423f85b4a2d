// Small utility that encodes or decodes a JSON document containing embedded
// time series, using the tscodec library. Mirrors the shape of a document
// produced by a weather or sensor feed: a time/value array nested under an
// arbitrary key.

use std::path::PathBuf;

use clap::Parser;
use tscodec::{Base, JsonTransformer};

#[derive(Parser, Debug)]
#[command(name = "tscodec-cli")]
#[command(version)]
#[command(about = "Encodes or decodes time series embedded in a JSON document.", long_about = None)]
struct Args {
    #[arg(value_name = "INPUT", index = 1)]
    input: PathBuf,

    #[arg(long, value_enum, default_value = "encode")]
    mode: Mode,

    #[arg(long, default_value = "time")]
    ts_key: String,

    #[arg(long, default_value = "value")]
    ts_value: String,

    #[arg(long, default_value = "64")]
    base: u32,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum Mode {
    Encode,
    Decode,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let text = std::fs::read_to_string(&args.input)?;
    let doc: serde_json::Value = serde_json::from_str(&text)?;

    let base = Base::from_size(args.base)?;
    let xf = JsonTransformer::new(args.ts_key, args.ts_value, base);
    let out = match args.mode {
        Mode::Encode => xf.encode(&doc)?,
        Mode::Decode => xf.decode(&doc)?,
    };

    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
