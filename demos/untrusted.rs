//! Reading a jkr file from an unknown source with bounded limits.
//!
//! Run with: cargo run --example untrusted [path]

use serde_jkr::{from_reader_with_options, table, to_bytes, DecodeOptions, Value};
use std::error::Error;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};

fn main() -> Result<(), Box<dyn Error>> {
    let options = DecodeOptions::new()
        .with_max_depth(64)
        .with_max_decompressed_size(16 * 1024 * 1024);

    let reader: Box<dyn Read> = match std::env::args().nth(1) {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => {
            let sample = table!({ "seed": "7LB2WVPK", "ante": 2, "stake": 1 });
            Box::new(Cursor::new(to_bytes(&sample)?))
        }
    };

    let table = match from_reader_with_options(reader, &options) {
        Ok(table) => table,
        Err(err) if err.is_framing() => {
            eprintln!("not a readable jkr stream: {}", err);
            return Ok(());
        }
        Err(err) => {
            eprintln!("rejected save: {}", err);
            return Ok(());
        }
    };

    let mut nested = 0;
    table.for_each(|key, value| {
        if let Value::Table(inner) = value {
            nested += 1;
            println!("{:?}: table with {} entries", key, inner.len());
        } else {
            println!("{:?}: {:?}", key, value);
        }
    });
    println!("{} top-level entries, {} nested tables", table.len(), nested);

    // A literal nested past the limit is refused, not parsed.
    let deep = format!("return {}{{}}{}", "{[1]=".repeat(100), "}".repeat(100));
    if let Err(err) = serde_jkr::from_literal_with_options(deep.as_bytes(), &options) {
        println!("deep literal: {}", err.to_string().lines().next().unwrap_or_default());
    }

    Ok(())
}
