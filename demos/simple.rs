//! Writing a save table to jkr bytes and reading it back.
//!
//! Run with: cargo run --example simple

use serde_jkr::{framing, from_slice, table, to_bytes};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let save = table!({
        "GAME": { "round": 3, "dollars": 12, "won": false },
        "deck": { 1: "Ace of Spades", 2: "King of Hearts" },
        "VERSION": "1.0.1o",
    });

    let bytes = to_bytes(&save)?;
    let literal = framing::decompress(bytes.as_slice(), None)?;
    println!("{} compressed bytes", bytes.len());
    println!("literal:\n{}\n", String::from_utf8_lossy(&literal));

    let back = from_slice(&bytes)?;
    assert_eq!(back, save);

    for (key, value) in back.entries() {
        println!("{:?} = {:?}", key, value);
    }
    println!("✓ Round-trip successful");

    Ok(())
}
