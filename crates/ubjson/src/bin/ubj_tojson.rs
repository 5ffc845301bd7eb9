//! `ubj-tojson` — decode UBJSON (stdin) to JSON (stdout).
//!
//! Usage:
//!   ubj-tojson [--no-bytes]

use std::io::{self, Read, Write};

use ubjson::{decode_from_slice, DecodeOptions};

fn main() {
    let mut opts = DecodeOptions::default();
    for arg in std::env::args().skip(1) {
        if arg.as_str() == "--no-bytes" {
            opts.no_bytes = true;
        }
    }

    let mut buf = Vec::new();
    if let Err(e) = io::stdin().read_to_end(&mut buf) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    match decode_from_slice(&buf, opts) {
        Ok(value) => {
            let json = serde_json::Value::from(value);
            io::stdout().write_all(json.to_string().as_bytes()).unwrap();
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
