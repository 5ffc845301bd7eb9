//! `ubj-fromjson` — encode JSON (stdin) to UBJSON (stdout).
//!
//! Usage:
//!   ubj-fromjson [--count] [--sort-keys]

use std::io::{self, Read, Write};

use ubjson::{encode_to_vec, EncodeOptions, UbjsonValue};

fn main() {
    let mut opts = EncodeOptions::default();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--count" => opts.container_count = true,
            "--sort-keys" => opts.sort_keys = true,
            _ => {}
        }
    }

    let mut buf = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut buf) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    let json: serde_json::Value = match serde_json::from_str(buf.trim()) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    match encode_to_vec(&UbjsonValue::from(json), &opts) {
        Ok(bytes) => {
            io::stdout().write_all(&bytes).unwrap();
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
