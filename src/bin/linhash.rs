//! # LinHash CLI Entry Point
//!
//! Binary entry point for the linear-hashed file engine.
//!
//! ## Usage
//!
//! ```bash
//! # Create a two-attribute relation with one initial bucket
//! linhash create ./emps 2 1 0 0:0,1:0,0:1,1:1
//!
//! # Load tuples from a file
//! linhash insert ./emps < tuples.txt
//!
//! # Partial-match query: any tuple whose second attribute is "smith"
//! linhash select ./emps '?,smith'
//!
//! # Inspect bucket fill
//! linhash stats ./emps
//! ```

use std::env;

use eyre::Result;
use linhash::cli;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        None | Some("--help") | Some("-h") => {
            println!("{}", cli::usage());
            Ok(())
        }
        Some("--version") | Some("-v") => {
            println!("linhash {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(_) => cli::run(&args),
    }
}
