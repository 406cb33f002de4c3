//! Count beers per URL and report totals per path prefix.
//!
//! Input is one `<url> <count>` pair per line; lines without a count add 1.
//!
//! Usage:
//!   RUST_LOG=debug cargo run --example beer_report -- <path_to_counts> [prefix...]

use cellar::{BeerCellar, Dweller};
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::time::Instant;

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| {
        eprintln!("Usage: beer_report <path_to_counts> [prefix...]");
        std::process::exit(1);
    });
    let mut prefixes: Vec<String> = args.collect();
    if prefixes.is_empty() {
        prefixes.push("/".to_string());
    }

    println!("Loading counts from: {}", path);

    let file = File::open(&path).unwrap_or_else(|e| {
        eprintln!("Failed to open {}: {}", path, e);
        std::process::exit(1);
    });
    let reader = BufReader::new(file);

    let mut cellar = BeerCellar::default();
    let mut skipped = 0usize;
    let mut loaded = 0usize;
    let mut truncated = false;
    let start = Instant::now();
    for (n, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            // Not UTF-8; the reader is still positioned after the line.
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                log::warn!("line {}: {}", n + 1, e);
                skipped += 1;
                continue;
            }
            Err(e) => {
                log::warn!("read failed at line {}: {}", n + 1, e);
                truncated = true;
                break;
            }
        };
        let mut fields = line.split_whitespace();
        let Some(url) = fields.next() else { continue };
        let count = match fields.next().map(str::parse::<u64>) {
            None => 1,
            Some(Ok(n)) => n,
            Some(Err(e)) => {
                log::warn!("bad count on line {:?}: {}", line, e);
                skipped += 1;
                continue;
            }
        };
        match cellar.get(url) {
            Ok(barrel) => {
                barrel.add(count);
                loaded += 1;
            }
            Err(e) => {
                log::warn!("{}", e);
                skipped += 1;
            }
        }
    }

    println!(
        "Loaded {} lines ({} skipped) into {} nodes in {:?}",
        loaded,
        skipped,
        cellar.len(),
        start.elapsed()
    );
    if truncated {
        eprintln!("Input was truncated by a read error; totals cover the lines above only");
    }

    println!("\n{:<40} {:>12}", "Prefix", "Beers");
    println!("{}", "-".repeat(53));
    for prefix in &prefixes {
        let node = match cellar.find(prefix) {
            Ok(Some(node)) => node,
            Ok(None) => {
                println!("{:<40} {:>12}", prefix, 0);
                continue;
            }
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };
        let node = match cellar.dweller(node) {
            Ok(barrel) => barrel.node(),
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };
        match cellar.get_down(node, &HashSet::new()) {
            Ok(total) => println!("{:<40} {:>12}", prefix, total.count),
            Err(e) => eprintln!("{}", e),
        }
    }
}
