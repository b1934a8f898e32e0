//! Runs the packaging line and prints a summary.
//!
//! Usage:
//!   cargo run --example packaging_line
//!   cargo run --example packaging_line -- configs/packaging_line.yaml
//!   cargo run --example packaging_line -- configs/packaging_line.yaml report.json

use linesim::{init_logging, Line, LineConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);

    let config = match args.next() {
        Some(path) => LineConfig::from_file(&path)?,
        None => LineConfig::default(),
    };

    init_logging(&config.simulation.log_level);

    let report = Line::new(&config)?.run()?;
    report.write_summary(std::io::stdout().lock())?;

    if let Some(out) = args.next() {
        report.to_json_file(&out)?;
        tracing::info!(path = %out, "report written");
    }

    Ok(())
}
