//! `health` command.

use anyhow::Result;

use crate::config::PipelineConfig;
use crate::health;

/// Print the health report. Exits non-zero when the repository is missing.
pub fn handle_health(config: &PipelineConfig, json: bool) -> Result<i32> {
    let report = health::check(config);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        health::print_report(&report, config)?;
    }

    Ok(if report.is_healthy() { 0 } else { 1 })
}
