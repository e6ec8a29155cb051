use std::path::Path;

use dverd_core::{resolve, run, validate, MemoryClient};

use crate::build_model;
use crate::commands::render_summary;

/// Dry-run the migration against an in-memory environment and report what
/// a real apply would create. Validation errors short-circuit the plan.
pub fn run_plan(input_path: &Path, prefix: &str, format: &str) -> Result<(String, usize), String> {
    let model = build_model(input_path)?;
    let result = validate(&model);

    if !result.errors.is_empty() {
        let lines: Vec<String> = result
            .errors
            .iter()
            .map(|d| format!("{}:{}:{} error[{}]: {}", d.file, d.line, d.col, d.code, d.message))
            .collect();
        return Ok((lines.join("\n"), result.errors.len()));
    }

    for d in &result.warnings {
        log::warn!("{}:{}:{} [{}] {}", d.file, d.line, d.col, d.code, d.message);
    }

    let schema = resolve(model, prefix);
    let mut client = MemoryClient::new();
    let summary = run(&schema, prefix, &mut client);

    let output = render_summary(&summary, format)?;
    Ok((output, summary.failed_total()))
}
