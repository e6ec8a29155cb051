pub mod apply;
pub mod plan;

use dverd_core::driver::{CategorySummary, Outcome};
use dverd_core::RunSummary;

/// Render a convergence summary as human-readable text or JSON.
pub fn render_summary(summary: &RunSummary, format: &str) -> Result<String, String> {
    if format == "json" {
        return serde_json::to_string_pretty(summary)
            .map_err(|e| format!("JSON serialization error: {e}"));
    }

    let mut lines: Vec<String> = Vec::new();
    render_category(&mut lines, "Option sets", &summary.option_sets);
    render_category(&mut lines, "Tables", &summary.tables);
    render_category(&mut lines, "Relationships", &summary.relationships);
    Ok(lines.join("\n"))
}

fn render_category(lines: &mut Vec<String>, title: &str, category: &CategorySummary) {
    lines.push(format!(
        "{}: {} created, {} existing, {} failed",
        title,
        category.created(),
        category.existed(),
        category.failed()
    ));
    for item in &category.outcomes {
        match &item.outcome {
            Outcome::Created { .. } => lines.push(format!("  + {} (created)", item.name)),
            Outcome::Existed { .. } => lines.push(format!("  = {} (exists)", item.name)),
            Outcome::Failed { message } => lines.push(format!("  ! {}: {}", item.name, message)),
        }
    }
}
