use std::env;
use std::path::Path;

use dverd_core::{resolve, run, validate};

use crate::build_model;
use crate::commands::render_summary;
use crate::dataverse::DataverseClient;
use crate::reader::read_project_config;

const TOKEN_ENV: &str = "DATAVERSE_TOKEN";

/// Run the migration against a real Dataverse environment. Validation
/// errors abort before any remote call is made.
pub fn run_apply(
    input_path: &Path,
    prefix: &str,
    url_flag: Option<String>,
    token_flag: Option<String>,
    format: &str,
) -> Result<(String, usize), String> {
    let url = match url_flag {
        Some(u) => u,
        None => read_project_config(input_path)
            .and_then(|c| c.url)
            .ok_or_else(|| {
                "No environment URL: pass --url or set `url` in dverd.config.yaml".to_string()
            })?,
    };

    let token = match token_flag {
        Some(t) => t,
        None => env::var(TOKEN_ENV)
            .map_err(|_| format!("No access token: pass --token or set {TOKEN_ENV}"))?,
    };

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

    let schema = resolve(model, prefix);
    let mut client = DataverseClient::new(&url, &token)?;
    let summary = run(&schema, prefix, &mut client);

    let output = render_summary(&summary, format)?;
    Ok((output, summary.failed_total()))
}
