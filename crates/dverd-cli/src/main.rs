mod commands;
mod dataverse;
mod reader;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use dverd_core::{parse_string, validate, SchemaModel};
use reader::{read_erd_files, read_project_config};

#[derive(Parser)]
#[command(
    name = "dverd",
    version,
    about = "ERD to Dataverse migrator — parse .erd, .dbml files and create the schema they declare"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse ERD files and output the schema model as JSON
    Parse {
        /// Input path (file or directory, defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Write output to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate ERD files and report diagnostics
    Validate {
        /// Input path (file or directory, defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format: human (default) or json
        #[arg(long, default_value = "human")]
        format: String,
    },

    /// Dry-run the migration and show what would be created
    Plan {
        /// Input path (file or directory, defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Publisher prefix, e.g. mb_ (defaults to config)
        #[arg(long)]
        prefix: Option<String>,

        /// Output format: human (default) or json
        #[arg(long, default_value = "human")]
        format: String,
    },

    /// Create option sets, tables and relationships in a Dataverse environment
    Apply {
        /// Input path (file or directory, defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Publisher prefix, e.g. mb_ (defaults to config)
        #[arg(long)]
        prefix: Option<String>,

        /// Environment URL, e.g. https://org.crm.dynamics.com (defaults to config)
        #[arg(long)]
        url: Option<String>,

        /// Bearer token (defaults to the DATAVERSE_TOKEN environment variable)
        #[arg(long)]
        token: Option<String>,

        /// Output format: human (default) or json
        #[arg(long, default_value = "human")]
        format: String,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { path, output } => match run_parse(&path, output.as_deref()) {
            Ok(json) => {
                if output.is_none() {
                    println!("{json}");
                }
            }
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        },
        Commands::Validate { path, format } => match run_validate(&path, &format) {
            Ok((output, error_count)) => {
                println!("{output}");
                if error_count > 0 {
                    process::exit(1);
                }
            }
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        },
        Commands::Plan {
            path,
            prefix,
            format,
        } => {
            let prefix = match resolved_prefix(prefix, &path) {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
            match commands::plan::run_plan(&path, &prefix, &format) {
                Ok((output, problem_count)) => {
                    println!("{output}");
                    if problem_count > 0 {
                        process::exit(1);
                    }
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            }
        }
        Commands::Apply {
            path,
            prefix,
            url,
            token,
            format,
        } => {
            let prefix = match resolved_prefix(prefix, &path) {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
            match commands::apply::run_apply(&path, &prefix, url, token, &format) {
                Ok((output, failed_count)) => {
                    println!("{output}");
                    if failed_count > 0 {
                        process::exit(1);
                    }
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            }
        }
    }
}

/// Parse every ERD file under the input path into one combined schema
/// model. Later files append to earlier ones; name lookups keep
/// first-declaration-wins semantics.
pub fn build_model(input_path: &Path) -> Result<SchemaModel, String> {
    let files = read_erd_files(input_path)?;

    if files.is_empty() {
        return Err(format!(
            "No ERD files (.erd, .dbml) found at: {}",
            input_path.display()
        ));
    }

    let mut merged: Option<SchemaModel> = None;
    for f in &files {
        let model = parse_string(&f.content, &f.path);
        merged = Some(match merged {
            None => model,
            Some(mut acc) => {
                acc.source = format!("{},{}", acc.source, model.source);
                acc.enums.extend(model.enums);
                acc.tables.extend(model.tables);
                acc.refs.extend(model.refs);
                acc.diagnostics.extend(model.diagnostics);
                acc
            }
        });
    }

    merged.ok_or_else(|| "No parsable input".to_string())
}

/// Publisher prefix: command-line flag first, then project config.
fn resolved_prefix(flag: Option<String>, input_path: &Path) -> Result<String, String> {
    if let Some(p) = flag {
        return Ok(p);
    }
    read_project_config(input_path)
        .and_then(|c| c.prefix)
        .ok_or_else(|| {
            "No publisher prefix: pass --prefix or set `prefix` in dverd.config.yaml".to_string()
        })
}

fn run_parse(input_path: &Path, output_file: Option<&Path>) -> Result<String, String> {
    let model = build_model(input_path)?;
    let json = serde_json::to_string_pretty(&model)
        .map_err(|e| format!("JSON serialization error: {e}"))?;

    if let Some(out_path) = output_file {
        std::fs::write(out_path, &json)
            .map_err(|e| format!("Failed to write {}: {e}", out_path.display()))?;
        return Ok(format!("Written to {}", out_path.display()));
    }

    Ok(json)
}

fn run_validate(input_path: &Path, format: &str) -> Result<(String, usize), String> {
    let model = build_model(input_path)?;
    let result = validate(&model);

    let error_count = result.errors.len();
    let warning_count = result.warnings.len();

    if format == "json" {
        let diagnostics: Vec<&dverd_core::Diagnostic> =
            result.errors.iter().chain(result.warnings.iter()).collect();
        let output = serde_json::json!({
            "diagnostics": diagnostics,
            "summary": {
                "errors": error_count,
                "warnings": warning_count,
            }
        });
        let json = serde_json::to_string_pretty(&output)
            .map_err(|e| format!("JSON serialization error: {e}"))?;
        return Ok((json, error_count));
    }

    // Human-readable format
    let mut lines: Vec<String> = Vec::new();

    for d in result.errors.iter().chain(result.warnings.iter()) {
        let severity = match d.severity {
            dverd_core::DiagnosticSeverity::Error => "error",
            dverd_core::DiagnosticSeverity::Warning => "warning",
        };
        lines.push(format!(
            "{}:{}:{} {}[{}]: {}",
            d.file, d.line, d.col, severity, d.code, d.message
        ));
    }

    let error_word = if error_count == 1 { "error" } else { "errors" };
    let warning_word = if warning_count == 1 {
        "warning"
    } else {
        "warnings"
    };
    lines.push(format!("{error_count} {error_word}, {warning_count} {warning_word}."));

    Ok((lines.join("\n"), error_count))
}
