use crate::types::*;

#[derive(Debug, Clone, PartialEq)]
pub struct ValidateResult {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

/// Validate a parsed schema model. Returns the parse-time diagnostics plus
/// semantic checks, split by severity. None of these abort a run: tables
/// without a primary key fail individually at generation time, and inert
/// references simply produce nothing.
pub fn validate(model: &SchemaModel) -> ValidateResult {
    let mut diagnostics: Vec<Diagnostic> = model.diagnostics.clone();

    for table in &model.tables {
        if !table.is_reserved() && table.primary_key().is_none() {
            diagnostics.push(Diagnostic::error(
                "DVERD-E004",
                &table.loc.file,
                table.loc.line,
                table.loc.col,
                format!(
                    "Table \"{}\" declares no primary-key field; no display field can be derived",
                    table.name
                ),
            ));
        }
    }

    for r in &model.refs {
        if r.direction == RefDirection::Unknown {
            diagnostics.push(Diagnostic::warning(
                "DVERD-W002",
                &r.loc.file,
                r.loc.line,
                r.loc.col,
                format!(
                    "Unrecognized direction \"{}\" in reference \"{}\".\"{}\" … \"{}\".\"{}\"; declaration has no effect",
                    r.dir_token, r.from_table, r.from_field, r.to_table, r.to_field
                ),
            ));
        }
    }

    for e in &model.enums {
        if e.values.is_empty() {
            diagnostics.push(Diagnostic::warning(
                "DVERD-W005",
                &e.loc.file,
                e.loc.line,
                e.loc.col,
                format!("Enum \"{}\" declares no values", e.name),
            ));
        }
    }

    let (errors, warnings) = diagnostics
        .into_iter()
        .partition(|d| d.severity == DiagnosticSeverity::Error);
    ValidateResult { errors, warnings }
}
