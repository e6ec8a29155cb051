use crate::catalogs::{
    scalar_type_for, DIR_MANY_TO_ONE, DIR_ONE_TO_MANY, LOOKUP_TYPE, NOT_NULL_MARKER, PERSON_TYPE,
    PK_MARKER,
};
use crate::lexer::extract;
use crate::types::*;

/// Parse ERD content into a schema model: enums, tables with classified
/// fields, and relationship declarations. Lookup injection and relationship
/// materialization happen later, in the resolver.
pub fn parse_string(content: &str, file: &str) -> SchemaModel {
    let raw = extract(content, file);
    interpret(raw, file)
}

/// Interpret raw capture groups into the schema model.
pub fn interpret(raw: RawErd, file: &str) -> SchemaModel {
    let mut diagnostics = raw.diagnostics;

    let mut enums: Vec<EnumDef> = Vec::new();
    for e in &raw.enums {
        if enums.iter().any(|known| known.name == e.name) {
            diagnostics.push(Diagnostic::warning(
                "DVERD-W004",
                file,
                e.line,
                1,
                format!("Duplicate enum name \"{}\"; first declaration kept", e.name),
            ));
            continue;
        }
        enums.push(EnumDef {
            name: e.name.clone(),
            values: dedup_values(&e.values),
            loc: SourceLocation {
                file: file.to_string(),
                line: e.line,
                col: 1,
            },
        });
    }

    let mut tables: Vec<TableDef> = Vec::new();
    for t in &raw.tables {
        let mut fields: Vec<FieldDef> = Vec::new();
        for rf in &t.fields {
            let Some(field) = interpret_field(rf, &enums, file) else {
                continue;
            };
            match fields.iter().position(|f| f.name == field.name) {
                Some(idx) => {
                    diagnostics.push(Diagnostic::warning(
                        "DVERD-W001",
                        file,
                        rf.line,
                        1,
                        format!(
                            "Duplicate field name \"{}\" in table \"{}\"; later definition wins",
                            field.name, t.name
                        ),
                    ));
                    fields[idx] = field;
                }
                None => fields.push(field),
            }
        }
        tables.push(TableDef {
            name: t.name.clone(),
            fields,
            loc: SourceLocation {
                file: file.to_string(),
                line: t.line,
                col: 1,
            },
        });
    }

    let refs = raw
        .refs
        .iter()
        .map(|r| RefDeclaration {
            from_table: r.from_table.clone(),
            from_field: r.from_field.clone(),
            direction: parse_direction(&r.dir),
            dir_token: r.dir.clone(),
            to_table: r.to_table.clone(),
            to_field: r.to_field.clone(),
            loc: SourceLocation {
                file: file.to_string(),
                line: r.line,
                col: 1,
            },
        })
        .collect();

    SchemaModel {
        source: file.to_string(),
        enums,
        tables,
        refs,
        diagnostics,
    }
}

fn parse_direction(token: &str) -> RefDirection {
    if token == DIR_ONE_TO_MANY {
        RefDirection::OneToMany
    } else if token == DIR_MANY_TO_ONE {
        RefDirection::ManyToOne
    } else {
        RefDirection::Unknown
    }
}

/// Decompose one field line into name, type token, and annotation text,
/// then classify. Lines with fewer than two tokens are dropped.
fn interpret_field(rf: &RawField, enums: &[EnumDef], file: &str) -> Option<FieldDef> {
    let (name, type_token, annotation) = split_field_line(&rf.raw)?;
    let markers = annotation_markers(annotation);

    let required = markers.iter().any(|m| m == NOT_NULL_MARKER);

    let kind = if markers.iter().any(|m| m == PK_MARKER) {
        FieldKind::PrimaryKey
    } else if let Some(e) = enums.iter().find(|e| e.name == type_token) {
        FieldKind::Enum {
            enum_name: e.name.clone(),
        }
    } else if type_token == LOOKUP_TYPE {
        // Only ever produced by the resolver's injection pass; a literal in
        // source is honored but resolves against nothing.
        FieldKind::Lookup {
            target_table: String::new(),
            target_field: String::new(),
        }
    } else if type_token == PERSON_TYPE {
        FieldKind::UserReference
    } else {
        FieldKind::Scalar {
            scalar: scalar_type_for(type_token),
        }
    };

    Some(FieldDef {
        name: name.to_string(),
        type_token: type_token.to_string(),
        required,
        kind,
        loc: SourceLocation {
            file: file.to_string(),
            line: rf.line,
            col: 1,
        },
    })
}

/// Split into at most three whitespace-separated parts: name, type, and
/// remainder-of-line annotation text.
fn split_field_line(raw: &str) -> Option<(&str, &str, &str)> {
    let trimmed = raw.trim();
    let (name, rest) = trimmed.split_once(char::is_whitespace)?;
    let rest = rest.trim_start();
    match rest.split_once(char::is_whitespace) {
        Some((ty, annotation)) => Some((name, ty, annotation.trim())),
        None => {
            if rest.is_empty() {
                None
            } else {
                Some((name, rest, ""))
            }
        }
    }
}

/// Marker tokens inside the annotation text: bracket characters stripped,
/// comma-separated, case-insensitive, whitespace-normalized.
fn annotation_markers(annotation: &str) -> Vec<String> {
    annotation
        .replace(['[', ']'], "")
        .split(',')
        .map(|m| {
            m.trim()
                .to_lowercase()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|m| !m.is_empty())
        .collect()
}

fn dedup_values(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for v in values {
        if !out.contains(v) {
            out.push(v.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_basic_table() {
        let model = parse_string(
            "Table Invoice {\n id GUID [pk]\n total Decimal [not null]\n note String\n}",
            "test.erd",
        );
        assert_eq!(model.tables.len(), 1);
        let t = &model.tables[0];
        assert_eq!(t.fields.len(), 3);
        assert_eq!(t.fields[0].kind, FieldKind::PrimaryKey);
        assert_eq!(
            t.fields[1].kind,
            FieldKind::Scalar {
                scalar: ScalarType::Decimal
            }
        );
        assert!(t.fields[1].required);
        assert!(!t.fields[2].required);
    }

    #[test]
    fn parse_enum_typed_field() {
        let model = parse_string(
            "Enum Status { Draft\nSent\nPaid }\nTable Invoice {\n id GUID [pk]\n status Status\n}",
            "test.erd",
        );
        let status = model.tables[0].field("status").unwrap();
        assert_eq!(
            status.kind,
            FieldKind::Enum {
                enum_name: "Status".into()
            }
        );
        assert_eq!(
            model.enum_def("Status").unwrap().values,
            vec!["Draft", "Sent", "Paid"]
        );
    }

    #[test]
    fn parse_person_field_deferred() {
        let model = parse_string("Table T {\n id GUID [pk]\n owner Person\n}", "test.erd");
        let owner = model.tables[0].field("owner").unwrap();
        assert_eq!(owner.kind, FieldKind::UserReference);
        assert!(owner.is_deferred());
    }

    #[test]
    fn parse_unknown_type_defaults_short_text() {
        let model = parse_string("Table T {\n id GUID [pk]\n x Widget\n}", "test.erd");
        assert_eq!(
            model.tables[0].field("x").unwrap().kind,
            FieldKind::Scalar {
                scalar: ScalarType::ShortText
            }
        );
    }

    #[test]
    fn parse_drops_short_lines() {
        let model = parse_string("Table T {\n id GUID [pk]\n loner\n}", "test.erd");
        assert_eq!(model.tables[0].fields.len(), 1);
    }

    #[test]
    fn parse_duplicate_field_last_wins() {
        let model = parse_string("Table T {\n id GUID [pk]\n x Int\n x Bool\n}", "test.erd");
        assert_eq!(model.tables[0].fields.len(), 2);
        assert_eq!(
            model.tables[0].field("x").unwrap().kind,
            FieldKind::Scalar {
                scalar: ScalarType::Boolean
            }
        );
        assert!(model.diagnostics.iter().any(|d| d.code == "DVERD-W001"));
    }

    #[test]
    fn parse_pk_wins_over_enum() {
        let model = parse_string(
            "Enum Status { A }\nTable T {\n status Status [pk]\n}",
            "test.erd",
        );
        assert_eq!(model.tables[0].fields[0].kind, FieldKind::PrimaryKey);
    }

    #[test]
    fn parse_required_marker_with_pk() {
        let model = parse_string("Table T {\n id GUID [pk, not null]\n}", "test.erd");
        let f = &model.tables[0].fields[0];
        assert_eq!(f.kind, FieldKind::PrimaryKey);
        assert!(f.required);
    }

    #[test]
    fn parse_enum_dedups_values() {
        let model = parse_string("Enum S { A\nB\nA\n}", "test.erd");
        assert_eq!(model.enum_def("S").unwrap().values, vec!["A", "B"]);
    }

    #[test]
    fn parse_ref_directions() {
        let model = parse_string(
            "Ref: \"A\".\"id\" < \"B\".\"aid\"\nRef: \"B\".\"aid\" > \"A\".\"id\"\nRef: \"A\".\"id\" <> \"B\".\"aid\"",
            "test.erd",
        );
        assert_eq!(model.refs.len(), 3);
        assert_eq!(model.refs[0].direction, RefDirection::OneToMany);
        assert_eq!(model.refs[1].direction, RefDirection::ManyToOne);
        assert_eq!(model.refs[2].direction, RefDirection::Unknown);
    }

    #[test]
    fn parsing_is_idempotent() {
        let src = "Enum Status { Draft\nSent }\nTable Invoice {\n id GUID [pk]\n status Status\n}\nRef: \"Customer\".\"id\" < \"Invoice\".\"customerid\"";
        let a = parse_string(src, "test.erd");
        let b = parse_string(src, "test.erd");
        assert_eq!(a, b);
    }
}
