use std::collections::HashMap;

use thiserror::Error;

use crate::catalogs::OPTION_VALUE_BASE;
use crate::payload::*;
use crate::types::*;

/// Data errors during payload generation. Each aborts only the object it
/// names, never the whole run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerateError {
    #[error("table \"{table}\" has no primary-key field to derive a display field from")]
    MissingPrimaryKey { table: String },
}

/// Schema name of the global option set generated for an enum.
pub fn option_set_name(prefix: &str, enum_name: &str) -> String {
    format!("{}{}", prefix, enum_name.to_lowercase())
}

/// Build the option-set payload for one enum. The first value receives the
/// base offset; each subsequent value increments by one. Values are never
/// renumbered across runs: an existing option set skips generation
/// entirely.
pub fn option_set_payload(e: &EnumDef, prefix: &str) -> OptionSetPayload {
    let options = e
        .values
        .iter()
        .enumerate()
        .map(|(i, v)| OptionPayload {
            value: OPTION_VALUE_BASE + i as i32,
            label: Label::new(v),
        })
        .collect();
    OptionSetPayload::new(option_set_name(prefix, &e.name), Label::new(&e.name), options)
}

/// Build the table payload: the primary-key field becomes the primary
/// display-name attribute, enum fields become picklists bound to their
/// global option sets, deferred fields (lookup, person) are excluded, and
/// scalars map per the type table.
///
/// `option_set_ids` is the registry of option sets created or found so far,
/// keyed by schema name.
pub fn table_payload(
    table: &TableDef,
    option_set_ids: &HashMap<String, String>,
    prefix: &str,
) -> Result<TablePayload, GenerateError> {
    let pk = table
        .primary_key()
        .ok_or_else(|| GenerateError::MissingPrimaryKey {
            table: table.name.clone(),
        })?;

    let mut attributes = vec![AttributePayload::String {
        schema_name: table.attribute_schema_name(prefix, &pk.name),
        display_name: Label::new(&pk.name),
        required_level: RequiredLevel::from_required(true),
        max_length: 100,
        is_primary_name: Some(true),
    }];

    for field in &table.fields {
        if field.is_primary_key() || field.is_deferred() {
            continue;
        }
        let schema_name = table.attribute_schema_name(prefix, &field.name);
        let display_name = Label::new(&field.name);
        let required_level = RequiredLevel::from_required(field.required);

        match &field.kind {
            FieldKind::Enum { enum_name } => {
                let set_name = option_set_name(prefix, enum_name);
                let Some(set_id) = option_set_ids.get(&set_name) else {
                    log::warn!(
                        "option set {} for field {}.{} has no remote identifier; attribute skipped",
                        set_name,
                        table.name,
                        field.name
                    );
                    continue;
                };
                attributes.push(AttributePayload::Picklist {
                    schema_name,
                    display_name,
                    required_level,
                    global_option_set_bind: format!("/GlobalOptionSetDefinitions({})", set_id),
                });
            }
            FieldKind::Scalar { scalar } => {
                attributes.push(scalar_attribute(
                    *scalar,
                    schema_name,
                    display_name,
                    required_level,
                ));
            }
            FieldKind::PrimaryKey
            | FieldKind::Lookup { .. }
            | FieldKind::UserReference => unreachable!("filtered above"),
        }
    }

    Ok(TablePayload {
        schema_name: table.schema_name(prefix),
        display_name: Label::new(table.display_name()),
        display_collection_name: Label::new(&format!("{}s", table.display_name())),
        ownership_type: "UserOwned".to_string(),
        has_activities: false,
        has_notes: false,
        attributes,
    })
}

fn scalar_attribute(
    scalar: ScalarType,
    schema_name: String,
    display_name: Label,
    required_level: RequiredLevel,
) -> AttributePayload {
    match scalar {
        ScalarType::Identifier => AttributePayload::UniqueIdentifier {
            schema_name,
            display_name,
            required_level,
        },
        ScalarType::ShortText => AttributePayload::String {
            schema_name,
            display_name,
            required_level,
            max_length: 100,
            is_primary_name: None,
        },
        ScalarType::LongText => AttributePayload::Memo {
            schema_name,
            display_name,
            required_level,
            max_length: 2000,
        },
        ScalarType::Integer => AttributePayload::Integer {
            schema_name,
            display_name,
            required_level,
        },
        ScalarType::Decimal => AttributePayload::Money {
            schema_name,
            display_name,
            required_level,
        },
        ScalarType::Boolean => AttributePayload::Boolean {
            schema_name,
            display_name,
            required_level,
            option_set: BooleanOptionSet::yes_no(),
        },
        ScalarType::DateTime => AttributePayload::DateTime {
            schema_name,
            display_name,
            required_level,
            format: "DateAndTime".to_string(),
        },
    }
}

/// Build the one-to-many relationship payload for a resolved relationship;
/// user-reference relationships use the same shape.
pub fn relationship_payload(rel: &ResolvedRelationship) -> RelationshipPayload {
    RelationshipPayload::one_to_many(
        rel.schema_name.clone(),
        rel.referenced_entity.clone(),
        rel.referenced_attribute.clone(),
        rel.referencing_entity.clone(),
        rel.lookup_schema_name.clone(),
        &rel.lookup_field_name,
    )
}
