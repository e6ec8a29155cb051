use crate::catalogs::{LOOKUP_TYPE, USER_ENTITY, USER_ENTITY_KEY};
use crate::types::*;

/// Schema model with relationships materialized, ready for emission.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSchema {
    pub model: SchemaModel,
    /// Table-to-table lookup relationships, in declaration order.
    pub relationships: Vec<ResolvedRelationship>,
    /// User-reference relationships, in table/field order.
    pub user_relationships: Vec<ResolvedRelationship>,
}

/// Run both resolution phases: lookup injection, then relationship and
/// user-reference materialization against the injected model.
pub fn resolve(model: SchemaModel, prefix: &str) -> ResolvedSchema {
    let model = inject_lookups(model);
    let relationships = resolve_relationships(&model, prefix);
    let user_relationships = resolve_user_references(&model, prefix);
    ResolvedSchema {
        model,
        relationships,
        user_relationships,
    }
}

/// Phase A: for every declaration in the effectful direction, inject a
/// synthetic lookup field named `<oneSideTable>id` into the many-side
/// table, unless a field of that name already exists.
pub fn inject_lookups(mut model: SchemaModel) -> SchemaModel {
    let refs = model.refs.clone();
    for r in &refs {
        if r.direction != RefDirection::OneToMany {
            continue;
        }

        let Some(one_side) = model.table(&r.from_table) else {
            model.diagnostics.push(unknown_endpoint(r, &r.from_table));
            continue;
        };
        let injected_name = format!("{}id", one_side.display_name().to_lowercase());

        if model.table(&r.to_table).is_none() {
            model.diagnostics.push(unknown_endpoint(r, &r.to_table));
            continue;
        }

        let loc = r.loc.clone();
        let field = FieldDef {
            name: injected_name,
            type_token: LOOKUP_TYPE.to_string(),
            required: false,
            kind: FieldKind::Lookup {
                target_table: r.from_table.clone(),
                target_field: r.from_field.clone(),
            },
            loc,
        };

        if let Some(many_side) = model.table_mut(&r.to_table) {
            if many_side.field(&field.name).is_none() {
                many_side.fields.push(field);
            }
        }
    }
    model
}

fn unknown_endpoint(r: &RefDeclaration, table: &str) -> Diagnostic {
    Diagnostic::warning(
        "DVERD-W003",
        &r.loc.file,
        r.loc.line,
        r.loc.col,
        format!("Reference endpoint \"{}\" is not a declared table", table),
    )
}

/// Phase B: expand each effectful declaration with both endpoints known
/// into a concrete lookup relationship with final naming.
///
/// Naming: endpoint logical names are reserved-marker aware; the
/// relationship schema name keeps the declared casing; the lookup column
/// schema name is the prefixed lower-cased many-side field concatenated
/// with the relationship schema name.
pub fn resolve_relationships(model: &SchemaModel, prefix: &str) -> Vec<ResolvedRelationship> {
    let mut out = Vec::new();
    for r in &model.refs {
        if r.direction != RefDirection::OneToMany {
            continue;
        }
        let (Some(one_side), Some(many_side)) = (model.table(&r.from_table), model.table(&r.to_table))
        else {
            continue;
        };

        let schema_name = format!(
            "{}{}_{}",
            prefix,
            one_side.display_name(),
            many_side.display_name()
        );
        out.push(ResolvedRelationship {
            referenced_entity: one_side.schema_name(prefix),
            referenced_attribute: one_side.attribute_schema_name(prefix, &r.from_field),
            referencing_entity: many_side.schema_name(prefix),
            lookup_schema_name: format!("{}{}{}", prefix, r.to_field.to_lowercase(), schema_name),
            lookup_field_name: r.to_field.clone(),
            schema_name,
        });
    }
    out
}

/// Every field classified as a user reference produces one relationship
/// against the platform's built-in user entity. Structurally identical to
/// a lookup relationship, but the referenced side is a constant.
pub fn resolve_user_references(model: &SchemaModel, prefix: &str) -> Vec<ResolvedRelationship> {
    let mut out = Vec::new();
    for table in &model.tables {
        for field in &table.fields {
            if field.kind != FieldKind::UserReference {
                continue;
            }
            let schema_name = format!("{}{}_{}", prefix, table.display_name(), field.name);
            out.push(ResolvedRelationship {
                referenced_entity: USER_ENTITY.to_string(),
                referenced_attribute: USER_ENTITY_KEY.to_string(),
                referencing_entity: table.schema_name(prefix),
                lookup_schema_name: format!(
                    "{}{}{}",
                    prefix,
                    field.name.to_lowercase(),
                    schema_name
                ),
                lookup_field_name: field.name.clone(),
                schema_name,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_string;
    use pretty_assertions::assert_eq;

    const PREFIX: &str = "mb_";

    fn model(src: &str) -> SchemaModel {
        parse_string(src, "test.erd")
    }

    #[test]
    fn inject_lookup_into_many_side() {
        let m = inject_lookups(model(
            "Table Customer {\n id GUID [pk]\n}\nTable Invoice {\n id GUID [pk]\n}\nRef: \"Customer\".\"id\" < \"Invoice\".\"customerid\"",
        ));
        let invoice = m.table("Invoice").unwrap();
        let injected = invoice.field("customerid").expect("lookup injected");
        assert_eq!(
            injected.kind,
            FieldKind::Lookup {
                target_table: "Customer".into(),
                target_field: "id".into()
            }
        );
        // One side untouched
        assert_eq!(m.table("Customer").unwrap().fields.len(), 1);
    }

    #[test]
    fn inject_skips_existing_field() {
        let m = inject_lookups(model(
            "Table Customer {\n id GUID [pk]\n}\nTable Invoice {\n id GUID [pk]\n customerid GUID\n}\nRef: \"Customer\".\"id\" < \"Invoice\".\"customerid\"",
        ));
        let invoice = m.table("Invoice").unwrap();
        assert_eq!(invoice.fields.len(), 2);
        // Pre-existing declaration keeps its scalar classification
        assert_eq!(
            invoice.field("customerid").unwrap().kind,
            FieldKind::Scalar {
                scalar: ScalarType::Identifier
            }
        );
    }

    #[test]
    fn inverse_direction_injects_nothing() {
        let m = inject_lookups(model(
            "Table Customer {\n id GUID [pk]\n}\nTable Invoice {\n id GUID [pk]\n}\nRef: \"Invoice\".\"customerid\" > \"Customer\".\"id\"",
        ));
        assert_eq!(m.table("Invoice").unwrap().fields.len(), 1);
        assert_eq!(m.table("Customer").unwrap().fields.len(), 1);
    }

    #[test]
    fn unknown_direction_injects_nothing() {
        let m = inject_lookups(model(
            "Table A {\n id GUID [pk]\n}\nTable B {\n id GUID [pk]\n}\nRef: \"A\".\"id\" <> \"B\".\"aid\"",
        ));
        assert_eq!(m.table("B").unwrap().fields.len(), 1);
    }

    #[test]
    fn unknown_endpoint_warns_and_skips() {
        let m = inject_lookups(model(
            "Table Invoice {\n id GUID [pk]\n}\nRef: \"Customer\".\"id\" < \"Invoice\".\"customerid\"",
        ));
        assert!(m.diagnostics.iter().any(|d| d.code == "DVERD-W003"));
        assert_eq!(m.table("Invoice").unwrap().fields.len(), 1);
    }

    #[test]
    fn resolve_relationship_naming() {
        let resolved = resolve(
            model(
                "Table Customer {\n id GUID [pk]\n}\nTable Invoice {\n id GUID [pk]\n}\nRef: \"Customer\".\"id\" < \"Invoice\".\"customerid\"",
            ),
            PREFIX,
        );
        assert_eq!(resolved.relationships.len(), 1);
        let rel = &resolved.relationships[0];
        assert_eq!(rel.schema_name, "mb_Customer_Invoice");
        assert_eq!(rel.referenced_entity, "mb_customer");
        assert_eq!(rel.referenced_attribute, "mb_id");
        assert_eq!(rel.referencing_entity, "mb_invoice");
        assert_eq!(rel.lookup_schema_name, "mb_customeridmb_Customer_Invoice");
        assert_eq!(rel.lookup_field_name, "customerid");
    }

    #[test]
    fn resolve_reserved_endpoint_unprefixed() {
        let resolved = resolve(
            model(
                "Table existing_Account {\n accountid GUID [pk]\n}\nTable Invoice {\n id GUID [pk]\n}\nRef: \"existing_Account\".\"accountid\" < \"Invoice\".\"accountid\"",
            ),
            PREFIX,
        );
        let rel = &resolved.relationships[0];
        assert_eq!(rel.referenced_entity, "account");
        assert_eq!(rel.referenced_attribute, "accountid");
        assert_eq!(rel.referencing_entity, "mb_invoice");
        assert_eq!(rel.schema_name, "mb_Account_Invoice");
    }

    #[test]
    fn resolve_user_reference() {
        let resolved = resolve(
            model("Table Task {\n id GUID [pk]\n assignee Person\n}"),
            PREFIX,
        );
        assert_eq!(resolved.user_relationships.len(), 1);
        let rel = &resolved.user_relationships[0];
        assert_eq!(rel.referenced_entity, "systemuser");
        assert_eq!(rel.referenced_attribute, "systemuserid");
        assert_eq!(rel.referencing_entity, "mb_task");
        assert_eq!(rel.schema_name, "mb_Task_assignee");
        assert_eq!(rel.lookup_field_name, "assignee");
    }

    #[test]
    fn resolve_is_deterministic() {
        let src = "Table A {\n id GUID [pk]\n}\nTable B {\n id GUID [pk]\n owner Person\n}\nRef: \"A\".\"id\" < \"B\".\"aid\"";
        let a = resolve(model(src), PREFIX);
        let b = resolve(model(src), PREFIX);
        assert_eq!(a, b);
    }
}
