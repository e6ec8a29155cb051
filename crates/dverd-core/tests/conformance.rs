use dverd_core::{
    parse_string, resolve, run, validate, FieldKind, MemoryClient, Outcome, ResolvedSchema,
    ScalarType,
};

const PREFIX: &str = "mb_";

// ---------------------------------------------------------------------------
// Helper: full pipeline (parse → resolve) on one source
// ---------------------------------------------------------------------------
fn full_pipeline(input: &str, source: &str) -> ResolvedSchema {
    resolve(parse_string(input, source), PREFIX)
}

#[test]
fn conformance_invoicing_sample() {
    let input = include_str!("../../../samples/invoicing.erd");
    let schema = full_pipeline(input, "samples/invoicing.erd");
    let model = &schema.model;

    assert_eq!(model.enums.len(), 1);
    assert_eq!(model.tables.len(), 2);
    assert_eq!(model.refs.len(), 1);
    assert!(model.diagnostics.is_empty());

    let status = model.enum_def("Status").unwrap();
    assert_eq!(status.values, vec!["Draft", "Sent", "Paid"]);

    let customer = model.table("Customer").unwrap();
    assert_eq!(customer.fields.len(), 3);
    assert!(customer.field("id").unwrap().is_primary_key());
    let name = customer.field("name").unwrap();
    assert!(name.required);
    assert_eq!(
        name.kind,
        FieldKind::Scalar {
            scalar: ScalarType::ShortText
        }
    );

    let invoice = model.table("Invoice").unwrap();
    assert_eq!(
        invoice.field("status").unwrap().kind,
        FieldKind::Enum {
            enum_name: "Status".into()
        }
    );
    assert_eq!(invoice.field("owner").unwrap().kind, FieldKind::UserReference);
    // Lookup injected by the reference declaration
    assert_eq!(
        invoice.field("customerid").unwrap().kind,
        FieldKind::Lookup {
            target_table: "Customer".into(),
            target_field: "id".into()
        }
    );

    assert_eq!(schema.relationships.len(), 1);
    assert_eq!(schema.relationships[0].schema_name, "mb_Customer_Invoice");
    assert_eq!(schema.user_relationships.len(), 1);
    assert_eq!(schema.user_relationships[0].schema_name, "mb_Invoice_owner");
}

#[test]
fn conformance_invoicing_creation_run() {
    let input = include_str!("../../../samples/invoicing.erd");
    let schema = full_pipeline(input, "samples/invoicing.erd");
    let mut client = MemoryClient::new();

    let summary = run(&schema, PREFIX, &mut client);

    assert_eq!(summary.option_sets.created(), 1);
    assert_eq!(summary.tables.created(), 2);
    assert_eq!(summary.relationships.created(), 2);
    assert_eq!(summary.failed_total(), 0);

    // Invoice table payload: display field from pk, picklist bound, money
    // required; deferred fields absent.
    let invoice = client
        .created_tables
        .iter()
        .find(|t| t.schema_name == "mb_invoice")
        .unwrap();
    let names: Vec<&str> = invoice.attributes.iter().map(|a| a.schema_name()).collect();
    assert_eq!(
        names,
        vec!["mb_id", "mb_status", "mb_total", "mb_issued", "mb_notes"]
    );
    assert!(invoice.attributes[0].is_primary_name());

    // Relationship payload endpoints
    let rel = client
        .created_relationships
        .iter()
        .find(|r| r.schema_name == "mb_Customer_Invoice")
        .unwrap();
    assert_eq!(rel.referenced_entity, "mb_customer");
    assert_eq!(rel.referenced_attribute, "mb_id");
    assert_eq!(rel.referencing_entity, "mb_invoice");
    assert_eq!(
        rel.lookup.schema_name,
        "mb_customeridmb_Customer_Invoice"
    );

    let user_rel = client
        .created_relationships
        .iter()
        .find(|r| r.schema_name == "mb_Invoice_owner")
        .unwrap();
    assert_eq!(user_rel.referenced_entity, "systemuser");
    assert_eq!(user_rel.referenced_attribute, "systemuserid");
}

#[test]
fn conformance_invoicing_rerun_converges() {
    let input = include_str!("../../../samples/invoicing.erd");
    let schema = full_pipeline(input, "samples/invoicing.erd");
    let mut client = MemoryClient::new();

    let first = run(&schema, PREFIX, &mut client);
    let second = run(&schema, PREFIX, &mut client);

    assert_eq!(second.option_sets.created(), 0);
    assert_eq!(second.tables.created(), 0);
    assert_eq!(second.relationships.created(), 0);
    assert_eq!(second.option_sets.existed(), 1);
    assert_eq!(second.tables.existed(), 2);
    assert_eq!(second.relationships.existed(), 2);

    // Nothing was created twice
    assert_eq!(client.option_set_count(), 1);
    assert_eq!(client.table_count(), 2);
    assert_eq!(client.relationship_count(), 2);
    assert_eq!(first.registry, second.registry);

    for outcome in &second.tables.outcomes {
        assert!(matches!(outcome.outcome, Outcome::Existed { .. }));
    }
}

#[test]
fn conformance_crm_sample_reserved_table() {
    let input = include_str!("../../../samples/crm.erd");
    let schema = full_pipeline(input, "samples/crm.erd");
    let mut client = MemoryClient::new();

    let summary = run(&schema, PREFIX, &mut client);

    // The stock table is never created; the custom one is.
    assert_eq!(summary.tables.declared(), 1);
    assert_eq!(summary.tables.created(), 1);
    assert_eq!(client.created_tables[0].schema_name, "mb_project");

    // Relationship points at the stock table's bare logical names.
    let rel = client
        .created_relationships
        .iter()
        .find(|r| r.schema_name == "mb_Account_Project")
        .unwrap();
    assert_eq!(rel.referenced_entity, "account");
    assert_eq!(rel.referenced_attribute, "accountid");
    assert_eq!(rel.referencing_entity, "mb_project");

    assert!(client
        .created_relationships
        .iter()
        .any(|r| r.schema_name == "mb_Project_manager"));
}

#[test]
fn conformance_table_with_enum_and_required_field() {
    let input = "Enum Status { Draft\nSent\nPaid }\nTable Invoice {\n id GUID [pk]\n status Status\n total Decimal [not null]\n}";
    let schema = full_pipeline(input, "inline.erd");
    let model = &schema.model;

    let invoice = model.table("Invoice").unwrap();
    assert_eq!(invoice.fields.len(), 3);
    assert_eq!(
        invoice.field("status").unwrap().kind,
        FieldKind::Enum {
            enum_name: "Status".into()
        }
    );
    assert!(invoice.field("total").unwrap().required);
    assert!(invoice.field("id").unwrap().is_primary_key());

    let result = validate(model);
    assert!(result.errors.is_empty());
    assert!(result.warnings.is_empty());
}

#[test]
fn conformance_reference_injects_lookup() {
    let input = "Table Customer {\n id GUID [pk]\n}\nTable Invoice {\n id GUID [pk]\n}\nRef: \"Customer\".\"id\" < \"Invoice\".\"customerid\"";
    let schema = full_pipeline(input, "inline.erd");

    let invoice = schema.model.table("Invoice").unwrap();
    assert!(invoice.field("customerid").is_some());

    assert_eq!(schema.relationships.len(), 1);
    let rel = &schema.relationships[0];
    assert_eq!(rel.referencing_entity, "mb_invoice");
    assert_eq!(rel.referenced_entity, "mb_customer");
}

#[test]
fn conformance_diagnostics_do_not_abort() {
    // A broken table next to a good one: the good one still resolves and
    // gets created.
    let input = "Table Broken {\n name String\n}\nTable Good {\n id GUID [pk]\n}\nRef: bad ref line";
    let schema = full_pipeline(input, "inline.erd");

    let result = validate(&schema.model);
    assert!(result.errors.iter().any(|e| e.code == "DVERD-E004"));
    assert!(result.errors.iter().any(|e| e.code == "DVERD-E001"));

    let mut client = MemoryClient::new();
    let summary = run(&schema, PREFIX, &mut client);
    assert_eq!(summary.tables.created(), 1);
    assert_eq!(summary.tables.failed(), 1);
}

#[test]
fn conformance_model_serializes_to_json() {
    let input = include_str!("../../../samples/invoicing.erd");
    let model = parse_string(input, "samples/invoicing.erd");
    let json: serde_json::Value = serde_json::to_value(&model).unwrap();

    assert!(json["enums"].is_array());
    assert!(json["tables"].is_array());
    assert!(json["refs"].is_array());
    assert!(json["diagnostics"].is_array());

    let invoice = json["tables"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["name"] == "Invoice")
        .unwrap();
    let status = invoice["fields"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["name"] == "status")
        .unwrap();
    assert_eq!(status["kind"], "enum");
    assert_eq!(status["enumName"], "Status");
    assert_eq!(status["type"], "Status");
}
