//! Typed payloads for the Dataverse Web API metadata endpoints. One variant
//! per remote object kind, so every required field is statically present.

use serde::{Deserialize, Serialize};

use crate::catalogs::LABEL_LANGUAGE_CODE;

const LABEL_TYPE: &str = "Microsoft.Dynamics.CRM.Label";
const LOCALIZED_LABEL_TYPE: &str = "Microsoft.Dynamics.CRM.LocalizedLabel";
const OPTION_SET_TYPE: &str = "Microsoft.Dynamics.CRM.OptionSetMetadata";
const BOOLEAN_OPTION_SET_TYPE: &str = "Microsoft.Dynamics.CRM.BooleanOptionSetMetadata";
const ONE_TO_MANY_TYPE: &str = "Microsoft.Dynamics.CRM.OneToManyRelationshipMetadata";
const LOOKUP_ATTRIBUTE_TYPE: &str = "Microsoft.Dynamics.CRM.LookupAttributeMetadata";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalizedLabel {
    #[serde(rename = "@odata.type")]
    pub odata_type: String,
    #[serde(rename = "Label")]
    pub label: String,
    #[serde(rename = "LanguageCode")]
    pub language_code: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    #[serde(rename = "@odata.type")]
    pub odata_type: String,
    #[serde(rename = "LocalizedLabels")]
    pub localized_labels: Vec<LocalizedLabel>,
}

impl Label {
    pub fn new(text: &str) -> Self {
        Label {
            odata_type: LABEL_TYPE.to_string(),
            localized_labels: vec![LocalizedLabel {
                odata_type: LOCALIZED_LABEL_TYPE.to_string(),
                label: text.to_string(),
                language_code: LABEL_LANGUAGE_CODE,
            }],
        }
    }

    pub fn text(&self) -> &str {
        self.localized_labels
            .first()
            .map(|l| l.label.as_str())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredLevel {
    #[serde(rename = "Value")]
    pub value: String,
    #[serde(rename = "CanBeChanged")]
    pub can_be_changed: bool,
    #[serde(rename = "ManagedPropertyLogicalName")]
    pub managed_property_logical_name: String,
}

impl RequiredLevel {
    pub fn from_required(required: bool) -> Self {
        RequiredLevel {
            value: if required {
                "ApplicationRequired".to_string()
            } else {
                "None".to_string()
            },
            can_be_changed: true,
            managed_property_logical_name: "canmodifyrequirementlevelsettings".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Option set
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionPayload {
    #[serde(rename = "Value")]
    pub value: i32,
    #[serde(rename = "Label")]
    pub label: Label,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSetPayload {
    #[serde(rename = "@odata.type")]
    pub odata_type: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "DisplayName")]
    pub display_name: Label,
    #[serde(rename = "IsGlobal")]
    pub is_global: bool,
    #[serde(rename = "OptionSetType")]
    pub option_set_type: String,
    #[serde(rename = "Options")]
    pub options: Vec<OptionPayload>,
}

impl OptionSetPayload {
    pub fn new(name: String, display_name: Label, options: Vec<OptionPayload>) -> Self {
        OptionSetPayload {
            odata_type: OPTION_SET_TYPE.to_string(),
            name,
            display_name,
            is_global: true,
            option_set_type: "Picklist".to_string(),
            options,
        }
    }
}

// ---------------------------------------------------------------------------
// Table attributes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooleanOptionSet {
    #[serde(rename = "@odata.type")]
    pub odata_type: String,
    #[serde(rename = "TrueOption")]
    pub true_option: OptionPayload,
    #[serde(rename = "FalseOption")]
    pub false_option: OptionPayload,
}

impl BooleanOptionSet {
    pub fn yes_no() -> Self {
        BooleanOptionSet {
            odata_type: BOOLEAN_OPTION_SET_TYPE.to_string(),
            true_option: OptionPayload {
                value: 1,
                label: Label::new("Yes"),
            },
            false_option: OptionPayload {
                value: 0,
                label: Label::new("No"),
            },
        }
    }
}

/// One variant per attribute metadata kind; the `@odata.type` tag drives
/// both serialization and remote dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@odata.type")]
pub enum AttributePayload {
    #[serde(rename = "Microsoft.Dynamics.CRM.StringAttributeMetadata")]
    String {
        #[serde(rename = "SchemaName")]
        schema_name: String,
        #[serde(rename = "DisplayName")]
        display_name: Label,
        #[serde(rename = "RequiredLevel")]
        required_level: RequiredLevel,
        #[serde(rename = "MaxLength")]
        max_length: u32,
        #[serde(rename = "IsPrimaryName", skip_serializing_if = "Option::is_none")]
        is_primary_name: Option<bool>,
    },
    #[serde(rename = "Microsoft.Dynamics.CRM.MemoAttributeMetadata")]
    Memo {
        #[serde(rename = "SchemaName")]
        schema_name: String,
        #[serde(rename = "DisplayName")]
        display_name: Label,
        #[serde(rename = "RequiredLevel")]
        required_level: RequiredLevel,
        #[serde(rename = "MaxLength")]
        max_length: u32,
    },
    #[serde(rename = "Microsoft.Dynamics.CRM.IntegerAttributeMetadata")]
    Integer {
        #[serde(rename = "SchemaName")]
        schema_name: String,
        #[serde(rename = "DisplayName")]
        display_name: Label,
        #[serde(rename = "RequiredLevel")]
        required_level: RequiredLevel,
    },
    #[serde(rename = "Microsoft.Dynamics.CRM.MoneyAttributeMetadata")]
    Money {
        #[serde(rename = "SchemaName")]
        schema_name: String,
        #[serde(rename = "DisplayName")]
        display_name: Label,
        #[serde(rename = "RequiredLevel")]
        required_level: RequiredLevel,
    },
    #[serde(rename = "Microsoft.Dynamics.CRM.BooleanAttributeMetadata")]
    Boolean {
        #[serde(rename = "SchemaName")]
        schema_name: String,
        #[serde(rename = "DisplayName")]
        display_name: Label,
        #[serde(rename = "RequiredLevel")]
        required_level: RequiredLevel,
        #[serde(rename = "OptionSet")]
        option_set: BooleanOptionSet,
    },
    #[serde(rename = "Microsoft.Dynamics.CRM.DateTimeAttributeMetadata")]
    DateTime {
        #[serde(rename = "SchemaName")]
        schema_name: String,
        #[serde(rename = "DisplayName")]
        display_name: Label,
        #[serde(rename = "RequiredLevel")]
        required_level: RequiredLevel,
        #[serde(rename = "Format")]
        format: String,
    },
    #[serde(rename = "Microsoft.Dynamics.CRM.UniqueIdentifierAttributeMetadata")]
    UniqueIdentifier {
        #[serde(rename = "SchemaName")]
        schema_name: String,
        #[serde(rename = "DisplayName")]
        display_name: Label,
        #[serde(rename = "RequiredLevel")]
        required_level: RequiredLevel,
    },
    #[serde(rename = "Microsoft.Dynamics.CRM.PicklistAttributeMetadata")]
    Picklist {
        #[serde(rename = "SchemaName")]
        schema_name: String,
        #[serde(rename = "DisplayName")]
        display_name: Label,
        #[serde(rename = "RequiredLevel")]
        required_level: RequiredLevel,
        #[serde(rename = "GlobalOptionSet@odata.bind")]
        global_option_set_bind: String,
    },
}

impl AttributePayload {
    pub fn schema_name(&self) -> &str {
        match self {
            AttributePayload::String { schema_name, .. }
            | AttributePayload::Memo { schema_name, .. }
            | AttributePayload::Integer { schema_name, .. }
            | AttributePayload::Money { schema_name, .. }
            | AttributePayload::Boolean { schema_name, .. }
            | AttributePayload::DateTime { schema_name, .. }
            | AttributePayload::UniqueIdentifier { schema_name, .. }
            | AttributePayload::Picklist { schema_name, .. } => schema_name,
        }
    }

    pub fn is_primary_name(&self) -> bool {
        matches!(
            self,
            AttributePayload::String {
                is_primary_name: Some(true),
                ..
            }
        )
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablePayload {
    #[serde(rename = "SchemaName")]
    pub schema_name: String,
    #[serde(rename = "DisplayName")]
    pub display_name: Label,
    #[serde(rename = "DisplayCollectionName")]
    pub display_collection_name: Label,
    #[serde(rename = "OwnershipType")]
    pub ownership_type: String,
    #[serde(rename = "HasActivities")]
    pub has_activities: bool,
    #[serde(rename = "HasNotes")]
    pub has_notes: bool,
    #[serde(rename = "Attributes")]
    pub attributes: Vec<AttributePayload>,
}

// ---------------------------------------------------------------------------
// Relationship
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupAttributePayload {
    #[serde(rename = "@odata.type")]
    pub odata_type: String,
    #[serde(rename = "SchemaName")]
    pub schema_name: String,
    #[serde(rename = "DisplayName")]
    pub display_name: Label,
    #[serde(rename = "RequiredLevel")]
    pub required_level: RequiredLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipPayload {
    #[serde(rename = "@odata.type")]
    pub odata_type: String,
    #[serde(rename = "SchemaName")]
    pub schema_name: String,
    #[serde(rename = "ReferencedEntity")]
    pub referenced_entity: String,
    #[serde(rename = "ReferencedAttribute")]
    pub referenced_attribute: String,
    #[serde(rename = "ReferencingEntity")]
    pub referencing_entity: String,
    #[serde(rename = "Lookup")]
    pub lookup: LookupAttributePayload,
}

impl RelationshipPayload {
    pub fn one_to_many(
        schema_name: String,
        referenced_entity: String,
        referenced_attribute: String,
        referencing_entity: String,
        lookup_schema_name: String,
        lookup_display: &str,
    ) -> Self {
        RelationshipPayload {
            odata_type: ONE_TO_MANY_TYPE.to_string(),
            schema_name,
            referenced_entity,
            referenced_attribute,
            referencing_entity,
            lookup: LookupAttributePayload {
                odata_type: LOOKUP_ATTRIBUTE_TYPE.to_string(),
                schema_name: lookup_schema_name,
                display_name: Label::new(lookup_display),
                required_level: RequiredLevel::from_required(false),
            },
        }
    }
}
