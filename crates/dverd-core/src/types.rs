use serde::{Deserialize, Serialize};

use crate::catalogs::RESERVED_PREFIX;

// ---------------------------------------------------------------------------
// Source location / diagnostics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceLocation {
    pub file: String,
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: String,
    pub severity: DiagnosticSeverity,
    pub file: String,
    pub line: usize,
    pub col: usize,
    pub message: String,
}

impl Diagnostic {
    pub fn error(code: &str, file: &str, line: usize, col: usize, message: String) -> Self {
        Diagnostic {
            code: code.to_string(),
            severity: DiagnosticSeverity::Error,
            file: file.to_string(),
            line,
            col,
            message,
        }
    }

    pub fn warning(code: &str, file: &str, line: usize, col: usize, message: String) -> Self {
        Diagnostic {
            code: code.to_string(),
            severity: DiagnosticSeverity::Warning,
            file: file.to_string(),
            line,
            col,
            message,
        }
    }
}

// ---------------------------------------------------------------------------
// Raw blocks (lexer output, internal)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RawEnum {
    pub name: String,
    pub line: usize,
    /// Cleaned value tokens, one per body line, in source order.
    pub values: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RawField {
    pub raw: String,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct RawTable {
    pub name: String,
    pub line: usize,
    pub fields: Vec<RawField>,
}

#[derive(Debug, Clone)]
pub struct RawRef {
    pub from_table: String,
    pub from_field: String,
    /// Direction glyph exactly as written; validated later.
    pub dir: String,
    pub to_table: String,
    pub to_field: String,
    pub line: usize,
}

/// Raw capture groups from one ERD source, before interpretation.
#[derive(Debug, Clone, Default)]
pub struct RawErd {
    pub enums: Vec<RawEnum>,
    pub tables: Vec<RawTable>,
    pub refs: Vec<RawRef>,
    pub diagnostics: Vec<Diagnostic>,
}

// ---------------------------------------------------------------------------
// Schema model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Identifier,
    ShortText,
    LongText,
    Integer,
    Decimal,
    Boolean,
    DateTime,
}

/// Derived field classification. Exactly one kind applies per field; a
/// field cannot be both enum-typed and lookup-typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldKind {
    #[serde(rename = "primarykey")]
    PrimaryKey,
    Enum {
        #[serde(rename = "enumName")]
        enum_name: String,
    },
    Lookup {
        #[serde(rename = "targetTable")]
        target_table: String,
        #[serde(rename = "targetField")]
        target_field: String,
    },
    #[serde(rename = "userreference")]
    UserReference,
    Scalar {
        scalar: ScalarType,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    /// Declared type token, verbatim from source.
    #[serde(rename = "type")]
    pub type_token: String,
    pub required: bool,
    #[serde(flatten)]
    pub kind: FieldKind,
    pub loc: SourceLocation,
}

impl FieldDef {
    pub fn is_primary_key(&self) -> bool {
        self.kind == FieldKind::PrimaryKey
    }

    /// Lookup and user-reference fields are deferred to the relationship
    /// phases and never appear as table attributes.
    pub fn is_deferred(&self) -> bool {
        matches!(
            self.kind,
            FieldKind::Lookup { .. } | FieldKind::UserReference
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDef {
    pub name: String,
    /// Ordered values, duplicates and empty tokens removed.
    pub values: Vec<String>,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    /// Ordered field list; keyed by name, last write wins.
    pub fields: Vec<FieldDef>,
    pub loc: SourceLocation,
}

impl TableDef {
    /// True when the table name carries the extends-existing-object marker.
    pub fn is_reserved(&self) -> bool {
        self.name.to_lowercase().starts_with(RESERVED_PREFIX)
    }

    /// Declared name with the reserved marker stripped, casing kept.
    pub fn display_name(&self) -> &str {
        if self.is_reserved() {
            &self.name[RESERVED_PREFIX.len()..]
        } else {
            &self.name
        }
    }

    /// Platform-facing name: lower-cased and namespace-prefixed, except for
    /// reserved tables which resolve to their bare lower-cased name.
    pub fn schema_name(&self, prefix: &str) -> String {
        if self.is_reserved() {
            self.display_name().to_lowercase()
        } else {
            format!("{}{}", prefix, self.name.to_lowercase())
        }
    }

    /// Platform-facing name of one of this table's fields; reserved tables
    /// use the bare field name.
    pub fn attribute_schema_name(&self, prefix: &str, field: &str) -> String {
        if self.is_reserved() {
            field.to_lowercase()
        } else {
            format!("{}{}", prefix, field.to_lowercase())
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn primary_key(&self) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.is_primary_key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefDirection {
    /// `<` — left is the "one" side, right is the "many" side. The only
    /// direction that produces schema effects.
    OneToMany,
    /// `>` — parsed but inert; each physical foreign key is declared once.
    ManyToOne,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefDeclaration {
    pub from_table: String,
    pub from_field: String,
    pub direction: RefDirection,
    /// Direction glyph exactly as written, for diagnostics.
    pub dir_token: String,
    pub to_table: String,
    pub to_field: String,
    pub loc: SourceLocation,
}

/// A reference expanded against known table definitions: final relationship
/// naming with both endpoints resolved. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRelationship {
    #[serde(rename = "schemaName")]
    pub schema_name: String,
    #[serde(rename = "referencedEntity")]
    pub referenced_entity: String,
    #[serde(rename = "referencedAttribute")]
    pub referenced_attribute: String,
    #[serde(rename = "referencingEntity")]
    pub referencing_entity: String,
    #[serde(rename = "lookupSchemaName")]
    pub lookup_schema_name: String,
    /// Declared name of the lookup field on the many side.
    #[serde(rename = "lookupFieldName")]
    pub lookup_field_name: String,
}

/// Root aggregate built once per run from one ERD source; read-only
/// thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaModel {
    pub source: String,
    pub enums: Vec<EnumDef>,
    pub tables: Vec<TableDef>,
    pub refs: Vec<RefDeclaration>,
    pub diagnostics: Vec<Diagnostic>,
}

impl SchemaModel {
    pub fn enum_def(&self, name: &str) -> Option<&EnumDef> {
        self.enums.iter().find(|e| e.name == name)
    }

    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub(crate) fn table_mut(&mut self, name: &str) -> Option<&mut TableDef> {
        self.tables.iter_mut().find(|t| t.name == name)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Error)
            .count()
    }
}
