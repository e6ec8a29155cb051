use std::collections::HashMap;
use std::sync::LazyLock;

use crate::types::ScalarType;

/// Scalar type table. Declared type tokens are matched case-insensitively;
/// tokens not in this map fall back to [`ScalarType::ShortText`].
pub static TYPE_TABLE: LazyLock<HashMap<&'static str, ScalarType>> = LazyLock::new(|| {
    let mut m = HashMap::new();
    m.insert("guid", ScalarType::Identifier);
    m.insert("uniqueidentifier", ScalarType::Identifier);
    m.insert("string", ScalarType::ShortText);
    m.insert("varchar", ScalarType::ShortText);
    m.insert("char", ScalarType::ShortText);
    m.insert("text", ScalarType::ShortText);
    m.insert("longtext", ScalarType::LongText);
    m.insert("memo", ScalarType::LongText);
    m.insert("multilinetext", ScalarType::LongText);
    m.insert("int", ScalarType::Integer);
    m.insert("integer", ScalarType::Integer);
    m.insert("number", ScalarType::Integer);
    m.insert("decimal", ScalarType::Decimal);
    m.insert("currency", ScalarType::Decimal);
    m.insert("money", ScalarType::Decimal);
    m.insert("float", ScalarType::Decimal);
    m.insert("double", ScalarType::Decimal);
    m.insert("bool", ScalarType::Boolean);
    m.insert("boolean", ScalarType::Boolean);
    m.insert("bit", ScalarType::Boolean);
    m.insert("date", ScalarType::DateTime);
    m.insert("datetime", ScalarType::DateTime);
    m.insert("timestamp", ScalarType::DateTime);
    m
});

/// Look up a declared type token, case-insensitively.
pub fn scalar_type_for(token: &str) -> ScalarType {
    TYPE_TABLE
        .get(token.to_lowercase().as_str())
        .copied()
        .unwrap_or(ScalarType::ShortText)
}

/// Type token that marks a field as a lookup placeholder. Never authored in
/// source; produced by the resolver's injection pass.
pub const LOOKUP_TYPE: &str = "Lookup";

/// Type token that marks a field as a reference to the platform user.
pub const PERSON_TYPE: &str = "Person";

/// Annotation marker for the primary-key field.
pub const PK_MARKER: &str = "pk";

/// Annotation marker for required fields.
pub const NOT_NULL_MARKER: &str = "not null";

/// Table-name prefix flagging a table that already exists in the target
/// system: excluded from creation, un-prefixed logical name as endpoint.
pub const RESERVED_PREFIX: &str = "existing_";

/// Direction glyph that produces schema effects: left side is the "one"
/// side, right side is the "many" side of the reference.
pub const DIR_ONE_TO_MANY: &str = "<";

/// Inverse direction glyph: parsed but never materialized.
pub const DIR_MANY_TO_ONE: &str = ">";

/// Numeric code of the first option in a generated option set; each
/// subsequent value increments by one.
pub const OPTION_VALUE_BASE: i32 = 100_000_000;

/// Built-in entity targeted by `Person` fields.
pub const USER_ENTITY: &str = "systemuser";

/// Key attribute of the built-in user entity.
pub const USER_ENTITY_KEY: &str = "systemuserid";

/// Language code used for all metadata labels.
pub const LABEL_LANGUAGE_CODE: u32 = 1033;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_table_case_insensitive() {
        assert_eq!(scalar_type_for("GUID"), ScalarType::Identifier);
        assert_eq!(scalar_type_for("Decimal"), ScalarType::Decimal);
        assert_eq!(scalar_type_for("DATETIME"), ScalarType::DateTime);
    }

    #[test]
    fn unknown_type_defaults_to_short_text() {
        assert_eq!(scalar_type_for("blob"), ScalarType::ShortText);
        assert_eq!(scalar_type_for(""), ScalarType::ShortText);
    }
}
