use std::collections::HashMap;

use thiserror::Error;

use crate::payload::{OptionSetPayload, RelationshipPayload, TablePayload};

/// Failure at the remote metadata boundary. The core treats any of these as
/// "this one item did not get created" and continues with the next item;
/// rate-limit retries happen inside the transport and only exhaustion
/// surfaces here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    #[error("remote call failed with status {status}: {message}")]
    Http { status: u16, message: String },
    #[error("object already exists remotely")]
    Conflict,
    #[error("rate-limit retries exhausted")]
    RateLimitExhausted,
    #[error("transport error: {0}")]
    Transport(String),
}

/// Remote metadata collaborator. Find operations answer by exact schema
/// name; create operations return the remote identifier of the new object.
pub trait MetadataClient {
    fn find_option_set(&mut self, name: &str) -> Result<Option<String>, ClientError>;
    fn create_option_set(&mut self, payload: &OptionSetPayload) -> Result<String, ClientError>;
    fn find_table(&mut self, schema_name: &str) -> Result<Option<String>, ClientError>;
    fn create_table(&mut self, payload: &TablePayload) -> Result<String, ClientError>;
    fn find_relationship(&mut self, schema_name: &str) -> Result<Option<String>, ClientError>;
    fn create_relationship(&mut self, payload: &RelationshipPayload)
        -> Result<String, ClientError>;
}

/// In-memory metadata org: backs dry runs and tests. Objects live in plain
/// name → identifier maps; created payloads are retained for inspection.
#[derive(Debug, Clone, Default)]
pub struct MemoryClient {
    option_sets: HashMap<String, String>,
    tables: HashMap<String, String>,
    relationships: HashMap<String, String>,
    next_id: u32,
    pub created_option_sets: Vec<OptionSetPayload>,
    pub created_tables: Vec<TablePayload>,
    pub created_relationships: Vec<RelationshipPayload>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a table, as if a prior run had created it.
    pub fn seed_table(&mut self, schema_name: &str) -> String {
        let id = self.mint_id();
        self.tables.insert(schema_name.to_string(), id.clone());
        id
    }

    pub fn seed_option_set(&mut self, name: &str) -> String {
        let id = self.mint_id();
        self.option_sets.insert(name.to_string(), id.clone());
        id
    }

    pub fn seed_relationship(&mut self, schema_name: &str) -> String {
        let id = self.mint_id();
        self.relationships.insert(schema_name.to_string(), id.clone());
        id
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn option_set_count(&self) -> usize {
        self.option_sets.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    fn mint_id(&mut self) -> String {
        self.next_id += 1;
        format!("00000000-0000-0000-0000-{:012}", self.next_id)
    }
}

impl MetadataClient for MemoryClient {
    fn find_option_set(&mut self, name: &str) -> Result<Option<String>, ClientError> {
        Ok(self.option_sets.get(name).cloned())
    }

    fn create_option_set(&mut self, payload: &OptionSetPayload) -> Result<String, ClientError> {
        if self.option_sets.contains_key(&payload.name) {
            return Err(ClientError::Conflict);
        }
        let id = self.mint_id();
        self.option_sets.insert(payload.name.clone(), id.clone());
        self.created_option_sets.push(payload.clone());
        Ok(id)
    }

    fn find_table(&mut self, schema_name: &str) -> Result<Option<String>, ClientError> {
        Ok(self.tables.get(schema_name).cloned())
    }

    fn create_table(&mut self, payload: &TablePayload) -> Result<String, ClientError> {
        if self.tables.contains_key(&payload.schema_name) {
            return Err(ClientError::Conflict);
        }
        let id = self.mint_id();
        self.tables.insert(payload.schema_name.clone(), id.clone());
        self.created_tables.push(payload.clone());
        Ok(id)
    }

    fn find_relationship(&mut self, schema_name: &str) -> Result<Option<String>, ClientError> {
        Ok(self.relationships.get(schema_name).cloned())
    }

    fn create_relationship(
        &mut self,
        payload: &RelationshipPayload,
    ) -> Result<String, ClientError> {
        if self.relationships.contains_key(&payload.schema_name) {
            return Err(ClientError::Conflict);
        }
        let id = self.mint_id();
        self.relationships
            .insert(payload.schema_name.clone(), id.clone());
        self.created_relationships.push(payload.clone());
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::Label;

    #[test]
    fn memory_client_find_after_create() {
        let mut client = MemoryClient::new();
        let payload = OptionSetPayload::new("mb_status".into(), Label::new("Status"), Vec::new());
        let id = client.create_option_set(&payload).unwrap();
        assert_eq!(client.find_option_set("mb_status").unwrap(), Some(id));
        assert_eq!(client.find_option_set("mb_other").unwrap(), None);
    }

    #[test]
    fn memory_client_create_twice_conflicts() {
        let mut client = MemoryClient::new();
        let payload = OptionSetPayload::new("mb_status".into(), Label::new("Status"), Vec::new());
        client.create_option_set(&payload).unwrap();
        assert_eq!(
            client.create_option_set(&payload).unwrap_err(),
            ClientError::Conflict
        );
    }

    #[test]
    fn memory_client_ids_are_distinct() {
        let mut client = MemoryClient::new();
        let a = client.seed_table("mb_a");
        let b = client.seed_table("mb_b");
        assert_ne!(a, b);
    }
}
