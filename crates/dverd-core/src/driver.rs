use std::collections::HashMap;

use serde::Serialize;

use crate::client::{ClientError, MetadataClient};
use crate::generator::{option_set_name, option_set_payload, relationship_payload, table_payload};
use crate::resolver::ResolvedSchema;

/// Per-item convergence result. "Existed" is a successful no-op, not an
/// error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Created { id: String },
    Existed { id: String },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectOutcome {
    pub name: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct CategorySummary {
    pub outcomes: Vec<ObjectOutcome>,
}

impl CategorySummary {
    fn push(&mut self, name: String, outcome: Outcome) {
        self.outcomes.push(ObjectOutcome { name, outcome });
    }

    pub fn declared(&self) -> usize {
        self.outcomes.len()
    }

    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Created { .. }))
    }

    pub fn existed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Existed { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.outcome)).count()
    }
}

/// Logical name → remote identifier, one map per object category.
/// Populated as stages complete; existing objects record their existing
/// identifier, which is what makes a re-run converge instead of duplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct CreatedObjectRegistry {
    pub option_sets: HashMap<String, String>,
    pub tables: HashMap<String, String>,
    pub relationships: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct RunSummary {
    pub option_sets: CategorySummary,
    pub tables: CategorySummary,
    pub relationships: CategorySummary,
    pub registry: CreatedObjectRegistry,
}

impl RunSummary {
    pub fn failed_total(&self) -> usize {
        self.option_sets.failed() + self.tables.failed() + self.relationships.failed()
    }
}

/// Run the full convergence sweep in dependency order: option sets, then
/// tables, then table-to-table relationships, then user-reference
/// relationships. A failure on one item is recorded and the stage moves to
/// the next item; the summary is always produced.
pub fn run(
    schema: &ResolvedSchema,
    prefix: &str,
    client: &mut dyn MetadataClient,
) -> RunSummary {
    let mut summary = RunSummary::default();

    log::info!("creating {} option sets", schema.model.enums.len());
    for e in &schema.model.enums {
        let name = option_set_name(prefix, &e.name);
        let outcome = match client.find_option_set(&name) {
            Ok(Some(id)) => existing(&mut summary.registry.option_sets, &name, id),
            Ok(None) => {
                let payload = option_set_payload(e, prefix);
                match client.create_option_set(&payload) {
                    Ok(id) => created(&mut summary.registry.option_sets, &name, id),
                    Err(err) => conflict_or_failed(err, || client.find_option_set(&name)),
                }
            }
            Err(err) => failed(&name, err),
        };
        summary.option_sets.push(name, outcome);
    }

    log::info!("creating tables");
    for table in &schema.model.tables {
        if table.is_reserved() {
            log::debug!("table {} extends an existing object; skipped", table.name);
            continue;
        }
        let name = table.schema_name(prefix);
        let outcome = match client.find_table(&name) {
            Ok(Some(id)) => existing(&mut summary.registry.tables, &name, id),
            Ok(None) => match table_payload(table, &summary.registry.option_sets, prefix) {
                Ok(payload) => match client.create_table(&payload) {
                    Ok(id) => created(&mut summary.registry.tables, &name, id),
                    Err(err) => conflict_or_failed(err, || client.find_table(&name)),
                },
                Err(err) => {
                    log::warn!("table {} not generated: {}", table.name, err);
                    Outcome::Failed {
                        message: err.to_string(),
                    }
                }
            },
            Err(err) => failed(&name, err),
        };
        summary.tables.push(name, outcome);
    }

    log::info!(
        "creating {} relationships",
        schema.relationships.len() + schema.user_relationships.len()
    );
    for rel in schema.relationships.iter().chain(&schema.user_relationships) {
        let name = rel.schema_name.clone();
        let outcome = match client.find_relationship(&name) {
            Ok(Some(id)) => existing(&mut summary.registry.relationships, &name, id),
            Ok(None) => {
                let payload = relationship_payload(rel);
                match client.create_relationship(&payload) {
                    Ok(id) => created(&mut summary.registry.relationships, &name, id),
                    Err(err) => conflict_or_failed(err, || client.find_relationship(&name)),
                }
            }
            Err(err) => failed(&name, err),
        };
        summary.relationships.push(name, outcome);
    }

    summary
}

fn created(registry: &mut HashMap<String, String>, name: &str, id: String) -> Outcome {
    log::info!("created {} ({})", name, id);
    registry.insert(name.to_string(), id.clone());
    Outcome::Created { id }
}

fn existing(registry: &mut HashMap<String, String>, name: &str, id: String) -> Outcome {
    log::info!("{} already exists ({})", name, id);
    registry.insert(name.to_string(), id.clone());
    Outcome::Existed { id }
}

fn failed(name: &str, err: ClientError) -> Outcome {
    log::warn!("{} failed: {}", name, err);
    Outcome::Failed {
        message: err.to_string(),
    }
}

/// A create that races a concurrent or prior creation converges to the
/// already-exists outcome; any other error fails the item.
fn conflict_or_failed(
    err: ClientError,
    refind: impl FnOnce() -> Result<Option<String>, ClientError>,
) -> Outcome {
    match err {
        ClientError::Conflict => {
            let id = refind().ok().flatten().unwrap_or_default();
            Outcome::Existed { id }
        }
        other => Outcome::Failed {
            message: other.to_string(),
        },
    }
}
