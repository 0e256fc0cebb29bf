//! Graph container.
//!
//! Three append-only, ordered collections (entities, relationships, errors)
//! plus an id index over entities. The container is filled by exactly one
//! load call and read-only afterwards: every mutator is crate-private.
//!
//! Relationship queries are linear scans over the relationship list.

pub mod error_log;

pub use error_log::{ErrorKind, LoadError};

use hashbrown::HashMap;

use crate::model::{Entity, EntityId, Relationship};
use crate::registry::{EntityType, RelationshipType};
use crate::{Error, Result};

/// Document-level metadata carried alongside the sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DocumentInfo {
    #[serde(rename = "Name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "XmiVersion", skip_serializing_if = "Option::is_none")]
    pub xmi_version: Option<String>,
    #[serde(rename = "ApplicationName", skip_serializing_if = "Option::is_none")]
    pub application_name: Option<String>,
    #[serde(rename = "ApplicationVersion", skip_serializing_if = "Option::is_none")]
    pub application_version: Option<String>,
}

#[derive(Debug, Default)]
pub struct Graph {
    info: DocumentInfo,
    entities: Vec<Entity>,
    relationships: Vec<Relationship>,
    errors: Vec<LoadError>,
    index: HashMap<EntityId, usize>,
}

impl Graph {
    pub(crate) fn new(info: DocumentInfo) -> Self {
        Self { info, ..Self::default() }
    }

    // ========================================================================
    // Mutation (load-time only)
    // ========================================================================

    /// Append an entity. A repeated id is rejected and nothing is stored.
    pub(crate) fn insert_entity(&mut self, entity: Entity) -> Result<&Entity> {
        if self.index.contains_key(&entity.id) {
            return Err(Error::DuplicateId(entity.id.0));
        }
        let position = self.entities.len();
        self.index.insert(entity.id.clone(), position);
        self.entities.push(entity);
        Ok(&self.entities[position])
    }

    pub(crate) fn insert_relationship(&mut self, relationship: Relationship) {
        self.relationships.push(relationship);
    }

    pub(crate) fn log_error(&mut self, error: LoadError) {
        self.errors.push(error);
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn info(&self) -> &DocumentInfo {
        &self.info
    }

    pub fn find_entity(&self, id: &str) -> Option<&Entity> {
        self.index.get(id).map(|&i| &self.entities[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All entities in insertion order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn errors(&self) -> &[LoadError] {
        &self.errors
    }

    pub fn entities_by_type(&self, entity_type: EntityType) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.iter().filter(move |e| e.entity_type() == entity_type)
    }

    pub fn relationships_by_type(
        &self,
        rel_type: RelationshipType,
    ) -> impl Iterator<Item = &Relationship> + '_ {
        self.relationships.iter().filter(move |r| r.relationship_type() == rel_type)
    }

    /// Relationships leaving `entity`, optionally restricted to one type.
    pub fn find_relationships_by_source(
        &self,
        entity: &Entity,
        rel_type: Option<RelationshipType>,
    ) -> Vec<&Relationship> {
        self.relationships
            .iter()
            .filter(|r| r.source == entity.id)
            .filter(|r| rel_type.is_none_or(|t| r.relationship_type() == t))
            .collect()
    }

    /// Relationships arriving at `entity`, optionally restricted to one type.
    pub fn find_relationships_by_target(
        &self,
        entity: &Entity,
        rel_type: Option<RelationshipType>,
    ) -> Vec<&Relationship> {
        self.relationships
            .iter()
            .filter(|r| r.target == entity.id)
            .filter(|r| rel_type.is_none_or(|t| r.relationship_type() == t))
            .collect()
    }

    /// Target entities of `entity`'s outgoing relationships of `rel_type`.
    pub fn targets_of(&self, entity: &Entity, rel_type: RelationshipType) -> Vec<&Entity> {
        self.find_relationships_by_source(entity, Some(rel_type))
            .into_iter()
            .filter_map(|r| self.find_entity(r.target.as_str()))
            .collect()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// True when the load logged no errors at all.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors_of_kind(&self, kind: ErrorKind) -> impl Iterator<Item = &LoadError> + '_ {
        self.errors.iter().filter(move |e| e.kind == kind)
    }
}
