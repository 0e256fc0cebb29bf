//! Dependency orderer.
//!
//! Places sections in a fixed precedence so every entity a later record
//! references already exists: materials, point connections, cross-sections,
//! curve members, surface members, then everything else in document order.
//! Relationship sections are split off for a second pass.
//!
//! This is a fixed list, not a topological sort. A new entity kind that other
//! records depend on must be added to `ENTITY_PRECEDENCE`.

use serde_json::{Map, Value};
use tracing::debug;

use crate::graph::DocumentInfo;
use crate::model::record::keys;
use crate::registry::{Discriminator, EntityType, RelationshipType};
use crate::{Error, Result};

/// Entity kinds that must load before all others, in this order.
pub const ENTITY_PRECEDENCE: [EntityType; 5] = [
    EntityType::Material,
    EntityType::PointConnection,
    EntityType::CrossSection,
    EntityType::CurveMember,
    EntityType::SurfaceMember,
];

/// Section holding records of mixed entity types.
pub const GENERIC_ENTITY_SECTION: &str = "Entities";
/// Section holding records of mixed relationship types.
pub const GENERIC_RELATIONSHIP_SECTION: &str = "Relationships";

const METADATA_KEYS: [&str; 4] = ["Name", "XmiVersion", "ApplicationName", "ApplicationVersion"];
const IGNORED_KEYS: [&str; 2] = ["Histories", "Errors"];

/// How the records of a section are dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    /// `None` means each record names its own type.
    Entities(Option<EntityType>),
    Relationships(Option<RelationshipType>),
}

impl SectionKind {
    /// Classify a top-level key. `None` for keys that are not sections.
    pub fn classify(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case(GENERIC_ENTITY_SECTION) {
            return Some(SectionKind::Entities(None));
        }
        if name.eq_ignore_ascii_case(GENERIC_RELATIONSHIP_SECTION) {
            return Some(SectionKind::Relationships(None));
        }
        match Discriminator::lookup(name).ok()? {
            Discriminator::Entity(t) => Some(SectionKind::Entities(Some(t))),
            Discriminator::Relationship(t) => Some(SectionKind::Relationships(Some(t))),
        }
    }
}

/// A section scheduled for loading, with each record's original index.
#[derive(Debug, Clone)]
pub struct PlannedSection<'a> {
    pub name: &'a str,
    pub kind: SectionKind,
    pub records: Vec<(usize, &'a Value)>,
}

#[derive(Debug, Clone, Default)]
pub struct SectionPlan<'a> {
    pub info: DocumentInfo,
    pub entity_sections: Vec<PlannedSection<'a>>,
    pub relationship_sections: Vec<PlannedSection<'a>>,
}

/// Precedence rank of an entity type. Unlisted types share the last rank.
pub fn rank(entity_type: Option<EntityType>) -> usize {
    entity_type
        .and_then(|t| ENTITY_PRECEDENCE.iter().position(|p| *p == t))
        .unwrap_or(ENTITY_PRECEDENCE.len())
}

/// Full load plan: metadata, ordered entity sections (mixed sections
/// partitioned per record) and relationship sections.
pub fn plan_sections(doc: &Value) -> Result<SectionPlan<'_>> {
    let map = top_level(doc)?;
    let mut plan = SectionPlan::default();
    let mut ranked: Vec<(usize, PlannedSection<'_>)> = Vec::new();

    for (name, value) in map {
        let name = name.as_str();
        if METADATA_KEYS.contains(&name) {
            read_metadata(&mut plan.info, name, value);
            continue;
        }
        if IGNORED_KEYS.contains(&name) {
            debug!(key = name, "ignoring key");
            continue;
        }
        let kind = SectionKind::classify(name);
        let records = match (value, kind) {
            (Value::Array(items), _) => items,
            (_, Some(_)) => {
                return Err(Error::MalformedInput(format!("section '{name}' must be a list")));
            }
            (_, None) => {
                debug!(key = name, "ignoring non-list key");
                continue;
            }
        };
        let indexed = records.iter().enumerate();

        match kind {
            Some(SectionKind::Relationships(t)) => plan.relationship_sections.push(PlannedSection {
                name,
                kind: SectionKind::Relationships(t),
                records: indexed.collect(),
            }),
            Some(SectionKind::Entities(Some(t))) => ranked.push((
                rank(Some(t)),
                PlannedSection { name, kind: SectionKind::Entities(Some(t)), records: indexed.collect() },
            )),
            // Mixed or unrecognized: each record carries its own tag.
            Some(SectionKind::Entities(None)) | None => {
                let mut buckets: Vec<Vec<(usize, &Value)>> = vec![Vec::new(); ENTITY_PRECEDENCE.len() + 1];
                let mut relationship_records = Vec::new();
                for (index, record) in indexed {
                    match record_tag(record).map(Discriminator::lookup) {
                        Some(Ok(Discriminator::Relationship(_))) => relationship_records.push((index, record)),
                        Some(Ok(Discriminator::Entity(t))) => buckets[rank(Some(t))].push((index, record)),
                        _ => buckets[rank(None)].push((index, record)),
                    }
                }
                for (r, records) in buckets.into_iter().enumerate() {
                    if !records.is_empty() {
                        ranked.push((r, PlannedSection { name, kind: SectionKind::Entities(None), records }));
                    }
                }
                if !relationship_records.is_empty() {
                    plan.relationship_sections.push(PlannedSection {
                        name,
                        kind: SectionKind::Relationships(None),
                        records: relationship_records,
                    });
                }
            }
        }
    }

    ranked.sort_by_key(|(r, _)| *r);
    plan.entity_sections = ranked.into_iter().map(|(_, section)| section).collect();
    Ok(plan)
}

/// The record's own `EntityType` tag, if it has one.
pub(crate) fn record_tag(record: &Value) -> Option<&str> {
    let map = record.as_object()?;
    map.get(keys::ENTITY_TYPE.external)
        .or_else(|| map.get(keys::ENTITY_TYPE.internal))
        .and_then(Value::as_str)
}

fn top_level(doc: &Value) -> Result<&Map<String, Value>> {
    doc.as_object()
        .ok_or_else(|| Error::MalformedInput("top level must be a mapping of sections".into()))
}

fn read_metadata(info: &mut DocumentInfo, key: &str, value: &Value) {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => {
            debug!(key, "ignoring non-scalar metadata");
            return;
        }
    };
    let slot = match key {
        "Name" => &mut info.name,
        "XmiVersion" => &mut info.xmi_version,
        "ApplicationName" => &mut info.application_name,
        _ => &mut info.application_version,
    };
    *slot = Some(text);
}
