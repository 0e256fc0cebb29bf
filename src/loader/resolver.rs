//! Reference resolver: relationship records to typed edges.
//!
//! Both ends must already be in the graph. Entity sections always load
//! before relationship sections, so this holds for any well-formed document.
//! Inline references queued by the factory are linked in between.

use tracing::debug;

use super::order::{record_tag, SectionKind};
use super::{LoadContext, RecordSite};
use crate::graph::{ErrorKind, Graph};
use crate::model::record::{keys, RawRecord};
use crate::model::{EndFlags, Entity, RelId, Relationship, RelationshipKind};
use crate::registry::{Discriminator, RelationshipType};
use crate::{Error, Result};

/// Build one relationship from the record at `site`. Failures are logged.
pub(super) fn load_relationship(ctx: &mut LoadContext<'_>, kind: SectionKind, site: RecordSite<'_>) {
    let rel_type = match resolve_type(kind, &site) {
        Ok(t) => t,
        Err(e) => return ctx.fail(&site, e),
    };
    let site = site.tagged(rel_type.discriminator());
    match build(&ctx.graph, rel_type, &site) {
        Ok(rel) => ctx.graph.insert_relationship(rel),
        Err(e) => ctx.fail(&site, e),
    }
}

/// Link every queued inline reference. A failed link is logged against the
/// entity record that carried it; the entity itself stays in the graph.
pub(super) fn resolve_inline(ctx: &mut LoadContext<'_>) {
    let pending = std::mem::take(&mut ctx.pending);
    if !pending.is_empty() {
        debug!(links = pending.len(), "resolving inline references");
    }
    for link in pending {
        match connect(&ctx.graph, link.source.as_str(), link.target.as_str(), link.kind) {
            Ok(mut rel) => {
                rel.derived = true;
                ctx.graph.insert_relationship(rel);
            }
            Err(e) => {
                let kind = e.kind().unwrap_or(ErrorKind::UnresolvedReference);
                ctx.log(&link.site, kind, format!("inline reference of '{}': {e}", link.source));
            }
        }
    }
}

fn resolve_type(kind: SectionKind, site: &RecordSite<'_>) -> Result<RelationshipType> {
    let section_type = match kind {
        SectionKind::Relationships(t) => t,
        SectionKind::Entities(_) => None,
    };
    let tag = match (record_tag(site.raw), section_type) {
        (Some(tag), _) => tag,
        (None, Some(t)) => return Ok(t),
        (None, None) => return Err(Error::UnknownDiscriminator(site.section.to_string())),
    };
    match Discriminator::lookup(tag)? {
        Discriminator::Relationship(t) => Ok(t),
        Discriminator::Entity(_) => Err(Error::invalid(
            "EntityType",
            format!("'{tag}' names an entity, not a relationship"),
        )),
    }
}

fn build(graph: &Graph, rel_type: RelationshipType, site: &RecordSite<'_>) -> Result<Relationship> {
    let record = RawRecord::from_value(site.raw)?;
    let source = record.require_id(keys::SOURCE)?;
    let target = record.require_id(keys::TARGET)?;

    let flags = if rel_type.has_end_flags() {
        EndFlags {
            is_begin: record.opt_bool(keys::IS_BEGIN)?,
            is_end: record.opt_bool(keys::IS_END)?,
        }
    } else {
        EndFlags::default()
    };

    let mut rel = connect(graph, &source, &target, RelationshipKind::with_flags(rel_type, flags))?;
    if let Some(id) = record.opt_filled_id(keys::ID)? {
        rel.id = RelId(id);
    }
    if let Some(name) = record.opt_str(keys::NAME)?.filter(|n| !n.is_empty()) {
        rel.name = name;
    }
    rel.description = record.opt_str(keys::DESCRIPTION)?;
    rel.uml_type = record.opt_str(keys::UML_TYPE)?;
    Ok(rel)
}

/// Resolve both ends by id and check `kind`'s constraints.
pub(crate) fn connect(graph: &Graph, source: &str, target: &str, kind: RelationshipKind) -> Result<Relationship> {
    let (Some(src), Some(dst)) = (graph.find_entity(source), graph.find_entity(target)) else {
        let missing: Vec<String> = [("source", source), ("target", target)]
            .into_iter()
            .filter(|(_, id)| !graph.contains(id))
            .map(|(end, id)| format!("{end} '{id}'"))
            .collect();
        return Err(Error::UnresolvedReference(format!(
            "missing {} for {}",
            missing.join(" and "),
            kind.relationship_type()
        )));
    };
    check_constraints(src, dst, kind.relationship_type())?;
    Ok(Relationship::new(src.id.clone(), dst.id.clone(), kind))
}

/// Target type and source domain rules of `rel_type`.
pub fn check_constraints(source: &Entity, target: &Entity, rel_type: RelationshipType) -> Result<()> {
    if let Some(domain) = rel_type.required_source_domain() {
        if source.domain() != domain {
            return Err(Error::ConstraintViolation(format!(
                "{rel_type} source '{}' is in the {} domain, expected {domain}",
                source.id,
                source.domain()
            )));
        }
    }
    if !rel_type.allowed_targets().contains(&target.entity_type()) {
        return Err(Error::ConstraintViolation(format!(
            "{rel_type} cannot target '{}' ({})",
            target.id,
            target.discriminator()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityId, EntityKind, Material, MaterialType};

    fn graph() -> Graph {
        let mut g = Graph::default();
        g.insert_entity(Entity::new("b1".into(), EntityKind::Slab)).unwrap();
        let material = EntityKind::Material(Material {
            material_type: MaterialType::Steel,
            grade: None,
            unit_weight: None,
            e_modulus: None,
            g_modulus: None,
            poisson_ratio: None,
            thermal_coefficient: None,
        });
        g.insert_entity(Entity::new("m1".into(), material)).unwrap();
        g
    }

    #[test]
    fn test_connect_resolves_both_ends() {
        let g = graph();
        let rel = connect(&g, "b1", "m1", RelationshipKind::HasMaterial).unwrap();
        assert_eq!(rel.source, EntityId::from("b1"));
        assert_eq!(rel.target, EntityId::from("m1"));
        assert_eq!(rel.name, "hasStructuralMaterial");
    }

    #[test]
    fn test_connect_reports_missing_ends() {
        let g = graph();
        let err = connect(&g, "nope", "m1", RelationshipKind::HasMaterial).unwrap_err();
        assert!(matches!(err, Error::UnresolvedReference(ref m) if m.contains("source 'nope'")));
        let err = connect(&g, "x", "y", RelationshipKind::HasMaterial).unwrap_err();
        assert!(err.to_string().contains("source 'x' and target 'y'"));
    }

    #[test]
    fn test_wrong_target_type() {
        let g = graph();
        let err = connect(&g, "m1", "b1", RelationshipKind::HasMaterial).unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation(_)));
    }

    #[test]
    fn test_bridge_requires_physical_source() {
        let g = graph();
        let err = check_constraints(
            g.find_entity("m1").unwrap(),
            g.find_entity("b1").unwrap(),
            RelationshipType::HasCurveMember,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Physical"));
    }
}
