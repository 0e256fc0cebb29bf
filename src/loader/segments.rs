//! Segment synthesis for curve and surface members.
//!
//! A member with nodes `n0..nN` gets, for each span `i`:
//!
//! ```text
//! member ──hasSegment──▶ segment i ──hasNode(begin)──▶ n[i]
//!                            │     ──hasNode(end)────▶ n[i+1]
//!                            └──hasGeometry──▶ Line3D | Arc3D
//! ```
//!
//! Geometry endpoints reuse the nodes' own points, so a line and the point
//! connections it spans share instances.

use std::sync::Arc;

use super::{LoadContext, RecordSite};
use crate::graph::{ErrorKind, Graph};
use crate::model::geometry::{Arc3D, Line3D, Point3D};
use crate::model::{
    EndFlags, Entity, EntityId, EntityKind, MemberPath, Relationship, RelationshipKind, Segment,
    SegmentType,
};
use crate::{Error, Result};

/// Member path with every node resolved to its point.
#[derive(Debug)]
pub(super) struct ResolvedPath {
    points: Vec<Arc<Point3D>>,
}

/// Resolve every node of `path` to a point connection already in the graph.
pub(super) fn resolve_path(graph: &Graph, path: &MemberPath) -> Result<ResolvedPath> {
    let points = path
        .nodes
        .iter()
        .map(|id| {
            let node = graph
                .find_entity(id.as_str())
                .ok_or_else(|| Error::UnresolvedReference(format!("node '{id}' of member path")))?;
            match &node.kind {
                EntityKind::PointConnection(pc) => Ok(Arc::clone(&pc.point)),
                _ => Err(Error::ConstraintViolation(format!(
                    "node '{id}' is a {}, expected a point connection",
                    node.discriminator()
                ))),
            }
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(ResolvedPath { points })
}

/// Append segments, their node and geometry links, for an inserted member.
pub(super) fn synthesize(
    ctx: &mut LoadContext<'_>,
    member: &EntityId,
    path: &MemberPath,
    resolved: &ResolvedPath,
    site: &RecordSite<'_>,
) -> Result<()> {
    for (position, &segment_type) in path.segment_types.iter().enumerate() {
        let supported = segment_type.has_geometry();
        let mut segment = Entity::new(
            EntityId::generate(),
            EntityKind::Segment(Segment { position, segment_type, geometry_supported: supported }),
        );
        segment.name = format!("{member} segment {position}");
        segment.derived = true;
        let segment_id = ctx.graph.insert_entity(segment)?.id.clone();

        link(ctx, member, &segment_id, RelationshipKind::HasSegment);
        link(ctx, &segment_id, &path.nodes[position], RelationshipKind::HasNode(EndFlags::BEGIN));
        link(ctx, &segment_id, &path.nodes[position + 1], RelationshipKind::HasNode(EndFlags::END));

        if !supported {
            ctx.log(
                site,
                ErrorKind::UnsupportedVariant,
                format!("segment {position} of '{member}' is a {segment_type}; no geometry built"),
            );
            continue;
        }

        let start = Arc::clone(&resolved.points[position]);
        let end = Arc::clone(&resolved.points[position + 1]);
        let geometry = match segment_type {
            SegmentType::CircularArc => {
                let center = path
                    .center(position)
                    .ok_or_else(|| Error::MissingField(format!("SegmentCenters[{position}]")))?;
                EntityKind::Arc(Arc3D {
                    start,
                    end,
                    center: ctx.points.get_or_create_point(center)?,
                    radius: None,
                })
            }
            _ => EntityKind::Line(Line3D { start, end }),
        };
        let mut geometry = Entity::new(EntityId::generate(), geometry);
        geometry.derived = true;
        let geometry_id = ctx.graph.insert_entity(geometry)?.id.clone();
        link(ctx, &segment_id, &geometry_id, RelationshipKind::HasGeometry(EndFlags::default()));
    }
    Ok(())
}

fn link(ctx: &mut LoadContext<'_>, source: &EntityId, target: &EntityId, kind: RelationshipKind) {
    let mut rel = Relationship::new(source.clone(), target.clone(), kind);
    rel.derived = true;
    ctx.graph.insert_relationship(rel);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CoordinateForm, PointConnection, SegmentType};

    fn graph_with_nodes() -> Graph {
        let mut graph = Graph::default();
        for (id, x) in [("n1", 0.0), ("n2", 1.0)] {
            let kind = EntityKind::PointConnection(PointConnection {
                point: Arc::new(Point3D::new(x, 0.0, 0.0)),
                storey: None,
                coordinate_form: CoordinateForm::Nested,
            });
            graph.insert_entity(Entity::new(id.into(), kind)).unwrap();
        }
        graph.insert_entity(Entity::new("s1".into(), EntityKind::Slab)).unwrap();
        graph
    }

    fn path(nodes: &[&str]) -> MemberPath {
        MemberPath {
            nodes: nodes.iter().map(|n| EntityId::from(*n)).collect(),
            segment_types: vec![SegmentType::Line; nodes.len().saturating_sub(1)],
            arc_centers: Vec::new(),
            ..MemberPath::default()
        }
    }

    #[test]
    fn test_resolve_path_shares_node_points() {
        let graph = graph_with_nodes();
        let resolved = resolve_path(&graph, &path(&["n1", "n2"])).unwrap();
        let node = graph.find_entity("n1").unwrap().point().unwrap();
        assert!(Arc::ptr_eq(&resolved.points[0], node));
    }

    #[test]
    fn test_resolve_path_missing_node() {
        let graph = graph_with_nodes();
        let err = resolve_path(&graph, &path(&["n1", "n9"])).unwrap_err();
        assert!(matches!(err, Error::UnresolvedReference(ref m) if m.contains("n9")));
    }

    #[test]
    fn test_resolve_path_wrong_node_type() {
        let graph = graph_with_nodes();
        let err = resolve_path(&graph, &path(&["n1", "s1"])).unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation(_)));
    }
}
