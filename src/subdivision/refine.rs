//! One global subdivision step.
//!
//! The step reads the parent level through its cached stencils and builds
//! the child level with the ordinary arena primitives: vertices for every
//! vertex, edge and face point, two halves for every parent edge, interior
//! edges and faces per parent face. Tags are carried over, then sector
//! coefficients are resolved once every child face exists.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::error::TopologyError;
use crate::topology::{
    EdgeData, EdgeId, EdgeTag, FaceId, SubdLevel, SubdivisionScheme, VertexId, VertexTag,
};

/// Number of faces one face with `edge_count` sides becomes.
#[must_use]
pub fn child_face_count(scheme: SubdivisionScheme, edge_count: usize) -> usize {
    match scheme {
        SubdivisionScheme::CatmullClark => edge_count,
        SubdivisionScheme::LoopWarren if edge_count == 3 => 4,
        SubdivisionScheme::LoopWarren => 2 * edge_count,
    }
}

/// Face count of the level produced by subdividing `level` once.
#[must_use]
pub fn projected_face_count(level: &SubdLevel) -> usize {
    level
        .faces()
        .map(|(_, f)| child_face_count(level.scheme(), f.edge_count()))
        .sum()
}

/// Whether a face of this scheme gets a face point.
fn has_face_point(scheme: SubdivisionScheme, edge_count: usize) -> bool {
    scheme == SubdivisionScheme::CatmullClark || edge_count != 3
}

/// Tag and sharpness of both halves of a parent edge.
fn child_edge_tag(ed: &EdgeData) -> (EdgeTag, f64) {
    match ed.tag() {
        EdgeTag::Crease => (EdgeTag::Crease, 0.0),
        EdgeTag::Sharp if ed.sharpness() > 1.0 => (EdgeTag::Sharp, ed.sharpness() - 1.0),
        _ => (EdgeTag::Smooth, 0.0),
    }
}

/// Builds the next level from `parent`.
///
/// # Errors
///
/// Returns an error if a stencil cannot be evaluated (unset tags, unresolved
/// coefficients, inconsistent topology), the id space runs out, or the sector
/// fix-up diverges on the child.
pub(crate) fn refine(parent: &SubdLevel) -> crate::Result<SubdLevel> {
    let scheme = parent.scheme();
    let index = parent.index().saturating_add(1);
    let mut child = SubdLevel::with_allocator(index, scheme, parent.id_allocator().clone());

    let mut vertex_child: HashMap<VertexId, VertexId> = HashMap::with_capacity(parent.vertex_count());
    for v in parent.vertex_keys_by_id() {
        let tag = parent.vertex(v)?.tag();
        let point = parent.vertex_subdivision_point(v)?;
        vertex_child.insert(v, child.add_vertex(point, tag)?);
    }

    let edge_order = parent.edge_keys_by_id();
    let mut edge_child: HashMap<EdgeId, VertexId> = HashMap::with_capacity(edge_order.len());
    for &e in &edge_order {
        let ed = parent.edge(e)?;
        let tag = if ed.tag().is_crease() {
            VertexTag::Crease
        } else {
            VertexTag::Smooth
        };
        let point = parent.edge_subdivision_point(e)?;
        edge_child.insert(e, child.add_vertex(point, tag)?);
    }

    let face_order = parent.face_keys_by_id();
    let mut face_child: HashMap<FaceId, VertexId> = HashMap::new();
    for &f in &face_order {
        if has_face_point(scheme, parent.face(f)?.edge_count()) {
            let point = parent.face_subdivision_point(f)?;
            face_child.insert(f, child.add_vertex(point, VertexTag::Smooth)?);
        }
    }

    let child_of = |map: &HashMap<VertexId, VertexId>, v: VertexId| -> Result<VertexId, TopologyError> {
        map.get(&v)
            .copied()
            .ok_or_else(|| TopologyError::EntityNotFound("child vertex".into()))
    };

    for &e in &edge_order {
        let ed = parent.edge(e)?;
        let (tag, sharpness) = child_edge_tag(ed);
        let mid = edge_child[&e];
        for end in 0..2 {
            let corner = child_of(&vertex_child, ed.vertex(end))?;
            let half = if end == 0 {
                child.add_edge(corner, mid, tag)?
            } else {
                child.add_edge(mid, corner, tag)?
            };
            child.edge_mut(half)?.sharpness = sharpness;
        }
    }

    for &f in &face_order {
        let fd = parent.face(f)?;
        let corners: SmallVec<[VertexId; 4]> = parent
            .face_vertices(f)?
            .into_iter()
            .map(|v| child_of(&vertex_child, v))
            .collect::<Result<_, _>>()?;
        let mids: SmallVec<[VertexId; 4]> = fd.edges().iter().map(|oe| edge_child[&oe.edge]).collect();
        let n = corners.len();
        let prev = |i: usize| mids[(i + n - 1) % n];

        let mut pieces: SmallVec<[SmallVec<[VertexId; 4]>; 8]> = SmallVec::new();
        match (scheme, face_child.get(&f).copied()) {
            (SubdivisionScheme::CatmullClark, Some(center)) => {
                for &m in &mids {
                    child.add_edge(m, center, EdgeTag::Smooth)?;
                }
                for i in 0..n {
                    pieces.push(SmallVec::from_slice(&[corners[i], mids[i], center, prev(i)]));
                }
            }
            (SubdivisionScheme::LoopWarren, None) => {
                for i in 0..n {
                    child.add_edge(mids[i], mids[(i + 1) % n], EdgeTag::Smooth)?;
                }
                for i in 0..n {
                    pieces.push(SmallVec::from_slice(&[corners[i], mids[i], prev(i)]));
                }
                pieces.push(SmallVec::from_slice(&[mids[0], mids[1], mids[2]]));
            }
            (SubdivisionScheme::LoopWarren, Some(center)) => {
                for i in 0..n {
                    child.add_edge(mids[i], prev(i), EdgeTag::Smooth)?;
                    child.add_edge(mids[i], center, EdgeTag::Smooth)?;
                }
                for i in 0..n {
                    pieces.push(SmallVec::from_slice(&[corners[i], mids[i], prev(i)]));
                }
                for i in 0..n {
                    pieces.push(SmallVec::from_slice(&[prev(i), mids[i], center]));
                }
            }
            (SubdivisionScheme::CatmullClark, None) => {
                return Err(TopologyError::EntityNotFound("face point".into()).into());
            }
        }

        for piece in pieces {
            let cf = child.add_face_from_vertices(&piece)?;
            let data = child.face_mut(cf)?;
            data.level_zero_face_id = fd.level_zero_face_id();
            data.parent_face_id = fd.id();
            data.status = fd.status();
        }
    }

    child.derive_all_tags();
    child.resolve_sector_coefficients()?;
    tracing::debug!(
        level = index,
        vertices = child.vertex_count(),
        edges = child.edge_count(),
        faces = child.face_count(),
        "subdivided level"
    );
    Ok(child)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;

    fn level_from(scheme: SubdivisionScheme, points: &[Point3], faces: &[&[usize]]) -> SubdLevel {
        let mut level = SubdLevel::new(0, scheme);
        let v: Vec<_> = points
            .iter()
            .map(|&p| level.add_vertex(p, VertexTag::Unset).unwrap())
            .collect();
        for face in faces {
            let corners: Vec<_> = face.iter().map(|&i| v[i]).collect();
            level.add_face_from_vertices(&corners).unwrap();
        }
        level.derive_all_tags();
        level.resolve_sector_coefficients().unwrap();
        level
    }

    #[test]
    fn catmull_clark_pentagon() {
        let pts: Vec<Point3> = (0..5_i32)
            .map(|i| {
                let a = f64::from(i) * std::f64::consts::TAU / 5.0;
                Point3::new(a.cos(), a.sin(), 0.0)
            })
            .collect();
        let level = level_from(SubdivisionScheme::CatmullClark, &pts, &[&[0, 1, 2, 3, 4]]);
        assert_eq!(projected_face_count(&level), 5);
        let child = refine(&level).unwrap();
        assert_eq!(child.index(), 1);
        assert_eq!(child.face_count(), 5);
        assert_eq!(child.vertex_count(), 5 + 5 + 1);
        assert_eq!(child.edge_count(), 10 + 5);
        assert!(child.faces().all(|(_, f)| f.edge_count() == 4));
        let parent_id = level.faces().next().unwrap().1.id();
        assert!(child.faces().all(|(_, f)| f.parent_face_id() == parent_id));
    }

    #[test]
    fn loop_quad_becomes_eight_triangles() {
        let pts = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let level = level_from(SubdivisionScheme::LoopWarren, &pts, &[&[0, 1, 2, 3]]);
        assert_eq!(projected_face_count(&level), 8);
        let child = refine(&level).unwrap();
        assert_eq!(child.face_count(), 8);
        assert_eq!(child.vertex_count(), 4 + 4 + 1);
        // 8 halves, 4 around the inner ring and 4 spokes.
        assert_eq!(child.edge_count(), 16);
        assert!(child.faces().all(|(_, f)| f.edge_count() == 3));
    }

    #[test]
    fn ids_continue_from_parent() {
        let pts = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let level = level_from(SubdivisionScheme::LoopWarren, &pts, &[&[0, 1, 2]]);
        let child = refine(&level).unwrap();
        let min_child_vertex = child.vertices().map(|(_, v)| v.id()).min().unwrap();
        assert_eq!(min_child_vertex, 4);
        let min_child_face = child.faces().map(|(_, f)| f.id()).min().unwrap();
        assert_eq!(min_child_face, 2);
    }

    #[test]
    fn sharp_edges_lose_one_per_level() {
        let mut parent = EdgeData::new(1, 0, [VertexId::default(), VertexId::default()], EdgeTag::Sharp);
        parent.sharpness = 2.5;
        assert_eq!(child_edge_tag(&parent), (EdgeTag::Sharp, 1.5));
        parent.sharpness = 0.75;
        assert_eq!(child_edge_tag(&parent), (EdgeTag::Smooth, 0.0));
        parent.tag = EdgeTag::SmoothX;
        assert_eq!(child_edge_tag(&parent), (EdgeTag::Smooth, 0.0));
    }
}
