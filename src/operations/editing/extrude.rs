use std::collections::{HashMap, HashSet};

use smallvec::SmallVec;

use crate::diagnostics;
use crate::error::Result;
use crate::math::{is_finite_point, transform_point, Matrix4};
use crate::subd::Subd;
use crate::topology::{ComponentKey, EdgeId, EdgeTag, FaceId, OrientedEdge, SubdLevel, VertexId, VertexTag};

use super::{finish, require_face};

/// Components created by [`ExtrudeComponents`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtrusionSummary {
    /// One quad per boundary edge of the selection.
    pub side_faces: Vec<FaceId>,
    /// Copies of the selection's boundary vertices.
    pub new_vertices: Vec<VertexId>,
    /// Copies of the boundary edges followed by the edges joining each
    /// boundary vertex to its copy.
    pub new_edges: Vec<EdgeId>,
}

/// Extrudes a set of faces of the active level.
///
/// The boundary between the selected faces and the rest of the surface is
/// duplicated, the selected faces move onto the copy, and a ring of quads
/// joins the two. Only the selected faces are transformed.
pub struct ExtrudeComponents {
    transform: Matrix4,
    faces: Vec<FaceId>,
}

/// A selection boundary edge and the corners its selected face visits it
/// from and to.
struct BoundaryEdge {
    edge: EdgeId,
    face: FaceId,
    from: VertexId,
    to: VertexId,
}

impl ExtrudeComponents {
    /// Creates a new `ExtrudeComponents` operation.
    #[must_use]
    pub fn new(transform: Matrix4, faces: Vec<FaceId>) -> Self {
        Self { transform, faces }
    }

    /// Executes the extrusion.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error if the selection is empty, repeats a
    /// face, names a face outside the active level, or the transform maps a
    /// selected vertex to a non-finite point.
    pub fn execute(&self, subd: &mut Subd) -> Result<ExtrusionSummary> {
        let level = subd.active_level();
        let selected = self.check(level)?;

        let mut boundary: Vec<BoundaryEdge> = Vec::new();
        let mut interior_edges: Vec<EdgeId> = Vec::new();
        let mut seen: HashSet<EdgeId> = HashSet::new();
        let mut selected_vertices: Vec<VertexId> = Vec::new();
        for &f in &self.faces {
            for &oe in level.face(f)?.edges() {
                let ed = level.edge(oe.edge)?;
                let from = ed.vertex(oe.start_end());
                if !selected_vertices.contains(&from) {
                    selected_vertices.push(from);
                }
                if !seen.insert(oe.edge) {
                    continue;
                }
                let selected_faces = ed.faces().iter().filter(|of| selected.contains(&of.face)).count();
                if selected_faces == 1 {
                    boundary.push(BoundaryEdge {
                        edge: oe.edge,
                        face: f,
                        from,
                        to: ed.vertex(1 - oe.start_end()),
                    });
                } else {
                    interior_edges.push(oe.edge);
                }
            }
        }
        let mut rim: Vec<VertexId> = Vec::new();
        for b in &boundary {
            for v in [b.from, b.to] {
                if !rim.contains(&v) {
                    rim.push(v);
                }
            }
        }
        let mut targets = Vec::with_capacity(selected_vertices.len());
        for &v in &selected_vertices {
            let p = transform_point(&self.transform, &level.vertex(v)?.point());
            if !is_finite_point(&p) {
                return Err(diagnostics::invalid_input("extrusion transform produced a non-finite point").into());
            }
            targets.push((v, p));
        }
        let mut rewire: Vec<(EdgeId, usize)> = Vec::new();
        for &e in &interior_edges {
            let ed = level.edge(e)?;
            for end in 0..2 {
                if rim.contains(&ed.vertex(end)) {
                    rewire.push((e, end));
                }
            }
        }
        let provenance: HashMap<FaceId, (u32, u32)> = self
            .faces
            .iter()
            .map(|&f| level.face(f).map(|d| (f, (d.level_zero_face_id(), d.parent_face_id()))))
            .collect::<std::result::Result<_, _>>()?;

        let level = subd.active_level_mut();
        let mut summary = ExtrusionSummary::default();
        let mut copy: HashMap<VertexId, VertexId> = HashMap::with_capacity(rim.len());
        let mut moved: Vec<ComponentKey> = Vec::new();
        for &(v, p) in &targets {
            if rim.contains(&v) {
                let c = level.add_vertex(p, VertexTag::Unset)?;
                copy.insert(v, c);
                summary.new_vertices.push(c);
            } else {
                level.vertex_mut(v)?.point = p;
                moved.push(ComponentKey::Vertex(v));
            }
        }
        let copy_of = |v: VertexId| copy.get(&v).copied().unwrap_or(v);

        let mut lifted: HashMap<EdgeId, EdgeId> = HashMap::with_capacity(boundary.len());
        for b in &boundary {
            let ed = level.edge(b.edge)?;
            let [v0, v1] = ed.vertices();
            let e = level.add_edge(copy_of(v0), copy_of(v1), EdgeTag::Unset)?;
            lifted.insert(b.edge, e);
            summary.new_edges.push(e);
        }
        for &v in &rim {
            summary.new_edges.push(level.add_edge(v, copy_of(v), EdgeTag::Unset)?);
        }
        for &(e, end) in &rewire {
            let v = level.edge(e)?.vertex(end);
            level.set_edge_vertex(e, end, copy_of(v))?;
        }
        for &f in &self.faces {
            let cycle: SmallVec<[OrientedEdge; 8]> = level
                .face(f)?
                .edges()
                .iter()
                .map(|&oe| match lifted.get(&oe.edge) {
                    Some(&e) => OrientedEdge::new(e, oe.forward),
                    None => oe,
                })
                .collect();
            level.set_face_edges(f, &cycle)?;
        }
        if !moved.is_empty() {
            level.notify_modified(&moved);
        }

        for b in &boundary {
            let side = level.add_face_from_vertices(&[b.from, b.to, copy_of(b.to), copy_of(b.from)])?;
            let (level_zero_face_id, parent_face_id) = provenance.get(&b.face).copied().unwrap_or_default();
            let data = level.face_mut(side)?;
            data.level_zero_face_id = level_zero_face_id;
            data.parent_face_id = parent_face_id;
            summary.side_faces.push(side);
        }

        let mut touched: Vec<VertexId> = selected_vertices;
        touched.extend(summary.new_vertices.iter().copied());
        finish(subd, &touched, &HashSet::new())?;
        tracing::debug!(
            faces = self.faces.len(),
            side_faces = summary.side_faces.len(),
            "faces extruded"
        );
        Ok(summary)
    }

    fn check(&self, level: &SubdLevel) -> Result<HashSet<FaceId>> {
        if self.faces.is_empty() {
            return Err(diagnostics::invalid_input("extrusion needs at least one face").into());
        }
        let mut selected = HashSet::with_capacity(self.faces.len());
        for &f in &self.faces {
            require_face(level, f)?;
            if !selected.insert(f) {
                return Err(diagnostics::invalid_input("extrusion selection repeats a face").into());
            }
        }
        Ok(selected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Vector3;
    use crate::operations::editing::fixtures::{grid_vertex, quad_grid};

    fn lift(z: f64) -> Matrix4 {
        Matrix4::new_translation(&Vector3::new(0.0, 0.0, z))
    }

    #[test]
    fn single_quad_becomes_open_box() {
        let mut subd = quad_grid(1);
        let f = subd.active_level().faces().next().unwrap().0;
        let summary = ExtrudeComponents::new(lift(1.0), vec![f]).execute(&mut subd).unwrap();
        assert_eq!(summary.side_faces.len(), 4);
        assert_eq!(summary.new_vertices.len(), 4);
        assert_eq!(summary.new_edges.len(), 8);

        let level = subd.active_level();
        assert_eq!((level.vertex_count(), level.edge_count(), level.face_count()), (8, 12, 5));
        // The cap moved up, the old rim stayed and is the only crease loop.
        assert!(level.face_points(f).unwrap().iter().all(|p| p.z == 1.0));
        assert_eq!(level.edges_with_tag(EdgeTag::Crease).count(), 4);
        for (_, fd) in level.faces() {
            level.check_face_cycle(fd.edges()).unwrap();
        }
        for (_, ed) in level.edges() {
            assert_eq!(ed.tag().is_smooth(), ed.face_count() == 2);
        }
    }

    #[test]
    fn interior_face_keeps_neighbors_in_place() {
        let mut subd = quad_grid(3);
        let center = subd.active_level().face_by_id(5).unwrap();
        let corner = grid_vertex(&subd, 3, 1, 1);
        ExtrudeComponents::new(lift(0.5), vec![center]).execute(&mut subd).unwrap();
        let level = subd.active_level();
        assert_eq!(level.face_count(), 9 + 4);
        assert_eq!(level.vertex(corner).unwrap().point().z, 0.0);
        assert!(level.face_points(center).unwrap().iter().all(|p| p.z == 0.5));
        // A closed rim leaves no new creases.
        assert_eq!(level.edges_with_tag(EdgeTag::Crease).count(), 12);
    }

    #[test]
    fn patch_interior_vertices_move_without_copies() {
        let mut subd = quad_grid(2);
        let faces: Vec<FaceId> = subd.active_level().face_keys_by_id();
        let center = grid_vertex(&subd, 2, 1, 1);
        let summary = ExtrudeComponents::new(lift(2.0), faces).execute(&mut subd).unwrap();
        assert_eq!(summary.new_vertices.len(), 8);
        assert_eq!(summary.side_faces.len(), 8);
        assert_eq!(subd.active_level().vertex(center).unwrap().point().z, 2.0);
    }

    #[test]
    fn repeated_faces_are_rejected() {
        let mut subd = quad_grid(1);
        let f = subd.active_level().faces().next().unwrap().0;
        assert!(ExtrudeComponents::new(lift(1.0), vec![f, f]).execute(&mut subd).is_err());
        assert!(ExtrudeComponents::new(lift(1.0), Vec::new()).execute(&mut subd).is_err());
        assert_eq!(subd.face_count(), 1);
    }
}
