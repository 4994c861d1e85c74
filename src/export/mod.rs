//! Polygon export for downstream tessellation.
//!
//! [`emit_level`] streams the vertices and faces of one level into a
//! [`PolygonSink`]. Faces are described by the persistent ids of their
//! corners, so a sink never sees arena keys.

mod polygon_mesh;

pub use polygon_mesh::PolygonMesh;

use std::collections::{HashSet, VecDeque};

use crate::error::Result;
use crate::math::Point3;
use crate::topology::{ComponentStatus, FaceId, SubdLevel, SubdivisionScheme, VertexId, VertexTag};

/// Receives the polygons of a level.
pub trait PolygonSink {
    /// Called once before anything else of `level` is emitted.
    fn begin_level(&mut self, level: u16, scheme: SubdivisionScheme);

    /// Called once per vertex, before the first face that uses it.
    fn add_vertex(&mut self, id: u32, point: Point3, tag: VertexTag);

    /// Called once per face with the ids of its corners in face order.
    fn add_face(&mut self, id: u32, corners: &[u32]);

    /// Called after the last vertex and face.
    fn end_level(&mut self) {}
}

/// Order in which faces are emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmitOrder {
    /// Vertices, then faces, each by ascending id.
    #[default]
    IdOrder,
    /// Breadth-first across shared edges, starting from the lowest face id of
    /// every connected patch. Vertices are emitted when first used.
    Traversal,
}

/// Options for [`emit_level`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EmitOptions {
    pub order: EmitOrder,
    /// Leaves out hidden vertices and faces, and faces with a hidden corner.
    pub skip_hidden: bool,
}

impl EmitOptions {
    #[must_use]
    pub fn with_order(mut self, order: EmitOrder) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub fn with_skip_hidden(mut self, skip_hidden: bool) -> Self {
        self.skip_hidden = skip_hidden;
        self
    }
}

/// Numbers of components handed to a sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitSummary {
    pub vertices: usize,
    pub faces: usize,
}

/// Streams `level` into `sink`.
///
/// # Errors
///
/// Returns an error if a face refers to a missing edge or vertex.
pub fn emit_level<S: PolygonSink + ?Sized>(level: &SubdLevel, sink: &mut S, options: EmitOptions) -> Result<EmitSummary> {
    let mut emitter = Emitter {
        level,
        options,
        emitted: HashSet::new(),
        summary: EmitSummary::default(),
    };
    sink.begin_level(level.index(), level.scheme());
    match options.order {
        EmitOrder::IdOrder => {
            for v in level.vertex_keys_by_id() {
                emitter.vertex(v, sink)?;
            }
            for f in level.face_keys_by_id() {
                emitter.face(f, sink)?;
            }
        }
        EmitOrder::Traversal => {
            emitter.traverse(sink)?;
            for v in level.vertex_keys_by_id() {
                emitter.vertex(v, sink)?;
            }
        }
    }
    sink.end_level();
    tracing::debug!(
        level = level.index(),
        vertices = emitter.summary.vertices,
        faces = emitter.summary.faces,
        "level emitted"
    );
    Ok(emitter.summary)
}

struct Emitter<'a> {
    level: &'a SubdLevel,
    options: EmitOptions,
    emitted: HashSet<VertexId>,
    summary: EmitSummary,
}

impl Emitter<'_> {
    fn hidden(&self, status: ComponentStatus) -> bool {
        self.options.skip_hidden && status.contains(ComponentStatus::HIDDEN)
    }

    fn vertex<S: PolygonSink + ?Sized>(&mut self, v: VertexId, sink: &mut S) -> Result<()> {
        let vd = self.level.vertex(v)?;
        if self.hidden(vd.status()) || !self.emitted.insert(v) {
            return Ok(());
        }
        sink.add_vertex(vd.id(), vd.point(), vd.tag());
        self.summary.vertices += 1;
        Ok(())
    }

    fn face<S: PolygonSink + ?Sized>(&mut self, f: FaceId, sink: &mut S) -> Result<()> {
        let fd = self.level.face(f)?;
        if self.hidden(fd.status()) {
            return Ok(());
        }
        let face_id = fd.id();
        let corners = self.level.face_vertices(f)?;
        let mut ids = Vec::with_capacity(corners.len());
        for &v in &corners {
            let vd = self.level.vertex(v)?;
            if self.hidden(vd.status()) {
                return Ok(());
            }
            ids.push(vd.id());
        }
        for &v in &corners {
            self.vertex(v, sink)?;
        }
        sink.add_face(face_id, &ids);
        self.summary.faces += 1;
        Ok(())
    }

    fn traverse<S: PolygonSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        let mut visited: HashSet<FaceId> = HashSet::new();
        let mut queue = VecDeque::new();
        for seed in self.level.face_keys_by_id() {
            if !visited.insert(seed) {
                continue;
            }
            queue.push_back(seed);
            while let Some(f) = queue.pop_front() {
                self.face(f, sink)?;
                for oe in self.level.face(f)?.edges() {
                    let ed = self.level.edge(oe.edge)?;
                    for of in ed.faces() {
                        if visited.insert(of.face) {
                            queue.push_back(of.face);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::editing::fixtures::{grid_vertex, quad_grid};
    use crate::topology::ComponentKey;

    #[test]
    fn id_order_emits_everything_sorted() {
        let subd = quad_grid(2);
        let mut mesh = PolygonMesh::default();
        let summary = emit_level(subd.active_level(), &mut mesh, EmitOptions::default()).unwrap();
        assert_eq!(summary, EmitSummary { vertices: 9, faces: 4 });
        assert_eq!(mesh.vertex_ids, (1..=9).collect::<Vec<u32>>());
        assert_eq!(mesh.face_ids, vec![1, 2, 3, 4]);
        assert_eq!(mesh.faces[0], vec![1, 2, 5, 4]);
        assert_eq!(mesh.levels, vec![0]);
    }

    #[test]
    fn traversal_reaches_neighbors_first() {
        let subd = quad_grid(3);
        let mut mesh = PolygonMesh::default();
        let options = EmitOptions::default().with_order(EmitOrder::Traversal);
        let summary = emit_level(subd.active_level(), &mut mesh, options).unwrap();
        assert_eq!(summary, EmitSummary { vertices: 16, faces: 9 });
        // Face 1 sits in a corner; its two neighbors come next.
        assert_eq!(mesh.face_ids[0], 1);
        let mut next: Vec<u32> = mesh.face_ids[1..3].to_vec();
        next.sort_unstable();
        assert_eq!(next, vec![2, 4]);
        assert_eq!(mesh.face_ids[8], 9);
        // Every corner precedes the face that uses it.
        let mut seen = HashSet::new();
        let mut cursor = 0;
        for (i, face) in mesh.faces.iter().enumerate() {
            while cursor < mesh.first_face_of_vertex.len() && mesh.first_face_of_vertex[cursor] <= i {
                seen.insert(mesh.vertex_ids[cursor]);
                cursor += 1;
            }
            assert!(face.iter().all(|id| seen.contains(id)));
        }
    }

    #[test]
    fn hidden_components_can_be_skipped() {
        let mut subd = quad_grid(2);
        let corner = grid_vertex(&subd, 2, 0, 0);
        let far = subd.active_level().face_by_id(4).unwrap();
        let level = subd.active_level_mut();
        level.insert_status(ComponentKey::Vertex(corner), ComponentStatus::HIDDEN).unwrap();
        level.insert_status(ComponentKey::Face(far), ComponentStatus::HIDDEN).unwrap();

        let mut all = PolygonMesh::default();
        emit_level(subd.active_level(), &mut all, EmitOptions::default()).unwrap();
        assert_eq!(all.faces.len(), 4);

        let mut visible = PolygonMesh::default();
        let options = EmitOptions::default().with_skip_hidden(true);
        let summary = emit_level(subd.active_level(), &mut visible, options).unwrap();
        assert_eq!(summary, EmitSummary { vertices: 8, faces: 2 });
        assert_eq!(visible.face_ids, vec![2, 3]);
        assert!(!visible.vertex_ids.contains(&1));
    }

    #[test]
    fn empty_level_emits_nothing() {
        let subd = crate::Subd::default();
        let mut mesh = PolygonMesh::default();
        let options = EmitOptions::default().with_order(EmitOrder::Traversal);
        assert_eq!(emit_level(subd.active_level(), &mut mesh, options).unwrap(), EmitSummary::default());
        assert_eq!(mesh.levels, vec![0]);
    }
}
