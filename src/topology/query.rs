//! Read-only traversal of a level.

use smallvec::SmallVec;

use crate::error::TopologyError;
use crate::math::Point3;

use super::edge::EdgeData;
use super::face::FaceData;
use super::id::{EdgeId, FaceId, VertexId};
use super::tag::{EdgeTag, VertexTag};
use super::vertex::VertexData;
use super::SubdLevel;

impl SubdLevel {
    /// All vertices in arena order.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &VertexData)> + '_ {
        self.vertices.iter()
    }

    /// All edges in arena order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &EdgeData)> + '_ {
        self.edges.iter()
    }

    /// All faces in arena order.
    pub fn faces(&self) -> impl Iterator<Item = (FaceId, &FaceData)> + '_ {
        self.faces.iter()
    }

    /// Vertex keys sorted by persistent id.
    #[must_use]
    pub fn vertex_keys_by_id(&self) -> Vec<VertexId> {
        let mut keys: Vec<(u32, VertexId)> = self.vertices.iter().map(|(k, v)| (v.id, k)).collect();
        keys.sort_unstable_by_key(|&(id, _)| id);
        keys.into_iter().map(|(_, k)| k).collect()
    }

    /// Edge keys sorted by persistent id.
    #[must_use]
    pub fn edge_keys_by_id(&self) -> Vec<EdgeId> {
        let mut keys: Vec<(u32, EdgeId)> = self.edges.iter().map(|(k, e)| (e.id, k)).collect();
        keys.sort_unstable_by_key(|&(id, _)| id);
        keys.into_iter().map(|(_, k)| k).collect()
    }

    /// Face keys sorted by persistent id.
    #[must_use]
    pub fn face_keys_by_id(&self) -> Vec<FaceId> {
        let mut keys: Vec<(u32, FaceId)> = self.faces.iter().map(|(k, f)| (f.id, k)).collect();
        keys.sort_unstable_by_key(|&(id, _)| id);
        keys.into_iter().map(|(_, k)| k).collect()
    }

    /// Vertices carrying `tag`.
    pub fn vertices_with_tag(&self, tag: VertexTag) -> impl Iterator<Item = (VertexId, &VertexData)> + '_ {
        self.vertices.iter().filter(move |(_, v)| v.tag == tag)
    }

    /// Edges carrying `tag`.
    pub fn edges_with_tag(&self, tag: EdgeTag) -> impl Iterator<Item = (EdgeId, &EdgeData)> + '_ {
        self.edges.iter().filter(move |(_, e)| e.tag == tag)
    }

    /// The edge joining `a` and `b`, in either direction.
    #[must_use]
    pub fn find_edge(&self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        let va = self.vertices.get(a)?;
        va.edges.iter().map(|oe| oe.edge).find(|&e| {
            self.edges
                .get(e)
                .is_some_and(|ed| ed.vertices.contains(&b) && ed.vertices.contains(&a))
        })
    }

    /// Corner vertices of a face in cycle order.
    ///
    /// # Errors
    ///
    /// Returns an error if the face or one of its edges is missing.
    pub fn face_vertices(&self, face: FaceId) -> Result<SmallVec<[VertexId; 4]>, TopologyError> {
        let fd = self.face(face)?;
        fd.edges
            .iter()
            .map(|oe| Ok(self.edge(oe.edge)?.vertices[oe.start_end()]))
            .collect()
    }

    /// Corner positions of a face in cycle order.
    ///
    /// # Errors
    ///
    /// Returns an error if the face or one of its components is missing.
    pub fn face_points(&self, face: FaceId) -> Result<SmallVec<[Point3; 4]>, TopologyError> {
        self.face_vertices(face)?
            .into_iter()
            .map(|v| Ok(self.vertex(v)?.point))
            .collect()
    }

    /// Index of corner `v` in `face`.
    #[must_use]
    pub fn face_corner_index(&self, face: FaceId, v: VertexId) -> Option<usize> {
        self.face_vertices(face).ok()?.iter().position(|&c| c == v)
    }

    /// Vertices joined to `v` by an edge, in the vertex's edge order.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex or one of its edges is missing.
    pub fn vertex_neighbors(&self, v: VertexId) -> Result<SmallVec<[VertexId; 8]>, TopologyError> {
        let vd = self.vertex(v)?;
        vd.edges
            .iter()
            .map(|oe| Ok(self.edge(oe.edge)?.vertices[usize::from(oe.forward)]))
            .collect()
    }

    /// Number of crease edges at `v`.
    #[must_use]
    pub fn crease_edge_count(&self, v: VertexId) -> usize {
        self.vertices.get(v).map_or(0, |vd| {
            vd.edges
                .iter()
                .filter(|oe| self.edges.get(oe.edge).is_some_and(|e| e.tag == EdgeTag::Crease))
                .count()
        })
    }

    /// Returns `true` if some edge at `v` does not have exactly two faces.
    #[must_use]
    pub fn is_boundary_vertex(&self, v: VertexId) -> bool {
        self.vertices.get(v).is_some_and(|vd| {
            vd.edges
                .iter()
                .any(|oe| self.edges.get(oe.edge).is_some_and(|e| e.faces.len() != 2))
        })
    }

    /// The two edges of `face` that meet at corner `v`: the one arriving at
    /// `v` and the one leaving it.
    #[must_use]
    pub fn face_edges_at_corner(&self, face: FaceId, v: VertexId) -> Option<(EdgeId, EdgeId)> {
        let fd = self.faces.get(face)?;
        let corners = self.face_vertices(face).ok()?;
        let i = corners.iter().position(|&c| c == v)?;
        let n = fd.edges.len();
        Some((fd.edges[(i + n - 1) % n].edge, fd.edges[i].edge))
    }

    /// Faces shared by two vertices.
    #[must_use]
    pub fn common_faces(&self, a: VertexId, b: VertexId) -> SmallVec<[FaceId; 2]> {
        let (Some(va), Some(vb)) = (self.vertices.get(a), self.vertices.get(b)) else {
            return SmallVec::new();
        };
        va.faces.iter().copied().filter(|f| vb.faces.contains(f)).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::math::Point3;
    use crate::topology::{EdgeTag, SubdLevel, SubdivisionScheme, VertexTag};

    #[test]
    fn face_traversal_and_neighbors() {
        let mut level = SubdLevel::new(0, SubdivisionScheme::LoopWarren);
        let a = level.add_vertex(Point3::new(0.0, 0.0, 0.0), VertexTag::Unset).unwrap();
        let b = level.add_vertex(Point3::new(1.0, 0.0, 0.0), VertexTag::Unset).unwrap();
        let c = level.add_vertex(Point3::new(0.0, 1.0, 0.0), VertexTag::Unset).unwrap();
        let f = level.add_face_from_vertices(&[a, b, c]).unwrap();

        assert_eq!(level.face_vertices(f).unwrap().as_slice(), &[a, b, c]);
        assert_eq!(level.face_corner_index(f, c), Some(2));
        let mut n = level.vertex_neighbors(a).unwrap();
        n.sort();
        let mut expected = [b, c];
        expected.sort();
        assert_eq!(n.as_slice(), &expected);
        assert!(level.find_edge(c, b).is_some());
        assert!(level.is_boundary_vertex(a));

        let (incoming, outgoing) = level.face_edges_at_corner(f, b).unwrap();
        assert_eq!(incoming, level.find_edge(a, b).unwrap());
        assert_eq!(outgoing, level.find_edge(b, c).unwrap());
        assert_eq!(level.common_faces(a, c).as_slice(), &[f]);
    }

    #[test]
    fn tag_filters_and_id_order() {
        let mut level = SubdLevel::new(0, SubdivisionScheme::CatmullClark);
        let a = level.add_vertex(Point3::origin(), VertexTag::Corner).unwrap();
        let b = level.add_vertex(Point3::new(1.0, 0.0, 0.0), VertexTag::Smooth).unwrap();
        let c = level.add_vertex(Point3::new(2.0, 0.0, 0.0), VertexTag::Corner).unwrap();
        level.add_edge(a, b, EdgeTag::Crease).unwrap();
        level.add_edge(b, c, EdgeTag::Smooth).unwrap();

        assert_eq!(level.vertices_with_tag(VertexTag::Corner).count(), 2);
        assert_eq!(level.edges_with_tag(EdgeTag::Crease).count(), 1);
        assert_eq!(level.crease_edge_count(b), 1);
        assert_eq!(level.vertex_keys_by_id(), vec![a, b, c]);
    }
}
