use crate::math::Point3;
use crate::topology::{SubdivisionScheme, VertexTag};

use super::PolygonSink;

/// A [`PolygonSink`] that collects everything it receives.
#[derive(Debug, Clone, Default)]
pub struct PolygonMesh {
    /// Indices of the levels emitted into this mesh.
    pub levels: Vec<u16>,
    pub vertex_ids: Vec<u32>,
    pub points: Vec<Point3>,
    pub tags: Vec<VertexTag>,
    /// Number of faces already received when each vertex arrived.
    pub first_face_of_vertex: Vec<usize>,
    pub face_ids: Vec<u32>,
    /// Corner vertex ids of each face.
    pub faces: Vec<Vec<u32>>,
}

impl PolygonMesh {
    /// Position of the vertex with persistent id `id`.
    #[must_use]
    pub fn point(&self, id: u32) -> Option<Point3> {
        self.vertex_ids.iter().position(|&v| v == id).map(|i| self.points[i])
    }

    /// Triangle fans over every face, as indices into `points`.
    #[must_use]
    pub fn triangles(&self) -> Vec<[usize; 3]> {
        let mut triangles = Vec::new();
        for face in &self.faces {
            let Some(indices) = face
                .iter()
                .map(|id| self.vertex_ids.iter().position(|v| v == id))
                .collect::<Option<Vec<usize>>>()
            else {
                continue;
            };
            for i in 1..indices.len().saturating_sub(1) {
                triangles.push([indices[0], indices[i], indices[i + 1]]);
            }
        }
        triangles
    }
}

impl PolygonSink for PolygonMesh {
    fn begin_level(&mut self, level: u16, _scheme: SubdivisionScheme) {
        self.levels.push(level);
    }

    fn add_vertex(&mut self, id: u32, point: Point3, tag: VertexTag) {
        self.vertex_ids.push(id);
        self.points.push(point);
        self.tags.push(tag);
        self.first_face_of_vertex.push(self.faces.len());
    }

    fn add_face(&mut self, id: u32, corners: &[u32]) {
        self.face_ids.push(id);
        self.faces.push(corners.to_vec());
    }
}
