use smallvec::SmallVec;

use super::cache::{PointCache, SectorCoefficient};
use super::id::{FaceId, VertexId};
use super::oriented::OrientedFace;
use super::status::ComponentStatus;
use super::tag::EdgeTag;

/// Data associated with a subdivision edge.
///
/// An edge connects two distinct vertices. `vertices[0]` is the start.
#[derive(Debug, Clone)]
pub struct EdgeData {
    pub(crate) id: u32,
    pub(crate) level: u16,
    pub(crate) vertices: [VertexId; 2],
    pub(crate) tag: EdgeTag,
    pub(crate) sharpness: f64,
    pub(crate) sector_coefficients: [SectorCoefficient; 2],
    pub(crate) status: ComponentStatus,
    pub(crate) faces: SmallVec<[OrientedFace; 2]>,
    pub(crate) subdivision_point: PointCache,
}

impl EdgeData {
    pub(crate) fn new(id: u32, level: u16, vertices: [VertexId; 2], tag: EdgeTag) -> Self {
        Self {
            id,
            level,
            vertices,
            tag,
            sharpness: 0.0,
            sector_coefficients: [SectorCoefficient::Unset; 2],
            status: ComponentStatus::empty(),
            faces: SmallVec::new(),
            subdivision_point: PointCache::new(),
        }
    }

    /// Persistent id.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[must_use]
    pub fn level(&self) -> u16 {
        self.level
    }

    /// The start and end vertices.
    #[must_use]
    pub fn vertices(&self) -> [VertexId; 2] {
        self.vertices
    }

    /// Vertex at `end` (0 = start, 1 = end).
    #[must_use]
    pub fn vertex(&self, end: usize) -> VertexId {
        self.vertices[end & 1]
    }

    /// Which end `v` occupies, if it is an endpoint.
    #[must_use]
    pub fn end_of(&self, v: VertexId) -> Option<usize> {
        self.vertices.iter().position(|&x| x == v)
    }

    /// The endpoint opposite `v`.
    #[must_use]
    pub fn other_vertex(&self, v: VertexId) -> Option<VertexId> {
        self.end_of(v).map(|end| self.vertices[1 - end])
    }

    #[must_use]
    pub fn tag(&self) -> EdgeTag {
        self.tag
    }

    /// Semi-sharp crease strength; meaningful only for [`EdgeTag::Sharp`].
    #[must_use]
    pub fn sharpness(&self) -> f64 {
        self.sharpness
    }

    #[must_use]
    pub fn sector_coefficients(&self) -> [SectorCoefficient; 2] {
        self.sector_coefficients
    }

    #[must_use]
    pub fn status(&self) -> ComponentStatus {
        self.status
    }

    #[must_use]
    pub fn faces(&self) -> &[OrientedFace] {
        &self.faces
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    #[must_use]
    pub fn has_face(&self, face: FaceId) -> bool {
        self.faces.iter().any(|of| of.face == face)
    }

    /// The face across this edge from `face`, for edges with exactly two faces.
    #[must_use]
    pub fn neighbor_face(&self, face: FaceId) -> Option<FaceId> {
        match self.faces.as_slice() {
            [a, b] if a.face == face => Some(b.face),
            [a, b] if b.face == face => Some(a.face),
            _ => None,
        }
    }

    #[must_use]
    pub fn cached_subdivision_point(&self) -> Option<crate::math::Point3> {
        self.subdivision_point.get()
    }
}
