use smallvec::SmallVec;

use crate::math::Point3;

use super::cache::PointCache;
use super::id::{EdgeId, FaceId};
use super::oriented::OrientedEdge;
use super::status::ComponentStatus;
use super::tag::VertexTag;

/// Data associated with a subdivision vertex.
///
/// Adjacency is private: it changes only through the level's incidence
/// primitives so both sides of every incidence stay in sync.
#[derive(Debug, Clone)]
pub struct VertexData {
    pub(crate) id: u32,
    pub(crate) level: u16,
    pub(crate) point: Point3,
    pub(crate) tag: VertexTag,
    pub(crate) status: ComponentStatus,
    pub(crate) edges: SmallVec<[OrientedEdge; 4]>,
    pub(crate) faces: SmallVec<[FaceId; 4]>,
    pub(crate) subdivision_point: PointCache,
    pub(crate) limit_point: PointCache,
}

impl VertexData {
    pub(crate) fn new(id: u32, level: u16, point: Point3, tag: VertexTag) -> Self {
        Self {
            id,
            level,
            point,
            tag,
            status: ComponentStatus::empty(),
            edges: SmallVec::new(),
            faces: SmallVec::new(),
            subdivision_point: PointCache::new(),
            limit_point: PointCache::new(),
        }
    }

    /// Persistent id.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Subdivision level this vertex belongs to.
    #[must_use]
    pub fn level(&self) -> u16 {
        self.level
    }

    /// Control point position.
    #[must_use]
    pub fn point(&self) -> Point3 {
        self.point
    }

    #[must_use]
    pub fn tag(&self) -> VertexTag {
        self.tag
    }

    #[must_use]
    pub fn status(&self) -> ComponentStatus {
        self.status
    }

    /// Incident edges; `forward` is set when this vertex is the edge's start.
    #[must_use]
    pub fn edges(&self) -> &[OrientedEdge] {
        &self.edges
    }

    #[must_use]
    pub fn faces(&self) -> &[FaceId] {
        &self.faces
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    #[must_use]
    pub fn has_edge(&self, edge: EdgeId) -> bool {
        self.edges.iter().any(|oe| oe.edge == edge)
    }

    #[must_use]
    pub fn has_face(&self, face: FaceId) -> bool {
        self.faces.contains(&face)
    }

    /// Cached subdivision point, if it has been computed.
    #[must_use]
    pub fn cached_subdivision_point(&self) -> Option<Point3> {
        self.subdivision_point.get()
    }

    /// Cached limit point, if it has been computed.
    #[must_use]
    pub fn cached_limit_point(&self) -> Option<Point3> {
        self.limit_point.get()
    }
}
