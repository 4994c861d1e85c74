use smallvec::SmallVec;

use super::cache::PointCache;
use super::id::EdgeId;
use super::oriented::OrientedEdge;
use super::status::ComponentStatus;

/// Data associated with a subdivision face.
///
/// A face is a cyclic sequence of oriented edges with at least three sides.
/// Corner `i` is the start of the `i`-th oriented edge.
#[derive(Debug, Clone)]
pub struct FaceData {
    pub(crate) id: u32,
    pub(crate) level: u16,
    pub(crate) edges: SmallVec<[OrientedEdge; 4]>,
    pub(crate) status: ComponentStatus,
    pub(crate) level_zero_face_id: u32,
    pub(crate) parent_face_id: u32,
    pub(crate) subdivision_point: PointCache,
}

impl FaceData {
    pub(crate) fn new(id: u32, level: u16) -> Self {
        Self {
            id,
            level,
            edges: SmallVec::new(),
            status: ComponentStatus::empty(),
            level_zero_face_id: id,
            parent_face_id: 0,
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

    /// The oriented edge cycle.
    #[must_use]
    pub fn edges(&self) -> &[OrientedEdge] {
        &self.edges
    }

    /// Number of sides.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Slot of `edge` in the cycle.
    #[must_use]
    pub fn edge_slot(&self, edge: EdgeId) -> Option<usize> {
        self.edges.iter().position(|oe| oe.edge == edge)
    }

    #[must_use]
    pub fn status(&self) -> ComponentStatus {
        self.status
    }

    /// Id of the level-zero face this face descends from.
    #[must_use]
    pub fn level_zero_face_id(&self) -> u32 {
        self.level_zero_face_id
    }

    /// Id of the face on the level below that this face was cut from (0 on level 0).
    #[must_use]
    pub fn parent_face_id(&self) -> u32 {
        self.parent_face_id
    }

    #[must_use]
    pub fn cached_subdivision_point(&self) -> Option<crate::math::Point3> {
        self.subdivision_point.get()
    }
}
