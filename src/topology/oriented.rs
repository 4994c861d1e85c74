use super::id::{EdgeId, FaceId};

/// An edge reference with orientation information.
///
/// On a face, `forward` means the face traverses the edge from its start
/// vertex to its end vertex. On a vertex, `forward` means the vertex is the
/// edge's start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrientedEdge {
    /// The edge identifier.
    pub edge: EdgeId,
    /// Orientation flag, see the type documentation.
    pub forward: bool,
}

impl OrientedEdge {
    /// Creates a new oriented edge.
    #[must_use]
    pub fn new(edge: EdgeId, forward: bool) -> Self {
        Self { edge, forward }
    }

    /// Index (0 or 1) of the edge end this reference starts from.
    #[must_use]
    pub fn start_end(self) -> usize {
        usize::from(!self.forward)
    }

    /// The same edge traversed the other way.
    #[must_use]
    pub fn reversed(self) -> Self {
        Self {
            edge: self.edge,
            forward: !self.forward,
        }
    }
}

/// A face reference stored on an edge.
///
/// `forward` mirrors the face's [`OrientedEdge`] entry for that edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrientedFace {
    pub face: FaceId,
    pub forward: bool,
}

impl OrientedFace {
    #[must_use]
    pub fn new(face: FaceId, forward: bool) -> Self {
        Self { face, forward }
    }
}
