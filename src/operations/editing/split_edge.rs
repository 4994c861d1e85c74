use std::collections::HashSet;

use smallvec::SmallVec;

use crate::diagnostics;
use crate::error::Result;
use crate::math::{is_finite_point, Point3, TOLERANCE};
use crate::subd::Subd;
use crate::topology::{EdgeId, FaceId, OrientedEdge, VertexId, VertexTag};

use super::{finish, require_edge};

/// Inserts a vertex into an edge of the active level.
///
/// The edge keeps its first half; a new edge with the same tag and
/// sharpness covers the second half and is spliced into every face cycle
/// that used the edge.
pub struct SplitEdge {
    edge: EdgeId,
    point: Option<Point3>,
}

impl SplitEdge {
    /// Creates a new `SplitEdge` operation splitting at the midpoint.
    #[must_use]
    pub fn new(edge: EdgeId) -> Self {
        Self { edge, point: None }
    }

    /// Places the new vertex at `point` instead of the midpoint.
    #[must_use]
    pub fn at(mut self, point: Point3) -> Self {
        self.point = Some(point);
        self
    }

    /// Executes the split, returning the new vertex.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error if the edge is not in the active level,
    /// or if the split point is not finite or lies on one of the edge's ends.
    pub fn execute(&self, subd: &mut Subd) -> Result<VertexId> {
        let level = subd.active_level();
        let ed = require_edge(level, self.edge)?;
        let [v0, v1] = ed.vertices();
        let (tag, sharpness) = (ed.tag(), ed.sharpness());
        let faces: SmallVec<[FaceId; 2]> = ed.faces().iter().map(|of| of.face).collect();
        let (p0, p1) = (level.vertex(v0)?.point(), level.vertex(v1)?.point());
        let point = self.point.unwrap_or_else(|| nalgebra::center(&p0, &p1));
        if !is_finite_point(&point) {
            return Err(diagnostics::invalid_input("split point is not finite").into());
        }
        if nalgebra::distance(&point, &p0) <= TOLERANCE || nalgebra::distance(&point, &p1) <= TOLERANCE {
            return Err(diagnostics::invalid_input("split point coincides with an edge end").into());
        }

        let level = subd.active_level_mut();
        let mid = level.add_vertex(point, VertexTag::Unset)?;
        let tail = level.add_edge(mid, v1, tag)?;
        level.edge_mut(tail)?.sharpness = sharpness;
        level.set_edge_vertex(self.edge, 1, mid)?;
        for f in faces {
            let mut cycle: SmallVec<[OrientedEdge; 8]> = SmallVec::new();
            for &oe in level.face(f)?.edges() {
                if oe.edge != self.edge {
                    cycle.push(oe);
                } else if oe.forward {
                    cycle.push(oe);
                    cycle.push(OrientedEdge::new(tail, true));
                } else {
                    cycle.push(OrientedEdge::new(tail, false));
                    cycle.push(oe);
                }
            }
            level.set_face_edges(f, &cycle)?;
        }

        finish(subd, &[v0, mid, v1], &HashSet::new())?;
        Ok(mid)
    }
}
