use std::collections::HashSet;

use smallvec::SmallVec;

use crate::diagnostics;
use crate::error::Result;
use crate::subd::Subd;
use crate::topology::{EdgeId, EdgeTag, FaceId, OrientedEdge};

use super::{finish, require_face};

/// Splits a face of the active level along a new edge between two of its
/// corners.
pub struct SplitFace {
    face: FaceId,
    corner_a: usize,
    corner_b: usize,
}

impl SplitFace {
    /// Creates a new `SplitFace` operation. Corners are indices into the
    /// face's corner cycle.
    #[must_use]
    pub fn new(face: FaceId, corner_a: usize, corner_b: usize) -> Self {
        Self {
            face,
            corner_a,
            corner_b,
        }
    }

    /// Executes the split, returning the new edge. The original face keeps
    /// the corners from the lower to the higher index.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error if the face is missing, a corner index
    /// is out of range, either part would have fewer than three sides, or the
    /// corners are already joined by an edge.
    pub fn execute(&self, subd: &mut Subd) -> Result<EdgeId> {
        let level = subd.active_level();
        let fd = require_face(level, self.face)?;
        let n = fd.edge_count();
        let (lo, hi) = (self.corner_a.min(self.corner_b), self.corner_a.max(self.corner_b));
        if hi >= n {
            return Err(diagnostics::invalid_input(format!("corner {hi} is out of range for a {n}-sided face")).into());
        }
        if hi - lo < 2 || n - (hi - lo) < 2 {
            return Err(diagnostics::invalid_input("split would leave a face with fewer than 3 sides").into());
        }
        let corners = level.face_vertices(self.face)?;
        let (a, b) = (corners[lo], corners[hi]);
        if level.find_edge(a, b).is_some() {
            return Err(diagnostics::invalid_input("face corners are already joined by an edge").into());
        }
        let edges: SmallVec<[OrientedEdge; 8]> = fd.edges().iter().copied().collect();
        let (status, level_zero_face_id, parent_face_id) = (fd.status(), fd.level_zero_face_id(), fd.parent_face_id());

        let level = subd.active_level_mut();
        let diagonal = level.add_edge(a, b, EdgeTag::Unset)?;
        let mut first: SmallVec<[OrientedEdge; 8]> = edges[lo..hi].iter().copied().collect();
        first.push(OrientedEdge::new(diagonal, false));
        let mut second: SmallVec<[OrientedEdge; 8]> = edges[hi..].iter().chain(&edges[..lo]).copied().collect();
        second.push(OrientedEdge::new(diagonal, true));

        level.set_face_edges(self.face, &first)?;
        let g = level.add_face(&second)?;
        let data = level.face_mut(g)?;
        data.status = status;
        data.level_zero_face_id = level_zero_face_id;
        data.parent_face_id = parent_face_id;

        finish(subd, &[a, b], &HashSet::new())?;
        Ok(diagonal)
    }
}
