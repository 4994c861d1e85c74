use std::collections::HashSet;

use smallvec::SmallVec;

use crate::diagnostics;
use crate::error::Result;
use crate::subd::Subd;
use crate::topology::{EdgeData, EdgeId, EdgeTag, FaceId, OrientedEdge};

use super::{finish, require_edge, require_vertex};

/// Collapses two collinear edges that meet at a vertex with no other edges,
/// removing that vertex. The first edge survives and spans both.
pub struct MergeEdges {
    first: EdgeId,
    second: EdgeId,
}

/// Whether two edges may be joined into one without changing the crease
/// network.
fn tags_compatible(a: &EdgeData, b: &EdgeData) -> bool {
    match (a.tag(), b.tag()) {
        (EdgeTag::Crease, EdgeTag::Crease) => true,
        (EdgeTag::Sharp, EdgeTag::Sharp) => a.sharpness().to_bits() == b.sharpness().to_bits(),
        (EdgeTag::Smooth | EdgeTag::SmoothX, EdgeTag::Smooth | EdgeTag::SmoothX) => true,
        _ => false,
    }
}

impl MergeEdges {
    /// Creates a new `MergeEdges` operation.
    #[must_use]
    pub fn new(first: EdgeId, second: EdgeId) -> Self {
        Self { first, second }
    }

    /// Executes the merge, returning the surviving edge.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error unless both edges exist, share exactly
    /// one vertex that has no other edges, carry compatible tags, bound the
    /// same faces, are collinear within the configured tolerance, and every
    /// shared face keeps at least three sides.
    pub fn execute(&self, subd: &mut Subd) -> Result<EdgeId> {
        let tolerance = subd.config().collinear_tolerance;
        let level = subd.active_level();
        if self.first == self.second {
            return Err(diagnostics::invalid_input("cannot merge an edge with itself").into());
        }
        let e0 = require_edge(level, self.first)?;
        let e1 = require_edge(level, self.second)?;

        let shared: SmallVec<[_; 2]> = e0.vertices().into_iter().filter(|v| e1.end_of(*v).is_some()).collect();
        let &[middle] = shared.as_slice() else {
            return Err(diagnostics::invalid_input("edges must share exactly one vertex").into());
        };
        if require_vertex(level, middle)?.edge_count() != 2 {
            return Err(diagnostics::invalid_input("shared vertex has other edges").into());
        }
        let (Some(a), Some(b)) = (e0.other_vertex(middle), e1.other_vertex(middle)) else {
            return Err(diagnostics::invalid_input("edges must share exactly one vertex").into());
        };
        if level.find_edge(a, b).is_some() {
            return Err(diagnostics::invalid_input("outer vertices are already joined by an edge").into());
        }
        if !tags_compatible(e0, e1) {
            return Err(diagnostics::invalid_input(format!(
                "edge tags {} and {} cannot be merged",
                e0.tag().name(),
                e1.tag().name()
            ))
            .into());
        }
        let faces: SmallVec<[FaceId; 2]> = e0.faces().iter().map(|of| of.face).collect();
        if faces.len() != e1.face_count() || !faces.iter().all(|&f| e1.has_face(f)) {
            return Err(diagnostics::invalid_input("edges do not bound the same faces").into());
        }
        for &f in &faces {
            if level.face(f)?.edge_count() < 4 {
                return Err(diagnostics::invalid_input("merge would leave a face with fewer than 3 sides").into());
            }
        }

        let (pa, pm, pb) = (level.vertex(a)?.point(), level.vertex(middle)?.point(), level.vertex(b)?.point());
        let span = pb - pa;
        let length = span.norm();
        let offset = (pm - pa).cross(&span).norm() / length;
        if length <= 0.0 || offset > tolerance * length {
            return Err(diagnostics::invalid_input("edges are not collinear").into());
        }
        let end = e0.end_of(middle).unwrap_or(1);

        let level = subd.active_level_mut();
        level.set_edge_vertex(self.first, end, b)?;
        for f in faces {
            let cycle: SmallVec<[OrientedEdge; 8]> = level
                .face(f)?
                .edges()
                .iter()
                .copied()
                .filter(|oe| oe.edge != self.second)
                .collect();
            level.set_face_edges(f, &cycle)?;
        }
        level.remove_edge(self.second)?;
        level.remove_vertex(middle)?;

        finish(subd, &[a, b], &HashSet::new())?;
        Ok(self.first)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::editing::fixtures::{grid_vertex, p, quad_grid};
    use crate::operations::editing::SplitEdge;

    #[test]
    fn merge_undoes_split() {
        let mut subd = quad_grid(2);
        let (a, b) = (grid_vertex(&subd, 2, 1, 1), grid_vertex(&subd, 2, 1, 2));
        let e = subd.active_level().find_edge(a, b).unwrap();
        let counts = (subd.vertex_count(), subd.edge_count(), subd.face_count());

        let mid = SplitEdge::new(e).execute(&mut subd).unwrap();
        let tail = subd.active_level().find_edge(mid, b).unwrap();
        let survivor = MergeEdges::new(e, tail).execute(&mut subd).unwrap();

        let level = subd.active_level();
        assert_eq!((level.vertex_count(), level.edge_count(), level.face_count()), counts);
        assert_eq!(survivor, e);
        assert_eq!(level.find_edge(a, b), Some(e));
        assert!(!level.contains_vertex(mid));
        for (_, fd) in level.faces() {
            assert_eq!(fd.edge_count(), 4);
            level.check_face_cycle(fd.edges()).unwrap();
        }
    }

    #[test]
    fn bent_edges_are_rejected() {
        let mut subd = quad_grid(1);
        let (a, b) = (grid_vertex(&subd, 1, 0, 0), grid_vertex(&subd, 1, 1, 0));
        let e = subd.active_level().find_edge(a, b).unwrap();
        let mid = SplitEdge::new(e).at(p(0.5, -0.25, 0.0)).execute(&mut subd).unwrap();
        let tail = subd.active_level().find_edge(mid, b).unwrap();
        assert!(MergeEdges::new(e, tail).execute(&mut subd).is_err());
        assert!(subd.active_level().contains_vertex(mid));
    }

    #[test]
    fn edges_at_a_busy_vertex_are_rejected() {
        let mut subd = quad_grid(2);
        let c = grid_vertex(&subd, 2, 1, 1);
        let l = subd.active_level().find_edge(grid_vertex(&subd, 2, 0, 1), c).unwrap();
        let r = subd.active_level().find_edge(c, grid_vertex(&subd, 2, 2, 1)).unwrap();
        assert!(MergeEdges::new(l, r).execute(&mut subd).is_err());
        assert!(MergeEdges::new(l, l).execute(&mut subd).is_err());
    }
}
