//! Local edits of the active level.
//!
//! Every operation checks its arguments against the active level before the
//! first mutation. Afterwards tags are re-derived around the touched
//! vertices, sector coefficients are resolved, and levels that no longer
//! derive from the edited one are discarded.

mod delete;
mod extrude;
mod merge_edges;
mod move_vertices;
mod split_edge;
mod split_face;
mod tags;

pub use delete::{DeleteComponents, DeletionSummary};
pub use extrude::{ExtrudeComponents, ExtrusionSummary};
pub use merge_edges::MergeEdges;
pub use move_vertices::MoveVertices;
pub use split_edge::SplitEdge;
pub use split_face::SplitFace;
pub use tags::{SetEdgeTags, SetVertexTags, TagChangeSummary};

use std::collections::HashSet;

use crate::diagnostics;
use crate::error::Result;
use crate::subd::Subd;
use crate::topology::{EdgeData, EdgeId, FaceData, FaceId, SubdLevel, VertexData, VertexId};

/// Re-derives tags around `vertices`, resolves sector coefficients and
/// drops the levels the edit made stale. Returns the number of retagged
/// components.
fn finish(subd: &mut Subd, vertices: &[VertexId], gained_face: &HashSet<EdgeId>) -> Result<usize> {
    let level = subd.active_level_mut();
    let retagged = level.retag_around(vertices, gained_face);
    level.resolve_sector_coefficients()?;
    subd.finish_edit();
    Ok(retagged)
}

fn require_vertex(level: &SubdLevel, vertex: VertexId) -> Result<&VertexData> {
    level
        .vertex(vertex)
        .map_err(|_| diagnostics::invalid_input("vertex is not in the active level").into())
}

fn require_edge(level: &SubdLevel, edge: EdgeId) -> Result<&EdgeData> {
    level
        .edge(edge)
        .map_err(|_| diagnostics::invalid_input("edge is not in the active level").into())
}

fn require_face(level: &SubdLevel, face: FaceId) -> Result<&FaceData> {
    level
        .face(face)
        .map_err(|_| diagnostics::invalid_input("face is not in the active level").into())
}
