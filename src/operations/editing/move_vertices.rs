use crate::diagnostics;
use crate::error::Result;
use crate::math::{is_finite_point, transform_point, Matrix4};
use crate::subd::Subd;
use crate::topology::{ComponentKey, VertexId};

use super::require_vertex;

/// Applies a transform to vertices of the active level.
///
/// Topology and tags are unchanged; corner sector coefficients are
/// recomputed because they depend on the corner angle.
pub struct MoveVertices {
    vertices: Vec<VertexId>,
    transform: Matrix4,
}

impl MoveVertices {
    /// Creates a new `MoveVertices` operation.
    #[must_use]
    pub fn new(vertices: Vec<VertexId>, transform: Matrix4) -> Self {
        Self { vertices, transform }
    }

    /// Executes the move. Repeated vertices are moved once.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error if a vertex is not in the active level
    /// or the transform maps it to a non-finite point.
    pub fn execute(&self, subd: &mut Subd) -> Result<()> {
        let level = subd.active_level();
        let mut targets = Vec::with_capacity(self.vertices.len());
        for &v in &self.vertices {
            if targets.iter().any(|&(seen, _)| seen == v) {
                continue;
            }
            let p = transform_point(&self.transform, &require_vertex(level, v)?.point());
            if !is_finite_point(&p) {
                return Err(diagnostics::invalid_input("transform produced a non-finite point").into());
            }
            targets.push((v, p));
        }
        if targets.is_empty() {
            return Ok(());
        }

        let level = subd.active_level_mut();
        let mut changed = Vec::with_capacity(targets.len());
        for &(v, p) in &targets {
            level.vertex_mut(v)?.point = p;
            changed.push(ComponentKey::Vertex(v));
        }
        level.notify_modified(&changed);
        level.resolve_sector_coefficients()?;
        subd.finish_edit();
        tracing::debug!(vertices = targets.len(), "vertices moved");
        Ok(())
    }
}
