use std::collections::HashSet;

use crate::diagnostics;
use crate::error::Result;
use crate::subd::Subd;
use crate::topology::{ComponentKey, ComponentRef, EdgeId, FaceId, SubdLevel, VertexId};

use super::finish;

/// Number of components removed by [`DeleteComponents`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeletionSummary {
    pub vertices: usize,
    pub edges: usize,
    pub faces: usize,
}

/// Removes components of the active level together with everything that
/// depends on them.
///
/// Deleting a vertex removes its edges and faces; deleting an edge removes
/// its faces. Edges left without faces and vertices left without edges are
/// removed too, unless isolated components are kept.
pub struct DeleteComponents {
    components: Vec<ComponentRef>,
    keep_isolated: bool,
}

/// What a deletion removes, gathered before the first mutation.
#[derive(Default)]
struct Plan {
    faces: Vec<FaceId>,
    edges: Vec<EdgeId>,
    vertices: Vec<VertexId>,
    orphan_edges: Vec<EdgeId>,
    orphan_vertices: Vec<VertexId>,
}

impl DeleteComponents {
    /// Creates a new `DeleteComponents` operation.
    #[must_use]
    pub fn new(components: Vec<ComponentRef>) -> Self {
        Self {
            components,
            keep_isolated: false,
        }
    }

    /// Keeps edges and vertices the deletion leaves isolated.
    #[must_use]
    pub fn keep_isolated(mut self, keep: bool) -> Self {
        self.keep_isolated = keep;
        self
    }

    /// Executes the deletion.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error if a component is not in the active
    /// level; nothing is removed then.
    pub fn execute(&self, subd: &mut Subd) -> Result<DeletionSummary> {
        let plan = self.plan(subd.active_level())?;
        if plan.faces.is_empty() && plan.edges.is_empty() && plan.vertices.is_empty() {
            return Ok(DeletionSummary::default());
        }

        let level = subd.active_level_mut();
        let mut summary = DeletionSummary::default();
        for &f in &plan.faces {
            level.remove_face(f)?;
            summary.faces += 1;
        }
        for &e in &plan.edges {
            level.remove_edge(e)?;
            summary.edges += 1;
        }
        if !self.keep_isolated {
            for &e in &plan.orphan_edges {
                if level.edge(e)?.face_count() == 0 {
                    level.remove_edge(e)?;
                    summary.edges += 1;
                }
            }
        }
        for &v in &plan.vertices {
            level.remove_vertex(v)?;
            summary.vertices += 1;
        }
        let mut survivors = Vec::new();
        for &v in &plan.orphan_vertices {
            let vd = level.vertex(v)?;
            if !self.keep_isolated && vd.edge_count() == 0 && vd.face_count() == 0 {
                level.remove_vertex(v)?;
                summary.vertices += 1;
            } else {
                survivors.push(v);
            }
        }

        finish(subd, &survivors, &HashSet::new())?;
        tracing::debug!(
            vertices = summary.vertices,
            edges = summary.edges,
            faces = summary.faces,
            "components deleted"
        );
        Ok(summary)
    }

    fn plan(&self, level: &SubdLevel) -> Result<Plan> {
        let mut faces: HashSet<FaceId> = HashSet::new();
        let mut edges: HashSet<EdgeId> = HashSet::new();
        let mut vertices: HashSet<VertexId> = HashSet::new();
        for &component in &self.components {
            let key = level.resolve(component).ok_or_else(|| {
                diagnostics::invalid_input(format!("{component} is not in the active level"))
            })?;
            match key {
                ComponentKey::Vertex(v) => {
                    let vd = level.vertex(v)?;
                    vertices.insert(v);
                    edges.extend(vd.edges().iter().map(|oe| oe.edge));
                    faces.extend(vd.faces().iter().copied());
                }
                ComponentKey::Edge(e) => {
                    edges.insert(e);
                    faces.extend(level.edge(e)?.faces().iter().map(|of| of.face));
                }
                ComponentKey::Face(f) => {
                    faces.insert(f);
                }
            }
        }

        let mut orphan_edges: HashSet<EdgeId> = HashSet::new();
        let mut orphan_vertices: HashSet<VertexId> = HashSet::new();
        for &f in &faces {
            for oe in level.face(f)?.edges() {
                if !edges.contains(&oe.edge) {
                    orphan_edges.insert(oe.edge);
                }
                orphan_vertices.extend(level.edge(oe.edge)?.vertices());
            }
        }
        for &e in &edges {
            orphan_vertices.extend(level.edge(e)?.vertices());
        }
        orphan_vertices.retain(|v| !vertices.contains(v));

        // Id order keeps the removal sequence, and so the log, reproducible.
        let mut plan = Plan {
            faces: faces.into_iter().collect(),
            edges: edges.into_iter().collect(),
            vertices: vertices.into_iter().collect(),
            orphan_edges: orphan_edges.into_iter().collect(),
            orphan_vertices: orphan_vertices.into_iter().collect(),
        };
        plan.faces.sort_by_key(|&f| level.face(f).map_or(0, |d| d.id()));
        plan.edges.sort_by_key(|&e| level.edge(e).map_or(0, |d| d.id()));
        plan.orphan_edges.sort_by_key(|&e| level.edge(e).map_or(0, |d| d.id()));
        plan.vertices.sort_by_key(|&v| level.vertex(v).map_or(0, |d| d.id()));
        plan.orphan_vertices.sort_by_key(|&v| level.vertex(v).map_or(0, |d| d.id()));
        Ok(plan)
    }
}
