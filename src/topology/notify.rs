//! Modified notifications.
//!
//! Subdivision points depend on the positions of a vertex's one-ring and on
//! the face points around it; sector coefficients depend on the sector fan at
//! each tagged end. A structural change therefore invalidates the changed
//! components, their immediate neighbors and the one-ring vertices whose
//! stencils read them. Each primitive collects that set once and clears it in
//! a single pass.

use std::collections::HashSet;

use crate::math::Point3;

use super::cache::SectorCoefficient;
use super::id::{ComponentKey, EdgeId, FaceId, VertexId};
use super::SubdLevel;

/// Components whose caches a change invalidates.
#[derive(Debug, Default)]
pub(crate) struct Neighborhood {
    vertices: HashSet<VertexId>,
    edges: HashSet<EdgeId>,
    faces: HashSet<FaceId>,
}

impl Neighborhood {
    pub(crate) fn merge(&mut self, other: Neighborhood) {
        self.vertices.extend(other.vertices);
        self.edges.extend(other.edges);
        self.faces.extend(other.faces);
    }

    pub(crate) fn len(&self) -> usize {
        self.vertices.len() + self.edges.len() + self.faces.len()
    }
}

impl SubdLevel {
    /// Collects the invalidation set of the given changed components.
    pub(crate) fn neighborhood(&self, changed: &[ComponentKey]) -> Neighborhood {
        let mut seeds: HashSet<VertexId> = HashSet::new();
        let mut hood = Neighborhood::default();
        for &key in changed {
            match key {
                ComponentKey::Vertex(v) => {
                    if self.vertices.contains_key(v) {
                        seeds.insert(v);
                    }
                }
                ComponentKey::Edge(e) => {
                    if let Some(ed) = self.edges.get(e) {
                        hood.edges.insert(e);
                        seeds.extend(ed.vertices);
                    }
                }
                ComponentKey::Face(f) => {
                    if let Some(fd) = self.faces.get(f) {
                        hood.faces.insert(f);
                        for oe in &fd.edges {
                            hood.edges.insert(oe.edge);
                            if let Some(ed) = self.edges.get(oe.edge) {
                                seeds.extend(ed.vertices);
                            }
                        }
                    }
                }
            }
        }

        for &v in &seeds {
            let Some(vd) = self.vertices.get(v) else {
                continue;
            };
            hood.vertices.insert(v);
            for oe in &vd.edges {
                if let Some(ed) = self.edges.get(oe.edge) {
                    hood.vertices.extend(ed.vertices);
                }
            }
            for &f in &vd.faces {
                hood.faces.insert(f);
                if let Some(fd) = self.faces.get(f) {
                    for oe in &fd.edges {
                        if let Some(ed) = self.edges.get(oe.edge) {
                            hood.vertices.extend(ed.vertices);
                        }
                    }
                }
            }
        }

        // Every edge at an affected vertex may have a stale sector coefficient
        // at that end and a stale edge point.
        for &v in &hood.vertices {
            if let Some(vd) = self.vertices.get(v) {
                hood.edges.extend(vd.edges.iter().map(|oe| oe.edge));
            }
        }
        hood
    }

    /// Invalidates a collected neighborhood and records one structural change.
    pub(crate) fn finish_change(&mut self, hood: Neighborhood) {
        self.revision += 1;
        let count = hood.len();
        for v in &hood.vertices {
            if let Some(vd) = self.vertices.get_mut(*v) {
                vd.subdivision_point.invalidate();
                vd.limit_point.invalidate();
            }
        }
        for e in &hood.edges {
            let Some(ed) = self.edges.get_mut(*e) else {
                continue;
            };
            ed.subdivision_point.invalidate();
            for end in 0..2 {
                if hood.vertices.contains(&ed.vertices[end]) {
                    ed.sector_coefficients[end] = SectorCoefficient::Unset;
                }
            }
        }
        for f in &hood.faces {
            if let Some(fd) = self.faces.get_mut(*f) {
                fd.subdivision_point.invalidate();
            }
        }
        tracing::trace!(level = self.index, revision = self.revision, count, "modified notification");
    }

    /// Notifies that the given components changed outside the incidence
    /// primitives (tags, sharpness).
    pub(crate) fn notify_modified(&mut self, changed: &[ComponentKey]) {
        let hood = self.neighborhood(changed);
        self.finish_change(hood);
    }

    /// Moves a vertex. Caches of its neighborhood are invalidated and sector
    /// coefficients around it are recomputed.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is not in this level or the sector
    /// coefficients around it cannot be resolved.
    pub fn set_vertex_point(&mut self, vertex: VertexId, point: Point3) -> crate::Result<()> {
        self.vertex_mut(vertex)?.point = point;
        self.notify_modified(&[ComponentKey::Vertex(vertex)]);
        self.resolve_sector_coefficients()?;
        Ok(())
    }

    /// Drops every cached subdivision and limit point on the level.
    pub fn clear_cached_points(&mut self) {
        for vd in self.vertices.values_mut() {
            vd.subdivision_point.invalidate();
            vd.limit_point.invalidate();
        }
        for ed in self.edges.values_mut() {
            ed.subdivision_point.invalidate();
        }
        for fd in self.faces.values_mut() {
            fd.subdivision_point.invalidate();
        }
    }
}
