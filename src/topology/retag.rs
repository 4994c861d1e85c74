//! Tag derivation.
//!
//! Edge tags follow from face counts and vertex tags follow from the number
//! of incident crease edges. Editing operations call [`SubdLevel::retag_around`]
//! on the vertices they touched; level construction derives every tag at once.

use std::collections::HashSet;

use super::edge::EdgeData;
use super::id::{ComponentKey, EdgeId, VertexId};
use super::tag::{EdgeTag, VertexTag};
use super::SubdLevel;

impl SubdLevel {
    /// Derives every edge and vertex tag of the level.
    ///
    /// Explicit crease and sharp edges with two faces are kept, as are
    /// explicit corners with at least two crease edges.
    pub fn derive_all_tags(&mut self) {
        let vertices: Vec<VertexId> = self.vertices.keys().collect();
        self.retag_around(&vertices, &HashSet::new());
    }

    /// Re-derives the tags of every edge at `vertices` and of the vertices
    /// those edges reach.
    ///
    /// Crease edges listed in `gained_face` received their second face during
    /// the current edit and become smooth. Returns the number of components
    /// whose tag changed. All changes are reported in one notification.
    pub(crate) fn retag_around(&mut self, vertices: &[VertexId], gained_face: &HashSet<EdgeId>) -> usize {
        let mut edges: Vec<EdgeId> = Vec::new();
        let mut seen: HashSet<EdgeId> = HashSet::new();
        for &v in vertices {
            if let Some(vd) = self.vertices.get(v) {
                for oe in &vd.edges {
                    if seen.insert(oe.edge) {
                        edges.push(oe.edge);
                    }
                }
            }
        }

        let mut changed: Vec<ComponentKey> = Vec::new();
        let mut reach: Vec<VertexId> = vertices.to_vec();
        for &e in &edges {
            let Some(ed) = self.edges.get(e) else {
                continue;
            };
            let (tag, sharpness) = derived_edge_tag(ed, gained_face.contains(&e));
            if tag != ed.tag || sharpness.to_bits() != ed.sharpness.to_bits() {
                reach.extend(ed.vertices);
                if let Some(ed) = self.edges.get_mut(e) {
                    ed.tag = tag;
                    ed.sharpness = sharpness;
                }
                changed.push(ComponentKey::Edge(e));
            }
        }

        reach.sort_unstable();
        reach.dedup();
        for &v in &reach {
            let Some(tag) = self.derived_vertex_tag(v) else {
                continue;
            };
            if let Some(vd) = self.vertices.get_mut(v) {
                if vd.tag != tag {
                    vd.tag = tag;
                    changed.push(ComponentKey::Vertex(v));
                }
            }
        }

        // Smooth edges between two tagged vertices are SmoothX and back.
        for &v in &reach {
            let Some(vd) = self.vertices.get(v) else {
                continue;
            };
            let at_v: Vec<EdgeId> = vd.edges.iter().map(|oe| oe.edge).collect();
            for e in at_v {
                let Some(ed) = self.edges.get(e) else {
                    continue;
                };
                if !matches!(ed.tag, EdgeTag::Smooth | EdgeTag::SmoothX) {
                    continue;
                }
                let both_tagged = ed
                    .vertices
                    .iter()
                    .all(|&x| self.vertices.get(x).is_some_and(|d| d.tag.is_tagged()));
                let tag = if both_tagged { EdgeTag::SmoothX } else { EdgeTag::Smooth };
                if tag != ed.tag {
                    if let Some(ed) = self.edges.get_mut(e) {
                        ed.tag = tag;
                    }
                    changed.push(ComponentKey::Edge(e));
                }
            }
        }

        let count = changed.len();
        if count > 0 {
            self.notify_modified(&changed);
        }
        count
    }

    /// The tag a vertex takes from its current crease edges.
    pub(crate) fn derived_vertex_tag(&self, v: VertexId) -> Option<VertexTag> {
        let vd = self.vertices.get(v)?;
        if vd.edges.is_empty() {
            return Some(VertexTag::Corner);
        }
        let creases = self.crease_edge_count(v);
        Some(match creases {
            0 => VertexTag::Smooth,
            1 if vd.edges.len() == vd.faces.len() => VertexTag::Dart,
            1 => VertexTag::Corner,
            2 if vd.tag == VertexTag::Corner => VertexTag::Corner,
            2 => VertexTag::Crease,
            _ => VertexTag::Corner,
        })
    }
}

/// The tag an edge takes from its face count. Returns the tag and sharpness.
fn derived_edge_tag(ed: &EdgeData, gained_face: bool) -> (EdgeTag, f64) {
    if ed.faces.len() != 2 {
        return (EdgeTag::Crease, 0.0);
    }
    match ed.tag {
        EdgeTag::Crease if !gained_face => (EdgeTag::Crease, 0.0),
        EdgeTag::Sharp if ed.sharpness > 0.0 => (EdgeTag::Sharp, ed.sharpness),
        EdgeTag::SmoothX => (EdgeTag::SmoothX, 0.0),
        _ => (EdgeTag::Smooth, 0.0),
    }
}
