use std::collections::HashSet;

use crate::diagnostics;
use crate::error::Result;
use crate::subd::Subd;
use crate::topology::{ComponentKey, EdgeId, EdgeTag, SubdLevel, VertexId, VertexTag};

use super::{finish, require_edge, require_vertex};

/// Outcome of a tag edit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagChangeSummary {
    /// Tags changed, including those of neighbors re-derived afterwards.
    pub changed: usize,
    /// Smallest face count over the sectors of the retagged vertices.
    pub min_sector_face_count: Option<usize>,
    /// Largest face count over the sectors of the retagged vertices.
    pub max_sector_face_count: Option<usize>,
}

impl TagChangeSummary {
    fn with_sectors(changed: usize, level: &SubdLevel, vertices: &[VertexId]) -> Result<Self> {
        let mut summary = Self {
            changed,
            ..Self::default()
        };
        for &v in vertices {
            for sector in level.vertex_sector_types(v)? {
                let n = sector.face_count();
                summary.min_sector_face_count = Some(summary.min_sector_face_count.map_or(n, |m| m.min(n)));
                summary.max_sector_face_count = Some(summary.max_sector_face_count.map_or(n, |m| m.max(n)));
            }
        }
        Ok(summary)
    }
}

/// Sets the tag of vertices of the active level.
///
/// Crease and corner tags turn smooth edges between two listed vertices into
/// creases. A smooth tag turns the interior creases at each vertex back into
/// smooth edges. Dart tags are only accepted where a single interior crease
/// already ends.
pub struct SetVertexTags {
    vertices: Vec<VertexId>,
    tag: VertexTag,
}

impl SetVertexTags {
    /// Creates a new `SetVertexTags` operation.
    #[must_use]
    pub fn new(vertices: Vec<VertexId>, tag: VertexTag) -> Self {
        Self { vertices, tag }
    }

    /// Executes the retagging.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error if a vertex is missing or the resulting
    /// crease count does not fit the tag: a crease needs exactly two creases,
    /// a corner at least two (one on the boundary), a dart exactly one
    /// interior crease, and a smooth vertex must not be on the boundary.
    pub fn execute(&self, subd: &mut Subd) -> Result<TagChangeSummary> {
        let level = subd.active_level();
        let targets: HashSet<VertexId> = self.vertices.iter().copied().collect();
        let mut converted: Vec<(EdgeId, EdgeTag)> = Vec::new();
        for &v in &self.vertices {
            let vd = require_vertex(level, v)?;
            let boundary = level.is_boundary_vertex(v);
            let mut creases = 0;
            for oe in vd.edges() {
                let ed = level.edge(oe.edge)?;
                if ed.tag().is_crease() {
                    if self.tag == VertexTag::Smooth && ed.face_count() == 2 {
                        push_unique(&mut converted, oe.edge, EdgeTag::Smooth);
                    } else {
                        creases += 1;
                    }
                } else if matches!(self.tag, VertexTag::Crease | VertexTag::Corner)
                    && ed.other_vertex(v).is_some_and(|o| targets.contains(&o))
                {
                    creases += 1;
                    push_unique(&mut converted, oe.edge, EdgeTag::Crease);
                }
            }
            let fits = match self.tag {
                VertexTag::Unset => false,
                VertexTag::Smooth => !boundary,
                VertexTag::Crease => creases == 2,
                VertexTag::Corner => vd.edge_count() == 0 || creases >= 2 || (creases == 1 && boundary),
                VertexTag::Dart => creases == 1 && !boundary,
            };
            if !fits {
                return Err(diagnostics::invalid_input(format!(
                    "vertex {} cannot be tagged {} with {creases} crease edges",
                    vd.id(),
                    self.tag.name()
                ))
                .into());
            }
        }

        let level = subd.active_level_mut();
        let mut changed: Vec<ComponentKey> = Vec::new();
        let mut touched: Vec<VertexId> = self.vertices.clone();
        for &(e, tag) in &converted {
            let ed = level.edge_mut(e)?;
            ed.tag = tag;
            ed.sharpness = 0.0;
            touched.extend(ed.vertices());
            changed.push(ComponentKey::Edge(e));
        }
        for &v in &self.vertices {
            let vd = level.vertex_mut(v)?;
            if vd.tag != self.tag {
                vd.tag = self.tag;
                changed.push(ComponentKey::Vertex(v));
            }
        }
        if changed.is_empty() {
            return TagChangeSummary::with_sectors(0, level, &self.vertices);
        }
        level.notify_modified(&changed);
        let retagged = finish(subd, &touched, &HashSet::new())?;
        TagChangeSummary::with_sectors(changed.len() + retagged, subd.active_level(), &self.vertices)
    }
}

fn push_unique(list: &mut Vec<(EdgeId, EdgeTag)>, edge: EdgeId, tag: EdgeTag) {
    if !list.iter().any(|&(e, _)| e == edge) {
        list.push((edge, tag));
    }
}

/// Sets the tag of edges of the active level.
pub struct SetEdgeTags {
    edges: Vec<EdgeId>,
    tag: EdgeTag,
    sharpness: f64,
}

impl SetEdgeTags {
    /// Creates a new `SetEdgeTags` operation for the smooth or crease tag.
    #[must_use]
    pub fn new(edges: Vec<EdgeId>, tag: EdgeTag) -> Self {
        Self {
            edges,
            tag,
            sharpness: 0.0,
        }
    }

    /// Creates a new `SetEdgeTags` operation making the edges semi-sharp.
    #[must_use]
    pub fn sharp(edges: Vec<EdgeId>, sharpness: f64) -> Self {
        Self {
            edges,
            tag: EdgeTag::Sharp,
            sharpness,
        }
    }

    /// Executes the retagging. Vertex tags at both ends are re-derived.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error if an edge is missing, the tag is
    /// unset or `SmoothX`, the sharpness is not positive and finite, or a
    /// smooth or sharp tag is requested for an edge without exactly two faces.
    pub fn execute(&self, subd: &mut Subd) -> Result<TagChangeSummary> {
        if matches!(self.tag, EdgeTag::Unset | EdgeTag::SmoothX) {
            return Err(diagnostics::invalid_input(format!("edge tag {} cannot be set", self.tag.name())).into());
        }
        if self.tag == EdgeTag::Sharp && !(self.sharpness.is_finite() && self.sharpness > 0.0) {
            return Err(diagnostics::invalid_input(format!("sharpness {} is not positive", self.sharpness)).into());
        }
        let level = subd.active_level();
        let mut ends: Vec<VertexId> = Vec::new();
        for &e in &self.edges {
            let ed = require_edge(level, e)?;
            if self.tag.is_smooth() && ed.face_count() != 2 {
                return Err(diagnostics::invalid_input(format!(
                    "edge {} has {} faces and must stay a crease",
                    ed.id(),
                    ed.face_count()
                ))
                .into());
            }
            for v in ed.vertices() {
                if !ends.contains(&v) {
                    ends.push(v);
                }
            }
        }

        let level = subd.active_level_mut();
        let mut changed: Vec<ComponentKey> = Vec::new();
        for &e in &self.edges {
            let ed = level.edge_mut(e)?;
            if ed.tag != self.tag || ed.sharpness.to_bits() != self.sharpness.to_bits() {
                ed.tag = self.tag;
                ed.sharpness = self.sharpness;
                changed.push(ComponentKey::Edge(e));
            }
        }
        if changed.is_empty() {
            return TagChangeSummary::with_sectors(0, level, &ends);
        }
        level.notify_modified(&changed);
        let retagged = finish(subd, &ends, &HashSet::new())?;
        TagChangeSummary::with_sectors(changed.len() + retagged, subd.active_level(), &ends)
    }
}
