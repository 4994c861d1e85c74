use crate::math::Aabb;

use super::status::ComponentStatus;
use super::tag::{EdgeTag, VertexTag};
use super::SubdLevel;

/// Summary values derived from every component of a level.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LevelAggregates {
    /// Bounding box of the control points, `None` for a level without vertices.
    pub bounding_box: Option<Aabb>,
    /// Union of every component's status bits.
    pub status: ComponentStatus,
    /// Smallest and largest vertex edge count.
    pub vertex_edge_count_range: Option<(usize, usize)>,
    /// Smallest and largest vertex face count.
    pub vertex_face_count_range: Option<(usize, usize)>,
    /// Smallest and largest face edge count.
    pub face_edge_count_range: Option<(usize, usize)>,
    /// Vertex counts indexed by tag: unset, smooth, crease, corner, dart.
    pub vertex_tag_counts: [usize; 5],
    /// Edge counts indexed by tag: unset, smooth, crease, sharp, smooth-x.
    pub edge_tag_counts: [usize; 5],
}

impl LevelAggregates {
    #[must_use]
    pub fn vertex_tag_count(&self, tag: VertexTag) -> usize {
        self.vertex_tag_counts[usize::from(tag.to_u8())]
    }

    #[must_use]
    pub fn edge_tag_count(&self, tag: EdgeTag) -> usize {
        self.edge_tag_counts[usize::from(tag.to_u8())]
    }
}

fn widen(range: &mut Option<(usize, usize)>, value: usize) {
    *range = Some(match *range {
        Some((lo, hi)) => (lo.min(value), hi.max(value)),
        None => (value, value),
    });
}

impl SubdLevel {
    /// Computes the level aggregates.
    #[must_use]
    pub fn aggregates(&self) -> LevelAggregates {
        let mut agg = LevelAggregates {
            bounding_box: self.bounding_box(),
            ..LevelAggregates::default()
        };
        for (_, v) in self.vertices() {
            agg.status |= v.status;
            widen(&mut agg.vertex_edge_count_range, v.edges.len());
            widen(&mut agg.vertex_face_count_range, v.faces.len());
            agg.vertex_tag_counts[usize::from(v.tag.to_u8())] += 1;
        }
        for (_, e) in self.edges() {
            agg.status |= e.status;
            agg.edge_tag_counts[usize::from(e.tag.to_u8())] += 1;
        }
        for (_, f) in self.faces() {
            agg.status |= f.status;
            widen(&mut agg.face_edge_count_range, f.edges.len());
        }
        agg
    }

    /// Bounding box of the control points.
    #[must_use]
    pub fn bounding_box(&self) -> Option<Aabb> {
        let mut iter = self.vertices();
        let (_, first) = iter.next()?;
        let mut bbox = Aabb::from_point(first.point);
        for (_, v) in iter {
            bbox.grow(&v.point);
        }
        Some(bbox)
    }
}
