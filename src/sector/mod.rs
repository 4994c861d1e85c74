//! Sector calculus.
//!
//! A sector is the fan of faces at a vertex between two crease edges. The
//! smooth edges inside a sector at a crease, corner or dart vertex use a
//! coefficient at that end that depends on the sector's size and shape.

mod sector_type;
mod walker;
pub mod weight;

pub use sector_type::SectorType;
pub use walker::{Sector, SectorWalker};
pub use weight::{
    coefficient_from_theta, corner_sector_coefficient, crease_sector_coefficient, dart_sector_coefficient,
    edge_count_from_face_count, face_count_from_edge_count, MAXIMUM_CORNER_ANGLE, MAXIMUM_SECTOR_FACE_COUNT,
    MINIMUM_CORNER_ANGLE,
};

use crate::topology::{EdgeId, SectorCoefficient, SubdLevel, VertexTag};

impl SubdLevel {
    /// Computes the coefficient for end `end` of `edge` from the current
    /// topology.
    ///
    /// Returns `Ok(None)` when the value cannot be determined yet: a tag is
    /// unset or the sector is still incomplete.
    ///
    /// # Errors
    ///
    /// Returns an error if a component is missing or the sector is not a
    /// valid (tag, face count) combination.
    pub fn compute_sector_coefficient(&self, edge: EdgeId, end: usize) -> crate::Result<Option<SectorCoefficient>> {
        let ed = self.edge(edge)?;
        if ed.tag().is_crease() {
            return Ok(Some(SectorCoefficient::Ignored));
        }
        if !ed.tag().is_smooth() {
            return Ok(None);
        }
        let v = ed.vertex(end);
        let tag = self.vertex(v)?.tag();
        match tag {
            VertexTag::Unset => return Ok(None),
            VertexTag::Smooth => return Ok(Some(SectorCoefficient::Ignored)),
            VertexTag::Crease | VertexTag::Corner | VertexTag::Dart => {}
        }
        let Some(face) = ed.faces().first().map(|of| of.face) else {
            return Ok(None);
        };
        let sector = SectorWalker::new(self, v).walk(face)?;
        if sector.incomplete {
            return Ok(None);
        }
        let st = if tag == VertexTag::Corner {
            SectorType::corner(self.scheme(), sector.face_count(), sector.corner_angle)?
        } else {
            SectorType::new(self.scheme(), tag, sector.face_count())?
        };
        Ok(Some(st.sector_coefficient()))
    }

    /// Sector types of every sector at a vertex.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is missing or a sector is invalid for
    /// the vertex tag.
    pub fn vertex_sector_types(&self, vertex: crate::topology::VertexId) -> crate::Result<Vec<SectorType>> {
        let tag = self.vertex(vertex)?.tag();
        SectorWalker::new(self, vertex)
            .sectors()?
            .into_iter()
            .map(|s| {
                let st = if tag == VertexTag::Corner {
                    SectorType::corner(self.scheme(), s.face_count(), s.corner_angle)?
                } else {
                    SectorType::new(self.scheme(), tag, s.face_count())?
                };
                Ok(st)
            })
            .collect()
    }
}
