use crate::error::SubdivisionError;
use crate::topology::{ComponentKey, ComponentStatus, EdgeId, SectorCoefficient, SubdLevel, VertexTag};

/// Maximum number of passes of the sector coefficient fix-up.
pub const SECTOR_FIXUP_ITERATION_CAP: usize = 8;

impl SubdLevel {
    /// Resolves every unset sector coefficient whose edge and vertex tags are
    /// known.
    ///
    /// Ends whose sector is still incomplete are retried on the next pass.
    /// Coefficients are derived data, so resolving them does not count as a
    /// structural change.
    ///
    /// # Errors
    ///
    /// Returns [`SubdivisionError::FixupDiverged`] if ends remain unresolved
    /// after [`SECTOR_FIXUP_ITERATION_CAP`] passes; those edges are flagged
    /// [`ComponentStatus::DAMAGED`]. Invalid sectors propagate their error.
    pub fn resolve_sector_coefficients(&mut self) -> crate::Result<()> {
        let mut pending = self.pending_sector_coefficients();
        let mut passes = 0;
        while !pending.is_empty() {
            if passes == SECTOR_FIXUP_ITERATION_CAP {
                return Err(self.fixup_diverged(&pending));
            }
            passes += 1;
            let mut retry = Vec::new();
            for (edge, end) in pending {
                match self.compute_sector_coefficient(edge, end)? {
                    Some(c) => self.edge_mut(edge)?.sector_coefficients[end] = c,
                    None => retry.push((edge, end)),
                }
            }
            pending = retry;
        }
        if passes > 1 {
            tracing::debug!(level = self.index(), passes, "sector coefficients resolved");
        }
        Ok(())
    }

    /// Unset edge ends whose edge and vertex tags are both set.
    fn pending_sector_coefficients(&self) -> Vec<(EdgeId, usize)> {
        let mut pending = Vec::new();
        for (e, ed) in self.edges() {
            if !ed.tag().is_smooth() && !ed.tag().is_crease() {
                continue;
            }
            for end in 0..2 {
                if ed.sector_coefficients()[end] != SectorCoefficient::Unset {
                    continue;
                }
                if self.vertex(ed.vertex(end)).is_ok_and(|v| v.tag() != VertexTag::Unset) {
                    pending.push((e, end));
                }
            }
        }
        pending
    }

    fn fixup_diverged(&mut self, pending: &[(EdgeId, usize)]) -> crate::SubdError {
        let mut ids: Vec<u32> = Vec::with_capacity(pending.len());
        for &(edge, _) in pending {
            if let Ok(ed) = self.edge(edge) {
                ids.push(ed.id());
            }
            let _ = self.insert_status(ComponentKey::Edge(edge), ComponentStatus::DAMAGED);
        }
        ids.dedup();
        tracing::error!(
            level = self.index(),
            unresolved = pending.len(),
            edges = ?ids,
            "sector coefficient fix-up diverged"
        );
        SubdivisionError::FixupDiverged {
            iterations: SECTOR_FIXUP_ITERATION_CAP,
            unresolved: pending.len(),
        }
        .into()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::topology::{EdgeTag, SubdivisionScheme};

    fn quad(level: &mut SubdLevel) -> Vec<crate::topology::VertexId> {
        let v: Vec<_> = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]
            .iter()
            .map(|&(x, y)| level.add_vertex(Point3::new(x, y, 0.0), VertexTag::Unset).unwrap())
            .collect();
        level.add_face_from_vertices(&v).unwrap();
        v
    }

    #[test]
    fn resolves_every_end() {
        let mut level = SubdLevel::new(0, SubdivisionScheme::CatmullClark);
        quad(&mut level);
        level.derive_all_tags();
        let revision = level.revision();
        level.resolve_sector_coefficients().unwrap();
        assert_eq!(level.revision(), revision);
        for (_, ed) in level.edges() {
            assert_eq!(ed.sector_coefficients(), [SectorCoefficient::Ignored; 2]);
        }
    }

    #[test]
    fn unset_tags_are_left_alone() {
        let mut level = SubdLevel::new(0, SubdivisionScheme::CatmullClark);
        quad(&mut level);
        level.resolve_sector_coefficients().unwrap();
        for (_, ed) in level.edges() {
            assert_eq!(ed.sector_coefficients(), [SectorCoefficient::Unset; 2]);
        }
    }

    #[test]
    fn incomplete_sector_diverges_and_damages() {
        let mut level = SubdLevel::new(0, SubdivisionScheme::CatmullClark);
        let v = quad(&mut level);
        level.derive_all_tags();
        // A smooth edge with one face can never complete its sector.
        let e = level.find_edge(v[0], v[1]).unwrap();
        level.edge_mut(e).unwrap().tag = EdgeTag::Smooth;
        level.edge_mut(e).unwrap().sector_coefficients = [SectorCoefficient::Unset; 2];
        let err = level.resolve_sector_coefficients().unwrap_err();
        assert!(matches!(
            err,
            crate::SubdError::Subdivision(SubdivisionError::FixupDiverged { iterations: 8, .. })
        ));
        assert!(level.edge(e).unwrap().status().contains(ComponentStatus::DAMAGED));
    }
}
