use crate::diagnostics;
use crate::error::{Result, SubdError, SubdivisionError};
use crate::subd::Subd;
use crate::topology::{ComponentKey, ComponentStatus, EdgeTag, SubdLevel, VertexTag};

use super::refine::{projected_face_count, refine};

/// Adds global subdivision levels on top of the highest existing level.
pub struct Subdivide {
    count: usize,
}

impl Subdivide {
    /// Creates a new `Subdivide` operation adding `count` levels.
    #[must_use]
    pub fn new(count: usize) -> Self {
        Self { count }
    }

    /// Executes the operation and activates the new top level.
    ///
    /// Returns the index of the new top level. The surface is left unchanged
    /// when a precondition fails. When a refinement step fails, every level
    /// this call added is dropped again and the faces of the level it
    /// started from are flagged damaged.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error for a zero count or unset tags,
    /// [`SubdivisionError::EmptyLevel`] for a source without faces,
    /// [`SubdivisionError::MaxLevelExceeded`] or
    /// [`SubdivisionError::MeshTooLarge`] when the configured limits would be
    /// exceeded, and any error of the refinement itself.
    pub fn execute(&self, subd: &mut Subd) -> Result<usize> {
        if self.count == 0 {
            return Err(diagnostics::invalid_input("subdivision count must be at least 1").into());
        }
        let top = subd.level_count() - 1;
        let requested = top.saturating_add(self.count);
        if requested > subd.config().max_level {
            return Err(SubdivisionError::MaxLevelExceeded {
                requested,
                max: subd.config().max_level,
            }
            .into());
        }

        let source = subd.top_level();
        if source.face_count() == 0 {
            return Err(SubdivisionError::EmptyLevel(top).into());
        }
        if let Some((_, v)) = source.vertices_with_tag(VertexTag::Unset).next() {
            return Err(diagnostics::invalid_input(format!("vertex {} has an unset tag", v.id())).into());
        }
        if let Some((_, e)) = source.edges_with_tag(EdgeTag::Unset).next() {
            return Err(diagnostics::invalid_input(format!("edge {} has an unset tag", e.id())).into());
        }

        let growth = 4_usize.saturating_pow(u32::try_from(self.count - 1).unwrap_or(u32::MAX));
        let projected = projected_face_count(source).saturating_mul(growth);
        if projected > subd.config().max_face_count {
            return Err(SubdivisionError::MeshTooLarge {
                current: source.face_count(),
                projected,
                max: subd.config().max_face_count,
            }
            .into());
        }

        for _ in 0..self.count {
            match grow(subd.top_level()) {
                Ok(child) => subd.push_level(child),
                Err(err) => return Err(abandon(subd, top, err)),
            }
        }

        let top = subd.level_count() - 1;
        subd.set_active_level(top)?;
        tracing::debug!(levels = subd.level_count(), active = top, "subdivision finished");
        Ok(top)
    }
}

/// Refines `parent` and checks that the child is strictly larger.
fn grow(parent: &SubdLevel) -> Result<SubdLevel> {
    let child = refine(parent)?;
    if child.vertex_count() <= parent.vertex_count()
        || child.edge_count() <= parent.edge_count()
        || child.face_count() <= parent.face_count()
    {
        let below = usize::from(parent.index());
        return Err(SubdivisionError::NotMonotonic { level: below + 1, below }.into());
    }
    Ok(child)
}

/// Drops every level added since `source` and flags the faces of `source`
/// damaged.
fn abandon(subd: &mut Subd, source: usize, err: SubdError) -> SubdError {
    let dropped = subd.level_count() - 1 - source;
    subd.clear_higher_levels(source);
    if let Some(level) = subd.level_mut(source) {
        for f in level.face_keys_by_id() {
            let _ = level.insert_status(ComponentKey::Face(f), ComponentStatus::DAMAGED);
        }
    }
    tracing::error!(level = source, dropped, error = %err, "subdivision failed");
    err
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::error::TopologyError;
    use crate::subd::SubdConfig;
    use crate::topology::{ComponentKind, SubdivisionScheme};

    fn quad_subd(config: SubdConfig) -> Subd {
        let mut subd = Subd::with_config(SubdivisionScheme::CatmullClark, config);
        let level = subd.active_level_mut();
        let v: Vec<_> = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]
            .iter()
            .map(|&(x, y)| level.add_vertex(Point3::new(x, y, 0.0), VertexTag::Unset).unwrap())
            .collect();
        level.add_face_from_vertices(&v).unwrap();
        level.derive_all_tags();
        level.resolve_sector_coefficients().unwrap();
        subd
    }

    #[test]
    fn two_levels_activate_top() {
        let mut subd = quad_subd(SubdConfig::default());
        assert_eq!(Subdivide::new(2).execute(&mut subd).unwrap(), 2);
        assert_eq!(subd.level_count(), 3);
        assert_eq!(subd.active_level_index(), 2);
        assert_eq!(subd.face_count(), 16);
        assert_eq!(subd.level(1).unwrap().face_count(), 4);
    }

    #[test]
    fn limits_are_checked_before_mutation() {
        let mut subd = quad_subd(SubdConfig::default().with_max_level(1));
        let err = Subdivide::new(2).execute(&mut subd).unwrap_err();
        assert!(matches!(
            err,
            crate::SubdError::Subdivision(SubdivisionError::MaxLevelExceeded { requested: 2, max: 1 })
        ));
        assert_eq!(subd.level_count(), 1);

        let mut subd = quad_subd(SubdConfig::default().with_max_face_count(10));
        let err = Subdivide::new(2).execute(&mut subd).unwrap_err();
        assert!(matches!(
            err,
            crate::SubdError::Subdivision(SubdivisionError::MeshTooLarge { projected: 16, .. })
        ));
        assert_eq!(subd.level_count(), 1);
    }

    #[test]
    fn empty_source_and_zero_count_fail() {
        let mut subd = Subd::default();
        assert!(matches!(
            Subdivide::new(1).execute(&mut subd).unwrap_err(),
            crate::SubdError::Subdivision(SubdivisionError::EmptyLevel(0))
        ));
        let mut subd = quad_subd(SubdConfig::default());
        diagnostics::reset_invalid_input_count();
        assert!(Subdivide::new(0).execute(&mut subd).is_err());
        assert_eq!(diagnostics::invalid_input_count(), 1);
    }

    #[test]
    fn unset_tags_are_rejected() {
        let mut subd = Subd::new(SubdivisionScheme::LoopWarren);
        let level = subd.active_level_mut();
        let v: Vec<_> = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]
            .iter()
            .map(|&(x, y)| level.add_vertex(Point3::new(x, y, 0.0), VertexTag::Unset).unwrap())
            .collect();
        level.add_face_from_vertices(&v).unwrap();
        assert!(Subdivide::new(1).execute(&mut subd).is_err());
        assert_eq!(subd.level_count(), 1);
    }

    #[test]
    fn failed_step_drops_every_level_of_the_call() {
        let mut subd = quad_subd(SubdConfig::default());
        // Room for the nine vertices of level 1 but not the 25 of level 2.
        subd.active_level_mut()
            .id_allocator_mut()
            .reserve(ComponentKind::Vertex, u32::MAX - 20);

        let err = Subdivide::new(2).execute(&mut subd).unwrap_err();
        assert!(matches!(err, crate::SubdError::Topology(TopologyError::IdSpaceExhausted(_))));
        assert_eq!(subd.level_count(), 1);
        assert_eq!(subd.active_level_index(), 0);
        let level = subd.active_level();
        assert_eq!(level.face_count(), 1);
        assert!(level.faces().all(|(_, f)| f.status().contains(ComponentStatus::DAMAGED)));
    }

    #[test]
    fn failure_above_existing_levels_keeps_them() {
        let mut subd = quad_subd(SubdConfig::default());
        Subdivide::new(1).execute(&mut subd).unwrap();
        subd.active_level_mut()
            .id_allocator_mut()
            .reserve(ComponentKind::Face, u32::MAX - 4);
        subd.set_active_level(0).unwrap();

        assert!(Subdivide::new(1).execute(&mut subd).is_err());
        assert_eq!(subd.level_count(), 2);
        assert_eq!(subd.active_level_index(), 0);
        let base = subd.level(0).unwrap();
        assert!(base.faces().all(|(_, f)| !f.status().contains(ComponentStatus::DAMAGED)));
        let top = subd.level(1).unwrap();
        assert!(top.faces().all(|(_, f)| f.status().contains(ComponentStatus::DAMAGED)));
    }

    #[test]
    fn subdividing_from_a_lower_active_level_extends_the_top() {
        let mut subd = quad_subd(SubdConfig::default());
        Subdivide::new(1).execute(&mut subd).unwrap();
        subd.set_active_level(0).unwrap();
        assert_eq!(Subdivide::new(1).execute(&mut subd).unwrap(), 2);
        assert_eq!(subd.face_count(), 16);
    }
}
