//! The level manager.
//!
//! A [`Subd`] holds an ordered stack of [`SubdLevel`]s, level 0 being the
//! control mesh and every higher level the global subdivision of the one
//! below. Exactly one level is active; reads and edits go through it.

use crate::diagnostics;
use crate::error::Result;
use crate::math::Aabb;
use crate::topology::{ComponentKey, ComponentRef, IdAllocator, SubdLevel, SubdivisionScheme};

/// Hard ceiling for [`SubdConfig::max_level`].
pub const MAXIMUM_SUBDIVISION_LEVEL: usize = 32;

/// Limits and tolerances of a [`Subd`].
#[derive(Debug, Clone, PartialEq)]
pub struct SubdConfig {
    /// Highest level index subdivision may create.
    pub max_level: usize,
    /// Largest face count a subdivided level may have.
    pub max_face_count: usize,
    /// Relative tolerance for the collinearity test of edge merging.
    pub collinear_tolerance: f64,
}

impl Default for SubdConfig {
    fn default() -> Self {
        Self {
            max_level: 8,
            max_face_count: 16_777_216,
            collinear_tolerance: 1e-8,
        }
    }
}

impl SubdConfig {
    /// Sets the maximum level, clamped to [`MAXIMUM_SUBDIVISION_LEVEL`].
    #[must_use]
    pub fn with_max_level(mut self, max_level: usize) -> Self {
        self.max_level = max_level.min(MAXIMUM_SUBDIVISION_LEVEL);
        self
    }

    #[must_use]
    pub fn with_max_face_count(mut self, max_face_count: usize) -> Self {
        self.max_face_count = max_face_count;
        self
    }

    #[must_use]
    pub fn with_collinear_tolerance(mut self, tolerance: f64) -> Self {
        self.collinear_tolerance = tolerance;
        self
    }
}

/// A subdivision surface: control mesh plus cached refinement levels.
#[derive(Debug, Clone)]
pub struct Subd {
    scheme: SubdivisionScheme,
    config: SubdConfig,
    levels: Vec<SubdLevel>,
    active: usize,
}

impl Default for Subd {
    fn default() -> Self {
        Self::new(SubdivisionScheme::default())
    }
}

impl Subd {
    /// Creates an empty surface with a single empty level 0.
    #[must_use]
    pub fn new(scheme: SubdivisionScheme) -> Self {
        Self::with_config(scheme, SubdConfig::default())
    }

    #[must_use]
    pub fn with_config(scheme: SubdivisionScheme, config: SubdConfig) -> Self {
        let config = SubdConfig {
            max_level: config.max_level.min(MAXIMUM_SUBDIVISION_LEVEL),
            ..config
        };
        Self {
            scheme,
            config,
            levels: vec![SubdLevel::new(0, scheme)],
            active: 0,
        }
    }

    /// Rebuilds a surface from archived levels.
    pub(crate) fn from_parts(scheme: SubdivisionScheme, levels: Vec<SubdLevel>, active: usize) -> Self {
        let mut subd = Self::new(scheme);
        if !levels.is_empty() {
            subd.active = active.min(levels.len() - 1);
            subd.levels = levels;
        }
        subd
    }

    #[must_use]
    pub fn scheme(&self) -> SubdivisionScheme {
        self.scheme
    }

    #[must_use]
    pub fn config(&self) -> &SubdConfig {
        &self.config
    }

    #[must_use]
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    #[must_use]
    pub fn active_level_index(&self) -> usize {
        self.active
    }

    /// The level all reads and edits refer to.
    #[must_use]
    pub fn active_level(&self) -> &SubdLevel {
        &self.levels[self.active]
    }

    /// Mutable access to the active level's arena primitives.
    ///
    /// Changes made here do not discard other levels; use the editing
    /// operations for that.
    pub fn active_level_mut(&mut self) -> &mut SubdLevel {
        &mut self.levels[self.active]
    }

    #[must_use]
    pub fn level(&self, index: usize) -> Option<&SubdLevel> {
        self.levels.get(index)
    }

    /// All levels from 0 upward.
    #[must_use]
    pub fn levels(&self) -> &[SubdLevel] {
        &self.levels
    }

    pub(crate) fn level_mut(&mut self, index: usize) -> Option<&mut SubdLevel> {
        self.levels.get_mut(index)
    }

    pub(crate) fn top_level(&self) -> &SubdLevel {
        &self.levels[self.levels.len() - 1]
    }

    pub(crate) fn top_level_mut(&mut self) -> &mut SubdLevel {
        let top = self.levels.len() - 1;
        &mut self.levels[top]
    }

    pub(crate) fn push_level(&mut self, level: SubdLevel) {
        self.levels.push(level);
    }

    /// Makes `index` the active level.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error if no such level exists.
    pub fn set_active_level(&mut self, index: usize) -> Result<()> {
        if index >= self.levels.len() {
            return Err(diagnostics::invalid_input(format!(
                "level {index} does not exist ({} levels)",
                self.levels.len()
            ))
            .into());
        }
        self.active = index;
        Ok(())
    }

    /// Discards every level above `index`. An active level above `index`
    /// retargets to `index`.
    pub fn clear_higher_levels(&mut self, index: usize) {
        if index + 1 >= self.levels.len() {
            return;
        }
        let dropped: Vec<SubdLevel> = self.levels.drain(index + 1..).collect();
        self.absorb_ids(&dropped);
        if self.active > index {
            self.active = index;
        }
        tracing::debug!(kept = self.levels.len(), dropped = dropped.len(), "cleared higher levels");
    }

    /// Discards every level below `index`; level `index` becomes level 0.
    /// An active level below `index` retargets to the new level 0.
    pub fn clear_lower_levels(&mut self, index: usize) {
        if index == 0 || index >= self.levels.len() {
            return;
        }
        let dropped: Vec<SubdLevel> = self.levels.drain(..index).collect();
        self.absorb_ids(&dropped);
        for (i, level) in self.levels.iter_mut().enumerate() {
            level.set_index(u16::try_from(i).unwrap_or(u16::MAX));
        }
        self.active = self.active.saturating_sub(index);
        tracing::debug!(kept = self.levels.len(), dropped = dropped.len(), "cleared lower levels");
    }

    /// Removes every level and starts over with an empty level 0. Ids are
    /// issued from 1 again.
    pub fn clear(&mut self) {
        self.levels = vec![SubdLevel::new(0, self.scheme)];
        self.active = 0;
    }

    /// Called after an edit of the active level: levels derived from it are
    /// stale, and levels below no longer produce it.
    pub(crate) fn finish_edit(&mut self) {
        let active = self.active;
        self.clear_higher_levels(active);
        self.clear_lower_levels(active);
    }

    /// Folds the id high-water marks of discarded levels into the survivors.
    fn absorb_ids(&mut self, dropped: &[SubdLevel]) {
        let mut marks = IdAllocator::new();
        for level in dropped {
            marks.absorb(level.id_allocator());
        }
        for level in &mut self.levels {
            level.id_allocator_mut().absorb(&marks);
        }
    }

    /// Finds the level and arena key of a persistent component reference.
    #[must_use]
    pub fn resolve(&self, component: ComponentRef) -> Option<(usize, ComponentKey)> {
        self.levels
            .iter()
            .enumerate()
            .find_map(|(i, level)| level.resolve(component).map(|key| (i, key)))
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.active_level().vertex_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.active_level().edge_count()
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.active_level().face_count()
    }

    /// Bounding box of the active level's control points.
    #[must_use]
    pub fn bounding_box(&self) -> Option<Aabb> {
        self.active_level().bounding_box()
    }

    /// Returns `true` if the active level has no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active_level().is_empty()
    }
}
