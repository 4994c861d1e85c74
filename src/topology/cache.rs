use std::sync::OnceLock;

use crate::math::Point3;

/// A lazily computed point attached to a component.
///
/// The value is filled through a shared reference the first time it is
/// requested and is only ever cleared by the level's modified notification,
/// which requires exclusive access. Reading never invalidates.
#[derive(Debug, Clone, Default)]
pub struct PointCache {
    cell: OnceLock<Point3>,
}

impl PointCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached point, if any.
    #[must_use]
    pub fn get(&self) -> Option<Point3> {
        self.cell.get().copied()
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Returns the cached point, computing and storing it on a miss.
    ///
    /// # Errors
    ///
    /// Propagates the error of `compute`; nothing is cached in that case.
    pub fn get_or_try_init<E>(&self, compute: impl FnOnce() -> Result<Point3, E>) -> Result<Point3, E> {
        if let Some(p) = self.cell.get() {
            return Ok(*p);
        }
        let p = compute()?;
        // A racing reader may have stored the same value first.
        let _ = self.cell.set(p);
        Ok(self.cell.get().copied().unwrap_or(p))
    }

    /// Clears the cached point. Returns `true` if a value was present.
    pub fn invalidate(&mut self) -> bool {
        self.cell.take().is_some()
    }
}

/// Coefficient stored at one end of an edge.
///
/// Only smooth-family edges ending at a tagged vertex carry a value; ends at
/// smooth vertices are ignored, which the stencils treat as zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SectorCoefficient {
    /// The end touches a smooth vertex, or the edge is a crease.
    #[default]
    Ignored,
    /// Not yet computed; resolved by the sector fix-up pass.
    Unset,
    /// Weight of the tagged vertex in the edge's endpoint combination, in [0, 1).
    Value(f64),
}

impl SectorCoefficient {
    /// Numeric weight, 0 for ignored ends and `None` while unset.
    #[must_use]
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Ignored => Some(0.0),
            Self::Unset => None,
            Self::Value(w) => Some(w),
        }
    }

    #[must_use]
    pub fn is_unset(self) -> bool {
        self == Self::Unset
    }

    /// Returns `true` for ignored ends and for values in [0, 1).
    #[must_use]
    pub fn is_in_range(self) -> bool {
        match self {
            Self::Ignored => true,
            Self::Unset => false,
            Self::Value(w) => (0.0..1.0).contains(&w),
        }
    }
}
