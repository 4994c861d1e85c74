//! Consistency checking of subdivision levels.
//!
//! The validator checks referential integrity (every reference resolves and
//! is reciprocated), face cycles, the tag invariants tying edge tags to face
//! counts and vertex tags to crease counts, sector coefficients against the
//! sectors they belong to, ids and positions. Findings are grouped by
//! [`ViolationCategory`]; only the first few of each category are kept in
//! detail.
//!
//! Validation never fails. Repair mode coerces what it can to neutral values
//! so later passes do not trip over the same fields, but the report still
//! says the level was invalid.

mod checks;
mod repair;
mod report;

pub use report::{ValidationReport, Violation, ViolationCategory};

use crate::subd::Subd;
use crate::topology::SubdLevel;

/// Options for validation.
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// Number of violations kept in detail per category.
    pub max_violations_per_category: usize,
    /// Whether [`ValidateSubd::execute_mut`] repairs the levels it checks.
    pub repair: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            max_violations_per_category: 8,
            repair: false,
        }
    }
}

impl ValidationOptions {
    #[must_use]
    pub fn with_max_violations_per_category(mut self, max: usize) -> Self {
        self.max_violations_per_category = max;
        self
    }

    #[must_use]
    pub fn with_repair(mut self, repair: bool) -> Self {
        self.repair = repair;
        self
    }
}

/// Validates one level.
#[derive(Debug, Clone, Default)]
pub struct ValidateLevel {
    options: ValidationOptions,
}

impl ValidateLevel {
    /// Creates a new `ValidateLevel` operation.
    #[must_use]
    pub fn new(options: ValidationOptions) -> Self {
        Self { options }
    }

    /// Checks `level` without changing it. Components are visited in id
    /// order, so repeated runs produce identical reports.
    #[must_use]
    pub fn execute(&self, level: &SubdLevel) -> ValidationReport {
        let report = checks::check_level(level, self.options.max_violations_per_category).report;
        if !report.is_valid() {
            tracing::debug!(level = level.index(), violations = report.total(), "level failed validation");
        }
        report
    }

    /// Checks `level` and repairs what it can: non-finite positions move to
    /// the origin, out-of-range or stale sector coefficients are unset
    /// and recomputed, unset tags are derived from the topology, and every
    /// offending component is marked damaged.
    ///
    /// The returned report describes the level as found.
    pub fn repair(&self, level: &mut SubdLevel) -> ValidationReport {
        let findings = checks::check_level(level, self.options.max_violations_per_category);
        if findings.report.is_valid() {
            return findings.report;
        }
        let repaired = repair::apply(level, &findings);
        let mut report = findings.report;
        report.repaired = repaired;
        tracing::warn!(
            level = level.index(),
            violations = report.total(),
            repaired,
            "level repaired"
        );
        report
    }
}

/// Validates every level of a surface and the growth between them.
#[derive(Debug, Clone, Default)]
pub struct ValidateSubd {
    options: ValidationOptions,
}

impl ValidateSubd {
    /// Creates a new `ValidateSubd` operation.
    #[must_use]
    pub fn new(options: ValidationOptions) -> Self {
        Self { options }
    }

    /// Checks every level without changing the surface.
    #[must_use]
    pub fn execute(&self, subd: &Subd) -> ValidationReport {
        let per_level = ValidateLevel::new(self.options.clone());
        let mut report = ValidationReport::with_limit(self.options.max_violations_per_category);
        for level in subd.levels() {
            report.merge(per_level.execute(level));
        }
        self.check_levels(subd, &mut report);
        report
    }

    /// Checks every level, repairing each one when the options ask for it.
    pub fn execute_mut(&self, subd: &mut Subd) -> ValidationReport {
        if !self.options.repair {
            return self.execute(subd);
        }
        let per_level = ValidateLevel::new(self.options.clone());
        let mut report = ValidationReport::with_limit(self.options.max_violations_per_category);
        for i in 0..subd.level_count() {
            if let Some(level) = subd.level_mut(i) {
                report.merge(per_level.repair(level));
            }
        }
        self.check_levels(subd, &mut report);
        report
    }

    /// Level numbering and the strict growth of every level over the one
    /// below it.
    fn check_levels(&self, subd: &Subd, report: &mut ValidationReport) {
        let levels = subd.levels();
        for (i, level) in levels.iter().enumerate() {
            if usize::from(level.index()) != i {
                report.record(Violation {
                    category: ViolationCategory::LevelMismatch,
                    level: level.index(),
                    component: None,
                    message: format!("level stored at position {i}"),
                });
            }
        }
        for pair in levels.windows(2) {
            let (below, above) = (&pair[0], &pair[1]);
            if below.face_count() == 0 {
                continue;
            }
            let grows = above.vertex_count() > below.vertex_count()
                && above.edge_count() > below.edge_count()
                && above.face_count() > below.face_count();
            if !grows {
                report.record(Violation {
                    category: ViolationCategory::NonMonotonicLevel,
                    level: above.index(),
                    component: None,
                    message: format!(
                        "{} faces over {} faces on level {}",
                        above.face_count(),
                        below.face_count(),
                        below.index()
                    ),
                });
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::editing::fixtures::{grid_vertex, quad_grid};
    use crate::subdivision::Subdivide;
    use crate::topology::{ComponentStatus, SectorCoefficient, VertexTag};

    fn validate(level: &SubdLevel) -> ValidationReport {
        ValidateLevel::default().execute(level)
    }

    #[test]
    fn fresh_grid_is_valid_and_reports_repeat() {
        let subd = quad_grid(3);
        let first = validate(subd.active_level());
        assert!(first.is_valid(), "{first}");
        assert_eq!(first, validate(subd.active_level()));
    }

    #[test]
    fn non_finite_position_is_reported_then_repaired() {
        let mut subd = quad_grid(2);
        let c = grid_vertex(&subd, 2, 1, 1);
        subd.active_level_mut().vertex_mut(c).unwrap().point.x = f64::NAN;

        let report = validate(subd.active_level());
        assert_eq!(report.count(ViolationCategory::NonFinitePosition), 1);
        // Read-only validation leaves the level alone.
        assert!(subd.active_level().vertex(c).unwrap().point().x.is_nan());
        assert_eq!(report, validate(subd.active_level()));

        let repaired = ValidateLevel::default().repair(subd.active_level_mut());
        assert!(!repaired.is_valid());
        assert!(repaired.repaired >= 1);
        let vd = subd.active_level().vertex(c).unwrap();
        assert_eq!(vd.point(), crate::math::Point3::origin());
        assert!(vd.status().contains(ComponentStatus::DAMAGED));
        assert!(validate(subd.active_level()).is_valid());
    }

    #[test]
    fn per_category_limit() {
        let mut subd = quad_grid(2);
        for j in 0..=2 {
            for i in 0..=2 {
                let v = grid_vertex(&subd, 2, i, j);
                subd.active_level_mut().vertex_mut(v).unwrap().point.z = f64::INFINITY;
            }
        }
        let options = ValidationOptions::default().with_max_violations_per_category(2);
        let report = ValidateLevel::new(options).execute(subd.active_level());
        assert_eq!(report.count(ViolationCategory::NonFinitePosition), 9);
        assert_eq!(report.of(ViolationCategory::NonFinitePosition).count(), 2);
    }

    #[test]
    fn broken_incidence_is_reported() {
        let mut subd = quad_grid(2);
        let (a, b) = (grid_vertex(&subd, 2, 1, 0), grid_vertex(&subd, 2, 1, 1));
        let e = subd.active_level().find_edge(a, b).unwrap();
        subd.active_level_mut().edge_mut(e).unwrap().faces.clear();

        let report = validate(subd.active_level());
        // Both faces still use the edge, which no longer lists them.
        assert_eq!(report.count(ViolationCategory::NonReciprocalIncidence), 2);
        assert_eq!(report.count(ViolationCategory::EdgeTagFaceCount), 1);
        assert_eq!(report.count(ViolationCategory::DanglingReference), 0);
    }

    #[test]
    fn coefficient_out_of_range_is_recomputed() {
        let mut subd = quad_grid(2);
        let (a, b) = (grid_vertex(&subd, 2, 1, 0), grid_vertex(&subd, 2, 1, 1));
        let e = subd.active_level().find_edge(a, b).unwrap();
        let end = subd.active_level().edge(e).unwrap().end_of(a).unwrap();
        subd.active_level_mut().edge_mut(e).unwrap().sector_coefficients[end] = SectorCoefficient::Value(1.5);

        let report = ValidateLevel::default().repair(subd.active_level_mut());
        assert_eq!(report.count(ViolationCategory::SectorCoefficientRange), 1);
        let ed = subd.active_level().edge(e).unwrap();
        assert_eq!(ed.sector_coefficients()[end], SectorCoefficient::Value(0.5));
        assert!(validate(subd.active_level()).is_valid());
    }

    #[test]
    fn stale_crease_coefficient_is_reported_then_recomputed() {
        let mut subd = quad_grid(2);
        let (a, b) = (grid_vertex(&subd, 2, 1, 0), grid_vertex(&subd, 2, 1, 1));
        let e = subd.active_level().find_edge(a, b).unwrap();
        let end = subd.active_level().edge(e).unwrap().end_of(a).unwrap();
        assert_eq!(
            subd.active_level().compute_sector_coefficient(e, end).unwrap(),
            Some(SectorCoefficient::Value(0.5))
        );
        // In range, but not what the two-face crease sector yields.
        subd.active_level_mut().edge_mut(e).unwrap().sector_coefficients[end] = SectorCoefficient::Value(0.3);

        let report = validate(subd.active_level());
        assert!(!report.is_valid());
        assert_eq!(report.count(ViolationCategory::SectorCoefficientMismatch), 1);
        assert_eq!(report.count(ViolationCategory::SectorCoefficientRange), 0);
        assert_eq!(report.total(), 1);

        let repaired = ValidateLevel::default().repair(subd.active_level_mut());
        assert_eq!(repaired.count(ViolationCategory::SectorCoefficientMismatch), 1);
        let ed = subd.active_level().edge(e).unwrap();
        assert_eq!(ed.sector_coefficients()[end], SectorCoefficient::Value(0.5));
        assert!(validate(subd.active_level()).is_valid());
    }

    #[test]
    fn invalid_level_reports_repeat() {
        let mut subd = quad_grid(2);
        let (a, c, corner) = (grid_vertex(&subd, 2, 1, 0), grid_vertex(&subd, 2, 1, 1), grid_vertex(&subd, 2, 0, 0));
        let e = subd.active_level().find_edge(a, c).unwrap();
        let end = subd.active_level().edge(e).unwrap().end_of(a).unwrap();
        let level = subd.active_level_mut();
        level.vertex_mut(c).unwrap().point.z = f64::NAN;
        level.edge_mut(e).unwrap().sector_coefficients[end] = SectorCoefficient::Value(2.0);
        level.vertex_mut(corner).unwrap().tag = VertexTag::Unset;

        let first = validate(subd.active_level());
        assert!(!first.is_valid());
        assert_eq!(first.count(ViolationCategory::NonFinitePosition), 1);
        assert_eq!(first.count(ViolationCategory::SectorCoefficientRange), 1);
        assert_eq!(first.count(ViolationCategory::UnsetTag), 1);
        let second = validate(subd.active_level());
        assert_eq!(first, second);
        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn unset_and_wrong_tags() {
        let mut subd = quad_grid(2);
        let c = grid_vertex(&subd, 2, 1, 1);
        let rim = grid_vertex(&subd, 2, 1, 0);
        subd.active_level_mut().vertex_mut(c).unwrap().tag = VertexTag::Unset;
        subd.active_level_mut().vertex_mut(rim).unwrap().tag = VertexTag::Dart;

        let report = ValidateLevel::default().repair(subd.active_level_mut());
        assert_eq!(report.count(ViolationCategory::UnsetTag), 1);
        assert_eq!(report.count(ViolationCategory::VertexTagCounts), 1);
        assert_eq!(report.count(ViolationCategory::DartCreaseCount), 1);
        assert_eq!(subd.active_level().vertex(c).unwrap().tag(), VertexTag::Smooth);
        // Wrong but set tags are only marked.
        let rim_data = subd.active_level().vertex(rim).unwrap();
        assert_eq!(rim_data.tag(), VertexTag::Dart);
        assert!(rim_data.status().contains(ComponentStatus::DAMAGED));
    }

    #[test]
    fn id_and_level_bookkeeping() {
        let mut subd = quad_grid(1);
        let v = grid_vertex(&subd, 1, 0, 0);
        let level = subd.active_level_mut();
        level.vertex_mut(v).unwrap().id = 99;
        level.vertex_mut(v).unwrap().level = 3;
        let report = validate(subd.active_level());
        assert_eq!(report.count(ViolationCategory::DuplicateId), 1);
        assert_eq!(report.count(ViolationCategory::IdAboveAllocator), 1);
        assert_eq!(report.count(ViolationCategory::LevelMismatch), 1);
    }

    #[test]
    fn subdivided_surface_is_valid() {
        let mut subd = quad_grid(2);
        Subdivide::new(2).execute(&mut subd).unwrap();
        let report = ValidateSubd::default().execute(&subd);
        assert!(report.is_valid(), "{report}");
    }

    #[test]
    fn copied_level_is_not_monotonic() {
        let subd = quad_grid(1);
        let mut copy = subd.active_level().clone();
        copy.set_index(1);
        let stacked = Subd::from_parts(subd.scheme(), vec![subd.active_level().clone(), copy], 0);
        let report = ValidateSubd::default().execute(&stacked);
        assert_eq!(report.count(ViolationCategory::NonMonotonicLevel), 1);
    }

    #[test]
    fn repair_mode_is_opt_in() {
        let mut subd = quad_grid(1);
        let v = grid_vertex(&subd, 1, 0, 0);
        subd.active_level_mut().vertex_mut(v).unwrap().point.y = f64::NAN;

        let report = ValidateSubd::default().execute_mut(&mut subd);
        assert_eq!(report.repaired, 0);
        assert!(subd.active_level().vertex(v).unwrap().point().y.is_nan());

        let repair = ValidateSubd::new(ValidationOptions::default().with_repair(true));
        let report = repair.execute_mut(&mut subd);
        assert!(!report.is_valid());
        assert!(report.repaired >= 1);
        assert!(repair.execute(&subd).is_valid());
    }
}
