//! Validation results.

use std::collections::BTreeMap;
use std::fmt;

use crate::topology::ComponentRef;

/// Kind of consistency violation found by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ViolationCategory {
    /// A component refers to a neighbor that is not in the level.
    DanglingReference,
    /// A component refers to a neighbor that does not refer back.
    NonReciprocalIncidence,
    /// An edge whose two ends are the same vertex.
    DegenerateEdge,
    /// A smooth edge without exactly two faces.
    EdgeTagFaceCount,
    /// A vertex whose edge and face counts do not fit its tag.
    VertexTagCounts,
    /// A dart vertex without exactly one crease edge.
    DartCreaseCount,
    /// A sector coefficient outside [0, 1), unset, or set at a smooth end.
    SectorCoefficientRange,
    /// A tagged-end coefficient that differs from the one its sector yields.
    SectorCoefficientMismatch,
    /// A face with fewer than three sides.
    FaceTooFewSides,
    /// A face whose oriented edges do not form a closed cycle.
    BrokenFaceCycle,
    /// Two components of one kind share an id.
    DuplicateId,
    /// A component id the level's allocator never issued.
    IdAboveAllocator,
    /// A vertex or edge tag left unset.
    UnsetTag,
    /// A vertex position with a NaN or infinite coordinate.
    NonFinitePosition,
    /// A component or level whose level index disagrees with its owner.
    LevelMismatch,
    /// A level that is not larger than the level below it.
    NonMonotonicLevel,
}

impl ViolationCategory {
    /// Every category, in report order.
    pub const ALL: [Self; 16] = [
        Self::DanglingReference,
        Self::NonReciprocalIncidence,
        Self::DegenerateEdge,
        Self::EdgeTagFaceCount,
        Self::VertexTagCounts,
        Self::DartCreaseCount,
        Self::SectorCoefficientRange,
        Self::SectorCoefficientMismatch,
        Self::FaceTooFewSides,
        Self::BrokenFaceCycle,
        Self::DuplicateId,
        Self::IdAboveAllocator,
        Self::UnsetTag,
        Self::NonFinitePosition,
        Self::LevelMismatch,
        Self::NonMonotonicLevel,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::DanglingReference => "dangling reference",
            Self::NonReciprocalIncidence => "non-reciprocal incidence",
            Self::DegenerateEdge => "degenerate edge",
            Self::EdgeTagFaceCount => "edge tag/face count",
            Self::VertexTagCounts => "vertex tag/incidence counts",
            Self::DartCreaseCount => "dart crease count",
            Self::SectorCoefficientRange => "sector coefficient range",
            Self::SectorCoefficientMismatch => "sector coefficient mismatch",
            Self::FaceTooFewSides => "face with too few sides",
            Self::BrokenFaceCycle => "broken face cycle",
            Self::DuplicateId => "duplicate id",
            Self::IdAboveAllocator => "id above allocator",
            Self::UnsetTag => "unset tag",
            Self::NonFinitePosition => "non-finite position",
            Self::LevelMismatch => "level mismatch",
            Self::NonMonotonicLevel => "non-monotonic level",
        }
    }
}

impl fmt::Display for ViolationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One recorded violation.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub category: ViolationCategory,
    /// Level the violation was found on.
    pub level: u16,
    /// Offending component; `None` for level-wide violations.
    pub component: Option<ComponentRef>,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.component {
            Some(c) => write!(f, "[{}] level {} {c}: {}", self.category, self.level, self.message),
            None => write!(f, "[{}] level {}: {}", self.category, self.level, self.message),
        }
    }
}

/// Report of a validation run.
///
/// Every violation is counted, but only the first few of each category are
/// kept with their details.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    /// Recorded violations in visiting order.
    pub violations: Vec<Violation>,
    counts: BTreeMap<ViolationCategory, usize>,
    /// Components changed by repair mode.
    pub repaired: usize,
    limit: usize,
}

impl ValidationReport {
    pub(crate) fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Returns `true` if no violation was found.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of violations found in `category`, including those not kept.
    #[must_use]
    pub fn count(&self, category: ViolationCategory) -> usize {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    /// Total number of violations found.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Kept violations of one category.
    pub fn of(&self, category: ViolationCategory) -> impl Iterator<Item = &Violation> + '_ {
        self.violations.iter().filter(move |v| v.category == category)
    }

    pub(crate) fn record(&mut self, violation: Violation) {
        let count = self.counts.entry(violation.category).or_insert(0);
        *count += 1;
        if *count <= self.limit {
            self.violations.push(violation);
        }
    }

    /// Folds another report into this one.
    pub(crate) fn merge(&mut self, other: ValidationReport) {
        for (category, count) in other.counts {
            *self.counts.entry(category).or_insert(0) += count;
        }
        self.violations.extend(other.violations);
        self.repaired += other.repaired;
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            return writeln!(f, "Validation: OK");
        }
        writeln!(f, "Validation: {} violations", self.total())?;
        for category in ViolationCategory::ALL {
            let count = self.count(category);
            if count > 0 {
                writeln!(f, "  {category}: {count}")?;
            }
        }
        if !self.violations.is_empty() {
            writeln!(f)?;
            for violation in &self.violations {
                writeln!(f, "  {violation}")?;
            }
        }
        if self.repaired > 0 {
            writeln!(f, "  Repaired components: {}", self.repaired)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violation(category: ViolationCategory, id: u32) -> Violation {
        Violation {
            category,
            level: 0,
            component: Some(ComponentRef::edge(id)),
            message: "bad".into(),
        }
    }

    #[test]
    fn counts_past_the_limit() {
        let mut report = ValidationReport::with_limit(2);
        assert!(report.is_valid());
        for id in 1..=5 {
            report.record(violation(ViolationCategory::DegenerateEdge, id));
        }
        report.record(violation(ViolationCategory::UnsetTag, 9));
        assert!(!report.is_valid());
        assert_eq!(report.count(ViolationCategory::DegenerateEdge), 5);
        assert_eq!(report.of(ViolationCategory::DegenerateEdge).count(), 2);
        assert_eq!(report.total(), 6);
        assert_eq!(report.violations.len(), 3);
    }

    #[test]
    fn display_lists_categories() {
        let mut report = ValidationReport::with_limit(8);
        report.record(violation(ViolationCategory::BrokenFaceCycle, 3));
        let text = report.to_string();
        assert!(text.contains("1 violations"));
        assert!(text.contains("broken face cycle: 1"));
        assert!(text.contains("edge 3"));
        assert_eq!(ValidationReport::default().to_string(), "Validation: OK\n");
    }
}
