//! Consistency checks of one level.

use std::collections::HashSet;

use crate::math::{is_finite_point, TOLERANCE};
use crate::topology::{
    ComponentKey, EdgeData, EdgeId, EdgeTag, SectorCoefficient, SubdLevel, VertexData, VertexId, VertexTag,
};

use super::report::{ValidationReport, Violation, ViolationCategory};

/// What a validation pass found, including the components repair mode
/// would coerce.
#[derive(Debug, Default)]
pub(crate) struct Findings {
    pub(crate) report: ValidationReport,
    pub(crate) offenders: HashSet<ComponentKey>,
    pub(crate) non_finite: Vec<VertexId>,
    pub(crate) bad_coefficients: Vec<(EdgeId, usize)>,
    pub(crate) unset_vertices: Vec<VertexId>,
    pub(crate) unset_edges: Vec<EdgeId>,
}

/// Runs every check over `level`, visiting components in id order.
pub(crate) fn check_level(level: &SubdLevel, limit: usize) -> Findings {
    let mut checker = Checker {
        level,
        findings: Findings {
            report: ValidationReport::with_limit(limit),
            ..Findings::default()
        },
    };
    checker.vertices();
    checker.edges();
    checker.faces();
    checker.findings
}

struct Checker<'a> {
    level: &'a SubdLevel,
    findings: Findings,
}

impl Checker<'_> {
    fn flag(&mut self, category: ViolationCategory, key: ComponentKey, message: impl Into<String>) {
        self.findings.report.record(Violation {
            category,
            level: self.level.index(),
            component: self.level.component_ref(key),
            message: message.into(),
        });
        self.findings.offenders.insert(key);
    }

    fn identity(&mut self, key: ComponentKey, id: u32, level: u16, mapped: bool) {
        let kind = key.kind();
        if !mapped {
            self.flag(ViolationCategory::DuplicateId, key, format!("id {id} does not resolve to this {kind}"));
        }
        if id == 0 || id > self.level.id_allocator().max_id(kind) {
            self.flag(
                ViolationCategory::IdAboveAllocator,
                key,
                format!("id {id} was never issued (max {})", self.level.id_allocator().max_id(kind)),
            );
        }
        if level != self.level.index() {
            self.flag(
                ViolationCategory::LevelMismatch,
                key,
                format!("{kind} claims level {level}"),
            );
        }
    }

    fn vertices(&mut self) {
        let level = self.level;
        for v in level.vertex_keys_by_id() {
            let Ok(vd) = level.vertex(v) else {
                continue;
            };
            let key = ComponentKey::Vertex(v);
            self.identity(key, vd.id(), vd.level(), level.vertex_by_id(vd.id()) == Some(v));
            if !is_finite_point(&vd.point()) {
                self.flag(ViolationCategory::NonFinitePosition, key, "position is not finite");
                self.findings.non_finite.push(v);
            }
            if vd.tag() == VertexTag::Unset {
                self.flag(ViolationCategory::UnsetTag, key, "vertex tag is unset");
                self.findings.unset_vertices.push(v);
            }

            let mut intact = true;
            for oe in vd.edges() {
                match level.edge(oe.edge) {
                    Err(_) => {
                        self.flag(ViolationCategory::DanglingReference, key, "refers to a missing edge");
                        intact = false;
                    }
                    Ok(ed) if ed.end_of(v).is_none() => {
                        self.flag(
                            ViolationCategory::NonReciprocalIncidence,
                            key,
                            format!("edge {} does not end at this vertex", ed.id()),
                        );
                        intact = false;
                    }
                    Ok(_) => {}
                }
            }
            for &f in vd.faces() {
                if !level.contains_face(f) {
                    self.flag(ViolationCategory::DanglingReference, key, "refers to a missing face");
                    intact = false;
                } else if level.face_vertices(f).is_ok_and(|corners| !corners.contains(&v)) {
                    self.flag(
                        ViolationCategory::NonReciprocalIncidence,
                        key,
                        "face does not have this vertex as a corner",
                    );
                    intact = false;
                }
            }
            if intact {
                self.vertex_tag(v, vd);
            }
        }
    }

    fn vertex_tag(&mut self, v: VertexId, vd: &VertexData) {
        let level = self.level;
        let key = ComponentKey::Vertex(v);
        let (edges, faces) = (vd.edge_count(), vd.face_count());
        let creases = level.crease_edge_count(v);
        let non_manifold = vd
            .edges()
            .iter()
            .any(|oe| level.edge(oe.edge).is_ok_and(|ed| ed.face_count() > 2));
        let fits = match vd.tag() {
            VertexTag::Unset => true,
            VertexTag::Smooth => edges == faces && creases == 0,
            VertexTag::Dart => edges == faces,
            VertexTag::Crease => creases == 2 && (non_manifold || edges == faces || edges == faces + 1),
            VertexTag::Corner => edges == 0 || non_manifold || edges == faces || edges == faces + 1,
        };
        if !fits {
            self.flag(
                ViolationCategory::VertexTagCounts,
                key,
                format!("{} vertex with {edges} edges, {faces} faces, {creases} creases", vd.tag().name()),
            );
        }
        if vd.tag() == VertexTag::Dart && creases != 1 {
            self.flag(
                ViolationCategory::DartCreaseCount,
                key,
                format!("dart vertex with {creases} crease edges"),
            );
        }
    }

    fn edges(&mut self) {
        let level = self.level;
        for e in level.edge_keys_by_id() {
            let Ok(ed) = level.edge(e) else {
                continue;
            };
            let key = ComponentKey::Edge(e);
            self.identity(key, ed.id(), ed.level(), level.edge_by_id(ed.id()) == Some(e));
            let [a, b] = ed.vertices();
            if a == b {
                self.flag(ViolationCategory::DegenerateEdge, key, "both ends are the same vertex");
            }
            for v in [a, b] {
                match level.vertex(v) {
                    Err(_) => self.flag(ViolationCategory::DanglingReference, key, "refers to a missing vertex"),
                    Ok(vd) if !vd.has_edge(e) => self.flag(
                        ViolationCategory::NonReciprocalIncidence,
                        key,
                        format!("vertex {} does not list this edge", vd.id()),
                    ),
                    Ok(_) => {}
                }
            }
            for of in ed.faces() {
                match level.face(of.face) {
                    Err(_) => self.flag(ViolationCategory::DanglingReference, key, "refers to a missing face"),
                    Ok(fd) if fd.edge_slot(e).is_none() => self.flag(
                        ViolationCategory::NonReciprocalIncidence,
                        key,
                        format!("face {} does not use this edge", fd.id()),
                    ),
                    Ok(_) => {}
                }
            }

            if ed.tag() == EdgeTag::Unset {
                self.flag(ViolationCategory::UnsetTag, key, "edge tag is unset");
                self.findings.unset_edges.push(e);
            } else if ed.tag().is_smooth() && ed.face_count() != 2 {
                self.flag(
                    ViolationCategory::EdgeTagFaceCount,
                    key,
                    format!("{} edge with {} faces", ed.tag().name(), ed.face_count()),
                );
            }
            if ed.tag().is_smooth() {
                self.coefficients(e, ed);
            }
        }
    }

    fn coefficients(&mut self, e: EdgeId, ed: &EdgeData) {
        for end in 0..2 {
            let Ok(vd) = self.level.vertex(ed.vertex(end)) else {
                continue;
            };
            let c = ed.sector_coefficients()[end];
            let fits = match vd.tag() {
                VertexTag::Unset => true,
                VertexTag::Smooth => matches!(c, SectorCoefficient::Ignored) || c == SectorCoefficient::Value(0.0),
                VertexTag::Crease | VertexTag::Corner | VertexTag::Dart => {
                    matches!(c, SectorCoefficient::Value(w) if (0.0..1.0).contains(&w))
                }
            };
            if !fits {
                self.flag(
                    ViolationCategory::SectorCoefficientRange,
                    ComponentKey::Edge(e),
                    format!("coefficient {c:?} at end {end} next to a {} vertex", vd.tag().name()),
                );
                self.findings.bad_coefficients.push((e, end));
                continue;
            }
            let SectorCoefficient::Value(stored) = c else {
                continue;
            };
            if vd.tag().is_tagged() {
                self.sector_mismatch(e, end, stored);
            }
        }
    }

    /// Compares a stored tagged-end coefficient with the one its sector
    /// yields now. Sectors that cannot be evaluated are left to the other
    /// checks.
    fn sector_mismatch(&mut self, e: EdgeId, end: usize, stored: f64) {
        let Ok(Some(SectorCoefficient::Value(expected))) = self.level.compute_sector_coefficient(e, end) else {
            return;
        };
        if (stored - expected).abs() > TOLERANCE {
            self.flag(
                ViolationCategory::SectorCoefficientMismatch,
                ComponentKey::Edge(e),
                format!("coefficient {stored} at end {end} but its sector yields {expected}"),
            );
            self.findings.bad_coefficients.push((e, end));
        }
    }

    fn faces(&mut self) {
        let level = self.level;
        for f in level.face_keys_by_id() {
            let Ok(fd) = level.face(f) else {
                continue;
            };
            let key = ComponentKey::Face(f);
            self.identity(key, fd.id(), fd.level(), level.face_by_id(fd.id()) == Some(f));
            if fd.edge_count() < 3 {
                self.flag(
                    ViolationCategory::FaceTooFewSides,
                    key,
                    format!("face has {} sides", fd.edge_count()),
                );
                continue;
            }
            let mut intact = true;
            for oe in fd.edges() {
                match level.edge(oe.edge) {
                    Err(_) => {
                        self.flag(ViolationCategory::DanglingReference, key, "refers to a missing edge");
                        intact = false;
                    }
                    Ok(ed) if !ed.has_face(f) => {
                        self.flag(
                            ViolationCategory::NonReciprocalIncidence,
                            key,
                            format!("edge {} does not list this face", ed.id()),
                        );
                        intact = false;
                    }
                    Ok(_) => {}
                }
            }
            if !intact {
                continue;
            }
            if let Err(err) = level.check_face_cycle(fd.edges()) {
                self.flag(ViolationCategory::BrokenFaceCycle, key, err.to_string());
                continue;
            }
            let Ok(corners) = level.face_vertices(f) else {
                continue;
            };
            for v in corners {
                if let Ok(vd) = level.vertex(v) {
                    if !vd.has_face(f) {
                        self.flag(
                            ViolationCategory::NonReciprocalIncidence,
                            key,
                            format!("corner vertex {} does not list this face", vd.id()),
                        );
                    }
                }
            }
        }
    }
}
