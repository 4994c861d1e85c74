//! Repair mode.

use crate::math::Point3;
use crate::topology::{ComponentKey, ComponentStatus, EdgeTag, SectorCoefficient, SubdLevel};

use super::checks::Findings;

/// Coerces the repairable fields found by a validation pass to neutral
/// values and marks every offending component damaged. Returns the number
/// of components whose fields changed.
pub(crate) fn apply(level: &mut SubdLevel, findings: &Findings) -> usize {
    let mut changed: Vec<ComponentKey> = Vec::new();
    for &v in &findings.non_finite {
        if let Ok(vd) = level.vertex_mut(v) {
            vd.point = Point3::origin();
            changed.push(ComponentKey::Vertex(v));
        }
    }
    for &(e, end) in &findings.bad_coefficients {
        if let Ok(ed) = level.edge_mut(e) {
            ed.sector_coefficients[end] = SectorCoefficient::Unset;
            changed.push(ComponentKey::Edge(e));
        }
    }
    for &e in &findings.unset_edges {
        if let Ok(ed) = level.edge_mut(e) {
            ed.tag = if ed.faces.len() == 2 { EdgeTag::Smooth } else { EdgeTag::Crease };
            changed.push(ComponentKey::Edge(e));
        }
    }
    for &v in &findings.unset_vertices {
        let Some(tag) = level.derived_vertex_tag(v) else {
            continue;
        };
        if let Ok(vd) = level.vertex_mut(v) {
            vd.tag = tag;
            changed.push(ComponentKey::Vertex(v));
        }
    }

    for &key in &findings.offenders {
        match key {
            ComponentKey::Vertex(v) => {
                if let Ok(vd) = level.vertex_mut(v) {
                    vd.status |= ComponentStatus::DAMAGED;
                }
            }
            ComponentKey::Edge(e) => {
                if let Ok(ed) = level.edge_mut(e) {
                    ed.status |= ComponentStatus::DAMAGED;
                }
            }
            ComponentKey::Face(f) => {
                if let Ok(fd) = level.face_mut(f) {
                    fd.status |= ComponentStatus::DAMAGED;
                }
            }
        }
    }

    changed.dedup();
    if changed.is_empty() {
        return 0;
    }
    level.notify_modified(&changed);
    if let Err(err) = level.resolve_sector_coefficients() {
        tracing::warn!(level = level.index(), error = %err, "sector coefficients left unset after repair");
    }
    changed.len()
}
