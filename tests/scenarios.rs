#![allow(clippy::unwrap_used)]

mod common;

use std::collections::HashSet;

use approx::assert_relative_eq;
use geolis_subd::diagnostics::{invalid_input_count, reset_invalid_input_count};
use geolis_subd::math::{Matrix4, Point3, Vector3};
use geolis_subd::operations::creation::MakeSubd;
use geolis_subd::operations::editing::{DeleteComponents, MergeEdges, MoveVertices, SplitEdge};
use geolis_subd::subdivision::Subdivide;
use geolis_subd::topology::{ComponentKey, ComponentRef, EdgeTag, SubdivisionScheme, VertexId, VertexTag};
use geolis_subd::validation::{ValidateLevel, ValidateSubd, ViolationCategory};
use geolis_subd::Subd;

#[allow(clippy::cast_precision_loss)]
fn grid_points(n: usize) -> Vec<Point3> {
    let mut points = Vec::new();
    for j in 0..=n {
        for i in 0..=n {
            points.push(Point3::new(i as f64, j as f64, 0.0));
        }
    }
    points
}

fn quad_grid(n: usize) -> Subd {
    let row = n + 1;
    let mut faces = Vec::new();
    for j in 0..n {
        for i in 0..n {
            let a = j * row + i;
            faces.push(vec![a, a + 1, a + row + 1, a + row]);
        }
    }
    let mut subd = Subd::new(SubdivisionScheme::CatmullClark);
    MakeSubd::new(grid_points(n), faces).execute(&mut subd).unwrap();
    subd
}

/// Every quad of an `n` by `n` grid cut along the same diagonal, so interior
/// vertices have valence 6.
fn triangle_grid(n: usize) -> Subd {
    let row = n + 1;
    let mut faces = Vec::new();
    for j in 0..n {
        for i in 0..n {
            let a = j * row + i;
            faces.push(vec![a, a + 1, a + row + 1]);
            faces.push(vec![a, a + row + 1, a + row]);
        }
    }
    let mut subd = Subd::new(SubdivisionScheme::LoopWarren);
    MakeSubd::new(grid_points(n), faces).execute(&mut subd).unwrap();
    subd
}

fn vertex_at(subd: &Subd, n: usize, i: usize, j: usize) -> VertexId {
    let id = u32::try_from(j * (n + 1) + i + 1).unwrap();
    subd.active_level().vertex_by_id(id).unwrap()
}

#[test]
fn scenario_a_single_quad_subdivides_into_four() {
    common::init_tracing();
    let mut subd = quad_grid(1);
    assert_eq!(Subdivide::new(1).execute(&mut subd).unwrap(), 1);
    let level = subd.active_level();
    assert_eq!(level.face_count(), 4);
    assert_eq!(level.vertex_count(), 9);
    assert_eq!(level.edge_count(), 12);
    assert!(level.faces().all(|(_, f)| f.edge_count() == 4));
    assert!(ValidateSubd::default().execute(&subd).is_valid());
}

#[test]
fn scenario_b_corner_triangle_keeps_its_corners() {
    common::init_tracing();
    let points = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(2.0, 0.0, 0.0),
        Point3::new(0.0, 2.0, 1.0),
    ];
    let mut subd = Subd::new(SubdivisionScheme::LoopWarren);
    MakeSubd::new(points.clone(), vec![vec![0, 1, 2]])
        .with_corners(vec![0, 1, 2])
        .execute(&mut subd)
        .unwrap();
    let base = subd.active_level();
    assert_eq!(base.edges_with_tag(EdgeTag::Crease).count(), 3);
    assert_eq!(base.vertices_with_tag(VertexTag::Corner).count(), 3);

    Subdivide::new(1).execute(&mut subd).unwrap();
    let level = subd.active_level();
    assert_eq!(level.face_count(), 4);
    assert!(level.faces().all(|(_, f)| f.edge_count() == 3));
    let corners: Vec<Point3> = level.vertices_with_tag(VertexTag::Corner).map(|(_, v)| v.point()).collect();
    assert_eq!(corners.len(), 3);
    for p in &points {
        assert!(corners.contains(p), "corner {p} moved");
    }
}

#[test]
fn scenario_c_split_edge_adds_one_vertex_and_one_edge() {
    common::init_tracing();
    let mut subd = quad_grid(2);
    let (a, b) = (vertex_at(&subd, 2, 1, 0), vertex_at(&subd, 2, 1, 1));
    let edge = subd.active_level().find_edge(a, b).unwrap();
    let (vertices, edges) = (subd.vertex_count(), subd.edge_count());

    let mid = SplitEdge::new(edge).execute(&mut subd).unwrap();
    assert_eq!(subd.vertex_count(), vertices + 1);
    assert_eq!(subd.edge_count(), edges + 1);

    let level = subd.active_level();
    assert_eq!(level.vertex(mid).unwrap().point(), Point3::new(1.0, 0.5, 0.0));
    let faces = level.vertex(mid).unwrap().faces().to_vec();
    assert_eq!(faces.len(), 2);
    for f in faces {
        let corners = level.face_vertices(f).unwrap();
        assert_eq!(corners.len(), 5);
        assert!(corners.contains(&mid));
    }
    let report = ValidateLevel::default().execute(level);
    assert_eq!(report.count(ViolationCategory::BrokenFaceCycle), 0);
    assert!(report.is_valid(), "{report}");
}

#[test]
fn scenario_d_merge_undoes_split() {
    common::init_tracing();
    let mut subd = quad_grid(2);
    let (a, b) = (vertex_at(&subd, 2, 1, 0), vertex_at(&subd, 2, 1, 1));
    let edge = subd.active_level().find_edge(a, b).unwrap();
    let counts = (subd.vertex_count(), subd.edge_count(), subd.face_count());

    let mid = SplitEdge::new(edge).execute(&mut subd).unwrap();
    let level = subd.active_level();
    let first = level.find_edge(a, mid).unwrap();
    let second = level.find_edge(mid, b).unwrap();
    let kept = MergeEdges::new(first, second).execute(&mut subd).unwrap();

    assert_eq!((subd.vertex_count(), subd.edge_count(), subd.face_count()), counts);
    let level = subd.active_level();
    assert!(!level.contains_vertex(mid));
    let mut ends = level.edge(kept).unwrap().vertices().to_vec();
    ends.sort_unstable();
    let mut expected = vec![a, b];
    expected.sort_unstable();
    assert_eq!(ends, expected);
    assert!(level.faces().all(|(_, f)| f.edge_count() == 4));
    assert!(ValidateLevel::default().execute(level).is_valid());
}

#[test]
fn scenario_e_deleting_a_valence_six_vertex() {
    common::init_tracing();
    let mut subd = triangle_grid(4);
    let center = vertex_at(&subd, 4, 2, 2);
    let level = subd.active_level();
    assert_eq!(level.vertex(center).unwrap().edge_count(), 6);
    assert_eq!(level.vertex(center).unwrap().face_count(), 6);
    let id = level.vertex(center).unwrap().id();
    let faces = level.face_count();

    let summary = DeleteComponents::new(vec![ComponentRef::vertex(id)]).execute(&mut subd).unwrap();
    assert_eq!((summary.vertices, summary.edges, summary.faces), (1, 6, 6));
    assert_eq!(subd.face_count(), faces - 6);

    let report = ValidateLevel::default().execute(subd.active_level());
    assert_eq!(report.count(ViolationCategory::DanglingReference), 0);
    assert!(report.is_valid(), "{report}");
    // The hole's rim is now a crease loop.
    let ring = subd.active_level().vertices_with_tag(VertexTag::Crease).count();
    assert!(ring >= 6);
}

#[test]
fn loop_warren_grid_subdivides_cleanly() {
    common::init_tracing();
    let mut subd = triangle_grid(2);
    let (v, e, f) = (subd.vertex_count(), subd.edge_count(), subd.face_count());
    Subdivide::new(2).execute(&mut subd).unwrap();
    assert_eq!(subd.level_count(), 3);
    let one = subd.level(1).unwrap();
    assert_eq!(one.vertex_count(), v + e);
    assert_eq!(one.face_count(), 4 * f);
    assert_eq!(subd.face_count(), 16 * f);
    let report = ValidateSubd::default().execute(&subd);
    assert!(report.is_valid(), "{report}");
}

#[test]
fn editing_a_middle_level_discards_the_others() {
    common::init_tracing();
    let mut subd = quad_grid(2);
    Subdivide::new(2).execute(&mut subd).unwrap();
    assert_eq!(subd.level_count(), 3);
    subd.set_active_level(1).unwrap();
    let level_one_faces = subd.active_level().face_count();

    let v = subd.active_level().vertices().next().map(|(k, _)| k).unwrap();
    let lift = Matrix4::new_translation(&Vector3::new(0.0, 0.0, 0.25));
    MoveVertices::new(vec![v], lift).execute(&mut subd).unwrap();

    assert_eq!(subd.level_count(), 1);
    assert_eq!(subd.active_level_index(), 0);
    assert_eq!(subd.active_level().index(), 0);
    assert_eq!(subd.face_count(), level_one_faces);
    assert!(ValidateSubd::default().execute(&subd).is_valid());
}

#[test]
fn component_refs_resolve_across_levels() {
    common::init_tracing();
    let mut subd = quad_grid(1);
    Subdivide::new(1).execute(&mut subd).unwrap();
    let top = subd.active_level();
    let (key, face) = top.faces().next().unwrap();
    let face_id = face.id();
    let found = subd.resolve(ComponentRef::face(face_id)).unwrap();
    assert_eq!(found, (1, ComponentKey::Face(key)));
    // Level 0 ids are not reissued above it.
    assert_eq!(subd.resolve(ComponentRef::face(1)).map(|(l, _)| l), Some(0));

    subd.clear_lower_levels(1);
    assert_eq!(subd.level_count(), 1);
    assert!(subd.resolve(ComponentRef::face(1)).is_none());
    assert_eq!(subd.resolve(ComponentRef::face(face_id)), Some((0, ComponentKey::Face(key))));
}

#[test]
fn rejected_edits_leave_the_surface_alone() {
    common::init_tracing();
    reset_invalid_input_count();
    let mut subd = quad_grid(2);
    Subdivide::new(1).execute(&mut subd).unwrap();
    let before = (subd.level_count(), subd.face_count());

    let missing = ComponentRef::vertex(10_000);
    assert!(DeleteComponents::new(vec![missing]).execute(&mut subd).is_err());
    assert!(Subdivide::new(0).execute(&mut subd).is_err());
    assert_eq!(invalid_input_count(), 2);
    assert_eq!((subd.level_count(), subd.face_count()), before);
}

#[test]
fn limit_points_of_a_flat_grid_stay_in_plane() {
    common::init_tracing();
    let subd = quad_grid(4);
    let level = subd.active_level();
    let center = vertex_at(&subd, 4, 2, 2);
    let limit = level.vertex_limit_point(center).unwrap();
    assert_relative_eq!(limit.x, 2.0, epsilon = 1e-12);
    assert_relative_eq!(limit.y, 2.0, epsilon = 1e-12);
    assert_relative_eq!(limit.z, 0.0);

    let keys: HashSet<VertexId> = level.vertices().map(|(k, _)| k).collect();
    for v in keys {
        if let Ok(p) = level.vertex_limit_point(v) {
            assert_relative_eq!(p.z, 0.0);
        }
    }
}
