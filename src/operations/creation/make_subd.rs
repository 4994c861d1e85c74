use crate::diagnostics;
use crate::error::Result;
use crate::math::{is_finite_point, Point3};
use crate::subd::Subd;
use crate::topology::{EdgeTag, VertexId, VertexTag};

/// Builds level 0 of a subdivision surface from an indexed polygon list.
///
/// Boundary edges become creases and their vertices crease or corner
/// vertices. Extra interior creases and explicit corners can be requested;
/// an explicit corner only survives tag derivation where at least two
/// creases meet or on the boundary.
pub struct MakeSubd {
    points: Vec<Point3>,
    faces: Vec<Vec<usize>>,
    creases: Vec<[usize; 2]>,
    corners: Vec<usize>,
}

impl MakeSubd {
    /// Creates a new `MakeSubd` operation from control points and faces
    /// given as point indices.
    #[must_use]
    pub fn new(points: Vec<Point3>, faces: Vec<Vec<usize>>) -> Self {
        Self {
            points,
            faces,
            creases: Vec::new(),
            corners: Vec::new(),
        }
    }

    /// Marks the edges between the given point index pairs as creases.
    #[must_use]
    pub fn with_creases(mut self, creases: Vec<[usize; 2]>) -> Self {
        self.creases = creases;
        self
    }

    /// Marks the given points as corners.
    #[must_use]
    pub fn with_corners(mut self, corners: Vec<usize>) -> Self {
        self.corners = corners;
        self
    }

    /// Executes the operation, replacing every level of `subd` with the new
    /// control mesh. Scheme and configuration are kept.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error if a point is not finite, a face has
    /// fewer than three corners or repeats one, an index is out of range, or
    /// a crease pair is not an edge of any face. `subd` is unchanged then.
    pub fn execute(&self, subd: &mut Subd) -> Result<()> {
        self.check()?;

        let mut built = Subd::with_config(subd.scheme(), subd.config().clone());
        let level = built.active_level_mut();
        let vertices: Vec<VertexId> = self
            .points
            .iter()
            .map(|&p| level.add_vertex(p, VertexTag::Unset))
            .collect::<std::result::Result<_, _>>()?;
        for face in &self.faces {
            let corners: Vec<VertexId> = face.iter().map(|&i| vertices[i]).collect();
            let f = level.add_face_from_vertices(&corners)?;
            let id = level.face(f)?.id();
            level.face_mut(f)?.level_zero_face_id = id;
        }
        for &[a, b] in &self.creases {
            if let Some(e) = level.find_edge(vertices[a], vertices[b]) {
                level.edge_mut(e)?.tag = EdgeTag::Crease;
            }
        }
        for &i in &self.corners {
            level.vertex_mut(vertices[i])?.tag = VertexTag::Corner;
        }
        level.derive_all_tags();
        level.resolve_sector_coefficients()?;
        tracing::debug!(
            vertices = level.vertex_count(),
            edges = level.edge_count(),
            faces = level.face_count(),
            "control mesh built"
        );
        *subd = built;
        Ok(())
    }

    fn check(&self) -> Result<()> {
        let n = self.points.len();
        if let Some(i) = self.points.iter().position(|p| !is_finite_point(p)) {
            return Err(diagnostics::invalid_input(format!("point {i} is not finite")).into());
        }
        for (f, face) in self.faces.iter().enumerate() {
            if face.len() < 3 {
                return Err(diagnostics::invalid_input(format!("face {f} has fewer than 3 corners")).into());
            }
            for (k, &i) in face.iter().enumerate() {
                if i >= n {
                    return Err(diagnostics::invalid_input(format!("face {f} references missing point {i}")).into());
                }
                if face[..k].contains(&i) {
                    return Err(diagnostics::invalid_input(format!("face {f} repeats point {i}")).into());
                }
            }
        }
        for &[a, b] in &self.creases {
            let is_edge = self.faces.iter().any(|face| {
                let m = face.len();
                (0..m).any(|k| {
                    let (x, y) = (face[k], face[(k + 1) % m]);
                    (x, y) == (a, b) || (x, y) == (b, a)
                })
            });
            if !is_edge {
                return Err(diagnostics::invalid_input(format!("crease {a}-{b} is not a face edge")).into());
            }
        }
        if let Some(&i) = self.corners.iter().find(|&&i| i >= n) {
            return Err(diagnostics::invalid_input(format!("corner references missing point {i}")).into());
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::topology::SubdivisionScheme;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn cube() -> (Vec<Point3>, Vec<Vec<usize>>) {
        let points = vec![
            p(0.0, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(1.0, 1.0, 0.0),
            p(0.0, 1.0, 0.0),
            p(0.0, 0.0, 1.0),
            p(1.0, 0.0, 1.0),
            p(1.0, 1.0, 1.0),
            p(0.0, 1.0, 1.0),
        ];
        let faces = vec![
            vec![0, 3, 2, 1],
            vec![4, 5, 6, 7],
            vec![0, 1, 5, 4],
            vec![1, 2, 6, 5],
            vec![2, 3, 7, 6],
            vec![3, 0, 4, 7],
        ];
        (points, faces)
    }

    #[test]
    fn closed_cube_is_smooth() {
        let (points, faces) = cube();
        let mut subd = Subd::new(SubdivisionScheme::CatmullClark);
        MakeSubd::new(points, faces).execute(&mut subd).unwrap();
        let level = subd.active_level();
        assert_eq!((level.vertex_count(), level.edge_count(), level.face_count()), (8, 12, 6));
        assert!(level.vertices().all(|(_, v)| v.tag() == VertexTag::Smooth));
        assert!(level.edges().all(|(_, e)| e.tag() == EdgeTag::Smooth));
        assert!(level.faces().all(|(_, f)| f.level_zero_face_id() == f.id()));
    }

    #[test]
    fn creases_and_corners_are_applied() {
        let (points, faces) = cube();
        let mut subd = Subd::new(SubdivisionScheme::CatmullClark);
        // A crease loop around the top face makes its corners creases; one of
        // them is promoted to a corner.
        MakeSubd::new(points, faces)
            .with_creases(vec![[4, 5], [5, 6], [6, 7], [7, 4]])
            .with_corners(vec![4])
            .execute(&mut subd)
            .unwrap();
        let level = subd.active_level();
        assert_eq!(level.edges_with_tag(EdgeTag::Crease).count(), 4);
        assert_eq!(level.vertices_with_tag(VertexTag::Crease).count(), 3);
        assert_eq!(level.vertices_with_tag(VertexTag::Corner).count(), 1);
        // Edges between two tagged vertices are SmoothX only if not creased.
        assert!(level.edges_with_tag(EdgeTag::SmoothX).next().is_none());
    }

    #[test]
    fn invalid_input_leaves_subd_unchanged() {
        let (points, faces) = cube();
        let mut subd = Subd::new(SubdivisionScheme::CatmullClark);
        MakeSubd::new(points.clone(), faces).execute(&mut subd).unwrap();

        crate::diagnostics::reset_invalid_input_count();
        let bad = MakeSubd::new(points.clone(), vec![vec![0, 1, 9]]);
        assert!(bad.execute(&mut subd).is_err());
        let bad = MakeSubd::new(points.clone(), vec![vec![0, 1, 1]]);
        assert!(bad.execute(&mut subd).is_err());
        let bad = MakeSubd::new(points, vec![vec![0, 1, 2]]).with_creases(vec![[0, 5]]);
        assert!(bad.execute(&mut subd).is_err());
        assert_eq!(crate::diagnostics::invalid_input_count(), 3);
        assert_eq!(subd.face_count(), 6);
    }

    #[test]
    fn open_triangle_is_all_crease() {
        let mut subd = Subd::new(SubdivisionScheme::LoopWarren);
        MakeSubd::new(vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)], vec![vec![0, 1, 2]])
            .with_corners(vec![0, 1, 2])
            .execute(&mut subd)
            .unwrap();
        let level = subd.active_level();
        assert!(level.edges().all(|(_, e)| e.tag() == EdgeTag::Crease));
        assert!(level.vertices().all(|(_, v)| v.tag() == VertexTag::Corner));
    }
}
