//! Subdivision and limit point stencils.
//!
//! Every point is cached on its component the first time it is requested and
//! stays valid until a modified notification clears it.

use smallvec::SmallVec;

use crate::error::{SubdivisionError, TopologyError};
use crate::math::{centroid, Point3, Vector3};
use crate::topology::{
    EdgeData, EdgeId, EdgeTag, FaceId, SectorCoefficient, SubdLevel, SubdivisionScheme, VertexId, VertexTag,
};

#[allow(clippy::cast_precision_loss)]
fn as_f64(n: usize) -> f64 {
    n as f64
}

fn lerp(a: &Point3, b: &Point3, t: f64) -> Point3 {
    Point3::from(a.coords * (1.0 - t) + b.coords * t)
}

impl SubdLevel {
    /// Face point: the average of the face's corners.
    ///
    /// # Errors
    ///
    /// Returns an error if the face or one of its components is missing.
    pub fn face_subdivision_point(&self, face: FaceId) -> crate::Result<Point3> {
        let fd = self.face(face)?;
        fd.subdivision_point.get_or_try_init(|| -> crate::Result<Point3> {
            let points = self.face_points(face)?;
            Ok(centroid(points.iter()).ok_or_else(|| TopologyError::InvalidTopology("face has no corners".into()))?)
        })
    }

    /// Edge point: the midpoint for creases, the scheme's smooth stencil
    /// otherwise, blended by sharpness for semi-sharp edges.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge tag is unset, a smooth edge does not have
    /// two faces, or a sector coefficient is unresolved.
    pub fn edge_subdivision_point(&self, edge: EdgeId) -> crate::Result<Point3> {
        let ed = self.edge(edge)?;
        ed.subdivision_point
            .get_or_try_init(|| self.compute_edge_point(ed))
    }

    fn compute_edge_point(&self, ed: &EdgeData) -> crate::Result<Point3> {
        let p0 = self.vertex(ed.vertices[0])?.point();
        let p1 = self.vertex(ed.vertices[1])?.point();
        let mid = Point3::from((p0.coords + p1.coords) * 0.5);
        match ed.tag() {
            EdgeTag::Crease => return Ok(mid),
            EdgeTag::Unset => {
                return Err(TopologyError::InvalidTopology(format!("edge {} has no tag", ed.id())).into());
            }
            EdgeTag::Smooth | EdgeTag::Sharp | EdgeTag::SmoothX => {}
        }
        if ed.face_count() != 2 {
            return Err(TopologyError::InvalidTopology(format!(
                "smooth edge {} has {} faces",
                ed.id(),
                ed.face_count()
            ))
            .into());
        }
        let smooth = match self.scheme() {
            SubdivisionScheme::CatmullClark => self.catmull_clark_edge_point(ed, &p0, &p1)?,
            SubdivisionScheme::LoopWarren => self.loop_edge_point(ed, &p0, &p1)?,
        };
        if ed.tag() == EdgeTag::Sharp {
            let s = ed.sharpness();
            if s >= 1.0 {
                return Ok(mid);
            }
            return Ok(lerp(&smooth, &mid, s.max(0.0)));
        }
        Ok(smooth)
    }

    /// Endpoint combination weighted toward tagged ends. `None` when both
    /// ends are ignored and the plain midpoint applies.
    fn weighted_endpoint(ed: &EdgeData, p0: &Point3, p1: &Point3) -> crate::Result<Option<Point3>> {
        let [c0, c1] = ed.sector_coefficients();
        let toward0 = |w: f64| Point3::from(p0.coords * w + p1.coords * (1.0 - w));
        let toward1 = |w: f64| Point3::from(p0.coords * (1.0 - w) + p1.coords * w);
        match (c0, c1) {
            (SectorCoefficient::Unset, _) | (_, SectorCoefficient::Unset) => {
                Err(SubdivisionError::UnresolvedSectorCoefficient { edge: ed.id() }.into())
            }
            (SectorCoefficient::Ignored, SectorCoefficient::Ignored) => Ok(None),
            (SectorCoefficient::Value(w0), SectorCoefficient::Ignored) => Ok(Some(toward0(w0))),
            (SectorCoefficient::Ignored, SectorCoefficient::Value(w1)) => Ok(Some(toward1(w1))),
            (SectorCoefficient::Value(w0), SectorCoefficient::Value(w1)) => {
                Ok(Some(Point3::from((toward0(w0).coords + toward1(w1).coords) * 0.5)))
            }
        }
    }

    fn catmull_clark_edge_point(&self, ed: &EdgeData, p0: &Point3, p1: &Point3) -> crate::Result<Point3> {
        let f0 = ed.faces()[0].face;
        let f1 = ed.faces()[1].face;
        let fp0 = self.face_subdivision_point(f0)?;
        let fp1 = self.face_subdivision_point(f1)?;
        let Some(ep) = Self::weighted_endpoint(ed, p0, p1)? else {
            return Ok(Point3::from((p0.coords + p1.coords + fp0.coords + fp1.coords) * 0.25));
        };
        let inv = 1.0 / as_f64(self.face(f0)?.edge_count()) + 1.0 / as_f64(self.face(f1)?.edge_count());
        let a = 0.25 + 0.25 * inv;
        let sum = (fp0.coords + fp1.coords) - (p0.coords + p1.coords) * inv;
        Ok(Point3::from(ep.coords * (2.0 * a) + sum * 0.25))
    }

    fn loop_edge_point(&self, ed: &EdgeData, p0: &Point3, p1: &Point3) -> crate::Result<Point3> {
        let mut opposite = Vector3::zeros();
        for of in ed.faces() {
            let others: SmallVec<[Point3; 4]> = self
                .face_vertices(of.face)?
                .into_iter()
                .filter(|v| !ed.vertices().contains(v))
                .map(|v| self.vertex(v).map(|d| d.point()))
                .collect::<Result<_, _>>()?;
            let o = centroid(others.iter())
                .ok_or_else(|| TopologyError::InvalidTopology("face has no opposite corner".into()))?;
            opposite += o.coords;
        }
        let ep = Self::weighted_endpoint(ed, p0, p1)?
            .unwrap_or_else(|| Point3::from((p0.coords + p1.coords) * 0.5));
        Ok(Point3::from(ep.coords * 0.75 + opposite * 0.125))
    }

    /// Vertex point: fixed for corners, the 1:6:1 crease rule for creases and
    /// the scheme's smooth rule for smooth and dart vertices.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex tag is unset or inconsistent with the
    /// incident crease edges.
    pub fn vertex_subdivision_point(&self, vertex: VertexId) -> crate::Result<Point3> {
        let vd = self.vertex(vertex)?;
        vd.subdivision_point
            .get_or_try_init(|| self.compute_vertex_point(vertex))
    }

    fn compute_vertex_point(&self, vertex: VertexId) -> crate::Result<Point3> {
        let vd = self.vertex(vertex)?;
        let v = vd.point();
        match vd.tag() {
            VertexTag::Corner => Ok(v),
            VertexTag::Crease => {
                let [c0, c1] = self.tagged_neighbors(vertex, EdgeTag::Crease)?;
                Ok(crease_rule(&v, &c0, &c1))
            }
            VertexTag::Dart => self.smooth_vertex_point(vertex),
            VertexTag::Smooth => {
                let smooth = self.smooth_vertex_point(vertex)?;
                self.blend_semi_sharp(vertex, &smooth)
            }
            VertexTag::Unset => {
                Err(TopologyError::InvalidTopology(format!("vertex {} has no tag", vd.id())).into())
            }
        }
    }

    fn smooth_vertex_point(&self, vertex: VertexId) -> crate::Result<Point3> {
        let vd = self.vertex(vertex)?;
        let n = vd.edge_count();
        if n < 2 || n != vd.face_count() {
            return Err(TopologyError::InvalidTopology(format!(
                "smooth vertex {} has {} edges and {} faces",
                vd.id(),
                n,
                vd.face_count()
            ))
            .into());
        }
        let nf = as_f64(n);
        let mut ring = Vector3::zeros();
        for u in self.vertex_neighbors(vertex)? {
            ring += self.vertex(u)?.point().coords;
        }
        let v = vd.point().coords;
        match self.scheme() {
            SubdivisionScheme::CatmullClark => {
                let mut faces = Vector3::zeros();
                for &f in vd.faces() {
                    faces += self.face_subdivision_point(f)?.coords;
                }
                let inv_n2 = 1.0 / (nf * nf);
                Ok(Point3::from(v * (1.0 - 2.0 / nf) + ring * inv_n2 + faces * inv_n2))
            }
            SubdivisionScheme::LoopWarren => {
                let beta = loop_beta(n);
                Ok(Point3::from(v * (1.0 - nf * beta) + ring * beta))
            }
        }
    }

    /// Smooth vertices with two or more sharp edges move toward the crease or
    /// corner rule by the average sharpness.
    fn blend_semi_sharp(&self, vertex: VertexId, smooth: &Point3) -> crate::Result<Point3> {
        let vd = self.vertex(vertex)?;
        let mut others: SmallVec<[Point3; 4]> = SmallVec::new();
        let mut total = 0.0;
        for oe in vd.edges() {
            let ed = self.edge(oe.edge)?;
            if ed.tag() == EdgeTag::Sharp {
                others.push(self.vertex(ed.vertices()[usize::from(oe.forward)])?.point());
                total += ed.sharpness();
            }
        }
        let target = match others.as_slice() {
            [c0, c1] => crease_rule(&vd.point(), c0, c1),
            s if s.len() > 2 => vd.point(),
            _ => return Ok(*smooth),
        };
        let s = total / as_f64(others.len());
        if s >= 1.0 {
            Ok(target)
        } else {
            Ok(lerp(smooth, &target, s))
        }
    }

    /// Far ends of the two edges with `tag` at `vertex`.
    fn tagged_neighbors(&self, vertex: VertexId, tag: EdgeTag) -> crate::Result<[Point3; 2]> {
        let vd = self.vertex(vertex)?;
        let mut found: SmallVec<[Point3; 2]> = SmallVec::new();
        for oe in vd.edges() {
            let ed = self.edge(oe.edge)?;
            if ed.tag() == tag {
                found.push(self.vertex(ed.vertices()[usize::from(oe.forward)])?.point());
            }
        }
        match found.as_slice() {
            [a, b] => Ok([*a, *b]),
            _ => Err(TopologyError::InvalidTopology(format!(
                "crease vertex {} has {} crease edges",
                vd.id(),
                found.len()
            ))
            .into()),
        }
    }

    /// Limit surface position of a vertex.
    ///
    /// Available for corners, creases, and smooth vertices whose faces are all
    /// ordinary for the scheme (quads or triangles).
    ///
    /// # Errors
    ///
    /// Returns [`SubdivisionError::LimitPointUnavailable`] for darts, semi-sharp
    /// neighborhoods and irregular faces.
    pub fn vertex_limit_point(&self, vertex: VertexId) -> crate::Result<Point3> {
        let vd = self.vertex(vertex)?;
        vd.limit_point.get_or_try_init(|| self.compute_limit_point(vertex))
    }

    fn compute_limit_point(&self, vertex: VertexId) -> crate::Result<Point3> {
        let vd = self.vertex(vertex)?;
        let unavailable = |why: &str| -> crate::Result<Point3> {
            Err(SubdivisionError::LimitPointUnavailable(format!("vertex {}: {why}", vd.id())).into())
        };
        let v = vd.point();
        match vd.tag() {
            VertexTag::Corner => return Ok(v),
            VertexTag::Crease => {
                let [c0, c1] = self.tagged_neighbors(vertex, EdgeTag::Crease)?;
                return Ok(Point3::from((c0.coords + v.coords * 4.0 + c1.coords) / 6.0));
            }
            VertexTag::Dart => return unavailable("dart vertex"),
            VertexTag::Unset => return unavailable("unset tag"),
            VertexTag::Smooth => {}
        }
        let n = vd.edge_count();
        if n < 3 || n != vd.face_count() {
            return unavailable("open fan");
        }
        for oe in vd.edges() {
            if self.edge(oe.edge)?.tag() != EdgeTag::Smooth {
                return unavailable("semi-sharp edge");
            }
        }
        let ordinary = self.scheme().ordinary_face_edge_count();
        for &f in vd.faces() {
            if self.face(f)?.edge_count() != ordinary {
                return unavailable("irregular face");
            }
        }
        let nf = as_f64(n);
        let mut ring = Vector3::zeros();
        for u in self.vertex_neighbors(vertex)? {
            ring += self.vertex(u)?.point().coords;
        }
        match self.scheme() {
            SubdivisionScheme::CatmullClark => {
                let mut diagonal = Vector3::zeros();
                for &f in vd.faces() {
                    let corners = self.face_vertices(f)?;
                    let i = corners
                        .iter()
                        .position(|&c| c == vertex)
                        .ok_or_else(|| TopologyError::InvalidTopology("vertex is not a face corner".into()))?;
                    diagonal += self.vertex(corners[(i + 2) % 4])?.point().coords;
                }
                Ok(Point3::from(
                    (v.coords * (nf * nf) + ring * 4.0 + diagonal) / (nf * (nf + 5.0)),
                ))
            }
            SubdivisionScheme::LoopWarren => {
                let chi = 1.0 / (nf + 3.0 / (8.0 * loop_beta(n)));
                Ok(Point3::from(v.coords * (1.0 - nf * chi) + ring * chi))
            }
        }
    }
}

/// Warren's vertex weight: 3/16 for valence 3, 3/(8n) otherwise.
#[must_use]
pub fn loop_beta(valence: usize) -> f64 {
    if valence == 3 {
        3.0 / 16.0
    } else {
        3.0 / (8.0 * as_f64(valence))
    }
}

fn crease_rule(v: &Point3, c0: &Point3, c1: &Point3) -> Point3 {
    Point3::from(v.coords * 0.75 + (c0.coords + c1.coords) * 0.125)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    /// Closed cube, all smooth.
    fn cube() -> (SubdLevel, Vec<VertexId>) {
        let mut level = SubdLevel::new(0, SubdivisionScheme::CatmullClark);
        let v: Vec<_> = [
            p(0.0, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(1.0, 1.0, 0.0),
            p(0.0, 1.0, 0.0),
            p(0.0, 0.0, 1.0),
            p(1.0, 0.0, 1.0),
            p(1.0, 1.0, 1.0),
            p(0.0, 1.0, 1.0),
        ]
        .into_iter()
        .map(|q| level.add_vertex(q, VertexTag::Unset).unwrap())
        .collect();
        for quad in [
            [0, 3, 2, 1],
            [4, 5, 6, 7],
            [0, 1, 5, 4],
            [1, 2, 6, 5],
            [2, 3, 7, 6],
            [3, 0, 4, 7],
        ] {
            level.add_face_from_vertices(&quad.map(|i| v[i])).unwrap();
        }
        level.derive_all_tags();
        level.resolve_sector_coefficients().unwrap();
        (level, v)
    }

    #[test]
    fn cube_stencils() {
        let (level, v) = cube();
        let bottom = level.vertex(v[0]).unwrap().faces()[0];
        assert_eq!(level.face_subdivision_point(bottom).unwrap(), p(0.5, 0.5, 0.0));

        let e = level.find_edge(v[0], v[1]).unwrap();
        // (V0 + V1 + F0 + F1) / 4 with F0 = (0.5, 0.5, 0) and F1 = (0.5, 0, 0.5).
        assert_relative_eq!(level.edge_subdivision_point(e).unwrap(), p(0.5, 0.125, 0.125));

        // Valence 3 at the origin: V/3 + ring/9 + faces/9, both sums (1, 1, 1).
        let vp = level.vertex_subdivision_point(v[0]).unwrap();
        let expected = 2.0 / 9.0;
        assert_relative_eq!(vp, p(expected, expected, expected), epsilon = 1e-15);
        assert!(level.vertex(v[0]).unwrap().cached_subdivision_point().is_some());
    }

    #[test]
    fn cube_limit_point_lies_inside() {
        let (level, v) = cube();
        let lp = level.vertex_limit_point(v[6]).unwrap();
        let vp = level.vertex_subdivision_point(v[6]).unwrap();
        // The limit point sits closer to the center than one subdivision step.
        assert!(lp.x < vp.x);
        assert_relative_eq!(lp.x, lp.y);
        assert_relative_eq!(lp.y, lp.z);
    }

    #[test]
    fn crease_and_corner_rules() {
        // Single quad: every vertex has two crease edges.
        let mut level = SubdLevel::new(0, SubdivisionScheme::CatmullClark);
        let v: Vec<_> = [p(0.0, 0.0, 0.0), p(4.0, 0.0, 0.0), p(4.0, 4.0, 0.0), p(0.0, 4.0, 0.0)]
            .into_iter()
            .map(|q| level.add_vertex(q, VertexTag::Unset).unwrap())
            .collect();
        level.add_face_from_vertices(&v).unwrap();
        level.derive_all_tags();
        level.resolve_sector_coefficients().unwrap();

        let e = level.find_edge(v[0], v[1]).unwrap();
        assert_eq!(level.edge_subdivision_point(e).unwrap(), p(2.0, 0.0, 0.0));
        // 3/4 (0,0) + 1/8 ((4,0) + (0,4))
        assert_eq!(level.vertex_subdivision_point(v[0]).unwrap(), p(0.5, 0.5, 0.0));
        assert_relative_eq!(level.vertex_limit_point(v[0]).unwrap(), p(4.0 / 6.0, 4.0 / 6.0, 0.0));

        level.vertex_mut(v[2]).unwrap().tag = VertexTag::Corner;
        assert_eq!(level.vertex_subdivision_point(v[2]).unwrap(), p(4.0, 4.0, 0.0));
    }

    #[test]
    fn loop_smooth_vertex_weights() {
        assert_eq!(loop_beta(3), 3.0 / 16.0);
        assert_eq!(loop_beta(6), 1.0 / 16.0);
    }

    #[test]
    fn sharp_edge_at_full_sharpness_is_midpoint() {
        let (mut level, v) = cube();
        let e = level.find_edge(v[0], v[1]).unwrap();
        {
            let ed = level.edge_mut(e).unwrap();
            ed.tag = EdgeTag::Sharp;
            ed.sharpness = 2.0;
        }
        level.clear_cached_points();
        assert_eq!(level.edge_subdivision_point(e).unwrap(), p(0.5, 0.0, 0.0));
        assert!(matches!(
            level.vertex_limit_point(v[0]),
            Err(crate::SubdError::Subdivision(SubdivisionError::LimitPointUnavailable(_)))
        ));
    }

    #[test]
    fn unresolved_coefficient_is_reported() {
        let (mut level, v) = cube();
        let e = level.find_edge(v[0], v[1]).unwrap();
        level.vertex_mut(v[0]).unwrap().tag = VertexTag::Corner;
        level.edge_mut(e).unwrap().sector_coefficients[0] = SectorCoefficient::Unset;
        level.clear_cached_points();
        assert!(matches!(
            level.edge_subdivision_point(e),
            Err(crate::SubdError::Subdivision(
                SubdivisionError::UnresolvedSectorCoefficient { .. }
            ))
        ));
    }
}
