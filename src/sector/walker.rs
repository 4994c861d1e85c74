use smallvec::SmallVec;

use crate::error::TopologyError;
use crate::math::Vector3;
use crate::topology::{EdgeId, EdgeTag, FaceId, SubdLevel, VertexId};

/// The fan of faces at a vertex between two bounding edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Sector {
    /// Center vertex.
    pub vertex: VertexId,
    /// Faces in fan order.
    pub faces: SmallVec<[FaceId; 8]>,
    /// Edges closing the fan on each side. `None` on both sides when the fan
    /// wraps around without meeting a crease.
    pub bounding_edges: [Option<EdgeId>; 2],
    /// Sum of the face corner angles at the vertex, in radians.
    pub corner_angle: f64,
    /// A smooth edge in the fan has fewer than two faces, so the level is
    /// still being built.
    pub incomplete: bool,
}

impl Sector {
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Returns `true` if the fan wraps around the vertex.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.bounding_edges == [None, None]
    }
}

/// Walks the face fans at one vertex.
pub struct SectorWalker<'a> {
    level: &'a SubdLevel,
    vertex: VertexId,
}

impl<'a> SectorWalker<'a> {
    #[must_use]
    pub fn new(level: &'a SubdLevel, vertex: VertexId) -> Self {
        Self { level, vertex }
    }

    /// Walks the sector containing `face`, crossing edges that are not
    /// creases and have two faces.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is not a corner of `face` or a
    /// referenced component is missing.
    pub fn walk(&self, face: FaceId) -> Result<Sector, TopologyError> {
        let (incoming, outgoing) = self
            .level
            .face_edges_at_corner(face, self.vertex)
            .ok_or_else(|| TopologyError::InvalidTopology("vertex is not a corner of the face".into()))?;

        let mut sector = Sector {
            vertex: self.vertex,
            faces: SmallVec::new(),
            bounding_edges: [None, None],
            corner_angle: 0.0,
            incomplete: false,
        };
        sector.faces.push(face);

        let limit = self.level.vertex(self.vertex)?.face_count() + 1;
        let (ahead, closed) = self.advance(face, outgoing, limit, &mut sector)?;
        sector.faces.extend(ahead.faces);
        sector.bounding_edges[1] = ahead.bound;
        if !closed {
            let (behind, _) = self.advance(face, incoming, limit, &mut sector)?;
            let mut faces: SmallVec<[FaceId; 8]> = behind.faces.into_iter().rev().collect();
            faces.extend(sector.faces.drain(..));
            sector.faces = faces;
            sector.bounding_edges[0] = behind.bound;
        }
        for &f in &sector.faces {
            sector.corner_angle += self.face_corner_angle(f)?;
        }
        Ok(sector)
    }

    /// Every sector at the vertex, each face in exactly one.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex or a referenced component is missing.
    pub fn sectors(&self) -> Result<Vec<Sector>, TopologyError> {
        let faces: SmallVec<[FaceId; 8]> = self.level.vertex(self.vertex)?.faces().iter().copied().collect();
        let mut sectors: Vec<Sector> = Vec::new();
        for f in faces {
            if sectors.iter().any(|s| s.faces.contains(&f)) {
                continue;
            }
            sectors.push(self.walk(f)?);
        }
        Ok(sectors)
    }

    /// Walks from `face` across `edge` until a bounding edge, the start face,
    /// or `limit` steps. Returns the faces passed and whether the walk closed.
    fn advance(
        &self,
        start: FaceId,
        mut edge: EdgeId,
        limit: usize,
        sector: &mut Sector,
    ) -> Result<(Side, bool), TopologyError> {
        let mut side = Side::default();
        let mut current = start;
        for _ in 0..limit {
            let ed = self.level.edge(edge)?;
            if ed.tag() == EdgeTag::Crease || ed.face_count() != 2 {
                if ed.tag().is_smooth() && ed.face_count() < 2 {
                    sector.incomplete = true;
                }
                side.bound = Some(edge);
                return Ok((side, false));
            }
            let Some(next) = ed.neighbor_face(current) else {
                side.bound = Some(edge);
                return Ok((side, false));
            };
            if next == start {
                return Ok((side, true));
            }
            side.faces.push(next);
            let (a, b) = self
                .level
                .face_edges_at_corner(next, self.vertex)
                .ok_or_else(|| TopologyError::InvalidTopology("sector fan left the vertex".into()))?;
            edge = if a == edge { b } else { a };
            current = next;
        }
        Err(TopologyError::InvalidTopology("sector fan does not terminate".into()))
    }

    /// Interior angle of `face` at the walker's vertex.
    fn face_corner_angle(&self, face: FaceId) -> Result<f64, TopologyError> {
        let corners = self.level.face_vertices(face)?;
        let n = corners.len();
        let i = corners
            .iter()
            .position(|&c| c == self.vertex)
            .ok_or_else(|| TopologyError::InvalidTopology("vertex is not a corner of the face".into()))?;
        let at = self.level.vertex(self.vertex)?.point();
        let prev = self.level.vertex(corners[(i + n - 1) % n])?.point();
        let next = self.level.vertex(corners[(i + 1) % n])?.point();
        Ok(angle_between(&(prev - at), &(next - at)))
    }
}

#[derive(Default)]
struct Side {
    faces: SmallVec<[FaceId; 8]>,
    bound: Option<EdgeId>,
}

fn angle_between(a: &Vector3, b: &Vector3) -> f64 {
    let denom = a.norm() * b.norm();
    if denom == 0.0 {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos()
}
