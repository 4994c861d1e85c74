//! Arena primitives: allocation, deallocation and bidirectional incidences.
//!
//! Every primitive validates its arguments before touching the arena, updates
//! both sides of each incidence it changes, and issues exactly one modified
//! notification.

use smallvec::SmallVec;

use crate::error::TopologyError;
use crate::math::Point3;

use super::edge::EdgeData;
use super::face::FaceData;
use super::id::{ComponentKey, ComponentKind, EdgeId, FaceId, VertexId};
use super::oriented::{OrientedEdge, OrientedFace};
use super::tag::{EdgeTag, VertexTag};
use super::vertex::VertexData;
use super::SubdLevel;

impl SubdLevel {
    // --- Allocation ---

    /// Inserts an isolated vertex with a freshly issued id.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::IdSpaceExhausted`] if no id is left.
    pub fn add_vertex(&mut self, point: Point3, tag: VertexTag) -> Result<VertexId, TopologyError> {
        let id = self.ids.next(ComponentKind::Vertex)?;
        Ok(self.insert_vertex(id, point, tag))
    }

    /// Inserts a vertex with a caller-chosen id (archive reads).
    pub(crate) fn add_vertex_with_id(
        &mut self,
        id: u32,
        point: Point3,
        tag: VertexTag,
    ) -> Result<VertexId, TopologyError> {
        if id == 0 || self.vertex_ids.contains_key(&id) {
            return Err(TopologyError::InvalidTopology(format!("duplicate vertex id {id}")));
        }
        self.ids.reserve(ComponentKind::Vertex, id);
        Ok(self.insert_vertex(id, point, tag))
    }

    fn insert_vertex(&mut self, id: u32, point: Point3, tag: VertexTag) -> VertexId {
        let key = self.vertices.insert(VertexData::new(id, self.index, point, tag));
        self.vertex_ids.insert(id, key);
        self.revision += 1;
        key
    }

    /// Inserts an edge from `v0` to `v1` and connects it to both vertices.
    ///
    /// # Errors
    ///
    /// Returns an error if either vertex is missing, the endpoints coincide,
    /// or no id is left.
    pub fn add_edge(&mut self, v0: VertexId, v1: VertexId, tag: EdgeTag) -> Result<EdgeId, TopologyError> {
        self.check_edge_ends(v0, v1)?;
        let id = self.ids.next(ComponentKind::Edge)?;
        Ok(self.insert_edge(id, v0, v1, tag))
    }

    pub(crate) fn add_edge_with_id(
        &mut self,
        id: u32,
        v0: VertexId,
        v1: VertexId,
        tag: EdgeTag,
    ) -> Result<EdgeId, TopologyError> {
        self.check_edge_ends(v0, v1)?;
        if id == 0 || self.edge_ids.contains_key(&id) {
            return Err(TopologyError::InvalidTopology(format!("duplicate edge id {id}")));
        }
        self.ids.reserve(ComponentKind::Edge, id);
        Ok(self.insert_edge(id, v0, v1, tag))
    }

    fn check_edge_ends(&self, v0: VertexId, v1: VertexId) -> Result<(), TopologyError> {
        if v0 == v1 {
            return Err(TopologyError::InvalidTopology(
                "edge endpoints must be distinct".into(),
            ));
        }
        self.vertex(v0)?;
        self.vertex(v1)?;
        Ok(())
    }

    fn insert_edge(&mut self, id: u32, v0: VertexId, v1: VertexId, tag: EdgeTag) -> EdgeId {
        let key = self.edges.insert(EdgeData::new(id, self.index, [v0, v1], tag));
        self.edge_ids.insert(id, key);
        if let Some(v) = self.vertices.get_mut(v0) {
            v.edges.push(OrientedEdge::new(key, true));
        }
        if let Some(v) = self.vertices.get_mut(v1) {
            v.edges.push(OrientedEdge::new(key, false));
        }
        let touched = self.neighborhood(&[ComponentKey::Edge(key)]);
        self.finish_change(touched);
        key
    }

    /// Inserts a face bounded by the given oriented edge cycle.
    ///
    /// # Errors
    ///
    /// Returns an error if the cycle has fewer than three edges, repeats an
    /// edge or a corner, does not close, or references missing edges.
    pub fn add_face(&mut self, edges: &[OrientedEdge]) -> Result<FaceId, TopologyError> {
        self.check_face_cycle(edges)?;
        let id = self.ids.next(ComponentKind::Face)?;
        Ok(self.insert_face(id, edges))
    }

    pub(crate) fn add_face_with_id(&mut self, id: u32, edges: &[OrientedEdge]) -> Result<FaceId, TopologyError> {
        self.check_face_cycle(edges)?;
        if id == 0 || self.face_ids.contains_key(&id) {
            return Err(TopologyError::InvalidTopology(format!("duplicate face id {id}")));
        }
        self.ids.reserve(ComponentKind::Face, id);
        Ok(self.insert_face(id, edges))
    }

    fn insert_face(&mut self, id: u32, edges: &[OrientedEdge]) -> FaceId {
        let mut data = FaceData::new(id, self.index);
        data.edges.extend_from_slice(edges);
        let key = self.faces.insert(data);
        self.face_ids.insert(id, key);
        for oe in edges {
            if let Some(e) = self.edges.get_mut(oe.edge) {
                e.faces.push(OrientedFace::new(key, oe.forward));
            }
        }
        self.sync_face_vertices(key, &[]);
        let touched = self.neighborhood(&[ComponentKey::Face(key)]);
        self.finish_change(touched);
        key
    }

    /// Inserts a face through the given corner vertices, reusing existing
    /// edges and creating missing ones with an unset tag.
    ///
    /// # Errors
    ///
    /// Returns an error if a vertex is missing, repeated, or there are fewer
    /// than three corners.
    pub fn add_face_from_vertices(&mut self, corners: &[VertexId]) -> Result<FaceId, TopologyError> {
        if corners.len() < 3 {
            return Err(TopologyError::InvalidTopology(format!(
                "face needs at least 3 corners, got {}",
                corners.len()
            )));
        }
        for (i, &v) in corners.iter().enumerate() {
            self.vertex(v)?;
            if corners[..i].contains(&v) {
                return Err(TopologyError::InvalidTopology("face repeats a corner".into()));
            }
        }
        let n = corners.len();
        let mut cycle: SmallVec<[OrientedEdge; 4]> = SmallVec::with_capacity(n);
        for i in 0..n {
            let (a, b) = (corners[i], corners[(i + 1) % n]);
            let oe = match self.find_edge(a, b) {
                Some(e) => {
                    let forward = self.edge(e)?.vertices[0] == a;
                    OrientedEdge::new(e, forward)
                }
                None => OrientedEdge::new(self.add_edge(a, b, EdgeTag::Unset)?, true),
            };
            cycle.push(oe);
        }
        self.add_face(&cycle)
    }

    // --- Deallocation ---

    /// Removes a face, detaching it from its edges and corner vertices.
    ///
    /// # Errors
    ///
    /// Returns an error if the face is not in this level.
    pub fn remove_face(&mut self, face: FaceId) -> Result<(), TopologyError> {
        let edges: SmallVec<[OrientedEdge; 4]> = self.face(face)?.edges.clone();
        let touched = self.neighborhood(&[ComponentKey::Face(face)]);

        let mut corners: SmallVec<[VertexId; 8]> = SmallVec::new();
        for oe in &edges {
            if let Some(e) = self.edges.get_mut(oe.edge) {
                e.faces.retain(|of| of.face != face);
                corners.extend_from_slice(&e.vertices);
            }
        }
        for v in corners {
            if let Some(vd) = self.vertices.get_mut(v) {
                vd.faces.retain(|f| *f != face);
            }
        }
        if let Some(data) = self.faces.remove(face) {
            self.face_ids.remove(&data.id);
        }
        self.finish_change(touched);
        Ok(())
    }

    /// Removes an edge that no face uses, detaching it from its vertices.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::StillReferenced`] if a face still uses the edge.
    pub fn remove_edge(&mut self, edge: EdgeId) -> Result<(), TopologyError> {
        let data = self.edge(edge)?;
        if !data.faces.is_empty() {
            return Err(TopologyError::StillReferenced {
                kind: "edge",
                id: data.id,
                count: data.faces.len(),
            });
        }
        let ends = data.vertices;
        let touched = self.neighborhood(&[ComponentKey::Edge(edge)]);
        for v in ends {
            if let Some(vd) = self.vertices.get_mut(v) {
                vd.edges.retain(|oe| oe.edge != edge);
            }
        }
        if let Some(data) = self.edges.remove(edge) {
            self.edge_ids.remove(&data.id);
        }
        self.finish_change(touched);
        Ok(())
    }

    /// Removes a vertex that has no incident edges or faces.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::StillReferenced`] if the vertex is still in use.
    pub fn remove_vertex(&mut self, vertex: VertexId) -> Result<(), TopologyError> {
        let data = self.vertex(vertex)?;
        let count = data.edges.len() + data.faces.len();
        if count > 0 {
            return Err(TopologyError::StillReferenced {
                kind: "vertex",
                id: data.id,
                count,
            });
        }
        if let Some(data) = self.vertices.remove(vertex) {
            self.vertex_ids.remove(&data.id);
        }
        self.revision += 1;
        Ok(())
    }

    // --- Rewiring ---

    /// Moves end `end` of `edge` from its current vertex to `vertex`.
    ///
    /// Faces using the edge are not touched; their corner incidences are
    /// refreshed from the edge starts, so callers rewire the face cycles
    /// right after.
    pub(crate) fn set_edge_vertex(&mut self, edge: EdgeId, end: usize, vertex: VertexId) -> Result<(), TopologyError> {
        let end = end & 1;
        let data = self.edge(edge)?;
        let old = data.vertices[end];
        if old == vertex {
            return Ok(());
        }
        if data.vertices[1 - end] == vertex {
            return Err(TopologyError::InvalidTopology(
                "edge endpoints must be distinct".into(),
            ));
        }
        self.vertex(vertex)?;
        let faces: SmallVec<[FaceId; 2]> = data.faces.iter().map(|of| of.face).collect();

        let mut touched = self.neighborhood(&[ComponentKey::Vertex(old), ComponentKey::Edge(edge)]);
        if let Some(vd) = self.vertices.get_mut(old) {
            vd.edges.retain(|oe| oe.edge != edge);
        }
        if let Some(vd) = self.vertices.get_mut(vertex) {
            vd.edges.push(OrientedEdge::new(edge, end == 0));
        }
        if let Some(ed) = self.edges.get_mut(edge) {
            ed.vertices[end] = vertex;
        }
        for f in faces {
            self.sync_face_vertices(f, &[old]);
        }
        touched.merge(self.neighborhood(&[ComponentKey::Vertex(vertex), ComponentKey::Edge(edge)]));
        self.finish_change(touched);
        Ok(())
    }

    /// Replaces the whole edge cycle of `face`.
    ///
    /// Edge-face and vertex-face incidences are updated on both sides.
    ///
    /// # Errors
    ///
    /// Returns an error if the new cycle is not a valid closed face boundary.
    pub(crate) fn set_face_edges(&mut self, face: FaceId, edges: &[OrientedEdge]) -> Result<(), TopologyError> {
        self.check_face_cycle(edges)?;
        let old: SmallVec<[OrientedEdge; 4]> = self.face(face)?.edges.clone();

        let mut seeds: SmallVec<[ComponentKey; 16]> = SmallVec::new();
        seeds.push(ComponentKey::Face(face));
        let mut candidates: SmallVec<[VertexId; 16]> = SmallVec::new();
        for oe in old.iter().chain(edges) {
            if let Ok(e) = self.edge(oe.edge) {
                candidates.extend_from_slice(&e.vertices);
            }
        }
        seeds.extend(candidates.iter().map(|&v| ComponentKey::Vertex(v)));
        let mut touched = self.neighborhood(&seeds);

        for oe in &old {
            if !edges.iter().any(|n| n.edge == oe.edge) {
                if let Some(e) = self.edges.get_mut(oe.edge) {
                    e.faces.retain(|of| of.face != face);
                }
            }
        }
        for oe in edges {
            if let Some(e) = self.edges.get_mut(oe.edge) {
                match e.faces.iter_mut().find(|of| of.face == face) {
                    Some(of) => of.forward = oe.forward,
                    None => e.faces.push(OrientedFace::new(face, oe.forward)),
                }
            }
        }
        if let Some(fd) = self.faces.get_mut(face) {
            fd.edges.clear();
            fd.edges.extend_from_slice(edges);
        }
        self.sync_face_vertices(face, &candidates);
        touched.merge(self.neighborhood(&[ComponentKey::Face(face)]));
        self.finish_change(touched);
        Ok(())
    }

    /// Makes vertex-face incidences of `face` match its current corners.
    ///
    /// `stale` lists vertices that may still reference the face without
    /// being corners anymore.
    fn sync_face_vertices(&mut self, face: FaceId, stale: &[VertexId]) {
        let corners = self.face_corner_starts(face);
        for &v in stale {
            if !corners.contains(&v) {
                if let Some(vd) = self.vertices.get_mut(v) {
                    vd.faces.retain(|f| *f != face);
                }
            }
        }
        for &v in &corners {
            if let Some(vd) = self.vertices.get_mut(v) {
                if !vd.faces.contains(&face) {
                    vd.faces.push(face);
                }
            }
        }
    }

    /// Start vertex of each oriented edge of `face`, in cycle order.
    fn face_corner_starts(&self, face: FaceId) -> SmallVec<[VertexId; 4]> {
        let Some(fd) = self.faces.get(face) else {
            return SmallVec::new();
        };
        fd.edges
            .iter()
            .filter_map(|oe| self.edges.get(oe.edge).map(|e| e.vertices[oe.start_end()]))
            .collect()
    }

    /// Validates an oriented edge cycle as a face boundary.
    pub(crate) fn check_face_cycle(&self, edges: &[OrientedEdge]) -> Result<(), TopologyError> {
        let n = edges.len();
        if n < 3 {
            return Err(TopologyError::InvalidTopology(format!(
                "face needs at least 3 edges, got {n}"
            )));
        }
        let mut corners: SmallVec<[VertexId; 8]> = SmallVec::with_capacity(n);
        for (i, oe) in edges.iter().enumerate() {
            if edges[..i].iter().any(|prev| prev.edge == oe.edge) {
                return Err(TopologyError::InvalidTopology("face repeats an edge".into()));
            }
            let e = self.edge(oe.edge)?;
            let start = e.vertices[oe.start_end()];
            if corners.contains(&start) {
                return Err(TopologyError::InvalidTopology("face repeats a corner".into()));
            }
            corners.push(start);
        }
        for i in 0..n {
            let e = self.edge(edges[i].edge)?;
            let end = e.vertices[1 - edges[i].start_end()];
            if end != corners[(i + 1) % n] {
                return Err(TopologyError::InvalidTopology(
                    "face edge cycle is not closed".into(),
                ));
            }
        }
        Ok(())
    }
}
