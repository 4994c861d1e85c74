//! Topology arena of one subdivision level.
//!
//! A [`SubdLevel`] owns every vertex, edge and face at one subdivision depth.
//! Components refer to their neighbors through arena keys, so local traversal
//! is O(1) and there are no owning cycles. Each component also carries a
//! persistent `u32` id that survives arena compaction and is used for
//! external addressing and archiving.

mod aggregates;
pub mod cache;
pub mod edge;
pub mod face;
pub mod id;
mod incidence;
mod notify;
pub mod oriented;
mod query;
mod retag;
pub mod status;
pub mod tag;
pub mod vertex;

pub use aggregates::LevelAggregates;
pub use cache::{PointCache, SectorCoefficient};
pub use edge::EdgeData;
pub use face::FaceData;
pub use id::{ComponentKey, ComponentKind, ComponentRef, EdgeId, FaceId, IdAllocator, VertexId};
pub use oriented::{OrientedEdge, OrientedFace};
pub use status::ComponentStatus;
pub use tag::{EdgeTag, SubdivisionScheme, VertexTag};
pub use vertex::VertexData;

use std::collections::HashMap;

use slotmap::SlotMap;

use crate::error::TopologyError;

/// All components of one subdivision depth.
#[derive(Debug, Clone, Default)]
pub struct SubdLevel {
    index: u16,
    scheme: SubdivisionScheme,
    vertices: SlotMap<VertexId, VertexData>,
    edges: SlotMap<EdgeId, EdgeData>,
    faces: SlotMap<FaceId, FaceData>,
    vertex_ids: HashMap<u32, VertexId>,
    edge_ids: HashMap<u32, EdgeId>,
    face_ids: HashMap<u32, FaceId>,
    ids: IdAllocator,
    revision: u64,
}

impl SubdLevel {
    /// Creates a new, empty level.
    #[must_use]
    pub fn new(index: u16, scheme: SubdivisionScheme) -> Self {
        Self {
            index,
            scheme,
            ..Self::default()
        }
    }

    /// Creates an empty level that continues issuing ids after `ids`.
    #[must_use]
    pub(crate) fn with_allocator(index: u16, scheme: SubdivisionScheme, ids: IdAllocator) -> Self {
        Self {
            index,
            scheme,
            ids,
            ..Self::default()
        }
    }

    /// Subdivision depth of this level.
    #[must_use]
    pub fn index(&self) -> u16 {
        self.index
    }

    pub(crate) fn set_index(&mut self, index: u16) {
        if self.index == index {
            return;
        }
        self.index = index;
        for v in self.vertices.values_mut() {
            v.level = index;
        }
        for e in self.edges.values_mut() {
            e.level = index;
        }
        for f in self.faces.values_mut() {
            f.level = index;
        }
    }

    #[must_use]
    pub fn scheme(&self) -> SubdivisionScheme {
        self.scheme
    }

    /// The id allocator of this level.
    #[must_use]
    pub fn id_allocator(&self) -> &IdAllocator {
        &self.ids
    }

    pub(crate) fn id_allocator_mut(&mut self) -> &mut IdAllocator {
        &mut self.ids
    }

    /// Number of structural changes applied to this level.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Returns `true` if the level has no components at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.edges.is_empty() && self.faces.is_empty()
    }

    // --- Vertex access ---

    /// Returns a reference to the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the level.
    pub fn vertex(&self, id: VertexId) -> Result<&VertexData, TopologyError> {
        self.vertices
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))
    }

    pub(crate) fn vertex_mut(&mut self, id: VertexId) -> Result<&mut VertexData, TopologyError> {
        self.vertices
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))
    }

    #[must_use]
    pub fn contains_vertex(&self, id: VertexId) -> bool {
        self.vertices.contains_key(id)
    }

    /// Looks up a vertex by persistent id.
    #[must_use]
    pub fn vertex_by_id(&self, id: u32) -> Option<VertexId> {
        self.vertex_ids.get(&id).copied()
    }

    // --- Edge access ---

    /// Returns a reference to the edge data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the level.
    pub fn edge(&self, id: EdgeId) -> Result<&EdgeData, TopologyError> {
        self.edges
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("edge".into()))
    }

    pub(crate) fn edge_mut(&mut self, id: EdgeId) -> Result<&mut EdgeData, TopologyError> {
        self.edges
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("edge".into()))
    }

    #[must_use]
    pub fn contains_edge(&self, id: EdgeId) -> bool {
        self.edges.contains_key(id)
    }

    /// Looks up an edge by persistent id.
    #[must_use]
    pub fn edge_by_id(&self, id: u32) -> Option<EdgeId> {
        self.edge_ids.get(&id).copied()
    }

    // --- Face access ---

    /// Returns a reference to the face data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the level.
    pub fn face(&self, id: FaceId) -> Result<&FaceData, TopologyError> {
        self.faces
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("face".into()))
    }

    pub(crate) fn face_mut(&mut self, id: FaceId) -> Result<&mut FaceData, TopologyError> {
        self.faces
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("face".into()))
    }

    #[must_use]
    pub fn contains_face(&self, id: FaceId) -> bool {
        self.faces.contains_key(id)
    }

    /// Looks up a face by persistent id.
    #[must_use]
    pub fn face_by_id(&self, id: u32) -> Option<FaceId> {
        self.face_ids.get(&id).copied()
    }

    // --- Addressing ---

    /// Resolves a level-independent reference against this level.
    #[must_use]
    pub fn resolve(&self, component: ComponentRef) -> Option<ComponentKey> {
        match component.kind {
            ComponentKind::Vertex => self.vertex_by_id(component.id).map(ComponentKey::Vertex),
            ComponentKind::Edge => self.edge_by_id(component.id).map(ComponentKey::Edge),
            ComponentKind::Face => self.face_by_id(component.id).map(ComponentKey::Face),
        }
    }

    /// The level-independent reference of an arena key.
    #[must_use]
    pub fn component_ref(&self, key: ComponentKey) -> Option<ComponentRef> {
        match key {
            ComponentKey::Vertex(v) => self.vertices.get(v).map(|d| ComponentRef::vertex(d.id)),
            ComponentKey::Edge(e) => self.edges.get(e).map(|d| ComponentRef::edge(d.id)),
            ComponentKey::Face(f) => self.faces.get(f).map(|d| ComponentRef::face(d.id)),
        }
    }

    // --- Status ---

    /// Status bits of any component.
    #[must_use]
    pub fn status(&self, key: ComponentKey) -> Option<ComponentStatus> {
        match key {
            ComponentKey::Vertex(v) => self.vertices.get(v).map(|d| d.status),
            ComponentKey::Edge(e) => self.edges.get(e).map(|d| d.status),
            ComponentKey::Face(f) => self.faces.get(f).map(|d| d.status),
        }
    }

    /// Replaces the status bits of a component. Status is not topology, so no
    /// caches are invalidated.
    ///
    /// # Errors
    ///
    /// Returns an error if the component is not in this level.
    pub fn set_status(&mut self, key: ComponentKey, status: ComponentStatus) -> Result<(), TopologyError> {
        match key {
            ComponentKey::Vertex(v) => self.vertex_mut(v)?.status = status,
            ComponentKey::Edge(e) => self.edge_mut(e)?.status = status,
            ComponentKey::Face(f) => self.face_mut(f)?.status = status,
        }
        Ok(())
    }

    /// Sets `flags` on a component, keeping its other bits.
    ///
    /// # Errors
    ///
    /// Returns an error if the component is not in this level.
    pub fn insert_status(&mut self, key: ComponentKey, flags: ComponentStatus) -> Result<(), TopologyError> {
        let status = self
            .status(key)
            .ok_or_else(|| TopologyError::EntityNotFound(key.kind().name().into()))?;
        self.set_status(key, status | flags)
    }

    /// Clears `flags` on every component of the level.
    pub fn clear_status_everywhere(&mut self, flags: ComponentStatus) {
        for v in self.vertices.values_mut() {
            v.status.remove(flags);
        }
        for e in self.edges.values_mut() {
            e.status.remove(flags);
        }
        for f in self.faces.values_mut() {
            f.status.remove(flags);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;

    #[test]
    fn empty_level_reads_are_benign() {
        let level = SubdLevel::new(0, SubdivisionScheme::CatmullClark);
        assert!(level.is_empty());
        assert_eq!(level.vertex_count(), 0);
        assert_eq!(level.edge_count(), 0);
        assert_eq!(level.face_count(), 0);
        assert_eq!(level.vertex_by_id(1), None);
        assert_eq!(level.resolve(ComponentRef::face(3)), None);
    }

    #[test]
    fn status_round_trip() {
        let mut level = SubdLevel::new(0, SubdivisionScheme::CatmullClark);
        let v = level.add_vertex(Point3::origin(), VertexTag::Smooth).unwrap();
        let key = ComponentKey::Vertex(v);
        level.insert_status(key, ComponentStatus::SELECTED).unwrap();
        level.insert_status(key, ComponentStatus::MARKED).unwrap();
        assert_eq!(
            level.status(key),
            Some(ComponentStatus::SELECTED | ComponentStatus::MARKED)
        );
        level.clear_status_everywhere(ComponentStatus::MARKED);
        assert_eq!(level.status(key), Some(ComponentStatus::SELECTED));
    }

    #[test]
    fn resolve_by_persistent_id() {
        let mut level = SubdLevel::new(0, SubdivisionScheme::CatmullClark);
        let v = level.add_vertex(Point3::origin(), VertexTag::Smooth).unwrap();
        let id = level.vertex(v).unwrap().id();
        assert_eq!(level.resolve(ComponentRef::vertex(id)), Some(ComponentKey::Vertex(v)));
        assert_eq!(
            level.component_ref(ComponentKey::Vertex(v)),
            Some(ComponentRef::vertex(id))
        );
    }
}
