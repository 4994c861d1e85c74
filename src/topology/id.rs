use std::fmt;

use crate::error::TopologyError;

slotmap::new_key_type! {
    /// Handle of a vertex inside one level's arena.
    pub struct VertexId;
}

slotmap::new_key_type! {
    /// Handle of an edge inside one level's arena.
    pub struct EdgeId;
}

slotmap::new_key_type! {
    /// Handle of a face inside one level's arena.
    pub struct FaceId;
}

/// The three kinds of subdivision components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentKind {
    Vertex,
    Edge,
    Face,
}

impl ComponentKind {
    /// Lower-case name used in messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Edge => "edge",
            Self::Face => "face",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Level-independent address of a component: its kind and persistent id.
///
/// Persistent ids are unique across every level of a [`crate::Subd`], so a
/// `ComponentRef` can be retained by callers (selection sets, history) and
/// resolved later for as long as the owning level survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentRef {
    pub kind: ComponentKind,
    pub id: u32,
}

impl ComponentRef {
    #[must_use]
    pub fn vertex(id: u32) -> Self {
        Self {
            kind: ComponentKind::Vertex,
            id,
        }
    }

    #[must_use]
    pub fn edge(id: u32) -> Self {
        Self {
            kind: ComponentKind::Edge,
            id,
        }
    }

    #[must_use]
    pub fn face(id: u32) -> Self {
        Self {
            kind: ComponentKind::Face,
            id,
        }
    }
}

impl fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// An arena handle of any component kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKey {
    Vertex(VertexId),
    Edge(EdgeId),
    Face(FaceId),
}

impl ComponentKey {
    #[must_use]
    pub fn kind(self) -> ComponentKind {
        match self {
            Self::Vertex(_) => ComponentKind::Vertex,
            Self::Edge(_) => ComponentKind::Edge,
            Self::Face(_) => ComponentKind::Face,
        }
    }
}

/// Issues persistent component ids.
///
/// Ids start at 1 and increase monotonically per kind. An id is never handed
/// out twice unless the allocator is explicitly reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdAllocator {
    max_vertex_id: u32,
    max_edge_id: u32,
    max_face_id: u32,
}

impl IdAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Largest id issued so far for `kind` (0 if none).
    #[must_use]
    pub fn max_id(&self, kind: ComponentKind) -> u32 {
        match kind {
            ComponentKind::Vertex => self.max_vertex_id,
            ComponentKind::Edge => self.max_edge_id,
            ComponentKind::Face => self.max_face_id,
        }
    }

    /// Issues the next id for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::IdSpaceExhausted`] once `u32::MAX` has been issued.
    pub fn next(&mut self, kind: ComponentKind) -> Result<u32, TopologyError> {
        let slot = self.slot_mut(kind);
        let next = slot
            .checked_add(1)
            .ok_or(TopologyError::IdSpaceExhausted(kind.name()))?;
        *slot = next;
        Ok(next)
    }

    /// Records that `id` is in use, so it will never be issued again.
    pub fn reserve(&mut self, kind: ComponentKind, id: u32) {
        let slot = self.slot_mut(kind);
        *slot = (*slot).max(id);
    }

    /// Folds another allocator's high-water marks into this one.
    pub fn absorb(&mut self, other: &IdAllocator) {
        self.max_vertex_id = self.max_vertex_id.max(other.max_vertex_id);
        self.max_edge_id = self.max_edge_id.max(other.max_edge_id);
        self.max_face_id = self.max_face_id.max(other.max_face_id);
    }

    /// Forgets every issued id.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn slot_mut(&mut self, kind: ComponentKind) -> &mut u32 {
        match kind {
            ComponentKind::Vertex => &mut self.max_vertex_id,
            ComponentKind::Edge => &mut self.max_edge_id,
            ComponentKind::Face => &mut self.max_face_id,
        }
    }
}
