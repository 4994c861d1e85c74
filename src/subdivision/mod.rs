//! The subdivision engine.
//!
//! Stencils are evaluated lazily through the per-component caches, so a
//! global step reads face points, then edge points, then vertex points, and
//! then assembles the next level from them. Both Catmull–Clark and
//! Loop–Warren share the same pipeline; only the stencils and the face split
//! differ.

mod fixup;
mod points;
mod refine;
mod subdivide;

pub use fixup::SECTOR_FIXUP_ITERATION_CAP;
pub use points::loop_beta;
pub use refine::{child_face_count, projected_face_count};
pub use subdivide::Subdivide;
