use std::f64::consts::PI;

use crate::error::SectorError;
use crate::topology::{SectorCoefficient, SubdivisionScheme, VertexTag};

use super::weight;

/// Validated description of the sector at a vertex: scheme, vertex tag,
/// face count and, for corners, the corner angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectorType {
    scheme: SubdivisionScheme,
    tag: VertexTag,
    face_count: usize,
    corner_angle: f64,
}

impl SectorType {
    /// Describes a smooth, crease or dart sector.
    ///
    /// # Errors
    ///
    /// Returns an error for unset tags, corner tags (use
    /// [`SectorType::corner`]) and out-of-range face counts.
    pub fn new(scheme: SubdivisionScheme, tag: VertexTag, face_count: usize) -> Result<Self, SectorError> {
        if tag == VertexTag::Corner {
            return Err(crate::diagnostics::invalid_sector(SectorError::InvalidTag(
                "corner without an angle",
            )));
        }
        weight::check_face_count(tag, face_count)?;
        Ok(Self {
            scheme,
            tag,
            face_count,
            corner_angle: 0.0,
        })
    }

    /// Describes a corner sector spanning `corner_angle` radians.
    ///
    /// # Errors
    ///
    /// Returns an error for out-of-range face counts or a non-finite angle.
    pub fn corner(scheme: SubdivisionScheme, face_count: usize, corner_angle: f64) -> Result<Self, SectorError> {
        weight::check_face_count(VertexTag::Corner, face_count)?;
        let corner_angle = weight::clamp_corner_angle(corner_angle)?;
        Ok(Self {
            scheme,
            tag: VertexTag::Corner,
            face_count,
            corner_angle,
        })
    }

    #[must_use]
    pub fn scheme(&self) -> SubdivisionScheme {
        self.scheme
    }

    #[must_use]
    pub fn tag(&self) -> VertexTag {
        self.tag
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.face_count
    }

    /// Edges bounding or inside the sector.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        match self.tag {
            VertexTag::Crease | VertexTag::Corner => self.face_count + 1,
            _ => self.face_count,
        }
    }

    /// Clamped corner angle; zero for other tags.
    #[must_use]
    pub fn corner_angle(&self) -> f64 {
        self.corner_angle
    }

    /// The sector angle θ the coefficient is derived from. Smooth sectors
    /// have no angle and return zero.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn theta(&self) -> f64 {
        let f = self.face_count as f64;
        match self.tag {
            VertexTag::Crease => PI / f,
            VertexTag::Dart => 2.0 * PI / f,
            VertexTag::Corner => self.corner_angle / f,
            VertexTag::Smooth | VertexTag::Unset => 0.0,
        }
    }

    /// Returns `true` for the scheme's ordinary smooth or crease sector.
    #[must_use]
    pub fn is_ordinary(&self) -> bool {
        match self.tag {
            VertexTag::Smooth => self.face_count == self.scheme.ordinary_vertex_valence(),
            VertexTag::Crease => self.face_count == self.scheme.ordinary_crease_face_count(),
            _ => false,
        }
    }

    /// The coefficient stored on a smooth edge end at this sector's vertex.
    #[must_use]
    pub fn sector_coefficient(&self) -> SectorCoefficient {
        if self.tag == VertexTag::Smooth {
            return SectorCoefficient::Ignored;
        }
        if self.tag == VertexTag::Crease && self.is_ordinary() {
            return SectorCoefficient::Value(0.5);
        }
        SectorCoefficient::Value(weight::coefficient_from_theta(self.scheme, self.theta()))
    }
}
