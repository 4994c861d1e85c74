//! Closed-form sector coefficients.
//!
//! The coefficient of a tagged edge end depends only on the sector angle
//! θ. For a crease sector with `F` faces θ = π/F, for a dart θ = 2π/F and for
//! a corner θ = α/F where α is the geometric corner angle of the sector.

use std::f64::consts::PI;

use crate::diagnostics;
use crate::error::SectorError;
use crate::topology::{SubdivisionScheme, VertexTag};

/// Largest face count a single sector may have.
pub const MAXIMUM_SECTOR_FACE_COUNT: usize = 65_533;

/// Smallest corner sector angle, in radians (2 degrees).
pub const MINIMUM_CORNER_ANGLE: f64 = 2.0 * PI / 180.0;

/// Largest corner sector angle, in radians (358 degrees).
pub const MAXIMUM_CORNER_ANGLE: f64 = 2.0 * PI - MINIMUM_CORNER_ANGLE;

const COS_SNAP_TOLERANCE: f64 = 1e-12;

/// Cosine of `theta` with the values 0, ±1/2 and ±1 returned exactly.
#[must_use]
pub fn snapped_cos(theta: f64) -> f64 {
    let c = theta.cos();
    for exact in [0.0, 0.5, -0.5, 1.0, -1.0] {
        if (c - exact).abs() <= COS_SNAP_TOLERANCE {
            return exact;
        }
    }
    c
}

/// Coefficient of the tagged end for a sector angle `theta`.
///
/// Catmull–Clark uses `1/2 + cos(θ)/3` and Loop–Warren `1/3 + cos(θ)/3`. The
/// sums are evaluated as `(3 + 2c)/6` and `(1 + c)/3` so the ordinary crease
/// sectors give exactly 1/2.
#[must_use]
pub fn coefficient_from_theta(scheme: SubdivisionScheme, theta: f64) -> f64 {
    let c = snapped_cos(theta);
    match scheme {
        SubdivisionScheme::CatmullClark => (3.0 + 2.0 * c) / 6.0,
        SubdivisionScheme::LoopWarren => (1.0 + c) / 3.0,
    }
}

/// Checks a sector face count for a vertex tag.
///
/// # Errors
///
/// Returns [`SectorError::InvalidTag`] for unset vertices and
/// [`SectorError::FaceCountOutOfRange`] when the count is below the tag's
/// minimum or above [`MAXIMUM_SECTOR_FACE_COUNT`]. Each rejection is counted
/// as invalid input.
pub fn check_face_count(tag: VertexTag, face_count: usize) -> Result<(), SectorError> {
    let minimum = match tag {
        VertexTag::Unset => {
            return Err(diagnostics::invalid_sector(SectorError::InvalidTag(tag.name())));
        }
        VertexTag::Smooth | VertexTag::Dart => 2,
        VertexTag::Crease | VertexTag::Corner => 1,
    };
    if face_count < minimum || face_count > MAXIMUM_SECTOR_FACE_COUNT {
        return Err(diagnostics::invalid_sector(SectorError::FaceCountOutOfRange(face_count)));
    }
    Ok(())
}

/// Number of edges bounding a sector with `face_count` faces.
///
/// Crease and corner sectors are open fans with one more edge than faces;
/// smooth and dart sectors close up.
///
/// # Errors
///
/// Returns an error for unset tags and out-of-range counts.
pub fn edge_count_from_face_count(tag: VertexTag, face_count: usize) -> Result<usize, SectorError> {
    check_face_count(tag, face_count)?;
    Ok(match tag {
        VertexTag::Crease | VertexTag::Corner => face_count + 1,
        _ => face_count,
    })
}

/// Number of faces in a sector bounded by `edge_count` edges.
///
/// # Errors
///
/// Returns an error for unset tags and out-of-range counts.
pub fn face_count_from_edge_count(tag: VertexTag, edge_count: usize) -> Result<usize, SectorError> {
    let face_count = match tag {
        VertexTag::Crease | VertexTag::Corner => {
            if edge_count < 2 {
                return Err(diagnostics::invalid_sector(SectorError::EdgeCountOutOfRange(edge_count)));
            }
            edge_count - 1
        }
        _ => edge_count,
    };
    check_face_count(tag, face_count).map_err(|err| match err {
        SectorError::FaceCountOutOfRange(_) => SectorError::EdgeCountOutOfRange(edge_count),
        other => other,
    })?;
    Ok(face_count)
}

/// Coefficient of a crease sector with `face_count` faces.
///
/// # Errors
///
/// Returns an error if the count is out of range.
pub fn crease_sector_coefficient(scheme: SubdivisionScheme, face_count: usize) -> Result<f64, SectorError> {
    check_face_count(VertexTag::Crease, face_count)?;
    if face_count == scheme.ordinary_crease_face_count() {
        return Ok(0.5);
    }
    Ok(coefficient_from_theta(scheme, PI / count_f64(face_count)))
}

/// Coefficient of a dart sector with `face_count` faces.
///
/// # Errors
///
/// Returns an error if the count is out of range.
pub fn dart_sector_coefficient(scheme: SubdivisionScheme, face_count: usize) -> Result<f64, SectorError> {
    check_face_count(VertexTag::Dart, face_count)?;
    Ok(coefficient_from_theta(scheme, 2.0 * PI / count_f64(face_count)))
}

/// Coefficient of a corner sector with `face_count` faces spanning
/// `corner_angle` radians. The angle is clamped to
/// [[`MINIMUM_CORNER_ANGLE`], [`MAXIMUM_CORNER_ANGLE`]].
///
/// # Errors
///
/// Returns an error if the count is out of range or the angle is not finite.
pub fn corner_sector_coefficient(
    scheme: SubdivisionScheme,
    face_count: usize,
    corner_angle: f64,
) -> Result<f64, SectorError> {
    check_face_count(VertexTag::Corner, face_count)?;
    let alpha = clamp_corner_angle(corner_angle)?;
    Ok(coefficient_from_theta(scheme, alpha / count_f64(face_count)))
}

/// Clamps a corner sector angle to the supported range.
///
/// # Errors
///
/// Returns [`SectorError::InvalidCornerAngle`] for NaN or infinite angles.
pub fn clamp_corner_angle(corner_angle: f64) -> Result<f64, SectorError> {
    if !corner_angle.is_finite() {
        return Err(diagnostics::invalid_sector(SectorError::InvalidCornerAngle(corner_angle)));
    }
    Ok(corner_angle.clamp(MINIMUM_CORNER_ANGLE, MAXIMUM_CORNER_ANGLE))
}

#[allow(clippy::cast_precision_loss)]
fn count_f64(count: usize) -> f64 {
    count as f64
}
