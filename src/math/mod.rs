mod aabb;

pub use aabb::Aabb;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 4x4 transformation matrix.
pub type Matrix4 = nalgebra::Matrix4<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Transforms a point by a 4x4 matrix (homogeneous coordinates).
///
/// A projective row is honored: the result is divided by `w` unless `w` is zero.
#[must_use]
pub fn transform_point(matrix: &Matrix4, point: &Point3) -> Point3 {
    let v = matrix * nalgebra::Vector4::new(point.x, point.y, point.z, 1.0);
    if v.w == 0.0 || v.w == 1.0 {
        Point3::new(v.x, v.y, v.z)
    } else {
        Point3::new(v.x / v.w, v.y / v.w, v.z / v.w)
    }
}

/// Returns `true` if every coordinate of the point is finite.
#[must_use]
pub fn is_finite_point(point: &Point3) -> bool {
    point.x.is_finite() && point.y.is_finite() && point.z.is_finite()
}

/// Average of a non-empty set of points. Returns `None` for an empty input.
#[must_use]
pub fn centroid<'a, I>(points: I) -> Option<Point3>
where
    I: IntoIterator<Item = &'a Point3>,
{
    let mut sum = Vector3::zeros();
    let mut count = 0usize;
    for p in points {
        sum += p.coords;
        count += 1;
    }
    if count == 0 {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = count as f64;
    Some(Point3::from(sum / n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn translate_point() {
        let m = Matrix4::new_translation(&Vector3::new(1.0, 2.0, 3.0));
        let p = transform_point(&m, &Point3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(p, Point3::new(2.0, 3.0, 4.0));
    }

    #[test]
    fn centroid_of_square() {
        let pts = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ];
        assert_eq!(centroid(&pts), Some(Point3::new(1.0, 1.0, 0.0)));
        assert_eq!(centroid(std::iter::empty::<&Point3>()), None);
    }
}
