use super::Point3;

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
}

impl Aabb {
    /// A box containing a single point.
    #[must_use]
    pub fn from_point(p: Point3) -> Self {
        Self { min: p, max: p }
    }

    /// Smallest box containing all points, or `None` for an empty input.
    #[must_use]
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = Self::from_point(*first);
        for p in iter {
            bbox.grow(p);
        }
        Some(bbox)
    }

    /// Extends the box to contain `p`.
    pub fn grow(&mut self, p: &Point3) {
        self.min = Point3::new(self.min.x.min(p.x), self.min.y.min(p.y), self.min.z.min(p.z));
        self.max = Point3::new(self.max.x.max(p.x), self.max.y.max(p.y), self.max.z.max(p.z));
    }

    /// Length of the box diagonal.
    #[must_use]
    pub fn diagonal_length(&self) -> f64 {
        (self.max - self.min).norm()
    }

    /// Returns `true` if `p` lies inside or on the box.
    #[must_use]
    pub fn contains(&self, p: &Point3) -> bool {
        (self.min.x..=self.max.x).contains(&p.x)
            && (self.min.y..=self.max.y).contains(&p.y)
            && (self.min.z..=self.max.z).contains(&p.z)
    }
}
