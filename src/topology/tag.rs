use std::fmt;

/// Classification of a vertex selecting its subdivision stencil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VertexTag {
    /// Not yet classified. Never valid in a finished level.
    #[default]
    Unset,
    /// Interior vertex with no incident crease edges.
    Smooth,
    /// Vertex on a crease line: exactly two incident crease edges.
    Crease,
    /// Vertex that stays fixed under subdivision.
    Corner,
    /// Interior vertex where a crease line ends: exactly one incident crease edge.
    Dart,
}

impl VertexTag {
    /// Returns `true` for Crease, Corner and Dart.
    ///
    /// Smooth edges touching a tagged vertex use a sector coefficient at that end.
    #[must_use]
    pub fn is_tagged(self) -> bool {
        matches!(self, Self::Crease | Self::Corner | Self::Dart)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Smooth => "smooth",
            Self::Crease => "crease",
            Self::Corner => "corner",
            Self::Dart => "dart",
        }
    }

    pub(crate) fn to_u8(self) -> u8 {
        match self {
            Self::Unset => 0,
            Self::Smooth => 1,
            Self::Crease => 2,
            Self::Corner => 3,
            Self::Dart => 4,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::Unset,
            1 => Self::Smooth,
            2 => Self::Crease,
            3 => Self::Corner,
            4 => Self::Dart,
            _ => return None,
        })
    }
}

impl fmt::Display for VertexTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classification of an edge selecting its subdivision stencil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EdgeTag {
    /// Not yet classified. Never valid in a finished level.
    #[default]
    Unset,
    /// Edge with two faces subdivided with the smooth rule.
    Smooth,
    /// Edge subdivided with the crease (midpoint) rule. Every edge whose face
    /// count is not two is a crease.
    Crease,
    /// Semi-sharp smooth edge. Blends between the smooth and crease rules by
    /// its sharpness, which decreases by one per level.
    Sharp,
    /// Smooth edge whose ends are both tagged vertices. Its children are plain
    /// smooth edges with a single tagged end.
    SmoothX,
}

impl EdgeTag {
    /// Smooth-family edges (Smooth, Sharp, `SmoothX`) have exactly two faces.
    #[must_use]
    pub fn is_smooth(self) -> bool {
        matches!(self, Self::Smooth | Self::Sharp | Self::SmoothX)
    }

    #[must_use]
    pub fn is_crease(self) -> bool {
        self == Self::Crease
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Smooth => "smooth",
            Self::Crease => "crease",
            Self::Sharp => "sharp",
            Self::SmoothX => "smooth-x",
        }
    }

    pub(crate) fn to_u8(self) -> u8 {
        match self {
            Self::Unset => 0,
            Self::Smooth => 1,
            Self::Crease => 2,
            Self::Sharp => 3,
            Self::SmoothX => 4,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::Unset,
            1 => Self::Smooth,
            2 => Self::Crease,
            3 => Self::Sharp,
            4 => Self::SmoothX,
            _ => return None,
        })
    }
}

impl fmt::Display for EdgeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The supported subdivision schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SubdivisionScheme {
    /// Catmull–Clark, for quad-dominant meshes.
    #[default]
    CatmullClark,
    /// Loop subdivision with Warren's vertex weights, for triangle-dominant meshes.
    LoopWarren,
}

impl SubdivisionScheme {
    /// Valence of an ordinary interior vertex.
    #[must_use]
    pub fn ordinary_vertex_valence(self) -> usize {
        match self {
            Self::CatmullClark => 4,
            Self::LoopWarren => 6,
        }
    }

    /// Edge count of an ordinary face.
    #[must_use]
    pub fn ordinary_face_edge_count(self) -> usize {
        match self {
            Self::CatmullClark => 4,
            Self::LoopWarren => 3,
        }
    }

    /// Face count of an ordinary boundary crease sector.
    #[must_use]
    pub fn ordinary_crease_face_count(self) -> usize {
        match self {
            Self::CatmullClark => 2,
            Self::LoopWarren => 3,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::CatmullClark => "catmull-clark",
            Self::LoopWarren => "loop-warren",
        }
    }

    pub(crate) fn to_u8(self) -> u8 {
        match self {
            Self::CatmullClark => 1,
            Self::LoopWarren => 2,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::CatmullClark),
            2 => Some(Self::LoopWarren),
            _ => None,
        }
    }
}

impl fmt::Display for SubdivisionScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
