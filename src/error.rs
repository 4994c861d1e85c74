use thiserror::Error;

/// Top-level error type for the subdivision kernel.
#[derive(Debug, Error)]
pub enum SubdError {
    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Sector(#[from] SectorError),

    #[error(transparent)]
    Subdivision(#[from] SubdivisionError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

/// Errors raised by the topology arena primitives.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    #[error("{kind} {id} still has {count} incidences")]
    StillReferenced {
        kind: &'static str,
        id: u32,
        count: usize,
    },

    #[error("{0} id space exhausted")]
    IdSpaceExhausted(&'static str),
}

/// Errors raised by the sector calculus for invalid (tag, count) inputs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SectorError {
    #[error("sector face count {0} is out of range")]
    FaceCountOutOfRange(usize),

    #[error("sector edge count {0} is out of range")]
    EdgeCountOutOfRange(usize),

    #[error("vertex tag {0} does not define a sector")]
    InvalidTag(&'static str),

    #[error("corner sector angle {0} is not finite")]
    InvalidCornerAngle(f64),
}

/// Errors raised by the subdivision engine.
#[derive(Debug, Error)]
pub enum SubdivisionError {
    #[error("source level {0} has no faces")]
    EmptyLevel(usize),

    #[error("subdivision level {requested} exceeds the maximum of {max}")]
    MaxLevelExceeded { requested: usize, max: usize },

    #[error("subdivision would exceed maximum size ({current} -> {projected} faces, max {max})")]
    MeshTooLarge {
        current: usize,
        projected: usize,
        max: usize,
    },

    #[error("sector coefficient fix-up did not converge after {iterations} passes ({unresolved} edge ends unresolved)")]
    FixupDiverged { iterations: usize, unresolved: usize },

    #[error("level {level} is not larger than level {below}")]
    NotMonotonic { level: usize, below: usize },

    #[error("limit point unavailable: {0}")]
    LimitPointUnavailable(String),
    #[error("edge {edge} has an unresolved sector coefficient")]
    UnresolvedSectorCoefficient { edge: u32 },
}

/// Errors related to editing operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Errors raised while reading or writing an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("unexpected end of archive: needed {needed} bytes, {available} available")]
    UnexpectedEnd { needed: usize, available: usize },

    #[error("unsupported archive version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("corrupt archive: {0}")]
    Corrupt(String),

    #[error("chunk nesting error: {0}")]
    Chunk(String),
}

/// Convenience type alias for results using [`SubdError`].
pub type Result<T> = std::result::Result<T, SubdError>;
