//! Reading and writing whole surfaces.
//!
//! Layout, inside one surface chunk: scheme, active level, level count, then
//! one chunk per level holding its index, id high-water marks, component
//! counts, vertices, edges and faces, each in id order. Neighbors are stored
//! by persistent id. Cached points are not stored.

use smallvec::SmallVec;

use crate::error::{ArchiveError, Result};
use crate::math::Point3;
use crate::subd::Subd;
use crate::topology::{
    ComponentKind, ComponentStatus, EdgeTag, IdAllocator, OrientedEdge, SectorCoefficient, SubdLevel,
    SubdivisionScheme, VertexTag,
};

use super::{ArchiveRead, ArchiveValue, ArchiveWrite};

/// Major version of the surface layout. Readers reject other majors.
pub const SUBD_ARCHIVE_MAJOR: u8 = 1;
/// Minor version of the surface layout. Newer minors only append fields.
pub const SUBD_ARCHIVE_MINOR: u8 = 0;

impl ArchiveValue for SectorCoefficient {
    fn write<W: ArchiveWrite + ?Sized>(&self, archive: &mut W) -> std::result::Result<(), ArchiveError> {
        match *self {
            Self::Ignored => archive.write_u8(0),
            Self::Unset => archive.write_u8(1),
            Self::Value(w) => {
                archive.write_u8(2)?;
                archive.write_f64(w)
            }
        }
    }

    fn read<R: ArchiveRead + ?Sized>(archive: &mut R) -> std::result::Result<Self, ArchiveError> {
        match archive.read_u8()? {
            0 => Ok(Self::Ignored),
            1 => Ok(Self::Unset),
            2 => Ok(Self::Value(archive.read_f64()?)),
            other => Err(ArchiveError::Corrupt(format!("invalid sector coefficient kind {other}"))),
        }
    }
}

impl Subd {
    /// Writes every level of the surface.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive rejects the data or a level refers to
    /// a missing component.
    pub fn write_to<W: ArchiveWrite>(&self, archive: &mut W) -> Result<()> {
        archive.begin_chunk(SUBD_ARCHIVE_MAJOR, SUBD_ARCHIVE_MINOR)?;
        archive.write_u8(self.scheme().to_u8())?;
        archive.write_u64(self.active_level_index() as u64)?;
        archive.write_u64(self.level_count() as u64)?;
        for level in self.levels() {
            archive.begin_chunk(SUBD_ARCHIVE_MAJOR, SUBD_ARCHIVE_MINOR)?;
            write_level(level, archive)?;
            archive.end_chunk()?;
        }
        archive.end_chunk()?;
        tracing::debug!(levels = self.level_count(), "surface written");
        Ok(())
    }

    /// Reads a surface written by [`Subd::write_to`]. The configuration is
    /// not part of the archive; the result uses the default one.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::UnsupportedVersion`] for another major
    /// version and [`ArchiveError::Corrupt`] for data that does not describe
    /// a valid surface.
    pub fn read_from<R: ArchiveRead>(archive: &mut R) -> Result<Self> {
        enter_chunk(archive)?;
        let scheme = SubdivisionScheme::from_u8(archive.read_u8()?)
            .ok_or_else(|| ArchiveError::Corrupt("unknown subdivision scheme".into()))?;
        let active = read_index(archive)?;
        let count = archive.read_count()?;
        let mut levels = Vec::with_capacity(count);
        for i in 0..count {
            enter_chunk(archive)?;
            let level = read_level(archive, scheme)?;
            if usize::from(level.index()) != i {
                return Err(ArchiveError::Corrupt(format!("level {} stored at position {i}", level.index())).into());
            }
            archive.end_read_chunk()?;
            levels.push(level);
        }
        archive.end_read_chunk()?;
        if active >= levels.len().max(1) {
            return Err(ArchiveError::Corrupt(format!("active level {active} out of range")).into());
        }
        tracing::debug!(levels = levels.len(), "surface read");
        Ok(Subd::from_parts(scheme, levels, active))
    }
}

fn enter_chunk<R: ArchiveRead>(archive: &mut R) -> Result<()> {
    let header = archive.read_chunk_header()?;
    if header.major != SUBD_ARCHIVE_MAJOR {
        return Err(ArchiveError::UnsupportedVersion {
            major: header.major,
            minor: header.minor,
        }
        .into());
    }
    Ok(())
}

fn read_index<R: ArchiveRead>(archive: &mut R) -> std::result::Result<usize, ArchiveError> {
    let value = archive.read_u64()?;
    usize::try_from(value).map_err(|_| ArchiveError::Corrupt(format!("index {value} out of range")))
}

fn write_level<W: ArchiveWrite>(level: &SubdLevel, archive: &mut W) -> Result<()> {
    archive.write_u16(level.index())?;
    let ids = level.id_allocator();
    for kind in [ComponentKind::Vertex, ComponentKind::Edge, ComponentKind::Face] {
        archive.write_u32(ids.max_id(kind))?;
    }

    archive.write_u64(level.vertex_count() as u64)?;
    for v in level.vertex_keys_by_id() {
        let vd = level.vertex(v)?;
        archive.write_u32(vd.id())?;
        vd.point().write(archive)?;
        archive.write_u8(vd.tag().to_u8())?;
        archive.write_u8(vd.status().bits())?;
    }

    archive.write_u64(level.edge_count() as u64)?;
    for e in level.edge_keys_by_id() {
        let ed = level.edge(e)?;
        archive.write_u32(ed.id())?;
        for v in ed.vertices() {
            archive.write_u32(level.vertex(v)?.id())?;
        }
        archive.write_u8(ed.tag().to_u8())?;
        archive.write_f64(ed.sharpness())?;
        for c in ed.sector_coefficients() {
            c.write(archive)?;
        }
        archive.write_u8(ed.status().bits())?;
    }

    archive.write_u64(level.face_count() as u64)?;
    for f in level.face_keys_by_id() {
        let fd = level.face(f)?;
        archive.write_u32(fd.id())?;
        archive.write_u32(fd.level_zero_face_id())?;
        archive.write_u32(fd.parent_face_id())?;
        archive.write_u8(fd.status().bits())?;
        archive.write_u64(fd.edge_count() as u64)?;
        for oe in fd.edges() {
            archive.write_u32(level.edge(oe.edge)?.id())?;
            archive.write_bool(oe.forward)?;
        }
    }
    Ok(())
}

fn read_level<R: ArchiveRead>(archive: &mut R, scheme: SubdivisionScheme) -> Result<SubdLevel> {
    let index = archive.read_u16()?;
    let mut marks = IdAllocator::new();
    for kind in [ComponentKind::Vertex, ComponentKind::Edge, ComponentKind::Face] {
        marks.reserve(kind, archive.read_u32()?);
    }
    let mut level = SubdLevel::new(index, scheme);
    let corrupt = |what: &str, id: u32| ArchiveError::Corrupt(format!("{what} {id} is invalid or refers to a missing component"));

    let mut vertex_status = Vec::new();
    for _ in 0..archive.read_count()? {
        let id = archive.read_u32()?;
        let point = Point3::read(archive)?;
        let tag = VertexTag::from_u8(archive.read_u8()?).ok_or_else(|| corrupt("vertex tag of", id))?;
        let status = ComponentStatus::from_bits_retain(archive.read_u8()?);
        let v = level.add_vertex_with_id(id, point, tag).map_err(|_| corrupt("vertex", id))?;
        vertex_status.push((v, status));
    }

    let mut edge_fields = Vec::new();
    for _ in 0..archive.read_count()? {
        let id = archive.read_u32()?;
        let (a, b) = (archive.read_u32()?, archive.read_u32()?);
        let (Some(v0), Some(v1)) = (level.vertex_by_id(a), level.vertex_by_id(b)) else {
            return Err(corrupt("edge", id).into());
        };
        let tag = EdgeTag::from_u8(archive.read_u8()?).ok_or_else(|| corrupt("edge tag of", id))?;
        let sharpness = archive.read_f64()?;
        let coefficients = [SectorCoefficient::read(archive)?, SectorCoefficient::read(archive)?];
        let status = ComponentStatus::from_bits_retain(archive.read_u8()?);
        let e = level.add_edge_with_id(id, v0, v1, tag).map_err(|_| corrupt("edge", id))?;
        edge_fields.push((e, sharpness, coefficients, status));
    }

    for _ in 0..archive.read_count()? {
        let id = archive.read_u32()?;
        let level_zero_face_id = archive.read_u32()?;
        let parent_face_id = archive.read_u32()?;
        let status = ComponentStatus::from_bits_retain(archive.read_u8()?);
        let mut cycle: SmallVec<[OrientedEdge; 8]> = SmallVec::new();
        for _ in 0..archive.read_count()? {
            let edge_id = archive.read_u32()?;
            let forward = archive.read_bool()?;
            let edge = level.edge_by_id(edge_id).ok_or_else(|| corrupt("face", id))?;
            cycle.push(OrientedEdge::new(edge, forward));
        }
        let f = level.add_face_with_id(id, &cycle).map_err(|_| corrupt("face", id))?;
        let data = level.face_mut(f)?;
        data.level_zero_face_id = level_zero_face_id;
        data.parent_face_id = parent_face_id;
        data.status = status;
    }

    // Adding faces unsets the coefficients around them, so the stored
    // values go in last.
    for (v, status) in vertex_status {
        level.vertex_mut(v)?.status = status;
    }
    for (e, sharpness, coefficients, status) in edge_fields {
        let ed = level.edge_mut(e)?;
        ed.sharpness = sharpness;
        ed.sector_coefficients = coefficients;
        ed.status = status;
    }
    level.id_allocator_mut().absorb(&marks);
    Ok(level)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::archive::MemoryArchive;
    use crate::operations::editing::fixtures::quad_grid;
    use crate::subdivision::Subdivide;

    fn round_trip(subd: &Subd) -> Subd {
        let mut archive = MemoryArchive::new();
        subd.write_to(&mut archive).unwrap();
        Subd::read_from(&mut archive.into_reader().unwrap()).unwrap()
    }

    #[test]
    fn levels_and_active_index_survive() {
        let mut subd = quad_grid(2);
        Subdivide::new(1).execute(&mut subd).unwrap();
        subd.set_active_level(0).unwrap();
        let copy = round_trip(&subd);
        assert_eq!(copy.level_count(), 2);
        assert_eq!(copy.active_level_index(), 0);
        assert_eq!(copy.level(1).unwrap().face_count(), 16);
        assert_eq!(
            copy.level(1).unwrap().id_allocator(),
            subd.level(1).unwrap().id_allocator()
        );
    }

    #[test]
    fn other_major_version_is_rejected() {
        let mut archive = MemoryArchive::new();
        archive.begin_chunk(SUBD_ARCHIVE_MAJOR + 1, 0).unwrap();
        archive.end_chunk().unwrap();
        let err = Subd::read_from(&mut archive.into_reader().unwrap()).unwrap_err();
        assert!(matches!(
            err,
            crate::SubdError::Archive(ArchiveError::UnsupportedVersion { major: 2, minor: 0 })
        ));
    }

    #[test]
    fn truncated_data_is_an_error() {
        let subd = quad_grid(1);
        let mut archive = MemoryArchive::new();
        subd.write_to(&mut archive).unwrap();
        let bytes = archive.into_bytes().unwrap();
        let cut = bytes.slice(..bytes.len() - 5);
        assert!(Subd::read_from(&mut MemoryArchive::from_bytes(cut)).is_err());
    }

    #[test]
    fn dangling_edge_reference_is_corrupt() {
        let mut archive = MemoryArchive::new();
        archive.begin_chunk(1, 0).unwrap();
        archive.write_u8(SubdivisionScheme::CatmullClark.to_u8()).unwrap();
        archive.write_u64(0).unwrap();
        archive.write_u64(1).unwrap();
        archive.begin_chunk(1, 0).unwrap();
        archive.write_u16(0).unwrap();
        for _ in 0..3 {
            archive.write_u32(2).unwrap();
        }
        archive.write_u64(0).unwrap();
        archive.write_u64(1).unwrap();
        archive.write_u32(1).unwrap();
        archive.write_u32(1).unwrap();
        archive.write_u32(2).unwrap();
        archive.end_chunk().unwrap();
        archive.end_chunk().unwrap();
        let err = Subd::read_from(&mut archive.into_reader().unwrap()).unwrap_err();
        assert!(matches!(err, crate::SubdError::Archive(ArchiveError::Corrupt(_))));
    }
}
