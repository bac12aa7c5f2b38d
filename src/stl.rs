//! Streaming binary STL writer.
//!
//! ```text
//! header      80 bytes   zeroed
//! count        4 bytes   u32 little-endian, fixed at open
//! per facet   50 bytes   normal (3×f32), 3 vertices (9×f32), attribute u16 = 0
//! ```
//!
//! The count is written up front and never revised, so the writer refuses to
//! emit past it and [`MeshWriter::finish`] fails if fewer were written.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use tracing::debug;

use crate::{
    error::{FractalStlError, Result},
    types::{Point, Triangle, Value},
};

pub const HEADER_LEN: usize = 80;
pub const FACET_LEN: usize = 50;

/// Size in bytes of a binary STL holding `triangles` facets.
pub fn file_len(triangles: u32) -> usize {
    HEADER_LEN + 4 + FACET_LEN * triangles as usize
}

/// Sequential binary STL writer with a declared triangle count.
pub struct MeshWriter<W: Write> {
    out: W,
    declared: u32,
    written: u32,
}

impl MeshWriter<BufWriter<File>> {
    /// Creates (or truncates) `path` and writes the header.
    pub fn create(path: impl AsRef<Path>, triangle_count: u32) -> Result<Self> {
        let file = File::create(path)?;
        Self::open(BufWriter::new(file), triangle_count)
    }
}

impl<W: Write> MeshWriter<W> {
    /// Writes the header to `out`.
    pub fn open(mut out: W, triangle_count: u32) -> Result<Self> {
        out.write_all(&[0u8; HEADER_LEN])?;
        out.write_all(&triangle_count.to_le_bytes())?;
        Ok(Self {
            out,
            declared: triangle_count,
            written: 0,
        })
    }

    pub fn declared(&self) -> u32 {
        self.declared
    }

    pub fn written(&self) -> u32 {
        self.written
    }

    /// Writes one facet. `inverted` swaps `p2` and `p3` before anything is written.
    pub fn write_triangle(&mut self, p1: Point, p2: Point, p3: Point, inverted: bool) -> Result<()> {
        self.emit(Triangle::new(p1, p2, p3).with_inverted(inverted))
    }

    /// Writes one facet in its oriented vertex order.
    pub fn emit(&mut self, triangle: Triangle) -> Result<()> {
        if self.written >= self.declared {
            return Err(FractalStlError::TriangleCountMismatch {
                declared: self.declared,
                written: self.written.saturating_add(1),
            });
        }

        let [p1, p2, p3] = triangle.oriented();
        debug!("writing triangle {:?} {:?} {:?}", p1.coords, p2.coords, p3.coords);

        let normal = triangle.normal();
        let mut record = [0u8; FACET_LEN];
        let values = [
            normal.x, normal.y, normal.z, p1.x, p1.y, p1.z, p2.x, p2.y, p2.z, p3.x, p3.y, p3.z,
        ];
        for (chunk, v) in record.chunks_exact_mut(4).zip(values) {
            chunk.copy_from_slice(&(v as f32).to_le_bytes());
        }
        // The trailing attribute bytes stay zero.
        self.out.write_all(&record)?;
        self.written += 1;
        Ok(())
    }

    /// Flushes and returns the inner writer once exactly the declared count was written.
    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        if self.written != self.declared {
            return Err(FractalStlError::TriangleCountMismatch {
                declared: self.declared,
                written: self.written,
            });
        }
        Ok(self.out)
    }
}

/// Reads facet `index` back as `(normal, [p1, p2, p3])`.
///
/// Returns `None` if `bytes` is too short.
pub fn read_facet(bytes: &[u8], index: usize) -> Option<([Value; 3], [[Value; 3]; 3])> {
    let start = HEADER_LEN + 4 + index * FACET_LEN;
    let record = bytes.get(start..start + FACET_LEN)?;
    let mut values = [0 as Value; 12];
    for (v, chunk) in values.iter_mut().zip(record.chunks_exact(4)) {
        *v = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as Value;
    }
    Some((
        [values[0], values[1], values[2]],
        [
            [values[3], values[4], values[5]],
            [values[6], values[7], values[8]],
            [values[9], values[10], values[11]],
        ],
    ))
}

/// Triangle count declared in the header of `bytes`.
pub fn read_count(bytes: &[u8]) -> Option<u32> {
    let raw = bytes.get(HEADER_LEN..HEADER_LEN + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: Value, y: Value, z: Value) -> Point {
        Point::new(x, y, z)
    }

    #[test]
    fn file_size_matches_declared_count() {
        let mut writer = MeshWriter::open(Vec::new(), 3).unwrap();
        for k in 0..3 {
            let z = k as Value;
            writer
                .write_triangle(p(0., 0., z), p(1., 0., z), p(0., 1., z), false)
                .unwrap();
        }
        let bytes = writer.finish().unwrap();

        assert_eq!(bytes.len(), file_len(3));
        assert_eq!(bytes.len(), 80 + 4 + 50 * 3);
        assert!(bytes[..HEADER_LEN].iter().all(|&b| b == 0));
        assert_eq!(read_count(&bytes), Some(3));
    }

    #[test]
    fn inverted_write_matches_swapped_points() {
        let (a, b, c) = (p(0., 0., 1.), p(2., 0., 0.), p(0., 3., 0.5));

        let mut plain = MeshWriter::open(Vec::new(), 1).unwrap();
        plain.write_triangle(a, b, c, false).unwrap();
        let mut flipped = MeshWriter::open(Vec::new(), 1).unwrap();
        flipped.write_triangle(a, c, b, true).unwrap();

        assert_eq!(plain.finish().unwrap(), flipped.finish().unwrap());
    }

    #[test]
    fn record_layout_and_normal() {
        let mut writer = MeshWriter::open(Vec::new(), 1).unwrap();
        writer
            .write_triangle(p(0., 0., 0.), p(0., 1., 0.), p(1., 0., 0.), false)
            .unwrap();
        let bytes = writer.finish().unwrap();

        let (normal, verts) = read_facet(&bytes, 0).unwrap();
        assert_eq!(normal, [0., 0., 1.]);
        assert_eq!(verts, [[0., 0., 0.], [0., 1., 0.], [1., 0., 0.]]);
        assert_eq!(&bytes[bytes.len() - 2..], &[0, 0]);
    }

    #[test]
    fn writing_past_declared_count_fails() {
        let mut writer = MeshWriter::open(Vec::new(), 1).unwrap();
        writer
            .write_triangle(p(0., 0., 0.), p(1., 0., 0.), p(0., 1., 0.), false)
            .unwrap();
        let err = writer
            .write_triangle(p(0., 0., 0.), p(1., 0., 0.), p(0., 1., 0.), false)
            .unwrap_err();
        assert!(matches!(
            err,
            FractalStlError::TriangleCountMismatch { declared: 1, written: 2 }
        ));
    }

    #[test]
    fn finishing_short_fails() {
        let writer = MeshWriter::open(Vec::new(), 2).unwrap();
        let err = writer.finish().unwrap_err();
        assert!(matches!(
            err,
            FractalStlError::TriangleCountMismatch { declared: 2, written: 0 }
        ));
    }

    #[test]
    fn create_writes_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.stl");
        let mut writer = MeshWriter::create(&path, 1).unwrap();
        writer
            .write_triangle(p(0., 0., 0.), p(1., 0., 0.), p(0., 1., 0.), false)
            .unwrap();
        writer.finish().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), file_len(1));
        assert_eq!(read_count(&bytes), Some(1));
    }

    #[test]
    fn degenerate_facet_is_written_with_nan_normal() {
        let mut writer = MeshWriter::open(Vec::new(), 1).unwrap();
        let q = p(1., 1., 1.);
        writer.write_triangle(q, q, q, false).unwrap();
        let bytes = writer.finish().unwrap();
        let (normal, _) = read_facet(&bytes, 0).unwrap();
        assert!(normal.iter().all(|n| n.is_nan()));
    }
}
