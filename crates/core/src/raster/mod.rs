//! Parallel triangle rasterization into a shared scalar buffer.
//!
//! The triangle index range is split into contiguous, equal-sized chunks, one
//! per worker. Each worker extracts its faces (screen coordinates from the
//! texcoords, intensity from the normalized distance-from-origin), orders
//! them, and scanline-fills them into a buffer shared across workers. Writes
//! never read other cells, so overlapping faces resolve last-write-wins.

mod scanline;

use std::ops::Range;
use std::sync::atomic::{AtomicU32, Ordering};

use rayon::prelude::*;

use crate::{
    config::SynthesisConfig,
    mesh::{DistanceRange, TriangleMesh},
    MuserError, Result,
};

use scanline::Point;

/// Square, row-major intensity grid produced by rasterization. Indexed as
/// `y * width + x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterBuffer {
    width: usize,
    cells: Vec<u32>,
}

impl RasterBuffer {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            cells: vec![0; width * width],
        }
    }

    pub fn from_cells(width: usize, cells: Vec<u32>) -> Result<Self> {
        if cells.len() != width * width {
            return Err(MuserError::ImageParse(format!(
                "{} cells cannot fill a {width}x{width} buffer",
                cells.len()
            )));
        }
        Ok(Self { width, cells })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.cells[y * self.width + x]
    }

    pub fn cells(&self) -> &[u32] {
        &self.cells
    }
}

/// Mutable twin of [`RasterBuffer`] shared by reference across workers.
/// Preallocated to full size before dispatch; workers only store cells, with
/// relaxed ordering, and never resize or read.
pub(crate) struct AtomicRaster {
    width: usize,
    cells: Vec<AtomicU32>,
}

impl AtomicRaster {
    pub(crate) fn new(width: usize) -> Self {
        let mut cells = Vec::with_capacity(width * width);
        cells.resize_with(width * width, || AtomicU32::new(0));
        Self { width, cells }
    }

    /// Stores one cell. Coordinates outside the buffer are dropped rather
    /// than wrapped; face extraction already rejects out-of-bounds faces, so
    /// this only catches float edge cases at span ends.
    pub(crate) fn store(&self, x: i64, y: i64, value: u32) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.width {
            return;
        }
        self.cells[y * self.width + x].store(value, Ordering::Relaxed);
    }

    pub(crate) fn freeze(self) -> RasterBuffer {
        RasterBuffer {
            width: self.width,
            cells: self.cells.into_iter().map(AtomicU32::into_inner).collect(),
        }
    }
}

/// Counters accumulated during one rasterization run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RasterStats {
    /// Faces scanline-filled into the buffer.
    pub faces_drawn: usize,
    /// Faces skipped whole because a corner fell outside the buffer.
    pub faces_skipped: usize,
    /// Vertex intensities clamped back into `[0, 255]`.
    pub intensity_clamps: usize,
    /// Trailing faces dropped by the chunk partition.
    pub faces_dropped: usize,
}

impl RasterStats {
    fn merge(self, other: Self) -> Self {
        Self {
            faces_drawn: self.faces_drawn + other.faces_drawn,
            faces_skipped: self.faces_skipped + other.faces_skipped,
            intensity_clamps: self.intensity_clamps + other.intensity_clamps,
            faces_dropped: self.faces_dropped + other.faces_dropped,
        }
    }
}

/// Rasterizes the whole mesh using one chunk per rayon worker thread.
pub fn rasterize_mesh(
    mesh: &TriangleMesh,
    range: DistanceRange,
    config: &SynthesisConfig,
) -> Result<(RasterBuffer, RasterStats)> {
    rasterize_mesh_with_workers(mesh, range, config, rayon::current_num_threads())
}

/// Rasterizes with an explicit worker count. The face range is split into
/// `workers` contiguous chunks of `triangle_count / workers` faces; the
/// remainder faces fall outside every chunk and are dropped. The loss is
/// deterministic and reported in [`RasterStats::faces_dropped`] rather than
/// silently repaired.
pub fn rasterize_mesh_with_workers(
    mesh: &TriangleMesh,
    range: DistanceRange,
    config: &SynthesisConfig,
    workers: usize,
) -> Result<(RasterBuffer, RasterStats)> {
    if mesh.triangle_count() == 0 {
        return Err(MuserError::EmptyMesh);
    }
    if range.is_degenerate() {
        return Err(MuserError::DegenerateGeometry {
            min: range.min,
            max: range.max,
        });
    }
    config.validate()?;

    let workers = workers.max(1);
    let chunk_len = mesh.triangle_count() / workers;
    let raster = AtomicRaster::new(config.buffer_width);

    let mut stats = (0..workers)
        .into_par_iter()
        .map(|worker| {
            let start = worker * chunk_len;
            rasterize_chunk(mesh, range, &raster, config.buffer_width, start..start + chunk_len)
        })
        .reduce(RasterStats::default, RasterStats::merge);

    stats.faces_dropped = mesh.triangle_count() - chunk_len * workers;
    if stats.faces_dropped > 0 {
        tracing::warn!(
            dropped = stats.faces_dropped,
            workers,
            "trailing faces fall outside the worker partition"
        );
    }
    tracing::info!(
        drawn = stats.faces_drawn,
        skipped = stats.faces_skipped,
        clamps = stats.intensity_clamps,
        workers,
        "rasterization finished"
    );
    Ok((raster.freeze(), stats))
}

fn rasterize_chunk(
    mesh: &TriangleMesh,
    range: DistanceRange,
    raster: &AtomicRaster,
    width: usize,
    faces: Range<usize>,
) -> RasterStats {
    let mut stats = RasterStats::default();
    for face in faces {
        match extract_face(mesh, range, width, face, &mut stats) {
            Some(points) => {
                scanline::fill_triangle(raster, points);
                stats.faces_drawn += 1;
            }
            None => {
                stats.faces_skipped += 1;
                tracing::debug!(face, "face outside the raster bounds, skipped");
            }
        }
    }
    stats
}

/// Reads one face's three `(x, y, intensity)` corners. Screen coordinates
/// come from the texcoords scaled by the buffer width and truncated;
/// intensity maps the corner's distance-from-origin onto `[0, 255]` through
/// the measured range. Returns `None` when any corner lands outside the
/// buffer: the face is skipped whole, never partially rasterized.
fn extract_face(
    mesh: &TriangleMesh,
    range: DistanceRange,
    width: usize,
    face: usize,
    stats: &mut RasterStats,
) -> Option<[Point; 3]> {
    let bound = width as i64;
    let mut points = [Point::new(0.0, 0.0, 0.0); 3];
    for (corner, point) in points.iter_mut().enumerate() {
        let vertex = face * 3 + corner;
        let [u, v] = mesh.texcoord(vertex);
        let x = (u * width as f32) as i64;
        let y = (v * width as f32) as i64;
        if x < 0 || x >= bound || y < 0 || y >= bound {
            return None;
        }

        let intensity = (255.0 * range.normalize(mesh.distance(vertex))).round();
        let clamped = intensity.clamp(0.0, 255.0);
        if clamped != intensity {
            stats.intensity_clamps += 1;
            tracing::debug!(face, corner, %intensity, "intensity outside [0, 255], clamped");
        }
        *point = Point::new(x as f32, y as f32, clamped);
    }
    Some(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a soup where each triangle is given as three
    /// `(u, v, distance)` corners; positions sit on the X axis so the corner
    /// distance is exact.
    fn mesh_from_corners(corners: &[[(f32, f32, f32); 3]]) -> TriangleMesh {
        let mut positions = Vec::new();
        let mut texcoords = Vec::new();
        for face in corners {
            for &(u, v, distance) in face {
                positions.extend_from_slice(&[distance, 0.0, 0.0]);
                texcoords.extend_from_slice(&[u, v]);
            }
        }
        TriangleMesh::new(positions, texcoords, corners.len()).unwrap()
    }

    fn config(width: usize) -> SynthesisConfig {
        SynthesisConfig {
            buffer_width: width,
            ..SynthesisConfig::default()
        }
    }

    #[test]
    fn known_triangle_stamps_expected_corner_intensities() {
        // Distances 1.0 and 2.0 bound the range; 1.50196 rounds to 128.
        let mesh = mesh_from_corners(&[[
            (0.01, 0.01, 1.0),
            (0.5, 0.01, 2.0),
            (0.01, 0.5, 1.0 + 128.0 / 255.0),
        ]]);
        let range = DistanceRange::measure(&mesh);
        let (buffer, stats) =
            rasterize_mesh_with_workers(&mesh, range, &config(1000), 1).unwrap();

        assert_eq!(stats.faces_drawn, 1);
        assert_eq!(buffer.get(10, 10), 0);
        assert_eq!(buffer.get(500, 10), 255);
        assert!(buffer.get(10, 250) > 0 && buffer.get(10, 250) < 128);
    }

    #[test]
    fn refuses_empty_meshes_before_writing() {
        let mesh = TriangleMesh::default();
        let range = DistanceRange::measure(&mesh);
        let err = rasterize_mesh(&mesh, range, &config(100)).unwrap_err();
        assert!(matches!(err, MuserError::EmptyMesh));
    }

    #[test]
    fn refuses_degenerate_ranges_before_writing() {
        let mesh = mesh_from_corners(&[[(0.1, 0.1, 1.0), (0.5, 0.1, 1.0), (0.1, 0.5, 1.0)]]);
        let range = DistanceRange::measure(&mesh);
        let err = rasterize_mesh(&mesh, range, &config(100)).unwrap_err();
        assert!(matches!(err, MuserError::DegenerateGeometry { .. }));
    }

    #[test]
    fn skips_faces_with_any_corner_outside_the_buffer() {
        let mesh = mesh_from_corners(&[
            [(0.1, 0.1, 1.0), (0.5, 0.1, 2.0), (0.1, 0.5, 1.5)],
            [(0.1, 0.1, 1.0), (1.5, 0.1, 2.0), (0.1, 0.5, 1.5)],
        ]);
        let range = DistanceRange::measure(&mesh);
        let (_, stats) = rasterize_mesh_with_workers(&mesh, range, &config(100), 1).unwrap();
        assert_eq!(stats.faces_drawn, 1);
        assert_eq!(stats.faces_skipped, 1);
    }

    #[test]
    fn worker_partitioning_is_deterministic() {
        // Four disjoint triangles, one per quadrant.
        let quadrant = |u0: f32, v0: f32| {
            [
                (u0, v0, 1.0),
                (u0 + 0.3, v0, 2.0),
                (u0, v0 + 0.3, 1.5),
            ]
        };
        let mesh = mesh_from_corners(&[
            quadrant(0.05, 0.05),
            quadrant(0.55, 0.05),
            quadrant(0.05, 0.55),
            quadrant(0.55, 0.55),
        ]);
        let range = DistanceRange::measure(&mesh);

        let (parallel, _) = rasterize_mesh_with_workers(&mesh, range, &config(200), 4).unwrap();
        let (serial, _) = rasterize_mesh_with_workers(&mesh, range, &config(200), 1).unwrap();
        assert_eq!(parallel, serial);
    }

    #[test]
    fn partition_remainder_is_dropped_and_counted() {
        let face = [(0.1, 0.1, 1.0), (0.5, 0.1, 2.0), (0.1, 0.5, 1.5)];
        let mesh = mesh_from_corners(&[face; 5]);
        let range = DistanceRange::measure(&mesh);
        let (_, stats) = rasterize_mesh_with_workers(&mesh, range, &config(100), 2).unwrap();
        assert_eq!(stats.faces_drawn, 4);
        assert_eq!(stats.faces_dropped, 1);
    }

    #[test]
    fn out_of_range_intensities_are_clamped_and_counted() {
        // A range narrower than the mesh's actual spread pushes the third
        // corner's normalized intensity past 255.
        let mesh = mesh_from_corners(&[[(0.1, 0.1, 1.0), (0.5, 0.1, 2.0), (0.1, 0.5, 3.0)]]);
        let range = DistanceRange { min: 1.0, max: 2.0 };
        let (buffer, stats) = rasterize_mesh_with_workers(&mesh, range, &config(100), 1).unwrap();
        assert_eq!(stats.intensity_clamps, 1);
        assert!(buffer.cells().iter().all(|&c| c <= 255));
    }
}
