use std::path::PathBuf;

use crate::{
    config::SynthesisConfig,
    image,
    mesh::{DistanceRange, TriangleMesh},
    raster::{self, RasterBuffer, RasterStats},
    sonify, MuserError, Result,
};

/// Rasterization lifecycle. The buffer exists only in the second state, so
/// exports cannot silently serialize an empty grid.
#[derive(Debug)]
enum BufferState {
    Unrasterized,
    Rasterized {
        range: DistanceRange,
        buffer: RasterBuffer,
        stats: RasterStats,
    },
}

/// One imported model and its derived raster and audio artifacts.
///
/// Only muses are rasterized and exported, so those operations live here:
/// [`rasterize_buffer`](Muse::rasterize_buffer) measures the mesh and fills
/// the buffer, after which [`export_image`](Muse::export_image) and
/// [`export_audio`](Muse::export_audio) serialize it.
#[derive(Debug)]
pub struct Muse {
    name: String,
    mesh: TriangleMesh,
    config: SynthesisConfig,
    state: BufferState,
}

impl Muse {
    pub fn new(name: impl Into<String>, mesh: TriangleMesh, config: SynthesisConfig) -> Self {
        Self {
            name: name.into(),
            mesh,
            config,
            state: BufferState::Unrasterized,
        }
    }

    /// Names the muse after its position in the import order.
    pub fn with_index(index: usize, mesh: TriangleMesh, config: SynthesisConfig) -> Self {
        Self::new(format!("model_{}", index + 1), mesh, config)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mesh(&self) -> &TriangleMesh {
        &self.mesh
    }

    /// True only after a successful [`rasterize_buffer`](Muse::rasterize_buffer).
    pub fn buffer_ready(&self) -> bool {
        matches!(self.state, BufferState::Rasterized { .. })
    }

    pub fn raster_buffer(&self) -> Option<&RasterBuffer> {
        match &self.state {
            BufferState::Rasterized { buffer, .. } => Some(buffer),
            BufferState::Unrasterized => None,
        }
    }

    pub fn distance_range(&self) -> Option<DistanceRange> {
        match &self.state {
            BufferState::Rasterized { range, .. } => Some(*range),
            BufferState::Unrasterized => None,
        }
    }

    pub fn stats(&self) -> Option<RasterStats> {
        match &self.state {
            BufferState::Rasterized { stats, .. } => Some(*stats),
            BufferState::Unrasterized => None,
        }
    }

    /// Measures the distance range and rasterizes the mesh into a fresh
    /// buffer. Blocking: all workers are joined before this returns.
    /// Re-running recomputes and replaces the buffer; on failure the previous
    /// state is kept untouched.
    pub fn rasterize_buffer(&mut self) -> Result<()> {
        let range = DistanceRange::measure(&self.mesh);
        let (buffer, stats) = raster::rasterize_mesh(&self.mesh, range, &self.config)?;
        tracing::info!(muse = %self.name, faces = stats.faces_drawn, "raster buffer ready");
        self.state = BufferState::Rasterized {
            range,
            buffer,
            stats,
        };
        Ok(())
    }

    /// Writes `./<stem>.ppm`. Requires a rasterized buffer.
    pub fn export_image(&self, stem: &str) -> Result<PathBuf> {
        let buffer = self.rasterized()?;
        let path = PathBuf::from(format!("./{stem}.ppm"));
        image::write_ppm(buffer, &path)?;
        tracing::info!(muse = %self.name, path = %path.display(), "image exported");
        Ok(path)
    }

    /// Synthesizes the waveform and writes `./<stem>.wav`. Requires a
    /// rasterized buffer.
    pub fn export_audio(&self, stem: &str) -> Result<PathBuf> {
        let buffer = self.rasterized()?;
        let samples = sonify::synthesize(buffer, &self.config);
        let path = PathBuf::from(format!("./{stem}.wav"));
        sonify::export_wav(&samples, &path)?;
        tracing::info!(muse = %self.name, path = %path.display(), "audio exported");
        Ok(path)
    }

    fn rasterized(&self) -> Result<&RasterBuffer> {
        match &self.state {
            BufferState::Rasterized { buffer, .. } => Ok(buffer),
            BufferState::Unrasterized => Err(MuserError::BufferNotReady),
        }
    }
}
