//! Core library for the Muser application.
//!
//! Muser turns a triangulated 3D model into sound. The pipeline measures
//! every vertex's distance from the origin, scanline-rasterizes the mesh's
//! texture-space triangles into a square intensity buffer (in parallel, one
//! contiguous face chunk per worker), and then treats that buffer as a
//! spectrogram: rows become frequency bins, columns become time, and an
//! additive synthesizer renders one second of audio. The buffer also exports
//! as a plain-text greyscale image.

pub mod assets;
pub mod config;
pub mod error;
pub mod image;
pub mod mesh;
pub mod muse;
pub mod raster;
pub mod sonify;

pub use config::SynthesisConfig;
pub use error::{MuserError, Result};
pub use mesh::{DistanceRange, TriangleMesh};
pub use muse::Muse;
pub use raster::{rasterize_mesh, rasterize_mesh_with_workers, RasterBuffer, RasterStats};
