/// Result alias that carries the custom [`MuserError`] type.
pub type Result<T> = std::result::Result<T, MuserError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum MuserError {
    /// The mesh carries no faces, so there is nothing to rasterize.
    #[error("mesh has no faces to rasterize")]
    EmptyMesh,
    /// Every vertex sits at the same distance from the origin, leaving the
    /// intensity normalization without an extent to divide by.
    #[error("degenerate geometry: distance range [{min}, {max}] has no extent")]
    DegenerateGeometry { min: f32, max: f32 },
    /// An export was requested before the raster buffer was produced.
    #[error("raster buffer not ready; rasterize before exporting")]
    BufferNotReady,
    /// The flat vertex arrays do not cover the declared face count.
    #[error("inconsistent mesh data: {0}")]
    InvalidMesh(String),
    /// A model file could not be parsed.
    #[error("malformed OBJ data at line {line}: {message}")]
    ObjParse { line: usize, message: String },
    /// An exported image could not be parsed back.
    #[error("malformed image data: {0}")]
    ImageParse(String),
    /// Configuration values fail validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Wrapper around waveform container errors.
    #[error("{0}")]
    Wav(#[from] hound::Error),
    /// Wrapper around configuration (de)serialization errors.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}
