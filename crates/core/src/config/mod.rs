use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{MuserError, Result};

/// Side length of the square raster buffer.
pub const DEFAULT_BUFFER_WIDTH: usize = 1000;
/// Frequency assigned to the first buffer row.
pub const DEFAULT_MIN_HERTZ: f64 = 20.0;
/// Frequency assigned one step past the last buffer row.
pub const DEFAULT_MAX_HERTZ: f64 = 20_000.0;
/// Scale applied to every synthesized sample before it is stored.
pub const DEFAULT_DECIBEL_SCALAR: f64 = 10.0;

/// Tunable constants shared by the rasterizer and the audio synthesizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub buffer_width: usize,
    pub min_hertz: f64,
    pub max_hertz: f64,
    pub decibel_scalar: f64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            buffer_width: DEFAULT_BUFFER_WIDTH,
            min_hertz: DEFAULT_MIN_HERTZ,
            max_hertz: DEFAULT_MAX_HERTZ,
            decibel_scalar: DEFAULT_DECIBEL_SCALAR,
        }
    }
}

impl SynthesisConfig {
    /// Reads a JSON config file. Missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.buffer_width == 0 {
            return Err(MuserError::InvalidConfig(
                "buffer width must be non-zero".to_string(),
            ));
        }
        if !(self.max_hertz > self.min_hertz) {
            return Err(MuserError::InvalidConfig(format!(
                "hertz range [{}, {}] is empty",
                self.min_hertz, self.max_hertz
            )));
        }
        Ok(())
    }

    /// Width of the synthesized frequency band.
    pub fn hertz_range(&self) -> f64 {
        self.max_hertz - self.min_hertz
    }

    /// Frequency increment between adjacent buffer rows.
    pub fn hertz_step(&self) -> f64 {
        self.hertz_range() / self.buffer_width as f64
    }
}
