//! Spectral-additive resynthesis of the raster buffer.
//!
//! Rows are frequency bins spread evenly across the configured hertz range,
//! columns are time. Every non-zero cell contributes a sinusoid whose
//! amplitude is the cell value normalized to `[0, 1]` and whose phase
//! argument is driven by a frequency accumulator that carries across rows
//! *and* samples without resetting. That cumulative drift is deliberate: it
//! is what gives exports their characteristic timbre, and it must not be
//! "fixed" into a per-sample oscillator bank.

use std::path::Path;

use crate::{config::SynthesisConfig, raster::RasterBuffer, Result};

/// Samples per exported waveform: one second at the output rate.
pub const SAMPLE_COUNT: usize = 44_100;
pub const SAMPLE_RATE: u32 = 44_100;

/// Renders the buffer into exactly [`SAMPLE_COUNT`] mono samples.
///
/// The inner loop touches `width * SAMPLE_COUNT` cells, so the hot path keeps
/// all math in `f64`, hoists the `1 / (255 * hertz_range)` factor, and skips
/// the sine evaluation for silent cells while still advancing the
/// accumulator.
pub fn synthesize(buffer: &RasterBuffer, config: &SynthesisConfig) -> Vec<f32> {
    let width = buffer.width();
    let hertz_step = config.hertz_range() / width as f64;
    let amplitude_scale = 1.0 / (255.0 * config.hertz_range());

    let mut frequency_accum = config.min_hertz;
    let mut samples = Vec::with_capacity(SAMPLE_COUNT);
    for sample in 0..SAMPLE_COUNT {
        let column = sample * width / SAMPLE_COUNT;
        let time = sample as f64;
        let mut sum = 0.0_f64;
        for row in 0..width {
            frequency_accum += hertz_step * row as f64;
            let cell = buffer.get(column, row);
            if cell == 0 {
                continue;
            }
            sum += cell as f64 * amplitude_scale * (frequency_accum * time).sin();
        }
        samples.push((sum * config.decibel_scalar) as f32);
    }
    samples
}

/// Serializes samples into a mono, 32-bit float, uncompressed WAV container.
pub fn export_wav(samples: &[f32], path: impl AsRef<Path>) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(width: usize) -> SynthesisConfig {
        SynthesisConfig {
            buffer_width: width,
            ..SynthesisConfig::default()
        }
    }

    #[test]
    fn always_emits_the_fixed_sample_count() {
        let buffer = RasterBuffer::new(8);
        let samples = synthesize(&buffer, &config(8));
        assert_eq!(samples.len(), SAMPLE_COUNT);
    }

    #[test]
    fn all_zero_buffer_synthesizes_silence() {
        let buffer = RasterBuffer::new(16);
        let samples = synthesize(&buffer, &config(16));
        assert!(samples.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn populated_buffer_produces_bounded_signal() {
        let width = 16;
        let cells = vec![255; width * width];
        let buffer = RasterBuffer::from_cells(width, cells).unwrap();
        let cfg = config(width);
        let samples = synthesize(&buffer, &cfg);

        assert!(samples.iter().any(|&s| s != 0.0));
        // Worst case every row contributes a full-amplitude sinusoid.
        let ceiling = (width as f64 / cfg.hertz_range() * cfg.decibel_scalar) as f32;
        assert!(samples.iter().all(|&s| s.abs() <= ceiling));
    }

    #[test]
    fn synthesis_is_deterministic_across_calls() {
        let width = 8;
        let cells = (0..width * width).map(|i| (i * 7 % 256) as u32).collect();
        let buffer = RasterBuffer::from_cells(width, cells).unwrap();
        let cfg = config(width);
        assert_eq!(synthesize(&buffer, &cfg), synthesize(&buffer, &cfg));
    }

    #[test]
    fn wav_container_holds_one_channel_of_all_samples() {
        let path = std::env::temp_dir().join(format!("muser-sonify-{}.wav", std::process::id()));
        let buffer = RasterBuffer::new(8);
        let samples = synthesize(&buffer, &config(8));
        export_wav(&samples, &path).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, SAMPLE_RATE);
        assert_eq!(reader.len() as usize, SAMPLE_COUNT);
        std::fs::remove_file(&path).unwrap();
    }
}
