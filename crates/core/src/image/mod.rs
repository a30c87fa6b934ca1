use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::{raster::RasterBuffer, MuserError, Result};

const MAGIC: &str = "P2";
const MAX_VALUE: u32 = 255;

/// Serializes the buffer as a plain-text greyscale image: the `P2` token,
/// `width height`, the max value, then one line of space-separated integers
/// per raster row. Integer in, integer out, so a read-back reproduces the
/// buffer exactly.
pub fn write_ppm(buffer: &RasterBuffer, path: impl AsRef<Path>) -> Result<()> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    writeln!(out, "{MAGIC}")?;
    writeln!(out, "{} {}", buffer.width(), buffer.width())?;
    writeln!(out, "{MAX_VALUE}")?;

    let mut line = String::with_capacity(buffer.width() * 4);
    for row in buffer.cells().chunks(buffer.width()) {
        line.clear();
        for (index, cell) in row.iter().enumerate() {
            if index > 0 {
                line.push(' ');
            }
            // Writing into a String cannot fail.
            let _ = write!(line, "{cell}");
        }
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    Ok(())
}

/// Parses a file produced by [`write_ppm`] back into a buffer.
pub fn read_ppm(path: impl AsRef<Path>) -> Result<RasterBuffer> {
    let text = fs::read_to_string(path)?;
    let mut tokens = text.split_whitespace();

    let magic = tokens.next().unwrap_or_default();
    if magic != MAGIC {
        return Err(MuserError::ImageParse(format!(
            "expected `{MAGIC}` header, found `{magic}`"
        )));
    }
    let width = parse_number(tokens.next())?;
    let height = parse_number(tokens.next())?;
    if width != height {
        return Err(MuserError::ImageParse(format!(
            "buffer must be square, found {width}x{height}"
        )));
    }
    let max_value = parse_number(tokens.next())?;
    if max_value != MAX_VALUE as usize {
        return Err(MuserError::ImageParse(format!(
            "expected max value {MAX_VALUE}, found {max_value}"
        )));
    }

    let cells: Vec<u32> = tokens
        .map(|token| {
            token.parse().map_err(|_| {
                MuserError::ImageParse(format!("`{token}` is not an intensity value"))
            })
        })
        .collect::<Result<_>>()?;
    RasterBuffer::from_cells(width, cells)
}

fn parse_number(token: Option<&str>) -> Result<usize> {
    token
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| MuserError::ImageParse("truncated header".to_string()))
}
