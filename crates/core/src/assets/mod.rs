use std::fs;
use std::path::Path;

use crate::{mesh::TriangleMesh, MuserError, Result};

/// Reads a Wavefront OBJ model into a flat triangle soup.
///
/// Only the subset the pipeline consumes is recognized: `v` positions, `vt`
/// texture coordinates, and `f` faces whose corners carry both a position and
/// a texcoord index. Faces with more than three corners are fan-triangulated,
/// and every emitted corner duplicates its vertex data into the soup.
pub fn load_obj(path: impl AsRef<Path>) -> Result<TriangleMesh> {
    let text = fs::read_to_string(path)?;
    parse_obj(&text)
}

pub fn parse_obj(text: &str) -> Result<TriangleMesh> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut texcoords: Vec<[f32; 2]> = Vec::new();
    let mut soup_positions: Vec<f32> = Vec::new();
    let mut soup_texcoords: Vec<f32> = Vec::new();
    let mut triangle_count = 0;

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let mut tokens = raw.split_whitespace();
        match tokens.next() {
            Some("v") => positions.push(parse_floats::<3>(tokens, line)?),
            Some("vt") => texcoords.push(parse_floats::<2>(tokens, line)?),
            Some("f") => {
                let corners: Vec<(usize, usize)> = tokens
                    .map(|token| parse_corner(token, positions.len(), texcoords.len(), line))
                    .collect::<Result<_>>()?;
                if corners.len() < 3 {
                    return Err(MuserError::ObjParse {
                        line,
                        message: format!("face has {} corners, need at least 3", corners.len()),
                    });
                }
                for i in 1..corners.len() - 1 {
                    for &(position, texcoord) in &[corners[0], corners[i], corners[i + 1]] {
                        soup_positions.extend_from_slice(&positions[position]);
                        soup_texcoords.extend_from_slice(&texcoords[texcoord]);
                    }
                    triangle_count += 1;
                }
            }
            _ => {}
        }
    }

    TriangleMesh::new(soup_positions, soup_texcoords, triangle_count)
}

fn parse_floats<const N: usize>(
    tokens: std::str::SplitWhitespace<'_>,
    line: usize,
) -> Result<[f32; N]> {
    let mut values = [0.0; N];
    let mut count = 0;
    for token in tokens.take(N) {
        values[count] = token.parse().map_err(|_| MuserError::ObjParse {
            line,
            message: format!("`{token}` is not a number"),
        })?;
        count += 1;
    }
    if count < N {
        return Err(MuserError::ObjParse {
            line,
            message: format!("expected {N} components, found {count}"),
        });
    }
    Ok(values)
}

/// Parses a `position/texcoord[/normal]` face corner into zero-based indices.
fn parse_corner(
    token: &str,
    position_count: usize,
    texcoord_count: usize,
    line: usize,
) -> Result<(usize, usize)> {
    let mut parts = token.split('/');
    let position = parse_index(parts.next(), position_count, line, token)?;
    let texcoord = parse_index(parts.next(), texcoord_count, line, token)?;
    Ok((position, texcoord))
}

fn parse_index(part: Option<&str>, limit: usize, line: usize, token: &str) -> Result<usize> {
    let text = part
        .filter(|p| !p.is_empty())
        .ok_or_else(|| MuserError::ObjParse {
            line,
            message: format!("corner `{token}` is missing an index"),
        })?;
    let index: usize = text.parse().map_err(|_| MuserError::ObjParse {
        line,
        message: format!("`{text}` is not a valid index"),
    })?;
    if index == 0 || index > limit {
        return Err(MuserError::ObjParse {
            line,
            message: format!("index {index} out of range (1..={limit})"),
        });
    }
    Ok(index - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "\
# comment
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
vt 0.1 0.1
vt 0.5 0.1
vt 0.1 0.5
f 1/1 2/2 3/3
";

    #[test]
    fn parses_a_single_triangle() {
        let mesh = parse_obj(TRIANGLE).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.position(1), [1.0, 0.0, 0.0]);
        assert_eq!(mesh.texcoord(2), [0.1, 0.5]);
    }

    #[test]
    fn fan_triangulates_quads_into_duplicated_soup() {
        let text = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
f 1/1 2/2 3/3 4/4
";
        let mesh = parse_obj(text).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.vertex_count(), 6);
        // Both triangles share the first corner in the source but own their
        // copies in the soup.
        assert_eq!(mesh.position(0), mesh.position(3));
    }

    #[test]
    fn rejects_corners_without_texcoords() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let err = parse_obj(text).unwrap_err();
        assert!(matches!(err, MuserError::ObjParse { line: 4, .. }));
    }

    #[test]
    fn rejects_out_of_range_indices() {
        let text = "v 0 0 0\nvt 0 0\nf 1/1 2/1 1/1\n";
        let err = parse_obj(text).unwrap_err();
        assert!(matches!(err, MuserError::ObjParse { line: 3, .. }));
    }

    #[test]
    fn ignores_unknown_keywords() {
        let text = format!("o model\ns off\n{TRIANGLE}");
        assert_eq!(parse_obj(&text).unwrap().triangle_count(), 1);
    }
}
