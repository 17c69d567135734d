/// Wavefront OBJ loading.
///
/// Supports `v`, `vn` and `f` records. Face tokens may be `v`, `v/vt`,
/// `v//vn` or `v/vt/vn`; indices are 1-based, negative indices count back
/// from the most recent vertex. Polygons are fan-triangulated.
use super::mesh::{Mesh, Triangle, DEFAULT_COLOR};
use glam::Vec3;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObjError {
    #[error("failed to read OBJ data: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("line {line}: index {index} does not reference a defined element")]
    IndexOutOfRange { line: usize, index: i64 },
}

/// Load an OBJ file from disk.
pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<Mesh, ObjError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mesh = parse_obj(BufReader::new(file))?;
    log::info!("Loaded model {} ({} triangles)", path.display(), mesh.len());
    Ok(mesh)
}

/// Parse OBJ data from any buffered reader.
pub fn parse_obj<R: BufRead>(reader: R) -> Result<Mesh, ObjError> {
    let mut positions: Vec<Vec3> = Vec::new();
    let mut normals: Vec<Vec3> = Vec::new();
    let mut triangles: Vec<Triangle> = Vec::new();

    for (line_idx, line) in reader.lines().enumerate() {
        let line_no = line_idx + 1;
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => positions.push(parse_vec3(&mut tokens, line_no)?),
            Some("vn") => normals.push(parse_vec3(&mut tokens, line_no)?.normalize_or_zero()),
            Some("f") => {
                let mut corners = Vec::with_capacity(4);
                for token in tokens {
                    corners.push(parse_corner(token, line_no, &positions, &normals)?);
                }
                if corners.len() < 3 {
                    return Err(ObjError::Parse {
                        line: line_no,
                        message: format!("face needs at least 3 vertices, got {}", corners.len()),
                    });
                }

                for i in 1..corners.len() - 1 {
                    let (a, b, c) = (corners[0], corners[i], corners[i + 1]);
                    let mut tri = Triangle::new(a.0, b.0, c.0, DEFAULT_COLOR);
                    if let (Some(na), Some(nb), Some(nc)) = (a.1, b.1, c.1) {
                        tri = tri.with_normals([na, nb, nc]);
                    }
                    triangles.push(tri);
                }
            }
            // Texture coordinates, groups, materials and smoothing are not used.
            _ => {}
        }
    }

    Ok(Mesh::new(triangles))
}

fn parse_vec3<'a, I: Iterator<Item = &'a str>>(tokens: &mut I, line: usize) -> Result<Vec3, ObjError> {
    let mut values = [0.0f32; 3];
    for value in &mut values {
        let token = tokens.next().ok_or_else(|| ObjError::Parse {
            line,
            message: "expected 3 components".to_string(),
        })?;
        *value = token.parse().map_err(|_| ObjError::Parse {
            line,
            message: format!("invalid number '{token}'"),
        })?;
    }
    Ok(Vec3::from_array(values))
}

fn parse_corner(
    token: &str,
    line: usize,
    positions: &[Vec3],
    normals: &[Vec3],
) -> Result<(Vec3, Option<Vec3>), ObjError> {
    let mut parts = token.split('/');
    let position_ref = parts.next().unwrap_or_default();
    let _texcoord_ref = parts.next();
    let normal_ref = parts.next().filter(|s| !s.is_empty());

    let position = positions[resolve_index(position_ref, line, positions.len())?];
    let normal = match normal_ref {
        Some(r) => Some(normals[resolve_index(r, line, normals.len())?]),
        None => None,
    };
    Ok((position, normal))
}

fn resolve_index(token: &str, line: usize, len: usize) -> Result<usize, ObjError> {
    let index: i64 = token.parse().map_err(|_| ObjError::Parse {
        line,
        message: format!("invalid index '{token}'"),
    })?;

    let resolved = match index {
        i if i > 0 => i - 1,
        i if i < 0 => len as i64 + i,
        _ => -1,
    };

    if resolved < 0 || resolved >= len as i64 {
        return Err(ObjError::IndexOutOfRange { line, index });
    }
    Ok(resolved as usize)
}
