//! Wavefront OBJ loading
//!
//! Supports `v`, `vt`, `vn` and `f`. Face corners may be `v`, `v/t`,
//! `v//n` or `v/t/n`; indices are 1-based, negative indices count back
//! from the most recent element. Polygons are split into a triangle fan.
//! Anything else (`o`, `g`, `s`, `usemtl`, ...) is ignored.

use std::fs;
use std::path::Path;
use std::rc::Rc;
use crate::rasterizer::{Mesh, Point3, Texture, Triangle, Vec2, Vec3, Vertex};

/// Error type for OBJ loading
#[derive(Debug)]
pub enum ObjError {
    IoError(std::io::Error),
    /// Malformed statement (1-based line number)
    ParseError { line: usize, message: String },
    /// Face index that doesn't name an existing element
    IndexError { line: usize, index: i64 },
}

impl From<std::io::Error> for ObjError {
    fn from(e: std::io::Error) -> Self {
        ObjError::IoError(e)
    }
}

impl std::fmt::Display for ObjError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjError::IoError(e) => write!(f, "IO error: {}", e),
            ObjError::ParseError { line, message } => write!(f, "line {}: {}", line, message),
            ObjError::IndexError { line, index } => write!(f, "line {}: index {} out of range", line, index),
        }
    }
}

impl std::error::Error for ObjError {}

/// Load a mesh from an OBJ file. The mesh is named after the file.
pub fn load_obj<P: AsRef<Path>>(path: P, texture: Option<Rc<Texture>>) -> Result<Mesh, ObjError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let mesh = parse_obj(&contents, &name, texture)?;
    log::info!("loaded {} ({} triangles)", path.display(), mesh.len());
    Ok(mesh)
}

/// Parse OBJ source text
pub fn parse_obj(source: &str, name: &str, texture: Option<Rc<Texture>>) -> Result<Mesh, ObjError> {
    let mut positions: Vec<Point3> = Vec::new();
    let mut uvs: Vec<Vec2> = Vec::new();
    let mut normals: Vec<Vec3> = Vec::new();
    let mut triangles = Vec::new();

    for (i, raw) in source.lines().enumerate() {
        let line = i + 1;
        let content = raw.split('#').next().unwrap_or("");
        let mut tokens = content.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };
        let args: Vec<&str> = tokens.collect();

        match keyword {
            "v" => {
                let [x, y, z] = floats::<3>(&args, 3, line)?;
                positions.push(Point3::new(x, y, z));
            }
            "vt" => {
                let [u, v] = floats::<2>(&args, 1, line)?;
                uvs.push(Vec2::new(u, v));
            }
            "vn" => {
                let [x, y, z] = floats::<3>(&args, 3, line)?;
                normals.push(Vec3::new(x, y, z));
            }
            "f" => {
                if args.len() < 3 {
                    return Err(ObjError::ParseError {
                        line,
                        message: format!("face needs at least 3 corners, got {}", args.len()),
                    });
                }
                let corners = args
                    .iter()
                    .map(|c| corner(c, &positions, &uvs, &normals, line))
                    .collect::<Result<Vec<Vertex>, ObjError>>()?;

                for k in 1..corners.len() - 1 {
                    let verts = [corners[0], corners[k], corners[k + 1]];
                    triangles.push(match &texture {
                        Some(tex) => Triangle::with_texture(verts, tex.clone()),
                        None => Triangle::new(verts),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(Mesh::new(name, triangles))
}

/// First `N` numbers of `args`; at least `required` must be present,
/// the rest default to 0
fn floats<const N: usize>(args: &[&str], required: usize, line: usize) -> Result<[f32; N], ObjError> {
    if args.len() < required {
        return Err(ObjError::ParseError {
            line,
            message: format!("expected {} numbers, got {}", required, args.len()),
        });
    }
    let mut out = [0.0; N];
    for (slot, arg) in out.iter_mut().zip(args) {
        *slot = arg.parse().map_err(|_| ObjError::ParseError {
            line,
            message: format!("invalid number '{}'", arg),
        })?;
    }
    Ok(out)
}

/// One face corner: `v`, `v/t`, `v//n` or `v/t/n`
fn corner(
    token: &str,
    positions: &[Point3],
    uvs: &[Vec2],
    normals: &[Vec3],
    line: usize,
) -> Result<Vertex, ObjError> {
    let mut parts = token.split('/');
    let pos = match parts.next() {
        Some(p) if !p.is_empty() => lookup(positions, p, line)?,
        _ => {
            return Err(ObjError::ParseError {
                line,
                message: format!("face corner '{}' has no position", token),
            })
        }
    };
    let uv = match parts.next() {
        Some(t) if !t.is_empty() => lookup(uvs, t, line)?,
        _ => Vec2::default(),
    };
    let normal = match parts.next() {
        Some(n) if !n.is_empty() => lookup(normals, n, line)?,
        _ => Vec3::ZERO,
    };

    Ok(Vertex::new(pos, uv, normal))
}

fn lookup<T: Copy>(items: &[T], token: &str, line: usize) -> Result<T, ObjError> {
    let index: i64 = token.parse().map_err(|_| ObjError::ParseError {
        line,
        message: format!("invalid index '{}'", token),
    })?;

    let resolved = match index {
        i if i > 0 => Some(i - 1),
        i if i < 0 => Some(items.len() as i64 + i),
        _ => None,
    };

    resolved
        .filter(|&i| i >= 0 && (i as usize) < items.len())
        .map(|i| items[i as usize])
        .ok_or(ObjError::IndexError { line, index })
}
