//! Wavefront OBJ mesh decoding: positions, texture coordinates and polygon
//! faces (fan-triangulated). Normal references are validated but not kept.

use std::{
    collections::HashMap,
    io::{self, BufRead},
};

use anyhow::{Context, Result, anyhow, bail};

use crate::mesh::{MeshData, MeshVertex};

/// Decode an OBJ mesh from raw file bytes.
pub fn load_obj_from_bytes(bytes: &[u8]) -> Result<MeshData> {
    load_obj_from_reader(io::Cursor::new(bytes))
}

/// Decode an OBJ mesh from any [`BufRead`] source.
pub fn load_obj_from_reader<R: BufRead>(reader: R) -> Result<MeshData> {
    let mut builder = ObjBuilder::default();
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.with_context(|| format!("Failed to read OBJ line {line_no}"))?;
        builder.feed(line.trim(), line_no)?;
    }
    builder.finish()
}

/// Convenience helper to parse an OBJ string literal.
pub fn load_obj_from_str(contents: &str) -> Result<MeshData> {
    load_obj_from_reader(io::Cursor::new(contents))
}

/// Unique (position, texcoord) corner of a face.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
struct Corner {
    position: usize,
    uv: Option<usize>,
}

#[derive(Default)]
struct ObjBuilder {
    positions: Vec<[f32; 3]>,
    normal_count: usize,
    uvs: Vec<[f32; 2]>,
    corners: HashMap<Corner, u32>,
    vertices: Vec<MeshVertex>,
    indices: Vec<u32>,
}

impl ObjBuilder {
    fn feed(&mut self, line: &str, line_no: usize) -> Result<()> {
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => {
                let [x, y, z] = floats::<3>(&mut tokens, line_no)?;
                self.positions.push([x, y, z]);
            }
            Some("vn") => {
                floats::<3>(&mut tokens, line_no)?;
                self.normal_count += 1;
            }
            Some("vt") => {
                let [u, v] = floats::<2>(&mut tokens, line_no)?;
                self.uvs.push([u, v]);
            }
            Some("f") => {
                let polygon = tokens
                    .map(|token| self.corner_index(token, line_no))
                    .collect::<Result<Vec<u32>>>()?;
                // Fan triangulation; degenerate faces are skipped.
                for i in 1..polygon.len().saturating_sub(1) {
                    self.indices
                        .extend_from_slice(&[polygon[0], polygon[i], polygon[i + 1]]);
                }
            }
            // o/g/s/usemtl/mtllib carry nothing the viewer needs.
            _ => {}
        }
        Ok(())
    }

    fn corner_index(&mut self, token: &str, line_no: usize) -> Result<u32> {
        let mut parts = token.split('/');
        let position = resolve(parts.next(), self.positions.len(), line_no)?
            .ok_or_else(|| anyhow!("Face corner '{token}' without position on line {line_no}"))?;
        let uv = resolve(parts.next(), self.uvs.len(), line_no)?;
        resolve(parts.next(), self.normal_count, line_no)?;
        let corner = Corner { position, uv };

        if let Some(&idx) = self.corners.get(&corner) {
            return Ok(idx);
        }

        let idx = u32::try_from(self.vertices.len())
            .map_err(|_| anyhow!("Too many vertices in OBJ (>{})", u32::MAX))?;
        self.vertices.push(MeshVertex::new(
            self.positions[position],
            uv.map(|i| self.uvs[i]).unwrap_or([0.0, 0.0]),
        ));
        self.corners.insert(corner, idx);
        Ok(idx)
    }

    fn finish(self) -> Result<MeshData> {
        if self.vertices.is_empty() || self.indices.is_empty() {
            bail!("OBJ contained no triangles");
        }
        Ok(MeshData::new(self.vertices, self.indices))
    }
}

fn floats<'a, const N: usize>(
    tokens: &mut impl Iterator<Item = &'a str>,
    line_no: usize,
) -> Result<[f32; N]> {
    let mut out = [0.0; N];
    for (i, slot) in out.iter_mut().enumerate() {
        let token = tokens
            .next()
            .ok_or_else(|| anyhow!("Missing component {} on line {line_no}", i + 1))?;
        *slot = token
            .parse()
            .with_context(|| format!("Bad number '{token}' on line {line_no}"))?;
    }
    Ok(out)
}

/// Resolve a 1-based (or negative, relative) OBJ index. Empty tokens mean
/// "not given".
fn resolve(token: Option<&str>, len: usize, line_no: usize) -> Result<Option<usize>> {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    let raw: i64 = token
        .parse()
        .with_context(|| format!("Invalid index '{token}' on line {line_no}"))?;
    let resolved = match raw {
        0 => bail!("OBJ indices are 1-based; found 0 on line {line_no}"),
        r if r > 0 => r - 1,
        r => len as i64 + r,
    };
    if resolved < 0 || resolved as usize >= len {
        bail!("OBJ index {raw} out of bounds (len={len}) on line {line_no}");
    }
    Ok(Some(resolved as usize))
}
