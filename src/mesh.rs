use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshData {
    pub vertices: Vec<Vertex3>,
    pub indices: Vec<u32>,
    pub normals: Vec<Normal3>,
    pub uvs: Vec<Uv>,
    pub colors: Vec<[f32; 3]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Normal3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Uv {
    pub u: f32,
    pub v: f32,
}

impl Vertex3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn sub(&self, other: &Vertex3) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }

    pub fn cross(&self, other: &Vertex3) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn normalize(&self) -> Normal3 {
        let length = self.length();
        if length > 0.0001 {
            Normal3 {
                x: self.x / length,
                y: self.y / length,
                z: self.z / length,
            }
        } else {
            Normal3 {
                x: 0.0,
                y: 1.0,
                z: 0.0,
            }
        }
    }
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Area-weighted vertex normals accumulated from triangle faces. Vertices
/// shared between triangles receive the blended normal, which is what keeps
/// shading continuous across quad strips.
pub fn compute_smooth_normals(vertices: &[Vertex3], indices: &[u32]) -> Vec<Normal3> {
    let mut accumulators: Vec<(f32, f32, f32)> = vec![(0.0, 0.0, 0.0); vertices.len()];

    for triangle_idx in (0..indices.len()).step_by(3) {
        let i0 = indices[triangle_idx] as usize;
        let i1 = indices[triangle_idx + 1] as usize;
        let i2 = indices[triangle_idx + 2] as usize;

        let v0 = &vertices[i0];
        let v1 = &vertices[i1];
        let v2 = &vertices[i2];

        let edge1 = v1.sub(v0);
        let edge2 = v2.sub(v0);
        let face_normal = edge1.cross(&edge2).normalize();

        for idx in [i0, i1, i2] {
            accumulators[idx].0 += face_normal.x;
            accumulators[idx].1 += face_normal.y;
            accumulators[idx].2 += face_normal.z;
        }
    }

    accumulators
        .iter()
        .map(|acc| Vertex3::new(acc.0, acc.1, acc.2).normalize())
        .collect()
}
