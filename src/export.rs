//! Mesh export for inspecting captured world geometry in external viewers.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::mesh::{MeshData, Vertex3};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Wavefront OBJ document holding every mesh as a named object. Vertex,
/// texture and normal indices share one global numbering, offset per mesh.
pub fn meshes_to_obj(meshes: &[(String, &MeshData)]) -> String {
    let mut obj = String::new();
    obj.push_str("# Valedrive world export\n\n");

    let mut base = 1usize;
    for (name, mesh) in meshes {
        obj.push_str(&format!("o {}\n", name));

        for vertex in &mesh.vertices {
            obj.push_str(&format!("v {} {} {}\n", vertex.x, vertex.y, vertex.z));
        }
        for uv in &mesh.uvs {
            obj.push_str(&format!("vt {} {}\n", uv.u, uv.v));
        }
        for normal in &mesh.normals {
            obj.push_str(&format!("vn {} {} {}\n", normal.x, normal.y, normal.z));
        }

        for triangle_idx in (0..mesh.indices.len()).step_by(3) {
            let i0 = mesh.indices[triangle_idx] as usize + base;
            let i1 = mesh.indices[triangle_idx + 1] as usize + base;
            let i2 = mesh.indices[triangle_idx + 2] as usize + base;

            obj.push_str(&format!(
                "f {}/{}/{} {}/{}/{} {}/{}/{}\n",
                i0, i0, i0, i1, i1, i1, i2, i2, i2
            ));
        }

        obj.push('\n');
        base += mesh.vertices.len();
    }

    obj
}

pub fn write_obj<P: AsRef<Path>>(path: P, meshes: &[(String, &MeshData)]) -> Result<(), ExportError> {
    fs::write(path, meshes_to_obj(meshes))?;
    Ok(())
}

/// glTF 2.0 JSON for a single mesh: POSITION, NORMAL and TEXCOORD_0
/// accessors plus indices, with buffer views laid out back to back.
pub fn mesh_to_gltf_json(mesh: &MeshData, name: &str) -> String {
    let positions_len = mesh.vertices.len() * 12;
    let normals_len = mesh.normals.len() * 12;
    let uvs_len = mesh.uvs.len() * 8;
    let indices_len = mesh.indices.len() * 4;

    serde_json::json!({
        "asset": {
            "version": "2.0",
            "generator": "valedrive-world"
        },
        "scene": 0,
        "scenes": [{"nodes": [0]}],
        "nodes": [{
            "mesh": 0,
            "name": name
        }],
        "meshes": [{
            "primitives": [{
                "attributes": {
                    "POSITION": 0,
                    "NORMAL": 1,
                    "TEXCOORD_0": 2
                },
                "indices": 3
            }]
        }],
        "accessors": [
            {
                "bufferView": 0,
                "componentType": 5126,
                "count": mesh.vertices.len(),
                "type": "VEC3",
                "max": bounds_max(&mesh.vertices),
                "min": bounds_min(&mesh.vertices)
            },
            {
                "bufferView": 1,
                "componentType": 5126,
                "count": mesh.normals.len(),
                "type": "VEC3"
            },
            {
                "bufferView": 2,
                "componentType": 5126,
                "count": mesh.uvs.len(),
                "type": "VEC2"
            },
            {
                "bufferView": 3,
                "componentType": 5125,
                "count": mesh.indices.len(),
                "type": "SCALAR"
            }
        ],
        "bufferViews": [
            {"buffer": 0, "byteOffset": 0, "byteLength": positions_len},
            {"buffer": 0, "byteOffset": positions_len, "byteLength": normals_len},
            {"buffer": 0, "byteOffset": positions_len + normals_len, "byteLength": uvs_len},
            {"buffer": 0, "byteOffset": positions_len + normals_len + uvs_len, "byteLength": indices_len}
        ],
        "buffers": [{
            "byteLength": positions_len + normals_len + uvs_len + indices_len
        }]
    })
    .to_string()
}

fn bounds_max(vertices: &[Vertex3]) -> Vec<f32> {
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;
    let mut max_z = f32::MIN;

    for v in vertices {
        max_x = max_x.max(v.x);
        max_y = max_y.max(v.y);
        max_z = max_z.max(v.z);
    }

    vec![max_x, max_y, max_z]
}

fn bounds_min(vertices: &[Vertex3]) -> Vec<f32> {
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    let mut min_z = f32::MAX;

    for v in vertices {
        min_x = min_x.min(v.x);
        min_y = min_y.min(v.y);
        min_z = min_z.min(v.z);
    }

    vec![min_x, min_y, min_z]
}
