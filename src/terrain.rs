//! Streamed ground geometry.
//!
//! Each chunk is a square vertex grid sampled straight from the
//! [`HeightField`]. Grid positions along a shared border are computed from
//! the same expression in both neighbors, so border elevations agree to the
//! bit and chunks tile without stitching or skirts.

use crate::heightfield::HeightField;
use crate::mesh::{compute_smooth_normals, MeshData, Uv, Vertex3};
use crate::streaming::{ChunkKey, ChunkStore, Scene, StreamDelta, StreamWindow};

// Meadow-to-ridge ramp. Low ground is a warm green, high ground fades
// toward grey-green.
const COLOR_LOW: [f32; 3] = [200.0 / 255.0, 213.0 / 255.0, 168.0 / 255.0];
const COLOR_MID: [f32; 3] = [184.0 / 255.0, 200.0 / 255.0, 160.0 / 255.0];
const COLOR_HIGH: [f32; 3] = [168.0 / 255.0, 184.0 / 255.0, 160.0 / 255.0];

/// Elevation mapped into the ramp: -40 and below is all low color, +80 and
/// above all high color, with the midpoint at +20.
const RAMP_OFFSET: f32 = 40.0;
const RAMP_SPAN: f32 = 120.0;

/// Vertex tint for a given ground elevation.
pub fn height_color(elevation: f32) -> [f32; 3] {
    let normalized = ((elevation + RAMP_OFFSET) / RAMP_SPAN).clamp(0.0, 1.0);
    if normalized < 0.5 {
        lerp_color(COLOR_LOW, COLOR_MID, normalized * 2.0)
    } else {
        lerp_color(COLOR_MID, COLOR_HIGH, (normalized - 0.5) * 2.0)
    }
}

fn lerp_color(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

/// One resident square of ground.
pub struct TerrainChunk {
    pub key: ChunkKey,
    pub mesh: MeshData,
}

/// Build the ground mesh for one chunk. `resolution` is vertices per side;
/// boundary rows and columns land exactly on chunk borders.
pub fn build_terrain_chunk(
    field: &HeightField,
    key: ChunkKey,
    chunk_size: f32,
    resolution: u32,
) -> TerrainChunk {
    let res = resolution as usize;
    let (origin_x, origin_z) = key.origin(chunk_size);
    let last = (resolution - 1) as f32;

    let mut vertices = Vec::with_capacity(res * res);
    let mut uvs = Vec::with_capacity(res * res);
    let mut colors = Vec::with_capacity(res * res);

    for iz in 0..res {
        for ix in 0..res {
            // Ratio form, not accumulated spacing: ix == last yields exactly
            // origin + chunk_size, the neighboring chunk's first column.
            let u = ix as f32 / last;
            let v = iz as f32 / last;
            let x = origin_x + u * chunk_size;
            let z = origin_z + v * chunk_size;
            let elevation = field.elevation(x, z);

            vertices.push(Vertex3::new(x, elevation, z));
            uvs.push(Uv { u, v });
            colors.push(height_color(elevation));
        }
    }

    let mut indices = Vec::with_capacity((res - 1) * (res - 1) * 6);
    for iz in 0..res - 1 {
        for ix in 0..res - 1 {
            let a = (iz * res + ix) as u32;
            let b = a + 1;
            let c = a + res as u32;
            let d = c + 1;
            indices.extend_from_slice(&[a, c, b, b, c, d]);
        }
    }

    let normals = compute_smooth_normals(&vertices, &indices);

    TerrainChunk {
        key,
        mesh: MeshData {
            vertices,
            indices,
            normals,
            uvs,
            colors,
        },
    }
}

/// Streams ground chunks in the full two-dimensional window around the
/// observer.
pub struct TerrainStreamer {
    store: ChunkStore<TerrainChunk>,
    chunk_size: f32,
    resolution: u32,
}

impl TerrainStreamer {
    pub fn new(window: StreamWindow, chunk_size: f32, resolution: u32) -> Self {
        Self {
            store: ChunkStore::new("terrain", window),
            chunk_size,
            resolution,
        }
    }

    pub fn advance<S: Scene<TerrainChunk>>(
        &mut self,
        field: &HeightField,
        observer_x: f32,
        observer_z: f32,
        scene: &mut S,
    ) -> StreamDelta {
        let center = ChunkKey::containing(observer_x, observer_z, self.chunk_size);
        let chunk_size = self.chunk_size;
        let resolution = self.resolution;

        self.store.advance(
            center,
            |key| build_terrain_chunk(field, key, chunk_size, resolution),
            scene,
        )
    }

    pub fn store(&self) -> &ChunkStore<TerrainChunk> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::streaming::NullScene;

    fn field() -> HeightField {
        let config = WorldConfig::default();
        HeightField::new(config.seed, &config.terrain)
    }

    #[test]
    fn test_chunk_grid_dimensions() {
        let chunk = build_terrain_chunk(&field(), ChunkKey::new(0, 0), 200.0, 64);

        assert_eq!(chunk.mesh.vertices.len(), 64 * 64);
        assert_eq!(chunk.mesh.indices.len(), 63 * 63 * 6);
        assert_eq!(chunk.mesh.normals.len(), 64 * 64);
        assert_eq!(chunk.mesh.uvs.len(), 64 * 64);
        assert_eq!(chunk.mesh.colors.len(), 64 * 64);
    }

    #[test]
    fn test_chunk_covers_its_footprint() {
        let chunk = build_terrain_chunk(&field(), ChunkKey::new(2, -1), 200.0, 64);

        let first = chunk.mesh.vertices[0];
        let last = chunk.mesh.vertices[64 * 64 - 1];
        assert_eq!(first.x, 400.0);
        assert_eq!(first.z, -200.0);
        assert_eq!(last.x, 600.0);
        assert_eq!(last.z, 0.0);
    }

    #[test]
    fn test_adjacent_chunks_share_border_exactly() {
        let field = field();
        let west = build_terrain_chunk(&field, ChunkKey::new(0, 0), 200.0, 64);
        let east = build_terrain_chunk(&field, ChunkKey::new(1, 0), 200.0, 64);

        for iz in 0..64usize {
            let west_edge = west.mesh.vertices[iz * 64 + 63];
            let east_edge = east.mesh.vertices[iz * 64];
            assert_eq!(west_edge.x, east_edge.x);
            assert_eq!(west_edge.z, east_edge.z);
            assert_eq!(west_edge.y, east_edge.y, "border elevation diverged at row {}", iz);
        }
    }

    #[test]
    fn test_chunk_vertices_match_heightfield() {
        let field = field();
        let chunk = build_terrain_chunk(&field, ChunkKey::new(-1, 3), 200.0, 64);

        for vertex in chunk.mesh.vertices.iter().step_by(97) {
            assert_eq!(vertex.y, field.elevation(vertex.x, vertex.z));
        }
    }

    #[test]
    fn test_normals_point_upward() {
        let chunk = build_terrain_chunk(&field(), ChunkKey::new(0, 1), 200.0, 64);

        for normal in &chunk.mesh.normals {
            assert!(normal.y > 0.0, "ground normal pointing down");
        }
    }

    #[test]
    fn test_height_color_endpoints() {
        assert_eq!(height_color(-40.0), COLOR_LOW);
        assert_eq!(height_color(-200.0), COLOR_LOW);
        assert_eq!(height_color(20.0), COLOR_MID);
        for channel in 0..3 {
            assert!((height_color(80.0)[channel] - COLOR_HIGH[channel]).abs() < 1e-6);
            assert!((height_color(500.0)[channel] - COLOR_HIGH[channel]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_height_color_stays_in_unit_range() {
        for i in -100..100 {
            let color = height_color(i as f32);
            for channel in color {
                assert!((0.0..=1.0).contains(&channel));
            }
        }
    }

    #[test]
    fn test_streamer_admits_full_window() {
        let config = WorldConfig::default();
        let field = HeightField::new(config.seed, &config.terrain);
        let mut streamer = TerrainStreamer::new(
            crate::streaming::StreamWindow::from_settings(&config.streaming),
            config.streaming.chunk_size,
            16,
        );

        let delta = streamer.advance(&field, 0.0, 0.0, &mut NullScene);

        assert_eq!(delta.created.len(), 21);
        assert!(streamer.store().contains(&ChunkKey::new(-1, -1)));
        assert!(streamer.store().contains(&ChunkKey::new(1, 5)));
        assert!(!streamer.store().contains(&ChunkKey::new(0, 6)));
    }

    #[test]
    fn test_streamer_center_follows_observer() {
        let config = WorldConfig::default();
        let field = HeightField::new(config.seed, &config.terrain);
        let mut streamer = TerrainStreamer::new(
            crate::streaming::StreamWindow::from_settings(&config.streaming),
            config.streaming.chunk_size,
            16,
        );

        streamer.advance(&field, -350.0, 450.0, &mut NullScene);

        // Observer sits in chunk (-2, 2).
        assert!(streamer.store().contains(&ChunkKey::new(-2, 2)));
        assert!(streamer.store().contains(&ChunkKey::new(-3, 7)));
        assert!(!streamer.store().contains(&ChunkKey::new(0, 2)));
    }
}
