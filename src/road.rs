//! Valley-following road ribbon.
//!
//! The centerline is a pure function of z: a coarse lattice of valley
//! anchors is resolved by scanning elevations across a fixed band, then a
//! Catmull-Rom spline through four surrounding anchors smooths the raw
//! argmin jumps. Mesh generation, placement queries and the demo vehicle all
//! go through [`RoadPath::centerline`], so they can never disagree about
//! where the road is.

use crate::config::RoadSettings;
use crate::heightfield::HeightField;
use crate::mesh::{compute_smooth_normals, MeshData, Uv, Vertex3};
use crate::streaming::{ChunkKey, ChunkStore, Scene, StreamDelta, StreamWindow};

/// Flat asphalt tint applied per vertex.
const ROAD_COLOR: [f32; 3] = [184.0 / 255.0, 168.0 / 255.0, 154.0 / 255.0];

pub struct RoadPath {
    settings: RoadSettings,
}

impl RoadPath {
    pub fn new(settings: RoadSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RoadSettings {
        &self.settings
    }

    /// Raw valley anchor at lattice index `index` (z = index * sample_spacing).
    ///
    /// Probes the elevation band left to right in fixed steps and keeps the
    /// first minimum encountered, then adds the sinusoidal sweep so the road
    /// curves even through straight valleys. The anchor height comes from the
    /// probed minimum, not the swept position.
    fn lattice_point(&self, field: &HeightField, index: i64) -> Vertex3 {
        let s = &self.settings;
        let z = index as f32 * s.sample_spacing;

        let probes = (2.0 * s.search_half_width / s.search_step).round() as i32;
        let mut lowest_x = -s.search_half_width;
        let mut lowest_height = f32::INFINITY;

        for i in 0..=probes {
            let x = -s.search_half_width + i as f32 * s.search_step;
            let height = field.elevation(x, z);
            if height < lowest_height {
                lowest_height = height;
                lowest_x = x;
            }
        }

        let x = lowest_x + s.curve_amplitude * (z * s.curve_frequency).sin();
        Vertex3::new(x, lowest_height + s.clearance, z)
    }

    /// Centerline position at any z, interpolated through the four lattice
    /// anchors surrounding it. The returned z is the query z unchanged.
    pub fn centerline(&self, field: &HeightField, z: f32) -> Vertex3 {
        let spacing = self.settings.sample_spacing;
        let segment = (z / spacing).floor();
        let t = (z - segment * spacing) / spacing;
        let index = segment as i64;

        let p0 = self.lattice_point(field, index - 1);
        let p1 = self.lattice_point(field, index);
        let p2 = self.lattice_point(field, index + 1);
        let p3 = self.lattice_point(field, index + 2);

        Vertex3::new(
            catmull_rom(p0.x, p1.x, p2.x, p3.x, t),
            catmull_rom(p0.y, p1.y, p2.y, p3.y, t),
            z,
        )
    }

    /// Unsigned lateral distance from the centerline at the same z.
    pub fn lateral_distance(&self, field: &HeightField, x: f32, z: f32) -> f32 {
        (x - self.centerline(field, z).x).abs()
    }

    /// Ribbon mesh covering one chunk span along z, sampled every
    /// `segment_length` units with the boundary sample included on both
    /// ends. Seam tangents are taken from the global centerline on both
    /// sides of the boundary, so adjacent chunks emit identical seam
    /// vertices and the ribbon tiles without cracks.
    pub fn build_chunk_mesh(&self, field: &HeightField, chunk_z: i32, chunk_size: f32) -> MeshData {
        let s = &self.settings;
        let z_start = chunk_z as f32 * chunk_size;
        let segments = (chunk_size / s.segment_length).round() as usize;
        let count = segments + 1;

        let mut centers = Vec::with_capacity(count);
        for i in 0..count {
            centers.push(self.centerline(field, z_start + i as f32 * s.segment_length));
        }

        let half_width = s.width / 2.0;
        let mut vertices = Vec::with_capacity(count * 2);
        let mut uvs = Vec::with_capacity(count * 2);

        for (i, point) in centers.iter().enumerate() {
            // Seam samples take a central difference through the global
            // centerline; the neighboring chunk evaluates the same two
            // points at its matching edge, so the offset vertices agree
            // exactly. Interior samples use a forward difference.
            let (tip, tail) = if i == 0 || i + 1 == count {
                (
                    self.centerline(field, point.z + s.segment_length),
                    self.centerline(field, point.z - s.segment_length),
                )
            } else {
                (centers[i + 1], *point)
            };
            let forward = tip.sub(&tail).normalize();
            let right = Vertex3::new(-forward.z, 0.0, forward.x).normalize();

            vertices.push(Vertex3::new(
                point.x + right.x * half_width,
                point.y,
                point.z + right.z * half_width,
            ));
            vertices.push(Vertex3::new(
                point.x - right.x * half_width,
                point.y,
                point.z - right.z * half_width,
            ));

            let v = i as f32 / count as f32;
            uvs.push(Uv { u: 0.0, v });
            uvs.push(Uv { u: 1.0, v });
        }

        let mut indices = Vec::with_capacity(segments * 6);
        for i in 0..segments {
            let base = (i * 2) as u32;
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 1, base + 3, base + 2]);
        }

        let normals = compute_smooth_normals(&vertices, &indices);
        let colors = vec![ROAD_COLOR; vertices.len()];

        MeshData {
            vertices,
            indices,
            normals,
            uvs,
            colors,
        }
    }
}

fn catmull_rom(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;

    0.5 * ((2.0 * p1)
        + (-p0 + p2) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3)
}

/// One resident span of road ribbon.
pub struct RoadChunk {
    pub key: ChunkKey,
    pub mesh: MeshData,
}

/// Streams ribbon chunks along the direction of travel. Road keys always
/// carry x = 0; the ribbon wanders laterally wherever the valley goes, so
/// the observer's lateral position plays no part in admission.
pub struct RoadStreamer {
    store: ChunkStore<RoadChunk>,
    chunk_size: f32,
}

impl RoadStreamer {
    pub fn new(window: StreamWindow, chunk_size: f32) -> Self {
        Self {
            store: ChunkStore::new("road", window),
            chunk_size,
        }
    }

    pub fn advance<S: Scene<RoadChunk>>(
        &mut self,
        field: &HeightField,
        path: &RoadPath,
        observer_z: f32,
        scene: &mut S,
    ) -> StreamDelta {
        let center = ChunkKey::new(0, (observer_z / self.chunk_size).floor() as i32);
        let chunk_size = self.chunk_size;

        self.store.advance(
            center,
            |key| RoadChunk {
                key,
                mesh: path.build_chunk_mesh(field, key.z, chunk_size),
            },
            scene,
        )
    }

    pub fn store(&self) -> &ChunkStore<RoadChunk> {
        &self.store
    }
}
