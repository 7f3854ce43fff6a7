//! Chunk residency tracking shared by the terrain, road and decoration
//! streamers.
//!
//! A [`ChunkStore`] owns the artifacts for every resident chunk and keeps two
//! rectangular windows around the observer: the admission window (chunks that
//! must exist) and the larger retention window (chunks allowed to linger).
//! Admission runs before eviction on every advance, so a chunk created this
//! call is never disposed in the same call.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::StreamingSettings;

/// Integer chunk coordinate. World position (x, z) falls in the chunk at
/// (floor(x / size), floor(z / size)).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ChunkKey {
    pub x: i32,
    pub z: i32,
}

impl ChunkKey {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Key of the chunk containing a world position.
    pub fn containing(x: f32, z: f32, chunk_size: f32) -> Self {
        Self {
            x: (x / chunk_size).floor() as i32,
            z: (z / chunk_size).floor() as i32,
        }
    }

    /// World position of the chunk's minimum corner.
    pub fn origin(&self, chunk_size: f32) -> (f32, f32) {
        (self.x as f32 * chunk_size, self.z as f32 * chunk_size)
    }
}

/// Admission and retention spans in whole chunks, relative to the chunk
/// containing the observer. Forward is +z.
///
/// The admission span is deliberately deeper ahead than behind: the observer
/// in a driving world overwhelmingly moves toward +z, so chunks behind it are
/// admitted shallowly and evicted late. Retention has no forward bound;
/// chunks ahead simply stop being admitted once the window moves past them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamWindow {
    pub forward: i32,
    pub behind: i32,
    pub lateral: i32,
    pub dispose_behind: i32,
    pub dispose_lateral: i32,
}

impl StreamWindow {
    pub fn from_settings(settings: &StreamingSettings) -> Self {
        Self {
            forward: settings.forward_distance,
            behind: settings.behind_distance,
            lateral: settings.lateral_distance,
            dispose_behind: settings.dispose_distance,
            dispose_lateral: settings.dispose_lateral,
        }
    }

    /// Window for artifacts that stream along z only, like the road ribbon.
    /// Lateral spans collapse to zero; every key is expected at x = 0.
    pub fn ribbon(settings: &StreamingSettings) -> Self {
        Self {
            forward: settings.forward_distance,
            behind: settings.behind_distance,
            lateral: 0,
            dispose_behind: settings.dispose_distance,
            dispose_lateral: 0,
        }
    }

    /// True when `key` falls inside the admission window around `center`.
    pub fn admits(&self, center: ChunkKey, key: ChunkKey) -> bool {
        let dx = key.x - center.x;
        let dz = key.z - center.z;
        dx.abs() <= self.lateral && dz >= -self.behind && dz <= self.forward
    }

    /// True when `key` may stay resident with the observer at `center`.
    /// Always implied by [`admits`](Self::admits) for validated settings.
    pub fn retains(&self, center: ChunkKey, key: ChunkKey) -> bool {
        let dx = key.x - center.x;
        let dz = key.z - center.z;
        dx.abs() <= self.dispose_lateral && dz >= -self.dispose_behind
    }

    /// Every key inside the admission window, in row-major order from the
    /// rearmost row forward.
    pub fn admitted(&self, center: ChunkKey) -> Vec<ChunkKey> {
        let rows = (self.behind + self.forward + 1) as usize;
        let cols = (2 * self.lateral + 1) as usize;
        let mut keys = Vec::with_capacity(rows * cols);

        for dz in -self.behind..=self.forward {
            for dx in -self.lateral..=self.lateral {
                keys.push(ChunkKey::new(center.x + dx, center.z + dz));
            }
        }

        keys
    }
}

/// Receives artifacts as they enter and leave residency. Implemented by
/// whatever holds the renderer-facing handles; generation code never touches
/// anything global.
pub trait Scene<A> {
    fn register(&mut self, key: ChunkKey, artifact: &A);
    fn unregister(&mut self, key: ChunkKey, artifact: &A);
}

/// Scene that discards every notification. Useful headless and in tests.
pub struct NullScene;

impl<A> Scene<A> for NullScene {
    fn register(&mut self, _key: ChunkKey, _artifact: &A) {}
    fn unregister(&mut self, _key: ChunkKey, _artifact: &A) {}
}

/// Keys created and evicted by one advance call, each sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamDelta {
    pub created: Vec<ChunkKey>,
    pub evicted: Vec<ChunkKey>,
}

impl StreamDelta {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.evicted.is_empty()
    }
}

/// Owns every resident artifact for one artifact kind and moves the stream
/// window on demand.
pub struct ChunkStore<A> {
    label: &'static str,
    window: StreamWindow,
    resident: HashMap<ChunkKey, A>,
}

impl<A> ChunkStore<A> {
    pub fn new(label: &'static str, window: StreamWindow) -> Self {
        Self {
            label,
            window,
            resident: HashMap::new(),
        }
    }

    /// Move the window to `center`. Missing admitted chunks are generated and
    /// registered; resident chunks outside the retention window are
    /// unregistered and dropped. Calling again with the same center does
    /// nothing and returns an empty delta.
    pub fn advance<G, S>(&mut self, center: ChunkKey, mut generate: G, scene: &mut S) -> StreamDelta
    where
        G: FnMut(ChunkKey) -> A,
        S: Scene<A>,
    {
        let mut delta = StreamDelta::default();

        for key in self.window.admitted(center) {
            if self.resident.contains_key(&key) {
                continue;
            }
            let artifact = generate(key);
            scene.register(key, &artifact);
            self.resident.insert(key, artifact);
            delta.created.push(key);
        }

        let stale: Vec<ChunkKey> = self
            .resident
            .keys()
            .filter(|key| !self.window.retains(center, **key))
            .copied()
            .collect();

        for key in stale {
            // Residency and registration move together; a key scanned a
            // moment ago must still map to its artifact.
            let artifact = self
                .resident
                .remove(&key)
                .expect("resident key vanished during eviction scan");
            scene.unregister(key, &artifact);
            delta.evicted.push(key);
        }

        delta.created.sort();
        delta.evicted.sort();

        if !delta.is_empty() {
            debug!(
                "{} stream: center ({}, {}), +{} -{}, {} resident",
                self.label,
                center.x,
                center.z,
                delta.created.len(),
                delta.evicted.len(),
                self.resident.len()
            );
        }

        delta
    }

    pub fn contains(&self, key: &ChunkKey) -> bool {
        self.resident.contains_key(key)
    }

    pub fn get(&self, key: &ChunkKey) -> Option<&A> {
        self.resident.get(key)
    }

    pub fn len(&self) -> usize {
        self.resident.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resident.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = ChunkKey> + '_ {
        self.resident.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ChunkKey, &A)> {
        self.resident.iter()
    }
}
