//! World facade.
//!
//! Owns the heightfield, the road path and the three chunk streamers, and
//! exposes the queries external systems need: ground elevation, surface
//! normals, road centerline and residency. Everything streams around a
//! single observer position passed to [`World::advance`].

use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, WorldConfig};
use crate::decoration::{CatalogError, DecorationBatch, DecorationCatalog, DecorationStreamer};
use crate::heightfield::{HeightField, HeightSample};
use crate::mesh::{Normal3, Vertex3};
use crate::road::{RoadChunk, RoadPath, RoadStreamer};
use crate::streaming::{ChunkStore, Scene, StreamDelta, StreamWindow};
use crate::terrain::{TerrainChunk, TerrainStreamer};

/// Construction failures. Both the configuration and the decoration
/// catalog are checked up front so generation itself stays infallible.
#[derive(Debug, Error)]
pub enum WorldError {
    #[error("configuration rejected: {0}")]
    Config(#[from] ConfigError),
    #[error("decoration catalog rejected: {0}")]
    Catalog(#[from] CatalogError),
}

pub struct World {
    config: WorldConfig,
    field: HeightField,
    path: RoadPath,
    terrain: TerrainStreamer,
    road: RoadStreamer,
    decorations: DecorationStreamer,
}

/// Per-stream deltas from one advance call.
#[derive(Debug, Clone, Default)]
pub struct WorldReport {
    pub terrain: StreamDelta,
    pub road: StreamDelta,
    pub decorations: StreamDelta,
}

impl WorldReport {
    pub fn created(&self) -> usize {
        self.terrain.created.len() + self.road.created.len() + self.decorations.created.len()
    }

    pub fn evicted(&self) -> usize {
        self.terrain.evicted.len() + self.road.evicted.len() + self.decorations.evicted.len()
    }

    pub fn is_quiet(&self) -> bool {
        self.terrain.is_empty() && self.road.is_empty() && self.decorations.is_empty()
    }
}

impl World {
    /// Build a world with the built-in decoration catalog.
    pub fn new(config: WorldConfig) -> Result<Self, WorldError> {
        Self::with_catalog(config, DecorationCatalog::standard())
    }

    pub fn with_catalog(
        config: WorldConfig,
        catalog: DecorationCatalog,
    ) -> Result<Self, WorldError> {
        config.validate()?;
        catalog.validate()?;

        let field = HeightField::new(config.seed, &config.terrain);
        let path = RoadPath::new(config.road.clone());
        let window = StreamWindow::from_settings(&config.streaming);

        let terrain = TerrainStreamer::new(
            window,
            config.streaming.chunk_size,
            config.terrain.resolution,
        );
        let road = RoadStreamer::new(
            StreamWindow::ribbon(&config.streaming),
            config.streaming.chunk_size,
        );
        let decorations = DecorationStreamer::new(
            window,
            config.streaming.chunk_size,
            catalog,
            config.decoration.density,
            config.seed,
        );

        info!(
            "world ready: seed {}, chunk size {}, window +{}/-{} x +/-{}",
            config.seed,
            config.streaming.chunk_size,
            config.streaming.forward_distance,
            config.streaming.behind_distance,
            config.streaming.lateral_distance,
        );

        Ok(Self {
            config,
            field,
            path,
            terrain,
            road,
            decorations,
        })
    }

    /// Move all three streams to the observer position. Terrain first, then
    /// road, then decorations; each stream admits before it evicts.
    pub fn advance<S>(&mut self, observer: Vertex3, scene: &mut S) -> WorldReport
    where
        S: Scene<TerrainChunk> + Scene<RoadChunk> + Scene<DecorationBatch>,
    {
        WorldReport {
            terrain: self
                .terrain
                .advance(&self.field, observer.x, observer.z, scene),
            road: self.road.advance(&self.field, &self.path, observer.z, scene),
            decorations: self
                .decorations
                .advance(&self.field, &self.path, observer.x, observer.z, scene),
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn heightfield(&self) -> &HeightField {
        &self.field
    }

    pub fn road_path(&self) -> &RoadPath {
        &self.path
    }

    /// Ground elevation at (x, z).
    pub fn elevation(&self, x: f32, z: f32) -> f32 {
        self.field.elevation(x, z)
    }

    /// Elevation and slope in one query.
    pub fn sample_ground(&self, x: f32, z: f32) -> HeightSample {
        self.field.sample(x, z)
    }

    pub fn surface_normal(&self, x: f32, z: f32) -> Normal3 {
        self.field.surface_normal(x, z)
    }

    /// Road centerline position at z, shared by meshing and placement.
    pub fn road_center(&self, z: f32) -> Vertex3 {
        self.path.centerline(&self.field, z)
    }

    /// Unsigned lateral distance from the road centerline.
    pub fn road_distance(&self, x: f32, z: f32) -> f32 {
        self.path.lateral_distance(&self.field, x, z)
    }

    pub fn terrain_chunks(&self) -> &ChunkStore<TerrainChunk> {
        self.terrain.store()
    }

    pub fn road_chunks(&self) -> &ChunkStore<RoadChunk> {
        self.road.store()
    }

    pub fn decoration_chunks(&self) -> &ChunkStore<DecorationBatch> {
        self.decorations.store()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoration::Count;
    use crate::streaming::NullScene;

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = WorldConfig::default();
        config.terrain.octaves = 0;
        assert!(matches!(World::new(config), Err(WorldError::Config(_))));
    }

    #[test]
    fn test_with_catalog_rejects_unsamplable_catalog() {
        let mut catalog = DecorationCatalog::standard();
        catalog.categories[0].attempts = Count::new(5, 1);

        let result = World::with_catalog(WorldConfig::default(), catalog);
        assert!(matches!(result, Err(WorldError::Catalog(_))));
    }

    #[test]
    fn test_first_advance_populates_all_streams() {
        let mut world = World::new(WorldConfig::default()).unwrap();

        let report = world.advance(Vertex3::new(0.0, 0.0, 0.0), &mut NullScene);

        assert_eq!(report.terrain.created.len(), 21);
        assert_eq!(report.road.created.len(), 7);
        assert_eq!(report.decorations.created.len(), 21);
        assert_eq!(report.evicted(), 0);
        assert_eq!(world.terrain_chunks().len(), 21);
        assert_eq!(world.road_chunks().len(), 7);
        assert_eq!(world.decoration_chunks().len(), 21);
    }

    #[test]
    fn test_repeat_advance_is_quiet() {
        let mut world = World::new(WorldConfig::default()).unwrap();
        let observer = Vertex3::new(12.0, 0.0, 370.0);

        world.advance(observer, &mut NullScene);
        let report = world.advance(observer, &mut NullScene);

        assert!(report.is_quiet());
    }

    #[test]
    fn test_queries_delegate_to_generators() {
        let world = World::new(WorldConfig::default()).unwrap();

        assert_eq!(world.elevation(10.0, 20.0), world.heightfield().elevation(10.0, 20.0));
        let center = world.road_center(55.0);
        assert_eq!(center.z, 55.0);
        assert!(world.road_distance(center.x, 55.0) < 1e-4);
    }

    #[test]
    fn test_lateral_motion_shifts_terrain_but_not_road() {
        let mut world = World::new(WorldConfig::default()).unwrap();

        world.advance(Vertex3::new(0.0, 0.0, 0.0), &mut NullScene);
        let report = world.advance(Vertex3::new(250.0, 0.0, 0.0), &mut NullScene);

        assert!(!report.terrain.is_empty());
        assert!(report.road.is_empty(), "road ignores lateral movement");
        assert!(!report.decorations.is_empty());
    }
}
