//! Billboard decoration placement.
//!
//! Each chunk draws its own placement stream from a seed derived from the
//! world seed and the chunk key, so a chunk evicted and later revisited
//! regenerates the exact same sprites. Placement rules live in a
//! [`DecorationCatalog`], a plain data table that can be overridden from a
//! YAML file without touching generation code.

use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::heightfield::HeightField;
use crate::mesh::Vertex3;
use crate::road::RoadPath;
use crate::streaming::{ChunkKey, ChunkStore, Scene, StreamDelta, StreamWindow};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid catalog: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecorationKind {
    Tree,
    Rock,
    Grass,
    Cloud,
    Flower,
    Backdrop,
    Shrub,
}

/// Closed floating-point range sampled uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn sample(&self, rng: &mut StdRng) -> f32 {
        if self.max > self.min {
            rng.gen_range(self.min..self.max)
        } else {
            self.min
        }
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

fn invalid(kind: DecorationKind, detail: String) -> CatalogError {
    CatalogError::Invalid(format!("{:?}: {}", kind, detail))
}

fn check_span(kind: DecorationKind, what: &str, span: Span) -> Result<(), CatalogError> {
    if !span.min.is_finite() || !span.max.is_finite() {
        return Err(invalid(kind, format!("{} bounds must be finite", what)));
    }
    if span.max < span.min {
        return Err(invalid(
            kind,
            format!("{} range {}..{} is inverted", what, span.min, span.max),
        ));
    }
    Ok(())
}

/// Inclusive attempt-count range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Count {
    pub min: u32,
    pub max: u32,
}

impl Count {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn sample(&self, rng: &mut StdRng) -> u32 {
        rng.gen_range(self.min..=self.max)
    }
}

/// Optional lateral distance band around the road centerline. Missing
/// bounds are unconstrained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DistanceBand {
    #[serde(default)]
    pub min: Option<f32>,
    #[serde(default)]
    pub max: Option<f32>,
}

impl DistanceBand {
    pub fn accepts(&self, distance: f32) -> bool {
        self.min.map_or(true, |m| distance >= m) && self.max.map_or(true, |m| distance <= m)
    }

    fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    fn validate(&self, kind: DecorationKind) -> Result<(), CatalogError> {
        for bound in [self.min, self.max].into_iter().flatten() {
            if !bound.is_finite() {
                return Err(invalid(kind, "road distance bounds must be finite".to_string()));
            }
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if max < min {
                return Err(invalid(
                    kind,
                    format!("road distance band {}..{} is inverted", min, max),
                ));
            }
        }
        Ok(())
    }
}

/// Optional ground steepness band in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SlopeBand {
    #[serde(default)]
    pub min_deg: Option<f32>,
    #[serde(default)]
    pub max_deg: Option<f32>,
}

impl SlopeBand {
    pub fn accepts(&self, slope_deg: f32) -> bool {
        self.min_deg.map_or(true, |m| slope_deg >= m)
            && self.max_deg.map_or(true, |m| slope_deg <= m)
    }

    fn is_unbounded(&self) -> bool {
        self.min_deg.is_none() && self.max_deg.is_none()
    }

    fn validate(&self, kind: DecorationKind) -> Result<(), CatalogError> {
        for bound in [self.min_deg, self.max_deg].into_iter().flatten() {
            if !bound.is_finite() {
                return Err(invalid(kind, "slope bounds must be finite".to_string()));
            }
        }
        if let (Some(min), Some(max)) = (self.min_deg, self.max_deg) {
            if max < min {
                return Err(invalid(
                    kind,
                    format!("slope band {}..{} is inverted", min, max),
                ));
            }
        }
        Ok(())
    }
}

/// How a category's sprite dimensions are drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FootprintRule {
    /// Square sprite: side = base * scale.
    Square { base: Span, scale: Span },
    /// Width and height drawn independently, both multiplied by one scale.
    Rect { width: Span, height: Span, scale: Span },
    /// Height drawn and scaled; width is a fixed ratio of the final height.
    Portrait {
        height: Span,
        scale: Span,
        width_ratio: f32,
    },
    /// Weighted square size classes.
    Tiered { tiers: Vec<SizeTier> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeTier {
    pub weight: f32,
    pub side: Span,
}

impl FootprintRule {
    fn sample(&self, rng: &mut StdRng) -> (f32, f32) {
        match self {
            FootprintRule::Square { base, scale } => {
                let side = base.sample(rng) * scale.sample(rng);
                (side, side)
            }
            FootprintRule::Rect {
                width,
                height,
                scale,
            } => {
                let w = width.sample(rng);
                let h = height.sample(rng);
                let s = scale.sample(rng);
                (w * s, h * s)
            }
            FootprintRule::Portrait {
                height,
                scale,
                width_ratio,
            } => {
                let h = height.sample(rng) * scale.sample(rng);
                (h * width_ratio, h)
            }
            FootprintRule::Tiered { tiers } => {
                let total: f32 = tiers.iter().map(|t| t.weight).sum();
                let mut roll = rng.gen::<f32>() * total;
                for tier in tiers {
                    if roll < tier.weight {
                        let side = tier.side.sample(rng);
                        return (side, side);
                    }
                    roll -= tier.weight;
                }
                match tiers.last() {
                    Some(tier) => {
                        let side = tier.side.sample(rng);
                        (side, side)
                    }
                    None => (1.0, 1.0),
                }
            }
        }
    }

    fn validate(&self, kind: DecorationKind) -> Result<(), CatalogError> {
        match self {
            FootprintRule::Square { base, scale } => {
                check_span(kind, "base", *base)?;
                check_span(kind, "scale", *scale)
            }
            FootprintRule::Rect {
                width,
                height,
                scale,
            } => {
                check_span(kind, "width", *width)?;
                check_span(kind, "height", *height)?;
                check_span(kind, "scale", *scale)
            }
            FootprintRule::Portrait {
                height,
                scale,
                width_ratio,
            } => {
                check_span(kind, "height", *height)?;
                check_span(kind, "scale", *scale)?;
                if !width_ratio.is_finite() || *width_ratio <= 0.0 {
                    return Err(invalid(
                        kind,
                        format!("width ratio {} is not usable", width_ratio),
                    ));
                }
                Ok(())
            }
            FootprintRule::Tiered { tiers } => {
                if tiers.is_empty() {
                    return Err(invalid(kind, "tiered footprint has no tiers".to_string()));
                }
                for tier in tiers {
                    if !tier.weight.is_finite() || tier.weight <= 0.0 {
                        return Err(invalid(
                            kind,
                            format!("tier weight {} is not usable", tier.weight),
                        ));
                    }
                    check_span(kind, "tier side", tier.side)?;
                }
                Ok(())
            }
        }
    }
}

/// Vertical placement of a category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    /// Resting on the terrain, sprite base at ground level.
    Ground,
    /// Floating in a fixed altitude band, ignoring the terrain.
    Sky { altitude: Span },
    /// Pushed far beyond the chunk along +z as a distant silhouette.
    Horizon { push: Span },
}

impl Default for Anchor {
    fn default() -> Self {
        Anchor::Ground
    }
}

/// Placement rules for one decoration category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpec {
    pub kind: DecorationKind,
    /// Sprite identifiers; one is picked per placement.
    pub sprites: Vec<String>,
    /// Placement attempts per chunk before density scaling.
    pub attempts: Count,
    #[serde(default)]
    pub road_distance: DistanceBand,
    #[serde(default)]
    pub slope: SlopeBand,
    pub footprint: FootprintRule,
    #[serde(default)]
    pub anchor: Anchor,
    #[serde(default)]
    pub random_yaw: bool,
}

impl CategorySpec {
    fn validate(&self) -> Result<(), CatalogError> {
        if self.attempts.min > self.attempts.max {
            return Err(invalid(
                self.kind,
                format!(
                    "attempts range {}..{} is inverted",
                    self.attempts.min, self.attempts.max
                ),
            ));
        }
        self.road_distance.validate(self.kind)?;
        self.slope.validate(self.kind)?;
        self.footprint.validate(self.kind)?;
        match self.anchor {
            Anchor::Ground => Ok(()),
            Anchor::Sky { altitude } => check_span(self.kind, "altitude", altitude),
            Anchor::Horizon { push } => check_span(self.kind, "push", push),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecorationCatalog {
    pub categories: Vec<CategorySpec>,
}

impl DecorationCatalog {
    /// The built-in alpine meadow set: pines on moderate hillsides, rock
    /// clusters in three size classes, grass and wildflowers in verge bands
    /// beside the road, shrubs almost anywhere, clouds overhead and mountain
    /// silhouettes on the horizon.
    pub fn standard() -> Self {
        Self {
            categories: vec![
                CategorySpec {
                    kind: DecorationKind::Tree,
                    sprites: vec!["tree".to_string()],
                    attempts: Count::new(10, 20),
                    road_distance: DistanceBand {
                        min: Some(15.0),
                        max: None,
                    },
                    slope: SlopeBand {
                        min_deg: Some(15.0),
                        max_deg: Some(45.0),
                    },
                    footprint: FootprintRule::Square {
                        base: Span::new(40.0, 80.0),
                        scale: Span::new(0.8, 1.3),
                    },
                    anchor: Anchor::Ground,
                    random_yaw: false,
                },
                CategorySpec {
                    kind: DecorationKind::Rock,
                    sprites: vec![
                        "rock-1".to_string(),
                        "rock-2".to_string(),
                        "rock-3".to_string(),
                    ],
                    attempts: Count::new(30, 50),
                    road_distance: DistanceBand {
                        min: Some(5.0),
                        max: None,
                    },
                    slope: SlopeBand::default(),
                    footprint: FootprintRule::Tiered {
                        tiers: vec![
                            SizeTier {
                                weight: 0.6,
                                side: Span::new(3.0, 5.0),
                            },
                            SizeTier {
                                weight: 0.3,
                                side: Span::new(8.0, 12.0),
                            },
                            SizeTier {
                                weight: 0.1,
                                side: Span::new(15.0, 25.0),
                            },
                        ],
                    },
                    anchor: Anchor::Ground,
                    random_yaw: true,
                },
                CategorySpec {
                    kind: DecorationKind::Grass,
                    sprites: vec!["grass".to_string()],
                    attempts: Count::new(50, 80),
                    road_distance: DistanceBand {
                        min: Some(3.0),
                        max: Some(20.0),
                    },
                    slope: SlopeBand {
                        min_deg: None,
                        max_deg: Some(20.0),
                    },
                    footprint: FootprintRule::Rect {
                        width: Span::new(8.0, 15.0),
                        height: Span::new(5.0, 8.0),
                        scale: Span::new(0.7, 1.2),
                    },
                    anchor: Anchor::Ground,
                    random_yaw: false,
                },
                CategorySpec {
                    kind: DecorationKind::Cloud,
                    sprites: vec!["cloud".to_string()],
                    attempts: Count::new(3, 5),
                    road_distance: DistanceBand::default(),
                    slope: SlopeBand::default(),
                    footprint: FootprintRule::Rect {
                        width: Span::new(100.0, 200.0),
                        height: Span::new(30.0, 50.0),
                        scale: Span::new(1.0, 1.0),
                    },
                    anchor: Anchor::Sky {
                        altitude: Span::new(150.0, 250.0),
                    },
                    random_yaw: false,
                },
                CategorySpec {
                    kind: DecorationKind::Flower,
                    sprites: vec![
                        "flower-pink".to_string(),
                        "flower-yellow".to_string(),
                        "flower-purple".to_string(),
                    ],
                    attempts: Count::new(15, 25),
                    road_distance: DistanceBand {
                        min: Some(5.0),
                        max: Some(25.0),
                    },
                    slope: SlopeBand {
                        min_deg: None,
                        max_deg: Some(15.0),
                    },
                    footprint: FootprintRule::Portrait {
                        height: Span::new(20.0, 35.0),
                        scale: Span::new(0.8, 1.0),
                        width_ratio: 0.5,
                    },
                    anchor: Anchor::Ground,
                    random_yaw: false,
                },
                CategorySpec {
                    kind: DecorationKind::Backdrop,
                    sprites: vec!["mountain-backdrop".to_string()],
                    attempts: Count::new(2, 3),
                    road_distance: DistanceBand::default(),
                    slope: SlopeBand::default(),
                    footprint: FootprintRule::Rect {
                        width: Span::new(300.0, 500.0),
                        height: Span::new(150.0, 300.0),
                        scale: Span::new(1.0, 1.0),
                    },
                    anchor: Anchor::Horizon {
                        push: Span::new(800.0, 1500.0),
                    },
                    random_yaw: false,
                },
                CategorySpec {
                    kind: DecorationKind::Shrub,
                    sprites: vec!["shrub".to_string()],
                    attempts: Count::new(20, 35),
                    road_distance: DistanceBand {
                        min: Some(12.0),
                        max: None,
                    },
                    slope: SlopeBand {
                        min_deg: None,
                        max_deg: Some(50.0),
                    },
                    footprint: FootprintRule::Rect {
                        width: Span::new(25.0, 40.0),
                        height: Span::new(15.0, 25.0),
                        scale: Span::new(0.8, 1.4),
                    },
                    anchor: Anchor::Ground,
                    random_yaw: false,
                },
            ],
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;
        let catalog: Self = serde_yaml::from_str(&contents)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn to_yaml(&self) -> Result<String, CatalogError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Rejects catalogs whose ranges cannot be sampled. A parseable file
    /// with an inverted range would otherwise panic inside the placement
    /// RNG, so bad content fails here instead of mid-drive.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for spec in &self.categories {
            spec.validate()?;
        }
        Ok(())
    }
}

/// One placed billboard sprite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedDecoration {
    pub kind: DecorationKind,
    pub sprite: String,
    /// Sprite center position.
    pub position: Vertex3,
    pub width: f32,
    pub height: f32,
    /// Fixed base rotation around +y. Camera facing comes on top of this
    /// and is the renderer's business; see [`billboard_facing`].
    pub yaw: f32,
}

/// Everything placed in one chunk.
pub struct DecorationBatch {
    pub key: ChunkKey,
    pub placements: Vec<PlacedDecoration>,
}

fn chunk_seed(world_seed: u32, key: ChunkKey) -> u64 {
    (world_seed as u64)
        ^ (key.x as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (key.z as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
}

/// Generate every decoration for one chunk. Pure in (seed, key, catalog,
/// density); repeat calls return identical batches.
pub fn populate_chunk(
    field: &HeightField,
    path: &RoadPath,
    catalog: &DecorationCatalog,
    key: ChunkKey,
    chunk_size: f32,
    density: f32,
    world_seed: u32,
) -> DecorationBatch {
    let mut rng = StdRng::seed_from_u64(chunk_seed(world_seed, key));
    let (origin_x, origin_z) = key.origin(chunk_size);
    let mut placements = Vec::new();

    for spec in &catalog.categories {
        let drawn = spec.attempts.sample(&mut rng);
        let attempts = (drawn as f32 * density).round() as u32;

        for _ in 0..attempts {
            if let Some(placed) =
                try_place(field, path, spec, origin_x, origin_z, chunk_size, &mut rng)
            {
                placements.push(placed);
            }
        }
    }

    DecorationBatch { key, placements }
}

fn try_place(
    field: &HeightField,
    path: &RoadPath,
    spec: &CategorySpec,
    origin_x: f32,
    origin_z: f32,
    chunk_size: f32,
    rng: &mut StdRng,
) -> Option<PlacedDecoration> {
    match spec.anchor {
        Anchor::Ground => {
            let x = rng.gen_range(origin_x..origin_x + chunk_size);
            let z = rng.gen_range(origin_z..origin_z + chunk_size);

            if !spec.road_distance.is_unbounded() {
                let distance = path.lateral_distance(field, x, z);
                if !spec.road_distance.accepts(distance) {
                    return None;
                }
            }
            if !spec.slope.is_unbounded() && !spec.slope.accepts(field.slope_deg(x, z)) {
                return None;
            }

            let sprite = pick_sprite(spec, rng)?;
            let (width, height) = spec.footprint.sample(rng);
            let yaw = if spec.random_yaw {
                rng.gen_range(0.0..std::f32::consts::TAU)
            } else {
                0.0
            };
            let y = field.elevation(x, z) + height / 2.0;

            Some(PlacedDecoration {
                kind: spec.kind,
                sprite,
                position: Vertex3::new(x, y, z),
                width,
                height,
                yaw,
            })
        }
        Anchor::Sky { altitude } => {
            // Sky sprites drift across twice the chunk width so the cover
            // reads as continuous from the road.
            let x = origin_x + chunk_size / 2.0 + rng.gen_range(-chunk_size..chunk_size);
            let z = rng.gen_range(origin_z..origin_z + chunk_size);
            let y = altitude.sample(rng);
            let sprite = pick_sprite(spec, rng)?;
            let (width, height) = spec.footprint.sample(rng);

            Some(PlacedDecoration {
                kind: spec.kind,
                sprite,
                position: Vertex3::new(x, y, z),
                width,
                height,
                yaw: 0.0,
            })
        }
        Anchor::Horizon { push } => {
            let x = origin_x + chunk_size / 2.0 + rng.gen_range(-chunk_size..chunk_size);
            let z = origin_z
                + rng.gen_range(chunk_size / 2.0..chunk_size)
                + push.sample(rng);
            let sprite = pick_sprite(spec, rng)?;
            let (width, height) = spec.footprint.sample(rng);

            Some(PlacedDecoration {
                kind: spec.kind,
                sprite,
                position: Vertex3::new(x, height / 2.0, z),
                width,
                height,
                yaw: 0.0,
            })
        }
    }
}

fn pick_sprite(spec: &CategorySpec, rng: &mut StdRng) -> Option<String> {
    match spec.sprites.len() {
        0 => None,
        1 => Some(spec.sprites[0].clone()),
        n => Some(spec.sprites[rng.gen_range(0..n)].clone()),
    }
}

/// Rotation that turns a billboard at `position` toward `observer`. Yaw
/// spins around +y with 0 facing +z; pitch tilts the sprite top toward the
/// observer. Pure function for the renderer to apply every frame; placement
/// itself never depends on the observer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Facing {
    pub yaw: f32,
    pub pitch: f32,
}

pub fn billboard_facing(position: Vertex3, observer: Vertex3) -> Facing {
    let dx = observer.x - position.x;
    let dy = observer.y - position.y;
    let dz = observer.z - position.z;

    Facing {
        yaw: dx.atan2(dz),
        pitch: dy.atan2((dx * dx + dz * dz).sqrt()),
    }
}

/// Streams decoration batches in the same two-dimensional window as the
/// terrain.
pub struct DecorationStreamer {
    store: ChunkStore<DecorationBatch>,
    catalog: DecorationCatalog,
    chunk_size: f32,
    density: f32,
    seed: u32,
}

impl DecorationStreamer {
    pub fn new(
        window: StreamWindow,
        chunk_size: f32,
        catalog: DecorationCatalog,
        density: f32,
        seed: u32,
    ) -> Self {
        Self {
            store: ChunkStore::new("decoration", window),
            catalog,
            chunk_size,
            density,
            seed,
        }
    }

    pub fn advance<S: Scene<DecorationBatch>>(
        &mut self,
        field: &HeightField,
        path: &RoadPath,
        observer_x: f32,
        observer_z: f32,
        scene: &mut S,
    ) -> StreamDelta {
        let center = ChunkKey::containing(observer_x, observer_z, self.chunk_size);
        let catalog = &self.catalog;
        let chunk_size = self.chunk_size;
        let density = self.density;
        let seed = self.seed;

        self.store.advance(
            center,
            |key| populate_chunk(field, path, catalog, key, chunk_size, density, seed),
            scene,
        )
    }

    pub fn store(&self) -> &ChunkStore<DecorationBatch> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::streaming::NullScene;
    use std::io::Write;

    fn setup() -> (HeightField, RoadPath, DecorationCatalog) {
        let config = WorldConfig::default();
        (
            HeightField::new(config.seed, &config.terrain),
            RoadPath::new(config.road),
            DecorationCatalog::standard(),
        )
    }

    fn populate(key: ChunkKey) -> DecorationBatch {
        let (field, path, catalog) = setup();
        populate_chunk(&field, &path, &catalog, key, 200.0, 1.0, 12345)
    }

    #[test]
    fn test_population_is_reproducible() {
        let first = populate(ChunkKey::new(0, 0));
        let second = populate(ChunkKey::new(0, 0));

        assert!(!first.placements.is_empty());
        assert_eq!(first.placements, second.placements);
    }

    #[test]
    fn test_neighboring_chunks_differ() {
        let here = populate(ChunkKey::new(0, 0));
        let there = populate(ChunkKey::new(1, 0));

        assert_ne!(here.placements, there.placements);
    }

    #[test]
    fn test_world_seed_changes_placements() {
        let (field, path, catalog) = setup();
        let a = populate_chunk(&field, &path, &catalog, ChunkKey::new(0, 0), 200.0, 1.0, 1);
        let b = populate_chunk(&field, &path, &catalog, ChunkKey::new(0, 0), 200.0, 1.0, 2);

        assert_ne!(a.placements, b.placements);
    }

    #[test]
    fn test_grounded_placements_stay_in_footprint() {
        let batch = populate(ChunkKey::new(2, 3));

        for placed in &batch.placements {
            if matches!(
                placed.kind,
                DecorationKind::Cloud | DecorationKind::Backdrop
            ) {
                continue;
            }
            assert!(
                (400.0..600.0).contains(&placed.position.x),
                "{:?} escaped its chunk in x",
                placed
            );
            assert!(
                (600.0..800.0).contains(&placed.position.z),
                "{:?} escaped its chunk in z",
                placed
            );
        }
    }

    #[test]
    fn test_placements_respect_catalog_constraints() {
        let (field, path, catalog) = setup();
        let batch = populate_chunk(
            &field,
            &path,
            &catalog,
            ChunkKey::new(0, 1),
            200.0,
            1.0,
            12345,
        );

        for placed in &batch.placements {
            let spec = catalog
                .categories
                .iter()
                .find(|c| c.kind == placed.kind)
                .unwrap();
            if !matches!(spec.anchor, Anchor::Ground) {
                continue;
            }

            let x = placed.position.x;
            let z = placed.position.z;
            assert!(
                spec.road_distance.accepts(path.lateral_distance(&field, x, z)),
                "{:?} violates its road distance band",
                placed.kind
            );
            assert!(
                spec.slope.accepts(field.slope_deg(x, z)),
                "{:?} violates its slope band",
                placed.kind
            );
        }
    }

    #[test]
    fn test_grounded_sprites_rest_on_terrain() {
        let (field, _, _) = setup();
        let batch = populate(ChunkKey::new(-1, 4));

        for placed in &batch.placements {
            if matches!(
                placed.kind,
                DecorationKind::Cloud | DecorationKind::Backdrop
            ) {
                continue;
            }
            let ground = field.elevation(placed.position.x, placed.position.z);
            let base = placed.position.y - placed.height / 2.0;
            assert!((base - ground).abs() < 1e-3);
        }
    }

    #[test]
    fn test_only_rocks_get_random_yaw() {
        let batch = populate(ChunkKey::new(0, 0));
        let mut saw_rock = false;

        for placed in &batch.placements {
            if placed.kind == DecorationKind::Rock {
                saw_rock = true;
                assert!((0.0..std::f32::consts::TAU).contains(&placed.yaw));
            } else {
                assert_eq!(placed.yaw, 0.0);
            }
        }
        assert!(saw_rock, "expected at least one rock in a full chunk");
    }

    #[test]
    fn test_clouds_stay_in_altitude_band() {
        let batch = populate(ChunkKey::new(5, 5));
        let mut saw_cloud = false;

        for placed in &batch.placements {
            if placed.kind == DecorationKind::Cloud {
                saw_cloud = true;
                assert!((150.0..250.0).contains(&placed.position.y));
            }
        }
        assert!(saw_cloud, "cloud attempts are unconditional");
    }

    #[test]
    fn test_backdrops_sit_far_beyond_their_chunk() {
        let batch = populate(ChunkKey::new(0, 0));
        let mut saw_backdrop = false;

        for placed in &batch.placements {
            if placed.kind == DecorationKind::Backdrop {
                saw_backdrop = true;
                assert!(placed.position.z >= 900.0);
                assert_eq!(placed.position.y, placed.height / 2.0);
            }
        }
        assert!(saw_backdrop, "backdrop attempts are unconditional");
    }

    #[test]
    fn test_zero_density_places_nothing() {
        let (field, path, catalog) = setup();
        let batch = populate_chunk(
            &field,
            &path,
            &catalog,
            ChunkKey::new(0, 0),
            200.0,
            0.0,
            12345,
        );

        assert!(batch.placements.is_empty());
    }

    #[test]
    fn test_catalog_yaml_roundtrip() {
        let catalog = DecorationCatalog::standard();
        let yaml = catalog.to_yaml().unwrap();
        let parsed: DecorationCatalog = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(parsed, catalog);
    }

    #[test]
    fn test_catalog_load_from_file() {
        let catalog = DecorationCatalog::standard();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", catalog.to_yaml().unwrap()).unwrap();

        let loaded = DecorationCatalog::load(file.path()).unwrap();
        assert_eq!(loaded, catalog);
    }

    #[test]
    fn test_standard_catalog_passes_validation() {
        assert!(DecorationCatalog::standard().validate().is_ok());
    }

    #[test]
    fn test_load_rejects_inverted_attempt_range() {
        // Parseable YAML, unsamplable range: must fail at load, not panic
        // later inside the placement RNG.
        let mut catalog = DecorationCatalog::standard();
        catalog.categories[0].attempts = Count::new(20, 10);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", catalog.to_yaml().unwrap()).unwrap();

        let result = DecorationCatalog::load(file.path());
        assert!(matches!(result, Err(CatalogError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_inverted_span() {
        let mut catalog = DecorationCatalog::standard();
        catalog.categories[0].footprint = FootprintRule::Square {
            base: Span::new(80.0, 40.0),
            scale: Span::new(1.0, 1.0),
        };
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_tiers() {
        let mut catalog = DecorationCatalog::standard();
        catalog.categories[1].footprint = FootprintRule::Tiered { tiers: Vec::new() };
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_finite_band() {
        let mut catalog = DecorationCatalog::standard();
        catalog.categories[0].road_distance = DistanceBand {
            min: Some(f32::NAN),
            max: None,
        };
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_facing_cardinal_directions() {
        let origin = Vertex3::new(0.0, 0.0, 0.0);

        let ahead = billboard_facing(origin, Vertex3::new(0.0, 0.0, 10.0));
        assert!(ahead.yaw.abs() < 1e-6);
        assert!(ahead.pitch.abs() < 1e-6);

        let right = billboard_facing(origin, Vertex3::new(10.0, 0.0, 0.0));
        assert!((right.yaw - std::f32::consts::FRAC_PI_2).abs() < 1e-6);

        let behind = billboard_facing(origin, Vertex3::new(0.0, 0.0, -10.0));
        assert!((behind.yaw.abs() - std::f32::consts::PI).abs() < 1e-6);

        let above = billboard_facing(origin, Vertex3::new(0.0, 10.0, 0.0));
        assert!((above.pitch - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_streamer_regenerates_identical_batches_after_eviction() {
        let config = WorldConfig::default();
        let field = HeightField::new(config.seed, &config.terrain);
        let path = RoadPath::new(config.road.clone());
        let window = StreamWindow::from_settings(&config.streaming);
        let mut streamer = DecorationStreamer::new(
            window,
            config.streaming.chunk_size,
            DecorationCatalog::standard(),
            config.decoration.density,
            config.seed,
        );

        streamer.advance(&field, &path, 0.0, 0.0, &mut NullScene);
        let before = streamer
            .store()
            .get(&ChunkKey::new(0, 0))
            .unwrap()
            .placements
            .clone();

        // Drive far enough forward to evict the origin chunk, then return.
        streamer.advance(&field, &path, 0.0, 2000.0, &mut NullScene);
        assert!(!streamer.store().contains(&ChunkKey::new(0, 0)));
        streamer.advance(&field, &path, 0.0, 0.0, &mut NullScene);

        let after = streamer
            .store()
            .get(&ChunkKey::new(0, 0))
            .unwrap()
            .placements
            .clone();
        assert_eq!(before, after);
    }
}
