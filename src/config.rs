use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config field out of range: {0}")]
    OutOfRange(&'static str),
    #[error("streaming window invalid: {0}")]
    Window(&'static str),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    pub seed: u32,
    pub streaming: StreamingSettings,
    pub terrain: TerrainSettings,
    pub road: RoadSettings,
    pub decoration: DecorationSettings,
    pub logging: LoggingSettings,
}

/// Chunk admission and retention distances, in whole chunks relative to the
/// chunk containing the observer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingSettings {
    pub chunk_size: f32,
    /// Chunks admitted ahead of the observer.
    pub forward_distance: i32,
    /// Chunks admitted behind the observer.
    pub behind_distance: i32,
    /// Chunks admitted either side of the observer.
    pub lateral_distance: i32,
    /// Chunks retained behind the observer before eviction.
    pub dispose_distance: i32,
    /// Chunks retained either side before eviction.
    pub dispose_lateral: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainSettings {
    /// Vertices per side of a chunk grid.
    pub resolution: u32,
    pub octaves: u32,
    pub persistence: f64,
    pub lacunarity: f64,
    pub frequency: f64,
    pub height_scale: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadSettings {
    pub width: f32,
    pub segment_length: f32,
    /// Half-width of the valley search band either side of x = 0.
    pub search_half_width: f32,
    /// Spacing of elevation probes inside the search band.
    pub search_step: f32,
    /// Distance between successive centerline lattice samples along z.
    pub sample_spacing: f32,
    pub curve_amplitude: f32,
    pub curve_frequency: f32,
    /// Vertical lift applied above the sampled valley floor.
    pub clearance: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecorationSettings {
    /// Scales placement attempt counts; 1.0 is the authored density.
    pub density: f32,
    /// Optional path to a YAML catalog overriding the built-in categories.
    pub catalog_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub console_enabled: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            streaming: StreamingSettings {
                chunk_size: 200.0,
                forward_distance: 5,
                behind_distance: 1,
                lateral_distance: 1,
                dispose_distance: 3,
                dispose_lateral: 2,
            },
            terrain: TerrainSettings {
                resolution: 64,
                octaves: 5,
                persistence: 0.5,
                lacunarity: 2.0,
                frequency: 0.015,
                height_scale: 80.0,
            },
            road: RoadSettings {
                width: 10.0,
                segment_length: 2.0,
                search_half_width: 20.0,
                search_step: 5.0,
                sample_spacing: 10.0,
                curve_amplitude: 15.0,
                curve_frequency: 0.01,
                clearance: 0.2,
            },
            decoration: DecorationSettings {
                density: 1.0,
                catalog_path: None,
            },
            logging: LoggingSettings {
                level: "info".to_string(),
                console_enabled: true,
            },
        }
    }
}

impl WorldConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config: WorldConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            eprintln!("Failed to load config: {}, using defaults", e);
            Self::default()
        })
    }

    /// Rejects configurations the generators cannot honor. The admission
    /// window must sit inside the retention window or chunks would be
    /// created and evicted on the same call.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.streaming.chunk_size <= 0.0 {
            return Err(ConfigError::OutOfRange("streaming.chunk_size"));
        }
        if self.streaming.forward_distance < 0
            || self.streaming.behind_distance < 0
            || self.streaming.lateral_distance < 0
            || self.streaming.dispose_distance < 0
            || self.streaming.dispose_lateral < 0
        {
            return Err(ConfigError::OutOfRange("streaming distances"));
        }
        if self.streaming.behind_distance > self.streaming.dispose_distance {
            return Err(ConfigError::Window(
                "behind_distance exceeds dispose_distance",
            ));
        }
        if self.streaming.lateral_distance > self.streaming.dispose_lateral {
            return Err(ConfigError::Window(
                "lateral_distance exceeds dispose_lateral",
            ));
        }
        if self.terrain.resolution < 2 {
            return Err(ConfigError::OutOfRange("terrain.resolution"));
        }
        if self.terrain.octaves < 1 {
            return Err(ConfigError::OutOfRange("terrain.octaves"));
        }
        if self.terrain.frequency <= 0.0 {
            return Err(ConfigError::OutOfRange("terrain.frequency"));
        }
        if self.road.width <= 0.0 {
            return Err(ConfigError::OutOfRange("road.width"));
        }
        if self.road.segment_length <= 0.0 || self.road.segment_length > self.streaming.chunk_size {
            return Err(ConfigError::OutOfRange("road.segment_length"));
        }
        if self.road.search_step <= 0.0 || self.road.search_step > 2.0 * self.road.search_half_width
        {
            return Err(ConfigError::OutOfRange("road.search_step"));
        }
        if self.road.sample_spacing <= 0.0 {
            return Err(ConfigError::OutOfRange("road.sample_spacing"));
        }
        if !self.decoration.density.is_finite() || self.decoration.density < 0.0 {
            return Err(ConfigError::OutOfRange("decoration.density"));
        }
        Ok(())
    }
}
