//! Procedural world streaming core for the Valedrive endless driving game.
//!
//! Seed-deterministic terrain, a valley-following road ribbon and billboard
//! decorations stream in fixed-size chunks around a moving observer. The
//! crate generates geometry and placements only; rendering, input and audio
//! live in the client and subscribe to residency changes through the
//! [`Scene`](streaming::Scene) trait.

pub mod config;
pub mod decoration;
pub mod export;
pub mod heightfield;
pub mod mesh;
pub mod road;
pub mod streaming;
pub mod terrain;
pub mod world;

// Re-export main types for convenience
pub use config::WorldConfig;
pub use decoration::{billboard_facing, DecorationBatch, DecorationCatalog, PlacedDecoration};
pub use heightfield::HeightField;
pub use mesh::{MeshData, Vertex3};
pub use road::{RoadChunk, RoadPath};
pub use streaming::{ChunkKey, NullScene, Scene, StreamDelta};
pub use terrain::TerrainChunk;
pub use world::{World, WorldError, WorldReport};
