//! MCPE world save reader and map renderer
//!
//! Reads the ordered key/value records of a Minecraft Pocket Edition world,
//! decodes terrain chunks and tag-format metadata, and produces per-dimension
//! PNG maps plus a GeoJSON document of entities, tile entities and portals.

pub mod app;
pub mod codec;
pub mod error;
pub mod features;
pub mod model;
pub mod palette;
pub mod renderer;
pub mod schema;
pub mod world;
pub use mcpe_nbt as nbt;

pub use error::{Error, Result};
pub use app::{run, RunSummary, VizConfig};
pub use codec::{BlockFilter, ChunkKey, ChunkSummary, Column, RecordKey, TerrainDecoder};
pub use features::{Feature, FeatureCollector, Projection};
pub use model::{Entity, Item, Portal, TileEntity};
pub use renderer::{Compositor, CropRect, Raster, RenderMode, SliceRenderer};
pub use schema::Schema;
pub use world::{open_store, Dimension, LevelDbStore, LevelInfo, MemoryStore, WorldBounds, WorldIndex, WorldStore};
