//! Image-space projection and the GeoJSON feature list
//!
//! Two image coordinate systems are in use. The text form used in logs has
//! the origin at the top-left of the map image. The GeoJSON form flips the
//! vertical axis so the viewer can place points with a bottom-left origin.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde_json::{json, Map, Value};

use crate::codec::CHUNK_WIDTH;
use crate::error::{Error, Result};
use crate::model::{Entity, EntityOrigin, Portal, TileEntity};
use crate::schema::Schema;
use crate::world::{ChunkBounds, Dimension, WorldBounds};

/// World to image coordinate mapping for every dimension
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    dims: [Option<ChunkBounds>; 2],
}

struct Frame {
    offset_x: i32,
    offset_z: i32,
    height: i32,
}

impl Projection {
    pub fn new(bounds: &WorldBounds) -> Self {
        Self { dims: Dimension::ALL.map(|d| bounds.get(d).copied()) }
    }

    /// Unknown and negative ids use the overworld; a dimension without
    /// terrain projects with a zero offset
    fn frame(&self, dimension_id: i32) -> Frame {
        let dim = Dimension::from_id_or_overworld(dimension_id);
        match &self.dims[dim.index()] {
            Some(b) => Frame {
                offset_x: -b.min_x * CHUNK_WIDTH as i32,
                offset_z: -b.min_z * CHUNK_WIDTH as i32,
                height: b.image_height() as i32,
            },
            None => Frame { offset_x: 0, offset_z: 0, height: 0 },
        }
    }

    pub fn text_point(&self, dimension_id: i32, wx: f64, wz: f64) -> (i32, i32) {
        let f = self.frame(dimension_id);
        (wx.floor() as i32 + f.offset_x, wz.floor() as i32 + f.offset_z)
    }

    pub fn geojson_point(&self, dimension_id: i32, wx: f64, wz: f64) -> (i32, i32) {
        let f = self.frame(dimension_id);
        let (ix, iy) = self.text_point(dimension_id, wx, wz);
        (ix, f.height - 1 - iy)
    }

    /// World block coordinates of a text-form image point
    pub fn unproject_text(&self, dimension_id: i32, ix: i32, iy: i32) -> (i32, i32) {
        let f = self.frame(dimension_id);
        (ix - f.offset_x, iy - f.offset_z)
    }

    /// World block coordinates of a GeoJSON-form image point
    pub fn unproject_geojson(&self, dimension_id: i32, ix: i32, gy: i32) -> (i32, i32) {
        let f = self.frame(dimension_id);
        self.unproject_text(dimension_id, ix, f.height - 1 - gy)
    }

    pub fn image_size(&self, dim: Dimension) -> Option<(u32, u32)> {
        self.dims[dim.index()].map(|b| (b.image_width(), b.image_height()))
    }
}

/// One point feature
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub coordinates: (i32, i32),
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn to_json(&self) -> Value {
        json!({
            "type": "Feature",
            "geometry": {
                "type": "Point",
                "coordinates": [self.coordinates.0, self.coordinates.1],
            },
            "properties": self.properties,
        })
    }
}

/// Collects features in discovery order
#[derive(Debug, Clone)]
pub struct FeatureCollector {
    projection: Projection,
    features: Vec<Feature>,
    player_position: Option<(i32, i32)>,
}

impl FeatureCollector {
    pub fn new(projection: Projection) -> Self {
        Self { projection, features: Vec::new(), player_position: None }
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn add_entity(&mut self, entity: &Entity, record_dimension: i32, schema: &Schema) {
        let dimension = entity.effective_dimension(record_dimension);
        tracing::info!(dimension, "ParsedEntity: {}", entity.describe(schema, &self.projection, dimension));

        let Some([x, _, z]) = entity.pos else {
            tracing::info!("Entity without a position is left off the map");
            return;
        };
        let point = self.projection.geojson_point(dimension, x as f64, z as f64);

        if entity.origin == EntityOrigin::LocalPlayer {
            let (ix, iy) = self.projection.text_point(dimension, x as f64, z as f64);
            tracing::info!(
                dimension,
                rotation = ?entity.rotation,
                "Player Position: ({x}, {z} @ image {ix}, {iy})"
            );
            self.player_position = Some(point);
        }

        self.features.push(Feature {
            coordinates: point,
            properties: entity.properties(schema, dimension),
        });
    }

    pub fn add_tile_entity(&mut self, tile: &TileEntity, dimension: i32, schema: &Schema) {
        tracing::info!(dimension, "ParsedTileEntity: {}", tile.describe(schema, &self.projection, dimension));
        let Some([x, _, z]) = tile.pos else {
            tracing::info!("Tile entity without a position is left off the map");
            return;
        };
        if let Some(properties) = tile.properties(schema, dimension) {
            self.features.push(Feature {
                coordinates: self.projection.geojson_point(dimension, x as f64, z as f64),
                properties,
            });
        }
    }

    pub fn add_portal(&mut self, portal: &Portal) {
        tracing::info!("ParsedPortal: {}", portal.describe(&self.projection));
        let [x, _, z] = portal.pos;
        self.features.push(Feature {
            coordinates: self.projection.geojson_point(portal.dimension_id, x as f64, z as f64),
            properties: portal.properties(),
        });
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// GeoJSON-form position of the local player, once seen
    pub fn player_position(&self) -> Option<(i32, i32)> {
        self.player_position
    }

    pub fn document(&self) -> Value {
        json!({
            "type": "FeatureCollection",
            "features": self.features.iter().map(Feature::to_json).collect::<Vec<_>>(),
        })
    }

    pub fn write_geojson(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| Error::Io(format!("{}: {e}", path.display())))?;
        let mut out = BufWriter::new(file);
        serde_json::to_writer(&mut out, &self.document()).map_err(|e| Error::Io(e.to_string()))?;
        out.write_all(b"\n")?;
        out.flush()?;
        tracing::info!(path = %path.display(), features = self.features.len(), "Wrote GeoJSON");
        Ok(())
    }
}
