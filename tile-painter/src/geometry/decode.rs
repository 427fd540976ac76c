//! Decoding of Mapbox Vector Tiles into [`VectorTile`]s.

use std::collections::HashMap;

use geozero::{
    error::GeozeroError,
    geo_types::GeoWriter,
    mvt::{Message, Tile},
    ColumnValue, FeatureProcessor, GeomProcessor, GeozeroDatasource, PropertyProcessor,
};
use log::debug;
use serde_json::Value;

use crate::{
    error::Error,
    geometry::{Feature, TileLayer, VectorTile},
};

impl VectorTile {
    /// Decodes a protobuf encoded vector tile. Coordinates stay in the tile's local system.
    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        let tile = Tile::decode(bytes).map_err(|e| Error::Decode(e.to_string()))?;

        let mut vector_tile = VectorTile::new();
        for mut layer in tile.layers {
            let mut collector = FeatureCollector::new();
            layer
                .process(&mut collector)
                .map_err(|e| Error::Decode(format!("layer {}: {e}", layer.name)))?;

            vector_tile = vector_tile.with_layer(TileLayer {
                name: layer.name,
                extent: layer.extent,
                features: collector.features,
            });
        }
        Ok(vector_tile)
    }
}

/// Collects the features of one layer as geo-types geometries with JSON properties.
struct FeatureCollector {
    geo_writer: GeoWriter,
    properties: HashMap<String, Value>,
    features: Vec<Feature>,
}

impl FeatureCollector {
    fn new() -> Self {
        Self {
            geo_writer: GeoWriter::new(),
            properties: HashMap::new(),
            features: Vec::new(),
        }
    }
}

fn to_json(value: &ColumnValue) -> Value {
    match value {
        ColumnValue::Bool(v) => Value::from(*v),
        ColumnValue::Int(v) => Value::from(*v),
        ColumnValue::UInt(v) => Value::from(*v),
        ColumnValue::Long(v) => Value::from(*v),
        ColumnValue::ULong(v) => Value::from(*v),
        ColumnValue::Float(v) => Value::from(*v as f64),
        ColumnValue::Double(v) => Value::from(*v),
        ColumnValue::String(v) => Value::from(*v),
        other => Value::from(other.to_string()),
    }
}

impl GeomProcessor for FeatureCollector {
    fn xy(&mut self, x: f64, y: f64, idx: usize) -> Result<(), GeozeroError> {
        self.geo_writer.xy(x, y, idx)
    }
    fn point_begin(&mut self, idx: usize) -> Result<(), GeozeroError> {
        self.geo_writer.point_begin(idx)
    }
    fn point_end(&mut self, idx: usize) -> Result<(), GeozeroError> {
        self.geo_writer.point_end(idx)
    }
    fn multipoint_begin(&mut self, size: usize, idx: usize) -> Result<(), GeozeroError> {
        self.geo_writer.multipoint_begin(size, idx)
    }
    fn multipoint_end(&mut self, idx: usize) -> Result<(), GeozeroError> {
        self.geo_writer.multipoint_end(idx)
    }
    fn linestring_begin(
        &mut self,
        tagged: bool,
        size: usize,
        idx: usize,
    ) -> Result<(), GeozeroError> {
        self.geo_writer.linestring_begin(tagged, size, idx)
    }
    fn linestring_end(&mut self, tagged: bool, idx: usize) -> Result<(), GeozeroError> {
        self.geo_writer.linestring_end(tagged, idx)
    }
    fn multilinestring_begin(&mut self, size: usize, idx: usize) -> Result<(), GeozeroError> {
        self.geo_writer.multilinestring_begin(size, idx)
    }
    fn multilinestring_end(&mut self, idx: usize) -> Result<(), GeozeroError> {
        self.geo_writer.multilinestring_end(idx)
    }
    fn polygon_begin(&mut self, tagged: bool, size: usize, idx: usize) -> Result<(), GeozeroError> {
        self.geo_writer.polygon_begin(tagged, size, idx)
    }
    fn polygon_end(&mut self, tagged: bool, idx: usize) -> Result<(), GeozeroError> {
        self.geo_writer.polygon_end(tagged, idx)
    }
    fn multipolygon_begin(&mut self, size: usize, idx: usize) -> Result<(), GeozeroError> {
        self.geo_writer.multipolygon_begin(size, idx)
    }
    fn multipolygon_end(&mut self, idx: usize) -> Result<(), GeozeroError> {
        self.geo_writer.multipolygon_end(idx)
    }
}

impl PropertyProcessor for FeatureCollector {
    fn property(
        &mut self,
        _idx: usize,
        name: &str,
        value: &ColumnValue,
    ) -> Result<bool, GeozeroError> {
        self.properties.insert(name.to_string(), to_json(value));
        Ok(false)
    }
}

impl FeatureProcessor for FeatureCollector {
    fn feature_begin(&mut self, _idx: u64) -> Result<(), GeozeroError> {
        self.properties.clear();
        Ok(())
    }

    fn feature_end(&mut self, idx: u64) -> Result<(), GeozeroError> {
        let properties = std::mem::take(&mut self.properties);
        match self.geo_writer.take_geometry() {
            Some(geometry) => self.features.push(Feature {
                geometry,
                properties,
            }),
            None => debug!("feature {idx} has no geometry"),
        }
        Ok(())
    }
}
