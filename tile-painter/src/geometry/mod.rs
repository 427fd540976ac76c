//! Tile features and their conversion into flat coordinate arrays.

use std::collections::HashMap;

use geo_types::Geometry;
use serde_json::Value;

pub mod decode;
pub mod flatten;
pub mod triangulate;

/// A single feature of a tile layer. Coordinates are tile-local, `0..extent`.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Geometry<f64>,
    pub properties: HashMap<String, Value>,
}

impl Feature {
    pub fn new(geometry: impl Into<Geometry<f64>>) -> Self {
        Self {
            geometry: geometry.into(),
            properties: HashMap::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

/// A named layer of a vector tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    pub name: String,
    /// Width and height of the layer's coordinate system, if the tile states one.
    pub extent: Option<u32>,
    pub features: Vec<Feature>,
}

/// Decoded contents of one vector tile, keyed by layer name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorTile {
    pub layers: HashMap<String, TileLayer>,
}

impl VectorTile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layer(mut self, layer: TileLayer) -> Self {
        self.layers.insert(layer.name.clone(), layer);
        self
    }

    pub fn layer(&self, name: &str) -> Option<&TileLayer> {
        self.layers.get(name)
    }
}
