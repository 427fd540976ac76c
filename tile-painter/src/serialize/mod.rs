//! Serialization of tile features into [`RenderBuffers`].

use crate::{
    buffers::{RenderBuffers, CIRCLE_POS, LINES, POSITION, TILE_COORDS},
    coords::TileCoords,
    geometry::{
        flatten::{flatten_circle, flatten_fill, flatten_lines},
        triangulate::{EarcutTriangulator, Triangulator},
        Feature,
    },
    style::{LayerType, Property, StyleFunction, StyleLayer},
};

pub mod symbol;
mod tile;

pub use tile::{CompiledLayer, CompiledTile, TileSerializer};

/// Turns the features of one style layer into buffers.
///
/// Only properties whose value depends on the feature are written as columns. Constant and
/// zoom dependent properties are set as uniforms while painting.
#[derive(Clone)]
pub struct LayerSerializer<T = EarcutTriangulator> {
    layer_type: LayerType,
    feature_properties: Vec<(Property, StyleFunction)>,
    triangulator: T,
}

impl LayerSerializer {
    pub fn new(layer: &StyleLayer) -> Self {
        Self::with_triangulator(layer, EarcutTriangulator)
    }
}

impl<T> LayerSerializer<T>
where
    T: Triangulator,
{
    pub fn with_triangulator(layer: &StyleLayer, triangulator: T) -> Self {
        Self {
            layer_type: layer.layer_type,
            feature_properties: layer
                .feature_dependent()
                .map(|(property, function)| (property, function.clone()))
                .collect(),
            triangulator,
        }
    }

    pub fn layer_type(&self) -> LayerType {
        self.layer_type
    }

    /// Serializes the geometry of a circle, line or fill feature.
    ///
    /// Returns `None` for geometries the layer type cannot draw and for all other layer types.
    pub fn serialize(&self, feature: &Feature, coords: TileCoords) -> Option<RenderBuffers> {
        let mut buffers = match self.layer_type {
            LayerType::Circle => {
                RenderBuffers::new().with_column(CIRCLE_POS, flatten_circle(&feature.geometry)?)
            }
            LayerType::Line => {
                RenderBuffers::new().with_column(LINES, flatten_lines(&feature.geometry)?)
            }
            LayerType::Fill => {
                let fill = flatten_fill(&feature.geometry, &self.triangulator)?;
                RenderBuffers::new()
                    .with_column(POSITION, fill.position)
                    .with_indices(fill.indices)
            }
            _ => return None,
        };

        self.add_feature_columns(&mut buffers, feature, coords);
        Some(buffers)
    }

    /// Broadcasts `tileCoords` and every feature dependent property once per geometric unit.
    ///
    /// For lines the unit is a point of the bracketed line, so that instance `i` of a merged
    /// line buffer reads the entry of the feature its first point belongs to. Line columns are
    /// therefore three entries longer per feature than [`RenderBuffers::len`]. Shortening them
    /// to the instance count misaligns every feature after the first one once buffers are
    /// concatenated.
    pub fn add_feature_columns(
        &self,
        buffers: &mut RenderBuffers,
        feature: &Feature,
        coords: TileCoords,
    ) {
        let count = buffers.units();
        buffers.broadcast(TILE_COORDS, &coords.to_array(), count);

        let zoom = f64::from(coords.z);
        for (property, function) in &self.feature_properties {
            if let Some(value) = function.evaluate(zoom, Some(feature)) {
                buffers.broadcast(
                    property.column(),
                    &value.to_components(property.components()),
                    count,
                );
            }
        }
    }
}
