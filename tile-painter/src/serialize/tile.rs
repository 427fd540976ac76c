use std::collections::{BTreeSet, HashMap};

use crate::{
    buffers::{concat, RenderBuffers},
    coords::TileCoords,
    error::Error,
    geometry::{TileLayer, VectorTile},
    serialize::{
        symbol::{AtlasSource, CollisionIndex, GlyphAtlas, LabelShaper},
        LayerSerializer,
    },
    style::{LayerType, StyleLayer},
};

/// The buffers of one style layer for one tile, ready to be loaded onto the GPU.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledLayer {
    pub layer_type: LayerType,
    pub extent: u32,
    pub buffers: RenderBuffers,
    /// Number of instances or vertices drawn.
    pub length: usize,
}

impl CompiledLayer {
    fn compile(layer_type: LayerType, extent: u32, bundles: Vec<RenderBuffers>) -> Option<Self> {
        if bundles.is_empty() {
            return None;
        }
        let buffers = concat(bundles);
        let length = buffers.len();
        if length == 0 {
            return None;
        }
        Some(Self {
            layer_type,
            extent,
            buffers,
            length,
        })
    }
}

/// All compiled layers of a tile, keyed by style layer id.
#[derive(Debug)]
pub struct CompiledTile {
    pub coords: TileCoords,
    pub layers: HashMap<String, CompiledLayer>,
    /// Glyph atlases by source name.
    pub atlases: HashMap<String, GlyphAtlas>,
    /// Failed atlas requests by source name. Symbol layers of these sources are missing.
    pub atlas_errors: HashMap<String, Error>,
}

impl CompiledTile {
    pub fn new(coords: TileCoords) -> Self {
        Self {
            coords,
            layers: HashMap::new(),
            atlases: HashMap::new(),
            atlas_errors: HashMap::new(),
        }
    }

    pub fn layer(&self, id: &str) -> Option<&CompiledLayer> {
        self.layers.get(id)
    }
}

/// Serializes whole tiles for a list of style layers.
pub struct TileSerializer<S> {
    layers: Vec<(StyleLayer, LayerSerializer)>,
    shaper: S,
    default_extent: u32,
}

impl<S> TileSerializer<S>
where
    S: LabelShaper,
{
    /// Layers without tile data, like backgrounds, are ignored.
    pub fn new(layers: &[StyleLayer], shaper: S, default_extent: u32) -> Self {
        Self {
            layers: layers
                .iter()
                .filter(|layer| layer.layer_type.has_tile_data())
                .map(|layer| (layer.clone(), LayerSerializer::new(layer)))
                .collect(),
            shaper,
            default_extent,
        }
    }

    fn source_layer<'t>(
        &self,
        layer: &StyleLayer,
        tile: &'t VectorTile,
        zoom: f64,
    ) -> Option<&'t TileLayer> {
        if !layer.is_visible_at(zoom) {
            return None;
        }
        layer
            .source_layer
            .as_deref()
            .and_then(|name| tile.layer(name))
    }

    /// Serializes every visible layer of `tile`.
    ///
    /// Circle, line and fill layers do not depend on atlases. One atlas is requested per
    /// source of the visible symbol layers. If a request fails the symbol layers of that source
    /// are left out and the error is kept in [`CompiledTile::atlas_errors`].
    ///
    /// Symbol layers are placed in reverse style order sharing one [`CollisionIndex`], so
    /// labels of layers drawn on top claim their space first.
    #[tracing::instrument(skip_all, fields(coords = %coords))]
    pub async fn serialize_tile<A>(
        &self,
        tile: &VectorTile,
        coords: TileCoords,
        atlas_source: &A,
    ) -> CompiledTile
    where
        A: AtlasSource + ?Sized,
    {
        let zoom = f64::from(coords.z);
        let mut compiled = CompiledTile::new(coords);

        let mut symbol_layers = Vec::new();
        for (layer, serializer) in &self.layers {
            let Some(tile_layer) = self.source_layer(layer, tile, zoom) else {
                continue;
            };
            if layer.layer_type == LayerType::Symbol {
                symbol_layers.push((layer, serializer, tile_layer));
                continue;
            }

            let bundles = tile_layer
                .features
                .iter()
                .filter_map(|feature| serializer.serialize(feature, coords))
                .collect();
            let extent = tile_layer.extent.unwrap_or(self.default_extent);
            if let Some(layer_data) = CompiledLayer::compile(layer.layer_type, extent, bundles) {
                compiled.layers.insert(layer.id.clone(), layer_data);
            }
        }

        let sources: BTreeSet<&str> = symbol_layers
            .iter()
            .filter_map(|(layer, _, _)| layer.source.as_deref())
            .collect();
        for source in sources {
            match atlas_source.request_atlas(source, coords.z.into()).await {
                Ok(atlas) => {
                    compiled.atlases.insert(source.to_string(), atlas);
                }
                Err(e) => {
                    log::warn!("atlas request for {source} at {coords} failed: {e}");
                    compiled.atlas_errors.insert(source.to_string(), e);
                }
            }
        }

        let mut collisions = CollisionIndex::new();
        let mut placed = Vec::new();
        for (layer, serializer, tile_layer) in symbol_layers.into_iter().rev() {
            let Some(atlas) = layer
                .source
                .as_deref()
                .and_then(|source| compiled.atlases.get(source))
            else {
                continue;
            };

            let bundles = tile_layer
                .features
                .iter()
                .filter_map(|feature| {
                    let mut buffers =
                        self.shaper
                            .shape(layer, feature, coords, atlas, &mut collisions)?;
                    serializer.add_feature_columns(&mut buffers, feature, coords);
                    Some(buffers)
                })
                .collect();
            let extent = tile_layer.extent.unwrap_or(self.default_extent);
            if let Some(layer_data) = CompiledLayer::compile(layer.layer_type, extent, bundles) {
                placed.push((layer.id.clone(), layer_data));
            }
        }
        compiled.layers.extend(placed);

        log::debug!("serialized {} layers of {coords}", compiled.layers.len());
        compiled
    }
}
