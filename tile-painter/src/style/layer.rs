//! Vector tile layer drawing utilities.

use std::{
    collections::BTreeMap,
    fmt,
    hash::{Hash, Hasher},
};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{
    error::Error,
    style::{
        function::{StyleFunction, StyleValue},
        property::Property,
    },
};

/// Layer types which are part of the style format but are not drawn by this renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnsupportedLayer {
    Raster,
    Heatmap,
    Hillshade,
    FillExtrusion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    Background,
    Circle,
    Line,
    Fill,
    Symbol,
    Unsupported(UnsupportedLayer),
}

impl LayerType {
    pub fn parse(type_: &str) -> Result<LayerType, Error> {
        Ok(match type_ {
            "background" => LayerType::Background,
            "circle" => LayerType::Circle,
            "line" => LayerType::Line,
            "fill" => LayerType::Fill,
            "symbol" => LayerType::Symbol,
            "raster" => LayerType::Unsupported(UnsupportedLayer::Raster),
            "heatmap" => LayerType::Unsupported(UnsupportedLayer::Heatmap),
            "hillshade" => LayerType::Unsupported(UnsupportedLayer::Hillshade),
            "fill-extrusion" => LayerType::Unsupported(UnsupportedLayer::FillExtrusion),
            other => return Err(Error::Style(format!("unknown layer type {other}"))),
        })
    }

    /// Whether features of a tile are serialized into buffers for this layer type.
    pub fn has_tile_data(self) -> bool {
        matches!(
            self,
            LayerType::Circle | LayerType::Line | LayerType::Fill | LayerType::Symbol
        )
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerType::Background => write!(f, "background"),
            LayerType::Circle => write!(f, "circle"),
            LayerType::Line => write!(f, "line"),
            LayerType::Fill => write!(f, "fill"),
            LayerType::Symbol => write!(f, "symbol"),
            LayerType::Unsupported(kind) => write!(f, "{kind:?}"),
        }
    }
}

/// Stores all the styles for a specific layer.
#[derive(Debug, Clone)]
pub struct StyleLayer {
    pub id: String,
    pub layer_type: LayerType,
    pub source: Option<String>,
    pub source_layer: Option<String>,
    pub minzoom: Option<f64>,
    pub maxzoom: Option<f64>,
    /// Paint and layout properties this renderer understands.
    pub properties: BTreeMap<Property, StyleFunction>,
    /// The raw `layout` object. Symbol layouts are interpreted by the label shaper.
    pub layout: Map<String, Value>,
}

impl StyleLayer {
    pub fn new(id: impl Into<String>, layer_type: LayerType) -> Self {
        Self {
            id: id.into(),
            layer_type,
            source: None,
            source_layer: None,
            minzoom: None,
            maxzoom: None,
            properties: BTreeMap::new(),
            layout: Map::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>, source_layer: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self.source_layer = Some(source_layer.into());
        self
    }

    pub fn with_property(mut self, property: Property, function: StyleFunction) -> Self {
        self.properties.insert(property, function);
        self
    }

    /// Returns the function of a property, falling back to a constant of its default value.
    pub fn function(&self, property: Property) -> StyleFunction {
        self.properties
            .get(&property)
            .cloned()
            .unwrap_or_else(|| StyleFunction::Constant(property.default_value()))
    }

    /// Properties of this layer type whose value depends on feature data.
    pub fn feature_dependent(&self) -> impl Iterator<Item = (Property, &StyleFunction)> {
        self.properties
            .iter()
            .filter(|(_, function)| function.is_feature_dependent())
            .map(|(property, function)| (*property, function))
    }

    /// Properties of this layer type which are uploaded as uniforms.
    pub fn uniform_properties(&self) -> Vec<(Property, StyleFunction)> {
        Property::for_layer(self.layer_type)
            .map(|property| (property, self.function(property)))
            .filter(|(_, function)| !function.is_feature_dependent())
            .collect()
    }

    pub fn is_visible_at(&self, zoom: f64) -> bool {
        self.minzoom.map_or(true, |minzoom| zoom >= minzoom)
            && self.maxzoom.map_or(true, |maxzoom| zoom < maxzoom)
    }

    /// Resolves a uniform value of this layer, for debugging and tests.
    pub fn evaluate(&self, property: Property, zoom: f64) -> Option<StyleValue> {
        self.function(property).evaluate(zoom, None)
    }
}

impl Eq for StyleLayer {}
impl PartialEq for StyleLayer {
    fn eq(&self, other: &Self) -> bool {
        self.id.eq(&other.id)
    }
}

impl Hash for StyleLayer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

#[derive(Deserialize)]
struct StyleLayerDef {
    id: String,
    #[serde(rename = "type")]
    type_: String,
    maxzoom: Option<f64>,
    minzoom: Option<f64>,
    source: Option<String>,
    #[serde(rename = "source-layer")]
    source_layer: Option<String>,
    #[serde(default)]
    paint: Map<String, Value>,
    #[serde(default)]
    layout: Map<String, Value>,
}

impl<'de> Deserialize<'de> for StyleLayer {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let def = StyleLayerDef::deserialize(deserializer)?;
        let layer_type = LayerType::parse(&def.type_).map_err(serde::de::Error::custom)?;

        let mut properties = BTreeMap::new();
        let declarations = def
            .paint
            .iter()
            .map(|declaration| (false, declaration))
            .chain(def.layout.iter().map(|declaration| (true, declaration)));

        for (in_layout, (key, value)) in declarations {
            match Property::from_key(layer_type, key) {
                Some(property) if property.is_layout() == in_layout => {
                    let function = StyleFunction::from_json(property, value).map_err(|e| {
                        serde::de::Error::custom(format!("layer {}: {e}", def.id))
                    })?;
                    properties.insert(property, function);
                }
                _ => log::debug!("layer {}: ignoring unsupported property {key}", def.id),
            }
        }

        Ok(StyleLayer {
            id: def.id,
            layer_type,
            source: def.source,
            source_layer: def.source_layer,
            minzoom: def.minzoom,
            maxzoom: def.maxzoom,
            properties,
            layout: def.layout,
        })
    }
}
