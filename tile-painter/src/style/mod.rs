//! Vector tile format styling.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::Error;

pub mod function;
pub mod layer;
pub mod property;

pub use function::{StyleFunction, StyleValue};
pub use layer::{LayerType, StyleLayer, UnsupportedLayer};
pub use property::Property;

/// Stores the style for a multi-layered map.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Style {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sources: Map<String, Value>,
    pub layers: Vec<StyleLayer>,
}

impl Style {
    /// Parses a style. Layer ids must be unique, compiled tiles are keyed by them.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let style: Style = serde_json::from_str(json).map_err(|e| Error::Style(e.to_string()))?;
        let mut ids = HashSet::with_capacity(style.layers.len());
        if let Some(layer) = style.layers.iter().find(|layer| !ids.insert(layer.id.as_str())) {
            return Err(Error::Style(format!("duplicate layer id {}", layer.id)));
        }
        Ok(style)
    }

    pub fn layer(&self, id: &str) -> Option<&StyleLayer> {
        self.layers.iter().find(|layer| layer.id == id)
    }
}
