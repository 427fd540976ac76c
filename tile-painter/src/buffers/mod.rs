//! Named float columns produced by the feature serializers and consumed by the loader.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::flatten::LINE_STRIDE;

mod concat;

pub use concat::concat;

pub const CIRCLE_POS: &str = "circlePos";
pub const LINES: &str = "lines";
pub const POSITION: &str = "position";
pub const TILE_COORDS: &str = "tileCoords";
pub const LABEL_POS: &str = "labelPos";
pub const GLYPH_POS: &str = "glyphPos";
pub const GLYPH_RECT: &str = "glyphRect";

/// The program a set of buffers belongs to, derived from the columns present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferShape {
    Circle,
    Line,
    Fill,
    Symbol,
}

impl BufferShape {
    /// Column holding the geometry of this shape.
    pub const fn geometry_column(self) -> &'static str {
        match self {
            BufferShape::Circle => CIRCLE_POS,
            BufferShape::Line => LINES,
            BufferShape::Fill => POSITION,
            BufferShape::Symbol => GLYPH_POS,
        }
    }

    /// Floats of the geometry column which make up one geometric unit.
    pub const fn unit_size(self) -> usize {
        match self {
            BufferShape::Circle | BufferShape::Fill => 2,
            BufferShape::Line => LINE_STRIDE,
            BufferShape::Symbol => 4,
        }
    }
}

/// Flat numeric columns of one layer, for a single feature or a whole tile.
///
/// Every column but `indices` holds `f32`s. For fill buffers every index is smaller than
/// `position.len() / 2`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderBuffers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indices: Option<Vec<u32>>,
    #[serde(flatten)]
    pub columns: BTreeMap<String, Vec<f32>>,
}

impl RenderBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column(mut self, name: impl Into<String>, data: Vec<f32>) -> Self {
        self.columns.insert(name.into(), data);
        self
    }

    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = Some(indices);
        self
    }

    pub fn column(&self, name: &str) -> Option<&[f32]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Appends `value` `count` times to the column `name`.
    pub fn broadcast(&mut self, name: &str, value: &[f32], count: usize) {
        let column = self.columns.entry(name.to_string()).or_default();
        column.reserve(value.len() * count);
        for _ in 0..count {
            column.extend_from_slice(value);
        }
    }

    pub fn shape(&self) -> Option<BufferShape> {
        if self.has_column(CIRCLE_POS) {
            Some(BufferShape::Circle)
        } else if self.has_column(LINES) {
            Some(BufferShape::Line)
        } else if self.has_column(POSITION) && self.indices.is_some() {
            Some(BufferShape::Fill)
        } else if self.has_column(GLYPH_POS) {
            Some(BufferShape::Symbol)
        } else {
            None
        }
    }

    /// Number of geometric units stored in the geometry column: points, line points,
    /// vertices or glyphs.
    pub fn units(&self) -> usize {
        self.shape().map_or(0, |shape| {
            self.column(shape.geometry_column())
                .map_or(0, |column| column.len() / shape.unit_size())
        })
    }

    /// Number of GPU instances or vertices drawn for these buffers.
    ///
    /// A line of `n` points is stored as `n + 2` bracketed triples and drawn as `n - 1`
    /// segments.
    pub fn len(&self) -> usize {
        match self.shape() {
            Some(BufferShape::Line) => self.units().saturating_sub(3),
            Some(_) => self.units(),
            None => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }
}
