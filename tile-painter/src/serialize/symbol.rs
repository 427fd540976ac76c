//! Contracts of the text collaborators used by symbol layers.
//!
//! Glyph rasterization, atlas packing and text shaping are provided by the embedding
//! application. This module defines what they exchange with the serializers.

use std::collections::HashMap;

use async_trait::async_trait;
use image::GrayImage;
use rstar::{RTree, RTreeObject, AABB};

use crate::{
    buffers::RenderBuffers, coords::TileCoords, error::Error, geometry::Feature,
    style::StyleLayer, util::math::bounds_from_points,
};

/// Location and metrics of a glyph within a [`GlyphAtlas`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphRect {
    /// x origin within the packed texture
    pub x: u32,
    /// y origin within the packed texture
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub left: f32,
    pub top: f32,
    pub advance: f32,
}

/// A packed signed distance field texture plus the rectangles of its glyphs per font.
#[derive(Debug, Clone)]
pub struct GlyphAtlas {
    pub image: GrayImage,
    pub fonts: HashMap<String, HashMap<char, GlyphRect>>,
}

impl GlyphAtlas {
    pub fn new(image: GrayImage) -> Self {
        Self {
            image,
            fonts: HashMap::new(),
        }
    }

    pub fn glyph(&self, font: &str, codepoint: char) -> Option<&GlyphRect> {
        self.fonts.get(font)?.get(&codepoint)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Builds glyph atlases for the symbol layers of a source.
///
/// Futures are only required to be `Send` with the feature "thread-safe-futures", see
/// the async_trait documentation on non-threadsafe futures.
#[cfg_attr(not(feature = "thread-safe-futures"), async_trait(?Send))]
#[cfg_attr(feature = "thread-safe-futures", async_trait)]
pub trait AtlasSource {
    async fn request_atlas(&self, source: &str, zoom: u8) -> Result<GlyphAtlas, Error>;
}

/// Places the label of a feature.
///
/// Returns `None` if the label cannot be placed without colliding with a label placed before.
/// A placed label inserts its boxes into `collisions`. Returned buffers carry the columns
/// `labelPos` (2 per glyph), `glyphPos` (4 per glyph) and `glyphRect` (4 per glyph).
pub trait LabelShaper {
    fn shape(
        &self,
        layer: &StyleLayer,
        feature: &Feature,
        coords: TileCoords,
        atlas: &GlyphAtlas,
        collisions: &mut CollisionIndex,
    ) -> Option<RenderBuffers>;
}

/// An axis aligned box in tile coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionBox {
    pub bounds: AABB<[f32; 2]>,
}

impl CollisionBox {
    pub fn new(min: [f32; 2], max: [f32; 2]) -> Self {
        Self {
            bounds: AABB::from_corners(min, max),
        }
    }

    /// The smallest box containing all points.
    pub fn from_points(points: impl Iterator<Item = [f32; 2]>) -> Option<Self> {
        let (min, max) = bounds_from_points(points)?;
        Some(Self::new(min, max))
    }
}

impl RTreeObject for CollisionBox {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.bounds
    }
}

/// Boxes of the labels placed so far within a tile.
#[derive(Default)]
pub struct CollisionIndex {
    tree: RTree<CollisionBox>,
}

impl CollisionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collides(&self, collision_box: &CollisionBox) -> bool {
        self.tree
            .locate_in_envelope_intersecting(&collision_box.bounds)
            .next()
            .is_some()
    }

    pub fn insert(&mut self, collision_box: CollisionBox) {
        self.tree.insert(collision_box)
    }

    /// Inserts the box unless it collides. Returns whether it was inserted.
    pub fn try_insert(&mut self, collision_box: CollisionBox) -> bool {
        if self.collides(&collision_box) {
            false
        } else {
            self.insert(collision_box);
            true
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
