//! Placement of tiles on the screen.
//!
//! A [`Tileset`] is a grid of same-zoom tiles sharing one translation and scale. The vertex
//! shaders position every vertex relative to the first tile of the grid with `tileToMap` and
//! convert to clip space with `mapToClip`. [`tile_to_map`] and [`map_to_clip`] are CPU versions
//! of these two functions.

use cgmath::{Vector2, Vector3, Vector4};

use crate::{
    coords::{wrap_x, ZoomLevel},
    error::Error,
    render::context::ClipRect,
};

/// Number of world copies a tileset may span.
pub const MAX_REPEATS: i32 = 3;

/// A tile at a position of the grid, in tiles.
///
/// `tile` may have been loaded for another position, for example a parent tile which is
/// overzoomed or the canonical copy of a tile wrapped around the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBox<T> {
    pub x: i32,
    pub y: i32,
    pub tile: T,
}

/// Tiles of one zoom level drawn into one framebuffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Tileset<T> {
    z: ZoomLevel,
    /// Tiles along one axis of the world at `z`.
    num_tiles: i32,
    /// Offset of the grid in tiles.
    translate: [f32; 2],
    /// Size of a tile in logical pixels.
    scale: f32,
    boxes: Vec<TileBox<T>>,
}

/// Tiles of a tileset which lie in the same copy of the world.
#[derive(Debug)]
pub struct TileSubset<'a, T> {
    pub repeat: i32,
    pub boxes: Vec<&'a TileBox<T>>,
    /// Uniform `mapShift` of this copy: `[dx, dy, pixelScale]`.
    pub map_shift: [f32; 3],
}

impl<T> Tileset<T> {
    /// Fails if a box lies more than two world copies to the right of the first box, or left
    /// of it, and for zoom levels beyond 30.
    pub fn new(
        z: impl Into<ZoomLevel>,
        translate: [f32; 2],
        scale: f32,
        boxes: Vec<TileBox<T>>,
    ) -> Result<Self, Error> {
        let z = z.into();
        let num_tiles = z
            .num_tiles()
            .ok_or_else(|| Error::Tileset(format!("zoom level {z} is too deep")))?;
        if let Some(first) = boxes.first() {
            let x0 = first.x;
            let span = 0..i64::from(MAX_REPEATS) * i64::from(num_tiles);
            if let Some(outlier) = boxes
                .iter()
                .find(|tile_box| !span.contains(&(i64::from(tile_box.x) - i64::from(x0))))
            {
                return Err(Error::Tileset(format!(
                    "box at x={} is not within {MAX_REPEATS} world copies right of x={x0} at z={z}",
                    outlier.x
                )));
            }
        }

        Ok(Self {
            z,
            num_tiles,
            translate,
            scale,
            boxes,
        })
    }

    pub fn z(&self) -> ZoomLevel {
        self.z
    }

    pub fn translate(&self) -> [f32; 2] {
        self.translate
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn boxes(&self) -> &[TileBox<T>] {
        &self.boxes
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Framebuffer pixels per tile.
    pub fn pixel_scale(&self, pixel_ratio: f32) -> f32 {
        self.scale * pixel_ratio
    }

    /// Uniform `mapCoords`: `[xWrapped, y, z, extent]` of the first box.
    pub fn map_coords(&self, extent: u32) -> Option<[f32; 4]> {
        let first = self.boxes.first()?;
        let xw = wrap_x(first.x, self.num_tiles);
        Some([xw as f32, first.y as f32, f64::from(self.z) as f32, extent as f32])
    }

    /// Uniform `mapShift` for the world copy `repeat`.
    pub fn map_shift(&self, repeat: i32, pixel_ratio: f32) -> Option<[f32; 3]> {
        let first = self.boxes.first()?;
        let pixel_scale = self.pixel_scale(pixel_ratio);
        let shift = i64::from(repeat) * i64::from(self.num_tiles);
        Some([
            (first.x as f32 + self.translate[0] + shift as f32) * pixel_scale,
            (first.y as f32 + self.translate[1]) * pixel_scale,
            pixel_scale,
        ])
    }

    /// Splits the boxes by the world copy they lie in, relative to the first box.
    ///
    /// Every box belongs to exactly one subset. Empty subsets are dropped.
    pub fn antimeridian_split(&self, pixel_ratio: f32) -> Vec<TileSubset<'_, T>> {
        let Some(first) = self.boxes.first() else {
            return Vec::new();
        };
        let num_tiles = i64::from(self.num_tiles);

        (0..MAX_REPEATS)
            .filter_map(|repeat| {
                let range = i64::from(repeat) * num_tiles..i64::from(repeat + 1) * num_tiles;
                let boxes: Vec<_> = self
                    .boxes
                    .iter()
                    .filter(|tile_box| {
                        range.contains(&(i64::from(tile_box.x) - i64::from(first.x)))
                    })
                    .collect();
                if boxes.is_empty() {
                    return None;
                }
                Some(TileSubset {
                    repeat,
                    boxes,
                    map_shift: self.map_shift(repeat, pixel_ratio)?,
                })
            })
            .collect()
    }

    /// Scissor rectangle of a box in framebuffer pixels, flipped to a lower left origin.
    pub fn clip_rect(
        &self,
        tile_box: &TileBox<T>,
        pixel_ratio: f32,
        framebuffer_height: u32,
    ) -> ClipRect {
        let pixel_scale = self.pixel_scale(pixel_ratio);
        let x0 = (tile_box.x as f32 + self.translate[0]) * pixel_scale;
        let y0 = (tile_box.y as f32 + self.translate[1]) * pixel_scale;
        ClipRect {
            x: x0,
            y: framebuffer_height as f32 - y0 - pixel_scale,
            width: pixel_scale,
            height: pixel_scale,
        }
    }
}

/// Uniform `screenScale`: `[2 / width, -2 / height, pixelRatio, cameraScale]`.
pub fn screen_scale(width: u32, height: u32, pixel_ratio: f32, camera_scale: f32) -> [f32; 4] {
    [
        2.0 / width as f32,
        -2.0 / height as f32,
        pixel_ratio,
        camera_scale,
    ]
}

/// Position of a point of a tile in framebuffer pixels, as computed by `tileToMap`.
///
/// `tile` is the `[x, y, z]` of the tile the point belongs to. Tiles of another zoom level
/// than the grid are scaled by `2^(mapZ - tileZ)`. A tile which would lie left of the first
/// tile is moved one world copy to the right.
pub fn tile_to_map(
    tile_pos: [f32; 2],
    tile: [f32; 3],
    map_coords: [f32; 4],
    map_shift: [f32; 3],
) -> [f32; 2] {
    let tile = Vector3::from(tile);
    let map = Vector4::from(map_coords);

    let zoom_factor = (map.z - tile.z).exp2();
    let mut d_tile = tile.truncate() * zoom_factor - map.truncate().truncate();
    if d_tile.x + zoom_factor <= 0.0 {
        d_tile.x += map.z.exp2();
    }

    let pixel_scale = map_shift[2];
    let position = Vector2::from(tile_pos) * (zoom_factor * pixel_scale / map.w)
        + d_tile * pixel_scale
        + Vector2::new(map_shift[0], map_shift[1]);
    position.into()
}

/// Clip space position of a map position, as computed by `mapToClip`.
pub fn map_to_clip(map_pos: [f32; 2], screen_scale: [f32; 4]) -> [f32; 2] {
    [
        map_pos[0] * screen_scale[0] - 1.0,
        map_pos[1] * screen_scale[1] + 1.0,
    ]
}
