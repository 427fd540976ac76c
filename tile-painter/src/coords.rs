//! Provides utilities related to tile coordinates.

use std::{
    fmt,
    fmt::{Display, Formatter},
};

use serde::{Deserialize, Serialize};

use crate::util::math::div_floor;

/// The nominal width and height of a vector tile's local coordinate system.
pub const DEFAULT_EXTENT: u32 = 512;
pub const MAX_ZOOM: usize = 31;

// Bounds are generated 0..=30 so every bound fits into an i32
pub const ZOOM_BOUNDS: [i32; MAX_ZOOM] = create_zoom_bounds::<MAX_ZOOM>();

const fn create_zoom_bounds<const DIM: usize>() -> [i32; DIM] {
    let mut result: [i32; DIM] = [0; DIM];
    let mut i = 0;
    while i < DIM {
        result[i] = 2i32.pow(i as u32);
        i += 1;
    }
    result
}

#[derive(
    Ord, PartialOrd, Eq, PartialEq, Hash, Copy, Clone, Debug, Default, Serialize, Deserialize,
)]
pub struct ZoomLevel(u8);

impl ZoomLevel {
    pub const fn new(z: u8) -> Self {
        ZoomLevel(z)
    }

    /// Number of tiles along one axis of the world at this zoom level.
    ///
    /// `None` beyond zoom level 30, where tile positions no longer fit into an `i32`.
    pub fn num_tiles(self) -> Option<i32> {
        ZOOM_BOUNDS.get(self.0 as usize).copied()
    }
}

impl Display for ZoomLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for ZoomLevel {
    fn from(zoom_level: u8) -> Self {
        ZoomLevel(zoom_level)
    }
}

impl From<ZoomLevel> for u8 {
    fn from(val: ZoomLevel) -> Self {
        val.0
    }
}

impl From<ZoomLevel> for f64 {
    fn from(val: ZoomLevel) -> Self {
        val.0 as f64
    }
}

/// Every tile has tile coordinates. These tile coordinates are also called
/// [Slippy map tile names](https://wiki.openstreetmap.org/wiki/Slippy_map_tilenames).
///
/// `0 <= x, y < 2^z` is the canonical position of a tile. `x` may lie outside of this range, in
/// which case the coordinates describe a copy of the tile which is wrapped around the
/// antimeridian.
///
/// # Coordinate System Origin
///
/// The origin of the coordinate system is in the upper-left corner.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Default, Serialize, Deserialize)]
pub struct TileCoords {
    pub x: i32,
    pub y: i32,
    pub z: ZoomLevel,
}

impl TileCoords {
    pub fn new(x: i32, y: i32, z: u8) -> Self {
        Self {
            x,
            y,
            z: ZoomLevel::new(z),
        }
    }

    /// Returns the canonical copy of this tile, with `x` wrapped into `[0, 2^z)`.
    pub fn wrapped(self) -> Option<Self> {
        Some(Self {
            x: wrap_x(self.x, self.z.num_tiles()?),
            ..self
        })
    }

    pub fn is_canonical(&self) -> bool {
        self.z
            .num_tiles()
            .map_or(false, |bounds| (0..bounds).contains(&self.x) && (0..bounds).contains(&self.y))
    }

    /// The `[x, y, z]` triple which is baked into vertex buffers.
    pub fn to_array(self) -> [f32; 3] {
        [self.x as f32, self.y as f32, u8::from(self.z) as f32]
    }
}

impl From<(i32, i32, ZoomLevel)> for TileCoords {
    fn from(tuple: (i32, i32, ZoomLevel)) -> Self {
        TileCoords {
            x: tuple.0,
            y: tuple.1,
            z: tuple.2,
        }
    }
}

impl Display for TileCoords {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "T(x={x},y={y},z={z})",
            x = self.x,
            y = self.y,
            z = self.z
        )
    }
}

/// Wraps `x` into `[0, num_tiles)`.
pub fn wrap_x(x: i32, num_tiles: i32) -> i32 {
    x - div_floor(x, num_tiles) * num_tiles
}

#[cfg(test)]
mod tests {
    use crate::coords::{wrap_x, TileCoords, ZoomLevel};

    #[test]
    fn test_wrap_x() {
        assert_eq!(wrap_x(5, 4), 1);
        assert_eq!(wrap_x(-1, 4), 3);
        assert_eq!(wrap_x(-8, 4), 0);
        assert_eq!(wrap_x(3, 4), 3);
        assert_eq!(wrap_x(0, 1), 0);
        assert_eq!(wrap_x(-7, 1), 0);
    }

    #[test]
    fn wrapping_is_idempotent() {
        for z in 0..6u8 {
            let num_tiles = ZoomLevel::new(z).num_tiles().unwrap();
            for x in -3 * num_tiles..3 * num_tiles {
                let once = wrap_x(x, num_tiles);
                assert!((0..num_tiles).contains(&once));
                assert_eq!(wrap_x(once, num_tiles), once);
            }
        }
    }

    #[test]
    fn test_wrapped_tile() {
        let tile = TileCoords::new(-1, 2, 2);
        assert!(!tile.is_canonical());
        assert_eq!(tile.wrapped(), Some(TileCoords::new(3, 2, 2)));
        assert!(tile.wrapped().unwrap().is_canonical());
        assert_eq!(tile.to_array(), [-1.0, 2.0, 2.0]);
    }

    #[test]
    fn test_deepest_zoom_levels() {
        assert_eq!(ZoomLevel::new(30).num_tiles(), Some(1 << 30));
        assert_eq!(ZoomLevel::new(31).num_tiles(), None);
        assert_eq!(ZoomLevel::new(u8::MAX).num_tiles(), None);

        let deep = TileCoords::new(-1, 0, 31);
        assert_eq!(deep.wrapped(), None);
        assert!(!deep.is_canonical());
        assert_eq!(
            TileCoords::new(-1, 0, 30).wrapped(),
            Some(TileCoords::new((1 << 30) - 1, 0, 30))
        );
    }
}
