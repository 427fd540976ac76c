//! # tile-painter
//!
//! A pipeline which turns vector tiles into GPU draw calls.
//!
//! Features of a decoded [`VectorTile`](geometry::VectorTile) are flattened and serialized per
//! style layer into [`RenderBuffers`](buffers::RenderBuffers), concatenated per tile and loaded
//! into vertex arrays of a [`GpuContext`](render::GpuContext). A [`Painter`](render::Painter)
//! per style layer then draws a grid of loaded tiles, including grids which cross the
//! antimeridian.
//!
//! ### Example
//!
//! To import tile-painter in your `Cargo.toml`:
//!
//! ```toml
//! tile-painter = "0.1.0"
//! ```

pub mod buffers;
pub mod coords;
pub mod error;
pub mod geometry;
pub mod render;
pub mod serialize;
pub mod settings;
pub mod style;
pub mod util;

pub use error::Error;
