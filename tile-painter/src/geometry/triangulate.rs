//! Polygon triangulation.

use earcutr::earcut;

/// Turns a flattened polygon into triangles.
///
/// `coords` holds `[x0, y0, x1, y1, ...]` of the exterior ring followed by all holes, without
/// closing vertices. `hole_starts` holds the vertex index at which each hole begins. The result
/// indexes into the vertices of `coords`, three indices per triangle.
pub trait Triangulator {
    fn triangulate(&self, coords: &[f64], hole_starts: &[usize]) -> Option<Vec<u32>>;
}

/// Ear clipping triangulation backed by `earcutr`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EarcutTriangulator;

impl Triangulator for EarcutTriangulator {
    fn triangulate(&self, coords: &[f64], hole_starts: &[usize]) -> Option<Vec<u32>> {
        match earcut(coords, hole_starts, 2) {
            Ok(indices) if indices.len() % 3 == 0 => {
                Some(indices.into_iter().map(|index| index as u32).collect())
            }
            Ok(indices) => {
                log::warn!("triangulation produced {} indices", indices.len());
                None
            }
            Err(_) => {
                log::warn!("triangulation of {} vertices failed", coords.len() / 2);
                None
            }
        }
    }
}
