//! Flattening of feature geometries into the coordinate arrays consumed by the GPU programs.
//!
//! All functions are total. Geometry types which a render type cannot draw yield `None`, which
//! callers treat as "skip this feature".

use geo_types::{Coord, Geometry, LineString, Polygon};

use crate::{geometry::triangulate::Triangulator, util::math::distance};

/// Distance value of the duplicated endpoint which brackets every line string.
///
/// The line program reads four consecutive points per instance. A neighbor carrying this value
/// marks a cap instead of a join.
pub const CAP_SENTINEL: f32 = -999.0;

/// Distance value of the wrap-around neighbors of a closed ring.
///
/// These points only steer the miter of the first and last segment. Windows which start or end
/// on them are not drawn.
pub const RING_NEIGHBOR: f32 = -1.0;

/// Number of floats per point of a flattened line.
pub const LINE_STRIDE: usize = 3;

/// Vertices and triangle indices of a filled geometry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FillGeometry {
    pub position: Vec<f32>,
    pub indices: Vec<u32>,
}

impl FillGeometry {
    pub fn vertex_count(&self) -> usize {
        self.position.len() / 2
    }

    /// Appends another fill, shifting its indices past the vertices already present.
    pub fn append(&mut self, other: FillGeometry) {
        let offset = self.vertex_count() as u32;
        self.position.extend(other.position);
        self.indices
            .extend(other.indices.into_iter().map(|index| index + offset));
    }
}

/// `Point -> [x, y]`, `MultiPoint -> [x0, y0, x1, y1, ...]`.
pub fn flatten_circle(geometry: &Geometry<f64>) -> Option<Vec<f32>> {
    match geometry {
        Geometry::Point(point) => Some(vec![point.x() as f32, point.y() as f32]),
        Geometry::MultiPoint(points) => Some(
            points
                .iter()
                .flat_map(|point| [point.x() as f32, point.y() as f32])
                .collect(),
        ),
        _ => None,
    }
}

/// Flattens line strings and polygon rings into bracketed `(x, y, distance)` triples.
pub fn flatten_lines(geometry: &Geometry<f64>) -> Option<Vec<f32>> {
    let mut lines = Vec::new();
    match geometry {
        Geometry::LineString(line) => flatten_line(&line.0, &mut lines),
        Geometry::MultiLineString(multi) => {
            for line in multi {
                flatten_line(&line.0, &mut lines);
            }
        }
        Geometry::Polygon(polygon) => flatten_polygon_rings(polygon, &mut lines),
        Geometry::MultiPolygon(multi) => {
            for polygon in multi {
                flatten_polygon_rings(polygon, &mut lines);
            }
        }
        _ => return None,
    }

    if lines.is_empty() {
        None
    } else {
        Some(lines)
    }
}

fn flatten_polygon_rings(polygon: &Polygon<f64>, out: &mut Vec<f32>) {
    flatten_ring(polygon.exterior(), out);
    for interior in polygon.interiors() {
        flatten_ring(interior, out);
    }
}

/// Appends `n + 2` triples for a line of `n >= 2` points. Shorter lines are dropped.
fn flatten_line(points: &[Coord<f64>], out: &mut Vec<f32>) {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return;
    };
    if points.len() < 2 {
        return;
    }

    out.reserve((points.len() + 2) * LINE_STRIDE);
    push_point(out, *first, CAP_SENTINEL);
    push_with_distances(points, 0.0, out);
    push_point(out, *last, CAP_SENTINEL);
}

/// Appends the closed `ring` with its second-to-last and second point as outer neighbors.
fn flatten_ring(ring: &LineString<f64>, out: &mut Vec<f32>) {
    let points = &ring.0;
    let n = points.len();
    // A closed ring needs at least a triangle plus the closing point
    if n < 4 {
        return;
    }

    out.reserve((n + 2) * LINE_STRIDE);
    push_point(out, points[n - 2], RING_NEIGHBOR);
    push_with_distances(points, 0.0, out);
    push_point(out, points[1], RING_NEIGHBOR);
}

fn push_with_distances(points: &[Coord<f64>], start: f64, out: &mut Vec<f32>) {
    let mut cumulative = start;
    let mut previous: Option<Coord<f64>> = None;
    for point in points {
        if let Some(previous) = previous {
            cumulative += distance(previous.into(), (*point).into());
        }
        push_point(out, *point, cumulative as f32);
        previous = Some(*point);
    }
}

fn push_point(out: &mut Vec<f32>, point: Coord<f64>, distance: f32) {
    out.extend_from_slice(&[point.x as f32, point.y as f32, distance]);
}

/// Triangulates polygons. Each polygon of a multi polygon is triangulated on its own and the
/// results are joined with [`FillGeometry::append`].
pub fn flatten_fill<T>(geometry: &Geometry<f64>, triangulator: &T) -> Option<FillGeometry>
where
    T: Triangulator + ?Sized,
{
    match geometry {
        Geometry::Polygon(polygon) => triangulate_polygon(polygon, triangulator),
        Geometry::MultiPolygon(multi) => {
            let mut fill = FillGeometry::default();
            for polygon in multi {
                if let Some(part) = triangulate_polygon(polygon, triangulator) {
                    fill.append(part);
                }
            }
            if fill.indices.is_empty() {
                None
            } else {
                Some(fill)
            }
        }
        _ => None,
    }
}

fn triangulate_polygon<T>(polygon: &Polygon<f64>, triangulator: &T) -> Option<FillGeometry>
where
    T: Triangulator + ?Sized,
{
    let mut coords: Vec<f64> = Vec::new();
    let mut hole_starts = Vec::new();

    if !append_ring(polygon.exterior(), &mut coords) {
        return None;
    }
    for interior in polygon.interiors() {
        let start = coords.len() / 2;
        if append_ring(interior, &mut coords) {
            hole_starts.push(start);
        }
    }

    let indices = triangulator.triangulate(&coords, &hole_starts)?;
    if indices.is_empty() {
        return None;
    }

    Some(FillGeometry {
        position: coords.into_iter().map(|c| c as f32).collect(),
        indices,
    })
}

/// Appends the ring without its closing vertex. Returns false for degenerate rings.
fn append_ring(ring: &LineString<f64>, coords: &mut Vec<f64>) -> bool {
    let mut points = ring.0.as_slice();
    if let [first, .., last] = points {
        if first == last {
            points = &points[..points.len() - 1];
        }
    }
    if points.len() < 3 {
        return false;
    }

    coords.extend(points.iter().flat_map(|point| [point.x, point.y]));
    true
}

#[cfg(test)]
mod tests {
    use geo_types::{line_string, point, polygon, MultiLineString, MultiPoint, MultiPolygon};

    use super::*;
    use crate::{
        buffers::{concat, RenderBuffers, POSITION},
        geometry::triangulate::EarcutTriangulator,
    };

    fn unit_square(x: f64, y: f64) -> Polygon<f64> {
        polygon![
            (x: x, y: y),
            (x: x + 1.0, y: y),
            (x: x + 1.0, y: y + 1.0),
            (x: x, y: y + 1.0),
            (x: x, y: y),
        ]
    }

    #[test]
    fn circle_positions() {
        let point = Geometry::Point(point!(x: 100.0, y: 200.0));
        assert_eq!(flatten_circle(&point), Some(vec![100.0, 200.0]));

        let multi = Geometry::MultiPoint(MultiPoint::from(vec![(1.0, 2.0), (3.0, 4.0)]));
        assert_eq!(flatten_circle(&multi), Some(vec![1.0, 2.0, 3.0, 4.0]));

        let line = Geometry::LineString(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)]);
        assert_eq!(flatten_circle(&line), None);
    }

    #[test]
    fn line_is_bracketed_by_caps() {
        let line = Geometry::LineString(line_string![
            (x: 0.0, y: 0.0),
            (x: 3.0, y: 4.0),
            (x: 3.0, y: 10.0),
        ]);
        let lines = flatten_lines(&line).unwrap();
        assert_eq!(
            lines,
            vec![
                0.0, 0.0, CAP_SENTINEL, //
                0.0, 0.0, 0.0, //
                3.0, 4.0, 5.0, //
                3.0, 10.0, 11.0, //
                3.0, 10.0, CAP_SENTINEL,
            ]
        );
    }

    #[test]
    fn line_length_matches_point_count() {
        for n in 2..20 {
            let points: Vec<(f64, f64)> = (0..n).map(|i| (i as f64, (i * i) as f64)).collect();
            let line = Geometry::LineString(LineString::from(points));
            let lines = flatten_lines(&line).unwrap();
            assert_eq!(lines.len(), 3 * (n + 2));
            assert_eq!(lines.len() / 3 - 3, n - 1);
        }
    }

    #[test]
    fn degenerate_lines_are_dropped() {
        let single = Geometry::LineString(line_string![(x: 1.0, y: 1.0)]);
        assert_eq!(flatten_lines(&single), None);

        let multi = Geometry::MultiLineString(MultiLineString::new(vec![
            line_string![(x: 1.0, y: 1.0)],
            line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 2.0)],
        ]));
        assert_eq!(flatten_lines(&multi).unwrap().len(), 3 * 4);
    }

    #[test]
    fn ring_uses_wrap_around_neighbors() {
        let square = Geometry::Polygon(unit_square(0.0, 0.0));
        let lines = flatten_lines(&square).unwrap();
        // 5 ring points plus two neighbors
        assert_eq!(lines.len(), 3 * 7);
        // second-to-last point of the ring
        assert_eq!(&lines[0..3], &[0.0, 1.0, RING_NEIGHBOR]);
        // second point of the ring
        assert_eq!(&lines[18..21], &[1.0, 0.0, RING_NEIGHBOR]);
        // closing point carries the perimeter
        assert_eq!(&lines[15..18], &[0.0, 0.0, 4.0]);
    }

    #[test]
    fn fill_drops_closing_vertex() {
        let square = Geometry::Polygon(unit_square(0.0, 0.0));
        let fill = flatten_fill(&square, &EarcutTriangulator).unwrap();
        assert_eq!(fill.position.len(), 8);
        assert_eq!(fill.indices.len(), 6);
    }

    #[test]
    fn multi_polygon_indices_are_rebased() {
        let multi = Geometry::MultiPolygon(MultiPolygon::new(vec![
            unit_square(0.0, 0.0),
            unit_square(5.0, 5.0),
        ]));
        let fill = flatten_fill(&multi, &EarcutTriangulator).unwrap();
        assert_eq!(fill.position.len(), 16);
        assert_eq!(fill.indices.len(), 12);
        assert!(fill.indices[..6].iter().all(|i| *i < 4));
        assert!(fill.indices[6..].iter().all(|i| (4..8).contains(i)));
    }

    #[test]
    fn multi_polygon_rebasing_matches_concat() {
        let polygons = vec![
            unit_square(0.0, 0.0),
            polygon![
                exterior: [
                    (x: 10.0, y: 10.0),
                    (x: 20.0, y: 10.0),
                    (x: 20.0, y: 20.0),
                    (x: 10.0, y: 20.0),
                ],
                interiors: [[
                    (x: 12.0, y: 12.0),
                    (x: 14.0, y: 12.0),
                    (x: 14.0, y: 14.0),
                    (x: 12.0, y: 14.0),
                ]]
            ],
            unit_square(5.0, 5.0),
        ];
        let fill = flatten_fill(
            &Geometry::MultiPolygon(MultiPolygon::new(polygons.clone())),
            &EarcutTriangulator,
        )
        .unwrap();

        let bundles = polygons
            .into_iter()
            .map(|polygon| {
                let part = flatten_fill(&Geometry::Polygon(polygon), &EarcutTriangulator).unwrap();
                RenderBuffers::new()
                    .with_column(POSITION, part.position)
                    .with_indices(part.indices)
            })
            .collect();
        let merged = concat(bundles);

        assert_eq!(merged.column(POSITION), Some(fill.position.as_slice()));
        assert_eq!(merged.indices, Some(fill.indices));
    }

    #[test]
    fn fill_rejects_lines() {
        let line = Geometry::LineString(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)]);
        assert_eq!(flatten_fill(&line, &EarcutTriangulator), None);
    }
}
