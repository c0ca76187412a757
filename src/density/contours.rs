//! Marching-squares isolines over a density grid.

use crate::{core::geo::Point, density::kernel::DensityGrid};
use fxhash::FxHashMap;

/// A line segment in grid coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

/// A connected isoline in screen coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct Isoline {
    pub level: f64,
    pub points: Vec<Point>,
    pub closed: bool,
}

/// Extracts the segments where `data` crosses `level`.
///
/// `data` is row-major `width` x `height`; cells with a NaN corner are skipped.
pub fn march_squares(data: &[f64], width: usize, height: usize, level: f64) -> Vec<Segment> {
    if width < 2 || height < 2 || data.len() != width * height {
        return Vec::new();
    }

    let mut segments = Vec::new();
    for y in 0..height - 1 {
        for x in 0..width - 1 {
            let tl = data[y * width + x];
            let tr = data[y * width + x + 1];
            let bl = data[(y + 1) * width + x];
            let br = data[(y + 1) * width + x + 1];
            if tl.is_nan() || tr.is_nan() || bl.is_nan() || br.is_nan() {
                continue;
            }

            let mut case = 0u8;
            if tl >= level {
                case |= 1;
            }
            if tr >= level {
                case |= 2;
            }
            if br >= level {
                case |= 4;
            }
            if bl >= level {
                case |= 8;
            }

            cell_segments(case, x as f64, y as f64, [tl, tr, br, bl], level, &mut segments);
        }
    }
    segments
}

fn cell_segments(
    case: u8,
    x: f64,
    y: f64,
    [tl, tr, br, bl]: [f64; 4],
    level: f64,
    out: &mut Vec<Segment>,
) {
    let top = || interpolate_edge(x, y, x + 1.0, y, tl, tr, level);
    let right = || interpolate_edge(x + 1.0, y, x + 1.0, y + 1.0, tr, br, level);
    let bottom = || interpolate_edge(x, y + 1.0, x + 1.0, y + 1.0, bl, br, level);
    let left = || interpolate_edge(x, y, x, y + 1.0, tl, bl, level);
    let mut push = |start: Point, end: Point| out.push(Segment { start, end });

    match case {
        1 | 14 => push(left(), top()),
        2 | 13 => push(top(), right()),
        3 | 12 => push(left(), right()),
        4 | 11 => push(right(), bottom()),
        // Saddles resolved as two separate segments
        5 => {
            push(left(), top());
            push(right(), bottom());
        }
        6 | 9 => push(top(), bottom()),
        7 | 8 => push(left(), bottom()),
        10 => {
            push(top(), right());
            push(left(), bottom());
        }
        _ => {}
    }
}

fn interpolate_edge(x1: f64, y1: f64, x2: f64, y2: f64, v1: f64, v2: f64, level: f64) -> Point {
    if (v2 - v1).abs() < f64::EPSILON {
        return Point::new((x1 + x2) / 2.0, (y1 + y2) / 2.0);
    }
    let t = ((level - v1) / (v2 - v1)).clamp(0.0, 1.0);
    Point::new(x1 + t * (x2 - x1), y1 + t * (y2 - y1))
}

// Endpoints are shared exactly between neighbouring cells, a coarse key is enough
fn endpoint_key(p: &Point) -> (i64, i64) {
    ((p.x * 1e6).round() as i64, (p.y * 1e6).round() as i64)
}

/// Chains unordered segments into polylines
pub fn connect_segments(segments: &[Segment]) -> Vec<(Vec<Point>, bool)> {
    let mut by_endpoint: FxHashMap<(i64, i64), Vec<usize>> = FxHashMap::default();
    for (i, segment) in segments.iter().enumerate() {
        by_endpoint.entry(endpoint_key(&segment.start)).or_default().push(i);
        by_endpoint.entry(endpoint_key(&segment.end)).or_default().push(i);
    }

    let mut used = vec![false; segments.len()];
    let mut lines = Vec::new();

    for first in 0..segments.len() {
        if used[first] {
            continue;
        }
        used[first] = true;
        let mut points = vec![segments[first].start, segments[first].end];

        // Extend forward from the tail, then backward from the head
        for forward in [true, false] {
            loop {
                let tip = if forward { points[points.len() - 1] } else { points[0] };
                let next = by_endpoint
                    .get(&endpoint_key(&tip))
                    .and_then(|candidates| candidates.iter().copied().find(|&i| !used[i]));
                let Some(i) = next else { break };
                used[i] = true;

                let segment = &segments[i];
                let other = if endpoint_key(&segment.start) == endpoint_key(&tip) {
                    segment.end
                } else {
                    segment.start
                };
                if forward {
                    points.push(other);
                } else {
                    points.insert(0, other);
                }
            }
        }

        let closed = points.len() > 2
            && endpoint_key(&points[0]) == endpoint_key(&points[points.len() - 1]);
        lines.push((points, closed));
    }
    lines
}

/// Isolines of the grid at each level, mapped to screen pixels
pub fn isolines(grid: &DensityGrid, levels: &[f64]) -> Vec<Isoline> {
    let cell = grid.cell_size();
    // Grid node (i, j) sits at the center of cell (i, j)
    let to_screen = |p: &Point| Point::new((p.x + 0.5) * cell, (p.y + 0.5) * cell);

    levels
        .iter()
        .flat_map(|&level| {
            let segments = march_squares(grid.values(), grid.cols(), grid.rows(), level);
            connect_segments(&segments)
                .into_iter()
                .map(move |(points, closed)| Isoline {
                    level,
                    points: points.iter().map(to_screen).collect(),
                    closed,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::kernel::estimate;

    #[test]
    fn test_flat_field_has_no_contours() {
        let data = vec![1.0; 9];
        assert!(march_squares(&data, 3, 3, 0.5).is_empty());
        assert!(march_squares(&data, 3, 3, 2.0).is_empty());
    }

    #[test]
    fn test_interpolated_crossing() {
        // Single cell, only top-left above the level
        let data = vec![1.0, 0.0, 0.0, 0.0];
        let segments = march_squares(&data, 2, 2, 0.5);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start, Point::new(0.0, 0.5));
        assert_eq!(segments[0].end, Point::new(0.5, 0.0));
    }

    #[test]
    fn test_peak_gives_closed_ring() {
        #[rustfmt::skip]
        let data = vec![
            0.0, 0.0, 0.0,
            0.0, 1.0, 0.0,
            0.0, 0.0, 0.0,
        ];
        let segments = march_squares(&data, 3, 3, 0.5);
        assert_eq!(segments.len(), 4);

        let lines = connect_segments(&segments);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].1, "ring should close");
        assert_eq!(lines[0].0.len(), 5);
    }

    #[test]
    fn test_isolines_from_density() {
        let grid = estimate(&[Point::new(40.0, 40.0)], 80.0, 80.0, 6.0, 4.0);
        let levels = grid.thresholds(3);
        let lines = isolines(&grid, &levels[..2]);
        assert!(!lines.is_empty());
        for line in &lines {
            assert!(line.closed);
            assert!(line.points.iter().all(|p| p.x > 0.0 && p.x < 80.0));
        }
    }
}
