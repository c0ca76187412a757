//! Gaussian kernel density estimation over projected screen points.
//!
//! Points are binned into a padded grid of `cell_size` pixels, then blurred
//! with a separable Gaussian of standard deviation `bandwidth`, truncated at
//! three sigma. The result is a density in points per square pixel, so the
//! values integrate back to the point count away from the edges.

use crate::core::{constants::KERNEL_CUTOFF_SIGMAS, geo::Point};
use log::debug;

/// Density raster covering the viewport, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct DensityGrid {
    cols: usize,
    rows: usize,
    cell_size: f64,
    bandwidth: f64,
    values: Vec<f64>,
    max: f64,
}

impl DensityGrid {
    pub fn empty(width: f64, height: f64, cell_size: f64, bandwidth: f64) -> Self {
        let (cols, rows) = grid_dims(width, height, cell_size);
        Self {
            cols,
            rows,
            cell_size,
            bandwidth,
            values: vec![0.0; cols * rows],
            max: 0.0,
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Largest cell value, 0 for an empty surface
    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn value(&self, col: usize, row: usize) -> f64 {
        if col < self.cols && row < self.rows {
            self.values[row * self.cols + col]
        } else {
            0.0
        }
    }

    /// Value of the cell under a screen position
    pub fn value_at(&self, position: &Point) -> f64 {
        if !position.is_finite() || position.x < 0.0 || position.y < 0.0 {
            return 0.0;
        }
        let col = (position.x / self.cell_size) as usize;
        let row = (position.y / self.cell_size) as usize;
        self.value(col, row)
    }

    /// Screen position of a cell center
    pub fn cell_center(&self, col: usize, row: usize) -> Point {
        Point::new(
            (col as f64 + 0.5) * self.cell_size,
            (row as f64 + 0.5) * self.cell_size,
        )
    }

    /// Approximate number of points represented by the surface
    pub fn mass(&self) -> f64 {
        self.values.iter().sum::<f64>() * self.cell_size * self.cell_size
    }

    /// Evenly spaced iso-values over `(0, max]`, empty for a flat surface
    pub fn thresholds(&self, count: usize) -> Vec<f64> {
        if !(self.max > 0.0) || count == 0 {
            return Vec::new();
        }
        (1..=count)
            .map(|k| self.max * k as f64 / count as f64)
            .collect()
    }

    /// Index of the highest threshold at or below each cell value, `None`
    /// below the first threshold
    pub fn bands(&self, thresholds: &[f64]) -> Vec<Option<usize>> {
        self.values
            .iter()
            .map(|&value| thresholds.iter().rposition(|&level| value >= level))
            .collect()
    }
}

fn grid_dims(width: f64, height: f64, cell_size: f64) -> (usize, usize) {
    let cols = (width / cell_size).ceil().max(1.0) as usize;
    let rows = (height / cell_size).ceil().max(1.0) as usize;
    (cols, rows)
}

/// Cells the padded estimation raster needs for a viewport, as `f64` so
/// absurd configurations cannot overflow
pub fn padded_cell_count(width: f64, height: f64, cell_size: f64, bandwidth: f64) -> f64 {
    let pad = (KERNEL_CUTOFF_SIGMAS * bandwidth / cell_size).ceil();
    let cols = (width / cell_size).ceil().max(1.0) + 2.0 * pad;
    let rows = (height / cell_size).ceil().max(1.0) + 2.0 * pad;
    cols * rows
}

/// Normalised 1-D Gaussian weights sampled at cell spacing
fn kernel_weights(bandwidth: f64, cell_size: f64) -> Vec<f64> {
    let radius = (KERNEL_CUTOFF_SIGMAS * bandwidth / cell_size).ceil() as usize;
    let two_sigma_sq = 2.0 * bandwidth * bandwidth;
    let raw: Vec<f64> = (0..=2 * radius)
        .map(|i| {
            let offset = (i as f64 - radius as f64) * cell_size;
            (-offset * offset / two_sigma_sq).exp()
        })
        .collect();
    let sum: f64 = raw.iter().sum();
    raw.into_iter().map(|w| w / sum).collect()
}

/// Estimates a density surface over a `width` x `height` viewport.
///
/// Points outside the viewport still contribute when they lie within the
/// kernel cutoff of its edge. Non-finite points are ignored.
pub fn estimate(
    points: &[Point],
    width: f64,
    height: f64,
    bandwidth: f64,
    cell_size: f64,
) -> DensityGrid {
    let mut grid = DensityGrid::empty(width, height, cell_size, bandwidth);
    if points.is_empty() || !(bandwidth > 0.0) || !(cell_size > 0.0) {
        return grid;
    }

    let weights = kernel_weights(bandwidth, cell_size);
    let pad = weights.len() / 2;
    let padded_cols = grid.cols + 2 * pad;
    let padded_rows = grid.rows + 2 * pad;

    let mut counts = vec![0.0; padded_cols * padded_rows];
    let mut binned = 0usize;
    for point in points.iter().filter(|p| p.is_finite()) {
        let col = (point.x / cell_size).floor() + pad as f64;
        let row = (point.y / cell_size).floor() + pad as f64;
        if col < 0.0 || row < 0.0 || col >= padded_cols as f64 || row >= padded_rows as f64 {
            continue;
        }
        counts[row as usize * padded_cols + col as usize] += 1.0;
        binned += 1;
    }

    // Horizontal pass, output cropped to viewport columns
    let mut horizontal = vec![0.0; grid.cols * padded_rows];
    for row in 0..padded_rows {
        let source = &counts[row * padded_cols..(row + 1) * padded_cols];
        for col in 0..grid.cols {
            // Output col maps to padded col + pad; window spans col..col + 2*pad
            horizontal[row * grid.cols + col] = weights
                .iter()
                .zip(&source[col..col + weights.len()])
                .map(|(w, v)| w * v)
                .sum();
        }
    }

    // Vertical pass, cropped to viewport rows
    let area = cell_size * cell_size;
    let mut max: f64 = 0.0;
    for row in 0..grid.rows {
        for col in 0..grid.cols {
            let value: f64 = weights
                .iter()
                .enumerate()
                .map(|(k, w)| w * horizontal[(row + k) * grid.cols + col])
                .sum::<f64>()
                / area;
            grid.values[row * grid.cols + col] = value;
            max = max.max(value);
        }
    }
    grid.max = max;

    debug!(
        "density surface {}x{} from {} of {} points, max {:.3e}",
        grid.cols,
        grid.rows,
        binned,
        points.len(),
        max
    );
    grid
}
