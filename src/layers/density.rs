use crate::{
    core::config::DensityConfig,
    density::{contours, kernel::DensityGrid, ColorRamp, SequentialScale},
    layers::scene::DensityLayer,
};

/// Turns a density grid into a banded raster with isolines.
#[derive(Debug, Clone)]
pub struct DensityRenderer {
    thresholds: usize,
    opacity: f32,
    with_isolines: bool,
}

impl DensityRenderer {
    pub fn new(config: &DensityConfig) -> Self {
        Self {
            thresholds: config.thresholds,
            opacity: config.opacity,
            with_isolines: true,
        }
    }

    pub fn without_isolines(mut self) -> Self {
        self.with_isolines = false;
        self
    }

    /// Cells below the first threshold stay transparent, so an empty surface
    /// paints nothing over the baseline map.
    pub fn render(&self, grid: &DensityGrid) -> DensityLayer {
        let scale = SequentialScale::new(grid.max(), ColorRamp::YlOrRd);
        let levels = grid.thresholds(self.thresholds);

        let cells = grid
            .bands(&levels)
            .into_iter()
            .map(|band| band.map(|k| scale.color(levels[k]).with_opacity(self.opacity)))
            .collect();

        let isolines = if self.with_isolines {
            contours::isolines(grid, &levels)
                .into_iter()
                .map(|line| {
                    let color = scale.color(line.level);
                    (line, color)
                })
                .collect()
        } else {
            Vec::new()
        };

        DensityLayer {
            cols: grid.cols(),
            rows: grid.rows(),
            cell_size: grid.cell_size(),
            cells,
            isolines,
            opacity: self.opacity,
        }
    }
}
