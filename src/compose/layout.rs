use crate::{
    compose::grid::GridConfig,
    foundation::core::{Point, Rect, Size, ViewBox},
    foundation::error::{SvgnsError, SvgnsResult},
};

/// Resolved cell geometry of a grid composition.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct GridLayout {
    /// Column count.
    pub columns: usize,
    /// Row count; tiles past `columns * rows` do not fit.
    pub rows: usize,
    /// Size of every cell.
    pub cell: Size,
    /// Gap between cells and around the edges.
    pub margin: f64,
    /// Vertical space reserved below each row for labels (0 when labels are off).
    pub label_height: f64,
    /// Container area the grid was laid out in; cells are offset by its origin.
    pub container: Rect,
}

impl GridLayout {
    /// Lay out `tile_count` tiles inside `container`.
    ///
    /// Rows default to `ceil(tile_count / columns)`. Cell sizes are derived from the space left
    /// after margins and labels unless `config` fixes them; a fixed width without a height gets a
    /// 4:3 cell.
    pub fn compute(config: &GridConfig, tile_count: usize, container: Rect) -> SvgnsResult<Self> {
        let columns = config.columns;
        if columns == 0 {
            return Err(SvgnsError::validation("grid columns must be > 0"));
        }
        let rows = config.rows.unwrap_or_else(|| tile_count.div_ceil(columns));
        if rows == 0 {
            return Err(SvgnsError::validation("grid rows must be > 0"));
        }
        let margin = config.margin;
        if !margin.is_finite() || margin < 0.0 {
            return Err(SvgnsError::validation("grid margin must be finite and >= 0"));
        }
        let label_height = if config.show_labels {
            config.label_height
        } else {
            0.0
        };
        if !label_height.is_finite() || label_height < 0.0 {
            return Err(SvgnsError::validation(
                "grid label_height must be finite and >= 0",
            ));
        }

        let (cols_f, rows_f) = (columns as f64, rows as f64);
        let auto_w = (container.width() - margin * (cols_f + 1.0)) / cols_f;
        let auto_h = (container.height() - margin * (rows_f + 1.0) - label_height * rows_f) / rows_f;
        let width = config.cell_width.unwrap_or(auto_w);
        let height = match (config.cell_width, config.cell_height) {
            (_, Some(h)) => h,
            (Some(w), None) => w * 0.75,
            (None, None) => auto_h,
        };
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(SvgnsError::validation(format!(
                "grid cell must be positive, got {width}x{height} ({columns}x{rows} cells in {}x{})",
                container.width(),
                container.height()
            )));
        }

        tracing::debug!(columns, rows, cell_w = width, cell_h = height, "grid layout");
        Ok(Self {
            columns,
            rows,
            cell: Size::new(width, height),
            margin,
            label_height,
            container,
        })
    }

    /// Number of tiles that fit.
    pub fn capacity(&self) -> usize {
        self.columns * self.rows
    }

    /// Cell of tile `index`, row-major; `None` past the last row.
    pub fn cell_rect(&self, index: usize) -> Option<Rect> {
        let (col, row) = (index % self.columns, index / self.columns);
        if row >= self.rows {
            return None;
        }
        let x = self.container.x0 + self.margin + col as f64 * (self.cell.width + self.margin);
        let y = self.container.y0
            + self.margin
            + row as f64 * (self.cell.height + self.margin + self.label_height);
        Some(Rect::from_origin_size((x, y), self.cell))
    }

    /// Baseline anchor of the label under `cell`.
    pub fn label_anchor(&self, cell: Rect) -> Point {
        Point::new(cell.center().x, cell.y1 + self.label_height * 0.7)
    }
}

/// Frame a document with `viewbox` inside `cell`.
///
/// Preserving: uniform scale by the smaller axis ratio, centered. Otherwise the frame is the cell.
pub fn fit(cell: Rect, viewbox: ViewBox, preserve_aspect_ratio: bool) -> Rect {
    if !preserve_aspect_ratio {
        return cell;
    }
    let scale = (cell.width() / viewbox.width).min(cell.height() / viewbox.height);
    let size = Size::new(viewbox.width * scale, viewbox.height * scale);
    let origin = Point::new(
        cell.x0 + (cell.width() - size.width) / 2.0,
        cell.y0 + (cell.height() - size.height) / 2.0,
    );
    Rect::from_origin_size(origin, size)
}

#[cfg(test)]
#[path = "../../tests/unit/compose/layout.rs"]
mod tests;
