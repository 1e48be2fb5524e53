use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::{
    compose::document::{comment_text, escape_xml, extract_inner},
    foundation::core::{Size, Vec2, ViewBox, fmt_num},
    foundation::error::{SvgnsError, SvgnsResult},
    ids::prefix::PrefixAllocator,
    isolate::pipeline::{Planned, require_clean, run_planned},
    verify::verifier::VerifyMode,
};

/// One document placed at an explicit offset.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct FreeTile {
    /// Document text.
    pub content: String,
    /// Unique tile name.
    pub name: String,
    /// Translation applied to the tile; `None` places it at the origin.
    pub offset: Option<Vec2>,
}

impl FreeTile {
    /// Tile at the origin.
    pub fn new(content: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            name: name.into(),
            offset: None,
        }
    }

    /// Same tile, translated by `(x, y)`.
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.offset = Some(Vec2::new(x, y));
        self
    }

    /// Parse `[content, name]` or `[content, name, x, y]`.
    pub fn from_json_tuple(value: &serde_json::Value) -> SvgnsResult<Self> {
        let items = value
            .as_array()
            .ok_or_else(|| SvgnsError::validation("free tile must be a JSON array"))?;
        if items.len() != 2 && items.len() != 4 {
            return Err(SvgnsError::validation(format!(
                "invalid tile tuple: expected 2 or 4 elements, got {}",
                items.len()
            )));
        }
        let text = |i: usize, what: &str| {
            items[i].as_str().ok_or_else(|| {
                SvgnsError::validation(format!("tile {what} (element {i}) must be a string"))
            })
        };
        let number = |i: usize| {
            items[i]
                .as_f64()
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    SvgnsError::validation(format!("tile offset (element {i}) must be a number"))
                })
        };
        let tile = Self::new(text(0, "content")?, text(1, "name")?);
        if items.len() == 4 {
            return Ok(tile.at(number(2)?, number(3)?));
        }
        Ok(tile)
    }
}

/// Container settings for [`compose_free`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FreeContainer {
    /// Output `width` attribute.
    pub width: f64,
    /// Output `height` attribute.
    pub height: f64,
    /// Output coordinate system.
    pub view_box: ViewBox,
    /// Verification applied to every tile; any problem fails the composition.
    pub verify: VerifyMode,
}

impl Default for FreeContainer {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 674.0,
            view_box: ViewBox {
                min_x: 0.0,
                min_y: 0.0,
                width: 1200.0,
                height: 674.0,
            },
            verify: VerifyMode::Sampled,
        }
    }
}

#[derive(serde::Deserialize)]
struct FreeBatchDef {
    #[serde(default)]
    container: FreeContainer,
    tiles: Vec<serde_json::Value>,
}

/// A JSON-described free composition.
///
/// Shape: `{ "container": {...}, "tiles": [[content, name], [content, name, x, y], ...] }`.
#[derive(Clone, Debug, PartialEq)]
pub struct FreeBatch {
    /// Container settings.
    pub container: FreeContainer,
    /// Tiles in input order.
    pub tiles: Vec<FreeTile>,
}

impl FreeBatch {
    /// Parse a batch from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> SvgnsResult<Self> {
        let def: FreeBatchDef = serde_json::from_reader(r)
            .map_err(|e| SvgnsError::serde(format!("parse free batch JSON: {e}")))?;
        let tiles = def
            .tiles
            .iter()
            .map(FreeTile::from_json_tuple)
            .collect::<SvgnsResult<Vec<_>>>()?;
        Ok(Self {
            container: def.container,
            tiles,
        })
    }

    /// Parse a batch from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> SvgnsResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            SvgnsError::validation(format!("open free batch JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Compose the batch.
    pub fn compose(&self) -> SvgnsResult<Composed> {
        compose_free(&self.tiles, &self.container)
    }
}

/// Totals over a composition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct ComposeStats {
    /// Identifiers declared across all tiles.
    pub total_ids: usize,
    /// Identifier occurrences renamed across all tiles.
    pub total_references: usize,
    /// Number of tiles.
    pub document_count: usize,
}

/// Output of [`compose_free`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Composed {
    /// Combined document.
    pub content: String,
    /// Tile name to prefix.
    pub prefixes: BTreeMap<String, String>,
    /// Tile name to applied offset (zero when unset).
    pub positions: BTreeMap<String, Vec2>,
    /// Totals.
    pub stats: ComposeStats,
}

/// Combine `tiles` into one document, each in its own `a_`, `b_`, ... namespace.
///
/// Unlike grid composition, any verification problem fails the whole batch.
#[tracing::instrument(skip(tiles, container), fields(tiles = tiles.len()))]
pub fn compose_free(tiles: &[FreeTile], container: &FreeContainer) -> SvgnsResult<Composed> {
    if tiles.is_empty() {
        return Err(SvgnsError::validation("no tiles to compose"));
    }
    if !(container.width.is_finite() && container.height.is_finite())
        || container.width <= 0.0
        || container.height <= 0.0
    {
        return Err(SvgnsError::validation(format!(
            "container size must be positive, got {}x{}",
            container.width, container.height
        )));
    }

    let mut allocator = PrefixAllocator::new();
    let mut names = BTreeSet::new();
    let mut plans = Vec::with_capacity(tiles.len());
    for tile in tiles {
        if !names.insert(tile.name.as_str()) {
            return Err(SvgnsError::validation(format!(
                "duplicate tile name '{}'",
                tile.name
            )));
        }
        let prefix = allocator.next_sequence(tile.name.as_str())?;
        plans.push(Planned::new(&tile.content, prefix)?);
    }

    let isolated = run_planned(&plans, container.verify);
    let mut stats = ComposeStats {
        document_count: tiles.len(),
        ..ComposeStats::default()
    };
    let mut positions = BTreeMap::new();
    let mut parts = Vec::with_capacity(tiles.len());
    for (tile, iso) in tiles.iter().zip(&isolated) {
        require_clean(&tile.name, iso)?;
        stats.total_ids += iso.stats.ids_found;
        stats.total_references += iso.stats.references_updated;

        let offset = tile.offset.unwrap_or(Vec2::ZERO);
        positions.insert(tile.name.clone(), offset);
        // Caller offsets are written exactly as given.
        let transform = if offset == Vec2::ZERO {
            String::new()
        } else {
            format!(" transform=\"translate({}, {})\"", offset.x, offset.y)
        };
        let label = comment_text(&tile.name);
        parts.push(format!(
            "<!-- BEGIN: {label} -->\n<g data-name=\"{}\"{transform}>\n{}\n</g>\n<!-- END: {label} -->",
            escape_xml(&tile.name),
            extract_inner(&iso.content),
        ));
    }

    let content = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{}\" height=\"{}\" viewBox=\"{}\">\n{}\n</svg>\n",
        fmt_num(container.width),
        fmt_num(container.height),
        container.view_box,
        parts.join("\n"),
    );
    tracing::debug!(
        total_ids = stats.total_ids,
        total_references = stats.total_references,
        "free composition done"
    );
    Ok(Composed {
        content,
        prefixes: allocator.into_assignments(),
        positions,
        stats,
    })
}

fn check_columns(columns: usize) -> SvgnsResult<()> {
    if columns == 0 {
        return Err(SvgnsError::validation("grid columns must be > 0"));
    }
    Ok(())
}

/// Row-major offsets for `count` equally sized cells separated by `padding`.
pub fn grid_positions(
    count: usize,
    columns: usize,
    cell: Size,
    padding: f64,
) -> SvgnsResult<Vec<Vec2>> {
    check_columns(columns)?;
    Ok((0..count)
        .map(|i| {
            let (col, row) = ((i % columns) as f64, (i / columns) as f64);
            Vec2::new(col * (cell.width + padding), row * (cell.height + padding))
        })
        .collect())
}

/// Give every tile its [`grid_positions`] offset, in order.
pub fn arrange_grid(
    tiles: Vec<FreeTile>,
    columns: usize,
    cell: Size,
    padding: f64,
) -> SvgnsResult<Vec<FreeTile>> {
    let positions = grid_positions(tiles.len(), columns, cell, padding)?;
    Ok(tiles
        .into_iter()
        .zip(positions)
        .map(|(tile, at)| tile.at(at.x, at.y))
        .collect())
}

/// Container exactly enclosing a [`grid_positions`] layout.
pub fn grid_container_size(
    count: usize,
    columns: usize,
    cell: Size,
    padding: f64,
) -> SvgnsResult<FreeContainer> {
    check_columns(columns)?;
    let rows = count.div_ceil(columns);
    let width = columns as f64 * cell.width + columns.saturating_sub(1) as f64 * padding;
    let height = rows as f64 * cell.height + rows.saturating_sub(1) as f64 * padding;
    let view_box = ViewBox::from_size(width, height)?;
    Ok(FreeContainer {
        width,
        height,
        view_box,
        ..FreeContainer::default()
    })
}

#[cfg(test)]
#[path = "../../tests/unit/compose/free.rs"]
mod tests;
