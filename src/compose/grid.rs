use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::{
    compose::document::{
        AnchorInsert, comment_text, escape_xml, extract_inner, find_anchor_insert, parse_viewbox,
    },
    compose::layout::{GridLayout, fit},
    foundation::core::{Rect, Size, ViewBox, fmt_num},
    foundation::error::{SvgnsError, SvgnsResult},
    ids::prefix::PrefixAllocator,
    isolate::pipeline::{Planned, run_planned},
    verify::verifier::VerifyMode,
};

/// Prefix reserved for the background document of a grid composition.
pub const BACKGROUND_PREFIX: &str = "bg_";

/// Grid composition settings. Every field has a default, so partial JSON is accepted.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Column count.
    pub columns: usize,
    /// Row count; derived from the tile count when unset.
    pub rows: Option<usize>,
    /// Fixed cell width; derived from the container when unset.
    pub cell_width: Option<f64>,
    /// Fixed cell height; `cell_width * 0.75` when only the width is fixed.
    pub cell_height: Option<f64>,
    /// Container width when no background document is given.
    pub container_width: f64,
    /// Container height when no background document is given.
    pub container_height: f64,
    /// Fill of the generated container background.
    pub background_color: String,
    /// Gap between cells and around the edges.
    pub margin: f64,
    /// Draw tile names below each cell.
    pub show_labels: bool,
    /// Space reserved below each row for labels.
    pub label_height: f64,
    /// Label font size.
    pub font_size: f64,
    /// Label fill.
    pub label_color: String,
    /// Keep tile aspect ratios (centered, letterboxed) instead of stretching to the cell.
    pub preserve_aspect_ratio: bool,
    /// Output density multiplier for sizes, margins and fonts.
    pub scale: f64,
    /// Id of the background group tiles are inserted into.
    pub anchor_id: String,
    /// Verification applied to every placed document.
    pub verify: VerifyMode,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: 3,
            rows: None,
            cell_width: None,
            cell_height: None,
            container_width: 1920.0,
            container_height: 1080.0,
            background_color: "#ffffff".to_owned(),
            margin: 20.0,
            show_labels: false,
            label_height: 24.0,
            font_size: 14.0,
            label_color: "#333333".to_owned(),
            preserve_aspect_ratio: true,
            scale: 1.0,
            anchor_id: "STAGE_BACKGROUND".to_owned(),
            verify: VerifyMode::Sampled,
        }
    }
}

impl GridConfig {
    /// Parse a grid configuration from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> SvgnsResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| SvgnsError::serde(format!("parse grid config JSON: {e}")))
    }

    /// Parse a grid configuration from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> SvgnsResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            SvgnsError::validation(format!("open grid config JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Copy with `scale` applied to every length; the result has `scale == 1`.
    pub fn scaled(&self) -> SvgnsResult<Self> {
        let s = self.scale;
        if !s.is_finite() || s <= 0.0 {
            return Err(SvgnsError::validation(format!(
                "grid scale must be finite and > 0, got {s}"
            )));
        }
        Ok(Self {
            cell_width: self.cell_width.map(|v| v * s),
            cell_height: self.cell_height.map(|v| v * s),
            container_width: self.container_width * s,
            container_height: self.container_height * s,
            margin: self.margin * s,
            label_height: self.label_height * s,
            font_size: self.font_size * s,
            scale: 1.0,
            ..self.clone()
        })
    }

    fn container(&self) -> SvgnsResult<ViewBox> {
        ViewBox::from_size(self.container_width, self.container_height).map_err(|e| {
            SvgnsError::validation(format!("grid container: {e}"))
        })
    }
}

/// One document to place in a grid.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GridTile {
    /// Document text.
    pub content: String,
    /// Unique tile name, used for labels and the prefix map.
    pub name: String,
}

impl GridTile {
    /// Build a tile.
    pub fn new(content: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            name: name.into(),
        }
    }
}

/// Where one tile ended up.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct PlacedTile {
    /// Tile name.
    pub name: String,
    /// Namespace prefix of the tile's identifiers.
    pub prefix: String,
    /// Grid cell.
    pub cell: Rect,
    /// Nested viewport inside the cell.
    pub frame: Rect,
}

/// Output of [`compose_grid`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct GridComposed {
    /// Combined document.
    pub content: String,
    /// Container width.
    pub width: f64,
    /// Container height.
    pub height: f64,
    /// Container coordinate system.
    pub view_box: ViewBox,
    /// Tile name to prefix, for every tile (placed or skipped).
    pub prefixes: BTreeMap<String, String>,
    /// Placed tiles in input order.
    pub placed: Vec<PlacedTile>,
    /// Skipped tiles and verification problems.
    pub diagnostics: Vec<String>,
}

/// Lay out `tiles` on a grid, optionally on top of a `background` document.
///
/// Every tile gets its own nested viewport with an explicit clip matching its viewBox, so off-canvas
/// tile content cannot bleed into neighbouring cells even where nested viewports are not clipped
/// implicitly. Tiles that do not fit the row count are skipped and reported in
/// [`GridComposed::diagnostics`].
#[tracing::instrument(skip(tiles, background, config), fields(tiles = tiles.len()))]
pub fn compose_grid(
    tiles: &[GridTile],
    background: Option<&str>,
    config: &GridConfig,
) -> SvgnsResult<GridComposed> {
    if tiles.is_empty() {
        return Err(SvgnsError::validation("no tiles to compose"));
    }
    let cfg = config.scaled()?;

    let mut allocator = PrefixAllocator::new();
    let mut plans = Vec::with_capacity(tiles.len() + 1);
    if background.is_some() {
        allocator.exclude(BACKGROUND_PREFIX)?;
    }
    let mut names = BTreeSet::new();
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
    if let Some(bg) = background {
        plans.push(Planned::new(bg, BACKGROUND_PREFIX.to_owned())?);
    }

    let mut isolated = run_planned(&plans, cfg.verify);
    let mut diagnostics = Vec::new();
    for (tile, iso) in tiles.iter().zip(&isolated) {
        diagnostics.extend(iso.errors.iter().map(|e| format!("tile '{}': {e}", tile.name)));
    }
    let background_doc = match background {
        Some(_) => {
            let bg = isolated.pop().map(|iso| iso.into_owned()).ok_or_else(|| {
                SvgnsError::composition("background document missing after isolation")
            })?;
            diagnostics.extend(bg.errors.iter().map(|e| format!("background: {e}")));
            Some(bg)
        }
        None => None,
    };

    let view_box = match &background_doc {
        Some(bg) => parse_viewbox(&bg.content),
        None => cfg.container()?,
    };
    let layout = GridLayout::compute(&cfg, tiles.len(), view_box.rect())?;

    let mut tile_elements = String::new();
    let mut label_elements = String::new();
    let mut placed = Vec::with_capacity(tiles.len());
    for (i, (tile, iso)) in tiles.iter().zip(&isolated).enumerate() {
        let Some(cell) = layout.cell_rect(i) else {
            tracing::warn!(
                tile = %tile.name,
                rows = layout.rows,
                "tile exceeds grid capacity, skipping"
            );
            diagnostics.push(format!(
                "tile '{}' exceeds grid capacity ({} rows), skipped",
                tile.name, layout.rows
            ));
            continue;
        };
        let tile_vb = parse_viewbox(&iso.content);
        let frame = fit(cell, tile_vb, cfg.preserve_aspect_ratio);
        write_tile(
            &mut tile_elements,
            i,
            &tile.name,
            extract_inner(&iso.content),
            tile_vb,
            frame,
            cfg.preserve_aspect_ratio,
        );
        if cfg.show_labels {
            write_label(&mut label_elements, &cfg, &layout, cell, &tile.name);
        }
        placed.push(PlacedTile {
            name: tile.name.clone(),
            prefix: iso.prefix.clone(),
            cell,
            frame,
        });
    }

    let content = match &background_doc {
        Some(bg) => {
            let anchor = plans
                .last()
                .map(|plan| plan.renamed(&cfg.anchor_id))
                .unwrap_or_else(|| cfg.anchor_id.clone());
            insert_into_background(&bg.content, &anchor, &tile_elements, &label_elements)
        }
        None => fresh_container(&cfg, view_box, &tile_elements, &label_elements),
    };

    let prefixes = tiles
        .iter()
        .zip(&isolated)
        .map(|(tile, iso)| (tile.name.clone(), iso.prefix.clone()))
        .collect();
    tracing::debug!(
        placed = placed.len(),
        diagnostics = diagnostics.len(),
        "grid composed"
    );
    Ok(GridComposed {
        content,
        width: view_box.width,
        height: view_box.height,
        view_box,
        prefixes,
        placed,
        diagnostics,
    })
}

fn clip_id(index: usize) -> String {
    format!("grid-clip-{index}")
}

fn write_tile(
    out: &mut String,
    index: usize,
    name: &str,
    inner: &str,
    vb: ViewBox,
    frame: Rect,
    preserve_aspect_ratio: bool,
) {
    let clip = clip_id(index);
    let aspect = if preserve_aspect_ratio {
        ""
    } else {
        " preserveAspectRatio=\"none\""
    };
    // Writing into a String cannot fail.
    let _ = write!(
        out,
        "  <!-- Tile: {name} -->\n  <svg x=\"{x}\" y=\"{y}\" width=\"{w}\" height=\"{h}\" viewBox=\"{vb}\" overflow=\"hidden\"{aspect}>\n    <defs>\n      <clipPath id=\"{clip}\">\n        <rect x=\"{vx}\" y=\"{vy}\" width=\"{vw}\" height=\"{vh}\"/>\n      </clipPath>\n    </defs>\n    <g clip-path=\"url(#{clip})\">\n{inner}\n    </g>\n  </svg>\n",
        name = comment_text(name),
        x = fmt_num(frame.x0),
        y = fmt_num(frame.y0),
        w = fmt_num(frame.width()),
        h = fmt_num(frame.height()),
        vx = fmt_num(vb.min_x),
        vy = fmt_num(vb.min_y),
        vw = fmt_num(vb.width),
        vh = fmt_num(vb.height),
    );
}

fn write_label(out: &mut String, cfg: &GridConfig, layout: &GridLayout, cell: Rect, name: &str) {
    let at = layout.label_anchor(cell);
    let _ = writeln!(
        out,
        "  <text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-family=\"sans-serif\" font-size=\"{}\" fill=\"{}\">{}</text>",
        fmt_num(at.x),
        fmt_num(at.y),
        fmt_num(cfg.font_size),
        escape_xml(&cfg.label_color),
        escape_xml(name),
    );
}

fn insert_into_background(bg: &str, anchor: &str, tiles: &str, labels: &str) -> String {
    let mut out = String::with_capacity(bg.len() + tiles.len() + labels.len() + 32);
    match find_anchor_insert(bg, anchor) {
        Some(AnchorInsert::Open(at)) => {
            out.push_str(&bg[..at]);
            out.push('\n');
            out.push_str(tiles);
            out.push_str(labels);
            out.push_str(&bg[at..]);
            return out;
        }
        Some(AnchorInsert::SelfClosing(span)) => {
            out.push_str(&bg[..span.start]);
            out.push_str(">\n");
            out.push_str(tiles);
            out.push_str(labels);
            out.push_str("</g>");
            out.push_str(&bg[span.end..]);
            return out;
        }
        None => {}
    }
    tracing::debug!(anchor, "anchor group not found, appending tiles before </svg>");
    let at = bg.rfind("</svg>").unwrap_or(bg.len());
    out.push_str(&bg[..at]);
    out.push_str("\n<!-- Grid Tiles -->\n");
    out.push_str(tiles);
    out.push_str(labels);
    out.push_str(&bg[at..]);
    out
}

fn fresh_container(cfg: &GridConfig, vb: ViewBox, tiles: &str, labels: &str) -> String {
    let Size { width, height } = vb.size();
    let (w, h) = (fmt_num(width), fmt_num(height));
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{w}\" height=\"{h}\" viewBox=\"{vb}\">\n  <!-- Background -->\n  <rect x=\"0\" y=\"0\" width=\"{w}\" height=\"{h}\" fill=\"{fill}\"/>\n\n  <!-- Grid Tiles -->\n{tiles}\n  <!-- Labels -->\n{labels}</svg>\n",
        fill = escape_xml(&cfg.background_color),
    )
}

#[cfg(test)]
#[path = "../../tests/unit/compose/grid.rs"]
mod tests;
