//! svgns gives SVG documents private identifier namespaces so they can be combined safely.
//!
//! Two documents that both declare `id="glow"` cannot share one output file: whichever filter
//! the renderer finds first wins, and animations start firing on the wrong element. svgns renames
//! every identifier with a per-document prefix and rewrites every place the identifier is used.
//!
//! # Pipeline overview
//!
//! 1. **Scan**: collect `id="..."` declarations into an [`IdTable`].
//! 2. **Allocate**: pick a prefix ([`PrefixPolicy`], or a [`PrefixAllocator`] for batches).
//! 3. **Rewrite**: apply the table to the nine reference [`Surface`]s, in order.
//! 4. **Verify**: re-scan the output for leftovers ([`VerifyMode`]).
//! 5. **Compose** (optional): splice isolated documents into one container, freely placed
//!    ([`compose_free`]) or on a clipped grid ([`compose_grid`]).
//!
//! Everything is lexical text transformation: inputs do not have to be well-formed XML, embedded
//! `<script>`/`<style>` blocks are rewritten in place, and bytes outside identifier spans are
//! preserved.
//!
//! ```
//! let out = svgns::isolate(
//!     r##"<rect id="r1"/><use href="#r1"/>"##,
//!     &svgns::IsolateOptions::with_prefix("q_"),
//! )?;
//! assert_eq!(out.content, r##"<rect id="q_r1"/><use href="#q_r1"/>"##);
//! assert!(out.errors.is_empty());
//! # Ok::<(), svgns::SvgnsError>(())
//! ```
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod compose;
mod foundation;
mod ids;
mod isolate;
mod rewrite;
mod verify;

pub use crate::compose::document::{escape_xml, extract_inner, parse_viewbox, try_parse_viewbox};
pub use crate::compose::free::{
    ComposeStats, Composed, FreeBatch, FreeContainer, FreeTile, arrange_grid, compose_free,
    grid_container_size, grid_positions,
};
pub use crate::compose::grid::{
    BACKGROUND_PREFIX, GridComposed, GridConfig, GridTile, PlacedTile, compose_grid,
};
pub use crate::compose::layout::{GridLayout, fit};
pub use crate::foundation::core::{Point, Rect, Size, Vec2, ViewBox, fmt_num};
pub use crate::foundation::error::{SvgnsError, SvgnsResult};
pub use crate::ids::prefix::{
    DEFAULT_CONTENT_PREFIX_LEN, MAX_CONTENT_PREFIX_LEN, PREFIX_SEPARATOR, PrefixAllocator,
    PrefixPolicy, check_prefix, content_prefix, sequence_prefix,
};
pub use crate::ids::table::{IdTable, declared_ids};
pub use crate::isolate::pipeline::{
    BatchDocument, BatchPrefixes, IsolateOptions, IsolateStats, Isolated, IsolatedBatch,
    IsolatedFile, isolate, isolate_batch, isolate_file,
};
pub use crate::rewrite::pass::{Rewritten, rewrite_references};
pub use crate::rewrite::surface::Surface;
pub use crate::verify::verifier::{
    VERIFY_SAMPLE_LIMIT, VerificationReport, VerifyMode, verify_rewrite,
};
