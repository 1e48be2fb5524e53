use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Match, Regex};

use crate::ids::table::{DECLARATION_PATTERN, quoted_value};

/// One syntactic position through which a document refers to an identifier.
///
/// Variants are listed in pass order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    /// `id="X"`.
    Declaration,
    /// `href="#X"` and `xlink:href="#X"`.
    LocalFragment,
    /// `xlink:href="url(#X)"`, non-standard but found in real files.
    LegacyFunctional,
    /// `url(#X)` in any attribute, `style` attribute or `<style>` block.
    Functional,
    /// `#X` elements of a semicolon-delimited `values` list.
    ValueList,
    /// `X.event` operands of `begin`/`end` timing lists.
    Timing,
    /// `from`/`to`/`by="#X"`.
    Directional,
    /// `getElementById("X")` and `querySelector("#X")` in embedded script.
    ScriptLookup,
    /// `data-*="#X"`.
    DataAttribute,
}

impl Surface {
    /// Every surface, in the order the rewriter applies them.
    pub const ALL: [Surface; 9] = [
        Surface::Declaration,
        Surface::LocalFragment,
        Surface::LegacyFunctional,
        Surface::Functional,
        Surface::ValueList,
        Surface::Timing,
        Surface::Directional,
        Surface::ScriptLookup,
        Surface::DataAttribute,
    ];

    /// Stable snake_case name, used in reports.
    pub fn name(self) -> &'static str {
        match self {
            Surface::Declaration => "declaration",
            Surface::LocalFragment => "local_fragment",
            Surface::LegacyFunctional => "legacy_functional",
            Surface::Functional => "functional",
            Surface::ValueList => "value_list",
            Surface::Timing => "timing",
            Surface::Directional => "directional",
            Surface::ScriptLookup => "script_lookup",
            Surface::DataAttribute => "data_attribute",
        }
    }

    pub(crate) fn patterns(self) -> &'static [SurfacePattern] {
        match self {
            Surface::Declaration => DECLARATION.as_slice(),
            Surface::LocalFragment => LOCAL_FRAGMENT.as_slice(),
            Surface::LegacyFunctional => LEGACY_FUNCTIONAL.as_slice(),
            Surface::Functional => FUNCTIONAL.as_slice(),
            Surface::ValueList => VALUE_LIST.as_slice(),
            Surface::Timing => TIMING.as_slice(),
            Surface::Directional => DIRECTIONAL.as_slice(),
            Surface::ScriptLookup => SCRIPT_LOOKUP.as_slice(),
            Surface::DataAttribute => DATA_ATTRIBUTE.as_slice(),
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Anchored matcher for one surface.
///
/// `outer` locates the surface and exposes its target through an `id` group or a `dq`/`sq`
/// quoted pair. For list-valued surfaces, `inner` then finds each identifier (group `id`) inside
/// that target.
pub(crate) struct SurfacePattern {
    pub(crate) outer: Regex,
    pub(crate) inner: Option<Regex>,
}

impl SurfacePattern {
    fn single(outer: &str) -> Self {
        Self {
            outer: compile(outer),
            inner: None,
        }
    }

    fn list(outer: &str, inner: &str) -> Self {
        Self {
            outer: compile(outer),
            inner: Some(compile(inner)),
        }
    }
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("surface pattern compiles")
}

/// The span a surface match points at: the identifier itself, or the list holding identifiers.
pub(crate) fn target<'t>(caps: &Captures<'t>) -> Option<Match<'t>> {
    caps.name("id").or_else(|| quoted_value(caps))
}

/// Identifiers referenced through `surface` in `text`, in document order.
pub(crate) fn references(surface: Surface, text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    for pattern in surface.patterns() {
        for caps in pattern.outer.captures_iter(text) {
            let Some(m) = target(&caps) else {
                continue;
            };
            match &pattern.inner {
                None => out.push(m.as_str()),
                Some(inner) => out.extend(
                    inner
                        .captures_iter(m.as_str())
                        .filter_map(|c| c.name("id").map(|id| id.as_str())),
                ),
            }
        }
    }
    out
}

static DECLARATION: LazyLock<Vec<SurfacePattern>> =
    LazyLock::new(|| vec![SurfacePattern::single(DECLARATION_PATTERN)]);

static LOCAL_FRAGMENT: LazyLock<Vec<SurfacePattern>> = LazyLock::new(|| {
    vec![SurfacePattern::single(
        r##"(?:^|\s)(?:xlink:)?href\s*=\s*(?:"#(?P<dq>[^"]+)"|'#(?P<sq>[^']+)')"##,
    )]
});

static LEGACY_FUNCTIONAL: LazyLock<Vec<SurfacePattern>> = LazyLock::new(|| {
    vec![SurfacePattern::single(
        r##"(?:^|\s)(?:xlink:)?href\s*=\s*(?:"url\(\s*#(?P<dq>[^)"\s]+)\s*\)"|'url\(\s*#(?P<sq>[^)'\s]+)\s*\)')"##,
    )]
});

static FUNCTIONAL: LazyLock<Vec<SurfacePattern>> = LazyLock::new(|| {
    vec![SurfacePattern::single(
        r##"\burl\(\s*(?:#(?P<id>[^)"'\s]+)|"#(?P<dq>[^)"\s]+)"|'#(?P<sq>[^)'\s]+)')\s*\)"##,
    )]
});

// Colour keyframes (`#ff0000`) match the inner pattern too; they are only touched if a document
// happens to declare that exact identifier.
static VALUE_LIST: LazyLock<Vec<SurfacePattern>> = LazyLock::new(|| {
    vec![SurfacePattern::list(
        r##"(?:^|\s)values\s*=\s*(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)')"##,
        r##"#(?P<id>[^\s;"'()]+)"##,
    )]
});

static TIMING: LazyLock<Vec<SurfacePattern>> = LazyLock::new(|| {
    vec![SurfacePattern::list(
        r##"(?:^|\s)(?:begin|end)\s*=\s*(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)')"##,
        r"(?:^|[\s;])(?P<id>[A-Za-z_][\w\-]*)\.[A-Za-z_]\w*",
    )]
});

static DIRECTIONAL: LazyLock<Vec<SurfacePattern>> = LazyLock::new(|| {
    vec![SurfacePattern::single(
        r##"(?:^|\s)(?:from|to|by)\s*=\s*(?:"#(?P<dq>[^"]+)"|'#(?P<sq>[^']+)')"##,
    )]
});

static SCRIPT_LOOKUP: LazyLock<Vec<SurfacePattern>> = LazyLock::new(|| {
    vec![
        SurfacePattern::single(
            r##"\bgetElementById\(\s*(?:"(?P<dq>[^"]+)"|'(?P<sq>[^']+)')\s*\)"##,
        ),
        SurfacePattern::single(
            r##"\bquerySelector(?:All)?\(\s*(?:"#(?P<dq>[^"]+)"|'#(?P<sq>[^']+)')\s*\)"##,
        ),
    ]
});

static DATA_ATTRIBUTE: LazyLock<Vec<SurfacePattern>> = LazyLock::new(|| {
    vec![SurfacePattern::single(
        r##"(?:^|\s)data-[a-z][a-z0-9\-]*\s*=\s*(?:"#(?P<dq>[^"]+)"|'#(?P<sq>[^']+)')"##,
    )]
});
