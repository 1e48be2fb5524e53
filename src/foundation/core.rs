use std::fmt;

use crate::foundation::error::{SvgnsError, SvgnsResult};

pub use kurbo::{Point, Rect, Size, Vec2};

/// A document's own coordinate system, as declared by its root `viewBox` attribute.
///
/// Serialized in attribute syntax (`"0 0 1200 674"`).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ViewBox {
    /// Left edge of the user coordinate system.
    pub min_x: f64,
    /// Top edge of the user coordinate system.
    pub min_y: f64,
    /// Width in user units (> 0).
    pub width: f64,
    /// Height in user units (> 0).
    pub height: f64,
}

impl ViewBox {
    /// Geometry assumed for documents that declare neither a `viewBox` nor usable dimensions.
    pub const FALLBACK: ViewBox = ViewBox {
        min_x: 0.0,
        min_y: 0.0,
        width: 100.0,
        height: 100.0,
    };

    /// Build a viewBox, rejecting non-finite values and empty extents.
    pub fn new(min_x: f64, min_y: f64, width: f64, height: f64) -> SvgnsResult<Self> {
        if ![min_x, min_y, width, height].iter().all(|v| v.is_finite()) {
            return Err(SvgnsError::validation("viewBox values must be finite"));
        }
        if width <= 0.0 || height <= 0.0 {
            return Err(SvgnsError::validation(format!(
                "viewBox extent must be positive, got {width}x{height}"
            )));
        }
        Ok(Self {
            min_x,
            min_y,
            width,
            height,
        })
    }

    /// Build a viewBox anchored at the origin.
    pub fn from_size(width: f64, height: f64) -> SvgnsResult<Self> {
        Self::new(0.0, 0.0, width, height)
    }

    /// Parse the four-number `viewBox` attribute syntax (whitespace and/or comma separated).
    pub fn parse(value: &str) -> SvgnsResult<Self> {
        let parts = value
            .split(|c: char| c.is_ascii_whitespace() || c == ',')
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>();
        if parts.len() != 4 {
            return Err(SvgnsError::validation(format!(
                "viewBox '{value}' must have 4 numbers, got {}",
                parts.len()
            )));
        }
        let mut nums = [0.0f64; 4];
        for (slot, part) in nums.iter_mut().zip(&parts) {
            *slot = part
                .parse::<f64>()
                .map_err(|e| SvgnsError::validation(format!("viewBox number '{part}': {e}")))?;
        }
        Self::new(nums[0], nums[1], nums[2], nums[3])
    }

    /// The viewBox as a rectangle in its own user space.
    pub fn rect(self) -> Rect {
        Rect::new(
            self.min_x,
            self.min_y,
            self.min_x + self.width,
            self.min_y + self.height,
        )
    }

    /// Extent of the viewBox.
    pub fn size(self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl fmt::Display for ViewBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            clean_zero(self.min_x),
            clean_zero(self.min_y),
            clean_zero(self.width),
            clean_zero(self.height)
        )
    }
}

impl TryFrom<String> for ViewBox {
    type Error = SvgnsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ViewBox> for String {
    fn from(value: ViewBox) -> Self {
        value.to_string()
    }
}

/// Format a computed coordinate for attribute output: two decimals, trailing zeros dropped.
pub fn fmt_num(v: f64) -> String {
    let s = format!("{:.2}", clean_zero(v));
    let s = if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s.as_str()
    };
    if s == "-0" { "0".to_owned() } else { s.to_owned() }
}

fn clean_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
