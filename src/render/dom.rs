//! Minimal element-tree abstraction for cursor classification.
//!
//! The host implements `Element` over whatever tree it renders (a browser
//! DOM, a retained widget tree, a test fixture). Only the handful of facts
//! the local cursor needs are exposed: tag, attributes, computed style,
//! bounding box, and the parent link.

/// Axis-aligned box in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (self.left + self.width / 2.0, self.top + self.height / 2.0)
    }
}

/// Subset of computed CSS the cursor reads. Values are raw CSS strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputedStyle {
    pub cursor: String,
    pub background_color: String,
    pub line_height: String,
    pub font_size: String,
    pub border_radius: String,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            cursor: "auto".into(),
            background_color: "rgba(0, 0, 0, 0)".into(),
            line_height: "normal".into(),
            font_size: "16px".into(),
            border_radius: "0px".into(),
        }
    }
}

/// A node handle in the host's element tree.
///
/// Handles are cheap to copy; `parent` returns a new handle rather than a
/// borrow so arena-backed trees can implement it.
pub trait Element: Sized {
    /// Tag name in any case (`a`, `BUTTON`, ...).
    fn tag_name(&self) -> &str;
    fn attribute(&self, name: &str) -> Option<&str>;
    fn is_content_editable(&self) -> bool;
    /// True when a direct text child has non-whitespace content.
    fn has_text_content(&self) -> bool;
    fn style(&self) -> &ComputedStyle;
    fn bounding_rect(&self) -> Rect;
    fn parent(&self) -> Option<Self>;
}

/// First node on the path `start`, parent, grandparent, ... that satisfies
/// `predicate`.
pub fn walk_up<E: Element>(start: E, mut predicate: impl FnMut(&E) -> bool) -> Option<E> {
    let mut current = Some(start);
    while let Some(node) = current {
        if predicate(&node) {
            return Some(node);
        }
        current = node.parent();
    }
    None
}

// =============================================================================
// CSS VALUES
// =============================================================================

/// Leading number of a CSS length, like `parseFloat("24px")`.
#[must_use]
pub fn parse_css_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim_start();
    let end = trimmed
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || ((c == '-' || c == '+') && i == 0)))
        .map_or(trimmed.len(), |(i, _)| i);
    trimmed[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// RGBA channels; alpha in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    #[must_use]
    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }

    /// WCAG relative luminance in `0.0..=1.0`.
    #[must_use]
    pub fn luminance(&self) -> f64 {
        let channel = |c: u8| {
            let c = f64::from(c) / 255.0;
            if c <= 0.039_28 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) }
        };
        0.2126 * channel(self.r) + 0.7152 * channel(self.g) + 0.0722 * channel(self.b)
    }
}

/// Parse `transparent`, `rgb(...)`, `rgba(...)`, `#rgb`, or `#rrggbb`.
#[must_use]
pub fn parse_color(raw: &str) -> Option<Rgba> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("transparent") {
        return Some(Rgba { r: 0, g: 0, b: 0, a: 0.0 });
    }
    if let Some(hex) = trimmed.strip_prefix('#') {
        return parse_hex(hex);
    }

    let inner = trimmed
        .strip_prefix("rgba(")
        .or_else(|| trimmed.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let mut parts = inner.split(',').map(str::trim);
    let r = parts.next()?.parse::<u8>().ok()?;
    let g = parts.next()?.parse::<u8>().ok()?;
    let b = parts.next()?.parse::<u8>().ok()?;
    let a = match parts.next() {
        Some(alpha) => alpha.parse::<f64>().ok()?.clamp(0.0, 1.0),
        None => 1.0,
    };
    if parts.next().is_some() {
        return None;
    }
    Some(Rgba { r, g, b, a })
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.is_ascii() {
        return None;
    }
    let (r, g, b) = match hex.len() {
        3 => (
            u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?,
            u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?,
            u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?,
        ),
        6 => (
            u8::from_str_radix(&hex[0..2], 16).ok()?,
            u8::from_str_radix(&hex[2..4], 16).ok()?,
            u8::from_str_radix(&hex[4..6], 16).ok()?,
        ),
        _ => return None,
    };
    Some(Rgba { r, g, b, a: 1.0 })
}

/// Whether the first opaque background at or above `element` is dark.
/// Defaults to light when nothing opaque is found.
pub fn is_dark_background<E: Element>(element: E) -> bool {
    walk_up(element, |node| parse_color(&node.style().background_color).is_some_and(|c| !c.is_transparent()))
        .and_then(|node| parse_color(&node.style().background_color))
        .is_some_and(|color| color.luminance() < 0.5)
}

#[cfg(test)]
#[path = "dom_test.rs"]
mod tests;
