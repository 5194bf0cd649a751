//! Local cursor — the custom pointer drawn in place of the system cursor.
//!
//! DESIGN
//! ======
//! The model is fed pointer, button, scroll, and document enter/leave events
//! together with the element under the pointer. From the element it decides
//! a variant:
//! - `Pointer` over links, buttons, and anything styled `cursor: pointer`;
//!   with an interactive element it morphs into that element's padded box
//! - `Text` over inputs, editable content, and text-bearing tags, sized to
//!   the line height
//! - `Default` dot otherwise
//! - `Hidden` while the pointer is outside the document
//!
//! Position and size are smoothed with springs; the host calls `step` once
//! per frame and reads `model`. Touch devices render nothing.

use super::dom::{self, Element, parse_css_number, walk_up};
use super::spring::{Fade, Spring};
use crate::config::SpringConfig;

pub const DEFAULT_SIZE: f64 = 12.0;
pub const MORPH_PADDING: f64 = 8.0;
pub const TEXT_CURSOR_COLOR: &str = "#374151";

const TEXT_TAGS: [&str; 15] = [
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "span", "label", "li", "td", "th", "blockquote", "pre", "code",
];
const DEFAULT_TEXT_HEIGHT: f64 = 24.0;
const DEFAULT_BORDER_RADIUS: f64 = 8.0;
const TEXT_BEAM_WIDTH: f64 = 2.5;
const TEXT_BEAM_WIDTH_PRESSED: f64 = 2.0;
/// Seconds for opacity and color transitions.
const FADE_SECONDS: f64 = 0.15;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorVariant {
    #[default]
    Default,
    Pointer,
    Text,
    Hidden,
}

/// Padded box the pointer variant morphs into. `x`/`y` are the center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MorphRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub border_radius: f64,
}

/// What the element under the pointer asks for.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub variant: CursorVariant,
    pub text_height: Option<f64>,
    pub morph: Option<MorphRect>,
}

/// One frame's worth of drawing instructions.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalCursorModel {
    pub variant: CursorVariant,
    /// Center of the cursor in viewport coordinates.
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub border_radius: f64,
    pub scale: f64,
    pub opacity: f64,
    pub background: &'static str,
}

// =============================================================================
// CLASSIFICATION
// =============================================================================

fn tag_is(element: &impl Element, tag: &str) -> bool {
    element.tag_name().eq_ignore_ascii_case(tag)
}

fn is_interactive(element: &impl Element) -> bool {
    tag_is(element, "a")
        || tag_is(element, "button")
        || element.attribute("role") == Some("button")
        || element.attribute("data-cursor-pointer").is_some()
}

fn is_text_target(element: &impl Element) -> bool {
    let style = element.style();
    if style.cursor == "text" || tag_is(element, "input") || tag_is(element, "textarea") || element.is_content_editable() {
        return true;
    }
    TEXT_TAGS.iter().any(|t| tag_is(element, t)) && element.has_text_content()
}

/// Beam height: explicit line height, else 1.4 × font size.
pub fn text_height(element: &impl Element) -> f64 {
    let style = element.style();
    if style.line_height != "normal"
        && let Some(line_height) = parse_css_number(&style.line_height)
    {
        return line_height;
    }
    parse_css_number(&style.font_size).map_or(DEFAULT_TEXT_HEIGHT, |size| size * 1.4)
}

/// Padded morph box around `element`.
pub fn morph_rect(element: &impl Element, padding: f64) -> MorphRect {
    let rect = element.bounding_rect();
    let (x, y) = rect.center();
    let radius = parse_css_number(&element.style().border_radius).unwrap_or(DEFAULT_BORDER_RADIUS);
    MorphRect {
        x,
        y,
        width: rect.width + padding * 2.0,
        height: rect.height + padding * 2.0,
        border_radius: radius + padding / 2.0,
    }
}

/// Decide the variant for the element under the pointer.
pub fn detect<E: Element + Clone>(element: Option<E>, padding: f64) -> Detection {
    let none = Detection { variant: CursorVariant::Default, text_height: None, morph: None };
    let Some(element) = element else {
        return none;
    };

    let interactive = walk_up(element.clone(), |node| is_interactive(node));
    if element.style().cursor == "pointer" || interactive.is_some() {
        return Detection {
            variant: CursorVariant::Pointer,
            text_height: None,
            morph: interactive.map(|node| morph_rect(&node, padding)),
        };
    }

    // An ancestor styled as a pointer ends the search for text.
    let found = walk_up(element, |node| is_text_target(node) || node.style().cursor == "pointer");
    match found {
        Some(node) if node.style().cursor != "pointer" => Detection {
            variant: CursorVariant::Text,
            text_height: Some(text_height(&node)),
            morph: None,
        },
        _ => none,
    }
}

// =============================================================================
// LOCAL CURSOR
// =============================================================================

#[derive(Debug, Clone)]
pub struct LocalCursor {
    size: f64,
    padding: f64,
    variant: CursorVariant,
    /// Host-forced variant; wins over detection while set.
    forced: Option<CursorVariant>,
    visible: bool,
    pressed: bool,
    touch: bool,
    dark: bool,
    text_height: f64,
    morph: Option<MorphRect>,
    last_pointer: Option<(f64, f64)>,
    x: Spring,
    y: Spring,
    width: Spring,
    height: Spring,
    scale: Spring,
    opacity: Fade,
}

impl LocalCursor {
    #[must_use]
    pub fn new(is_touch: bool) -> Self {
        Self::with_size(is_touch, DEFAULT_SIZE, MORPH_PADDING)
    }

    #[must_use]
    pub fn with_size(is_touch: bool, size: f64, padding: f64) -> Self {
        Self {
            size,
            padding,
            variant: CursorVariant::Default,
            forced: None,
            visible: false,
            pressed: false,
            touch: is_touch,
            dark: false,
            text_height: DEFAULT_TEXT_HEIGHT,
            morph: None,
            last_pointer: None,
            x: Spring::new(SpringConfig::LOCAL, 0.0),
            y: Spring::new(SpringConfig::LOCAL, 0.0),
            width: Spring::new(SpringConfig::SIZE, size),
            height: Spring::new(SpringConfig::SIZE, size),
            scale: Spring::new(SpringConfig::SCALE, 1.0),
            opacity: Fade::new(0.0, FADE_SECONDS),
        }
    }

    #[must_use]
    pub fn variant(&self) -> CursorVariant {
        if self.visible { self.shape() } else { CursorVariant::Hidden }
    }

    /// Force a variant regardless of what the pointer is over, e.g. `Hidden`
    /// while the host draws its own cursor. `None` returns to detection.
    pub fn set_variant_override(&mut self, variant: Option<CursorVariant>) {
        self.forced = variant;
    }

    fn shape(&self) -> CursorVariant {
        self.forced.unwrap_or(self.variant)
    }

    #[must_use]
    pub fn is_touch(&self) -> bool {
        self.touch
    }

    #[must_use]
    pub fn is_dark(&self) -> bool {
        self.dark
    }

    #[must_use]
    pub fn morph(&self) -> Option<MorphRect> {
        self.morph
    }

    /// Last raw pointer position, for the host's hit test on scroll.
    #[must_use]
    pub fn last_pointer(&self) -> Option<(f64, f64)> {
        self.last_pointer
    }

    /// A touch anywhere switches the device to touch for good.
    pub fn on_touch_start(&mut self) {
        self.touch = true;
        self.visible = false;
    }

    pub fn on_pointer_move<E: Element + Clone>(&mut self, x: f64, y: f64, element: Option<E>) {
        if self.touch {
            return;
        }
        self.visible = true;
        self.last_pointer = Some((x, y));

        self.dark = element.clone().is_some_and(dom::is_dark_background);
        let detection = detect(element, self.padding);
        self.variant = detection.variant;
        if let Some(height) = detection.text_height {
            self.text_height = height;
        }

        match detection.morph {
            Some(morph) if detection.variant == CursorVariant::Pointer => {
                self.morph = Some(morph);
                self.x.set_target(morph.x);
                self.y.set_target(morph.y);
            }
            _ => {
                self.morph = None;
                self.x.set_target(x);
                self.y.set_target(y);
            }
        }
    }

    /// Re-measure the hovered element after the page scrolled under a
    /// stationary pointer. `element` is whatever now sits at `last_pointer`.
    pub fn on_scroll<E: Element + Clone>(&mut self, element: Option<E>) {
        if self.touch || self.last_pointer.is_none() {
            return;
        }
        let detection = detect(element, self.padding);
        if detection.variant == CursorVariant::Pointer
            && let Some(morph) = detection.morph
        {
            self.morph = Some(morph);
            self.x.set_target(morph.x);
            self.y.set_target(morph.y);
        }
    }

    pub fn on_pointer_down(&mut self) {
        self.pressed = true;
    }

    pub fn on_pointer_up(&mut self) {
        self.pressed = false;
    }

    pub fn on_document_leave(&mut self) {
        self.visible = false;
        self.morph = None;
    }

    pub fn on_document_enter(&mut self) {
        if !self.touch {
            self.visible = true;
        }
    }

    fn morphing(&self) -> Option<MorphRect> {
        (self.shape() == CursorVariant::Pointer).then_some(self.morph).flatten()
    }

    fn target_size(&self) -> (f64, f64) {
        let press = |normal: f64, factor: f64| if self.pressed { normal * factor } else { normal };
        if let Some(morph) = self.morphing() {
            return (press(morph.width, 0.95), press(morph.height, 0.95));
        }
        if self.shape() == CursorVariant::Text {
            let width = if self.pressed { TEXT_BEAM_WIDTH_PRESSED } else { TEXT_BEAM_WIDTH };
            return (width, press(self.text_height, 0.75));
        }
        (press(self.size, 0.8), press(self.size, 0.8))
    }

    fn target_scale(&self) -> f64 {
        match (self.morphing().is_some(), self.shape()) {
            (true, _) if self.pressed => 0.97,
            (false, CursorVariant::Default | CursorVariant::Pointer) if self.pressed => 0.9,
            _ => 1.0,
        }
    }

    fn border_radius(&self) -> f64 {
        if let Some(morph) = self.morphing() {
            return morph.border_radius;
        }
        if self.shape() == CursorVariant::Text { 1.0 } else { self.size / 2.0 }
    }

    fn background(&self) -> &'static str {
        if self.morphing().is_some() {
            return if self.dark { "rgba(255, 255, 255, 0.15)" } else { "rgba(0, 0, 0, 0.08)" };
        }
        if self.shape() == CursorVariant::Text {
            return TEXT_CURSOR_COLOR;
        }
        if self.dark { "rgba(255, 255, 255, 0.9)" } else { "rgba(0, 0, 0, 0.8)" }
    }

    /// Advance springs by `dt` seconds toward the current targets.
    pub fn step(&mut self, dt: f64) {
        let (width, height) = self.target_size();
        self.width.set_target(width);
        self.height.set_target(height);
        self.scale.set_target(self.target_scale());
        self.opacity.set_target(if self.variant() == CursorVariant::Hidden { 0.0 } else { 1.0 });

        self.x.step(dt);
        self.y.step(dt);
        self.width.step(dt);
        self.height.step(dt);
        self.scale.step(dt);
        self.opacity.step(dt);
    }

    /// Current drawing state, or `None` on touch devices.
    #[must_use]
    pub fn model(&self) -> Option<LocalCursorModel> {
        if self.touch {
            return None;
        }
        Some(LocalCursorModel {
            variant: self.variant(),
            x: self.x.value(),
            y: self.y.value(),
            width: self.width.value(),
            height: self.height.value(),
            border_radius: self.border_radius(),
            scale: self.scale.value(),
            opacity: self.opacity.value(),
            background: self.background(),
        })
    }
}

#[cfg(test)]
#[path = "local_test.rs"]
mod tests;
