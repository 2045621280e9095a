// ============================================================================
// PREVIEW STYLE: lossy real-time approximation of a modifier stack
// ============================================================================
//
// Walks the active modifiers in order and maps each one onto CSS-style
// filter / transform functions. Modifiers with no real-time equivalent are
// listed in `unapproximated` so callers can tell the preview is partial.

use std::fmt::Write as _;

use crate::math::{Color, fmt_num};
use crate::modifier::{Modifier, ModifierType};

#[derive(Clone, Debug, PartialEq)]
pub enum FilterFn {
    /// Gaussian standard deviation in pixels.
    Blur(f64),
    Brightness(f64),
    Contrast(f64),
    Saturate(f64),
    /// Degrees.
    HueRotate(f64),
    Grayscale(f64),
    Sepia(f64),
    Invert(f64),
    Opacity(f64),
    DropShadow { dx: f64, dy: f64, blur: f64, color: Color },
}

impl FilterFn {
    pub fn to_css(&self) -> String {
        match self {
            FilterFn::Blur(px) => format!("blur({}px)", fmt_num(*px)),
            FilterFn::Brightness(v) => format!("brightness({})", fmt_num(*v)),
            FilterFn::Contrast(v) => format!("contrast({})", fmt_num(*v)),
            FilterFn::Saturate(v) => format!("saturate({})", fmt_num(*v)),
            FilterFn::HueRotate(deg) => format!("hue-rotate({}deg)", fmt_num(*deg)),
            FilterFn::Grayscale(v) => format!("grayscale({})", fmt_num(*v)),
            FilterFn::Sepia(v) => format!("sepia({})", fmt_num(*v)),
            FilterFn::Invert(v) => format!("invert({})", fmt_num(*v)),
            FilterFn::Opacity(v) => format!("opacity({})", fmt_num(*v)),
            FilterFn::DropShadow { dx, dy, blur, color } => format!(
                "drop-shadow({}px {}px {}px {})",
                fmt_num(*dx),
                fmt_num(*dy),
                fmt_num(*blur),
                color.to_hex()
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TransformFn {
    /// Degrees.
    Rotate(f64),
    Scale(f64, f64),
    /// Degrees.
    Skew(f64, f64),
    Perspective { distance: f64, rotate_x: f64, rotate_y: f64 },
}

impl TransformFn {
    pub fn to_css(&self) -> String {
        match self {
            TransformFn::Rotate(deg) => format!("rotate({}deg)", fmt_num(*deg)),
            TransformFn::Scale(x, y) => format!("scale({}, {})", fmt_num(*x), fmt_num(*y)),
            TransformFn::Skew(x, y) => format!("skew({}deg, {}deg)", fmt_num(*x), fmt_num(*y)),
            TransformFn::Perspective { distance, rotate_x, rotate_y } => format!(
                "perspective({}px) rotateX({}deg) rotateY({}deg)",
                fmt_num(*distance),
                fmt_num(*rotate_x),
                fmt_num(*rotate_y)
            ),
        }
    }
}

/// Preview style for one layer.
#[derive(Clone, Debug, PartialEq)]
pub struct PreviewStyle {
    pub filters: Vec<FilterFn>,
    pub transforms: Vec<TransformFn>,
    /// Multiplier on the layer's own opacity.
    pub opacity: f64,
    pub blend_mode: Option<String>,
    /// Active modifiers the preview could not represent.
    pub unapproximated: Vec<ModifierType>,
}

impl Default for PreviewStyle {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            transforms: Vec::new(),
            opacity: 1.0,
            blend_mode: None,
            unapproximated: Vec::new(),
        }
    }
}

impl PreviewStyle {
    /// CSS `filter` value, or `none`.
    pub fn to_css_filter(&self) -> String {
        join_or_none(self.filters.iter().map(FilterFn::to_css))
    }

    /// CSS `transform` value, or `none`.
    pub fn to_css_transform(&self) -> String {
        join_or_none(self.transforms.iter().map(TransformFn::to_css))
    }

    /// Full inline declaration block.
    pub fn to_css(&self) -> String {
        let mut css = format!(
            "filter: {}; transform: {}; opacity: {};",
            self.to_css_filter(),
            self.to_css_transform(),
            fmt_num(self.opacity)
        );
        if let Some(mode) = &self.blend_mode {
            let _ = write!(css, " mix-blend-mode: {};", mode);
        }
        css
    }

    pub fn is_exact(&self) -> bool {
        self.unapproximated.is_empty()
    }
}

fn join_or_none(parts: impl Iterator<Item = String>) -> String {
    let joined: Vec<String> = parts.collect();
    if joined.is_empty() {
        "none".to_string()
    } else {
        joined.join(" ")
    }
}

/// Approximate an ordered modifier list. Inactive modifiers are ignored.
pub fn approximate(modifiers: &[Modifier]) -> PreviewStyle {
    let mut style = PreviewStyle::default();
    for m in modifiers.iter().filter(|m| m.active) {
        if !approximate_one(m, &mut style) {
            style.unapproximated.push(m.kind);
        }
    }
    style
}

/// Push the approximation of one modifier. Returns `false` when the modifier
/// has no real-time equivalent.
fn approximate_one(m: &Modifier, style: &mut PreviewStyle) -> bool {
    use ModifierType::*;
    let pct = |key: &str, default: f64| m.number(key, default) / 100.0;
    let f = &mut style.filters;

    match m.kind {
        Blur | GaussianBlur => f.push(FilterFn::Blur(m.number("radius", 5.0).max(0.0))),
        MotionBlur => f.push(FilterFn::Blur((m.number("distance", 10.0) / 4.0).max(0.0))),
        RadialBlur => f.push(FilterFn::Blur((m.number("amount", 10.0) / 5.0).max(0.0))),
        Sharpen => f.push(FilterFn::Contrast(1.0 + m.number("amount", 50.0) / 200.0)),
        Brightness => f.push(FilterFn::Brightness(pct("amount", 100.0).max(0.0))),
        Contrast => f.push(FilterFn::Contrast(pct("amount", 100.0).max(0.0))),
        Saturation => f.push(FilterFn::Saturate(pct("amount", 100.0).max(0.0))),
        HueShift => f.push(FilterFn::HueRotate(m.number("degrees", 0.0))),
        Exposure => f.push(FilterFn::Brightness(2f64.powf(m.number("stops", 0.0)))),
        Temperature => {
            let amount = m.number("amount", 0.0).clamp(-100.0, 100.0);
            if amount >= 0.0 {
                f.push(FilterFn::Sepia(amount / 200.0));
            } else {
                f.push(FilterFn::HueRotate(amount * 0.3));
                f.push(FilterFn::Saturate(1.0 + amount.abs() / 400.0));
            }
        }
        ColorGrade => {
            f.push(FilterFn::Brightness(pct("brightness", 100.0).max(0.0)));
            f.push(FilterFn::Contrast(pct("contrast", 100.0).max(0.0)));
            f.push(FilterFn::Saturate(pct("saturation", 100.0).max(0.0)));
            let hue = m.number("hue", 0.0);
            if hue != 0.0 {
                f.push(FilterFn::HueRotate(hue));
            }
        }
        Grayscale => f.push(FilterFn::Grayscale(pct("amount", 100.0).clamp(0.0, 1.0))),
        Sepia => f.push(FilterFn::Sepia(pct("amount", 100.0).clamp(0.0, 1.0))),
        Invert => f.push(FilterFn::Invert(pct("amount", 100.0).clamp(0.0, 1.0))),
        Posterize => {
            let levels = m.number("levels", 4.0).max(2.0);
            f.push(FilterFn::Contrast(1.0 + 4.0 / levels));
        }
        Threshold => {
            f.push(FilterFn::Grayscale(1.0));
            f.push(FilterFn::Contrast(10.0));
        }
        Duotone => {
            f.push(FilterFn::Grayscale(1.0));
            f.push(FilterFn::Sepia(0.6));
        }
        Glow | OuterGlow => f.push(FilterFn::DropShadow {
            dx: 0.0,
            dy: 0.0,
            blur: m.number("radius", 10.0).max(0.0),
            color: m.color("color", Color::WHITE),
        }),
        DropShadow => f.push(FilterFn::DropShadow {
            dx: m.number("offsetX", 4.0),
            dy: m.number("offsetY", 4.0),
            blur: m.number("blur", 8.0).max(0.0),
            color: m.color("color", Color::BLACK),
        }),
        Outline => f.push(FilterFn::DropShadow {
            dx: 0.0,
            dy: 0.0,
            blur: m.number("width", 2.0).max(0.0),
            color: m.color("color", Color::BLACK),
        }),
        ChromaticAberration => f.push(FilterFn::DropShadow {
            dx: m.number("offset", 3.0),
            dy: 0.0,
            blur: 0.0,
            color: Color::rgb(255, 0, 0),
        }),
        Opacity => style.opacity *= pct("amount", 100.0).clamp(0.0, 1.0),
        BlendMode => {
            let mode = m.text("mode", "normal");
            style.blend_mode = if mode == "normal" { None } else { Some(mode.to_string()) };
        }
        Twirl => style.transforms.push(TransformFn::Rotate(m.number("angle", 90.0) * 0.1)),
        Bulge => {
            let s = 1.0 + m.number("amount", 50.0) / 200.0;
            style.transforms.push(TransformFn::Scale(s, s));
        }
        Pinch => {
            let s = (1.0 - m.number("amount", 50.0) / 200.0).max(0.0);
            style.transforms.push(TransformFn::Scale(s, s));
        }
        Mirror => {
            if m.flag("horizontal", true) {
                style.transforms.push(TransformFn::Scale(-1.0, 1.0));
            } else {
                style.transforms.push(TransformFn::Scale(1.0, -1.0));
            }
        }
        Flip => {
            let sx = if m.flag("horizontal", true) { -1.0 } else { 1.0 };
            let sy = if m.flag("vertical", false) { -1.0 } else { 1.0 };
            style.transforms.push(TransformFn::Scale(sx, sy));
        }
        Perspective => style.transforms.push(TransformFn::Perspective {
            distance: m.number("distance", 800.0).max(1.0),
            rotate_x: m.number("rotateX", 0.0),
            rotate_y: m.number("rotateY", 0.0),
        }),
        Skew => style.transforms.push(TransformFn::Skew(m.number("x", 0.0), m.number("y", 0.0))),
        Rotate => style.transforms.push(TransformFn::Rotate(m.number("degrees", 0.0))),
        Scale => style.transforms.push(TransformFn::Scale(m.number("x", 1.0), m.number("y", 1.0))),
        GradientMap | Vignette | InnerGlow | Noise | FilmGrain | Pixelate | Halftone | Glitch | Wave
        | Ripple | Liquify | Displace | Kaleidoscope | Mask | AiFill | AiStyleTransfer | AiUpscale
        | AiBackgroundRemoval => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stack_is_neutral() {
        let style = approximate(&[]);
        assert_eq!(style.to_css_filter(), "none");
        assert_eq!(style.to_css_transform(), "none");
        assert_eq!(style.opacity, 1.0);
        assert!(style.is_exact());
    }

    #[test]
    fn order_is_preserved() {
        let mods = vec![
            Modifier::new(ModifierType::Blur).with_param("radius", 3.0),
            Modifier::new(ModifierType::Brightness).with_param("amount", 150.0),
            Modifier::new(ModifierType::Blur).with_param("radius", 1.0),
        ];
        assert_eq!(
            approximate(&mods).to_css_filter(),
            "blur(3px) brightness(1.5) blur(1px)"
        );
    }

    #[test]
    fn inactive_modifiers_are_skipped() {
        let mut blur = Modifier::new(ModifierType::Blur);
        blur.active = false;
        let mut pixelate = Modifier::new(ModifierType::Pixelate);
        pixelate.active = false;
        let style = approximate(&[blur, pixelate]);
        assert!(style.filters.is_empty());
        assert!(style.is_exact());
    }

    #[test]
    fn unsupported_kinds_are_reported() {
        let mods = vec![
            Modifier::new(ModifierType::Pixelate),
            Modifier::new(ModifierType::Sepia),
            Modifier::new(ModifierType::AiFill),
        ];
        let style = approximate(&mods);
        assert_eq!(style.unapproximated, vec![ModifierType::Pixelate, ModifierType::AiFill]);
        assert_eq!(style.to_css_filter(), "sepia(1)");
    }

    #[test]
    fn glow_and_shadow_map_to_drop_shadow() {
        let mods = vec![
            Modifier::new(ModifierType::Glow).with_param("color", "#ff0000"),
            Modifier::new(ModifierType::DropShadow),
        ];
        assert_eq!(
            approximate(&mods).to_css_filter(),
            "drop-shadow(0px 0px 10px #ff0000) drop-shadow(4px 4px 8px #000000)"
        );
    }

    #[test]
    fn opacity_blend_and_transforms() {
        let mods = vec![
            Modifier::new(ModifierType::Opacity).with_param("amount", 50.0),
            Modifier::new(ModifierType::Opacity).with_param("amount", 50.0),
            Modifier::new(ModifierType::BlendMode).with_param("mode", "multiply"),
            Modifier::new(ModifierType::Rotate).with_param("degrees", 15.0),
            Modifier::new(ModifierType::Flip),
        ];
        let style = approximate(&mods);
        assert_eq!(style.opacity, 0.25);
        assert_eq!(style.blend_mode.as_deref(), Some("multiply"));
        assert_eq!(style.to_css_transform(), "rotate(15deg) scale(-1, 1)");
        assert_eq!(
            style.to_css(),
            "filter: none; transform: rotate(15deg) scale(-1, 1); opacity: 0.25; mix-blend-mode: multiply;"
        );
    }

    #[test]
    fn exposure_doubles_per_stop() {
        let style = approximate(&[Modifier::new(ModifierType::Exposure).with_param("stops", 1.0)]);
        assert_eq!(style.filters, vec![FilterFn::Brightness(2.0)]);
    }
}
