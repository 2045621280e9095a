// ============================================================================
// MODIFIERS: typed descriptors attached to layers
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::math::Color;

/// Every modifier kind the editor knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierType {
    // Blur
    Blur,
    GaussianBlur,
    MotionBlur,
    RadialBlur,
    Sharpen,
    // Colour
    Brightness,
    Contrast,
    Saturation,
    HueShift,
    Exposure,
    Temperature,
    ColorGrade,
    Grayscale,
    Sepia,
    Invert,
    Posterize,
    Threshold,
    Duotone,
    GradientMap,
    // Stylize
    Vignette,
    Glow,
    OuterGlow,
    InnerGlow,
    DropShadow,
    Outline,
    Noise,
    FilmGrain,
    Pixelate,
    Halftone,
    ChromaticAberration,
    Glitch,
    // Distort
    Wave,
    Ripple,
    Twirl,
    Bulge,
    Pinch,
    Liquify,
    Displace,
    Kaleidoscope,
    // Transform
    Mirror,
    Flip,
    Perspective,
    Skew,
    Rotate,
    Scale,
    // Compositing
    Opacity,
    BlendMode,
    Mask,
    // AI-driven
    AiFill,
    AiStyleTransfer,
    AiUpscale,
    AiBackgroundRemoval,
}

impl ModifierType {
    pub fn all() -> &'static [ModifierType] {
        use ModifierType::*;
        &[
            Blur, GaussianBlur, MotionBlur, RadialBlur, Sharpen,
            Brightness, Contrast, Saturation, HueShift, Exposure, Temperature, ColorGrade,
            Grayscale, Sepia, Invert, Posterize, Threshold, Duotone, GradientMap,
            Vignette, Glow, OuterGlow, InnerGlow, DropShadow, Outline, Noise, FilmGrain,
            Pixelate, Halftone, ChromaticAberration, Glitch,
            Wave, Ripple, Twirl, Bulge, Pinch, Liquify, Displace, Kaleidoscope,
            Mirror, Flip, Perspective, Skew, Rotate, Scale,
            Opacity, BlendMode, Mask,
            AiFill, AiStyleTransfer, AiUpscale, AiBackgroundRemoval,
        ]
    }

    /// Wire name (`snake_case`), identical to the serde representation.
    pub fn key(&self) -> String {
        serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default()
    }

    /// Human-readable default name.
    pub fn label(&self) -> String {
        self.key()
            .split('_')
            .map(|w| match w {
                "ai" => "AI".to_string(),
                _ => {
                    let mut chars = w.chars();
                    match chars.next() {
                        Some(c) => c.to_ascii_uppercase().to_string() + chars.as_str(),
                        None => String::new(),
                    }
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Parameters a freshly added modifier starts with.
    pub fn default_params(&self) -> BTreeMap<String, ParamValue> {
        use ModifierType::*;
        use ParamValue::{Bool, Number, Text};
        let pairs: Vec<(&str, ParamValue)> = match self {
            Blur | GaussianBlur => vec![("radius", Number(5.0))],
            MotionBlur => vec![("distance", Number(10.0)), ("angle", Number(0.0))],
            RadialBlur => vec![("amount", Number(10.0))],
            Sharpen => vec![("amount", Number(50.0))],
            Brightness | Contrast | Saturation => vec![("amount", Number(100.0))],
            HueShift => vec![("degrees", Number(0.0))],
            Exposure => vec![("stops", Number(0.0))],
            Temperature => vec![("amount", Number(0.0))],
            ColorGrade => vec![
                ("brightness", Number(100.0)),
                ("contrast", Number(100.0)),
                ("saturation", Number(100.0)),
                ("hue", Number(0.0)),
            ],
            Grayscale | Sepia | Invert => vec![("amount", Number(100.0))],
            Posterize => vec![("levels", Number(4.0))],
            Threshold => vec![("level", Number(50.0))],
            Duotone => vec![("dark", Text("#1e1b4b".into())), ("light", Text("#fde68a".into()))],
            GradientMap => vec![("from", Text("#000000".into())), ("to", Text("#ffffff".into()))],
            Vignette => vec![("amount", Number(50.0)), ("size", Number(50.0))],
            Glow | OuterGlow | InnerGlow => vec![("radius", Number(10.0)), ("color", Text("#ffffff".into()))],
            DropShadow => vec![
                ("offsetX", Number(4.0)),
                ("offsetY", Number(4.0)),
                ("blur", Number(8.0)),
                ("color", Text("#000000".into())),
            ],
            Outline => vec![("width", Number(2.0)), ("color", Text("#000000".into()))],
            Noise | FilmGrain => vec![("amount", Number(20.0))],
            Pixelate => vec![("size", Number(8.0))],
            Halftone => vec![("dotSize", Number(6.0))],
            ChromaticAberration => vec![("offset", Number(3.0))],
            Glitch => vec![("intensity", Number(30.0)), ("seed", Number(0.0))],
            Wave | Ripple => vec![("amplitude", Number(10.0)), ("frequency", Number(5.0))],
            Twirl => vec![("angle", Number(90.0))],
            Bulge | Pinch => vec![("amount", Number(50.0))],
            Liquify => vec![
                ("brushSize", Number(100.0)),
                ("pressure", Number(0.5)),
                ("mode", Text("push".into())),
                ("points", Number(5.0)),
                ("seed", Number(0.0)),
            ],
            Displace => vec![("scale", Number(20.0))],
            Kaleidoscope => vec![("segments", Number(6.0))],
            Mirror => vec![("horizontal", Bool(true))],
            Flip => vec![("horizontal", Bool(true)), ("vertical", Bool(false))],
            Perspective => vec![("rotateX", Number(0.0)), ("rotateY", Number(0.0)), ("distance", Number(800.0))],
            Skew => vec![("x", Number(0.0)), ("y", Number(0.0))],
            Rotate => vec![("degrees", Number(0.0))],
            Scale => vec![("x", Number(1.0)), ("y", Number(1.0))],
            Opacity => vec![("amount", Number(100.0))],
            BlendMode => vec![("mode", Text("normal".into()))],
            Mask => vec![("invert", Bool(false))],
            AiFill | AiStyleTransfer => vec![("prompt", Text(String::new())), ("strength", Number(75.0))],
            AiUpscale => vec![("factor", Number(2.0))],
            AiBackgroundRemoval => vec![("threshold", Number(50.0))],
        };
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }
}

impl fmt::Display for ModifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl FromStr for ModifierType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.trim().to_string()))
            .map_err(|_| format!("unknown modifier type '{}'", s))
    }
}

/// A single parameter value. Colours travel as text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Number(n) => Some(*n),
            ParamValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            ParamValue::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            ParamValue::Number(n) => Some(*n != 0.0),
            ParamValue::Text(s) => match s.trim() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Number(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

/// A modifier instance owned by a layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Modifier {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: ModifierType,
    pub name: String,
    pub active: bool,
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<u64>,
    #[serde(default)]
    pub is_favorite: bool,
}

impl Modifier {
    pub fn new(kind: ModifierType) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            name: kind.label(),
            active: true,
            params: kind.default_params(),
            last_used: None,
            is_favorite: false,
        }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn number(&self, key: &str, default: f64) -> f64 {
        self.params
            .get(key)
            .and_then(ParamValue::as_f64)
            .filter(|v| v.is_finite())
            .unwrap_or(default)
    }

    pub fn flag(&self, key: &str, default: bool) -> bool {
        self.params.get(key).and_then(ParamValue::as_bool).unwrap_or(default)
    }

    pub fn text<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.params.get(key).and_then(ParamValue::as_str).unwrap_or(default)
    }

    pub fn color(&self, key: &str, default: Color) -> Color {
        self.params
            .get(key)
            .and_then(ParamValue::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or(default)
    }

    /// Merge `params` over the current values.
    pub fn merge_params(&mut self, params: BTreeMap<String, ParamValue>) {
        self.params.extend(params);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_keys_round_trip() {
        for kind in ModifierType::all() {
            let key = kind.key();
            assert!(!key.is_empty());
            assert_eq!(key.parse::<ModifierType>().unwrap(), *kind);
        }
        assert_eq!(ModifierType::DropShadow.key(), "drop_shadow");
        assert_eq!(ModifierType::AiFill.label(), "AI Fill");
        assert!("laser_eyes".parse::<ModifierType>().is_err());
    }

    #[test]
    fn new_modifier_has_defaults() {
        let m = Modifier::new(ModifierType::Blur);
        assert!(m.active);
        assert_eq!(m.name, "Blur");
        assert_eq!(m.number("radius", 0.0), 5.0);
    }

    #[test]
    fn accessors_fall_back_on_wrong_types() {
        let m = Modifier::new(ModifierType::Glow)
            .with_param("radius", "12")
            .with_param("color", "not a colour");
        assert_eq!(m.number("radius", 0.0), 12.0);
        assert_eq!(m.color("color", Color::WHITE), Color::WHITE);
        assert_eq!(m.number("missing", 3.0), 3.0);
        assert!(!m.flag("missing", false));
    }

    #[test]
    fn params_deserialize_untagged() {
        let json = r##"{"id":"00000000-0000-0000-0000-000000000001","type":"glow","name":"Glow","active":true,
            "params":{"radius":8,"color":"#ff0000","inner":false}}"##;
        let m: Modifier = serde_json::from_str(json).unwrap();
        assert_eq!(m.params["radius"], ParamValue::Number(8.0));
        assert_eq!(m.params["inner"], ParamValue::Bool(false));
        assert_eq!(m.color("color", Color::BLACK), Color::rgb(255, 0, 0));
        assert!(!m.is_favorite);
    }

    #[test]
    fn merge_overwrites_and_keeps_others() {
        let mut m = Modifier::new(ModifierType::DropShadow);
        let mut update = BTreeMap::new();
        update.insert("blur".to_string(), ParamValue::Number(2.0));
        m.merge_params(update);
        assert_eq!(m.number("blur", 0.0), 2.0);
        assert_eq!(m.number("offsetX", 0.0), 4.0);
    }
}
