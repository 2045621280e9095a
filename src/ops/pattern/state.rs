// ============================================================================
// GENERATOR STATE: declarative configuration for the pattern engine
// ============================================================================
//
// Every record is `serde(default)`: a partial JSON document always loads as a
// complete, renderable state.

use serde::{Deserialize, Serialize};

use crate::math::{Color, GradientStop};

/// Errors reported by [`GeneratorState::validate`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PatternError {
    #[error("grid must have at least one column and one row (got {cols}×{rows})")]
    EmptyGrid { cols: u32, rows: u32 },
    #[error("{field} must be finite and non-negative (got {value})")]
    InvalidDimension { field: &'static str, value: f64 },
    #[error("custom shape selected but no path data was given")]
    MissingPathData,
    #[error("mask opacity must be within 0–100 (got {0})")]
    MaskOpacityOutOfRange(f64),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridSettings {
    pub unit_width: f64,
    pub unit_height: f64,
    pub spacing_x: f64,
    pub spacing_y: f64,
    pub cols: u32,
    pub rows: u32,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            unit_width: 40.0,
            unit_height: 40.0,
            spacing_x: 60.0,
            spacing_y: 60.0,
            cols: 8,
            rows: 8,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Rect,
    Circle,
    Triangle,
    Custom,
    /// Any shape name this engine does not know how to draw.
    #[serde(other)]
    Unknown,
}

/// Uniform radius, or one radius per corner (top-left, top-right,
/// bottom-right, bottom-left).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CornerRadius {
    Uniform(f64),
    Corners([f64; 4]),
}

impl Default for CornerRadius {
    fn default() -> Self {
        CornerRadius::Uniform(0.0)
    }
}

impl CornerRadius {
    pub fn corners(&self) -> [f64; 4] {
        match *self {
            CornerRadius::Uniform(r) => [r; 4],
            CornerRadius::Corners(c) => c,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UnitSettings {
    pub shape: ShapeKind,
    pub stroke_width: f64,
    pub stroke_color: Color,
    pub corner_radius: CornerRadius,
    pub path_data: Option<String>,
}

impl Default for UnitSettings {
    fn default() -> Self {
        Self {
            shape: ShapeKind::Rect,
            stroke_width: 0.0,
            stroke_color: Color::BLACK,
            corner_radius: CornerRadius::default(),
            path_data: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransformSettings {
    /// Base rotation in degrees.
    pub rotation: f64,
    /// Maximum per-cell deviation from `rotation`, in degrees.
    pub rotation_variance: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Stored for round-tripping; not applied to emitted cells.
    pub skew_x: f64,
    pub skew_y: f64,
    /// Seed for the per-cell rotation variance hash.
    pub seed: u32,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            rotation: 0.0,
            rotation_variance: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            skew_x: 0.0,
            skew_y: 0.0,
            seed: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SequenceKind {
    #[default]
    None,
    Linear,
    Geometric,
    Fibonacci,
    Power,
    Custom,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SequenceDirection {
    #[default]
    Row,
    Column,
    Radial,
    Diagonal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SequenceTarget {
    Size,
    Rotation,
    Opacity,
    StrokeWidth,
    /// Unrecognised target; never matched.
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SequenceSettings {
    #[serde(rename = "type")]
    pub kind: SequenceKind,
    pub min: f64,
    pub max: f64,
    pub direction: SequenceDirection,
    /// Direction angle in degrees.
    pub angle: f64,
    pub reverse: bool,
    pub apply_to: Vec<SequenceTarget>,
    pub custom_values: Vec<f64>,
}

impl Default for SequenceSettings {
    fn default() -> Self {
        Self {
            kind: SequenceKind::None,
            min: 0.5,
            max: 1.5,
            direction: SequenceDirection::Row,
            angle: 0.0,
            reverse: false,
            apply_to: vec![SequenceTarget::Size],
            custom_values: Vec::new(),
        }
    }
}

impl SequenceSettings {
    pub fn applies_to(&self, target: SequenceTarget) -> bool {
        self.apply_to.contains(&target)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskSource {
    #[default]
    Image,
    Noise,
}

/// Cell attributes a mask can modulate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MaskAttribute {
    Width,
    Height,
    Opacity,
    Rotation,
    Radius,
    Color,
    StrokeWidth,
    X,
    Y,
}

impl MaskAttribute {
    pub const ALL: [MaskAttribute; 9] = [
        MaskAttribute::Width,
        MaskAttribute::Height,
        MaskAttribute::Opacity,
        MaskAttribute::Rotation,
        MaskAttribute::Radius,
        MaskAttribute::Color,
        MaskAttribute::StrokeWidth,
        MaskAttribute::X,
        MaskAttribute::Y,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskRange {
    pub enabled: bool,
    pub min: f64,
    pub max: f64,
}

/// Fixed table of per-attribute mask ranges.
///
/// Serialized as a map keyed by attribute name so existing documents with a
/// subset of keys still load.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct MaskTable {
    entries: [MaskRange; 9],
}

impl MaskTable {
    pub fn get(&self, attr: MaskAttribute) -> &MaskRange {
        &self.entries[attr.index()]
    }

    pub fn get_mut(&mut self, attr: MaskAttribute) -> &mut MaskRange {
        &mut self.entries[attr.index()]
    }

    pub fn enable(&mut self, attr: MaskAttribute, min: f64, max: f64) {
        self.entries[attr.index()] = MaskRange { enabled: true, min, max };
    }

    pub fn any_enabled(&self) -> bool {
        self.entries.iter().any(|r| r.enabled)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MaskAttribute, &MaskRange)> {
        MaskAttribute::ALL.iter().map(move |&a| (a, self.get(a)))
    }
}

impl Serialize for MaskTable {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (attr, range) in self.iter() {
            map.serialize_entry(&attr, range)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for MaskTable {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = std::collections::HashMap::<MaskAttribute, MaskRange>::deserialize(deserializer)?;
        let mut table = MaskTable::default();
        for (attr, range) in raw {
            *table.get_mut(attr) = range;
        }
        Ok(table)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MaskSettings {
    pub source: MaskSource,
    /// Global blend strength (0–100) shared by every enabled attribute.
    pub opacity: f64,
    pub noise_scale: f64,
    pub noise_seed: u32,
    pub settings: MaskTable,
}

impl Default for MaskSettings {
    fn default() -> Self {
        Self {
            source: MaskSource::Image,
            opacity: 100.0,
            noise_scale: 0.01,
            noise_seed: 0,
            settings: MaskTable::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DistortionSettings {
    pub wave_amount: f64,
    pub wave_frequency: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientKind {
    #[default]
    Linear,
    Radial,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GradientSettings {
    #[serde(rename = "type")]
    pub kind: GradientKind,
    /// Degrees.
    pub angle: f64,
    pub stops: Vec<GradientStop>,
}

impl Default for GradientSettings {
    fn default() -> Self {
        Self {
            kind: GradientKind::Linear,
            angle: 0.0,
            stops: vec![
                GradientStop::new(Color::rgb(0x4f, 0x46, 0xe5), 0.0),
                GradientStop::new(Color::rgb(0xec, 0x48, 0x99), 100.0),
            ],
        }
    }
}

impl GradientSettings {
    /// Stops ordered by position, equal positions keeping declared order.
    pub fn sorted_stops(&self) -> Vec<GradientStop> {
        let mut stops = self.stops.clone();
        stops.sort_by(|a, b| a.position.total_cmp(&b.position));
        stops
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColorSettings {
    pub background: Color,
    pub gradient: GradientSettings,
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            background: Color::WHITE,
            gradient: GradientSettings::default(),
        }
    }
}

/// Complete input of the pattern engine.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorState {
    pub grid: GridSettings,
    pub unit: UnitSettings,
    pub transform: TransformSettings,
    pub sequence: SequenceSettings,
    pub mask: MaskSettings,
    pub distortion: DistortionSettings,
    pub colors: ColorSettings,
}

impl GeneratorState {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check the invariants the engine would otherwise silently normalize.
    pub fn validate(&self) -> Result<(), PatternError> {
        let g = &self.grid;
        if g.cols == 0 || g.rows == 0 {
            return Err(PatternError::EmptyGrid { cols: g.cols, rows: g.rows });
        }
        for (field, value) in [
            ("grid.unitWidth", g.unit_width),
            ("grid.unitHeight", g.unit_height),
            ("grid.spacingX", g.spacing_x),
            ("grid.spacingY", g.spacing_y),
            ("unit.strokeWidth", self.unit.stroke_width),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PatternError::InvalidDimension { field, value });
            }
        }
        if self.unit.shape == ShapeKind::Custom
            && self.unit.path_data.as_deref().is_none_or(|d| d.trim().is_empty())
        {
            return Err(PatternError::MissingPathData);
        }
        if !(0.0..=100.0).contains(&self.mask.opacity) {
            return Err(PatternError::MaskOpacityOutOfRange(self.mask.opacity));
        }
        Ok(())
    }
}
