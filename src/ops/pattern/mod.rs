// ============================================================================
// PROCEDURAL PATTERN ENGINE: GeneratorState + mask → SVG
// ============================================================================
//
// Pure and deterministic: identical state and mask pixels always produce
// byte-identical markup. The only "random" input (rotation variance) is a
// seeded hash of the cell coordinates.

pub mod mask;
pub mod sequence;
pub mod state;
pub mod svg;

pub use mask::MaskData;
pub use state::*;
pub use svg::{CellGeometry, SkipReason, to_data_uri};

use std::borrow::Cow;

use crate::math::{hash_unit, lerp, sample_sorted_gradient};
use sequence::{GridFrame, sequence_value};

/// A cell whose geometry was left out of the output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkippedCell {
    pub col: u32,
    pub row: u32,
    pub reason: SkipReason,
}

/// Result of a pattern render.
#[derive(Clone, Debug, PartialEq)]
pub struct PatternRender {
    pub svg: String,
    pub width: f64,
    pub height: f64,
    /// Number of cell groups emitted (always `cols × rows`).
    pub cells: usize,
    pub skipped: Vec<SkippedCell>,
}

/// Non-positive or non-finite extents collapse to a 1px canvas.
fn extent(span: f64) -> f64 {
    if span.is_finite() && span > 0.0 { span } else { 1.0 }
}

/// Render `state` to an SVG document string.
pub fn generate(state: &GeneratorState, mask: Option<&MaskData>) -> String {
    render(state, mask).svg
}

/// Render `state`, also reporting cells whose shape could not be drawn.
///
/// When no mask is passed and the mask source is Perlin noise, a noise mask is
/// synthesized at canvas extent from `mask.noiseScale` / `mask.noiseSeed`.
pub fn render(state: &GeneratorState, mask: Option<&MaskData>) -> PatternRender {
    let grid = &state.grid;
    let cols = grid.cols.max(1);
    let rows = grid.rows.max(1);

    // -- Canvas extent ---------------------------------------------------
    let grid_w = (cols - 1) as f64 * grid.spacing_x;
    let grid_h = (rows - 1) as f64 * grid.spacing_y;
    let width = extent(grid_w + grid.spacing_x * 4.0);
    let height = extent(grid_h + grid.spacing_y * 4.0);
    let start_x = (width - grid_w) / 2.0;
    let start_y = (height - grid_h) / 2.0;
    let frame = GridFrame::new(start_x, start_y, grid_w, grid_h, grid.spacing_x, grid.spacing_y);

    let mask: Option<Cow<'_, MaskData>> = match mask {
        Some(m) => Some(Cow::Borrowed(m)),
        None if state.mask.source == MaskSource::Noise && state.mask.settings.any_enabled() => {
            Some(Cow::Owned(MaskData::noise(
                width.ceil() as u32,
                height.ceil() as u32,
                state.mask.noise_scale,
                state.mask.noise_seed,
            )))
        }
        None => None,
    };

    let stops = state.colors.gradient.sorted_stops();
    let mut svg = String::with_capacity(256 + cols as usize * rows as usize * 160);
    svg::open_document(&mut svg, width, height, state.colors.background);

    let mut skipped = Vec::new();
    for j in 0..rows {
        for i in 0..cols {
            let x = start_x + i as f64 * grid.spacing_x;
            let y = start_y + j as f64 * grid.spacing_y;
            let cell = compute_cell(state, &frame, &stops, mask.as_deref(), i, j, x, y, width, height);
            if let Some(reason) = svg::write_cell(&mut svg, &cell, state.unit.shape, state.unit.path_data.as_deref()) {
                skipped.push(SkippedCell { col: i, row: j, reason });
            }
        }
    }
    svg::close_document(&mut svg);

    if let Some(first) = skipped.first() {
        crate::log_warn!(
            "pattern: {} of {} cells rendered without geometry ({:?})",
            skipped.len(),
            cols * rows,
            first.reason
        );
    }

    PatternRender {
        svg,
        width,
        height,
        cells: cols as usize * rows as usize,
        skipped,
    }
}

/// Resolve every visual attribute of cell `(i, j)` at base position `(x, y)`.
fn compute_cell(
    state: &GeneratorState,
    frame: &GridFrame,
    stops: &[crate::math::GradientStop],
    mask: Option<&MaskData>,
    i: u32,
    j: u32,
    x: f64,
    y: f64,
    canvas_w: f64,
    canvas_h: f64,
) -> CellGeometry {
    let grid = &state.grid;
    let seq = &state.sequence;
    let tf = &state.transform;

    // -- Sequence --------------------------------------------------------
    let value = sequence_value(seq, frame, x, y);
    let size_factor = if seq.applies_to(SequenceTarget::Size) { value } else { 1.0 };

    let mut width = grid.unit_width * size_factor;
    let mut height = grid.unit_height * size_factor;
    let mut opacity = if seq.applies_to(SequenceTarget::Opacity) { value } else { 1.0 };
    let mut stroke_width = state.unit.stroke_width;
    if seq.applies_to(SequenceTarget::StrokeWidth) {
        stroke_width *= value;
    }

    let mut rotation = tf.rotation;
    if tf.rotation_variance != 0.0 {
        rotation += (hash_unit(i, j, tf.seed) * 2.0 - 1.0) * tf.rotation_variance;
    }
    if seq.applies_to(SequenceTarget::Rotation) {
        rotation += value;
    }

    let mut radius = state.unit.corner_radius;
    let mut gradient_t = gradient_position(state, x, y, canvas_w, canvas_h);
    let mut offset_x = 0.0;
    let mut offset_y = 0.0;

    // -- Mask ------------------------------------------------------------
    if state.mask.settings.any_enabled() {
        let (mut sx, mut sy) = (x, y);
        let dist = &state.distortion;
        if dist.wave_amount != 0.0 {
            sx += (y * 0.01 * dist.wave_frequency).sin() * dist.wave_amount;
            sy += (x * 0.01 * dist.wave_frequency).cos() * dist.wave_amount;
        }
        let lum = mask.map_or(0.0, |m| m.sample(sx, sy, canvas_w, canvas_h));
        let strength = state.mask.opacity / 100.0;

        for (attr, range) in state.mask.settings.iter() {
            if !range.enabled {
                continue;
            }
            let target = lerp(range.min, range.max, lum);
            let blend = |base: f64| lerp(base, target, strength);
            match attr {
                MaskAttribute::Width => width = blend(width),
                MaskAttribute::Height => height = blend(height),
                MaskAttribute::Opacity => opacity = blend(opacity),
                MaskAttribute::Rotation => rotation = blend(rotation),
                MaskAttribute::Radius => {
                    radius = match radius {
                        CornerRadius::Uniform(r) => CornerRadius::Uniform(blend(r)),
                        CornerRadius::Corners(c) => CornerRadius::Corners(c.map(blend)),
                    }
                }
                MaskAttribute::Color => gradient_t = blend(gradient_t),
                MaskAttribute::StrokeWidth => stroke_width = blend(stroke_width),
                MaskAttribute::X => offset_x = blend(offset_x),
                MaskAttribute::Y => offset_y = blend(offset_y),
            }
        }
    }

    CellGeometry {
        x: x + offset_x,
        y: y + offset_y,
        rotation,
        scale_x: tf.scale_x,
        scale_y: tf.scale_y,
        width: width.max(0.0),
        height: height.max(0.0),
        radius,
        fill: sample_sorted_gradient(stops, gradient_t),
        opacity,
        stroke: state.unit.stroke_color,
        stroke_width: stroke_width.max(0.0),
    }
}

/// Gradient coordinate (0–100) of a canvas position.
fn gradient_position(state: &GeneratorState, x: f64, y: f64, canvas_w: f64, canvas_h: f64) -> f64 {
    let gradient = &state.colors.gradient;
    let ox = x - canvas_w / 2.0;
    let oy = y - canvas_h / 2.0;
    let max_proj = (canvas_w * canvas_w + canvas_h * canvas_h).sqrt() / 2.0;
    if max_proj <= 0.0 {
        return 0.0;
    }
    match gradient.kind {
        GradientKind::Linear => {
            let a = (-gradient.angle).to_radians();
            let proj = ox * a.cos() - oy * a.sin();
            ((proj / max_proj + 1.0) / 2.0 * 100.0).clamp(0.0, 100.0)
        }
        GradientKind::Radial => ((ox * ox + oy * oy).sqrt() / max_proj * 100.0).clamp(0.0, 100.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Color, GradientStop};

    fn small_state() -> GeneratorState {
        let mut s = GeneratorState::default();
        s.grid.cols = 3;
        s.grid.rows = 2;
        s.grid.spacing_x = 10.0;
        s.grid.spacing_y = 10.0;
        s.grid.unit_width = 4.0;
        s.grid.unit_height = 4.0;
        s
    }

    #[test]
    fn canvas_extent_adds_two_spacings_each_side() {
        let r = render(&small_state(), None);
        assert_eq!(r.width, 60.0);
        assert_eq!(r.height, 50.0);
        assert!(r.svg.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" width="60" height="50""#));
        assert!(r.svg.ends_with("</svg>"));
    }

    #[test]
    fn large_unit_does_not_widen_canvas() {
        let mut s = GeneratorState::default();
        s.grid.cols = 1;
        s.grid.rows = 1;
        s.grid.spacing_x = 10.0;
        s.grid.spacing_y = 10.0;
        s.grid.unit_width = 40.0;
        s.grid.unit_height = 40.0;
        let r = render(&s, None);
        assert_eq!(r.width, 40.0);
        assert_eq!(r.height, 40.0);
        assert!(r.svg.contains(r#"transform="translate(20 20)"#));

        s.grid.spacing_x = 0.0;
        assert_eq!(render(&s, None).width, 1.0);
    }

    #[test]
    fn first_cell_is_offset_by_margin() {
        let r = render(&small_state(), None);
        assert!(r.svg.contains(r#"transform="translate(20 20) rotate(0) scale(1 1)""#));
        assert!(r.svg.contains(r#"transform="translate(40 30) rotate(0) scale(1 1)""#));
    }

    #[test]
    fn zero_columns_are_treated_as_one() {
        let mut s = small_state();
        s.grid.cols = 0;
        let r = render(&s, None);
        assert_eq!(r.cells, 2);
        assert_eq!(r.svg.matches(r#"<g class="cell""#).count(), 2);
    }

    #[test]
    fn skew_is_not_applied() {
        let mut s = small_state();
        let plain = generate(&s, None);
        s.transform.skew_x = 30.0;
        s.transform.skew_y = 10.0;
        assert_eq!(generate(&s, None), plain);
    }

    #[test]
    fn rotation_variance_is_seeded() {
        let mut s = small_state();
        s.transform.rotation_variance = 20.0;
        s.transform.seed = 1;
        let a = generate(&s, None);
        assert_eq!(a, generate(&s, None));
        s.transform.seed = 2;
        assert_ne!(a, generate(&s, None));
    }

    #[test]
    fn linear_gradient_runs_left_to_right() {
        let mut s = small_state();
        s.colors.gradient.stops = vec![
            GradientStop::new(Color::BLACK, 0.0),
            GradientStop::new(Color::WHITE, 100.0),
        ];
        // Centre of a 60×50 canvas maps to the midpoint.
        assert!((gradient_position(&s, 30.0, 25.0, 60.0, 50.0) - 50.0).abs() < 1e-9);
        let left = gradient_position(&s, 0.0, 25.0, 60.0, 50.0);
        let right = gradient_position(&s, 60.0, 25.0, 60.0, 50.0);
        assert!(left < 50.0 && right > 50.0);
    }

    #[test]
    fn mask_width_full_strength_replaces_base() {
        let mut s = small_state();
        s.grid.cols = 1;
        s.grid.rows = 1;
        s.mask.opacity = 100.0;
        s.mask.settings.enable(MaskAttribute::Width, 2.0, 12.0);
        let white = MaskData::from_raw(1, 1, vec![255, 255, 255, 255]).unwrap();
        let svg = generate(&s, Some(&white));
        assert!(svg.contains(r#"width="12" height="4""#), "{svg}");
    }

    #[test]
    fn mask_strength_blends_halfway() {
        let mut s = small_state();
        s.grid.cols = 1;
        s.grid.rows = 1;
        s.mask.opacity = 50.0;
        s.mask.settings.enable(MaskAttribute::Opacity, 0.0, 0.0);
        let black = MaskData::from_raw(1, 1, vec![0, 0, 0, 255]).unwrap();
        let svg = generate(&s, Some(&black));
        assert!(svg.contains(r#"fill-opacity="0.5""#), "{svg}");
    }

    #[test]
    fn noise_source_synthesizes_a_mask() {
        let mut s = small_state();
        s.mask.source = MaskSource::Noise;
        s.mask.noise_scale = 0.15;
        s.mask.noise_seed = 4;
        s.mask.settings.enable(MaskAttribute::Opacity, 0.0, 1.0);
        let a = generate(&s, None);
        assert_eq!(a, generate(&s, None));
        s.mask.settings = MaskTable::default();
        assert_ne!(a, generate(&s, None));
    }

    #[test]
    fn unknown_shape_is_reported_not_dropped() {
        let mut s = small_state();
        s.unit.shape = ShapeKind::Unknown;
        let r = render(&s, None);
        assert_eq!(r.skipped.len(), 6);
        assert_eq!(r.svg.matches(r#"<g class="cell""#).count(), 6);
    }

    #[test]
    fn custom_shape_embeds_path_data() {
        let mut s = small_state();
        s.unit.shape = ShapeKind::Custom;
        s.unit.path_data = Some("M0 0 L5 5 Z".to_string());
        let r = render(&s, None);
        assert!(r.skipped.is_empty());
        assert_eq!(r.svg.matches(r#"<path d="M0 0 L5 5 Z""#).count(), 6);
    }
}
