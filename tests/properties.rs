use image::{Rgba, RgbaImage};
use modweave::components::history::HistoryManager;
use modweave::math::{Color, GradientStop, sample_gradient};
use modweave::ops::actions::{apply_actions, parse_actions};
use modweave::ops::liquify::{BrushMode, LiquifyRenderer};
use modweave::ops::pattern::{
    self, GeneratorState, MaskAttribute, MaskData, SequenceDirection, SequenceKind, ShapeKind,
};
use modweave::{Document, Layer, LayerKind, ModifierType};

fn grid_state(cols: u32, rows: u32) -> GeneratorState {
    let mut s = GeneratorState::default();
    s.grid.cols = cols;
    s.grid.rows = rows;
    s.grid.spacing_x = 10.0;
    s.grid.spacing_y = 10.0;
    s.grid.unit_width = 10.0;
    s.grid.unit_height = 10.0;
    s
}

/// Markup of each cell group, in row-major order.
fn cells(svg: &str) -> Vec<&str> {
    svg.split(r#"<g class="cell""#).skip(1).collect()
}

fn gradient_image(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| Rgba([(x * 7 % 256) as u8, (y * 5 % 256) as u8, 128, 255]))
}

#[test]
fn pattern_output_is_deterministic() {
    let mut s = grid_state(6, 4);
    s.transform.rotation_variance = 45.0;
    s.mask.settings.enable(MaskAttribute::Width, 2.0, 9.0);
    s.distortion.wave_amount = 3.0;
    s.distortion.wave_frequency = 2.0;
    let mask = MaskData::from_image(&gradient_image(16, 16));
    assert_eq!(pattern::generate(&s, Some(&mask)), pattern::generate(&s, Some(&mask)));
}

#[test]
fn emits_one_group_per_cell() {
    for (cols, rows) in [(1, 1), (3, 2), (7, 5)] {
        let svg = pattern::generate(&grid_state(cols, rows), None);
        assert_eq!(cells(&svg).len(), (cols * rows) as usize);
    }

    // Shapes that cannot be drawn still occupy their slot.
    let mut s = grid_state(2, 2);
    s.unit.shape = ShapeKind::Custom;
    let render = pattern::render(&s, None);
    assert_eq!(cells(&render.svg).len(), 4);
    assert_eq!(render.skipped.len(), 4);
}

#[test]
fn gradient_endpoints_and_midpoint() {
    let stops = [
        GradientStop::new(Color::rgb(255, 0, 0), 0.0),
        GradientStop::new(Color::rgb(0, 0, 255), 100.0),
    ];
    assert_eq!(sample_gradient(&stops, 0.0), Color::rgb(255, 0, 0));
    assert_eq!(sample_gradient(&stops, 100.0), Color::rgb(0, 0, 255));
    assert_eq!(sample_gradient(&stops, -20.0), Color::rgb(255, 0, 0));
    assert_eq!(sample_gradient(&stops, 150.0), Color::rgb(0, 0, 255));
    let mid = sample_gradient(&stops, 50.0);
    assert!((127..=128).contains(&mid.r) && (127..=128).contains(&mid.b) && mid.g == 0);
}

#[test]
fn disabled_mask_attributes_leave_output_unchanged() {
    let s = grid_state(4, 4);
    let mask = MaskData::from_image(&gradient_image(8, 8));
    assert_eq!(pattern::generate(&s, Some(&mask)), pattern::generate(&s, None));
}

#[test]
fn wave_without_amount_changes_nothing() {
    let mut s = grid_state(5, 5);
    s.mask.settings.enable(MaskAttribute::Opacity, 0.2, 1.0);
    let mask = MaskData::from_image(&gradient_image(20, 20));
    let plain = pattern::generate(&s, Some(&mask));
    s.distortion.wave_frequency = 7.5;
    assert_eq!(pattern::generate(&s, Some(&mask)), plain);
    s.distortion.wave_amount = 12.0;
    assert_ne!(pattern::generate(&s, Some(&mask)), plain);
}

#[test]
fn radial_sequence_grows_from_centre() {
    let mut s = grid_state(3, 3);
    s.sequence.kind = SequenceKind::Linear;
    s.sequence.direction = SequenceDirection::Radial;
    s.sequence.min = 0.5;
    s.sequence.max = 1.5;
    let svg = pattern::generate(&s, None);
    let groups = cells(&svg);
    assert!(groups[4].contains(r#"width="5" height="5""#), "{}", groups[4]);
    for corner in [0, 2, 6, 8] {
        assert!(groups[corner].contains(r#"width="15" height="15""#), "{}", groups[corner]);
    }
}

#[test]
fn liquify_reset_is_idempotent() {
    let src = gradient_image(40, 30);
    let mut r = LiquifyRenderer::new(8);
    r.set_source_image(src.clone());
    r.apply_brush((20.0, 15.0), 30.0, 0.8, BrushMode::Twirl);
    assert_ne!(r.canvas(), &src);
    let first = r.reset().clone();
    let second = r.reset().clone();
    assert_eq!(first, second);
    assert_eq!(first, src);
}

#[test]
fn liquify_without_source_does_nothing() {
    let mut r = LiquifyRenderer::default();
    for mode in BrushMode::all() {
        assert_eq!(r.apply_brush((5.0, 5.0), 20.0, 1.0, *mode).dimensions(), (0, 0));
    }
    assert!(!r.has_source());
}

#[test]
fn duplicate_connections_from_actions_are_stored_once() {
    let mut doc = Document::new(100, 100);
    let layer = doc.add_layer(Layer::new("Photo", LayerKind::Image, 100.0, 100.0));
    let a = doc.add_modifier(layer, ModifierType::Glow).unwrap();
    let b = doc.add_modifier(layer, ModifierType::Vignette).unwrap();
    let conn = format!(
        r#"{{"action":"create_connection","fromModId":"{a}","fromPort":"radius","toModId":"{b}","toPort":"amount"}}"#
    );

    let mut history = HistoryManager::default();
    for _ in 0..2 {
        let actions = parse_actions(&conn).unwrap();
        apply_actions(&mut doc, &mut history, &actions).unwrap();
    }
    let report = apply_actions(&mut doc, &mut history, &parse_actions(&format!("[{conn},{conn}]")).unwrap()).unwrap();
    assert_eq!(report.skipped_duplicates, 2);
    assert_eq!(doc.layer(layer).unwrap().connections.len(), 1);
}

#[test]
fn procedural_layer_survives_project_round_trip() {
    let mut doc = Document::new(200, 200);
    let id = doc.add_layer(Layer::new("Pattern", LayerKind::Procedural, 1.0, 1.0));
    doc.render_procedural(id, None).unwrap();
    let bytes = modweave::io::project_to_bytes(&doc).unwrap();
    let back = modweave::io::project_from_bytes(&bytes).unwrap();
    assert_eq!(back, doc);
    let svg = pattern::generate(back.layer(id).unwrap().generator.as_ref().unwrap(), None);
    assert_eq!(pattern::to_data_uri(&svg), back.layer(id).unwrap().content.clone().unwrap());
}
