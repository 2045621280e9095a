// ============================================================================
// SEQUENCE: spatial value curves across the grid
// ============================================================================

use super::state::{SequenceDirection, SequenceKind, SequenceSettings};
use crate::math::lerp;

/// Grid geometry the sequence is evaluated against.
#[derive(Clone, Copy, Debug)]
pub struct GridFrame {
    pub center_x: f64,
    pub center_y: f64,
    /// Grid corner positions (cell centres of the four extreme cells).
    pub corners: [(f64, f64); 4],
    pub spacing_x: f64,
    pub spacing_y: f64,
}

impl GridFrame {
    pub fn new(start_x: f64, start_y: f64, grid_w: f64, grid_h: f64, spacing_x: f64, spacing_y: f64) -> Self {
        Self {
            center_x: start_x + grid_w / 2.0,
            center_y: start_y + grid_h / 2.0,
            corners: [
                (start_x, start_y),
                (start_x + grid_w, start_y),
                (start_x, start_y + grid_h),
                (start_x + grid_w, start_y + grid_h),
            ],
            spacing_x,
            spacing_y,
        }
    }
}

/// Evaluate the sequence at a cell position.
///
/// `geometric`, `fibonacci` and `power` currently evaluate exactly like
/// `linear`.
pub fn sequence_value(seq: &SequenceSettings, frame: &GridFrame, x: f64, y: f64) -> f64 {
    if seq.kind == SequenceKind::None {
        return 1.0;
    }

    let (projection, t) = progress(seq, frame, x, y);

    if seq.kind == SequenceKind::Custom && !seq.custom_values.is_empty() {
        let len = seq.custom_values.len() as i64;
        let spacing = mean_spacing(seq.direction, frame);
        let mut projected_index = if spacing > 0.0 { projection / spacing } else { 0.0 };
        if seq.reverse {
            projected_index = -projected_index;
        }
        // Round away float noise before flooring (2.9999999 → 3).
        let idx = ((projected_index * 1e6).round() / 1e6).floor() as i64;
        return seq.custom_values[idx.rem_euclid(len) as usize];
    }

    lerp(seq.min, seq.max, t)
}

/// Raw projection of the cell offset along the configured direction, and the
/// normalized (and possibly reversed) progress `t ∈ [0, 1]`.
fn progress(seq: &SequenceSettings, frame: &GridFrame, x: f64, y: f64) -> (f64, f64) {
    let ox = x - frame.center_x;
    let oy = y - frame.center_y;

    let (projection, t) = match seq.direction {
        SequenceDirection::Radial => {
            let dist = (ox * ox + oy * oy).sqrt();
            let max_dist = frame
                .corners
                .iter()
                .map(|&(cx, cy)| ((cx - frame.center_x).powi(2) + (cy - frame.center_y).powi(2)).sqrt())
                .fold(0.0f64, f64::max);
            let t = if max_dist > 0.0 { dist / max_dist } else { 0.0 };
            (dist, t)
        }
        dir => {
            let (ux, uy) = direction_vector(dir, seq.angle);
            let proj = ox * ux + oy * uy;
            let mut lo = f64::INFINITY;
            let mut hi = f64::NEG_INFINITY;
            for &(cx, cy) in &frame.corners {
                let p = (cx - frame.center_x) * ux + (cy - frame.center_y) * uy;
                lo = lo.min(p);
                hi = hi.max(p);
            }
            let range = hi - lo;
            let t = if range > 1e-9 { (proj - lo) / range } else { 0.0 };
            (proj, t)
        }
    };

    let t = t.clamp(0.0, 1.0);
    (projection, if seq.reverse { 1.0 - t } else { t })
}

/// Unit vector for a linear direction; `angle` in degrees.
fn direction_vector(direction: SequenceDirection, angle: f64) -> (f64, f64) {
    let offset = match direction {
        SequenceDirection::Column => 90.0,
        SequenceDirection::Diagonal => 45.0,
        _ => 0.0,
    };
    let rad = (angle + offset).to_radians();
    (rad.cos(), rad.sin())
}

fn mean_spacing(direction: SequenceDirection, frame: &GridFrame) -> f64 {
    match direction {
        SequenceDirection::Row => frame.spacing_x,
        SequenceDirection::Column => frame.spacing_y,
        SequenceDirection::Radial | SequenceDirection::Diagonal => (frame.spacing_x + frame.spacing_y) / 2.0,
    }
}
