// ============================================================================
// SVG EMISSION: cell geometry and document wrapper
// ============================================================================

use std::fmt::Write as _;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use super::state::{CornerRadius, ShapeKind};
use crate::math::{Color, fmt_num};

/// Fully resolved appearance of one cell.
#[derive(Clone, Debug, PartialEq)]
pub struct CellGeometry {
    pub x: f64,
    pub y: f64,
    /// Degrees.
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub width: f64,
    pub height: f64,
    pub radius: CornerRadius,
    pub fill: Color,
    pub opacity: f64,
    pub stroke: Color,
    pub stroke_width: f64,
}

/// Why a cell's geometry was left out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    UnknownShape,
    MissingPathData,
}

pub(super) fn open_document(out: &mut String, width: f64, height: f64, background: Color) {
    let w = fmt_num(width);
    let h = fmt_num(height);
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    );
    let _ = write!(out, r#"<rect width="100%" height="100%" fill="{}"/>"#, background.to_css());
}

pub(super) fn close_document(out: &mut String) {
    out.push_str("</svg>");
}

/// Emit one `<g class="cell">`. Geometry is centred on the group origin;
/// when the shape cannot be drawn the group is emitted empty.
pub(super) fn write_cell(
    out: &mut String,
    cell: &CellGeometry,
    shape: ShapeKind,
    path_data: Option<&str>,
) -> Option<SkipReason> {
    let _ = write!(
        out,
        r#"<g class="cell" transform="translate({} {}) rotate({}) scale({} {})">"#,
        fmt_num(cell.x),
        fmt_num(cell.y),
        fmt_num(cell.rotation),
        fmt_num(cell.scale_x),
        fmt_num(cell.scale_y),
    );

    let paint = paint_attrs(cell);
    let hw = cell.width / 2.0;
    let hh = cell.height / 2.0;

    let skipped = match shape {
        ShapeKind::Rect => {
            match cell.radius {
                CornerRadius::Uniform(r) => {
                    let r = r.clamp(0.0, hw.min(hh).max(0.0));
                    let _ = write!(
                        out,
                        r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{}" {paint}/>"#,
                        fmt_num(-hw),
                        fmt_num(-hh),
                        fmt_num(cell.width),
                        fmt_num(cell.height),
                        fmt_num(r),
                    );
                }
                CornerRadius::Corners(c) => {
                    let _ = write!(out, r#"<path d="{}" {paint}/>"#, rounded_rect_path(hw, hh, c));
                }
            }
            None
        }
        ShapeKind::Circle => {
            let _ = write!(
                out,
                r#"<circle cx="0" cy="0" r="{}" {paint}/>"#,
                fmt_num(hw.min(hh).max(0.0))
            );
            None
        }
        ShapeKind::Triangle => {
            let _ = write!(
                out,
                r#"<polygon points="0,{} {},{} {},{}" {paint}/>"#,
                fmt_num(-hh),
                fmt_num(hw),
                fmt_num(hh),
                fmt_num(-hw),
                fmt_num(hh),
            );
            None
        }
        ShapeKind::Custom => match path_data.map(str::trim).filter(|d| !d.is_empty()) {
            Some(d) => {
                let _ = write!(out, r#"<path d="{}" {paint}/>"#, escape_attr(d));
                None
            }
            None => Some(SkipReason::MissingPathData),
        },
        ShapeKind::Unknown => Some(SkipReason::UnknownShape),
    };

    out.push_str("</g>");
    skipped
}

fn paint_attrs(cell: &CellGeometry) -> String {
    let mut attrs = format!(
        r#"fill="{}" fill-opacity="{}""#,
        cell.fill.to_css(),
        fmt_num(cell.opacity.clamp(0.0, 1.0))
    );
    if cell.stroke_width > 0.0 {
        let _ = write!(
            attrs,
            r#" stroke="{}" stroke-width="{}""#,
            cell.stroke.to_css(),
            fmt_num(cell.stroke_width)
        );
    }
    attrs
}

/// Rect path with independent corner radii (tl, tr, br, bl), each clamped to
/// half the shorter side.
fn rounded_rect_path(hw: f64, hh: f64, radii: [f64; 4]) -> String {
    let limit = hw.min(hh).max(0.0);
    let [tl, tr, br, bl] = radii.map(|r| r.clamp(0.0, limit));
    let n = fmt_num;
    format!(
        "M{},{} H{} A{},{} 0 0 1 {},{} V{} A{},{} 0 0 1 {},{} H{} A{},{} 0 0 1 {},{} V{} A{},{} 0 0 1 {},{} Z",
        n(-hw + tl), n(-hh),
        n(hw - tr),
        n(tr), n(tr), n(hw), n(-hh + tr),
        n(hh - br),
        n(br), n(br), n(hw - br), n(hh),
        n(-hw + bl),
        n(bl), n(bl), n(-hw), n(hh - bl),
        n(-hh + tl),
        n(tl), n(tl), n(-hw + tl), n(-hh),
    )
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;").replace('"', "&quot;").replace('<', "&lt;")
}

/// Encode an SVG document as a `data:` URI usable as an image source.
pub fn to_data_uri(svg: &str) -> String {
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell() -> CellGeometry {
        CellGeometry {
            x: 10.0,
            y: 20.0,
            rotation: 45.0,
            scale_x: 1.0,
            scale_y: 1.0,
            width: 10.0,
            height: 6.0,
            radius: CornerRadius::Uniform(2.0),
            fill: Color::rgb(1, 2, 3),
            opacity: 0.5,
            stroke: Color::BLACK,
            stroke_width: 0.0,
        }
    }

    #[test]
    fn rect_cell_markup() {
        let mut out = String::new();
        assert_eq!(write_cell(&mut out, &cell(), ShapeKind::Rect, None), None);
        assert_eq!(
            out,
            r#"<g class="cell" transform="translate(10 20) rotate(45) scale(1 1)"><rect x="-5" y="-3" width="10" height="6" rx="2" fill="rgb(1,2,3)" fill-opacity="0.5"/></g>"#
        );
    }

    #[test]
    fn stroke_only_emitted_when_positive() {
        let mut c = cell();
        c.stroke_width = 1.5;
        let mut out = String::new();
        write_cell(&mut out, &c, ShapeKind::Circle, None);
        assert!(out.contains(r#"<circle cx="0" cy="0" r="3""#));
        assert!(out.contains(r#"stroke="rgb(0,0,0)" stroke-width="1.5""#));
    }

    #[test]
    fn unknown_and_empty_custom_shapes_are_reported() {
        let mut out = String::new();
        assert_eq!(write_cell(&mut out, &cell(), ShapeKind::Unknown, None), Some(SkipReason::UnknownShape));
        assert_eq!(
            write_cell(&mut out, &cell(), ShapeKind::Custom, Some("  ")),
            Some(SkipReason::MissingPathData)
        );
        assert_eq!(out.matches("<g ").count(), 2);
        assert!(!out.contains("<path"));
    }

    #[test]
    fn per_corner_radius_emits_path() {
        let mut c = cell();
        c.radius = CornerRadius::Corners([1.0, 0.0, 2.0, 0.0]);
        let mut out = String::new();
        write_cell(&mut out, &c, ShapeKind::Rect, None);
        assert!(out.contains("<path d=\"M-4,-3"));
    }

    #[test]
    fn data_uri_prefix() {
        assert!(to_data_uri("<svg/>").starts_with("data:image/svg+xml;base64,"));
    }
}
