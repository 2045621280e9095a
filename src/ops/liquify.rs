// ============================================================================
// LIQUIFY: deformable vertex mesh with per-triangle affine re-texturing
// ============================================================================
//
// The mesh is a flat arena of `(N+1)²` vertices addressed by `(row, col)`.
// Brush dabs move the live positions; rendering splits every cell into two
// triangles and draws the source through the affine map taking each
// triangle's original corners onto its deformed corners.

use std::f64::consts::PI;
use std::str::FromStr;

use image::RgbaImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::math::hash_unit;
use crate::modifier::{Modifier, ModifierType};

/// Default mesh resolution (cells per side).
pub const DEFAULT_RESOLUTION: usize = 20;

/// Triangles whose original-space determinant is below this are skipped.
const DEGENERATE_EPSILON: f64 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrushMode {
    #[default]
    Push,
    Pull,
    Twirl,
    Bloat,
    Pinch,
}

impl BrushMode {
    pub fn all() -> &'static [BrushMode] {
        &[
            BrushMode::Push,
            BrushMode::Pull,
            BrushMode::Twirl,
            BrushMode::Bloat,
            BrushMode::Pinch,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            BrushMode::Push => "push",
            BrushMode::Pull => "pull",
            BrushMode::Twirl => "twirl",
            BrushMode::Bloat => "bloat",
            BrushMode::Pinch => "pinch",
        }
    }
}

impl FromStr for BrushMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BrushMode::all()
            .iter()
            .copied()
            .find(|m| m.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown brush mode '{}' (expected push, pull, twirl, bloat or pinch)", s))
    }
}

/// One mesh vertex: live position plus the immutable reference position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshVertex {
    pub x: f64,
    pub y: f64,
    pub original_x: f64,
    pub original_y: f64,
}

impl MeshVertex {
    fn at(x: f64, y: f64) -> Self {
        Self { x, y, original_x: x, original_y: y }
    }
}

/// Vertex arena for a `resolution × resolution` cell grid.
#[derive(Clone, Debug, PartialEq)]
pub struct LiquifyMesh {
    resolution: usize,
    vertices: Vec<MeshVertex>,
}

impl LiquifyMesh {
    /// Uniform grid spanning `width × height`.
    pub fn uniform(resolution: usize, width: f64, height: f64) -> Self {
        let resolution = resolution.max(1);
        let side = resolution + 1;
        let mut vertices = Vec::with_capacity(side * side);
        for row in 0..side {
            for col in 0..side {
                vertices.push(MeshVertex::at(
                    col as f64 / resolution as f64 * width,
                    row as f64 / resolution as f64 * height,
                ));
            }
        }
        Self { resolution, vertices }
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * (self.resolution + 1) + col
    }

    pub fn vertex(&self, row: usize, col: usize) -> &MeshVertex {
        &self.vertices[self.index(row, col)]
    }

    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }

    /// Two triangles per cell, as vertex index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        (0..self.resolution).flat_map(move |row| {
            (0..self.resolution).flat_map(move |col| {
                let tl = self.index(row, col);
                let tr = self.index(row, col + 1);
                let bl = self.index(row + 1, col);
                let br = self.index(row + 1, col + 1);
                [[tl, tr, bl], [tr, br, bl]]
            })
        })
    }

    /// Displace every vertex within `brush_size / 2` of `(cx, cy)`.
    pub fn apply_brush(&mut self, cx: f64, cy: f64, brush_size: f64, pressure: f64, mode: BrushMode) {
        let radius = brush_size / 2.0;
        if radius <= 0.0 {
            return;
        }
        for v in &mut self.vertices {
            let dx = v.x - cx;
            let dy = v.y - cy;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist >= radius {
                continue;
            }
            let falloff = 1.0 - dist / radius;
            let influence = falloff * falloff * pressure;
            match mode {
                BrushMode::Push => {
                    v.x += dx * influence * 0.1;
                    v.y += dy * influence * 0.1;
                }
                BrushMode::Pull => {
                    v.x -= dx * influence * 0.1;
                    v.y -= dy * influence * 0.1;
                }
                BrushMode::Twirl => {
                    let angle = influence * PI * 0.2;
                    let (sin, cos) = angle.sin_cos();
                    v.x = cx + dx * cos - dy * sin;
                    v.y = cy + dx * sin + dy * cos;
                }
                BrushMode::Bloat => {
                    v.x += dx * influence * 0.15;
                    v.y += dy * influence * 0.15;
                }
                BrushMode::Pinch => {
                    v.x -= dx * influence * 0.15;
                    v.y -= dy * influence * 0.15;
                }
            }
        }
    }

    pub fn reset(&mut self) {
        for v in &mut self.vertices {
            v.x = v.original_x;
            v.y = v.original_y;
        }
    }
}

/// Counters from the most recent rasterization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub triangles_drawn: usize,
    pub degenerate_skipped: usize,
}

/// Caller-owned liquify renderer bound to one source image at a time.
#[derive(Debug)]
pub struct LiquifyRenderer {
    resolution: usize,
    source: Option<RgbaImage>,
    mesh: Option<LiquifyMesh>,
    canvas: RgbaImage,
    stats: RenderStats,
}

impl Default for LiquifyRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_RESOLUTION)
    }
}

impl LiquifyRenderer {
    pub fn new(resolution: usize) -> Self {
        Self {
            resolution: resolution.max(1),
            source: None,
            mesh: None,
            canvas: RgbaImage::new(0, 0),
            stats: RenderStats::default(),
        }
    }

    /// Bind a new source image. The mesh is rebuilt and the canvas becomes a
    /// plain copy of the source.
    pub fn set_source_image(&mut self, img: RgbaImage) {
        let (w, h) = img.dimensions();
        self.mesh = Some(LiquifyMesh::uniform(self.resolution, w as f64, h as f64));
        self.canvas = img.clone();
        self.source = Some(img);
        self.stats = RenderStats::default();
    }

    /// Deform the mesh around `center` and re-render the whole mesh.
    /// Without a source image this is a no-op returning the empty canvas.
    pub fn apply_brush(&mut self, center: (f64, f64), brush_size: f64, pressure: f64, mode: BrushMode) -> &RgbaImage {
        if let Some(mesh) = self.mesh.as_mut() {
            mesh.apply_brush(center.0, center.1, brush_size, pressure, mode);
            self.rerender();
        }
        &self.canvas
    }

    /// Restore every vertex to its original position and re-render.
    pub fn reset(&mut self) -> &RgbaImage {
        if let Some(mesh) = self.mesh.as_mut() {
            mesh.reset();
            self.rerender();
        }
        &self.canvas
    }

    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    pub fn into_canvas(self) -> RgbaImage {
        self.canvas
    }

    pub fn mesh(&self) -> Option<&LiquifyMesh> {
        self.mesh.as_ref()
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    pub fn last_stats(&self) -> RenderStats {
        self.stats
    }

    fn rerender(&mut self) {
        if let (Some(src), Some(mesh)) = (self.source.as_ref(), self.mesh.as_ref()) {
            let (canvas, stats) = rasterize_mesh(src, mesh);
            if stats.degenerate_skipped > 0 {
                crate::log_info!("liquify: skipped {} degenerate triangles", stats.degenerate_skipped);
            }
            self.canvas = canvas;
            self.stats = stats;
        }
    }
}

// ---------------------------------------------------------------------------
//  Rasterization
// ---------------------------------------------------------------------------

/// Inverse (deformed → original) affine map plus the deformed triangle's
/// edge data for point-in-triangle tests.
struct PreparedTriangle {
    /// `[a, b, c, d, e, f]`: `sx = a·x + c·y + e`, `sy = b·x + d·y + f`.
    inverse: [f64; 6],
    p: [(f64, f64); 3],
    area_sign: f64,
    min_y: f64,
    max_y: f64,
    min_x: f64,
    max_x: f64,
}

/// Solve the affine map taking `src` triangle corners onto `dst` corners.
/// Returns `None` when the source triangle is (near-)degenerate.
pub fn solve_affine(src: [(f64, f64); 3], dst: [(f64, f64); 3]) -> Option<[f64; 6]> {
    let [(x0, y0), (x1, y1), (x2, y2)] = src;
    let [(u0, v0), (u1, v1), (u2, v2)] = dst;

    let det = (x1 - x0) * (y2 - y0) - (x2 - x0) * (y1 - y0);
    if det.abs() < DEGENERATE_EPSILON {
        return None;
    }
    let inv = 1.0 / det;

    // Linear part from the two edge vectors, then translation from corner 0.
    let a = ((u1 - u0) * (y2 - y0) - (u2 - u0) * (y1 - y0)) * inv;
    let c = ((u2 - u0) * (x1 - x0) - (u1 - u0) * (x2 - x0)) * inv;
    let b = ((v1 - v0) * (y2 - y0) - (v2 - v0) * (y1 - y0)) * inv;
    let d = ((v2 - v0) * (x1 - x0) - (v1 - v0) * (x2 - x0)) * inv;
    let e = u0 - a * x0 - c * y0;
    let f = v0 - b * x0 - d * y0;
    Some([a, b, c, d, e, f])
}

fn invert_affine(m: [f64; 6]) -> Option<[f64; 6]> {
    let [a, b, c, d, e, f] = m;
    let det = a * d - b * c;
    if det.abs() < DEGENERATE_EPSILON {
        return None;
    }
    let inv = 1.0 / det;
    let ia = d * inv;
    let ib = -b * inv;
    let ic = -c * inv;
    let id = a * inv;
    Some([ia, ib, ic, id, -(ia * e + ic * f), -(ib * e + id * f)])
}

fn prepare_triangles(mesh: &LiquifyMesh) -> (Vec<PreparedTriangle>, RenderStats) {
    let verts = mesh.vertices();
    let mut stats = RenderStats::default();
    let mut prepared = Vec::with_capacity(mesh.resolution() * mesh.resolution() * 2);

    for tri in mesh.triangles() {
        let original = tri.map(|i| (verts[i].original_x, verts[i].original_y));
        let deformed = tri.map(|i| (verts[i].x, verts[i].y));

        let Some(inverse) = solve_affine(original, deformed).and_then(invert_affine) else {
            stats.degenerate_skipped += 1;
            continue;
        };

        let [(x0, y0), (x1, y1), (x2, y2)] = deformed;
        let area = (x1 - x0) * (y2 - y0) - (x2 - x0) * (y1 - y0);
        prepared.push(PreparedTriangle {
            inverse,
            p: deformed,
            area_sign: area.signum(),
            min_y: y0.min(y1).min(y2),
            max_y: y0.max(y1).max(y2),
            min_x: x0.min(x1).min(x2),
            max_x: x0.max(x1).max(x2),
        });
        stats.triangles_drawn += 1;
    }
    (prepared, stats)
}

impl PreparedTriangle {
    /// Inclusive containment test; shared edges belong to both triangles and
    /// the later triangle wins.
    #[inline]
    fn contains(&self, px: f64, py: f64) -> bool {
        const EDGE_EPS: f64 = 1e-9;
        let [(x0, y0), (x1, y1), (x2, y2)] = self.p;
        let e0 = ((x1 - x0) * (py - y0) - (y1 - y0) * (px - x0)) * self.area_sign;
        let e1 = ((x2 - x1) * (py - y1) - (y2 - y1) * (px - x1)) * self.area_sign;
        let e2 = ((x0 - x2) * (py - y2) - (y0 - y2) * (px - x2)) * self.area_sign;
        e0 >= -EDGE_EPS && e1 >= -EDGE_EPS && e2 >= -EDGE_EPS
    }
}

/// Render the full mesh into a fresh canvas the size of `src`.
pub fn rasterize_mesh(src: &RgbaImage, mesh: &LiquifyMesh) -> (RgbaImage, RenderStats) {
    let (w, h) = src.dimensions();
    let mut dst = RgbaImage::new(w, h);
    if w == 0 || h == 0 {
        return (dst, RenderStats::default());
    }
    let (triangles, stats) = prepare_triangles(mesh);

    let row_bytes = w as usize * 4;
    let src_w = w as i32;
    let src_h = h as i32;
    let src_raw = src.as_raw();
    let src_stride = row_bytes;

    dst.as_mut().par_chunks_mut(row_bytes).enumerate().for_each(|(y, row)| {
        let py = y as f64 + 0.5;
        for tri in triangles.iter().filter(|t| py >= t.min_y && py <= t.max_y) {
            let x_start = (tri.min_x - 0.5).floor().max(0.0) as u32;
            let x_end = ((tri.max_x - 0.5).ceil().max(0.0) as u32).min(w - 1);
            for x in x_start..=x_end {
                let px = x as f64 + 0.5;
                if !tri.contains(px, py) {
                    continue;
                }
                let [a, b, c, d, e, f] = tri.inverse;
                // Back to pixel-index space for sampling.
                let sx = (a * px + c * py + e - 0.5) as f32;
                let sy = (b * px + d * py + f - 0.5) as f32;

                let x0 = sx.floor() as i32;
                let y0 = sy.floor() as i32;
                if x0 < -1 || y0 < -1 || x0 >= src_w || y0 >= src_h {
                    continue;
                }
                let fx = sx - x0 as f32;
                let fy = sy - y0 as f32;

                let sample = |sx: i32, sy: i32| -> [f32; 4] {
                    // Clamp to the edge so border pixels are not darkened.
                    let sx = sx.clamp(0, src_w - 1);
                    let sy = sy.clamp(0, src_h - 1);
                    let idx = sy as usize * src_stride + sx as usize * 4;
                    [
                        src_raw[idx] as f32,
                        src_raw[idx + 1] as f32,
                        src_raw[idx + 2] as f32,
                        src_raw[idx + 3] as f32,
                    ]
                };

                let tl = sample(x0, y0);
                let tr = sample(x0 + 1, y0);
                let bl = sample(x0, y0 + 1);
                let br = sample(x0 + 1, y0 + 1);

                let col = x as usize * 4;
                for ch in 0..4 {
                    let top = tl[ch] + (tr[ch] - tl[ch]) * fx;
                    let bot = bl[ch] + (br[ch] - bl[ch]) * fx;
                    row[col + ch] = (top + (bot - top) * fy).round().clamp(0.0, 255.0) as u8;
                }
            }
        }
    });

    (dst, stats)
}

// ---------------------------------------------------------------------------
//  Non-interactive application
// ---------------------------------------------------------------------------

/// Parameters for applying liquify as a modifier (no pointer input).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LiquifyParams {
    pub brush_size: f64,
    pub pressure: f64,
    pub mode: BrushMode,
    pub num_points: u32,
    /// Seed for the dab centres; equal seeds give identical output.
    pub seed: u32,
    pub resolution: usize,
}

impl Default for LiquifyParams {
    fn default() -> Self {
        Self {
            brush_size: 100.0,
            pressure: 0.5,
            mode: BrushMode::Push,
            num_points: 5,
            seed: 0,
            resolution: DEFAULT_RESOLUTION,
        }
    }
}

impl LiquifyParams {
    /// Read the brush settings of a liquify modifier. Returns `None` for any
    /// other kind. Unknown modes fall back to push.
    pub fn from_modifier(modifier: &Modifier) -> Option<Self> {
        if modifier.kind != ModifierType::Liquify {
            return None;
        }
        let defaults = Self::default();
        let mode = modifier.text("mode", defaults.mode.label());
        let mode = mode.parse().unwrap_or_else(|e| {
            crate::log_warn!("liquify modifier {}: {}", modifier.id, e);
            BrushMode::Push
        });
        Some(Self {
            brush_size: modifier.number("brushSize", defaults.brush_size).max(0.0),
            pressure: modifier.number("pressure", defaults.pressure).clamp(0.0, 1.0),
            mode,
            num_points: modifier.number("points", defaults.num_points as f64).clamp(0.0, 10_000.0) as u32,
            seed: modifier.number("seed", defaults.seed as f64).clamp(0.0, u32::MAX as f64) as u32,
            resolution: defaults.resolution,
        })
    }
}

/// Dab centres for [`render_liquify_effect`], drawn from the seeded hash.
pub fn dab_centers(width: u32, height: u32, count: u32, seed: u32) -> Vec<(f64, f64)> {
    (0..count)
        .map(|i| {
            (
                hash_unit(i, 0, seed) * width as f64,
                hash_unit(i, 1, seed) * height as f64,
            )
        })
        .collect()
}

/// Apply `num_points` brush dabs at seeded pseudo-random centres.
pub fn render_liquify_effect(image: &RgbaImage, params: &LiquifyParams) -> RgbaImage {
    let mut renderer = LiquifyRenderer::new(params.resolution);
    let (w, h) = image.dimensions();
    renderer.set_source_image(image.clone());
    for center in dab_centers(w, h, params.num_points, params.seed) {
        renderer.apply_brush(center, params.brush_size, params.pressure, params.mode);
    }
    renderer.into_canvas()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn checker(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            if (x / 4 + y / 4) % 2 == 0 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([20, 40, 60, 255])
            }
        })
    }

    #[test]
    fn mesh_has_resolution_plus_one_squared_vertices() {
        let mesh = LiquifyMesh::uniform(20, 100.0, 50.0);
        assert_eq!(mesh.vertices().len(), 21 * 21);
        assert_eq!(mesh.triangles().count(), 20 * 20 * 2);
        let corner = mesh.vertex(20, 20);
        assert_eq!((corner.x, corner.y), (100.0, 50.0));
    }

    #[test]
    fn identity_render_copies_source() {
        let src = checker(32, 24);
        let mesh = LiquifyMesh::uniform(4, 32.0, 24.0);
        let (out, stats) = rasterize_mesh(&src, &mesh);
        assert_eq!(out, src);
        assert_eq!(stats.triangles_drawn, 32);
        assert_eq!(stats.degenerate_skipped, 0);
    }

    #[test]
    fn push_moves_vertices_away_from_centre() {
        let mut mesh = LiquifyMesh::uniform(4, 40.0, 40.0);
        mesh.apply_brush(20.0, 20.0, 30.0, 1.0, BrushMode::Push);
        // (row 2, col 3) sits at (30, 20): d = 10, r = 15, influence = (1/3)²
        let v = mesh.vertex(2, 3);
        let expected = 30.0 + 10.0 * (1.0 / 9.0) * 0.1;
        assert!((v.x - expected).abs() < 1e-9);
        assert_eq!(v.y, 20.0);
        // Centre vertex has zero offset vector and stays put.
        assert_eq!(mesh.vertex(2, 2).x, 20.0);
        // Outside the radius nothing moves.
        assert_eq!(mesh.vertex(0, 0).x, 0.0);
    }

    #[test]
    fn pinch_and_bloat_are_opposites() {
        let mut a = LiquifyMesh::uniform(4, 40.0, 40.0);
        let mut b = a.clone();
        a.apply_brush(20.0, 20.0, 30.0, 0.8, BrushMode::Bloat);
        b.apply_brush(20.0, 20.0, 30.0, 0.8, BrushMode::Pinch);
        let va = a.vertex(2, 3);
        let vb = b.vertex(2, 3);
        assert!(((va.x - 30.0) + (vb.x - 30.0)).abs() < 1e-9);
    }

    #[test]
    fn twirl_preserves_distance_from_centre() {
        let mut mesh = LiquifyMesh::uniform(4, 40.0, 40.0);
        mesh.apply_brush(20.0, 20.0, 30.0, 1.0, BrushMode::Twirl);
        let v = mesh.vertex(2, 3);
        let d = ((v.x - 20.0).powi(2) + (v.y - 20.0).powi(2)).sqrt();
        assert!((d - 10.0).abs() < 1e-9);
        assert!(v.y > 20.0);
    }

    #[test]
    fn reset_restores_original_positions() {
        let mut r = LiquifyRenderer::new(8);
        r.set_source_image(checker(32, 32));
        r.apply_brush((16.0, 16.0), 20.0, 1.0, BrushMode::Twirl);
        r.apply_brush((10.0, 12.0), 16.0, 0.7, BrushMode::Bloat);
        r.reset();
        for v in r.mesh().unwrap().vertices() {
            assert!((v.x - v.original_x).abs() < 1e-9);
            assert!((v.y - v.original_y).abs() < 1e-9);
        }
        assert_eq!(r.canvas(), &checker(32, 32));
    }

    #[test]
    fn brush_without_source_is_noop() {
        let mut r = LiquifyRenderer::default();
        let out = r.apply_brush((5.0, 5.0), 10.0, 1.0, BrushMode::Push);
        assert_eq!(out.dimensions(), (0, 0));
        assert_eq!(r.reset().dimensions(), (0, 0));
        assert!(r.mesh().is_none());
    }

    #[test]
    fn degenerate_triangles_are_counted() {
        assert!(solve_affine([(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)], [(0.0, 0.0); 3]).is_none());
        let mut mesh = LiquifyMesh::uniform(1, 10.0, 10.0);
        // Collapse the deformed mesh onto a line.
        for v in mesh.vertices.iter_mut() {
            v.y = 0.0;
        }
        let (_, stats) = rasterize_mesh(&checker(10, 10), &mesh);
        assert_eq!(stats.triangles_drawn, 0);
        assert_eq!(stats.degenerate_skipped, 2);
    }

    #[test]
    fn affine_solve_maps_corners() {
        let src = [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)];
        let dst = [(5.0, 5.0), (25.0, 5.0), (5.0, 15.0)];
        let [a, b, c, d, e, f] = solve_affine(src, dst).unwrap();
        for (s, t) in src.iter().zip(dst.iter()) {
            assert!((a * s.0 + c * s.1 + e - t.0).abs() < 1e-9);
            assert!((b * s.0 + d * s.1 + f - t.1).abs() < 1e-9);
        }
    }

    #[test]
    fn seeded_effect_is_deterministic() {
        let src = checker(48, 48);
        let params = LiquifyParams {
            brush_size: 30.0,
            mode: BrushMode::Twirl,
            seed: 11,
            ..Default::default()
        };
        let a = render_liquify_effect(&src, &params);
        assert_eq!(a, render_liquify_effect(&src, &params));
        assert_eq!(a.dimensions(), (48, 48));
        assert_ne!(a, src);
    }

    #[test]
    fn params_read_from_liquify_modifier() {
        let m = Modifier::new(ModifierType::Liquify)
            .with_param("mode", "Twirl")
            .with_param("brushSize", 40.0)
            .with_param("pressure", 3.0)
            .with_param("seed", 9.0);
        let params = LiquifyParams::from_modifier(&m).unwrap();
        assert_eq!(params.mode, BrushMode::Twirl);
        assert_eq!(params.brush_size, 40.0);
        assert_eq!(params.pressure, 1.0);
        assert_eq!(params.num_points, 5);
        assert_eq!(params.seed, 9);

        let odd = Modifier::new(ModifierType::Liquify).with_param("mode", "smudge");
        assert_eq!(LiquifyParams::from_modifier(&odd).unwrap().mode, BrushMode::Push);
        assert!(LiquifyParams::from_modifier(&Modifier::new(ModifierType::Blur)).is_none());

        let img = checker(32, 32);
        let defaults = LiquifyParams::from_modifier(&Modifier::new(ModifierType::Liquify)).unwrap();
        assert_eq!(render_liquify_effect(&img, &defaults), render_liquify_effect(&img, &LiquifyParams::default()));
    }

    #[test]
    fn brush_mode_parses_case_insensitively() {
        assert_eq!("Twirl".parse::<BrushMode>(), Ok(BrushMode::Twirl));
        assert!("smudge".parse::<BrushMode>().is_err());
    }
}
