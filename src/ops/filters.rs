// ============================================================================
// PREVIEW RASTERIZER: CPU rendition of a PreviewStyle's filter list
// ============================================================================
//
// Colour functions use the filter-effects colour matrices; blur is a
// rayon-parallel separable Gaussian. Transforms and drop shadows are not
// rasterized here (they need a compositor with room outside the layer).

use image::RgbaImage;
use rayon::prelude::*;

use super::preview::{FilterFn, PreviewStyle};

/// Apply every colour/blur filter in `style`, in order, then the opacity.
pub fn apply_preview_style(src: &RgbaImage, style: &PreviewStyle) -> RgbaImage {
    let mut img = src.clone();
    for filter in &style.filters {
        img = match filter {
            FilterFn::Blur(sigma) if *sigma > 0.0 => parallel_gaussian_blur(&img, *sigma as f32),
            FilterFn::Blur(_) | FilterFn::DropShadow { .. } => img,
            other => match color_matrix(other) {
                Some(m) => apply_per_pixel(&img, |r, g, b, a| {
                    (
                        m[0] * r + m[1] * g + m[2] * b,
                        m[3] * r + m[4] * g + m[5] * b,
                        m[6] * r + m[7] * g + m[8] * b,
                        a,
                    )
                }),
                None => apply_scalar_filter(&img, other),
            },
        };
    }
    if style.opacity < 1.0 {
        let o = style.opacity.clamp(0.0, 1.0) as f32;
        img = apply_per_pixel(&img, |r, g, b, a| (r, g, b, a * o));
    }
    img
}

/// 3×3 RGB matrix for matrix-expressible filters.
fn color_matrix(filter: &FilterFn) -> Option<[f32; 9]> {
    Some(match *filter {
        FilterFn::Grayscale(amount) => {
            let a = 1.0 - amount.clamp(0.0, 1.0) as f32;
            [
                0.2126 + 0.7874 * a, 0.7152 - 0.7152 * a, 0.0722 - 0.0722 * a,
                0.2126 - 0.2126 * a, 0.7152 + 0.2848 * a, 0.0722 - 0.0722 * a,
                0.2126 - 0.2126 * a, 0.7152 - 0.7152 * a, 0.0722 + 0.9278 * a,
            ]
        }
        FilterFn::Sepia(amount) => {
            let a = 1.0 - amount.clamp(0.0, 1.0) as f32;
            [
                0.393 + 0.607 * a, 0.769 - 0.769 * a, 0.189 - 0.189 * a,
                0.349 - 0.349 * a, 0.686 + 0.314 * a, 0.168 - 0.168 * a,
                0.272 - 0.272 * a, 0.534 - 0.534 * a, 0.131 + 0.869 * a,
            ]
        }
        FilterFn::Saturate(s) => {
            let s = s.max(0.0) as f32;
            [
                0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s,
                0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s,
                0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s,
            ]
        }
        FilterFn::HueRotate(deg) => {
            let (sin, cos) = (deg.to_radians() as f32).sin_cos();
            [
                0.213 + cos * 0.787 - sin * 0.213,
                0.715 - cos * 0.715 - sin * 0.715,
                0.072 - cos * 0.072 + sin * 0.928,
                0.213 - cos * 0.213 + sin * 0.143,
                0.715 + cos * 0.285 + sin * 0.140,
                0.072 - cos * 0.072 - sin * 0.283,
                0.213 - cos * 0.213 - sin * 0.787,
                0.715 - cos * 0.715 + sin * 0.715,
                0.072 + cos * 0.928 + sin * 0.072,
            ]
        }
        _ => return None,
    })
}

fn apply_scalar_filter(img: &RgbaImage, filter: &FilterFn) -> RgbaImage {
    match *filter {
        FilterFn::Brightness(b) => {
            let b = b.max(0.0) as f32;
            apply_per_pixel(img, |r, g, bl, a| (r * b, g * b, bl * b, a))
        }
        FilterFn::Contrast(c) => {
            let c = c.max(0.0) as f32;
            let f = |v: f32| (v - 127.5) * c + 127.5;
            apply_per_pixel(img, |r, g, b, a| (f(r), f(g), f(b), a))
        }
        FilterFn::Invert(amount) => {
            let t = amount.clamp(0.0, 1.0) as f32;
            let f = |v: f32| v * (1.0 - t) + (255.0 - v) * t;
            apply_per_pixel(img, |r, g, b, a| (f(r), f(g), f(b), a))
        }
        FilterFn::Opacity(o) => {
            let o = o.clamp(0.0, 1.0) as f32;
            apply_per_pixel(img, |r, g, b, a| (r, g, b, a * o))
        }
        _ => img.clone(),
    }
}

// ---------------------------------------------------------------------------
//  Shared helpers
// ---------------------------------------------------------------------------

/// Per-pixel transform over `f32` channels (0–255), parallel by row.
fn apply_per_pixel<F>(flat: &RgbaImage, transform: F) -> RgbaImage
where
    F: Fn(f32, f32, f32, f32) -> (f32, f32, f32, f32) + Sync,
{
    let (w, h) = flat.dimensions();
    if w == 0 || h == 0 {
        return flat.clone();
    }
    let stride = w as usize * 4;
    let src_raw = flat.as_raw();
    let mut dst = RgbaImage::new(w, h);

    dst.as_mut().par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
        let row_in = &src_raw[y * stride..(y + 1) * stride];
        for (px_in, px_out) in row_in.chunks_exact(4).zip(row_out.chunks_exact_mut(4)) {
            let (r, g, b, a) = transform(px_in[0] as f32, px_in[1] as f32, px_in[2] as f32, px_in[3] as f32);
            px_out[0] = r.round().clamp(0.0, 255.0) as u8;
            px_out[1] = g.round().clamp(0.0, 255.0) as u8;
            px_out[2] = b.round().clamp(0.0, 255.0) as u8;
            px_out[3] = a.round().clamp(0.0, 255.0) as u8;
        }
    });
    dst
}

/// Build a 1-D Gaussian kernel truncated at ceil(3*sigma), capped at `max_radius`.
fn build_gaussian_kernel(sigma: f32, max_radius: usize) -> Vec<f32> {
    let radius = ((sigma * 3.0).ceil() as usize).min(max_radius);
    if radius == 0 {
        return vec![1.0];
    }
    let len = radius * 2 + 1;
    let s2 = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (0..len)
        .map(|i| {
            let x = i as f32 - radius as f32;
            (-x * x / s2).exp()
        })
        .collect();
    let inv = 1.0 / kernel.iter().sum::<f32>();
    for v in &mut kernel {
        *v *= inv;
    }
    kernel
}

/// Rayon-parallel separable Gaussian blur with clamped edges.
pub fn parallel_gaussian_blur(src: &RgbaImage, sigma: f32) -> RgbaImage {
    let w = src.width() as usize;
    let h = src.height() as usize;
    if w == 0 || h == 0 {
        return src.clone();
    }

    // Taps beyond the longest side only re-sample clamped edge pixels.
    let kernel = build_gaussian_kernel(sigma, w.max(h));
    let radius = kernel.len() / 2;
    let buf_in: Vec<f32> = src.as_raw().iter().map(|&b| b as f32).collect();
    let pixel_count = w * h * 4;

    // --- Horizontal pass (parallel by row) ---
    let mut buf_h = vec![0.0f32; pixel_count];
    buf_h.par_chunks_mut(w * 4).enumerate().for_each(|(y, row_out)| {
        let row_in_start = y * w * 4;
        for x in 0..w {
            let mut acc = [0.0f32; 4];
            for (ki, &kv) in kernel.iter().enumerate() {
                let sx = (x as isize + ki as isize - radius as isize).clamp(0, w as isize - 1) as usize;
                let idx = row_in_start + sx * 4;
                for c in 0..4 {
                    acc[c] += buf_in[idx + c] * kv;
                }
            }
            row_out[x * 4..x * 4 + 4].copy_from_slice(&acc);
        }
    });

    // --- Vertical pass (parallel by row) ---
    let mut dst = RgbaImage::new(w as u32, h as u32);
    dst.as_mut().par_chunks_mut(w * 4).enumerate().for_each(|(y, row_out)| {
        for x in 0..w {
            let mut acc = [0.0f32; 4];
            for (ki, &kv) in kernel.iter().enumerate() {
                let sy = (y as isize + ki as isize - radius as isize).clamp(0, h as isize - 1) as usize;
                let idx = sy * w * 4 + x * 4;
                for c in 0..4 {
                    acc[c] += buf_h[idx + c] * kv;
                }
            }
            for c in 0..4 {
                row_out[x * 4 + c] = acc[c].round().clamp(0.0, 255.0) as u8;
            }
        }
    });
    dst
}
