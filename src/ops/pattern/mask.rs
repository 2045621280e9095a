// ============================================================================
// MASK DATA: luminance source for per-cell parameter modulation
// ============================================================================

use image::RgbaImage;

use crate::math::{hash_u32, luminance};

/// An RGBA pixel buffer sampled by luminance.
#[derive(Clone, Debug, PartialEq)]
pub struct MaskData {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA8, length `width * height * 4`.
    pub pixels: Vec<u8>,
}

impl MaskData {
    /// Wrap a raw RGBA buffer. Returns `None` when the length does not match.
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if pixels.len() != width as usize * height as usize * 4 {
            return None;
        }
        Some(Self { width, height, pixels })
    }

    pub fn from_image(img: &RgbaImage) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
            pixels: img.as_raw().clone(),
        }
    }

    /// Luminance at integer pixel coordinates; `0.0` outside the buffer.
    pub fn luminance_at(&self, mx: i64, my: i64) -> f64 {
        if mx < 0 || my < 0 || mx >= self.width as i64 || my >= self.height as i64 {
            return 0.0;
        }
        let idx = (my as usize * self.width as usize + mx as usize) * 4;
        luminance(self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2])
    }

    /// Sample in canvas space: `(x, y)` within a `canvas_w × canvas_h` extent
    /// is scaled into mask pixel space and floored.
    pub fn sample(&self, x: f64, y: f64, canvas_w: f64, canvas_h: f64) -> f64 {
        if canvas_w <= 0.0 || canvas_h <= 0.0 {
            return 0.0;
        }
        let mx = (x / canvas_w * self.width as f64).floor();
        let my = (y / canvas_h * self.height as f64).floor();
        if !mx.is_finite() || !my.is_finite() {
            return 0.0;
        }
        self.luminance_at(mx as i64, my as i64)
    }

    /// Greyscale Perlin noise field. `scale` is the lattice frequency in
    /// cells per pixel.
    pub fn noise(width: u32, height: u32, scale: f64, seed: u32) -> Self {
        let perlin = Perlin::new(seed);
        let scale = if scale > 0.0 { scale } else { 0.01 };
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                let n = perlin.noise2(x as f64 * scale, y as f64 * scale);
                let v = ((n + 1.0) * 0.5 * 255.0).round().clamp(0.0, 255.0) as u8;
                pixels.extend_from_slice(&[v, v, v, 255]);
            }
        }
        Self { width, height, pixels }
    }
}

// ---------------------------------------------------------------------------
//  Perlin gradient noise
// ---------------------------------------------------------------------------

/// Classic 2-D Perlin noise over a seeded 256-entry permutation.
pub struct Perlin {
    perm: [u8; 512],
}

impl Perlin {
    pub fn new(seed: u32) -> Self {
        let mut p: [u8; 256] = std::array::from_fn(|i| i as u8);
        // Fisher–Yates driven by the crate hash.
        for i in (1..256usize).rev() {
            let j = hash_u32(seed.wrapping_add(i as u32).wrapping_mul(0x27d4_eb2d)) as usize % (i + 1);
            p.swap(i, j);
        }
        let mut perm = [0u8; 512];
        for i in 0..512 {
            perm[i] = p[i & 255];
        }
        Self { perm }
    }

    /// Noise value in roughly `[-1, 1]`.
    pub fn noise2(&self, x: f64, y: f64) -> f64 {
        let xi = (x.floor() as i64 & 255) as usize;
        let yi = (y.floor() as i64 & 255) as usize;
        let xf = x - x.floor();
        let yf = y - y.floor();
        let u = fade(xf);
        let v = fade(yf);

        let aa = self.perm[self.perm[xi] as usize + yi];
        let ab = self.perm[self.perm[xi] as usize + yi + 1];
        let ba = self.perm[self.perm[xi + 1] as usize + yi];
        let bb = self.perm[self.perm[xi + 1] as usize + yi + 1];

        let x1 = lerp(grad(aa, xf, yf), grad(ba, xf - 1.0, yf), u);
        let x2 = lerp(grad(ab, xf, yf - 1.0), grad(bb, xf - 1.0, yf - 1.0), u);
        lerp(x1, x2, v)
    }
}

#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

#[inline]
fn grad(hash: u8, x: f64, y: f64) -> f64 {
    match hash & 7 {
        0 => x + y,
        1 => -x + y,
        2 => x - y,
        3 => -x - y,
        4 => x,
        5 => -x,
        6 => y,
        _ => -y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_samples_are_zero() {
        let mask = MaskData::from_raw(1, 1, vec![255, 255, 255, 255]).unwrap();
        assert_eq!(mask.luminance_at(0, 0), 1.0);
        assert_eq!(mask.luminance_at(-1, 0), 0.0);
        assert_eq!(mask.luminance_at(1, 0), 0.0);
        assert_eq!(mask.sample(150.0, 10.0, 100.0, 100.0), 0.0);
    }

    #[test]
    fn sample_maps_canvas_to_mask_space() {
        // 2×1 mask: left black, right white.
        let mask = MaskData::from_raw(2, 1, vec![0, 0, 0, 255, 255, 255, 255, 255]).unwrap();
        assert_eq!(mask.sample(10.0, 5.0, 100.0, 10.0), 0.0);
        assert_eq!(mask.sample(60.0, 5.0, 100.0, 10.0), 1.0);
    }

    #[test]
    fn from_raw_rejects_wrong_length() {
        assert!(MaskData::from_raw(2, 2, vec![0; 15]).is_none());
    }

    #[test]
    fn noise_is_seeded_and_deterministic() {
        let a = MaskData::noise(16, 16, 0.2, 7);
        let b = MaskData::noise(16, 16, 0.2, 7);
        let c = MaskData::noise(16, 16, 0.2, 8);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn perlin_is_zero_on_lattice_points() {
        let p = Perlin::new(3);
        assert_eq!(p.noise2(4.0, 9.0), 0.0);
    }
}
