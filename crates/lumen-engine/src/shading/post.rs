//! Bright-pass, separable blur and composite math.

use glam::Vec3;

use crate::render::BlurSchedule;

/// Rec. 709 luminance weights.
pub const LUMINANCE_WEIGHTS: Vec3 = Vec3::new(0.2126, 0.7152, 0.0722);

/// One-sided 5-tap Gaussian kernel; tap 0 is the center, taps 1..4 apply on
/// both sides. The full 9-tap kernel sums to 1.
pub const GAUSSIAN_WEIGHTS: [f32; 5] = [0.227027, 0.194_594_6, 0.121_621_6, 0.054054, 0.016216];

/// Gamma of the display encoding applied after tone mapping.
pub const DISPLAY_GAMMA: f32 = 2.2;

pub fn luminance(color: Vec3) -> f32 {
    color.dot(LUMINANCE_WEIGHTS)
}

/// Hard threshold: the color passes unchanged when its luminance exceeds
/// `threshold`, otherwise the result is black.
pub fn bright_pass(color: Vec3, threshold: f32) -> Vec3 {
    if luminance(color) > threshold {
        color
    } else {
        Vec3::ZERO
    }
}

/// Exposure tone mapping, `1 - exp(-hdr * exposure)`.
pub fn tone_map(hdr: Vec3, exposure: f32) -> Vec3 {
    Vec3::ONE - (-hdr * exposure).exp()
}

pub fn gamma_encode(linear: Vec3) -> Vec3 {
    linear.powf(1.0 / DISPLAY_GAMMA)
}

/// Composite of one pixel: additive bloom, tone map, gamma.
pub fn composite(scene: Vec3, bloom: Vec3, intensity: f32, exposure: f32) -> Vec3 {
    gamma_encode(tone_map(scene + intensity * bloom, exposure))
}

/// Row-major linear HDR image used to run the post chain on the CPU.
#[derive(Debug, Clone, PartialEq)]
pub struct HdrImage {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Vec3>,
}

impl HdrImage {
    pub fn filled(width: usize, height: usize, color: Vec3) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width * height],
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Vec3 {
        self.pixels[y * self.width + x]
    }

    fn sample_clamped(&self, x: isize, y: isize) -> Vec3 {
        let x = x.clamp(0, self.width as isize - 1) as usize;
        let y = y.clamp(0, self.height as isize - 1) as usize;
        self.get(x, y)
    }

    fn map(&self, f: impl Fn(Vec3) -> Vec3) -> Self {
        Self {
            width: self.width,
            height: self.height,
            pixels: self.pixels.iter().copied().map(f).collect(),
        }
    }

    pub fn bright_pass(&self, threshold: f32) -> Self {
        self.map(|c| bright_pass(c, threshold))
    }

    /// One separable Gaussian pass along X (`horizontal`) or Y, clamping at
    /// the edges like the GPU sampler.
    pub fn blur(&self, horizontal: bool) -> Self {
        let mut out = Vec::with_capacity(self.pixels.len());
        for y in 0..self.height as isize {
            for x in 0..self.width as isize {
                let mut acc = self.sample_clamped(x, y) * GAUSSIAN_WEIGHTS[0];
                for (i, w) in GAUSSIAN_WEIGHTS.iter().enumerate().skip(1) {
                    let o = i as isize;
                    let (a, b) = if horizontal {
                        (self.sample_clamped(x + o, y), self.sample_clamped(x - o, y))
                    } else {
                        (self.sample_clamped(x, y + o), self.sample_clamped(x, y - o))
                    };
                    acc += (a + b) * *w;
                }
                out.push(acc);
            }
        }
        Self {
            width: self.width,
            height: self.height,
            pixels: out,
        }
    }

    /// Runs bright-pass → ping-pong blur → composite, following the same
    /// buffer schedule as the GPU pipeline. Returns the displayable image.
    pub fn bloom_chain(&self, threshold: f32, iterations: u32, intensity: f32, exposure: f32) -> Self {
        let mut buffers = [self.bright_pass(threshold), self.bright_pass(threshold)];
        let mut schedule = BlurSchedule::new(iterations);
        for step in schedule.by_ref() {
            let src = &buffers[step.read.index()];
            buffers[step.write] = src.blur(step.horizontal);
        }
        let bloom = &buffers[schedule.final_index()];

        Self {
            width: self.width,
            height: self.height,
            pixels: self
                .pixels
                .iter()
                .zip(&bloom.pixels)
                .map(|(&s, &b)| composite(s, b, intensity, exposure))
                .collect(),
        }
    }
}
