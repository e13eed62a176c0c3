use std::path::Path;

use ::image::imageops::FilterType;

/// Tightly packed RGBA8 pixels, row 0 at the bottom of the picture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRgba8 {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl ImageRgba8 {
    /// A 1×1 opaque white image.
    pub fn white() -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![255; 4],
        }
    }

    /// Converts a decoded image, flipping it vertically so texture
    /// coordinate v = 0 addresses the bottom row.
    pub fn from_dynamic(img: ::image::DynamicImage) -> Self {
        let rgba = img.flipv().into_rgba8();
        let (width, height) = rgba.dimensions();
        Self {
            width,
            height,
            pixels: rgba.into_raw(),
        }
    }

    pub fn bytes_per_row(&self) -> u32 {
        self.width * 4
    }

    /// The full mip chain, base level first, each level half the previous
    /// (rounded down, at least 1) and resampled from the base.
    pub fn mip_chain(&self) -> Vec<ImageRgba8> {
        let mut chain = vec![self.clone()];
        let Some(base) =
            ::image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
        else {
            log::warn!("{}x{} image has a short pixel buffer; skipping mipmaps", self.width, self.height);
            return chain;
        };
        for level in 1..mip_level_count(self.width, self.height) {
            let width = (self.width >> level).max(1);
            let height = (self.height >> level).max(1);
            let scaled = ::image::imageops::resize(&base, width, height, FilterType::Triangle);
            chain.push(ImageRgba8 {
                width,
                height,
                pixels: scaled.into_raw(),
            });
        }
        chain
    }
}

/// Number of levels in a full mip chain for a `width`×`height` image.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Decodes `path` to RGBA8. Failure is logged and yields `None`.
pub fn load_texture(path: &Path) -> Option<ImageRgba8> {
    match ::image::open(path) {
        Ok(img) => {
            let img = ImageRgba8::from_dynamic(img);
            log::debug!("loaded texture {} ({}x{})", path.display(), img.width, img.height);
            Some(img)
        }
        Err(err) => {
            log::warn!("texture {} unavailable: {err}", path.display());
            None
        }
    }
}
