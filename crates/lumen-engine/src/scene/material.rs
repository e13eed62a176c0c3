use crate::assets::ImageRgba8;

/// Decoded material maps as loaded; any may be missing.
#[derive(Debug, Clone, Default)]
pub struct MaterialImages {
    pub albedo: Option<ImageRgba8>,
    pub normal: Option<ImageRgba8>,
    pub metallic: Option<ImageRgba8>,
    pub roughness: Option<ImageRgba8>,
    pub ao: Option<ImageRgba8>,
}

/// All five maps present after fallback substitution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMaterial {
    pub albedo: ImageRgba8,
    pub normal: ImageRgba8,
    pub metallic: ImageRgba8,
    pub roughness: ImageRgba8,
    pub ao: ImageRgba8,
}

impl MaterialImages {
    /// Substitutes missing maps: albedo becomes 1×1 white, every other map
    /// falls back to the albedo.
    pub fn resolve(self) -> ResolvedMaterial {
        let albedo = self.albedo.unwrap_or_else(|| {
            log::warn!("albedo map missing; using white");
            ImageRgba8::white()
        });
        let fallback = |map: Option<ImageRgba8>, name: &str| {
            map.unwrap_or_else(|| {
                log::warn!("{name} map missing; using albedo");
                albedo.clone()
            })
        };

        ResolvedMaterial {
            normal: fallback(self.normal, "normal"),
            metallic: fallback(self.metallic, "metallic"),
            roughness: fallback(self.roughness, "roughness"),
            ao: fallback(self.ao, "ao"),
            albedo,
        }
    }
}

impl ResolvedMaterial {
    /// Maps in binding order: albedo, normal, metallic, roughness, ao.
    pub fn maps(&self) -> [(&'static str, &ImageRgba8); 5] {
        [
            ("albedo", &self.albedo),
            ("normal", &self.normal),
            ("metallic", &self.metallic),
            ("roughness", &self.roughness),
            ("ao", &self.ao),
        ]
    }

    /// Replaces maps the device cannot hold: the albedo becomes 1×1 white,
    /// any other map falls back to the (fitting) albedo.
    pub fn fit(self, fits: impl Fn(&ImageRgba8) -> bool) -> Self {
        let albedo = if fits(&self.albedo) {
            self.albedo
        } else {
            log::warn!(
                "albedo map ({}x{}) exceeds device limits; using white",
                self.albedo.width,
                self.albedo.height
            );
            ImageRgba8::white()
        };
        let fallback = |map: ImageRgba8, name: &str| {
            if fits(&map) {
                map
            } else {
                log::warn!("{name} map ({}x{}) exceeds device limits; using albedo", map.width, map.height);
                albedo.clone()
            }
        };

        Self {
            normal: fallback(self.normal, "normal"),
            metallic: fallback(self.metallic, "metallic"),
            roughness: fallback(self.roughness, "roughness"),
            ao: fallback(self.ao, "ao"),
            albedo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(v: u8) -> ImageRgba8 {
        ImageRgba8 {
            width: 2,
            height: 2,
            pixels: vec![v; 16],
        }
    }

    #[test]
    fn missing_everything_is_white() {
        let m = MaterialImages::default().resolve();
        for (_, map) in m.maps() {
            assert_eq!(map, &ImageRgba8::white());
        }
    }

    #[test]
    fn missing_maps_fall_back_to_albedo() {
        let m = MaterialImages {
            albedo: Some(solid(10)),
            roughness: Some(solid(200)),
            ..Default::default()
        }
        .resolve();
        assert_eq!(m.normal, solid(10));
        assert_eq!(m.metallic, solid(10));
        assert_eq!(m.ao, solid(10));
        assert_eq!(m.roughness, solid(200));
    }

    #[test]
    fn oversized_maps_are_replaced() {
        let big = |v: u8| ImageRgba8 {
            width: 4,
            height: 1,
            pixels: vec![v; 16],
        };
        let fits = |img: &ImageRgba8| img.width <= 2 && img.height <= 2;

        let m = MaterialImages {
            albedo: Some(solid(1)),
            normal: Some(big(2)),
            metallic: Some(solid(3)),
            roughness: Some(big(4)),
            ao: Some(solid(5)),
        }
        .resolve()
        .fit(fits);
        let values: Vec<u8> = m.maps().iter().map(|(_, img)| img.pixels[0]).collect();
        assert_eq!(values, [1, 1, 3, 1, 5]);

        let m = MaterialImages {
            albedo: Some(big(1)),
            normal: Some(big(2)),
            metallic: Some(solid(3)),
            ..Default::default()
        }
        .resolve()
        .fit(fits);
        assert_eq!(m.albedo, ImageRgba8::white());
        assert_eq!(m.normal, ImageRgba8::white());
        assert_eq!(m.metallic, solid(3));
        assert_eq!(m.ao, ImageRgba8::white());
    }

    #[test]
    fn present_maps_are_kept() {
        let m = MaterialImages {
            albedo: Some(solid(1)),
            normal: Some(solid(2)),
            metallic: Some(solid(3)),
            roughness: Some(solid(4)),
            ao: Some(solid(5)),
        }
        .resolve();
        let values: Vec<u8> = m.maps().iter().map(|(_, img)| img.pixels[0]).collect();
        assert_eq!(values, [1, 2, 3, 4, 5]);
    }
}
