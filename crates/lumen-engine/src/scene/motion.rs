use glam::{Mat4, Vec3};

use crate::config::AnimationConfig;

/// Model transform at `t` seconds: scale, then the walk translation, then
/// the spin about +Y (applied to the vertex first).
pub fn model_matrix(anim: &AnimationConfig, t: f32) -> Mat4 {
    let walk = Vec3::new((t * anim.walk_speed).cos() * anim.walk_range, anim.walk_height, 0.0);
    Mat4::from_scale(Vec3::splat(anim.scale))
        * Mat4::from_translation(walk)
        * Mat4::from_rotation_y((t * anim.spin_degrees_per_second).to_radians())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn origin_follows_scaled_walk() {
        let anim = AnimationConfig::default();
        let m = model_matrix(&anim, 0.0);
        assert_relative_eq!(m.transform_point3(Vec3::ZERO), Vec3::new(12.0, 0.0, 0.0), epsilon = 1e-5);

        let t = std::f32::consts::FRAC_PI_4; // cos(t * 2) == 0
        let m = model_matrix(&anim, t);
        assert_relative_eq!(m.transform_point3(Vec3::ZERO), Vec3::ZERO, epsilon = 1e-5);
    }

    #[test]
    fn spin_is_sixty_degrees_per_second() {
        let anim = AnimationConfig {
            walk_range: 0.0,
            scale: 1.0,
            ..AnimationConfig::default()
        };
        let m = model_matrix(&anim, 1.5); // 90 degrees
        assert_relative_eq!(m.transform_vector3(Vec3::X), Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-5);
    }

    #[test]
    fn walk_height_lifts_scaled() {
        let anim = AnimationConfig {
            walk_height: 1.0,
            ..AnimationConfig::default()
        };
        let p = model_matrix(&anim, 0.0).transform_point3(Vec3::ZERO);
        assert_relative_eq!(p.y, 3.0, epsilon = 1e-5);
    }
}
