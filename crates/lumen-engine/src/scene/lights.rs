use glam::Vec3;

use crate::shading::PointLight;

pub const LIGHT_COUNT: usize = 2;

/// The two orbiting point lights at `t` seconds.
///
/// A warm light circles at radius 5 around height 4; a cool light circles the
/// other way at radius 6 around height 3.4.
pub fn scene_lights(t: f32) -> [PointLight; LIGHT_COUNT] {
    [
        PointLight {
            position: Vec3::new(
                5.0 * (0.6 * t).cos(),
                4.0 + (0.7 * t).sin(),
                5.0 * (0.6 * t).sin(),
            ),
            color: Vec3::new(1.0, 0.9, 0.7),
        },
        PointLight {
            position: Vec3::new(
                -6.0 * (0.4 * t).cos(),
                3.4 + 0.3 * (0.9 * t).sin(),
                -6.0 * (0.4 * t).sin(),
            ),
            color: Vec3::new(0.4, 0.7, 1.0),
        },
    ]
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn lights_start_on_opposite_sides() {
        let [a, b] = scene_lights(0.0);
        assert_relative_eq!(a.position, Vec3::new(5.0, 4.0, 0.0));
        assert_relative_eq!(b.position, Vec3::new(-6.0, 3.4, 0.0));
    }

    #[test]
    fn lights_keep_their_orbit_radius() {
        for i in 0..50 {
            let t = i as f32 * 0.37;
            let [a, b] = scene_lights(t);
            assert_relative_eq!(a.position.x.hypot(a.position.z), 5.0, epsilon = 1e-4);
            assert_relative_eq!(b.position.x.hypot(b.position.z), 6.0, epsilon = 1e-4);
            assert!((3.0..=5.0).contains(&a.position.y));
            assert!((3.1..=3.7).contains(&b.position.y));
        }
    }
}
