//! Cook-Torrance microfacet BRDF, metallic-roughness workflow.

use std::f32::consts::PI;

use glam::Vec3;

/// Reflectance at normal incidence for dielectrics.
pub const DIELECTRIC_F0: f32 = 0.04;

/// Constant ambient factor applied to `albedo * ao`.
pub const AMBIENT_STRENGTH: f32 = 0.03;

/// Floor for the GGX denominator.
pub const GGX_DENOM_EPSILON: f32 = 1.0e-7;

/// Added to the specular denominator so grazing angles stay finite.
pub const SPECULAR_EPSILON: f32 = 1.0e-4;

/// Power of the display transfer curve used to linearize albedo.
pub const ALBEDO_GAMMA: f32 = 2.2;

/// Material and geometry at one shaded point, in world space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SurfaceSample {
    pub position: Vec3,
    /// Unit surface normal.
    pub normal: Vec3,
    /// Linear albedo (see [`linearize_albedo`]).
    pub albedo: Vec3,
    pub metallic: f32,
    pub roughness: f32,
    pub ao: f32,
}

/// Point light with inverse-square falloff.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
}

/// Converts a gamma-encoded albedo texel to linear.
pub fn linearize_albedo(encoded: Vec3) -> Vec3 {
    encoded.powf(ALBEDO_GAMMA)
}

/// GGX / Trowbridge-Reitz normal distribution with `alpha = roughness²`.
pub fn distribution_ggx(n_dot_h: f32, roughness: f32) -> f32 {
    let a = roughness * roughness;
    let a2 = a * a;
    let n_dot_h = n_dot_h.max(0.0);
    let d = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    a2 / (PI * d * d).max(GGX_DENOM_EPSILON)
}

/// Upper bound of [`distribution_ggx`] imposed by the denominator floor.
pub fn distribution_ggx_bound() -> f32 {
    1.0 / (PI * GGX_DENOM_EPSILON).sqrt()
}

/// Schlick-GGX visibility for one direction, `k = (r + 1)² / 8`.
pub fn geometry_schlick_ggx(n_dot_x: f32, roughness: f32) -> f32 {
    let r = roughness + 1.0;
    let k = r * r / 8.0;
    n_dot_x / (n_dot_x * (1.0 - k) + k)
}

/// Smith combination of the view and light visibility terms.
pub fn geometry_smith(n_dot_v: f32, n_dot_l: f32, roughness: f32) -> f32 {
    geometry_schlick_ggx(n_dot_v.max(0.0), roughness)
        * geometry_schlick_ggx(n_dot_l.max(0.0), roughness)
}

/// Schlick's Fresnel approximation.
pub fn fresnel_schlick(cos_theta: f32, f0: Vec3) -> Vec3 {
    let m = (1.0 - cos_theta).clamp(0.0, 1.0);
    f0 + (Vec3::ONE - f0) * m.powi(5)
}

/// `F0` for the metallic workflow: dielectric baseline blended toward albedo.
pub fn base_reflectivity(albedo: Vec3, metallic: f32) -> Vec3 {
    Vec3::splat(DIELECTRIC_F0).lerp(albedo, metallic)
}

/// Diffuse weight `kD`: what the Fresnel term leaves, none for metals.
pub fn diffuse_weight(fresnel: Vec3, metallic: f32) -> Vec3 {
    (Vec3::ONE - fresnel) * (1.0 - metallic)
}

/// Outgoing radiance toward `view_dir` from one light.
pub fn light_contribution(surface: &SurfaceSample, view_dir: Vec3, light: &PointLight) -> Vec3 {
    let n = surface.normal;
    let to_light = light.position - surface.position;
    let l = to_light.normalize();
    let h = (view_dir + l).normalize();

    let distance2 = to_light.length_squared();
    let radiance = light.color / distance2;

    let n_dot_v = n.dot(view_dir).max(0.0);
    let n_dot_l = n.dot(l).max(0.0);

    let f0 = base_reflectivity(surface.albedo, surface.metallic);
    let d = distribution_ggx(n.dot(h), surface.roughness);
    let g = geometry_smith(n_dot_v, n_dot_l, surface.roughness);
    let f = fresnel_schlick(h.dot(view_dir).max(0.0), f0);

    let specular = d * g * f / (4.0 * n_dot_v * n_dot_l + SPECULAR_EPSILON);
    let diffuse = diffuse_weight(f, surface.metallic) * surface.albedo / PI;

    (diffuse + specular) * radiance * n_dot_l
}

/// Full shading model: both lights plus ambient. Output is linear and unclamped.
pub fn shade(surface: &SurfaceSample, camera_pos: Vec3, lights: &[PointLight]) -> Vec3 {
    let v = (camera_pos - surface.position).normalize();
    let direct: Vec3 = lights
        .iter()
        .map(|light| light_contribution(surface, v, light))
        .sum();
    let ambient = AMBIENT_STRENGTH * surface.albedo * surface.ao;
    direct + ambient
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn head_on(metallic: f32, roughness: f32, albedo: Vec3) -> SurfaceSample {
        SurfaceSample {
            position: Vec3::ZERO,
            normal: Vec3::Z,
            albedo,
            metallic,
            roughness,
            ao: 1.0,
        }
    }

    #[test]
    fn ggx_is_finite_and_non_negative_over_roughness_range() {
        let bound = distribution_ggx_bound();
        for i in 1..=1000 {
            let roughness = i as f32 / 1000.0;
            for j in 0..=20 {
                let n_dot_h = j as f32 / 20.0;
                let d = distribution_ggx(n_dot_h, roughness);
                assert!(d.is_finite(), "D({n_dot_h}, {roughness}) = {d}");
                assert!(d >= 0.0);
                assert!(d <= bound * 1.0001, "D({n_dot_h}, {roughness}) = {d} > {bound}");
            }
        }
    }

    #[test]
    fn ggx_peak_saturates_at_floor_as_roughness_vanishes() {
        // At N·H = 1 the unfloored peak is 1 / (π α²), which diverges as α → 0.
        let smooth = [0.05_f32, 0.03, 0.02, 0.015];
        for r in smooth {
            let d = distribution_ggx(1.0, r);
            assert!(d.is_finite());
            assert!(d <= distribution_ggx_bound() * 1.0001);
        }
        // Once the floor engages, D tracks α² / ε instead of growing.
        let r: f32 = 0.01;
        let a2 = r.powi(4);
        assert_relative_eq!(distribution_ggx(1.0, r), a2 / GGX_DENOM_EPSILON, max_relative = 1e-4);
    }

    #[test]
    fn ggx_matches_closed_form_at_half_roughness() {
        // α = 0.25, α² = 0.0625, D(1) = 1 / (π · 0.0625)
        assert_relative_eq!(distribution_ggx(1.0, 0.5), 16.0 / PI, max_relative = 1e-5);
    }

    #[test]
    fn f0_interpolates_between_dielectric_and_albedo() {
        let albedo = Vec3::new(0.9, 0.5, 0.1);
        assert_eq!(base_reflectivity(albedo, 0.0), Vec3::splat(DIELECTRIC_F0));
        assert_relative_eq!(base_reflectivity(albedo, 1.0), albedo);
        for i in 0..=10 {
            let m = i as f32 / 10.0;
            let expected = Vec3::splat(DIELECTRIC_F0) * (1.0 - m) + albedo * m;
            assert_relative_eq!(base_reflectivity(albedo, m), expected, epsilon = 1e-6);
        }
    }

    #[test]
    fn diffuse_weight_is_maximal_for_dielectrics_and_zero_for_metals() {
        let f = fresnel_schlick(0.7, Vec3::splat(DIELECTRIC_F0));
        let dielectric = diffuse_weight(f, 0.0);
        for i in 1..=10 {
            let m = i as f32 / 10.0;
            let w = diffuse_weight(f, m);
            assert!(w.x < dielectric.x && w.y < dielectric.y && w.z < dielectric.z);
        }
        assert_eq!(diffuse_weight(f, 1.0), Vec3::ZERO);
    }

    #[test]
    fn fully_metallic_surface_reflects_specular_only() {
        let surface = head_on(1.0, 0.8, Vec3::new(1.0, 0.2, 0.0));
        let light = PointLight {
            position: Vec3::new(3.0, 0.0, 1.0),
            color: Vec3::ONE,
        };
        let out = light_contribution(&surface, Vec3::Z, &light);

        let l = light.position.normalize();
        let h = (Vec3::Z + l).normalize();
        let n_dot_l = l.z;
        let f = fresnel_schlick(h.z, surface.albedo);
        let specular = distribution_ggx(h.z, 0.8) * geometry_smith(1.0, n_dot_l, 0.8) * f
            / (4.0 * n_dot_l + SPECULAR_EPSILON);
        let expected = specular * (light.color / 10.0) * n_dot_l;

        assert_relative_eq!(out, expected, epsilon = 1e-6);
    }

    #[test]
    fn fresnel_is_f0_head_on_and_one_at_grazing() {
        let f0 = Vec3::splat(DIELECTRIC_F0);
        assert_relative_eq!(fresnel_schlick(1.0, f0), f0);
        assert_relative_eq!(fresnel_schlick(0.0, f0), Vec3::ONE);
    }

    #[test]
    fn smith_term_is_one_head_on() {
        assert_relative_eq!(geometry_smith(1.0, 1.0, 0.5), 1.0);
        assert_eq!(geometry_smith(0.0, 1.0, 0.5), 0.0);
    }

    #[test]
    fn light_below_horizon_contributes_nothing() {
        let surface = head_on(0.0, 0.5, Vec3::ONE);
        let light = PointLight {
            position: Vec3::new(4.0, 0.0, -1.0),
            color: Vec3::splat(10.0),
        };
        assert_eq!(light_contribution(&surface, Vec3::Z, &light), Vec3::ZERO);
    }

    #[test]
    fn albedo_is_linearized_with_gamma_2_2() {
        assert_eq!(linearize_albedo(Vec3::ONE), Vec3::ONE);
        assert_relative_eq!(linearize_albedo(Vec3::splat(0.5)).x, 0.5_f32.powf(2.2));
    }

    #[test]
    fn white_dielectric_head_on_matches_analytic_radiance() {
        // Flat white albedo, no normal perturbation, metallic 0, roughness 0.5,
        // ao 1. Camera on the normal at distance 5; both lights on the normal at
        // distance 2, so L = V = H = N.
        //
        // D = 16/π, G = 1, F = 0.04
        // specular = D·G·F / (4 + 1e-4)
        // diffuse  = 0.96 / π
        // per unit light color: (diffuse + specular) · 1/4
        let surface = head_on(0.0, 0.5, linearize_albedo(Vec3::ONE));
        let lights = [
            PointLight {
                position: Vec3::new(0.0, 0.0, 2.0),
                color: Vec3::new(1.0, 1.0, 1.0),
            },
            PointLight {
                position: Vec3::new(0.0, 0.0, 2.0),
                color: Vec3::new(0.4, 0.7, 1.0),
            },
        ];
        let out = shade(&surface, Vec3::new(0.0, 0.0, 5.0), &lights);

        let specular = (16.0 / PI) * 0.04 / (4.0 + SPECULAR_EPSILON);
        let diffuse = 0.96 / PI;
        let unit = (diffuse + specular) * 0.25;
        let expected = Vec3::new(unit * 1.4, unit * 1.7, unit * 2.0) + Vec3::splat(0.03);

        assert_relative_eq!(out, expected, epsilon = 1e-5);
        assert_relative_eq!(out.x, 0.154_777, epsilon = 1e-4);
        assert_relative_eq!(out.z, 0.208_253, epsilon = 1e-4);
    }

    #[test]
    fn ambient_only_when_lights_are_black() {
        let surface = SurfaceSample {
            ao: 0.5,
            ..head_on(0.3, 0.4, Vec3::new(0.2, 0.4, 0.6))
        };
        let lights = [PointLight {
            position: Vec3::new(1.0, 1.0, 1.0),
            color: Vec3::ZERO,
        }];
        let out = shade(&surface, Vec3::new(0.0, 0.0, 3.0), &lights);
        assert_relative_eq!(out, AMBIENT_STRENGTH * surface.albedo * 0.5, epsilon = 1e-7);
    }
}
