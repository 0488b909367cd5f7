//! Surface and atmosphere shading model.
//!
//! Pure per-sample shading math shared by the CPU fallback renderer and
//! mirrored by the GLSL program in `renderer.rs`: day/night blending
//! across the terminator, cloud lightening, ocean specular, and the
//! Fresnel-driven atmosphere rim and halo.

use egui::{Color32, ColorImage};
use nalgebra::{Matrix3, Vector3};
use std::f64::consts::PI;

use crate::texture::EarthTexture;

/// Half-width of the smooth day/night transition band around the terminator.
pub const TERMINATOR_BAND: f32 = 0.1;
/// Atmosphere color on the sunlit limb (#00aaff).
pub const ATMOSPHERE_DAY_COLOR: [f32; 3] = [0.0, 0.667, 1.0];
/// Atmosphere color near the terminator (#ff6600).
pub const ATMOSPHERE_TWILIGHT_COLOR: [f32; 3] = [1.0, 0.4, 0.0];
/// The atmosphere shell extends to this multiple of the globe radius.
pub const ATMOSPHERE_SHELL_SCALE: f32 = 1.04;

const CLOUD_FLOOR: f32 = 0.2;
const SPECULAR_EXPONENT: f32 = 32.0;
const NIGHT_FALLBACK_DIM: f32 = 0.08;

pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn mix3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

/// Day weight for a given `sun_facing = dot(normal, sun_dir)`.
///
/// 0 on the night side, 1 on the day side, smooth across the
/// `±TERMINATOR_BAND` strip so the terminator never shows a hard seam.
pub fn day_night_mix(sun_facing: f32) -> f32 {
    smoothstep(-TERMINATOR_BAND, TERMINATOR_BAND, sun_facing)
}

/// Atmosphere tint for a given sun facing: twilight orange near the
/// terminator shading into daylight blue on the lit side.
pub fn atmosphere_color(sun_facing: f32) -> [f32; 3] {
    mix3(
        ATMOSPHERE_TWILIGHT_COLOR,
        ATMOSPHERE_DAY_COLOR,
        smoothstep(-0.25, 0.75, sun_facing),
    )
}

/// Per-fragment texture inputs. Missing textures degrade to neutral
/// defaults: night falls back to darkened day, the mask to no specular
/// and no cloud.
#[derive(Clone, Copy)]
pub struct SurfaceSample {
    pub day: [f32; 3],
    pub night: Option<[f32; 3]>,
    /// (specular strength, cloud density) from the mask's red and green channels.
    pub specular_clouds: Option<[f32; 2]>,
}

/// Shade one surface point. All vectors are unit length and expressed in
/// the globe's body frame.
pub fn shade_surface(
    sample: &SurfaceSample,
    normal: &Vector3<f32>,
    sun_dir: &Vector3<f32>,
    view_dir: &Vector3<f32>,
    show_clouds: bool,
    show_day_night: bool,
    show_atmosphere: bool,
) -> [f32; 3] {
    let sun_facing = normal.dot(sun_dir);
    let day_mix = if show_day_night {
        day_night_mix(sun_facing)
    } else {
        1.0
    };

    let night = sample.night.unwrap_or([
        sample.day[0] * NIGHT_FALLBACK_DIM,
        sample.day[1] * NIGHT_FALLBACK_DIM,
        sample.day[2] * NIGHT_FALLBACK_DIM,
    ]);
    let mut color = mix3(night, sample.day, day_mix);

    let [spec_strength, cloud_density] = sample.specular_clouds.unwrap_or([0.0, 0.0]);

    if show_clouds {
        // Night-side clouds are not lit: attenuate by the day factor.
        let clouds = smoothstep(CLOUD_FLOOR, 1.0, cloud_density) * day_mix;
        color = mix3(color, [1.0, 1.0, 1.0], clouds);
    }

    // Ocean-only highlight, masked by the specular channel.
    let incident = -sun_dir;
    let reflected = incident - normal * (2.0 * normal.dot(&incident));
    let specular = reflected.dot(view_dir).max(0.0).powf(SPECULAR_EXPONENT) * spec_strength;
    color[0] += specular;
    color[1] += specular;
    color[2] += specular;

    if show_atmosphere {
        let fresnel = (1.0 - normal.dot(view_dir).max(0.0)).powf(3.0);
        let atmo = atmosphere_color(sun_facing);
        let lit = (sun_facing + 0.3).clamp(0.0, 1.0);
        color = mix3(
            color,
            [atmo[0] * lit, atmo[1] * lit, atmo[2] * lit],
            fresnel * 0.6,
        );
    }

    [
        color[0].clamp(0.0, 1.0),
        color[1].clamp(0.0, 1.0),
        color[2].clamp(0.0, 1.0),
    ]
}

/// Halo contribution between the limb and the shell edge.
///
/// `edge` runs 0 at the limb to 1 at the shell's outer boundary;
/// `limb_normal` is the surface normal at the nearest limb point. The
/// returned alpha falls off quadratically, so the halo reads opaque
/// against the limb and vanishes at the shell edge.
pub fn atmosphere_halo(
    limb_normal: &Vector3<f32>,
    sun_dir: &Vector3<f32>,
    edge: f32,
) -> ([f32; 3], f32) {
    let falloff = (1.0 - edge.clamp(0.0, 1.0)).powi(2);
    let color = atmosphere_color(limb_normal.dot(sun_dir));
    (color, falloff)
}

fn to_color32(rgb: [f32; 3]) -> Color32 {
    Color32::from_rgb(
        (rgb[0] * 255.0) as u8,
        (rgb[1] * 255.0) as u8,
        (rgb[2] * 255.0) as u8,
    )
}

/// CPU fallback render of the globe into an image, orthographic like the
/// GPU path. Slow but dependency-free on the GL context; used when GPU
/// rendering is toggled off.
#[allow(clippy::too_many_arguments)]
pub fn render_globe_image(
    day: &EarthTexture,
    night: Option<&EarthTexture>,
    specular_clouds: Option<&EarthTexture>,
    inv_rotation: &Matrix3<f64>,
    sun_body: &Vector3<f64>,
    size: usize,
    show_clouds: bool,
    show_day_night: bool,
    show_atmosphere: bool,
) -> ColorImage {
    let mut pixels = vec![Color32::TRANSPARENT; size * size];
    let center = size as f64 / 2.0;
    // Leave room for the halo shell inside the image square.
    let globe_px = center / ATMOSPHERE_SHELL_SCALE as f64;
    let sun = Vector3::new(sun_body.x as f32, sun_body.y as f32, sun_body.z as f32);
    let view_body = inv_rotation * Vector3::new(0.0, 0.0, 1.0);
    let view = Vector3::new(view_body.x as f32, view_body.y as f32, view_body.z as f32);

    for py in 0..size {
        for px in 0..size {
            let dx = (px as f64 - center) / globe_px;
            let dy = (center - py as f64) / globe_px;
            let dist_sq = dx * dx + dy * dy;

            if dist_sq <= 1.0 {
                let dz = (1.0 - dist_sq).sqrt();
                let n_body = inv_rotation * Vector3::new(dx, dy, dz);

                let lat = n_body.y.asin();
                let lon = (-n_body.z).atan2(n_body.x);
                let u = (lon + PI) / (2.0 * PI);
                let v = (PI / 2.0 - lat) / PI;

                let sample = SurfaceSample {
                    day: rgb_f32(day.sample(u, v)),
                    night: night.map(|t| rgb_f32(t.sample(u, v))),
                    specular_clouds: specular_clouds.map(|t| {
                        let [r, g, _] = t.sample(u, v);
                        [r as f32 / 255.0, g as f32 / 255.0]
                    }),
                };
                let normal =
                    Vector3::new(n_body.x as f32, n_body.y as f32, n_body.z as f32).normalize();
                let rgb = shade_surface(
                    &sample,
                    &normal,
                    &sun,
                    &view,
                    show_clouds,
                    show_day_night,
                    show_atmosphere,
                );
                pixels[py * size + px] = to_color32(rgb);
            } else if show_atmosphere {
                let dist = dist_sq.sqrt();
                if dist < ATMOSPHERE_SHELL_SCALE as f64 {
                    let edge =
                        ((dist - 1.0) / (ATMOSPHERE_SHELL_SCALE as f64 - 1.0)).clamp(0.0, 1.0);
                    let limb_view = Vector3::new(dx / dist, dy / dist, 0.0);
                    let limb_body = inv_rotation * limb_view;
                    let limb =
                        Vector3::new(limb_body.x as f32, limb_body.y as f32, limb_body.z as f32);
                    let (rgb, alpha) = atmosphere_halo(&limb, &sun, edge as f32);
                    pixels[py * size + px] = Color32::from_rgba_unmultiplied(
                        (rgb[0] * 255.0) as u8,
                        (rgb[1] * 255.0) as u8,
                        (rgb[2] * 255.0) as u8,
                        (alpha * 255.0) as u8,
                    );
                }
            }
        }
    }

    ColorImage {
        size: [size, size],
        pixels,
        source_size: egui::Vec2::ZERO,
    }
}

fn rgb_f32([r, g, b]: [u8; 3]) -> [f32; 3] {
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn sample_red_day_blue_night() -> SurfaceSample {
        SurfaceSample {
            day: [1.0, 0.0, 0.0],
            night: Some([0.0, 0.0, 1.0]),
            specular_clouds: None,
        }
    }

    fn shade_at(sun: Vector3<f32>) -> [f32; 3] {
        let normal = Vector3::new(0.0, 0.0, 1.0);
        let view = Vector3::new(0.0, 0.0, 1.0);
        shade_surface(
            &sample_red_day_blue_night(),
            &normal,
            &sun,
            &view,
            false,
            true,
            false,
        )
    }

    #[test]
    fn terminator_blend_sits_strictly_between_day_and_night() {
        // sun perpendicular to the normal: sun_facing = 0.
        let color = shade_at(Vector3::new(1.0, 0.0, 0.0));
        assert!(color[0] > 0.0 && color[0] < 1.0);
        assert!(color[2] > 0.0 && color[2] < 1.0);
    }

    #[test]
    fn full_sun_gives_pure_day_color() {
        let color = shade_at(Vector3::new(0.0, 0.0, 1.0));
        assert!((color[0] - 1.0).abs() < EPS);
        assert!(color[2] < EPS);
    }

    #[test]
    fn full_shadow_gives_pure_night_color() {
        let color = shade_at(Vector3::new(0.0, 0.0, -1.0));
        assert!(color[0] < EPS);
        assert!((color[2] - 1.0).abs() < EPS);
    }

    #[test]
    fn day_mix_is_monotonic_through_the_band() {
        let mut last = day_night_mix(-0.2);
        let mut facing = -0.2;
        while facing <= 0.2 {
            let mix = day_night_mix(facing);
            assert!(mix >= last);
            last = mix;
            facing += 0.01;
        }
        assert_eq!(day_night_mix(-1.0), 0.0);
        assert_eq!(day_night_mix(1.0), 1.0);
    }

    #[test]
    fn missing_mask_means_no_specular_or_cloud_contribution() {
        let sample = SurfaceSample {
            day: [0.2, 0.4, 0.6],
            night: Some([0.0, 0.0, 0.0]),
            specular_clouds: None,
        };
        let normal = Vector3::new(0.0, 0.0, 1.0);
        let sun = Vector3::new(0.0, 0.0, 1.0);
        let with_flags = shade_surface(&sample, &normal, &sun, &normal, true, true, false);
        let without = shade_surface(&sample, &normal, &sun, &normal, false, true, false);
        assert_eq!(with_flags, without);
    }

    #[test]
    fn specular_peaks_where_the_reflection_meets_the_view() {
        let sample = SurfaceSample {
            day: [0.0, 0.0, 0.0],
            night: Some([0.0, 0.0, 0.0]),
            specular_clouds: Some([1.0, 0.0]),
        };
        let normal = Vector3::new(0.0, 0.0, 1.0);
        let sun = Vector3::new(0.0, 0.0, 1.0);
        let head_on = shade_surface(&sample, &normal, &sun, &normal, false, true, false);
        assert!((head_on[0] - 1.0).abs() < EPS, "mirror alignment should saturate");

        let oblique_view = Vector3::new(0.8, 0.0, 0.6).normalize();
        let off = shade_surface(&sample, &normal, &sun, &oblique_view, false, true, false);
        assert!(off[0] < head_on[0]);
    }

    #[test]
    fn atmosphere_tint_runs_twilight_to_day() {
        assert_eq!(atmosphere_color(-1.0), ATMOSPHERE_TWILIGHT_COLOR);
        assert_eq!(atmosphere_color(1.0), ATMOSPHERE_DAY_COLOR);
        let mid = atmosphere_color(0.0);
        assert!(mid[0] > 0.0 && mid[0] < 1.0);
    }

    #[test]
    fn halo_fades_from_limb_to_shell_edge() {
        let limb = Vector3::new(1.0, 0.0, 0.0);
        let sun = Vector3::new(1.0, 0.0, 0.0);
        let (_, at_limb) = atmosphere_halo(&limb, &sun, 0.0);
        let (_, midway) = atmosphere_halo(&limb, &sun, 0.5);
        let (_, at_edge) = atmosphere_halo(&limb, &sun, 1.0);
        assert_eq!(at_limb, 1.0);
        assert!(midway > 0.0 && midway < at_limb);
        assert_eq!(at_edge, 0.0);
    }

    #[test]
    fn cpu_render_covers_the_disc_and_leaves_corners_clear() {
        let day = EarthTexture::default_placeholder();
        let img = render_globe_image(
            &day,
            None,
            None,
            &Matrix3::identity(),
            &Vector3::new(0.0, 0.0, 1.0),
            64,
            false,
            true,
            false,
        );
        let center = img.pixels[32 * 64 + 32];
        assert_ne!(center, Color32::TRANSPARENT);
        assert_eq!(img.pixels[0], Color32::TRANSPARENT);
    }
}
