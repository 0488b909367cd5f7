//! Globe view composition.
//!
//! Paints the shaded globe (GPU callback or CPU image) behind an
//! egui_plot overlay that carries the event markers, then applies
//! drag-to-rotate and scroll-to-zoom input to the view.

use eframe::{egui, egui_glow};
use egui::mutex::Mutex;
use egui_plot::{Plot, PlotImage, PlotPoint, PlotPoints, Points};
use nalgebra::Matrix3;
use std::sync::Arc;

use crate::markers::Marker;
use crate::math::{rotate_point_matrix, rotation_from_drag};
use crate::renderer::GlobeRenderer;
use crate::shading::ATMOSPHERE_SHELL_SCALE;
use crate::GLOBE_RADIUS;

/// Marker tint, the glow sprite's warm yellow.
pub const MARKER_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 255, 153);
/// Sprite edge length in globe units.
pub const MARKER_SPRITE_SIZE: f64 = 0.2;

const OPACITY_BUCKETS: usize = 20;

#[derive(Clone, Copy)]
pub struct GlobeViewFlags {
    pub show_clouds: bool,
    pub show_day_night: bool,
    pub show_atmosphere: bool,
    pub use_gpu_rendering: bool,
}

/// Draw the globe and its markers into `ui`, returning the view rotation
/// and zoom updated by any drag or scroll input.
#[allow(clippy::too_many_arguments)]
pub fn draw_globe_view(
    ui: &mut egui::Ui,
    id: &str,
    renderer: Option<&Arc<Mutex<GlobeRenderer>>>,
    cpu_globe: Option<&egui::TextureHandle>,
    markers: &[Marker],
    sprite: Option<&egui::TextureHandle>,
    mut rotation: Matrix3<f64>,
    spin: &Matrix3<f64>,
    sun_body: [f32; 3],
    mut zoom: f64,
    flags: GlobeViewFlags,
    width: f32,
    height: f32,
    bg_color: egui::Color32,
) -> (Matrix3<f64>, f64) {
    let combined = rotation * spin;
    let margin = GLOBE_RADIUS * 1.15 / zoom;
    let use_gpu = renderer.is_some() && flags.use_gpu_rendering;

    // The sphere goes in first so the plot overlay renders on top of it.
    if use_gpu {
        let rect = egui::Rect::from_min_size(ui.cursor().min, egui::Vec2::new(width, height));
        let renderer = renderer.unwrap().clone();
        let inv_rotation = combined.transpose();
        let aspect = width / height;
        let scale = (GLOBE_RADIUS / margin) as f32;
        let bg = [
            bg_color.r() as f32 / 255.0,
            bg_color.g() as f32 / 255.0,
            bg_color.b() as f32 / 255.0,
        ];
        let callback = egui::PaintCallback {
            rect,
            callback: Arc::new(egui_glow::CallbackFn::new(move |_info, painter| {
                let gl = painter.gl();
                renderer.lock().paint(
                    gl,
                    &inv_rotation,
                    aspect,
                    scale,
                    sun_body,
                    flags.show_clouds,
                    flags.show_day_night,
                    flags.show_atmosphere,
                    bg,
                );
            })),
        };
        ui.painter().add(callback);
    }

    let plot = Plot::new(id)
        .data_aspect(1.0)
        .width(width)
        .height(height)
        .show_axes(false)
        .show_grid(false)
        .show_x(false)
        .show_y(false)
        .show_background(false)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .cursor_color(egui::Color32::TRANSPARENT);

    let response = plot.show(ui, |plot_ui| {
        plot_ui.set_plot_bounds(egui_plot::PlotBounds::from_min_max(
            [-margin, -margin],
            [margin, margin],
        ));

        if !use_gpu {
            if let Some(tex) = cpu_globe {
                let shell_diameter = (GLOBE_RADIUS * ATMOSPHERE_SHELL_SCALE as f64 * 2.0) as f32;
                plot_ui.image(PlotImage::new(
                    "",
                    tex,
                    PlotPoint::new(0.0, 0.0),
                    egui::Vec2::splat(shell_diameter),
                ));
            }
        }

        let occlusion_r_sq = GLOBE_RADIUS * GLOBE_RADIUS;
        if let Some(sprite) = sprite {
            for marker in markers {
                if marker.opacity <= 0.0 {
                    continue;
                }
                let (rx, ry, rz) = rotate_point_matrix(
                    marker.position.x,
                    marker.position.y,
                    marker.position.z,
                    &combined,
                );
                if rz < 0.0 && rx * rx + ry * ry < occlusion_r_sq {
                    continue;
                }
                let alpha = (marker.opacity * 255.0) as u8;
                plot_ui.image(
                    PlotImage::new(
                        "",
                        sprite,
                        PlotPoint::new(rx, ry),
                        egui::Vec2::splat(MARKER_SPRITE_SIZE as f32),
                    )
                    .tint(egui::Color32::from_rgba_unmultiplied(
                        MARKER_COLOR.r(),
                        MARKER_COLOR.g(),
                        MARKER_COLOR.b(),
                        alpha,
                    )),
                );
            }
        } else {
            // No sprite loaded: flat points, one draw per opacity bucket.
            let mut buckets: Vec<Vec<[f64; 2]>> = vec![Vec::new(); OPACITY_BUCKETS];
            for marker in markers {
                if marker.opacity <= 0.0 {
                    continue;
                }
                let (rx, ry, rz) = rotate_point_matrix(
                    marker.position.x,
                    marker.position.y,
                    marker.position.z,
                    &combined,
                );
                if rz < 0.0 && rx * rx + ry * ry < occlusion_r_sq {
                    continue;
                }
                let bucket = ((marker.opacity * (OPACITY_BUCKETS - 1) as f32).round() as usize)
                    .min(OPACITY_BUCKETS - 1);
                buckets[bucket].push([rx, ry]);
            }
            for (bucket, pts) in buckets.into_iter().enumerate() {
                if pts.is_empty() {
                    continue;
                }
                let alpha = (bucket as f32 / (OPACITY_BUCKETS - 1) as f32 * 255.0) as u8;
                plot_ui.points(
                    Points::new("", PlotPoints::new(pts))
                        .color(egui::Color32::from_rgba_unmultiplied(
                            MARKER_COLOR.r(),
                            MARKER_COLOR.g(),
                            MARKER_COLOR.b(),
                            alpha,
                        ))
                        .radius(3.0)
                        .filled(true),
                );
            }
        }
    });

    if response.response.dragged() && !response.response.drag_started() {
        let drag = response.response.drag_delta();
        let delta_rot = rotation_from_drag(drag.x as f64 * 0.01, drag.y as f64 * 0.01);
        rotation = delta_rot * rotation;
    }

    if response.response.hovered() {
        let scroll = ui.input(|i| i.raw_scroll_delta.y);
        if scroll != 0.0 {
            let factor = 1.0 + scroll as f64 * 0.001;
            zoom = (zoom * factor).clamp(0.5, 3.0);
        }
    }

    (rotation, zoom)
}
