//! Application shell and eframe integration.
//!
//! Owns the simulation state and drives the per-frame sequence: drain
//! ingested records, tick the clock, sweep marker opacities, advance
//! the globe spin, recompute the sun, then paint the view and the
//! overlay panels.

use eframe::egui;
use egui::mutex::Mutex;
use nalgebra::{Matrix3, Vector3};
use std::path::PathBuf;
use std::sync::Arc;

use crate::data::EventStream;
use crate::drawing::{draw_globe_view, GlobeViewFlags};
use crate::markers::MarkerRegistry;
use crate::math::spin_matrix;
use crate::renderer::GlobeRenderer;
use crate::settings::ViewSettings;
use crate::shading::render_globe_image;
use crate::stats::Region;
use crate::texture::{load_glow_sprite, TextureSet};
use crate::time::{sun_direction, SimulationClock};

/// Window clear color behind the globe (#000011).
pub(crate) const BACKGROUND_COLOR: egui::Color32 = egui::Color32::from_rgb(0, 0, 17);

/// Spin step applied once per frame, not per second: visual rotation
/// speed deliberately tracks the display refresh rate while marker
/// timing stays wall-clock.
const ROTATION_STEP_PER_FRAME: f64 = 0.0001;
/// Starting orientation of the globe, radians about the polar axis.
const INITIAL_GLOBE_ROTATION: f64 = 120.0;

const CPU_RENDER_SIZE: usize = 512;

/// The mutable clock/sun/spin trio every frame step reads or advances.
pub(crate) struct SimulationState {
    pub clock: SimulationClock,
    pub sun_direction: Vector3<f64>,
    pub globe_rotation: f64,
}

pub(crate) struct App {
    sim: SimulationState,
    registry: MarkerRegistry,
    events: EventStream,
    settings: ViewSettings,
    textures: TextureSet,
    renderer: Option<Arc<Mutex<GlobeRenderer>>>,
    rotation: Matrix3<f64>,
    start_timestamp: chrono::DateTime<chrono::Utc>,
    sprite_image: Option<egui::ColorImage>,
    sprite_handle: Option<egui::TextureHandle>,
    cpu_globe_handle: Option<egui::TextureHandle>,
}

impl App {
    pub(crate) fn new(cc: &eframe::CreationContext<'_>, data_path: PathBuf) -> Self {
        let gl = cc.gl.as_ref().expect("glow backend required");

        let textures = TextureSet::load();
        let renderer = {
            let mut renderer = GlobeRenderer::new(gl);
            renderer.upload_day_texture(gl, &textures.day);
            if let Some(night) = &textures.night {
                renderer.upload_night_texture(gl, night);
            }
            if let Some(mask) = &textures.specular_clouds {
                renderer.upload_specular_clouds_texture(gl, mask);
            }
            Some(Arc::new(Mutex::new(renderer)))
        };

        let sprite_image = match load_glow_sprite() {
            Ok(image) => Some(image),
            Err(e) => {
                log::warn!("glow sprite unavailable, markers fall back to points: {}", e);
                None
            }
        };

        Self {
            sim: SimulationState {
                clock: SimulationClock::new(),
                sun_direction: Vector3::new(0.0, 0.0, 1.0),
                globe_rotation: INITIAL_GLOBE_ROTATION,
            },
            registry: MarkerRegistry::new(),
            events: EventStream::spawn(data_path),
            settings: ViewSettings::default(),
            textures,
            renderer,
            rotation: Matrix3::identity(),
            start_timestamp: chrono::Utc::now(),
            sprite_image,
            sprite_handle: None,
            cpu_globe_handle: None,
        }
    }

    fn ingest_pending(&mut self) {
        for record in self.events.drain() {
            if let Err(rejection) = self.registry.ingest(&record) {
                log::warn!("rejected event record: {}", rejection);
            }
        }
    }

    fn show_overlay_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("control_panel")
            .resizable(false)
            .default_width(190.0)
            .show(ctx, |ui| {
                let elapsed = self.sim.clock.display_elapsed();
                ui.add_space(6.0);
                // Capped seconds, shown with a minutes label.
                ui.label(
                    egui::RichText::new(format!("Elapsed Time: {:.1} minutes", elapsed)).strong(),
                );
                if ui.button("Reset day").clicked() {
                    self.sim.clock.reset();
                }

                ui.separator();
                for region in Region::ALL {
                    ui.label(format!("{}: {}", region.label(), region.count_at(elapsed)));
                }

                ui.separator();
                ui.label(format!(
                    "{} markers ({} rejected)",
                    self.registry.len(),
                    self.registry.rejected()
                ));

                ui.separator();
                self.settings.show(ui);
            });
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.request_repaint();

        self.ingest_pending();

        let dt = ctx.input(|i| i.stable_dt) as f64;
        self.sim.clock.tick(dt);

        let elapsed = self.sim.clock.display_elapsed();
        if !self.sim.clock.at_cap() {
            self.registry.advance(elapsed);
        }

        self.sim.globe_rotation += ROTATION_STEP_PER_FRAME;

        self.sim.sun_direction = if self.settings.animate_sun {
            let timestamp = self.start_timestamp + chrono::Duration::seconds(elapsed as i64);
            sun_direction(timestamp)
        } else {
            Vector3::new(0.0, 0.0, 1.0)
        };

        if self.sprite_handle.is_none() {
            if let Some(image) = self.sprite_image.take() {
                self.sprite_handle = Some(ctx.load_texture(
                    "glow_sprite",
                    image,
                    egui::TextureOptions::LINEAR,
                ));
            }
        }

        self.show_overlay_panel(ctx);

        let spin = spin_matrix(self.sim.globe_rotation);
        let sun_body = spin.transpose() * self.sim.sun_direction;
        let sun_body_f32 = [sun_body.x as f32, sun_body.y as f32, sun_body.z as f32];

        if !self.settings.use_gpu_rendering {
            let inv_rotation = (self.rotation * spin).transpose();
            let image = render_globe_image(
                &self.textures.day,
                self.textures.night.as_ref(),
                self.textures.specular_clouds.as_ref(),
                &inv_rotation,
                &sun_body,
                CPU_RENDER_SIZE,
                self.settings.show_clouds,
                self.settings.show_day_night,
                self.settings.show_atmosphere,
            );
            match &mut self.cpu_globe_handle {
                Some(handle) => handle.set(image, egui::TextureOptions::LINEAR),
                None => {
                    self.cpu_globe_handle =
                        Some(ctx.load_texture("cpu_globe", image, egui::TextureOptions::LINEAR));
                }
            }
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::default().fill(BACKGROUND_COLOR))
            .show(ctx, |ui| {
                let size = ui.available_size();
                let flags = GlobeViewFlags {
                    show_clouds: self.settings.show_clouds,
                    show_day_night: self.settings.show_day_night,
                    show_atmosphere: self.settings.show_atmosphere,
                    use_gpu_rendering: self.settings.use_gpu_rendering,
                };
                let (rotation, zoom) = draw_globe_view(
                    ui,
                    "globe_view",
                    self.renderer.as_ref(),
                    self.cpu_globe_handle.as_ref(),
                    self.registry.markers(),
                    self.sprite_handle.as_ref(),
                    self.rotation,
                    &spin,
                    sun_body_f32,
                    self.settings.zoom,
                    flags,
                    size.x,
                    size.y,
                    BACKGROUND_COLOR,
                );
                self.rotation = rotation;
                self.settings.zoom = zoom;
            });
    }

    fn on_exit(&mut self, gl: Option<&eframe::glow::Context>) {
        if let (Some(gl), Some(renderer)) = (gl, &self.renderer) {
            renderer.lock().destroy(gl);
        }
    }
}
