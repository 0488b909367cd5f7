//! View settings and their side-panel UI.

use eframe::egui;

pub struct ViewSettings {
    pub show_clouds: bool,
    pub show_day_night: bool,
    pub show_atmosphere: bool,
    /// Derive the sun from the calendar date instead of the fixed axis.
    pub animate_sun: bool,
    pub use_gpu_rendering: bool,
    pub zoom: f64,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            show_clouds: true,
            show_day_night: true,
            show_atmosphere: true,
            animate_sun: false,
            use_gpu_rendering: true,
            zoom: 1.0,
        }
    }
}

impl ViewSettings {
    pub fn show(&mut self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("Display").strong());
        ui.checkbox(&mut self.show_day_night, "Day/night shading");
        ui.checkbox(&mut self.show_clouds, "Clouds");
        ui.checkbox(&mut self.show_atmosphere, "Atmosphere");
        ui.checkbox(&mut self.animate_sun, "Seasonal sun");
        ui.checkbox(&mut self.use_gpu_rendering, "GPU rendering");
        ui.horizontal(|ui| {
            ui.label("Zoom:");
            ui.add(
                egui::DragValue::new(&mut self.zoom)
                    .range(0.5..=3.0)
                    .speed(0.02),
            );
        });
    }
}
