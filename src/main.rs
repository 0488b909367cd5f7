use eframe::egui;

mod app;
mod data;
mod drawing;
mod geo;
mod markers;
mod math;
mod renderer;
mod settings;
mod shading;
mod stats;
mod texture;
mod time;

use app::App;

/// Globe radius in scene units; marker placement and the view scale
/// both key off this.
pub const GLOBE_RADIUS: f64 = 2.0;

fn main() -> eframe::Result<()> {
    env_logger::init();
    log::info!(
        "globe-pulse {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH")
    );

    let data_path = std::env::args()
        .nth(1)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| texture::asset_path("data/events.csv"));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Globe Pulse",
        options,
        Box::new(move |cc| Ok(Box::new(App::new(cc, data_path)))),
    )
}
