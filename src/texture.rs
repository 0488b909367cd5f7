//! Texture loading, decoding, and sampling.
//!
//! Decodes the day, night and specular/clouds images plus the marker
//! glow sprite. Every load is allowed to fail: shading degrades to
//! neutral defaults instead of crashing when an asset is missing.

use egui::ColorImage;

#[derive(Clone)]
pub struct EarthTexture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[u8; 3]>,
}

impl EarthTexture {
    pub fn load_from_path(path: &std::path::Path) -> Result<Self, String> {
        let bytes = std::fs::read(path).map_err(|e| format!("{}: {}", path.display(), e))?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        use std::io::Cursor;
        let cursor = Cursor::new(bytes);
        let mut reader = image::ImageReader::new(cursor)
            .with_guessed_format()
            .map_err(|e| format!("Failed to guess format: {}", e))?;
        reader.no_limits();
        let img = reader
            .decode()
            .map_err(|e| format!("Failed to decode image: {}", e))?
            .to_rgb8();
        let width = img.width();
        let height = img.height();
        let pixels: Vec<[u8; 3]> = img.pixels().map(|p| p.0).collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Flat ocean-blue stand-in for a missing day texture.
    pub fn default_placeholder() -> Self {
        Self {
            width: 2,
            height: 1,
            pixels: vec![[30, 60, 120], [30, 60, 120]],
        }
    }

    pub fn sample(&self, u: f64, v: f64) -> [u8; 3] {
        let x = ((u * self.width as f64) as u32).min(self.width - 1);
        let y = ((v * self.height as f64) as u32).min(self.height - 1);
        self.pixels[(y * self.width + x) as usize]
    }
}

/// The three surface textures the shading model samples.
pub struct TextureSet {
    pub day: EarthTexture,
    pub night: Option<EarthTexture>,
    pub specular_clouds: Option<EarthTexture>,
}

impl TextureSet {
    /// Load from the `textures/` directory next to the manifest; any
    /// missing asset is logged and replaced by its neutral default.
    pub fn load() -> Self {
        let day = match EarthTexture::load_from_path(&asset_path("textures/earth_day.jpg")) {
            Ok(texture) => texture,
            Err(e) => {
                log::warn!("day texture unavailable, using placeholder: {}", e);
                EarthTexture::default_placeholder()
            }
        };
        Self {
            day,
            night: load_optional("textures/earth_night.jpg"),
            specular_clouds: load_optional("textures/earth_specular_clouds.jpg"),
        }
    }
}

fn load_optional(relative: &str) -> Option<EarthTexture> {
    match EarthTexture::load_from_path(&asset_path(relative)) {
        Ok(texture) => {
            log::info!("loaded {}", relative);
            Some(texture)
        }
        Err(e) => {
            log::warn!("{} unavailable: {}", relative, e);
            None
        }
    }
}

/// Decode the marker glow sprite, alpha channel included.
pub fn load_glow_sprite() -> Result<ColorImage, String> {
    let path = asset_path("textures/glow_particle.png");
    let bytes = std::fs::read(&path).map_err(|e| format!("{}: {}", path.display(), e))?;
    use std::io::Cursor;
    let img = image::ImageReader::new(Cursor::new(bytes.as_slice()))
        .with_guessed_format()
        .map_err(|e| format!("Failed to guess format: {}", e))?
        .decode()
        .map_err(|e| format!("Failed to decode image: {}", e))?
        .to_rgba8();
    let size = [img.width() as usize, img.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, img.as_raw()))
}

pub(crate) fn asset_path(relative: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(relative)
}
