use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbImage};
use log::{error, info};

use super::pixel::Color;
use super::surface::PixelSurface;
use crate::error::{EngineError, Result};

/// Load an uncompressed bitmap into a new X8R8G8B8 surface
///
/// 24- and 32-bit images are expanded to the engine format with the top byte
/// cleared; no other colour conversion happens. `row_alignment` is the pitch
/// alignment the display device wants, in bytes.
pub fn load_from_file(path: impl AsRef<Path>, row_alignment: usize) -> Result<PixelSurface> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| {
        error!("Unable to load bitmap {}: {}", path.display(), e);
        EngineError::asset(path, e)
    })?;

    let image = image::load_from_memory(&bytes).map_err(|e| {
        error!("Unable to decode bitmap {}: {}", path.display(), e);
        EngineError::asset(path, e)
    })?;

    let surface = surface_from_image(&image, row_alignment)?;
    info!(
        "Loaded {} ({}x{})",
        path.display(),
        surface.width(),
        surface.height()
    );
    Ok(surface)
}

/// Decode an in-memory bitmap
pub fn load_from_memory(bytes: &[u8], row_alignment: usize) -> Result<PixelSurface> {
    let image = image::load_from_memory(bytes).map_err(|e| {
        error!("Unable to decode in-memory bitmap: {}", e);
        EngineError::asset("<memory>", e)
    })?;
    surface_from_image(&image, row_alignment)
}

fn surface_from_image(image: &DynamicImage, row_alignment: usize) -> Result<PixelSurface> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut surface = PixelSurface::with_alignment(width, height, row_alignment).map_err(|e| {
        error!("Unable to create surface for bitmap load");
        e
    })?;

    for (y, row) in rgb.rows().enumerate() {
        if let Some(dest) = surface.row_mut(y as u32) {
            for (d, px) in dest.iter_mut().zip(row) {
                let [r, g, b] = px.0;
                *d = Color::rgb(r, g, b).raw();
            }
        }
    }

    Ok(surface)
}

/// Write the logical pixels of a surface as a 24-bit bitmap
pub fn save_bmp(surface: &PixelSurface, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let lock = surface.lock()?;

    let image = RgbImage::from_fn(surface.width(), surface.height(), |x, y| {
        let c = Color(lock.get(x, y).unwrap_or(0));
        image::Rgb([c.r(), c.g(), c.b()])
    });

    image
        .save_with_format(path, ImageFormat::Bmp)
        .map_err(|e| {
            error!("Unable to write {}: {}", path.display(), e);
            EngineError::AssetSave {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

    info!("Wrote {}", path.display());
    Ok(())
}
