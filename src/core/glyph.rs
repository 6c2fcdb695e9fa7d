use std::path::Path;

use log::{error, info, trace};

use super::blitter::copy_region;
use super::loader::load_from_file;
use super::pixel::ColorKey;
use super::rect::{Point, Rect};
use super::surface::{LockedPixels, PixelSurface};
use crate::error::{EngineError, Result};

/// First character code present in an atlas
pub const FIRST_GLYPH: u8 = 32;
/// Last printable ASCII character
pub const LAST_GLYPH: u8 = 126;

/// Bitmap font laid out as a fixed grid of equally sized cells
///
/// Cell `i` holds character `32 + i`, read left to right, top to bottom.
#[derive(Debug, Clone)]
pub struct GlyphAtlas {
    surface: PixelSurface,
    glyph_width: u32,
    glyph_height: u32,
    glyphs_per_row: u32,
}

impl GlyphAtlas {
    /// Load the atlas image and slice it into `glyph_width` x `glyph_height` cells
    pub fn load(
        path: impl AsRef<Path>,
        glyph_width: u32,
        glyph_height: u32,
        row_alignment: usize,
    ) -> Result<Self> {
        check_glyph_size(glyph_width, glyph_height)?;
        let surface = load_from_file(path.as_ref(), row_alignment).map_err(|e| {
            error!("Unable to load alphabet bitmap");
            e
        })?;
        let atlas = Self::from_surface(surface, glyph_width, glyph_height)?;
        info!(
            "Glyph atlas ready: {}x{} cells, {} per row",
            glyph_width, glyph_height, atlas.glyphs_per_row
        );
        Ok(atlas)
    }

    /// Use an already loaded surface as the atlas
    pub fn from_surface(surface: PixelSurface, glyph_width: u32, glyph_height: u32) -> Result<Self> {
        check_glyph_size(glyph_width, glyph_height)?;
        let glyphs_per_row = surface.width() / glyph_width;
        if glyphs_per_row == 0 {
            error!(
                "Glyph width {} exceeds atlas width {}",
                glyph_width,
                surface.width()
            );
            return Err(EngineError::InvalidArgument(format!(
                "glyph width {} is wider than the {} pixel atlas",
                glyph_width,
                surface.width()
            )));
        }
        Ok(Self {
            surface,
            glyph_width,
            glyph_height,
            glyphs_per_row,
        })
    }

    pub fn glyph_width(&self) -> u32 {
        self.glyph_width
    }

    pub fn glyph_height(&self) -> u32 {
        self.glyph_height
    }

    pub fn glyphs_per_row(&self) -> u32 {
        self.glyphs_per_row
    }

    pub fn surface(&self) -> &PixelSurface {
        &self.surface
    }

    /// Grid cell (column, row) of a glyph index
    pub fn cell(&self, index: u32) -> (u32, u32) {
        (index % self.glyphs_per_row, index / self.glyphs_per_row)
    }

    /// Source rectangle of a glyph index in atlas pixels
    pub fn cell_rect(&self, index: u32) -> Rect {
        let (col, row) = self.cell(index);
        Rect::from_origin(
            Point::new((col * self.glyph_width) as i32, (row * self.glyph_height) as i32),
            self.glyph_width,
            self.glyph_height,
        )
    }

    /// Glyph index of a character, `None` for codes outside the printable range
    pub fn index_of(character: u8) -> Option<u32> {
        (FIRST_GLYPH..=LAST_GLYPH)
            .contains(&character)
            .then(|| (character - FIRST_GLYPH) as u32)
    }
}

fn check_glyph_size(glyph_width: u32, glyph_height: u32) -> Result<()> {
    if glyph_width == 0 || glyph_height == 0 {
        error!("Glyph size must be non-zero, got {}x{}", glyph_width, glyph_height);
        return Err(EngineError::InvalidArgument(format!(
            "glyph size must be non-zero, got {}x{}",
            glyph_width, glyph_height
        )));
    }
    Ok(())
}

/// How the space character (glyph index 0) is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpaceGlyph {
    /// Index 0 draws nothing at all
    #[default]
    Skip,
    /// Index 0 is copied from the atlas like any other cell
    BlankCell,
}

/// Draws fixed-width text from a glyph atlas into locked pixels
#[derive(Debug, Clone, Default)]
pub struct TextRenderer {
    atlas: Option<GlyphAtlas>,
    space: SpaceGlyph,
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_atlas(atlas: GlyphAtlas) -> Self {
        Self {
            atlas: Some(atlas),
            space: SpaceGlyph::default(),
        }
    }

    pub fn space_glyph(mut self, space: SpaceGlyph) -> Self {
        self.space = space;
        self
    }

    /// Load (or replace) the atlas from a file
    pub fn load_atlas(
        &mut self,
        path: impl AsRef<Path>,
        glyph_width: u32,
        glyph_height: u32,
        row_alignment: usize,
    ) -> Result<()> {
        self.atlas = Some(GlyphAtlas::load(path, glyph_width, glyph_height, row_alignment)?);
        Ok(())
    }

    pub fn set_atlas(&mut self, atlas: GlyphAtlas) {
        self.atlas = Some(atlas);
    }

    pub fn unload_atlas(&mut self) {
        if self.atlas.take().is_some() {
            info!("Glyph atlas unloaded");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.atlas.is_some()
    }

    pub fn atlas(&self) -> Option<&GlyphAtlas> {
        self.atlas.as_ref()
    }

    /// Pixel width of `text` when drawn, zero without an atlas
    pub fn text_width(&self, text: &str) -> u32 {
        self.atlas
            .as_ref()
            .map_or(0, |a| a.glyph_width * text.len() as u32)
    }

    /// Draw one character with its top-left corner at (x, y)
    pub fn draw_glyph(&self, x: i32, y: i32, character: u8, key: ColorKey, dest: &mut LockedPixels<'_>) {
        let Some(atlas) = self.atlas.as_ref() else {
            return;
        };
        let Some(index) = GlyphAtlas::index_of(character) else {
            trace!("No glyph for character code {}", character);
            return;
        };
        if index == 0 && self.space == SpaceGlyph::Skip {
            return;
        }

        let rect = atlas.cell_rect(index);
        if rect.bottom as u32 > atlas.surface.height() {
            trace!("Glyph {} lies outside the atlas", index);
            return;
        }

        let source = match atlas.surface.lock() {
            Ok(lock) => lock,
            Err(_) => {
                error!("Couldn't lock alphabet surface for draw_glyph");
                return;
            }
        };

        copy_region(&source, rect, dest, Point::new(x, y), key);
    }

    /// Draw `text` left to right, advancing one glyph width per byte
    pub fn draw_text(&self, x: i32, y: i32, text: &str, key: ColorKey, dest: &mut LockedPixels<'_>) {
        let Some(advance) = self.atlas.as_ref().map(|a| a.glyph_width as i32) else {
            return;
        };
        let mut cursor = Some(x);
        for character in text.bytes() {
            // Nothing past i32::MAX can land on a surface
            let Some(cx) = cursor else {
                break;
            };
            self.draw_glyph(cx, y, character, key, dest);
            cursor = cx.checked_add(advance);
        }
    }

    /// Draw a frame rate counter
    pub fn draw_frame_rate(
        &self,
        x: i32,
        y: i32,
        rate: u32,
        key: ColorKey,
        dest: &mut LockedPixels<'_>,
    ) {
        self.draw_text(x, y, &rate.to_string(), key, dest);
    }
}
