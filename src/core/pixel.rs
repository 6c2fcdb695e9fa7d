use serde::{Deserialize, Serialize};

/// Bytes per pixel of every engine surface
pub const BYTES_PER_PIXEL: usize = 4;

/// Packed 32-bit pixel, laid out as 0xXXRRGGBB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Color = Color(0x0000_0000);
    pub const WHITE: Color = Color(0x00FF_FFFF);
    /// Magenta, the key the game's sprites and font use for transparency
    pub const MAGENTA: Color = Color(0x00FF_00FF);

    /// Pack with the unused top byte cleared
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// Pack with an explicit top byte
    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Color(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    pub const fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn b(self) -> u8 {
        self.0 as u8
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for Color {
    fn from(value: u32) -> Self {
        Color(value)
    }
}

/// Pixel formats a back buffer may be presented in
///
/// Engine surfaces are always `X8R8G8B8`; the others only describe what the
/// presentation side converts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    #[value(name = "x8r8g8b8")]
    X8R8G8B8,
    #[value(name = "a8r8g8b8")]
    A8R8G8B8,
    #[value(name = "x8b8g8r8")]
    X8B8G8R8,
}

impl PixelFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        BYTES_PER_PIXEL
    }
}

impl Default for PixelFormat {
    fn default() -> Self {
        PixelFormat::X8R8G8B8
    }
}

/// Transparency rule for a copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorKey {
    /// Every source pixel is written
    #[default]
    None,
    /// Source pixels exactly equal to this value are skipped
    Key(Color),
}

impl ColorKey {
    /// Build from the classic `(transparent, key)` argument pair
    pub fn from_flag(transparent: bool, key: Color) -> Self {
        if transparent {
            ColorKey::Key(key)
        } else {
            ColorKey::None
        }
    }

    /// Should this source pixel be written?
    #[inline]
    pub fn passes(self, pixel: u32) -> bool {
        match self {
            ColorKey::None => true,
            ColorKey::Key(key) => pixel != key.0,
        }
    }
}
