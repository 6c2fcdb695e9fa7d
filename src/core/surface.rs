use log::{debug, error};

use super::pixel::{Color, PixelFormat, BYTES_PER_PIXEL};
use super::rect::Rect;
use crate::error::{EngineError, Result};

/// Owned rectangular buffer of 32-bit pixels
///
/// Rows are `pitch` bytes apart. The pitch can exceed `width * 4` when the surface
/// was allocated with a row alignment; the padding words are never touched by
/// the drawing routines.
#[derive(Debug, Clone)]
pub struct PixelSurface {
    width: u32,
    height: u32,
    pitch: usize,
    format: PixelFormat,
    /// `None` once the surface has been released
    pixels: Option<Vec<u32>>,
}

impl PixelSurface {
    /// Allocate a surface with a tight pitch, cleared to black
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::with_alignment(width, height, BYTES_PER_PIXEL)
    }

    /// Allocate a surface whose pitch is rounded up to `row_alignment` bytes
    pub fn with_alignment(width: u32, height: u32, row_alignment: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            error!("Refusing to allocate empty {}x{} surface", width, height);
            return Err(EngineError::SurfaceAlloc(format!(
                "surface dimensions must be non-zero, got {}x{}",
                width, height
            )));
        }

        let alignment = row_alignment.max(BYTES_PER_PIXEL);
        if alignment % BYTES_PER_PIXEL != 0 {
            return Err(EngineError::SurfaceAlloc(format!(
                "row alignment {} is not a multiple of {}",
                alignment, BYTES_PER_PIXEL
            )));
        }

        let layout = (width as usize)
            .checked_mul(BYTES_PER_PIXEL)
            .map(|row| row.div_ceil(alignment) * alignment)
            .and_then(|pitch| pitch.checked_mul(height as usize).map(|total| (pitch, total)));
        let Some((pitch, total_bytes)) = layout else {
            error!("Surface size overflow for {}x{}", width, height);
            return Err(EngineError::SurfaceAlloc(format!(
                "{}x{} surface does not fit in memory",
                width, height
            )));
        };

        let len = total_bytes / BYTES_PER_PIXEL;
        let mut pixels = Vec::new();
        if let Err(e) = pixels.try_reserve_exact(len) {
            error!("Unable to allocate {} byte surface: {}", total_bytes, e);
            return Err(EngineError::SurfaceAlloc(e.to_string()));
        }
        pixels.resize(len, 0);

        debug!("Allocated {}x{} surface, pitch {} bytes", width, height, pitch);

        Ok(Self {
            width,
            height,
            pitch,
            format: PixelFormat::X8R8G8B8,
            pixels: Some(pixels),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Row stride in bytes
    pub fn pitch(&self) -> usize {
        self.pitch
    }

    /// Row stride in 32-bit words
    pub fn pitch_words(&self) -> usize {
        self.pitch / BYTES_PER_PIXEL
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    pub fn is_released(&self) -> bool {
        self.pixels.is_none()
    }

    /// Free the pixel storage; later locks fail
    pub fn release(&mut self) {
        if self.pixels.take().is_some() {
            debug!("Released {}x{} surface", self.width, self.height);
        }
    }

    /// Whole buffer including row padding, for handing to a presenter
    pub fn raw_words(&self) -> Option<&[u32]> {
        self.pixels.as_deref()
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| y as usize * self.pitch_words() + x as usize)
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Option<Color> {
        let idx = self.index(x, y)?;
        self.pixels.as_ref().map(|p| Color(p[idx]))
    }

    /// Returns false if the coordinate is outside the surface or it was released
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) -> bool {
        match (self.index(x, y), self.pixels.as_mut()) {
            (Some(idx), Some(pixels)) => {
                pixels[idx] = color.0;
                true
            }
            _ => false,
        }
    }

    /// Logical pixels of row `y`, padding excluded
    pub fn row(&self, y: u32) -> Option<&[u32]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.pitch_words();
        let width = self.width as usize;
        self.pixels.as_deref().map(|p| &p[start..start + width])
    }

    pub fn row_mut(&mut self, y: u32) -> Option<&mut [u32]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.pitch_words();
        let width = self.width as usize;
        self.pixels.as_deref_mut().map(|p| &mut p[start..start + width])
    }

    /// Set every logical pixel to `color`
    pub fn fill(&mut self, color: Color) {
        self.fill_rect(self.bounds(), color);
    }

    /// Solid rectangle, clipped to the surface
    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let clipped = rect.intersect(&self.bounds());
        if clipped.is_empty() {
            return;
        }
        for y in clipped.top..clipped.bottom {
            if let Some(row) = self.row_mut(y as u32) {
                row[clipped.left as usize..clipped.right as usize].fill(color.0);
            }
        }
    }

    /// Read-only lock for the duration of a copy
    pub fn lock(&self) -> Result<SurfaceLock<'_>> {
        match self.pixels.as_deref() {
            Some(pixels) => Ok(SurfaceLock {
                pixels,
                width: self.width,
                height: self.height,
                pitch_words: self.pitch_words(),
            }),
            None => Err(lock_error(self.width, self.height)),
        }
    }

    /// Writable lock for the duration of a copy or text pass
    pub fn lock_mut(&mut self) -> Result<LockedPixels<'_>> {
        let (width, height, pitch_words) = (self.width, self.height, self.pitch_words());
        match self.pixels.as_deref_mut() {
            Some(pixels) => Ok(LockedPixels {
                pixels,
                width,
                height,
                pitch_words,
            }),
            None => Err(lock_error(width, height)),
        }
    }
}

fn lock_error(width: u32, height: u32) -> EngineError {
    error!("Cannot lock released {}x{} surface", width, height);
    EngineError::Lock(format!("{}x{} surface has been released", width, height))
}

fn validate_layout(len: usize, width: u32, height: u32, pitch: usize) -> Result<usize> {
    if pitch % BYTES_PER_PIXEL != 0 {
        return Err(EngineError::InvalidArgument(format!(
            "pitch {} is not a multiple of {}",
            pitch, BYTES_PER_PIXEL
        )));
    }
    let pitch_words = pitch / BYTES_PER_PIXEL;
    if pitch_words < width as usize {
        return Err(EngineError::InvalidArgument(format!(
            "pitch {} is narrower than {} pixels",
            pitch, width
        )));
    }
    let needed = match height {
        0 => 0,
        h => (h as usize - 1) * pitch_words + width as usize,
    };
    if len < needed {
        return Err(EngineError::InvalidArgument(format!(
            "buffer of {} words is too small for {}x{} with pitch {}",
            len, width, height, pitch
        )));
    }
    Ok(pitch_words)
}

/// Read view over locked pixels
#[derive(Debug, Clone, Copy)]
pub struct SurfaceLock<'a> {
    pixels: &'a [u32],
    width: u32,
    height: u32,
    pitch_words: usize,
}

impl<'a> SurfaceLock<'a> {
    /// Wrap a caller-owned buffer; `pitch` is in bytes
    pub fn from_raw(pixels: &'a [u32], width: u32, height: u32, pitch: usize) -> Result<Self> {
        let pitch_words = validate_layout(pixels.len(), width, height, pitch)?;
        Ok(Self {
            pixels,
            width,
            height,
            pitch_words,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pitch_words(&self) -> usize {
        self.pitch_words
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    pub fn get(&self, x: u32, y: u32) -> Option<u32> {
        (x < self.width && y < self.height)
            .then(|| self.pixels[y as usize * self.pitch_words + x as usize])
    }

    /// Visible pixels of row `y`, without the pitch padding
    pub fn row(&self, y: u32) -> Option<&'a [u32]> {
        if y >= self.height {
            return None;
        }
        let pixels: &'a [u32] = self.pixels;
        let start = y as usize * self.pitch_words;
        pixels.get(start..start + self.width as usize)
    }
}

/// Write view over locked pixels
///
/// This is what the text renderer draws into: either a locked surface or a raw
/// buffer handed over by the caller.
#[derive(Debug)]
pub struct LockedPixels<'a> {
    pixels: &'a mut [u32],
    width: u32,
    height: u32,
    pitch_words: usize,
}

impl<'a> LockedPixels<'a> {
    /// Wrap a caller-owned buffer; `pitch` is in bytes
    pub fn from_raw(pixels: &'a mut [u32], width: u32, height: u32, pitch: usize) -> Result<Self> {
        let pitch_words = validate_layout(pixels.len(), width, height, pitch)?;
        Ok(Self {
            pixels,
            width,
            height,
            pitch_words,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row stride in bytes
    pub fn pitch(&self) -> usize {
        self.pitch_words * BYTES_PER_PIXEL
    }

    pub fn pitch_words(&self) -> usize {
        self.pitch_words
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    pub fn get(&self, x: u32, y: u32) -> Option<u32> {
        (x < self.width && y < self.height)
            .then(|| self.pixels[y as usize * self.pitch_words + x as usize])
    }

    pub fn set(&mut self, x: u32, y: u32, color: Color) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.pixels[y as usize * self.pitch_words + x as usize] = color.0;
        true
    }

    pub fn row_mut(&mut self, y: u32) -> Option<&mut [u32]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.pitch_words;
        self.pixels.get_mut(start..start + self.width as usize)
    }

    /// Reborrow as a read view
    pub fn as_lock(&self) -> SurfaceLock<'_> {
        SurfaceLock {
            pixels: &*self.pixels,
            width: self.width,
            height: self.height,
            pitch_words: self.pitch_words,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tight_pitch_by_default() {
        let s = PixelSurface::new(10, 3).unwrap();
        assert_eq!(s.pitch(), 40);
        assert_eq!(s.pitch_words(), 10);
        assert_eq!(s.raw_words().unwrap().len(), 30);
    }

    #[test]
    fn alignment_pads_rows() {
        let s = PixelSurface::with_alignment(10, 3, 256).unwrap();
        assert_eq!(s.pitch(), 256);
        assert_eq!(s.pitch_words(), 64);
        assert_eq!(s.row(0).unwrap().len(), 10);
    }

    #[test]
    fn zero_size_is_alloc_error() {
        assert!(matches!(
            PixelSurface::new(0, 4),
            Err(EngineError::SurfaceAlloc(_))
        ));
    }

    #[test]
    fn bad_alignment_is_alloc_error() {
        assert!(matches!(
            PixelSurface::with_alignment(4, 4, 6),
            Err(EngineError::SurfaceAlloc(_))
        ));
    }

    #[test]
    fn pixel_access_is_bounds_checked() {
        let mut s = PixelSurface::with_alignment(4, 4, 64).unwrap();
        assert!(s.set_pixel(3, 3, Color(7)));
        assert_eq!(s.get_pixel(3, 3), Some(Color(7)));
        assert!(!s.set_pixel(4, 0, Color(1)));
        assert_eq!(s.get_pixel(0, 4), None);
        // Word (3 * 16 + 3) holds the pixel
        assert_eq!(s.raw_words().unwrap()[3 * 16 + 3], 7);
    }

    #[test]
    fn fill_leaves_padding_alone() {
        let mut s = PixelSurface::with_alignment(2, 2, 16).unwrap();
        s.fill(Color(0xABCDEF));
        let raw = s.raw_words().unwrap();
        assert_eq!(raw, &[0xABCDEF, 0xABCDEF, 0, 0, 0xABCDEF, 0xABCDEF, 0, 0]);
    }

    #[test]
    fn fill_rect_clips() {
        let mut s = PixelSurface::new(4, 4).unwrap();
        s.fill_rect(Rect::new(-2, 2, 2, 10), Color(1));
        assert_eq!(s.get_pixel(0, 2), Some(Color(1)));
        assert_eq!(s.get_pixel(1, 3), Some(Color(1)));
        assert_eq!(s.get_pixel(2, 2), Some(Color(0)));
        assert_eq!(s.get_pixel(0, 1), Some(Color(0)));
    }

    #[test]
    fn released_surface_refuses_locks() {
        let mut s = PixelSurface::new(2, 2).unwrap();
        s.release();
        assert!(s.is_released());
        assert!(matches!(s.lock(), Err(EngineError::Lock(_))));
        assert!(matches!(s.lock_mut(), Err(EngineError::Lock(_))));
        assert_eq!(s.get_pixel(0, 0), None);
        assert!(!s.set_pixel(0, 0, Color(1)));
    }

    #[test]
    fn row_views_are_bounds_checked() {
        let mut buf = vec![0u32; 8 * 3];
        let mut view = LockedPixels::from_raw(&mut buf, 5, 3, 32).unwrap();
        assert_eq!(view.row_mut(2).map(|r| r.len()), Some(5));
        assert!(view.row_mut(3).is_none());
        let lock = view.as_lock();
        assert_eq!(lock.row(0).map(<[u32]>::len), Some(5));
        assert!(lock.row(3).is_none());
        assert!(lock.row(u32::MAX).is_none());
    }

    #[test]
    fn raw_view_rejects_short_pitch() {
        let mut buf = vec![0u32; 16];
        assert!(matches!(
            LockedPixels::from_raw(&mut buf, 4, 4, 12),
            Err(EngineError::InvalidArgument(_))
        ));
        assert!(matches!(
            LockedPixels::from_raw(&mut buf, 4, 4, 18),
            Err(EngineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn raw_view_rejects_short_buffer() {
        let buf = vec![0u32; 10];
        assert!(SurfaceLock::from_raw(&buf, 4, 3, 16).is_err());
        assert!(SurfaceLock::from_raw(&buf, 4, 3, 12).is_err());
        // Last row needs only `width` words
        let buf = vec![0u32; 2 * 8 + 4];
        assert!(SurfaceLock::from_raw(&buf, 4, 3, 32).is_ok());
    }

    #[test]
    fn locked_pixels_write_through() {
        let mut s = PixelSurface::with_alignment(3, 2, 32).unwrap();
        {
            let mut locked = s.lock_mut().unwrap();
            assert_eq!(locked.pitch(), 32);
            assert!(locked.set(2, 1, Color(9)));
            assert!(!locked.set(3, 1, Color(9)));
        }
        assert_eq!(s.get_pixel(2, 1), Some(Color(9)));
    }
}
