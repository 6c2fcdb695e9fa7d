use super::pixel::{Color, BYTES_PER_PIXEL};
use super::rect::Rect;
use super::surface::SurfaceLock;
use crate::error::{EngineError, Result};

/// Top-down 32-bit pixel buffer produced outside the surface system
///
/// Rows are tightly packed, so the pitch is always `width * 4` bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl RasterBuffer {
    /// Black buffer of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    /// Adopt existing row-major pixels
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u32>) -> Result<Self> {
        if pixels.len() != width as usize * height as usize {
            return Err(EngineError::InvalidArgument(format!(
                "{} pixels supplied for a {}x{} raster",
                pixels.len(),
                width,
                height
            )));
        }
        Ok(Self { width, height, pixels })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row stride in bytes
    pub fn pitch(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Color> {
        (x < self.width && y < self.height)
            .then(|| Color(self.pixels[(y * self.width + x) as usize]))
    }

    /// Read view for copying out of the buffer
    pub fn view(&self) -> Result<SurfaceLock<'_>> {
        SurfaceLock::from_raw(&self.pixels, self.width, self.height, self.pitch())
    }

    fn plot(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        self.pixels[(y as u32 * self.width + x as u32) as usize] = color.0;
    }
}

/// 2D drawing operations for a raster canvas
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Fill the entire buffer
    Clear(Color),

    Pixel { x: i32, y: i32, color: Color },

    /// Horizontal run of `length` pixels starting at (x, y)
    HLine { x: i32, y: i32, length: u32, color: Color },

    /// Vertical run of `length` pixels starting at (x, y)
    VLine { x: i32, y: i32, length: u32, color: Color },

    /// Filled rectangle
    Rect { rect: Rect, color: Color },

    /// Circle outline centred on (cx, cy)
    Circle { cx: i32, cy: i32, radius: u32, color: Color },

    FilledCircle { cx: i32, cy: i32, radius: u32, color: Color },

    /// Line from (x1, y1) to (x2, y2), both ends included
    Line { x1: i32, y1: i32, x2: i32, y2: i32, color: Color },
}

/// Software rasterizer that records operations and renders them into a [`RasterBuffer`]
#[derive(Debug, Clone)]
pub struct RasterCanvas {
    width: u32,
    height: u32,
    operations: Vec<DrawOp>,
}

impl RasterCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            operations: Vec::new(),
        }
    }

    /// Add draw operation - functional style
    pub fn draw(mut self, op: DrawOp) -> Self {
        self.operations.push(op);
        self
    }

    pub fn operations(&self) -> &[DrawOp] {
        &self.operations
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Execute all pending operations in order onto a fresh black buffer
    pub fn rasterize(&self) -> RasterBuffer {
        let mut buffer = RasterBuffer::new(self.width, self.height);
        for op in &self.operations {
            execute_op(&mut buffer, op);
        }
        buffer
    }
}

fn execute_op(buffer: &mut RasterBuffer, op: &DrawOp) {
    match *op {
        DrawOp::Clear(color) => buffer.pixels.fill(color.0),
        DrawOp::Pixel { x, y, color } => buffer.plot(x, y, color),
        DrawOp::HLine { x, y, length, color } => {
            for i in 0..length as i32 {
                buffer.plot(x + i, y, color);
            }
        }
        DrawOp::VLine { x, y, length, color } => {
            for i in 0..length as i32 {
                buffer.plot(x, y + i, color);
            }
        }
        DrawOp::Rect { rect, color } => {
            let clipped = rect.intersect(&buffer.bounds());
            for y in clipped.top..clipped.bottom {
                let start = (y as u32 * buffer.width) as usize;
                buffer.pixels[start + clipped.left as usize..start + clipped.right as usize]
                    .fill(color.0);
            }
        }
        DrawOp::Circle { cx, cy, radius, color } => draw_circle(buffer, cx, cy, radius, color),
        DrawOp::FilledCircle { cx, cy, radius, color } => {
            let r = radius as i32;
            for dy in -r..=r {
                for dx in -r..=r {
                    if dx * dx + dy * dy <= r * r {
                        buffer.plot(cx + dx, cy + dy, color);
                    }
                }
            }
        }
        DrawOp::Line { x1, y1, x2, y2, color } => draw_line(buffer, x1, y1, x2, y2, color),
    }
}

/// Midpoint circle algorithm
fn draw_circle(buffer: &mut RasterBuffer, cx: i32, cy: i32, radius: u32, color: Color) {
    let (mut x, mut y) = (radius as i32, 0i32);
    let mut p = 1 - radius as i32;

    while x >= y {
        for (px, py) in [
            (cx + x, cy + y),
            (cx - x, cy + y),
            (cx + x, cy - y),
            (cx - x, cy - y),
            (cx + y, cy + x),
            (cx - y, cy + x),
            (cx + y, cy - x),
            (cx - y, cy - x),
        ] {
            buffer.plot(px, py, color);
        }

        y += 1;
        if p <= 0 {
            p += 2 * y + 1;
        } else {
            x -= 1;
            p += 2 * (y - x) + 1;
        }
    }
}

/// Bresenham's line algorithm
fn draw_line(buffer: &mut RasterBuffer, x1: i32, y1: i32, x2: i32, y2: i32, color: Color) {
    let (mut x, mut y) = (x1, y1);

    let dx = (x2 - x).abs();
    let dy = -(y2 - y).abs();
    let sx = if x < x2 { 1 } else { -1 };
    let sy = if y < y2 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        buffer.plot(x, y, color);

        if x == x2 && y == y2 {
            break;
        }

        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color::rgb(255, 0, 0);

    #[test]
    fn canvas_starts_black() {
        let buffer = RasterCanvas::new(4, 3).rasterize();
        assert_eq!(buffer.pixels().len(), 12);
        assert!(buffer.pixels().iter().all(|&p| p == 0));
        assert_eq!(buffer.pitch(), 16);
    }

    #[test]
    fn operations_apply_in_order() {
        let buffer = RasterCanvas::new(3, 3)
            .draw(DrawOp::Clear(Color::WHITE))
            .draw(DrawOp::Pixel { x: 1, y: 1, color: RED })
            .rasterize();
        assert_eq!(buffer.get(0, 0), Some(Color::WHITE));
        assert_eq!(buffer.get(1, 1), Some(RED));
    }

    #[test]
    fn out_of_bounds_plots_are_ignored() {
        let buffer = RasterCanvas::new(2, 2)
            .draw(DrawOp::Pixel { x: -1, y: 0, color: RED })
            .draw(DrawOp::Pixel { x: 2, y: 1, color: RED })
            .draw(DrawOp::HLine { x: -5, y: 0, length: 20, color: RED })
            .rasterize();
        assert_eq!(buffer.get(0, 0), Some(RED));
        assert_eq!(buffer.get(1, 0), Some(RED));
        assert_eq!(buffer.get(0, 1), Some(Color::BLACK));
    }

    #[test]
    fn rect_is_half_open_and_clipped() {
        let buffer = RasterCanvas::new(4, 4)
            .draw(DrawOp::Rect { rect: Rect::new(2, -1, 9, 2), color: RED })
            .rasterize();
        assert_eq!(buffer.get(1, 0), Some(Color::BLACK));
        assert_eq!(buffer.get(2, 0), Some(RED));
        assert_eq!(buffer.get(3, 1), Some(RED));
        assert_eq!(buffer.get(3, 2), Some(Color::BLACK));
    }

    #[test]
    fn line_includes_both_ends() {
        let buffer = RasterCanvas::new(5, 5)
            .draw(DrawOp::Line { x1: 0, y1: 0, x2: 4, y2: 4, color: RED })
            .rasterize();
        for i in 0..5 {
            assert_eq!(buffer.get(i, i), Some(RED));
        }
        assert_eq!(buffer.get(1, 0), Some(Color::BLACK));
    }

    #[test]
    fn filled_circle_covers_centre_not_corners() {
        let buffer = RasterCanvas::new(9, 9)
            .draw(DrawOp::FilledCircle { cx: 4, cy: 4, radius: 3, color: RED })
            .rasterize();
        assert_eq!(buffer.get(4, 4), Some(RED));
        assert_eq!(buffer.get(4, 1), Some(RED));
        assert_eq!(buffer.get(1, 1), Some(Color::BLACK));
    }

    #[test]
    fn circle_outline_leaves_centre_empty() {
        let buffer = RasterCanvas::new(9, 9)
            .draw(DrawOp::Circle { cx: 4, cy: 4, radius: 3, color: RED })
            .rasterize();
        assert_eq!(buffer.get(7, 4), Some(RED));
        assert_eq!(buffer.get(4, 1), Some(RED));
        assert_eq!(buffer.get(4, 4), Some(Color::BLACK));
    }

    #[test]
    fn from_pixels_checks_length() {
        assert!(RasterBuffer::from_pixels(2, 2, vec![0; 3]).is_err());
        assert!(RasterBuffer::from_pixels(2, 2, vec![0; 4]).is_ok());
    }
}
