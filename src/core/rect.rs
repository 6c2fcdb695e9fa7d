use glam::IVec2;

/// Integer pixel position
pub type Point = IVec2;

/// Pixel rectangle, half-open on the right and bottom edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    /// Rectangle anchored at the origin
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    /// Rectangle from a corner and a size; the far edges saturate at `i32::MAX`
    pub fn from_origin(origin: Point, width: u32, height: u32) -> Self {
        Self::new(
            origin.x,
            origin.y,
            origin.x.saturating_add_unsigned(width),
            origin.y.saturating_add_unsigned(height),
        )
    }

    pub fn width(&self) -> u32 {
        (i64::from(self.right) - i64::from(self.left)).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (i64::from(self.bottom) - i64::from(self.top)).max(0) as u32
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn origin(&self) -> Point {
        Point::new(self.left, self.top)
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left && point.x < self.right && point.y >= self.top && point.y < self.bottom
    }

    /// Overlap of two rectangles, empty (but well-formed) when disjoint
    pub fn intersect(&self, other: &Rect) -> Rect {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right.min(other.right).max(left);
        let bottom = self.bottom.min(other.bottom).max(top);
        Rect::new(left, top, right, bottom)
    }

    pub fn offset(&self, by: Point) -> Rect {
        Rect::new(
            self.left.saturating_add(by.x),
            self.top.saturating_add(by.y),
            self.right.saturating_add(by.x),
            self.bottom.saturating_add(by.y),
        )
    }
}
