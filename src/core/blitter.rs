use log::trace;

use super::pixel::ColorKey;
use super::raster::RasterBuffer;
use super::rect::{Point, Rect};
use super::surface::{LockedPixels, PixelSurface, SurfaceLock};
use crate::error::Result;

/// Copy `src_rect` of `src` onto `dest` at `dest_point`
///
/// `src_rect` defaults to the whole source and `dest_point` to the origin. Pixels
/// rejected by `key` leave the destination untouched. The copy is clipped against
/// both surfaces, so any rectangle and any point are safe.
///
/// Returns the destination area that was visited (empty when fully clipped).
pub fn blit(
    src: &PixelSurface,
    src_rect: Option<Rect>,
    dest: &mut PixelSurface,
    dest_point: Option<Point>,
    key: ColorKey,
) -> Result<Rect> {
    let source = src.lock()?;
    let mut target = dest.lock_mut()?;

    let rect = src_rect.unwrap_or_else(|| source.bounds());
    let point = dest_point.unwrap_or(Point::ZERO);

    Ok(copy_region(&source, rect, &mut target, point, key))
}

/// Copy from an externally rasterized buffer onto `dest`
///
/// Same per-pixel rule as [`blit`]. The source rectangle is first trimmed so its
/// bottom/right edge, once moved to `dest_point`, never runs past the destination.
pub fn blit_from_raster_buffer(
    raster: &RasterBuffer,
    src_rect: Option<Rect>,
    dest: &mut PixelSurface,
    dest_point: Option<Point>,
    key: ColorKey,
) -> Result<Rect> {
    let source = raster.view()?;
    let mut target = dest.lock_mut()?;

    let point = dest_point.unwrap_or(Point::ZERO);
    let mut rect = src_rect.unwrap_or_else(|| source.bounds());

    // Limits can leave the i32 range; a trimmed edge always lands back inside it
    let bottom_limit = i64::from(target.height()) - i64::from(point.y);
    if i64::from(rect.bottom) > bottom_limit {
        rect.bottom = bottom_limit as i32;
    }
    let right_limit = i64::from(target.width()) - i64::from(point.x);
    if i64::from(rect.right) > right_limit {
        rect.right = right_limit as i32;
    }

    Ok(copy_region(&source, rect, &mut target, point, key))
}

/// Row/column keyed copy shared by surface blits and glyph drawing
///
/// Clipping trims the rectangle but never changes which source pixel lands on
/// which destination pixel.
pub(crate) fn copy_region(
    src: &SurfaceLock<'_>,
    src_rect: Rect,
    dest: &mut LockedPixels<'_>,
    dest_point: Point,
    key: ColorKey,
) -> Rect {
    // Source side
    let in_src = src_rect.intersect(&src.bounds());

    // Destination side, in i64 so far-off points and huge rectangles can't overflow
    let x = i64::from(dest_point.x) + i64::from(in_src.left) - i64::from(src_rect.left);
    let y = i64::from(dest_point.y) + i64::from(in_src.top) - i64::from(src_rect.top);
    let (dest_w, dest_h) = (i64::from(dest.width()), i64::from(dest.height()));
    let left = x.clamp(0, dest_w);
    let top = y.clamp(0, dest_h);
    let right = (x + i64::from(in_src.width())).clamp(left, dest_w);
    let bottom = (y + i64::from(in_src.height())).clamp(top, dest_h);

    // Clamped to the destination, so every edge fits in i32
    let visible = Rect::new(left as i32, top as i32, right as i32, bottom as i32);
    if visible.is_empty() {
        trace!("Copy of {:?} to {:?} fully clipped", src_rect, dest_point);
        return visible;
    }

    let src_x = (i64::from(in_src.left) + left - x) as usize;
    let src_y = (i64::from(in_src.top) + top - y) as u32;
    let dest_x = visible.left as usize;
    let width = visible.width() as usize;

    for row in 0..visible.height() {
        let (Some(src_row), Some(dest_row)) =
            (src.row(src_y + row), dest.row_mut(visible.top as u32 + row))
        else {
            break;
        };
        let src_row = &src_row[src_x..src_x + width];
        let dest_row = &mut dest_row[dest_x..dest_x + width];

        match key {
            ColorKey::None => dest_row.copy_from_slice(src_row),
            ColorKey::Key(_) => {
                for (d, &s) in dest_row.iter_mut().zip(src_row) {
                    if key.passes(s) {
                        *d = s;
                    }
                }
            }
        }
    }

    visible
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pixel::Color;

    fn numbered(width: u32, height: u32) -> PixelSurface {
        let mut s = PixelSurface::new(width, height).unwrap();
        for y in 0..height {
            for x in 0..width {
                s.set_pixel(x, y, Color(1 + y * width + x));
            }
        }
        s
    }

    #[test]
    fn defaults_copy_whole_source_to_origin() {
        let src = numbered(3, 2);
        let mut dest = PixelSurface::new(5, 5).unwrap();
        let area = blit(&src, None, &mut dest, None, ColorKey::None).unwrap();
        assert_eq!(area, Rect::new(0, 0, 3, 2));
        assert_eq!(dest.row(0).unwrap(), &[1, 2, 3, 0, 0]);
        assert_eq!(dest.row(1).unwrap(), &[4, 5, 6, 0, 0]);
        assert_eq!(dest.row(2).unwrap(), &[0, 0, 0, 0, 0]);
    }

    #[test]
    fn source_window_with_offset_origin() {
        let src = numbered(4, 4);
        let mut dest = PixelSurface::new(4, 4).unwrap();
        blit(
            &src,
            Some(Rect::new(1, 2, 3, 4)),
            &mut dest,
            Some(Point::new(2, 0)),
            ColorKey::None,
        )
        .unwrap();
        assert_eq!(dest.row(0).unwrap(), &[0, 0, 10, 11]);
        assert_eq!(dest.row(1).unwrap(), &[0, 0, 14, 15]);
    }

    #[test]
    fn negative_destination_is_clipped() {
        let src = numbered(3, 3);
        let mut dest = PixelSurface::new(3, 3).unwrap();
        let area = blit(&src, None, &mut dest, Some(Point::new(-1, -2)), ColorKey::None).unwrap();
        assert_eq!(area, Rect::new(0, 0, 2, 1));
        // Source pixel (1, 2) lands on (0, 0)
        assert_eq!(dest.row(0).unwrap(), &[8, 9, 0]);
        assert_eq!(dest.row(1).unwrap(), &[0, 0, 0]);
    }

    #[test]
    fn source_rect_past_source_edge_is_clipped() {
        let src = numbered(2, 2);
        let mut dest = PixelSurface::new(4, 4).unwrap();
        blit(
            &src,
            Some(Rect::new(-1, 0, 5, 2)),
            &mut dest,
            Some(Point::new(0, 0)),
            ColorKey::None,
        )
        .unwrap();
        // Column -1 of the window falls outside the source, so (0, 0) lands on x = 1
        assert_eq!(dest.row(0).unwrap(), &[0, 1, 2, 0]);
    }

    #[test]
    fn fully_outside_writes_nothing() {
        let src = numbered(2, 2);
        let mut dest = PixelSurface::new(4, 4).unwrap();
        let area = blit(&src, None, &mut dest, Some(Point::new(10, 1)), ColorKey::None).unwrap();
        assert!(area.is_empty());
        assert!(dest.raw_words().unwrap().iter().all(|&p| p == 0));
    }

    #[test]
    fn keyed_pixels_are_skipped() {
        let mut src = PixelSurface::new(2, 1).unwrap();
        src.set_pixel(0, 0, Color::MAGENTA);
        src.set_pixel(1, 0, Color(5));
        let mut dest = PixelSurface::new(2, 1).unwrap();
        dest.fill(Color(9));
        blit(&src, None, &mut dest, None, ColorKey::Key(Color::MAGENTA)).unwrap();
        assert_eq!(dest.row(0).unwrap(), &[9, 5]);
    }

    #[test]
    fn released_destination_is_lock_error() {
        let src = numbered(2, 2);
        let mut dest = PixelSurface::new(2, 2).unwrap();
        dest.release();
        assert!(blit(&src, None, &mut dest, None, ColorKey::None).is_err());
    }

    #[test]
    fn raster_copy_to_fit_trims_bottom_right() {
        let raster = RasterBuffer::from_pixels(4, 4, (1..=16).collect()).unwrap();
        let mut dest = PixelSurface::new(3, 3).unwrap();
        let area = blit_from_raster_buffer(
            &raster,
            None,
            &mut dest,
            Some(Point::new(1, 1)),
            ColorKey::None,
        )
        .unwrap();
        assert_eq!(area, Rect::new(1, 1, 3, 3));
        assert_eq!(dest.row(1).unwrap(), &[0, 1, 2]);
        assert_eq!(dest.row(2).unwrap(), &[0, 5, 6]);
    }
}
