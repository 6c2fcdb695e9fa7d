use paddle_court::core::{
    Color, ColorKey, GlyphAtlas, LockedPixels, PixelSurface, SpaceGlyph, TextRenderer,
};
use paddle_court::EngineError;

const GLYPH_W: u32 = 3;
const GLYPH_H: u32 = 4;
const PER_ROW: u32 = 10;
const KEY: Color = Color::MAGENTA;

/// Every pixel of cell `i` is distinct; the top-left pixel of each cell is the key
fn atlas_surface() -> PixelSurface {
    let rows = 95u32.div_ceil(PER_ROW);
    let mut surface = PixelSurface::new(GLYPH_W * PER_ROW, GLYPH_H * rows).unwrap();
    for index in 0..95 {
        let (col, row) = (index % PER_ROW, index / PER_ROW);
        for ly in 0..GLYPH_H {
            for lx in 0..GLYPH_W {
                let color = if lx == 0 && ly == 0 {
                    KEY
                } else {
                    Color((index + 1) << 8 | (ly * GLYPH_W + lx))
                };
                surface.set_pixel(col * GLYPH_W + lx, row * GLYPH_H + ly, color);
            }
        }
    }
    surface
}

fn renderer() -> TextRenderer {
    TextRenderer::with_atlas(GlyphAtlas::from_surface(atlas_surface(), GLYPH_W, GLYPH_H).unwrap())
}

const DEST_W: u32 = 16;
const DEST_H: u32 = 12;
const BACKGROUND: u32 = 0x0000_0001;

// ============================================================================
// Glyph lookup
// ============================================================================

#[test]
fn test_every_printable_glyph_reproduces_its_cell() {
    let atlas = GlyphAtlas::from_surface(atlas_surface(), GLYPH_W, GLYPH_H).unwrap();
    let source = atlas.surface().clone();
    let renderer = TextRenderer::with_atlas(atlas);

    for ch in 33u8..=126 {
        let index = (ch - 32) as u32;
        let (cx, cy) = ((index % PER_ROW) * GLYPH_W, (index / PER_ROW) * GLYPH_H);

        for key in [ColorKey::None, ColorKey::Key(KEY)] {
            let mut buf = vec![BACKGROUND; (DEST_W * DEST_H) as usize];
            let mut dest = LockedPixels::from_raw(&mut buf, DEST_W, DEST_H, DEST_W as usize * 4)
                .unwrap();
            renderer.draw_glyph(5, 4, ch, key, &mut dest);

            for y in 0..DEST_H {
                for x in 0..DEST_W {
                    let inside = (5..5 + GLYPH_W).contains(&x) && (4..4 + GLYPH_H).contains(&y);
                    let expected = if inside {
                        let s = source.get_pixel(cx + x - 5, cy + y - 4).unwrap().0;
                        if key.passes(s) {
                            s
                        } else {
                            BACKGROUND
                        }
                    } else {
                        BACKGROUND
                    };
                    assert_eq!(dest.get(x, y), Some(expected), "char {} at ({}, {})", ch, x, y);
                }
            }
        }
    }
}

#[test]
fn test_space_writes_nothing() {
    let renderer = renderer();
    let mut buf = vec![BACKGROUND; (DEST_W * DEST_H) as usize];
    let mut dest =
        LockedPixels::from_raw(&mut buf, DEST_W, DEST_H, DEST_W as usize * 4).unwrap();
    renderer.draw_text(0, 0, "     ", ColorKey::None, &mut dest);
    assert!(buf.iter().all(|&p| p == BACKGROUND));
}

#[test]
fn test_blank_cell_policy_draws_space() {
    let renderer = renderer().space_glyph(SpaceGlyph::BlankCell);
    let mut buf = vec![BACKGROUND; (DEST_W * DEST_H) as usize];
    let mut dest =
        LockedPixels::from_raw(&mut buf, DEST_W, DEST_H, DEST_W as usize * 4).unwrap();
    renderer.draw_glyph(0, 0, b' ', ColorKey::None, &mut dest);
    assert_eq!(dest.get(1, 0), Some(1 << 8 | 1));
}

#[test]
fn test_non_printable_characters_are_ignored() {
    let renderer = renderer();
    let mut buf = vec![BACKGROUND; (DEST_W * DEST_H) as usize];
    let mut dest =
        LockedPixels::from_raw(&mut buf, DEST_W, DEST_H, DEST_W as usize * 4).unwrap();
    for ch in [0u8, 10, 31, 127, 200] {
        renderer.draw_glyph(0, 0, ch, ColorKey::None, &mut dest);
    }
    renderer.draw_text(0, 0, "é", ColorKey::None, &mut dest);
    assert!(buf.iter().all(|&p| p == BACKGROUND));
}

// ============================================================================
// Strings
// ============================================================================

#[test]
fn test_text_advances_one_cell_per_byte() {
    let renderer = renderer();
    let mut buf = vec![BACKGROUND; (DEST_W * DEST_H) as usize];
    let mut dest =
        LockedPixels::from_raw(&mut buf, DEST_W, DEST_H, DEST_W as usize * 4).unwrap();

    // 'A' is index 33, 'B' index 34; pixel (1, 0) of each cell
    renderer.draw_text(1, 2, "A B", ColorKey::Key(KEY), &mut dest);
    assert_eq!(dest.get(2, 2), Some(34 << 8 | 1));
    assert_eq!(dest.get(5, 2), Some(BACKGROUND));
    assert_eq!(dest.get(8, 2), Some(35 << 8 | 1));
    assert_eq!(renderer.text_width("A B"), 9);
}

#[test]
fn test_text_is_clipped_at_the_right_edge() {
    let renderer = renderer();
    let mut buf = vec![BACKGROUND; (DEST_W * DEST_H) as usize];
    let mut dest =
        LockedPixels::from_raw(&mut buf, DEST_W, DEST_H, DEST_W as usize * 4).unwrap();
    renderer.draw_text(10, 10, "WWWWWW", ColorKey::None, &mut dest);
    assert_ne!(dest.get(15, 11), Some(BACKGROUND));
    assert_eq!(dest.get(9, 11), Some(BACKGROUND));
}

#[test]
fn test_text_cursor_past_i32_max_stops() {
    let renderer = renderer();
    let mut buf = vec![BACKGROUND; (DEST_W * DEST_H) as usize];
    let mut dest =
        LockedPixels::from_raw(&mut buf, DEST_W, DEST_H, DEST_W as usize * 4).unwrap();
    renderer.draw_text(i32::MAX - 3, 0, "!!!", ColorKey::None, &mut dest);
    renderer.draw_text(i32::MIN, 0, "!!!", ColorKey::None, &mut dest);
    assert!(buf.iter().all(|&p| p == BACKGROUND));
}

#[test]
fn test_text_into_padded_rows() {
    let renderer = renderer();
    let pitch_words = 32usize;
    let mut buf = vec![0u32; pitch_words * DEST_H as usize];
    {
        let mut dest =
            LockedPixels::from_raw(&mut buf, DEST_W, DEST_H, pitch_words * 4).unwrap();
        renderer.draw_text(0, 0, "~~~~~~", ColorKey::None, &mut dest);
    }
    for row in buf.chunks(pitch_words) {
        assert!(row[DEST_W as usize..].iter().all(|&p| p == 0));
    }
}

#[test]
fn test_frame_rate_digits() {
    let renderer = renderer();
    let mut buf = vec![BACKGROUND; (DEST_W * DEST_H) as usize];
    let mut dest =
        LockedPixels::from_raw(&mut buf, DEST_W, DEST_H, DEST_W as usize * 4).unwrap();
    renderer.draw_frame_rate(0, 0, 60, ColorKey::Key(KEY), &mut dest);
    // '6' is index 22, '0' index 16; the key pixel at each cell origin is skipped
    assert_eq!(dest.get(0, 0), Some(BACKGROUND));
    assert_eq!(dest.get(1, 0), Some(23 << 8 | 1));
    assert_eq!(dest.get(4, 0), Some(17 << 8 | 1));
}

// ============================================================================
// Atlas loading
// ============================================================================

#[test]
fn test_missing_atlas_file() {
    let mut renderer = TextRenderer::new();
    let err = renderer.load_atlas("no/such/font.bmp", 8, 16, 4).unwrap_err();
    assert!(matches!(err, EngineError::AssetLoad { .. }));
    assert!(!renderer.is_loaded());
}

#[test]
fn test_glyph_wider_than_atlas() {
    let surface = PixelSurface::new(4, 4).unwrap();
    assert!(matches!(
        GlyphAtlas::from_surface(surface, 8, 4),
        Err(EngineError::InvalidArgument(_))
    ));
}
