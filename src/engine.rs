use std::path::Path;

use log::{debug, info, warn};

use crate::config::{AssetConfig, GameConfig};
use crate::core::blitter::{blit, blit_from_raster_buffer};
use crate::core::clock::{FrameClock, HighResCounter, TickSource};
use crate::core::device::{DeviceStatus, DisplayBackend, DisplayDevice};
use crate::core::glyph::TextRenderer;
use crate::core::loader::{load_from_file, save_bmp};
use crate::core::pixel::{Color, ColorKey, BYTES_PER_PIXEL};
use crate::core::raster::{DrawOp, RasterCanvas};
use crate::core::rect::{Point, Rect};
use crate::core::surface::{LockedPixels, PixelSurface};
use crate::error::Result;
use crate::game::{Player, BALL_SIZE, PADDLE_HEIGHT, PADDLE_WIDTH};

/// Colour the back buffer is cleared to before compositing
pub const BACKGROUND_COLOR: Color = Color::rgb(0, 0, 25);

const PADDLE_COLOR: Color = Color::rgb(200, 200, 220);
const BALL_COLOR: Color = Color::rgb(240, 240, 240);

/// Everything drawn in one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneState {
    /// Top-left corners of the left and right paddles
    pub paddles: [Point; 2],
    pub ball: Point,
    pub scores: [u32; 2],
    pub ball_speed: i32,
    pub bounce_count: u32,
    pub winner: Option<Player>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Presented,
    /// The device was lost or presenting failed; try again next frame
    Skipped,
}

/// Sprite surfaces used by the renderer
#[derive(Debug, Clone)]
pub struct SpriteSet {
    /// Drawn opaque; the plain clear colour shows when absent
    pub background: Option<PixelSurface>,
    pub paddle: PixelSurface,
    pub ball: PixelSurface,
}

impl SpriteSet {
    /// Load every sprite, drawing stand-ins for the ones that fail
    pub fn load(assets: &AssetConfig, key: Color) -> Result<Self> {
        let background = load_optional(&assets.path(&assets.background));
        let paddle = match load_optional(&assets.path(&assets.paddle)) {
            Some(surface) => surface,
            None => Self::fallback_paddle(key)?,
        };
        let ball = match load_optional(&assets.path(&assets.ball)) {
            Some(surface) => surface,
            None => Self::fallback_ball(key)?,
        };
        Ok(Self {
            background,
            paddle,
            ball,
        })
    }

    /// Sprites drawn entirely by the raster canvas
    pub fn generated(key: Color) -> Result<Self> {
        Ok(Self {
            background: None,
            paddle: Self::fallback_paddle(key)?,
            ball: Self::fallback_ball(key)?,
        })
    }

    pub fn fallback_paddle(key: Color) -> Result<PixelSurface> {
        let canvas = RasterCanvas::new(PADDLE_WIDTH, PADDLE_HEIGHT)
            .draw(DrawOp::Clear(key))
            .draw(DrawOp::Rect {
                rect: Rect::new(2, 0, PADDLE_WIDTH as i32 - 2, PADDLE_HEIGHT as i32),
                color: PADDLE_COLOR,
            });
        rasterize_to_surface(&canvas)
    }

    pub fn fallback_ball(key: Color) -> Result<PixelSurface> {
        let r = BALL_SIZE as i32 / 2;
        let canvas = RasterCanvas::new(BALL_SIZE, BALL_SIZE)
            .draw(DrawOp::Clear(key))
            .draw(DrawOp::FilledCircle {
                cx: r,
                cy: r,
                radius: r as u32 - 1,
                color: BALL_COLOR,
            });
        rasterize_to_surface(&canvas)
    }
}

fn load_optional(path: &Path) -> Option<PixelSurface> {
    match load_from_file(path, BYTES_PER_PIXEL) {
        Ok(surface) => Some(surface),
        Err(e) => {
            warn!("Using a generated sprite instead of {}: {}", path.display(), e);
            None
        }
    }
}

fn rasterize_to_surface(canvas: &RasterCanvas) -> Result<PixelSurface> {
    let (width, height) = canvas.dimensions();
    let raster = canvas.rasterize();
    let mut surface = PixelSurface::new(width, height)?;
    blit_from_raster_buffer(&raster, None, &mut surface, None, ColorKey::None)?;
    Ok(surface)
}

/// Owns the display device and everything drawn onto it
pub struct Engine<B: DisplayBackend, S: TickSource = HighResCounter> {
    device: DisplayDevice<B>,
    sprites: SpriteSet,
    text: TextRenderer,
    clock: FrameClock<S>,
    key: ColorKey,
    title: String,
}

impl<B: DisplayBackend> Engine<B> {
    /// Initialize the device and load all assets named by `config`
    ///
    /// A missing font only disables the text overlays.
    pub fn start(backend: B, config: &GameConfig) -> Result<Self> {
        let device = DisplayDevice::initialize(backend, &config.display)?;
        let sprites = SpriteSet::load(&config.assets, config.color_key)?;

        let mut text = TextRenderer::new();
        let assets = &config.assets;
        if let Err(e) = text.load_atlas(
            assets.path(&assets.font),
            assets.glyph_width,
            assets.glyph_height,
            BYTES_PER_PIXEL,
        ) {
            warn!("Text overlays disabled: {}", e);
        }

        let mut engine = Self::new(device, sprites, text, FrameClock::new(), config.color_key);
        engine.title = config.title.clone();
        info!("Engine started");
        Ok(engine)
    }
}

impl<B: DisplayBackend, S: TickSource> Engine<B, S> {
    pub fn new(
        device: DisplayDevice<B>,
        sprites: SpriteSet,
        text: TextRenderer,
        clock: FrameClock<S>,
        key: Color,
    ) -> Self {
        Self {
            device,
            sprites,
            text,
            clock,
            key: ColorKey::Key(key),
            title: String::new(),
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Validate, compose, present and count one frame
    pub fn render_frame(&mut self, scene: &SceneState) -> Result<FrameOutcome> {
        match self.device.validate() {
            Ok(()) => {}
            Err(e) if e.is_recoverable() => return Ok(FrameOutcome::Skipped),
            Err(e) => return Err(e),
        }

        self.device.clear(BACKGROUND_COLOR)?;
        self.compose(scene)?;

        if let Err(e) = self.device.present() {
            debug!("Frame not presented: {}", e);
            return Ok(FrameOutcome::Skipped);
        }

        self.clock.tick();
        Ok(FrameOutcome::Presented)
    }

    /// Draw sprites then text onto the back buffer
    pub fn compose(&mut self, scene: &SceneState) -> Result<()> {
        let key = self.key;
        let back = self.device.back_buffer_mut()?;

        if let Some(background) = &self.sprites.background {
            blit(background, None, back, None, ColorKey::None)?;
        }
        blit(&self.sprites.paddle, None, back, Some(scene.paddles[0]), key)?;
        blit(&self.sprites.paddle, None, back, Some(scene.paddles[1]), key)?;
        blit(&self.sprites.ball, None, back, Some(scene.ball), key)?;

        let mut pixels = back.lock_mut()?;
        let hud = Hud {
            text: &self.text,
            key,
            title: &self.title,
            frame_rate: self.clock.current_rate(),
        };
        hud.draw(scene, &mut pixels);
        Ok(())
    }

    /// Write the current back buffer to a bitmap
    pub fn save_screenshot(&self, path: impl AsRef<Path>) -> Result<()> {
        save_bmp(self.device.back_buffer()?, path)
    }

    /// Run `hook` after every device reset
    pub fn set_restore_hook(&mut self, hook: impl FnMut() -> Result<()> + 'static) {
        self.device.set_restore_hook(hook);
    }

    pub fn status(&self) -> DeviceStatus {
        self.device.status()
    }

    pub fn device(&self) -> &DisplayDevice<B> {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut DisplayDevice<B> {
        &mut self.device
    }

    pub fn sprites(&self) -> &SpriteSet {
        &self.sprites
    }

    pub fn text(&self) -> &TextRenderer {
        &self.text
    }

    pub fn clock(&self) -> &FrameClock<S> {
        &self.clock
    }
}

/// Score, title and status lines
struct Hud<'a> {
    text: &'a TextRenderer,
    key: ColorKey,
    title: &'a str,
    frame_rate: u32,
}

impl Hud<'_> {
    fn draw(&self, scene: &SceneState, pixels: &mut LockedPixels<'_>) {
        let width = pixels.width() as i32;
        let height = pixels.height() as i32;
        let bottom = height - 26;
        let mid_x = width / 2;
        let key = self.key;

        self.text
            .draw_text(10, 10, &format!("Player 1: {}", scene.scores[0]), key, pixels);
        self.text.draw_text(
            width - 106,
            10,
            &format!("Player 2: {}", scene.scores[1]),
            key,
            pixels,
        );

        self.text.draw_text(mid_x - 104, 10, self.title, key, pixels);

        self.text.draw_text(width - 92, bottom, "FPS: ", key, pixels);
        self.text
            .draw_frame_rate(width - 42, bottom, self.frame_rate, key, pixels);

        self.text.draw_text(10, bottom, "Ball Speed: ", key, pixels);
        self.text
            .draw_text(106, bottom, &scene.ball_speed.to_string(), key, pixels);

        self.text
            .draw_text(mid_x - 64, bottom, "Bounce Count: ", key, pixels);
        self.text.draw_text(
            mid_x + 48,
            bottom,
            &scene.bounce_count.to_string(),
            key,
            pixels,
        );

        if let Some(winner) = scene.winner {
            let mid_y = height / 2;
            self.text
                .draw_text(mid_x - 72, mid_y - 18, winner.win_banner(), key, pixels);
            self.text
                .draw_text(mid_x - 88, mid_y + 18, "Press Start to Quit...", key, pixels);
        }
    }
}
