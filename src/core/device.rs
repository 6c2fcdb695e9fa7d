use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use super::pixel::{Color, PixelFormat, BYTES_PER_PIXEL};
use super::rect::Rect;
use super::surface::PixelSurface;
use crate::error::{EngineError, Result};

/// Health of the display resource as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    Ready,
    /// Presentation is impossible right now; try again next frame
    Lost,
    /// The device can be recovered by a reset
    NeedsReset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentInterval {
    /// Present as soon as the frame is ready
    Immediate,
    /// Wait for vertical blank
    Vsync,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapEffect {
    /// Back buffer contents survive a present
    Copy,
    Discard,
}

/// Depth-stencil format requested alongside the back buffer
///
/// Nothing draws depth; the buffer is only reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthFormat {
    D16,
}

/// Current mode of the display the window lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayMode {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

/// Everything needed to (re)create the presentation chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentParams {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub back_buffer_count: u32,
    /// Sample count; 0 means no multisampling
    pub multisample: u32,
    pub swap_effect: SwapEffect,
    pub windowed: bool,
    pub depth_format: DepthFormat,
    pub present_interval: PresentInterval,
    pub lockable_back_buffer: bool,
}

impl PresentParams {
    /// Parameters for `config` on a display currently in `mode`
    pub fn new(config: &DisplayConfig, mode: &DisplayMode) -> Self {
        let (format, present_interval) = if config.windowed {
            (mode.format, PresentInterval::Vsync)
        } else {
            (config.fullscreen_format, PresentInterval::Immediate)
        };

        Self {
            width: config.width,
            height: config.height,
            format,
            back_buffer_count: 1,
            multisample: 0,
            swap_effect: SwapEffect::Copy,
            windowed: config.windowed,
            depth_format: DepthFormat::D16,
            present_interval,
            lockable_back_buffer: true,
        }
    }
}

/// Requested display configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    pub windowed: bool,
    pub fullscreen_format: PixelFormat,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            windowed: true,
            fullscreen_format: PixelFormat::X8R8G8B8,
        }
    }
}

/// Platform presentation path behind a [`DisplayDevice`]
pub trait DisplayBackend {
    /// Mode of the display the output will appear on
    fn display_mode(&mut self) -> Result<DisplayMode>;

    /// Create the presentation chain
    fn create(&mut self, params: &PresentParams) -> Result<()>;

    /// Poll the current device state
    fn status(&mut self) -> DeviceStatus;

    /// Rebuild the presentation chain after a loss
    fn reset(&mut self, params: &PresentParams) -> Result<()>;

    /// Allocate a back buffer compatible with the presentation chain
    fn acquire_back_buffer(&mut self, params: &PresentParams) -> Result<PixelSurface>;

    /// Show the finished back buffer
    fn present(&mut self, back_buffer: &PixelSurface) -> Result<()>;

    /// Byte alignment the backend wants for back-buffer rows
    fn row_alignment(&self) -> usize {
        BYTES_PER_PIXEL
    }
}

type RestoreHook = Box<dyn FnMut() -> Result<()>>;

/// Owns the back buffer and drives the lost/reset protocol of a backend
///
/// Call [`validate`](Self::validate) at the top of every frame. It returns
/// [`EngineError::DeviceLost`] when the frame must be skipped and a fatal
/// [`EngineError::DeviceReset`] when recovery failed.
pub struct DisplayDevice<B: DisplayBackend> {
    backend: B,
    params: PresentParams,
    back_buffer: PixelSurface,
    status: DeviceStatus,
    restore_hook: Option<RestoreHook>,
}

impl<B: DisplayBackend> DisplayDevice<B> {
    pub fn initialize(mut backend: B, config: &DisplayConfig) -> Result<Self> {
        let mode = backend.display_mode().map_err(|e| {
            error!("Unable to get display mode: {}", e);
            EngineError::DeviceInit(format!("display mode query failed: {}", e))
        })?;
        debug!("Display mode {}x{} {:?}", mode.width, mode.height, mode.format);

        let params = PresentParams::new(config, &mode);

        backend.create(&params).map_err(|e| {
            error!("Unable to create display device: {}", e);
            EngineError::DeviceInit(format!("device creation failed: {}", e))
        })?;

        let mut back_buffer = backend.acquire_back_buffer(&params).map_err(|e| {
            error!("Unable to get back buffer: {}", e);
            EngineError::DeviceInit(format!("back buffer unavailable: {}", e))
        })?;
        back_buffer.fill(Color::BLACK);

        info!(
            "Display device ready: {}x{} {:?}, {}",
            params.width,
            params.height,
            params.format,
            if params.windowed { "windowed" } else { "fullscreen" }
        );

        Ok(Self {
            backend,
            params,
            back_buffer,
            status: DeviceStatus::Ready,
            restore_hook: None,
        })
    }

    /// Check the device before drawing a frame, resetting it when possible
    pub fn validate(&mut self) -> Result<()> {
        self.status = self.backend.status();
        match self.status {
            DeviceStatus::Ready => Ok(()),
            DeviceStatus::Lost => {
                warn!("Display device lost, skipping frame");
                Err(EngineError::DeviceLost)
            }
            DeviceStatus::NeedsReset => self.reset(),
        }
    }

    fn reset(&mut self) -> Result<()> {
        info!("Resetting display device");
        self.back_buffer.release();

        self.backend.reset(&self.params).map_err(|e| {
            error!("Unable to reset device: {}", e);
            EngineError::DeviceReset(e.to_string())
        })?;

        let mut back_buffer = self.backend.acquire_back_buffer(&self.params).map_err(|e| {
            error!("Unable to get back buffer after reset: {}", e);
            EngineError::DeviceReset(format!("back buffer unavailable: {}", e))
        })?;
        back_buffer.fill(Color::BLACK);
        self.back_buffer = back_buffer;
        self.status = DeviceStatus::Ready;

        if let Some(hook) = self.restore_hook.as_mut() {
            hook().map_err(|e| {
                error!("Restore after reset failed: {}", e);
                e
            })?;
        }

        info!("Display device restored");
        Ok(())
    }

    /// Run `hook` after every successful reset
    pub fn set_restore_hook(&mut self, hook: impl FnMut() -> Result<()> + 'static) {
        self.restore_hook = Some(Box::new(hook));
    }

    pub fn present(&mut self) -> Result<()> {
        self.backend.present(&self.back_buffer).map_err(|e| {
            error!("Present failed: {}", e);
            e
        })
    }

    pub fn back_buffer(&self) -> Result<&PixelSurface> {
        if self.back_buffer.is_released() {
            return Err(EngineError::Lock("back buffer is released".into()));
        }
        Ok(&self.back_buffer)
    }

    pub fn back_buffer_mut(&mut self) -> Result<&mut PixelSurface> {
        if self.back_buffer.is_released() {
            error!("Back buffer is released, cannot lock");
            return Err(EngineError::Lock("back buffer is released".into()));
        }
        Ok(&mut self.back_buffer)
    }

    /// Fill the whole back buffer
    pub fn clear(&mut self, color: Color) -> Result<()> {
        self.back_buffer_mut()?.fill(color);
        Ok(())
    }

    /// Fill part of the back buffer, clipped to its bounds
    pub fn clear_rect(&mut self, rect: Rect, color: Color) -> Result<()> {
        self.back_buffer_mut()?.fill_rect(rect, color);
        Ok(())
    }

    pub fn params(&self) -> &PresentParams {
        &self.params
    }

    /// State seen by the last [`validate`](Self::validate)
    pub fn status(&self) -> DeviceStatus {
        self.status
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl<B: DisplayBackend + std::fmt::Debug> std::fmt::Debug for DisplayDevice<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplayDevice")
            .field("backend", &self.backend)
            .field("params", &self.params)
            .field("status", &self.status)
            .field("restore_hook", &self.restore_hook.is_some())
            .finish()
    }
}
