pub mod blitter;
pub mod clock;
pub mod controller;
pub mod device;
pub mod glyph;
pub mod headless;
pub mod input_adapter;
pub mod loader;
pub mod pixel;
pub mod raster;
pub mod rect;
pub mod surface;
pub mod timer;
pub mod wgpu_backend;

pub use blitter::{blit, blit_from_raster_buffer};
pub use clock::{DeltaClock, FrameClock, HighResCounter, ManualCounter, TickSource};
pub use controller::{Button, Controller};
pub use device::{
    DeviceStatus, DisplayBackend, DisplayConfig, DisplayDevice, DisplayMode, PresentInterval,
    PresentParams,
};
pub use glyph::{GlyphAtlas, SpaceGlyph, TextRenderer};
pub use headless::HeadlessBackend;
pub use input_adapter::WinitController;
pub use loader::{load_from_file, load_from_memory, save_bmp};
pub use pixel::{Color, ColorKey, PixelFormat};
pub use raster::{DrawOp, RasterBuffer, RasterCanvas};
pub use rect::{Point, Rect};
pub use surface::{LockedPixels, PixelSurface, SurfaceLock};
pub use wgpu_backend::WgpuBackend;
