use std::collections::VecDeque;

use log::{debug, warn};

use super::device::{DeviceStatus, DisplayBackend, DisplayMode, PresentParams};
use super::pixel::{PixelFormat, BYTES_PER_PIXEL};
use super::surface::PixelSurface;
use crate::error::{EngineError, Result};

/// Calls made into a [`HeadlessBackend`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendCounters {
    pub creates: u32,
    pub resets: u32,
    pub acquisitions: u32,
    pub presents: u32,
}

/// In-memory display backend
///
/// Statuses pushed with [`push_status`](Self::push_status) are reported one per
/// poll, after which the device is `Ready` again. Each call can be made to fail.
#[derive(Debug, Clone)]
pub struct HeadlessBackend {
    mode: DisplayMode,
    row_alignment: usize,
    statuses: VecDeque<DeviceStatus>,
    counters: BackendCounters,
    last_frame: Option<PixelSurface>,
    fail_create: bool,
    fail_reset: bool,
    fail_acquire: bool,
    fail_present: bool,
}

impl HeadlessBackend {
    /// Backend pretending to sit on a `width` x `height` desktop
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            mode: DisplayMode {
                width,
                height,
                format: PixelFormat::X8R8G8B8,
            },
            row_alignment: BYTES_PER_PIXEL,
            statuses: VecDeque::new(),
            counters: BackendCounters::default(),
            last_frame: None,
            fail_create: false,
            fail_reset: false,
            fail_acquire: false,
            fail_present: false,
        }
    }

    pub fn with_row_alignment(mut self, alignment: usize) -> Self {
        self.row_alignment = alignment;
        self
    }

    pub fn with_format(mut self, format: PixelFormat) -> Self {
        self.mode.format = format;
        self
    }

    pub fn fail_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn set_fail_reset(&mut self, fail: bool) {
        self.fail_reset = fail;
    }

    pub fn set_fail_acquire(&mut self, fail: bool) {
        self.fail_acquire = fail;
    }

    pub fn set_fail_present(&mut self, fail: bool) {
        self.fail_present = fail;
    }

    /// Report `status` on the next poll
    pub fn push_status(&mut self, status: DeviceStatus) {
        self.statuses.push_back(status);
    }

    pub fn script(&mut self, statuses: impl IntoIterator<Item = DeviceStatus>) {
        self.statuses.extend(statuses);
    }

    pub fn counters(&self) -> BackendCounters {
        self.counters
    }

    /// Copy of the most recently presented back buffer
    pub fn last_frame(&self) -> Option<&PixelSurface> {
        self.last_frame.as_ref()
    }
}

impl DisplayBackend for HeadlessBackend {
    fn display_mode(&mut self) -> Result<DisplayMode> {
        Ok(self.mode)
    }

    fn create(&mut self, params: &PresentParams) -> Result<()> {
        if self.fail_create {
            return Err(EngineError::DeviceInit("headless creation disabled".into()));
        }
        self.counters.creates += 1;
        debug!("Headless device created at {}x{}", params.width, params.height);
        Ok(())
    }

    fn status(&mut self) -> DeviceStatus {
        self.statuses.pop_front().unwrap_or(DeviceStatus::Ready)
    }

    fn reset(&mut self, _params: &PresentParams) -> Result<()> {
        if self.fail_reset {
            warn!("Headless reset refused");
            return Err(EngineError::DeviceReset("headless reset disabled".into()));
        }
        self.counters.resets += 1;
        Ok(())
    }

    fn acquire_back_buffer(&mut self, params: &PresentParams) -> Result<PixelSurface> {
        if self.fail_acquire {
            return Err(EngineError::SurfaceAlloc("headless back buffer disabled".into()));
        }
        let surface = PixelSurface::with_alignment(params.width, params.height, self.row_alignment)?;
        self.counters.acquisitions += 1;
        Ok(surface)
    }

    fn present(&mut self, back_buffer: &PixelSurface) -> Result<()> {
        if self.fail_present {
            return Err(EngineError::DeviceLost);
        }
        back_buffer.lock()?;
        self.last_frame = Some(back_buffer.clone());
        self.counters.presents += 1;
        Ok(())
    }

    fn row_alignment(&self) -> usize {
        self.row_alignment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::device::DisplayConfig;

    #[test]
    fn scripted_statuses_drain_to_ready() {
        let mut backend = HeadlessBackend::new(640, 480);
        backend.script([DeviceStatus::Lost, DeviceStatus::NeedsReset]);
        assert_eq!(backend.status(), DeviceStatus::Lost);
        assert_eq!(backend.status(), DeviceStatus::NeedsReset);
        assert_eq!(backend.status(), DeviceStatus::Ready);
    }

    #[test]
    fn back_buffer_uses_row_alignment() {
        let mut backend = HeadlessBackend::new(640, 480).with_row_alignment(256);
        let mode = backend.display_mode().unwrap();
        let params = PresentParams::new(&DisplayConfig::default(), &mode);
        let bb = backend.acquire_back_buffer(&params).unwrap();
        assert_eq!(bb.pitch(), 2560);
        assert_eq!(backend.counters().acquisitions, 1);
    }

    #[test]
    fn released_back_buffer_is_not_presented() {
        let mut backend = HeadlessBackend::new(640, 480);
        let mut surface = PixelSurface::new(2, 2).unwrap();
        surface.release();
        assert!(backend.present(&surface).is_err());
        assert!(backend.last_frame().is_none());
        assert_eq!(backend.counters().presents, 0);
    }
}
