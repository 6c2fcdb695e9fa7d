use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the compositing engine
///
/// Only `DeviceReset` is fatal. `DeviceLost` means "skip this frame and try again".
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("could not load asset {path:?}: {reason}")]
    AssetLoad { path: PathBuf, reason: String },

    #[error("could not write {path:?}: {reason}")]
    AssetSave { path: PathBuf, reason: String },

    #[error("surface allocation failed: {0}")]
    SurfaceAlloc(String),

    #[error("surface lock failed: {0}")]
    Lock(String),

    #[error("display device initialization failed: {0}")]
    DeviceInit(String),

    #[error("display device is lost")]
    DeviceLost,

    #[error("display device reset failed: {0}")]
    DeviceReset(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl EngineError {
    /// True when the process cannot continue
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::DeviceReset(_))
    }

    /// True when the caller should simply retry next frame
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EngineError::DeviceLost)
    }

    pub(crate) fn asset(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        EngineError::AssetLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
