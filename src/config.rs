use std::path::{Path, PathBuf};

use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::core::device::DisplayConfig;
use crate::core::pixel::Color;
use crate::error::{EngineError, Result};

/// Bitmap assets, relative to `dir`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub dir: PathBuf,
    pub background: PathBuf,
    pub paddle: PathBuf,
    pub ball: PathBuf,
    pub font: PathBuf,
    pub glyph_width: u32,
    pub glyph_height: u32,
}

impl AssetConfig {
    /// Full path of an asset file
    pub fn path(&self, file: &Path) -> PathBuf {
        self.dir.join(file)
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("graphics"),
            background: PathBuf::from("space.bmp"),
            paddle: PathBuf::from("paddle.bmp"),
            ball: PathBuf::from("ball.bmp"),
            font: PathBuf::from("font.bmp"),
            glyph_width: 8,
            glyph_height: 16,
        }
    }
}

/// Everything the game reads at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub display: DisplayConfig,
    pub assets: AssetConfig,
    /// Transparent colour of sprites and font
    pub color_key: Color,
    pub title: String,
    /// Fixed seed for serve directions; random when absent
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            display: DisplayConfig::default(),
            assets: AssetConfig::default(),
            color_key: Color::MAGENTA,
            title: "PADDLE COURT".to_string(),
            seed: None,
        }
    }
}

impl GameConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            error!("Unable to read config {}: {}", path.display(), e);
            EngineError::Config(format!("{}: {}", path.display(), e))
        })?;
        let config = Self::from_json(&text).map_err(|e| {
            error!("Unable to parse config {}: {}", path.display(), e);
            e
        })?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Config file (if any) with command-line overrides applied
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(width) = cli.width {
            self.display.width = width;
        }
        if let Some(height) = cli.height {
            self.display.height = height;
        }
        if cli.fullscreen {
            self.display.windowed = false;
        }
        if let Some(format) = cli.fullscreen_format {
            self.display.fullscreen_format = format;
        }
        if let Some(dir) = &cli.assets {
            self.assets.dir = dir.clone();
        }
        if cli.seed.is_some() {
            self.seed = cli.seed;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.display.width == 0 || self.display.height == 0 {
            return Err(EngineError::Config(format!(
                "resolution must be non-zero, got {}x{}",
                self.display.width, self.display.height
            )));
        }
        if self.assets.glyph_width == 0 || self.assets.glyph_height == 0 {
            return Err(EngineError::Config("glyph size must be non-zero".into()));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| EngineError::Config(e.to_string()))
    }
}
