// cli.rs - Command-line interface configuration
use std::path::PathBuf;

use clap::Parser;

use crate::core::pixel::PixelFormat;

#[derive(Parser, Debug, Clone)]
#[command(name = "paddle-court")]
#[command(about = "Two-player paddle game on a software compositor", long_about = None)]
pub struct Cli {
    /// Back buffer width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Back buffer height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Run fullscreen instead of in a window
    #[arg(long, default_value = "false")]
    pub fullscreen: bool,

    /// Back buffer format when fullscreen
    #[arg(long, value_enum)]
    pub fullscreen_format: Option<PixelFormat>,

    /// Directory holding the bitmap assets
    #[arg(long)]
    pub assets: Option<PathBuf>,

    /// JSON config file; flags given here override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Render without a window
    #[arg(long, default_value = "false")]
    pub headless: bool,

    /// Frames to render in headless mode
    #[arg(long, default_value_t = 120)]
    pub frames: u32,

    /// Write the last headless frame to this bitmap
    #[arg(long)]
    pub screenshot: Option<PathBuf>,

    /// Seed for serve directions
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
