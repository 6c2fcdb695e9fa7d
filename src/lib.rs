pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod game;

pub use config::GameConfig;
pub use engine::{Engine, FrameOutcome, SceneState, SpriteSet};
pub use error::{EngineError, Result};
pub use game::{Court, Player};
