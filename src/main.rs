use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use paddle_court::cli::Cli;
use paddle_court::core::{DeltaClock, HeadlessBackend, WgpuBackend, WinitController};
use paddle_court::{Court, Engine, EngineError, FrameOutcome, GameConfig};

/// Simulated frame time for headless runs
const HEADLESS_FRAME_TIME: f32 = 1.0 / 60.0;

struct App {
    config: GameConfig,
    window: Option<Arc<Window>>,
    engine: Option<Engine<WgpuBackend>>,
    court: Court,
    controller: WinitController,
    clock: DeltaClock,
    fatal: Option<EngineError>,
}

impl App {
    fn new(config: GameConfig) -> Self {
        let court = Court::new(config.display.width, config.display.height, seed(&config));
        Self {
            config,
            window: None,
            engine: None,
            court,
            controller: WinitController::new(),
            clock: DeltaClock::new(),
            fatal: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: EngineError) {
        error!("{}", err);
        self.fatal = Some(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(
            Window::default_attributes()
                .with_title(self.config.title.clone())
                .with_resizable(false)
                .with_inner_size(PhysicalSize::new(
                    self.config.display.width,
                    self.config.display.height,
                )),
        ) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                self.fail(event_loop, EngineError::DeviceInit(e.to_string()));
                return;
            }
        };

        let engine = WgpuBackend::new(window.clone())
            .and_then(|backend| Engine::start(backend, &self.config));
        match engine {
            Ok(engine) => {
                self.window = Some(window);
                self.engine = Some(engine);
                self.clock.restart();
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput { .. } => self.controller.process_event(&event),
            WindowEvent::Focused(false) => self.controller.clear(),
            WindowEvent::Resized(_) => {
                if let Some(engine) = &mut self.engine {
                    engine.device_mut().backend_mut().notify_resized();
                }
            }
            WindowEvent::RedrawRequested => {
                let delta = self.clock.tick();
                self.court.update(delta, &self.controller);
                if self.court.wants_quit(&self.controller) {
                    event_loop.exit();
                    return;
                }

                let Some(engine) = &mut self.engine else {
                    return;
                };
                match engine.render_frame(&self.court.scene()) {
                    Ok(_) => {}
                    Err(e) if e.is_fatal() => self.fail(event_loop, e),
                    Err(e) => warn!("Frame failed: {}", e),
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn seed(config: &GameConfig) -> u64 {
    config.seed.unwrap_or_else(rand::random)
}

/// Render a fixed number of frames without a window
fn run_headless(cli: &Cli, config: &GameConfig) -> Result<()> {
    let backend = HeadlessBackend::new(config.display.width, config.display.height);
    let mut engine = Engine::start(backend, config).context("starting headless engine")?;
    let mut court = Court::new(config.display.width, config.display.height, seed(config));
    let controller = WinitController::new();

    let mut presented = 0;
    for _ in 0..cli.frames {
        court.update(HEADLESS_FRAME_TIME, &controller);
        if engine.render_frame(&court.scene())? == FrameOutcome::Presented {
            presented += 1;
        }
    }
    info!(
        "Rendered {} of {} frames, score {}:{}",
        presented,
        cli.frames,
        court.scene().scores[0],
        court.scene().scores[1]
    );

    if let Some(path) = &cli.screenshot {
        engine
            .save_screenshot(path)
            .with_context(|| format!("writing screenshot {}", path.display()))?;
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = GameConfig::resolve(&cli).context("loading configuration")?;

    if cli.headless {
        return run_headless(&cli, &config);
    }

    let event_loop = EventLoop::new().context("creating event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    info!("Controls: Up/Down and Tab/Left Ctrl move the paddles, F1-F5 set ball speed, Escape quits");
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    if let Some(err) = app.fatal.take() {
        return Err(err).context("display device failed");
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level.as_str()))
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
