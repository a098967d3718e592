use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use super::input::{ActionStates, InputAction, InputSnapshot};
use super::metrics::MetricsAccumulator;
use super::rendering::{PixelSurface, Renderer, Viewport};
use super::ticker::{TickEvent, Ticker};
use super::MetricsHandle;

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    /// Logical render resolution; the framebuffer scales to the window.
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub target_tps: u32,
    pub metrics_log_interval: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Overgrove".to_string(),
            window_width: 960,
            window_height: 540,
            viewport_width: 480,
            viewport_height: 270,
            target_tps: 60,
            metrics_log_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// The game side of the loop: the runner drives ticks into it and asks it
/// to composite each frame.
pub trait Session {
    /// One fixed-step tick with the input held during it.
    fn on_tick(&mut self, event: &TickEvent, input: &InputSnapshot);
    /// Composite the current state onto the screen surface.
    fn render(&mut self, screen: &mut PixelSurface, viewport: Viewport);
    /// Polled after each tick burst; `true` shuts the app down.
    fn quit_requested(&self) -> bool {
        false
    }
}

pub fn run_app(config: LoopConfig, session: Box<dyn Session>) -> Result<(), AppError> {
    run_app_with_metrics(config, session, MetricsHandle::default())
}

pub fn run_app_with_metrics(
    config: LoopConfig,
    mut session: Box<dyn Session>,
    metrics_handle: MetricsHandle,
) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let viewport = Viewport {
        width: config.viewport_width.max(1),
        height: config.viewport_height.max(1),
    };
    let mut renderer =
        Renderer::new(Arc::clone(&window), viewport).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let mut ticker = Ticker::with_rate(config.target_tps.max(1));
    ticker.start(Instant::now());
    let mut input_collector = InputCollector::default();
    let mut metrics_accumulator = MetricsAccumulator::new(config.metrics_log_interval);
    let mut last_frame_instant = Instant::now();

    info!(
        target_tps = config.target_tps,
        viewport_width = viewport.width,
        viewport_height = viewport.height,
        "loop_config"
    );

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(%error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input_collector.handle_keyboard_input(&event);
                    if input_collector.quit_requested {
                        info!(reason = "escape_key", "shutdown_requested");
                        window_target.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;

                    for tick in ticker.advance(now) {
                        let snapshot = input_collector.snapshot_for_tick();
                        session.on_tick(&tick, &snapshot);
                        metrics_accumulator.record_tick();
                    }
                    if session.quit_requested() {
                        info!(reason = "session", "shutdown_requested");
                        window_target.exit();
                        return;
                    }

                    let screen = renderer.begin_frame();
                    session.render(screen, viewport);
                    if let Err(error) = renderer.present() {
                        warn!(%error, "renderer_present_failed");
                        window_target.exit();
                    }
                    metrics_accumulator.record_frame(raw_frame_dt);

                    if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                        metrics_handle.publish(snapshot);
                        info!(
                            fps = snapshot.fps,
                            tps = snapshot.tps,
                            frame_time_ms = snapshot.frame_time_ms,
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                renderer.request_redraw();
            }
            Event::LoopExiting => {
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    actions: ActionStates,
}

impl InputCollector {
    fn handle_keyboard_input(&mut self, key_event: &winit::event::KeyEvent) {
        let is_pressed = key_event.state == ElementState::Pressed;
        match key_event.physical_key {
            PhysicalKey::Code(KeyCode::ArrowUp) => self.actions.set(InputAction::MoveUp, is_pressed),
            PhysicalKey::Code(KeyCode::ArrowDown) => {
                self.actions.set(InputAction::MoveDown, is_pressed)
            }
            PhysicalKey::Code(KeyCode::ArrowLeft) => {
                self.actions.set(InputAction::MoveLeft, is_pressed)
            }
            PhysicalKey::Code(KeyCode::ArrowRight) => {
                self.actions.set(InputAction::MoveRight, is_pressed)
            }
            PhysicalKey::Code(KeyCode::KeyS) => self.actions.set(InputAction::Sword, is_pressed),
            PhysicalKey::Code(KeyCode::Escape) => {
                self.actions.set(InputAction::Quit, is_pressed);
                if is_pressed {
                    self.quit_requested = true;
                }
            }
            _ => {}
        }
    }

    fn snapshot_for_tick(&self) -> InputSnapshot {
        InputSnapshot::new(self.quit_requested, self.actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_keys_map_to_move_actions() {
        let mut actions = ActionStates::default();
        actions.set(InputAction::MoveUp, true);
        actions.set(InputAction::MoveRight, true);
        let snapshot = InputSnapshot::new(false, actions);
        assert!(snapshot.is_down(InputAction::MoveUp));
        assert!(snapshot.is_down(InputAction::MoveRight));
        assert!(!snapshot.is_down(InputAction::Sword));
    }

    #[test]
    fn snapshot_reflects_held_state_until_release() {
        let mut collector = InputCollector::default();
        collector.actions.set(InputAction::Sword, true);
        assert!(collector.snapshot_for_tick().is_down(InputAction::Sword));
        collector.actions.set(InputAction::Sword, false);
        assert!(!collector.snapshot_for_tick().is_down(InputAction::Sword));
    }

    #[test]
    fn loop_config_defaults_match_the_classic_board() {
        let config = LoopConfig::default();
        assert_eq!((config.viewport_width, config.viewport_height), (480, 270));
        assert_eq!(config.target_tps, 60);
    }
}
