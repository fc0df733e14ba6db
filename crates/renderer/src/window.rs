use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use tracing::{debug, error, info, warn};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::error::SetupError;
use crate::gpu::GpuState;
use crate::hue::HueControl;
use crate::runtime::{time_source_for_policy, FrameScheduler, RenderPolicy};
use crate::session::{FrameOutcome, RenderSession};
use crate::types::{RenderParameters, RendererConfig};

/// What the event loop should do after a frame attempt.
enum FrameStatus {
    Continue,
    Exit,
}

/// Window, GPU context and the currently running session.
struct WindowState {
    window: Arc<Window>,
    gpu: Result<GpuState, SetupError>,
    session: Option<RenderSession>,
    params: RenderParameters,
    policy: RenderPolicy,
    scheduler: FrameScheduler,
    hue: HueControl,
    cursor: Option<PhysicalPosition<f64>>,
    title: String,
}

impl WindowState {
    fn new(window: Arc<Window>, config: &RendererConfig) -> Self {
        let gpu = GpuState::with_context(window.clone(), config);

        let mut state = Self {
            window,
            gpu,
            session: None,
            params: config.parameters,
            policy: config.policy.clone(),
            scheduler: FrameScheduler::new(&config.policy),
            hue: HueControl::new(config.parameters.hue),
            cursor: None,
            title: config.title.clone(),
        };
        state.session = state.start_session();
        state.update_title();
        state
    }

    /// Runs setup for the current parameters against the existing context.
    fn start_session(&mut self) -> Option<RenderSession> {
        let context = self.gpu.as_mut().map_err(|err| err.clone());
        match RenderSession::setup(context, self.params, time_source_for_policy(&self.policy)) {
            Ok(session) => Some(session),
            Err(err) => {
                error!(error = %err, "lightning setup failed; effect region stays empty");
                None
            }
        }
    }

    /// Tears down the running session and starts one for `params`.
    fn restart_session(&mut self, params: RenderParameters) {
        if let Some(session) = self.session.take() {
            session.cancel();
        }
        if let Ok(gpu) = self.gpu.as_mut() {
            gpu.release_pipeline();
        }
        self.params = params;
        self.session = self.start_session();
        self.scheduler.reset();
        self.update_title();
        self.window.request_redraw();
    }

    fn apply_hue_change(&mut self, changed: bool) {
        if !changed {
            return;
        }
        let hue = self.hue.value();
        debug!(hue, "hue changed; restarting session");
        self.restart_session(self.params.with_hue(hue));
    }

    fn update_title(&self) {
        self.window
            .set_title(&format!("{} | hue {:.0}", self.title, self.hue.value()));
    }

    fn drag_to_cursor(&mut self) {
        let Some(position) = self.cursor else {
            return;
        };
        let width = self.window.inner_size().width;
        if width == 0 {
            return;
        }
        let changed = self.hue.set_from_fraction(position.x as f32 / width as f32);
        self.apply_hue_change(changed);
    }

    fn handle_cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        self.cursor = Some(position);
        if self.hue.is_dragging() {
            self.drag_to_cursor();
        }
    }

    fn handle_mouse_button(&mut self, state: ElementState) {
        match state {
            ElementState::Pressed => {
                self.hue.begin_drag();
                self.drag_to_cursor();
            }
            ElementState::Released => self.hue.end_drag(),
        }
    }

    /// Returns `true` when the key asks the window to close.
    fn handle_key(&mut self, event: &KeyEvent) -> bool {
        if event.state != ElementState::Pressed {
            return false;
        }
        let changed = match &event.logical_key {
            Key::Named(NamedKey::Escape) => return true,
            Key::Named(NamedKey::ArrowLeft | NamedKey::ArrowDown) => self.hue.nudge(-1),
            Key::Named(NamedKey::ArrowRight | NamedKey::ArrowUp) => self.hue.nudge(1),
            Key::Named(NamedKey::PageDown) => self.hue.nudge(-HueControl::PAGE),
            Key::Named(NamedKey::PageUp) => self.hue.nudge(HueControl::PAGE),
            Key::Named(NamedKey::Home) => self.hue.set_min(),
            Key::Named(NamedKey::End) => self.hue.set_max(),
            _ => false,
        };
        self.apply_hue_change(changed);
        false
    }

    fn render_frame(&mut self) -> FrameStatus {
        let (Ok(gpu), Some(session)) = (self.gpu.as_mut(), self.session.as_mut()) else {
            return FrameStatus::Continue;
        };

        // Read once; both the resync and the resolution uniform use this value.
        let displayed = self.window.inner_size();
        match session.frame(gpu, displayed) {
            Ok(FrameOutcome::Drawn(uniforms)) => {
                self.scheduler.mark_rendered(Instant::now());
                tracing::trace!(time = uniforms.time, "frame presented");
            }
            Ok(FrameOutcome::Skipped) | Ok(FrameOutcome::Cancelled) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("surface out of memory; closing window");
                return FrameStatus::Exit;
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("surface timeout; retrying next frame");
            }
            Err(other) => {
                warn!(error = ?other, "surface error; retrying next frame");
            }
        }
        FrameStatus::Continue
    }

    fn shutdown(&mut self) {
        if let Some(session) = self.session.take() {
            session.cancel();
        }
        if let Ok(gpu) = self.gpu.as_mut() {
            gpu.release_pipeline();
        }
    }
}

/// Opens the window and drives the lightning effect until it is closed.
pub(crate) fn run(config: RendererConfig) -> Result<()> {
    let event_loop =
        EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let window_size = PhysicalSize::new(config.surface_size.0, config.surface_size.1);
    let window = WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(window_size)
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create lightning window: {err}"))?;
    let window = Arc::new(window);

    let mut state = WindowState::new(window, &config);
    info!(
        width = config.surface_size.0,
        height = config.surface_size.1,
        hue = config.parameters.hue,
        "lightning window ready"
    );
    state.window.request_redraw();

    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { window_id, event } if window_id == state.window.id() => {
                match event {
                    WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                        state.shutdown();
                        elwt.exit();
                    }
                    WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                        state.window.request_redraw();
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        state.handle_cursor_moved(position);
                    }
                    WindowEvent::MouseInput {
                        state: button_state,
                        button: MouseButton::Left,
                        ..
                    } => {
                        state.handle_mouse_button(button_state);
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        if state.handle_key(&event) {
                            state.shutdown();
                            elwt.exit();
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        if let FrameStatus::Exit = state.render_frame() {
                            state.shutdown();
                            elwt.exit();
                        }
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                if state.session.is_none() {
                    elwt.set_control_flow(ControlFlow::Wait);
                    return;
                }
                let now = Instant::now();
                if state.scheduler.ready_for_frame(now) {
                    tracing::trace!("scheduler: issuing redraw now");
                    state.window.request_redraw();
                    elwt.set_control_flow(ControlFlow::Wait);
                } else if let Some(deadline) = state.scheduler.next_deadline() {
                    elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
                } else {
                    elwt.set_control_flow(ControlFlow::Wait);
                }
            }
            _ => {}
        })
        .map_err(|err| anyhow!("window event loop error: {err}"))
}
