//! Interactive windowed viewer on a winit event loop.
//!
//! Left drag orbits the viewport under the cursor, right drag pans it and
//! the wheel zooms. A left click without a drag picks the model for the
//! active tool. Letter keys switch tools and toggle view switches. Redraws
//! follow the configured frame cadence.

use std::sync::Arc;
use std::time::Instant;

use dentiscope_core::{DentiscopeError, Result, Tool};
use dentiscope_render::{RenderEngine, ViewportKind};
use glam::Vec2;
use pollster::FutureExt;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::app::Viewer;
use crate::commands::SessionCommand;

/// Cursor travel in pixels below which a press and release count as a click.
const DRAG_THRESHOLD: f32 = 5.0;
const ORBIT_SPEED: f32 = 0.01;
const PAN_SPEED: f32 = 0.002;
const ZOOM_SPEED: f32 = 0.1;

struct Drag {
    button: MouseButton,
    viewport: ViewportKind,
    last: Vec2,
    distance: f32,
}

struct WindowApp {
    viewer: Viewer,
    window: Option<Arc<Window>>,
    cursor: Vec2,
    drag: Option<Drag>,
    error: Option<DentiscopeError>,
}

impl WindowApp {
    fn new(viewer: Viewer) -> Self {
        Self {
            viewer,
            window: None,
            cursor: Vec2::ZERO,
            drag: None,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: DentiscopeError) {
        log::error!("{error}");
        self.error = Some(error);
        event_loop.exit();
    }

    fn viewport_under_cursor(&self) -> Option<ViewportKind> {
        let (width, height) = self.viewer.surface();
        self.viewer
            .viewports()
            .viewport_at(self.cursor.x, self.cursor.y, width, height)
            .map(|rect| rect.kind)
    }

    fn cursor_moved(&mut self, position: Vec2) {
        self.cursor = position;
        let Some(drag) = &mut self.drag else {
            return;
        };
        let delta = position - drag.last;
        drag.last = position;
        drag.distance += delta.x.abs() + delta.y.abs();
        let viewport = drag.viewport;
        let command = match drag.button {
            MouseButton::Left => SessionCommand::Orbit {
                viewport,
                delta_x: delta.x * ORBIT_SPEED,
                delta_y: delta.y * ORBIT_SPEED,
            },
            MouseButton::Right => {
                let scale = self.viewer.viewports().viewport(viewport).distance() * PAN_SPEED;
                SessionCommand::Pan {
                    viewport,
                    delta_x: -delta.x * scale,
                    delta_y: delta.y * scale,
                }
            }
            _ => return,
        };
        self.viewer.enqueue(command);
    }

    fn mouse_input(&mut self, button: MouseButton, state: ElementState) {
        match state {
            ElementState::Pressed => {
                self.drag = self.viewport_under_cursor().map(|viewport| Drag {
                    button,
                    viewport,
                    last: self.cursor,
                    distance: 0.0,
                });
            }
            ElementState::Released => {
                let Some(drag) = self.drag.take() else {
                    return;
                };
                if drag.button == MouseButton::Left && drag.distance < DRAG_THRESHOLD {
                    self.viewer.click(self.cursor.x, self.cursor.y);
                }
            }
        }
    }

    fn mouse_wheel(&mut self, delta: MouseScrollDelta) {
        let Some(viewport) = self.viewport_under_cursor() else {
            return;
        };
        let scroll = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
        };
        let scale = self.viewer.viewports().viewport(viewport).distance() * ZOOM_SPEED;
        self.viewer.enqueue(SessionCommand::Zoom {
            viewport,
            delta: scroll * scale,
        });
    }

    fn key_pressed(&mut self, key: KeyCode) {
        let command = match key {
            KeyCode::Escape => SessionCommand::CancelAnnotation,
            // Point annotations accept an empty label.
            KeyCode::Enter => SessionCommand::ConfirmAnnotation(String::new()),
            KeyCode::KeyR => SessionCommand::ResetCameras,
            KeyCode::KeyG => SessionCommand::SetShowGrid(!self.viewer.viewports().show_grid()),
            KeyCode::KeyC => {
                SessionCommand::SetShowCrosshair(!self.viewer.viewports().show_crosshair())
            }
            KeyCode::KeyS => SessionCommand::SetTool(Some(Tool::Select)),
            KeyCode::KeyD => SessionCommand::SetTool(Some(Tool::MeasureDistance)),
            KeyCode::KeyA => SessionCommand::SetTool(Some(Tool::MeasureAngle)),
            KeyCode::KeyP => SessionCommand::SetTool(Some(Tool::AnnotatePoint)),
            KeyCode::KeyZ => SessionCommand::Undo,
            KeyCode::KeyY => SessionCommand::Redo,
            KeyCode::KeyF => match self.viewport_under_cursor() {
                Some(kind) => SessionCommand::ToggleFullscreen(kind),
                None => return,
            },
            _ => return,
        };
        self.viewer.enqueue(command);
    }
}

impl ApplicationHandler for WindowApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let (width, height) = self.viewer.surface();
        let window_attributes = Window::default_attributes()
            .with_title("dentiscope")
            .with_inner_size(PhysicalSize::new(width.max(1), height.max(1)));
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.fail(event_loop, DentiscopeError::Render(e.to_string()));
                return;
            }
        };

        match RenderEngine::new_windowed(window.clone()).block_on() {
            Ok(engine) => {
                let (width, height) = engine.surface_size();
                self.viewer.set_engine(engine);
                self.viewer.resize(width, height);
            }
            Err(e) => {
                self.fail(event_loop, e.into());
                return;
            }
        }
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => self.viewer.resize(size.width, size.height),
            WindowEvent::RedrawRequested => match self.viewer.present() {
                Ok(()) => {}
                Err(DentiscopeError::Render(message)) => {
                    log::warn!("frame skipped: {message}");
                }
                Err(e) => self.fail(event_loop, e),
            },
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::MouseInput { state, button, .. } => self.mouse_input(button, state),
            WindowEvent::MouseWheel { delta, .. } => self.mouse_wheel(delta),
            WindowEvent::KeyboardInput { event, .. } => {
                if let (PhysicalKey::Code(key), ElementState::Pressed, false) =
                    (event.physical_key, event.state, event.repeat)
                {
                    self.key_pressed(key);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = &self.window else {
            return;
        };
        let now = Instant::now();
        if self.viewer.frame_due(now) {
            window.request_redraw();
        }
        match self.viewer.next_frame_at() {
            Some(due) if due > now => event_loop.set_control_flow(ControlFlow::WaitUntil(due)),
            _ => event_loop.set_control_flow(ControlFlow::Poll),
        }
    }
}

/// Opens a window and runs `viewer` until the window is closed.
pub fn run(viewer: Viewer) -> Result<()> {
    let event_loop =
        EventLoop::new().map_err(|e| DentiscopeError::Render(format!("event loop: {e}")))?;
    let mut app = WindowApp::new(viewer);
    event_loop
        .run_app(&mut app)
        .map_err(|e| DentiscopeError::Render(format!("event loop: {e}")))?;
    app.error.map_or(Ok(()), Err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dentiscope_core::ViewerOptions;

    fn app() -> WindowApp {
        let options = ViewerOptions {
            default_viewport_size: (64, 48),
            ..ViewerOptions::default()
        };
        WindowApp::new(Viewer::new(options))
    }

    #[test]
    fn test_left_drag_orbits_viewport_under_cursor() {
        let mut app = app();
        app.cursor_moved(Vec2::new(10.0, 10.0));
        app.mouse_input(MouseButton::Left, ElementState::Pressed);
        app.cursor_moved(Vec2::new(30.0, 14.0));
        app.mouse_input(MouseButton::Left, ElementState::Released);
        let before = app.viewer.viewports().viewport(ViewportKind::Perspective).clone();
        assert_eq!(app.viewer.queued(), 1);
        app.viewer.tick();
        assert_ne!(app.viewer.viewports().viewport(ViewportKind::Perspective), &before);
        assert!(app.viewer.session().records().is_empty());
    }

    #[test]
    fn test_click_without_drag_picks() {
        let mut app = app();
        app.viewer.enqueue(SessionCommand::SetTool(Some(Tool::MeasureDistance)));
        app.viewer.tick();
        // Centre of the coronal (bottom-left) viewport.
        app.cursor_moved(Vec2::new(16.0, 36.0));
        app.mouse_input(MouseButton::Left, ElementState::Pressed);
        app.mouse_input(MouseButton::Left, ElementState::Released);
        app.viewer.tick();
        assert_eq!(app.viewer.session().engine().pending_points().len(), 1);
    }

    #[test]
    fn test_wheel_zooms_and_keys_map_to_commands() {
        let mut app = app();
        app.cursor_moved(Vec2::new(50.0, 10.0));
        let before = app.viewer.viewports().viewport(ViewportKind::Axial).distance();
        app.mouse_wheel(MouseScrollDelta::LineDelta(0.0, 1.0));
        app.key_pressed(KeyCode::KeyF);
        app.key_pressed(KeyCode::KeyG);
        app.viewer.tick();
        let viewports = app.viewer.viewports();
        assert!(viewports.viewport(ViewportKind::Axial).distance() < before);
        assert_eq!(viewports.fullscreen(), Some(ViewportKind::Axial));
        assert!(!viewports.show_grid());
    }
}
