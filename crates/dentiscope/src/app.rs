//! The viewer frame loop.
//!
//! [`Viewer`] pairs a [`Session`] with the [`ViewportManager`] and drives
//! them one tick at a time. A tick folds in finished background work and
//! applies queued commands in the order they were issued. A frame runs a
//! tick, then renders all viewports against a single borrowed snapshot of
//! the session. Nothing can mutate the session while a frame is being drawn.
//!
//! Without a window the viewer creates a headless [`RenderEngine`] on its
//! first frame; [`crate::window::run`] hands it a windowed one instead.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use dentiscope_core::{PickPoint, Result, SceneEdit, ViewerOptions};
use dentiscope_render::{RenderEngine, ViewportFrame, ViewportKind, ViewportManager};
use pollster::FutureExt;

use crate::commands::SessionCommand;
use crate::session::Session;

/// Session, viewports and the command queue between them.
#[derive(Debug)]
pub struct Viewer {
    session: Session,
    viewports: ViewportManager,
    queue: VecDeque<SessionCommand>,
    surface: (u32, u32),
    engine: Option<RenderEngine>,
    frame_count: u64,
    last_frame: Option<Instant>,
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new(ViewerOptions::default())
    }
}

impl Viewer {
    #[must_use]
    pub fn new(options: ViewerOptions) -> Self {
        let viewports = ViewportManager::new(&options);
        let surface = options.default_viewport_size;
        Self {
            session: Session::new(options),
            viewports,
            queue: VecDeque::new(),
            surface,
            engine: None,
            frame_count: 0,
            last_frame: None,
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    #[must_use]
    pub fn viewports(&self) -> &ViewportManager {
        &self.viewports
    }

    pub fn viewports_mut(&mut self) -> &mut ViewportManager {
        &mut self.viewports
    }

    /// Surface size in pixels.
    #[must_use]
    pub fn surface(&self) -> (u32, u32) {
        self.surface
    }

    /// Resizes the surface, and the window surface if one is attached.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.surface = (width, height);
        if let Some(engine) = &mut self.engine {
            engine.resize(width, height);
        }
    }

    /// Installs the engine frames are rendered with.
    pub fn set_engine(&mut self, engine: RenderEngine) {
        self.engine = Some(engine);
    }

    #[must_use]
    pub fn engine(&self) -> Option<&RenderEngine> {
        self.engine.as_ref()
    }

    fn ensure_engine(&mut self) -> Result<()> {
        if self.engine.is_none() {
            self.engine = Some(RenderEngine::new_headless().block_on()?);
        }
        Ok(())
    }

    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Queues a command for the next tick.
    pub fn enqueue(&mut self, command: SessionCommand) {
        self.queue.push_back(command);
    }

    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    fn apply(&mut self, command: SessionCommand) {
        let session = &mut self.session;
        match command {
            SessionCommand::Scene(edit) => {
                session.apply_scene_edit(&edit);
            }
            SessionCommand::SetTool(tool) => {
                session.set_tool(tool);
            }
            SessionCommand::Pick(point) => {
                session.pick(point);
            }
            SessionCommand::ConfirmAnnotation(text) => {
                session.confirm_annotation(text);
            }
            SessionCommand::CancelAnnotation => session.cancel_annotation(),
            SessionCommand::DeleteRecord(id) => {
                session.delete_record(id);
            }
            SessionCommand::ToggleRecordVisible(id) => {
                session.toggle_record_visible(id);
            }
            SessionCommand::RelabelRecord(id, text) => {
                session.relabel_record(id, text);
            }
            SessionCommand::ClearAll => session.clear_all_records(),
            SessionCommand::Undo => {
                session.undo();
            }
            SessionCommand::Redo => {
                session.redo();
            }
            SessionCommand::SetLightIntensity(value) => self.viewports.set_light_intensity(value),
            SessionCommand::SetShowGrid(show) => self.viewports.set_show_grid(show),
            SessionCommand::SetShowCrosshair(show) => self.viewports.set_show_crosshair(show),
            SessionCommand::ToggleFullscreen(kind) => self.viewports.toggle_fullscreen(kind),
            SessionCommand::Orbit {
                viewport,
                delta_x,
                delta_y,
            } => {
                if !self.viewports.viewport_mut(viewport).orbit(delta_x, delta_y) {
                    log::debug!("{viewport} view is rotation-locked");
                }
            }
            SessionCommand::Pan {
                viewport,
                delta_x,
                delta_y,
            } => self.viewports.viewport_mut(viewport).pan(delta_x, delta_y),
            SessionCommand::Zoom { viewport, delta } => {
                self.viewports.viewport_mut(viewport).zoom_by(delta);
            }
            SessionCommand::ResetCameras => self.viewports.reset_cameras(),
            SessionCommand::LoadModel { name, bytes } => {
                // Failures are already reported as notices.
                let _ = session.load_model(&name, bytes);
            }
        }
    }

    /// Applies every queued command in order without rendering.
    pub fn apply_queued(&mut self) {
        while let Some(command) = self.queue.pop_front() {
            self.apply(command);
        }
    }

    /// Folds in finished loads and uploads, then applies queued commands.
    pub fn tick(&mut self) {
        self.session.poll();
        self.apply_queued();
    }

    fn mark_frame(&mut self) {
        self.frame_count += 1;
        self.last_frame = Some(Instant::now());
    }

    /// Runs one tick and returns the rendered viewports.
    pub fn frame(&mut self) -> Result<Vec<ViewportFrame>> {
        self.tick();
        let (width, height) = self.surface;
        self.ensure_engine()?;
        let Self {
            session,
            viewports,
            engine,
            ..
        } = self;
        let Some(engine) = engine.as_ref() else {
            return Ok(Vec::new());
        };
        let frames = viewports.render_all(engine, &session.render_scene(), width, height)?;
        self.mark_frame();
        Ok(frames)
    }

    /// Runs one tick and draws every viewport to the attached window. Does
    /// nothing without a windowed engine.
    pub fn present(&mut self) -> Result<()> {
        self.tick();
        let Self {
            session,
            viewports,
            engine,
            ..
        } = self;
        let Some(engine) = engine.as_mut().filter(|e| e.surface.is_some()) else {
            return Ok(());
        };
        viewports.present(engine, &session.render_scene())?;
        self.mark_frame();
        Ok(())
    }

    /// When the next frame is due under the configured cadence, or `None`
    /// when uncapped or nothing was drawn yet.
    #[must_use]
    pub fn next_frame_at(&self) -> Option<Instant> {
        Some(self.last_frame? + self.session.options().frame_interval()?)
    }

    /// Whether enough time has passed since the last frame for the
    /// configured frame cadence.
    #[must_use]
    pub fn frame_due(&self, now: Instant) -> bool {
        self.next_frame_at().map_or(true, |due| now >= due)
    }

    /// Picks the model under a surface position, using the viewport there.
    #[must_use]
    pub fn pick(&self, x: f32, y: f32) -> Option<(ViewportKind, PickPoint)> {
        let (width, height) = self.surface;
        self.viewports
            .pick(&self.session.render_scene(), x, y, width, height)
    }

    /// Picks in a specific viewport, with `x` and `y` local to it.
    #[must_use]
    pub fn pick_in(&self, kind: ViewportKind, x: f32, y: f32) -> Option<PickPoint> {
        let (width, height) = self.surface;
        let rect = self
            .viewports
            .layout(width, height)
            .into_iter()
            .find(|rect| rect.kind == kind)?;
        let (sx, sy) = (rect.x as f32 + x, rect.y as f32 + y);
        self.pick(sx, sy)
            .and_then(|(hit, point)| (hit == kind).then_some(point))
    }

    /// Picks at a surface position and queues the hit for the active tool.
    /// Returns whether the model was hit.
    pub fn click(&mut self, x: f32, y: f32) -> bool {
        match self.pick(x, y) {
            Some((kind, point)) => {
                log::debug!("picked {:?} in {kind} view", point.position);
                self.enqueue(SessionCommand::Pick(point));
                true
            }
            None => false,
        }
    }

    /// Queues a scene edit.
    pub fn edit(&mut self, edit: SceneEdit) {
        self.enqueue(SessionCommand::Scene(edit));
    }

    /// Blocks until the newest load finishes, then runs one tick.
    pub fn settle(&mut self, timeout: Duration) -> Result<Vec<ViewportFrame>> {
        self.apply_queued();
        self.session.wait_for_load(timeout);
        self.frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dentiscope_core::scene::defaults::SINUS;
    use dentiscope_core::Tool;

    fn small() -> Viewer {
        let options = ViewerOptions {
            default_viewport_size: (64, 48),
            ..ViewerOptions::default()
        };
        Viewer::new(options)
    }

    #[test]
    fn test_commands_apply_in_order_before_render() {
        let mut viewer = small();
        viewer.edit(SceneEdit::ToggleVisibility(SINUS.into()));
        viewer.edit(SceneEdit::ToggleVisibility(SINUS.into()));
        viewer.edit(SceneEdit::ToggleVisibility(SINUS.into()));
        assert_eq!(viewer.queued(), 3);
        viewer.tick();
        assert_eq!(viewer.queued(), 0);
        assert!(!viewer.session().scene().find(SINUS).expect("exists").visible);
    }

    #[test]
    fn test_camera_commands() {
        let mut viewer = small();
        let axial = viewer.viewports().viewport(ViewportKind::Axial).clone();
        viewer.enqueue(SessionCommand::Orbit {
            viewport: ViewportKind::Axial,
            delta_x: 0.5,
            delta_y: 0.5,
        });
        viewer.enqueue(SessionCommand::Zoom {
            viewport: ViewportKind::Perspective,
            delta: 2.0,
        });
        viewer.apply_queued();
        assert_eq!(viewer.viewports().viewport(ViewportKind::Axial), &axial);
        assert!(viewer.viewports().viewport(ViewportKind::Perspective).distance() < 75f32.sqrt());
    }

    #[test]
    fn test_click_feeds_measurement_tool() {
        let mut viewer = small();
        viewer.enqueue(SessionCommand::SetTool(Some(Tool::MeasureDistance)));
        viewer.tick();
        // Centre of the coronal (bottom-left) viewport looks at the placeholder box.
        assert!(viewer.click(16.0, 36.0));
        viewer.tick();
        assert_eq!(viewer.session().engine().pending_points().len(), 1);
        let pending = viewer.session().engine().pending_points()[0].position;
        assert!((pending.z - 1.0).abs() < 1e-3);
        assert!(pending.x.abs() <= 1.0 + 1e-3);
    }

    #[test]
    fn test_frame_due_respects_cadence() {
        let options = ViewerOptions {
            max_fps: 10,
            default_viewport_size: (16, 16),
            ..ViewerOptions::default()
        };
        let mut viewer = Viewer::new(options);
        assert!(viewer.frame_due(Instant::now()));
        assert_eq!(viewer.next_frame_at(), None);
        viewer.mark_frame();
        let last = viewer.last_frame.expect("set");
        assert_eq!(viewer.next_frame_at(), Some(last + Duration::from_millis(100)));
        assert!(!viewer.frame_due(last + Duration::from_millis(20)));
        assert!(viewer.frame_due(last + Duration::from_millis(150)));
    }

    #[test]
    fn test_uncapped_cadence_always_due() {
        let options = ViewerOptions {
            max_fps: 0,
            ..ViewerOptions::default()
        };
        let mut viewer = Viewer::new(options);
        viewer.mark_frame();
        assert_eq!(viewer.next_frame_at(), None);
        assert!(viewer.frame_due(Instant::now()));
    }

    #[test]
    fn test_present_without_window_is_noop() {
        let mut viewer = small();
        viewer.edit(SceneEdit::ToggleVisibility(SINUS.into()));
        viewer.present().expect("no window to draw to");
        assert_eq!(viewer.frame_count(), 0);
        assert_eq!(viewer.queued(), 0);
    }

    #[test]
    fn test_headless_frame_renders_every_viewport() {
        let mut viewer = small();
        match viewer.frame() {
            Ok(frames) => {
                assert_eq!(frames.len(), 4);
                assert_eq!(viewer.frame_count(), 1);
                assert!(viewer.engine().is_some());
            }
            Err(e) => eprintln!("Skipping headless test: no GPU adapter available ({e})"),
        }
    }
}
