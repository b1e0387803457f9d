//! The viewer session: the single owner of all mutable viewer state.
//!
//! A [`Session`] holds the scene graph, the measurement engine, the undo
//! history covering both, the model slot and the notice queue. Every
//! mutation goes through `&mut self`, so readers always observe one
//! consistent state. Model loads and uploads run in the background and are
//! folded in by [`Session::poll`] between frames.
//!
//! Errors at the load/upload boundary never escape as panics or leave state
//! half-changed; they are logged and surfaced as [`Notice`]s.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dentiscope_core::measure::MeasurementEngine;
use dentiscope_core::{
    AnnotationId, CommandHistory, DentiscopeError, MeasurementStore, PickOutcome, PickPoint,
    RecordId, Result, SceneEdit, SceneGraph, ToothChartEditor, Tool, ViewerOptions,
};
use dentiscope_mesh::{MeshFormat, NormalizedMesh};
use dentiscope_render::RenderScene;
use glam::Vec3;

use crate::export::{self, ExportConfig, ExportedAsset};
use crate::loading::{CompletedLoad, ModelLoader};
use crate::store::{DocumentStore, ModelRef, UploadOutcome, Uploader};

/// Severity of a user-visible notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A message for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// The undoable part of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerState {
    pub scene: SceneGraph,
    pub records: MeasurementStore,
}

/// The model currently shown.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub name: String,
    pub format: MeshFormat,
    pub generation: u64,
    pub mesh: Arc<NormalizedMesh>,
    /// In-session reference, usable as soon as the load finishes.
    pub local_ref: String,
    /// Document-store URL, once the background upload succeeded.
    pub remote_url: Option<String>,
}

/// Where uploads go.
struct CloudTarget {
    store: Arc<dyn DocumentStore>,
    patient_id: String,
}

/// All mutable viewer state.
pub struct Session {
    options: ViewerOptions,
    scene: SceneGraph,
    engine: MeasurementEngine,
    history: CommandHistory<ViewerState>,
    model: Option<LoadedModel>,
    placeholder: Arc<NormalizedMesh>,
    loader: ModelLoader,
    uploader: Uploader,
    cloud: Option<CloudTarget>,
    notices: VecDeque<Notice>,
    chart: ToothChartEditor,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("model", &self.model.as_ref().map(|m| &m.name))
            .field("loading", &self.loader.is_loading())
            .field("records", &self.engine.store().len())
            .field("undo", &self.history.undo_len())
            .field("redo", &self.history.redo_len())
            .field("notices", &self.notices.len())
            .finish_non_exhaustive()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(ViewerOptions::default())
    }
}

impl Session {
    /// Creates a session with the default dental scene and no model.
    #[must_use]
    pub fn new(options: ViewerOptions) -> Self {
        Self {
            scene: SceneGraph::dental(),
            engine: MeasurementEngine::new(options.unit_label.clone()),
            history: CommandHistory::with_limit(options.history_limit),
            model: None,
            placeholder: Arc::new(dentiscope_mesh::placeholder()),
            loader: ModelLoader::new(),
            uploader: Uploader::default(),
            cloud: None,
            notices: VecDeque::new(),
            chart: ToothChartEditor::new(options.history_limit),
            options,
        }
    }

    /// Persists loaded models to `store` under `patient_id`.
    pub fn attach_store(&mut self, store: Arc<dyn DocumentStore>, patient_id: impl Into<String>) {
        self.cloud = Some(CloudTarget {
            store,
            patient_id: patient_id.into(),
        });
    }

    #[must_use]
    pub fn options(&self) -> &ViewerOptions {
        &self.options
    }

    #[must_use]
    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    #[must_use]
    pub fn engine(&self) -> &MeasurementEngine {
        &self.engine
    }

    #[must_use]
    pub fn records(&self) -> &MeasurementStore {
        self.engine.store()
    }

    /// Snapshot of the undoable state.
    #[must_use]
    pub fn state(&self) -> ViewerState {
        ViewerState {
            scene: self.scene.clone(),
            records: self.engine.store().clone(),
        }
    }

    fn restore(&mut self, state: ViewerState) {
        self.scene = state.scene;
        if &state.records != self.engine.store() {
            self.engine.replace_store(state.records);
        }
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push_back(Notice {
            level,
            message: message.into(),
        });
    }

    /// Takes every pending notice, oldest first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    #[must_use]
    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    // ---- scene edits ----

    /// Applies one scene edit and records it for undo.
    ///
    /// An unknown node id leaves everything unchanged and returns false.
    pub fn apply_scene_edit(&mut self, edit: &SceneEdit) -> bool {
        match self.scene.apply(edit) {
            Ok(next) => {
                self.history.record(&self.state());
                self.scene = next;
                true
            }
            Err(e) => {
                log::warn!("ignoring scene edit {edit:?}: {e}");
                false
            }
        }
    }

    /// Flips one node's own visibility. Children keep their flags.
    pub fn toggle_visibility(&mut self, id: &str) -> bool {
        self.apply_scene_edit(&SceneEdit::ToggleVisibility(id.to_string()))
    }

    pub fn set_color(&mut self, id: &str, color: Vec3) -> bool {
        self.apply_scene_edit(&SceneEdit::SetColor(id.to_string(), color))
    }

    pub fn set_opacity(&mut self, id: &str, opacity: f32) -> bool {
        self.apply_scene_edit(&SceneEdit::SetOpacity(id.to_string(), opacity))
    }

    pub fn toggle_expand(&mut self, id: &str) -> bool {
        self.apply_scene_edit(&SceneEdit::ToggleExpand(id.to_string()))
    }

    // ---- measurements ----

    /// Runs a measurement-engine operation and records an undo snapshot if
    /// it changed the record lists.
    fn edit_records<R>(&mut self, edit: impl FnOnce(&mut MeasurementEngine) -> R) -> R {
        let before = self.state();
        let revision = self.engine.revision();
        let result = edit(&mut self.engine);
        if self.engine.revision() != revision {
            self.history.record(&before);
        }
        result
    }

    /// Overrides the real-world units per model unit. Loading a model sets
    /// this from the model's normalization.
    pub fn set_unit_scale(&mut self, unit_scale: f32) {
        self.engine.set_unit_scale(unit_scale);
    }

    #[must_use]
    pub fn active_tool(&self) -> Option<Tool> {
        self.engine.active_tool()
    }

    /// Switches the active tool, discarding any incomplete capture.
    pub fn set_tool(&mut self, tool: Option<Tool>) -> usize {
        self.engine.set_tool(tool)
    }

    /// Feeds a picked point to the active tool.
    pub fn pick(&mut self, point: PickPoint) -> PickOutcome {
        self.edit_records(|engine| engine.pick(point))
    }

    pub fn confirm_annotation(&mut self, text: impl Into<String>) -> Option<AnnotationId> {
        let text = text.into();
        self.edit_records(|engine| engine.confirm_annotation(text))
    }

    pub fn cancel_annotation(&mut self) {
        self.engine.cancel_annotation();
    }

    fn record_op(&mut self, what: &str, op: impl FnOnce(&mut MeasurementEngine) -> Result<()>) -> bool {
        match self.edit_records(op) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("ignoring {what}: {e}");
                false
            }
        }
    }

    pub fn delete_record(&mut self, id: impl Into<RecordId>) -> bool {
        let id = id.into();
        self.record_op("delete", |engine| engine.delete(id))
    }

    pub fn toggle_record_visible(&mut self, id: impl Into<RecordId>) -> bool {
        let id = id.into();
        self.record_op("visibility toggle", |engine| engine.toggle_visible(id))
    }

    pub fn relabel_record(&mut self, id: impl Into<RecordId>, text: impl Into<String>) -> bool {
        let (id, text) = (id.into(), text.into());
        self.record_op("relabel", |engine| engine.relabel(id, text))
    }

    pub fn set_record_color(&mut self, id: impl Into<RecordId>, color: Vec3) -> bool {
        let id = id.into();
        self.record_op("color change", |engine| engine.set_color(id, color))
    }

    /// Removes every measurement and annotation. The scene is untouched.
    pub fn clear_all_records(&mut self) {
        self.edit_records(MeasurementEngine::clear_all);
    }

    /// Replaces the record lists with a JSON export.
    pub fn import_records(&mut self, json: &str) -> Result<()> {
        let store = MeasurementStore::from_json(json)?;
        self.edit_records(|engine| engine.replace_store(store));
        Ok(())
    }

    pub fn export_records(&self) -> Result<String> {
        self.engine.store().to_json()
    }

    // ---- history ----

    pub fn undo(&mut self) -> bool {
        let mut state = self.state();
        if !self.history.undo(&mut state) {
            log::debug!("nothing to undo");
            return false;
        }
        self.restore(state);
        true
    }

    pub fn redo(&mut self) -> bool {
        let mut state = self.state();
        if !self.history.redo(&mut state) {
            log::debug!("nothing to redo");
            return false;
        }
        self.restore(state);
        true
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ---- models ----

    /// Starts loading a model in the background and returns the request's
    /// generation.
    ///
    /// The extension of `name` is checked first: an unsupported format is
    /// rejected before any parse attempt and leaves the session unchanged
    /// apart from an error notice. A request supersedes any load still in
    /// flight.
    pub fn load_model(&mut self, name: &str, bytes: Vec<u8>) -> Result<u64> {
        let format = match MeshFormat::from_path(name) {
            Ok(format) => format,
            Err(e) => {
                let error = DentiscopeError::from(e);
                log::warn!("rejected '{name}': {error}");
                self.notify(NoticeLevel::Error, format!("Cannot open {name}: {error}"));
                return Err(error);
            }
        };
        let generation = self.loader.request(name, format, Arc::new(bytes))?;
        log::info!("loading '{name}' as {format} (request {generation})");
        // Picks now land on the placeholder, which is already in model units.
        self.engine.set_unit_scale(1.0);
        Ok(generation)
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loader.is_loading()
    }

    /// The loaded model, if any.
    #[must_use]
    pub fn model(&self) -> Option<&LoadedModel> {
        self.model.as_ref()
    }

    /// The mesh to draw: the placeholder while a load is in flight or when
    /// nothing was loaded yet, otherwise the loaded model.
    #[must_use]
    pub fn displayed_mesh(&self) -> &NormalizedMesh {
        match &self.model {
            Some(model) if !self.loader.is_loading() => &model.mesh,
            _ => &self.placeholder,
        }
    }

    /// Borrowed snapshot of everything a frame draws.
    #[must_use]
    pub fn render_scene(&self) -> RenderScene<'_> {
        RenderScene::new(
            &self.scene,
            Some(self.displayed_mesh().geometry()),
            Some(self.engine.store()),
        )
    }

    fn finish_load(&mut self, load: CompletedLoad) {
        let mesh = match load.result {
            Ok(mesh) => mesh,
            Err(e) => {
                let error = DentiscopeError::from(e);
                log::warn!("failed to load '{}': {error}", load.name);
                self.notify(NoticeLevel::Error, format!("Could not load {}: {error}", load.name));
                // The previous model is displayed again.
                let scale = self
                    .model
                    .as_ref()
                    .map_or(1.0, |m| m.mesh.normalization().source_units_per_unit());
                self.engine.set_unit_scale(scale);
                return;
            }
        };

        let geometry = mesh.geometry();
        log::info!(
            "loaded '{}': {} vertices, {} triangles",
            load.name,
            geometry.vertex_count(),
            geometry.triangle_count()
        );
        self.engine
            .set_unit_scale(mesh.normalization().source_units_per_unit());
        self.notify(NoticeLevel::Info, format!("Loaded {}", load.name));

        if let Some(cloud) = &self.cloud {
            self.uploader.start(
                Arc::clone(&cloud.store),
                cloud.patient_id.clone(),
                load.name.clone(),
                Arc::clone(&load.bytes),
                load.generation,
            );
        }
        self.model = Some(LoadedModel {
            local_ref: format!("local://{}/{}", load.generation, load.name),
            name: load.name,
            format: load.format,
            generation: load.generation,
            mesh: Arc::new(mesh),
            remote_url: None,
        });
    }

    fn finish_upload(&mut self, outcome: UploadOutcome) {
        match outcome.result {
            Ok(url) => {
                log::info!("uploaded '{}' to {url}", outcome.file_name);
                if let Some(model) = self
                    .model
                    .as_mut()
                    .filter(|model| model.generation == outcome.generation)
                {
                    model.remote_url = Some(url);
                }
            }
            Err(e) => {
                log::warn!("upload of '{}' failed: {e}", outcome.file_name);
                self.notify(
                    NoticeLevel::Warning,
                    format!("{} was not saved to the cloud: {e}", outcome.file_name),
                );
            }
        }
    }

    /// Folds finished background work into the session. Never blocks.
    ///
    /// Returns true if anything changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        if let Some(load) = self.loader.poll() {
            self.finish_load(load);
            changed = true;
        }
        for outcome in self.uploader.poll() {
            self.finish_upload(outcome);
            changed = true;
        }
        changed
    }

    /// Blocks until the newest load completes. Returns false on timeout.
    pub fn wait_for_load(&mut self, timeout: Duration) -> bool {
        match self.loader.wait(timeout) {
            Some(load) => {
                self.finish_load(load);
                true
            }
            None => !self.loader.is_loading(),
        }
    }

    /// Blocks until every upload in flight has reported back.
    pub fn wait_for_uploads(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.uploader.in_flight() > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.uploader.wait(remaining) {
                Some(outcome) => self.finish_upload(outcome),
                None => return false,
            }
        }
        true
    }

    /// The patient's stored models, for the cloud shortlist. Empty without a
    /// document store.
    pub fn list_cloud_models(&self) -> Result<Vec<ModelRef>> {
        match &self.cloud {
            Some(cloud) => cloud.store.list_models_for_patient(&cloud.patient_id),
            None => Ok(Vec::new()),
        }
    }

    // ---- export and chart ----

    /// Builds export assets for the visible bound geometry.
    pub fn export(&mut self, config: &ExportConfig) -> Result<Vec<ExportedAsset>> {
        let model = self.model.as_ref().map(|model| model.mesh.as_ref());
        let assets = export::export(&self.scene, model, config)?;
        if assets.is_empty() {
            self.notify(NoticeLevel::Warning, "Nothing visible to export");
        }
        Ok(assets)
    }

    #[must_use]
    pub fn chart(&self) -> &ToothChartEditor {
        &self.chart
    }

    pub fn chart_mut(&mut self) -> &mut ToothChartEditor {
        &mut self.chart
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dentiscope_core::scene::defaults::{MANDIBLE, SINUS, TEETH};

    const TRIANGLE: &[u8] = b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

    #[test]
    fn test_unknown_node_is_noop() {
        let mut session = Session::default();
        let before = session.state();
        assert!(!session.toggle_visibility("wisdom-tooth"));
        assert_eq!(session.state(), before);
        assert!(!session.can_undo());
    }

    #[test]
    fn test_scene_edits_undo() {
        let mut session = Session::default();
        assert!(session.toggle_visibility(SINUS));
        assert!(session.set_opacity(TEETH, 0.5));
        assert!(!session.scene().find(SINUS).expect("exists").visible);
        assert!(session.scene().find(MANDIBLE).expect("exists").visible);

        assert!(session.undo());
        assert!(session.undo());
        assert_eq!(session.scene(), &SceneGraph::dental());
        assert!(!session.undo());
        assert!(session.redo());
        assert!(!session.scene().find(SINUS).expect("exists").visible);
    }

    #[test]
    fn test_pending_pick_is_not_recorded() {
        let mut session = Session::default();
        session.set_tool(Some(Tool::MeasureDistance));
        session.pick(PickPoint::new(Vec3::ZERO));
        assert!(!session.can_undo());
        session.pick(PickPoint::new(Vec3::X));
        assert!(session.can_undo());
        assert_eq!(session.records().measurements().len(), 1);
        assert!(session.undo());
        assert!(session.records().is_empty());
    }

    #[test]
    fn test_unsupported_format_rejected() {
        let mut session = Session::default();
        let err = session
            .load_model("scan.png", vec![0; 16])
            .expect_err("png is not a mesh");
        assert!(matches!(err, DentiscopeError::UnsupportedFormat(_)));
        assert!(!session.is_loading());
        let notices = session.drain_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
    }

    #[test]
    fn test_placeholder_while_loading() {
        let mut session = Session::default();
        assert!(session.displayed_mesh().is_placeholder());
        session
            .load_model("tri.obj", TRIANGLE.to_vec())
            .expect("accepted");
        assert!(session.displayed_mesh().is_placeholder());
        assert!(session.wait_for_load(Duration::from_secs(5)));
        assert!(!session.displayed_mesh().is_placeholder());
        assert_eq!(session.model().expect("loaded").local_ref, "local://1/tri.obj");
    }

    #[test]
    fn test_parse_failure_keeps_previous_model() {
        let mut session = Session::default();
        session
            .load_model("tri.obj", TRIANGLE.to_vec())
            .expect("accepted");
        assert!(session.wait_for_load(Duration::from_secs(5)));
        session.drain_notices();

        session
            .load_model("broken.stl", b"not a mesh".to_vec())
            .expect("accepted");
        assert!(session.wait_for_load(Duration::from_secs(5)));
        assert_eq!(session.model().expect("kept").name, "tri.obj");
        let notices = session.drain_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
    }
}
