#![forbid(unsafe_code)]

//! The editor model: every store behind one message/update loop.
//!
//! UI events arrive as [`Msg`]s. [`Editor::update`] applies them and returns
//! an [`Effect`] describing any I/O the caller must perform; the outcome of
//! that I/O comes back as another message. This keeps the editor free of
//! network code and makes every transition testable.
//!
//! ```text
//!   Msg::Optimize ──► Effect::CreateProject ──► Msg::ProjectCreated
//!                                                   │
//!        Msg::ResultReceived ◄── Effect::FetchResult ◄── Msg::LayoutSubmitted
//!                 │                                       ▲
//!                 ▼                                       │
//!           preview held                          Effect::SubmitLayout
//! ```
//!
//! # Invariants
//!
//! 1. After every message, both relation matrices are `N x N` for the
//!    active name list (non-void departments in CRAFT, prototypes in build
//!    modes).
//! 2. A mode transition always discards the pending preview.
//! 3. A failed operation leaves every store untouched and raises `alert`.
//! 4. `loading` is advisory: a second `Optimize` while one is in flight is
//!    still issued, and whichever response resolves last wins.
//! 5. Every optimizer request carries the [`RequestTag`] of the mode epoch it
//!    was issued in. A response whose tag is not current is dropped, however
//!    many requests were outstanding when the mode changed.

use crate::config::EditorConfig;
use crate::department::{Department, DepartmentForm, DepartmentStore, DeptId};
use crate::drag::{DragController, DropOutcome, PixelDelta, apply_drag};
use crate::error::{EditorError, Result};
use crate::geometry::{Canvas, GridPoint, PixelRect, Zoom, build_resolution};
use crate::mode::{Mode, ModeController};
use crate::preview::{DiffRow, OptimizationPreview, OptimizationResult};
use crate::prototype::{ProtoId, PrototypeForm, PrototypeStore};
use crate::relation::{Closeness, RelationMatrices};
use crate::request::{
    BuildDepartment, BuildRequest, BuildSettings, ClosenessWeights, CreateProjectRequest,
    LayoutDepartment, LayoutRequest, Project, Submission,
};
use crate::snapshot::EditorSnapshot;

/// Mode epoch an optimizer request was issued in. Bumped on every mode
/// transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RequestTag(u64);

/// Something that happened in the UI or came back from the optimizer.
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    AddDepartment(DepartmentForm),
    RemoveDepartment(DeptId),
    ToggleLock(DeptId),
    MoveDepartment { id: DeptId, x: i64, y: i64 },
    DragStart(DeptId),
    DragMotion { dx: f64, dy: f64 },
    DragEnd,
    DragCancel,
    /// Drop in one step, as reported by a drag-and-drop toolkit.
    Drop { id: DeptId, delta: PixelDelta },
    Wheel { delta_y: f64, ctrl: bool },
    SetGridSize(u32),
    SetBuildGrid { width: u32, height: u32 },
    AddPrototype(PrototypeForm),
    RemovePrototype(ProtoId),
    ToggleFixed(ProtoId),
    SetFlowCell { row: usize, col: usize, value: String },
    SetClosenessCell { row: usize, col: usize, value: String },
    SelectMode(Mode),
    Optimize,
    ProjectCreated(Project),
    LayoutSubmitted {
        tag: RequestTag,
        layout_id: String,
    },
    ResultReceived {
        tag: RequestTag,
        result: OptimizationResult,
    },
    CandidatesReceived {
        tag: RequestTag,
        candidates: Vec<OptimizationResult>,
    },
    RequestFailed(String),
    SelectCandidate(usize),
    ApplyPreview,
    DiscardPreview,
    DismissAlert,
}

/// I/O the caller performs on the editor's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    /// Best-effort live-edit sync; failures are logged, never reported back.
    SyncLayout(Vec<Department>),
    CreateProject(CreateProjectRequest),
    SubmitLayout {
        tag: RequestTag,
        request: LayoutRequest,
    },
    FetchResult {
        tag: RequestTag,
        layout_id: String,
    },
    Generate {
        tag: RequestTag,
        request: BuildRequest,
    },
}

impl Effect {
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// A rectangle to draw on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasItem {
    pub name: String,
    pub locked: bool,
    pub void: bool,
    /// Optimizer preview overlay rather than a live department.
    pub ghost: bool,
    pub px: PixelRect,
}

#[derive(Debug, Clone)]
pub struct Editor {
    config: EditorConfig,
    canvas: Canvas,
    zoom: Zoom,
    modes: ModeController,
    departments: DepartmentStore,
    prototypes: PrototypeStore,
    relations: RelationMatrices,
    drag: DragController,
    preview: OptimizationPreview,
    name: String,
    project: Option<Project>,
    weights: Option<ClosenessWeights>,
    build_settings: BuildSettings,
    pending_submission: bool,
    epoch: u64,
    loading: bool,
    alert: Option<String>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            canvas: config.canvas(),
            zoom: config.zoom(),
            modes: ModeController::from_config(&config),
            config,
            departments: DepartmentStore::new(),
            prototypes: PrototypeStore::new(),
            relations: RelationMatrices::new(),
            drag: DragController::new(),
            preview: OptimizationPreview::new(),
            name: "Untitled layout".to_string(),
            project: None,
            weights: None,
            build_settings: BuildSettings::default(),
            pending_submission: false,
            epoch: 0,
            loading: false,
            alert: None,
        }
    }

    /// Restore an editor from a saved snapshot. Departments and prototypes
    /// are checked as if they were added one by one.
    pub fn from_snapshot(config: EditorConfig, snapshot: EditorSnapshot) -> Result<Self> {
        let mut editor = Self::new(config);
        editor.modes.set_grid_size(snapshot.grid_size)?;
        editor
            .modes
            .set_build_grid(snapshot.grid_width, snapshot.grid_height)?;
        editor.modes.select(snapshot.mode);
        editor.name = snapshot.name;
        editor.project = snapshot.project;
        editor.weights = snapshot.weights;
        editor.build_settings = snapshot.settings;
        let max_resolution = editor.modes.grid_size().max(build_resolution(
            editor.modes.grid_width(),
            editor.modes.grid_height(),
        ));
        editor.departments = DepartmentStore::restore(snapshot.departments, max_resolution)?;
        editor.prototypes = PrototypeStore::restore(snapshot.prototypes)?;
        editor.relations = RelationMatrices::restore(
            editor.active_names(),
            snapshot.flow_matrix,
            snapshot.closeness_matrix,
        );
        Ok(editor)
    }

    /// Capture the persistent part of the editor state.
    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            name: self.name.clone(),
            mode: self.mode(),
            grid_size: self.modes.grid_size(),
            grid_width: self.modes.grid_width(),
            grid_height: self.modes.grid_height(),
            departments: self.departments.as_slice().to_vec(),
            prototypes: self.prototypes.as_slice().to_vec(),
            flow_matrix: self.relations.flow().to_vec(),
            closeness_matrix: self.relations.closeness().to_vec(),
            weights: self.weights,
            settings: self.build_settings,
            project: self.project.clone(),
        }
    }

    // -- accessors -----------------------------------------------------------

    #[inline]
    pub fn mode(&self) -> Mode {
        self.modes.mode()
    }

    pub fn modes(&self) -> &ModeController {
        &self.modes
    }

    pub fn departments(&self) -> &DepartmentStore {
        &self.departments
    }

    pub fn prototypes(&self) -> &PrototypeStore {
        &self.prototypes
    }

    pub fn relations(&self) -> &RelationMatrices {
        &self.relations
    }

    pub fn preview(&self) -> &OptimizationPreview {
        &self.preview
    }

    pub fn zoom(&self) -> Zoom {
        self.zoom
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    #[inline]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// Tag that requests issued now will carry.
    #[inline]
    pub fn request_tag(&self) -> RequestTag {
        RequestTag(self.epoch)
    }

    /// Message of the blocking dialog currently shown, if any.
    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    /// Closeness weights sent with build requests.
    pub fn weights(&self) -> ClosenessWeights {
        self.weights
            .unwrap_or_else(|| ClosenessWeights::for_mode(self.mode()))
    }

    pub fn set_weights(&mut self, weights: ClosenessWeights) {
        self.weights = Some(weights);
    }

    pub fn set_build_settings(&mut self, settings: BuildSettings) {
        self.build_settings = settings;
    }

    /// Names indexing the relation matrices in the current mode.
    pub fn active_names(&self) -> Vec<String> {
        if self.mode().is_build() {
            self.prototypes.names()
        } else {
            self.departments.matrix_names()
        }
    }

    /// Position changes the selected candidate would make.
    pub fn preview_diff(&self) -> Vec<DiffRow> {
        self.preview.diff(&self.departments)
    }

    /// Everything to draw: live departments (CRAFT only) then preview ghosts.
    pub fn canvas_items(&self) -> Vec<CanvasItem> {
        let mut items = Vec::new();
        if !self.mode().is_build() {
            items.extend(self.departments.iter().map(|d| CanvasItem {
                name: d.name.clone(),
                locked: d.locked,
                void: d.is_void(),
                ghost: false,
                px: self.canvas.rect_to_px(d.rect(), d.grid_size),
            }));
        }
        if let Some(candidate) = self.preview.selected() {
            let resolution = self.modes.canvas_resolution();
            items.extend(candidate.placements.iter().map(|p| CanvasItem {
                name: p.name.clone(),
                locked: false,
                void: false,
                ghost: true,
                px: self.canvas.rect_to_px(p.rect(), resolution),
            }));
        }
        items
    }

    // -- message loop --------------------------------------------------------

    /// Apply a message. Failures become the `alert` and produce no effect.
    pub fn update(&mut self, msg: Msg) -> Effect {
        match self.try_update(msg) {
            Ok(effect) => effect,
            Err(error) => {
                tracing::debug!(%error, "editor operation rejected");
                self.alert = Some(error.to_string());
                Effect::None
            }
        }
    }

    fn try_update(&mut self, msg: Msg) -> Result<Effect> {
        match msg {
            Msg::AddDepartment(form) => self.add_department(&form).map(|_| self.sync_effect()),
            Msg::RemoveDepartment(id) => self.remove_department(&id).map(|()| self.sync_effect()),
            Msg::ToggleLock(id) => self.toggle_lock(&id).map(|_| Effect::None),
            Msg::MoveDepartment { id, x, y } => {
                self.move_department(&id, x, y).map(|_| self.sync_effect())
            }
            Msg::DragStart(id) => {
                self.drag.begin(id);
                Ok(Effect::None)
            }
            Msg::DragMotion { dx, dy } => {
                self.drag.motion(dx, dy);
                Ok(Effect::None)
            }
            Msg::DragCancel => {
                self.drag.cancel();
                Ok(Effect::None)
            }
            Msg::DragEnd => {
                if let Err(error) = self.require_manual() {
                    self.drag.cancel();
                    return Err(error);
                }
                let resolution = self.modes.canvas_resolution();
                let outcome =
                    self.drag
                        .end(&mut self.departments, self.canvas, resolution, self.zoom);
                Ok(self.drop_effect(outcome))
            }
            Msg::Drop { id, delta } => {
                let outcome = self.drop_department(&id, delta)?;
                Ok(self.drop_effect(Some(outcome)))
            }
            Msg::Wheel { delta_y, ctrl } => {
                if ctrl {
                    self.zoom.wheel(delta_y, self.config.zoom_wheel_factor);
                }
                Ok(Effect::None)
            }
            Msg::SetGridSize(size) => self.set_grid_size(size).map(|()| Effect::None),
            Msg::SetBuildGrid { width, height } => {
                self.modes.set_build_grid(width, height).map(|()| Effect::None)
            }
            Msg::AddPrototype(form) => self.add_prototype(&form).map(|()| Effect::None),
            Msg::RemovePrototype(id) => self.remove_prototype(&id).map(|()| Effect::None),
            Msg::ToggleFixed(id) => {
                self.require_build()?;
                self.prototypes.toggle_fixed(&id).map(|_| Effect::None)
            }
            Msg::SetFlowCell { row, col, value } => self
                .relations
                .set_flow_cell(row, col, &value)
                .map(|_| Effect::None),
            Msg::SetClosenessCell { row, col, value } => self
                .set_closeness_cell(row, col, &value)
                .map(|_| Effect::None),
            Msg::SelectMode(mode) => {
                self.select_mode(mode);
                Ok(Effect::None)
            }
            Msg::Optimize => self.optimize(),
            Msg::ProjectCreated(project) => self.on_project_created(project),
            Msg::LayoutSubmitted { tag, layout_id } => {
                if self.is_stale(tag) {
                    return Ok(Effect::None);
                }
                tracing::debug!(%layout_id, "layout accepted by optimizer");
                Ok(Effect::FetchResult { tag, layout_id })
            }
            Msg::ResultReceived { tag, result } => {
                self.on_candidates(tag, vec![result]);
                Ok(Effect::None)
            }
            Msg::CandidatesReceived { tag, candidates } => {
                self.on_candidates(tag, candidates);
                Ok(Effect::None)
            }
            Msg::RequestFailed(message) => {
                tracing::warn!(%message, "optimizer request failed");
                self.loading = false;
                self.pending_submission = false;
                self.alert = Some(message);
                Ok(Effect::None)
            }
            Msg::SelectCandidate(index) => {
                self.preview.select_candidate(index).map(|()| Effect::None)
            }
            Msg::ApplyPreview => self.apply_preview().map(|_| self.sync_effect()),
            Msg::DiscardPreview => {
                self.preview.discard();
                Ok(Effect::None)
            }
            Msg::DismissAlert => {
                self.alert = None;
                Ok(Effect::None)
            }
        }
    }

    // -- department roster -----------------------------------------------------

    pub fn add_department(&mut self, form: &DepartmentForm) -> Result<DeptId> {
        self.require_manual()?;
        let grid_size = self.modes.grid_size();
        let id = self.departments.add_from_form(form, grid_size)?.id.clone();
        self.resync_matrices();
        Ok(id)
    }

    pub fn remove_department(&mut self, id: &DeptId) -> Result<()> {
        self.departments.remove(id)?;
        self.resync_matrices();
        Ok(())
    }

    pub fn toggle_lock(&mut self, id: &DeptId) -> Result<bool> {
        self.departments.toggle_lock(id)
    }

    pub fn move_department(&mut self, id: &DeptId, x: i64, y: i64) -> Result<GridPoint> {
        self.require_manual()?;
        let resolution = self.modes.canvas_resolution();
        self.departments.move_to(id, x, y, resolution)
    }

    /// Drop a department after a drag of `delta` screen pixels.
    pub fn drop_department(&mut self, id: &DeptId, delta: PixelDelta) -> Result<DropOutcome> {
        self.require_manual()?;
        let resolution = self.modes.canvas_resolution();
        Ok(apply_drag(
            &mut self.departments,
            id,
            delta,
            self.canvas,
            resolution,
            self.zoom,
        ))
    }

    /// Change the CRAFT grid. In CRAFT every department must still fit where
    /// it stands; none are moved to make room.
    pub fn set_grid_size(&mut self, grid_size: u32) -> Result<()> {
        let craft = !self.mode().is_build();
        if craft {
            self.departments.check_fits(grid_size)?;
        }
        self.modes.set_grid_size(grid_size)?;
        if craft {
            self.departments.restamp_grid_size(grid_size);
        }
        Ok(())
    }

    // -- prototypes and relations ----------------------------------------------

    pub fn add_prototype(&mut self, form: &PrototypeForm) -> Result<()> {
        self.require_build()?;
        self.prototypes.add_from_form(form)?;
        self.resync_matrices();
        Ok(())
    }

    pub fn remove_prototype(&mut self, id: &ProtoId) -> Result<()> {
        self.require_build()?;
        self.prototypes.remove(id)?;
        self.resync_matrices();
        Ok(())
    }

    pub fn set_flow_cell(&mut self, row: usize, col: usize, value: &str) -> Result<f64> {
        self.relations.set_flow_cell(row, col, value)
    }

    pub fn set_closeness_cell(&mut self, row: usize, col: usize, value: &str) -> Result<Closeness> {
        self.relations.set_closeness_cell(row, col, value)
    }

    // -- modes -----------------------------------------------------------------

    /// Switch mode, discarding any pending preview. Requests still in flight
    /// become stale.
    pub fn select_mode(&mut self, mode: Mode) {
        if !self.modes.select(mode) {
            return;
        }
        self.epoch = self.epoch.wrapping_add(1);
        self.loading = false;
        self.pending_submission = false;
        self.preview.discard();
        self.drag.cancel();
        self.resync_matrices();
    }

    // -- optimization ----------------------------------------------------------

    /// Check the active roster can be submitted. Does not require a project.
    pub fn validate_submission(&self) -> Result<()> {
        let names = self.active_names();
        if self.mode().is_build() {
            if self.prototypes.is_empty() {
                return Err(EditorError::EmptyRoster { what: "prototype" });
            }
            let total = self.prototypes.total_area();
            let (width, height) = (self.modes.grid_width(), self.modes.grid_height());
            if total > u64::from(width) * u64::from(height) {
                return Err(EditorError::AreaExceedsGrid {
                    total,
                    width,
                    height,
                });
            }
        } else if names.is_empty() {
            return Err(EditorError::EmptyRoster { what: "department" });
        }
        self.relations.check_dimensions(names.len())
    }

    /// Build the request for the current mode.
    pub fn build_submission(&self) -> Result<Submission> {
        self.validate_submission()?;
        let project = self.project.as_ref().ok_or(EditorError::NoProject)?;
        let mode = self.mode();
        if mode.is_build() {
            return Ok(Submission::Build(BuildRequest {
                name: self.name.clone(),
                project_id: project.id.clone(),
                grid_width: self.modes.grid_width(),
                grid_height: self.modes.grid_height(),
                algorithm: mode,
                departments: self.prototypes.iter().map(BuildDepartment::from).collect(),
                closeness_matrix: self.relations.closeness().to_vec(),
                weights: self.weights(),
                settings: self.build_settings,
            }));
        }
        Ok(Submission::Layout(LayoutRequest {
            name: self.name.clone(),
            grid_size: self.modes.grid_size(),
            project_id: project.id.clone(),
            departments: self
                .departments
                .normalized_to_origin()
                .iter()
                .map(LayoutDepartment::from)
                .collect(),
            flow_matrix: self.relations.flow().to_vec(),
            closeness_matrix: self.relations.closeness().to_vec(),
            metric: self.config.sync.metric,
        }))
    }

    fn optimize(&mut self) -> Result<Effect> {
        self.validate_submission()?;
        if self.loading {
            tracing::debug!("optimize requested while a request is outstanding");
        }
        self.loading = true;
        if self.project.is_none() {
            self.pending_submission = true;
            return Ok(Effect::CreateProject(CreateProjectRequest {
                name: self.name.clone(),
                user_id: self.config.sync.user_id.clone(),
            }));
        }
        self.submit()
    }

    fn on_project_created(&mut self, project: Project) -> Result<Effect> {
        tracing::debug!(id = %project.id, name = %project.name, "project created");
        self.project = Some(project);
        if !std::mem::take(&mut self.pending_submission) {
            return Ok(Effect::None);
        }
        match self.submit() {
            Ok(effect) => Ok(effect),
            Err(error) => {
                self.loading = false;
                Err(error)
            }
        }
    }

    fn submit(&mut self) -> Result<Effect> {
        let tag = self.request_tag();
        Ok(match self.build_submission()? {
            Submission::Layout(request) => Effect::SubmitLayout { tag, request },
            Submission::Build(request) => Effect::Generate { tag, request },
        })
    }

    fn on_candidates(&mut self, tag: RequestTag, candidates: Vec<OptimizationResult>) {
        if self.is_stale(tag) {
            return;
        }
        self.loading = false;
        self.preview.set_many(candidates);
    }

    fn is_stale(&self, tag: RequestTag) -> bool {
        let stale = tag != self.request_tag();
        if stale {
            tracing::debug!(mode = %self.mode(), "dropping optimizer response for a mode no longer active");
        }
        stale
    }

    /// Accept the selected candidate. Returns the new roster size.
    pub fn apply_preview(&mut self) -> Result<usize> {
        let resolution = self.modes.canvas_resolution();
        let count = self.preview.apply(&mut self.departments, resolution)?;
        self.resync_matrices();
        Ok(count)
    }

    // -- helpers ---------------------------------------------------------------

    fn resync_matrices(&mut self) {
        let names = self.active_names();
        self.relations.sync_names(names);
    }

    fn sync_effect(&self) -> Effect {
        Effect::SyncLayout(self.departments.as_slice().to_vec())
    }

    fn drop_effect(&self, outcome: Option<DropOutcome>) -> Effect {
        match outcome {
            Some(outcome) if outcome.is_moved() => self.sync_effect(),
            _ => Effect::None,
        }
    }

    fn require_manual(&self) -> Result<()> {
        let mode = self.mode();
        if mode.is_build() {
            return Err(EditorError::WrongMode { mode });
        }
        Ok(())
    }

    fn require_build(&self) -> Result<()> {
        let mode = self.mode();
        if !mode.is_build() {
            return Err(EditorError::WrongMode { mode });
        }
        Ok(())
    }
}
