//! Darkroom session: the explicit context that owns project state.
//!
//! A [`DarkroomSession`] holds the paper, the exposure list, brush and tool
//! state, undo history and the render scheduler. UI events are forwarded to
//! its methods; the event loop polls [`DarkroomSession::poll_render`] and
//! hands the resulting [`RenderRequest`] to whichever backend is available,
//! then stores the result with [`DarkroomSession::commit_frame`].

pub mod history;
pub mod scheduler;

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::Vec2;

use crate::config::DarkroomConfig;
use crate::error::DarkroomError;
use crate::exposure::{Exposure, ExposureId, MAX_EXPOSURES};
use crate::image::{PrintImage, Transmittance};
use crate::mask::{BrushSettings, Mask, StrokeRecorder, Tool};
use crate::paper::{Paper, PaperKind};
use crate::project::{self, ProjectSnapshot};
use crate::scopes::Histogram;
use crate::transform::lut::SigmoidLut;
use crate::transform::render::{RenderSettings, render_cpu};

pub use history::History;
pub use scheduler::RenderScheduler;

/// Everything a backend needs to render one frame.
///
/// Exposures are a snapshot; the negative and LUT are shared read-only.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub paper: PaperKind,
    pub exposures: Vec<Exposure>,
    pub negative: Arc<Transmittance>,
    pub lut: Arc<SigmoidLut>,
    pub settings: RenderSettings,
}

impl RenderRequest {
    pub fn paper(&self) -> &'static Paper {
        self.paper.paper()
    }

    /// Render with the CPU compositor.
    pub fn render_cpu(&self) -> Option<PrintImage> {
        render_cpu(
            self.paper(),
            &self.exposures,
            &self.negative,
            &self.lut,
            &self.settings,
        )
    }
}

/// Editing state for one print.
#[derive(Debug)]
pub struct DarkroomSession {
    config: DarkroomConfig,
    paper: PaperKind,
    exposures: Vec<Exposure>,
    active: Option<ExposureId>,
    brush: BrushSettings,
    tool: Tool,
    negative: Option<Arc<Transmittance>>,
    lut: Arc<SigmoidLut>,
    history: History,
    scheduler: RenderScheduler,
    stroke: StrokeRecorder,
    stroke_before: Option<ProjectSnapshot>,
    last_frame: Option<PrintImage>,
    histogram: Option<Histogram>,
}

impl Default for DarkroomSession {
    fn default() -> Self {
        Self::new(DarkroomConfig::default())
    }
}

impl DarkroomSession {
    pub fn new(config: DarkroomConfig) -> Self {
        Self {
            history: History::new(config.history_depth),
            scheduler: RenderScheduler::new(config.debounce()),
            config,
            paper: PaperKind::default(),
            exposures: Vec::new(),
            active: None,
            brush: BrushSettings::default(),
            tool: Tool::default(),
            negative: None,
            lut: Arc::new(SigmoidLut::default()),
            stroke: StrokeRecorder::new(),
            stroke_before: None,
            last_frame: None,
            histogram: None,
        }
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn config(&self) -> &DarkroomConfig {
        &self.config
    }

    pub fn paper(&self) -> PaperKind {
        self.paper
    }

    pub fn exposures(&self) -> &[Exposure] {
        &self.exposures
    }

    pub fn exposure(&self, id: &ExposureId) -> Option<&Exposure> {
        self.exposures.iter().find(|e| &e.id == id)
    }

    pub fn active_exposure(&self) -> Option<&ExposureId> {
        self.active.as_ref()
    }

    pub fn brush(&self) -> &BrushSettings {
        &self.brush
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn negative(&self) -> Option<&Arc<Transmittance>> {
        self.negative.as_ref()
    }

    pub fn lut(&self) -> &Arc<SigmoidLut> {
        &self.lut
    }

    pub fn is_stroking(&self) -> bool {
        self.stroke.is_active()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// The most recent successfully rendered print.
    pub fn last_frame(&self) -> Option<&PrintImage> {
        self.last_frame.as_ref()
    }

    /// Histogram of [`last_frame`](Self::last_frame).
    pub fn histogram(&self) -> Option<&Histogram> {
        self.histogram.as_ref()
    }

    /// Immutable copy of the persisted state.
    pub fn snapshot(&self) -> ProjectSnapshot {
        ProjectSnapshot {
            paper: self.paper,
            exposures: self.exposures.clone(),
        }
    }

    // ── Negative and project ────────────────────────────────────────

    /// Replace the negative. Masks that no longer match its size are dropped.
    pub fn load_negative(&mut self, negative: Transmittance) {
        let dims = negative.dimensions();
        for exposure in &mut self.exposures {
            if exposure.mask.as_ref().is_some_and(|m| m.dimensions() != dims) {
                tracing::info!(
                    exposure = %exposure.id,
                    "dropping mask sized for the previous negative"
                );
                exposure.mask = None;
            }
        }
        tracing::info!(width = dims.0, height = dims.1, "loaded negative");
        self.negative = Some(Arc::new(negative));
        self.last_frame = None;
        self.histogram = None;
        self.request_render();
    }

    /// Replace the whole project. Clears undo history.
    pub fn load_project(&mut self, project: ProjectSnapshot) -> Result<(), DarkroomError> {
        project.check_unique_ids()?;
        if let Some(negative) = &self.negative {
            let (width, height) = negative.dimensions();
            for mask in project.exposures.iter().filter_map(|e| e.mask.as_ref()) {
                if mask.dimensions() != (width, height) {
                    return Err(DarkroomError::MaskSize {
                        mask_width: mask.width(),
                        mask_height: mask.height(),
                        width,
                        height,
                    });
                }
            }
        }
        self.end_stroke_silently();
        self.history.clear();
        self.restore(project);
        self.active = self.exposures.first().map(|e| e.id.clone());
        Ok(())
    }

    /// Read a `.ddr` or JSON project from disk.
    pub fn open_project(&mut self, path: &Path) -> Result<(), DarkroomError> {
        let project = project::load(path)?;
        self.load_project(project)
    }

    /// Write the current project to disk.
    pub fn save_project(&self, path: &Path) -> Result<(), DarkroomError> {
        project::save(path, &self.snapshot())?;
        Ok(())
    }

    // ── Exposure edits ──────────────────────────────────────────────

    pub fn set_paper(&mut self, paper: PaperKind) {
        if paper == self.paper {
            return;
        }
        self.record();
        self.paper = paper;
        self.request_render();
    }

    /// Append a new exposure at the paper's defaults and make it active.
    pub fn add_exposure(&mut self) -> ExposureId {
        self.record();
        let exposure = Exposure::new(self.paper.paper());
        let id = exposure.id.clone();
        self.exposures.push(exposure);
        if self.exposures.len() > MAX_EXPOSURES {
            tracing::warn!(
                count = self.exposures.len(),
                cap = MAX_EXPOSURES,
                "exposure kept in project but beyond the render cap"
            );
        }
        self.active = Some(id.clone());
        self.request_render();
        id
    }

    pub fn remove_exposure(&mut self, id: &ExposureId) -> Result<(), DarkroomError> {
        let index = self.index_of(id)?;
        if self.stroke.target() == Some(id) {
            self.end_stroke_silently();
        }
        self.record();
        self.exposures.remove(index);
        if self.active.as_ref() == Some(id) {
            self.active = self
                .exposures
                .get(index.min(self.exposures.len().saturating_sub(1)))
                .map(|e| e.id.clone());
        }
        self.request_render();
        Ok(())
    }

    pub fn select_exposure(&mut self, id: &ExposureId) -> Result<(), DarkroomError> {
        self.index_of(id)?;
        self.active = Some(id.clone());
        Ok(())
    }

    /// Set exposure time in seconds. Non-positive values clamp to ε.
    pub fn set_time(&mut self, id: &ExposureId, seconds: f64) -> Result<(), DarkroomError> {
        let index = self.index_of(id)?;
        self.record();
        self.exposures[index].set_time(seconds);
        self.request_render();
        Ok(())
    }

    /// Set grade index. Values above 11 clamp to 11.
    pub fn set_grade(&mut self, id: &ExposureId, grade: u8) -> Result<(), DarkroomError> {
        let index = self.index_of(id)?;
        self.record();
        self.exposures[index].set_grade(grade);
        self.request_render();
        Ok(())
    }

    pub fn clear_mask(&mut self, id: &ExposureId) -> Result<(), DarkroomError> {
        let index = self.index_of(id)?;
        if self.exposures[index].mask.is_none() {
            return Ok(());
        }
        if self.stroke.target() == Some(id) {
            self.end_stroke_silently();
        }
        self.record();
        self.exposures[index].mask = None;
        self.request_render();
        Ok(())
    }

    // ── Brush ───────────────────────────────────────────────────────

    pub fn set_brush_size(&mut self, percent: f32) {
        self.brush.set_size(percent);
    }

    pub fn set_brush_feather(&mut self, percent: f32) {
        self.brush.set_feather(percent);
    }

    pub fn set_brush_flow(&mut self, flow: f32) {
        self.brush.set_flow(flow);
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    /// Begin a stroke on the active exposure at `position` (negative pixels).
    ///
    /// Returns `false` when there is no negative, no active exposure, or a
    /// stroke is already in progress.
    pub fn pointer_down(&mut self, position: Vec2) -> bool {
        if self.stroke.is_active() {
            return false;
        }
        let (Some(negative), Some(id)) = (&self.negative, &self.active) else {
            return false;
        };
        let (width, height) = negative.dimensions();
        let Some(index) = self.exposures.iter().position(|e| &e.id == id) else {
            return false;
        };

        let before = self.snapshot();
        let exposure = &mut self.exposures[index];
        if exposure
            .mask
            .as_ref()
            .is_none_or(|m| m.dimensions() != (width, height))
        {
            exposure.mask = Some(Mask::new(width, height));
        }
        let Some(mask) = exposure.mask.as_mut() else {
            return false;
        };
        if !self
            .stroke
            .begin(exposure.id.clone(), self.tool, position, mask, &self.brush)
        {
            return false;
        }
        self.stroke_before = Some(before);
        self.scheduler.hold();
        true
    }

    /// Continue the active stroke. Returns the number of stamps applied.
    pub fn pointer_move(&mut self, position: Vec2) -> usize {
        let Some(target) = self.stroke.target() else {
            return 0;
        };
        let Some(mask) = self
            .exposures
            .iter_mut()
            .find(|e| &e.id == target)
            .and_then(|e| e.mask.as_mut())
        else {
            return 0;
        };
        self.stroke.extend(position, mask, &self.brush)
    }

    /// End the active stroke (pointer up, leave or cancel).
    ///
    /// Records one history entry and schedules one render. Returns `true`
    /// only for the call that actually ended a stroke.
    pub fn pointer_up(&mut self) -> bool {
        let Some(finished) = self.stroke.finish() else {
            return false;
        };
        tracing::debug!(
            exposure = %finished.exposure,
            tool = ?finished.tool,
            stamps = finished.stamps,
            "stroke finished"
        );
        if let Some(before) = self.stroke_before.take() {
            self.history.record(before);
        }
        self.scheduler.release(Instant::now());
        true
    }

    // ── History ─────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        self.end_stroke_silently();
        match self.history.undo(self.snapshot()) {
            Some(previous) => {
                self.restore(previous);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        self.end_stroke_silently();
        match self.history.redo(self.snapshot()) {
            Some(next) => {
                self.restore(next);
                true
            }
            None => false,
        }
    }

    // ── Rendering ───────────────────────────────────────────────────

    /// If a debounced render is due, snapshot the state for a backend.
    ///
    /// Returns `None` while a stroke is in progress, before the quiescence
    /// window elapses, or when there is nothing to render.
    pub fn poll_render(&mut self, now: Instant) -> Option<RenderRequest> {
        if !self.scheduler.poll(now) {
            return None;
        }
        let negative = self.negative.clone()?;
        if self.exposures.is_empty() {
            tracing::debug!("render skipped: no exposures");
            return None;
        }
        Some(RenderRequest {
            paper: self.paper,
            exposures: self.exposures.clone(),
            negative,
            lut: Arc::clone(&self.lut),
            settings: self.config.render_settings(),
        })
    }

    /// Store a finished frame. Backends that histogram the print themselves
    /// pass the result; otherwise it is computed here.
    pub fn commit_frame(&mut self, frame: PrintImage, histogram: Option<Histogram>) {
        let histogram = histogram
            .unwrap_or_else(|| Histogram::from_print(&frame, self.config.histogram_stride));
        self.histogram = Some(histogram);
        self.last_frame = Some(frame);
    }

    /// How long until [`poll_render`](Self::poll_render) yields a request.
    /// `None` when nothing is scheduled or a stroke holds rendering.
    pub fn render_due_in(&self, now: Instant) -> Option<Duration> {
        self.scheduler.time_until_due(now)
    }

    /// Schedule a render after the quiescence window.
    pub fn request_render(&mut self) {
        self.scheduler.arm(Instant::now());
    }

    // ── Helpers ─────────────────────────────────────────────────────

    fn index_of(&self, id: &ExposureId) -> Result<usize, DarkroomError> {
        self.exposures
            .iter()
            .position(|e| &e.id == id)
            .ok_or_else(|| DarkroomError::UnknownExposure(id.to_string()))
    }

    /// Push the current state. An open stroke is committed first so its
    /// entry precedes this one.
    fn record(&mut self) {
        self.end_stroke_silently();
        self.history.record(self.snapshot());
    }

    fn restore(&mut self, project: ProjectSnapshot) {
        self.paper = project.paper;
        self.exposures = project.exposures;
        let active_exists = self
            .active
            .as_ref()
            .is_some_and(|id| self.exposures.iter().any(|e| &e.id == id));
        if !active_exists {
            self.active = self.exposures.last().map(|e| e.id.clone());
        }
        self.request_render();
    }

    /// Commit a stroke that is interrupted by another edit.
    fn end_stroke_silently(&mut self) {
        if self.stroke.finish().is_some() {
            if let Some(before) = self.stroke_before.take() {
                self.history.record(before);
            }
            self.scheduler.release(Instant::now());
        }
    }
}
