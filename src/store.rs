//! Canonical project state and its lifecycle.
//!
//! The [`Store`] is the sole writer of the [`Project`] and the transient UI
//! flags. The compositor and classifier receive read-only snapshots; every
//! mutation routes back through here. UI-facing mutations never fail —
//! operations on an absent project are no-ops. The one genuinely fallible
//! operation is recolor, which reads the processed raster, decodes it, and
//! writes a new raster back; see [`Store::begin_recolor`] for how that
//! write-back is fenced against interleaved completions.

use std::collections::BTreeSet;

use crate::{
    classify::{self, Rule},
    color::{RECOLOR_TOLERANCE, Rgb},
    error::{TuftError, TuftResult},
    model::{ProcessedResult, Project, SettingsPatch},
    raster,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessingStatus {
    Idle,
    Uploading,
    Processing,
    Done,
    Error,
}

/// Transient per-session state; governs rendering and navigation but is not
/// business data. Only a subset of it is persisted (see [`crate::persist`]).
#[derive(Clone, Debug)]
pub struct UiState {
    pub active_tab: String,
    pub status: ProcessingStatus,
    pub status_error: Option<String>,
    pub show_outline: bool,
    pub outline_width: f32,
    /// Palette color id currently solo-isolated, if any. Always references an
    /// existing palette entry or is `None`.
    pub solo_color_id: Option<String>,
    /// Palette color ids excluded from the composite. Always a subset of the
    /// current palette's ids.
    pub hidden_color_ids: BTreeSet<String>,
    pub viewport: Viewport,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub zoom: f32,
    pub pan_x: f32,
    pub pan_y: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            active_tab: "upload".to_string(),
            status: ProcessingStatus::Idle,
            status_error: None,
            show_outline: false,
            outline_width: 1.5,
            solo_color_id: None,
            hidden_color_ids: BTreeSet::new(),
            viewport: Viewport::default(),
        }
    }
}

/// A recolor in flight: the raster bytes it captured plus the fencing data
/// that decides whether its write-back is still welcome.
#[derive(Clone, Debug)]
pub struct RecolorJob {
    pub color_id: String,
    pub from: Rgb,
    pub image: Vec<u8>,
    epoch: u64,
}

#[derive(Debug, Default)]
pub struct Store {
    project: Option<Project>,
    ui: UiState,
    hydrated: bool,
    recolor_busy: bool,
    /// Bumped whenever the processed raster is replaced wholesale. An
    /// in-flight recolor job carries the epoch it read under; a mismatch at
    /// completion means the job would clobber newer state, so it is refused.
    epoch: u64,
    created: u64,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    pub fn is_recolor_busy(&self) -> bool {
        self.recolor_busy
    }

    /// Create a fresh project around an uploaded image. Always succeeds:
    /// default settings, empty derived fields, status back to idle, solo and
    /// hidden state cleared.
    pub fn init_project(&mut self, original_image: Vec<u8>) -> &Project {
        self.created += 1;
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let id = format!("project_{}_{nanos}", self.created);

        self.ui.status = ProcessingStatus::Idle;
        self.ui.status_error = None;
        self.ui.solo_color_id = None;
        self.ui.hidden_color_ids.clear();
        self.ui.viewport = Viewport::default();
        self.recolor_busy = false;
        self.epoch += 1;
        self.project.insert(Project::new(id, original_image))
    }

    /// Merge pre-processing settings into the current project. Silently
    /// ignored when no project exists; processed fields are never touched.
    pub fn update_settings(&mut self, patch: &SettingsPatch) {
        if let Some(project) = self.project.as_mut() {
            project.settings.apply(patch);
        }
    }

    /// Atomically install a service response: processed raster, palette,
    /// layers, yarn estimates, and outline markup land together or not at
    /// all. Invalidates any in-flight recolor and prunes solo/hidden ids that
    /// no longer reference a palette entry.
    pub fn set_processed_result(&mut self, result: ProcessedResult) {
        let Some(project) = self.project.as_mut() else {
            return;
        };
        if let Err(e) = result.validate() {
            tracing::warn!(error = %e, "rejecting inconsistent processed result");
            self.ui.status = ProcessingStatus::Error;
            self.ui.status_error = Some(e.to_string());
            return;
        }

        project.processed_image = Some(result.processed_image);
        project.palette = result.palette;
        project.layers = result.layers;
        project.yarn_estimates = result.yarn_estimates;
        project.outline_svg = result.outline_svg;

        let ids: BTreeSet<&str> = project.palette.iter().map(|c| c.id.as_str()).collect();
        self.ui
            .hidden_color_ids
            .retain(|id| ids.contains(id.as_str()));
        let solo_dangles = self
            .ui
            .solo_color_id
            .as_deref()
            .is_some_and(|solo| !ids.contains(solo));
        if solo_dangles {
            self.ui.solo_color_id = None;
        }

        self.ui.status = ProcessingStatus::Done;
        self.ui.status_error = None;
        self.recolor_busy = false;
        self.epoch += 1;
    }

    /// Record the outcome of the external processing call.
    pub fn set_processing_status(&mut self, status: ProcessingStatus, error: Option<String>) {
        self.ui.status = status;
        self.ui.status_error = error;
    }

    /// Clear the project and derived UI state back to initial values.
    pub fn reset_project(&mut self) {
        self.project = None;
        self.ui.solo_color_id = None;
        self.ui.hidden_color_ids.clear();
        self.ui.viewport = Viewport::default();
        self.ui.status = ProcessingStatus::Idle;
        self.ui.status_error = None;
        self.recolor_busy = false;
        self.epoch += 1;
    }

    // UI setters: pure flag transitions, no side effects.

    pub fn set_active_tab(&mut self, tab: impl Into<String>) {
        self.ui.active_tab = tab.into();
    }

    pub fn set_show_outline(&mut self, show: bool) {
        self.ui.show_outline = show;
    }

    pub fn set_outline_width(&mut self, width: f32) {
        self.ui.outline_width = width;
    }

    /// Select a palette color for solo isolation, or clear with `None`.
    /// An id with no palette entry is ignored.
    pub fn set_solo_color(&mut self, color_id: Option<&str>) {
        match color_id {
            None => self.ui.solo_color_id = None,
            Some(id) => {
                let exists = self
                    .project
                    .as_ref()
                    .is_some_and(|p| p.palette_color(id).is_some());
                if exists {
                    self.ui.solo_color_id = Some(id.to_string());
                }
            }
        }
    }

    /// Insert the id into the hidden set if absent, remove it if present.
    /// Ids without a palette entry are ignored, keeping the hidden set a
    /// subset of palette identifiers.
    pub fn toggle_hidden(&mut self, color_id: &str) {
        let exists = self
            .project
            .as_ref()
            .is_some_and(|p| p.palette_color(color_id).is_some());
        if !exists {
            return;
        }
        if !self.ui.hidden_color_ids.remove(color_id) {
            self.ui.hidden_color_ids.insert(color_id.to_string());
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.ui.viewport = viewport;
    }

    /// First half of a recolor: capture the processed raster and the palette
    /// entry's current RGB under the current epoch, and take the busy guard.
    ///
    /// A second recolor requested while one is in flight is rejected with
    /// [`TuftError::Busy`] rather than queued; the caller surfaces it as a
    /// transient error and the user retries once the first commit lands.
    pub fn begin_recolor(&mut self, color_id: &str) -> TuftResult<RecolorJob> {
        if self.recolor_busy {
            return Err(TuftError::busy("a recolor is already in flight"));
        }
        let project = self
            .project
            .as_ref()
            .ok_or_else(|| TuftError::validation("no project to recolor"))?;
        let color = project
            .palette_color(color_id)
            .ok_or_else(|| TuftError::validation(format!("unknown palette color '{color_id}'")))?;
        let image = project
            .processed_image
            .clone()
            .ok_or_else(|| TuftError::validation("project has no processed raster"))?;

        self.recolor_busy = true;
        Ok(RecolorJob {
            color_id: color_id.to_string(),
            from: color.rgb,
            image,
            epoch: self.epoch,
        })
    }

    /// Second half of a recolor: decode the captured raster, rewrite pixels
    /// belonging to the old color, re-encode, and install the result plus the
    /// updated palette entry.
    ///
    /// The job's epoch must still match the store's: if a fresh processed
    /// result (or a reset) arrived while the job was in flight, the write-back
    /// is refused with [`TuftError::Stale`] and the newer state survives. On
    /// decode failure nothing is written; prior fields stay intact either way.
    #[tracing::instrument(skip(self, job), fields(color_id = %job.color_id))]
    pub fn complete_recolor(
        &mut self,
        job: RecolorJob,
        new_rgb: Rgb,
        new_name: Option<String>,
    ) -> TuftResult<()> {
        if job.epoch != self.epoch {
            // The busy guard was already released by whatever bumped the epoch.
            return Err(TuftError::stale(
                "processed raster changed while recolor was in flight",
            ));
        }

        let outcome = (|| -> TuftResult<Vec<u8>> {
            let mut decoded = raster::decode(&job.image)?;
            classify::reclassify(
                &mut decoded.data,
                &Rule::Recolor {
                    from: job.from,
                    to: new_rgb,
                },
                RECOLOR_TOLERANCE,
            )?;
            raster::encode_png(&decoded)
        })();

        self.recolor_busy = false;
        let encoded = outcome?;

        let Some(project) = self.project.as_mut() else {
            return Err(TuftError::stale("project disappeared during recolor"));
        };
        project.processed_image = Some(encoded);
        if let Some(color) = project.palette.iter_mut().find(|c| c.id == job.color_id) {
            color.rgb = new_rgb;
            color.hex = new_rgb.to_hex();
            if let Some(name) = new_name {
                color.name = name;
            }
        }
        Ok(())
    }

    /// Replace a palette entry's color and rewrite every matching pixel of
    /// the processed raster. Convenience wrapper over
    /// [`begin_recolor`](Self::begin_recolor) /
    /// [`complete_recolor`](Self::complete_recolor).
    pub fn swap_color(
        &mut self,
        color_id: &str,
        new_rgb: Rgb,
        new_name: Option<String>,
    ) -> TuftResult<()> {
        let job = self.begin_recolor(color_id)?;
        self.complete_recolor(job, new_rgb, new_name)
    }

    /// Redirect decision for "no project ⇒ go to start": unanswerable until
    /// hydration has resolved, so callers must not redirect on `None`.
    pub fn needs_project_redirect(&self) -> Option<bool> {
        self.hydrated.then(|| self.project.is_none())
    }

    pub(crate) fn mark_hydrated(&mut self) -> bool {
        if self.hydrated {
            return false;
        }
        self.hydrated = true;
        true
    }

    pub(crate) fn restore(
        &mut self,
        project: Option<Project>,
        active_tab: String,
        show_outline: bool,
        outline_width: f32,
        hidden_color_ids: BTreeSet<String>,
    ) {
        self.project = project;
        self.ui.active_tab = active_tab;
        self.ui.show_outline = show_outline;
        self.ui.outline_width = outline_width;
        self.ui.hidden_color_ids = hidden_color_ids;
        // A reload must never resume work that cannot be resumed.
        self.ui.status = ProcessingStatus::Idle;
        self.ui.status_error = None;
        self.epoch += 1;
    }
}
